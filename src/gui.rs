// src/gui.rs
use std::time::Instant;
use eframe::egui;
use egui::{Color32, TextureHandle, TextureOptions};
use egui_plot::{Line, Plot, PlotImage, PlotPoint, PlotPoints};
use crate::drivers::colormap::waterfall_rgb;
use crate::drivers::{Colormap, DisplayFrame, SweepPipeline, WaterfallView};
use crate::engine;
use crate::recorder::SnapshotRecorder;
use crate::types::AppConfig;

pub struct SweepScopeApp {
    config: AppConfig,
    pipeline: SweepPipeline,
    source_label: String,
    recorder: SnapshotRecorder,

    // 最近一次 tick 的结果
    frame: Option<DisplayFrame>,
    waterfall_texture: Option<TextureHandle>,
    last_tick: Option<Instant>,

    // 界面日志
    log_messages: Vec<String>,
}

impl SweepScopeApp {
    pub fn new(config: AppConfig, pipeline: SweepPipeline, source_label: String) -> Self {
        let recorder = SnapshotRecorder::new(config.snapshot_dir());
        Self {
            config,
            pipeline,
            recorder,
            frame: None,
            waterfall_texture: None,
            last_tick: None,
            log_messages: vec![format!("SweepScope ready ({source_label}). Keys: s = snapshot, r = reset")],
            source_label,
        }
    }

    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {}", msg));
        if self.log_messages.len() > 8 { self.log_messages.remove(0); }
    }

    fn tick(&mut self, ctx: &egui::Context) {
        let due = self
            .last_tick
            .map_or(true, |t| t.elapsed() >= self.config.tick_interval());
        if !due {
            return;
        }
        self.last_tick = Some(Instant::now());
        let tick = self.pipeline.tick();
        if let Some(end) = tick.ended {
            self.log(&format!("⏹ {end}"));
        }
        if tick.drained == 0 && self.frame.is_some() {
            return;
        }
        self.frame = tick.frame;
        let waterfall = self.frame.as_ref().and_then(|f| f.waterfall.as_ref());
        match waterfall {
            Some(view) => {
                let image = waterfall_image(view);
                match &mut self.waterfall_texture {
                    Some(texture) => texture.set(image, TextureOptions::NEAREST),
                    None => {
                        self.waterfall_texture = Some(ctx.load_texture("waterfall", image, TextureOptions::NEAREST));
                    }
                }
            }
            None => self.waterfall_texture = None,
        }
    }

    fn save_snapshot(&mut self) {
        match self.recorder.save(&self.pipeline, &self.source_label) {
            Ok(Some(saved)) => self.log(&format!("💾 Saved snapshot: {}", saved.stem)),
            Ok(None) => self.log("Nothing to save yet"),
            Err(err) => {
                log::error!("snapshot failed: {err:#}");
                self.log(&format!("❌ Snapshot failed: {err}"));
            }
        }
    }

    fn reset(&mut self) {
        self.pipeline.reset();
        self.frame = None;
        self.waterfall_texture = None;
        self.log("🔄 Envelope and buffer reset");
    }

    fn draw_spectrum(&self, ui: &mut egui::Ui, height: f32) {
        Plot::new("spectrum")
            .height(height)
            .x_axis_label("Frequency (MHz)")
            .y_axis_label("Power (dB)")
            .auto_bounds_x()
            .auto_bounds_y()
            .show(ui, |plot_ui| {
                if let Some(frame) = &self.frame {
                    let points: Vec<[f64; 2]> = frame
                        .x_axis_mhz
                        .iter()
                        .zip(&frame.mean_curve)
                        .map(|(x, y)| [*x, *y])
                        .collect();
                    plot_ui.line(Line::new(PlotPoints::new(points)).color(Color32::from_rgb(0, 255, 255)));
                }
            });
    }

    fn draw_waterfall(&self, ui: &mut egui::Ui) {
        let (Some(texture), Some(view)) = (
            &self.waterfall_texture,
            self.frame.as_ref().and_then(|f| f.waterfall.as_ref()),
        ) else {
            ui.label("Waiting for sweeps…");
            return;
        };
        let [x0, x1, y0, y1] = view.extent;
        let width = (x1 - x0).max(1e-6);
        let height = (y1 - y0).max(1.0);
        Plot::new("waterfall")
            .x_axis_label("Frequency (MHz)")
            .y_axis_label("Sweeps (older->newer)")
            .auto_bounds_x()
            .auto_bounds_y()
            .show(ui, |plot_ui| {
                let center = PlotPoint::new(x0 + width / 2.0, y0 + height / 2.0);
                let size = egui::vec2(width as f32, height as f32);
                plot_ui.image(PlotImage::new(texture.id(), center, size));
            });
    }
}

fn waterfall_image(view: &WaterfallView) -> egui::ColorImage {
    let (width, height, pixels) = waterfall_rgb(&view.rows, Colormap::Viridis);
    egui::ColorImage::from_rgb([width, height], &pixels)
}

impl eframe::App for SweepScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // 1. 拉取队列中已完成的扫频
        self.tick(ctx);

        // 2. 快捷键：s 保存快照，r 重置
        if ctx.input(|i| i.key_pressed(egui::Key::S)) { self.save_snapshot(); }
        if ctx.input(|i| i.key_pressed(egui::Key::R)) { self.reset(); }

        // 3. 状态栏
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            let stats = self.pipeline.stats();
            ui.horizontal(|ui| {
                let state = match self.pipeline.source_end() {
                    Some(end) => end.to_string(),
                    None if self.pipeline.is_stopped() => "stopping".to_owned(),
                    None => "live".to_owned(),
                };
                ui.label(format!(
                    "{} [{}] | sweeps {} | queued {} | buffered {}/{} | dropped {} | resampled {}",
                    self.source_label,
                    state,
                    stats.sweeps_received,
                    stats.sweeps_queued,
                    stats.sweeps_buffered,
                    stats.buffer_capacity,
                    stats.sweeps_dropped,
                    stats.sweeps_resampled,
                ));
                let mut avg = self.pipeline.avg();
                if ui.add(egui::Slider::new(&mut avg, 1..=50).text("avg")).changed() {
                    self.pipeline.set_avg(avg);
                    self.frame = self.pipeline.current_frame();
                }
                if ui.button("💾 Snapshot").clicked() { self.save_snapshot(); }
                if ui.button("🔄 Reset").clicked() { self.reset(); }
            });
            egui::ScrollArea::vertical().max_height(80.0).show(ui, |ui| {
                for m in &self.log_messages { ui.monospace(m); }
            });
        });

        // 4. 频谱 + 瀑布图
        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_height();
            if self.pipeline.waterfall_enabled() {
                self.draw_spectrum(ui, available * 0.45);
                self.draw_waterfall(ui);
            } else {
                self.draw_spectrum(ui, available);
            }
        });

        ctx.request_repaint_after(self.config.tick_interval());
    }
}

impl Drop for SweepScopeApp {
    fn drop(&mut self) {
        self.pipeline.stop();
        if let Some(frame) = &self.frame {
            if let Some((mhz, db)) = engine::peak(frame) {
                log::info!("last peak {db:.1} dB at {mhz:.3} MHz");
            }
        }
    }
}
