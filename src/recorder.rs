use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use crate::drivers::{render_spectrum_png, render_waterfall_png, PlotStyle, SweepPipeline};

#[derive(Debug, Serialize)]
pub struct SnapshotMeta {
    pub created_at: String,
    pub source: String,
    pub points: usize,
    pub freq_min_hz: f64,
    pub freq_max_hz: f64,
    pub avg: usize,
    pub sweeps_buffered: usize,
    pub sweeps_received: u64,
    pub sweeps_dropped: u64,
}

#[derive(Debug)]
pub struct SavedSnapshot {
    pub stem: String,
    pub files: Vec<PathBuf>,
}

/// 快照导出：CSV (hz,db) + PNG + JSON 元数据
pub struct SnapshotRecorder {
    dir: PathBuf,
    style: PlotStyle,
}

impl SnapshotRecorder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), style: PlotStyle::default() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the current snapshot; `Ok(None)` when nothing has been buffered yet.
    pub fn save(&self, pipeline: &SweepPipeline, source: &str) -> Result<Option<SavedSnapshot>> {
        let Some(pairs) = pipeline.export_snapshot() else {
            return Ok(None);
        };
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("cannot create snapshot directory {}", self.dir.display()))?;
        let now = Local::now();
        let stem = format!("hackrf_snapshot_{}", now.format("%Y%m%d_%H%M%S"));
        let mut files = Vec::new();

        let csv_path = self.dir.join(format!("{stem}.csv"));
        write_csv(&csv_path, &pairs)?;
        files.push(csv_path);

        // PNG 失败不影响 CSV
        if let Some(frame) = pipeline.current_frame() {
            match render_spectrum_png(&frame, &self.style) {
                Ok(png) => files.push(self.write_bytes(&format!("{stem}.png"), &png)?),
                Err(err) => log::warn!("spectrum image skipped: {err}"),
            }
            if let Some(view) = &frame.waterfall {
                match render_waterfall_png(view, &self.style) {
                    Ok(png) => files.push(self.write_bytes(&format!("{stem}_waterfall.png"), &png)?),
                    Err(err) => log::warn!("waterfall image skipped: {err}"),
                }
            }
        }

        let stats = pipeline.stats();
        let meta = SnapshotMeta {
            created_at: now.to_rfc3339(),
            source: source.to_owned(),
            points: pairs.len(),
            freq_min_hz: pairs.first().map(|p| p.0).unwrap_or_default(),
            freq_max_hz: pairs.last().map(|p| p.0).unwrap_or_default(),
            avg: pipeline.avg(),
            sweeps_buffered: stats.sweeps_buffered,
            sweeps_received: stats.sweeps_received,
            sweeps_dropped: stats.sweeps_dropped,
        };
        let meta_path = self.dir.join(format!("{stem}.json"));
        let file = File::create(&meta_path)
            .with_context(|| format!("cannot create {}", meta_path.display()))?;
        let mut w = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut w, &meta)?;
        w.flush()?;
        files.push(meta_path);

        log::info!("Saved snapshot: {stem}");
        Ok(Some(SavedSnapshot { stem, files }))
    }

    fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(name);
        fs::write(&path, bytes).with_context(|| format!("cannot write {}", path.display()))?;
        Ok(path)
    }
}

fn write_csv(path: &Path, pairs: &[(f64, f64)]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    writeln!(w, "hz,db")?;
    for (hz, db) in pairs {
        writeln!(w, "{hz},{db}")?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::queue::{handoff, SweepEvent};
    use crate::drivers::assembler::AssembledSweep;
    use crate::drivers::PipelineConfig;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sweepscope-{name}-{}", std::process::id()))
    }

    #[test]
    fn nothing_to_save_before_first_sweep() {
        let (_tx, rx) = handoff(4);
        let pipeline = SweepPipeline::with_receiver(rx, Arc::new(AtomicBool::new(false)), &PipelineConfig::default());
        let recorder = SnapshotRecorder::new(scratch_dir("empty"));
        assert!(recorder.save(&pipeline, "test").unwrap().is_none());
    }

    #[test]
    fn writes_csv_and_metadata() {
        let (tx, rx) = handoff(4);
        let mut pipeline = SweepPipeline::with_receiver(rx, Arc::new(AtomicBool::new(false)), &PipelineConfig::default());
        tx.send(SweepEvent::Sweep(AssembledSweep {
            timestamp: "t".into(),
            freqs: vec![100.0, 150.0],
            power: vec![-50.0, -60.5],
        }));
        pipeline.tick();
        let dir = scratch_dir("csv");
        let saved = SnapshotRecorder::new(&dir).save(&pipeline, "test").unwrap().unwrap();
        let csv = fs::read_to_string(dir.join(format!("{}.csv", saved.stem))).unwrap();
        assert_eq!(csv, "hz,db\n100,-50\n150,-60.5\n");
        let meta: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join(format!("{}.json", saved.stem))).unwrap()).unwrap();
        assert_eq!(meta["points"], 2);
        assert_eq!(meta["source"], "test");
        let _ = fs::remove_dir_all(&dir);
    }
}
