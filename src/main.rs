// src/main.rs
mod drivers;
mod engine;
mod gui;
mod recorder;
mod types;
use std::path::PathBuf;
use anyhow::{anyhow, Context};
use clap::Parser;
use eframe::egui;
use crate::drivers::{PipelineConfig, SweepError};
use crate::types::{AppConfig, SourceKind};

// 用法：
// sweepscope --sweep-args "-f 174:230 -w 5000" --waterfall --avg 3
// DAB:  -f 174:230 -w 5000
// FM:   -f 88:110 -w 5000
// WiFi: -f 2400:2484 -w 1000000
#[derive(Parser, Debug)]
#[command(name = "sweepscope")]
#[command(about = "Live spectrum and waterfall viewer for hackrf_sweep output", long_about = None)]
struct Args {
    /// Extra args to pass to hackrf_sweep (e.g. '-f 200:300')
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    sweep_args: String,

    /// Sweep program to run
    #[arg(long, default_value = "hackrf_sweep")]
    program: String,

    /// Replay a recorded sweep CSV instead of running the program ('-' for stdin)
    #[arg(short = 'i', long, conflicts_with = "simulate")]
    input: Option<PathBuf>,

    /// Generate synthetic sweeps (no hardware needed)
    #[arg(long)]
    simulate: bool,

    /// Enable waterfall display
    #[arg(long)]
    waterfall: bool,

    /// Average last N sweeps for line plot
    #[arg(long, default_value_t = 1)]
    avg: usize,

    /// Number of sweeps to keep in waterfall buffer
    #[arg(long, default_value_t = 100)]
    buf: usize,

    /// Update rate (frames per second)
    #[arg(long, default_value_t = 4.0)]
    fps: f64,

    /// Completed sweeps queued before the oldest is dropped (0 = unbounded)
    #[arg(long, default_value_t = drivers::queue::DEFAULT_QUEUE_DEPTH)]
    queue_depth: usize,

    /// Run without a window; log progress and exit when the source ends
    #[arg(long)]
    headless: bool,

    /// Where snapshots are written (headless mode saves one on exit)
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn into_config(self) -> anyhow::Result<AppConfig> {
        let source = if self.simulate {
            SourceKind::Simulated
        } else if let Some(path) = self.input {
            SourceKind::Replay(path)
        } else {
            let args = shlex::split(&self.sweep_args)
                .with_context(|| format!("unbalanced quotes in --sweep-args: {}", self.sweep_args))?;
            SourceKind::Process {
                program: self.program,
                args,
            }
        };
        Ok(AppConfig {
            source,
            pipeline: PipelineConfig {
                capacity: self.buf,
                avg: self.avg,
                waterfall: self.waterfall,
                queue_depth: self.queue_depth,
            },
            fps: self.fps,
            headless: self.headless,
            snapshot_dir: self.snapshot_dir,
        })
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

// 入口函数
fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let config = args.into_config()?;

    if config.headless {
        return engine::run_headless(&config);
    }

    let (pipeline, label) = match engine::start_pipeline(&config) {
        Ok(started) => started,
        Err(err) => {
            if let Some(SweepError::ProgramNotFound { program }) = err.downcast_ref::<SweepError>() {
                eprintln!("{program} not found in PATH.");
                return Ok(());
            }
            return Err(err);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 760.0])
            .with_title(format!("SweepScope - {label}")),
        ..Default::default()
    };
    eframe::run_native(
        "SweepScope",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Box::new(gui::SweepScopeApp::new(config, pipeline, label))
        }),
    )
    .map_err(|err| anyhow!("window failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_help_text() {
        let config = Args::parse_from(["sweepscope"]).into_config().unwrap();
        assert_eq!(
            config.source,
            SourceKind::Process { program: "hackrf_sweep".into(), args: vec![] }
        );
        assert_eq!(config.pipeline.capacity, 100);
        assert_eq!(config.pipeline.avg, 1);
        assert!(!config.pipeline.waterfall);
        assert_eq!(config.fps, 4.0);
    }

    #[test]
    fn sweep_args_are_split() {
        let config = Args::parse_from([
            "sweepscope", "--sweep-args", "-f 174:230 -w 5000", "--waterfall", "--avg", "3",
        ])
        .into_config().unwrap();
        assert_eq!(
            config.source,
            SourceKind::Process {
                program: "hackrf_sweep".into(),
                args: vec!["-f".into(), "174:230".into(), "-w".into(), "5000".into()],
            }
        );
        assert!(config.pipeline.waterfall);
        assert_eq!(config.pipeline.avg, 3);
    }

    #[test]
    fn replay_and_simulate_select_source() {
        let replay = Args::parse_from(["sweepscope", "-i", "capture.csv"]).into_config().unwrap();
        assert_eq!(replay.source, SourceKind::Replay("capture.csv".into()));
        let sim = Args::parse_from(["sweepscope", "--simulate", "--headless"]).into_config().unwrap();
        assert_eq!(sim.source, SourceKind::Simulated);
        assert!(sim.headless);
    }

    #[test]
    fn quoted_sweep_args_stay_whole() {
        let config = Args::parse_from([
            "sweepscope", "--sweep-args", "-f 88:110 -r \"my capture.csv\"",
        ])
        .into_config()
        .unwrap();
        assert_eq!(
            config.source,
            SourceKind::Process {
                program: "hackrf_sweep".into(),
                args: vec!["-f".into(), "88:110".into(), "-r".into(), "my capture.csv".into()],
            }
        );
    }

    #[test]
    fn unbalanced_quote_is_rejected() {
        let err = Args::parse_from(["sweepscope", "--sweep-args", "-f \"88:110"])
            .into_config()
            .unwrap_err();
        assert!(err.to_string().contains("unbalanced quotes"));
    }
}
