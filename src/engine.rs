// src/engine.rs
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use std::thread;
use anyhow::{Context, Result};
use crate::drivers::{
    DisplayFrame, ProcessSource, ReaderSource, SimulatedSource, SimulationConfig, SweepPipeline,
    SweepSource,
};
use crate::recorder::SnapshotRecorder;
use crate::types::{AppConfig, SourceKind};

/// 根据配置打开数据来源
pub fn open_source(kind: &SourceKind) -> Result<Box<dyn SweepSource + Send>> {
    let source: Box<dyn SweepSource + Send> = match kind {
        SourceKind::Process { program, args } => Box::new(ProcessSource::spawn(program, args)?),
        SourceKind::Replay(path) if path == Path::new("-") => {
            Box::new(ReaderSource::new(BufReader::new(io::stdin()), "stdin"))
        }
        SourceKind::Replay(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open capture {}", path.display()))?;
            Box::new(ReaderSource::new(BufReader::new(file), path.display().to_string()))
        }
        SourceKind::Simulated => Box::new(SimulatedSource::new(SimulationConfig::default())),
    };
    Ok(source)
}

/// 启动后台读取线程
pub fn start_pipeline(config: &AppConfig) -> Result<(SweepPipeline, String)> {
    let source = open_source(&config.source)?;
    let label = source.describe();
    let pipeline = SweepPipeline::spawn(source, &config.pipeline)
        .context("failed to start the sweep reader thread")?;
    log::info!(
        "⚙️ pipeline ready: source={label}, buffer={}, avg={}, waterfall={}",
        config.pipeline.capacity,
        config.pipeline.avg,
        config.pipeline.waterfall
    );
    Ok((pipeline, label))
}

/// Peak of the mean curve as `(frequency_mhz, power)`.
pub fn peak(frame: &DisplayFrame) -> Option<(f64, f64)> {
    frame
        .x_axis_mhz
        .iter()
        .copied()
        .zip(frame.mean_curve.iter().copied())
        .filter(|(_, p)| p.is_finite())
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

/// 无界面模式：按 fps 节拍 tick，直到数据源结束
pub fn run_headless(config: &AppConfig) -> Result<()> {
    let (mut pipeline, label) = start_pipeline(config)?;
    let interval = config.tick_interval();
    let end = loop {
        let tick = pipeline.tick();
        if tick.drained > 0 {
            let stats = pipeline.stats();
            match tick.frame.as_ref().and_then(peak) {
                Some((mhz, db)) => log::info!(
                    "{} sweeps ({} buffered, {} dropped), peak {db:.1} dB at {mhz:.3} MHz",
                    stats.sweeps_received,
                    stats.sweeps_buffered,
                    stats.sweeps_dropped
                ),
                None => log::info!("{} sweeps", stats.sweeps_received),
            }
        }
        if let Some(end) = tick.ended {
            break end;
        }
        thread::sleep(interval);
    };
    log::info!("{label}: {end}");
    if let Some(dir) = &config.snapshot_dir {
        let recorder = SnapshotRecorder::new(dir);
        match recorder.save(&pipeline, &label)? {
            Some(saved) => log::info!("wrote {} files to {}", saved.files.len(), recorder.dir().display()),
            None => log::warn!("no sweeps received; nothing to save"),
        }
    }
    Ok(())
}
