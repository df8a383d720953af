// src/types.rs
use std::path::PathBuf;
use std::time::Duration;
use crate::drivers::PipelineConfig;

// 数据来源
#[derive(Clone, Debug, PartialEq)]
pub enum SourceKind {
    // 外部扫频程序 (hackrf_sweep)
    Process { program: String, args: Vec<String> },
    // 回放已录制的 CSV，"-" 表示标准输入
    Replay(PathBuf),
    // 无硬件模拟
    Simulated,
}

// 应用配置 (由命令行生成)
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub source: SourceKind,
    pub pipeline: PipelineConfig,
    pub fps: f64,
    pub headless: bool,
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Process {
                program: "hackrf_sweep".to_owned(),
                args: Vec::new(),
            },
            pipeline: PipelineConfig::default(),
            fps: 4.0,
            headless: false,
            snapshot_dir: None,
        }
    }
}

impl AppConfig {
    /// Time between consumer ticks; never below 10 ms.
    pub fn tick_interval(&self) -> Duration {
        let fps = if self.fps.is_finite() && self.fps > 0.0 { self.fps } else { 4.0 };
        Duration::from_secs_f64(1.0 / fps).max(Duration::from_millis(10))
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.snapshot_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
