// src/drivers/mod.rs
// 扫频数据核心：解析 -> 拼接 -> 频率轴对齐 -> 环形缓冲 -> 聚合
pub mod aggregate;
pub mod assembler;
pub mod axis;
pub mod buffer;
pub mod colormap;
pub mod error;
pub mod pipeline;
pub mod plot;
pub mod queue;
pub mod record;
pub mod simulate;
pub mod source;
// 公开导出常用类型，方便外部调用
pub use aggregate::{DisplayFrame, WaterfallView};
pub use colormap::Colormap;
pub use error::SweepError;
pub use pipeline::{PipelineConfig, SweepPipeline};
pub use plot::{render_spectrum_png, render_waterfall_png, PlotStyle};
pub use simulate::{SimulatedSource, SimulationConfig};
pub use source::{ProcessSource, ReaderSource, SweepSource};
