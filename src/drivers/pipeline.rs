use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use crate::drivers::aggregate::{Aggregator, DisplayFrame};
use crate::drivers::assembler::SweepAssembler;
use crate::drivers::axis::AxisRegistry;
use crate::drivers::buffer::SweepBuffer;
use crate::drivers::queue::{handoff, SweepEvent, SweepReceiver, SweepSender, DEFAULT_QUEUE_DEPTH};
use crate::drivers::record::parse_record;
use crate::drivers::source::{SourceEnd, SourceRead, SweepSource};
use crate::drivers::SweepError;
/// Sleep between polls while the source is alive but has nothing to read.
pub const IDLE_SLEEP: Duration = Duration::from_millis(10);
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Number of sweeps kept for the waterfall.
    pub capacity: usize,
    /// Number of newest sweeps averaged into the line plot.
    pub avg: usize,
    pub waterfall: bool,
    pub queue_depth: usize,
}
impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            avg: 1,
            waterfall: false,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}
/// Result of one consumer tick.
#[derive(Debug, Default)]
pub struct Tick {
    /// Sweeps moved from the queue into the buffer during this tick.
    pub drained: usize,
    pub frame: Option<DisplayFrame>,
    /// Set only on the tick that observed the end of the source.
    pub ended: Option<SourceEnd>,
}
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub sweeps_received: u64,
    pub sweeps_buffered: usize,
    pub buffer_capacity: usize,
    pub sweeps_dropped: u64,
    pub sweeps_resampled: u64,
    pub sweeps_queued: usize,
}
/// Blocking read loop run on the producer thread.
///
/// Lines go through the parser and assembler; every completed sweep is queued,
/// followed by exactly one `SweepEvent::End`.
pub fn run_producer<S: SweepSource>(mut source: S, tx: SweepSender, stop: Arc<AtomicBool>) {
    let mut assembler = SweepAssembler::new();
    let mut dropped_lines = 0u64;
    let end = loop {
        if stop.load(Ordering::Relaxed) {
            break SourceEnd::Cancelled;
        }
        match source.read_line() {
            Ok(SourceRead::Line(line)) => {
                let Some(chunk) = parse_record(&line) else {
                    dropped_lines += 1;
                    log::trace!("dropped line: {}", line.trim_end());
                    continue;
                };
                if let Some(sweep) = assembler.push(chunk) {
                    tx.send(SweepEvent::Sweep(sweep));
                }
            }
            Ok(SourceRead::Idle) => thread::sleep(IDLE_SLEEP),
            Ok(SourceRead::End(end)) => break end,
            Err(err) => {
                log::error!("{}: {err}", source.describe());
                break SourceEnd::Failed(err.to_string());
            }
        }
    };
    source.shutdown();
    log::debug!("flushing {} pending chunks", assembler.pending_chunks());
    if let Some(sweep) = assembler.finish() {
        tx.send(SweepEvent::Sweep(sweep));
    }
    let stats = assembler.stats();
    log::info!(
        "{} ended ({end}): {} sweeps, {} dropped lines, {} overlap warnings, {} sweeps dropped from a full queue",
        source.describe(),
        stats.sweeps_emitted,
        dropped_lines,
        stats.overlap_warnings,
        tx.dropped()
    );
    tx.send(SweepEvent::End(end));
}
/// Consumer-side state: canonical axis, rolling buffer and the producer link.
///
/// `tick` is meant to be called at a fixed cadence from a single thread; it only
/// ever drains what is already queued.
pub struct SweepPipeline {
    events: SweepReceiver,
    stop: Arc<AtomicBool>,
    producer: Option<JoinHandle<()>>,
    axis: AxisRegistry,
    buffer: SweepBuffer,
    aggregator: Aggregator,
    ended: Option<SourceEnd>,
    sweeps_received: u64,
}
impl SweepPipeline {
    /// Starts the producer thread for `source`.
    pub fn spawn<S>(source: S, config: &PipelineConfig) -> Result<Self, SweepError>
    where
        S: SweepSource + Send + 'static,
    {
        let (tx, rx) = handoff(config.queue_depth);
        let stop = Arc::new(AtomicBool::new(false));
        let producer_stop = stop.clone();
        let handle = thread::Builder::new()
            .name("sweep-reader".into())
            .spawn(move || run_producer(source, tx, producer_stop))?;
        let mut pipeline = Self::with_receiver(rx, stop, config);
        pipeline.producer = Some(handle);
        Ok(pipeline)
    }
    /// Consumer attached to an existing queue; the caller drives the producer.
    pub fn with_receiver(
        events: SweepReceiver,
        stop: Arc<AtomicBool>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            events,
            stop,
            producer: None,
            axis: AxisRegistry::new(),
            buffer: SweepBuffer::with_capacity(config.capacity),
            aggregator: Aggregator::new(config.avg, config.waterfall),
            ended: None,
            sweeps_received: 0,
        }
    }
    pub fn tick(&mut self) -> Tick {
        let mut tick = Tick::default();
        if self.ended.is_none() {
            tick.drained = self.drain(&mut tick.ended);
        }
        tick.frame = self.current_frame();
        tick
    }
    /// Takes at most what was queued on entry; events arriving meanwhile wait
    /// for the next tick. An empty queue is still polled once so a vanished
    /// producer is noticed.
    fn drain(&mut self, ended: &mut Option<SourceEnd>) -> usize {
        let mut drained = 0;
        let budget = self.events.len().max(1);
        for _ in 0..budget {
            let end = match self.events.try_next() {
                Ok(Some(SweepEvent::Sweep(sweep))) => {
                    let aligned = self.axis.register_or_align(sweep);
                    self.buffer.push(aligned);
                    self.sweeps_received += 1;
                    drained += 1;
                    continue;
                }
                Ok(Some(SweepEvent::End(end))) => end,
                Ok(None) => break,
                Err(err) => SourceEnd::Failed(err.to_string()),
            };
            log::info!("{end}; no further sweeps will arrive");
            self.stop.store(true, Ordering::Relaxed);
            self.ended = Some(end.clone());
            *ended = Some(end);
            break;
        }
        drained
    }
    /// Aggregates the current buffer without draining the queue.
    pub fn current_frame(&self) -> Option<DisplayFrame> {
        let axis = self.axis.canonical()?;
        self.aggregator.frame(&self.buffer, axis)
    }
    /// Clears the history; the next sweep defines a new canonical axis.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.axis.reset();
        log::info!("buffer and frequency axis reset");
    }
    /// Asks the producer to exit at its next read.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
    pub fn source_end(&self) -> Option<&SourceEnd> {
        self.ended.as_ref()
    }
    pub fn set_avg(&mut self, avg: usize) {
        self.aggregator.avg = avg.max(1);
    }
    pub fn avg(&self) -> usize {
        self.aggregator.avg
    }
    pub fn waterfall_enabled(&self) -> bool {
        self.aggregator.waterfall
    }
    pub fn canonical_axis(&self) -> Option<&[f64]> {
        self.axis.canonical()
    }
    /// `(frequency_hz, power)` pairs of the canonical axis and the current mean curve.
    pub fn export_snapshot(&self) -> Option<Vec<(f64, f64)>> {
        let axis = self.axis.canonical()?;
        let mean = self.aggregator.mean_curve(&self.buffer)?;
        Some(axis.iter().copied().zip(mean).collect())
    }
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            sweeps_received: self.sweeps_received,
            sweeps_buffered: self.buffer.len(),
            buffer_capacity: self.buffer.capacity(),
            sweeps_dropped: self.events.dropped(),
            sweeps_resampled: self.axis.resampled_count(),
            sweeps_queued: self.events.len(),
        }
    }
}
impl Drop for SweepPipeline {
    fn drop(&mut self) {
        self.stop();
        // The reader may be parked in a blocking read; let it finish on its own.
        if let Some(handle) = self.producer.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}
