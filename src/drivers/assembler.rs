use crate::drivers::record::SweepChunk;
/// A full-spectrum sweep rebuilt from every chunk that shared one timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct AssembledSweep {
    pub timestamp: String,
    pub freqs: Vec<f64>,
    pub power: Vec<f64>,
}
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    pub sweeps_emitted: u64,
    pub overlap_warnings: u64,
}
/// Groups chunks into sweeps. A sweep is complete when a chunk with a different
/// timestamp arrives, or when the stream ends.
#[derive(Debug, Default)]
pub struct SweepAssembler {
    current_timestamp: Option<String>,
    pending: Vec<SweepChunk>,
    stats: AssemblerStats,
}
impl SweepAssembler {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }
    pub fn pending_chunks(&self) -> usize {
        self.pending.len()
    }
    /// Feeds one chunk; returns the previous sweep if this chunk closed it.
    pub fn push(&mut self, chunk: SweepChunk) -> Option<AssembledSweep> {
        if self.current_timestamp.as_deref() == Some(chunk.timestamp.as_str()) {
            self.pending.push(chunk);
            return None;
        }
        let finished = self.flush();
        self.current_timestamp = Some(chunk.timestamp.clone());
        self.pending.push(chunk);
        finished
    }
    /// Emits whatever is pending. Called once the source has ended.
    pub fn finish(&mut self) -> Option<AssembledSweep> {
        let finished = self.flush();
        self.current_timestamp = None;
        finished
    }
    fn flush(&mut self) -> Option<AssembledSweep> {
        if self.pending.is_empty() {
            return None;
        }
        let mut chunks = std::mem::take(&mut self.pending);
        chunks.sort_by(|a, b| a.freq_low.total_cmp(&b.freq_low));
        let timestamp = chunks[0].timestamp.clone();
        let total: usize = chunks.iter().map(|c| c.samples.len()).sum();
        let mut freqs = Vec::with_capacity(total);
        let mut power = Vec::with_capacity(total);
        let mut previous_high: Option<f64> = None;
        for chunk in &chunks {
            if let Some(high) = previous_high {
                if chunk.freq_low < high {
                    self.stats.overlap_warnings += 1;
                    log::warn!(
                        "sweep {timestamp}: chunk at {} Hz overlaps previous chunk ending at {high} Hz",
                        chunk.freq_low
                    );
                }
            }
            previous_high = Some(chunk.freq_high);
            freqs.extend(chunk.frequencies());
            power.extend_from_slice(&chunk.samples);
        }
        self.stats.sweeps_emitted += 1;
        Some(AssembledSweep {
            timestamp,
            freqs,
            power,
        })
    }
}
