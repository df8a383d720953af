use std::collections::VecDeque;
use std::time::{Duration, Instant};
use chrono::Local;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::drivers::source::{SourceRead, SweepSource};
use crate::drivers::SweepError;
/// A synthetic carrier: centre frequency (Hz), peak above the floor (dB), width (Hz).
#[derive(Clone, Copy, Debug)]
pub struct Carrier {
    pub freq_hz: f64,
    pub level_db: f64,
    pub width_hz: f64,
}
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub freq_min_hz: f64,
    pub freq_max_hz: f64,
    /// Span of one emitted record.
    pub chunk_hz: f64,
    pub bins_per_chunk: usize,
    pub noise_floor_db: f64,
    pub carriers: Vec<Carrier>,
    pub sweep_interval: Duration,
    /// Every n-th sweep uses one extra bin per chunk to mimic bin-layout drift.
    pub drift_every: Option<u64>,
}
impl Default for SimulationConfig {
    fn default() -> Self {
        // FM broadcast band, same span as `hackrf_sweep -f 88:110`.
        Self {
            freq_min_hz: 88.0e6,
            freq_max_hz: 110.0e6,
            chunk_hz: 5.0e6,
            bins_per_chunk: 100,
            noise_floor_db: -85.0,
            carriers: vec![
                Carrier { freq_hz: 91.2e6, level_db: 40.0, width_hz: 80.0e3 },
                Carrier { freq_hz: 97.6e6, level_db: 30.0, width_hz: 80.0e3 },
                Carrier { freq_hz: 104.9e6, level_db: 35.0, width_hz: 80.0e3 },
            ],
            sweep_interval: Duration::from_millis(250),
            drift_every: Some(7),
        }
    }
}
/// Produces `hackrf_sweep`-formatted records without hardware.
pub struct SimulatedSource {
    config: SimulationConfig,
    rng: StdRng,
    pending: VecDeque<String>,
    sweeps: u64,
    next_sweep_at: Instant,
}
impl SimulatedSource {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }
    pub fn with_seed(config: SimulationConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
    fn with_rng(config: SimulationConfig, rng: StdRng) -> Self {
        Self {
            config,
            rng,
            pending: VecDeque::new(),
            sweeps: 0,
            next_sweep_at: Instant::now(),
        }
    }
    fn power_at(&mut self, freq_hz: f64) -> f64 {
        let mut level = self.config.noise_floor_db + self.rng.gen_range(-3.0..3.0);
        for carrier in &self.config.carriers {
            let x = (freq_hz - carrier.freq_hz) / carrier.width_hz;
            level += carrier.level_db * (-x * x).exp();
        }
        level
    }
    fn queue_sweep(&mut self) {
        let now = Local::now();
        let date = now.format("%Y-%m-%d").to_string();
        // Sweep counter in the fractional seconds keeps back-to-back sweeps distinct.
        let time = format!("{}.{:06}", now.format("%H:%M:%S"), self.sweeps % 1_000_000);
        let drift = matches!(self.config.drift_every, Some(n) if n > 0 && self.sweeps % n == n - 1);
        let bins = self.config.bins_per_chunk.max(1) + usize::from(drift);
        let mut low = self.config.freq_min_hz;
        while low < self.config.freq_max_hz {
            let high = (low + self.config.chunk_hz).min(self.config.freq_max_hz);
            let bin_width = (high - low) / bins as f64;
            let mut line = format!("{date}, {time}, {low:.0}, {high:.0}, {bin_width:.2}, {bins}");
            for i in 0..bins {
                let power = self.power_at(low + i as f64 * bin_width);
                line.push_str(&format!(", {power:.2}"));
            }
            self.pending.push_back(line);
            low = high;
        }
        self.sweeps += 1;
    }
}
impl SweepSource for SimulatedSource {
    fn read_line(&mut self) -> Result<SourceRead, SweepError> {
        if self.pending.is_empty() {
            if Instant::now() < self.next_sweep_at {
                return Ok(SourceRead::Idle);
            }
            self.next_sweep_at = Instant::now() + self.config.sweep_interval;
            self.queue_sweep();
        }
        Ok(self
            .pending
            .pop_front()
            .map(SourceRead::Line)
            .unwrap_or(SourceRead::Idle))
    }
    fn describe(&self) -> String {
        "simulator".into()
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::assembler::SweepAssembler;
    use crate::drivers::record::parse_record;
    fn config() -> SimulationConfig {
        SimulationConfig {
            sweep_interval: Duration::ZERO,
            ..SimulationConfig::default()
        }
    }
    fn next_line(source: &mut SimulatedSource) -> String {
        match source.read_line().unwrap() {
            SourceRead::Line(line) => line,
            other => panic!("expected a line, got {other:?}"),
        }
    }
    #[test]
    fn emits_parseable_records() {
        let mut source = SimulatedSource::with_seed(config(), 7);
        // 88..110 MHz in 5 MHz chunks -> 5 records per sweep.
        for _ in 0..5 {
            let chunk = parse_record(&next_line(&mut source)).unwrap();
            assert_eq!(chunk.samples.len(), 100);
            assert!(chunk.freq_low >= 88.0e6 && chunk.freq_high <= 110.0e6);
        }
    }
    #[test]
    fn sweeps_assemble_over_full_span() {
        let mut source = SimulatedSource::with_seed(config(), 1);
        let mut assembler = SweepAssembler::new();
        let mut sweeps = Vec::new();
        while sweeps.len() < 2 {
            let chunk = parse_record(&next_line(&mut source)).unwrap();
            if let Some(sweep) = assembler.push(chunk) {
                sweeps.push(sweep);
            }
        }
        assert_eq!(sweeps[0].len(), 500);
        assert_eq!(sweeps[0].freqs[0], 88.0e6);
        assert!(*sweeps[0].freqs.last().unwrap() < 110.0e6);
        assert_eq!(assembler.stats().overlap_warnings, 0);
    }
    #[test]
    fn carrier_rises_above_floor() {
        let mut source = SimulatedSource::with_seed(config(), 3);
        let peak = source.power_at(91.2e6);
        let floor = source.power_at(100.0e6);
        assert!(peak > floor + 20.0);
    }
    #[test]
    fn waits_between_sweeps() {
        let mut source = SimulatedSource::with_seed(
            SimulationConfig {
                sweep_interval: Duration::from_secs(3600),
                ..SimulationConfig::default()
            },
            5,
        );
        for _ in 0..5 {
            next_line(&mut source);
        }
        assert_eq!(source.read_line().unwrap(), SourceRead::Idle);
    }
}
