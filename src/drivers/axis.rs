use crate::drivers::assembler::AssembledSweep;
/// Relative tolerance under which two frequency axes are considered identical.
pub const AXIS_RELATIVE_TOLERANCE: f64 = 1e-6;
/// Holds the canonical frequency axis and aligns every later sweep onto it.
#[derive(Debug, Default)]
pub struct AxisRegistry {
    canonical: Option<Vec<f64>>,
    resampled: u64,
}
impl AxisRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn canonical(&self) -> Option<&[f64]> {
        self.canonical.as_deref()
    }
    /// Number of sweeps that needed interpolation since the last reset.
    pub fn resampled_count(&self) -> u64 {
        self.resampled
    }
    /// Forget the canonical axis; the next sweep defines a new one.
    pub fn reset(&mut self) {
        self.canonical = None;
        self.resampled = 0;
    }
    /// Returns the sweep's power aligned to the canonical axis, adopting the
    /// sweep's own axis if none is registered yet.
    pub fn register_or_align(&mut self, sweep: AssembledSweep) -> Vec<f64> {
        let (freqs, power) = sorted_by_frequency(sweep.freqs, sweep.power);
        let Some(canonical) = self.canonical.as_deref() else {
            log::info!(
                "canonical axis set from sweep {}: {} points",
                sweep.timestamp,
                freqs.len()
            );
            self.canonical = Some(freqs);
            return power;
        };
        if axes_match(&freqs, canonical) {
            return power;
        }
        log::debug!(
            "sweep {} resampled: {} -> {} points",
            sweep.timestamp,
            freqs.len(),
            canonical.len()
        );
        let aligned = interp(canonical, &freqs, &power);
        self.resampled += 1;
        aligned
    }
}
fn sorted_by_frequency(freqs: Vec<f64>, power: Vec<f64>) -> (Vec<f64>, Vec<f64>) {
    if freqs.windows(2).all(|w| w[0] <= w[1]) {
        return (freqs, power);
    }
    let mut order: Vec<usize> = (0..freqs.len()).collect();
    order.sort_by(|&a, &b| freqs[a].total_cmp(&freqs[b]));
    let sorted_freqs = order.iter().map(|&i| freqs[i]).collect();
    let sorted_power = order.iter().map(|&i| power[i]).collect();
    (sorted_freqs, sorted_power)
}
/// Same length and every point within `AXIS_RELATIVE_TOLERANCE` of its counterpart.
pub fn axes_match(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            (x - y).abs() <= AXIS_RELATIVE_TOLERANCE * x.abs().max(y.abs()).max(1.0)
        })
}
/// Piecewise-linear interpolation of `(xp, fp)` at each point of `x`.
///
/// `xp` must be ascending. Points outside `[xp[0], xp[last]]` take the value of
/// the nearest edge sample. An empty `xp` yields NaN everywhere.
pub fn interp(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    let n = xp.len().min(fp.len());
    if n == 0 {
        return vec![f64::NAN; x.len()];
    }
    let (xp, fp) = (&xp[..n], &fp[..n]);
    x.iter()
        .map(|&v| {
            if v <= xp[0] {
                return fp[0];
            }
            if v >= xp[n - 1] {
                return fp[n - 1];
            }
            // First index with xp[hi] > v; 1 <= hi <= n - 1 here.
            let hi = xp.partition_point(|&p| p <= v);
            let lo = hi - 1;
            let span = xp[hi] - xp[lo];
            if span <= 0.0 {
                return fp[lo];
            }
            let t = (v - xp[lo]) / span;
            fp[lo] + t * (fp[hi] - fp[lo])
        })
        .collect()
}
#[cfg(test)]
mod tests {
    use super::*;
    fn sweep(freqs: &[f64], power: &[f64]) -> AssembledSweep {
        AssembledSweep {
            timestamp: "t".into(),
            freqs: freqs.to_vec(),
            power: power.to_vec(),
        }
    }
    #[test]
    fn first_sweep_defines_axis() {
        let mut registry = AxisRegistry::new();
        let power = registry.register_or_align(sweep(&[1.0, 2.0, 3.0], &[5.0, 6.0, 7.0]));
        assert_eq!(power, vec![5.0, 6.0, 7.0]);
        assert_eq!(registry.canonical().unwrap(), &[1.0, 2.0, 3.0]);
    }
    #[test]
    fn matching_axis_returns_samples_untouched() {
        let mut registry = AxisRegistry::new();
        registry.register_or_align(sweep(&[1.0e9, 1.1e9, 1.2e9], &[0.0, 0.0, 0.0]));
        let original = vec![-61.3, -72.9, -55.01];
        let power = registry.register_or_align(sweep(&[1.0e9 + 10.0, 1.1e9, 1.2e9], &original));
        assert_eq!(power, original);
        assert_eq!(registry.resampled_count(), 0);
    }
    #[test]
    fn aligned_length_follows_canonical_axis() {
        let mut registry = AxisRegistry::new();
        registry.register_or_align(sweep(&[0.0, 10.0, 20.0, 30.0], &[0.0; 4]));
        let longer = registry.register_or_align(sweep(
            &[0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0],
            &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        ));
        assert_eq!(longer, vec![0.0, 2.0, 4.0, 6.0]);
        let shorter = registry.register_or_align(sweep(&[5.0, 25.0], &[1.0, 3.0]));
        assert_eq!(shorter, vec![1.0, 1.5, 2.5, 3.0]);
        assert_eq!(registry.resampled_count(), 2);
    }
    #[test]
    fn unsorted_sweep_is_sorted_before_alignment() {
        let mut registry = AxisRegistry::new();
        registry.register_or_align(sweep(&[0.0, 1.0, 2.0], &[0.0; 3]));
        let power = registry.register_or_align(sweep(&[2.0, 0.0, 1.0], &[30.0, 10.0, 20.0]));
        assert_eq!(power, vec![10.0, 20.0, 30.0]);
    }
    #[test]
    fn reset_allows_new_axis() {
        let mut registry = AxisRegistry::new();
        registry.register_or_align(sweep(&[0.0, 1.0], &[1.0, 1.0]));
        registry.reset();
        let power = registry.register_or_align(sweep(&[5.0, 6.0, 7.0], &[1.0, 2.0, 3.0]));
        assert_eq!(power, vec![1.0, 2.0, 3.0]);
        assert_eq!(registry.canonical().unwrap(), &[5.0, 6.0, 7.0]);
    }
    #[test]
    fn interp_clamps_at_edges() {
        let out = interp(&[-1.0, 0.0, 0.5, 1.0, 2.0], &[0.0, 1.0], &[10.0, 20.0]);
        assert_eq!(out, vec![10.0, 10.0, 15.0, 20.0, 20.0]);
    }
    #[test]
    fn axes_match_requires_equal_length() {
        assert!(axes_match(&[1.0, 2.0], &[1.0, 2.0]));
        assert!(!axes_match(&[1.0, 2.0], &[1.0, 2.0, 3.0]));
        assert!(!axes_match(&[1.0e6, 2.0e6], &[1.0e6, 2.1e6]));
    }
}
