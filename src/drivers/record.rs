/// Minimum number of comma-delimited fields in a sweep record:
/// `date, time, freq_low_hz, freq_high_hz, bin_width_hz, sample_count, sample_0, ...`
pub const MIN_RECORD_FIELDS: usize = 7;
/// One parsed record: a narrow sub-band of power samples at one timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepChunk {
    pub timestamp: String,
    pub freq_low: f64,
    pub freq_high: f64,
    pub samples: Vec<f64>,
}
impl SweepChunk {
    /// Width of one bin when `[freq_low, freq_high)` is split evenly over the samples.
    pub fn bin_step(&self) -> f64 {
        (self.freq_high - self.freq_low) / self.samples.len() as f64
    }
    /// Frequency of every sample. The upper edge of the span is not sampled.
    pub fn frequencies(&self) -> impl Iterator<Item = f64> + '_ {
        let step = self.bin_step();
        (0..self.samples.len()).map(move |i| self.freq_low + i as f64 * step)
    }
}
/// Decodes one `hackrf_sweep` CSV line. Malformed lines yield `None`.
///
/// The bin width and sample count columns are informational only; the sample
/// count is whatever follows the sixth field.
pub fn parse_record(line: &str) -> Option<SweepChunk> {
    let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
    if fields.len() < MIN_RECORD_FIELDS {
        return None;
    }
    let timestamp = format!("{} {}", fields[0], fields[1]);
    let freq_low = parse_number(fields[2])?;
    let freq_high = parse_number(fields[3])?;
    if !freq_low.is_finite() || !freq_high.is_finite() || freq_low >= freq_high {
        return None;
    }
    let samples = fields[6..]
        .iter()
        .map(|f| parse_number(f))
        .collect::<Option<Vec<f64>>>()?;
    if samples.is_empty() {
        return None;
    }
    Some(SweepChunk {
        timestamp,
        freq_low,
        freq_high,
        samples,
    })
}
fn parse_number(field: &str) -> Option<f64> {
    field.parse::<f64>().ok()
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn parses_hackrf_sweep_line() {
        let line = "2019-02-08, 13:42:13.385730, 2400000000, 2405000000, 1000000.00, 20, -65.32, -70.10, -68.00, -71.25, -69.90";
        let chunk = parse_record(line).unwrap();
        assert_eq!(chunk.timestamp, "2019-02-08 13:42:13.385730");
        assert_eq!(chunk.freq_low, 2.4e9);
        assert_eq!(chunk.freq_high, 2.405e9);
        assert_eq!(chunk.samples, vec![-65.32, -70.10, -68.00, -71.25, -69.90]);
        let freqs: Vec<f64> = chunk.frequencies().collect();
        assert_eq!(freqs, vec![2.4e9, 2.401e9, 2.402e9, 2.403e9, 2.404e9]);
    }
    #[test]
    fn ignores_placeholder_bin_width() {
        let chunk = parse_record("2024-01-01,00:00:00,100,200,..,2,10,20").unwrap();
        assert_eq!(chunk.samples, vec![10.0, 20.0]);
        assert_eq!(chunk.frequencies().collect::<Vec<_>>(), vec![100.0, 150.0]);
    }
    #[test]
    fn drops_short_lines() {
        assert!(parse_record("2024-01-01,00:00:00,100,200,1,2").is_none());
        assert!(parse_record("").is_none());
        assert!(parse_record("hackrf_sweep: sweeping").is_none());
    }
    #[test]
    fn drops_non_numeric_fields() {
        assert!(parse_record("2024-01-01,00:00:00,abc,200,1,2,10").is_none());
        assert!(parse_record("2024-01-01,00:00:00,100,200,1,2,10,oops").is_none());
        assert!(parse_record("2024-01-01,00:00:00,100,200,1,2,10,").is_none());
    }
    #[test]
    fn drops_inverted_span() {
        assert!(parse_record("2024-01-01,00:00:00,200,100,1,1,10").is_none());
        assert!(parse_record("2024-01-01,00:00:00,100,100,1,1,10").is_none());
    }
}
