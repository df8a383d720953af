use ndarray::{Array1, Array2, Axis};
use crate::drivers::axis::interp;
use crate::drivers::buffer::SweepBuffer;
pub const HZ_PER_MHZ: f64 = 1.0e6;
/// Stacked history ready to draw as an image, oldest row first.
#[derive(Clone, Debug)]
pub struct WaterfallView {
    pub rows: Array2<f64>, // sweeps x bins
    /// `[x_min, x_max, y_min, y_max]` with x in MHz and y in sweeps.
    pub extent: [f64; 4],
}
/// What the renderer receives once per tick.
#[derive(Clone, Debug)]
pub struct DisplayFrame {
    pub x_axis_mhz: Vec<f64>,
    pub mean_curve: Vec<f64>,
    pub waterfall: Option<WaterfallView>,
    pub sweeps_buffered: usize,
}
impl DisplayFrame {
    pub fn power_range(&self) -> Option<(f64, f64)> {
        let mut values = self.mean_curve.iter().copied().filter(|v| v.is_finite());
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}
/// Derives the mean curve and waterfall from the buffer. Pure with respect to
/// its inputs; an empty buffer or axis produces nothing.
#[derive(Clone, Copy, Debug)]
pub struct Aggregator {
    pub avg: usize,
    pub waterfall: bool,
}
impl Aggregator {
    pub fn new(avg: usize, waterfall: bool) -> Self {
        Self { avg, waterfall }
    }
    /// Element-wise mean of the newest `avg` rows on the canonical axis.
    pub fn mean_curve(&self, buffer: &SweepBuffer) -> Option<Vec<f64>> {
        if buffer.is_empty() {
            return None;
        }
        let recent = buffer.snapshot(self.avg.max(1));
        let stacked = stack_rows(&recent)?;
        stacked.mean_axis(Axis(0)).map(|mean| mean.to_vec())
    }
    pub fn frame(&self, buffer: &SweepBuffer, axis: &[f64]) -> Option<DisplayFrame> {
        if axis.is_empty() {
            return None;
        }
        let mean = self.mean_curve(buffer)?;
        let (x_axis, mean_curve) = if axis.len() > 1 {
            let even = even_axis(axis);
            let regridded = interp(&even, axis, &mean);
            (even, regridded)
        } else {
            (axis.to_vec(), mean)
        };
        let waterfall = if self.waterfall {
            waterfall_matrix(buffer, axis).map(|rows| WaterfallView {
                extent: [
                    x_axis[0] / HZ_PER_MHZ,
                    x_axis[x_axis.len() - 1] / HZ_PER_MHZ,
                    0.0,
                    rows.nrows() as f64,
                ],
                rows,
            })
        } else {
            None
        };
        Some(DisplayFrame {
            x_axis_mhz: x_axis.iter().map(|f| f / HZ_PER_MHZ).collect(),
            mean_curve,
            waterfall,
            sweeps_buffered: buffer.len(),
        })
    }
}
/// `len(axis)` evenly spaced points from the lowest to the highest frequency.
pub fn even_axis(axis: &[f64]) -> Vec<f64> {
    let n = axis.len();
    if n < 2 {
        return axis.to_vec();
    }
    let lo = axis.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = axis.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let step = (hi - lo) / (n - 1) as f64;
    (0..n)
        .map(|i| if i == n - 1 { hi } else { lo + i as f64 * step })
        .collect()
}
/// Every buffered row, oldest first, re-gridded onto `even_axis(axis)`.
pub fn waterfall_matrix(buffer: &SweepBuffer, axis: &[f64]) -> Option<Array2<f64>> {
    let rows: Vec<Vec<f64>> = buffer.iter().cloned().collect();
    let stacked = stack_rows(&rows)?;
    if axis.len() < 2 || stacked.ncols() != axis.len() {
        return Some(stacked);
    }
    let even = even_axis(axis);
    let mut out = Array2::<f64>::zeros(stacked.raw_dim());
    for (mut dst, src) in out.rows_mut().into_iter().zip(stacked.rows()) {
        let regridded = interp(&even, axis, &src.to_vec());
        dst.assign(&Array1::from(regridded));
    }
    Some(out)
}
fn stack_rows(rows: &[Vec<f64>]) -> Option<Array2<f64>> {
    let width = rows.first()?.len();
    if width == 0 {
        return None;
    }
    if rows.iter().any(|r| r.len() != width) {
        log::warn!("buffered rows disagree on length; skipping aggregation");
        return None;
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), width), flat).ok()
}
