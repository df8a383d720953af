use ndarray::Array2;
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Colormap {
    #[default]
    Viridis,
    Grayscale,
}
impl Colormap {
    /// Map a value in 0..=1 to RGB.
    pub fn map(&self, value: f64) -> [u8; 3] {
        let t = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
        match self {
            Colormap::Viridis => viridis(t),
            Colormap::Grayscale => {
                let v = (t * 255.0) as u8;
                [v, v, v]
            }
        }
    }
}
// Polynomial fit of matplotlib's viridis.
fn viridis(t: f64) -> [u8; 3] {
    let r = (0.267 + t * (0.329 + t * (1.451 + t * (-1.808 + t * 0.758)))).clamp(0.0, 1.0);
    let g = (0.004 + t * (1.513 + t * (-0.838 + t * (0.731 - t * 0.466)))).clamp(0.0, 1.0);
    let b = (0.329 + t * (1.442 + t * (-2.642 + t * (1.963 - t * 0.440)))).clamp(0.0, 1.0);
    [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
}
/// Min and max over the finite values, if any.
pub fn finite_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
/// Packed RGB pixels (`width = bins`, `height = sweeps`) with the newest sweep
/// on the top row, auto-scaled to the matrix's own range.
pub fn waterfall_rgb(rows: &Array2<f64>, colormap: Colormap) -> (usize, usize, Vec<u8>) {
    let (height, width) = rows.dim();
    let (lo, hi) = finite_range(rows.iter()).unwrap_or((0.0, 1.0));
    let span = if hi > lo { hi - lo } else { 1.0 };
    let mut pixels = Vec::with_capacity(width * height * 3);
    for row in rows.outer_iter().rev() {
        for value in row.iter() {
            pixels.extend_from_slice(&colormap.map((value - lo) / span));
        }
    }
    (width, height, pixels)
}
