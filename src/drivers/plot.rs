use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;
use crate::drivers::aggregate::{DisplayFrame, WaterfallView};
use crate::drivers::colormap::{waterfall_rgb, Colormap};
use crate::drivers::error::SweepError;
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub line: RGBColor,
    pub colormap: Colormap,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1500,
            height: 600,
            background: RGBColor(10, 10, 10),
            line: CYAN,
            colormap: Colormap::Viridis,
        }
    }
}
/// Line plot of the mean curve, frequency in MHz against power in dB.
pub fn render_spectrum_png(frame: &DisplayFrame, style: &PlotStyle) -> Result<Vec<u8>, SweepError> {
    let (Some(&x_min), Some(&x_max)) = (frame.x_axis_mhz.first(), frame.x_axis_mhz.last()) else {
        return Err(SweepError::Plot("frame has no frequency axis".into()));
    };
    let (y_min, y_max) = frame
        .power_range()
        .ok_or_else(|| SweepError::Plot("frame has no finite power values".into()))?;
    let (y_min, y_max) = if (y_max - y_min).abs() < f64::EPSILON {
        (y_min - 5.0, y_max + 5.0)
    } else {
        (y_min - 2.0, y_max + 2.0)
    };
    let x_max = if x_max > x_min { x_max } else { x_min + 1.0 };
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                format!("Sweep average ({} sweeps buffered)", frame.sweeps_buffered),
                ("sans-serif", 20).into_font().color(&WHITE),
            )
            .set_label_area_size(LabelAreaPosition::Left, 55)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        chart
            .configure_mesh()
            .x_desc("Frequency (MHz)")
            .y_desc("Power (dB)")
            .axis_desc_style(("sans-serif", 14).into_font().color(&WHITE))
            .label_style(("sans-serif", 12).into_font().color(&WHITE))
            .light_line_style(&WHITE.mix(0.1))
            .draw()?;
        let series = frame
            .x_axis_mhz
            .iter()
            .copied()
            .zip(frame.mean_curve.iter().copied())
            .filter(|(_, p)| p.is_finite());
        chart.draw_series(LineSeries::new(series, &style.line))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// The waterfall as an image, one pixel per bin and sweep, newest sweep on top.
pub fn render_waterfall_png(view: &WaterfallView, style: &PlotStyle) -> Result<Vec<u8>, SweepError> {
    let (width, height, pixels) = waterfall_rgb(&view.rows, style.colormap);
    if width == 0 || height == 0 {
        return Err(SweepError::Plot("waterfall is empty".into()));
    }
    encode_png(&pixels, width as u32, height as u32)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, SweepError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| SweepError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
