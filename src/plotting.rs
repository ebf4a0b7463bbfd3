//! PNG rendering of the diagnostic plots
//!
//! All renderers draw straight into an RGB canvas: heatmaps map each array
//! cell to a block of pixels through a colour ramp, charts are drawn with
//! `imageproc` primitives. Missing values (NaN) get their own colour.

use crate::errors::Result;
use crate::statistics::{LinearFit, MissingHistogram};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut,
};
use imageproc::rect::Rect;
use ndarray::ArrayView2;
use std::path::Path;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const BAR: Rgb<u8> = Rgb([70, 110, 170]);
const POINT: Rgb<u8> = Rgb([30, 120, 60]);
const TREND_LINE: Rgb<u8> = Rgb([200, 30, 30]);
const MARGIN: u32 = 20;

/// Colour scaling and cell size for heatmaps
#[derive(Debug, Clone, Copy)]
pub struct HeatmapStyle {
    /// Value mapped to the low end of the ramp
    pub min: f32,
    /// Value mapped to the high end of the ramp
    pub max: f32,
    /// Output pixels per array column
    pub cell_width: u32,
    /// Output pixels per array row
    pub cell_height: u32,
    pub missing: Rgb<u8>,
}

impl HeatmapStyle {
    /// LAI range 0-7, one pixel per cell
    #[must_use]
    pub fn lai() -> Self {
        Self {
            min: 0.0,
            max: 7.0,
            cell_width: 1,
            cell_height: 1,
            missing: Rgb([200, 200, 200]),
        }
    }

    #[must_use]
    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    #[must_use]
    pub fn with_cell_size(mut self, width: u32, height: u32) -> Self {
        self.cell_width = width.max(1);
        self.cell_height = height.max(1);
        self
    }
}

impl Default for HeatmapStyle {
    fn default() -> Self {
        Self::lai()
    }
}

/// Canvas size for line and bar charts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSize {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
        }
    }
}

/// Linear colour interpolation
fn interpolate_color(from: Rgb<u8>, to: Rgb<u8>, t: f32) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (f32::from(a) * (1.0 - t) + f32::from(b) * t).round() as u8;
    Rgb([
        mix(from[0], to[0]),
        mix(from[1], to[1]),
        mix(from[2], to[2]),
    ])
}

/// Sequential vegetation ramp for a normalized value in `[0, 1]`:
/// bare soil brown, through yellow, to dense canopy green
#[must_use]
pub fn vegetation_color(norm: f32) -> Rgb<u8> {
    match norm {
        t if t < 0.5 => interpolate_color(Rgb([140, 100, 60]), Rgb([240, 220, 90]), t / 0.5),
        t => interpolate_color(Rgb([240, 220, 90]), Rgb([0, 90, 30]), (t - 0.5) / 0.5),
    }
}

/// Diverging ramp for a normalized value in `[0, 1]` with white at 0.5
#[must_use]
pub fn diverging_color(norm: f32) -> Rgb<u8> {
    match norm {
        t if t < 0.5 => interpolate_color(Rgb([170, 40, 30]), Rgb([255, 255, 255]), t / 0.5),
        t => interpolate_color(Rgb([255, 255, 255]), Rgb([20, 120, 50]), (t - 0.5) / 0.5),
    }
}

/// Smallest and largest finite value, `None` if there is none
#[must_use]
pub fn finite_range<'a, I>(values: I) -> Option<(f32, f32)>
where
    I: IntoIterator<Item = &'a f32>,
{
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |range, &v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Render a 2D array as a heatmap, row 0 at the top
pub fn render_heatmap<F>(data: ArrayView2<'_, f32>, style: &HeatmapStyle, color_fn: F) -> RgbImage
where
    F: Fn(f32) -> Rgb<u8>,
{
    let (rows, cols) = data.dim();
    let range = style.max - style.min;
    let range = if range.abs() < f32::EPSILON { 1.0 } else { range };

    RgbImage::from_fn(
        cols as u32 * style.cell_width,
        rows as u32 * style.cell_height,
        |px, py| {
            let value = data[[
                (py / style.cell_height) as usize,
                (px / style.cell_width) as usize,
            ]];
            if value.is_nan() {
                style.missing
            } else {
                color_fn(((value - style.min) / range).clamp(0.0, 1.0))
            }
        },
    )
}

/// Save a latitude-time section (`[y, time]`) as a Hovmöller heatmap
///
/// # Errors
///
/// Returns an error if the PNG cannot be encoded or written.
pub fn plot_hovmoller(section: ArrayView2<'_, f32>, path: &Path, style: &HeatmapStyle) -> Result<()> {
    let image = render_heatmap(section, style, vegetation_color);
    image.save(path)?;
    log::info!(
        "Wrote Hovmoller plot {}x{} to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

/// Save a slope map with a diverging ramp centred on zero.
///
/// `limit` bounds the colour scale symmetrically; `None` takes the largest
/// absolute finite slope.
///
/// # Errors
///
/// Returns an error if the PNG cannot be encoded or written.
pub fn plot_trend_map(
    slope: ArrayView2<'_, f32>,
    path: &Path,
    limit: Option<f32>,
    cell_size: u32,
) -> Result<()> {
    let limit = limit.unwrap_or_else(|| {
        finite_range(slope.iter())
            .map(|(lo, hi)| lo.abs().max(hi.abs()))
            .filter(|l| *l > 0.0)
            .unwrap_or(1.0)
    });
    let style = HeatmapStyle::lai()
        .with_range(-limit, limit)
        .with_cell_size(cell_size, cell_size);
    let image = render_heatmap(slope, &style, diverging_color);
    image.save(path)?;
    log::info!(
        "Wrote trend map (+/-{:.3} per year) to {}",
        limit,
        path.display()
    );
    Ok(())
}

/// Draw a missing-fraction histogram as a bar chart
#[must_use]
pub fn render_missing_histogram(histogram: &MissingHistogram, size: ChartSize) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(size.width, size.height, BACKGROUND);
    let plot_w = size.width.saturating_sub(2 * MARGIN).max(1);
    let plot_h = size.height.saturating_sub(2 * MARGIN).max(1);
    let peak = histogram.counts.iter().copied().max().unwrap_or(0).max(1);
    let bins = histogram.counts.len().max(1) as u32;
    let bar_w = (plot_w / bins).max(1);

    for (i, &count) in histogram.counts.iter().enumerate() {
        let bar_h = ((count as f64 / peak as f64) * f64::from(plot_h)).round() as u32;
        if bar_h == 0 {
            continue;
        }
        let x = MARGIN + i as u32 * bar_w;
        let y = MARGIN + plot_h - bar_h;
        draw_filled_rect_mut(
            &mut canvas,
            Rect::at(x as i32, y as i32).of_size(bar_w.saturating_sub(1).max(1), bar_h),
            BAR,
        );
    }
    draw_axes(&mut canvas, plot_w, plot_h);
    canvas
}

/// Save a missing-fraction histogram as a bar chart
///
/// # Errors
///
/// Returns an error if the PNG cannot be encoded or written.
pub fn plot_missing_histogram(
    histogram: &MissingHistogram,
    path: &Path,
    size: ChartSize,
) -> Result<()> {
    render_missing_histogram(histogram, size).save(path)?;
    log::info!(
        "Wrote missing-data histogram ({} pixels, {} bins) to {}",
        histogram.total(),
        histogram.counts.len(),
        path.display()
    );
    Ok(())
}

/// Draw a time series as points with its fitted trend line
#[must_use]
pub fn render_time_series(
    series: &[f32],
    fit: Option<&LinearFit>,
    periods_per_year: f64,
    size: ChartSize,
) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(size.width, size.height, BACKGROUND);
    let plot_w = size.width.saturating_sub(2 * MARGIN).max(1);
    let plot_h = size.height.saturating_sub(2 * MARGIN).max(1);

    let (lo, hi) = finite_range(series).unwrap_or((0.0, 1.0));
    let (lo, hi) = if hi - lo < f32::EPSILON {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    };
    let last = series.len().saturating_sub(1).max(1) as f32;
    let to_px = |i: f32, v: f32| {
        let x = MARGIN as f32 + i / last * plot_w as f32;
        let y = MARGIN as f32 + (1.0 - (v - lo) / (hi - lo)) * plot_h as f32;
        (x, y)
    };

    if let Some(fit) = fit {
        let value_at = |i: f32| fit.predict(f64::from(i) / periods_per_year) as f32;
        draw_line_segment_mut(
            &mut canvas,
            to_px(0.0, value_at(0.0)),
            to_px(last, value_at(last)),
            TREND_LINE,
        );
    }
    for (i, &v) in series.iter().enumerate() {
        if v.is_finite() {
            let (x, y) = to_px(i as f32, v);
            draw_filled_circle_mut(&mut canvas, (x.round() as i32, y.round() as i32), 2, POINT);
        }
    }
    draw_axes(&mut canvas, plot_w, plot_h);
    canvas
}

/// Save a time series with its fitted trend line
///
/// # Errors
///
/// Returns an error if the PNG cannot be encoded or written.
pub fn plot_time_series(
    series: &[f32],
    fit: Option<&LinearFit>,
    periods_per_year: f64,
    path: &Path,
    size: ChartSize,
) -> Result<()> {
    render_time_series(series, fit, periods_per_year, size).save(path)?;
    log::info!("Wrote time series plot to {}", path.display());
    Ok(())
}

fn draw_axes(canvas: &mut RgbImage, plot_w: u32, plot_h: u32) {
    draw_hollow_rect_mut(
        canvas,
        Rect::at(MARGIN as i32, MARGIN as i32).of_size(plot_w, plot_h),
        AXIS,
    );
}
