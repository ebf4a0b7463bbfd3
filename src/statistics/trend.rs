//! Per-pixel linear trends over a `[time, y, x]` cube
//!
//! Every pixel is fitted independently, so the fits are spread over the rayon
//! pool the same way as any other per-element reduction. The cube is already
//! in memory at this point; no file access happens here.

use super::regression::{series_trend, LinearFit};
use ndarray::{s, Array2, ArrayView3};
use rayon::prelude::*;

/// Half-month periods per calendar year
pub const PERIODS_PER_YEAR: f64 = 24.0;

/// Trend maps for a region, indexed `[y, x]`
#[derive(Debug, Clone)]
pub struct TrendImage {
    /// OLS slope in value units per year, NaN where no fit was possible
    pub slope: Array2<f32>,
    /// Two-sided p-value of the slope, NaN where it is undefined
    pub p_value: Array2<f32>,
    /// Number of valid samples behind each fit
    pub valid_count: Array2<u32>,
}

impl TrendImage {
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.slope.dim()
    }

    /// Fraction of pixels with a defined slope and `p_value < alpha`
    #[must_use]
    pub fn significant_fraction(&self, alpha: f32) -> f32 {
        let total = self.p_value.len();
        if total == 0 {
            return 0.0;
        }
        let significant = self
            .p_value
            .iter()
            .zip(self.slope.iter())
            .filter(|(p, s)| s.is_finite() && p.is_finite() && **p < alpha)
            .count();
        significant as f32 / total as f32
    }
}

/// Fit every pixel of `cube` against elapsed years.
///
/// Pixels without any valid sample (or with a single time step) get NaN slope
/// and p-value.
#[must_use]
pub fn trend_from_cube(cube: ArrayView3<'_, f32>, periods_per_year: f64) -> TrendImage {
    let (_, height, width) = cube.dim();
    log::info!(
        "Fitting trends for {} pixels across {} CPU cores",
        height * width,
        rayon::current_num_threads()
    );

    let fits: Vec<(Option<LinearFit>, u32)> = (0..height * width)
        .into_par_iter()
        .map(|idx| {
            let (y, x) = (idx / width, idx % width);
            let series: Vec<f32> = cube.slice(s![.., y, x]).to_vec();
            let valid = series.iter().filter(|v| v.is_finite()).count() as u32;
            (series_trend(&series, periods_per_year), valid)
        })
        .collect();

    let at = |y: usize, x: usize| &fits[y * width + x];
    TrendImage {
        slope: Array2::from_shape_fn((height, width), |(y, x)| {
            at(y, x).0.map_or(f32::NAN, |f| f.slope as f32)
        }),
        p_value: Array2::from_shape_fn((height, width), |(y, x)| {
            at(y, x).0.map_or(f32::NAN, |f| f.p_value as f32)
        }),
        valid_count: Array2::from_shape_fn((height, width), |(y, x)| at(y, x).1),
    }
}
