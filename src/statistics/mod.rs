//! Statistical computations over extracted time series and cubes
//!
//! # Organization
//!
//! - [`regression`]: ordinary least squares fit with slope significance
//! - [`distribution`]: Student t tail probabilities used by the fit
//! - [`trend`]: per-pixel trend maps computed in parallel
//! - [`missing`]: missing-data counts and histograms

pub mod distribution;
pub mod missing;
pub mod regression;
pub mod trend;

pub use missing::{
    missing_count_map, missing_fraction_by_time, missing_histogram, MissingHistogram,
};
pub use regression::{linear_regression, series_trend, LinearFit};
pub use trend::{trend_from_cube, TrendImage, PERIODS_PER_YEAR};
