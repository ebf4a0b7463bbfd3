//! gimms_lai: out-of-core access to the GIMMS LAI half-monthly archive
//!
//! The archive is a directory of flat byte grids, one per half-month period,
//! named `AVHRRBUVI01.<year><mon><period>.abl`. Each grid covers the globe at
//! 1/12 degree (2160 rows x 4320 columns) stored column by column, with bytes
//! 0-100 holding LAI x 10 and anything above 100 marking missing data.
//!
//! ## Module Organization
//!
//! - [`grid`]: grid geometry, byte decoding and coordinate mapping
//! - [`manifest`]: chronological index of the files present on disk
//! - [`archive`]: time series, whole grids, sub-cubes and Hovmöller sections
//! - [`statistics`]: linear trends and missing-data summaries
//! - [`plotting`]: PNG rendering of the diagnostic plots
//! - [`parallel`]: thread pool configuration for per-pixel statistics
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gimms_lai::prelude::*;
//!
//! let archive = RasterArchive::open("/data/gimms").unwrap();
//!
//! // Time series at a point, aligned with the manifest dates
//! let series = archive.time_series_at(-3.0, -60.0).unwrap();
//! assert_eq!(series.len(), archive.manifest().len());
//!
//! // One whole grid, indexed [y, x]
//! let grid = archive.grid_at_date(2000, 7, Period::A).unwrap();
//!
//! // Per-pixel trend over a region
//! let trend = archive.trend_image(5.0, -75.0, -15.0, -45.0).unwrap();
//! println!("{:?}", trend.shape());
//! ```

pub mod archive;
pub mod errors;
pub mod grid;
pub mod manifest;
pub mod parallel;
pub mod plotting;
pub mod statistics;

pub use archive::{ArchiveConfig, RasterArchive};
pub use errors::{GimmsError, Result};
pub use grid::{GridGeometry, PixelWindow};
pub use manifest::{FileNaming, Manifest, ManifestEntry, Period, PeriodKey};

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::archive::{ArchiveConfig, RasterArchive};
    pub use crate::errors::{GimmsError, Result};
    pub use crate::grid::{GridGeometry, PixelWindow};
    pub use crate::manifest::{FileNaming, Manifest, Period, PeriodKey};
    pub use crate::parallel::ParallelConfig;
    pub use crate::plotting::{ChartSize, HeatmapStyle};
    pub use crate::statistics::{LinearFit, TrendImage, PERIODS_PER_YEAR};
}
