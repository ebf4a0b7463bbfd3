//! Out-of-core access to a GIMMS LAI archive directory
//!
//! [`RasterArchive`] owns the immutable manifest and the grid geometry. Every
//! extraction call opens the files it needs, seeks to the bytes of interest and
//! drops the handles before returning; nothing is cached between calls.

use crate::errors::{GimmsError, Result};
use crate::grid::{GridGeometry, PixelWindow};
use crate::manifest::{FileNaming, Manifest, Period, PeriodKey};
use crate::statistics::trend::{trend_from_cube, TrendImage, PERIODS_PER_YEAR};
use ndarray::{Array2, Array3, ArrayView2, Axis};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Location, naming and geometry of an archive
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub directory: PathBuf,
    pub naming: FileNaming,
    /// First calendar year scanned, inclusive
    pub start_year: i32,
    /// Last calendar year scanned, inclusive
    pub end_year: i32,
    pub geometry: GridGeometry,
}

impl ArchiveConfig {
    /// GIMMS defaults (1980-2012, `AVHRRBUVI01.*.abl`) for a directory
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            naming: FileNaming::default(),
            start_year: 1980,
            end_year: 2012,
            geometry: GridGeometry::GIMMS,
        }
    }

    #[must_use]
    pub fn with_naming(mut self, naming: FileNaming) -> Self {
        self.naming = naming;
        self
    }

    #[must_use]
    pub fn with_years(mut self, start_year: i32, end_year: i32) -> Self {
        self.start_year = start_year;
        self.end_year = end_year;
        self
    }

    #[must_use]
    pub fn with_geometry(mut self, geometry: GridGeometry) -> Self {
        self.geometry = geometry;
        self
    }
}

/// Read-only view of a directory of half-monthly grid files
#[derive(Debug, Clone)]
pub struct RasterArchive {
    config: ArchiveConfig,
    manifest: Manifest,
}

impl RasterArchive {
    /// Open an archive directory with the GIMMS defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory listing pattern is invalid. A missing
    /// or empty directory gives an archive with an empty manifest.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(ArchiveConfig::new(directory))
    }

    /// Open an archive with explicit naming, year range and geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory listing pattern is invalid.
    pub fn with_config(config: ArchiveConfig) -> Result<Self> {
        let manifest = Manifest::scan(
            &config.directory,
            &config.naming,
            config.start_year,
            config.end_year,
        )?;
        match (manifest.first(), manifest.last()) {
            (Some(first), Some(last)) => log::info!(
                "Indexed {} grid files in {} ({} to {})",
                manifest.len(),
                config.directory.display(),
                first.date,
                last.date
            ),
            _ => log::warn!("No grid files found in {}", config.directory.display()),
        }
        Ok(Self { config, manifest })
    }

    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    #[must_use]
    pub fn geometry(&self) -> &GridGeometry {
        &self.config.geometry
    }

    #[must_use]
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Pixel `(x, y)` of a geographic point; see [`GridGeometry::coordinate_to_pixel`]
    #[must_use]
    pub fn coordinate_to_pixel(&self, lat: f64, lon: f64) -> (i64, i64) {
        self.config.geometry.coordinate_to_pixel(lat, lon)
    }

    /// Path of the grid file for a date key, whether or not it exists
    #[must_use]
    pub fn path_for(&self, key: &PeriodKey) -> PathBuf {
        self.config.naming.path_in(&self.config.directory, key)
    }

    /// Decoded values of one pixel across the whole manifest.
    ///
    /// One open, one seek and one single-byte read per manifest entry.
    ///
    /// # Errors
    ///
    /// Returns [`GimmsError::OutOfRange`] for a pixel outside the grid,
    /// [`GimmsError::EmptyManifest`] when the archive has no files, or an I/O
    /// error if any file cannot be read at the offset.
    pub fn pixel_time_series(&self, x: i64, y: i64) -> Result<Vec<f32>> {
        let geometry = &self.config.geometry;
        let (x, y) = geometry.check_pixel(x, y)?;
        self.ensure_not_empty()?;

        let offset = geometry.byte_offset(x, y);
        let mut series = Vec::with_capacity(self.manifest.len());
        let mut byte = [0u8; 1];
        for entry in &self.manifest {
            let mut file = open_grid(&entry.path)?;
            file.seek(SeekFrom::Start(offset))?;
            read_exact_or_truncated(&mut file, &mut byte, &entry.path, geometry)?;
            series.push(geometry.decode(byte[0]));
        }
        Ok(series)
    }

    /// Time series at a geographic point
    ///
    /// # Errors
    ///
    /// See [`RasterArchive::pixel_time_series`].
    pub fn time_series_at(&self, lat: f64, lon: f64) -> Result<Vec<f32>> {
        let (x, y) = self.coordinate_to_pixel(lat, lon);
        self.pixel_time_series(x, y)
    }

    /// Whole decoded grid for one date, indexed `[y, x]`.
    ///
    /// The file is located from the key alone; it does not have to be part of
    /// the manifest's year range.
    ///
    /// # Errors
    ///
    /// Returns [`GimmsError::FileNotFound`] when no file exists for the date and
    /// [`GimmsError::TruncatedFile`] or [`GimmsError::OversizedFile`] when the
    /// file length differs from one grid.
    pub fn grid_at_date(&self, year: i32, month: u32, period: Period) -> Result<Array2<f32>> {
        let key = PeriodKey::new(year, month, period)?;
        self.grid_for_key(&key)
    }

    /// Whole decoded grid for a date key, indexed `[y, x]`
    ///
    /// # Errors
    ///
    /// See [`RasterArchive::grid_at_date`].
    pub fn grid_for_key(&self, key: &PeriodKey) -> Result<Array2<f32>> {
        let path = self.path_for(key);
        log::debug!("Reading full grid {}", path.display());
        self.read_grid(&path)
    }

    fn read_grid(&self, path: &Path) -> Result<Array2<f32>> {
        let geometry = &self.config.geometry;
        let mut file = open_grid(path)?;
        let actual = file.metadata()?.len();
        if actual > geometry.file_len() {
            return Err(GimmsError::OversizedFile {
                path: path.to_path_buf(),
                expected: geometry.file_len(),
                actual,
            });
        }
        let mut raw = vec![0u8; geometry.file_len() as usize];
        read_exact_or_truncated(&mut file, &mut raw, path, geometry)?;

        let decoded: Vec<f32> = raw.into_iter().map(|b| geometry.decode(b)).collect();
        let by_column = Array2::from_shape_vec((geometry.ncols, geometry.nrows), decoded)?;
        Ok(by_column.reversed_axes().as_standard_layout().into_owned())
    }

    /// Sub-region of every grid in the manifest, indexed `[time, y, x]`.
    ///
    /// The corners may be given in any order; the window includes both corner
    /// pixels. Each file is read one column strip at a time, so only the bytes
    /// inside the window's rows are transferred.
    ///
    /// # Errors
    ///
    /// Returns [`GimmsError::OutOfRange`] when a corner falls outside the grid,
    /// [`GimmsError::EmptyManifest`] for an empty archive, or an I/O error.
    pub fn data_cube(&self, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<Array3<f32>> {
        let window = self.config.geometry.window(lat1, lon1, lat2, lon2)?;
        self.window_cube(&window)
    }

    /// Sub-cube for an explicit pixel window
    ///
    /// # Errors
    ///
    /// See [`RasterArchive::data_cube`].
    pub fn window_cube(&self, window: &PixelWindow) -> Result<Array3<f32>> {
        let geometry = &self.config.geometry;
        if window.x_min > window.x_max || window.y_min > window.y_max {
            return Err(GimmsError::OutOfRange {
                x: window.x_min as i64,
                y: window.y_min as i64,
                nrows: geometry.nrows,
                ncols: geometry.ncols,
            });
        }
        geometry.check_pixel(window.x_min as i64, window.y_min as i64)?;
        geometry.check_pixel(window.x_max as i64, window.y_max as i64)?;
        self.ensure_not_empty()?;

        let (height, width) = (window.height(), window.width());
        log::debug!(
            "Extracting {}x{} window at x={}, y={} from {} files",
            width,
            height,
            window.x_min,
            window.y_min,
            self.manifest.len()
        );

        let mut cube = Array3::<f32>::from_elem((self.manifest.len(), height, width), f32::NAN);
        let mut strip = vec![0u8; height];
        for (mut slice, entry) in cube.axis_iter_mut(Axis(0)).zip(&self.manifest) {
            let mut file = open_grid(&entry.path)?;
            for (col, x) in (window.x_min..=window.x_max).enumerate() {
                file.seek(SeekFrom::Start(geometry.byte_offset(x, window.y_min)))?;
                read_exact_or_truncated(&mut file, &mut strip, &entry.path, geometry)?;
                for (row, &raw) in strip.iter().enumerate() {
                    slice[[row, col]] = geometry.decode(raw);
                }
            }
        }
        Ok(cube)
    }

    /// Per-pixel linear trend over a region.
    ///
    /// Time is measured in elapsed years from the first manifest entry
    /// (`index / 24`), so slopes are in LAI units per year.
    ///
    /// # Errors
    ///
    /// See [`RasterArchive::data_cube`].
    pub fn trend_image(&self, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<TrendImage> {
        let cube = self.data_cube(lat1, lon1, lat2, lon2)?;
        Ok(trend_from_cube(cube.view(), PERIODS_PER_YEAR))
    }

    /// Latitude-time section at the grid column containing `lon`,
    /// indexed `[y, time]`.
    ///
    /// Each file contributes one contiguous `nrows`-byte read.
    ///
    /// # Errors
    ///
    /// Returns [`GimmsError::OutOfRange`] for a longitude outside the grid,
    /// [`GimmsError::EmptyManifest`] for an empty archive, or an I/O error.
    pub fn hovmoller(&self, lon: f64) -> Result<Array2<f32>> {
        let geometry = &self.config.geometry;
        let (x, _) = self.coordinate_to_pixel(0.0, lon);
        let (x, _) = geometry.check_pixel(x, 0)?;
        let window = PixelWindow {
            x_min: x,
            x_max: x,
            y_min: 0,
            y_max: geometry.nrows - 1,
        };
        let cube = self.window_cube(&window)?;
        Ok(cube.index_axis(Axis(2), 0).t().to_owned())
    }

    fn ensure_not_empty(&self) -> Result<()> {
        if self.manifest.is_empty() {
            return Err(GimmsError::EmptyManifest);
        }
        Ok(())
    }
}

/// Value of a decoded grid at pixel `(x, y)`, NaN outside the grid
#[must_use]
pub fn grid_value(grid: ArrayView2<'_, f32>, x: usize, y: usize) -> f32 {
    grid.get((y, x)).copied().unwrap_or(f32::NAN)
}

fn open_grid(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => GimmsError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => GimmsError::IoError(e),
    })
}

fn read_exact_or_truncated(
    file: &mut File,
    buf: &mut [u8],
    path: &Path,
    geometry: &GridGeometry,
) -> Result<()> {
    file.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => GimmsError::TruncatedFile {
            path: path.to_path_buf(),
            expected: geometry.file_len(),
            actual: file.metadata().map(|m| m.len()).unwrap_or(0),
        },
        _ => GimmsError::IoError(e),
    })
}
