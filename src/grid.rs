//! Grid geometry, byte decoding and coordinate mapping
//!
//! A GIMMS LAI grid file is a flat run of `ncols` column blocks, each holding
//! `nrows` bytes from north to south. Pixel `(x, y)` therefore lives at byte
//! `x * nrows + y`, and the same geometry applies to every file in the archive.

use crate::errors::{GimmsError, Result};

/// Raw byte values above this denote missing data
pub const MAX_VALID_RAW: u8 = 100;

/// Shape and encoding of one grid file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    /// Number of latitude rows (north to south)
    pub nrows: usize,
    /// Number of longitude columns (west to east)
    pub ncols: usize,
    /// Pixel size in degrees
    pub resolution: f64,
    /// Multiplier from raw byte to physical value
    pub scale: f32,
}

impl GridGeometry {
    /// The 1/12 degree global GIMMS LAI grid
    pub const GIMMS: GridGeometry = GridGeometry {
        nrows: 2160,
        ncols: 4320,
        resolution: 1.0 / 12.0,
        scale: 0.1,
    };

    /// Global grid with the given pixel size, covering 180 x 360 degrees
    pub fn global(resolution: f64, scale: f32) -> Self {
        Self {
            nrows: (180.0 / resolution).round() as usize,
            ncols: (360.0 / resolution).round() as usize,
            resolution,
            scale,
        }
    }

    /// Size of one grid file in bytes
    #[must_use]
    pub fn file_len(&self) -> u64 {
        (self.nrows * self.ncols) as u64
    }

    /// Map a geographic point to pixel `(x, y)`.
    ///
    /// No bounds checking happens here: latitudes and longitudes outside the
    /// grid give indices outside `0..ncols` / `0..nrows`, which every read
    /// operation rejects through [`GridGeometry::check_pixel`].
    #[must_use]
    pub fn coordinate_to_pixel(&self, lat: f64, lon: f64) -> (i64, i64) {
        let x = ((180.0 + lon) / self.resolution).floor() as i64;
        let y = ((90.0 - lat) / self.resolution).floor() as i64;
        (x, y)
    }

    /// Geographic coordinate of the north-west corner of pixel `(x, y)`
    #[must_use]
    pub fn pixel_to_coordinate(&self, x: usize, y: usize) -> (f64, f64) {
        let lat = 90.0 - y as f64 * self.resolution;
        let lon = -180.0 + x as f64 * self.resolution;
        (lat, lon)
    }

    /// Validate a signed pixel index against the grid extent.
    ///
    /// # Errors
    ///
    /// Returns [`GimmsError::OutOfRange`] when either index falls outside the grid.
    pub fn check_pixel(&self, x: i64, y: i64) -> Result<(usize, usize)> {
        if x < 0 || y < 0 || x as usize >= self.ncols || y as usize >= self.nrows {
            return Err(GimmsError::OutOfRange {
                x,
                y,
                nrows: self.nrows,
                ncols: self.ncols,
            });
        }
        Ok((x as usize, y as usize))
    }

    /// Byte offset of pixel `(x, y)` inside a grid file (column-major layout)
    #[must_use]
    pub fn byte_offset(&self, x: usize, y: usize) -> u64 {
        (x * self.nrows + y) as u64
    }

    /// Decode one raw byte into a physical value, NaN for missing data
    #[inline]
    #[must_use]
    pub fn decode(&self, raw: u8) -> f32 {
        if raw > MAX_VALID_RAW {
            f32::NAN
        } else {
            f32::from(raw) * self.scale
        }
    }

    /// Pixel window spanned by two corner points, inclusive on both ends.
    ///
    /// # Errors
    ///
    /// Returns [`GimmsError::OutOfRange`] when either corner maps outside the grid.
    pub fn window(&self, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<PixelWindow> {
        let (x1, y1) = self.coordinate_to_pixel(lat1, lon1);
        let (x2, y2) = self.coordinate_to_pixel(lat2, lon2);
        let (x_min, y_min) = self.check_pixel(x1.min(x2), y1.min(y2))?;
        let (x_max, y_max) = self.check_pixel(x1.max(x2), y1.max(y2))?;
        Ok(PixelWindow {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self::GIMMS
    }
}

/// Axis-aligned pixel rectangle with inclusive bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub x_min: usize,
    pub x_max: usize,
    pub y_min: usize,
    pub y_max: usize,
}

impl PixelWindow {
    #[must_use]
    pub fn width(&self) -> usize {
        self.x_max - self.x_min + 1
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.y_max - self.y_min + 1
    }
}
