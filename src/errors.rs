//! Centralized error handling for gimms_lai
//!
//! Every fallible operation in the crate returns [`Result`], so callers can
//! match on the failure kind (missing file, pixel outside the grid, ...)
//! instead of inspecting strings.

use std::fmt;
use std::path::PathBuf;

/// Main error type for archive operations
#[derive(Debug)]
pub enum GimmsError {
    /// No grid file exists for an exact date request
    FileNotFound { path: PathBuf },

    /// Pixel coordinate outside the grid extent
    OutOfRange {
        x: i64,
        y: i64,
        nrows: usize,
        ncols: usize,
    },

    /// A multi-date operation was requested on an archive with no files
    EmptyManifest,

    /// Grid file shorter than the geometry requires
    TruncatedFile {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Grid file longer than one grid, so the layout is not the expected one
    OversizedFile {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Half-month period code other than `a` or `b`
    InvalidPeriod(String),

    /// Month name or number that does not denote a calendar month
    InvalidMonth(String),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Invalid glob pattern built from the archive directory
    PatternError(glob::PatternError),

    /// Plot encoding or writing failure
    ImageError(image::ImageError),

    /// Thread pool configuration error
    ThreadPoolError(String),

    /// Generic error with a message
    Generic(String),
}

impl fmt::Display for GimmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GimmsError::FileNotFound { path } => {
                write!(f, "Grid file not found: {}", path.display())
            }
            GimmsError::OutOfRange { x, y, nrows, ncols } => write!(
                f,
                "Pixel (x={}, y={}) is outside the {}x{} grid",
                x, y, ncols, nrows
            ),
            GimmsError::EmptyManifest => write!(f, "Archive manifest is empty"),
            GimmsError::TruncatedFile {
                path,
                expected,
                actual,
            } => write!(
                f,
                "Grid file {} has {} bytes, expected {}",
                path.display(),
                actual,
                expected
            ),
            GimmsError::OversizedFile {
                path,
                expected,
                actual,
            } => write!(
                f,
                "Grid file {} has {} bytes, more than the {} of one grid",
                path.display(),
                actual,
                expected
            ),
            GimmsError::InvalidPeriod(p) => {
                write!(f, "Invalid period '{}': expected 'a' or 'b'", p)
            }
            GimmsError::InvalidMonth(m) => write!(f, "Invalid month '{}'", m),
            GimmsError::IoError(e) => write!(f, "I/O error: {}", e),
            GimmsError::ArrayError(e) => write!(f, "Array error: {}", e),
            GimmsError::PatternError(e) => write!(f, "Invalid file pattern: {}", e),
            GimmsError::ImageError(e) => write!(f, "Image error: {}", e),
            GimmsError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
            GimmsError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for GimmsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GimmsError::IoError(e) => Some(e),
            GimmsError::ArrayError(e) => Some(e),
            GimmsError::PatternError(e) => Some(e),
            GimmsError::ImageError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GimmsError {
    fn from(error: std::io::Error) -> Self {
        GimmsError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for GimmsError {
    fn from(error: ndarray::ShapeError) -> Self {
        GimmsError::ArrayError(error)
    }
}

impl From<glob::PatternError> for GimmsError {
    fn from(error: glob::PatternError) -> Self {
        GimmsError::PatternError(error)
    }
}

impl From<image::ImageError> for GimmsError {
    fn from(error: image::ImageError) -> Self {
        GimmsError::ImageError(error)
    }
}

impl From<String> for GimmsError {
    fn from(error: String) -> Self {
        GimmsError::Generic(error)
    }
}

impl From<&str> for GimmsError {
    fn from(error: &str) -> Self {
        GimmsError::Generic(error.to_string())
    }
}

/// Result type alias for gimms_lai operations
pub type Result<T> = std::result::Result<T, GimmsError>;
