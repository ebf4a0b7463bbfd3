//! Defines command-line interface options using `clap` for the gimms-lai tool.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Explore a GIMMS LAI half-monthly archive
#[derive(Parser, Debug)]
#[command(
    name = "gimms-lai",
    version,
    about = "Time series, trends and diagnostic plots from a GIMMS LAI archive"
)]
pub struct Cli {
    #[command(flatten)]
    pub archive: ArchiveArgs,

    /// Number of threads to use for per-pixel statistics. Defaults to number of CPU cores.
    #[arg(short = 't', long, global = true)]
    pub threads: Option<usize>,

    /// Enable verbose output.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Location and naming of the archive
#[derive(Args, Debug, Clone)]
pub struct ArchiveArgs {
    /// Directory holding the grid files
    #[arg(short, long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// File name prefix
    #[arg(long, global = true, default_value = "AVHRRBUVI01")]
    pub prefix: String,

    /// File name suffix
    #[arg(long, global = true, default_value = "abl")]
    pub suffix: String,

    /// First year to index
    #[arg(long, global = true, default_value_t = 1980)]
    pub start_year: i32,

    /// Last year to index
    #[arg(long, global = true, default_value_t = 2012)]
    pub end_year: i32,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the indexed files and their dates
    Info,

    /// Print the time series at a point, with its linear trend
    Series {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Save a time-series-with-trend plot to this PNG
        #[arg(long)]
        plot: Option<PathBuf>,
    },

    /// Print summary values of one whole grid
    Grid {
        #[arg(long)]
        year: i32,
        /// Month number or three-letter name
        #[arg(long)]
        month: String,
        /// Half-month period, `a` or `b`
        #[arg(long, default_value = "a")]
        period: String,
    },

    /// Compare point time series against whole-grid reads along a latitude
    Compare {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: String,
        #[arg(long, default_value = "a")]
        period: String,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        lat: f64,
        /// Longitudes as start:end:step
        #[arg(long, default_value = "-90:160:10", value_parser = parse_range_arg, allow_hyphen_values = true)]
        lons: LonRange,
    },

    /// Save a latitude-time Hovmöller plot at a longitude
    Hovmoller {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(short, long, default_value = "hovmoller.png")]
        output: PathBuf,
        /// Horizontal pixels per time step
        #[arg(long, default_value_t = 2)]
        cell_width: u32,
    },

    /// Compute and save a trend map for a region
    Trend {
        /// Region as lat1,lon1,lat2,lon2
        #[arg(long, value_parser = parse_bbox_arg, allow_hyphen_values = true)]
        bbox: BBox,
        #[arg(short, long, default_value = "trend.png")]
        output: PathBuf,
        /// Symmetric colour limit in LAI per year
        #[arg(long)]
        limit: Option<f32>,
    },

    /// Save a histogram of per-pixel missing-data fractions for a region
    Missing {
        #[arg(long, value_parser = parse_bbox_arg, allow_hyphen_values = true)]
        bbox: BBox,
        #[arg(short, long, default_value = "missing.png")]
        output: PathBuf,
        #[arg(long, default_value_t = 20)]
        bins: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub lat1: f64,
    pub lon1: f64,
    pub lat2: f64,
    pub lon2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonRange {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl LonRange {
    /// Values from `start` up to but excluding `end`
    pub fn values(&self) -> Vec<f64> {
        let mut out = Vec::new();
        let mut lon = self.start;
        while lon < self.end {
            out.push(lon);
            lon += self.step;
        }
        out
    }
}

fn parse_bbox_arg(s: &str) -> Result<BBox, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| "Invalid format: Expected 'lat1,lon1,lat2,lon2'.".to_string())?;
    match parts.as_slice() {
        [lat1, lon1, lat2, lon2] => Ok(BBox {
            lat1: *lat1,
            lon1: *lon1,
            lat2: *lat2,
            lon2: *lon2,
        }),
        _ => Err("Invalid format: Expected 'lat1,lon1,lat2,lon2'.".to_string()),
    }
}

fn parse_range_arg(s: &str) -> Result<LonRange, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let [start, end, step] = parts.as_slice() else {
        return Err("Invalid format: Expected 'start:end:step'.".to_string());
    };
    let parse = |v: &str, what: &str| {
        v.parse::<f64>()
            .map_err(|_| format!("Invalid {} value '{}'", what, v))
    };
    let range = LonRange {
        start: parse(*start, "start")?,
        end: parse(*end, "end")?,
        step: parse(*step, "step")?,
    };
    if range.step <= 0.0 {
        return Err("Step must be positive".to_string());
    }
    Ok(range)
}
