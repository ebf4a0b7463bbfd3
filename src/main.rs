//! Entry point for the gimms-lai application.
//! Handles CLI parsing, archive indexing, and dispatches extraction, trend and plot commands.

use clap::Parser;
use env_logger::{Builder, Env};
use gimms_lai::prelude::{
    ArchiveConfig, ChartSize, FileNaming, GimmsError, HeatmapStyle, ParallelConfig, PeriodKey,
    RasterArchive, PERIODS_PER_YEAR,
};
use gimms_lai::{archive::grid_value, manifest::parse_month, plotting, statistics};
use std::path::Path;

mod cli;

use cli::{ArchiveArgs, BBox, Cli, Command};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));
    builder.format_timestamp_secs();
    builder.init();

    ParallelConfig::new(cli.threads).setup_global_pool()?;

    let archive = RasterArchive::with_config(archive_config(&cli.archive))?;

    match cli.command {
        Command::Info => print_info(&archive),
        Command::Series { lat, lon, plot } => series(&archive, lat, lon, plot.as_deref())?,
        Command::Grid {
            year,
            month,
            period,
        } => {
            let key = PeriodKey::new(year, parse_month(&month)?, period.parse()?)?;
            grid_summary(&archive, &key)?;
        }
        Command::Compare {
            year,
            month,
            period,
            lat,
            lons,
        } => {
            let key = PeriodKey::new(year, parse_month(&month)?, period.parse()?)?;
            compare(&archive, &key, lat, &lons.values())?;
        }
        Command::Hovmoller {
            lon,
            output,
            cell_width,
        } => {
            let section = archive.hovmoller(lon)?;
            let style = HeatmapStyle::lai().with_cell_size(cell_width, 1);
            plotting::plot_hovmoller(section.view(), &output, &style)?;
            println!("✅ Saved Hovmöller plot for longitude {} to {}", lon, output.display());
        }
        Command::Trend {
            bbox,
            output,
            limit,
        } => trend(&archive, bbox, &output, limit)?,
        Command::Missing {
            bbox,
            output,
            bins,
        } => missing(&archive, bbox, &output, bins)?,
    }

    Ok(())
}

fn archive_config(args: &ArchiveArgs) -> ArchiveConfig {
    ArchiveConfig::new(&args.dir)
        .with_naming(FileNaming::new(&args.prefix, &args.suffix))
        .with_years(args.start_year, args.end_year)
}

fn print_info(archive: &RasterArchive) {
    let manifest = archive.manifest();
    println!("\n===== Archive =====");
    println!("- Directory: {}", archive.config().directory.display());
    println!("- Files: {}", manifest.len());
    if let (Some(first), Some(last)) = (manifest.first(), manifest.last()) {
        println!("- Range: {} to {}", first.date, last.date);
    }
    println!("\n===== Files =====");
    for entry in manifest {
        println!("- {} {}", entry.date, entry.path.display());
    }
}

fn series(
    archive: &RasterArchive,
    lat: f64,
    lon: f64,
    plot: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (x, y) = archive.coordinate_to_pixel(lat, lon);
    let values = archive.pixel_time_series(x, y)?;
    println!("\n Time series at lat {}, lon {} (x={}, y={})", lat, lon, x, y);
    println!("================================");
    for (entry, value) in archive.manifest().iter().zip(&values) {
        if value.is_nan() {
            println!("{}   missing", entry.date);
        } else {
            println!("{}   {:.1}", entry.date, value);
        }
    }

    let fit = statistics::series_trend(&values, PERIODS_PER_YEAR);
    match &fit {
        Some(fit) => println!(
            "\n   Trend: {:.4} per year (p = {:.4}, n = {})",
            fit.slope, fit.p_value, fit.n
        ),
        None => println!("\n   Trend: not enough valid samples"),
    }

    if let Some(path) = plot {
        plotting::plot_time_series(
            &values,
            fit.as_ref(),
            PERIODS_PER_YEAR,
            path,
            ChartSize::default(),
        )?;
        println!("✅ Saved time series plot to {}", path.display());
    }
    Ok(())
}

fn grid_summary(archive: &RasterArchive, key: &PeriodKey) -> Result<(), Box<dyn std::error::Error>> {
    let grid = archive.grid_for_key(key)?;
    let valid: Vec<f32> = grid.iter().copied().filter(|v| v.is_finite()).collect();
    println!("\n Summary for {}", key);
    println!("================================");
    println!("   Cells: {}", grid.len());
    println!("   Valid: {}", valid.len());
    if let Some((min, max)) = plotting::finite_range(&valid) {
        let mean = valid.iter().map(|&v| f64::from(v)).sum::<f64>() / valid.len() as f64;
        println!("   Min: {:.1}", min);
        println!("   Max: {:.1}", max);
        println!("   Mean: {:.2}", mean);
    }
    Ok(())
}

fn compare(
    archive: &RasterArchive,
    key: &PeriodKey,
    lat: f64,
    lons: &[f64],
) -> Result<(), Box<dyn std::error::Error>> {
    let date = key.date()?;
    let index = archive
        .manifest()
        .position(date)
        .ok_or_else(|| GimmsError::Generic(format!("{} is not in the archive manifest", date)))?;
    let grid = archive.grid_for_key(key)?;

    println!("date        lat     lon      x     y   series   grid");
    for &lon in lons {
        let (x, y) = archive.coordinate_to_pixel(lat, lon);
        let series = archive.pixel_time_series(x, y)?;
        let (ux, uy) = archive.geometry().check_pixel(x, y)?;
        println!(
            "{}  {:>5}  {:>6}  {:>5} {:>5}  {:>6.1} {:>6.1}",
            date,
            lat,
            lon,
            x,
            y,
            series[index],
            grid_value(grid.view(), ux, uy)
        );
    }
    Ok(())
}

fn trend(
    archive: &RasterArchive,
    bbox: BBox,
    output: &Path,
    limit: Option<f32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let trend = archive.trend_image(bbox.lat1, bbox.lon1, bbox.lat2, bbox.lon2)?;
    let (height, width) = trend.shape();
    println!("\n Trend for {}x{} pixels", width, height);
    println!("================================");
    println!(
        "   Significant (p < 0.05): {:.1}%",
        100.0 * trend.significant_fraction(0.05)
    );
    if let Some((lo, hi)) = plotting::finite_range(trend.slope.iter()) {
        println!("   Slope range: {:.4} to {:.4} per year", lo, hi);
    }
    plotting::plot_trend_map(trend.slope.view(), output, limit, 1)?;
    println!("✅ Saved trend map to {}", output.display());
    Ok(())
}

fn missing(
    archive: &RasterArchive,
    bbox: BBox,
    output: &Path,
    bins: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let cube = archive.data_cube(bbox.lat1, bbox.lon1, bbox.lat2, bbox.lon2)?;
    let counts = statistics::missing_count_map(cube.view());
    let histogram = statistics::missing_histogram(&counts, cube.dim().0, bins);
    println!("\n Missing data for {} pixels over {} steps", counts.len(), cube.dim().0);
    println!("================================");
    for (edge, count) in histogram.edges.iter().zip(&histogram.counts) {
        println!("   >= {:>4.0}%: {}", edge * 100.0, count);
    }
    plotting::plot_missing_histogram(&histogram, output, ChartSize::default())?;
    println!("✅ Saved missing-data histogram to {}", output.display());
    Ok(())
}
