//! Integration tests for archive indexing and extraction
//!
//! Every test writes a synthetic archive into a temporary directory. Most use a
//! coarse 30 degree grid (6 rows x 12 columns) so that whole-archive checks stay
//! fast; the layout rules are identical to the full GIMMS grid.

use gimms_lai::{
    archive::grid_value,
    errors::GimmsError,
    statistics::PERIODS_PER_YEAR,
    ArchiveConfig, FileNaming, GridGeometry, Period, PeriodKey, RasterArchive,
};
use ndarray::s;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Write one grid file whose byte at `x * nrows + y` is `value(x, y)`
fn write_grid<F>(dir: &Path, key: &PeriodKey, geometry: &GridGeometry, value: F)
where
    F: Fn(usize, usize) -> u8,
{
    let mut bytes = vec![0u8; geometry.file_len() as usize];
    for x in 0..geometry.ncols {
        for y in 0..geometry.nrows {
            bytes[geometry.byte_offset(x, y) as usize] = value(x, y);
        }
    }
    let path = FileNaming::default().path_in(dir, key);
    fs::write(path, bytes).expect("Failed to write grid file");
}

fn coarse() -> GridGeometry {
    GridGeometry::global(30.0, 0.1)
}

fn coarse_archive(dir: &Path, start_year: i32, end_year: i32) -> RasterArchive {
    RasterArchive::with_config(
        ArchiveConfig::new(dir)
            .with_years(start_year, end_year)
            .with_geometry(coarse()),
    )
    .expect("Failed to open archive")
}

fn key(year: i32, month: u32, period: Period) -> PeriodKey {
    PeriodKey::new(year, month, period).unwrap()
}

fn same_value(a: f32, b: f32) -> bool {
    (a.is_nan() && b.is_nan()) || (a - b).abs() < 1e-6
}

#[test]
fn full_grid_example_pixel_decodes_to_5_5() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let geometry = GridGeometry::GIMMS;
    let (x, y) = geometry.coordinate_to_pixel(45.5, -65.0);
    assert_eq!((x, y), (1380, 534));
    let (mx, my) = (100usize, 200usize);

    write_grid(temp_dir.path(), &key(2000, 7, Period::A), &geometry, |cx, cy| {
        if (cx, cy) == (1380, 534) {
            55
        } else if (cx, cy) == (mx, my) {
            101
        } else {
            0
        }
    });
    assert!(temp_dir.path().join("AVHRRBUVI01.2000jula.abl").exists());

    let archive = RasterArchive::open(temp_dir.path()).unwrap();
    assert_eq!(archive.manifest().len(), 1);
    let entry = archive.manifest().first().unwrap();
    assert_eq!(entry.date.to_string(), "2000-07-01");

    let series = archive.time_series_at(45.5, -65.0).unwrap();
    assert_eq!(series.len(), 1);
    assert!((series[0] - 5.5).abs() < 1e-6);

    let grid = archive.grid_at_date(2000, 7, Period::A).unwrap();
    assert_eq!(grid.dim(), (2160, 4320));
    assert!((grid[[534, 1380]] - 5.5).abs() < 1e-6);
    assert_eq!(grid[[1380 % 2160, 534]], 0.0);

    let missing = archive.pixel_time_series(mx as i64, my as i64).unwrap();
    assert!(missing[0].is_nan());
    assert!(grid[[my, mx]].is_nan());
}

#[test]
fn manifest_is_chronological_and_filtered() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let dir = temp_dir.path();
    let geometry = coarse();

    // Written out of order on purpose
    for k in [
        key(2001, 3, Period::B),
        key(2000, 12, Period::A),
        key(2001, 3, Period::A),
        key(2000, 1, Period::B),
    ] {
        write_grid(dir, &k, &geometry, |_, _| 1);
    }
    // Outside the year range, wrong prefix, wrong suffix, malformed name
    write_grid(dir, &key(1999, 6, Period::A), &geometry, |_, _| 1);
    fs::write(dir.join("OTHER.2000feba.abl"), [0u8; 72]).unwrap();
    fs::write(dir.join("AVHRRBUVI01.2000feba.bin"), [0u8; 72]).unwrap();
    fs::write(dir.join("AVHRRBUVI01.2000fxxa.abl"), [0u8; 72]).unwrap();

    let archive = coarse_archive(dir, 2000, 2001);
    let manifest = archive.manifest();
    let names: Vec<String> = manifest.iter().map(|e| e.key.to_string()).collect();
    assert_eq!(names, ["2000janb", "2000deca", "2001mara", "2001marb"]);

    let dates = manifest.dates();
    assert!(dates.windows(2).all(|w| w[0] < w[1]));
    for entry in manifest {
        assert!(entry.path.exists());
        assert_eq!(entry.date, entry.key.date().unwrap());
    }
}

#[test]
fn grid_and_time_series_agree_everywhere() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let geometry = coarse();
    let keys = [
        key(2000, 1, Period::A),
        key(2000, 6, Period::B),
        key(2001, 11, Period::A),
    ];
    // Asymmetric pattern so a transposed read cannot pass; some values > 100
    let value = |t: usize, x: usize, y: usize| ((x * 13 + y * 5 + t * 3) % 120) as u8;
    for (t, k) in keys.iter().enumerate() {
        write_grid(temp_dir.path(), k, &geometry, |x, y| value(t, x, y));
    }

    let archive = coarse_archive(temp_dir.path(), 2000, 2001);
    assert_eq!(archive.manifest().len(), keys.len());

    let grids: Vec<_> = keys
        .iter()
        .map(|k| archive.grid_for_key(k).unwrap())
        .collect();

    let mut saw_missing = false;
    for x in 0..geometry.ncols {
        for y in 0..geometry.nrows {
            let series = archive.pixel_time_series(x as i64, y as i64).unwrap();
            assert_eq!(series.len(), archive.manifest().len());
            for (t, grid) in grids.iter().enumerate() {
                let expected = geometry.decode(value(t, x, y));
                saw_missing |= expected.is_nan();
                assert!(same_value(series[t], expected), "series at x={x} y={y} t={t}");
                assert!(same_value(grid[[y, x]], expected), "grid at x={x} y={y} t={t}");
                assert!(same_value(grid_value(grid.view(), x, y), series[t]));
            }
        }
    }
    assert!(saw_missing);
}

#[test]
fn data_cube_matches_whole_grid_windows() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let geometry = coarse();
    let keys = [key(2000, 2, Period::A), key(2000, 2, Period::B)];
    for (t, k) in keys.iter().enumerate() {
        write_grid(temp_dir.path(), k, &geometry, |x, y| {
            if x == 7 && y == 2 {
                200
            } else {
                (x * 6 + y + t * 50) as u8
            }
        });
    }
    let archive = coarse_archive(temp_dir.path(), 2000, 2000);

    // Corners in reverse order: (lat 0, lon 60) -> x 8, y 3; (lat 60, lon -30) -> x 5, y 1
    let cube = archive.data_cube(0.0, 60.0, 60.0, -30.0).unwrap();
    assert_eq!(cube.dim(), (2, 3, 4));

    for (t, k) in keys.iter().enumerate() {
        let grid = archive.grid_for_key(k).unwrap();
        let window = grid.slice(s![1..=3, 5..=8]);
        for ((row, col), &expected) in window.indexed_iter() {
            assert!(same_value(cube[[t, row, col]], expected));
        }
    }
    assert!(cube[[0, 1, 2]].is_nan());
    assert!(cube[[1, 1, 2]].is_nan());

    let single = archive.data_cube(10.0, 10.0, 10.0, 10.0).unwrap();
    assert_eq!(single.dim(), (2, 1, 1));
}

#[test]
fn linear_pixel_trend_is_recovered() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let geometry = coarse();
    let keys: Vec<PeriodKey> = PeriodKey::enumerate(2000, 2001).collect();
    assert_eq!(keys.len(), 48);
    for (t, k) in keys.iter().enumerate() {
        write_grid(temp_dir.path(), k, &geometry, |x, y| match (x, y) {
            // +0.1 LAI per half-month
            (6, 3) => 10 + t as u8,
            (7, 3) => 255,
            // Constant with one gap
            (6, 4) if t == 5 => 150,
            _ => 30,
        });
    }
    let archive = coarse_archive(temp_dir.path(), 2000, 2001);

    // x 6..=7, y 3..=4
    let trend = archive.trend_image(-1.0, 1.0, -31.0, 31.0).unwrap();
    assert_eq!(trend.shape(), (2, 2));

    assert!((trend.slope[[0, 0]] - 0.1 * PERIODS_PER_YEAR as f32).abs() < 1e-3);
    assert!(trend.p_value[[0, 0]] < 1e-6);
    assert_eq!(trend.valid_count[[0, 0]], 48);

    assert!(trend.slope[[0, 1]].is_nan());
    assert!(trend.p_value[[0, 1]].is_nan());
    assert_eq!(trend.valid_count[[0, 1]], 0);

    assert!(trend.slope[[1, 0]].abs() < 1e-6);
    assert_eq!(trend.valid_count[[1, 0]], 47);
}

#[test]
fn hovmoller_is_grid_column_over_time() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let geometry = coarse();
    let keys = [key(2000, 4, Period::A), key(2000, 5, Period::A), key(2000, 9, Period::B)];
    for (t, k) in keys.iter().enumerate() {
        write_grid(temp_dir.path(), k, &geometry, |x, y| (x + 10 * y + t) as u8);
    }
    let archive = coarse_archive(temp_dir.path(), 2000, 2000);

    let section = archive.hovmoller(-65.0).unwrap();
    assert_eq!(section.dim(), (geometry.nrows, keys.len()));
    let (x, _) = geometry.coordinate_to_pixel(0.0, -65.0);
    assert_eq!(x, 3);
    for (t, k) in keys.iter().enumerate() {
        let grid = archive.grid_for_key(k).unwrap();
        for y in 0..geometry.nrows {
            assert!(same_value(section[[y, t]], grid[[y, 3]]));
        }
    }
}

#[test]
fn out_of_range_and_missing_files_are_errors() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let geometry = coarse();
    write_grid(temp_dir.path(), &key(2000, 1, Period::A), &geometry, |_, _| 5);
    let archive = coarse_archive(temp_dir.path(), 2000, 2000);

    assert!(matches!(
        archive.pixel_time_series(12, 0),
        Err(GimmsError::OutOfRange { x: 12, y: 0, .. })
    ));
    assert!(matches!(
        archive.pixel_time_series(0, -1),
        Err(GimmsError::OutOfRange { .. })
    ));
    assert!(matches!(
        archive.time_series_at(-90.0, 0.0),
        Err(GimmsError::OutOfRange { .. })
    ));
    assert!(matches!(
        archive.data_cube(-90.0, 0.0, 0.0, 10.0),
        Err(GimmsError::OutOfRange { .. })
    ));
    assert!(matches!(
        archive.hovmoller(180.0),
        Err(GimmsError::OutOfRange { .. })
    ));
    assert!(matches!(
        archive.grid_at_date(2000, 2, Period::A),
        Err(GimmsError::FileNotFound { .. })
    ));
    assert!(matches!(
        archive.grid_at_date(2000, 13, Period::A),
        Err(GimmsError::InvalidMonth(_))
    ));

    // Lat 90 / lon -180 is the first pixel and reads fine
    let corner = archive.time_series_at(90.0, -180.0).unwrap();
    assert!((corner[0] - 0.5).abs() < 1e-6);
}

#[test]
fn grid_outside_manifest_range_is_still_readable() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let geometry = coarse();
    write_grid(temp_dir.path(), &key(1995, 8, Period::B), &geometry, |_, _| 42);
    let archive = coarse_archive(temp_dir.path(), 2000, 2000);

    assert!(archive.manifest().is_empty());
    let grid = archive.grid_at_date(1995, 8, Period::B).unwrap();
    assert!(grid.iter().all(|v| (v - 4.2).abs() < 1e-6));
    assert!(matches!(
        archive.trend_image(0.0, 0.0, 10.0, 10.0),
        Err(GimmsError::EmptyManifest)
    ));
}

#[test]
fn archive_opens_through_relative_directories() {
    let temp_dir = tempfile::tempdir_in(".").expect("Failed to create temp dir");
    let sub = temp_dir.path().join("sub");
    fs::create_dir(&sub).expect("Failed to create sub dir");
    write_grid(&sub, &key(2000, 7, Period::A), &coarse(), |x, y| (x + y) as u8);
    write_grid(&sub, &key(2000, 9, Period::B), &coarse(), |_, _| 255);

    let name = temp_dir.path().file_name().unwrap().to_string_lossy();
    for dir in [
        format!("./{}/sub", name),
        format!("./{}/sub/", name),
        format!("{}/sub", name),
    ] {
        let archive = coarse_archive(Path::new(&dir), 2000, 2000);
        assert_eq!(archive.manifest().len(), 2, "directory {:?}", dir);
        let series = archive.pixel_time_series(3, 2).unwrap();
        assert!(same_value(series[0], 0.5));
        assert!(series[1].is_nan());
    }
}
