//! Chronological index of the grid files in an archive directory
//!
//! The manifest is built by enumerating every (year, month, period) key in a
//! fixed calendar range, constructing the canonical file name for each, and
//! keeping the keys whose file was reported by a directory listing. Because the
//! enumeration runs in calendar order, the manifest is sorted by construction.

use crate::errors::{GimmsError, Result};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Three-letter lowercase month names used in file names
pub const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Half-month observation period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    /// First half of the month, dated the 1st
    A,
    /// Second half of the month, dated the 15th
    B,
}

impl Period {
    pub const ALL: [Period; 2] = [Period::A, Period::B];

    /// Day of month the period is dated to
    #[must_use]
    pub const fn day(self) -> u32 {
        match self {
            Self::A => 1,
            Self::B => 15,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = GimmsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "a" | "A" => Ok(Period::A),
            "b" | "B" => Ok(Period::B),
            other => Err(GimmsError::InvalidPeriod(other.to_string())),
        }
    }
}

/// Parse a month given either as a number (`7`) or a name (`jul`, `July`)
///
/// # Errors
///
/// Returns [`GimmsError::InvalidMonth`] when the text names no month.
pub fn parse_month(s: &str) -> Result<u32> {
    if let Ok(n) = s.parse::<u32>() {
        if (1..=12).contains(&n) {
            return Ok(n);
        }
        return Err(GimmsError::InvalidMonth(s.to_string()));
    }
    let lower = s.to_ascii_lowercase();
    MONTH_NAMES
        .iter()
        .position(|m| lower.len() >= 3 && lower.starts_with(m))
        .map(|i| i as u32 + 1)
        .ok_or_else(|| GimmsError::InvalidMonth(s.to_string()))
}

/// Calendar key identifying one grid file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeriodKey {
    pub year: i32,
    /// Month number, 1-12
    pub month: u32,
    pub period: Period,
}

impl PeriodKey {
    /// # Errors
    ///
    /// Returns [`GimmsError::InvalidMonth`] when `month` is not in 1..=12.
    pub fn new(year: i32, month: u32, period: Period) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(GimmsError::InvalidMonth(month.to_string()));
        }
        Ok(Self {
            year,
            month,
            period,
        })
    }

    #[must_use]
    pub fn month_name(&self) -> &'static str {
        MONTH_NAMES[(self.month - 1) as usize]
    }

    /// Calendar date of the period (1st or 15th of the month)
    ///
    /// # Errors
    ///
    /// Returns an error if the year is outside chrono's supported range.
    pub fn date(&self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.period.day()).ok_or_else(|| {
            GimmsError::Generic(format!("Year {} is outside the supported range", self.year))
        })
    }

    /// Every key from January `start_year` (period a) to December `end_year`
    /// (period b), in chronological order
    pub fn enumerate(start_year: i32, end_year: i32) -> impl Iterator<Item = PeriodKey> {
        (start_year..=end_year).flat_map(|year| {
            (1..=12u32).flat_map(move |month| {
                Period::ALL.into_iter().map(move |period| PeriodKey {
                    year,
                    month,
                    period,
                })
            })
        })
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.year, self.month_name(), self.period)
    }
}

/// File naming convention `<prefix>.<year><mon><period>.<suffix>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNaming {
    pub prefix: String,
    pub suffix: String,
}

impl FileNaming {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    #[must_use]
    pub fn file_name(&self, key: &PeriodKey) -> String {
        format!("{}.{}.{}", self.prefix, key, self.suffix)
    }

    #[must_use]
    pub fn path_in(&self, directory: &Path, key: &PeriodKey) -> PathBuf {
        directory.join(self.file_name(key))
    }

    /// Recover the calendar key from a file name following this convention
    #[must_use]
    pub fn parse_file_name(&self, name: &str) -> Option<PeriodKey> {
        let stem = name
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('.')?
            .strip_suffix(self.suffix.as_str())?
            .strip_suffix('.')?;
        if stem.len() != 8 || !stem.is_ascii() {
            return None;
        }
        let year: i32 = stem[..4].parse().ok()?;
        let month = MONTH_NAMES.iter().position(|m| *m == &stem[4..7])? as u32 + 1;
        let period = stem[7..].parse().ok()?;
        Some(PeriodKey {
            year,
            month,
            period,
        })
    }
}

impl Default for FileNaming {
    fn default() -> Self {
        Self::new("AVHRRBUVI01", "abl")
    }
}

/// One grid file in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub path: PathBuf,
    pub date: NaiveDate,
    pub key: PeriodKey,
}

/// Chronologically ordered list of the grid files that exist on disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Keep the keys of the calendar range whose file `exists` reports present.
    ///
    /// # Errors
    ///
    /// Returns an error if a key cannot be turned into a calendar date.
    pub fn build<F>(
        directory: &Path,
        naming: &FileNaming,
        start_year: i32,
        end_year: i32,
        mut exists: F,
    ) -> Result<Self>
    where
        F: FnMut(&Path) -> bool,
    {
        let mut entries = Vec::new();
        for key in PeriodKey::enumerate(start_year, end_year) {
            let path = naming.path_in(directory, &key);
            if exists(&path) {
                entries.push(ManifestEntry {
                    date: key.date()?,
                    path,
                    key,
                });
            }
        }
        Ok(Self { entries })
    }

    /// Build the manifest from a glob listing of `<directory>/*<suffix>`.
    ///
    /// A missing directory lists no files and yields an empty manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory path does not form a valid pattern.
    pub fn scan(
        directory: &Path,
        naming: &FileNaming,
        start_year: i32,
        end_year: i32,
    ) -> Result<Self> {
        let listed = list_file_names(directory, &naming.suffix)?;
        log::debug!(
            "Listed {} candidate files in {}",
            listed.len(),
            directory.display()
        );
        Self::from_listing(directory, naming, start_year, end_year, &listed)
    }

    /// Match the calendar range against a listing of bare file names.
    ///
    /// Names are compared without their directory, so `.`, `./data` and
    /// `data/` all resolve the same files.
    fn from_listing(
        directory: &Path,
        naming: &FileNaming,
        start_year: i32,
        end_year: i32,
        listed: &HashSet<OsString>,
    ) -> Result<Self> {
        for name in listed {
            let name = name.to_string_lossy();
            match naming.parse_file_name(&name) {
                Some(key) if key.year < start_year || key.year > end_year => log::debug!(
                    "Ignoring {}: outside {}..={}",
                    name,
                    start_year,
                    end_year
                ),
                Some(_) => {}
                None => log::warn!("Ignoring {}: not a recognised grid file name", name),
            }
        }
        Self::build(directory, naming, start_year, end_year, |p| {
            p.file_name().map_or(false, |n| listed.contains(n))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ManifestEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.entries.iter().map(|e| e.date).collect()
    }

    /// Index of the entry dated exactly `date`
    #[must_use]
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.entries.binary_search_by(|e| e.date.cmp(&date)).ok()
    }

    #[must_use]
    pub fn first(&self) -> Option<&ManifestEntry> {
        self.entries.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&ManifestEntry> {
        self.entries.last()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestEntry;
    type IntoIter = std::slice::Iter<'a, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn list_file_names(directory: &Path, suffix: &str) -> Result<HashSet<OsString>> {
    let escaped = glob::Pattern::escape(&directory.to_string_lossy());
    let pattern = if escaped.is_empty() {
        format!("*{}", suffix)
    } else {
        format!("{}/*{}", escaped.trim_end_matches('/'), suffix)
    };
    let mut files = HashSet::new();
    for entry in glob::glob(&pattern)? {
        match entry {
            Ok(path) => {
                if let Some(name) = path.file_name() {
                    files.insert(name.to_os_string());
                }
            }
            Err(e) => log::warn!("Skipping unreadable entry: {}", e),
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_follows_convention() {
        let naming = FileNaming::default();
        let key = PeriodKey::new(2000, 7, Period::A).unwrap();
        assert_eq!(naming.file_name(&key), "AVHRRBUVI01.2000jula.abl");
        assert_eq!(
            naming.parse_file_name("AVHRRBUVI01.2000jula.abl"),
            Some(key)
        );
        assert_eq!(naming.parse_file_name("AVHRRBUVI01.2000xyzb.abl"), None);
        assert_eq!(naming.parse_file_name("OTHER.2000jula.abl"), None);
    }

    #[test]
    fn enumerate_covers_calendar_in_order() {
        let keys: Vec<_> = PeriodKey::enumerate(1981, 1982).collect();
        assert_eq!(keys.len(), 48);
        assert_eq!(keys[0].to_string(), "1981jana");
        assert_eq!(keys[1].to_string(), "1981janb");
        assert_eq!(keys[47].to_string(), "1982decb");
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn period_dates() {
        let a = PeriodKey::new(2000, 7, Period::A).unwrap();
        let b = PeriodKey::new(2000, 7, Period::B).unwrap();
        assert_eq!(a.date().unwrap(), NaiveDate::from_ymd_opt(2000, 7, 1).unwrap());
        assert_eq!(b.date().unwrap(), NaiveDate::from_ymd_opt(2000, 7, 15).unwrap());
        assert!(PeriodKey::new(2000, 13, Period::A).is_err());
    }

    #[test]
    fn parse_period_and_month() {
        assert_eq!("a".parse::<Period>().unwrap(), Period::A);
        assert_eq!("B".parse::<Period>().unwrap(), Period::B);
        assert!(matches!(
            "c".parse::<Period>(),
            Err(GimmsError::InvalidPeriod(_))
        ));
        assert_eq!(parse_month("7").unwrap(), 7);
        assert_eq!(parse_month("jul").unwrap(), 7);
        assert_eq!(parse_month("December").unwrap(), 12);
        assert!(parse_month("0").is_err());
        assert!(parse_month("ju").is_err());
    }

    #[test]
    fn build_keeps_only_existing_files_in_order() {
        let naming = FileNaming::default();
        let dir = Path::new("/data/gimms");
        let present: HashSet<PathBuf> = ["1990decb", "1990jana", "1991junb"]
            .iter()
            .map(|s| dir.join(format!("AVHRRBUVI01.{}.abl", s)))
            .collect();
        let manifest =
            Manifest::build(dir, &naming, 1980, 2012, |p| present.contains(p)).unwrap();

        assert_eq!(manifest.len(), 3);
        let names: Vec<String> = manifest.iter().map(|e| e.key.to_string()).collect();
        assert_eq!(names, ["1990jana", "1990decb", "1991junb"]);
        assert!(manifest.dates().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(
            manifest.position(NaiveDate::from_ymd_opt(1990, 12, 15).unwrap()),
            Some(1)
        );
        assert_eq!(
            manifest.position(NaiveDate::from_ymd_opt(1990, 12, 1).unwrap()),
            None
        );
    }

    #[test]
    fn scan_of_missing_directory_is_empty() {
        let manifest = Manifest::scan(
            Path::new("/nonexistent/gimms/archive"),
            &FileNaming::default(),
            1980,
            2012,
        )
        .unwrap();
        assert!(manifest.is_empty());
        assert!(manifest.first().is_none());
    }

    fn write_files(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), [0u8]).unwrap();
        }
    }

    #[test]
    fn listing_matches_current_directory_spellings() {
        let naming = FileNaming::default();
        let listed: HashSet<OsString> = [
            "AVHRRBUVI01.2000jula.abl",
            "AVHRRBUVI01.2000julb.abl",
            "AVHRRBUVI01.1975jana.abl",
            "notes.abl",
        ]
        .iter()
        .map(OsString::from)
        .collect();

        for dir in [".", "./", ""] {
            let manifest =
                Manifest::from_listing(Path::new(dir), &naming, 2000, 2000, &listed).unwrap();
            let names: Vec<String> = manifest.iter().map(|e| e.key.to_string()).collect();
            assert_eq!(names, ["2000jula", "2000julb"], "directory {:?}", dir);
        }
    }

    #[test]
    fn scan_of_relative_directory_spellings() {
        let temp_dir = tempfile::tempdir_in(".").expect("Failed to create temp dir");
        write_files(
            temp_dir.path(),
            &["AVHRRBUVI01.2000jula.abl", "AVHRRBUVI01.2000decb.abl"],
        );
        let name = temp_dir
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();

        for dir in [
            format!("./{}", name),
            format!("./{}/", name),
            format!("{}/", name),
            name.clone(),
        ] {
            let manifest =
                Manifest::scan(Path::new(&dir), &FileNaming::default(), 2000, 2000).unwrap();
            assert_eq!(manifest.len(), 2, "directory {:?}", dir);
            assert_eq!(manifest.entries()[1].key.to_string(), "2000decb");
            assert!(manifest.entries()[0].path.starts_with(&dir));
        }
    }
}
