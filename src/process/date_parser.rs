use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{fmt, str::FromStr};

/// `{YY}-{M}.xls` / `{YY}-{MM}.xlsx` at the end of a published filename.
static REPORT_FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{2})-(\d{1,2})\.xlsx?$").expect("report filename pattern should compile")
});

/// The calendar month a report's figures describe, held as the first day of that month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period(NaiveDate);

impl Period {
    /// `None` when `month` is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Period)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// The month before a publication month.
    fn preceding(year: i32, month: u32) -> Option<Self> {
        if month == 1 {
            Period::new(year - 1, 12)
        } else {
            Period::new(year, month - 1)
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y年%m月"))
    }
}

/// Parses `"YYYY-MM"`.
impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (y, m) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("expected YYYY-MM, got {:?}", s))?;
        let year: i32 = y.parse()?;
        let month: u32 = m.parse()?;
        Period::new(year, month).ok_or_else(|| anyhow::anyhow!("month out of range in {:?}", s))
    }
}

/// Resolve the data period from a report filename such as `24-8.xlsx`.
///
/// The encoded month is the publication month, so the data month is one earlier.
/// Returns `None` for filenames that don't follow the convention or carry a month
/// outside 1..=12.
pub fn period_from_filename(filename: &str) -> Option<Period> {
    let caps = REPORT_FILENAME.captures(filename)?;
    let year_short: i32 = caps[1].parse().ok()?;
    let file_month: u32 = caps[2].parse().ok()?;
    if !(1..=12).contains(&file_month) {
        return None;
    }
    Period::preceding(2000 + year_short, file_month)
}
