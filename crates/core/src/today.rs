use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Widest forward window (in years) an expiry date may sit from the reference year.
pub const YEAR_WINDOW: i32 = 50;

/// The reference date an extraction runs against.
///
/// Captured once per call and passed down so that the year-range check and
/// two-digit year expansion never read the wall clock themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Today(NaiveDate);

impl Today {
    pub fn new(date: NaiveDate) -> Self {
        Today(date)
    }

    /// Reads the local clock.
    pub fn now() -> Self {
        Today(Local::now().date_naive())
    }

    /// January 1st of `year`. Handy in tests where only the year matters.
    pub fn in_year(year: i32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, 1, 1).map(Today)
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    /// Whether `year` is a plausible expiry year: `[year, year + YEAR_WINDOW]`.
    pub fn accepts_year(self, year: i32) -> bool {
        (self.year()..=self.year() + YEAR_WINDOW).contains(&year)
    }

    /// Leading two digits of the reference year (`"20"` for 2025).
    pub fn century_prefix(self) -> String {
        self.year().to_string().chars().take(2).collect()
    }
}

impl From<NaiveDate> for Today {
    fn from(date: NaiveDate) -> Self {
        Today(date)
    }
}

impl fmt::Display for Today {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
