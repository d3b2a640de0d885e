use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::shape::DateCandidate;
use crate::today::Today;

/// A candidate in canonical form: `mm/dd/yyyy` or `mm/yyyy`.
///
/// Day and month are rendered with two digits, the year with four. A full
/// date read day-first keeps that order (`25/12/2027`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NormalizedDate {
    Full { first: u32, second: u32, year: i32 },
    MonthYear { month: u32, year: i32 },
}

impl NormalizedDate {
    pub fn is_full(&self) -> bool {
        matches!(self, NormalizedDate::Full { .. })
    }

    pub fn year(&self) -> i32 {
        match *self {
            NormalizedDate::Full { year, .. } | NormalizedDate::MonthYear { year, .. } => year,
        }
    }

    /// Ordering key, larger is later. Month-only dates count as the 1st.
    pub fn sort_key(&self) -> i64 {
        let (first, second, year) = match *self {
            NormalizedDate::Full { first, second, year } => (first, second, year),
            NormalizedDate::MonthYear { month, year } => (month, 1, year),
        };
        i64::from(year) * 10_000 + i64::from(first) * 100 + i64::from(second)
    }
}

impl fmt::Display for NormalizedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedDate::Full { first, second, year } => {
                write!(f, "{first:02}/{second:02}/{year:04}")
            }
            NormalizedDate::MonthYear { month, year } => write!(f, "{month:02}/{year:04}"),
        }
    }
}

impl Serialize for NormalizedDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Canonicalize one candidate. Two-digit years take the century of `today`.
///
/// Returns `None` for fields that are not numbers of the expected width.
pub fn normalize(candidate: &DateCandidate, today: Today) -> Option<NormalizedDate> {
    match candidate {
        DateCandidate::Full { first, second, year } => Some(NormalizedDate::Full {
            first: parse_short_field(first)?,
            second: parse_short_field(second)?,
            year: expand_year(year, today)?,
        }),
        DateCandidate::MonthYear { month, year } => Some(NormalizedDate::MonthYear {
            month: parse_short_field(month)?,
            year: expand_year(year, today)?,
        }),
    }
}

/// Canonicalize a loose `/`- or `-`-separated date string.
///
/// Anything that does not split into two or three fields is not a date.
pub fn normalize_str(raw: &str, today: Today) -> Option<NormalizedDate> {
    let fields: Vec<&str> = raw.trim().split(['/', '-']).map(str::trim).collect();
    normalize(&DateCandidate::from_fields(&fields)?, today)
}

/// Pick the single best date: the latest full date, else the latest month.
pub fn select(dates: impl IntoIterator<Item = NormalizedDate>) -> Option<NormalizedDate> {
    let unique: BTreeSet<NormalizedDate> = dates.into_iter().collect();
    let mut ordered: Vec<NormalizedDate> = unique.into_iter().collect();
    ordered.sort_by_key(|d| Reverse(d.sort_key()));

    let chosen = ordered
        .iter()
        .find(|d| d.is_full())
        .or_else(|| ordered.first())
        .copied();

    if let Some(date) = chosen {
        debug!(%date, considered = ordered.len(), "expiry date selected");
    }
    chosen
}

/// Canonicalize every candidate, drop the ones that fail, and pick one.
pub fn normalize_and_select<'a>(
    candidates: impl IntoIterator<Item = &'a DateCandidate>,
    today: Today,
) -> Option<NormalizedDate> {
    select(candidates.into_iter().filter_map(|c| normalize(c, today)))
}

fn parse_short_field(field: &str) -> Option<u32> {
    if field.is_empty() || field.len() > 2 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

fn expand_year(year: &str, today: Today) -> Option<i32> {
    if !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match year.len() {
        2 => format!("{}{year}", today.century_prefix()).parse().ok(),
        4 => year.parse().ok(),
        _ => None,
    }
}
