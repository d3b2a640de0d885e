use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;

use crate::normalize::NormalizedDate;
use crate::today::Today;

re!(re_document_label, r"(?i)(ID|CARD|LICENSE|DOCUMENT|CERTIFICATE)");

/// Title used when the text has no usable line at all.
pub const FALLBACK_TITLE: &str = "Document Reminder";

/// Best guess at a document's heading.
///
/// First non-blank line that is all caps or names the document kind
/// (ID, card, license, document, certificate); otherwise the first
/// non-blank line.
pub fn document_title(text: &str) -> String {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty()).peekable();
    let first = lines.peek().copied();
    lines
        .find(|l| is_all_caps(l) || re_document_label().is_match(l))
        .or(first)
        .unwrap_or(FALLBACK_TITLE)
        .to_string()
}

/// Suggested expiry when none could be read: one year out from `today`.
pub fn recommended_expiry(today: Today) -> NormalizedDate {
    let date = today
        .date()
        .checked_add_days(Days::new(365))
        .unwrap_or(today.date());
    NormalizedDate::from(date)
}

impl From<NaiveDate> for NormalizedDate {
    fn from(date: NaiveDate) -> Self {
        NormalizedDate::Full {
            first: date.month(),
            second: date.day(),
            year: date.year(),
        }
    }
}

/// At least one cased letter, and no lowercase ones.
fn is_all_caps(line: &str) -> bool {
    let mut cased = false;
    for c in line.chars() {
        if c.is_lowercase() {
            return false;
        }
        cased |= c.is_uppercase();
    }
    cased
}
