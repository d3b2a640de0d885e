use std::collections::BTreeSet;
use std::fmt;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::shape::{DateCandidate, DateShape};
use crate::today::Today;

re!(re_expiry_keyword,
    r"(?i)(exp(?:iry|iration)?\s*date|exp\s*date|exp\.|expires|valid\s*thru|valid\s*until|exp|good\s*thru|good\s*until|validity)");

/// Which pass of the scanner produced the candidates, most confident first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanTier {
    /// Date on the same line as an expiry keyword.
    SameLine,
    /// Date on the line right after an expiry keyword.
    NextLine,
    /// Date anywhere in the document.
    Document,
}

impl fmt::Display for ScanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanTier::SameLine => write!(f, "same_line"),
            ScanTier::NextLine => write!(f, "next_line"),
            ScanTier::Document => write!(f, "document"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// `None` when every pass came up empty.
    pub tier: Option<ScanTier>,
    pub candidates: BTreeSet<DateCandidate>,
}

impl ScanOutcome {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Whether a line carries one of the expiry labels ("exp", "valid thru", …).
pub fn is_expiry_line(line: &str) -> bool {
    re_expiry_keyword().is_match(line)
}

/// Split text into lines on every break OCR and PDF text layers produce,
/// form feeds between pages included.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().flat_map(|line| line.split(is_extra_line_break))
}

fn is_extra_line_break(c: char) -> bool {
    matches!(
        c,
        '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Look for expiry-date candidates in `text`.
///
/// Three passes, stopping at the first one that finds anything: keyword
/// lines, the lines right after keyword lines, then the whole text. Matches
/// whose year falls outside the plausible window for `today` are dropped as
/// they are found.
pub fn scan(text: &str, today: Today) -> ScanOutcome {
    let lines: Vec<&str> = split_lines(text).collect();
    let keyword_lines: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_expiry_line(line))
        .map(|(i, _)| i)
        .collect();

    debug!(lines = lines.len(), keyword_lines = keyword_lines.len(), "scanning for expiry dates");

    let same_line = collect(keyword_lines.iter().map(|&i| lines[i]), today);
    if !same_line.is_empty() {
        return found(ScanTier::SameLine, same_line);
    }

    let next_line = collect(
        keyword_lines.iter().filter_map(|&i| lines.get(i + 1).copied()),
        today,
    );
    if !next_line.is_empty() {
        return found(ScanTier::NextLine, next_line);
    }

    let document = collect([text], today);
    if !document.is_empty() {
        return found(ScanTier::Document, document);
    }

    debug!("no expiry candidates in text");
    ScanOutcome::default()
}

fn found(tier: ScanTier, candidates: BTreeSet<DateCandidate>) -> ScanOutcome {
    debug!(%tier, count = candidates.len(), "expiry candidates found");
    ScanOutcome { tier: Some(tier), candidates }
}

fn collect<'a>(regions: impl IntoIterator<Item = &'a str>, today: Today) -> BTreeSet<DateCandidate> {
    regions
        .into_iter()
        .flat_map(|region| DateShape::ALL.into_iter().flat_map(move |shape| shape.find_all(region)))
        .filter(|candidate| year_in_window(candidate, today))
        .collect()
}

fn year_in_window(candidate: &DateCandidate, today: Today) -> bool {
    candidate
        .year()
        .parse::<i32>()
        .is_ok_and(|year| today.accepts_year(year))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_2024() -> Today {
        Today::in_year(2024).unwrap()
    }

    fn rendered(outcome: &ScanOutcome) -> Vec<String> {
        outcome.candidates.iter().map(|c| c.to_string()).collect()
    }

    // ── Keywords ──────────────────────────────────────────────────────────────

    #[test]
    fn keyword_variants_are_recognized() {
        for line in [
            "EXPIRY DATE",
            "Expiration Date:",
            "exp date",
            "Exp. 04/2030",
            "Card expires",
            "VALID THRU",
            "valid  until",
            "GOOD THRU",
            "good until",
            "Validity",
        ] {
            assert!(is_expiry_line(line), "{line:?} should be a keyword line");
        }
        assert!(!is_expiry_line("Date of issue"));
        assert!(!is_expiry_line("Valid from 01/01/2020"));
    }

    #[test]
    fn bare_exp_substring_counts_as_keyword() {
        assert!(is_expiry_line("Work experience"));
    }

    // ── Line splitting ────────────────────────────────────────────────────────

    #[test]
    fn split_lines_handles_crlf_and_form_feed() {
        let lines: Vec<&str> = split_lines("a\r\nb\x0cc\nd").collect();
        assert_eq!(lines, vec!["a", "b", "c", "d"]);
    }

    // ── Tiers ─────────────────────────────────────────────────────────────────

    #[test]
    fn same_line_match() {
        let outcome = scan("DRIVER LICENSE\nEXP DATE: 11/30/2026\nDOB 01/02/1980", in_2024());
        assert_eq!(outcome.tier, Some(ScanTier::SameLine));
        assert_eq!(rendered(&outcome), vec!["11/30/2026"]);
    }

    #[test]
    fn same_line_ignores_dates_elsewhere() {
        let text = "Issued 03/04/2025\nExpires 06/07/2028\nRenew by 12/12/2029";
        let outcome = scan(text, in_2024());
        assert_eq!(outcome.tier, Some(ScanTier::SameLine));
        // Both full readings of 06/07/2028 are the same string and collapse.
        assert_eq!(rendered(&outcome), vec!["06/07/2028", "07/2028"]);
    }

    #[test]
    fn next_line_match_when_label_is_split_from_value() {
        let text = "PASSPORT\nDate of expiry\n15-08-2031\nNationality";
        let outcome = scan(text, in_2024());
        assert_eq!(outcome.tier, Some(ScanTier::NextLine));
        assert_eq!(rendered(&outcome), vec!["15/08/2031", "08/2031"]);
    }

    #[test]
    fn next_line_only_looks_one_line_down() {
        let text = "Valid thru\n\n09/2030";
        let outcome = scan(text, in_2024());
        assert_eq!(outcome.tier, Some(ScanTier::Document));
    }

    #[test]
    fn keyword_on_last_line_has_no_next_line() {
        let outcome = scan("Certificate 02/2029\nexpires", in_2024());
        assert_eq!(outcome.tier, Some(ScanTier::Document));
        assert_eq!(rendered(&outcome), vec!["02/2029"]);
    }

    #[test]
    fn document_fallback_without_keywords() {
        let outcome = scan("MEMBERSHIP CARD\n10/2027\nJOHN DOE", in_2024());
        assert_eq!(outcome.tier, Some(ScanTier::Document));
        assert_eq!(rendered(&outcome), vec!["10/2027"]);
    }

    #[test]
    fn ambiguous_dates_keep_both_readings() {
        let outcome = scan("EXP 12/01/2027", in_2024());
        // mm/dd and the mm/yyyy tail; dd/mm reads the same string.
        assert_eq!(rendered(&outcome), vec!["12/01/2027", "01/2027"]);
    }

    #[test]
    fn nothing_found() {
        let outcome = scan("Hello world\nno dates here", in_2024());
        assert!(outcome.is_empty());
        assert_eq!(outcome.tier, None);
        assert!(scan("", in_2024()).is_empty());
    }

    // ── Year window ───────────────────────────────────────────────────────────

    #[test]
    fn year_window_boundaries() {
        let today = Today::in_year(2025).unwrap();
        assert_eq!(rendered(&scan("exp 01/01/2075", today)), vec!["01/01/2075", "01/2075"]);
        assert!(scan("exp 01/01/2076", today).is_empty());
        assert!(scan("exp 01/01/2024", today).is_empty());
    }

    #[test]
    fn out_of_window_same_line_falls_through_to_next_tier() {
        let text = "Expires 05/05/1999\n07/2031";
        let outcome = scan(text, in_2024());
        assert_eq!(outcome.tier, Some(ScanTier::NextLine));
        assert_eq!(rendered(&outcome), vec!["07/2031"]);
    }
}
