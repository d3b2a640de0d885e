use regex::Regex;
use std::fmt;

re!(re_month_day_year,
    r"(0[1-9]|1[0-2])[/-](0[1-9]|[12][0-9]|3[01])[/-]([0-9]{4})");
re!(re_day_month_year,
    r"(0[1-9]|[12][0-9]|3[01])[/-](0[1-9]|1[0-2])[/-]([0-9]{4})");
re!(re_month_year,
    r"(0[1-9]|1[0-2])[/-]([0-9]{4})");

/// The date layouts the scanner recognizes. Separators may be `/` or `-`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateShape {
    /// `mm/dd/yyyy`
    MonthDayYear,
    /// `dd/mm/yyyy`
    DayMonthYear,
    /// `mm/yyyy`
    MonthYear,
}

impl DateShape {
    /// Every shape, in the order they are tried.
    pub const ALL: [DateShape; 3] = [
        DateShape::MonthDayYear,
        DateShape::DayMonthYear,
        DateShape::MonthYear,
    ];

    fn pattern(self) -> &'static Regex {
        match self {
            DateShape::MonthDayYear => re_month_day_year(),
            DateShape::DayMonthYear => re_day_month_year(),
            DateShape::MonthYear => re_month_year(),
        }
    }

    /// All non-overlapping matches of this shape in `text`, left to right.
    pub fn find_all<'t>(self, text: &'t str) -> impl Iterator<Item = DateCandidate> + 't {
        self.pattern().captures_iter(text).filter_map(move |c| match self {
            DateShape::MonthDayYear | DateShape::DayMonthYear => Some(DateCandidate::Full {
                first: c.get(1)?.as_str().to_string(),
                second: c.get(2)?.as_str().to_string(),
                year: c.get(3)?.as_str().to_string(),
            }),
            DateShape::MonthYear => Some(DateCandidate::MonthYear {
                month: c.get(1)?.as_str().to_string(),
                year: c.get(2)?.as_str().to_string(),
            }),
        })
    }
}

impl fmt::Display for DateShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateShape::MonthDayYear => write!(f, "mm/dd/yyyy"),
            DateShape::DayMonthYear => write!(f, "dd/mm/yyyy"),
            DateShape::MonthYear => write!(f, "mm/yyyy"),
        }
    }
}

/// A raw date as read from the text, fields kept verbatim.
///
/// Full dates keep their fields in reading order: a `dd/mm/yyyy` match stays
/// day-first, and the selector and link builder sort out which reading holds.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateCandidate {
    Full {
        first: String,
        second: String,
        year: String,
    },
    MonthYear {
        month: String,
        year: String,
    },
}

impl DateCandidate {
    /// Build a candidate from loose fields. Only two- and three-field inputs are dates.
    pub fn from_fields(fields: &[&str]) -> Option<Self> {
        match fields {
            [first, second, year] => Some(DateCandidate::Full {
                first: first.to_string(),
                second: second.to_string(),
                year: year.to_string(),
            }),
            [month, year] => Some(DateCandidate::MonthYear {
                month: month.to_string(),
                year: year.to_string(),
            }),
            _ => None,
        }
    }

    pub fn year(&self) -> &str {
        match self {
            DateCandidate::Full { year, .. } | DateCandidate::MonthYear { year, .. } => year,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, DateCandidate::Full { .. })
    }
}

impl fmt::Display for DateCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateCandidate::Full { first, second, year } => write!(f, "{first}/{second}/{year}"),
            DateCandidate::MonthYear { month, year } => write!(f, "{month}/{year}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(shape: DateShape, text: &str) -> Vec<String> {
        shape.find_all(text).map(|c| c.to_string()).collect()
    }

    #[test]
    fn month_day_year_accepts_either_separator() {
        assert_eq!(found(DateShape::MonthDayYear, "11/30/2026"), vec!["11/30/2026"]);
        assert_eq!(found(DateShape::MonthDayYear, "11-30-2026"), vec!["11/30/2026"]);
        assert_eq!(found(DateShape::MonthDayYear, "11/30-2026"), vec!["11/30/2026"]);
    }

    #[test]
    fn month_day_year_rejects_out_of_range_fields() {
        assert!(found(DateShape::MonthDayYear, "13/01/2026").is_empty());
        assert!(found(DateShape::MonthDayYear, "12/32/2026").is_empty());
        assert!(found(DateShape::MonthDayYear, "1/5/2026").is_empty());
    }

    #[test]
    fn day_month_year_keeps_reading_order() {
        assert_eq!(found(DateShape::DayMonthYear, "25/12/2027"), vec!["25/12/2027"]);
        assert!(found(DateShape::MonthDayYear, "25/12/2027").is_empty());
    }

    #[test]
    fn month_year_matches_inside_full_dates() {
        // No word boundaries: the tail of a full date can read as mm/yyyy.
        assert_eq!(found(DateShape::MonthYear, "12/01/2027"), vec!["01/2027"]);
        assert_eq!(found(DateShape::MonthYear, "card 07/2029"), vec!["07/2029"]);
    }

    #[test]
    fn years_are_ascii_digits_only() {
        // Arabic-Indic and fullwidth digits are not years.
        assert!(found(DateShape::MonthDayYear, "11/30/\u{662}\u{660}\u{662}\u{666}").is_empty());
        assert!(found(DateShape::MonthYear, "03/\u{ff12}\u{ff10}\u{ff12}\u{ff17}").is_empty());
    }

    #[test]
    fn finds_every_match_left_to_right() {
        let text = "issued 01/02/2020 expires 01/02/2030";
        assert_eq!(
            found(DateShape::MonthDayYear, text),
            vec!["01/02/2020", "01/02/2030"]
        );
    }

    #[test]
    fn from_fields_checks_arity() {
        assert!(DateCandidate::from_fields(&["01", "2027"]).is_some());
        assert!(DateCandidate::from_fields(&["01", "02", "2027"]).unwrap().is_full());
        assert!(DateCandidate::from_fields(&["2027"]).is_none());
        assert!(DateCandidate::from_fields(&["1", "2", "3", "4"]).is_none());
    }

    #[test]
    fn shape_display() {
        assert_eq!(DateShape::DayMonthYear.to_string(), "dd/mm/yyyy");
    }
}
