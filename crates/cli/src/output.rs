use expiryguard_core::{CalendarReminder, Extraction, NormalizedDate};
use expiryguard_ocr::ExpiryReport;

/// Human-readable summary of a processed document.
pub fn report_text(report: &ExpiryReport) -> String {
    let mut out = format!(
        "Document: {}\nStored at: {}\n",
        report.extraction.title,
        report.stored_path.display()
    );
    out.push_str(&extraction_text(&report.extraction));

    if let Some(reminder) = &report.reminder {
        out.push_str(&reminder_text(reminder));
    }
    if let Some(warning) = &report.link_warning {
        out.push_str(&format!("Warning: could not build a calendar link: {warning}\n"));
    }
    if let Some(suggested) = report.recommended_expiry {
        out.push_str(&manual_entry_hint(suggested, &report.stored_path.display().to_string()));
    }
    out
}

pub fn extraction_text(extraction: &Extraction) -> String {
    match (&extraction.expiry, extraction.tier) {
        (Some(expiry), Some(tier)) => format!("Expiry date: {expiry} (found: {tier})\n"),
        (Some(expiry), None) => format!("Expiry date: {expiry}\n"),
        (None, _) => "No expiry dates found in the document.\n".to_string(),
    }
}

pub fn reminder_text(reminder: &CalendarReminder) -> String {
    format!(
        "Reminder on {}: {}\n",
        reminder.remind_on.format("%m/%d/%Y"),
        reminder.url
    )
}

fn manual_entry_hint(suggested: NormalizedDate, file: &str) -> String {
    format!(
        "Set a date by hand with: expiryguard link <mm/dd/yyyy> --file {file}\nSuggested expiry: {suggested}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use expiryguard_core::{ExpiryExtractor, Today};

    fn extract(text: &str) -> Extraction {
        ExpiryExtractor::new(Today::in_year(2024).unwrap()).extract(text)
    }

    #[test]
    fn found_date_mentions_tier() {
        assert_eq!(
            extraction_text(&extract("EXP 11/30/2026")),
            "Expiry date: 11/30/2026 (found: same_line)\n"
        );
    }

    #[test]
    fn missing_date() {
        assert_eq!(
            extraction_text(&extract("nothing here")),
            "No expiry dates found in the document.\n"
        );
    }

    #[test]
    fn hint_names_the_stored_file() {
        let suggested = NormalizedDate::Full { first: 1, second: 2, year: 2026 };
        let hint = manual_entry_hint(suggested, "/u/ab/ab.png");
        assert!(hint.contains("--file /u/ab/ab.png"));
        assert!(hint.contains("Suggested expiry: 01/02/2026"));
    }
}
