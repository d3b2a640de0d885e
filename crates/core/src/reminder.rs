use std::path::Path;

use chrono::{Days, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReminderError {
    #[error("Unrecognized expiry date: '{0}' (expected mm/dd/yyyy or mm/yyyy)")]
    UnparseableDate(String),
    #[error("Reminder date for '{0}' is out of range")]
    OutOfRange(String),
}

/// How reminder events are built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    /// Calendar event title.
    pub title: String,
    /// Days before expiry the reminder lands on.
    pub lead_days: u32,
    /// Google Calendar template endpoint.
    pub calendar_url: String,
    /// Location note used when the caller gives none.
    pub location: String,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            title: "Important Document Reminder".to_string(),
            lead_days: 30,
            calendar_url: "https://calendar.google.com/calendar/render".to_string(),
            location: String::new(),
        }
    }
}

/// A calendar event reminding the user ahead of an expiry date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarReminder {
    pub expires_on: NaiveDate,
    pub remind_on: NaiveDate,
    pub url: String,
}

impl ReminderSettings {
    /// Build the reminder link for a canonical expiry string.
    ///
    /// `file`, when given, is linked from the event details as a `file://`
    /// URL; `location` is a free-text note on where the physical document lives.
    pub fn reminder(
        &self,
        expiry: &str,
        file: Option<&Path>,
        location: &str,
    ) -> Result<CalendarReminder, ReminderError> {
        let expires_on = parse_expiry(expiry)?;
        let remind_on = expires_on
            .checked_sub_days(Days::new(u64::from(self.lead_days)))
            .ok_or_else(|| ReminderError::OutOfRange(expiry.to_string()))?;

        let start = remind_on
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ReminderError::OutOfRange(expiry.to_string()))?;
        let end = start + TimeDelta::hours(1);
        let dates = format!("{}/{}", start.format("%Y%m%d"), end.format("%Y%m%d"));

        let location = if location.is_empty() { self.location.as_str() } else { location };
        let mut details = format!("Your document expires on {expiry}.\nDocument Location: {location}");
        if let Some(file) = file.filter(|f| !f.as_os_str().is_empty()) {
            let file_path = std::path::absolute(file).unwrap_or_else(|_| file.to_path_buf());
            details.push_str(&format!("\nFile URL: file://{}", file_path.display()));
        }

        let url = format!(
            "{}?action=TEMPLATE&text={}&dates={dates}&details={}",
            self.calendar_url,
            urlencoding::encode(&self.title),
            urlencoding::encode(&details),
        );
        debug!(%expires_on, %remind_on, "calendar reminder built");

        Ok(CalendarReminder { expires_on, remind_on, url })
    }
}

/// Read a canonical expiry string back into a date.
///
/// Three fields try month-first, then day-first; `mm/yyyy` means the 1st.
pub fn parse_expiry(expiry: &str) -> Result<NaiveDate, ReminderError> {
    let unparseable = || ReminderError::UnparseableDate(expiry.to_string());
    match expiry.split('/').count() {
        3 => NaiveDate::parse_from_str(expiry, "%m/%d/%Y")
            .or_else(|_| NaiveDate::parse_from_str(expiry, "%d/%m/%Y"))
            .map_err(|_| unparseable()),
        2 => NaiveDate::parse_from_str(&format!("01/{expiry}"), "%d/%m/%Y")
            .map_err(|_| unparseable()),
        _ => Err(unparseable()),
    }
}
