// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub mod document;
pub mod extract;
pub mod normalize;
pub mod reminder;
pub mod scan;
pub mod settings;
pub mod shape;
pub mod today;

pub use document::{document_title, recommended_expiry};
pub use extract::{ExpiryExtractor, Extraction};
pub use normalize::{normalize, normalize_and_select, normalize_str, select, NormalizedDate};
pub use reminder::{parse_expiry, CalendarReminder, ReminderError, ReminderSettings};
pub use scan::{scan, ScanOutcome, ScanTier};
pub use settings::{OcrSettings, Settings, SettingsError, StorageSettings};
pub use shape::{DateCandidate, DateShape};
pub use today::{Today, YEAR_WINDOW};
