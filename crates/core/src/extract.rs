use serde::Serialize;

use crate::document::document_title;
use crate::normalize::{normalize_and_select, NormalizedDate};
use crate::scan::{scan, ScanTier};
use crate::today::Today;

/// What the engine made of one document's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub title: String,
    /// Scanner pass that produced the candidates, if any did.
    pub tier: Option<ScanTier>,
    /// Raw candidates as read, before normalization.
    pub candidates: Vec<String>,
    /// The chosen expiry date. `None` means the caller should ask for one.
    pub expiry: Option<NormalizedDate>,
}

/// Expiry-date extraction pinned to one reference date.
#[derive(Debug, Clone, Copy)]
pub struct ExpiryExtractor {
    today: Today,
}

impl ExpiryExtractor {
    pub fn new(today: Today) -> Self {
        Self { today }
    }

    pub fn today(&self) -> Today {
        self.today
    }

    /// Scan, normalize and select in one go.
    pub fn extract(&self, text: &str) -> Extraction {
        let outcome = scan(text, self.today);
        let expiry = normalize_and_select(&outcome.candidates, self.today);

        Extraction {
            title: document_title(text),
            tier: outcome.tier,
            candidates: outcome.candidates.iter().map(ToString::to_string).collect(),
            expiry,
        }
    }
}
