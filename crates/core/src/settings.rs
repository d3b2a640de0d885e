use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reminder::ReminderSettings;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Everything a run can be configured with. All sections are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub ocr: OcrSettings,
    pub reminder: ReminderSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Where uploaded documents are kept. Defaults to the platform data dir.
    pub uploads_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Tesseract `tessdata` directory; `None` uses the system default.
    pub tessdata: Option<String>,
    pub lang: String,
    /// Resolution scanned PDF pages are rendered at before OCR.
    pub pdf_dpi: u32,
    /// Page renderer for PDFs without a text layer (poppler's `pdftoppm`).
    pub pdftoppm: PathBuf,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            tessdata: None,
            lang: "eng".to_string(),
            pdf_dpi: 300,
            pdftoppm: PathBuf::from("pdftoppm"),
        }
    }
}

impl std::str::FromStr for Settings {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        raw.parse()
    }

    /// Like [`Settings::load`], but a missing file means defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
