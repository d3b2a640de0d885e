use expiryguard_core::OcrSettings;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine could not read the image: {0}")]
    ImageDecode(String),
    #[error("OCR engine failed: {0}")]
    Engine(String),
    #[error("Tesseract not available; build with the `tesseract` feature")]
    NotAvailable,
}

/// Turns encoded image bytes (PNG, JPEG, ...) into text.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError>;
}

impl<T: OcrBackend + ?Sized> OcrBackend for Box<T> {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        (**self).recognize(image_bytes)
    }
}

/// Tesseract when compiled in, otherwise a backend that refuses images.
/// Text-layer PDFs and plain text do not need OCR and work either way.
pub fn default_backend(settings: &OcrSettings) -> Box<dyn OcrBackend> {
    #[cfg(feature = "tesseract")]
    {
        Box::new(tesseract::TesseractEngine::from_settings(settings))
    }
    #[cfg(not(feature = "tesseract"))]
    {
        tracing::debug!(lang = %settings.lang, "built without tesseract; image OCR disabled");
        Box::new(UnavailableRecognizer)
    }
}

pub struct UnavailableRecognizer;

impl OcrBackend for UnavailableRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Err(OcrError::NotAvailable)
    }
}

/// Answers every image with the same text. Lets the pipeline run without an engine.
pub struct FixedTextRecognizer(String);

impl FixedTextRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl OcrBackend for FixedTextRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Ok(self.0.clone())
    }
}

#[cfg(feature = "tesseract")]
mod tesseract {
    use expiryguard_core::OcrSettings;
    use leptess::LepTess;

    use super::{OcrBackend, OcrError};

    pub struct TesseractEngine {
        tessdata: Option<String>,
        lang: String,
    }

    impl TesseractEngine {
        pub fn from_settings(settings: &OcrSettings) -> Self {
            Self {
                tessdata: settings.tessdata.clone(),
                lang: settings.lang.clone(),
            }
        }
    }

    impl OcrBackend for TesseractEngine {
        // LepTess is not Sync, so each call gets its own engine.
        fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
            let mut engine = LepTess::new(self.tessdata.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            engine
                .set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            engine.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}
