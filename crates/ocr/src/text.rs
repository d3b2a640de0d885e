use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

use crate::preprocess::{self, PreprocessError};
use crate::raster::{PageRasterizer, RasterError};
use crate::recognizer::{OcrBackend, OcrError};

#[derive(Debug, Error)]
pub enum TextError {
    #[error("Unsupported document type: '{0}'")]
    Unsupported(String),
    #[error("PDF text extraction failed: {0}")]
    Pdf(String),
    #[error("PDF has no text layer and no page renderer is available to OCR it")]
    NoTextLayer,
    #[error("Could not render PDF pages: {0}")]
    Raster(#[from] RasterError),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("Text document is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Image,
    /// Already-extracted plain text.
    Text,
}

impl DocumentKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "gif" | "webp" => {
                Some(DocumentKind::Image)
            }
            "txt" => Some(DocumentKind::Text),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Pdf => write!(f, "pdf"),
            DocumentKind::Image => write!(f, "image"),
            DocumentKind::Text => write!(f, "text"),
        }
    }
}

/// Turn a document's bytes into text the expiry scanner can read.
///
/// PDFs use their text layer; scanned PDFs without one are rendered page by
/// page and OCR'd.
pub fn acquire_text<R, P>(
    data: &[u8],
    kind: DocumentKind,
    recognizer: &R,
    rasterizer: &P,
) -> Result<String, TextError>
where
    R: OcrBackend + ?Sized,
    P: PageRasterizer + ?Sized,
{
    match kind {
        DocumentKind::Image => ocr_image(data, recognizer),
        DocumentKind::Pdf => {
            let layer = pdf_text_layer(data)?;
            if !layer.trim().is_empty() {
                info!(chars = layer.len(), "read PDF text layer");
                return Ok(layer);
            }
            let pages = match rasterizer.render_pages(data) {
                Err(RasterError::NotAvailable) => return Err(TextError::NoTextLayer),
                rendered => rendered?,
            };
            ocr_pages(&pages, recognizer)
        }
        DocumentKind::Text => Ok(String::from_utf8(data.to_vec())?),
    }
}

/// OCR the image as uploaded and after binarization; the longer read wins.
fn ocr_image<R: OcrBackend + ?Sized>(data: &[u8], recognizer: &R) -> Result<String, TextError> {
    let original = recognizer.recognize(data)?;
    let processed_image = preprocess::prepare_for_ocr_from_bytes(data)?;
    let processed = recognizer.recognize(&processed_image)?;

    let (original_len, processed_len) = (original.chars().count(), processed.chars().count());
    debug!(original_len, processed_len, "image OCR passes complete");
    if processed_len > original_len {
        Ok(processed)
    } else {
        Ok(original)
    }
}

fn pdf_text_layer(data: &[u8]) -> Result<String, TextError> {
    pdf_extract::extract_text_from_mem(data).map_err(|e| TextError::Pdf(e.to_string()))
}

/// OCR rendered pages in order, each under a `--- Page N ---` header.
fn ocr_pages<R: OcrBackend + ?Sized>(pages: &[Vec<u8>], recognizer: &R) -> Result<String, TextError> {
    let mut text = String::new();
    for (i, page) in pages.iter().enumerate() {
        text.push_str(&format!("--- Page {} ---\n", i + 1));
        text.push_str(&ocr_image(page, recognizer)?);
        text.push('\n');
    }
    info!(pages = pages.len(), "OCR'd scanned PDF");
    Ok(text)
}
