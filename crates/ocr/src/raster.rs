use std::io;
use std::path::PathBuf;
use std::process::Command;

use expiryguard_core::OcrSettings;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("No PDF page renderer found (install poppler-utils for pdftoppm)")]
    NotAvailable,
    #[error("IO error while rendering PDF pages: {0}")]
    Io(#[from] io::Error),
    #[error("pdftoppm failed: {0}")]
    Failed(String),
}

/// Renders the pages of a PDF to images, so scanned PDFs can be OCR'd.
pub trait PageRasterizer: Send + Sync {
    /// PNG bytes for every page, first page first.
    fn render_pages(&self, pdf: &[u8]) -> Result<Vec<Vec<u8>>, RasterError>;
}

impl<T: PageRasterizer + ?Sized> PageRasterizer for Box<T> {
    fn render_pages(&self, pdf: &[u8]) -> Result<Vec<Vec<u8>>, RasterError> {
        (**self).render_pages(pdf)
    }
}

/// Poppler's `pdftoppm`, run in a scratch directory.
#[derive(Debug, Clone)]
pub struct Pdftoppm {
    program: PathBuf,
    dpi: u32,
}

impl Pdftoppm {
    pub fn new(program: impl Into<PathBuf>, dpi: u32) -> Self {
        Self { program: program.into(), dpi }
    }

    pub fn from_settings(settings: &OcrSettings) -> Self {
        Self::new(settings.pdftoppm.clone(), settings.pdf_dpi)
    }
}

impl Default for Pdftoppm {
    fn default() -> Self {
        Self::from_settings(&OcrSettings::default())
    }
}

impl PageRasterizer for Pdftoppm {
    fn render_pages(&self, pdf: &[u8]) -> Result<Vec<Vec<u8>>, RasterError> {
        let scratch = tempfile::tempdir()?;
        let input = scratch.path().join("scan.pdf");
        std::fs::write(&input, pdf)?;

        let output = Command::new(&self.program)
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(&input)
            .arg(scratch.path().join("page"))
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => RasterError::NotAvailable,
                _ => RasterError::Io(e),
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RasterError::Failed(stderr.trim().to_string()));
        }

        // pdftoppm zero-pads page numbers to a common width, so names sort in page order.
        let mut pages: Vec<PathBuf> = std::fs::read_dir(scratch.path())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
            .collect();
        pages.sort();
        debug!(pages = pages.len(), dpi = self.dpi, "rendered PDF pages");

        pages
            .iter()
            .map(|p| std::fs::read(p).map_err(RasterError::from))
            .collect()
    }
}
