use std::path::{Path, PathBuf};
use std::sync::Arc;

use expiryguard_core::{
    recommended_expiry, CalendarReminder, ExpiryExtractor, Extraction, NormalizedDate,
    ReminderSettings, Today,
};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::raster::{PageRasterizer, Pdftoppm};
use crate::recognizer::OcrBackend;
use crate::store::ContentStore;
use crate::text::{self, DocumentKind, TextError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Text(#[from] TextError),
    #[error("Text extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Everything learned from processing one document.
#[derive(Debug, Clone, Serialize)]
pub struct ExpiryReport {
    /// SHA-256 hex digest of the original file, used as the store key.
    pub hash_hex: String,
    /// Where the original file was stored.
    pub stored_path: PathBuf,
    pub kind: DocumentKind,
    /// Raw text the scanner ran over.
    #[serde(skip)]
    pub text: String,
    pub extraction: Extraction,
    /// Calendar reminder for the extracted date, when one could be built.
    pub reminder: Option<CalendarReminder>,
    /// Why no reminder link could be built for an extracted date.
    pub link_warning: Option<String>,
    /// Offered for manual entry when no date was found.
    pub recommended_expiry: Option<NormalizedDate>,
}

/// Classifies, stores, reads and scans one document, then builds its reminder link.
pub struct ExpiryPipeline<R: OcrBackend> {
    recognizer: Arc<R>,
    rasterizer: Arc<dyn PageRasterizer>,
    store: ContentStore,
    reminders: ReminderSettings,
    today: Option<Today>,
}

impl<R: OcrBackend + 'static> ExpiryPipeline<R> {
    pub fn new(recognizer: R, uploads_dir: PathBuf, reminders: ReminderSettings) -> Self {
        Self {
            recognizer: Arc::new(recognizer),
            rasterizer: Arc::new(Pdftoppm::default()),
            store: ContentStore::new(uploads_dir),
            reminders,
            today: None,
        }
    }

    /// Replace the page renderer used for PDFs without a text layer.
    pub fn with_rasterizer(mut self, rasterizer: impl PageRasterizer + 'static) -> Self {
        self.rasterizer = Arc::new(rasterizer);
        self
    }

    /// Pin the reference date instead of reading the clock per document.
    pub fn with_today(mut self, today: Today) -> Self {
        self.today = Some(today);
        self
    }

    /// Process a file on disk.
    pub async fn process_file(
        &self,
        path: &Path,
        location: Option<&str>,
    ) -> Result<ExpiryReport, PipelineError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        let bytes = tokio::fs::read(path).await?;
        info!(path = %path.display(), "processing document");
        self.process_bytes(&bytes, &ext, location).await
    }

    /// Process raw bytes (upload or camera capture).
    pub async fn process_bytes(
        &self,
        data: &[u8],
        ext: &str,
        location: Option<&str>,
    ) -> Result<ExpiryReport, PipelineError> {
        let today = self.today.unwrap_or_else(Today::now);

        // 1. Classify before touching the store.
        let kind = DocumentKind::from_extension(ext)
            .ok_or_else(|| TextError::Unsupported(ext.to_string()))?;

        // 2. Persist to the content-addressed store.
        let stored = self.store.put(data, ext).await?;

        // 3. Text layer or OCR, off the async runtime.
        let recognizer = Arc::clone(&self.recognizer);
        let rasterizer = Arc::clone(&self.rasterizer);
        let owned = data.to_vec();
        let text = tokio::task::spawn_blocking(move || {
            text::acquire_text(&owned, kind, &*recognizer, &*rasterizer)
        })
        .await??;

        // 4. Find the expiry date.
        let extraction = ExpiryExtractor::new(today).extract(&text);

        // 5. Reminder link, or a suggestion for manual entry.
        let location = location.unwrap_or("");
        let (reminder, link_warning, recommended) = match &extraction.expiry {
            Some(expiry) => {
                match self.reminders.reminder(&expiry.to_string(), Some(&stored.path), location) {
                    Ok(reminder) => (Some(reminder), None, None),
                    Err(e) => {
                        warn!(%expiry, "could not build reminder link: {e}");
                        (None, Some(e.to_string()), None)
                    }
                }
            }
            None => {
                info!(hash = %stored.hash_hex, "no expiry date found");
                (None, None, Some(recommended_expiry(today)))
            }
        };

        Ok(ExpiryReport {
            hash_hex: stored.hash_hex,
            stored_path: stored.path,
            kind,
            text,
            extraction,
            reminder,
            link_warning,
            recommended_expiry: recommended,
        })
    }
}

/// Watch `intake_dir` and forward every document that lands in it to `tx`.
///
/// A document counts as landed once its writer closes it, or when it is
/// renamed into the folder; a bare create event fires before any bytes are
/// written. Watching stops when the returned watcher is dropped.
pub fn spawn_intake_watcher(
    intake_dir: &Path,
    tx: mpsc::Sender<PathBuf>,
) -> notify::Result<notify::RecommendedWatcher> {
    use notify::{RecursiveMode, Watcher};

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                warn!("intake watcher error: {e}");
                return;
            }
        };
        if !document_landed(&event.kind) {
            return;
        }
        for path in event.paths.into_iter().filter(|p| is_document(p)) {
            if tx.try_send(path.clone()).is_err() {
                warn!(path = %path.display(), "intake queue full; document skipped");
            }
        }
    })?;

    watcher.watch(intake_dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

#[cfg(target_os = "linux")]
fn document_landed(kind: &notify::EventKind) -> bool {
    use notify::event::{AccessKind, AccessMode, EventKind, ModifyKind, RenameMode};
    matches!(
        kind,
        EventKind::Access(AccessKind::Close(AccessMode::Write))
            | EventKind::Modify(ModifyKind::Name(RenameMode::To))
    )
}

// Other backends report no close events, so creation and renames are all there is.
#[cfg(not(target_os = "linux"))]
fn document_landed(kind: &notify::EventKind) -> bool {
    use notify::event::{EventKind, ModifyKind, RenameMode};
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Name(RenameMode::To | RenameMode::Any))
    )
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(DocumentKind::from_extension)
        .is_some()
}
