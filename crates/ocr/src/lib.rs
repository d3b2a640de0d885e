pub mod pipeline;
pub mod preprocess;
pub mod raster;
pub mod recognizer;
pub mod store;
pub mod text;

pub use pipeline::{spawn_intake_watcher, ExpiryPipeline, ExpiryReport, PipelineError};
pub use preprocess::{prepare_for_ocr_from_bytes, PreprocessError};
pub use raster::{PageRasterizer, Pdftoppm, RasterError};
pub use recognizer::{default_backend, FixedTextRecognizer, OcrBackend, OcrError, UnavailableRecognizer};
pub use store::{sha256_hex, ContentStore, StoredDocument};
pub use text::{acquire_text, DocumentKind, TextError};
