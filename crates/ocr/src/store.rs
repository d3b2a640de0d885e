use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A document saved in the upload store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// SHA-256 of the content, lowercase hex (64 chars).
    pub hash_hex: String,
    pub path: PathBuf,
    /// `false` when identical bytes were already stored.
    pub newly_stored: bool,
}

/// Content-addressed upload store.
/// Layout: `<root>/<first_2_hex_chars>/<full_hex>.<ext>`
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where bytes with this digest and extension live.
    pub fn path_for(&self, hash_hex: &str, ext: &str) -> PathBuf {
        self.root
            .join(&hash_hex[..2])
            .join(format!("{hash_hex}.{ext}"))
    }

    /// Save `data`, skipping the write if the same content is already there.
    pub async fn put(&self, data: &[u8], ext: &str) -> std::io::Result<StoredDocument> {
        let hash_hex = sha256_hex(data);
        let path = self.path_for(&hash_hex, ext);

        let newly_stored = !tokio::fs::try_exists(&path).await?;
        if newly_stored {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, data).await?;
        }
        debug!(hash = %hash_hex, path = %path.display(), newly_stored, "document stored");

        Ok(StoredDocument { hash_hex, path, newly_stored })
    }
}

/// SHA-256 of an in-memory byte slice, as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest: [u8; 32] = Sha256::digest(data).into();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
