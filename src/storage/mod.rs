//! Persistence port for the layout blob.
//!
//! The layout is persisted as one serialized blob under one well-known slot.
//! The slot is an explicitly injected port ([`LayoutStorage`]) rather than an
//! ambient global, so tests substitute [`MemoryStorage`] and real hosts hand
//! the store a [`FileStorage`].
//!
//! Absent or unreadable content is "no saved layout", not an error — the
//! store falls back to its default layout. Only writes can fail, and the
//! store absorbs those too.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

/// Errors from the persistence port. Load problems are represented as
/// `None` instead; only writes surface an error value, and the layout store
/// logs and absorbs it.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to write the layout blob to the backing slot.
    #[error("Failed to persist layout to {path}")]
    Write {
        /// Path (or slot description) that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A single-slot key-value persistence surface for the serialized layout.
pub trait LayoutStorage: Send + Sync {
    /// Read the stored blob. `None` means "no saved layout", covering both
    /// a genuinely absent slot and unreadable content.
    fn load(&self) -> Option<String>;

    /// Replace the stored blob with `blob`.
    fn store(&self, blob: &str) -> Result<(), StorageError>;
}

/// In-memory slot, for tests and hosts without durable state.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded slot, for simulating an existing saved layout.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(blob.into())),
        }
    }
}

impl LayoutStorage for MemoryStorage {
    fn load(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn store(&self, blob: &str) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(blob.to_string());
        Ok(())
    }
}

/// File-backed slot: one JSON file holding the whole layout.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default slot location: `<user data dir>/ops-dashboard/layout.json`,
    /// falling back to the current directory when no data dir is available.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ops-dashboard")
            .join("layout.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LayoutStorage for FileStorage {
    fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::debug!("Could not read layout file {:?}: {}", self.path, e);
                None
            }
        }
    }

    fn store(&self, blob: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, blob).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
