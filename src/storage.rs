//! Local persistence for the cached location.
//!
//! Only one value survives a restart:
//!
//! ```text
//! <root>/
//!   location.json    # The last LocationSample
//! ```
//!
//! Persistence is best-effort. Callers log failures and carry on.

use std::{fs, io, path::PathBuf};

use crate::model::LocationSample;

const LOCATION_FILE: &str = "location.json";

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Local file-based storage.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a new storage instance rooted at the given directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the default storage root: `~/.krishi/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".krishi"))
    }

    /// Loads the cached location, or `None` if none was ever saved.
    pub fn load_location(&self) -> Result<Option<LocationSample>> {
        let json = match fs::read_to_string(self.location_path()) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Overwrites the cached location.
    pub fn save_location(&self, sample: &LocationSample) -> Result<()> {
        let json = serde_json::to_string_pretty(sample)?;
        fs::write(self.location_path(), json)?;
        Ok(())
    }

    fn location_path(&self) -> PathBuf {
        self.root.join(LOCATION_FILE)
    }
}

/// Load the cached location, logging and discarding any failure.
pub fn restore_location(storage: Option<&Storage>) -> Option<LocationSample> {
    match storage?.load_location() {
        Ok(sample) => sample,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable cached location");
            None
        }
    }
}

/// Save the cached location, logging any failure.
pub fn persist_location(storage: Option<&Storage>, sample: &LocationSample) {
    let Some(storage) = storage else {
        return;
    };
    if let Err(e) = storage.save_location(sample) {
        tracing::warn!(error = %e, "failed to persist location");
    }
}
