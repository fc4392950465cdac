//! Last-view persistence: the four raw inputs, as JSON.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use crate::domain::ViewInputs;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("cannot write view state {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode view state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable store of the last successfully charted inputs.
pub trait ViewStore: Send {
    /// `None` when nothing usable was saved.
    fn load(&self) -> Option<ViewInputs>;

    fn save(&self, inputs: &ViewInputs) -> Result<(), PersistenceError>;
}

/// Pretty JSON file at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self) -> impl FnOnce(std::io::Error) -> PersistenceError + '_ {
        move |source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ViewStore for JsonFileStore {
    /// Missing or corrupt file reads as `None`.
    fn load(&self) -> Option<ViewInputs> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(inputs) => Some(inputs),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt view state");
                None
            }
        }
    }

    /// Creates parent directories if needed.
    fn save(&self, inputs: &ViewInputs) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(self.io_error())?;
        }
        let json = serde_json::to_string_pretty(inputs)?;
        std::fs::write(&self.path, json).map_err(self.io_error())?;
        tracing::debug!(path = %self.path.display(), "view state saved");
        Ok(())
    }
}

/// In-process store for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<ViewInputs>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(inputs: ViewInputs) -> Self {
        Self {
            slot: Mutex::new(Some(inputs)),
        }
    }
}

impl ViewStore for MemoryStore {
    fn load(&self) -> Option<ViewInputs> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn save(&self, inputs: &ViewInputs) -> Result<(), PersistenceError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(inputs.clone());
        Ok(())
    }
}
