//! Conversation history persistence.
//!
//! The full message log is serialized as JSON to a fixed file, loaded once at
//! startup and rewritten after every change. Corrupt or missing data loads as
//! an empty log; persistence failures are the caller's to log, never fatal.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ChatError;
use crate::message::Message;

/// Storage seam for the conversation history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load the persisted log. Corruption yields an empty log, not an error.
    async fn load(&self) -> Result<Vec<Message>, ChatError>;

    /// Persist the full log, replacing any previous contents.
    async fn save(&self, messages: &[Message]) -> Result<(), ChatError>;

    /// Remove the persisted log entirely.
    async fn clear(&self) -> Result<(), ChatError>;
}

/// JSON-file implementation of [`HistoryStore`].
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    /// Create a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistoryStore for JsonHistoryStore {
    async fn load(&self) -> Result<Vec<Message>, ChatError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                tracing::warn!("could not read history file: {err}");
                return Ok(Vec::new());
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(messages) => Ok(messages),
            Err(err) => {
                tracing::warn!("ignoring corrupt history file: {err}");
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, messages: &[Message]) -> Result<(), ChatError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(messages)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), ChatError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
