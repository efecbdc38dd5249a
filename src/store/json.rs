//! JSON-backed store for the subscriptions artifact.

use std::path::{Path, PathBuf};

use super::{
    backup_path_for, is_empty_document, read_primary, write_with_backup, Document, SaveOutcome,
    StoreError, StoreResult,
};

/// Store for the subscriptions document (`subscriptions.json`).
///
/// Persists whatever whole document it is given; no per-field validation.
#[derive(Debug, Clone)]
pub struct JsonSubscriptionStore {
    path: PathBuf,
    backup_path: PathBuf,
}

impl JsonSubscriptionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let backup_path = backup_path_for(&path);
        Self { path, backup_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Load and parse the subscriptions document.
    pub async fn load(&self) -> StoreResult<Document> {
        let content = read_primary(&self.path).await?;

        let doc = serde_json::from_str::<Document>(&content).map_err(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Malformed subscriptions file");
            StoreError::malformed_json(&self.path, e.to_string())
        })?;

        tracing::debug!(path = %self.path.display(), "Loaded subscriptions");
        Ok(doc)
    }

    /// Back up the current file and write `doc` in its place.
    pub async fn save(&self, doc: &Document) -> StoreResult<SaveOutcome> {
        if is_empty_document(doc) {
            return Err(StoreError::empty_document(&self.path));
        }

        let mut content = serde_json::to_string_pretty(doc)
            .map_err(|e| StoreError::serialization(&self.path, e.to_string()))?;
        content.push('\n');

        write_with_backup(&self.path, &self.backup_path, content.as_bytes())
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Failed to save subscriptions"))?;

        tracing::info!(path = %self.path.display(), "Saved subscriptions");
        Ok(SaveOutcome {
            message: "Subscriptions saved".to_string(),
        })
    }
}
