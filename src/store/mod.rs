//! File-backed persistence for the two configuration artifacts.
//!
//! - `YamlConfigStore` for the system settings (`config.yaml`)
//! - `JsonSubscriptionStore` for the subscriptions (`subscriptions.json`)
//!
//! Both stores are stateless: every load re-reads the file and every save
//! rewrites it in full. Before the primary file is overwritten its current
//! bytes are copied to `<primary>.backup`, keeping exactly one prior
//! generation. Stores do no locking; callers serialize concurrent saves.

mod error;
mod json;
mod yaml;

pub use error::{StoreError, StoreResult};
pub use json::JsonSubscriptionStore;
pub use yaml::YamlConfigStore;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tokio::fs;

/// A schema-less document tree. Maps keep insertion order.
pub type Document = Value;

/// Suffix appended to the primary file name to form the backup path.
pub const BACKUP_SUFFIX: &str = ".backup";

/// Confirmation returned by a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub message: String,
}

/// Backup path for a primary artifact: the full file name plus `.backup`.
pub fn backup_path_for(primary: &Path) -> PathBuf {
    let mut name: OsString = primary.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Whether a document violates the non-empty save precondition.
pub fn is_empty_document(doc: &Document) -> bool {
    match doc {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Copy the current primary to its backup, then write `content` to the primary.
///
/// The parent directory is created if missing. If the backup copy fails the
/// primary is left untouched.
async fn write_with_backup(primary: &Path, backup: &Path, content: &[u8]) -> StoreResult<()> {
    if let Some(parent) = primary.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    if fs::try_exists(primary)
        .await
        .map_err(|e| StoreError::io(primary, e))?
    {
        fs::copy(primary, backup)
            .await
            .map_err(|e| StoreError::io(backup, e))?;
        tracing::debug!(path = %backup.display(), "Backed up previous version");
    }

    fs::write(primary, content)
        .await
        .map_err(|e| StoreError::io(primary, e))
}

/// Read a primary artifact, mapping a missing file to `NotFound`.
async fn read_primary(path: &Path) -> StoreResult<String> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::not_found(path)),
        Err(e) => Err(StoreError::io(path, e)),
    }
}
