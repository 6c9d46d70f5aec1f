//! Document storage addressed by relative path.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid document path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("parent directory of '{path}' does not exist")]
    MissingParent { path: String },

    #[error("document '{path}' does not exist")]
    NotFound { path: String },

    #[error("failed to {action} '{}': {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Held while a read-apply-write cycle is in flight for one document.
pub type DocumentLock = OwnedMutexGuard<()>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read(&self, id: &str) -> Result<String, StoreError>;

    async fn write(&self, id: &str, content: &str) -> Result<(), StoreError>;

    /// Exclusive access to `id` until the guard is dropped.
    async fn lock(&self, id: &str) -> Result<DocumentLock, StoreError>;
}

/// Plain files below a root directory.
pub struct LocalDocumentStore {
    root: PathBuf,
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_document_path(id)?;
        Ok(self.root.join(id))
    }

    async fn canonical_root(&self) -> Result<PathBuf, StoreError> {
        fs::canonicalize(&self.root)
            .await
            .map_err(|source| StoreError::Io {
                action: "resolve",
                path: self.root.clone(),
                source,
            })
    }

    /// Reject targets whose real location, after following symlinks, lies
    /// outside the root.
    async fn ensure_contained(&self, id: &str, existing: &Path) -> Result<(), StoreError> {
        let root = self.canonical_root().await?;
        let real = fs::canonicalize(existing)
            .await
            .map_err(|source| StoreError::Io {
                action: "resolve",
                path: existing.to_path_buf(),
                source,
            })?;
        if real.starts_with(&root) {
            Ok(())
        } else {
            Err(StoreError::InvalidPath {
                path: id.to_string(),
                reason: "path escapes database root".to_string(),
            })
        }
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn read(&self, id: &str) -> Result<String, StoreError> {
        let path = self.resolve(id)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(StoreError::InvalidPath {
                    path: id.to_string(),
                    reason: "not a regular file".to_string(),
                });
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    path: id.to_string(),
                });
            }
            Err(source) => {
                return Err(StoreError::Io {
                    action: "inspect",
                    path,
                    source,
                });
            }
        }
        self.ensure_contained(id, &path).await?;

        let content = fs::read_to_string(&path)
            .await
            .map_err(|source| StoreError::Io {
                action: "read",
                path: path.clone(),
                source,
            })?;
        trace!(path = %path.display(), bytes = content.len(), "Read document");
        Ok(content)
    }

    async fn write(&self, id: &str, content: &str) -> Result<(), StoreError> {
        let path = self.resolve(id)?;
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        if !fs::try_exists(&parent).await.unwrap_or(false) {
            return Err(StoreError::MissingParent {
                path: id.to_string(),
            });
        }
        self.ensure_contained(id, &parent).await?;

        write_atomic(&path, content.as_bytes()).await?;
        debug!(path = %path.display(), bytes = content.len(), "Wrote document");
        Ok(())
    }

    async fn lock(&self, id: &str) -> Result<DocumentLock, StoreError> {
        let path = self.resolve(id)?;
        let slot = {
            let mut locks = self.locks.lock();
            // Entries only the table references have no holder or waiter.
            locks.retain(|_, slot| Arc::strong_count(slot) > 1);
            locks.entry(path).or_default().clone()
        };
        Ok(slot.lock_owned().await)
    }
}

/// Check a client-supplied document path before it touches the filesystem.
pub fn validate_document_path(raw_path: &str) -> Result<(), StoreError> {
    let invalid = |reason: &str| StoreError::InvalidPath {
        path: raw_path.to_string(),
        reason: reason.to_string(),
    };

    if raw_path.is_empty() {
        return Err(invalid("path is empty"));
    }
    if raw_path.chars().any(char::is_control) {
        return Err(invalid("path contains control characters"));
    }

    let candidate = Path::new(raw_path);
    if candidate.is_absolute() {
        return Err(invalid("path must be relative"));
    }
    if candidate.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    }) {
        return Err(invalid("path escapes database root"));
    }
    if raw_path.contains("//") {
        return Err(invalid("path contains consecutive separators"));
    }

    Ok(())
}

async fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let temp_path = temporary_path(path);
    let mut file = fs::File::create(&temp_path)
        .await
        .map_err(|source| StoreError::Io {
            action: "create",
            path: temp_path.clone(),
            source,
        })?;
    file.write_all(content)
        .await
        .map_err(|source| StoreError::Io {
            action: "write",
            path: temp_path.clone(),
            source,
        })?;
    file.flush().await.map_err(|source| StoreError::Io {
        action: "flush",
        path: temp_path.clone(),
        source,
    })?;
    drop(file);

    if let Err(source) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(StoreError::Io {
            action: "rename",
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

fn temporary_path(target: &Path) -> PathBuf {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let file_name = target
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("statbridge-document");
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    parent.join(format!(".{file_name}.{}.{nanos}.tmp", std::process::id()))
}
