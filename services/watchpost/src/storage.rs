//! Persistent storage for the session token

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

/// Owner read/write only
#[cfg(unix)]
const TOKEN_FILE_MODE: u32 = 0o600;

/// On-disk shape of the persisted token
#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    access_token: String,
}

/// Client storage that survives restarts
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait TokenStore: Send + Sync {
    /// Load the persisted token, if any
    async fn load(&self) -> crate::Result<Option<String>>;

    /// Persist the token, replacing any previous one
    async fn save(&self, token: &str) -> crate::Result<()>;

    /// Remove the persisted token
    async fn clear(&self) -> crate::Result<()>;
}

/// Token store backed by a small JSON file
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> crate::Result<Option<String>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No persisted session at {:?}", self.path);
                return Ok(None);
            }
            Err(e) => {
                return Err(crate::WatchpostError::Storage(format!(
                    "Failed to read {:?}: {}",
                    self.path, e
                )))
            }
        };

        let stored: StoredToken = serde_json::from_str(&content).map_err(|e| {
            crate::WatchpostError::Storage(format!("Corrupt session file {:?}: {}", self.path, e))
        })?;

        if stored.access_token.is_empty() {
            return Ok(None);
        }
        Ok(Some(stored.access_token))
    }

    async fn save(&self, token: &str) -> crate::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                crate::WatchpostError::Storage(format!("Failed to create {:?}: {}", parent, e))
            })?;
        }

        let content = serde_json::to_string(&StoredToken {
            access_token: token.to_string(),
        })?;
        let write_err = |e: std::io::Error| {
            crate::WatchpostError::Storage(format!("Failed to write {:?}: {}", self.path, e))
        };

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(TOKEN_FILE_MODE);
        let mut file = options.open(&self.path).await.map_err(write_err)?;

        // The open mode only applies to newly created files
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(TOKEN_FILE_MODE))
                .await
                .map_err(write_err)?;
        }

        file.write_all(content.as_bytes()).await.map_err(write_err)?;
        file.flush().await.map_err(write_err)?;

        tracing::debug!("Session persisted to {:?}", self.path);
        Ok(())
    }

    async fn clear(&self) -> crate::Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!("Removed persisted session {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(crate::WatchpostError::Storage(format!(
                "Failed to remove {:?}: {}",
                self.path, e
            ))),
        }
    }
}
