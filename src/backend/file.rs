//! File-per-key persistence backend.
//!
//! Each key becomes one file inside a data directory, which is the device-scoped equivalent
//! of a browser's local storage. Writes go to a sibling temp file and are renamed into place
//! so a crash never leaves a half-written partition behind.

use super::StoreBackend;
use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Key-value backend storing one file per key.
///
/// Keys are mapped to file names by replacing every character outside `[A-Za-z0-9._-]`
/// with `_`, so `orders:2024-01-01` lives in `orders_2024-01-01`.
#[derive(Clone, Debug)]
pub struct FileBackend {
    root: Arc<PathBuf>,
}

impl FileBackend {
    /// Open (and create if needed) a backend rooted at `root`.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the directory cannot be created
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        debug!("File store opened at {}", root.display());
        Ok(FileBackend {
            root: Arc::new(root),
        })
    }

    /// Directory holding the store files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(file_name)
    }
}

impl StoreBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => {
                debug!("File GET {} -> HIT ({} bytes)", key, bytes.len());
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("File GET {} -> MISS", key);
                Ok(None)
            }
            Err(e) => Err(Error::BackendError(format!("reading {}: {}", key, e))),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!("File SET {} ({} bytes)", key, value.len());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => {
                debug!("File DELETE {}", key);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::BackendError(format!("deleting {}: {}", key, e))),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(tokio::fs::metadata(self.root.as_path())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false))
    }
}
