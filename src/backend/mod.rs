//! Persistence backends for the daily order store.

use crate::error::Result;

pub mod file;
pub mod inmemory;

pub use file::FileBackend;
pub use inmemory::InMemoryBackend;

#[cfg(test)]
pub(crate) mod faulty;

/// Key-value persistence interface injected into [`crate::store::DailyOrderStore`].
///
/// Values are opaque bytes; the store decides the encoding. Implementations: in-memory
/// (tests, ephemeral sessions) and file-per-key (device-scoped persistence).
///
/// All methods use `&self`; backends rely on interior mutability or external storage.
/// There is no isolation between callers: every store operation is a read-modify-write
/// against this interface.
#[allow(async_fn_in_trait)]
pub trait StoreBackend: Send + Sync + Clone {
    /// Retrieve a value by key.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - Value present
    /// - `Ok(None)` - Key never written (or deleted)
    ///
    /// # Errors
    /// Returns `Err` if the backend cannot be read
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a value, replacing any previous one.
    ///
    /// # Errors
    /// Returns `Err` if the backend cannot be written
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Remove a value. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns `Err` if the backend cannot be written
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if key exists.
    ///
    /// # Errors
    /// Returns `Err` if the backend cannot be read
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Health check - verify backend is accessible.
    ///
    /// # Errors
    /// Returns `Err` if backend is not accessible
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
