//! In-memory persistence backend (default, thread-safe, async).
//!
//! Uses DashMap for concurrent access with per-key sharding. Clones share the same map,
//! which lets a test hand one handle to the store and inspect raw values through another.

use super::StoreBackend;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;

/// Thread-safe in-memory key-value backend.
///
/// # Example
///
/// ```no_run
/// use snack_ledger::backend::{InMemoryBackend, StoreBackend};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///
///     backend.set("order_counter:2024-01-01", b"3".to_vec()).await?;
///
///     let value = backend.get("order_counter:2024-01-01").await?;
///     assert_eq!(value, Some(b"3".to_vec()));
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Create a new, empty backend.
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if backend is empty.
    pub async fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.store.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Memory statistics.
    pub async fn stats(&self) -> StoreStats {
        let total_bytes: usize = self.store.iter().map(|entry| entry.value().len()).sum();

        StoreStats {
            total_entries: self.store.len(),
            total_bytes,
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.store.get(key).map(|entry| entry.value().clone());
        debug!(
            "InMemory GET {} -> {}",
            key,
            if value.is_some() { "HIT" } else { "MISS" }
        );
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        debug!("InMemory SET {} ({} bytes)", key, value.len());
        self.store.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        debug!("InMemory DELETE {}", key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.store.contains_key(key))
    }
}

/// Store statistics.
#[derive(Clone, Debug)]
pub struct StoreStats {
    pub total_entries: usize,
    pub total_bytes: usize,
}
