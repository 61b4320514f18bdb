//! In-memory backend whose reads and writes can be made to fail on demand.

use super::{InMemoryBackend, StoreBackend};
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct FaultyBackend {
    inner: InMemoryBackend,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    // Writes left before every write fails; usize::MAX means unlimited.
    writes_left: Arc<AtomicUsize>,
}

impl FaultyBackend {
    pub(crate) fn new() -> Self {
        FaultyBackend {
            inner: InMemoryBackend::new(),
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
            writes_left: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
        self.writes_left.store(usize::MAX, Ordering::SeqCst);
    }

    /// Let `writes` more writes through, then fail every write.
    pub(crate) fn fail_writes_after(&self, writes: usize) {
        self.fail_writes.store(false, Ordering::SeqCst);
        self.writes_left.store(writes, Ordering::SeqCst);
    }

    fn check_write(&self, key: &str) -> Result<()> {
        let budget_spent = self
            .writes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                usize::MAX => Some(usize::MAX),
                0 => None,
                n => Some(n - 1),
            })
            .is_err();
        if budget_spent || self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::BackendError(format!("write of {} failed", key)));
        }
        Ok(())
    }
}

impl StoreBackend for FaultyBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::BackendError(format!("read of {} failed", key)));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.check_write(key)?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.check_write(key)?;
        self.inner.delete(key).await
    }
}
