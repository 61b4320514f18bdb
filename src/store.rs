//! Date-partitioned order store with a per-date id counter.
//!
//! Every operation is a read-modify-write against the injected [`StoreBackend`] with no
//! isolation between callers. Within one client instance calls are awaited one after another,
//! which is what makes them appear atomic; two instances sharing a backend can lose a counter
//! update and hand out the same id twice. That race is accepted, not guarded against.

use crate::backend::StoreBackend;
use crate::error::Result;
use crate::key::StoreKeyBuilder;
use crate::model::{DateKey, OrderRecord};
use crate::serialization::{decode_counter, decode_partition, encode_counter, encode_partition};

/// Persistent, date-partitioned collection of order records.
///
/// # Example
///
/// ```no_run
/// use snack_ledger::backend::InMemoryBackend;
/// use snack_ledger::model::DateKey;
/// use snack_ledger::store::DailyOrderStore;
///
/// # async fn run() -> snack_ledger::Result<()> {
/// let store = DailyOrderStore::new(InMemoryBackend::new());
/// let today = DateKey::parse("2024-01-01")?;
///
/// assert_eq!(store.next_order_id(&today).await?, 1);
/// assert_eq!(store.next_order_id(&today).await?, 2);
/// assert!(store.list(&today).await.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DailyOrderStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DailyOrderStore<B> {
    pub fn new(backend: B) -> Self {
        DailyOrderStore { backend }
    }

    /// Underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Allocate the next order id for `date`.
    ///
    /// Reads the stored counter (0 when absent), increments it, persists it and returns the
    /// new value, so ids start at 1 and are never reissued for the same date.
    ///
    /// # Errors
    ///
    /// - `Error::DeserializationError`: the stored counter is unreadable. The counter is not
    ///   reset, since that would recycle ids.
    /// - `Error::BackendError`: the backend cannot be read or written.
    pub async fn next_order_id(&self, date: &DateKey) -> Result<u64> {
        let key = StoreKeyBuilder::counter(date);
        let current = match self.backend.get(&key).await? {
            Some(bytes) => decode_counter(&bytes)?,
            None => 0,
        };
        let next = current + 1;
        self.backend.set(&key, encode_counter(next)).await?;
        debug!("Allocated order id {} for {}", next, date);
        Ok(next)
    }

    /// Insert or replace `record` in the partition for `date`.
    ///
    /// A record with the same order id is replaced where it stands; otherwise the record is
    /// appended. Other records keep their positions.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the partition cannot be read, the record cannot be encoded or the
    /// backend cannot be written. A read failure leaves the stored partition untouched. A
    /// partition that reads but does not decode is replaced.
    pub async fn upsert(&self, date: &DateKey, record: &OrderRecord) -> Result<()> {
        if record.order_date_key() != date {
            warn!(
                "Order {} dated {} stored under partition {}",
                record.order_id(),
                record.order_date_key(),
                date
            );
        }

        let key = StoreKeyBuilder::partition(date);
        let mut records = match self.backend.get(&key).await? {
            Some(bytes) => decode_partition(&bytes).unwrap_or_else(|e| {
                warn!("Replacing corrupt partition {}: {}", key, e);
                Vec::new()
            }),
            None => Vec::new(),
        };
        match records
            .iter_mut()
            .find(|existing| existing.order_id() == record.order_id())
        {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }

        self.backend.set(&key, encode_partition(&records)?).await?;
        debug!(
            "Upserted order {} into {} ({} records)",
            record.order_id(),
            key,
            records.len()
        );
        Ok(())
    }

    /// All records in the partition for `date`.
    ///
    /// Missing, unreadable or corrupt partitions yield an empty list; the failure is logged
    /// and never returned.
    pub async fn list(&self, date: &DateKey) -> Vec<OrderRecord> {
        let key = StoreKeyBuilder::partition(date);
        let bytes = match self.backend.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Could not read {}: {}", key, e);
                return Vec::new();
            }
        };

        match decode_partition(&bytes) {
            Ok(records) => records,
            Err(e) => {
                warn!("Ignoring corrupt partition {}: {}", key, e);
                Vec::new()
            }
        }
    }

    /// Look up one record by id within a partition.
    pub async fn find(&self, date: &DateKey, order_id: u64) -> Option<OrderRecord> {
        self.list(date)
            .await
            .into_iter()
            .find(|record| record.order_id() == order_id)
    }
}
