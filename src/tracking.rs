//! Order lookup by date and id, with optional ledger reconciliation.

use crate::backend::StoreBackend;
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::ledger::{LedgerClient, LedgerTransport, ReqwestTransport};
use crate::model::{DateKey, OrderRecord};
use crate::status::{FulfillmentStatus, StatusTimeline};
use crate::store::DailyOrderStore;
use chrono::{DateTime, Utc};
use std::fmt;

/// Where a tracked status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSource {
    /// Computed locally from `paid_at` and the lookup instant.
    Derived,
    /// Reported by the remote ledger.
    Ledger,
}

impl fmt::Display for StatusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusSource::Derived => write!(f, "derived"),
            StatusSource::Ledger => write!(f, "ledger"),
        }
    }
}

/// A stored order together with its status at lookup time.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedOrder {
    pub record: OrderRecord,
    pub status: FulfillmentStatus,
    pub source: StatusSource,
}

/// Looks orders up in the local store.
///
/// Lookups never fall back to the ledger: an order this device has not stored is not found.
/// [`TrackingService::track_and_reconcile`] only consults the ledger to refine the status of an
/// order that was found locally.
#[derive(Clone)]
pub struct TrackingService<B: StoreBackend, T: LedgerTransport = ReqwestTransport, C: Clock = SystemClock> {
    store: DailyOrderStore<B>,
    ledger: Option<LedgerClient<T>>,
    clock: C,
    timeline: StatusTimeline,
}

impl<B: StoreBackend> TrackingService<B, ReqwestTransport, SystemClock> {
    /// Local-only tracking on the system clock.
    pub fn new(store: DailyOrderStore<B>) -> Self {
        TrackingService {
            store,
            ledger: None,
            clock: SystemClock,
            timeline: StatusTimeline::default(),
        }
    }
}

impl<B: StoreBackend, T: LedgerTransport, C: Clock> TrackingService<B, T, C> {
    /// Attach a ledger client for [`Self::track_and_reconcile`].
    pub fn with_ledger<U: LedgerTransport>(self, ledger: LedgerClient<U>) -> TrackingService<B, U, C> {
        TrackingService {
            store: self.store,
            ledger: Some(ledger),
            clock: self.clock,
            timeline: self.timeline,
        }
    }

    pub fn with_clock<K: Clock>(self, clock: K) -> TrackingService<B, T, K> {
        TrackingService {
            store: self.store,
            ledger: self.ledger,
            clock,
            timeline: self.timeline,
        }
    }

    pub fn with_timeline(mut self, timeline: StatusTimeline) -> Self {
        self.timeline = timeline;
        self
    }

    pub fn store(&self) -> &DailyOrderStore<B> {
        &self.store
    }

    /// Look up an order and derive its status now.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput`: `requested_id` is not positive. The store is not read.
    /// - `Error::NotFound`: no such order in the `date` partition.
    pub async fn track(&self, date: &DateKey, requested_id: i64) -> Result<TrackedOrder> {
        self.track_at(date, requested_id, self.clock.now()).await
    }

    /// [`Self::track`] with an explicit lookup instant.
    pub async fn track_at(
        &self,
        date: &DateKey,
        requested_id: i64,
        now: DateTime<Utc>,
    ) -> Result<TrackedOrder> {
        let order_id = positive_id(requested_id)?;
        let record = self.store.find(date, order_id).await.ok_or_else(|| {
            debug!("Order {} not found in {}", order_id, date);
            Error::NotFound {
                date_key: date.to_string(),
                order_id: requested_id,
            }
        })?;
        let status = self.timeline.derive(&record, now);
        Ok(TrackedOrder {
            record,
            status,
            source: StatusSource::Derived,
        })
    }

    /// [`Self::track`], then let a recognised ledger status replace the derived one.
    ///
    /// The ledger status only counts when the ledger row carries this order's id and, if it
    /// names a date, this order's date. Mismatched rows, ledger failures and unrecognised
    /// ledger statuses are logged and the derived status is kept. Without an attached ledger this is the same as [`Self::track`].
    ///
    /// # Errors
    /// Same as [`Self::track`]
    pub async fn track_and_reconcile(
        &self,
        date: &DateKey,
        requested_id: i64,
    ) -> Result<TrackedOrder> {
        let mut tracked = self.track(date, requested_id).await?;
        let Some(ledger) = &self.ledger else {
            return Ok(tracked);
        };

        let order_id = tracked.record.order_id();
        match ledger.fetch_status(Some(date), order_id).await {
            Ok(remote)
                if remote.order_id != order_id
                    || remote.order_date.as_ref().is_some_and(|d| d != date) =>
            {
                warn!(
                    "Ledger answered for order {} ({:?}) when asked for {} ({}), keeping derived status",
                    remote.order_id, remote.order_date, order_id, date
                );
            }
            Ok(remote) => match remote.ledger_status {
                Some(status) => {
                    debug!(
                        "Order {} reconciled: derived {} ledger {}",
                        order_id, tracked.status, status
                    );
                    tracked.status = status;
                    tracked.source = StatusSource::Ledger;
                }
                None => debug!("Ledger has no usable status for order {}", order_id),
            },
            Err(e) => warn!(
                "Could not reconcile order {} with ledger, keeping derived status: {}",
                order_id, e
            ),
        }
        Ok(tracked)
    }
}

fn positive_id(requested_id: i64) -> Result<u64> {
    u64::try_from(requested_id)
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| Error::InvalidInput(format!("order id must be positive, got {}", requested_id)))
}
