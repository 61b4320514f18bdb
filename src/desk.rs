//! Order lifecycle: checkout, payment confirmation and ledger delivery.
//!
//! ```text
//! create_order ──> pending_payment ──confirm_payment──> ledger submit
//!                                                        │
//!                      ┌─────────────── confirmed ───────┤ paid_at set, error cleared
//!                      ├─────────────── uncertain ───────┤ paid_at set, error set
//!                      └─────────────── hard failure ────┘ paid_at untouched, error set
//! ```
//!
//! Every branch clears `saving` and persists the record again; a failure of that final write
//! is reported on the confirmation instead of discarding the ledger outcome. The caller retries a failed or
//! uncertain confirmation by calling [`OrderDesk::confirm_payment`] again, which re-runs the whole
//! submission chain; `paid_at` keeps its first value.

use crate::backend::StoreBackend;
use crate::checkout::{Cart, CustomerDetails};
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::ledger::{
    AttemptFailure, LedgerClient, LedgerTransport, OrderPayload, ReqwestTransport, SubmitOutcome,
    SubmitStrategy,
};
use crate::model::{DateKey, OrderRecord};
use crate::relay::{NotificationRelay, StatusNotification};
use crate::status::{FulfillmentStatus, StatusTimeline};
use crate::store::DailyOrderStore;
use std::time::Duration;

/// How a payment confirmation reached the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// A confirmable strategy succeeded.
    Confirmed(SubmitStrategy),
    /// Only the opaque fallback was sent.
    Uncertain(Vec<AttemptFailure>),
    /// Nothing was delivered; payment is not recorded.
    Failed(Error),
    /// The order was already paid and delivered; nothing was sent.
    AlreadyRecorded,
}

impl Delivery {
    /// Whether the record now carries a payment time.
    pub fn payment_recorded(&self) -> bool {
        !matches!(self, Delivery::Failed(_))
    }
}

/// Result of [`OrderDesk::confirm_payment`].
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentConfirmation {
    /// The record after the attempt, with `saving` cleared.
    pub record: OrderRecord,
    pub delivery: Delivery,
    /// Set when the final write of `record` failed. The store may still hold the in-flight
    /// copy; pass the confirmation to [`OrderDesk::persist`] once storage is back.
    pub persist_error: Option<Error>,
}

impl PaymentConfirmation {
    /// Whether `record` reached the store.
    pub fn is_persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

/// Front counter for orders: creates them, confirms payment and reports status.
///
/// # Example
///
/// ```no_run
/// use snack_ledger::amount::Amount;
/// use snack_ledger::backend::InMemoryBackend;
/// use snack_ledger::checkout::{Cart, CustomerDetails};
/// use snack_ledger::desk::OrderDesk;
/// use snack_ledger::ledger::{LedgerClient, LedgerSettings, ReqwestTransport};
/// use snack_ledger::store::DailyOrderStore;
///
/// # async fn run() -> snack_ledger::Result<()> {
/// let ledger = LedgerClient::new(
///     ReqwestTransport::new()?,
///     LedgerSettings::new("https://script.google.com/macros/s/deployment/exec"),
/// );
/// let desk = OrderDesk::new(DailyOrderStore::new(InMemoryBackend::new()), ledger);
///
/// let mut cart = Cart::new();
/// cart.add("Tea", Amount::from_rupees(10));
/// let order = desk
///     .create_order(&CustomerDetails::new("Asha", "", "9876543210"), &cart)
///     .await?;
/// let confirmation = desk
///     .confirm_payment(order.order_date_key(), order.order_id())
///     .await?;
/// println!("{:?}", confirmation.delivery);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OrderDesk<B: StoreBackend, T: LedgerTransport = ReqwestTransport, C: Clock = SystemClock> {
    store: DailyOrderStore<B>,
    ledger: LedgerClient<T>,
    relay: Option<NotificationRelay<T>>,
    clock: C,
    timeline: StatusTimeline,
}

impl<B: StoreBackend, T: LedgerTransport> OrderDesk<B, T, SystemClock> {
    pub fn new(store: DailyOrderStore<B>, ledger: LedgerClient<T>) -> Self {
        OrderDesk {
            store,
            ledger,
            relay: None,
            clock: SystemClock,
            timeline: StatusTimeline::default(),
        }
    }
}

impl<B: StoreBackend, T: LedgerTransport, C: Clock> OrderDesk<B, T, C> {
    pub fn with_clock<K: Clock>(self, clock: K) -> OrderDesk<B, T, K> {
        OrderDesk {
            store: self.store,
            ledger: self.ledger,
            relay: self.relay,
            clock,
            timeline: self.timeline,
        }
    }

    pub fn with_timeline(mut self, timeline: StatusTimeline) -> Self {
        self.timeline = timeline;
        self
    }

    /// Notify this relay whenever a payment is recorded.
    pub fn with_relay(mut self, relay: NotificationRelay<T>) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn store(&self) -> &DailyOrderStore<B> {
        &self.store
    }

    pub fn ledger(&self) -> &LedgerClient<T> {
        &self.ledger
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Validate the checkout and persist a new unpaid order under today's date key.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput`: the customer details are invalid or the cart is empty.
    /// - Storage errors from id allocation or persistence.
    pub async fn create_order(
        &self,
        details: &CustomerDetails,
        cart: &Cart,
    ) -> Result<OrderRecord> {
        let customer = details.validate()?;
        if cart.is_empty() {
            return Err(Error::InvalidInput("The cart is empty.".to_string()));
        }

        let now = self.clock.now();
        let date = DateKey::from_local(now);
        let order_id = self.store.next_order_id(&date).await?;
        let record = OrderRecord::new(
            order_id,
            date,
            now,
            customer,
            cart.summary(),
            cart.total(),
        );
        self.store.upsert(&date, &record).await?;
        info!(
            "Created order {} for {} ({}, Rs. {})",
            order_id,
            date,
            record.items(),
            record.total()
        );
        Ok(record)
    }

    /// Record the customer's payment declaration and deliver the order to the ledger.
    ///
    /// An order that is already paid and carries no error is returned as
    /// [`Delivery::AlreadyRecorded`] without contacting the ledger.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound`: no such order in the `date` partition.
    /// - Storage errors while reading the record or marking it as in flight.
    ///
    /// A failure of the final write does not discard the ledger outcome; it is reported
    /// through [`PaymentConfirmation::persist_error`].
    ///
    /// Ledger failures are not errors here; they are reported through [`Delivery`] and the
    /// record's `error` field.
    pub async fn confirm_payment(
        &self,
        date: &DateKey,
        order_id: u64,
    ) -> Result<PaymentConfirmation> {
        let mut record = self
            .store
            .find(date, order_id)
            .await
            .ok_or_else(|| Error::NotFound {
                date_key: date.to_string(),
                order_id: i64::try_from(order_id).unwrap_or(i64::MAX),
            })?;

        if record.is_paid() && record.error().is_none() {
            debug!("Order {} already confirmed, not resubmitting", order_id);
            return Ok(PaymentConfirmation {
                record,
                delivery: Delivery::AlreadyRecorded,
                persist_error: None,
            });
        }

        record.set_saving(true);
        self.store.upsert(date, &record).await?;

        let now = self.clock.now();
        let payload = OrderPayload::from_record(
            &record,
            self.ledger.post_action(),
            now,
            FulfillmentStatus::PaymentVerified,
        );
        let delivery = match self.ledger.submit(&payload).await {
            Ok(SubmitOutcome::Confirmed { strategy, .. }) => {
                record.record_payment(now);
                record.clear_error();
                Delivery::Confirmed(strategy)
            }
            Ok(SubmitOutcome::Uncertain { failures }) => {
                record.record_payment(now);
                let summary = failures
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                record.set_error(format!(
                    "Payment noted, but the order ledger did not confirm receipt ({}). Please retry.",
                    summary
                ));
                Delivery::Uncertain(failures)
            }
            Err(e) => {
                warn!("Order {} could not be submitted: {}", order_id, e);
                record.set_error(e.to_string());
                Delivery::Failed(e)
            }
        };

        record.set_saving(false);
        let persist_error = match self.store.upsert(date, &record).await {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    "Order {} delivery finished but the record was not saved: {}",
                    order_id, e
                );
                Some(e)
            }
        };

        if delivery.payment_recorded() {
            info!("Payment recorded for order {} on {}", order_id, date);
            self.notify(&record, now).await;
        }

        Ok(PaymentConfirmation {
            record,
            delivery,
            persist_error,
        })
    }

    /// Write a confirmation's record again after its final write failed.
    ///
    /// Saving the outcome this way keeps a later [`Self::confirm_payment`] from resubmitting
    /// an order the ledger already accepted.
    ///
    /// # Errors
    ///
    /// Storage errors while writing the record.
    pub async fn persist(&self, confirmation: &mut PaymentConfirmation) -> Result<()> {
        let record = &confirmation.record;
        self.store.upsert(record.order_date_key(), record).await?;
        confirmation.persist_error = None;
        Ok(())
    }

    /// Status of `record` at the desk clock's current instant.
    pub fn status_of(&self, record: &OrderRecord) -> FulfillmentStatus {
        self.timeline.derive(record, self.clock.now())
    }

    /// Time until the status of `record` next changes, for scheduling the next refresh.
    pub fn next_tick(&self, record: &OrderRecord) -> Option<Duration> {
        self.timeline.next_transition(record, self.clock.now())
    }

    /// Orders stored for `date`.
    pub async fn orders(&self, date: &DateKey) -> Vec<OrderRecord> {
        self.store.list(date).await
    }

    async fn notify(&self, record: &OrderRecord, now: chrono::DateTime<chrono::Utc>) {
        let Some(relay) = &self.relay else {
            return;
        };
        let notification = StatusNotification::for_record(record, self.timeline.derive(record, now));
        if let Err(e) = relay.notify(&notification).await {
            warn!(
                "Status notification for order {} failed: {}",
                record.order_id(),
                e
            );
        }
    }
}
