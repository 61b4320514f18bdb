//! Fulfillment status and its derivation from elapsed time.
//!
//! Status is never stored. It is recomputed from a record's `paid_at` and the current instant
//! every time it is needed, so a recurring tick can call [`StatusTimeline::derive`] at any
//! cadence without drift or side effects.
//!
//! ```text
//! paid_at absent                       -> pending_payment
//! 0          <= elapsed < preparing    -> payment_verified
//! preparing  <= elapsed < ready        -> preparing
//! ready      <= elapsed                -> ready_for_pickup
//! ```
//!
//! The thresholds simulate kitchen progress; no kitchen-side signal is consulted.

use crate::error::{Error, Result};
use crate::model::OrderRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default delay between payment and `preparing`.
pub const DEFAULT_PREPARING_AFTER: Duration = Duration::from_millis(20_000);

/// Default delay between payment and `ready_for_pickup`.
pub const DEFAULT_READY_AFTER: Duration = Duration::from_millis(50_000);

/// Fulfillment status of an order.
///
/// The first four variants form the derived progression and are totally ordered.
/// `Delivered` and `Cancelled` only ever come from the remote ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    PendingPayment,
    PaymentVerified,
    Preparing,
    ReadyForPickup,
    Delivered,
    Cancelled,
}

/// The derived progression, in order.
pub const TIMELINE_STEPS: [FulfillmentStatus; 4] = [
    FulfillmentStatus::PendingPayment,
    FulfillmentStatus::PaymentVerified,
    FulfillmentStatus::Preparing,
    FulfillmentStatus::ReadyForPickup,
];

impl FulfillmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::PendingPayment => "pending_payment",
            FulfillmentStatus::PaymentVerified => "payment_verified",
            FulfillmentStatus::Preparing => "preparing",
            FulfillmentStatus::ReadyForPickup => "ready_for_pickup",
            FulfillmentStatus::Delivered => "delivered",
            FulfillmentStatus::Cancelled => "cancelled",
        }
    }

    /// Short label for a progress timeline.
    pub fn label(&self) -> &'static str {
        match self {
            FulfillmentStatus::PendingPayment => "Awaiting payment",
            FulfillmentStatus::PaymentVerified => "Payment verified",
            FulfillmentStatus::Preparing => "Preparing order",
            FulfillmentStatus::ReadyForPickup => "Ready for pickup",
            FulfillmentStatus::Delivered => "Delivered",
            FulfillmentStatus::Cancelled => "Cancelled",
        }
    }

    /// Customer-facing explanation of the status.
    pub fn message(&self) -> &'static str {
        match self {
            FulfillmentStatus::PendingPayment => {
                "Please complete the payment to start your order."
            }
            FulfillmentStatus::PaymentVerified => {
                "Payment is verified. Your order will move to preparation soon."
            }
            FulfillmentStatus::Preparing => "Kitchen is preparing your order now.",
            FulfillmentStatus::ReadyForPickup => {
                "Your order is ready. Please collect it at the counter."
            }
            FulfillmentStatus::Delivered => {
                "Your order has been delivered. Thank you for ordering with us."
            }
            FulfillmentStatus::Cancelled => "This order has been cancelled.",
        }
    }

    /// Normalise a free-form status string reported by the ledger.
    ///
    /// Input is trimmed, lower-cased and whitespace runs collapse to `_` before lookup.
    /// Unknown strings yield `None`.
    pub fn from_ledger(raw: &str) -> Option<Self> {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_lowercase();

        let status = match normalized.as_str() {
            "pending_payment" | "awaiting_payment" | "payment_pending" => Self::PendingPayment,
            "payment_verified" | "paid" => Self::PaymentVerified,
            "preparing" | "in_kitchen" | "cooking" => Self::Preparing,
            "ready" | "ready_for_pickup" => Self::ReadyForPickup,
            "delivered" | "delivered_successfully" | "complete" | "completed" => Self::Delivered,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => return None,
        };
        Some(status)
    }
}

impl fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FulfillmentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_ledger(s).ok_or_else(|| Error::ParseError(format!("unknown status {:?}", s)))
    }
}

/// Position of a timeline step relative to the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Done,
    Active,
    Todo,
}

/// Where `step` sits on the progress timeline when the order is at `current`.
///
/// Statuses past the derived progression (`Delivered`, `Cancelled`) mark every step done.
pub fn step_state(current: FulfillmentStatus, step: FulfillmentStatus) -> StepState {
    match step.cmp(&current) {
        std::cmp::Ordering::Less => StepState::Done,
        std::cmp::Ordering::Equal => StepState::Active,
        std::cmp::Ordering::Greater => StepState::Todo,
    }
}

/// Thresholds for the simulated kitchen progression, measured from `paid_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTimeline {
    preparing_after: Duration,
    ready_after: Duration,
}

impl Default for StatusTimeline {
    fn default() -> Self {
        StatusTimeline {
            preparing_after: DEFAULT_PREPARING_AFTER,
            ready_after: DEFAULT_READY_AFTER,
        }
    }
}

impl StatusTimeline {
    /// Build a timeline.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` if `ready_after` is earlier than `preparing_after`
    pub fn new(preparing_after: Duration, ready_after: Duration) -> Result<Self> {
        if ready_after < preparing_after {
            return Err(Error::InvalidInput(format!(
                "ready threshold {:?} is before preparing threshold {:?}",
                ready_after, preparing_after
            )));
        }
        Ok(StatusTimeline {
            preparing_after,
            ready_after,
        })
    }

    pub fn preparing_after(&self) -> Duration {
        self.preparing_after
    }

    pub fn ready_after(&self) -> Duration {
        self.ready_after
    }

    /// Derive the status of `record` at `now`.
    pub fn derive(&self, record: &OrderRecord, now: DateTime<Utc>) -> FulfillmentStatus {
        match record.paid_at() {
            None => FulfillmentStatus::PendingPayment,
            Some(paid_at) => self.status_after(elapsed_since(paid_at, now)),
        }
    }

    /// Status reached after `elapsed` since payment.
    pub fn status_after(&self, elapsed: Duration) -> FulfillmentStatus {
        if elapsed < self.preparing_after {
            FulfillmentStatus::PaymentVerified
        } else if elapsed < self.ready_after {
            FulfillmentStatus::Preparing
        } else {
            FulfillmentStatus::ReadyForPickup
        }
    }

    /// Time until the derived status of `record` next changes.
    ///
    /// `None` when unpaid or already ready; a tick scheduler can sleep for the returned
    /// duration instead of polling.
    pub fn next_transition(&self, record: &OrderRecord, now: DateTime<Utc>) -> Option<Duration> {
        let elapsed = elapsed_since(record.paid_at()?, now);
        if elapsed < self.preparing_after {
            Some(self.preparing_after - elapsed)
        } else if elapsed < self.ready_after {
            Some(self.ready_after - elapsed)
        } else {
            None
        }
    }
}

/// Derive the status of `record` at `now` with the default thresholds.
pub fn derive_status(record: &OrderRecord, now: DateTime<Utc>) -> FulfillmentStatus {
    StatusTimeline::default().derive(record, now)
}

fn elapsed_since(paid_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    // Clock skew can put `now` before `paid_at`; clamp to zero.
    (now - paid_at).to_std().unwrap_or(Duration::ZERO)
}
