//! Observability hooks for ledger submission.
//!
//! Implement [`SubmissionMetrics`] to feed attempt counts and outcomes into a monitoring
//! system:
//!
//! ```
//! use snack_ledger::ledger::SubmitStrategy;
//! use snack_ledger::observability::SubmissionMetrics;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct UncertainCounter(AtomicUsize);
//!
//! impl SubmissionMetrics for UncertainCounter {
//!     fn record_uncertain(&self, _order_id: u64, _failed_attempts: usize) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//!
//! // let client = LedgerClient::new(transport, settings)
//! //     .with_metrics(UncertainCounter::default());
//! ```
//!
//! Methods left unimplemented fall back to logging through the `log` crate.
//! [`NoOpMetrics`] overrides all of them with nothing and is the client default.

use crate::error::Error;
use crate::ledger::SubmitStrategy;
use std::time::Duration;

/// Hooks called by the ledger client around every submission.
pub trait SubmissionMetrics: Send + Sync {
    /// A strategy is about to be tried.
    fn record_attempt(&self, order_id: u64, strategy: SubmitStrategy) {
        debug!("Submitting order {} via {}", order_id, strategy);
    }

    /// A strategy failed; the chain moves on.
    fn record_failure(&self, order_id: u64, strategy: SubmitStrategy, cause: &Error) {
        warn!("Order {} {} attempt failed: {}", order_id, strategy, cause);
    }

    /// A strategy confirmed delivery after `elapsed` of chain time.
    fn record_delivered(&self, order_id: u64, strategy: SubmitStrategy, elapsed: Duration) {
        info!(
            "Order {} delivered via {} in {:?}",
            order_id, strategy, elapsed
        );
    }

    /// Only the opaque fallback was sent.
    fn record_uncertain(&self, order_id: u64, failed_attempts: usize) {
        warn!(
            "Order {} delivery unconfirmed after {} failed attempts",
            order_id, failed_attempts
        );
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl SubmissionMetrics for NoOpMetrics {
    fn record_attempt(&self, _order_id: u64, _strategy: SubmitStrategy) {}
    fn record_failure(&self, _order_id: u64, _strategy: SubmitStrategy, _cause: &Error) {}
    fn record_delivered(&self, _order_id: u64, _strategy: SubmitStrategy, _elapsed: Duration) {}
    fn record_uncertain(&self, _order_id: u64, _failed_attempts: usize) {}
}

/// Metrics implementation that only logs, using the trait defaults.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl SubmissionMetrics for LogMetrics {}
