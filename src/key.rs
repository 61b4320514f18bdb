//! Store key layout.
//!
//! Two namespaces, both keyed by calendar date:
//!
//! ```text
//! order_counter:2024-01-01  -> "7"                    (last issued order id)
//! orders:2024-01-01         -> [{"orderId":1,...}]    (JSON array of order records)
//! ```

use crate::model::DateKey;

/// Prefix of the per-date counter namespace.
pub const COUNTER_PREFIX: &str = "order_counter";

/// Prefix of the per-date order partition namespace.
pub const PARTITION_PREFIX: &str = "orders";

/// Builder for store keys.
pub struct StoreKeyBuilder;

impl StoreKeyBuilder {
    /// Key holding the counter for `date`.
    pub fn counter(date: &DateKey) -> String {
        Self::build_with_prefix(COUNTER_PREFIX, date)
    }

    /// Key holding the order partition for `date`.
    pub fn partition(date: &DateKey) -> String {
        Self::build_with_prefix(PARTITION_PREFIX, date)
    }

    /// Build key with custom prefix.
    pub fn build_with_prefix(prefix: &str, id: &dyn std::fmt::Display) -> String {
        format!("{}:{}", prefix, id)
    }
}
