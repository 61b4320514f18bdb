//! The order submission wire contract.

use crate::amount::Amount;
use crate::model::{DateKey, OrderRecord};
use crate::status::FulfillmentStatus;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// A finalized order as sent to the ledger.
///
/// Every submission strategy encodes this one value; they differ only in which field set
/// they carry and how it is framed. All values go over the wire as strings.
///
/// Minimal field set: `orderId, customerName, customerEmail, customerPhone, items, total,
/// timestamp`.
///
/// Full field set: `action, orderId, orderDate, customerName, customerEmail, customerPhone,
/// items, total, timestamp, status, name, email, phone`. The trailing lower-case aliases
/// repeat the customer fields for receivers that read those names instead.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPayload {
    pub action: String,
    pub order_id: u64,
    pub order_date: DateKey,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub items: String,
    pub total: Amount,
    pub timestamp: DateTime<Utc>,
    pub status: FulfillmentStatus,
}

impl OrderPayload {
    /// Version of this field layout.
    pub const CONTRACT_VERSION: u32 = 1;

    /// Build the payload for `record`, stamped at `timestamp`.
    pub fn from_record(
        record: &OrderRecord,
        action: impl Into<String>,
        timestamp: DateTime<Utc>,
        status: FulfillmentStatus,
    ) -> Self {
        let customer = record.customer();
        Self {
            action: action.into(),
            order_id: record.order_id(),
            order_date: *record.order_date_key(),
            customer_name: customer.name.clone(),
            customer_email: customer.email_or_empty().to_string(),
            customer_phone: customer.phone.clone(),
            items: record.items().to_string(),
            total: record.total(),
            timestamp,
            status,
        }
    }

    /// ISO-8601 timestamp with millisecond precision and a `Z` suffix.
    pub fn timestamp_text(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// The minimal field set.
    pub fn legacy_fields(&self) -> Vec<(String, String)> {
        vec![
            pair("orderId", self.order_id.to_string()),
            pair("customerName", self.customer_name.clone()),
            pair("customerEmail", self.customer_email.clone()),
            pair("customerPhone", self.customer_phone.clone()),
            pair("items", self.items.clone()),
            pair("total", self.total.to_fixed()),
            pair("timestamp", self.timestamp_text()),
        ]
    }

    /// The full field set, including lower-case customer aliases.
    pub fn full_fields(&self) -> Vec<(String, String)> {
        vec![
            pair("action", self.action.clone()),
            pair("orderId", self.order_id.to_string()),
            pair("orderDate", self.order_date.to_string()),
            pair("customerName", self.customer_name.clone()),
            pair("customerEmail", self.customer_email.clone()),
            pair("customerPhone", self.customer_phone.clone()),
            pair("items", self.items.clone()),
            pair("total", self.total.to_fixed()),
            pair("timestamp", self.timestamp_text()),
            pair("status", self.status.to_string()),
            pair("name", self.customer_name.clone()),
            pair("email", self.customer_email.clone()),
            pair("phone", self.customer_phone.clone()),
        ]
    }

    /// The full field set as a JSON object.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .full_fields()
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        Value::Object(map)
    }
}

fn pair(key: &str, value: String) -> (String, String) {
    (key.to_string(), value)
}
