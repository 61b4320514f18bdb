//! Parsing of status-query responses from the ledger.

use crate::aliases::{read_number, read_text, LogicalField};
use crate::amount::Amount;
use crate::model::DateKey;
use crate::status::FulfillmentStatus;
use serde_json::Value;

/// One order as reported by the ledger's status query.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteOrderStatus {
    pub order_id: u64,
    /// Absent when the row carries no date or an unparseable one.
    pub order_date: Option<DateKey>,
    pub total: Amount,
    pub items: String,
    /// Kept verbatim; the ledger does not agree on a timestamp format.
    pub paid_at: Option<String>,
    /// `None` when the row's status is missing or outside the known vocabulary.
    pub ledger_status: Option<FulfillmentStatus>,
}

/// Normalise one loosely shaped row.
///
/// Returns `None` unless the row is an object with a positive integer order id.
pub fn normalize_tracked_order(row: &Value) -> Option<RemoteOrderStatus> {
    let row = row.as_object()?;

    let id = read_number(row, LogicalField::OrderId)?;
    if id <= 0.0 || id.fract() != 0.0 || id > u64::MAX as f64 {
        return None;
    }

    let total = read_number(row, LogicalField::Total)
        .and_then(|value| Amount::try_from(value).ok())
        .unwrap_or(Amount::ZERO);

    Some(RemoteOrderStatus {
        order_id: id as u64,
        order_date: read_text(row, LogicalField::OrderDate)
            .and_then(|text| DateKey::parse(&text).ok()),
        total,
        items: read_text(row, LogicalField::Items).unwrap_or_default(),
        paid_at: read_text(row, LogicalField::PaidAt),
        ledger_status: read_text(row, LogicalField::Status)
            .and_then(|text| FulfillmentStatus::from_ledger(&text)),
    })
}

/// Pick the tracked order out of a status-query payload.
///
/// Candidates are the elements of a top-level array, or for an object its `items` and `orders`
/// arrays, its `order` object and finally the object itself. The first candidate whose id matches
/// `requested` wins; otherwise the first valid candidate is returned.
pub fn parse_track_payload(payload: &Value, requested: u64) -> Option<RemoteOrderStatus> {
    let mut candidates: Vec<&Value> = Vec::new();
    match payload {
        Value::Array(rows) => candidates.extend(rows.iter()),
        Value::Object(map) => {
            if let Some(Value::Array(rows)) = map.get("items") {
                candidates.extend(rows.iter());
            }
            if let Some(Value::Array(rows)) = map.get("orders") {
                candidates.extend(rows.iter());
            }
            if let Some(order) = map.get("order").filter(|order| order.is_object()) {
                candidates.push(order);
            }
            candidates.push(payload);
        }
        _ => {}
    }

    let normalized: Vec<RemoteOrderStatus> = candidates
        .into_iter()
        .filter_map(normalize_tracked_order)
        .collect();

    let position = normalized
        .iter()
        .position(|order| order.order_id == requested)
        .unwrap_or(0);
    normalized.into_iter().nth(position)
}
