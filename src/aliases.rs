//! Field-name precedence table for loosely shaped ledger rows.
//!
//! The ledger is a spreadsheet behind a script, so column names drift between `orderId`,
//! `Order ID`, `id` and friends. Each logical field lists its accepted keys in precedence
//! order; the first key holding a non-null, non-empty value wins.

use serde_json::{Map, Value};

/// Logical fields read from remote rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalField {
    OrderId,
    OrderDate,
    Status,
    Total,
    Items,
    PaidAt,
    MenuId,
    MenuName,
    MenuPrice,
    MenuImage,
    MenuCategory,
    MenuActive,
}

/// Accepted keys per field, highest precedence first.
pub const FIELD_ALIASES: &[(LogicalField, &[&str])] = &[
    (LogicalField::OrderId, &["orderId", "id", "Order ID", "OrderId"]),
    (LogicalField::OrderDate, &["orderDate", "date", "Date"]),
    (LogicalField::Status, &["status", "Status", "orderStatus"]),
    (LogicalField::Total, &["total", "Total", "amount"]),
    (LogicalField::Items, &["items", "Items"]),
    (LogicalField::PaidAt, &["paidAt", "paymentTime", "timestamp"]),
    (LogicalField::MenuId, &["id", "ID", "Id"]),
    (LogicalField::MenuName, &["name", "Name"]),
    (LogicalField::MenuPrice, &["price", "Price"]),
    (LogicalField::MenuImage, &["image", "Image", "imageUrl", "imageURL"]),
    (LogicalField::MenuCategory, &["category", "Category", "type", "Type"]),
    (LogicalField::MenuActive, &["active", "Active"]),
];

impl LogicalField {
    /// Accepted keys for this field, highest precedence first.
    pub fn keys(self) -> &'static [&'static str] {
        FIELD_ALIASES
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, keys)| *keys)
            .unwrap_or(&[])
    }
}

/// First non-null, non-empty value for `field` in `row`.
pub fn read_field(row: &Map<String, Value>, field: LogicalField) -> Option<&Value> {
    field.keys().iter().find_map(|key| match row.get(*key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(value) => Some(value),
    })
}

/// `read_field` rendered as text. Numbers and booleans are stringified.
pub fn read_text(row: &Map<String, Value>, field: LogicalField) -> Option<String> {
    read_field(row, field).and_then(|value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// `read_field` as a number. Numeric strings are parsed.
pub fn read_number(row: &Map<String, Value>, field: LogicalField) -> Option<f64> {
    read_field(row, field).and_then(|value| match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
    .filter(|n| n.is_finite())
}
