//! Encoding of persisted store values.
//!
//! Two value shapes live in the store:
//!
//! ```text
//! order_counter:<date>  ->  b"12"                         decimal ASCII, last issued id
//! orders:<date>         ->  b"[{\"orderId\":1,...},...]"  JSON array of OrderRecord
//! ```
//!
//! Both are plain text so a partition written by one client build can be read by another
//! (and inspected by hand on the device).

use crate::error::{Error, Result};
use crate::model::OrderRecord;

/// Encode a counter value.
pub fn encode_counter(value: u64) -> Vec<u8> {
    value.to_string().into_bytes()
}

/// Decode a counter value.
///
/// # Errors
///
/// Returns `Error::DeserializationError` if the bytes are not a decimal `u64`.
pub fn decode_counter(bytes: &[u8]) -> Result<u64> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::DeserializationError(format!("counter is not UTF-8: {}", e)))?;
    text.trim()
        .parse::<u64>()
        .map_err(|e| Error::DeserializationError(format!("counter {:?}: {}", text, e)))
}

/// Encode an order partition as a JSON array.
///
/// # Errors
///
/// Returns `Error::SerializationError` if a record cannot be serialized.
pub fn encode_partition(records: &[OrderRecord]) -> Result<Vec<u8>> {
    serde_json::to_vec(records).map_err(|e| Error::SerializationError(e.to_string()))
}

/// Decode an order partition.
///
/// # Errors
///
/// Returns `Error::DeserializationError` if the bytes are not a JSON array of records.
pub fn decode_partition(bytes: &[u8]) -> Result<Vec<OrderRecord>> {
    serde_json::from_slice(bytes).map_err(|e| Error::DeserializationError(e.to_string()))
}
