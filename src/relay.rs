//! Fire-and-forget status notifications to a message relay.
//!
//! The relay receives a small JSON document per status change and forwards it to the customer
//! (the storefront uses a WhatsApp bridge). Delivery is best effort: callers log failures and
//! carry on.

use crate::amount::Amount;
use crate::config::is_configured_value;
use crate::error::{Error, Result};
use crate::ledger::{excerpt, LedgerRequest, LedgerTransport};
use crate::model::OrderRecord;
use crate::status::FulfillmentStatus;
use serde::Serialize;
use url::Url;

/// Country code prefixed to bare 10-digit numbers.
pub const DEFAULT_COUNTRY_CODE: &str = "91";

/// Body posted to the relay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusNotification {
    pub customer_phone: String,
    pub customer_name: String,
    pub order_id: u64,
    pub order_date_key: String,
    pub total: Amount,
    pub status: FulfillmentStatus,
}

impl StatusNotification {
    pub fn for_record(record: &OrderRecord, status: FulfillmentStatus) -> Self {
        Self {
            customer_phone: record.customer().phone.clone(),
            customer_name: record.customer().name.clone(),
            order_id: record.order_id(),
            order_date_key: record.order_date_key().to_string(),
            total: record.total(),
            status,
        }
    }

    /// Whether the relay would accept this notification.
    pub fn is_deliverable(&self) -> bool {
        !self.customer_phone.trim().is_empty() && self.order_id > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Sent,
    /// Required fields were missing; nothing was sent.
    Skipped,
}

/// Client for the notification relay endpoint.
#[derive(Clone)]
pub struct NotificationRelay<T: LedgerTransport> {
    transport: T,
    endpoint: Url,
}

impl<T: LedgerTransport> NotificationRelay<T> {
    /// # Errors
    /// Returns `Error::ConfigMissing` if `endpoint` is blank, a placeholder, or not a URL
    pub fn new(transport: T, endpoint: &str) -> Result<Self> {
        if !is_configured_value(endpoint) {
            return Err(Error::ConfigMissing(
                "notification endpoint is not configured".to_string(),
            ));
        }
        let endpoint = Url::parse(endpoint.trim()).map_err(|e| {
            Error::ConfigMissing(format!("notification endpoint {:?}: {}", endpoint, e))
        })?;
        Ok(Self {
            transport,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Post `notification` to the relay.
    ///
    /// # Errors
    ///
    /// - `Error::NetworkError`: the relay could not be reached.
    /// - `Error::HttpError`: the relay rejected the notification.
    /// - `Error::SerializationError`: the body could not be encoded.
    pub async fn notify(&self, notification: &StatusNotification) -> Result<RelayOutcome> {
        if !notification.is_deliverable() {
            debug!(
                "Skipping notification for order {}: missing phone or id",
                notification.order_id
            );
            return Ok(RelayOutcome::Skipped);
        }

        let body = serde_json::to_value(notification)
            .map_err(|e| Error::SerializationError(e.to_string()))?;
        let request = LedgerRequest::PostJson {
            url: self.endpoint.clone(),
            body,
        };
        let response = self.transport.send(&request).await?;
        if !response.is_success() {
            return Err(Error::HttpError {
                status: response.status,
                body: excerpt(&response.body),
            });
        }
        debug!(
            "Notified relay of order {} status {}",
            notification.order_id, notification.status
        );
        Ok(RelayOutcome::Sent)
    }
}

/// Message text the relay sends for `notification`.
///
/// ```
/// use snack_ledger::amount::Amount;
/// use snack_ledger::relay::{render_status_message, StatusNotification};
/// use snack_ledger::status::FulfillmentStatus;
///
/// let text = render_status_message(&StatusNotification {
///     customer_phone: "9876543210".into(),
///     customer_name: "Asha".into(),
///     order_id: 7,
///     order_date_key: "2024-01-01".into(),
///     total: Amount::from_paise(4550),
///     status: FulfillmentStatus::Preparing,
/// });
/// assert_eq!(
///     text,
///     "Your order is now being prepared.\nOrder ID: 7\nDate: 2024-01-01\nTotal: Rs. 45.50\nName: Asha"
/// );
/// ```
pub fn render_status_message(notification: &StatusNotification) -> String {
    let header = match notification.status {
        FulfillmentStatus::PaymentVerified => "Your order has been placed successfully.",
        FulfillmentStatus::Preparing => "Your order is now being prepared.",
        FulfillmentStatus::ReadyForPickup => {
            "Your order is ready for pickup. Please collect it at the counter."
        }
        FulfillmentStatus::Delivered => {
            "Your order has been delivered successfully. Thank you for ordering with us."
        }
        _ => "Your order status has been updated.",
    };

    let mut lines = vec![
        header.to_string(),
        format!("Order ID: {}", notification.order_id),
    ];
    if !notification.order_date_key.is_empty() {
        lines.push(format!("Date: {}", notification.order_date_key));
    }
    if notification.total > Amount::ZERO {
        lines.push(format!("Total: Rs. {}", notification.total));
    }
    if !notification.customer_name.trim().is_empty() {
        lines.push(format!("Name: {}", notification.customer_name.trim()));
    }
    lines.join("\n")
}

/// Reduce a phone number to E.164 digits.
///
/// Non-digits are dropped; 10 digits get `default_country_code` prefixed, 11 to 15 digits are
/// kept as they are, anything else is rejected.
pub fn sanitize_phone(raw: &str, default_country_code: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        10 => Some(format!("{}{}", default_country_code, digits)),
        11..=15 => Some(digits),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{ScriptedTransport, BODY_EXCERPT_CHARS};

    fn notification() -> StatusNotification {
        StatusNotification {
            customer_phone: "9876543210".to_string(),
            customer_name: "Asha".to_string(),
            order_id: 7,
            order_date_key: "2024-01-01".to_string(),
            total: Amount::from_rupees(45),
            status: FulfillmentStatus::ReadyForPickup,
        }
    }

    #[test]
    fn test_sanitize_phone() {
        assert_eq!(
            sanitize_phone("98765 43210", DEFAULT_COUNTRY_CODE),
            Some("919876543210".to_string())
        );
        assert_eq!(
            sanitize_phone("+44 20 7946 0958", DEFAULT_COUNTRY_CODE),
            Some("442079460958".to_string())
        );
        assert_eq!(sanitize_phone("12345", DEFAULT_COUNTRY_CODE), None);
        assert_eq!(sanitize_phone("", DEFAULT_COUNTRY_CODE), None);
        assert_eq!(sanitize_phone("1234567890123456", DEFAULT_COUNTRY_CODE), None);
    }

    #[test]
    fn test_message_omits_empty_lines() {
        let mut n = notification();
        n.order_date_key.clear();
        n.customer_name.clear();
        n.total = Amount::ZERO;
        n.status = FulfillmentStatus::Cancelled;
        assert_eq!(
            render_status_message(&n),
            "Your order status has been updated.\nOrder ID: 7"
        );
    }

    #[test]
    fn test_body_shape() {
        let body = serde_json::to_value(notification()).unwrap();
        assert_eq!(body["customerPhone"], "9876543210");
        assert_eq!(body["orderId"], 7);
        assert_eq!(body["orderDateKey"], "2024-01-01");
        assert_eq!(body["total"], 45.0);
        assert_eq!(body["status"], "ready_for_pickup");
    }

    #[tokio::test]
    async fn test_notify_posts_json() {
        let transport = ScriptedTransport::new();
        let relay = NotificationRelay::new(transport.clone(), "https://relay.example/notify").unwrap();

        assert_eq!(relay.notify(&notification()).await.unwrap(), RelayOutcome::Sent);
        let sent = transport.requests().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].request.field("status"), Some("ready_for_pickup".to_string()));
    }

    #[tokio::test]
    async fn test_notify_skips_and_fails() {
        let transport = ScriptedTransport::new().then_status(502, "bad gateway");
        let relay = NotificationRelay::new(transport.clone(), "https://relay.example/notify").unwrap();

        let mut missing = notification();
        missing.customer_phone.clear();
        assert_eq!(relay.notify(&missing).await.unwrap(), RelayOutcome::Skipped);
        assert_eq!(transport.call_count().await, 0);

        assert!(matches!(
            relay.notify(&notification()).await,
            Err(Error::HttpError { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn test_notify_error_body_is_capped() {
        let page = format!("  {}  ", "x".repeat(BODY_EXCERPT_CHARS * 2));
        let transport = ScriptedTransport::new().then_status(500, page);
        let relay = NotificationRelay::new(transport, "https://relay.example/notify").unwrap();

        match relay.notify(&notification()).await {
            Err(Error::HttpError { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "x".repeat(BODY_EXCERPT_CHARS));
            }
            other => panic!("expected HTTP error, got {:?}", other),
        }
    }

    #[test]
    fn test_unconfigured_relay() {
        assert!(NotificationRelay::new(ScriptedTransport::new(), "").is_err());
        assert!(NotificationRelay::new(ScriptedTransport::new(), "YOUR_RELAY").is_err());
        assert!(NotificationRelay::new(ScriptedTransport::new(), "not a url").is_err());
    }
}
