//! UPI payment request strings.

use crate::amount::Amount;
use crate::config::{is_configured_value, StorefrontConfig};
use crate::error::{Error, Result};
use crate::model::OrderRecord;
use std::fmt;

/// A `upi://pay` request for one order, rendered into a QR code by the storefront.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub upi_id: String,
    pub payee_name: String,
    pub amount: Amount,
    pub note: String,
}

impl PaymentRequest {
    /// Request for `record`, noted with its reference (`Order <id>`).
    pub fn for_order(upi_id: &str, payee_name: &str, record: &OrderRecord) -> Self {
        Self {
            upi_id: upi_id.to_string(),
            payee_name: payee_name.to_string(),
            amount: record.total(),
            note: record.reference(),
        }
    }

    /// Request for `record` using the configured payee.
    ///
    /// # Errors
    /// Returns `Error::ConfigMissing` if no UPI id is configured
    pub fn from_config(config: &StorefrontConfig, record: &OrderRecord) -> Result<Self> {
        let upi_id = config
            .upi_id
            .as_deref()
            .filter(|id| is_configured_value(id))
            .ok_or_else(|| Error::ConfigMissing("UPI id is not configured".to_string()))?;
        Ok(Self::for_order(upi_id, &config.upi_payee_name, record))
    }

    /// The `upi://pay?...` URI.
    pub fn to_uri(&self) -> String {
        format!(
            "upi://pay?pa={}&pn={}&am={}&cu=INR&tn={}",
            urlencoding::encode(&self.upi_id),
            urlencoding::encode(&self.payee_name),
            self.amount.to_fixed(),
            urlencoding::encode(&self.note),
        )
    }
}

impl fmt::Display for PaymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Customer, DateKey};
    use chrono::Utc;

    fn record() -> OrderRecord {
        OrderRecord::new(
            12,
            DateKey::parse("2024-01-01").unwrap(),
            Utc::now(),
            Customer::new("Asha", "9876543210"),
            "Tea x1",
            Amount::from_paise(4550),
        )
    }

    #[test]
    fn test_uri() {
        let request = PaymentRequest::for_order("counter@bank", "Snack Counter", &record());
        assert_eq!(
            request.to_uri(),
            "upi://pay?pa=counter%40bank&pn=Snack%20Counter&am=45.50&cu=INR&tn=Order%2012"
        );
    }

    #[test]
    fn test_from_config_requires_upi_id() {
        let config = StorefrontConfig::default();
        assert!(matches!(
            PaymentRequest::from_config(&config, &record()),
            Err(Error::ConfigMissing(_))
        ));

        let config = config.with_upi("counter@bank", "Counter");
        let request = PaymentRequest::from_config(&config, &record()).unwrap();
        assert_eq!(request.payee_name, "Counter");
        assert_eq!(request.note, "Order 12");
    }
}
