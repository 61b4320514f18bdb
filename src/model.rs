//! Order record and its value types.

use crate::amount::Amount;
use crate::error::{Error, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

//--------------------------------------      DateKey      ---------------------------------------------------------

/// Calendar date partition key, rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// The local calendar date at `instant`.
    pub fn from_local(instant: DateTime<Utc>) -> Self {
        Self(instant.with_timezone(&Local).date_naive())
    }

    /// Today's local date key.
    pub fn today() -> Self {
        Self::from_local(Utc::now())
    }

    /// Parse a strict `YYYY-MM-DD` string.
    ///
    /// # Errors
    /// Returns `Error::InvalidInput` for anything that is not a real, zero-padded date
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != 10 {
            return Err(Error::InvalidInput(format!("not a YYYY-MM-DD date: {:?}", s)));
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| Error::InvalidInput(format!("not a YYYY-MM-DD date: {:?}", s)))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DateKey {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl FromStr for DateKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

//--------------------------------------      Customer      ---------------------------------------------------------

/// Contact details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub phone: String,
}

impl Customer {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            phone: phone.into(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        let email = email.into();
        self.email = if email.trim().is_empty() { None } else { Some(email) };
        self
    }

    /// Email as sent to the ledger; absent becomes an empty string.
    pub fn email_or_empty(&self) -> &str {
        self.email.as_deref().unwrap_or("")
    }
}

//--------------------------------------     OrderRecord    ---------------------------------------------------------

/// One customer order and its lifecycle fields.
///
/// Identity (`order_id`, `order_date_key`), `created_at`, `customer`, `items` and `total` are
/// fixed at construction and only exposed through getters. The lifecycle fields change through
/// dedicated methods: `paid_at` can be set once and never moves, `saving` and `error` track the
/// most recent submission.
///
/// The fulfillment status is never stored; see [`crate::status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    order_id: u64,
    order_date_key: DateKey,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    paid_at: Option<DateTime<Utc>>,
    customer: Customer,
    items: String,
    total: Amount,
    #[serde(default)]
    saving: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl OrderRecord {
    /// Build a new, unpaid record.
    ///
    /// `order_date_key` should be the local date at `created_at`; [`crate::desk::OrderDesk`]
    /// guarantees this for orders it creates.
    pub fn new(
        order_id: u64,
        order_date_key: DateKey,
        created_at: DateTime<Utc>,
        customer: Customer,
        items: impl Into<String>,
        total: Amount,
    ) -> Self {
        Self {
            order_id,
            order_date_key,
            created_at,
            paid_at: None,
            customer,
            items: items.into(),
            total,
            saving: false,
            error: None,
        }
    }

    pub fn order_id(&self) -> u64 {
        self.order_id
    }

    pub fn order_date_key(&self) -> &DateKey {
        &self.order_date_key
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn items(&self) -> &str {
        &self.items
    }

    pub fn total(&self) -> Amount {
        self.total
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_paid(&self) -> bool {
        self.paid_at.is_some()
    }

    /// Human-readable order reference used in payment notes.
    pub fn reference(&self) -> String {
        format!("Order {}", self.order_id)
    }

    /// Mark a submission as in flight (or finished).
    pub fn set_saving(&mut self, saving: bool) {
        self.saving = saving;
    }

    /// Record the moment the customer declared payment.
    ///
    /// The first recorded instant wins; later calls leave it untouched. Returns whether
    /// `paid_at` changed.
    pub fn record_payment(&mut self, at: DateTime<Utc>) -> bool {
        if self.paid_at.is_some() {
            return false;
        }
        self.paid_at = Some(at);
        true
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}
