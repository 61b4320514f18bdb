//! Storefront configuration from environment variables.

use crate::error::{Error, Result};
use crate::ledger::{LedgerSettings, DEFAULT_POST_ACTION, DEFAULT_TRACK_ACTION};
use crate::status::{StatusTimeline, DEFAULT_PREPARING_AFTER, DEFAULT_READY_AFTER};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_ORDERS_API_URL: &str = "SNACK_ORDERS_API_URL";
pub const ENV_MENU_API_URL: &str = "SNACK_MENU_API_URL";
pub const ENV_ORDER_POST_ACTION: &str = "SNACK_ORDER_POST_ACTION";
pub const ENV_TRACK_ORDER_ACTION: &str = "SNACK_TRACK_ORDER_ACTION";
pub const ENV_NOTIFY_ENDPOINT: &str = "SNACK_NOTIFY_ENDPOINT";
pub const ENV_UPI_ID: &str = "SNACK_UPI_ID";
pub const ENV_UPI_PAYEE_NAME: &str = "SNACK_UPI_PAYEE_NAME";
pub const ENV_DATA_DIR: &str = "SNACK_DATA_DIR";
pub const ENV_PREPARING_AFTER_MS: &str = "SNACK_PREPARING_AFTER_MS";
pub const ENV_READY_AFTER_MS: &str = "SNACK_READY_AFTER_MS";

pub const DEFAULT_PAYEE_NAME: &str = "Snack Counter";
pub const DEFAULT_DATA_DIR: &str = ".snack-ledger";

/// Whether `value` is a real setting rather than a blank or template placeholder
/// (`YOUR_...`, `<...>`).
pub fn is_configured_value(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && !trimmed.starts_with("YOUR_") && !trimmed.contains('<')
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorefrontConfig {
    pub orders_url: Option<String>,
    pub menu_url: Option<String>,
    pub post_action: String,
    pub track_action: String,
    pub notify_endpoint: Option<String>,
    pub upi_id: Option<String>,
    pub upi_payee_name: String,
    pub data_dir: PathBuf,
    pub timeline: StatusTimeline,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            orders_url: None,
            menu_url: None,
            post_action: DEFAULT_POST_ACTION.to_string(),
            track_action: DEFAULT_TRACK_ACTION.to_string(),
            notify_endpoint: None,
            upi_id: None,
            upi_payee_name: DEFAULT_PAYEE_NAME.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            timeline: StatusTimeline::default(),
        }
    }
}

impl StorefrontConfig {
    /// Read the configuration from the process environment, logging every default taken.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let configured = |name: &str| lookup(name).filter(|value| is_configured_value(value));

        let orders_url = configured(ENV_ORDERS_API_URL).or_else(|| {
            warn!("{} not set, orders will only be stored locally", ENV_ORDERS_API_URL);
            None
        });
        let menu_url = configured(ENV_MENU_API_URL).or_else(|| {
            debug!("{} not set, using the orders endpoint for the menu", ENV_MENU_API_URL);
            orders_url.clone()
        });
        let post_action = configured(ENV_ORDER_POST_ACTION).unwrap_or_else(|| {
            debug!("{} not set, using {}", ENV_ORDER_POST_ACTION, DEFAULT_POST_ACTION);
            DEFAULT_POST_ACTION.to_string()
        });
        let track_action = configured(ENV_TRACK_ORDER_ACTION).unwrap_or_else(|| {
            debug!("{} not set, using {}", ENV_TRACK_ORDER_ACTION, DEFAULT_TRACK_ACTION);
            DEFAULT_TRACK_ACTION.to_string()
        });
        let notify_endpoint = configured(ENV_NOTIFY_ENDPOINT).or_else(|| {
            warn!("{} not set, status notifications are disabled", ENV_NOTIFY_ENDPOINT);
            None
        });
        let upi_id = configured(ENV_UPI_ID).or_else(|| {
            warn!("{} not set, payment requests cannot be built", ENV_UPI_ID);
            None
        });
        let upi_payee_name = configured(ENV_UPI_PAYEE_NAME).unwrap_or_else(|| {
            warn!("{} not set, using {:?}", ENV_UPI_PAYEE_NAME, DEFAULT_PAYEE_NAME);
            DEFAULT_PAYEE_NAME.to_string()
        });
        let data_dir = configured(ENV_DATA_DIR).map(PathBuf::from).unwrap_or_else(|| {
            warn!("{} not set, using {}", ENV_DATA_DIR, DEFAULT_DATA_DIR);
            PathBuf::from(DEFAULT_DATA_DIR)
        });

        let preparing = millis_or(&lookup, ENV_PREPARING_AFTER_MS, DEFAULT_PREPARING_AFTER);
        let ready = millis_or(&lookup, ENV_READY_AFTER_MS, DEFAULT_READY_AFTER);
        let timeline = StatusTimeline::new(preparing, ready).unwrap_or_else(|e| {
            warn!("Ignoring status thresholds: {}. Using defaults", e);
            StatusTimeline::default()
        });

        Self {
            orders_url,
            menu_url,
            post_action,
            track_action,
            notify_endpoint,
            upi_id,
            upi_payee_name,
            data_dir,
            timeline,
        }
    }

    pub fn with_orders_url(mut self, url: impl Into<String>) -> Self {
        self.orders_url = Some(url.into());
        self
    }

    pub fn with_menu_url(mut self, url: impl Into<String>) -> Self {
        self.menu_url = Some(url.into());
        self
    }

    pub fn with_notify_endpoint(mut self, url: impl Into<String>) -> Self {
        self.notify_endpoint = Some(url.into());
        self
    }

    pub fn with_upi(mut self, upi_id: impl Into<String>, payee_name: impl Into<String>) -> Self {
        self.upi_id = Some(upi_id.into());
        self.upi_payee_name = payee_name.into();
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_timeline(mut self, timeline: StatusTimeline) -> Self {
        self.timeline = timeline;
        self
    }

    /// Settings for the order ledger client.
    pub fn ledger_settings(&self) -> LedgerSettings {
        LedgerSettings {
            endpoint: self.orders_url.clone(),
            post_action: self.post_action.clone(),
            track_action: self.track_action.clone(),
        }
    }

    /// Menu endpoint, falling back to the orders endpoint.
    ///
    /// # Errors
    /// Returns `Error::ConfigMissing` if neither is configured
    pub fn menu_endpoint(&self) -> Result<&str> {
        self.menu_url
            .as_deref()
            .or(self.orders_url.as_deref())
            .filter(|url| is_configured_value(url))
            .ok_or_else(|| {
                Error::ConfigMissing(format!("set {} or {}", ENV_MENU_API_URL, ENV_ORDERS_API_URL))
            })
    }
}

fn millis_or<F>(lookup: &F, name: &str, default: Duration) -> Duration
where F: Fn(&str) -> Option<String> {
    match lookup(name) {
        None => default,
        Some(raw) => raw.trim().parse::<u64>().map(Duration::from_millis).unwrap_or_else(|e| {
            warn!("Invalid {} ({:?}): {}. Using {:?}", name, raw, e, default);
            default
        }),
    }
}
