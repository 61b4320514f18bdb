//! # snack-ledger
//!
//! Order lifecycle for a snack storefront: date-partitioned order ids, a local order store,
//! delivery to a spreadsheet-backed ledger over an unreliable channel, and a fulfillment status
//! derived from elapsed time.
//!
//! ## Features
//!
//! - **Daily order ids:** sequential per calendar date, never reused
//! - **Pluggable persistence:** in-memory or file-per-key, behind [`backend::StoreBackend`]
//! - **Resilient submission:** an ordered chain of encodings that stops at the first confirmed
//!   delivery and degrades to an unconfirmed send instead of failing
//! - **Derived status:** recomputed from `paid_at` on every read, never stored
//! - **Tracking:** look an order up by date and id, optionally reconciled with the ledger
//!
//! ## Quick Start
//!
//! ```no_run
//! use snack_ledger::{
//!     amount::Amount,
//!     backend::FileBackend,
//!     checkout::{Cart, CustomerDetails},
//!     config::StorefrontConfig,
//!     ledger::{LedgerClient, ReqwestTransport},
//!     store::DailyOrderStore,
//!     tracking::TrackingService,
//!     OrderDesk,
//! };
//!
//! # async fn run() -> snack_ledger::Result<()> {
//! let config = StorefrontConfig::from_env();
//! let store = DailyOrderStore::new(FileBackend::open(&config.data_dir).await?);
//! let ledger = LedgerClient::new(ReqwestTransport::new()?, config.ledger_settings());
//! let desk = OrderDesk::new(store.clone(), ledger).with_timeline(config.timeline);
//!
//! let mut cart = Cart::new();
//! cart.add("Tea", Amount::from_rupees(10));
//! let order = desk
//!     .create_order(&CustomerDetails::new("Asha", "", "9876543210"), &cart)
//!     .await?;
//! desk.confirm_payment(order.order_date_key(), order.order_id()).await?;
//!
//! // Later, possibly from another session on the same device:
//! let tracked = TrackingService::new(store)
//!     .track(order.order_date_key(), order.order_id() as i64)
//!     .await?;
//! println!("{}", tracked.status.label());
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

pub mod aliases;
pub mod amount;
pub mod backend;
pub mod catalog;
pub mod checkout;
pub mod clock;
pub mod config;
pub mod desk;
pub mod error;
pub mod key;
pub mod ledger;
pub mod model;
pub mod observability;
pub mod payment;
pub mod relay;
pub mod serialization;
pub mod status;
pub mod store;
pub mod tracking;

// Re-exports for convenience
pub use amount::Amount;
pub use backend::StoreBackend;
pub use desk::{Delivery, OrderDesk, PaymentConfirmation};
pub use error::{Error, Result};
pub use ledger::{LedgerClient, LedgerSettings, OrderPayload, SubmitOutcome, SubmitStrategy};
pub use model::{Customer, DateKey, OrderRecord};
pub use status::{derive_status, FulfillmentStatus, StatusTimeline};
pub use store::DailyOrderStore;
pub use tracking::{StatusSource, TrackedOrder, TrackingService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
