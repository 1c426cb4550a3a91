//! Expo push delivery for MedRemind alarms
//!
//! Delivers a medication reminder or SOS alarm to every registered device of
//! a user through the Expo push gateway, and keeps the device store clean by
//! deactivating tokens the gateway reports as no longer registered.
//!
//! # Pipeline
//!
//! 1. load the user's registrations and keep active Expo tokens
//!    ([`token_filter`])
//! 2. post them in batches, retrying once on an interrupted connection
//!    ([`sender`], [`retry`], [`client`])
//! 3. classify the per-message tickets ([`receipts`])
//! 4. flip `DeviceNotRegistered` tokens inactive ([`deactivation`])
//!
//! # Example
//!
//! ```rust,no_run
//! use medremind_config::PushConfig;
//! use medremind_db::DbClient;
//! use medremind_push::{AlarmNotification, LivePushService};
//!
//! async fn remind() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = DbClient::from_url("sqlite:data/medremind.db").await?;
//!     let service = LivePushService::from_config(&PushConfig::default(), db)?;
//!     let alarm = AlarmNotification::new("reminder-17", "Medication reminder", "Time for Metformin");
//!     let report = service.send_alarm("user-1", &alarm).await?;
//!     println!("{} of {} delivered", report.delivered, report.attempted);
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `POST /push/register-device`
//! - `POST /push/unregister-device`
//! - `POST /push/send-alarm`

pub mod client;
pub mod deactivation;
#[cfg(feature = "openapi")]
pub mod doc;
pub mod error;
pub mod handlers;
pub mod models;
pub mod receipts;
pub mod retry;
pub mod routes;
pub mod sender;
pub mod service;
pub mod token_filter;

pub use client::{ExpoClient, PushTransport};
pub use error::PushError;
pub use models::{AlarmNotification, DeliveryOutcome, DeliveryStatus, DispatchReport};
pub use retry::RetryPolicy;
pub use routes::routes;
pub use service::{LivePushService, PushService};

#[cfg(feature = "openapi")]
pub mod openapi {
    pub use crate::doc::PushApiDoc;
}
