//! Database integration for MedRemind
//!
//! Stores device registrations (user, platform, push token, active flag)
//! behind a database agnostic repository built on SQLx. SQLite is the default
//! backend; PostgreSQL and MySQL are available through feature flags.
//!
//! # Example
//!
//! ```rust,no_run
//! use medremind_db::{DbClient, DeviceRegistrationRepository, SqlDeviceRegistrationRepository};
//!
//! async fn setup_db() -> Result<SqlDeviceRegistrationRepository, Box<dyn std::error::Error>> {
//!     let db_client = DbClient::from_url("sqlite:data/medremind.db").await?;
//!     let repository = SqlDeviceRegistrationRepository::new(db_client);
//!     repository.init_schema().await?;
//!     Ok(repository)
//! }
//! ```

pub mod client;
pub mod error;
pub mod repositories;
pub mod repository;

pub use client::DbClient;
pub use error::DbError;
pub use repository::RepositoryFactory;

pub use repositories::{
    DeviceRegistration, DeviceRegistrationRepository, DeviceRegistrationRepositoryFactory,
    SqlDeviceRegistrationRepository,
};
