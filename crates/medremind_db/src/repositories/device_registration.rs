//! Repository for device registrations
//!
//! A push token is unique across all registrations. Registering an existing
//! token again is idempotent for its owner and reassigns (and reactivates) it
//! otherwise. Rows are never deleted here, only flipped inactive.

use crate::error::DbError;
use medremind_common::models::Platform;

pub use medremind_common::models::DeviceRegistration;

/// Repository for device registrations
pub trait DeviceRegistrationRepository {
    /// Create the `device_registrations` table if it doesn't exist
    fn init_schema(&self) -> impl std::future::Future<Output = Result<(), DbError>> + Send;

    /// Register a push token for a user
    ///
    /// Inserts an active row for a new token. For a known token the row is
    /// assigned to `user_id`, its platform updated and it is reactivated; no
    /// duplicate row is ever created.
    fn register_device(
        &self,
        user_id: &str,
        platform: Platform,
        push_token: &str,
    ) -> impl std::future::Future<Output = Result<DeviceRegistration, DbError>> + Send;

    /// Find the registration holding a push token
    fn find_by_token(
        &self,
        push_token: &str,
    ) -> impl std::future::Future<Output = Result<Option<DeviceRegistration>, DbError>> + Send;

    /// Find all registrations of a user, active or not
    fn find_by_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<DeviceRegistration>, DbError>> + Send;

    /// Find the active registrations of a user
    fn find_active_by_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<DeviceRegistration>, DbError>> + Send;

    /// Mark the given tokens of one user inactive in a single statement
    ///
    /// Rows of other users are never touched. Already inactive tokens and an
    /// empty token list are no-ops. Returns the number of rows matched.
    fn deactivate_tokens(
        &self,
        user_id: &str,
        push_tokens: &[String],
    ) -> impl std::future::Future<Output = Result<u64, DbError>> + Send;

    /// Soft-unregister a single device on behalf of its owner
    ///
    /// Returns `true` if a row owned by `user_id` matched.
    fn unregister_device(
        &self,
        user_id: &str,
        push_token: &str,
    ) -> impl std::future::Future<Output = Result<bool, DbError>> + Send;
}
