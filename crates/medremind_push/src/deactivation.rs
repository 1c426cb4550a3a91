//! Marks unregistered device tokens inactive

use crate::error::PushError;
use medremind_db::DeviceRegistrationRepository;
use tracing::info;

pub struct DeactivationWriter<'a, S> {
    store: &'a S,
}

impl<'a, S> DeactivationWriter<'a, S>
where
    S: DeviceRegistrationRepository + Sync,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Flips `tokens` of `user_id` inactive in one write
    ///
    /// Returns the number of rows matched. An empty list never reaches the store.
    pub async fn deactivate(&self, user_id: &str, tokens: &[String]) -> Result<u64, PushError> {
        if tokens.is_empty() {
            return Ok(0);
        }

        let rows = self.store.deactivate_tokens(user_id, tokens).await?;
        info!(
            user_id,
            requested = tokens.len(),
            rows,
            "Deactivated unregistered push tokens"
        );
        Ok(rows)
    }
}
