//! Alarm dispatch orchestration
//!
//! [`PushService::send_alarm`] runs the whole pipeline for one user: load
//! registrations, keep the eligible Expo tokens, send through the retried
//! batch sender, classify tickets and deactivate unregistered tokens.
//! Deactivation is best effort; its failure never fails a dispatch whose
//! messages were accepted by the gateway.

use crate::client::{ExpoClient, PushTransport};
use crate::deactivation::DeactivationWriter;
use crate::error::PushError;
use crate::models::{AlarmNotification, DeviceRegistration, DispatchReport, ExpoMessage, Platform};
use crate::receipts::{process_tickets, ReceiptSummary};
use crate::retry::RetryPolicy;
use crate::sender::{BatchSender, SendOutcome};
use crate::token_filter::{is_expo_push_token, select_tokens};
use medremind_config::PushConfig;
use medremind_db::{
    DbClient, DeviceRegistrationRepository, DeviceRegistrationRepositoryFactory, RepositoryFactory,
    SqlDeviceRegistrationRepository,
};
use tracing::{debug, info, instrument, warn};

/// Defaults applied to every outbound message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct MessageDefaults {
    sound: Option<String>,
    priority: Option<String>,
    channel_id: Option<String>,
}

pub struct PushService<S, T> {
    store: S,
    sender: BatchSender<T>,
    defaults: MessageDefaults,
    dry_run: bool,
}

/// The service as wired in production
pub type LivePushService = PushService<SqlDeviceRegistrationRepository, ExpoClient>;

impl<S, T> PushService<S, T>
where
    S: DeviceRegistrationRepository + Send + Sync,
    T: PushTransport,
{
    pub fn new(config: &PushConfig, store: S, transport: T) -> Self {
        let retry = RetryPolicy::new(config.max_attempts);
        let sender = BatchSender::new(transport, retry)
            .dry_run(config.dry_run)
            .batch_size(config.batch_size);

        Self {
            store,
            sender,
            defaults: MessageDefaults {
                sound: config.sound.clone(),
                priority: config.priority.clone(),
                channel_id: config.channel_id.clone(),
            },
            dry_run: config.dry_run,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transport(&self) -> &T {
        self.sender.transport()
    }

    /// Delivers `alarm` to every active Expo device of `user_id`
    ///
    /// A user without eligible tokens yields an empty report and no gateway
    /// call. Per-token rejections are reported in the outcomes, not as errors.
    ///
    /// # Errors
    ///
    /// Fails when the registrations cannot be read, or when a gateway call
    /// fails after the retry budget. When the first batch fails nothing is
    /// deactivated. When a later batch fails, unregistered tokens reported by
    /// the batches already accepted are deactivated before the error returns.
    #[instrument(skip(self, alarm), fields(event_id = %alarm.event_id))]
    pub async fn send_alarm(
        &self,
        user_id: &str,
        alarm: &AlarmNotification,
    ) -> Result<DispatchReport, PushError> {
        let mut report = DispatchReport {
            user_id: user_id.to_string(),
            event_id: alarm.event_id.clone(),
            dry_run: self.dry_run,
            ..DispatchReport::default()
        };

        let registrations = self.store.find_by_user(user_id).await?;
        let selection = select_tokens(&registrations);
        if selection.foreign > 0 {
            debug!(
                skipped = selection.foreign,
                "Skipping registrations with non-Expo push tokens"
            );
        }
        if selection.is_empty() {
            info!(
                registrations = registrations.len(),
                "No eligible push tokens, nothing to send"
            );
            return Ok(report);
        }

        let messages = self.build_messages(&selection.eligible, alarm);
        report.attempted = messages.len();

        let (batches, failure) = match self.sender.send(&messages).await? {
            SendOutcome::DryRun => return Ok(report),
            SendOutcome::Sent { batches, failure } => (batches, failure),
        };

        let mut summary = ReceiptSummary::default();
        for batch in &batches {
            summary.merge(process_tickets(
                &selection.eligible[batch.range.clone()],
                &batch.tickets,
            ));
        }
        report.delivered = summary.delivered();
        report.failed = summary.failed();

        // tokens reported unregistered by accepted batches are dead regardless of later batches
        self.deactivate_unregistered(user_id, &summary.to_deactivate, &mut report)
            .await;

        if let Some(err) = failure {
            warn!(
                delivered = report.delivered,
                deactivated = report.deactivated,
                "Alarm only partly dispatched: {}",
                err
            );
            return Err(err);
        }

        report.outcomes = summary.outcomes;
        info!(
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failed,
            deactivated = report.deactivated,
            "Alarm dispatched"
        );
        Ok(report)
    }

    async fn deactivate_unregistered(
        &self,
        user_id: &str,
        tokens: &[String],
        report: &mut DispatchReport,
    ) {
        match DeactivationWriter::new(&self.store).deactivate(user_id, tokens).await {
            Ok(rows) => report.deactivated = rows as usize,
            Err(err) => {
                warn!("Failed to deactivate unregistered tokens: {}", err);
                report.deactivation_error = Some(err.to_string());
            }
        }
    }

    /// Registers (or reassigns) a push token for a user
    ///
    /// Tokens in a foreign format are stored too; they are only skipped at dispatch.
    pub async fn register_device(
        &self,
        user_id: &str,
        platform: Platform,
        push_token: &str,
    ) -> Result<DeviceRegistration, PushError> {
        let user_id = require("user_id", user_id)?;
        let push_token = require("push_token", push_token)?;
        if !is_expo_push_token(push_token) {
            debug!(user_id, "Registering a push token that is not an Expo token");
        }

        Ok(self.store.register_device(user_id, platform, push_token).await?)
    }

    /// Soft-unregisters a token; returns `false` if the user holds no such token
    pub async fn unregister_device(&self, user_id: &str, push_token: &str) -> Result<bool, PushError> {
        let user_id = require("user_id", user_id)?;
        let push_token = require("push_token", push_token)?;

        Ok(self.store.unregister_device(user_id, push_token).await?)
    }

    fn build_messages(&self, tokens: &[String], alarm: &AlarmNotification) -> Vec<ExpoMessage> {
        let data = alarm.payload();
        tokens
            .iter()
            .map(|token| ExpoMessage {
                to: token.clone(),
                title: Some(alarm.title.clone()),
                body: Some(alarm.body.clone()),
                data: Some(data.clone()),
                sound: self.defaults.sound.clone(),
                priority: self.defaults.priority.clone(),
                channel_id: self.defaults.channel_id.clone(),
            })
            .collect()
    }
}

fn require<'a>(field: &str, value: &'a str) -> Result<&'a str, PushError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PushError::InvalidRequest(format!("{} must not be empty", field)));
    }
    Ok(trimmed)
}

impl LivePushService {
    /// Builds the production service on an already initialised database client
    pub fn from_config(config: &PushConfig, db_client: DbClient) -> Result<Self, PushError> {
        let store = DeviceRegistrationRepositoryFactory::new().create_repository(db_client);
        let transport = ExpoClient::new(config)?;
        Ok(Self::new(config, store, transport))
    }
}
