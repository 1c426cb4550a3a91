use medremind_common::MedremindError;
use medremind_config::AppConfig;
use medremind_db::{DbClient, DbError, DeviceRegistrationRepository};
use medremind_push::{LivePushService, PushError};
use std::sync::Arc;
use tracing::info;

/// Application state shared by the routers.
///
/// Everything that needs I/O to construct (the database pool, the schema,
/// the gateway client) is built here once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,

    /// Present when `use_push` is enabled
    pub push: Option<Arc<LivePushService>>,
}

impl AppState {
    pub async fn new(config: Arc<AppConfig>) -> Result<Self, MedremindError> {
        let push = if config.use_push {
            Some(Arc::new(build_push_service(&config).await?))
        } else {
            info!("Push delivery disabled (use_push = false)");
            None
        };

        Ok(Self { config, push })
    }
}

async fn build_push_service(config: &AppConfig) -> Result<LivePushService, PushError> {
    let push_config = config.push.clone().unwrap_or_default();
    if push_config.dry_run {
        info!("Push delivery runs in dry-run mode, nothing will be sent");
    }

    let db_client = DbClient::new(config).await?;
    if !db_client.is_healthy().await {
        return Err(DbError::PoolError("database does not answer queries".to_string()).into());
    }
    let service = LivePushService::from_config(&push_config, db_client)?;
    service.store().init_schema().await?;

    info!("Push service initialized, gateway: {}", push_config.gateway_url);
    Ok(service)
}
