use axum::{routing::post, Router};
use std::sync::Arc;
use tracing::info;

use crate::handlers::{register_device_handler, send_alarm_handler, unregister_device_handler};
use crate::service::LivePushService;

/// Create the push API routes
///
/// The service is built once at startup (database and gateway client
/// included) and shared by all handlers.
pub fn routes(service: Arc<LivePushService>) -> Router {
    info!("Push routes initialized");

    Router::new()
        .route("/push/register-device", post(register_device_handler))
        .route("/push/unregister-device", post(unregister_device_handler))
        .route("/push/send-alarm", post(send_alarm_handler))
        .with_state(service)
}
