//! HTTP handlers for device registration and alarm dispatch
//!
//! Thin axum adapters over [`LivePushService`]. Failures are logged and
//! rendered through [`MedremindError`] so every endpoint answers with the
//! same JSON error shape.

use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use medremind_common::{map_json_error, MedremindError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::PushError;
use crate::models::{AlarmNotification, DeviceRegistration, DispatchReport, Platform};
use crate::service::LivePushService;

/// Request body for registering a device
#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RegisterDeviceRequest {
    pub user_id: String,

    /// `ANDROID` or `IOS`, case-insensitive
    pub platform: String,

    /// Push token issued to the device, usually `ExponentPushToken[...]`
    pub push_token: String,
}

/// Request body for unregistering a device
#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UnregisterDeviceRequest {
    pub user_id: String,
    pub push_token: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UnregisterDeviceResponse {
    /// Whether a registration owned by the user matched
    pub unregistered: bool,
}

/// Request body for sending an alarm to all devices of a user
#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SendAlarmRequest {
    pub user_id: String,

    /// Reminder or SOS event id, echoed to the app as `eventId`
    pub event_id: String,
    pub title: String,
    pub body: String,

    /// Extra data delivered with the notification
    pub data: Option<Value>,
}

fn to_http_error(context: &str, err: PushError) -> MedremindError {
    error!("{}: {}", context, err);
    MedremindError::from(err)
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/push/register-device",
    request_body = RegisterDeviceRequest,
    responses(
        (status = 200, description = "Device registered", body = DeviceRegistration),
        (status = 400, description = "Bad Request"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Push"
))]
pub async fn register_device_handler(
    State(service): State<Arc<LivePushService>>,
    Json(payload): Json<RegisterDeviceRequest>,
) -> Result<Json<DeviceRegistration>, Response> {
    debug!("Registering device for user: {}", payload.user_id);

    let platform: Platform = payload
        .platform
        .parse()
        .map_err(|e: String| MedremindError::ValidationError(e).into_response())?;

    let result = service
        .register_device(&payload.user_id, platform, &payload.push_token)
        .await;
    if let Ok(registration) = &result {
        info!(
            "Registered {} device for user: {}",
            registration.platform, registration.user_id
        );
    }
    map_json_error(result, |e| to_http_error("Failed to register device", e))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/push/unregister-device",
    request_body = UnregisterDeviceRequest,
    responses(
        (status = 200, description = "Device unregistered, or nothing matched", body = UnregisterDeviceResponse),
        (status = 400, description = "Bad Request"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Push"
))]
pub async fn unregister_device_handler(
    State(service): State<Arc<LivePushService>>,
    Json(payload): Json<UnregisterDeviceRequest>,
) -> Result<Json<UnregisterDeviceResponse>, Response> {
    debug!("Unregistering device for user: {}", payload.user_id);

    let result = service
        .unregister_device(&payload.user_id, &payload.push_token)
        .await
        .map(|unregistered| UnregisterDeviceResponse { unregistered });
    map_json_error(result, |e| to_http_error("Failed to unregister device", e))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/push/send-alarm",
    request_body = SendAlarmRequest,
    responses(
        (status = 200, description = "Alarm dispatched; per-device results in the report", body = DispatchReport),
        (status = 400, description = "Bad Request"),
        (status = 502, description = "Push gateway unreachable or rejected the request"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Push"
))]
pub async fn send_alarm_handler(
    State(service): State<Arc<LivePushService>>,
    Json(payload): Json<SendAlarmRequest>,
) -> Result<Json<DispatchReport>, Response> {
    if payload.user_id.trim().is_empty() || payload.event_id.trim().is_empty() {
        return Err(to_http_error(
            "Rejected alarm",
            PushError::InvalidRequest("user_id and event_id are required".to_string()),
        )
        .into_response());
    }

    let mut alarm = AlarmNotification::new(payload.event_id, payload.title, payload.body);
    if let Some(data) = payload.data {
        alarm = alarm.with_data(data);
    }

    let result = service.send_alarm(payload.user_id.trim(), &alarm).await;
    map_json_error(result, |e| to_http_error("Failed to send alarm", e))
}
