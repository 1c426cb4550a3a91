//! Wire and report types for the push pipeline
//!
//! [`ExpoMessage`] and [`ExpoPushResponse`] mirror the Expo push API. The
//! gateway answers with one ticket per message, in request order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use medremind_common::models::{DeviceRegistration, Platform};

/// Ticket error code meaning the device token is permanently invalid
pub const DEVICE_NOT_REGISTERED: &str = "DeviceNotRegistered";

/// One outbound message, addressed to a single push token
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpoMessage {
    pub to: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Arbitrary JSON delivered to the app alongside the notification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    /// Android notification channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

/// Body returned by the gateway for a batch send
#[derive(Debug, Clone, Deserialize)]
pub struct ExpoPushResponse {
    #[serde(default)]
    pub data: Vec<PushTicket>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Ok,
    Error,
    #[serde(other)]
    Unknown,
}

/// Per-message result of a batch send
#[derive(Debug, Clone, Deserialize)]
pub struct PushTicket {
    pub status: TicketStatus,

    /// Receipt id, present on `ok` tickets
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub details: Option<TicketDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketDetails {
    #[serde(default)]
    pub error: Option<String>,
}

impl PushTicket {
    /// The gateway's error code, if any
    pub fn error_code(&self) -> Option<&str> {
        self.details.as_ref().and_then(|d| d.error.as_deref())
    }
}

/// The alarm a caller wants delivered to every device of a user
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmNotification {
    /// Reminder or SOS event the notification is about
    pub event_id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl AlarmNotification {
    pub fn new(event_id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            title: title.into(),
            body: body.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Data payload sent to the app, always carrying `eventId`
    pub fn payload(&self) -> Value {
        let mut map = match &self.data {
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                let mut map = Map::new();
                map.insert("payload".to_string(), other.clone());
                map
            }
            None => Map::new(),
        };
        map.entry("eventId".to_string())
            .or_insert_with(|| Value::String(self.event_id.clone()));
        Value::Object(map)
    }
}

/// Classification of one token's delivery
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Delivered,
    /// The device registration is no longer valid and gets deactivated
    PermanentFailure { error: String },
    /// Rejected for a reason that is not the device's fault
    Failed { error: Option<String> },
}

/// Result of one dispatch for a single token
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub token: String,
    #[serde(flatten)]
    pub status: DeliveryStatus,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        self.status == DeliveryStatus::Delivered
    }
}

/// Summary of one `send_alarm` call, for logging and the HTTP surface
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchReport {
    pub user_id: String,
    pub event_id: String,
    pub dry_run: bool,
    /// Number of tokens a message was addressed to
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Registrations flipped inactive after this dispatch
    pub deactivated: usize,
    /// Set when the best-effort deactivation write failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivation_error: Option<String>,
    pub outcomes: Vec<DeliveryOutcome>,
}
