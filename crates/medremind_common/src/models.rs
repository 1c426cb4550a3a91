// --- File: crates/medremind_common/src/models.rs ---

// Data structures shared between the database layer and the push pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mobile platform a push token was issued on
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "ANDROID",
            Platform::Ios => "IOS",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ANDROID" => Ok(Platform::Android),
            "IOS" => Ok(Platform::Ios),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

/// Represents a device registration
///
/// Associates a user with a platform and a push token. A push token is unique
/// across all registrations; rows are never hard-deleted by the push pipeline,
/// only flipped to inactive.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRegistration {
    /// The unique identifier for this registration
    pub id: Option<i64>,

    /// The user owning this device
    pub user_id: String,

    pub platform: Platform,

    /// Opaque push token as issued to the device
    pub push_token: String,

    /// Inactive registrations are skipped by every dispatch
    pub active: bool,

    /// The timestamp when this registration was created
    pub created_at: Option<DateTime<Utc>>,

    /// The timestamp when this registration was last updated
    pub updated_at: Option<DateTime<Utc>>,
}

impl DeviceRegistration {
    /// Create a new, active device registration
    pub fn new(user_id: String, platform: Platform, push_token: String) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            user_id,
            platform,
            push_token,
            active: true,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}
