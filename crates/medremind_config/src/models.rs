// --- File: crates/medremind_config/src/models.rs ---

use serde::{Deserialize, Serialize};

/// Expo's public push endpoint.
pub const DEFAULT_GATEWAY_URL: &str = "https://exp.host/--/api/v2/push/send";

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8086,
        }
    }
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite:data/medremind.db, loaded via MEDREMIND__DATABASE__URL
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    /// Minimum level, e.g. "info" or "debug"
    #[serde(default)]
    pub level: Option<String>,
    /// When set, logs are additionally written to a daily rolling file in this directory
    #[serde(default)]
    pub directory: Option<String>,
}

// --- Push Gateway Config ---
// Holds the Expo push settings. The access token is a secret and should be
// provided as "secret_from_env" (MEDREMIND_SECRET_PUSH_ACCESS_TOKEN).
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PushConfig {
    /// Skip the gateway call entirely and treat every batch as sent
    #[serde(default)]
    pub dry_run: bool,

    /// Bearer credential for the gateway; no Authorization header when absent
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Upper bound for a single gateway request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per batch, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Maximum number of messages per gateway request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default)]
    pub sound: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

fn default_gateway_url() -> String {
    DEFAULT_GATEWAY_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    2
}

fn default_batch_size() -> usize {
    100
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            access_token: None,
            gateway_url: default_gateway_url(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            batch_size: default_batch_size(),
            sound: None,
            channel_id: None,
            priority: None,
        }
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_push: bool,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub push: Option<PushConfig>,
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}
