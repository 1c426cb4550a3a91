// --- File: crates/medremind_common/src/lib.rs ---

pub mod error; // Error handling
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod models; // Shared data structures

// Re-export error types and utilities for easier access
pub use error::{HttpStatusCode, MedremindError};

// Re-export HTTP utilities for easier access
pub use http::{client::create_client, map_json_error};

// Re-export logging utilities for easier access
pub use logging::{init_from_config, init_with_level};

pub use models::{DeviceRegistration, Platform};
