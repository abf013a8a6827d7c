// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Spout chat backend.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Spout configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SpoutConfig {
    /// HTTP/WebSocket server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Identity of the vendor this deployment serves.
    #[serde(default)]
    pub vendor: VendorConfig,

    /// WhatsApp Business API settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// HTTP/WebSocket server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Vendor identity configuration.
///
/// The chat core serves exactly one vendor per deployment; the WhatsApp
/// phone number belongs to this vendor and every conversation created by
/// the realtime path is attributed to it.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VendorConfig {
    /// Vendor identifier stamped onto conversations created on first contact.
    #[serde(default = "default_vendor_id")]
    pub id: String,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            id: default_vendor_id(),
        }
    }
}

fn default_vendor_id() -> String {
    "default".to_string()
}

/// WhatsApp Business API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Graph API bearer token. `None` disables outbound delivery.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Business phone number id used in the send endpoint path.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// Secret echoed back during the webhook subscription handshake.
    #[serde(default)]
    pub verify_token: Option<String>,

    /// Graph API base URL. Overridable for tests.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Bound on every outbound provider call, in seconds.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            verify_token: None,
            api_base: default_api_base(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://graph.facebook.com/v20.0".to_string()
}

fn default_send_timeout_secs() -> u64 {
    5
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "spout.db".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
