// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses and coherent WhatsApp
//! credentials.

use thiserror::Error;

use crate::model::SpoutConfig;

/// A configuration error surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML or env var input failed to deserialize.
    #[error("config parse error: {message}")]
    Parse { message: String },

    /// A deserialized value failed a semantic check.
    #[error("config validation error: {message}")]
    Validation { message: String },
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or all collected validation
/// errors (does not fail fast).
pub fn validate_config(config: &SpoutConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("server.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.vendor.id.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "vendor.id must not be empty".to_string(),
        });
    }

    // Outbound delivery needs both halves of the credential pair.
    if config.whatsapp.access_token.is_some() && config.whatsapp.phone_number_id.is_none() {
        errors.push(ConfigError::Validation {
            message: "whatsapp.phone_number_id is required when whatsapp.access_token is set"
                .to_string(),
        });
    }

    if config.whatsapp.send_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "whatsapp.send_timeout_secs must be at least 1".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
