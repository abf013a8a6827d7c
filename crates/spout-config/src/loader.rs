// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./spout.toml` > `~/.config/spout/spout.toml`
//! > `/etc/spout/spout.toml`, with environment variable overrides via the
//! `SPOUT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SpoutConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/spout/spout.toml` (system-wide)
/// 3. `~/.config/spout/spout.toml` (user XDG config)
/// 4. `./spout.toml` (local directory)
/// 5. `SPOUT_*` environment variables
pub fn load_config() -> Result<SpoutConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SpoutConfig::default()))
        .merge(Toml::file("/etc/spout/spout.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("spout/spout.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("spout.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<SpoutConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SpoutConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SpoutConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SpoutConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `SPOUT_WHATSAPP_VERIFY_TOKEN` must map
/// to `whatsapp.verify_token`, not `whatsapp.verify.token`.
fn env_provider() -> Env {
    Env::prefixed("SPOUT_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: SPOUT_WHATSAPP_ACCESS_TOKEN -> "whatsapp_access_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("vendor_", "vendor.", 1)
            .replacen("whatsapp_", "whatsapp.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("log_", "log.", 1);
        mapped.into()
    })
}
