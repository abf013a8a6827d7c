// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery through the WhatsApp Business (Graph) API.
//!
//! Every call is bounded by the configured request timeout. A timed-out or
//! unreachable provider comes back as `DeliveryOutcome::Transport`; the
//! realtime path logs it and carries on.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use spout_config::model::WhatsAppConfig;
use spout_core::traits::OutboundChannel;
use spout_core::types::DeliveryOutcome;
use spout_core::SpoutError;

#[derive(Clone)]
struct Credentials {
    access_token: String,
    phone_number_id: String,
}

/// Graph API client for sending text messages to customers.
pub struct WhatsAppClient {
    http: reqwest::Client,
    api_base: String,
    /// `None` when the deployment has no provider credentials; sends then
    /// come back as `Rejected` instead of hitting the network.
    credentials: Option<Credentials>,
}

impl WhatsAppClient {
    /// Build a client from configuration.
    pub fn from_config(config: &WhatsAppConfig) -> Result<Self, SpoutError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.send_timeout_secs))
            .build()
            .map_err(|e| SpoutError::Transport {
                message: "failed to build HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;

        let credentials = match (&config.access_token, &config.phone_number_id) {
            (Some(access_token), Some(phone_number_id)) => Some(Credentials {
                access_token: access_token.clone(),
                phone_number_id: phone_number_id.clone(),
            }),
            _ => None,
        };

        if credentials.is_none() {
            warn!("whatsapp credentials not configured, outbound delivery disabled");
        }

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            credentials,
        })
    }
}

#[async_trait]
impl OutboundChannel for WhatsAppClient {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn send_text(&self, customer_id: &str, body: &str) -> DeliveryOutcome {
        let Some(credentials) = &self.credentials else {
            return DeliveryOutcome::Rejected {
                reason: "missing credentials".to_string(),
            };
        };

        let url = format!("{}/{}/messages", self.api_base, credentials.phone_number_id);
        let payload = serde_json::json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": customer_id,
            "type": "text",
            "text": {"body": body},
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&credentials.access_token)
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                // Success body is {"messages": [{"id": "wamid..."}], ...}.
                let message_id = resp
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|v| v["messages"][0]["id"].as_str().map(str::to_string));
                debug!(to = customer_id, ?message_id, "whatsapp message delivered");
                DeliveryOutcome::Delivered { message_id }
            }
            Ok(resp) => {
                let status = resp.status();
                let detail = resp.text().await.unwrap_or_default();
                warn!(to = customer_id, %status, detail, "whatsapp send rejected");
                DeliveryOutcome::Rejected {
                    reason: format!("{status}: {detail}"),
                }
            }
            Err(e) => {
                warn!(to = customer_id, error = %e, "whatsapp send failed");
                DeliveryOutcome::Transport {
                    reason: e.to_string(),
                }
            }
        }
    }
}
