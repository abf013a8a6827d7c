// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp webhook routes: subscription handshake and inbound ingestion.
//!
//! The POST path feeds the same broadcaster as the realtime sessions, so an
//! inbound customer message shows up live on every open staff connection.
//! Payloads without an actionable message (status updates, receipts) are
//! acknowledged and dropped -- anything but HTTP 200 triggers provider
//! retry storms. Only persistence failures return 500.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use spout_core::types::MessageEvent;
use spout_whatsapp::{WebhookEnvelope, parse_inbound, verify_challenge};

use crate::server::GatewayState;

/// Query parameters of the provider's `GET /webhook` verification request.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub hub_mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub hub_verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub hub_challenge: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReceivedResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
}

/// `GET /webhook` -- subscription handshake.
///
/// Echoes the challenge (plain text, 200) only for `hub.mode=subscribe`
/// with the configured verification secret; 403 otherwise, including when
/// no secret is configured at all.
pub async fn verify(
    State(state): State<GatewayState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    let (Some(mode), Some(token), Some(challenge), Some(expected)) = (
        params.hub_mode.as_deref(),
        params.hub_verify_token.as_deref(),
        params.hub_challenge.as_deref(),
        state.webhook_verify_token.as_deref(),
    ) else {
        return StatusCode::FORBIDDEN.into_response();
    };

    match verify_challenge(mode, token, challenge, expected) {
        Some(echoed) => {
            info!("webhook subscription verified");
            (StatusCode::OK, echoed.to_string()).into_response()
        }
        None => {
            debug!("webhook verification rejected");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// `POST /webhook` -- inbound provider event.
pub async fn receive(
    State(state): State<GatewayState>,
    Json(envelope): Json<WebhookEnvelope>,
) -> Response {
    let event = match parse_inbound(&envelope) {
        Ok(event) => event,
        Err(failure) => {
            debug!(%failure, "webhook payload without actionable message, acknowledging");
            return (StatusCode::OK, Json(ReceivedResponse { status: "received" }))
                .into_response();
        }
    };

    let conversation_id = match state
        .store
        .resolve_or_create(&event.customer_id, &state.vendor_id)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            error!(customer_id = %event.customer_id, error = %e, "webhook conversation resolution failed");
            return internal_error();
        }
    };

    // The customer is the sender on this path.
    let msg = match state
        .store
        .append(
            &event.customer_id,
            &conversation_id,
            Some(event.customer_id.clone()),
            &event.body,
        )
        .await
    {
        Ok(msg) => msg,
        Err(e) => {
            error!(customer_id = %event.customer_id, error = %e, "webhook message persistence failed");
            return internal_error();
        }
    };

    let delivered = state
        .rooms
        .publish(&event.customer_id, &MessageEvent::from_message(&msg));
    debug!(
        customer_id = %event.customer_id,
        delivered, "inbound whatsapp message fanned out"
    );

    (StatusCode::OK, Json(ReceivedResponse { status: "received" })).into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal server error",
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_params_deserialize_from_dotted_keys() {
        let params: VerifyParams = serde_json::from_value(serde_json::json!({
            "hub.mode": "subscribe",
            "hub.verify_token": "secret",
            "hub.challenge": "abc123",
        }))
        .unwrap();
        assert_eq!(params.hub_mode.as_deref(), Some("subscribe"));
        assert_eq!(params.hub_verify_token.as_deref(), Some("secret"));
        assert_eq!(params.hub_challenge.as_deref(), Some("abc123"));
    }

    #[test]
    fn verify_params_tolerate_missing_keys() {
        let params: VerifyParams = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(params.hub_mode.is_none());
        assert!(params.hub_challenge.is_none());
    }

    #[test]
    fn received_response_shape() {
        let json = serde_json::to_string(&ReceivedResponse { status: "received" }).unwrap();
        assert_eq!(json, r#"{"status":"received"}"#);
    }
}
