// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for conversation administration and direct sends.
//!
//! These are the thin Directory-facing endpoints: the caller supplies
//! vendor/user/team identifiers, the handlers validate and delegate to the
//! store. Authorization itself lives with the external Directory service.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use spout_core::SpoutError;
use spout_core::types::{Conversation, DeliveryOutcome};

use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Success response carrying a human-readable message.
#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub message: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Query parameters for GET /v1/conversations.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub vendor_id: Option<String>,
}

/// Response body for GET /v1/conversations.
#[derive(Debug, Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<Conversation>,
}

/// GET /v1/conversations?vendor_id=...
pub async fn list_conversations(
    State(state): State<GatewayState>,
    Query(params): Query<ListParams>,
) -> Response {
    let Some(vendor_id) = params.vendor_id.filter(|v| !v.trim().is_empty()) else {
        return bad_request("vendor_id is required");
    };

    match state.store.list_by_vendor(&vendor_id).await {
        Ok(conversations) => {
            (StatusCode::OK, Json(ConversationListResponse { conversations })).into_response()
        }
        Err(e) => store_error(e),
    }
}

/// Request body for POST /v1/conversations/assign.
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub conversation_id: String,
    #[serde(default)]
    pub assigned_user_id: Option<String>,
    #[serde(default)]
    pub assigned_team_id: Option<String>,
}

/// POST /v1/conversations/assign
///
/// Sets whichever of user/team is provided, leaving the other untouched.
pub async fn assign_conversation(
    State(state): State<GatewayState>,
    Json(body): Json<AssignRequest>,
) -> Response {
    if body.conversation_id.trim().is_empty()
        || (body.assigned_user_id.is_none() && body.assigned_team_id.is_none())
    {
        return bad_request(
            "conversation_id is required and at least one of assigned_user_id or \
             assigned_team_id must be provided",
        );
    }

    match state
        .store
        .assign(
            &body.conversation_id,
            body.assigned_user_id,
            body.assigned_team_id,
        )
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(StatusMessage {
                message: "user and/or team assigned successfully".to_string(),
            }),
        )
            .into_response(),
        Err(e) => store_error(e),
    }
}

/// Request body for the collaborator endpoints.
#[derive(Debug, Deserialize)]
pub struct CollaboratorsRequest {
    pub conversation_id: String,
    #[serde(default)]
    pub user_ids: Vec<String>,
}

/// Response body for the collaborator endpoints.
#[derive(Debug, Serialize)]
pub struct CollaboratorsResponse {
    pub colab_users: Vec<String>,
}

/// POST /v1/conversations/collaborators/add
pub async fn add_collaborators(
    State(state): State<GatewayState>,
    Json(body): Json<CollaboratorsRequest>,
) -> Response {
    if body.conversation_id.trim().is_empty() {
        return bad_request("conversation_id is required");
    }

    match state
        .store
        .add_collaborators(&body.conversation_id, body.user_ids)
        .await
    {
        Ok(colab_users) => {
            (StatusCode::OK, Json(CollaboratorsResponse { colab_users })).into_response()
        }
        Err(e) => store_error(e),
    }
}

/// POST /v1/conversations/collaborators/remove
pub async fn remove_collaborators(
    State(state): State<GatewayState>,
    Json(body): Json<CollaboratorsRequest>,
) -> Response {
    if body.conversation_id.trim().is_empty() {
        return bad_request("conversation_id is required");
    }

    match state
        .store
        .remove_collaborators(&body.conversation_id, body.user_ids)
        .await
    {
        Ok(colab_users) => {
            (StatusCode::OK, Json(CollaboratorsResponse { colab_users })).into_response()
        }
        Err(e) => store_error(e),
    }
}

/// Request body for PUT /v1/conversations/status.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub conversation_ids: Vec<String>,
    pub is_open: bool,
}

/// Response body for PUT /v1/conversations/status.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub updated: usize,
}

/// PUT /v1/conversations/status
///
/// Bulk open/close. Ids that do not exist are skipped; the rest still flip.
pub async fn set_conversation_status(
    State(state): State<GatewayState>,
    Json(body): Json<StatusRequest>,
) -> Response {
    if body.conversation_ids.is_empty() {
        return bad_request("conversation_ids must be provided");
    }

    match state
        .store
        .set_open_status(body.conversation_ids, body.is_open)
        .await
    {
        Ok(updated) => (StatusCode::OK, Json(StatusResponse { updated })).into_response(),
        Err(e) => store_error(e),
    }
}

/// Request body for POST /v1/messages/send.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub phone_number: String,
    pub text: String,
}

/// Response body for POST /v1/messages/send.
#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub delivery: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// POST /v1/messages/send
///
/// Direct outbound delivery to a customer, outside any realtime session.
pub async fn send_to_customer(
    State(state): State<GatewayState>,
    Json(body): Json<SendRequest>,
) -> Response {
    if body.phone_number.trim().is_empty() || body.text.trim().is_empty() {
        return bad_request("phone_number and text are required");
    }

    let outcome = state.outbound.send_text(&body.phone_number, &body.text).await;
    let response = match outcome {
        DeliveryOutcome::Delivered { message_id } => SendResponse {
            delivery: "delivered",
            detail: message_id,
        },
        DeliveryOutcome::Rejected { reason } => {
            warn!(to = %body.phone_number, %reason, "direct send rejected");
            SendResponse {
                delivery: "rejected",
                detail: Some(reason),
            }
        }
        DeliveryOutcome::Transport { reason } => {
            warn!(to = %body.phone_number, %reason, "direct send transport failure");
            SendResponse {
                delivery: "transport_error",
                detail: Some(reason),
            }
        }
    };

    (StatusCode::OK, Json(response)).into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Map store-layer failures onto the HTTP surface.
fn store_error(err: SpoutError) -> Response {
    match err {
        SpoutError::ConversationNotFound { id } => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("conversation not found: {id}"),
            }),
        )
            .into_response(),
        SpoutError::Validation(message) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: message }),
        )
            .into_response(),
        other => {
            warn!(error = %other, "store operation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal server error".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_request_deserializes_partial_fields() {
        let json = r#"{"conversation_id": "c-1", "assigned_user_id": "u-1"}"#;
        let req: AssignRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.conversation_id, "c-1");
        assert_eq!(req.assigned_user_id.as_deref(), Some("u-1"));
        assert!(req.assigned_team_id.is_none());
    }

    #[test]
    fn collaborators_request_defaults_to_empty_list() {
        let json = r#"{"conversation_id": "c-1"}"#;
        let req: CollaboratorsRequest = serde_json::from_str(json).unwrap();
        assert!(req.user_ids.is_empty());
    }

    #[test]
    fn status_request_requires_both_fields() {
        let json = r#"{"conversation_ids": ["c-1"], "is_open": false}"#;
        let req: StatusRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.conversation_ids, vec!["c-1"]);
        assert!(!req.is_open);

        let missing = serde_json::from_str::<StatusRequest>(r#"{"conversation_ids": []}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn send_response_omits_detail_when_absent() {
        let json = serde_json::to_string(&SendResponse {
            delivery: "delivered",
            detail: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"delivery":"delivered"}"#);
    }

    #[test]
    fn error_response_serializes() {
        let json = serde_json::to_string(&ErrorResponse {
            error: "vendor_id is required".to_string(),
        })
        .unwrap();
        assert!(json.contains("vendor_id is required"));
    }
}
