// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhook payload parsing and the subscription handshake.
//!
//! The provider posts a deeply nested envelope
//! (`entry[0].changes[0].value.contacts[0].wa_id`,
//! `...messages[0].text.body`). Every level is optional here: status
//! updates, read receipts, and media-only events all arrive on the same
//! route, so absence of the text path is an expected outcome, never a
//! crash. [`parse_inbound`] is total and reports which level was missing.

use serde::{Deserialize, Serialize};

use spout_core::types::InboundEvent;

/// Top-level webhook POST body.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookEnvelope {
    pub object: Option<String>,
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookEntry {
    pub id: Option<String>,
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookChange {
    pub field: Option<String>,
    pub value: Option<WebhookValue>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookValue {
    pub messaging_product: Option<String>,
    pub contacts: Vec<WebhookContact>,
    pub messages: Vec<WebhookIncomingMessage>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookContact {
    /// The customer's WhatsApp identity (phone number). Becomes
    /// `customer_id` in the chat core.
    pub wa_id: Option<String>,
    pub profile: Option<WebhookProfile>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookProfile {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookIncomingMessage {
    pub from: Option<String>,
    pub id: Option<String>,
    pub timestamp: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub text: Option<WebhookText>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookText {
    pub body: Option<String>,
}

/// A webhook payload that did not carry an actionable text message.
///
/// Acknowledged with HTTP 200 by the caller, never propagated as a server
/// error -- the provider retries on anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    /// The first path segment that was absent.
    pub missing: &'static str,
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "webhook payload missing {}", self.missing)
    }
}

impl std::error::Error for ParseFailure {}

/// Extract the customer identity and message text from a webhook envelope.
pub fn parse_inbound(envelope: &WebhookEnvelope) -> Result<InboundEvent, ParseFailure> {
    let entry = envelope.entry.first().ok_or(ParseFailure { missing: "entry[0]" })?;
    let change = entry.changes.first().ok_or(ParseFailure {
        missing: "entry[0].changes[0]",
    })?;
    let value = change.value.as_ref().ok_or(ParseFailure {
        missing: "entry[0].changes[0].value",
    })?;

    let customer_id = value
        .contacts
        .first()
        .and_then(|contact| contact.wa_id.as_ref())
        .ok_or(ParseFailure {
            missing: "entry[0].changes[0].value.contacts[0].wa_id",
        })?;

    let body = value
        .messages
        .first()
        .and_then(|msg| msg.text.as_ref())
        .and_then(|text| text.body.as_ref())
        .ok_or(ParseFailure {
            missing: "entry[0].changes[0].value.messages[0].text.body",
        })?;

    Ok(InboundEvent {
        customer_id: customer_id.clone(),
        body: body.clone(),
    })
}

/// Subscription handshake: echo the challenge only for a `subscribe`
/// request carrying the configured verification secret.
pub fn verify_challenge<'a>(
    mode: &str,
    token: &str,
    challenge: &'a str,
    expected_token: &str,
) -> Option<&'a str> {
    (mode == "subscribe" && token == expected_token).then_some(challenge)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The full provider envelope shape, as documented for text messages.
    fn full_payload() -> WebhookEnvelope {
        serde_json::from_value(serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "106540352242922",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "contacts": [{
                            "profile": {"name": "Lee"},
                            "wa_id": "6591234567"
                        }],
                        "messages": [{
                            "from": "6591234567",
                            "id": "wamid.HBgK",
                            "timestamp": "1767225600",
                            "type": "text",
                            "text": {"body": "hello from whatsapp"}
                        }]
                    }
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn full_payload_parses() {
        let event = parse_inbound(&full_payload()).unwrap();
        assert_eq!(event.customer_id, "6591234567");
        assert_eq!(event.body, "hello from whatsapp");
    }

    #[test]
    fn empty_envelope_is_a_parse_failure() {
        let envelope = WebhookEnvelope::default();
        let failure = parse_inbound(&envelope).unwrap_err();
        assert_eq!(failure.missing, "entry[0]");
    }

    #[test]
    fn missing_contact_is_a_parse_failure() {
        let mut envelope = full_payload();
        envelope.entry[0].changes[0].value.as_mut().unwrap().contacts.clear();
        let failure = parse_inbound(&envelope).unwrap_err();
        assert!(failure.missing.ends_with("wa_id"));
    }

    #[test]
    fn status_update_without_text_is_a_parse_failure() {
        // Delivery status events carry no messages array.
        let mut envelope = full_payload();
        envelope.entry[0].changes[0].value.as_mut().unwrap().messages.clear();
        let failure = parse_inbound(&envelope).unwrap_err();
        assert!(failure.missing.ends_with("text.body"));
    }

    #[test]
    fn media_message_without_text_body_is_a_parse_failure() {
        let mut envelope = full_payload();
        envelope.entry[0].changes[0].value.as_mut().unwrap().messages[0].text = None;
        let failure = parse_inbound(&envelope).unwrap_err();
        assert!(failure.missing.ends_with("text.body"));
    }

    #[test]
    fn arbitrary_json_object_deserializes_without_panicking() {
        let envelope: WebhookEnvelope =
            serde_json::from_value(serde_json::json!({"entry": [{"changes": [{}]}]})).unwrap();
        let failure = parse_inbound(&envelope).unwrap_err();
        assert_eq!(failure.missing, "entry[0].changes[0].value");
    }

    #[test]
    fn challenge_echoed_for_valid_subscribe() {
        let echoed = verify_challenge("subscribe", "hook-secret", "abc123", "hook-secret");
        assert_eq!(echoed, Some("abc123"));
    }

    #[test]
    fn challenge_rejected_for_wrong_token() {
        assert_eq!(
            verify_challenge("subscribe", "wrong", "abc123", "hook-secret"),
            None
        );
    }

    #[test]
    fn challenge_rejected_for_wrong_mode() {
        assert_eq!(
            verify_challenge("unsubscribe", "hook-secret", "abc123", "hook-secret"),
            None
        );
    }
}
