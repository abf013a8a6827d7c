// SPDX-FileCopyrightText: 2026 Spout Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete chat pipeline.
//!
//! Each test starts an isolated harness (temp SQLite, mock outbound
//! channel, gateway on an ephemeral port) and drives it over real HTTP and
//! WebSocket connections. Tests are independent and order-insensitive.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use spout_test_utils::TestHarness;
use spout_test_utils::harness::TEST_VERIFY_TOKEN;

type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn connect(harness: &TestHarness, customer_id: &str) -> WsClient {
    let (ws, _response) = connect_async(harness.ws_url(customer_id))
        .await
        .expect("websocket connect");
    ws
}

/// Read the next text frame as JSON, failing the test after two seconds.
async fn next_json(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket closed")
            .expect("socket error");
        match frame {
            WsMessage::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("frame is JSON");
            }
            WsMessage::Ping(_) | WsMessage::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Assert that no frame arrives within a short window.
async fn expect_silence(ws: &mut WsClient) {
    let result = tokio::time::timeout(Duration::from_millis(300), ws.next()).await;
    assert!(result.is_err(), "expected no frame, got {result:?}");
}

fn send_frame(body: serde_json::Value) -> WsMessage {
    WsMessage::Text(body.to_string().into())
}

/// Wait until `count` sessions are subscribed to the customer's room. The
/// server subscribes after the upgrade completes, so a test that publishes
/// right after connecting would otherwise race it.
async fn wait_for_subscribers(harness: &TestHarness, customer_id: &str, count: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while harness.rooms.subscriber_count(customer_id) < count {
        assert!(
            tokio::time::Instant::now() < deadline,
            "expected {count} subscribers for {customer_id}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn whatsapp_envelope(customer_id: &str, body: &str) -> serde_json::Value {
    serde_json::json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "106540352242922",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "contacts": [{
                        "profile": {"name": "Customer"},
                        "wa_id": customer_id
                    }],
                    "messages": [{
                        "from": customer_id,
                        "id": "wamid.TEST",
                        "timestamp": "1767225600",
                        "type": "text",
                        "text": {"body": body}
                    }]
                }
            }]
        }]
    })
}

// ---- Health ----

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let harness = TestHarness::start().await.unwrap();
    let response = reqwest::get(harness.http_url("/health")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

// ---- Webhook subscription handshake ----

#[tokio::test]
async fn webhook_challenge_is_echoed_for_valid_token() {
    let harness = TestHarness::start().await.unwrap();
    let url = format!(
        "{}?hub.mode=subscribe&hub.verify_token={TEST_VERIFY_TOKEN}&hub.challenge=abc123",
        harness.http_url("/webhook")
    );

    let response = reqwest::get(url).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "abc123");
}

#[tokio::test]
async fn webhook_challenge_is_rejected_for_wrong_token() {
    let harness = TestHarness::start().await.unwrap();
    let url = format!(
        "{}?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=abc123",
        harness.http_url("/webhook")
    );

    let response = reqwest::get(url).await.unwrap();
    assert_eq!(response.status(), 403);
}

// ---- Connect-time history replay ----

#[tokio::test]
async fn connect_replays_stored_history_oldest_first() {
    let harness = TestHarness::start().await.unwrap();
    let customer = "6591234567";

    // Two messages stored before anyone connects.
    let conversation = harness
        .store
        .resolve_or_create(customer, "vendor-test")
        .await
        .unwrap();
    harness
        .store
        .append(customer, &conversation, Some(customer.to_string()), "first stored")
        .await
        .unwrap();
    harness
        .store
        .append(customer, &conversation, Some("staff-1".to_string()), "second stored")
        .await
        .unwrap();

    let mut ws = connect(&harness, customer).await;

    let first = next_json(&mut ws).await;
    assert_eq!(first["message"], "first stored");
    assert_eq!(first["sender_id"], customer);

    let second = next_json(&mut ws).await;
    assert_eq!(second["message"], "second stored");
    assert_eq!(second["sender_id"], "staff-1");
    assert!(first["timestamp"].as_str().unwrap() < second["timestamp"].as_str().unwrap());

    // Exactly those two, nothing else.
    expect_silence(&mut ws).await;
}

// ---- Staff message round-trip ----

#[tokio::test]
async fn staff_message_reaches_both_connections_and_whatsapp_once() {
    let harness = TestHarness::start().await.unwrap();
    let customer = "6591234567";

    let mut ws_a = connect(&harness, customer).await;
    let mut ws_b = connect(&harness, customer).await;
    wait_for_subscribers(&harness, customer, 2).await;

    ws_a.send(send_frame(serde_json::json!({
        "message": "hi",
        "sender_id": "staff-1"
    })))
    .await
    .unwrap();

    // Both connections, including the sender, receive the broadcast.
    let frame_a = next_json(&mut ws_a).await;
    assert_eq!(frame_a["message"], "hi");
    assert_eq!(frame_a["sender_id"], "staff-1");
    assert!(frame_a["timestamp"].is_string());

    let frame_b = next_json(&mut ws_b).await;
    assert_eq!(frame_b["message"], "hi");

    // The channel adapter is invoked exactly once.
    harness
        .outbound
        .wait_for_sends(1, Duration::from_secs(2))
        .await;
    let sent = harness.outbound.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, customer);
    assert_eq!(sent[0].body, "hi");

    // And the message is durably in the log.
    let history = harness.store.history(customer).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].message, "hi");
}

// ---- Webhook ingestion round-trip ----

#[tokio::test]
async fn webhook_message_fans_out_to_the_right_room_only() {
    let harness = TestHarness::start().await.unwrap();
    let customer = "6591234567";
    let other = "6598880000";

    let mut ws_customer = connect(&harness, customer).await;
    let mut ws_other = connect(&harness, other).await;
    wait_for_subscribers(&harness, customer, 1).await;
    wait_for_subscribers(&harness, other, 1).await;

    let client = reqwest::Client::new();
    let response = client
        .post(harness.http_url("/webhook"))
        .json(&whatsapp_envelope(customer, "hello from whatsapp"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "received");

    // Delivered live to the customer's room, tagged with the customer as
    // sender.
    let frame = next_json(&mut ws_customer).await;
    assert_eq!(frame["message"], "hello from whatsapp");
    assert_eq!(frame["sender_id"], customer);

    // Not delivered to another customer's room.
    expect_silence(&mut ws_other).await;

    // Appended to the customer's history.
    let history = harness.store.history(customer).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].message, "hello from whatsapp");

    // Inbound webhook traffic is never echoed back out to the provider.
    assert_eq!(harness.outbound.sent_count().await, 0);
}

#[tokio::test]
async fn webhook_without_actionable_message_is_acknowledged() {
    let harness = TestHarness::start().await.unwrap();

    let client = reqwest::Client::new();
    // A status-update style envelope: parseable JSON, no text message.
    let response = client
        .post(harness.http_url("/webhook"))
        .json(&serde_json::json!({"entry": [{"changes": [{"value": {}}]}]}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "received");
}

// ---- Frame validation ----

#[tokio::test]
async fn empty_and_malformed_frames_are_rejected_without_side_effects() {
    let harness = TestHarness::start().await.unwrap();
    let customer = "6591234567";
    let mut ws = connect(&harness, customer).await;

    // Whitespace-only raw frame.
    ws.send(WsMessage::Text("   ".into())).await.unwrap();
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["error"], "received empty message");

    // Whitespace-only message body.
    ws.send(send_frame(serde_json::json!({"message": "   "})))
        .await
        .unwrap();
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["error"], "received empty message");

    // Unparsable JSON.
    ws.send(WsMessage::Text("not json".into())).await.unwrap();
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["error"], "invalid JSON format");

    // The connection survived all three rejections.
    ws.send(send_frame(serde_json::json!({"message": "still alive"})))
        .await
        .unwrap();
    let frame = next_json(&mut ws).await;
    assert_eq!(frame["message"], "still alive");

    // Rejected frames were never appended nor forwarded.
    let history = harness.store.history(customer).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].message, "still alive");
    harness
        .outbound
        .wait_for_sends(1, Duration::from_secs(2))
        .await;
    assert_eq!(harness.outbound.sent_count().await, 1);
}

// ---- Disconnect cleanup ----

#[tokio::test]
async fn disconnect_leaves_the_room() {
    let harness = TestHarness::start().await.unwrap();
    let customer = "6591234567";

    let mut ws = connect(&harness, customer).await;
    // Wait until the subscription is live before closing.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while harness.rooms.subscriber_count(customer) == 0 {
        assert!(tokio::time::Instant::now() < deadline, "never subscribed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    ws.close(None).await.unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while harness.rooms.subscriber_count(customer) != 0 {
        assert!(tokio::time::Instant::now() < deadline, "never unsubscribed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// ---- Conversation lifecycle over the realtime path ----

#[tokio::test]
async fn first_contact_creates_exactly_one_conversation() {
    let harness = TestHarness::start().await.unwrap();
    let customer = "6591234567";

    // Two staff sessions and one webhook message race on first contact.
    let _ws_a = connect(&harness, customer).await;
    let _ws_b = connect(&harness, customer).await;
    wait_for_subscribers(&harness, customer, 2).await;
    let client = reqwest::Client::new();
    client
        .post(harness.http_url("/webhook"))
        .json(&whatsapp_envelope(customer, "hello"))
        .send()
        .await
        .unwrap();

    let conversations = harness.store.list_by_vendor("vendor-test").await.unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].customer_id, customer);
    assert!(conversations[0].is_open);
}

// ---- Admin REST surface ----

#[tokio::test]
async fn conversation_admin_flow() {
    let harness = TestHarness::start().await.unwrap();
    let client = reqwest::Client::new();

    let conversation = harness
        .store
        .resolve_or_create("6591234567", "vendor-test")
        .await
        .unwrap();

    // Listing requires vendor_id.
    let response = client
        .get(harness.http_url("/v1/conversations"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = client
        .get(harness.http_url("/v1/conversations?vendor_id=vendor-test"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["conversations"].as_array().unwrap().len(), 1);

    // Assign a user without touching the team.
    let response = client
        .post(harness.http_url("/v1/conversations/assign"))
        .json(&serde_json::json!({
            "conversation_id": conversation,
            "assigned_user_id": "user-9"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Assignment without either field is rejected.
    let response = client
        .post(harness.http_url("/v1/conversations/assign"))
        .json(&serde_json::json!({"conversation_id": conversation}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Unknown conversation is a 404.
    let response = client
        .post(harness.http_url("/v1/conversations/assign"))
        .json(&serde_json::json!({
            "conversation_id": "missing",
            "assigned_user_id": "user-9"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // Collaborators: add dedups, remove filters.
    let response = client
        .post(harness.http_url("/v1/conversations/collaborators/add"))
        .json(&serde_json::json!({
            "conversation_id": conversation,
            "user_ids": ["a", "b", "a"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["colab_users"], serde_json::json!(["a", "b"]));

    let response = client
        .post(harness.http_url("/v1/conversations/collaborators/remove"))
        .json(&serde_json::json!({
            "conversation_id": conversation,
            "user_ids": ["a"]
        }))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["colab_users"], serde_json::json!(["b"]));

    // Bulk close tolerates missing ids.
    let response = client
        .put(harness.http_url("/v1/conversations/status"))
        .json(&serde_json::json!({
            "conversation_ids": [conversation, "missing"],
            "is_open": false
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["updated"], 1);

    let updated = harness.store.get(&conversation).await.unwrap().unwrap();
    assert!(!updated.is_open);
    assert_eq!(updated.assigned_user_id.as_deref(), Some("user-9"));
}

#[tokio::test]
async fn direct_send_uses_the_channel_adapter() {
    let harness = TestHarness::start().await.unwrap();
    let client = reqwest::Client::new();

    let response = client
        .post(harness.http_url("/v1/messages/send"))
        .json(&serde_json::json!({
            "phone_number": "6591234567",
            "text": "direct hello"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["delivery"], "delivered");

    let sent = harness.outbound.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "6591234567");
    assert_eq!(sent[0].body, "direct hello");

    // Missing fields are a 400 and never reach the adapter.
    let response = client
        .post(harness.http_url("/v1/messages/send"))
        .json(&serde_json::json!({"phone_number": "", "text": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(harness.outbound.sent_count().await, 1);
}
