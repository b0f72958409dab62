//! Step definitions for dm_delivery.feature

use cucumber::{given, then, when};
use discord_relay::DirectMessage;

use crate::world::RelayWorld;

async fn post(world: &mut RelayWorld, key: Option<&str>, body: &str) {
    let client = reqwest::Client::new();
    let mut request = client
        .post(world.url("/api/send-dm"))
        .header("content-type", "application/json")
        .body(body.to_string());
    if let Some(key) = key {
        request = request.header("X-API-Key", key);
    }
    let response = request.send().await.unwrap();
    let status = response.status().as_u16();
    let text = response.text().await.unwrap();
    world.last_status = Some(status);
    world.statuses.push(status);
    world.last_body = serde_json::from_str(&text).ok();
}

#[given(expr = "Discord reports error code {int} for sends")]
fn discord_error_code(world: &mut RelayWorld, code: u64) {
    *world.discord.send_error_code.lock().unwrap() = Some(code);
}

#[when(expr = "a DM request is sent with key {string} and body {string}")]
async fn send_with_key(world: &mut RelayWorld, key: String, body: String) {
    post(world, Some(&key), &body).await;
}

#[when(expr = "a DM request is sent without a key and body {string}")]
async fn send_without_key(world: &mut RelayWorld, body: String) {
    post(world, None, &body).await;
}

#[when(expr = "{int} DM requests are sent with key {string}")]
async fn send_many(world: &mut RelayWorld, count: usize, key: String) {
    for _ in 0..count {
        post(world, Some(&key), r#"{"discord_id":"123","message":"hi"}"#).await;
    }
}

#[when("the health endpoint is requested")]
async fn health_requested(world: &mut RelayWorld) {
    let response = reqwest::get(world.url("/health")).await.unwrap();
    world.last_status = Some(response.status().as_u16());
    world.last_body = response.json().await.ok();
}

#[then(expr = "the response status is {int}")]
fn response_status(world: &mut RelayWorld, status: u16) {
    assert_eq!(world.last_status, Some(status), "body: {:?}", world.last_body);
}

#[then(expr = "the last {int} responses have status {int}")]
fn last_statuses(world: &mut RelayWorld, count: usize, status: u16) {
    let tail = &world.statuses[world.statuses.len() - count..];
    assert!(tail.iter().all(|s| *s == status), "statuses: {:?}", world.statuses);
}

#[then(expr = "the response error is {string}")]
fn response_error(world: &mut RelayWorld, error: String) {
    let body = world.last_body.as_ref().expect("no JSON body");
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], error.as_str());
}

#[then("the response reports success")]
fn response_success(world: &mut RelayWorld) {
    let body = world.last_body.as_ref().expect("no JSON body");
    assert_eq!(body["success"], true);
}

#[then(expr = "the health status is {string}")]
fn health_status(world: &mut RelayWorld, status: String) {
    let body = world.last_body.as_ref().expect("no JSON body");
    assert_eq!(body["status"], status.as_str());
}

#[then(expr = "Discord delivered the text {string} to user {string}")]
fn delivered_text(world: &mut RelayWorld, text: String, user: String) {
    let sent = world.discord.sent();
    assert_eq!(sent.len(), 1, "sent: {:?}", sent);
    assert_eq!(sent[0].0, user);
    assert_eq!(sent[0].1, DirectMessage::Text(text));
}

#[then(expr = "Discord delivered an embed titled {string} with color {string} to user {string}")]
fn delivered_embed(world: &mut RelayWorld, title: String, color: String, user: String) {
    let sent = world.discord.sent();
    assert_eq!(sent.len(), 1, "sent: {:?}", sent);
    assert_eq!(sent[0].0, user);
    match &sent[0].1 {
        DirectMessage::Embed { embed, .. } => {
            assert_eq!(embed.title.as_deref(), Some(title.as_str()));
            assert_eq!(embed.color, u32::from_str_radix(&color, 16).unwrap());
        }
        other => panic!("expected embed, got {:?}", other),
    }
}

#[then("Discord delivered nothing")]
fn delivered_nothing(world: &mut RelayWorld) {
    assert!(world.discord.sent().is_empty());
}
