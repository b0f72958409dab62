//! BDD step definitions for end-to-end delivery

use std::sync::Arc;

use cucumber::{given, then, when};
use whmcs_notifier::hooks;
use whmcs_notifier::platform::{CustomFieldValue, UserRecord};
use whmcs_notifier::{ConnectionStatus, NotificationPipeline, PipelineOutcome};

use crate::world::NotifierWorld;

fn pipeline(world: &NotifierWorld) -> NotificationPipeline {
    NotificationPipeline::new(
        world.config.clone(),
        Arc::new(world.platform.clone()),
        Arc::new(world.relay.clone()),
    )
}

#[given(expr = "the relay is configured at {string} with key {string}")]
fn relay_configured(world: &mut NotifierWorld, url: String, key: String) {
    world.config.relay.api_url = url;
    world.config.relay.api_key = key;
}

#[given(expr = "client {string} exists")]
fn client_exists(world: &mut NotifierWorld, client: String) {
    world.platform.clients.insert(
        client.clone(),
        UserRecord {
            id: client,
            ..UserRecord::default()
        },
    );
}

#[given(expr = "client {string} has custom field {string} set to {string}")]
fn client_custom_field(world: &mut NotifierWorld, client: String, name: String, value: String) {
    let fields = world.platform.discord_fields.entry(client).or_default();
    let field_id = fields.len() as u64 + 1;
    fields.push(CustomFieldValue {
        field_id,
        field_name: name,
        value,
    });
}

#[given(expr = "the relay responds with status {int}")]
fn relay_status(world: &mut NotifierWorld, status: u16) {
    world.relay.status = Some(status);
}

#[given("the relay is unreachable")]
fn relay_unreachable(world: &mut NotifierWorld) {
    world.relay.status = None;
}

#[given(expr = "the relay health endpoint answers {string}")]
fn relay_health(world: &mut NotifierWorld, body: String) {
    world.relay.health_body = body;
}

#[when("the event is processed")]
async fn process_event(world: &mut NotifierWorld) {
    let outcome = pipeline(world).process(&world.event()).await;
    world.outcome = Some(outcome);
}

#[given(expr = "the invoice-unpaid hook fires for invoice {string}")]
fn invoice_unpaid_hook(world: &mut NotifierWorld, invoice_id: String) {
    world.hook = Some(hooks::invoice_unpaid("billing.example.com", &invoice_id));
}

#[when("the hook notification is processed")]
async fn process_hook(world: &mut NotifierWorld) {
    let hook = world.hook.clone().expect("no hook fired");
    let outcome = hook.fire(&pipeline(world)).await;
    world.outcome = Some(outcome);
}

#[when("the relay connection is tested")]
async fn test_connection(world: &mut NotifierWorld) {
    let pipeline = pipeline(world);
    let status = pipeline.dispatcher().test_connection(&world.config.relay).await;
    world.connection = Some(status);
}

#[then(expr = "the outcome is {string}")]
fn outcome_is(world: &mut NotifierWorld, expected: String) {
    let outcome = world.outcome.as_ref().expect("event not processed");
    let matches = match expected.as_str() {
        "delivered" => *outcome == PipelineOutcome::Delivered,
        "soft failed" => matches!(outcome, PipelineOutcome::SoftFailed { .. }),
        "no user" => *outcome == PipelineOutcome::NoUser,
        "no client details" => *outcome == PipelineOutcome::NoClientDetails,
        "no contact" => *outcome == PipelineOutcome::NoContact,
        other => panic!("unknown outcome {}", other),
    };
    assert!(matches, "expected {}, got {:?}", expected, outcome);
}

#[then(expr = "the relay received a DM for {string}")]
fn relay_received(world: &mut NotifierWorld, discord_id: String) {
    let requests = world.relay.recorded();
    assert_eq!(requests.len(), 1, "requests: {:?}", requests);
    assert_eq!(requests[0]["discord_id"], discord_id.as_str());
}

#[then(expr = "the relay request used API key {string}")]
fn relay_api_key(world: &mut NotifierWorld, key: String) {
    let keys = world.relay.api_keys.lock().unwrap().clone();
    assert_eq!(keys, vec![key]);
}

#[then("the DM request carries an embed")]
fn dm_carries_embed(world: &mut NotifierWorld) {
    let requests = world.relay.recorded();
    assert_eq!(requests[0]["use_embed"], true);
    assert!(requests[0]["message"].is_null());
    assert!(requests[0]["embed_data"]["title"].is_string());
}

#[then(expr = "the DM embed is titled {string} with color {string}")]
fn dm_embed_title_color(world: &mut NotifierWorld, title: String, hex: String) {
    let requests = world.relay.recorded();
    let embed = &requests[0]["embed_data"];
    assert_eq!(embed["title"], title.as_str());
    let expected = u32::from_str_radix(&hex, 16).expect("hex color");
    assert_eq!(embed["color"], expected);
}

#[then("the relay received nothing")]
fn relay_received_nothing(world: &mut NotifierWorld) {
    assert!(world.relay.recorded().is_empty());
}

#[then("the connection test passes")]
fn connection_passes(world: &mut NotifierWorld) {
    assert_eq!(world.connection, Some(ConnectionStatus::Ok));
}

#[then(expr = "the connection test fails with {string}")]
fn connection_fails(world: &mut NotifierWorld, reason: String) {
    assert_eq!(world.connection, Some(ConnectionStatus::Failed(reason)));
}
