//! Step definitions for relay_lifecycle.feature

use std::sync::atomic::Ordering;
use std::sync::Arc;

use cucumber::{given, then, when};
use discord_relay::RelayBuilder;

use crate::world::RelayWorld;

// ============================================================================
// Given steps
// ============================================================================

#[given(expr = "a relay with API key {string}")]
fn relay_with_key(world: &mut RelayWorld, key: String) {
    world.config.api_key = key;
}

#[given(expr = "the rate limit is {int} requests per window")]
fn rate_limit(world: &mut RelayWorld, max_requests: usize) {
    world.config.rate_limit.max_requests = max_requests;
}

#[given("Discord rejects the bot token")]
fn discord_rejects_token(world: &mut RelayWorld) {
    world.discord.reject_login.store(true, Ordering::SeqCst);
}

// ============================================================================
// When steps
// ============================================================================

#[when("the relay starts")]
async fn relay_starts(world: &mut RelayWorld) {
    let result = RelayBuilder::new(world.config.clone())
        .with_discord(Arc::clone(&world.discord) as Arc<dyn discord_relay::DiscordApi>)
        .with_cancellation_token(world.cancel.clone())
        .build()
        .await;

    match result {
        Ok(relay) => {
            world.addr = Some(relay.local_addr());
            world.handle = Some(tokio::spawn(relay.start()));
        }
        Err(e) => world.start_error = Some(e.to_string()),
    }
}

#[when("the relay is shut down")]
async fn relay_shut_down(world: &mut RelayWorld) {
    world.stop().await;
}

// ============================================================================
// Then steps
// ============================================================================

#[then("the relay is running")]
fn relay_running(world: &mut RelayWorld) {
    assert!(world.start_error.is_none(), "{:?}", world.start_error);
    assert!(world.addr.is_some());
}

#[then(expr = "the relay fails to start with {string}")]
fn relay_fails(world: &mut RelayWorld, expected: String) {
    let error = world.start_error.as_deref().expect("relay started");
    assert!(error.contains(&expected), "error was: {}", error);
    assert!(world.addr.is_none());
}

#[then("the Discord session is closed")]
fn session_closed(world: &mut RelayWorld) {
    assert!(world.discord.logged_out.load(Ordering::SeqCst));
}

#[then("the relay no longer accepts connections")]
async fn relay_stopped(world: &mut RelayWorld) {
    let result = reqwest::get(world.url("/health")).await;
    assert!(result.is_err());
}
