//! BDD step definitions for identity resolution

use std::sync::Arc;

use cucumber::{given, then, when};
use whmcs_notifier::identity::IdentityResolver;

use crate::world::NotifierWorld;

#[given(expr = "ticket {string} belongs to client {string}")]
fn ticket_owner(world: &mut NotifierWorld, ticket: String, client: String) {
    world.platform.tickets.insert(ticket, client);
}

#[given(expr = "ticket mask {string} belongs to client {string}")]
fn ticket_mask_owner(world: &mut NotifierWorld, mask: String, client: String) {
    world.platform.ticket_masks.insert(mask, client);
}

#[given(expr = "invoice {string} belongs to client {string}")]
fn invoice_owner(world: &mut NotifierWorld, invoice: String, client: String) {
    world.platform.invoices.insert(invoice, client);
}

#[given("ticket lookups fail")]
fn ticket_lookups_fail(world: &mut NotifierWorld) {
    world.platform.ticket_lookups_fail = true;
}

#[when("the client is resolved")]
async fn resolve_client(world: &mut NotifierWorld) {
    let resolver = IdentityResolver::new(Arc::new(world.platform.clone()));
    let resolved = resolver.resolve(&world.event()).await;
    world.resolved = Some(resolved.map(|r| r.user_id.as_str().to_string()));
}

#[then(expr = "the resolved client is {string}")]
fn resolved_client(world: &mut NotifierWorld, expected: String) {
    let resolved = world.resolved.as_ref().expect("resolution not run");
    assert_eq!(resolved.as_deref(), Some(expected.as_str()));
}

#[then("no client is resolved")]
fn no_client(world: &mut NotifierWorld) {
    let resolved = world.resolved.as_ref().expect("resolution not run");
    assert_eq!(*resolved, None);
}

#[then("no platform lookups were made")]
fn no_lookups(world: &mut NotifierWorld) {
    assert_eq!(world.platform.lookup_count(), 0);
}
