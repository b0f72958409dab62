//! Steps that build the event under test

use cucumber::given;
use whmcs_notifier::event::Attribute;

use crate::world::NotifierWorld;

#[given(expr = "an event titled {string}")]
fn event_titled(world: &mut NotifierWorld, title: String) {
    world.title = title;
}

#[given(expr = "the event message is {string}")]
fn event_message(world: &mut NotifierWorld, message: String) {
    world.message = message;
}

#[given(expr = "the event has attribute {string} with value {string}")]
fn event_attribute(world: &mut NotifierWorld, label: String, value: String) {
    world.attributes.push(Attribute::new(label, value));
}
