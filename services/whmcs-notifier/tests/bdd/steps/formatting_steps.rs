//! BDD step definitions for notification formatting

use cucumber::{given, then, when};
use whmcs_notifier::config::FormattingProfile;
use whmcs_notifier::format::{FormattedPayload, NotificationFormatter, RichEmbed};
use whmcs_notifier::platform::UserRecord;

use crate::world::NotifierWorld;

fn embed(world: &NotifierWorld) -> &RichEmbed {
    match world.payload.as_ref().expect("event not formatted") {
        FormattedPayload::RichEmbed(embed) => embed,
        other => panic!("expected rich embed, got {:?}", other),
    }
}

#[given("rich embeds are disabled")]
fn rich_embeds_disabled(world: &mut NotifierWorld) {
    world.config.preferences.use_rich_embeds = false;
}

#[given("priority color coding is disabled")]
fn color_coding_disabled(world: &mut NotifierWorld) {
    world.config.preferences.priority_color_coding = false;
}

#[given("client info is included")]
fn client_info_included(world: &mut NotifierWorld) {
    world.config.preferences.include_client_info = true;
}

#[given("the decorated formatting profile")]
fn decorated_profile(world: &mut NotifierWorld) {
    world.config.preferences.profile = FormattingProfile::Decorated;
}

#[when("the event is formatted")]
fn format_event(world: &mut NotifierWorld) {
    let user = UserRecord {
        id: "42".to_string(),
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        email: Some("ada@example.com".to_string()),
        company_name: Some("Analytical Engines".to_string()),
    };
    let formatter = NotificationFormatter::new(world.config.preferences.clone());
    world.payload = Some(formatter.format(&world.event(), &user));
}

#[then(expr = "the embed color is {string}")]
fn embed_color(world: &mut NotifierWorld, hex: String) {
    let expected = u32::from_str_radix(&hex, 16).expect("hex color");
    assert_eq!(embed(world).color, expected, "got {:06x}", embed(world).color);
}

#[then(expr = "the embed title is {string}")]
fn embed_title(world: &mut NotifierWorld, title: String) {
    assert_eq!(embed(world).title, title);
}

#[then(expr = "the embed fields are {string}")]
fn embed_fields(world: &mut NotifierWorld, names: String) {
    let actual: Vec<&str> = embed(world).fields.iter().map(|f| f.name.as_str()).collect();
    let expected: Vec<&str> = names.split(", ").filter(|n| !n.is_empty()).collect();
    assert_eq!(actual, expected);
}

#[then(expr = "the embed field {string} shows {string}")]
fn embed_field_value(world: &mut NotifierWorld, name: String, value: String) {
    let field = embed(world)
        .fields
        .iter()
        .find(|f| f.name == name)
        .unwrap_or_else(|| panic!("no field named {}", name));
    assert_eq!(field.value, value);
}

#[then(expr = "the plain text body is {string}")]
fn plain_body(world: &mut NotifierWorld, expected: String) {
    match world.payload.as_ref().expect("event not formatted") {
        FormattedPayload::PlainText { body } => assert_eq!(*body, expected.replace("\\n", "\n")),
        other => panic!("expected plain text, got {:?}", other),
    }
}
