//! BDD step definitions for the WHMCS notifier

pub mod delivery_steps;
pub mod event_steps;
pub mod formatting_steps;
pub mod identity_steps;
