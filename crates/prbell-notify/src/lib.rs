//! Chat notification: mention resolution, message rendering, and delivery.
//!
//! Provides the provider map parser, the Slack and Microsoft Teams message
//! formatters, the webhook payload types, and the webhook dispatcher.

pub mod dispatch;
pub mod envelope;
pub mod format;
pub mod provider_map;
