//! Webhook payloads for each chat provider.
//!
//! Field names and nesting match what Slack incoming webhooks and Microsoft
//! Teams Adaptive Card webhooks accept. Envelopes are built once per run and
//! never modified afterwards.

use serde::{Deserialize, Serialize};

/// Display name used for Slack messages.
pub const SLACK_USERNAME: &str = "Pull Request reviews reminder";

/// Prefix placed before the rendered Slack body.
pub const SLACK_HEADER: &str = "Pull Requests Needing Review:\n\n";

const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";
const ADAPTIVE_CARD_SCHEMA: &str = "http://adaptivecards.io/schemas/adaptive-card.json";
const ADAPTIVE_CARD_VERSION: &str = "1.0";

/// Payload posted to the webhook.
///
/// Serializes as the inner provider payload with no wrapper tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageEnvelope {
    Slack(SlackMessage),
    Teams(TeamsMessage),
}

impl MessageEnvelope {
    /// The human-readable text carried by the envelope.
    pub fn text(&self) -> &str {
        match self {
            MessageEnvelope::Slack(m) => &m.text,
            MessageEnvelope::Teams(m) => m
                .attachments
                .first()
                .and_then(|a| a.content.body.first())
                .map(|b| b.text.as_str())
                .unwrap_or_default(),
        }
    }
}

/// Slack incoming webhook payload.
///
/// # Examples
///
/// ```
/// use prbell_notify::envelope::SlackMessage;
///
/// let msg = SlackMessage::new("#reviews", "<u|t> @alice\n");
/// assert_eq!(msg.username, "Pull Request reviews reminder");
/// assert_eq!(msg.text, "Pull Requests Needing Review:\n\n<u|t> @alice\n");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackMessage {
    pub channel: String,
    pub username: String,
    pub text: String,
}

impl SlackMessage {
    /// Wrap a rendered body with the standard header and bot name.
    pub fn new(channel: &str, body: &str) -> Self {
        Self {
            channel: channel.to_string(),
            username: SLACK_USERNAME.to_string(),
            text: format!("{SLACK_HEADER}{body}"),
        }
    }
}

/// Microsoft Teams webhook payload carrying one Adaptive Card.
///
/// # Examples
///
/// ```
/// use prbell_notify::envelope::TeamsMessage;
///
/// let msg = TeamsMessage::new("hello", vec![]);
/// let json = serde_json::to_value(&msg).unwrap();
/// assert_eq!(json["type"], "message");
/// assert_eq!(json["attachments"][0]["content"]["body"][0]["text"], "hello");
/// assert_eq!(json["attachments"][0]["content"]["msteams"]["width"], "Full");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamsMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub attachments: Vec<TeamsAttachment>,
}

impl TeamsMessage {
    /// Build a single-card message with `text` as its only text block.
    pub fn new(text: &str, mentions: Vec<Mention>) -> Self {
        Self {
            kind: "message".into(),
            attachments: vec![TeamsAttachment {
                content_type: ADAPTIVE_CARD_CONTENT_TYPE.into(),
                content: AdaptiveCard {
                    kind: "AdaptiveCard".into(),
                    body: vec![TextBlock {
                        kind: "TextBlock".into(),
                        text: text.to_string(),
                        wrap: true,
                    }],
                    schema: ADAPTIVE_CARD_SCHEMA.into(),
                    version: ADAPTIVE_CARD_VERSION.into(),
                    msteams: MsTeamsProperties {
                        width: "Full".into(),
                        entities: mentions,
                    },
                },
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamsAttachment {
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub content: AdaptiveCard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptiveCard {
    #[serde(rename = "type")]
    pub kind: String,
    pub body: Vec<TextBlock>,
    #[serde(rename = "$schema")]
    pub schema: String,
    pub version: String,
    pub msteams: MsTeamsProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub wrap: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsTeamsProperties {
    pub width: String,
    pub entities: Vec<Mention>,
}

/// A Teams mention entity.
///
/// `text` must appear verbatim in the card text for Teams to render the
/// mention. `mentioned.id` is omitted when no id is mapped.
///
/// # Examples
///
/// ```
/// use prbell_notify::envelope::Mention;
///
/// let m = Mention::new("carol", None);
/// let json = serde_json::to_value(&m).unwrap();
/// assert_eq!(json["text"], "<at>carol</at>");
/// assert!(json["mentioned"].get("id").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub mentioned: Mentioned,
}

impl Mention {
    pub fn new(login: &str, id: Option<&str>) -> Self {
        Self {
            kind: "mention".into(),
            text: at_tag(login),
            mentioned: Mentioned {
                id: id.map(str::to_string),
                name: login.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mentioned {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

/// The `<at>login</at>` token Teams pairs with a mention entity.
pub fn at_tag(login: &str) -> String {
    format!("<at>{login}</at>")
}
