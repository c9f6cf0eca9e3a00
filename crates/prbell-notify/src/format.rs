//! Render aggregated pull requests into provider-specific messages.
//!
//! Each supported [`Provider`] has a [`MessageFormatter`]. The formatter is
//! picked once via [`formatter_for`]; an unsupported provider is rejected there
//! instead of silently producing an empty notification.
//!
//! Both formats put one pull request per line and separate lines with a blank
//! line:
//!
//! - Slack: `<url|title> <@U123> @carol`
//! - Teams: `[title](url) <at>alice</at> <at>carol</at>`, with one mention
//!   entity per `<at>` token.

use std::collections::HashSet;

use prbell_core::{AggregatedPr, Degradation, NotifyConfig, PrbellError, Provider};

use crate::envelope::{at_tag, Mention, MessageEnvelope, SlackMessage, TeamsMessage};
use crate::provider_map::ProviderMap;

/// Provider-specific rendering of a reminder.
pub trait MessageFormatter: Send + Sync {
    /// Render the message body text.
    fn render(&self, prs: &[AggregatedPr], map: &ProviderMap) -> String;

    /// Build the complete webhook payload.
    fn envelope(&self, prs: &[AggregatedPr], map: &ProviderMap) -> MessageEnvelope;
}

/// Slack `mrkdwn` formatter for a single channel.
#[derive(Debug, Clone)]
pub struct SlackFormatter {
    channel: String,
}

impl SlackFormatter {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }
}

impl MessageFormatter for SlackFormatter {
    fn render(&self, prs: &[AggregatedPr], map: &ProviderMap) -> String {
        join_blocks(prs.iter().map(|pr| {
            let mentions: Vec<String> = pr.users.iter().map(|u| slack_mention(u, map)).collect();
            format!(
                "<{}|{}> {}\n",
                pr.url,
                escape_slack(&pr.title),
                mentions.join(" ")
            )
        }))
    }

    fn envelope(&self, prs: &[AggregatedPr], map: &ProviderMap) -> MessageEnvelope {
        let body = self.render(prs, map);
        MessageEnvelope::Slack(format_slack_message(&self.channel, &body))
    }
}

/// Microsoft Teams Adaptive Card formatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamsFormatter;

impl MessageFormatter for TeamsFormatter {
    fn render(&self, prs: &[AggregatedPr], _map: &ProviderMap) -> String {
        join_blocks(prs.iter().map(|pr| {
            let mentions: Vec<String> = pr.users.iter().map(|u| at_tag(u)).collect();
            format!(
                "[{}]({}) {}\n",
                escape_link_text(&pr.title),
                pr.url,
                mentions.join(" ")
            )
        }))
    }

    fn envelope(&self, prs: &[AggregatedPr], map: &ProviderMap) -> MessageEnvelope {
        let body = self.render(prs, map);
        MessageEnvelope::Teams(format_teams_message(&body, teams_mentions(prs, map)))
    }
}

/// Pick the formatter for `provider`.
///
/// # Errors
///
/// Returns [`PrbellError::UnsupportedProvider`] for unknown providers and
/// [`PrbellError::Config`] when Slack is selected without a channel.
pub fn formatter_for(
    provider: &Provider,
    channel: Option<&str>,
) -> Result<Box<dyn MessageFormatter>, PrbellError> {
    match provider {
        Provider::Slack => {
            let channel = channel.filter(|c| !c.is_empty()).ok_or_else(|| {
                PrbellError::Config("slack provider requires a channel".into())
            })?;
            Ok(Box::new(SlackFormatter::new(channel)))
        }
        Provider::Teams => Ok(Box::new(TeamsFormatter)),
        Provider::Unsupported(name) => Err(PrbellError::UnsupportedProvider(name.clone())),
    }
}

/// Build the webhook payload for the configured provider.
///
/// # Errors
///
/// See [`formatter_for`].
pub fn build_envelope(
    prs: &[AggregatedPr],
    map: &ProviderMap,
    config: &NotifyConfig,
) -> Result<MessageEnvelope, PrbellError> {
    let formatter = formatter_for(&config.provider, config.channel.as_deref())?;
    Ok(formatter.envelope(prs, map))
}

/// Render the body text for `provider`.
///
/// An unsupported provider renders an empty body; use [`formatter_for`] or
/// [`build_envelope`] where the failure must be reported.
///
/// # Examples
///
/// ```
/// use prbell_core::{AggregatedPr, Provider};
/// use prbell_notify::format::render;
/// use prbell_notify::provider_map::ProviderMap;
///
/// let prs = vec![AggregatedPr {
///     url: "u".into(),
///     title: "t".into(),
///     users: vec!["alice".into(), "carol".into()],
/// }];
/// let map = ProviderMap::parse("alice:U1");
/// assert_eq!(render(&prs, &map, &Provider::Slack), "<u|t> <@U1> @carol\n");
/// assert_eq!(render(&prs, &map, &Provider::Unsupported("irc".into())), "");
/// ```
pub fn render(prs: &[AggregatedPr], map: &ProviderMap, provider: &Provider) -> String {
    match provider {
        Provider::Slack => SlackFormatter::new("").render(prs, map),
        Provider::Teams => TeamsFormatter.render(prs, map),
        Provider::Unsupported(_) => String::new(),
    }
}

/// `<@id>` when `user` is mapped, otherwise `@user`.
pub fn slack_mention(user: &str, map: &ProviderMap) -> String {
    match map.mention_id(user) {
        Some(id) => format!("<@{id}>"),
        None => format!("@{user}"),
    }
}

/// One mention entity per (pull request, user) pair, in order, undeduplicated.
pub fn teams_mentions(prs: &[AggregatedPr], map: &ProviderMap) -> Vec<Mention> {
    prs.iter()
        .flat_map(|pr| pr.users.iter())
        .map(|user| Mention::new(user, map.mention_id(user)))
        .collect()
}

/// Wrap a rendered Slack body for `channel`.
pub fn format_slack_message(channel: &str, body: &str) -> SlackMessage {
    SlackMessage::new(channel, body)
}

/// Wrap a rendered Teams body and its mention entities.
pub fn format_teams_message(body: &str, mentions: Vec<Mention>) -> TeamsMessage {
    TeamsMessage::new(body, mentions)
}

/// Users that will be shown by raw name because no mention id is mapped.
///
/// Each name is reported once, in first-seen order.
pub fn unmapped_users(prs: &[AggregatedPr], map: &ProviderMap) -> Vec<Degradation> {
    let mut seen: HashSet<&String> = HashSet::new();
    prs.iter()
        .flat_map(|pr| pr.users.iter())
        .filter(|user| map.mention_id(user).is_none())
        .filter(|user| seen.insert(*user))
        .map(|user| Degradation::UnmappedUser {
            login: user.clone(),
        })
        .collect()
}

fn join_blocks(lines: impl Iterator<Item = String>) -> String {
    lines.collect::<Vec<_>>().join("\n")
}

// Slack treats these three as control characters inside message text.
fn escape_slack(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

// Unbalanced brackets would end the markdown link text early.
fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn pr(url: &str, title: &str, users: &[&str]) -> AggregatedPr {
        AggregatedPr {
            url: url.into(),
            title: title.into(),
            users: users.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[test]
    fn slack_single_pr() {
        let map = ProviderMap::parse("alice:U1");
        let body = SlackFormatter::new("#c").render(&[pr("u", "t", &["alice", "carol"])], &map);
        assert_eq!(body, "<u|t> <@U1> @carol\n");
    }

    #[test]
    fn slack_blocks_separated_by_one_blank_line() {
        let map = ProviderMap::default();
        let body = render(
            &[pr("u1", "a", &["x"]), pr("u2", "b", &["y"]), pr("u3", "c", &["z"])],
            &map,
            &Provider::Slack,
        );
        assert_eq!(body, "<u1|a> @x\n\n<u2|b> @y\n\n<u3|c> @z\n");
    }

    #[test]
    fn slack_malformed_entry_falls_back_to_raw_name() {
        let map = ProviderMap::parse("alice:U1,bob");
        let body = render(&[pr("u", "t", &["bob"])], &map, &Provider::Slack);
        assert_eq!(body, "<u|t> @bob\n");
    }

    #[test]
    fn slack_escapes_control_characters_in_title() {
        let body = render(
            &[pr("u", "Vec<T> & friends", &["a"])],
            &ProviderMap::default(),
            &Provider::Slack,
        );
        assert_eq!(body, "<u|Vec&lt;T&gt; &amp; friends> @a\n");
    }

    #[test]
    fn teams_escapes_brackets_in_title() {
        let body = render(
            &[pr("u", "[WIP] fix ]parser", &["a"])],
            &ProviderMap::default(),
            &Provider::Teams,
        );
        assert_eq!(body, "[\\[WIP\\] fix \\]parser](u) <at>a</at>\n");
    }

    #[test]
    fn empty_pr_list_renders_empty_body() {
        let map = ProviderMap::default();
        assert_eq!(render(&[], &map, &Provider::Slack), "");
        assert_eq!(render(&[], &map, &Provider::Teams), "");
    }

    #[test]
    fn teams_text_uses_at_tags_and_markdown_links() {
        let map = ProviderMap::parse("alice:U1");
        let body = render(
            &[pr("u1", "t1", &["alice", "carol"]), pr("u2", "t2", &["core"])],
            &map,
            &Provider::Teams,
        );
        assert_eq!(
            body,
            "[t1](u1) <at>alice</at> <at>carol</at>\n\n[t2](u2) <at>core</at>\n"
        );
    }

    #[test]
    fn teams_mentions_per_user() {
        let map = ProviderMap::parse("alice:U1");
        let mentions = teams_mentions(&[pr("u", "t", &["alice", "carol"])], &map);
        assert_eq!(
            serde_json::to_value(&mentions).unwrap(),
            serde_json::json!([
                {"type": "mention", "text": "<at>alice</at>", "mentioned": {"id": "U1", "name": "alice"}},
                {"type": "mention", "text": "<at>carol</at>", "mentioned": {"name": "carol"}},
            ])
        );
    }

    #[test]
    fn teams_mentions_are_not_deduplicated_across_prs() {
        let map = ProviderMap::default();
        let mentions = teams_mentions(&[pr("u1", "a", &["x"]), pr("u2", "b", &["x", "x"])], &map);
        assert_eq!(mentions.len(), 3);
        assert!(mentions.iter().all(|m| m.mentioned.name == "x"));
    }

    #[test]
    fn every_teams_mention_appears_in_text() {
        let map = ProviderMap::parse("alice:U1");
        let prs = [pr("u", "t", &["alice", "core"])];
        let MessageEnvelope::Teams(msg) = TeamsFormatter.envelope(&prs, &map) else {
            panic!("expected teams envelope");
        };
        let card = &msg.attachments[0].content;
        for m in &card.msteams.entities {
            assert!(card.body[0].text.contains(&m.text));
        }
    }

    #[test]
    fn slack_envelope_wraps_body() {
        let map = ProviderMap::default();
        let env = SlackFormatter::new("#reviews").envelope(&[pr("u", "t", &["a"])], &map);
        assert_eq!(
            env,
            MessageEnvelope::Slack(SlackMessage {
                channel: "#reviews".into(),
                username: "Pull Request reviews reminder".into(),
                text: "Pull Requests Needing Review:\n\n<u|t> @a\n".into(),
            })
        );
    }

    #[test]
    fn unsupported_provider_fails_loudly() {
        let config = NotifyConfig {
            provider: Provider::Unsupported("discord".into()),
            ..NotifyConfig::default()
        };
        let err = build_envelope(&[], &ProviderMap::default(), &config).unwrap_err();
        assert!(matches!(err, PrbellError::UnsupportedProvider(ref p) if p == "discord"));
    }

    #[test]
    fn slack_without_channel_is_config_error() {
        let err = formatter_for(&Provider::Slack, None).err().unwrap();
        assert!(matches!(err, PrbellError::Config(_)));
        assert!(formatter_for(&Provider::Teams, None).is_ok());
    }

    #[test]
    fn unmapped_users_reported_once() {
        let map = ProviderMap::parse("alice:U1,bob");
        let found = unmapped_users(
            &[pr("u1", "a", &["alice", "bob", "carol"]), pr("u2", "b", &["carol"])],
            &map,
        );
        assert_eq!(
            found,
            vec![
                Degradation::UnmappedUser { login: "bob".into() },
                Degradation::UnmappedUser { login: "carol".into() },
            ]
        );
    }
}
