use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PrbellError;

/// An individual asked to review a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedReviewer {
    /// GitHub login.
    pub login: String,
}

/// A team asked to review a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedTeam {
    /// Team slug, e.g. `backend`.
    pub slug: String,
}

/// A label attached to a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label name, compared case-sensitively.
    pub name: String,
}

/// An open pull request as returned by the GitHub pulls endpoint.
///
/// Only the fields prbell reads are kept; everything else in the API
/// response is ignored during deserialization.
///
/// # Examples
///
/// ```
/// use prbell_core::PullRequest;
///
/// let pr: PullRequest = serde_json::from_str(r#"{
///     "url": "https://api.github.com/repos/o/r/pulls/1",
///     "html_url": "https://github.com/o/r/pull/1",
///     "title": "Fix login",
///     "requested_reviewers": [{"login": "alice"}],
///     "requested_teams": [],
///     "labels": [{"name": "wip"}]
/// }"#).unwrap();
/// assert!(pr.has_pending_requests());
/// assert!(pr.has_label("wip"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// API URL; the identity used for review-requirement membership.
    pub url: String,
    /// Browser URL shown in chat messages.
    pub html_url: String,
    /// Pull request title.
    pub title: String,
    /// Individuals with a pending review request, in API order.
    #[serde(default)]
    pub requested_reviewers: Vec<RequestedReviewer>,
    /// Teams with a pending review request, in API order.
    #[serde(default)]
    pub requested_teams: Vec<RequestedTeam>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl PullRequest {
    /// Returns `true` if at least one reviewer or team is still requested.
    pub fn has_pending_requests(&self) -> bool {
        !self.requested_reviewers.is_empty() || !self.requested_teams.is_empty()
    }

    /// Returns `true` if a label named exactly `name` is attached.
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }
}

/// The set of pull request API URLs GitHub reports as needing review.
///
/// Membership is tested by URL equality only.
///
/// # Examples
///
/// ```
/// use prbell_core::ReviewRequirementSet;
///
/// let set: ReviewRequirementSet = ["https://api.github.com/repos/o/r/pulls/1"]
///     .into_iter()
///     .map(String::from)
///     .collect();
/// assert!(set.contains("https://api.github.com/repos/o/r/pulls/1"));
/// assert!(!set.contains("https://api.github.com/repos/o/r/pulls/2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewRequirementSet {
    urls: HashSet<String>,
}

impl ReviewRequirementSet {
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl FromIterator<String> for ReviewRequirementSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            urls: iter.into_iter().collect(),
        }
    }
}

/// A pull request flattened for message rendering.
///
/// `users` holds reviewer logins followed by team slugs, in API order and
/// without deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPr {
    /// Browser URL of the pull request.
    pub url: String,
    pub title: String,
    /// Reviewer logins then team slugs.
    pub users: Vec<String>,
}

/// Chat provider that receives the notification.
///
/// Resolved once from configuration. Unknown names are kept as
/// [`Provider::Unsupported`] so the failure surfaces when the message is built
/// rather than while reading the config file.
///
/// # Examples
///
/// ```
/// use prbell_core::Provider;
///
/// assert_eq!("slack".parse::<Provider>().unwrap(), Provider::Slack);
/// assert_eq!("msteams".parse::<Provider>().unwrap(), Provider::Teams);
/// assert_eq!(
///     "discord".parse::<Provider>().unwrap(),
///     Provider::Unsupported("discord".into())
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provider {
    /// Slack incoming webhook.
    #[default]
    Slack,
    /// Microsoft Teams incoming webhook with an Adaptive Card.
    Teams,
    /// Any other configured value.
    Unsupported(String),
}

impl Provider {
    /// Returns `true` unless the provider is [`Provider::Unsupported`].
    pub fn is_supported(&self) -> bool {
        !matches!(self, Provider::Unsupported(_))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Slack => write!(f, "slack"),
            Provider::Teams => write!(f, "msteams"),
            Provider::Unsupported(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for Provider {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "slack" => Provider::Slack,
            "msteams" | "teams" => Provider::Teams,
            _ => Provider::Unsupported(s.trim().to_string()),
        })
    }
}

impl From<String> for Provider {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(p) => p,
            Err(never) => match never {},
        }
    }
}

impl From<Provider> for String {
    fn from(p: Provider) -> Self {
        p.to_string()
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use prbell_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Pretty-print `value` as JSON for CLI output.
///
/// # Errors
///
/// Returns [`PrbellError::Serialization`] if `value` cannot be represented as
/// JSON, e.g. a map with non-string keys.
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String, PrbellError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pr_json() -> &'static str {
        r#"{
            "url": "https://api.github.com/repos/o/r/pulls/7",
            "html_url": "https://github.com/o/r/pull/7",
            "title": "Add cache",
            "number": 7,
            "state": "open",
            "requested_reviewers": [{"login": "alice", "id": 1}, {"login": "bob", "id": 2}],
            "requested_teams": [{"slug": "core", "name": "Core"}],
            "labels": [{"name": "Do Not Review", "color": "ff0000"}]
        }"#
    }

    #[test]
    fn pull_request_ignores_unknown_fields() {
        let pr: PullRequest = serde_json::from_str(pr_json()).unwrap();
        assert_eq!(pr.title, "Add cache");
        assert_eq!(pr.requested_reviewers.len(), 2);
        assert_eq!(pr.requested_teams[0].slug, "core");
    }

    #[test]
    fn pull_request_missing_lists_default_empty() {
        let pr: PullRequest = serde_json::from_str(
            r#"{"url": "u", "html_url": "h", "title": "t"}"#,
        )
        .unwrap();
        assert!(pr.labels.is_empty());
        assert!(!pr.has_pending_requests());
    }

    #[test]
    fn has_label_is_case_sensitive() {
        let pr: PullRequest = serde_json::from_str(pr_json()).unwrap();
        assert!(pr.has_label("Do Not Review"));
        assert!(!pr.has_label("do not review"));
    }

    #[test]
    fn team_only_request_counts_as_pending() {
        let mut pr: PullRequest = serde_json::from_str(pr_json()).unwrap();
        pr.requested_reviewers.clear();
        assert!(pr.has_pending_requests());
        pr.requested_teams.clear();
        assert!(!pr.has_pending_requests());
    }

    #[test]
    fn requirement_set_deduplicates() {
        let set: ReviewRequirementSet = vec!["a".to_string(), "a".to_string(), "b".to_string()]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert!(!set.is_empty());
        assert!(ReviewRequirementSet::default().is_empty());
    }

    #[test]
    fn provider_from_str() {
        assert_eq!("Slack".parse::<Provider>().unwrap(), Provider::Slack);
        assert_eq!("teams".parse::<Provider>().unwrap(), Provider::Teams);
        assert_eq!(" MSTeams ".parse::<Provider>().unwrap(), Provider::Teams);
        assert_eq!(
            "".parse::<Provider>().unwrap(),
            Provider::Unsupported(String::new())
        );
    }

    #[test]
    fn provider_roundtrips_through_toml_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            provider: Provider,
        }
        let w: Wrapper = toml::from_str("provider = \"msteams\"").unwrap();
        assert_eq!(w.provider, Provider::Teams);
        assert_eq!(serde_json::to_string(&Provider::Teams).unwrap(), "\"msteams\"");
    }

    #[test]
    fn provider_is_supported() {
        assert!(Provider::Slack.is_supported());
        assert!(Provider::Teams.is_supported());
        assert!(!Provider::Unsupported("irc".into()).is_supported());
    }

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn output_format_default_is_text() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn aggregated_pr_serializes() {
        let agg = AggregatedPr {
            url: "u".into(),
            title: "t".into(),
            users: vec!["alice".into()],
        };
        let json = serde_json::to_value(&agg).unwrap();
        assert_eq!(json["users"][0], "alice");
    }

    #[test]
    fn json_output_is_pretty_printed() {
        let out = to_json_pretty(&OutputFormat::Json).unwrap();
        assert_eq!(out, "\"json\"");
    }

    #[test]
    fn unrepresentable_json_is_a_serialization_error() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(vec![1u8], 1u8);
        let err = to_json_pretty(&map).unwrap_err();
        assert_eq!(err.kind(), "serialization");
    }
}
