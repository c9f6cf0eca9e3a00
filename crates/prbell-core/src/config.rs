use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PrbellError;
use crate::types::Provider;

/// Largest page the GitHub REST API will return in one request.
pub const MAX_PER_PAGE: u8 = 100;

/// Top-level configuration loaded from `.prbell.toml`.
///
/// Supports layered resolution: CLI flags > env vars > local config > defaults.
/// The binary applies the overrides; library crates only ever receive a
/// fully resolved value by reference.
///
/// # Examples
///
/// ```
/// use prbell_core::{PrbellConfig, Provider};
///
/// let config = PrbellConfig::default();
/// assert_eq!(config.notify.provider, Provider::Slack);
/// assert_eq!(config.github.api_url, "https://api.github.com");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrbellConfig {
    /// Hosting API settings.
    #[serde(default)]
    pub github: GithubConfig,
    /// Chat notification settings.
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl PrbellConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PrbellError::FileNotFound`] if the file does not exist,
    /// [`PrbellError::Io`] if it cannot be read, or [`PrbellError::Toml`] if
    /// the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use prbell_core::PrbellConfig;
    /// use std::path::Path;
    ///
    /// let config = PrbellConfig::from_file(Path::new(".prbell.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, PrbellError> {
        if !path.exists() {
            return Err(PrbellError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PrbellError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use prbell_core::{PrbellConfig, Provider};
    ///
    /// let toml = r#"
    /// [notify]
    /// provider = "msteams"
    /// ignore_label = "wip"
    /// "#;
    /// let config = PrbellConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.notify.provider, Provider::Teams);
    /// assert_eq!(config.notify.ignore_label(), Some("wip"));
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PrbellError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Check that everything a run needs is present.
    ///
    /// `require_webhook` is `false` for commands that never post, such as
    /// `preview`. The provider itself is not checked here; an unsupported
    /// provider fails when the message envelope is built.
    ///
    /// # Errors
    ///
    /// Returns [`PrbellError::Config`] naming the first missing setting.
    pub fn validate(&self, require_webhook: bool) -> Result<(), PrbellError> {
        self.github.owner_repo()?;
        if self.github.token.as_deref().is_none_or(str::is_empty) {
            return Err(PrbellError::Config(
                "GitHub token not set. Pass --github-token or set GITHUB_TOKEN env var".into(),
            ));
        }
        if require_webhook && self.notify.webhook_url.as_deref().is_none_or(str::is_empty) {
            return Err(PrbellError::Config(
                "webhook URL not set. Pass --webhook-url or set [notify] webhook_url".into(),
            ));
        }
        if self.notify.provider == Provider::Slack
            && self.notify.channel.as_deref().is_none_or(str::is_empty)
        {
            return Err(PrbellError::Config(
                "slack provider requires a channel. Pass --channel or set [notify] channel".into(),
            ));
        }
        Ok(())
    }
}

/// GitHub API configuration.
///
/// # Examples
///
/// ```
/// use prbell_core::GithubConfig;
///
/// let config = GithubConfig {
///     repository: Some("octocat/hello-world".into()),
///     ..GithubConfig::default()
/// };
/// let (owner, repo) = config.owner_repo().unwrap();
/// assert_eq!(owner, "octocat");
/// assert_eq!(repo, "hello-world");
/// assert_eq!(config.per_page(), 100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Repository in `owner/repo` form.
    pub repository: Option<String>,
    /// REST API base URL (default: `https://api.github.com`).
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Personal access token. Prefer the `GITHUB_TOKEN` env var.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    /// Page size for both queries, clamped to 1..=100 (default: 100).
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_api_url() -> String {
    "https://api.github.com".into()
}

fn default_per_page() -> u32 {
    u32::from(MAX_PER_PAGE)
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            repository: None,
            api_url: default_api_url(),
            token: None,
            per_page: default_per_page(),
        }
    }
}

impl GithubConfig {
    /// Split `repository` into owner and name.
    ///
    /// # Errors
    ///
    /// Returns [`PrbellError::Config`] if the repository is unset or not in
    /// `owner/repo` form.
    pub fn owner_repo(&self) -> Result<(String, String), PrbellError> {
        let Some(full) = self.repository.as_deref() else {
            return Err(PrbellError::Config(
                "repository not set. Pass --repository or set GITHUB_REPOSITORY".into(),
            ));
        };
        match full.split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok((owner.to_string(), repo.to_string()))
            }
            _ => Err(PrbellError::Config(format!(
                "invalid repository '{full}', expected owner/repo"
            ))),
        }
    }

    /// Page size actually sent to the API.
    pub fn per_page(&self) -> u8 {
        let clamped = self.per_page.clamp(1, u32::from(MAX_PER_PAGE));
        u8::try_from(clamped).unwrap_or(MAX_PER_PAGE)
    }
}

/// Chat notification configuration.
///
/// # Examples
///
/// ```
/// use prbell_core::NotifyConfig;
///
/// let config = NotifyConfig {
///     ignore_label: Some(String::new()),
///     ..NotifyConfig::default()
/// };
/// assert_eq!(config.ignore_label(), None);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Chat provider: `"slack"` or `"msteams"`.
    #[serde(default)]
    pub provider: Provider,
    /// Incoming webhook endpoint.
    pub webhook_url: Option<String>,
    /// Destination channel (Slack only).
    pub channel: Option<String>,
    /// `login:mentionId` pairs separated by commas.
    pub github_provider_map: Option<String>,
    /// Pull requests carrying this label are never announced.
    pub ignore_label: Option<String>,
}

impl NotifyConfig {
    /// The ignore label, or `None` when unset or empty.
    pub fn ignore_label(&self) -> Option<&str> {
        self.ignore_label.as_deref().filter(|l| !l.is_empty())
    }
}
