use async_trait::async_trait;
use prbell_core::{GithubConfig, PrbellError, PullRequest, ReviewRequirementSet};
use serde::{Deserialize, Serialize};

/// Where the pipeline gets its two pull request snapshots from.
///
/// Both calls return one bounded page and are independent of each other, so
/// the pipeline may run them concurrently.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Open pull requests of the configured repository.
    async fn open_pull_requests(&self) -> Result<Vec<PullRequest>, PrbellError>;

    /// API URLs of open pull requests whose review is still required.
    async fn review_required_urls(&self) -> Result<ReviewRequirementSet, PrbellError>;
}

/// GitHub REST client for one repository.
///
/// # Examples
///
/// ```no_run
/// use prbell_core::GithubConfig;
/// use prbell_review::github::GitHubClient;
///
/// # async fn demo() {
/// let config = GithubConfig {
///     repository: Some("octocat/hello-world".into()),
///     token: Some("ghp_xxxx".into()),
///     ..GithubConfig::default()
/// };
/// let client = GitHubClient::new(&config).unwrap();
/// # }
/// ```
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    owner: String,
    repo: String,
    per_page: u8,
}

#[derive(Debug, Serialize)]
struct PullsParams {
    state: &'static str,
    per_page: u8,
}

#[derive(Debug, Serialize)]
struct SearchParams {
    q: String,
    sort: &'static str,
    order: &'static str,
    per_page: u8,
}

#[derive(Debug, Deserialize)]
struct IssueSearchPage {
    #[serde(default)]
    items: Vec<IssueSearchItem>,
}

#[derive(Debug, Deserialize)]
struct IssueSearchItem {
    pull_request: Option<PullRequestLink>,
}

#[derive(Debug, Deserialize)]
struct PullRequestLink {
    url: String,
}

impl GitHubClient {
    /// Create a client for the repository named in `config`.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PrbellError::Config`] if the repository or token is missing
    /// or the API URL is invalid, or [`PrbellError::GitHub`] if the client
    /// cannot be built.
    pub fn new(config: &GithubConfig) -> Result<Self, PrbellError> {
        let (owner, repo) = config.owner_repo()?;
        let token = config
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                PrbellError::Config(
                    "GITHUB_TOKEN not set. Pass --github-token or set GITHUB_TOKEN env var".into(),
                )
            })?;

        let octocrab = octocrab::Octocrab::builder()
            .personal_token(token)
            .base_uri(config.api_url.trim_end_matches('/'))
            .map_err(|e| PrbellError::Config(format!("invalid GitHub API URL: {e}")))?
            .build()
            .map_err(|e| PrbellError::GitHub(format!("failed to create GitHub client: {e}")))?;

        Ok(Self {
            octocrab,
            owner,
            repo,
            per_page: config.per_page(),
        })
    }

    /// Search qualifier selecting open pull requests of this repository that
    /// still need a review.
    pub fn review_required_query(&self) -> String {
        format!(
            "is:pr state:open review:required repo:{}/{}",
            self.owner, self.repo
        )
    }
}

#[async_trait]
impl PullRequestSource for GitHubClient {
    async fn open_pull_requests(&self) -> Result<Vec<PullRequest>, PrbellError> {
        let route = format!("/repos/{}/{}/pulls", self.owner, self.repo);
        let params = PullsParams {
            state: "open",
            per_page: self.per_page,
        };

        let prs: Vec<PullRequest> = self
            .octocrab
            .get(route, Some(&params))
            .await
            .map_err(|e| PrbellError::GitHub(format!("failed to list pull requests: {e}")))?;

        tracing::debug!(count = prs.len(), "fetched open pull requests");
        Ok(prs)
    }

    async fn review_required_urls(&self) -> Result<ReviewRequirementSet, PrbellError> {
        let params = SearchParams {
            q: self.review_required_query(),
            sort: "updated",
            order: "desc",
            per_page: self.per_page,
        };

        let page: IssueSearchPage = self
            .octocrab
            .get("/search/issues", Some(&params))
            .await
            .map_err(|e| {
                PrbellError::GitHub(format!("failed to search review-required issues: {e}"))
            })?;

        let urls: ReviewRequirementSet = page
            .items
            .into_iter()
            .filter_map(|item| item.pull_request.map(|pr| pr.url))
            .collect();

        tracing::debug!(count = urls.len(), "fetched review-required pull requests");
        Ok(urls)
    }
}
