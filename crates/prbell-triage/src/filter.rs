//! Narrow the open pull request list to the ones worth a reminder.
//!
//! Three independent stages, applied in order: review-requirement membership,
//! pending reviewer presence, and ignore-label exclusion. Each stage keeps the
//! input order and never reorders or duplicates entries.

use prbell_core::{PullRequest, ReviewRequirementSet};

/// Keep only pull requests whose API URL is in `required`.
///
/// # Examples
///
/// ```
/// use prbell_core::{PullRequest, ReviewRequirementSet};
/// use prbell_triage::filter::filter_needing_review;
///
/// let pr = |url: &str| PullRequest {
///     url: url.into(),
///     html_url: url.into(),
///     title: "t".into(),
///     requested_reviewers: vec![],
///     requested_teams: vec![],
///     labels: vec![],
/// };
/// let required: ReviewRequirementSet = vec!["b".to_string()].into_iter().collect();
/// let kept = filter_needing_review(vec![pr("a"), pr("b")], &required);
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].url, "b");
/// ```
pub fn filter_needing_review(
    prs: Vec<PullRequest>,
    required: &ReviewRequirementSet,
) -> Vec<PullRequest> {
    prs.into_iter().filter(|pr| required.contains(&pr.url)).collect()
}

/// Keep only pull requests with at least one requested reviewer or team.
pub fn filter_has_requested_reviewers(prs: Vec<PullRequest>) -> Vec<PullRequest> {
    prs.into_iter().filter(PullRequest::has_pending_requests).collect()
}

/// Drop pull requests carrying a label named exactly `ignore_label`.
///
/// An absent or empty label excludes nothing.
pub fn filter_without_label(prs: Vec<PullRequest>, ignore_label: Option<&str>) -> Vec<PullRequest> {
    match ignore_label.filter(|l| !l.is_empty()) {
        Some(label) => prs.into_iter().filter(|pr| !pr.has_label(label)).collect(),
        None => prs,
    }
}

/// All three stages combined, with a record of what was dropped and why.
///
/// # Examples
///
/// ```
/// use prbell_core::ReviewRequirementSet;
/// use prbell_triage::filter::ReviewFilter;
///
/// let filter = ReviewFilter::new(Some("wip"));
/// let result = filter.apply(vec![], &ReviewRequirementSet::default());
/// assert!(result.kept.is_empty());
/// assert!(result.skipped.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    ignore_label: Option<String>,
}

impl ReviewFilter {
    pub fn new(ignore_label: Option<&str>) -> Self {
        Self {
            ignore_label: ignore_label.filter(|l| !l.is_empty()).map(str::to_string),
        }
    }

    /// Run every stage over `prs` in the canonical order.
    ///
    /// The kept list is identical to chaining [`filter_needing_review`],
    /// [`filter_has_requested_reviewers`] and [`filter_without_label`].
    pub fn apply(&self, prs: Vec<PullRequest>, required: &ReviewRequirementSet) -> FilterResult {
        let mut kept = Vec::new();
        let mut skipped = Vec::new();

        for pr in prs {
            match self.check_skip(&pr, required) {
                Some(reason) => {
                    tracing::debug!(url = %pr.html_url, %reason, "skipping pull request");
                    skipped.push(SkippedPr {
                        url: pr.html_url,
                        reason,
                    });
                }
                None => kept.push(pr),
            }
        }

        FilterResult { kept, skipped }
    }

    fn check_skip(&self, pr: &PullRequest, required: &ReviewRequirementSet) -> Option<SkipReason> {
        if !required.contains(&pr.url) {
            return Some(SkipReason::ReviewNotRequired);
        }
        if !pr.has_pending_requests() {
            return Some(SkipReason::NoPendingRequests);
        }
        if let Some(label) = &self.ignore_label {
            if pr.has_label(label) {
                return Some(SkipReason::IgnoreLabel(label.clone()));
            }
        }
        None
    }
}

/// Result of filtering pull requests.
#[derive(Debug, Clone)]
pub struct FilterResult {
    /// Pull requests that passed every stage, in input order.
    pub kept: Vec<PullRequest>,
    /// Pull requests that were dropped with reasons.
    pub skipped: Vec<SkippedPr>,
}

/// A pull request dropped during filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPr {
    /// Browser URL of the skipped pull request.
    pub url: String,
    pub reason: SkipReason,
}

/// Reason a pull request was dropped.
///
/// # Examples
///
/// ```
/// use prbell_triage::filter::SkipReason;
///
/// let reason = SkipReason::IgnoreLabel("wip".into());
/// assert_eq!(format!("{reason}"), "label: wip");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// GitHub does not list the pull request as needing review.
    ReviewNotRequired,
    /// No reviewer or team is still requested.
    NoPendingRequests,
    /// Carries the configured ignore label.
    IgnoreLabel(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::ReviewNotRequired => write!(f, "review not required"),
            SkipReason::NoPendingRequests => write!(f, "no pending review requests"),
            SkipReason::IgnoreLabel(label) => write!(f, "label: {label}"),
        }
    }
}
