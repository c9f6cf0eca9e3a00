//! Flatten filtered pull requests into render-ready records.

use prbell_core::{AggregatedPr, PullRequest};

/// Build one [`AggregatedPr`] per pull request.
///
/// `users` lists reviewer logins first, then team slugs, each in API order.
/// Nothing is sorted or deduplicated: a reviewer and a team sharing a name
/// both appear.
///
/// # Examples
///
/// ```
/// use prbell_core::{PullRequest, RequestedReviewer, RequestedTeam};
/// use prbell_triage::aggregate::aggregate;
///
/// let pr = PullRequest {
///     url: "https://api.github.com/repos/o/r/pulls/1".into(),
///     html_url: "https://github.com/o/r/pull/1".into(),
///     title: "Fix".into(),
///     requested_reviewers: vec![
///         RequestedReviewer { login: "a".into() },
///         RequestedReviewer { login: "b".into() },
///     ],
///     requested_teams: vec![RequestedTeam { slug: "t1".into() }],
///     labels: vec![],
/// };
/// let out = aggregate(&[pr]);
/// assert_eq!(out[0].users, vec!["a", "b", "t1"]);
/// assert_eq!(out[0].url, "https://github.com/o/r/pull/1");
/// ```
pub fn aggregate(prs: &[PullRequest]) -> Vec<AggregatedPr> {
    prs.iter()
        .map(|pr| AggregatedPr {
            url: pr.html_url.clone(),
            title: pr.title.clone(),
            users: pr
                .requested_reviewers
                .iter()
                .map(|r| r.login.clone())
                .chain(pr.requested_teams.iter().map(|t| t.slug.clone()))
                .collect(),
        })
        .collect()
}

/// Total requested individual reviewers across `prs`. Teams are not counted.
pub fn count_reviewers(prs: &[PullRequest]) -> usize {
    prs.iter().map(|pr| pr.requested_reviewers.len()).sum()
}
