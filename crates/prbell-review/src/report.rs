use std::fmt;

use prbell_core::{AggregatedPr, Degradation, Provider};
use serde::Serialize;

/// Summary of one reminder run.
///
/// Fatal problems never reach a report; they surface as `PrbellError`s.
/// Everything that only degraded the message is listed in `degradations`.
///
/// # Examples
///
/// ```
/// use prbell_core::Provider;
/// use prbell_review::report::RunReport;
///
/// let report = RunReport {
///     provider: Provider::Slack,
///     ..RunReport::default()
/// };
/// assert!(!report.notified);
/// assert!(report.to_string().contains("No pull requests need review."));
/// ```
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Open pull requests returned by the list call.
    pub open_pull_requests: usize,
    /// Pull requests the search reported as review-required.
    pub review_required: usize,
    /// Pull requests included in the notification.
    pub pull_requests_to_notify: usize,
    /// Requested individual reviewers across notified pull requests.
    pub reviewers: usize,
    pub provider: Provider,
    /// Whether the webhook was called and accepted the payload.
    pub notified: bool,
    /// HTTP status returned by the webhook.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_status: Option<u16>,
    pub pull_requests: Vec<AggregatedPr>,
    pub skipped: Vec<SkippedEntry>,
    pub degradations: Vec<Degradation>,
}

/// A pull request left out of the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub url: String,
    pub reason: String,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Review Reminder")?;
        writeln!(f, "===============")?;
        writeln!(
            f,
            "Provider: {} | Open: {} | Review required: {} | Notify: {} | Reviewers: {}\n",
            self.provider,
            self.open_pull_requests,
            self.review_required,
            self.pull_requests_to_notify,
            self.reviewers,
        )?;

        if self.pull_requests.is_empty() {
            writeln!(f, "No pull requests need review.")?;
        } else {
            for pr in &self.pull_requests {
                writeln!(f, "  {} ({})", pr.title, pr.url)?;
                writeln!(f, "    reviewers: {}", pr.users.join(", "))?;
            }
        }

        if !self.skipped.is_empty() {
            writeln!(f, "\nSkipped:")?;
            for s in &self.skipped {
                writeln!(f, "  {} [{}]", s.url, s.reason)?;
            }
        }

        if !self.degradations.is_empty() {
            writeln!(f, "\nWarnings:")?;
            for d in &self.degradations {
                writeln!(f, "  {d}")?;
            }
        }

        match (self.notified, self.webhook_status) {
            (true, Some(status)) => writeln!(f, "\nNotification sent (HTTP {status}).")?,
            (true, None) => writeln!(f, "\nNotification sent.")?,
            (false, _) => writeln!(f, "\nNo notification sent.")?,
        }
        Ok(())
    }
}
