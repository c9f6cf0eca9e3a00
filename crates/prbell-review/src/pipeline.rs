use prbell_core::{Degradation, NotifyConfig, PrbellError, Provider};
use prbell_notify::dispatch::{redact, NotificationDispatcher};
use prbell_notify::envelope::MessageEnvelope;
use prbell_notify::format::{formatter_for, unmapped_users, MessageFormatter};
use prbell_notify::provider_map::ProviderMap;
use prbell_triage::aggregate::{aggregate, count_reviewers};
use prbell_triage::filter::ReviewFilter;

use crate::github::PullRequestSource;
use crate::report::{RunReport, SkippedEntry};

/// A reminder that has been computed but not yet delivered.
#[derive(Debug, Clone)]
pub struct PreparedReminder {
    /// Counts, pull requests and degradations for the run.
    pub report: RunReport,
    /// Rendered message body, empty when nothing qualifies.
    pub body: String,
    /// Payload to post, or `None` when no pull request needs a reminder.
    pub envelope: Option<MessageEnvelope>,
}

/// Reminder orchestrator.
///
/// Fetches the open pull requests and the review-required set concurrently,
/// filters and aggregates them, renders the provider message and posts it
/// once. Every input is read once at construction; nothing is retried.
pub struct ReminderPipeline {
    source: Box<dyn PullRequestSource>,
    formatter: Box<dyn MessageFormatter>,
    provider_map: ProviderMap,
    filter: ReviewFilter,
    provider: Provider,
}

impl ReminderPipeline {
    /// Create a pipeline for the notification settings in `config`.
    ///
    /// The formatter is resolved here so an unsupported provider fails before
    /// any request is made.
    ///
    /// # Errors
    ///
    /// Returns [`PrbellError::UnsupportedProvider`] or [`PrbellError::Config`]
    /// if no formatter fits the configured provider.
    pub fn new(
        config: &NotifyConfig,
        source: Box<dyn PullRequestSource>,
    ) -> Result<Self, PrbellError> {
        let formatter = formatter_for(&config.provider, config.channel.as_deref())?;
        Ok(Self {
            source,
            formatter,
            provider_map: ProviderMap::from_option(config.github_provider_map.as_deref()),
            filter: ReviewFilter::new(config.ignore_label()),
            provider: config.provider.clone(),
        })
    }

    /// Fetch, filter and render without dispatching.
    ///
    /// # Errors
    ///
    /// Returns [`PrbellError::GitHub`] if either fetch fails. Both fetches
    /// must succeed; a partial result is never used.
    pub async fn prepare(&self) -> Result<PreparedReminder, PrbellError> {
        let (prs, required) = tokio::try_join!(
            self.source.open_pull_requests(),
            self.source.review_required_urls()
        )?;

        let open_pull_requests = prs.len();
        let result = self.filter.apply(prs, &required);
        let aggregated = aggregate(&result.kept);

        let mut degradations = self.provider_map.degradations();
        if !aggregated.is_empty() {
            degradations.extend(unmapped_users(&aggregated, &self.provider_map));
        }
        for d in &degradations {
            tracing::warn!("{d}");
        }

        let (body, envelope) = if aggregated.is_empty() {
            (String::new(), None)
        } else {
            (
                self.formatter.render(&aggregated, &self.provider_map),
                Some(self.formatter.envelope(&aggregated, &self.provider_map)),
            )
        };

        tracing::info!(
            open = open_pull_requests,
            required = required.len(),
            notify = aggregated.len(),
            "triaged pull requests"
        );

        let report = RunReport {
            open_pull_requests,
            review_required: required.len(),
            pull_requests_to_notify: aggregated.len(),
            reviewers: count_reviewers(&result.kept),
            provider: self.provider.clone(),
            notified: false,
            webhook_status: None,
            pull_requests: aggregated,
            skipped: result
                .skipped
                .into_iter()
                .map(|s| SkippedEntry {
                    url: s.url,
                    reason: s.reason.to_string(),
                })
                .collect(),
            degradations,
        };

        Ok(PreparedReminder {
            report,
            body,
            envelope,
        })
    }

    /// Run the whole reminder and post the message to `webhook_url`.
    ///
    /// The dispatcher is called exactly once when at least one pull request
    /// qualifies and not at all otherwise.
    ///
    /// # Errors
    ///
    /// Returns the first fetch or dispatch failure.
    pub async fn run(
        &self,
        dispatcher: &dyn NotificationDispatcher,
        webhook_url: &str,
    ) -> Result<RunReport, PrbellError> {
        let PreparedReminder {
            mut report,
            envelope,
            ..
        } = self.prepare().await?;

        let Some(envelope) = envelope else {
            tracing::info!("no pull requests need review, skipping notification");
            return Ok(report);
        };

        let receipt = dispatcher.dispatch(webhook_url, &envelope).await?;
        tracing::info!(
            webhook = %redact(webhook_url),
            status = receipt.status,
            "notification sent"
        );

        report.notified = true;
        report.webhook_status = Some(receipt.status);
        Ok(report)
    }
}

/// Collect degradations without building a pipeline, e.g. for `doctor`.
pub fn map_degradations(config: &NotifyConfig) -> Vec<Degradation> {
    ProviderMap::from_option(config.github_provider_map.as_deref()).degradations()
}
