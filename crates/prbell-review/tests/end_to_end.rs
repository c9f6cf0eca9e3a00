use prbell_core::{GithubConfig, NotifyConfig, PrbellError, Provider};
use prbell_notify::dispatch::WebhookDispatcher;
use prbell_review::github::GitHubClient;
use prbell_review::pipeline::ReminderPipeline;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pull(n: u32, reviewers: &[&str], teams: &[&str], labels: &[&str]) -> Value {
    json!({
        "url": format!("https://api.github.com/repos/acme/api/pulls/{n}"),
        "html_url": format!("https://github.com/acme/api/pull/{n}"),
        "number": n,
        "state": "open",
        "title": format!("Change {n}"),
        "requested_reviewers": reviewers.iter().map(|l| json!({"login": l, "id": 1})).collect::<Vec<_>>(),
        "requested_teams": teams.iter().map(|s| json!({"slug": s, "name": s})).collect::<Vec<_>>(),
        "labels": labels.iter().map(|l| json!({"name": l, "color": "ffffff"})).collect::<Vec<_>>(),
    })
}

fn search_hit(n: u32) -> Value {
    json!({
        "number": n,
        "pull_request": {
            "url": format!("https://api.github.com/repos/acme/api/pulls/{n}"),
            "html_url": format!("https://github.com/acme/api/pull/{n}"),
        }
    })
}

async fn mount_github(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/repos/acme/api/pulls"))
        .and(query_param("state", "open"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            pull(1, &["alice"], &["platform"], &[]),
            pull(2, &["bob"], &[], &["do-not-remind"]),
            pull(3, &["carol"], &[], &[]),
        ])))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search/issues"))
        .and(query_param(
            "q",
            "is:pr state:open review:required repo:acme/api",
        ))
        .and(query_param("sort", "updated"))
        .and(query_param("order", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 2,
            "incomplete_results": false,
            "items": [search_hit(1), search_hit(2)],
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn github(server: &MockServer) -> GithubConfig {
    GithubConfig {
        repository: Some("acme/api".into()),
        api_url: server.uri(),
        token: Some("ghp_test".into()),
        ..GithubConfig::default()
    }
}

#[tokio::test]
async fn slack_reminder_end_to_end() {
    let github_server = MockServer::start().await;
    mount_github(&github_server).await;

    let hook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/T/B/X"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&hook)
        .await;

    let notify = NotifyConfig {
        provider: Provider::Slack,
        channel: Some("#reviews".into()),
        github_provider_map: Some("alice:U1".into()),
        ignore_label: Some("do-not-remind".into()),
        ..NotifyConfig::default()
    };
    let client = GitHubClient::new(&github(&github_server)).unwrap();
    let pipeline = ReminderPipeline::new(&notify, Box::new(client)).unwrap();

    let report = pipeline
        .run(
            &WebhookDispatcher::new().unwrap(),
            &format!("{}/services/T/B/X", hook.uri()),
        )
        .await
        .unwrap();

    assert!(report.notified);
    assert_eq!(report.webhook_status, Some(200));
    assert_eq!(report.open_pull_requests, 3);
    assert_eq!(report.review_required, 2);
    assert_eq!(report.pull_requests_to_notify, 1);

    let requests = hook.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    pretty_assertions::assert_eq!(
        sent,
        json!({
            "channel": "#reviews",
            "username": "Pull Request reviews reminder",
            "text": "Pull Requests Needing Review:\n\n<https://github.com/acme/api/pull/1|Change 1> <@U1> @platform\n",
        })
    );
}

#[tokio::test]
async fn teams_reminder_end_to_end() {
    let github_server = MockServer::start().await;
    mount_github(&github_server).await;

    let hook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("1"))
        .expect(1)
        .mount(&hook)
        .await;

    let notify = NotifyConfig {
        provider: Provider::Teams,
        github_provider_map: Some("alice:29:alice-id".into()),
        ignore_label: Some("do-not-remind".into()),
        ..NotifyConfig::default()
    };
    let client = GitHubClient::new(&github(&github_server)).unwrap();
    let pipeline = ReminderPipeline::new(&notify, Box::new(client)).unwrap();
    let report = pipeline
        .run(&WebhookDispatcher::new().unwrap(), &hook.uri())
        .await
        .unwrap();

    assert_eq!(report.degradations.len(), 1);

    let requests = hook.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let card = &sent["attachments"][0]["content"];
    assert_eq!(
        card["body"][0]["text"],
        "[Change 1](https://github.com/acme/api/pull/1) <at>alice</at> <at>platform</at>\n"
    );
    assert_eq!(card["msteams"]["entities"][0]["mentioned"]["id"], "29:alice-id");
    assert_eq!(card["msteams"]["entities"][1]["text"], "<at>platform</at>");
}

#[tokio::test]
async fn github_failure_means_no_webhook_call() {
    let github_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/api/pulls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&github_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/issues"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "API rate limit exceeded",
            "documentation_url": "https://docs.github.com/rest"
        })))
        .mount(&github_server)
        .await;

    let hook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&hook)
        .await;

    let notify = NotifyConfig {
        provider: Provider::Teams,
        ..NotifyConfig::default()
    };
    let client = GitHubClient::new(&github(&github_server)).unwrap();
    let pipeline = ReminderPipeline::new(&notify, Box::new(client)).unwrap();
    let err = pipeline
        .run(&WebhookDispatcher::new().unwrap(), &hook.uri())
        .await
        .unwrap_err();

    assert!(matches!(err, PrbellError::GitHub(_)));
}

#[tokio::test]
async fn empty_repository_sends_nothing() {
    let github_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/api/pulls"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&github_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/issues"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"total_count": 0, "items": []})),
        )
        .mount(&github_server)
        .await;

    let hook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&hook)
        .await;

    let notify = NotifyConfig {
        provider: Provider::Slack,
        channel: Some("#reviews".into()),
        ..NotifyConfig::default()
    };
    let client = GitHubClient::new(&github(&github_server)).unwrap();
    let report = ReminderPipeline::new(&notify, Box::new(client))
        .unwrap()
        .run(&WebhookDispatcher::new().unwrap(), &hook.uri())
        .await
        .unwrap();

    assert!(!report.notified);
    assert_eq!(report.open_pull_requests, 0);
}
