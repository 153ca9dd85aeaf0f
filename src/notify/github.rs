//! GitHub-issue notification sink
//!
//! Creates one issue per run with the new and updated listings rendered as
//! markdown. Credentials come from the environment the scheduled job already
//! provides (`GITHUB_TOKEN`, `GITHUB_REPOSITORY`); without them the sink is
//! disabled and reports nothing sent.

use crate::config::SearchConfig;
use crate::listing::ListingRecord;
use crate::notify::{format_listing_markdown, NotificationSink, NotifyError, NotifyResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One appended entry in the notification history file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub timestamp: DateTime<Utc>,
    pub new_listings_count: usize,
    pub updated_listings_count: usize,
    pub new_listing_ids: Vec<String>,
    pub updated_listing_ids: Vec<String>,
}

/// Notification sink that opens GitHub issues
pub struct GitHubNotifier {
    client: Client,
    token: Option<String>,
    repository: Option<String>,
    api_base: String,
    history_path: PathBuf,
    search_params: String,
}

impl GitHubNotifier {
    /// Creates a notifier with explicit credentials
    pub fn new(
        token: Option<String>,
        repository: Option<String>,
        search: &SearchConfig,
        history_path: impl Into<PathBuf>,
    ) -> Self {
        let search_params =
            serde_json::to_string_pretty(search).unwrap_or_else(|_| "{}".to_string());

        Self {
            client: Client::new(),
            token,
            repository,
            api_base: "https://api.github.com".to_string(),
            history_path: history_path.into(),
            search_params,
        }
    }

    /// Creates a notifier from the CI environment
    ///
    /// `GITHUB_TOKEN` and `GITHUB_REPOSITORY` are both provided automatically
    /// inside GitHub Actions; missing either disables the sink.
    pub fn from_env(search: &SearchConfig, history_path: impl Into<PathBuf>) -> Self {
        let token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        let repository = std::env::var("GITHUB_REPOSITORY")
            .ok()
            .filter(|r| !r.is_empty());

        if token.is_none() || repository.is_none() {
            tracing::info!(
                "GitHub notifications disabled (missing GITHUB_TOKEN or GITHUB_REPOSITORY)"
            );
        }

        Self::new(token, repository, search, history_path)
    }

    /// Overrides the API base URL (GitHub Enterprise, tests)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn enabled(&self) -> bool {
        self.token.is_some() && self.repository.is_some()
    }

    /// Builds the issue title and markdown body
    fn build_issue_content(
        &self,
        added: &[ListingRecord],
        updated: &[ListingRecord],
    ) -> (String, String) {
        let today = Utc::now().format("%Y-%m-%d");
        let title = format!(
            "🏠 New Apartment Listings: {} new listings found - {}",
            added.len(),
            today
        );

        let mut body = String::from("## Apartment Alerts\n\n");

        body.push_str("### 🔍 Search Parameters\n");
        body.push_str("```json\n");
        body.push_str(&self.search_params);
        body.push_str("\n```\n\n");

        if !added.is_empty() {
            body.push_str(&format!("### 🆕 New Listings ({})\n\n", added.len()));
            for listing in added {
                body.push_str(&format_listing_markdown(listing));
            }
        }

        if !updated.is_empty() {
            body.push_str(&format!("\n### 🔄 Updated Listings ({})\n\n", updated.len()));
            for listing in updated {
                body.push_str(&format_listing_markdown(listing));
            }
        }

        body.push_str("\n---\n");
        body.push_str("*This issue was created automatically by rentwatch.*\n");

        (title, body)
    }

    /// Appends one entry to the notification history file
    fn append_history(
        &self,
        added: &[ListingRecord],
        updated: &[ListingRecord],
    ) -> NotifyResult<()> {
        if let Some(parent) = self.history_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut history: Vec<NotificationRecord> = match std::fs::read_to_string(&self.history_path)
        {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Vec::new(),
        };

        history.push(NotificationRecord {
            timestamp: Utc::now(),
            new_listings_count: added.len(),
            updated_listings_count: updated.len(),
            new_listing_ids: added.iter().map(|l| l.id.clone()).collect(),
            updated_listing_ids: updated.iter().map(|l| l.id.clone()).collect(),
        });

        std::fs::write(&self.history_path, serde_json::to_string_pretty(&history)?)?;
        tracing::info!("Notification history saved");
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for GitHubNotifier {
    async fn notify(
        &self,
        added: &[ListingRecord],
        updated: &[ListingRecord],
    ) -> NotifyResult<bool> {
        if added.is_empty() && updated.is_empty() {
            tracing::info!("No new or updated listings to notify about");
            return Ok(false);
        }

        if !self.enabled() {
            tracing::info!("Notifications are disabled, skipping");
            return Ok(false);
        }

        let (token, repository) = match (&self.token, &self.repository) {
            (Some(token), Some(repository)) => (token, repository),
            _ => return Ok(false),
        };

        let (title, body) = self.build_issue_content(added, updated);

        let api_url = format!("{}/repos/{}/issues", self.api_base, repository);
        let payload = serde_json::json!({
            "title": title,
            "body": body,
            "labels": ["notification", "new-listings"],
        });

        let response = self
            .client
            .post(&api_url)
            .header("Authorization", format!("token {}", token))
            .header("Accept", "application/vnd.github.v3+json")
            .header("User-Agent", "rentwatch")
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Api {
                status: status.as_u16(),
            });
        }

        let issue: serde_json::Value = response.json().await?;
        if let Some(issue_url) = issue.get("html_url").and_then(|v| v.as_str()) {
            tracing::info!("Notification issue created: {}", issue_url);
        }

        if let Err(e) = self.append_history(added, updated) {
            tracing::error!("Failed to save notification history: {}", e);
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PriceRange;
    use crate::listing::UNKNOWN;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn search_config() -> SearchConfig {
        SearchConfig {
            base_url: "https://www.pararius.com/apartments".to_string(),
            cities: vec!["rotterdam".to_string()],
            price_range: PriceRange {
                min: Some(800),
                max: Some(1500),
            },
            min_bedrooms: None,
            min_size: None,
        }
    }

    fn listing(id: &str) -> ListingRecord {
        ListingRecord {
            id: id.to_string(),
            url: format!("https://www.pararius.com/apartment-for-rent/rotterdam/{}", id),
            title: format!("Listing {}", id),
            price: Some(1200.0),
            size: Some(75),
            rooms: Some(3),
            location: "Rotterdam".to_string(),
            interior: UNKNOWN.to_string(),
            agency: UNKNOWN.to_string(),
            image_url: None,
            first_seen: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_notify_creates_issue_and_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/owner/repo/issues"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "html_url": "https://github.com/owner/repo/issues/1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let history_path = dir.path().join("history.json");
        let notifier = GitHubNotifier::new(
            Some("secret".to_string()),
            Some("owner/repo".to_string()),
            &search_config(),
            &history_path,
        )
        .with_api_base(server.uri());

        let sent = notifier.notify(&[listing("a")], &[]).await.unwrap();
        assert!(sent);

        let history: Vec<NotificationRecord> =
            serde_json::from_str(&std::fs::read_to_string(&history_path).unwrap()).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].new_listing_ids, vec!["a".to_string()]);
        assert_eq!(history[0].updated_listings_count, 0);
    }

    #[tokio::test]
    async fn test_disabled_notifier_sends_nothing() {
        let dir = TempDir::new().unwrap();
        let notifier = GitHubNotifier::new(
            None,
            None,
            &search_config(),
            dir.path().join("history.json"),
        );

        let sent = notifier.notify(&[listing("a")], &[]).await.unwrap();
        assert!(!sent);
        assert!(!dir.path().join("history.json").exists());
    }

    #[tokio::test]
    async fn test_nothing_to_send() {
        let dir = TempDir::new().unwrap();
        let notifier = GitHubNotifier::new(
            Some("secret".to_string()),
            Some("owner/repo".to_string()),
            &search_config(),
            dir.path().join("history.json"),
        );

        let sent = notifier.notify(&[], &[]).await.unwrap();
        assert!(!sent);
    }

    #[tokio::test]
    async fn test_api_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/owner/repo/issues"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let notifier = GitHubNotifier::new(
            Some("secret".to_string()),
            Some("owner/repo".to_string()),
            &search_config(),
            dir.path().join("history.json"),
        )
        .with_api_base(server.uri());

        let result = notifier.notify(&[listing("a")], &[]).await;
        assert!(matches!(result, Err(NotifyError::Api { status: 403 })));
    }

    #[test]
    fn test_issue_content_sections() {
        let dir = TempDir::new().unwrap();
        let notifier = GitHubNotifier::new(
            Some("secret".to_string()),
            Some("owner/repo".to_string()),
            &search_config(),
            dir.path().join("history.json"),
        );

        let (title, body) =
            notifier.build_issue_content(&[listing("a"), listing("b")], &[listing("c")]);

        assert!(title.contains("2 new listings found"));
        assert!(body.contains("### 🔍 Search Parameters"));
        assert!(body.contains("### 🆕 New Listings (2)"));
        assert!(body.contains("### 🔄 Updated Listings (1)"));
    }
}
