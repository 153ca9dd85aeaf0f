//! HTTP fetcher implementation
//!
//! One logical page fetch with bounded retries and the mandatory politeness
//! delay. A fetch that exhausts its retries reports failure to the caller and
//! is never retried again; deciding whether to abandon the city or the crawl
//! is the page walker's business, not the fetcher's.

use crate::config::CrawlerConfig;
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent string sent with every request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one page with retries and rate-limit discipline
///
/// Attempts up to `max_retries` times. A transport error or non-2xx response
/// triggers a `request_delay * 2` wait before the next attempt; when the final
/// attempt fails, `None` is returned and the page is treated as unavailable.
///
/// On success the fetcher waits exactly `request_delay` before returning the
/// body. The delay is mandatory even on success and applies once per
/// successful fetch, not per attempt.
pub async fn fetch_page(client: &Client, url: &str, crawler: &CrawlerConfig) -> Option<String> {
    for attempt in 1..=crawler.max_retries {
        tracing::info!("Requesting {}", url);

        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => {
                    tokio::time::sleep(Duration::from_secs(crawler.request_delay)).await;
                    return Some(body);
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to read body (attempt {}/{}): {}",
                        attempt,
                        crawler.max_retries,
                        e
                    );
                }
            },
            Ok(response) => {
                tracing::warn!(
                    "Request failed with HTTP {} (attempt {}/{})",
                    response.status(),
                    attempt,
                    crawler.max_retries
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Request failed (attempt {}/{}): {}",
                    attempt,
                    crawler.max_retries,
                    e
                );
            }
        }

        if attempt == crawler.max_retries {
            tracing::error!("Max retries reached for {}", url);
            return None;
        }

        // Longer delay between retries
        tokio::time::sleep(Duration::from_secs(crawler.request_delay * 2)).await;
    }

    None
}
