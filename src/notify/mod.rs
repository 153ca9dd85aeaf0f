//! Outbound notification sink
//!
//! The pipeline hands the sink two record lists (added, updated) and moves
//! on; a sink failure never fails the crawl/merge stages. The GitHub-issue
//! sink is the only implementation, chosen because the watcher runs as a
//! scheduled job in CI where an issue tracker is already at hand.

mod github;

pub use github::GitHubNotifier;

use crate::listing::ListingRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while sending a notification
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notification API returned HTTP {status}")]
    Api { status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for notification operations
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Boundary for delivering listing alerts
///
/// `notify` returns `Ok(true)` when a notification was actually delivered and
/// `Ok(false)` when there was nothing to send or the sink is disabled.
#[async_trait]
pub trait NotificationSink {
    async fn notify(
        &self,
        added: &[ListingRecord],
        updated: &[ListingRecord],
    ) -> NotifyResult<bool>;
}

/// Formats a single listing as a markdown block
pub fn format_listing_markdown(listing: &ListingRecord) -> String {
    let price = match listing.price {
        Some(price) => format!("€{:.0}", price),
        None => "Unknown".to_string(),
    };
    let size = match listing.size {
        Some(size) => format!("{} m²", size),
        None => "Unknown".to_string(),
    };
    let rooms = match listing.rooms {
        Some(rooms) => rooms.to_string(),
        None => "Unknown".to_string(),
    };

    let mut markdown = format!("#### [{}]({})\n", listing.title, listing.url);
    markdown.push_str(&format!("- **Price:** {}\n", price));
    markdown.push_str(&format!("- **Size:** {}\n", size));
    markdown.push_str(&format!("- **Rooms:** {}\n", rooms));
    markdown.push_str(&format!("- **Location:** {}\n", listing.location));
    markdown.push_str(&format!("- **Interior:** {}\n", listing.interior));
    markdown.push_str(&format!("- **Agency:** {}\n", listing.agency));

    if let Some(image_url) = &listing.image_url {
        markdown.push_str(&format!("\n![Apartment]({})\n", image_url));
    }

    markdown.push_str("\n---\n\n");
    markdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::UNKNOWN;
    use chrono::Utc;

    fn listing() -> ListingRecord {
        ListingRecord {
            id: "test123".to_string(),
            url: "https://www.pararius.com/apartment-for-rent/den-haag/test123".to_string(),
            title: "Test Apartment".to_string(),
            price: Some(1500.0),
            size: Some(75),
            rooms: Some(3),
            location: "Den Haag, Centrum".to_string(),
            interior: "Furnished".to_string(),
            image_url: Some("https://www.pararius.com/images/test.jpg".to_string()),
            agency: "Test Agency".to_string(),
            first_seen: Utc::now(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_format_listing_markdown() {
        let markdown = format_listing_markdown(&listing());

        assert!(markdown.contains(
            "#### [Test Apartment](https://www.pararius.com/apartment-for-rent/den-haag/test123)"
        ));
        assert!(markdown.contains("- **Price:** €1500"));
        assert!(markdown.contains("- **Size:** 75 m²"));
        assert!(markdown.contains("- **Rooms:** 3"));
        assert!(markdown.contains("![Apartment](https://www.pararius.com/images/test.jpg)"));
    }

    #[test]
    fn test_format_listing_without_optional_fields() {
        let mut record = listing();
        record.price = None;
        record.size = None;
        record.rooms = None;
        record.image_url = None;
        record.agency = UNKNOWN.to_string();

        let markdown = format_listing_markdown(&record);

        assert!(markdown.contains("- **Price:** Unknown"));
        assert!(markdown.contains("- **Size:** Unknown"));
        assert!(!markdown.contains("![Apartment]"));
    }
}
