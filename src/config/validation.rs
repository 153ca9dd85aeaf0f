use crate::config::types::{Config, CrawlerConfig, PriceRange, SearchConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
///
/// A configuration that fails validation is fatal: the pipeline must abort
/// before any fetch occurs.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_search_config(&config.search)?;
    validate_crawler_config(&config.crawler)?;
    Ok(())
}

/// Validates search configuration
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.cities.is_empty() {
        return Err(ConfigError::Validation(
            "at least one city must be configured".to_string(),
        ));
    }

    for city in &config.cities {
        validate_city_slug(city)?;
    }

    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http(s), got '{}'",
            config.base_url
        )));
    }

    validate_price_range(&config.price_range)?;

    Ok(())
}

/// Validates a city slug as it appears in search URLs
///
/// City names are path segments, so they must be lowercase slugs like
/// `rotterdam` or `den-haag`.
fn validate_city_slug(city: &str) -> Result<(), ConfigError> {
    if city.is_empty() {
        return Err(ConfigError::Validation(
            "city name cannot be empty".to_string(),
        ));
    }

    if !city
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "city '{}' must be a lowercase slug (e.g. 'den-haag')",
            city
        )));
    }

    if city.starts_with('-') || city.ends_with('-') {
        return Err(ConfigError::Validation(format!(
            "city '{}' cannot start or end with '-'",
            city
        )));
    }

    Ok(())
}

/// Validates price bounds
fn validate_price_range(range: &PriceRange) -> Result<(), ConfigError> {
    if let (Some(min), Some(max)) = (range.min, range.max) {
        if min > max {
            return Err(ConfigError::Validation(format!(
                "price-range min ({}) cannot exceed max ({})",
                min, max
            )));
        }
    }
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_listings_age_days < 1 {
        return Err(ConfigError::Validation(format!(
            "max-listings-age-days must be >= 1, got {}",
            config.max_listings_age_days
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_city_slug() {
        assert!(validate_city_slug("rotterdam").is_ok());
        assert!(validate_city_slug("den-haag").is_ok());

        assert!(validate_city_slug("").is_err());
        assert!(validate_city_slug("Den Haag").is_err());
        assert!(validate_city_slug("-rotterdam").is_err());
        assert!(validate_city_slug("rotterdam-").is_err());
    }

    #[test]
    fn test_validate_price_range() {
        assert!(validate_price_range(&PriceRange {
            min: Some(800),
            max: Some(1500)
        })
        .is_ok());
        assert!(validate_price_range(&PriceRange {
            min: None,
            max: Some(1500)
        })
        .is_ok());
        assert!(validate_price_range(&PriceRange {
            min: Some(2000),
            max: Some(1500)
        })
        .is_err());
    }

    #[test]
    fn test_validate_crawler_config() {
        let mut crawler = CrawlerConfig {
            user_agent: "Mozilla/5.0 (Test)".to_string(),
            request_delay: 5,
            max_retries: 3,
            max_pages: 5,
            max_listings_age_days: 30,
        };
        assert!(validate_crawler_config(&crawler).is_ok());

        crawler.max_retries = 0;
        assert!(validate_crawler_config(&crawler).is_err());

        crawler.max_retries = 3;
        crawler.user_agent.clear();
        assert!(validate_crawler_config(&crawler).is_err());
    }
}
