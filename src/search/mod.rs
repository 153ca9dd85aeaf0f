//! Search URL construction
//!
//! The source site encodes search filters as URL path segments in a fixed
//! order. Construction is a pure function of (city, filters, page) so it can
//! be tested without any network access, and must reproduce the site's segment
//! ordering exactly.

use crate::config::SearchConfig;

/// Builds the search URL for one city and result page
///
/// Segment order after the city: price range, bedrooms, size, page. The price
/// segment is `"{min}-{max}"` when both bounds are set, `"{min}+"` with only a
/// minimum, `"0-{max}"` with only a maximum, and omitted entirely when neither
/// bound is configured. The page segment is only present for pages after the
/// first.
pub fn build_search_url(search: &SearchConfig, city: &str, page: u32) -> String {
    let mut url = format!("{}/{}", search.base_url.trim_end_matches('/'), city);

    let mut segments: Vec<String> = Vec::new();

    match (search.price_range.min, search.price_range.max) {
        (Some(min), Some(max)) => segments.push(format!("{}-{}", min, max)),
        (Some(min), None) => segments.push(format!("{}+", min)),
        (None, Some(max)) => segments.push(format!("0-{}", max)),
        (None, None) => {}
    }

    if let Some(bedrooms) = search.min_bedrooms {
        segments.push(format!("{}-bedrooms", bedrooms));
    }

    if let Some(size) = search.min_size {
        segments.push(format!("{}-m2", size));
    }

    if !segments.is_empty() {
        url = format!("{}/{}", url, segments.join("/"));
    }

    if page > 1 {
        url = format!("{}/page-{}", url, page);
    }

    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PriceRange;

    fn search_config() -> SearchConfig {
        SearchConfig {
            base_url: "https://www.pararius.com/apartments".to_string(),
            cities: vec!["rotterdam".to_string()],
            price_range: PriceRange {
                min: Some(800),
                max: Some(1500),
            },
            min_bedrooms: Some(2),
            min_size: Some(50),
        }
    }

    #[test]
    fn test_full_filter_set() {
        let url = build_search_url(&search_config(), "rotterdam", 1);
        assert_eq!(
            url,
            "https://www.pararius.com/apartments/rotterdam/800-1500/2-bedrooms/50-m2"
        );
    }

    #[test]
    fn test_page_segment_appended() {
        let url = build_search_url(&search_config(), "den-haag", 3);
        assert_eq!(
            url,
            "https://www.pararius.com/apartments/den-haag/800-1500/2-bedrooms/50-m2/page-3"
        );
    }

    #[test]
    fn test_min_price_only() {
        let mut search = search_config();
        search.price_range = PriceRange {
            min: Some(1000),
            max: None,
        };
        let url = build_search_url(&search, "rotterdam", 1);
        assert_eq!(
            url,
            "https://www.pararius.com/apartments/rotterdam/1000+/2-bedrooms/50-m2"
        );
    }

    #[test]
    fn test_max_price_only() {
        let mut search = search_config();
        search.price_range = PriceRange {
            min: None,
            max: Some(2000),
        };
        let url = build_search_url(&search, "rotterdam", 1);
        assert_eq!(
            url,
            "https://www.pararius.com/apartments/rotterdam/0-2000/2-bedrooms/50-m2"
        );
    }

    #[test]
    fn test_no_filters() {
        let search = SearchConfig {
            base_url: "https://www.pararius.com/apartments".to_string(),
            cities: vec!["utrecht".to_string()],
            price_range: PriceRange::default(),
            min_bedrooms: None,
            min_size: None,
        };
        assert_eq!(
            build_search_url(&search, "utrecht", 1),
            "https://www.pararius.com/apartments/utrecht"
        );
        assert_eq!(
            build_search_url(&search, "utrecht", 2),
            "https://www.pararius.com/apartments/utrecht/page-2"
        );
    }
}
