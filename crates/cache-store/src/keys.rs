//! Cache key formats.
//!
//! Listing keys carry every parameter that changes the page content,
//! including the current match count, so a page cached before an insert
//! can never be served after it.

use std::fmt;

/// Profile snapshot key: `user:<accountId>`.
pub fn profile(account_id: &str) -> String {
    format!("user:{account_id}")
}

/// Single saved analysis key: `singleAnalysisDetail:<recordId>`.
pub fn analysis_detail(record_id: &str) -> String {
    format!("singleAnalysisDetail:{record_id}")
}

/// Prefix shared by every listing page of one account.
///
/// The trailing `-analysisDetails-page:` keeps `user:42` from matching
/// pages of `user:420`.
pub fn listing_prefix(account_id: &str) -> String {
    format!("user:{account_id}-analysisDetails-page:")
}

/// Builder for a listing page key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingKey {
    account_id: String,
    page: i64,
    limit: i64,
    search_query: Option<String>,
    method: Option<String>,
    status: Option<i64>,
    total_items: i64,
}

impl ListingKey {
    pub fn new(account_id: impl Into<String>, page: i64, limit: i64) -> Self {
        Self {
            account_id: account_id.into(),
            page,
            limit,
            search_query: None,
            method: None,
            status: None,
            total_items: 0,
        }
    }

    pub fn search_query(mut self, query: Option<&str>) -> Self {
        self.search_query = query.filter(|q| !q.is_empty()).map(str::to_string);
        self
    }

    pub fn method(mut self, method: Option<&str>) -> Self {
        self.method = method.map(str::to_string);
        self
    }

    pub fn status(mut self, status: Option<i64>) -> Self {
        self.status = status;
        self
    }

    pub fn total_items(mut self, total_items: i64) -> Self {
        self.total_items = total_items;
        self
    }

    /// Row offset for this page, saturating at `i64::MAX`.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).max(0).saturating_mul(self.limit)
    }
}

impl fmt::Display for ListingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}-limit:{}-offset:{}",
            listing_prefix(&self.account_id),
            self.page,
            self.limit,
            self.offset()
        )?;
        if let Some(query) = &self.search_query {
            write!(f, "-searchQuery:{query}")?;
        }
        if let Some(method) = &self.method {
            write!(f, "-method:{method}")?;
        }
        if let Some(status) = self.status {
            write!(f, "-status:{status}")?;
        }
        write!(f, "-totalItems:{}", self.total_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_keys() {
        assert_eq!(profile("42"), "user:42");
        assert_eq!(analysis_detail("an-1"), "singleAnalysisDetail:an-1");
        assert_eq!(listing_prefix("42"), "user:42-analysisDetails-page:");
    }

    #[test]
    fn test_listing_key_minimal() {
        let key = ListingKey::new("42", 1, 9).total_items(0);
        assert_eq!(
            key.to_string(),
            "user:42-analysisDetails-page:1-limit:9-offset:0-totalItems:0"
        );
    }

    #[test]
    fn test_listing_key_all_filters() {
        let key = ListingKey::new("42", 3, 9)
            .search_query(Some("github"))
            .method(Some("GET"))
            .status(Some(200))
            .total_items(25);
        assert_eq!(
            key.to_string(),
            "user:42-analysisDetails-page:3-limit:9-offset:18-searchQuery:github-method:GET-status:200-totalItems:25"
        );
        assert!(key.to_string().starts_with(&listing_prefix("42")));
    }

    #[test]
    fn test_total_items_changes_key() {
        let before = ListingKey::new("42", 1, 9).total_items(3);
        let after = ListingKey::new("42", 1, 9).total_items(4);
        assert_ne!(before.to_string(), after.to_string());
    }

    #[test]
    fn test_offset_saturates() {
        assert_eq!(ListingKey::new("42", 0, 9).offset(), 0);
        assert_eq!(ListingKey::new("42", i64::MAX, 9).offset(), i64::MAX);
        assert_eq!(ListingKey::new("42", i64::MIN, 9).offset(), 0);
    }

    #[test]
    fn test_empty_search_is_omitted() {
        let key = ListingKey::new("1", 1, 9).search_query(Some("")).total_items(1);
        assert!(!key.to_string().contains("searchQuery"));
    }
}
