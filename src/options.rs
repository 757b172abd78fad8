//! Paging, ordering, and count options supplied per materialization.
//!
//! ```rust
//! use odata_form_query::QueryOptions;
//!
//! // Documented defaults: count on, top 20, no ordering, nothing skipped.
//! let options = QueryOptions::default();
//! assert!(options.count);
//! assert_eq!(options.top, 20);
//!
//! // Page 2 of 10, ordered by name, without the total count.
//! let options = QueryOptions::new()
//!     .count(false)
//!     .order_by("userName")
//!     .skip(10)
//!     .top(10);
//! assert_eq!(options.skip, Some(10));
//! ```

use serde::{Deserialize, Serialize};

/// Non-filter query options, merged into the query at materialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Request the total number of matching records alongside the page.
    #[serde(rename = "$count")]
    pub count: bool,
    /// Property to sort the requested resources by, ascending.
    #[serde(rename = "$orderBy")]
    pub order_by: Option<String>,
    /// Number of leading resources to skip; `None` skips nothing.
    #[serde(rename = "$skip")]
    pub skip: Option<u64>,
    /// Maximum number of resources to request.
    #[serde(rename = "$top")]
    pub top: u64,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            count: true,
            order_by: None,
            skip: None,
            top: 20,
        }
    }
}

impl QueryOptions {
    /// Create options with the documented defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the total count is requested.
    pub fn count(mut self, count: bool) -> Self {
        self.count = count;
        self
    }

    /// Set the property to order by.
    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// Set the number of resources to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set the maximum number of resources to request.
    pub fn top(mut self, top: u64) -> Self {
        self.top = top;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let options = QueryOptions::default();
        assert!(options.count);
        assert_eq!(options.order_by, None);
        assert_eq!(options.skip, None);
        assert_eq!(options.top, 20);
    }

    #[test]
    fn test_options_fluent_setters() {
        let options = QueryOptions::new()
            .count(false)
            .order_by("stringType")
            .skip(5)
            .top(10);
        assert!(!options.count);
        assert_eq!(options.order_by.as_deref(), Some("stringType"));
        assert_eq!(options.skip, Some(5));
        assert_eq!(options.top, 10);
    }
}
