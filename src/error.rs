//! Error types for query construction.
//!
//! The builder has exactly one failure mode: declaring a combination pattern
//! twice on the same [`FilterBuilder`](crate::filter::FilterBuilder). A
//! suppressed filter (an accessor or pipeline yielding
//! [`FilterValue::Null`](crate::filter::FilterValue::Null)) is normal control
//! flow, never an error.
//!
//! ```rust
//! use odata_form_query::{QueryError, QueryResult};
//!
//! fn check(result: QueryResult<()>) {
//!     if let Err(QueryError::GraphAlreadySet) = result {
//!         eprintln!("declaration bug: {}", QueryError::GraphAlreadySet);
//!     }
//! }
//! ```

use thiserror::Error;

/// Result type for query construction.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while declaring or materializing a query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The combination pattern was declared more than once.
    #[error("combination graph already set: graph() can only be called once per filter builder")]
    GraphAlreadySet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_already_set_message() {
        let err = QueryError::GraphAlreadySet;
        assert!(err.to_string().contains("only be called once"));
    }
}
