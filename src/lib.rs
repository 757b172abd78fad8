//! # odata-form-query
//!
//! Fluent, type-safe builder that maps filter-form state to OData list
//! queries.
//!
//! Calling code declares, once, how each field of a search/filter form maps
//! to a query predicate. Re-applying that declaration to successive snapshots
//! of the form produces a structured [`Query`] (filter expression, paging,
//! ordering, count flag) or its serialized string form.
//!
//! ## Declaring filters
//!
//! ```rust
//! use odata_form_query::{QueryBuilder, ValueSpec};
//!
//! struct ProductSearch {
//!     name: Option<String>,
//!     max_price: Option<f64>,
//! }
//!
//! let products = QueryBuilder::new().filters(|f| {
//!     Ok(f
//!         .contains("productName", ValueSpec::read(|form: &ProductSearch| form.name.clone()))
//!         .lower_than_or_equal("price", ValueSpec::read(|form: &ProductSearch| form.max_price)))
//! });
//!
//! let form = ProductSearch {
//!     name: Some("gear".to_string()),
//!     max_price: Some(99.5),
//! };
//!
//! let query = products.to_query(&form).unwrap();
//! assert_eq!(
//!     query.filter.as_deref(),
//!     Some("contains(productName, 'gear') and price le 99.5")
//! );
//!
//! // Empty form fields resolve to null and drop their predicate.
//! let form = ProductSearch { name: None, max_price: None };
//! assert_eq!(products.to_query(&form).unwrap().filter, None);
//! ```
//!
//! ## Query options and the string form
//!
//! ```rust
//! use odata_form_query::{QueryBuilder, QueryOptions};
//!
//! let builder = QueryBuilder::<()>::new();
//! let options = QueryOptions::new().count(false).order_by("name").skip(40).top(20);
//!
//! let text = builder.to_query_string_with(&(), options).unwrap();
//! assert_eq!(text, "$orderBy=name$skip=40$top=20");
//! ```
//!
//! ## Transformation pipelines
//!
//! A pipeline reshapes the resolved value before it is rendered; returning
//! [`FilterValue::Null`] suppresses the predicate for that snapshot. This is
//! how a predicate becomes conditional:
//!
//! ```rust
//! use odata_form_query::{FilterValue, QueryBuilder, ValueSpec};
//!
//! struct OrderSearch {
//!     min_total: Option<i64>,
//! }
//!
//! let orders = QueryBuilder::new().filters(|f| {
//!     Ok(f.greater_than(
//!         "total",
//!         ValueSpec::read(|form: &OrderSearch| form.min_total).pipe(|value, _form| {
//!             // Ignore non-positive thresholds instead of filtering on them.
//!             match value.as_i64() {
//!                 Some(n) if n > 0 => FilterValue::Int(n),
//!                 _ => FilterValue::Null,
//!             }
//!         }),
//!     ))
//! });
//!
//! let query = orders.to_query(&OrderSearch { min_total: Some(0) }).unwrap();
//! assert_eq!(query.filter, None);
//! ```
//!
//! ## Combination graphs
//!
//! By default surviving predicates are conjoined with `and`. A custom graph
//! combines them with any pattern; placeholders are numbered over the
//! predicates that survive, in surviving order:
//!
//! ```rust
//! use odata_form_query::{QueryBuilder, ValueSpec};
//!
//! struct IssueSearch {
//!     text: Option<String>,
//! }
//!
//! let issues = QueryBuilder::new().filters(|f| {
//!     f.contains("title", ValueSpec::read(|form: &IssueSearch| form.text.clone()))
//!         .contains("body", ValueSpec::read(|form: &IssueSearch| form.text.clone()))
//!         .graph("$1 or $2")
//! });
//!
//! let form = IssueSearch { text: Some("panic".to_string()) };
//! let query = issues.to_query(&form).unwrap();
//! assert_eq!(
//!     query.filter.as_deref(),
//!     Some("contains(title, 'panic') or contains(body, 'panic')")
//! );
//! ```
//!
//! Setting a graph twice is a configuration error and aborts the
//! materialization:
//!
//! ```rust
//! use odata_form_query::{QueryBuilder, QueryError};
//!
//! let broken = QueryBuilder::<()>::new()
//!     .filters(|f| f.equals("a", 1).graph("$1")?.graph("$1"));
//!
//! assert_eq!(broken.to_query(&()).unwrap_err(), QueryError::GraphAlreadySet);
//! ```

pub mod error;
pub mod filter;
pub mod logging;
pub mod options;
pub mod query;

pub use error::{QueryError, QueryResult};
pub use filter::{Accessor, FieldName, FilterBuilder, FilterValue, Pipeline, ValueSpec};
pub use options::QueryOptions;
pub use query::{Query, QueryBuilder};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::filter::{FieldName, FilterBuilder, FilterValue, ValueSpec};
    pub use crate::options::QueryOptions;
    pub use crate::query::{Query, QueryBuilder};
}
