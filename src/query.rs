//! Query materialization: the top-level builder and the output record.
//!
//! A [`QueryBuilder`] is constructed once and holds the filter-declaration
//! routine. Every call to [`QueryBuilder::to_query`] runs the routine against
//! a fresh [`FilterBuilder`], evaluates the declared fragments against the
//! supplied form snapshot, and merges the assembled filter with the
//! paging/order/count options into a [`Query`].
//!
//! ```rust
//! use odata_form_query::{QueryBuilder, ValueSpec};
//!
//! struct PersonSearch {
//!     name: Option<String>,
//!     min_age: Option<i64>,
//! }
//!
//! let people = QueryBuilder::new().filters(|f| {
//!     Ok(f
//!         .contains("userName", ValueSpec::read(|form: &PersonSearch| form.name.clone()))
//!         .greater_than_or_equal("age", ValueSpec::read(|form: &PersonSearch| form.min_age)))
//! });
//!
//! let form = PersonSearch {
//!     name: Some("ada".to_string()),
//!     min_age: Some(21),
//! };
//! let query = people.to_query(&form).unwrap();
//! assert_eq!(
//!     query.filter.as_deref(),
//!     Some("contains(userName, 'ada') and age ge 21")
//! );
//!
//! // Fields the form leaves empty drop out of the next materialization.
//! let form = PersonSearch { name: None, min_age: Some(21) };
//! let query = people.to_query(&form).unwrap();
//! assert_eq!(query.filter.as_deref(), Some("age ge 21"));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::QueryResult;
use crate::filter::FilterBuilder;
use crate::options::QueryOptions;

/// A materialized list query.
///
/// Built fresh on every materialization call; never retained by the builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Whether the result should carry the total number of matching records.
    #[serde(rename = "$count")]
    pub count: bool,
    /// The assembled filter expression; `None` when no predicate survived.
    #[serde(rename = "$filter")]
    pub filter: Option<String>,
    /// Property the resources are ordered by, ascending.
    #[serde(rename = "$orderBy")]
    pub order_by: Option<String>,
    /// Number of leading resources to skip.
    #[serde(rename = "$skip")]
    pub skip: Option<u64>,
    /// Maximum number of resources requested.
    #[serde(rename = "$top")]
    pub top: u64,
}

/// Serialized query-string form.
///
/// Fields are emitted in the fixed order `$count`, `$filter`, `$orderBy`,
/// `$skip`, `$top`, concatenated with no separator. A field is omitted when
/// its value is falsy: absent, `false`, zero, or an empty string, so
/// `$skip=0` and `$top=0` are never emitted.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count {
            f.write_str("$count=true")?;
        }
        if let Some(filter) = self.filter.as_deref() {
            if !filter.is_empty() {
                write!(f, "$filter={}", filter)?;
            }
        }
        if let Some(order_by) = self.order_by.as_deref() {
            if !order_by.is_empty() {
                write!(f, "$orderBy={}", order_by)?;
            }
        }
        if let Some(skip) = self.skip {
            if skip != 0 {
                write!(f, "$skip={}", skip)?;
            }
        }
        if self.top != 0 {
            write!(f, "$top={}", self.top)?;
        }
        Ok(())
    }
}

type DeclareFn<D> = Box<dyn Fn(FilterBuilder<D>) -> QueryResult<FilterBuilder<D>> + Send + Sync>;

/// Maps filter-form snapshots to list queries.
///
/// Holds only the filter-declaration routine; each materialization is
/// independent and leaves no state behind.
pub struct QueryBuilder<D> {
    declare: Option<DeclareFn<D>>,
}

impl<D> QueryBuilder<D> {
    /// Create a builder with no filter declarations.
    pub fn new() -> Self {
        Self { declare: None }
    }

    /// Store the filter-declaration routine, replacing any prior one.
    ///
    /// The routine is a pure description: it is not invoked here, but once
    /// per materialization, against a fresh [`FilterBuilder`].
    pub fn filters<F>(mut self, routine: F) -> Self
    where
        F: Fn(FilterBuilder<D>) -> QueryResult<FilterBuilder<D>> + Send + Sync + 'static,
    {
        self.declare = Some(Box::new(routine));
        self
    }

    /// Materialize a query from the current form snapshot, default options.
    pub fn to_query(&self, form: &D) -> QueryResult<Query> {
        self.to_query_with(form, QueryOptions::default())
    }

    /// Materialize a query from the current form snapshot.
    pub fn to_query_with(&self, form: &D, options: QueryOptions) -> QueryResult<Query> {
        let filter = match &self.declare {
            Some(declare) => declare(FilterBuilder::new())?.assemble(form),
            None => None,
        };

        debug!(filter = ?filter, "materialized query");

        Ok(Query {
            count: options.count,
            filter,
            order_by: options.order_by,
            skip: options.skip,
            top: options.top,
        })
    }

    /// Materialize and serialize a query, default options.
    pub fn to_query_string(&self, form: &D) -> QueryResult<String> {
        Ok(self.to_query(form)?.to_string())
    }

    /// Materialize and serialize a query.
    pub fn to_query_string_with(&self, form: &D, options: QueryOptions) -> QueryResult<String> {
        Ok(self.to_query_with(form, options)?.to_string())
    }
}

impl<D> Default for QueryBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> fmt::Debug for QueryBuilder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("declared", &self.declare.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::filter::{FilterValue, ValueSpec};

    struct Form {
        text: Option<String>,
    }

    #[test]
    fn test_no_declaration_yields_null_filter() {
        let builder = QueryBuilder::<Form>::new();
        let query = builder.to_query(&Form { text: None }).unwrap();
        assert_eq!(query.filter, None);
        assert!(query.count);
        assert_eq!(query.top, 20);
        assert_eq!(query.skip, None);
        assert_eq!(query.order_by, None);
    }

    #[test]
    fn test_materializations_are_independent() {
        let builder = QueryBuilder::new().filters(|f| {
            Ok(f.equals("stringType", ValueSpec::read(|form: &Form| form.text.clone())))
        });

        let first = builder.to_query(&Form { text: Some("a".to_string()) }).unwrap();
        let second = builder.to_query(&Form { text: Some("b".to_string()) }).unwrap();
        let third = builder.to_query(&Form { text: None }).unwrap();

        assert_eq!(first.filter.as_deref(), Some("stringType eq 'a'"));
        assert_eq!(second.filter.as_deref(), Some("stringType eq 'b'"));
        assert_eq!(third.filter, None);
    }

    #[test]
    fn test_filters_replaces_prior_routine() {
        let builder = QueryBuilder::new()
            .filters(|f: FilterBuilder<Form>| Ok(f.equals("old", 1)))
            .filters(|f: FilterBuilder<Form>| Ok(f.equals("new", 2)));
        let query = builder.to_query(&Form { text: None }).unwrap();
        assert_eq!(query.filter.as_deref(), Some("new eq 2"));
    }

    #[test]
    fn test_graph_error_propagates_to_materialization() {
        let builder = QueryBuilder::new().filters(|f: FilterBuilder<Form>| {
            f.equals("a", 1).graph("$1")?.graph("$1")
        });
        let err = builder.to_query(&Form { text: None }).unwrap_err();
        assert_eq!(err, QueryError::GraphAlreadySet);
    }

    #[test]
    fn test_display_field_order() {
        let query = Query {
            count: true,
            filter: Some("a eq 1".to_string()),
            order_by: Some("a".to_string()),
            skip: Some(5),
            top: 10,
        };
        assert_eq!(query.to_string(), "$count=true$filter=a eq 1$orderBy=a$skip=5$top=10");
    }

    #[test]
    fn test_display_omits_falsy_fields() {
        let query = Query {
            count: false,
            filter: None,
            order_by: Some(String::new()),
            skip: Some(0),
            top: 0,
        };
        assert_eq!(query.to_string(), "");
    }

    #[test]
    fn test_pipe_null_drops_filter_from_string() {
        let builder = QueryBuilder::new().filters(|f| {
            Ok(f.equals(
                "stringType",
                ValueSpec::read(|form: &Form| form.text.clone()).pipe(|_, _| FilterValue::Null),
            ))
        });
        let text = builder
            .to_query_string(&Form { text: Some("ignored".to_string()) })
            .unwrap();
        assert_eq!(text, "$count=true$top=20");
    }
}
