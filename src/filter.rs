//! Filter declaration and filter-string assembly.
//!
//! A [`FilterBuilder`] accumulates an ordered list of filter fragments, one
//! per declared predicate. Each fragment names a field of the remote schema,
//! a value specification evaluated against the form snapshot at
//! materialization time, and a predicate template with two positional
//! placeholders (`$1` for the field, `$2` for the rendered value).
//!
//! # Declaring predicates
//!
//! ```rust
//! use odata_form_query::filter::{FilterBuilder, ValueSpec};
//!
//! struct SearchForm {
//!     name: Option<String>,
//!     min_age: Option<i64>,
//! }
//!
//! let builder = FilterBuilder::new()
//!     .contains("userName", ValueSpec::read(|form: &SearchForm| form.name.clone()))
//!     .greater_than_or_equal("age", ValueSpec::read(|form: &SearchForm| form.min_age));
//! ```
//!
//! # Value specifications
//!
//! A predicate value is either a literal scalar fixed at declaration time or
//! an accessor that reads the current form snapshot. Either kind can carry a
//! transformation pipeline and a quoting override:
//!
//! ```rust
//! use odata_form_query::filter::{FilterValue, ValueSpec};
//!
//! struct SearchForm {
//!     created_after: Option<String>,
//! }
//!
//! // Dates are serialized strings, but OData rejects quoted date literals.
//! let spec: ValueSpec<SearchForm> =
//!     ValueSpec::read(|form: &SearchForm| form.created_after.clone()).unquoted();
//!
//! // A pipeline returning `Null` suppresses the predicate for this snapshot.
//! let spec: ValueSpec<SearchForm> = ValueSpec::literal("").pipe(|value, _form| {
//!     match value.as_str() {
//!         Some("") | None => FilterValue::Null,
//!         Some(text) => FilterValue::String(text.trim().to_string()),
//!     }
//! });
//! ```

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use smol_str::SmolStr;
use std::fmt;
use tracing::{debug, trace};

use crate::error::{QueryError, QueryResult};

/// A scalar filter value.
///
/// This is the full set of value types a predicate can compare against:
/// scalars and null. Arrays and objects are not representable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value. A fragment resolving to null is dropped from the filter.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the boolean value, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the integer value, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the numeric value, widening integers to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Get the string value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Render the value in its OData literal form.
    ///
    /// Strings are wrapped in single quotes when `quote` is true; booleans
    /// and numbers always render bare, regardless of the flag.
    pub fn to_literal(&self, quote: bool) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::String(value) if quote => format!("'{}'", value),
            Self::String(value) => value.clone(),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// A remote field name.
///
/// Field names are declared explicitly as strings; nothing is derived from
/// the form type itself. Uses `SmolStr` internally, which stores names up to
/// 22 bytes inline.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FieldName(SmolStr);

impl FieldName {
    /// Create a new field name from any string-like type.
    #[inline]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(SmolStr::new(name.as_ref()))
    }

    /// Create from a static string (zero allocation).
    #[inline]
    pub const fn from_static(name: &'static str) -> Self {
        Self(SmolStr::new_static(name))
    }

    /// Get the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for FieldName {
    fn from(name: &str) -> Self {
        Self(SmolStr::new(name))
    }
}

impl From<String> for FieldName {
    fn from(name: String) -> Self {
        Self(SmolStr::new(&name))
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldName({:?})", self.as_str())
    }
}

/// Accessor reading a filter value from the form snapshot.
pub type Accessor<D> = Box<dyn Fn(&D) -> FilterValue + Send + Sync>;

/// Transformation pipeline applied to a resolved value before rendering.
///
/// Receives the resolved value and the full snapshot; returning
/// [`FilterValue::Null`] drops the fragment for this materialization.
pub type Pipeline<D> = Box<dyn Fn(FilterValue, &D) -> FilterValue + Send + Sync>;

enum ValueSource<D> {
    Literal(FilterValue),
    Accessor(Accessor<D>),
}

impl<D> fmt::Debug for ValueSource<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Accessor(_) => f.write_str("Accessor(..)"),
        }
    }
}

/// Specification of a predicate's comparison value.
///
/// Carries the value source (literal or accessor), an optional
/// transformation pipeline, and the quoting policy. Plain scalars convert
/// directly:
///
/// ```rust
/// use odata_form_query::filter::ValueSpec;
///
/// let spec: ValueSpec<()> = "open".into();
/// let spec: ValueSpec<()> = 42.into();
/// ```
pub struct ValueSpec<D> {
    source: ValueSource<D>,
    pipe: Option<Pipeline<D>>,
    quote: bool,
}

impl<D> ValueSpec<D> {
    /// A literal value fixed at declaration time.
    pub fn literal(value: impl Into<FilterValue>) -> Self {
        Self {
            source: ValueSource::Literal(value.into()),
            pipe: None,
            quote: true,
        }
    }

    /// A value read from the form snapshot at materialization time.
    pub fn read<F, V>(read: F) -> Self
    where
        F: Fn(&D) -> V + Send + Sync + 'static,
        V: Into<FilterValue>,
    {
        Self {
            source: ValueSource::Accessor(Box::new(move |form| read(form).into())),
            pipe: None,
            quote: true,
        }
    }

    /// Attach a transformation pipeline.
    ///
    /// The pipeline runs after the value is resolved and may return
    /// [`FilterValue::Null`] to drop the predicate for this snapshot.
    pub fn pipe<F, V>(mut self, pipe: F) -> Self
    where
        F: Fn(FilterValue, &D) -> V + Send + Sync + 'static,
        V: Into<FilterValue>,
    {
        self.pipe = Some(Box::new(move |value, form| pipe(value, form).into()));
        self
    }

    /// Render a string value without the surrounding single quotes.
    ///
    /// Useful when the value is a stringified date: the remote side parses
    /// `date gt 2024-01-01T00:00:00Z` but rejects the quoted form.
    pub fn unquoted(mut self) -> Self {
        self.quote = false;
        self
    }
}

impl<D> fmt::Debug for ValueSpec<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueSpec")
            .field("source", &self.source)
            .field("pipe", &self.pipe.as_ref().map(|_| ".."))
            .field("quote", &self.quote)
            .finish()
    }
}

impl<D> From<FilterValue> for ValueSpec<D> {
    fn from(value: FilterValue) -> Self {
        Self::literal(value)
    }
}

impl<D> From<bool> for ValueSpec<D> {
    fn from(value: bool) -> Self {
        Self::literal(value)
    }
}

impl<D> From<i32> for ValueSpec<D> {
    fn from(value: i32) -> Self {
        Self::literal(value)
    }
}

impl<D> From<i64> for ValueSpec<D> {
    fn from(value: i64) -> Self {
        Self::literal(value)
    }
}

impl<D> From<f64> for ValueSpec<D> {
    fn from(value: f64) -> Self {
        Self::literal(value)
    }
}

impl<D> From<&str> for ValueSpec<D> {
    fn from(value: &str) -> Self {
        Self::literal(value)
    }
}

impl<D> From<String> for ValueSpec<D> {
    fn from(value: String) -> Self {
        Self::literal(value)
    }
}

/// One declared filter predicate.
///
/// Immutable once created; the declaration API only appends fragments.
struct Fragment<D> {
    field: FieldName,
    source: ValueSource<D>,
    /// Predicate pattern with exactly two placeholders: `$1` for the field
    /// name, `$2` for the rendered value.
    template: &'static str,
    pipe: Option<Pipeline<D>>,
    quote: bool,
}

impl<D> Fragment<D> {
    /// Evaluate this fragment against a form snapshot.
    ///
    /// Returns `None` when the resolved (and piped) value is null, dropping
    /// the predicate from the filter entirely.
    fn render(&self, form: &D) -> Option<String> {
        let resolved = match &self.source {
            ValueSource::Literal(value) => value.clone(),
            ValueSource::Accessor(read) => read(form),
        };

        let value = match &self.pipe {
            Some(pipe) => pipe(resolved, form),
            None => resolved,
        };

        if value.is_null() {
            trace!(field = %self.field, "fragment suppressed by null value");
            return None;
        }

        let literal = value.to_literal(self.quote);
        Some(expand_pattern(self.template, &[self.field.as_str(), &literal]))
    }
}

impl<D> fmt::Debug for Fragment<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("field", &self.field)
            .field("template", &self.template)
            .field("quote", &self.quote)
            .finish()
    }
}

/// Collects filter declarations for one query materialization.
///
/// Built fresh for every materialization and discarded once the filter
/// string is produced. Fragment order is declaration order and determines
/// positional placeholder numbering in the combination step.
pub struct FilterBuilder<D> {
    fragments: SmallVec<[Fragment<D>; 4]>,
    graph: Option<String>,
}

impl<D> FilterBuilder<D> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            fragments: SmallVec::new(),
            graph: None,
        }
    }

    /// Declare `contains(<field>, <value>)`.
    pub fn contains(self, field: impl Into<FieldName>, value: impl Into<ValueSpec<D>>) -> Self {
        self.push(field.into(), value.into(), "contains($1, $2)")
    }

    /// Declare `<field> eq <value>`.
    pub fn equals(self, field: impl Into<FieldName>, value: impl Into<ValueSpec<D>>) -> Self {
        self.push(field.into(), value.into(), "$1 eq $2")
    }

    /// Declare `<field> gt <value>`.
    pub fn greater_than(self, field: impl Into<FieldName>, value: impl Into<ValueSpec<D>>) -> Self {
        self.push(field.into(), value.into(), "$1 gt $2")
    }

    /// Declare `<field> ge <value>`.
    pub fn greater_than_or_equal(
        self,
        field: impl Into<FieldName>,
        value: impl Into<ValueSpec<D>>,
    ) -> Self {
        self.push(field.into(), value.into(), "$1 ge $2")
    }

    /// Declare `<field> lt <value>`.
    pub fn lower_than(self, field: impl Into<FieldName>, value: impl Into<ValueSpec<D>>) -> Self {
        self.push(field.into(), value.into(), "$1 lt $2")
    }

    /// Declare `<field> le <value>`.
    pub fn lower_than_or_equal(
        self,
        field: impl Into<FieldName>,
        value: impl Into<ValueSpec<D>>,
    ) -> Self {
        self.push(field.into(), value.into(), "$1 le $2")
    }

    /// Set the combination pattern for the declared predicates.
    ///
    /// The pattern's positional placeholders (`$1`, `$2`, ...) are numbered
    /// over the fragments that survive evaluation, in surviving order: a
    /// suppressed fragment shifts every later index down by one.
    ///
    /// Setting the pattern twice on the same builder is a configuration
    /// error.
    pub fn graph(mut self, pattern: impl Into<String>) -> QueryResult<Self> {
        if self.graph.is_some() {
            return Err(QueryError::GraphAlreadySet);
        }
        self.graph = Some(pattern.into());
        Ok(self)
    }

    fn push(mut self, field: FieldName, spec: ValueSpec<D>, template: &'static str) -> Self {
        let ValueSpec { source, pipe, quote } = spec;
        self.fragments.push(Fragment {
            field,
            source,
            template,
            pipe,
            quote,
        });
        self
    }

    /// Evaluate all fragments against a snapshot and assemble the filter.
    ///
    /// Returns `None` when no fragment survives, regardless of any declared
    /// combination pattern.
    pub(crate) fn assemble(&self, form: &D) -> Option<String> {
        let rendered: Vec<String> = self
            .fragments
            .iter()
            .filter_map(|fragment| fragment.render(form))
            .collect();

        debug!(
            declared = self.fragments.len(),
            surviving = rendered.len(),
            "assembling filter"
        );

        if rendered.is_empty() {
            return None;
        }

        let filter = match &self.graph {
            Some(pattern) => {
                let parts: Vec<&str> = rendered.iter().map(String::as_str).collect();
                expand_pattern(pattern, &parts)
            }
            None => rendered.join(" and "),
        };

        Some(filter)
    }
}

impl<D> Default for FilterBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> fmt::Debug for FilterBuilder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterBuilder")
            .field("fragments", &self.fragments)
            .field("graph", &self.graph)
            .finish()
    }
}

/// Substitute positional placeholders in a single left-to-right pass.
///
/// `$k` (greedy over consecutive digits, so `$12` is placeholder twelve) is
/// replaced by `parts[k - 1]`. Substituted content is never re-scanned, so a
/// `$k` lookalike inside a part survives verbatim. Placeholders outside
/// `1..=parts.len()` are left untouched.
fn expand_pattern(pattern: &str, parts: &[&str]) -> String {
    let mut out =
        String::with_capacity(pattern.len() + parts.iter().map(|p| p.len()).sum::<usize>());
    let mut rest = pattern;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        let digits = tail
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(tail.len());

        match tail[..digits].parse::<usize>() {
            Ok(index) if index >= 1 && index <= parts.len() => {
                out.push_str(parts[index - 1]);
            }
            _ => {
                out.push('$');
                out.push_str(&tail[..digits]);
            }
        }
        rest = &tail[digits..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Form {
        text: Option<String>,
        number: Option<i64>,
    }

    impl Form {
        fn with_number(number: i64) -> Self {
            Self {
                text: None,
                number: Some(number),
            }
        }
    }

    #[test]
    fn test_filter_value_from() {
        assert_eq!(FilterValue::from(42i32), FilterValue::Int(42));
        assert_eq!(FilterValue::from("hello"), FilterValue::String("hello".to_string()));
        assert_eq!(FilterValue::from(true), FilterValue::Bool(true));
        assert_eq!(FilterValue::from(None::<i64>), FilterValue::Null);
        assert_eq!(FilterValue::from(Some("x")), FilterValue::String("x".to_string()));
    }

    #[test]
    fn test_filter_value_literal_quoting() {
        assert_eq!(FilterValue::from("foo").to_literal(true), "'foo'");
        assert_eq!(FilterValue::from("foo").to_literal(false), "foo");
        assert_eq!(FilterValue::Int(123).to_literal(true), "123");
        assert_eq!(FilterValue::Bool(true).to_literal(true), "true");
        assert_eq!(FilterValue::Float(1.5).to_literal(true), "1.5");
    }

    #[test]
    fn test_field_name_inline() {
        let field = FieldName::from_static("userName");
        assert_eq!(field.as_str(), "userName");
        assert_eq!(field.to_string(), "userName");
    }

    #[test]
    fn test_expand_pattern_single_pass() {
        // A part containing a placeholder lookalike is not re-substituted.
        assert_eq!(expand_pattern("$1 and $2", &["a $2 b", "c"]), "a $2 b and c");
    }

    #[test]
    fn test_expand_pattern_greedy_digits() {
        let parts: Vec<String> = (1..=12).map(|i| format!("p{}", i)).collect();
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        assert_eq!(expand_pattern("$12", &parts), "p12");
        assert_eq!(expand_pattern("$1 2", &parts), "p1 2");
    }

    #[test]
    fn test_expand_pattern_out_of_range_verbatim() {
        assert_eq!(expand_pattern("$1 or $3", &["a", "b"]), "a or $3");
        assert_eq!(expand_pattern("$0 or $1", &["a"]), "$0 or a");
    }

    #[test]
    fn test_expand_pattern_bare_dollar() {
        assert_eq!(expand_pattern("cost gt $1 in $", &["100"]), "cost gt 100 in $");
    }

    #[test]
    fn test_fragment_order_is_declaration_order() {
        let builder = FilterBuilder::new()
            .equals("first", 1)
            .equals("second", 2)
            .equals("third", 3);
        let filter = builder.assemble(&Form::with_number(0)).unwrap();
        assert_eq!(filter, "first eq 1 and second eq 2 and third eq 3");
    }

    #[test]
    fn test_accessor_reads_snapshot() {
        let builder = FilterBuilder::new()
            .equals("numberType", ValueSpec::read(|form: &Form| form.number));
        assert_eq!(
            builder.assemble(&Form::with_number(7)).as_deref(),
            Some("numberType eq 7")
        );
    }

    #[test]
    fn test_pipe_receives_value_and_snapshot() {
        let builder = FilterBuilder::new().lower_than(
            "numberType",
            ValueSpec::read(|form: &Form| form.number).pipe(|value, form| {
                assert_eq!(form.number, value.as_i64());
                value.as_i64().map(|n| n + 1)
            }),
        );
        assert_eq!(
            builder.assemble(&Form::with_number(123)).as_deref(),
            Some("numberType lt 124")
        );
    }

    #[test]
    fn test_null_accessor_suppresses_fragment() {
        let builder = FilterBuilder::new()
            .contains("stringType", ValueSpec::read(|form: &Form| form.text.clone()))
            .equals("numberType", ValueSpec::read(|form: &Form| form.number));
        let form = Form {
            text: None,
            number: Some(5),
        };
        assert_eq!(builder.assemble(&form).as_deref(), Some("numberType eq 5"));
    }

    #[test]
    fn test_all_suppressed_yields_none() {
        let builder = FilterBuilder::new()
            .equals("numberType", ValueSpec::literal(1).pipe(|_, _| FilterValue::Null));
        assert_eq!(builder.assemble(&Form::with_number(0)), None);
    }

    #[test]
    fn test_graph_renumbers_surviving_fragments() {
        let form = Form {
            text: Some("abc".to_string()),
            number: Some(10),
        };
        let builder = FilterBuilder::new()
            .contains("stringType", ValueSpec::read(|form: &Form| form.text.clone()))
            .equals("dropped", ValueSpec::literal(1).pipe(|_, _| FilterValue::Null))
            .greater_than("numberType", ValueSpec::read(|form: &Form| form.number))
            .graph("$1 or $2")
            .unwrap();
        assert_eq!(
            builder.assemble(&form).as_deref(),
            Some("contains(stringType, 'abc') or numberType gt 10")
        );
    }

    #[test]
    fn test_graph_set_twice_is_error() {
        let result = FilterBuilder::<Form>::new().graph("$1").unwrap().graph("$1");
        assert_eq!(result.unwrap_err(), QueryError::GraphAlreadySet);
    }

    #[test]
    fn test_graph_ignored_when_nothing_survives() {
        let builder = FilterBuilder::new()
            .equals("numberType", ValueSpec::literal(1).pipe(|_, _| FilterValue::Null))
            .graph("$1")
            .unwrap();
        assert_eq!(builder.assemble(&Form::with_number(0)), None);
    }

    #[test]
    fn test_unquoted_string_value() {
        let builder = FilterBuilder::new()
            .greater_than("created", ValueSpec::literal("2024-01-01T00:00:00Z").unquoted());
        assert_eq!(
            builder.assemble(&Form::with_number(0)).as_deref(),
            Some("created gt 2024-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_quoting_never_applies_to_numbers() {
        // The flag defaults to true; only string values are ever quoted.
        let builder = FilterBuilder::new().contains("numberType", 123);
        assert_eq!(
            builder.assemble(&Form::with_number(0)).as_deref(),
            Some("contains(numberType, 123)")
        );
    }
}
