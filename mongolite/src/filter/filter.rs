use crate::collection::Document;
use crate::common::constants::DOC_ID;
use crate::common::Value;
use crate::errors::MongoliteResult;
use crate::filter::logical_filters::{AndFilter, NotFilter, OrFilter};
use crate::filter::EqualsFilter;
use std::any::Any;
use std::fmt::Display;
use std::ops::Deref;
use std::sync::Arc;

/// Trait implemented by every concrete filter.
///
/// # Purpose
///
/// `FilterProvider` is the evaluation seam of the query engine: a filter is a
/// side-effect-free predicate over documents. Evaluation never fails on a kind
/// mismatch between a field and an operand; incomparable pairings degrade to
/// "no match" so one heterogeneous field cannot abort a whole scan.
pub trait FilterProvider: Any + Send + Sync + Display {
    /// Applies the filter to a document and returns whether it matches.
    ///
    /// # Arguments
    ///
    /// * `entry` - The document to evaluate
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the document matches the filter, `Ok(false)` otherwise
    fn apply(&self, entry: &Document) -> MongoliteResult<bool>;

    /// Field/value pairs this filter matches by plain equality.
    ///
    /// Used to seed the base document of an upsert so that an inserted
    /// document satisfies the filter that selected it. Filters without an
    /// equality component contribute nothing.
    fn equality_pairs(&self) -> Vec<(String, Value)> {
        Vec::new()
    }
}

/// A cheap-to-clone handle over a [FilterProvider].
///
/// # Purpose
///
/// `Filter` wraps any filter implementation behind an `Arc`, providing a
/// uniform value type that can be stored, cloned, and composed with the
/// logical combinators [Filter::and], [Filter::or], and [Filter::not].
#[derive(Clone)]
pub struct Filter {
    inner: Arc<dyn FilterProvider>,
}

impl Filter {
    /// Creates a new filter from a filter provider implementation.
    pub fn new<T: FilterProvider + 'static>(inner: T) -> Self {
        Filter {
            inner: Arc::new(inner),
        }
    }

    /// Compiles a Mongo-style filter document into a filter tree.
    ///
    /// The whole expression is validated up front; unknown operators or
    /// malformed operands fail here, before any document is scanned.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use mongolite::{doc, filter::Filter};
    ///
    /// let filter = Filter::parse(&doc! { age: { "$gt": 21 }, city: "NY" })?;
    /// ```
    pub fn parse(expression: &Document) -> MongoliteResult<Filter> {
        super::parser::parse(expression)
    }

    /// Combines this filter with another using logical AND.
    pub fn and(&self, filter: Filter) -> Self {
        Filter::new(AndFilter::new(vec![self.clone(), filter]))
    }

    /// Combines this filter with another using logical OR.
    pub fn or(&self, filter: Filter) -> Self {
        Filter::new(OrFilter::new(vec![self.clone(), filter]))
    }

    /// Negates this filter using logical NOT.
    pub fn not(&self) -> Self {
        Filter::new(NotFilter::new(self.clone()))
    }
}

impl Display for Filter {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Deref for Filter {
    type Target = Arc<dyn FilterProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// A filter that matches every document.
pub(crate) struct MatchAllFilter;

impl FilterProvider for MatchAllFilter {
    fn apply(&self, _entry: &Document) -> MongoliteResult<bool> {
        Ok(true)
    }
}

impl Display for MatchAllFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(all)")
    }
}

/// Creates a filter that matches all documents.
pub fn all() -> Filter {
    Filter::new(MatchAllFilter)
}

/// Creates a filter that matches a document by its `_id`.
pub fn by_id(id: &str) -> Filter {
    Filter::new(EqualsFilter::new(
        DOC_ID.to_string(),
        Value::String(id.to_string()),
    ))
}

/// Combines multiple filters using logical AND.
pub fn and(filters: Vec<Filter>) -> Filter {
    Filter::new(AndFilter::new(filters))
}

/// Combines multiple filters using logical OR.
pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::new(OrFilter::new(filters))
}

/// Negates a filter using logical NOT.
pub fn not(filter: Filter) -> Filter {
    Filter::new(NotFilter::new(filter))
}
