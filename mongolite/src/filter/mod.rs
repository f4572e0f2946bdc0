//! Query filters: typed filter providers, the fluent builder API, and the
//! parser compiling Mongo-style filter documents into filter trees.

mod array_filters;
mod basic_filters;
#[allow(clippy::module_inception)]
mod filter;
mod fluent;
mod logical_filters;
mod parser;
mod pattern_filters;

pub use filter::{all, and, by_id, not, or, Filter, FilterProvider};
pub use fluent::{field, FluentFilter};

pub(crate) use basic_filters::{ComparableFilter, ComparisonMode, EqualsFilter};
