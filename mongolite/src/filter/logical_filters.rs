use crate::collection::Document;
use crate::common::Value;
use crate::errors::MongoliteResult;
use crate::filter::{Filter, FilterProvider};
use std::fmt::{Display, Formatter};

/// Logical conjunction. Evaluation short-circuits at the first failing
/// operand; operands have no side effects, so order does not affect the
/// result.
pub(crate) struct AndFilter {
    filters: Vec<Filter>,
}

impl AndFilter {
    pub fn new(filters: Vec<Filter>) -> Self {
        AndFilter { filters }
    }
}

impl FilterProvider for AndFilter {
    fn apply(&self, entry: &Document) -> MongoliteResult<bool> {
        for filter in &self.filters {
            if !filter.apply(entry)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn equality_pairs(&self) -> Vec<(String, Value)> {
        self.filters
            .iter()
            .flat_map(|filter| filter.equality_pairs())
            .collect()
    }
}

impl Display for AndFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                write!(f, " && ")?;
            }
            write!(f, "{}", filter)?;
        }
        write!(f, ")")
    }
}

/// Logical disjunction. Short-circuits at the first matching operand.
pub(crate) struct OrFilter {
    filters: Vec<Filter>,
}

impl OrFilter {
    pub fn new(filters: Vec<Filter>) -> Self {
        OrFilter { filters }
    }
}

impl FilterProvider for OrFilter {
    fn apply(&self, entry: &Document) -> MongoliteResult<bool> {
        for filter in &self.filters {
            if filter.apply(entry)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Display for OrFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                write!(f, " || ")?;
            }
            write!(f, "{}", filter)?;
        }
        write!(f, ")")
    }
}

/// Logical negation.
pub(crate) struct NotFilter {
    filter: Filter,
}

impl NotFilter {
    pub fn new(filter: Filter) -> Self {
        NotFilter { filter }
    }
}

impl FilterProvider for NotFilter {
    fn apply(&self, entry: &Document) -> MongoliteResult<bool> {
        Ok(!self.filter.apply(entry)?)
    }
}

impl Display for NotFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "!({})", self.filter)
    }
}
