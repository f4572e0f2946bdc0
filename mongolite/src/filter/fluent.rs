use crate::common::Value;
use crate::errors::MongoliteResult;
use crate::filter::array_filters::{
    ContainsAllFilter, ElemMatchFilter, ElemMatchMode, InFilter, NotInFilter, SizeFilter,
};
use crate::filter::basic_filters::{
    ComparableFilter, ComparisonMode, EqualsFilter, ExistsFilter, NotEqualsFilter,
};
use crate::filter::pattern_filters::RegexFilter;
use crate::filter::Filter;

/// Entry point of the fluent filter API.
///
/// # Examples
///
/// ```rust,ignore
/// use mongolite::filter::field;
///
/// let adults = field("age").gte(18);
/// let named = field("name").regex("^A")?;
/// let query = adults.and(named);
/// ```
pub fn field(name: &str) -> FluentFilter {
    FluentFilter {
        field: name.to_string(),
    }
}

/// Builder holding a field path, producing concrete filters for it.
pub struct FluentFilter {
    field: String,
}

impl FluentFilter {
    /// Field equals the given value.
    pub fn eq(&self, value: impl Into<Value>) -> Filter {
        Filter::new(EqualsFilter::new(self.field.clone(), value.into()))
    }

    /// Field differs from the given value; matches absent fields.
    pub fn ne(&self, value: impl Into<Value>) -> Filter {
        Filter::new(NotEqualsFilter::new(self.field.clone(), value.into()))
    }

    /// Field is strictly greater than the given value.
    pub fn gt(&self, value: impl Into<Value>) -> Filter {
        self.compare(value.into(), ComparisonMode::Greater)
    }

    /// Field is greater than or equal to the given value.
    pub fn gte(&self, value: impl Into<Value>) -> Filter {
        self.compare(value.into(), ComparisonMode::GreaterEqual)
    }

    /// Field is strictly less than the given value.
    pub fn lt(&self, value: impl Into<Value>) -> Filter {
        self.compare(value.into(), ComparisonMode::Lesser)
    }

    /// Field is less than or equal to the given value.
    pub fn lte(&self, value: impl Into<Value>) -> Filter {
        self.compare(value.into(), ComparisonMode::LesserEqual)
    }

    /// Field value equals one of the given values.
    pub fn within<T: Into<Value>>(&self, values: Vec<T>) -> Filter {
        Filter::new(InFilter::new(
            self.field.clone(),
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Field value equals none of the given values; matches absent fields.
    pub fn not_within<T: Into<Value>>(&self, values: Vec<T>) -> Filter {
        Filter::new(NotInFilter::new(
            self.field.clone(),
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Field is present (or absent, when `exists` is false).
    pub fn exists(&self, exists: bool) -> Filter {
        Filter::new(ExistsFilter::new(self.field.clone(), exists))
    }

    /// Field is a string matching the given pattern.
    pub fn regex(&self, pattern: &str) -> MongoliteResult<Filter> {
        self.regex_with_options(pattern, "")
    }

    /// Field is a string matching the given pattern with `i`/`m`/`s` flags.
    pub fn regex_with_options(&self, pattern: &str, options: &str) -> MongoliteResult<Filter> {
        Ok(Filter::new(RegexFilter::new(
            self.field.clone(),
            pattern,
            options,
        )?))
    }

    /// Field is an array of exactly the given length.
    pub fn size(&self, size: usize) -> Filter {
        Filter::new(SizeFilter::new(self.field.clone(), size))
    }

    /// Field is an array containing every given value.
    pub fn contains_all<T: Into<Value>>(&self, values: Vec<T>) -> Filter {
        Filter::new(ContainsAllFilter::new(
            self.field.clone(),
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Field is an array with at least one document element matching the
    /// given filter.
    pub fn elem_match(&self, filter: Filter) -> Filter {
        Filter::new(ElemMatchFilter::new(
            self.field.clone(),
            ElemMatchMode::SubFilter(filter),
        ))
    }

    fn compare(&self, value: Value, mode: ComparisonMode) -> Filter {
        Filter::new(ComparableFilter::new(self.field.clone(), value, mode))
    }
}
