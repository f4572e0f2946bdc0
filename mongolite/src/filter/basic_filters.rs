use crate::collection::Document;
use crate::common::Value;
use crate::errors::MongoliteResult;
use crate::filter::FilterProvider;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Field equality filter (`$eq` and the implicit `{field: value}` shorthand).
///
/// Equality is structural and kind-sensitive; `null` equals only an explicit
/// `null` field, never an absent one.
pub(crate) struct EqualsFilter {
    field: String,
    value: Value,
}

impl EqualsFilter {
    pub fn new(field: String, value: Value) -> Self {
        EqualsFilter { field, value }
    }
}

impl FilterProvider for EqualsFilter {
    fn apply(&self, entry: &Document) -> MongoliteResult<bool> {
        match entry.get(&self.field) {
            Some(value) => Ok(value == self.value),
            None => Ok(false),
        }
    }

    fn equality_pairs(&self) -> Vec<(String, Value)> {
        vec![(self.field.clone(), self.value.clone())]
    }
}

impl Display for EqualsFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} == {})", self.field, self.value)
    }
}

/// Field inequality filter (`$ne`). Matches documents where the field is
/// absent, mirroring query-language convention.
pub(crate) struct NotEqualsFilter {
    field: String,
    value: Value,
}

impl NotEqualsFilter {
    pub fn new(field: String, value: Value) -> Self {
        NotEqualsFilter { field, value }
    }
}

impl FilterProvider for NotEqualsFilter {
    fn apply(&self, entry: &Document) -> MongoliteResult<bool> {
        match entry.get(&self.field) {
            Some(value) => Ok(value != self.value),
            None => Ok(true),
        }
    }
}

impl Display for NotEqualsFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} != {})", self.field, self.value)
    }
}

/// Range comparison mode for [ComparableFilter].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum ComparisonMode {
    Greater,
    GreaterEqual,
    Lesser,
    LesserEqual,
}

impl ComparisonMode {
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonMode::Greater => ordering == Ordering::Greater,
            ComparisonMode::GreaterEqual => ordering != Ordering::Less,
            ComparisonMode::Lesser => ordering == Ordering::Less,
            ComparisonMode::LesserEqual => ordering != Ordering::Greater,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            ComparisonMode::Greater => ">",
            ComparisonMode::GreaterEqual => ">=",
            ComparisonMode::Lesser => "<",
            ComparisonMode::LesserEqual => "<=",
        }
    }
}

/// Range filter (`$gt`, `$gte`, `$lt`, `$lte`).
///
/// Uses [Value::compare]: ordering is defined only number-to-number and
/// string-to-string; incomparable pairings and absent fields never match.
pub(crate) struct ComparableFilter {
    field: String,
    value: Value,
    mode: ComparisonMode,
}

impl ComparableFilter {
    pub fn new(field: String, value: Value, mode: ComparisonMode) -> Self {
        ComparableFilter { field, value, mode }
    }
}

impl FilterProvider for ComparableFilter {
    fn apply(&self, entry: &Document) -> MongoliteResult<bool> {
        let field_value = match entry.get(&self.field) {
            Some(value) => value,
            None => return Ok(false),
        };
        match field_value.compare(&self.value) {
            Some(ordering) => Ok(self.mode.accepts(ordering)),
            None => Ok(false),
        }
    }
}

impl Display for ComparableFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} {} {})", self.field, self.mode.symbol(), self.value)
    }
}

/// Field presence filter (`$exists`).
///
/// An explicit `null` field counts as present.
pub(crate) struct ExistsFilter {
    field: String,
    exists: bool,
}

impl ExistsFilter {
    pub fn new(field: String, exists: bool) -> Self {
        ExistsFilter { field, exists }
    }
}

impl FilterProvider for ExistsFilter {
    fn apply(&self, entry: &Document) -> MongoliteResult<bool> {
        Ok(entry.get(&self.field).is_some() == self.exists)
    }
}

impl Display for ExistsFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} exists: {})", self.field, self.exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{doc, val};

    fn set_up() -> Document {
        doc! {
            name: "Alice",
            age: 25,
            nothing: (),
            address: { city: "NY" },
        }
    }

    #[test]
    fn test_equals_matches_value() {
        let entry = set_up();
        let filter = EqualsFilter::new("name".into(), val!("Alice"));
        assert!(filter.apply(&entry).unwrap());

        let filter = EqualsFilter::new("name".into(), val!("Bob"));
        assert!(!filter.apply(&entry).unwrap());
    }

    #[test]
    fn test_equals_dotted_path() {
        let entry = set_up();
        let filter = EqualsFilter::new("address.city".into(), val!("NY"));
        assert!(filter.apply(&entry).unwrap());
    }

    #[test]
    fn test_equals_kind_mismatch_never_matches() {
        let entry = set_up();
        let filter = EqualsFilter::new("age".into(), val!("25"));
        assert!(!filter.apply(&entry).unwrap());
    }

    #[test]
    fn test_equals_null_does_not_match_absent() {
        let entry = set_up();
        let filter = EqualsFilter::new("missing".into(), Value::Null);
        assert!(!filter.apply(&entry).unwrap());

        let filter = EqualsFilter::new("nothing".into(), Value::Null);
        assert!(filter.apply(&entry).unwrap());
    }

    #[test]
    fn test_not_equals_matches_absent() {
        let entry = set_up();
        let filter = NotEqualsFilter::new("missing".into(), val!(1));
        assert!(filter.apply(&entry).unwrap());

        let filter = NotEqualsFilter::new("age".into(), val!(25));
        assert!(!filter.apply(&entry).unwrap());
    }

    #[test]
    fn test_comparable_numeric() {
        let entry = doc! { a: 5 };
        let gt = |v: i64| ComparableFilter::new("a".into(), val!(v), ComparisonMode::Greater);
        assert!(gt(3).apply(&entry).unwrap());
        assert!(!gt(5).apply(&entry).unwrap());
        assert!(!gt(7).apply(&entry).unwrap());

        let gte = ComparableFilter::new("a".into(), val!(5), ComparisonMode::GreaterEqual);
        assert!(gte.apply(&entry).unwrap());

        let lt = ComparableFilter::new("a".into(), val!(3), ComparisonMode::Lesser);
        assert!(!lt.apply(&entry).unwrap());

        let lte = ComparableFilter::new("a".into(), val!(5), ComparisonMode::LesserEqual);
        assert!(lte.apply(&entry).unwrap());
    }

    #[test]
    fn test_comparable_strings() {
        let entry = doc! { s: "mango" };
        let filter = ComparableFilter::new("s".into(), val!("apple"), ComparisonMode::Greater);
        assert!(filter.apply(&entry).unwrap());
    }

    #[test]
    fn test_comparable_incomparable_never_matches() {
        let entry = doc! { s: "text" };
        // string field vs number operand
        let filter = ComparableFilter::new("s".into(), val!(5), ComparisonMode::Greater);
        assert!(!filter.apply(&entry).unwrap());
        let filter = ComparableFilter::new("s".into(), val!(5), ComparisonMode::Lesser);
        assert!(!filter.apply(&entry).unwrap());
    }

    #[test]
    fn test_comparable_absent_never_matches() {
        let entry = doc! { a: 1 };
        let filter = ComparableFilter::new("b".into(), val!(0), ComparisonMode::Greater);
        assert!(!filter.apply(&entry).unwrap());
    }

    #[test]
    fn test_exists() {
        let entry = set_up();
        assert!(ExistsFilter::new("name".into(), true).apply(&entry).unwrap());
        assert!(!ExistsFilter::new("name".into(), false).apply(&entry).unwrap());
        assert!(ExistsFilter::new("missing".into(), false).apply(&entry).unwrap());
        // explicit null counts as present
        assert!(ExistsFilter::new("nothing".into(), true).apply(&entry).unwrap());
    }
}
