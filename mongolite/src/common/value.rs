use crate::collection::Document;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};

/// Compare two floats for ordering where NaN participates.
/// Used only for total ordering (sorting), never for filter matching.
#[inline]
fn num_cmp_total(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

/// Represents a [Document] value. It can be a simple value like [Value::Number],
/// [Value::String] or a complex value like [Value::Document] or [Value::Array].
///
/// # Purpose
/// Provides a unified representation for all value kinds that can be stored in
/// documents. The set of kinds is closed; operators pattern-match on the kind
/// and degrade to "no match" on kind mismatch rather than coercing.
///
/// # Variants
/// - `Null`: Absence of a value (distinct from a missing field)
/// - `Bool(bool)`: Boolean true/false
/// - `Number(f64)`: Numeric value with float64 precision
/// - `String(String)`: Text value
/// - `Array(Vec<Value>)`: Ordered sequence of values
/// - `Document(Document)`: Nested document
///
/// # Comparison semantics
/// Equality is structural and kind-sensitive. Ordering via [Value::compare] is
/// defined only between two numbers or two strings; every other pairing is
/// incomparable (`None`) and never matches a range filter. [Value::total_cmp]
/// supplies an arbitrary but stable total order across kinds for sorting.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Document(Document),
}

impl Value {
    /// Returns a short name for this value's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Document(_) => "document",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Ordering comparison between two values.
    ///
    /// Defined only between two numbers (numeric order) or two strings
    /// (lexicographic by code point). Any other kind pairing, and any
    /// comparison involving NaN, yields `None` (incomparable). Incomparable
    /// pairs never match a range filter and never raise an error.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                if a.is_nan() || b.is_nan() {
                    None
                } else {
                    a.partial_cmp(b)
                }
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Stable total order across all value kinds, for sorting only.
    ///
    /// Kinds are ranked null < bool < number < string < array < document;
    /// values of the same kind compare structurally. Filter matching never
    /// uses this ordering.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        fn kind_rank(value: &Value) -> u8 {
            match value {
                Value::Null => 0,
                Value::Bool(_) => 1,
                Value::Number(_) => 2,
                Value::String(_) => 3,
                Value::Array(_) => 4,
                Value::Document(_) => 5,
            }
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => num_cmp_total(*a, *b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.total_cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Value::Document(a), Value::Document(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    let ord = ka.cmp(kb);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    let ord = va.total_cmp(vb);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => kind_rank(self).cmp(&kind_rank(other)),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Array(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
            Value::Document(doc) => write!(f, "{}", doc),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_num {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

impl_from_num!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Document(doc)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Converts any supported value into a [Value].
///
/// # Examples
///
/// ```rust,ignore
/// use mongolite::val;
///
/// let number = val!(42);
/// let text = val!("hello");
/// let flag = val!(true);
/// ```
#[macro_export]
macro_rules! val {
    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_equality_requires_same_kind() {
        assert_eq!(val!(5), val!(5.0));
        assert_ne!(val!(5), val!("5"));
        assert_ne!(val!(0), val!(false));
        assert_ne!(Value::Null, val!(0));
    }

    #[test]
    fn test_null_equals_only_null() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Null, val!(""));
        assert_ne!(Value::Null, val!(false));
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        assert_ne!(val!(f64::NAN), val!(f64::NAN));
    }

    #[test]
    fn test_array_equality_is_order_sensitive() {
        assert_eq!(val!(vec![1, 2, 3]), val!(vec![1, 2, 3]));
        assert_ne!(val!(vec![1, 2, 3]), val!(vec![3, 2, 1]));
        assert_ne!(val!(vec![1, 2]), val!(vec![1, 2, 3]));
    }

    #[test]
    fn test_document_equality_is_structural() {
        let a = doc! { x: 1, y: { z: "a" } };
        let b = doc! { y: { z: "a" }, x: 1 };
        assert_eq!(Value::Document(a), Value::Document(b));
    }

    #[test]
    fn test_compare_numbers() {
        assert_eq!(val!(1).compare(&val!(2)), Some(Ordering::Less));
        assert_eq!(val!(2).compare(&val!(1)), Some(Ordering::Greater));
        assert_eq!(val!(2).compare(&val!(2)), Some(Ordering::Equal));
    }

    #[test]
    fn test_compare_strings() {
        assert_eq!(val!("a").compare(&val!("b")), Some(Ordering::Less));
        assert_eq!(val!("b").compare(&val!("b")), Some(Ordering::Equal));
    }

    #[test]
    fn test_compare_mixed_kinds_is_incomparable() {
        assert_eq!(val!("5").compare(&val!(5)), None);
        assert_eq!(val!(true).compare(&val!(false)), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
        assert_eq!(val!(vec![1]).compare(&val!(vec![1])), None);
    }

    #[test]
    fn test_compare_nan_is_incomparable() {
        assert_eq!(val!(f64::NAN).compare(&val!(1)), None);
        assert_eq!(val!(1).compare(&val!(f64::NAN)), None);
    }

    #[test]
    fn test_total_cmp_ranks_kinds() {
        assert_eq!(Value::Null.total_cmp(&val!(false)), Ordering::Less);
        assert_eq!(val!(true).total_cmp(&val!(0)), Ordering::Less);
        assert_eq!(val!(100).total_cmp(&val!("a")), Ordering::Less);
        assert_eq!(val!("z").total_cmp(&val!(vec![0])), Ordering::Less);
    }

    #[test]
    fn test_total_cmp_within_kind() {
        assert_eq!(val!(1).total_cmp(&val!(2)), Ordering::Less);
        assert_eq!(val!("b").total_cmp(&val!("a")), Ordering::Greater);
        assert_eq!(val!(vec![1, 2]).total_cmp(&val!(vec![1, 3])), Ordering::Less);
        assert_eq!(val!(vec![1]).total_cmp(&val!(vec![1, 0])), Ordering::Less);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(val!(5).as_number(), Some(5.0));
        assert_eq!(val!("hi").as_str(), Some("hi"));
        assert_eq!(val!(true).as_bool(), Some(true));
        assert!(val!(5).as_str().is_none());
        assert!(Value::Null.is_null());
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(Some(5)), val!(5));
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", val!(5)), "5");
        assert_eq!(format!("{}", val!("a")), "\"a\"");
        assert_eq!(format!("{}", val!(vec![1, 2])), "[1, 2]");
        assert_eq!(format!("{}", Value::Null), "null");
    }
}
