use crate::collection::ObjectId;
use crate::common::constants::{DOC_ID, FIELD_SEPARATOR, MAX_NESTING_DEPTH};
use crate::common::Value;
use crate::errors::{ErrorKind, MongoliteError, MongoliteResult};
use im::OrdMap;
use smallvec::SmallVec;
use std::fmt::{Debug, Display, Formatter};

type PathSegments<'a> = SmallVec<[&'a str; 4]>;

/// A schema-less record: an ordered mapping from string field names to [Value]s.
///
/// # Purpose
/// `Document` is the atomic unit of data in the database. [Document::put]
/// stores fields under their literal names, so a key like `"address.city"` is
/// a single top-level field; this is what lets filter and update expression
/// documents carry dotted operand paths as plain keys. Reads descend: a
/// dotted path passed to [Document::get] walks through nested documents.
/// Every stored document carries a unique `_id` field assigned at insertion
/// and immutable thereafter; the `_id` rules are enforced where documents
/// enter a collection, not by `Document` itself.
///
/// # Characteristics
/// - **Persistent map**: backed by [im::OrdMap]; clones are cheap and share
///   structure, so returned documents are independent copies
/// - **Last-write-wins**: putting an existing field replaces its value
/// - **Depth-capped**: update paths nesting beyond [MAX_NESTING_DEPTH] are
///   rejected with a validation error
///
/// # Examples
///
/// ```rust,ignore
/// use mongolite::doc;
///
/// let mut doc = doc! { name: "Alice", address: { city: "Wonderland" } };
/// assert_eq!(doc.get("address.city"), Some("Wonderland".into()));
/// ```
#[derive(Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    fields: OrdMap<String, Value>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Document {
            fields: OrdMap::new(),
        }
    }

    /// Returns true if this document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Sets a top-level field to the given value, replacing any previous one.
    ///
    /// The key is stored literally: `put("address.city", v)` creates a single
    /// field named `address.city`, it does not descend. Fails only on an
    /// empty key.
    pub fn put(&mut self, key: &str, value: impl Into<Value>) -> MongoliteResult<()> {
        if key.is_empty() {
            return Err(MongoliteError::new(
                "Field name cannot be empty",
                ErrorKind::InvalidFieldName,
            ));
        }
        self.fields.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Sets the value at the given dotted field path, creating intermediate
    /// nested documents along the path if absent. This is how the update
    /// engine writes operand paths like `"address.zip"`.
    ///
    /// Fails if an intermediate segment exists but is not a document, or if
    /// the path is empty, has an empty segment, or is deeper than
    /// [MAX_NESTING_DEPTH].
    pub(crate) fn set_path(&mut self, path: &str, value: impl Into<Value>) -> MongoliteResult<()> {
        let segments = split_path(path)?;
        self.fields = deep_put(&self.fields, &segments, value.into())?;
        Ok(())
    }

    /// Returns a copy of the value at the given field path.
    ///
    /// A literal top-level field wins; otherwise a dotted path descends
    /// through nested documents. Returns `None` when any path segment is
    /// absent or descent hits a non-document value. An explicit `null` field
    /// yields `Some(Value::Null)`, which is distinct from a missing field.
    pub fn get(&self, path: &str) -> Option<Value> {
        if let Some(value) = self.fields.get(path) {
            return Some(value.clone());
        }
        let segments: PathSegments = path.split(FIELD_SEPARATOR).collect();
        let mut current = &self.fields;
        for (i, segment) in segments.iter().enumerate() {
            let value = current.get(*segment)?;
            if i == segments.len() - 1 {
                return Some(value.clone());
            }
            match value {
                Value::Document(doc) => current = &doc.fields,
                _ => return None,
            }
        }
        None
    }

    /// Removes the value at the given field path, returning it if present.
    /// A literal top-level field wins; otherwise a dotted path descends.
    /// Removing an absent path is a no-op.
    pub fn remove(&mut self, path: &str) -> MongoliteResult<Option<Value>> {
        if self.fields.contains_key(path) {
            return Ok(self.fields.remove(path));
        }
        let segments = split_path(path)?;
        let (fields, removed) = deep_remove(&self.fields, &segments);
        self.fields = fields;
        Ok(removed)
    }

    /// Returns true if a top-level field with the given name exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Returns true if this document carries an `_id` field.
    pub fn has_id(&self) -> bool {
        self.fields.contains_key(DOC_ID)
    }

    /// Returns this document's id, generating and assigning a fresh [ObjectId]
    /// if the document does not carry one yet.
    ///
    /// Fails with [ErrorKind::InvalidId] if an existing `_id` field is not a
    /// non-empty string.
    pub fn id(&mut self) -> MongoliteResult<String> {
        match self.fields.get(DOC_ID) {
            Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
            Some(other) => {
                log::error!("Document id has invalid kind {}", other.kind_name());
                Err(MongoliteError::new(
                    &format!(
                        "Document id must be a non-empty string, found {}",
                        other.kind_name()
                    ),
                    ErrorKind::InvalidId,
                ))
            }
            None => {
                let id = ObjectId::generate().to_string();
                self.fields
                    .insert(DOC_ID.to_string(), Value::String(id.clone()));
                Ok(id)
            }
        }
    }

    /// Returns the top-level field names of this document.
    pub fn fields(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Iterates over the top-level fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

fn split_path(path: &str) -> MongoliteResult<PathSegments<'_>> {
    if path.is_empty() {
        return Err(MongoliteError::new(
            "Field path cannot be empty",
            ErrorKind::InvalidFieldName,
        ));
    }
    let segments: PathSegments = path.split(FIELD_SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(MongoliteError::new(
            &format!("Field path '{}' contains an empty segment", path),
            ErrorKind::InvalidFieldName,
        ));
    }
    if segments.len() > MAX_NESTING_DEPTH {
        return Err(MongoliteError::new(
            &format!("Field path '{}' exceeds maximum nesting depth", path),
            ErrorKind::ValidationError,
        ));
    }
    Ok(segments)
}

fn deep_put(
    fields: &OrdMap<String, Value>,
    segments: &[&str],
    value: Value,
) -> MongoliteResult<OrdMap<String, Value>> {
    let mut fields = fields.clone();
    let segment = segments[0];
    if segments.len() == 1 {
        fields.insert(segment.to_string(), value);
        return Ok(fields);
    }

    let nested = match fields.get(segment) {
        Some(Value::Document(doc)) => deep_put(&doc.fields, &segments[1..], value)?,
        None => deep_put(&OrdMap::new(), &segments[1..], value)?,
        Some(other) => {
            return Err(MongoliteError::new(
                &format!(
                    "Cannot descend into field '{}' of kind {}",
                    segment,
                    other.kind_name()
                ),
                ErrorKind::ValidationError,
            ));
        }
    };
    fields.insert(
        segment.to_string(),
        Value::Document(Document { fields: nested }),
    );
    Ok(fields)
}

fn deep_remove(
    fields: &OrdMap<String, Value>,
    segments: &[&str],
) -> (OrdMap<String, Value>, Option<Value>) {
    let mut fields = fields.clone();
    let segment = segments[0];
    if segments.len() == 1 {
        let removed = fields.remove(segment);
        return (fields, removed);
    }

    match fields.get(segment) {
        Some(Value::Document(doc)) => {
            let (nested, removed) = deep_remove(&doc.fields, &segments[1..]);
            fields.insert(
                segment.to_string(),
                Value::Document(Document { fields: nested }),
            );
            (fields, removed)
        }
        _ => (fields, None),
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{}\": {}", key, value)?;
        }
        write!(f, "}}")
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

/// Strips the quotes `stringify!` leaves around string-literal keys in the
/// [doc!] macro.
pub fn normalize(key: &str) -> String {
    key.trim_matches('"').to_string()
}

/// Creates a [Document] from key/value pairs.
///
/// Keys can be bare identifiers or string literals; values can be literals,
/// expressions, nested `{ ... }` documents, or `[ ... ]` arrays.
///
/// # Examples
///
/// ```rust,ignore
/// use mongolite::doc;
///
/// let simple = doc! { name: "Alice", age: 30 };
///
/// let complex = doc! {
///     user: {
///         name: "Charlie",
///         tags: ["admin", "user"]
///     },
///     values: [1, 2, 3]
/// };
/// ```
#[macro_export]
macro_rules! doc {
    // match an empty document (with braces)
    ({}) => {
        $crate::collection::Document::new()
    };

    // match an empty document
    () => {
        $crate::collection::Document::new()
    };

    // match a document with key value pairs (outer braces form)
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    // match a document with key value pairs
    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.put(&$crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the [doc!] macro.
/// Handles nested documents, arrays, and expressions.
#[macro_export]
macro_rules! doc_value {
    // match a nested document
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        {
            $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
        }
    };

    // match an array of values
    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    // match an expression (variable, function call, literal, etc.)
    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
