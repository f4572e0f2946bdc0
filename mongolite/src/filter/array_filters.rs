use crate::collection::Document;
use crate::common::Value;
use crate::errors::MongoliteResult;
use crate::filter::{Filter, FilterProvider};
use std::fmt::{Display, Formatter};

/// Sentinel field used to evaluate operator conditions against a bare array
/// element by wrapping it in a one-field document.
pub(crate) const ELEM_FIELD: &str = "$elem";

/// Membership filter (`$in`): matches when the field value equals any of the
/// operand elements.
pub(crate) struct InFilter {
    field: String,
    values: Vec<Value>,
}

impl InFilter {
    pub fn new(field: String, values: Vec<Value>) -> Self {
        InFilter { field, values }
    }
}

impl FilterProvider for InFilter {
    fn apply(&self, entry: &Document) -> MongoliteResult<bool> {
        match entry.get(&self.field) {
            Some(value) => Ok(self.values.contains(&value)),
            None => Ok(false),
        }
    }
}

impl Display for InFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} in {})", self.field, Value::Array(self.values.clone()))
    }
}

/// Negated membership (`$nin`). Matches documents where the field is absent.
pub(crate) struct NotInFilter {
    field: String,
    values: Vec<Value>,
}

impl NotInFilter {
    pub fn new(field: String, values: Vec<Value>) -> Self {
        NotInFilter { field, values }
    }
}

impl FilterProvider for NotInFilter {
    fn apply(&self, entry: &Document) -> MongoliteResult<bool> {
        match entry.get(&self.field) {
            Some(value) => Ok(!self.values.contains(&value)),
            None => Ok(true),
        }
    }
}

impl Display for NotInFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} nin {})", self.field, Value::Array(self.values.clone()))
    }
}

/// Exact array length filter (`$size`). Non-array fields never match.
pub(crate) struct SizeFilter {
    field: String,
    size: usize,
}

impl SizeFilter {
    pub fn new(field: String, size: usize) -> Self {
        SizeFilter { field, size }
    }
}

impl FilterProvider for SizeFilter {
    fn apply(&self, entry: &Document) -> MongoliteResult<bool> {
        match entry.get(&self.field) {
            Some(Value::Array(values)) => Ok(values.len() == self.size),
            _ => Ok(false),
        }
    }
}

impl Display for SizeFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} size {})", self.field, self.size)
    }
}

/// Superset filter (`$all`): the field must be an array containing every
/// operand element.
pub(crate) struct ContainsAllFilter {
    field: String,
    values: Vec<Value>,
}

impl ContainsAllFilter {
    pub fn new(field: String, values: Vec<Value>) -> Self {
        ContainsAllFilter { field, values }
    }
}

impl FilterProvider for ContainsAllFilter {
    fn apply(&self, entry: &Document) -> MongoliteResult<bool> {
        match entry.get(&self.field) {
            Some(Value::Array(elements)) => {
                Ok(self.values.iter().all(|value| elements.contains(value)))
            }
            _ => Ok(false),
        }
    }
}

impl Display for ContainsAllFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} all {})", self.field, Value::Array(self.values.clone()))
    }
}

/// How an `$elemMatch` operand applies to each array element.
pub(crate) enum ElemMatchMode {
    /// Operand was an operator document (`{"$gt": 5}`): conditions are built
    /// against [ELEM_FIELD] and each element is wrapped before evaluation.
    Operators(Filter),
    /// Operand was a filter document: applied to document elements only.
    SubFilter(Filter),
}

/// Array element filter (`$elemMatch`): matches when any element of the field
/// array satisfies the operand.
pub(crate) struct ElemMatchFilter {
    field: String,
    mode: ElemMatchMode,
}

impl ElemMatchFilter {
    pub fn new(field: String, mode: ElemMatchMode) -> Self {
        ElemMatchFilter { field, mode }
    }
}

impl FilterProvider for ElemMatchFilter {
    fn apply(&self, entry: &Document) -> MongoliteResult<bool> {
        let elements = match entry.get(&self.field) {
            Some(Value::Array(elements)) => elements,
            _ => return Ok(false),
        };

        for element in &elements {
            let matched = match &self.mode {
                ElemMatchMode::Operators(filter) => {
                    let mut wrapper = Document::new();
                    wrapper.put(ELEM_FIELD, element.clone())?;
                    filter.apply(&wrapper)?
                }
                ElemMatchMode::SubFilter(filter) => match element {
                    Value::Document(doc) => filter.apply(doc)?,
                    _ => false,
                },
            };
            if matched {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Display for ElemMatchFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.mode {
            ElemMatchMode::Operators(filter) => {
                write!(f, "({} elemMatch {})", self.field, filter)
            }
            ElemMatchMode::SubFilter(filter) => {
                write!(f, "({} elemMatch {})", self.field, filter)
            }
        }
    }
}
