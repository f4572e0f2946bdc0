use crate::collection::Document;
use crate::common::constants::*;
use crate::common::Value;
use crate::errors::{ErrorKind, MongoliteError, MongoliteResult};

/// A single field mutation: applies one operator to one field path of the
/// target document. Handlers are pure over their inputs and mutate only the
/// passed document clone.
pub(crate) type UpdateFn = fn(&mut Document, &str, &Value) -> MongoliteResult<()>;

/// Operator dispatch table. Adding an operator means adding a row here plus
/// its operand validation in the expression parser; nothing else changes.
pub(crate) fn lookup(operator: &str) -> Option<UpdateFn> {
    match operator {
        OP_SET | OP_SET_ON_INSERT => Some(apply_set),
        OP_UNSET => Some(apply_unset),
        OP_INC => Some(apply_inc),
        OP_MUL => Some(apply_mul),
        OP_RENAME => Some(apply_rename),
        OP_PUSH => Some(apply_push),
        OP_PULL => Some(apply_pull),
        OP_PULL_ALL => Some(apply_pull_all),
        OP_ADD_TO_SET => Some(apply_add_to_set),
        OP_POP => Some(apply_pop),
        _ => None,
    }
}

fn apply_set(entry: &mut Document, path: &str, value: &Value) -> MongoliteResult<()> {
    entry.set_path(path, value.clone())
}

fn apply_unset(entry: &mut Document, path: &str, _value: &Value) -> MongoliteResult<()> {
    entry.remove(path)?;
    Ok(())
}

fn apply_inc(entry: &mut Document, path: &str, value: &Value) -> MongoliteResult<()> {
    let delta = numeric_operand(OP_INC, value)?;
    let current = numeric_field(entry, path, OP_INC)?;
    entry.set_path(path, current + delta)
}

fn apply_mul(entry: &mut Document, path: &str, value: &Value) -> MongoliteResult<()> {
    let factor = numeric_operand(OP_MUL, value)?;
    let current = numeric_field(entry, path, OP_MUL)?;
    entry.set_path(path, current * factor)
}

fn apply_rename(entry: &mut Document, path: &str, value: &Value) -> MongoliteResult<()> {
    let target = match value {
        Value::String(target) if !target.is_empty() => target,
        other => {
            return Err(update_error(&format!(
                "Operator {} requires a non-empty string target, found {}",
                OP_RENAME,
                other.kind_name()
            )));
        }
    };
    // absent source is a no-op
    if let Some(moved) = entry.remove(path)? {
        entry.set_path(target, moved)?;
    }
    Ok(())
}

fn apply_push(entry: &mut Document, path: &str, value: &Value) -> MongoliteResult<()> {
    let additions = each_values(value);
    let mut elements = array_field(entry, path, OP_PUSH)?;
    elements.extend(additions);
    entry.set_path(path, Value::Array(elements))
}

fn apply_pull(entry: &mut Document, path: &str, value: &Value) -> MongoliteResult<()> {
    let mut elements = match existing_array(entry, path, OP_PULL)? {
        Some(elements) => elements,
        None => return Ok(()),
    };
    elements.retain(|element| element != value);
    entry.set_path(path, Value::Array(elements))
}

fn apply_pull_all(entry: &mut Document, path: &str, value: &Value) -> MongoliteResult<()> {
    let removals = match value {
        Value::Array(removals) => removals,
        other => {
            return Err(update_error(&format!(
                "Operator {} requires an array operand, found {}",
                OP_PULL_ALL,
                other.kind_name()
            )));
        }
    };
    let mut elements = match existing_array(entry, path, OP_PULL_ALL)? {
        Some(elements) => elements,
        None => return Ok(()),
    };
    elements.retain(|element| !removals.contains(element));
    entry.set_path(path, Value::Array(elements))
}

fn apply_add_to_set(entry: &mut Document, path: &str, value: &Value) -> MongoliteResult<()> {
    let additions = each_values(value);
    let mut elements = array_field(entry, path, OP_ADD_TO_SET)?;
    for addition in additions {
        if !elements.contains(&addition) {
            elements.push(addition);
        }
    }
    entry.set_path(path, Value::Array(elements))
}

fn apply_pop(entry: &mut Document, path: &str, value: &Value) -> MongoliteResult<()> {
    let from_end = match value.as_number() {
        Some(n) if n == 1.0 => true,
        Some(n) if n == -1.0 => false,
        _ => {
            return Err(update_error(&format!(
                "Operator {} requires an operand of 1 or -1",
                OP_POP
            )));
        }
    };
    let mut elements = match existing_array(entry, path, OP_POP)? {
        Some(elements) => elements,
        None => return Ok(()),
    };
    if !elements.is_empty() {
        if from_end {
            elements.pop();
        } else {
            elements.remove(0);
        }
        entry.set_path(path, Value::Array(elements))?;
    }
    Ok(())
}

/// Unwraps a `{"$each": [...]}` operand into its elements; any other operand
/// is a single addition.
fn each_values(value: &Value) -> Vec<Value> {
    if let Value::Document(spec) = value {
        if let Some(Value::Array(values)) = spec.get(OP_EACH) {
            return values;
        }
    }
    vec![value.clone()]
}

fn numeric_operand(operator: &str, value: &Value) -> MongoliteResult<f64> {
    value.as_number().ok_or_else(|| {
        update_error(&format!(
            "Operator {} requires a numeric operand, found {}",
            operator,
            value.kind_name()
        ))
    })
}

/// Reads a numeric field for `$inc`/`$mul`, treating an absent field as 0.
/// A present non-number field is a kind error.
fn numeric_field(entry: &Document, path: &str, operator: &str) -> MongoliteResult<f64> {
    match entry.get(path) {
        None => Ok(0.0),
        Some(Value::Number(n)) => Ok(n),
        Some(other) => Err(MongoliteError::new(
            &format!(
                "Operator {} cannot be applied to field '{}' of kind {}",
                operator,
                path,
                other.kind_name()
            ),
            ErrorKind::InvalidDataType,
        )),
    }
}

/// Reads an array field, distinguishing an absent field (`None`) from a
/// present non-array field, which is a kind error.
fn existing_array(
    entry: &Document,
    path: &str,
    operator: &str,
) -> MongoliteResult<Option<Vec<Value>>> {
    match entry.get(path) {
        None => Ok(None),
        Some(Value::Array(elements)) => Ok(Some(elements)),
        Some(other) => Err(MongoliteError::new(
            &format!(
                "Operator {} cannot be applied to field '{}' of kind {}",
                operator,
                path,
                other.kind_name()
            ),
            ErrorKind::InvalidDataType,
        )),
    }
}

/// Reads an array field for `$push`/`$addToSet`, treating an absent field as
/// an empty array.
fn array_field(entry: &Document, path: &str, operator: &str) -> MongoliteResult<Vec<Value>> {
    Ok(existing_array(entry, path, operator)?.unwrap_or_default())
}

fn update_error(message: &str) -> MongoliteError {
    log::error!("{}", message);
    MongoliteError::new(message, ErrorKind::ValidationError)
}
