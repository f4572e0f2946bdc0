use crate::collection::Document;
use crate::common::constants::*;
use crate::common::Value;
use crate::errors::{ErrorKind, MongoliteError, MongoliteResult};
use crate::filter::array_filters::{
    ContainsAllFilter, ElemMatchFilter, ElemMatchMode, InFilter, NotInFilter, SizeFilter,
    ELEM_FIELD,
};
use crate::filter::basic_filters::{
    ComparableFilter, ComparisonMode, EqualsFilter, ExistsFilter, NotEqualsFilter,
};
use crate::filter::logical_filters::NotFilter;
use crate::filter::pattern_filters::RegexFilter;
use crate::filter::{all, and, or, Filter};

/// Compiles a filter document into a [Filter] tree.
///
/// The full expression is validated here, before any scan: unknown operators,
/// malformed operands, and excessive nesting all fail with a
/// [ErrorKind::FilterError] and no document is ever inspected.
pub(crate) fn parse(expression: &Document) -> MongoliteResult<Filter> {
    parse_at_depth(expression, 0)
}

fn parse_at_depth(expression: &Document, depth: usize) -> MongoliteResult<Filter> {
    if depth > MAX_NESTING_DEPTH {
        return Err(filter_error("Filter expression exceeds maximum nesting depth"));
    }
    if expression.is_empty() {
        return Ok(all());
    }

    let mut conditions = Vec::new();
    for (key, value) in expression.iter() {
        if key.starts_with('$') {
            conditions.push(parse_logical(key, value, depth)?);
        } else {
            parse_field_condition(key, value, depth, &mut conditions)?;
        }
    }

    if conditions.len() == 1 {
        Ok(conditions.remove(0))
    } else {
        Ok(and(conditions))
    }
}

fn parse_logical(operator: &str, operand: &Value, depth: usize) -> MongoliteResult<Filter> {
    match operator {
        OP_AND | OP_OR => {
            let clauses = match operand {
                Value::Array(clauses) if !clauses.is_empty() => clauses,
                _ => {
                    return Err(filter_error(&format!(
                        "Operator {} requires a non-empty array operand",
                        operator
                    )));
                }
            };
            let mut filters = Vec::with_capacity(clauses.len());
            for clause in clauses {
                match clause {
                    Value::Document(doc) => filters.push(parse_at_depth(doc, depth + 1)?),
                    other => {
                        return Err(filter_error(&format!(
                            "Operator {} requires document clauses, found {}",
                            operator,
                            other.kind_name()
                        )));
                    }
                }
            }
            if operator == OP_AND {
                Ok(and(filters))
            } else {
                Ok(or(filters))
            }
        }
        other => Err(filter_error(&format!(
            "Unknown top-level operator {}",
            other
        ))),
    }
}

fn parse_field_condition(
    field: &str,
    value: &Value,
    depth: usize,
    conditions: &mut Vec<Filter>,
) -> MongoliteResult<()> {
    match value {
        Value::Document(spec) if !spec.is_empty() && is_operator_spec(spec)? => {
            for (operator, operand) in spec.iter() {
                conditions.push(parse_operator(field, operator, operand, depth)?);
            }
            Ok(())
        }
        other => {
            // implicit equality, including whole-document equality
            conditions.push(Filter::new(EqualsFilter::new(
                field.to_string(),
                other.clone(),
            )));
            Ok(())
        }
    }
}

/// True if every key of the document is an operator; a mix of operator and
/// plain keys is rejected so a caller typo cannot silently degrade into a
/// whole-document equality check.
fn is_operator_spec(spec: &Document) -> MongoliteResult<bool> {
    let operator_keys = spec.iter().filter(|(key, _)| key.starts_with('$')).count();
    if operator_keys == 0 {
        Ok(false)
    } else if operator_keys == spec.len() {
        Ok(true)
    } else {
        Err(filter_error(
            "Operand document mixes operator and plain keys",
        ))
    }
}

fn parse_operator(
    field: &str,
    operator: &str,
    operand: &Value,
    depth: usize,
) -> MongoliteResult<Filter> {
    if depth > MAX_NESTING_DEPTH {
        return Err(filter_error("Filter expression exceeds maximum nesting depth"));
    }

    match operator {
        OP_EQ => Ok(Filter::new(EqualsFilter::new(
            field.to_string(),
            operand.clone(),
        ))),
        OP_NE => Ok(Filter::new(NotEqualsFilter::new(
            field.to_string(),
            operand.clone(),
        ))),
        OP_GT => Ok(comparable(field, operand, ComparisonMode::Greater)),
        OP_GTE => Ok(comparable(field, operand, ComparisonMode::GreaterEqual)),
        OP_LT => Ok(comparable(field, operand, ComparisonMode::Lesser)),
        OP_LTE => Ok(comparable(field, operand, ComparisonMode::LesserEqual)),
        OP_IN | OP_NIN => {
            let values = match operand {
                Value::Array(values) => values.clone(),
                other => {
                    return Err(filter_error(&format!(
                        "Operator {} requires an array operand, found {}",
                        operator,
                        other.kind_name()
                    )));
                }
            };
            if operator == OP_IN {
                Ok(Filter::new(InFilter::new(field.to_string(), values)))
            } else {
                Ok(Filter::new(NotInFilter::new(field.to_string(), values)))
            }
        }
        OP_EXISTS => Ok(Filter::new(ExistsFilter::new(
            field.to_string(),
            value_truthy(operand),
        ))),
        OP_REGEX => parse_regex(field, operand),
        OP_SIZE => {
            let size = match operand.as_number() {
                Some(n) if n >= 0.0 && n.fract() == 0.0 => n as usize,
                _ => {
                    return Err(filter_error(&format!(
                        "Operator {} requires a non-negative integer operand",
                        OP_SIZE
                    )));
                }
            };
            Ok(Filter::new(SizeFilter::new(field.to_string(), size)))
        }
        OP_ALL => match operand {
            Value::Array(values) => Ok(Filter::new(ContainsAllFilter::new(
                field.to_string(),
                values.clone(),
            ))),
            other => Err(filter_error(&format!(
                "Operator {} requires an array operand, found {}",
                OP_ALL,
                other.kind_name()
            ))),
        },
        OP_ELEM_MATCH => parse_elem_match(field, operand, depth),
        OP_NOT => {
            let spec = match operand {
                Value::Document(spec) if !spec.is_empty() && is_operator_spec(spec)? => spec,
                _ => {
                    return Err(filter_error(&format!(
                        "Operator {} requires an operator document operand",
                        OP_NOT
                    )));
                }
            };
            let mut inner = Vec::with_capacity(spec.len());
            for (op, op_operand) in spec.iter() {
                inner.push(parse_operator(field, op, op_operand, depth + 1)?);
            }
            let inner = if inner.len() == 1 {
                inner.remove(0)
            } else {
                and(inner)
            };
            Ok(Filter::new(NotFilter::new(inner)))
        }
        other => Err(filter_error(&format!("Unknown filter operator {}", other))),
    }
}

fn parse_elem_match(field: &str, operand: &Value, depth: usize) -> MongoliteResult<Filter> {
    let spec = match operand {
        Value::Document(spec) if !spec.is_empty() => spec,
        _ => {
            return Err(filter_error(&format!(
                "Operator {} requires a non-empty document operand",
                OP_ELEM_MATCH
            )));
        }
    };

    let mode = if is_operator_spec(spec)? {
        let mut inner = Vec::with_capacity(spec.len());
        for (op, op_operand) in spec.iter() {
            inner.push(parse_operator(ELEM_FIELD, op, op_operand, depth + 1)?);
        }
        let inner = if inner.len() == 1 {
            inner.remove(0)
        } else {
            and(inner)
        };
        ElemMatchMode::Operators(inner)
    } else {
        ElemMatchMode::SubFilter(parse_at_depth(spec, depth + 1)?)
    };
    Ok(Filter::new(ElemMatchFilter::new(field.to_string(), mode)))
}

fn parse_regex(field: &str, operand: &Value) -> MongoliteResult<Filter> {
    let (pattern, options) = match operand {
        Value::String(pattern) => (pattern.clone(), String::new()),
        Value::Document(spec) => {
            let pattern = match spec.get("pattern") {
                Some(Value::String(pattern)) => pattern,
                _ => {
                    return Err(filter_error(&format!(
                        "Operator {} requires a string 'pattern' field",
                        OP_REGEX
                    )));
                }
            };
            let options = match spec.get("options") {
                Some(Value::String(options)) => options,
                None => String::new(),
                _ => {
                    return Err(filter_error(&format!(
                        "Operator {} 'options' field must be a string",
                        OP_REGEX
                    )));
                }
            };
            (pattern, options)
        }
        other => {
            return Err(filter_error(&format!(
                "Operator {} requires a string or document operand, found {}",
                OP_REGEX,
                other.kind_name()
            )));
        }
    };
    Ok(Filter::new(RegexFilter::new(
        field.to_string(),
        &pattern,
        &options,
    )?))
}

fn comparable(field: &str, operand: &Value, mode: ComparisonMode) -> Filter {
    Filter::new(ComparableFilter::new(
        field.to_string(),
        operand.clone(),
        mode,
    ))
}

fn value_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0,
        Value::String(s) => !s.is_empty(),
        Value::Array(values) => !values.is_empty(),
        Value::Document(doc) => !doc.is_empty(),
    }
}

fn filter_error(message: &str) -> MongoliteError {
    log::error!("{}", message);
    MongoliteError::new(message, ErrorKind::FilterError)
}
