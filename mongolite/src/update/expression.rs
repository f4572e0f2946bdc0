use crate::collection::Document;
use crate::common::constants::*;
use crate::common::Value;
use crate::errors::{ErrorKind, MongoliteError, MongoliteResult};
use crate::update::operators::{lookup, UpdateFn};

/// A validated, compiled update expression.
///
/// # Purpose
///
/// `UpdateExpression` parses a Mongo-style update document (top-level keys are
/// `$operators`, each mapping to a document of field-path assignments) and
/// validates it in full before any document is touched: unknown operators,
/// non-document operands, malformed paths, and any assignment targeting `_id`
/// fail at parse time. A malformed expression therefore never partially
/// applies across a scan.
///
/// # Application
///
/// [UpdateExpression::apply] runs the operators against a clone of the input
/// document and returns the mutated copy; the caller replaces the stored
/// document only on success. `$setOnInsert` assignments are skipped by
/// `apply` and only honored by [UpdateExpression::apply_on_insert], the
/// upsert path.
pub struct UpdateExpression {
    steps: Vec<UpdateStep>,
    on_insert: Option<Document>,
}

struct UpdateStep {
    operator: String,
    handler: UpdateFn,
    assignments: Document,
}

impl UpdateExpression {
    /// Parses and validates an update document.
    pub fn parse(expression: &Document) -> MongoliteResult<Self> {
        if expression.is_empty() {
            return Err(validation_error(
                "Update expression must contain at least one operator",
            ));
        }

        let mut steps = Vec::new();
        let mut on_insert = None;

        for (operator, operand) in expression.iter() {
            if !operator.starts_with('$') {
                return Err(validation_error(&format!(
                    "Update expression key '{}' is not an operator; \
                     use replace_one for whole-document replacement",
                    operator
                )));
            }

            let handler = lookup(operator).ok_or_else(|| {
                validation_error(&format!("Unknown update operator {}", operator))
            })?;

            let assignments = match operand {
                Value::Document(assignments) if !assignments.is_empty() => assignments.clone(),
                Value::Document(_) => {
                    return Err(validation_error(&format!(
                        "Operator {} requires a non-empty document operand",
                        operator
                    )));
                }
                other => {
                    return Err(validation_error(&format!(
                        "Operator {} requires a document operand, found {}",
                        operator,
                        other.kind_name()
                    )));
                }
            };

            validate_assignments(operator, &assignments)?;

            if operator == OP_SET_ON_INSERT {
                on_insert = Some(assignments);
            } else {
                steps.push(UpdateStep {
                    operator: operator.clone(),
                    handler,
                    assignments,
                });
            }
        }

        Ok(UpdateExpression { steps, on_insert })
    }

    /// Applies the expression to a copy of the given document.
    pub fn apply(&self, entry: &Document) -> MongoliteResult<Document> {
        let mut updated = entry.clone();
        for step in &self.steps {
            for (path, operand) in step.assignments.iter() {
                (step.handler)(&mut updated, path, operand)?;
            }
        }
        Ok(updated)
    }

    /// Applies the expression for a freshly inserted document (upsert):
    /// `$setOnInsert` assignments run first, then the regular operators.
    pub(crate) fn apply_on_insert(&self, entry: &Document) -> MongoliteResult<Document> {
        let mut updated = entry.clone();
        if let Some(assignments) = &self.on_insert {
            for (path, operand) in assignments.iter() {
                updated.set_path(path, operand.clone())?;
            }
        }
        self.apply(&updated)
    }
}

fn validate_assignments(operator: &str, assignments: &Document) -> MongoliteResult<()> {
    for (path, operand) in assignments.iter() {
        validate_path(path)?;
        validate_operand(operator, operand)?;
        if operator == OP_RENAME {
            match operand {
                Value::String(target) if target != DOC_ID => validate_path(target)?,
                Value::String(_) => {
                    return Err(immutable_id_error(operator));
                }
                other => {
                    return Err(validation_error(&format!(
                        "Operator {} requires a string target, found {}",
                        OP_RENAME,
                        other.kind_name()
                    )));
                }
            }
        }
    }
    Ok(())
}

fn validate_path(path: &str) -> MongoliteResult<()> {
    if path == DOC_ID || path.starts_with("_id.") {
        return Err(immutable_id_error(path));
    }
    if path.is_empty() || path.split(FIELD_SEPARATOR).any(|segment| segment.is_empty()) {
        return Err(MongoliteError::new(
            &format!("Invalid field path '{}' in update expression", path),
            ErrorKind::InvalidFieldName,
        ));
    }
    if path.split(FIELD_SEPARATOR).count() > MAX_NESTING_DEPTH {
        return Err(validation_error(&format!(
            "Field path '{}' exceeds maximum nesting depth",
            path
        )));
    }
    Ok(())
}

/// Operand-kind checks that can be decided before any document is scanned.
fn validate_operand(operator: &str, operand: &Value) -> MongoliteResult<()> {
    match operator {
        OP_INC | OP_MUL => {
            if operand.as_number().is_none() {
                return Err(validation_error(&format!(
                    "Operator {} requires a numeric operand, found {}",
                    operator,
                    operand.kind_name()
                )));
            }
        }
        OP_POP => match operand.as_number() {
            Some(n) if n == 1.0 || n == -1.0 => {}
            _ => {
                return Err(validation_error(&format!(
                    "Operator {} requires an operand of 1 or -1",
                    OP_POP
                )));
            }
        },
        OP_PULL_ALL => {
            if operand.as_array().is_none() {
                return Err(validation_error(&format!(
                    "Operator {} requires an array operand, found {}",
                    OP_PULL_ALL,
                    operand.kind_name()
                )));
            }
        }
        OP_PUSH | OP_ADD_TO_SET => {
            if let Value::Document(spec) = operand {
                if spec.contains_key(OP_EACH) && !matches!(spec.get(OP_EACH), Some(Value::Array(_)))
                {
                    return Err(validation_error(&format!(
                        "Operator {} requires an array operand for {}",
                        operator, OP_EACH
                    )));
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn immutable_id_error(context: &str) -> MongoliteError {
    let message = format!(
        "Update expression must not modify the immutable {} field (at '{}')",
        DOC_ID, context
    );
    log::error!("{}", message);
    MongoliteError::new(&message, ErrorKind::ImmutableField)
}

fn validation_error(message: &str) -> MongoliteError {
    log::error!("{}", message);
    MongoliteError::new(message, ErrorKind::ValidationError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{doc, val};

    fn set_up() -> Document {
        doc! {
            "_id": "abc",
            name: "Alice",
            age: 25,
            tags: ["x"],
        }
    }

    #[test]
    fn test_set_produces_new_document() {
        let entry = set_up();
        let update = UpdateExpression::parse(&doc! { "$set": { age: 26 } }).unwrap();
        let updated = update.apply(&entry).unwrap();
        assert_eq!(updated.get("age"), Some(val!(26)));
        // the original is untouched
        assert_eq!(entry.get("age"), Some(val!(25)));
    }

    #[test]
    fn test_operators_apply_in_order() {
        let entry = set_up();
        let update = UpdateExpression::parse(&doc! {
            "$set": { city: "NY" },
            "$inc": { age: 1 },
            "$push": { tags: "y" },
            "$unset": { name: 1 },
        })
        .unwrap();
        let updated = update.apply(&entry).unwrap();
        assert_eq!(updated.get("city"), Some(val!("NY")));
        assert_eq!(updated.get("age"), Some(val!(26)));
        assert_eq!(updated.get("tags"), Some(val!(vec!["x", "y"])));
        assert_eq!(updated.get("name"), None);
    }

    #[test]
    fn test_empty_expression_rejected() {
        let err = UpdateExpression::parse(&doc! {}).err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_non_operator_key_rejected() {
        let err = UpdateExpression::parse(&doc! { age: 26 }).err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let err = UpdateExpression::parse(&doc! { "$bump": { age: 1 } }).err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_non_document_operand_rejected() {
        let err = UpdateExpression::parse(&doc! { "$set": 5 }).err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);

        let err = UpdateExpression::parse(&doc! { "$set": {} }).err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_id_assignment_rejected_at_parse() {
        let err = UpdateExpression::parse(&doc! { "$set": { "_id": "x" } }).err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ImmutableField);

        let err = UpdateExpression::parse(&doc! { "$unset": { "_id": 1 } }).err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ImmutableField);

        let err = UpdateExpression::parse(&doc! { "$rename": { "_id": "other" } }).err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ImmutableField);

        let err = UpdateExpression::parse(&doc! { "$rename": { name: "_id" } }).err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ImmutableField);
    }

    #[test]
    fn test_operand_kinds_validated_at_parse() {
        assert!(UpdateExpression::parse(&doc! { "$inc": { age: "one" } }).is_err());
        assert!(UpdateExpression::parse(&doc! { "$mul": { age: [] } }).is_err());
        assert!(UpdateExpression::parse(&doc! { "$pop": { tags: 0 } }).is_err());
        assert!(UpdateExpression::parse(&doc! { "$pullAll": { tags: "x" } }).is_err());
        assert!(UpdateExpression::parse(&doc! { "$rename": { name: 7 } }).is_err());
        assert!(
            UpdateExpression::parse(&doc! { "$push": { tags: { "$each": "no" } } }).is_err()
        );
    }

    #[test]
    fn test_depth_cap_on_paths() {
        let deep_path = (0..MAX_NESTING_DEPTH + 1)
            .map(|i| format!("f{}", i))
            .collect::<Vec<_>>()
            .join(".");
        let err = validate_path(&deep_path).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
        assert!(validate_path("a.b.c").is_ok());

        let err = validate_path("a..b").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidFieldName);
    }

    #[test]
    fn test_descent_through_scalar_fails_whole_apply() {
        let entry = set_up();
        let update = UpdateExpression::parse(&doc! { "$set": { "age.deep": 1 } }).unwrap();
        let err = update.apply(&entry).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_set_on_insert_skipped_on_plain_apply() {
        let entry = set_up();
        let update = UpdateExpression::parse(&doc! {
            "$set": { age: 30 },
            "$setOnInsert": { created: true },
        })
        .unwrap();

        let updated = update.apply(&entry).unwrap();
        assert_eq!(updated.get("created"), None);
        assert_eq!(updated.get("age"), Some(val!(30)));
    }

    #[test]
    fn test_set_on_insert_applied_on_insert_path() {
        let base = doc! { "_id": "fresh" };
        let update = UpdateExpression::parse(&doc! {
            "$set": { age: 30 },
            "$setOnInsert": { created: true },
        })
        .unwrap();

        let inserted = update.apply_on_insert(&base).unwrap();
        assert_eq!(inserted.get("created"), Some(val!(true)));
        assert_eq!(inserted.get("age"), Some(val!(30)));
        assert_eq!(inserted.get("_id"), Some(val!("fresh")));
    }
}
