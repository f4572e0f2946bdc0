//! Update expressions: parsing, validation, and the operator dispatch table
//! that applies field mutations to matched documents.

mod expression;
mod operators;

pub use expression::UpdateExpression;
