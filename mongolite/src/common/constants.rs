// doc constants
pub const DOC_ID: &str = "_id";

/// Separator used in dotted field paths.
pub const FIELD_SEPARATOR: &str = ".";

/// Maximum nesting depth accepted for field paths and expression operands.
/// Deeper input fails with a validation error instead of recursing unbounded.
pub const MAX_NESTING_DEPTH: usize = 32;

// store constants
pub const COLLECTION_CATALOG: &str = "$mongolite_catalog";
pub const RESERVED_NAME_PREFIX: &str = "$mongolite";

// filter operator names
pub const OP_EQ: &str = "$eq";
pub const OP_NE: &str = "$ne";
pub const OP_GT: &str = "$gt";
pub const OP_GTE: &str = "$gte";
pub const OP_LT: &str = "$lt";
pub const OP_LTE: &str = "$lte";
pub const OP_IN: &str = "$in";
pub const OP_NIN: &str = "$nin";
pub const OP_EXISTS: &str = "$exists";
pub const OP_REGEX: &str = "$regex";
pub const OP_SIZE: &str = "$size";
pub const OP_ALL: &str = "$all";
pub const OP_ELEM_MATCH: &str = "$elemMatch";
pub const OP_AND: &str = "$and";
pub const OP_OR: &str = "$or";
pub const OP_NOT: &str = "$not";

// update operator names
pub const OP_SET: &str = "$set";
pub const OP_UNSET: &str = "$unset";
pub const OP_INC: &str = "$inc";
pub const OP_MUL: &str = "$mul";
pub const OP_RENAME: &str = "$rename";
pub const OP_PUSH: &str = "$push";
pub const OP_PULL: &str = "$pull";
pub const OP_PULL_ALL: &str = "$pullAll";
pub const OP_ADD_TO_SET: &str = "$addToSet";
pub const OP_POP: &str = "$pop";
pub const OP_SET_ON_INSERT: &str = "$setOnInsert";
pub const OP_EACH: &str = "$each";
