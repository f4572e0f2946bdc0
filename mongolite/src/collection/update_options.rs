/// Options controlling the scope and upsert behavior of an update.
///
/// Bulk scope (every match) is the default; `just_once` restricts the update
/// to the first match in scan order. `insert_if_absent` turns the call into
/// an upsert: when nothing matches, a new document is built from the
/// filter's equality pairs plus the update expression and inserted.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct UpdateOptions {
    pub insert_if_absent: bool,
    pub just_once: bool,
}

impl UpdateOptions {
    pub fn new(insert_if_absent: bool, just_once: bool) -> Self {
        UpdateOptions {
            insert_if_absent,
            just_once,
        }
    }
}

/// Options for an upserting update.
pub fn insert_if_absent() -> UpdateOptions {
    UpdateOptions::new(true, false)
}

/// Options restricting an update to the first match.
pub fn just_once() -> UpdateOptions {
    UpdateOptions::new(false, true)
}
