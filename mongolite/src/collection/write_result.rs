use std::fmt::{Debug, Display, Formatter};

/// Result of a write operation: the ids of the documents it touched.
///
/// For inserts these are the inserted ids; for updates, the ids of modified
/// documents; for removes, the ids removed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    ids: Vec<String>,
}

impl WriteResult {
    pub fn new(ids: Vec<String>) -> Self {
        WriteResult { ids }
    }

    /// Number of documents affected.
    pub fn affected_count(&self) -> u64 {
        self.ids.len() as u64
    }

    /// Ids of the affected documents, in the order they were touched.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

impl IntoIterator for WriteResult {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

impl Display for WriteResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "WriteResult(affected: {})", self.ids.len())
    }
}

impl Debug for WriteResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "WriteResult({:?})", self.ids)
    }
}
