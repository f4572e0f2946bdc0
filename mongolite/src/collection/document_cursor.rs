use crate::collection::Document;
use crate::errors::MongoliteResult;

/// Lazy, restartable sequence of documents produced by a find.
///
/// # Purpose
///
/// `DocumentCursor` pulls documents from an underlying scan on demand and
/// caches everything it has yielded, so [DocumentCursor::reset] can replay
/// the sequence without re-scanning storage. A storage failure mid-scan
/// surfaces as an `Err` item; items after a failure are not produced.
///
/// Documents yielded are independent copies; mutating them has no effect on
/// stored state.
pub struct DocumentCursor {
    underlying: Box<dyn Iterator<Item = MongoliteResult<Document>>>,
    cache: Vec<MongoliteResult<Document>>,
    current_index: usize,
}

impl DocumentCursor {
    pub(crate) fn new(underlying: Box<dyn Iterator<Item = MongoliteResult<Document>>>) -> Self {
        DocumentCursor {
            underlying,
            cache: Vec::new(),
            current_index: 0,
        }
    }

    /// Rewinds the cursor to the beginning of the sequence.
    pub fn reset(&mut self) {
        self.current_index = 0;
    }

    /// Returns the total number of documents, draining the underlying scan.
    /// The cursor position is preserved.
    pub fn size(&mut self) -> MongoliteResult<u64> {
        while let Some(item) = self.underlying.next() {
            let failed = item.is_err();
            self.cache.push(item);
            if failed {
                break;
            }
        }
        for item in &self.cache {
            if let Err(err) = item {
                return Err(err.clone());
            }
        }
        Ok(self.cache.len() as u64)
    }

    /// Returns the first document of the sequence, rewinding the cursor.
    pub fn first(&mut self) -> MongoliteResult<Option<Document>> {
        self.reset();
        self.next().transpose()
    }

    /// Collects all remaining documents, aborting at the first error.
    pub fn to_vec(&mut self) -> MongoliteResult<Vec<Document>> {
        self.collect()
    }
}

impl Iterator for DocumentCursor {
    type Item = MongoliteResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_index < self.cache.len() {
            let item = self.cache[self.current_index].clone();
            self.current_index += 1;
            return Some(item);
        }
        let item = self.underlying.next()?;
        self.cache.push(item.clone());
        self.current_index += 1;
        Some(item)
    }
}
