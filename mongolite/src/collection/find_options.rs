use crate::collection::Document;

/// Direction of a sort key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Options shaping a find: multi-key sort, skip/limit pagination, and field
/// projection.
///
/// Sort keys are applied in the order given, the first being the most
/// significant. Projection is a document of field paths mapped to include
/// (truthy) or exclude (falsy) markers; include and exclude cannot be mixed,
/// except that `_id` may be excluded from an include projection.
#[derive(Clone, Default)]
pub struct FindOptions {
    sort_by: Vec<(String, SortOrder)>,
    skip: Option<u64>,
    limit: Option<u64>,
    projection: Option<Document>,
}

impl FindOptions {
    pub fn new() -> Self {
        FindOptions::default()
    }

    /// Appends a sort key.
    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.sort_by.push((field.to_string(), order));
        self
    }

    /// Skips the first `skip` documents of the result.
    pub fn skip_by(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Caps the result at `limit` documents.
    pub fn limit_to(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the projection document.
    pub fn project(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn sort_spec(&self) -> &[(String, SortOrder)] {
        &self.sort_by
    }

    pub fn skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn projection(&self) -> Option<&Document> {
        self.projection.as_ref()
    }
}

/// Convenience constructor for a sorted find.
pub fn order_by(field: &str, order: SortOrder) -> FindOptions {
    FindOptions::new().order_by(field, order)
}

/// Convenience constructor for a paginated find.
pub fn skip_by(skip: u64) -> FindOptions {
    FindOptions::new().skip_by(skip)
}

/// Convenience constructor for a capped find.
pub fn limit_to(limit: u64) -> FindOptions {
    FindOptions::new().limit_to(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_builder_accumulates() {
        let options = FindOptions::new()
            .order_by("age", SortOrder::Descending)
            .order_by("name", SortOrder::Ascending)
            .skip_by(5)
            .limit_to(10)
            .project(doc! { name: 1 });

        assert_eq!(options.sort_spec().len(), 2);
        assert_eq!(options.sort_spec()[0].0, "age");
        assert_eq!(options.skip(), Some(5));
        assert_eq!(options.limit(), Some(10));
        assert!(options.projection().is_some());
    }

    #[test]
    fn test_default_is_unconstrained() {
        let options = FindOptions::default();
        assert!(options.sort_spec().is_empty());
        assert_eq!(options.skip(), None);
        assert_eq!(options.limit(), None);
        assert!(options.projection().is_none());
    }

    #[test]
    fn test_free_constructors() {
        assert_eq!(order_by("a", SortOrder::Ascending).sort_spec().len(), 1);
        assert_eq!(skip_by(3).skip(), Some(3));
        assert_eq!(limit_to(7).limit(), Some(7));
    }
}
