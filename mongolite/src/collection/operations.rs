use std::cmp::Ordering;

use super::{Document, DocumentCursor, FindOptions, SortOrder, UpdateOptions, WriteResult};
use crate::common::constants::DOC_ID;
use crate::common::Value;
use crate::errors::{ErrorKind, MongoliteError, MongoliteResult};
use crate::filter::Filter;
use crate::store::{Store, StoreMap};
use crate::update::UpdateExpression;

/// Scan-based read and write operations over a collection's backing map.
///
/// Every query and mutation is a full scan of the map filtered by the
/// caller's predicate. Expressions are validated before the scan begins, so
/// a malformed expression never leaves partial mutations behind. A storage
/// failure mid-scan aborts the operation; mutations applied before the
/// failure stay committed.
pub(crate) struct CollectionOperations {
    collection_name: String,
    store_map: StoreMap,
    store: Store,
}

impl CollectionOperations {
    pub fn new(collection_name: &str, store_map: StoreMap, store: Store) -> Self {
        Self {
            collection_name: collection_name.to_string(),
            store_map,
            store,
        }
    }

    pub fn insert(&self, mut document: Document) -> MongoliteResult<WriteResult> {
        let id = document.id()?;
        if let Some(_existing) = self.store_map.put_if_absent(&id, document)? {
            log::error!(
                "Document with id '{}' already exists in collection '{}'",
                id,
                self.collection_name
            );
            return Err(MongoliteError::new(
                &format!("Document with id '{}' already exists", id),
                ErrorKind::UniqueConstraintViolation,
            ));
        }
        Ok(WriteResult::new(vec![id]))
    }

    pub fn insert_batch(&self, documents: Vec<Document>) -> MongoliteResult<WriteResult> {
        let mut ids = Vec::with_capacity(documents.len());
        for document in documents {
            let result = self.insert(document)?;
            ids.extend(result);
        }
        Ok(WriteResult::new(ids))
    }

    pub fn find(
        &self,
        filter: Filter,
        find_options: &FindOptions,
    ) -> MongoliteResult<DocumentCursor> {
        let matches = self.matching_documents(filter)?;

        if find_options.sort_spec().is_empty()
            && find_options.skip().is_none()
            && find_options.limit().is_none()
            && find_options.projection().is_none()
        {
            return Ok(DocumentCursor::new(Box::new(matches)));
        }

        let mut documents = Vec::new();
        for item in matches {
            documents.push(item?);
        }

        sort_documents(&mut documents, find_options.sort_spec());

        let skip = find_options.skip().unwrap_or(0) as usize;
        let limit = find_options.limit().unwrap_or(u64::MAX) as usize;
        let mut result: Vec<Document> = documents.into_iter().skip(skip).take(limit).collect();

        if let Some(projection) = find_options.projection() {
            let projector = Projector::parse(projection)?;
            let mut projected = Vec::with_capacity(result.len());
            for document in result {
                projected.push(projector.project(&document)?);
            }
            result = projected;
        }

        Ok(DocumentCursor::new(Box::new(result.into_iter().map(Ok))))
    }

    pub fn find_one(&self, filter: Filter) -> MongoliteResult<Option<Document>> {
        let mut matches = self.matching_documents(filter)?;
        matches.next().transpose()
    }

    pub fn update(
        &self,
        filter: Filter,
        update: &Document,
        update_options: &UpdateOptions,
    ) -> MongoliteResult<WriteResult> {
        let expression = UpdateExpression::parse(update)?;

        let mut modified = Vec::new();
        let mut matched_any = false;
        for item in self.store_map.entries()? {
            let (key, document) = item?;
            if !filter.apply(&document)? {
                continue;
            }
            matched_any = true;
            let updated = expression.apply(&document)?;
            if updated != document {
                self.store_map.put(&key, updated)?;
                modified.push(key);
            }
            if update_options.just_once {
                break;
            }
        }

        if !matched_any && update_options.insert_if_absent {
            let mut base = Document::new();
            for (path, value) in filter.equality_pairs() {
                base.set_path(&path, value)?;
            }
            let inserted = expression.apply_on_insert(&base)?;
            return self.insert(inserted);
        }

        Ok(WriteResult::new(modified))
    }

    pub fn replace_one(
        &self,
        filter: Filter,
        replacement: &Document,
        insert_if_absent: bool,
    ) -> MongoliteResult<WriteResult> {
        for key in replacement.fields() {
            if key.starts_with('$') {
                log::error!("Replacement document contains operator key '{}'", key);
                return Err(MongoliteError::new(
                    &format!(
                        "Replacement document must not contain operator key '{}'",
                        key
                    ),
                    ErrorKind::ValidationError,
                ));
            }
        }

        let matched = {
            let mut found = None;
            for item in self.store_map.entries()? {
                let (key, document) = item?;
                if filter.apply(&document)? {
                    found = Some(key);
                    break;
                }
            }
            found
        };

        match matched {
            Some(key) => {
                match replacement.get(DOC_ID) {
                    Some(Value::String(replacement_id)) if replacement_id == key => {}
                    Some(Value::String(replacement_id)) => {
                        log::error!(
                            "Replacement _id '{}' differs from matched document _id '{}'",
                            replacement_id,
                            key
                        );
                        return Err(MongoliteError::new(
                            "Replacement document _id must match the matched document",
                            ErrorKind::ImmutableField,
                        ));
                    }
                    Some(other) => {
                        return Err(MongoliteError::new(
                            &format!(
                                "Replacement document _id must be a non-empty string, found {}",
                                other.kind_name()
                            ),
                            ErrorKind::InvalidId,
                        ));
                    }
                    None => {}
                }
                let mut replaced = replacement.clone();
                if !replaced.has_id() {
                    replaced.put(DOC_ID, key.as_str())?;
                }
                self.store_map.put(&key, replaced)?;
                Ok(WriteResult::new(vec![key]))
            }
            None if insert_if_absent => self.insert(replacement.clone()),
            None => Ok(WriteResult::default()),
        }
    }

    pub fn remove(&self, filter: Filter, just_once: bool) -> MongoliteResult<WriteResult> {
        let mut removed = Vec::new();
        for item in self.store_map.entries()? {
            let (key, document) = item?;
            if !filter.apply(&document)? {
                continue;
            }
            self.store_map.remove(&key)?;
            removed.push(key);
            if just_once {
                break;
            }
        }
        Ok(WriteResult::new(removed))
    }

    pub fn distinct(&self, field: &str, filter: Filter) -> MongoliteResult<Vec<Value>> {
        let mut seen: Vec<Value> = Vec::new();
        for item in self.matching_documents(filter)? {
            let document = item?;
            let candidates = match document.get(field) {
                Some(Value::Array(elements)) => elements,
                Some(value) => vec![value],
                None => continue,
            };
            for candidate in candidates {
                if !seen.contains(&candidate) {
                    seen.push(candidate);
                }
            }
        }
        Ok(seen)
    }

    pub fn count(&self, filter: Filter) -> MongoliteResult<u64> {
        let mut count = 0;
        for item in self.matching_documents(filter)? {
            item?;
            count += 1;
        }
        Ok(count)
    }

    pub fn size(&self) -> MongoliteResult<u64> {
        self.store_map.size()
    }

    pub fn clear(&self) -> MongoliteResult<()> {
        self.store_map.clear()
    }

    pub fn close(&self) -> MongoliteResult<()> {
        self.store_map.close()
    }

    pub fn dispose(&self) -> MongoliteResult<()> {
        self.store.remove_map(&self.collection_name)
    }

    fn matching_documents(
        &self,
        filter: Filter,
    ) -> MongoliteResult<impl Iterator<Item = MongoliteResult<Document>> + 'static> {
        let entries = self.store_map.entries()?;
        Ok(entries.filter_map(move |item| match item {
            Ok((_, document)) => match filter.apply(&document) {
                Ok(true) => Some(Ok(document)),
                Ok(false) => None,
                Err(err) => Some(Err(err)),
            },
            Err(err) => Some(Err(err)),
        }))
    }
}

/// Stable multi-key sort. Keys are applied as successive stable passes from
/// the least significant key to the most significant one, so the first
/// listed key dominates. An absent field sorts before any present value.
fn sort_documents(documents: &mut [Document], sort_spec: &[(String, SortOrder)]) {
    for (field, order) in sort_spec.iter().rev() {
        documents.sort_by(|a, b| {
            let ordering = match (a.get(field), b.get(field)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(left), Some(right)) => left.total_cmp(&right),
            };
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
    }
}

/// Parsed field projection. Include and exclude sets cannot be mixed, with
/// one exception: `_id` may be excluded from an include projection.
struct Projector {
    include: Vec<String>,
    exclude: Vec<String>,
    id_excluded: bool,
}

impl Projector {
    fn parse(projection: &Document) -> MongoliteResult<Self> {
        let mut include = Vec::new();
        let mut exclude = Vec::new();
        let mut id_excluded = false;

        for (path, marker) in projection.iter() {
            let truthy = match marker {
                Value::Bool(flag) => *flag,
                Value::Number(n) => *n != 0.0,
                Value::Null => false,
                _ => true,
            };
            if path == DOC_ID {
                id_excluded = !truthy;
                continue;
            }
            if truthy {
                include.push(path.clone());
            } else {
                exclude.push(path.clone());
            }
        }

        if !include.is_empty() && !exclude.is_empty() {
            log::error!("Projection mixes include and exclude fields");
            return Err(MongoliteError::new(
                "Projection cannot mix include and exclude fields",
                ErrorKind::ValidationError,
            ));
        }

        Ok(Projector {
            include,
            exclude,
            id_excluded,
        })
    }

    fn project(&self, document: &Document) -> MongoliteResult<Document> {
        if !self.include.is_empty() {
            let mut result = Document::new();
            if !self.id_excluded {
                if let Some(id) = document.get(DOC_ID) {
                    result.put(DOC_ID, id)?;
                }
            }
            for path in &self.include {
                if let Some(value) = document.get(path) {
                    result.set_path(path, value)?;
                }
            }
            return Ok(result);
        }

        let mut result = document.clone();
        if self.id_excluded {
            result.remove(DOC_ID)?;
        }
        for path in &self.exclude {
            result.remove(path)?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::find_options::order_by;
    use crate::filter::{all, field};
    use crate::store::{InMemoryStore, StoreProvider};
    use crate::{doc, val};

    fn set_up() -> CollectionOperations {
        let store = InMemoryStore::create();
        store.open_or_create().unwrap();
        let map = store.open_map("people").unwrap();
        CollectionOperations::new("people", map, store)
    }

    fn seed(operations: &CollectionOperations) {
        operations
            .insert_batch(vec![
                doc! { _id: "1", name: "Alice", age: 30, city: "Paris" },
                doc! { _id: "2", name: "Bob", age: 25, city: "London" },
                doc! { _id: "3", name: "Carol", age: 35, city: "Paris" },
            ])
            .unwrap();
    }

    #[test]
    fn test_insert_assigns_id() {
        let operations = set_up();
        let result = operations.insert(doc! { name: "Dave" }).unwrap();
        assert_eq!(result.affected_count(), 1);
        assert_eq!(result.ids()[0].len(), 24);
    }

    #[test]
    fn test_insert_rejects_non_string_id() {
        let operations = set_up();
        let err = operations.insert(doc! { _id: 7, name: "Dave" }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidId);
        assert_eq!(operations.size().unwrap(), 0);
    }

    #[test]
    fn test_insert_duplicate_id_rejected() {
        let operations = set_up();
        operations.insert(doc! { _id: "x", n: 1 }).unwrap();
        let err = operations.insert(doc! { _id: "x", n: 2 }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);
        // the stored document is untouched
        let found = operations.find_one(field("_id").eq("x")).unwrap().unwrap();
        assert_eq!(found.get("n"), Some(val!(1)));
    }

    #[test]
    fn test_find_with_sort_skip_limit() {
        let operations = set_up();
        seed(&operations);

        let options = order_by("age", SortOrder::Descending).skip_by(1).limit_to(1);
        let mut cursor = operations.find(all(), &options).unwrap();
        let docs = cursor.to_vec().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get("name"), Some(val!("Alice")));
    }

    #[test]
    fn test_sort_is_stable_across_keys() {
        let operations = set_up();
        seed(&operations);

        let options = FindOptions::new()
            .order_by("city", SortOrder::Ascending)
            .order_by("age", SortOrder::Ascending);
        let mut cursor = operations.find(all(), &options).unwrap();
        let names: Vec<_> = cursor
            .to_vec()
            .unwrap()
            .iter()
            .map(|d| d.get("name").unwrap())
            .collect();
        assert_eq!(names, vec![val!("Bob"), val!("Alice"), val!("Carol")]);
    }

    #[test]
    fn test_sort_places_absent_first() {
        let operations = set_up();
        operations.insert(doc! { _id: "a", n: 2 }).unwrap();
        operations.insert(doc! { _id: "b" }).unwrap();
        operations.insert(doc! { _id: "c", n: 1 }).unwrap();

        let mut cursor = operations
            .find(all(), &order_by("n", SortOrder::Ascending))
            .unwrap();
        let ids: Vec<_> = cursor
            .to_vec()
            .unwrap()
            .iter()
            .map(|d| d.get("_id").unwrap())
            .collect();
        assert_eq!(ids, vec![val!("b"), val!("c"), val!("a")]);
    }

    #[test]
    fn test_projection_include() {
        let operations = set_up();
        seed(&operations);

        let options = FindOptions::new().project(doc! { name: 1 });
        let mut cursor = operations.find(field("_id").eq("1"), &options).unwrap();
        let projected = cursor.first().unwrap().unwrap();
        assert_eq!(projected.get("name"), Some(val!("Alice")));
        assert_eq!(projected.get("_id"), Some(val!("1")));
        assert_eq!(projected.get("age"), None);
    }

    #[test]
    fn test_projection_exclude_and_id() {
        let operations = set_up();
        seed(&operations);

        let options = FindOptions::new().project(doc! { age: 0, _id: 0 });
        let mut cursor = operations.find(field("_id").eq("1"), &options).unwrap();
        let projected = cursor.first().unwrap().unwrap();
        assert_eq!(projected.get("name"), Some(val!("Alice")));
        assert_eq!(projected.get("age"), None);
        assert_eq!(projected.get("_id"), None);
    }

    #[test]
    fn test_projection_mix_rejected() {
        let operations = set_up();
        let options = FindOptions::new().project(doc! { name: 1, age: 0 });
        let err = operations.find(all(), &options).err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_update_bulk_and_just_once() {
        let operations = set_up();
        seed(&operations);

        let result = operations
            .update(
                field("city").eq("Paris"),
                &doc! { "$set": { checked: true } },
                &UpdateOptions::default(),
            )
            .unwrap();
        assert_eq!(result.affected_count(), 2);

        let result = operations
            .update(
                all(),
                &doc! { "$inc": { age: 1 } },
                &UpdateOptions::new(false, true),
            )
            .unwrap();
        assert_eq!(result.affected_count(), 1);
    }

    #[test]
    fn test_update_dotted_path_creates_nested_field() {
        let operations = set_up();
        seed(&operations);

        let result = operations
            .update(
                field("name").eq("Alice"),
                &doc! { "$set": { "address.zip": 75001 } },
                &UpdateOptions::default(),
            )
            .unwrap();
        assert_eq!(result.affected_count(), 1);

        let alice = operations
            .find_one(field("address.zip").eq(75001))
            .unwrap()
            .unwrap();
        assert_eq!(alice.get("name"), Some(val!("Alice")));
        assert!(matches!(alice.get("address"), Some(Value::Document(_))));
    }

    #[test]
    fn test_update_no_op_not_counted() {
        let operations = set_up();
        seed(&operations);

        let result = operations
            .update(
                field("name").eq("Alice"),
                &doc! { "$set": { age: 30 } },
                &UpdateOptions::default(),
            )
            .unwrap();
        assert_eq!(result.affected_count(), 0);
    }

    #[test]
    fn test_upsert_seeds_from_equality_pairs() {
        let operations = set_up();

        let filter = field("name").eq("Erin").and(field("city").eq("Oslo"));
        let result = operations
            .update(
                filter,
                &doc! { "$set": { age: 40 }, "$setOnInsert": { fresh: true } },
                &UpdateOptions::new(true, false),
            )
            .unwrap();
        assert_eq!(result.affected_count(), 1);

        let inserted = operations
            .find_one(field("name").eq("Erin"))
            .unwrap()
            .unwrap();
        assert_eq!(inserted.get("city"), Some(val!("Oslo")));
        assert_eq!(inserted.get("age"), Some(val!(40)));
        assert_eq!(inserted.get("fresh"), Some(val!(true)));
    }

    #[test]
    fn test_upsert_skipped_when_matched() {
        let operations = set_up();
        seed(&operations);

        operations
            .update(
                field("name").eq("Alice"),
                &doc! { "$set": { age: 31 }, "$setOnInsert": { fresh: true } },
                &UpdateOptions::new(true, false),
            )
            .unwrap();
        let alice = operations
            .find_one(field("name").eq("Alice"))
            .unwrap()
            .unwrap();
        assert_eq!(alice.get("age"), Some(val!(31)));
        assert_eq!(alice.get("fresh"), None);
    }

    #[test]
    fn test_malformed_update_validated_before_scan() {
        let operations = set_up();
        seed(&operations);

        let err = operations
            .update(all(), &doc! { "$bogus": { a: 1 } }, &UpdateOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);

        // nothing was touched
        let alice = operations
            .find_one(field("name").eq("Alice"))
            .unwrap()
            .unwrap();
        assert_eq!(alice.get("age"), Some(val!(30)));
    }

    #[test]
    fn test_replace_one() {
        let operations = set_up();
        seed(&operations);

        let result = operations
            .replace_one(
                field("name").eq("Bob"),
                &doc! { name: "Robert", age: 26 },
                false,
            )
            .unwrap();
        assert_eq!(result.affected_count(), 1);

        let replaced = operations
            .find_one(field("name").eq("Robert"))
            .unwrap()
            .unwrap();
        assert_eq!(replaced.get("_id"), Some(val!("2")));
        assert_eq!(replaced.get("city"), None);
    }

    #[test]
    fn test_replace_one_rejects_operator_keys() {
        let operations = set_up();
        let err = operations
            .replace_one(all(), &doc! { "$set": { a: 1 } }, false)
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_replace_one_rejects_id_mismatch() {
        let operations = set_up();
        seed(&operations);

        let err = operations
            .replace_one(field("name").eq("Bob"), &doc! { _id: "9", name: "X" }, false)
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ImmutableField);

        let err = operations
            .replace_one(field("name").eq("Bob"), &doc! { _id: 9, name: "X" }, false)
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidId);
    }

    #[test]
    fn test_replace_one_upsert() {
        let operations = set_up();
        let result = operations
            .replace_one(field("name").eq("Zoe"), &doc! { name: "Zoe" }, true)
            .unwrap();
        assert_eq!(result.affected_count(), 1);
        assert!(operations.find_one(field("name").eq("Zoe")).unwrap().is_some());
    }

    #[test]
    fn test_remove() {
        let operations = set_up();
        seed(&operations);

        let result = operations.remove(field("city").eq("Paris"), false).unwrap();
        assert_eq!(result.affected_count(), 2);
        assert_eq!(operations.size().unwrap(), 1);

        // removing again is a no-op
        let result = operations.remove(field("city").eq("Paris"), false).unwrap();
        assert_eq!(result.affected_count(), 0);
    }

    #[test]
    fn test_remove_just_once() {
        let operations = set_up();
        seed(&operations);
        let result = operations.remove(all(), true).unwrap();
        assert_eq!(result.affected_count(), 1);
        assert_eq!(operations.size().unwrap(), 2);
    }

    #[test]
    fn test_distinct_flattens_arrays() {
        let operations = set_up();
        operations
            .insert_batch(vec![
                doc! { _id: "1", tags: ["red", "blue"] },
                doc! { _id: "2", tags: "blue" },
                doc! { _id: "3", tags: ["green", "red"] },
                doc! { _id: "4", other: 1 },
            ])
            .unwrap();

        let values = operations.distinct("tags", all()).unwrap();
        assert_eq!(
            values,
            vec![val!("red"), val!("blue"), val!("green")]
        );
    }

    #[test]
    fn test_count() {
        let operations = set_up();
        seed(&operations);
        assert_eq!(operations.count(field("city").eq("Paris")).unwrap(), 2);
        assert_eq!(operations.count(all()).unwrap(), 3);
        assert_eq!(operations.size().unwrap(), 3);
    }
}
