//! In-memory document store for the BookStore API.
//!
//! Collections keep documents in insertion order so listings are stable, and
//! enforce declared unique indexes under the write lock. Handlers may run an
//! advisory existence pre-check for friendlier error messages, but the
//! index enforcement here is the authoritative guard against racing writes.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A record that can live in a [`Collection`].
pub trait Document: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DbError {
    #[error("unique index '{index}' violated")]
    UniqueViolation { index: &'static str },

    #[error("document not found")]
    NotFound,
}

/// Unique constraint over a string key derived from a document.
struct UniqueIndex<T> {
    name: &'static str,
    key: fn(&T) -> String,
}

/// An ordered, async-guarded set of documents of one type.
pub struct Collection<T> {
    docs: RwLock<Vec<T>>,
    indexes: Vec<UniqueIndex<T>>,
}

impl<T: Document> Collection<T> {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
            indexes: Vec::new(),
        }
    }

    /// Declare a unique index enforced on insert and update.
    pub fn with_unique_index(mut self, name: &'static str, key: fn(&T) -> String) -> Self {
        self.indexes.push(UniqueIndex { name, key });
        self
    }

    /// Convenience for the common shared-handle construction.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn check_indexes(&self, docs: &[T], candidate: &T, skip_id: Option<Uuid>) -> Result<(), DbError> {
        for index in &self.indexes {
            let key = (index.key)(candidate);
            let clash = docs.iter().any(|existing| {
                Some(existing.id()) != skip_id && (index.key)(existing) == key
            });
            if clash {
                tracing::debug!(index = index.name, "unique index rejected write");
                return Err(DbError::UniqueViolation { index: index.name });
            }
        }
        Ok(())
    }

    /// Insert a document, enforcing all unique indexes atomically.
    pub async fn insert(&self, doc: T) -> Result<T, DbError> {
        let mut docs = self.docs.write().await;
        self.check_indexes(&docs, &doc, None)?;
        docs.push(doc.clone());
        Ok(doc)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Option<T> {
        let docs = self.docs.read().await;
        docs.iter().find(|doc| doc.id() == id).cloned()
    }

    /// First document matching the predicate, in insertion order.
    pub async fn find_one(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        let docs = self.docs.read().await;
        docs.iter().find(|doc| pred(doc)).cloned()
    }

    /// Matching documents in insertion order, windowed by skip/limit.
    pub async fn find(&self, pred: impl Fn(&T) -> bool, skip: usize, limit: usize) -> Vec<T> {
        let docs = self.docs.read().await;
        docs.iter()
            .filter(|doc| pred(doc))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn count(&self, pred: impl Fn(&T) -> bool) -> usize {
        let docs = self.docs.read().await;
        docs.iter().filter(|doc| pred(doc)).count()
    }

    /// Apply a mutation to the document with the given id.
    ///
    /// Unique indexes are re-validated against the mutated copy before it
    /// replaces the original, so a conflicting update leaves the collection
    /// untouched.
    pub async fn update_by_id(
        &self,
        id: Uuid,
        mutate: impl FnOnce(&mut T),
    ) -> Result<T, DbError> {
        let mut docs = self.docs.write().await;
        let position = docs
            .iter()
            .position(|doc| doc.id() == id)
            .ok_or(DbError::NotFound)?;

        let mut updated = docs[position].clone();
        mutate(&mut updated);
        self.check_indexes(&docs, &updated, Some(id))?;

        docs[position] = updated.clone();
        Ok(updated)
    }

    pub async fn delete_by_id(&self, id: Uuid) -> Result<(), DbError> {
        let mut docs = self.docs.write().await;
        let position = docs
            .iter()
            .position(|doc| doc.id() == id)
            .ok_or(DbError::NotFound)?;
        docs.remove(position);
        Ok(())
    }
}

impl<T: Document> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Record {
        id: Uuid,
        name: String,
        group: String,
    }

    impl Document for Record {
        fn id(&self) -> Uuid {
            self.id
        }
    }

    fn record(name: &str, group: &str) -> Record {
        Record {
            id: Uuid::new_v4(),
            name: name.to_string(),
            group: group.to_string(),
        }
    }

    fn collection() -> Collection<Record> {
        Collection::new().with_unique_index("record_name", |r| r.name.clone())
    }

    #[tokio::test]
    async fn insert_and_find_by_id() {
        let coll = collection();
        let stored = coll.insert(record("alpha", "a")).await.unwrap();

        assert_eq!(coll.find_by_id(stored.id).await, Some(stored));
        assert_eq!(coll.find_by_id(Uuid::new_v4()).await, None);
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let coll = collection();
        coll.insert(record("alpha", "a")).await.unwrap();

        let err = coll.insert(record("alpha", "b")).await.unwrap_err();
        assert_eq!(err, DbError::UniqueViolation { index: "record_name" });
        assert_eq!(coll.count(|_| true).await, 1);
    }

    #[tokio::test]
    async fn find_preserves_insertion_order() {
        let coll = collection();
        for name in ["first", "second", "third", "fourth"] {
            coll.insert(record(name, "g")).await.unwrap();
        }

        let names: Vec<String> = coll
            .find(|_| true, 0, 10)
            .await
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, ["first", "second", "third", "fourth"]);
    }

    #[tokio::test]
    async fn find_windows_with_skip_and_limit() {
        let coll = collection();
        for i in 0..5 {
            coll.insert(record(&format!("r{i}"), "g")).await.unwrap();
        }

        let window = coll.find(|_| true, 2, 2).await;
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].name, "r2");
        assert_eq!(window[1].name, "r3");
    }

    #[tokio::test]
    async fn count_applies_predicate() {
        let coll = collection();
        coll.insert(record("a", "fiction")).await.unwrap();
        coll.insert(record("b", "fiction")).await.unwrap();
        coll.insert(record("c", "poetry")).await.unwrap();

        assert_eq!(coll.count(|r| r.group == "fiction").await, 2);
    }

    #[tokio::test]
    async fn update_mutates_in_place() {
        let coll = collection();
        let stored = coll.insert(record("alpha", "a")).await.unwrap();

        let updated = coll
            .update_by_id(stored.id, |r| r.group = "b".to_string())
            .await
            .unwrap();
        assert_eq!(updated.group, "b");
        assert_eq!(coll.find_by_id(stored.id).await.unwrap().group, "b");
    }

    #[tokio::test]
    async fn update_rejects_unique_violation_and_rolls_back() {
        let coll = collection();
        coll.insert(record("alpha", "a")).await.unwrap();
        let beta = coll.insert(record("beta", "b")).await.unwrap();

        let err = coll
            .update_by_id(beta.id, |r| r.name = "alpha".to_string())
            .await
            .unwrap_err();
        assert_eq!(err, DbError::UniqueViolation { index: "record_name" });
        // Original document is untouched.
        assert_eq!(coll.find_by_id(beta.id).await.unwrap().name, "beta");
    }

    #[tokio::test]
    async fn update_to_own_key_is_allowed() {
        let coll = collection();
        let stored = coll.insert(record("alpha", "a")).await.unwrap();

        // Re-writing the same unique key on the same document is not a clash.
        coll.update_by_id(stored.id, |r| r.name = "alpha".to_string())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let coll = collection();
        let stored = coll.insert(record("alpha", "a")).await.unwrap();

        coll.delete_by_id(stored.id).await.unwrap();
        assert_eq!(coll.find_by_id(stored.id).await, None);
        assert_eq!(coll.delete_by_id(stored.id).await, Err(DbError::NotFound));
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let coll = collection();
        let err = coll
            .update_by_id(Uuid::new_v4(), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err, DbError::NotFound);
    }
}
