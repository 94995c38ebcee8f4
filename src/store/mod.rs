pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::product::{Document, ID_FIELD};

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

/// One collection of JSON documents addressed by a store-assigned identifier.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in natural (insertion) order, each carrying its `_id`.
    async fn find_all(&self) -> Result<Vec<Document>, AppError>;

    /// Inserts a document and returns the identifier the store assigned.
    async fn insert_one(&self, doc: Document) -> Result<String, AppError>;

    /// Overwrites only the given top-level fields. Returns how many documents changed.
    async fn update_one(&self, id: &str, fields: Document) -> Result<u64, AppError>;

    /// Returns how many documents were removed.
    async fn delete_one(&self, id: &str) -> Result<u64, AppError>;

    /// Best-effort liveness signal.
    fn is_connected(&self) -> bool;

    async fn close(&self);
}

/// Drops a caller-supplied `_id`; identity always comes from the store.
pub(crate) fn strip_id(mut doc: Document) -> Document {
    doc.remove(ID_FIELD);
    doc
}

pub(crate) fn reject_id_change(fields: &Document) -> Result<(), AppError> {
    if fields.contains_key(ID_FIELD) {
        return Err(AppError::operation("Performing an update on the path '_id' would modify the immutable field '_id'"));
    }
    Ok(())
}

/// Adds `_id` as the first key so clients always find the identifier.
pub(crate) fn with_id(id: &uuid::Uuid, doc: Document) -> Document {
    let mut out = Document::with_capacity(doc.len() + 1);
    out.insert(ID_FIELD.to_string(), id.to_string().into());
    out.extend(doc);
    out
}
