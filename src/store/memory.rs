use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{reject_id_change, strip_id, with_id, DocumentStore};
use crate::error::AppError;
use crate::models::product::Document;

/// In-process collection used for local runs (`memory://`) and tests.
#[derive(Debug)]
pub struct MemoryStore {
    docs: RwLock<Vec<(Uuid, Document)>>,
    connected: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
            connected: AtomicBool::new(true),
        }
    }

    fn ensure_connected(&self) -> Result<(), AppError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(AppError::connection("Memory store is closed"))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Document>, AppError> {
        self.ensure_connected()?;
        let docs = self.docs.read().await;
        Ok(docs.iter().map(|(id, doc)| with_id(id, doc.clone())).collect())
    }

    async fn insert_one(&self, doc: Document) -> Result<String, AppError> {
        self.ensure_connected()?;
        let id = Uuid::new_v4();
        self.docs.write().await.push((id, strip_id(doc)));
        Ok(id.to_string())
    }

    async fn update_one(&self, id: &str, fields: Document) -> Result<u64, AppError> {
        self.ensure_connected()?;
        let id = Uuid::parse_str(id)?;
        reject_id_change(&fields)?;

        let mut docs = self.docs.write().await;
        let Some((_, doc)) = docs.iter_mut().find(|(doc_id, _)| *doc_id == id) else {
            return Ok(0);
        };

        let mut changed = false;
        for (key, value) in fields {
            if doc.get(&key) != Some(&value) {
                doc.insert(key, value);
                changed = true;
            }
        }
        Ok(u64::from(changed))
    }

    async fn delete_one(&self, id: &str) -> Result<u64, AppError> {
        self.ensure_connected()?;
        let id = Uuid::parse_str(id)?;

        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|(doc_id, _)| *doc_id != id);
        Ok((before - docs.len()) as u64)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.docs.write().await.clear();
    }
}
