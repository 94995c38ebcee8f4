use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use uuid::Uuid;

use super::{reject_id_change, strip_id, with_id, DocumentStore};
use crate::config::{COLLECTION_NAME, DATABASE_NAME};
use crate::error::AppError;
use crate::models::product::Document;

/// Postgres used as a document store: one JSONB column per record, in a
/// schema/table pair named after the fixed database and collection.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
    table: String,
}

impl PgDocumentStore {
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = create_pool(database_url).await.map_err(connect_error)?;
        let store = Self {
            pool,
            table: format!("\"{DATABASE_NAME}\".\"{COLLECTION_NAME}\""),
        };
        store.ensure_collection().await.map_err(connect_error)?;
        Ok(store)
    }

    async fn ensure_collection(&self) -> Result<(), sqlx::Error> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS \"{DATABASE_NAME}\""))
            .execute(&self.pool)
            .await?;
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id  UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                seq BIGSERIAL,
                doc JSONB NOT NULL
            )",
            self.table
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

fn connect_error(err: sqlx::Error) -> AppError {
    match err {
        sqlx::Error::Configuration(e) => AppError::configuration(format!("Invalid connection string: {e}")),
        other => AppError::connection(format!("Failed to connect to database: {other}")),
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_all(&self) -> Result<Vec<Document>, AppError> {
        let rows = sqlx::query_as::<_, (Uuid, Json<Document>)>(&format!(
            "SELECT id, doc FROM {} ORDER BY seq",
            self.table
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id, Json(doc))| with_id(&id, doc)).collect())
    }

    async fn insert_one(&self, doc: Document) -> Result<String, AppError> {
        let id = sqlx::query_scalar::<_, Uuid>(&format!(
            "INSERT INTO {} (doc) VALUES ($1) RETURNING id",
            self.table
        ))
        .bind(Json(strip_id(doc)))
        .fetch_one(&self.pool)
        .await?;

        Ok(id.to_string())
    }

    async fn update_one(&self, id: &str, fields: Document) -> Result<u64, AppError> {
        let id = Uuid::parse_str(id)?;
        reject_id_change(&fields)?;

        // Rows whose merged document equals the current one are not counted as modified.
        let result = sqlx::query(&format!(
            "UPDATE {} SET doc = doc || $1
             WHERE id = $2 AND doc IS DISTINCT FROM (doc || $1)",
            self.table
        ))
        .bind(Json(fields))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_one(&self, id: &str) -> Result<u64, AppError> {
        let id = Uuid::parse_str(id)?;
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", self.table))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    fn is_connected(&self) -> bool {
        !self.pool.is_closed()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    async fn live_store() -> Option<PgDocumentStore> {
        let url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| url.starts_with("postgres"))?;
        Some(PgDocumentStore::connect(&url).await.expect("connect to DATABASE_URL"))
    }

    #[test]
    fn bad_connection_string_is_a_configuration_error() {
        let err = connect_error(sqlx::Error::Configuration("invalid port number".into()));
        assert!(matches!(err, AppError::ConfigurationError(_)));

        let err = connect_error(sqlx::Error::PoolTimedOut);
        assert!(err.is_connection());
    }

    #[tokio::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn product_lifecycle_against_postgres() {
        let Some(store) = live_store().await else {
            return;
        };

        let first = store
            .insert_one(doc(json!({ "codigo": "A1", "nombre": "Widget", "precio": 10, "cantidad": 5 })))
            .await
            .unwrap();
        let second = store.insert_one(doc(json!({ "codigo": "A2" }))).await.unwrap();

        let all = store.find_all().await.unwrap();
        let position = |id: &str| all.iter().position(|d| d["_id"] == json!(id)).unwrap();
        assert!(position(&first) < position(&second));
        assert_eq!(all[position(&first)]["nombre"], json!("Widget"));

        assert_eq!(store.update_one(&first, doc(json!({ "cantidad": 3 }))).await.unwrap(), 1);
        assert_eq!(store.update_one(&first, doc(json!({ "cantidad": 3 }))).await.unwrap(), 0);

        let all = store.find_all().await.unwrap();
        let updated = all.iter().find(|d| d["_id"] == json!(first)).unwrap();
        assert_eq!(updated["cantidad"], json!(3));
        assert_eq!(updated["precio"], json!(10));

        let err = store.update_one(&first, doc(json!({ "_id": "x" }))).await.unwrap_err();
        assert!(matches!(err, AppError::OperationError(_)));
        let err = store.delete_one("not-a-uuid").await.unwrap_err();
        assert!(matches!(err, AppError::OperationError(_)));

        assert_eq!(store.delete_one(&first).await.unwrap(), 1);
        assert_eq!(store.delete_one(&first).await.unwrap(), 0);
        assert_eq!(store.delete_one(&second).await.unwrap(), 1);
        assert_eq!(store.update_one(&second, doc(json!({ "cantidad": 1 }))).await.unwrap(), 0);

        store.close().await;
        assert!(!store.is_connected());
    }
}
