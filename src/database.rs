// src/database.rs
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::AppError;
use crate::store::{DocumentStore, MemoryStore, PgDocumentStore};

pub type StoreHandle = Arc<dyn DocumentStore>;

/// Opens a store handle from a connection string.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<StoreHandle, AppError>;
}

/// Picks the backend from the URL scheme.
#[derive(Debug, Default, Clone, Copy)]
pub struct UrlConnector;

#[async_trait]
impl Connector for UrlConnector {
    async fn connect(&self, url: &str) -> Result<StoreHandle, AppError> {
        let scheme = url.split_once("://").map(|(scheme, _)| scheme);
        match scheme {
            Some("postgres") | Some("postgresql") => {
                Ok(Arc::new(PgDocumentStore::connect(url).await?))
            }
            Some("memory") => Ok(Arc::new(MemoryStore::new())),
            _ => Err(AppError::configuration(
                "Unsupported connection string; expected postgres:// or memory://",
            )),
        }
    }
}

/// Lazily connected store handle, reused by every request the process serves.
pub struct ConnectionManager {
    database_url: Option<String>,
    connector: Arc<dyn Connector>,
    cached: Mutex<Option<StoreHandle>>,
}

impl ConnectionManager {
    pub fn new(database_url: Option<String>) -> Self {
        Self::with_connector(database_url, Arc::new(UrlConnector))
    }

    pub fn with_connector(database_url: Option<String>, connector: Arc<dyn Connector>) -> Self {
        Self {
            database_url,
            connector,
            cached: Mutex::new(None),
        }
    }

    /// Returns the cached handle while it still reports connected, otherwise
    /// connects a fresh one and caches it.
    #[instrument(skip(self))]
    pub async fn acquire(&self) -> Result<StoreHandle, AppError> {
        let mut cached = self.cached.lock().await;

        if let Some(handle) = cached.as_ref() {
            if handle.is_connected() {
                debug!("Reusing cached database connection");
                return Ok(Arc::clone(handle));
            }
            warn!("Cached database connection is no longer connected");
        }
        *cached = None;

        let url = self
            .database_url
            .as_deref()
            .ok_or_else(|| AppError::configuration("DATABASE_URL is not configured"))?;

        let handle = self.connector.connect(url).await?;
        info!("Connected to database");
        *cached = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// Forgets the cached handle so the next `acquire` reconnects.
    pub async fn invalidate(&self) {
        if self.cached.lock().await.take().is_some() {
            warn!("Dropped cached database connection after a connection failure");
        }
    }

    /// Closes the cached handle at shutdown.
    pub async fn release(&self) {
        if let Some(handle) = self.cached.lock().await.take() {
            handle.close().await;
            info!("Database connection closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Hands out memory stores and counts how often it was asked.
    #[derive(Default)]
    struct CountingConnector {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Connector for CountingConnector {
        async fn connect(&self, _url: &str) -> Result<StoreHandle, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::connection("connection refused"));
            }
            Ok(Arc::new(MemoryStore::new()))
        }
    }

    fn manager(connector: Arc<CountingConnector>) -> ConnectionManager {
        ConnectionManager::with_connector(Some("memory://".into()), connector)
    }

    #[tokio::test]
    async fn reuses_handle_while_connected() {
        let connector = Arc::new(CountingConnector::default());
        let manager = manager(connector.clone());

        let first = manager.acquire().await.unwrap();
        let second = manager.acquire().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(connector.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn reconnects_when_handle_is_closed() {
        let connector = Arc::new(CountingConnector::default());
        let manager = manager(connector.clone());

        let first = manager.acquire().await.unwrap();
        first.close().await;
        let second = manager.acquire().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.is_connected());
        assert_eq!(connector.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_a_new_connection() {
        let connector = Arc::new(CountingConnector::default());
        let manager = manager(connector.clone());

        manager.acquire().await.unwrap();
        manager.invalidate().await;
        manager.acquire().await.unwrap();
        assert_eq!(connector.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn missing_url_is_a_configuration_error() {
        let connector = Arc::new(CountingConnector::default());
        let manager = ConnectionManager::with_connector(None, connector.clone());

        let err = manager.acquire().await.err().unwrap();
        assert!(matches!(err, AppError::ConfigurationError(_)));
        assert_eq!(connector.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_connect_leaves_nothing_cached() {
        let connector = Arc::new(CountingConnector { fail: true, ..Default::default() });
        let manager = manager(connector.clone());

        assert!(manager.acquire().await.err().unwrap().is_connection());
        assert!(manager.cached.lock().await.is_none());
        assert!(manager.acquire().await.is_err());
        assert_eq!(connector.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn release_closes_the_cached_handle() {
        let manager = manager(Arc::new(CountingConnector::default()));
        let handle = manager.acquire().await.unwrap();
        manager.release().await;
        assert!(!handle.is_connected());
    }

    #[tokio::test]
    async fn url_connector_rejects_unknown_schemes() {
        let err = UrlConnector.connect("mongodb://localhost").await.err().unwrap();
        assert!(matches!(err, AppError::ConfigurationError(_)));

        let handle = UrlConnector.connect("memory://").await.unwrap();
        assert!(handle.is_connected());
    }
}
