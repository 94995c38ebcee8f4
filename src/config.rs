// src/config.rs
use std::net::IpAddr;

/// Fixed database name. On Postgres this is the schema holding the collection.
pub const DATABASE_NAME: &str = "crud_expo";
/// Fixed collection name. On Postgres this is the table of JSONB documents.
pub const COLLECTION_NAME: &str = "crud_1";

#[derive(Debug, Clone)]
pub struct Config {
    /// Store connection string. Missing is not fatal at startup.
    pub database_url: Option<String>,
    pub host: IpAddr,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let host = std::env::var("HOST")
            .ok()
            .and_then(|h| h.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::from([127, 0, 0, 1]));
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        Self { database_url, host, port }
    }
}
