pub mod cache;
pub mod schema;
pub mod tracking;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Data integrity error: {0}")]
    Integrity(String),
    #[error("Invalid state code: {0}")]
    InvalidUf(String),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Local SQLite store holding the analysis cache and view tracking.
#[derive(Clone)]
pub struct ServiceDatabase {
    pool: SqlitePool,
}

impl ServiceDatabase {
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        schema::create_schema(&pool).await?;
        schema::verify_schema(&pool).await?;

        Ok(Self { pool })
    }

    /// A private in-memory database. Pinned to one connection that never
    /// expires, since every SQLite memory connection is its own database.
    pub async fn create_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        schema::create_schema(&pool).await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
