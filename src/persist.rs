//! SQLite-backed cart persistence.
//!
//! One key-value table, one JSON payload per profile - the embedded
//! equivalent of the per-profile local storage the cart contract calls for.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::cart::CartRepository;
use crate::error::Error;
use crate::models::CartItem;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cart_kv (
    profile_key TEXT PRIMARY KEY,
    payload     TEXT NOT NULL,
    updated_at  TEXT NOT NULL
)";

/// Durable cart store keyed per profile.
pub struct SqliteCartRepository {
    pool: SqlitePool,
    profile_key: String,
}

impl SqliteCartRepository {
    /// Open the cart database at `path`, creating file and schema if missing.
    pub async fn open(path: &str, profile_key: &str) -> Result<Self, Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        Self::connect(options, profile_key).await
    }

    async fn connect(options: SqliteConnectOptions, profile_key: &str) -> Result<Self, Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self {
            pool,
            profile_key: profile_key.to_string(),
        })
    }

    #[cfg(test)]
    async fn open_in_memory(profile_key: &str) -> Result<Self, Error> {
        Self::connect(SqliteConnectOptions::new().in_memory(true), profile_key).await
    }
}

#[async_trait]
impl CartRepository for SqliteCartRepository {
    async fn load(&self) -> Result<Vec<CartItem>, Error> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM cart_kv WHERE profile_key = ?")
                .bind(&self.profile_key)
                .fetch_optional(&self.pool)
                .await?;
        match payload {
            Some(payload) => Ok(serde_json::from_str(&payload)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, items: &[CartItem]) -> Result<(), Error> {
        let payload = serde_json::to_string(items)?;
        sqlx::query(
            "INSERT INTO cart_kv (profile_key, payload, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(profile_key) DO UPDATE
             SET payload = excluded.payload, updated_at = excluded.updated_at",
        )
        .bind(&self.profile_key)
        .bind(payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
