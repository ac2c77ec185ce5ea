// (C) Coralbits SL 2025
// This file is part of Psqache and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use crate::{
    backend::traits::{ttl_seconds, CacheBackend},
    queries::{self, queries},
    types::Result,
};

/// Cache backend storing entries in the `psqache` table.
///
/// Each operation runs exactly one statement with the pool as executor, so the
/// connection goes back to the pool as soon as the statement finishes, also on
/// error.
#[derive(Clone)]
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Build the pool without opening any connection yet.
    ///
    /// Must be called within a tokio runtime context, the pool spawns its
    /// maintenance tasks there.
    pub fn connect_lazy(url: &str, min_connections: u32, max_connections: u32) -> Result<Self> {
        info!(
            "Creating postgres pool min_connections={}, max_connections={}",
            min_connections, max_connections
        );
        let pool = PgPoolOptions::new()
            .min_connections(min_connections)
            .max_connections(max_connections)
            .connect_lazy(url)?;
        Ok(Self::new(pool))
    }

    pub async fn connect(url: &str, min_connections: u32, max_connections: u32) -> Result<Self> {
        info!(
            "Connecting postgres pool min_connections={}, max_connections={}",
            min_connections, max_connections
        );
        let pool = PgPoolOptions::new()
            .min_connections(min_connections)
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create_table(&self) -> Result<()> {
        info!("Creating psqache table if missing");
        self.execute(queries::CREATE_TABLE).await
    }

    pub async fn drop_table(&self) -> Result<()> {
        info!("Dropping psqache table if present");
        self.execute(queries::DROP_TABLE).await
    }

    async fn execute(&self, name: &str) -> Result<()> {
        sqlx::query(queries().sql(name)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for PostgresBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        debug!("get key={}", key);
        let raw = sqlx::query_scalar::<_, String>(queries().sql(queries::GET_ENTRY)?)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        let data = serde_json::to_string(value)?;
        let ttl = ttl_seconds(ttl);
        debug!("set key={}, ttl={}s", key, ttl);
        sqlx::query(queries().sql(queries::SET_ENTRY)?)
            .bind(key)
            .bind(data)
            .bind(ttl)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        debug!("delete key={}", key);
        sqlx::query(queries().sql(queries::DELETE_ENTRY)?)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        debug!("clear");
        self.execute(queries::CLEAR_ENTRIES).await
    }

    async fn cleanup(&self) -> Result<()> {
        let res = sqlx::query(queries().sql(queries::CLEANUP_EXPIRED)?)
            .execute(&self.pool)
            .await?;
        debug!("cleanup removed={}", res.rows_affected());
        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool> {
        debug!("has key={}", key);
        let exists = sqlx::query_scalar::<_, bool>(queries().sql(queries::HAS_ENTRY)?)
            .bind(key)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}
