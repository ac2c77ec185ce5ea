// (C) Coralbits SL 2025
// This file is part of Psqache and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    backend::traits::{ttl_seconds, CacheBackend},
    types::Result,
};

struct Entry {
    value: Value,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Process local backend with the same expiry rules as the table.
///
/// Expired entries are hidden from reads and only dropped by `cleanup`.
#[derive(Default)]
pub struct InMemBackend {
    cache: RwLock<HashMap<String, Entry>>,
}

impl InMemBackend {
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::try_seconds(ttl_seconds(ttl))
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[async_trait]
impl CacheBackend for InMemBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let now = Utc::now();
        Ok(self
            .cache
            .read()
            .await
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()> {
        let entry = Entry {
            value: value.clone(),
            expires_at: expiry(Utc::now(), ttl),
        };
        self.cache.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.cache.write().await.clear();
        Ok(())
    }

    async fn cleanup(&self) -> Result<()> {
        let now = Utc::now();
        self.cache.write().await.retain(|_, entry| entry.is_live(now));
        Ok(())
    }

    async fn has(&self, key: &str) -> Result<bool> {
        let now = Utc::now();
        Ok(self
            .cache
            .read()
            .await
            .get(key)
            .is_some_and(|entry| entry.is_live(now)))
    }
}
