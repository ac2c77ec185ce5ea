use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::Result;

/// Longest TTL a backend stores, about 68 years. Longer ones are clamped.
///
/// Postgres rejects intervals far beyond this, so both backends share it.
pub const MAX_TTL: Duration = Duration::from_secs(i32::MAX as u64);

/// Whole seconds a backend applies for `ttl`.
///
/// Fractions round up, so a positive TTL never expires on write; zero stays
/// zero (already expired) and anything past [`MAX_TTL`] is clamped.
pub fn ttl_seconds(ttl: Duration) -> i64 {
    let ttl = ttl.min(MAX_TTL);
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.min(MAX_TTL.as_secs()) as i64
}

/// Storage behind a [`crate::Psqache`] facade.
///
/// Every method is a single independent round trip. Implementations hold no
/// cached state of their own: expiry is decided by the store at read time and
/// expired entries stay in place until [`CacheBackend::cleanup`] runs.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Value stored under `key`, or `None` if it is missing or expired.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Insert or overwrite `key`, expiring `ttl` from now, see [`ttl_seconds`].
    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Remove every entry.
    async fn clear(&self) -> Result<()>;

    /// Remove the expired entries only.
    async fn cleanup(&self) -> Result<()>;

    /// Whether a non expired entry exists for `key`.
    async fn has(&self, key: &str) -> Result<bool>;
}
