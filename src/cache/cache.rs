// (C) Coralbits SL 2025
// This file is part of Psqache and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde_json::Value;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, info};

use crate::{
    backend::{CacheBackend, PostgresBackend},
    config::Config,
    types::{CacheError, Result},
};

/// Four weeks.
pub const DEFAULT_TTL: Duration = Duration::from_secs(28 * 24 * 60 * 60);
pub const DEFAULT_MIN_CONNECTIONS: u32 = 15;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 25;

/// Cache facade over a [`CacheBackend`].
///
/// Every operation comes in two flavours: `aget`, `aset`... are async and
/// suspend on the backend I/O, while `get`, `set`... block the calling thread
/// on the very same future using a private runtime started on first use.
/// The blocking flavour returns [`CacheError::Runtime`] when called from inside
/// an async task; use `spawn_blocking` or the async flavour there.
pub struct Psqache<B: ?Sized = dyn CacheBackend> {
    backend: Arc<B>,
    default_ttl: Duration,
    runtime: OnceCell<Runtime>,
}

fn build_runtime() -> Result<Runtime> {
    debug!("Starting blocking runtime");
    Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("psqache-blocking")
        .enable_all()
        .build()
        .map_err(|e| CacheError::Runtime {
            message: format!("Failed to start blocking runtime: {}", e),
        })
}

fn is_nested_runtime_panic(payload: &(dyn Any + Send)) -> bool {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(|s| s.as_str()));
    message.is_some_and(|m| m.contains("Cannot start a runtime from within a runtime"))
}

impl<B: CacheBackend + ?Sized> Psqache<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            default_ttl: DEFAULT_TTL,
            runtime: OnceCell::new(),
        }
    }

    /// TTL used by `set`/`aset` when none is given.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Run `future` to completion on the blocking runtime.
    ///
    /// This is what every blocking entry point does with its async
    /// counterpart. Called from inside an async task it fails with
    /// [`CacheError::Runtime`] instead of blocking the executor.
    pub fn block_on<F: Future>(&self, future: F) -> Result<F::Output> {
        let runtime = self.runtime.get_or_try_init(build_runtime)?;
        if Handle::try_current().is_err() {
            return Ok(runtime.block_on(future));
        }
        // A tokio context is fine from spawn_blocking threads, but tokio
        // refuses to block a thread that drives async tasks.
        match panic::catch_unwind(AssertUnwindSafe(|| runtime.block_on(future))) {
            Ok(output) => Ok(output),
            Err(payload) if is_nested_runtime_panic(&*payload) => {
                Err(CacheError::Runtime {
                    message: "blocking call made from inside an async task, use the async entry point"
                        .to_string(),
                })
            }
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    pub async fn aget(&self, key: &str) -> Result<Option<Value>> {
        self.backend.get(key).await
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        self.block_on(self.aget(key))?
    }

    pub async fn aset(&self, key: &str, value: &Value, ttl: Option<Duration>) -> Result<()> {
        self.backend
            .set(key, value, ttl.unwrap_or(self.default_ttl))
            .await
    }

    pub fn set(&self, key: &str, value: &Value, ttl: Option<Duration>) -> Result<()> {
        self.block_on(self.aset(key, value, ttl))?
    }

    pub async fn adelete(&self, key: &str) -> Result<()> {
        self.backend.delete(key).await
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.block_on(self.adelete(key))?
    }

    pub async fn ahas(&self, key: &str) -> Result<bool> {
        self.backend.has(key).await
    }

    pub fn has(&self, key: &str) -> Result<bool> {
        self.block_on(self.ahas(key))?
    }

    pub async fn aclear(&self) -> Result<()> {
        self.backend.clear().await
    }

    pub fn clear(&self) -> Result<()> {
        self.block_on(self.aclear())?
    }

    pub async fn acleanup(&self) -> Result<()> {
        self.backend.cleanup().await
    }

    pub fn cleanup(&self) -> Result<()> {
        self.block_on(self.acleanup())?
    }
}

impl<B: CacheBackend + 'static> Psqache<B> {
    /// Forget the concrete backend type.
    pub fn into_dyn(mut self) -> Psqache {
        let backend: Arc<dyn CacheBackend> = self.backend.clone();
        Psqache {
            backend,
            default_ttl: self.default_ttl,
            runtime: std::mem::take(&mut self.runtime),
        }
    }
}

impl Psqache<PostgresBackend> {
    /// Facade over a lazily connected postgres pool.
    ///
    /// No connection is opened here; the first operation does it. Called
    /// outside a tokio runtime, the pool lives on the blocking runtime.
    pub fn connect_postgres(url: &str, min_connections: u32, max_connections: u32) -> Result<Self> {
        let runtime = OnceCell::new();
        let backend = if Handle::try_current().is_ok() {
            PostgresBackend::connect_lazy(url, min_connections, max_connections)?
        } else {
            let rt = runtime.get_or_try_init(build_runtime)?;
            let _guard = rt.enter();
            PostgresBackend::connect_lazy(url, min_connections, max_connections)?
        };
        Ok(Self {
            backend: Arc::new(backend),
            default_ttl: DEFAULT_TTL,
            runtime,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        info!("Creating cache from config");
        let cache = Self::connect_postgres(
            &config.database.url,
            config.database.min_connections,
            config.database.max_connections,
        )?;
        Ok(cache.with_default_ttl(config.cache.default_ttl()))
    }
}

impl<B: ?Sized> Drop for Psqache<B> {
    fn drop(&mut self) {
        // Does not block, so dropping from async code is fine.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
