// (C) Coralbits SL 2025
// This file is part of Psqache and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

//! Key-value cache with per-entry TTL stored in a postgres table.
//!
//! ```no_run
//! use psqache::Psqache;
//! use serde_json::json;
//!
//! let cache = Psqache::connect_postgres("postgres://localhost/app", 15, 25)?;
//! cache.set("user:1", &json!({"name": "Ada"}), None)?;
//! assert_eq!(cache.get("user:1")?, Some(json!({"name": "Ada"})));
//! # Ok::<(), psqache::CacheError>(())
//! ```

pub mod backend;
pub mod cache;
pub mod config;
pub mod queries;
pub mod types;
pub mod utils;

pub use backend::*;
pub use cache::*;
pub use config::*;
pub use types::*;
