// (C) Coralbits SL 2025
// This file is part of Psqache and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use thiserror::Error;

/// Everything a cache operation can fail with.
///
/// A missing or expired key is never an error: it is `Ok(None)` from `get`
/// and `Ok(false)` from `has`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Pool, connectivity and statement failures, passed through untouched.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Query not found: {name}")]
    QueryNotFound { name: String },
    #[error("Invalid query file: {message}")]
    InvalidQueryFile { message: String },
    #[error("Runtime error: {message}")]
    Runtime { message: String },
}

impl CacheError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CacheError::Database(_) => "DATABASE_ERROR",
            CacheError::Serialization(_) => "SERIALIZATION_ERROR",
            CacheError::QueryNotFound { .. } => "QUERY_NOT_FOUND",
            CacheError::InvalidQueryFile { .. } => "INVALID_QUERY_FILE",
            CacheError::Runtime { .. } => "RUNTIME_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
