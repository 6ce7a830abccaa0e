//! libSQL dedup store backend.
//!
//! Single table keyed by post id. Supports local file and in-memory
//! databases; schema is created on open.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use libsql::{Connection, Database as LibSqlDatabase, params_from_iter};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::store::traits::DedupStore;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS forwarded_posts (
    post_id     INTEGER PRIMARY KEY,
    inserted_at TEXT NOT NULL
)";

/// libSQL-backed dedup store.
///
/// Stores a single connection reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and initialize the schema.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Open(format!("create database directory: {e}")))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("open database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("connect: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        info!(path = %path.display(), "Dedup store opened");
        Ok(store)
    }

    /// Create an in-memory store (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("open in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("connect: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute(SCHEMA, ())
            .await
            .map_err(|e| StoreError::Open(format!("init schema: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl DedupStore for LibSqlStore {
    async fn filter_unsent(&self, ids: &[u64]) -> Result<Vec<u64>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(",");
        let sql = format!("SELECT post_id FROM forwarded_posts WHERE post_id IN ({placeholders})");
        let params: Vec<libsql::Value> = ids
            .iter()
            .map(|&id| libsql::Value::Integer(id as i64))
            .collect();

        let mut rows = self
            .conn
            .query(&sql, params_from_iter(params))
            .await
            .map_err(|e| StoreError::Query(format!("filter_unsent: {e}")))?;

        let mut seen = std::collections::HashSet::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("filter_unsent row: {e}")))?
        {
            let id: i64 = row
                .get(0)
                .map_err(|e| StoreError::Query(format!("filter_unsent column: {e}")))?;
            seen.insert(id as u64);
        }

        // Preserve input order; collapse repeated input ids.
        let mut unsent = Vec::new();
        for &id in ids {
            if !seen.contains(&id) {
                unsent.push(id);
                seen.insert(id);
            }
        }
        debug!(checked = ids.len(), unsent = unsent.len(), "Dedup filter");
        Ok(unsent)
    }

    async fn reserve(&self, ids: &[u64]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }

        let now = chrono::Utc::now().to_rfc3339();
        let values = vec!["(?, ?)"; ids.len()].join(", ");
        let sql = format!("INSERT OR IGNORE INTO forwarded_posts (post_id, inserted_at) VALUES {values}");

        let mut params: Vec<libsql::Value> = Vec::with_capacity(ids.len() * 2);
        for &id in ids {
            params.push(libsql::Value::Integer(id as i64));
            params.push(libsql::Value::Text(now.clone()));
        }

        self.conn
            .execute(&sql, params_from_iter(params))
            .await
            .map_err(|e| StoreError::Query(format!("reserve: {e}")))?;

        debug!(count = ids.len(), "Reserved post ids");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn filter_excludes_reserved_ids() {
        let store = LibSqlStore::new_memory().await.unwrap();
        store.reserve(&[101]).await.unwrap();

        let unsent = store.filter_unsent(&[101, 102, 103]).await.unwrap();
        assert_eq!(unsent, vec![102, 103]);
    }

    #[tokio::test]
    async fn reserve_is_idempotent() {
        let store = LibSqlStore::new_memory().await.unwrap();
        store.reserve(&[5, 6]).await.unwrap();
        // A duplicate insert attempt is success, not error.
        store.reserve(&[5, 6, 7]).await.unwrap();

        let unsent = store.filter_unsent(&[5, 6, 7]).await.unwrap();
        assert!(unsent.is_empty());
    }

    #[tokio::test]
    async fn empty_batches_are_no_ops() {
        let store = LibSqlStore::new_memory().await.unwrap();
        store.reserve(&[]).await.unwrap();
        assert!(store.filter_unsent(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_input_ids_collapse() {
        let store = LibSqlStore::new_memory().await.unwrap();
        let unsent = store.filter_unsent(&[9, 9, 9]).await.unwrap();
        assert_eq!(unsent, vec![9]);
    }
}
