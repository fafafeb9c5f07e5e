//! Generic document store over SQLite
//!
//! The application treats persistence as a plain
//! read/write-by-collection interface: records are JSON documents, and
//! all filtering and ordering beyond collection scans happens in the
//! caller. One table holds every collection.

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use serde_json::Value;
use tracing::info;

use crate::error::{Error, Result};

mod users;

pub type StorePool = Pool<SqliteConnectionManager>;
pub type StoreConn = PooledConnection<SqliteConnectionManager>;

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// A stored document: collection-scoped id plus JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: i64,
    pub body: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Document store with connection pooling
#[derive(Clone)]
pub struct Store {
    pool: StorePool,
}

impl Store {
    /// Open (or create) a store at the given path
    pub fn open(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;
        let store = Self { pool };
        store.run_migrations()?;
        info!(path = %path, "Document store opened");
        Ok(store)
    }

    /// Create an in-memory store (for tests)
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        // A single connection so every caller sees the same memory db.
        let pool = Pool::builder().max_size(1).build(manager)?;
        let store = Self { pool };
        store.run_migrations()?;
        Ok(store)
    }

    pub(crate) fn conn(&self) -> Result<StoreConn> {
        Ok(self.pool.get()?)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE INDEX IF NOT EXISTS idx_documents_collection
                ON documents(collection);",
        )?;
        Ok(())
    }

    /// Read every document in a collection, in insertion order
    pub fn read(&self, collection: &str) -> Result<Vec<Document>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, body, created_at, updated_at FROM documents
             WHERE collection = ? ORDER BY id",
        )?;

        let documents = stmt
            .query_map(params![collection], |row| {
                let body_str: String = row.get(1)?;
                let created_at_str: String = row.get(2)?;
                let updated_at_str: String = row.get(3)?;
                Ok((row.get::<_, i64>(0)?, body_str, created_at_str, updated_at_str))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .map(|(id, body_str, created_at, updated_at)| {
                let body = serde_json::from_str(&body_str)?;
                Ok(Document {
                    id,
                    body,
                    created_at: parse_datetime(&created_at),
                    updated_at: parse_datetime(&updated_at),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(documents)
    }

    /// Get one document by collection and id
    pub fn get(&self, collection: &str, id: i64) -> Result<Option<Document>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, body, created_at, updated_at FROM documents
                 WHERE collection = ? AND id = ?",
                params![collection, id],
                |row| {
                    let body_str: String = row.get(1)?;
                    let created_at_str: String = row.get(2)?;
                    let updated_at_str: String = row.get(3)?;
                    Ok((row.get::<_, i64>(0)?, body_str, created_at_str, updated_at_str))
                },
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        match row {
            None => Ok(None),
            Some((id, body_str, created_at, updated_at)) => {
                let body = serde_json::from_str(&body_str)?;
                Ok(Some(Document {
                    id,
                    body,
                    created_at: parse_datetime(&created_at),
                    updated_at: parse_datetime(&updated_at),
                }))
            }
        }
    }

    /// Write a new document, returning its id
    pub fn write(&self, collection: &str, body: &Value) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO documents (collection, body) VALUES (?, ?)",
            params![collection, serde_json::to_string(body)?],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Replace the body of an existing document
    pub fn update(&self, collection: &str, id: i64, body: &Value) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE documents SET body = ?, updated_at = datetime('now')
             WHERE collection = ? AND id = ?",
            params![serde_json::to_string(body)?, collection, id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("{}/{}", collection, id)));
        }
        Ok(())
    }

    /// Delete a document
    pub fn delete(&self, collection: &str, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM documents WHERE collection = ? AND id = ?",
            params![collection, id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("{}/{}", collection, id)));
        }
        Ok(())
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_read_round_trip() {
        let store = Store::in_memory().unwrap();
        let body = json!({"net_pay": 2450.5, "employer": "Acme GmbH", "pay_date": "2026-07-31"});
        let id = store.write("payslips", &body).unwrap();

        let docs = store.read("payslips").unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
        // Field-for-field equality after persistence.
        assert_eq!(docs[0].body, body);
    }

    #[test]
    fn test_collections_are_isolated() {
        let store = Store::in_memory().unwrap();
        store.write("expenses", &json!({"amount": -5.0})).unwrap();
        store.write("incomes", &json!({"amount": 100.0})).unwrap();

        assert_eq!(store.read("expenses").unwrap().len(), 1);
        assert_eq!(store.read("incomes").unwrap().len(), 1);
        assert_eq!(store.count("debts").unwrap(), 0);
    }

    #[test]
    fn test_get_update_delete() {
        let store = Store::in_memory().unwrap();
        let id = store.write("goals", &json!({"name": "Bike", "target_amount": 800.0})).unwrap();

        let doc = store.get("goals", id).unwrap().unwrap();
        assert_eq!(doc.body["name"], json!("Bike"));

        store
            .update("goals", id, &json!({"name": "Bike", "target_amount": 650.0}))
            .unwrap();
        let doc = store.get("goals", id).unwrap().unwrap();
        assert_eq!(doc.body["target_amount"], json!(650.0));

        store.delete("goals", id).unwrap();
        assert!(store.get("goals", id).unwrap().is_none());
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let store = Store::in_memory().unwrap();
        let err = store.update("goals", 999, &json!({})).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        let err = store.delete("goals", 999).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_read_preserves_insertion_order() {
        let store = Store::in_memory().unwrap();
        for i in 0..5 {
            store.write("expenses", &json!({"n": i})).unwrap();
        }
        let docs = store.read("expenses").unwrap();
        let ns: Vec<i64> = docs.iter().map(|d| d.body["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![0, 1, 2, 3, 4]);
    }
}
