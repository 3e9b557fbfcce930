//! Key/value repository contracts with SQLite and in-memory implementations.
//!
//! # Responsibility
//! - Provide `get`/`put`/`delete` over one namespace of string values.
//! - Let several execution contexts share one durable backend.
//!
//! # Invariants
//! - `put` is an upsert; the last writer's value replaces the previous one.
//! - `delete` of a missing key is not an error.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for key/value persistence operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Backend cannot currently serve requests (poisoned lock, quota).
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Backend(value))
    }
}

/// Durable string storage addressed by a fixed key.
pub trait KeyValueRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> RepoResult<()>;
    fn delete(&self, key: &str) -> RepoResult<()>;

    /// Opaque stamp that moves whenever another connection commits to the
    /// backend. Writes through this handle leave it unchanged. `None` when
    /// the backend cannot observe other writers.
    fn change_stamp(&self) -> RepoResult<Option<u64>> {
        Ok(None)
    }
}

/// SQLite-backed repository over the `kv_store` table.
///
/// Clones share one connection. Open a second connection against the same
/// file to model a separate execution context.
#[derive(Clone)]
pub struct SqliteKeyValueRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKeyValueRepository {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `f` with exclusive access to the underlying connection.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> RepoResult<T>) -> RepoResult<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| RepoError::Unavailable("connection lock poisoned".to_string()))?;
        f(&conn)
    }
}

impl KeyValueRepository for SqliteKeyValueRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        self.with_connection(|conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM kv_store WHERE key = ?1;",
                    [key],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(value)
        })
    }

    fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value, updated_at)
                 VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at;",
                params![key, value],
            )?;
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> RepoResult<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM kv_store WHERE key = ?1;", [key])?;
            Ok(())
        })
    }

    fn change_stamp(&self) -> RepoResult<Option<u64>> {
        self.with_connection(|conn| {
            let version: i64 =
                conn.pragma_query_value(None, "data_version", |row| row.get(0))?;
            Ok(Some(version as u64))
        })
    }
}

/// HashMap-backed repository. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyValueRepository {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryKeyValueRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueRepository for InMemoryKeyValueRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| RepoError::Unavailable("lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| RepoError::Unavailable("lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> RepoResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| RepoError::Unavailable("lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

impl<R: KeyValueRepository + ?Sized> KeyValueRepository for Box<R> {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> RepoResult<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> RepoResult<()> {
        (**self).delete(key)
    }

    fn change_stamp(&self) -> RepoResult<Option<u64>> {
        (**self).change_stamp()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        InMemoryKeyValueRepository, KeyValueRepository, RepoError, SqliteKeyValueRepository,
    };
    use crate::db::{open_db, open_db_in_memory};

    #[test]
    fn sqlite_put_is_an_upsert() {
        let repo = SqliteKeyValueRepository::new(open_db_in_memory().unwrap());
        assert_eq!(repo.get("k").unwrap(), None);

        repo.put("k", "[\"a\"]").unwrap();
        repo.put("k", "[\"b\"]").unwrap();
        assert_eq!(repo.get("k").unwrap().as_deref(), Some("[\"b\"]"));

        let rows: i64 = repo
            .with_connection(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM kv_store;", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn sqlite_delete_missing_key_is_ok() {
        let repo = SqliteKeyValueRepository::new(open_db_in_memory().unwrap());
        repo.delete("missing").unwrap();
        repo.put("k", "[]").unwrap();
        repo.delete("k").unwrap();
        assert_eq!(repo.get("k").unwrap(), None);
    }

    #[test]
    fn change_stamp_tracks_other_connections_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stamp.db");
        let writer = SqliteKeyValueRepository::new(open_db(&path).unwrap());
        let reader = SqliteKeyValueRepository::new(open_db(&path).unwrap());
        let before = reader.change_stamp().unwrap().unwrap();
        let own_before = writer.change_stamp().unwrap().unwrap();

        writer.put("k", "[\"a\"]").unwrap();

        assert_ne!(reader.change_stamp().unwrap().unwrap(), before);
        assert_eq!(writer.change_stamp().unwrap().unwrap(), own_before);
        assert_eq!(InMemoryKeyValueRepository::new().change_stamp().unwrap(), None);
    }

    #[test]
    fn unavailable_error_names_the_cause() {
        let err = RepoError::Unavailable("quota exceeded".to_string());
        assert_eq!(err.to_string(), "storage unavailable: quota exceeded");
    }

    #[test]
    fn in_memory_clones_share_entries() {
        let first = InMemoryKeyValueRepository::new();
        let second = first.clone();

        first.put("k", "[]").unwrap();
        assert_eq!(second.get("k").unwrap().as_deref(), Some("[]"));
    }
}
