//! Preference database: connection setup and schema versioning.
//!
//! # Responsibility
//! - Open and configure SQLite connections backing the preference sets.
//! - Keep the `kv_store` schema at the version this build expects.
//!
//! # Invariants
//! - The schema version is `PRAGMA user_version`.
//! - Preference sets only ever see a connection whose schema is current.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the preference database.
#[derive(Debug)]
pub enum DbError {
    /// SQLite refused a statement or the file could not be opened.
    Backend(rusqlite::Error),
    /// The preference file was written by a newer build; it is left as is.
    SchemaTooNew { found: u32, supported: u32 },
}

impl DbError {
    /// Stable `error_code` value for structured log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "prefs_db_backend_failed",
            Self::SchemaTooNew { .. } => "prefs_schema_too_new",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(err) => write!(f, "preference database error: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "preference file uses schema {found}; this build reads up to {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Backend(value)
    }
}
