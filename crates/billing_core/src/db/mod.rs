//! Billing database: connection bootstrap and schema migrations.
//!
//! # Responsibility
//! - Hand out connections that enforce subscription references.
//! - Keep the schema at the version this build understands.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A connection without working foreign keys is never handed out,
//!   because deletion protection of clients, services and plans relies on
//!   `ON DELETE RESTRICT`.
//! - A database written by a newer build is refused, not downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{ensure_foreign_keys, open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// `PRAGMA foreign_keys` still reads 0 after being switched on.
    ForeignKeysDisabled,
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::ForeignKeysDisabled => f.write_str(
                "foreign keys are not enforced; subscription references would be unprotected",
            ),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "billing schema v{found} was written by a newer build (this build knows up to v{supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            Some(err)
        } else {
            None
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
