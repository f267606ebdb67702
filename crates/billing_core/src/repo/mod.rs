//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per entity.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths call the entity's `validate()` before any SQL mutation.
//! - Referenced rows (client/service/plan) cannot be deleted while
//!   subscriptions point at them; callers get `RepoError::Protected`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::ModelValidationError;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod client_repo;
pub mod plan_repo;
pub mod service_repo;
pub mod subscription_repo;

pub use client_repo::ClientRepository;
pub use plan_repo::PlanRepository;
pub use service_repo::ServiceRepository;
pub use subscription_repo::{SubscriptionListQuery, SubscriptionRepository};

const REQUIRED_TABLES: [&str; 4] = ["clients", "services", "plans", "subscriptions"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity names used in repository errors and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Client,
    Service,
    Plan,
    Subscription,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Service => "service",
            Self::Plan => "plan",
            Self::Subscription => "subscription",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository error for billing persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    NotFound {
        entity: EntityKind,
        id: i64,
    },
    /// Update requested for an entity that was never saved.
    Unsaved(EntityKind),
    /// Delete refused because subscriptions still reference the row.
    Protected {
        entity: EntityKind,
        id: i64,
        dependents: u64,
    },
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Unsaved(entity) => write!(f, "{entity} has not been saved yet"),
            Self::Protected {
                entity,
                id,
                dependents,
            } => write!(
                f,
                "{entity} {id} is referenced by {dependents} subscription(s) and cannot be deleted"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted billing data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// SQLite-backed implementation of all billing repositories.
///
/// Holds a borrowed connection only, so it is cheap to copy into several
/// services that share one connection.
#[derive(Clone, Copy)]
pub struct SqliteBillingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBillingRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` when the schema is incomplete.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        for table in REQUIRED_TABLES {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }

        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &'conn Connection {
        self.conn
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Fails with `NotFound` unless `table` has a row with `id`.
pub(crate) fn ensure_exists(
    conn: &Connection,
    entity: EntityKind,
    table: &str,
    id: i64,
) -> RepoResult<()> {
    let found = conn
        .query_row(&format!("SELECT 1 FROM {table} WHERE id = ?1;"), [id], |_| Ok(()))
        .optional()?;
    match found {
        Some(()) => Ok(()),
        None => Err(RepoError::NotFound { entity, id }),
    }
}

/// Deletes one referenced row unless subscriptions still point at it.
pub(crate) fn delete_protected(
    conn: &Connection,
    entity: EntityKind,
    table: &str,
    fk_column: &str,
    id: i64,
) -> RepoResult<()> {
    let dependents: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM subscriptions WHERE {fk_column} = ?1;"),
        params![id],
        |row| row.get(0),
    )?;
    if dependents > 0 {
        return Err(RepoError::Protected {
            entity,
            id,
            dependents: dependents.unsigned_abs(),
        });
    }

    let changed = conn.execute(&format!("DELETE FROM {table} WHERE id = ?1;"), [id])?;
    if changed == 0 {
        return Err(RepoError::NotFound { entity, id });
    }
    Ok(())
}

pub(crate) fn to_u32(value: i64, column: &str) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("value `{value}` out of range in {column}")))
}
