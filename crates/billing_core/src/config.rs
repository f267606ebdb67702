//! Environment-driven runtime configuration.
//!
//! # Invariants
//! - Process environment wins over values from a `.env` file.
//! - Blank variables count as unset.
//! - A relative `BILLING_LOG_DIR` is passed through untouched;
//!   `init_logging` is the one that rejects it.

use crate::logging::default_log_level;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DB_PATH_ENV: &str = "BILLING_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "BILLING_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "BILLING_LOG_DIR";
pub const DEFAULT_DB_FILE_NAME: &str = "billing.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging stays off when unset.
    pub log_dir: Option<String>,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl BillingConfig {
    /// Reads configuration from process environment variables, after
    /// loading a `.env` file from the working directory when one exists.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration from `path` in dotenv format, with process
    /// environment variables taking precedence.
    ///
    /// # Errors
    /// - Returns the dotenvy error when the file is missing or malformed.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, dotenvy::Error> {
        let file_vars = dotenvy::from_path_iter(path.as_ref())?
            .collect::<Result<HashMap<String, String>, _>>()?;
        Ok(Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| file_vars.get(key).cloned())
        }))
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            db_path: read(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_level: read(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
            log_dir: read(LOG_DIR_ENV),
        }
    }
}
