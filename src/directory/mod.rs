//! User directory backing recipient lookups.
//!
//! `UserStore` keeps the users in memory and answers subscriber queries by
//! filtering them. It can be loaded from a CSV file with the columns
//! `email,accounts,change_reports,active`, where `accounts` is a
//! `;`-separated list of account names.

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use crate::core::{ChangeReports, User, UserDirectory};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Errors raised while loading or querying the user directory.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("failed to read user file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid user record on line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error("user directory unavailable: {0}")]
    Unavailable(String),
}

/// An in-memory user directory.
#[derive(Debug, Clone, Default)]
pub struct UserStore {
    users: Vec<User>,
}

/// A raw row of the users CSV file.
#[derive(Debug, Deserialize)]
struct UserRow {
    email: String,
    accounts: String,
    change_reports: String,
    active: String,
}

impl UserStore {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Loads users from a CSV file.
    ///
    /// # Arguments
    /// * `path` - The path to the CSV file. The first line must be the header.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        info!("Loading users from CSV file: {:?}", path);
        let read_err = |source: csv::Error| DirectoryError::Read {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(read_err)?;

        let headers = reader.headers().map_err(read_err)?.clone();
        let mut users = Vec::new();
        for result in reader.records() {
            let record = result.map_err(read_err)?;
            // A quoted field may span lines, so take the line the record starts on.
            let line = record.position().map_or(0, |pos| pos.line());
            let row: UserRow = record.deserialize(Some(&headers)).map_err(read_err)?;
            users.push(parse_row(row, line)?);
        }

        debug!("Loaded {} users.", users.len());
        Ok(Self { users })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

fn parse_row(row: UserRow, line: u64) -> Result<User, DirectoryError> {
    let change_reports = match row.change_reports.to_ascii_uppercase().as_str() {
        "ALL" => Some(ChangeReports::All),
        "ISSUES" => Some(ChangeReports::Issues),
        "NONE" => Some(ChangeReports::None),
        "" => None,
        other => {
            return Err(DirectoryError::InvalidRecord {
                line,
                reason: format!("unknown change_reports value '{}'", other),
            })
        }
    };

    let active = match row.active.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => true,
        "false" | "0" | "no" | "" => false,
        other => {
            return Err(DirectoryError::InvalidRecord {
                line,
                reason: format!("unknown active value '{}'", other),
            })
        }
    };

    if row.email.is_empty() {
        return Err(DirectoryError::InvalidRecord {
            line,
            reason: "email is empty".to_string(),
        });
    }

    let accounts = row
        .accounts
        .split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect();

    Ok(User {
        email: row.email,
        accounts,
        change_reports,
        active,
    })
}

#[async_trait]
impl UserDirectory for UserStore {
    async fn active_subscribers(
        &self,
        account: &str,
        preference: ChangeReports,
    ) -> Result<Vec<User>, DirectoryError> {
        Ok(self
            .users
            .iter()
            .filter(|user| user.active)
            .filter(|user| user.change_reports == Some(preference))
            .filter(|user| user.accounts.iter().any(|name| name == account))
            .cloned()
            .collect())
    }
}
