use crate::core::{ChangeReports, User, UserDirectory};
use crate::directory::{DirectoryError, UserStore};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A user directory that records every query it answers.
#[derive(Clone, Default)]
pub struct RecordingDirectory {
    store: UserStore,
    queries: Arc<Mutex<Vec<(String, ChangeReports)>>>,
}

impl RecordingDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self {
            store: UserStore::new(users),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The `(account, preference)` pairs queried so far, in order.
    pub fn queries(&self) -> Vec<(String, ChangeReports)> {
        self.queries.lock().unwrap().clone()
    }

    /// How many times `preference` was queried.
    pub fn query_count(&self, preference: ChangeReports) -> usize {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, p)| *p == preference)
            .count()
    }
}

#[async_trait]
impl UserDirectory for RecordingDirectory {
    async fn active_subscribers(
        &self,
        account: &str,
        preference: ChangeReports,
    ) -> Result<Vec<User>, DirectoryError> {
        self.queries
            .lock()
            .unwrap()
            .push((account.to_string(), preference));
        self.store.active_subscribers(account, preference).await
    }
}

/// A user directory whose every query fails.
pub struct FailingDirectory;

#[async_trait]
impl UserDirectory for FailingDirectory {
    async fn active_subscribers(
        &self,
        _account: &str,
        _preference: ChangeReports,
    ) -> Result<Vec<User>, DirectoryError> {
        Err(DirectoryError::Unavailable("directory offline".to_string()))
    }
}

/// Builds an active user.
pub fn active_user(email: &str, account: &str, reports: ChangeReports) -> User {
    User {
        email: email.to_string(),
        accounts: vec![account.to_string()],
        change_reports: Some(reports),
        active: true,
    }
}
