//! Error types surfaced by the alerter.

use crate::directory::DirectoryError;
use crate::notification::NotifyError;

/// Errors raised while building or sending a change report.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("user directory query failed: {0}")]
    Directory(#[from] DirectoryError),

    #[error("failed to render change email: {0}")]
    Template(#[from] minijinja::Error),

    #[error("failed to send change email: {0}")]
    Notify(#[from] NotifyError),
}
