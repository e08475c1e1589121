/// ChangeWatch - change email alerts for a security monitoring platform
///
/// This library collects watcher change results for an account, decides who
/// should hear about them and emails a rendered summary.
pub mod alerter;
pub mod app;
pub mod auditor;
pub mod cli;
pub mod config;
pub mod core;
pub mod directory;
pub mod error;
pub mod internal_metrics;
pub mod notification;
pub mod templating;

// Re-export core types for convenience
pub use crate::alerter::{get_subject, Alerter, AlerterServices, AlerterSettings};
pub use crate::core::*;
pub use crate::error::AlertError;
