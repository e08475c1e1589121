//! Configuration management for ChangeWatch
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to load configuration from a `changewatch.toml` file and merge it
//! with environment variables and command-line arguments.

use crate::cli::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    value::Value,
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// The configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "changewatch.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// The account the report cycle runs for. Numeric account IDs are
    /// accepted and kept as text.
    #[serde(default, deserialize_with = "account_id")]
    pub account: Option<String>,
    /// Log recipients and rendered bodies of outgoing emails.
    #[serde(default)]
    pub debug: bool,
    /// Suppress all outgoing change emails.
    #[serde(default)]
    pub disable_emails: bool,
    /// Address(es) of the security team, always added to the recipients.
    pub security_team_email: TeamEmail,
    /// SMTP settings.
    pub mail: MailConfig,
    /// Template settings.
    pub templates: TemplateConfig,
    /// User directory settings.
    pub directory: DirectoryConfig,
    /// Pattern auditor settings.
    pub auditor: AuditorConfig,
}

/// Reads an account ID given either as a string or as a number.
///
/// Environment values such as `CHANGEWATCH_ACCOUNT=123456789012` arrive as
/// integers.
fn account_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AccountId {
        Text(String),
        Number(u64),
    }

    Ok(Option::<AccountId>::deserialize(deserializer)?.map(|id| match id {
        AccountId::Text(text) => text,
        AccountId::Number(number) => number.to_string(),
    }))
}

/// The security team address setting.
///
/// A single address or a list of addresses. A list holding non-string
/// entries keeps its string entries. Anything else is kept as-is so that a
/// malformed value does not prevent the application from starting.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum TeamEmail {
    One(String),
    Many(Vec<String>),
    Mixed(Vec<Value>),
    Invalid(Value),
}

impl TeamEmail {
    /// The configured addresses, or `None` if the setting has an invalid type.
    pub fn addresses(&self) -> Option<Vec<String>> {
        match self {
            TeamEmail::One(address) => Some(vec![address.clone()]),
            TeamEmail::Many(addresses) => Some(addresses.clone()),
            TeamEmail::Mixed(values) => Some(
                values
                    .iter()
                    .filter_map(|value| match value.as_str() {
                        Some(address) => Some(address.to_string()),
                        None => {
                            warn!(?value, "Skipping non-string SECURITY_TEAM_EMAIL entry");
                            None
                        }
                    })
                    .collect(),
            ),
            TeamEmail::Invalid(_) => None,
        }
    }
}

impl Default for TeamEmail {
    fn default() -> Self {
        TeamEmail::Many(Vec::new())
    }
}

/// SMTP settings for outgoing change emails.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MailConfig {
    /// The SMTP server hostname.
    pub smtp_host: String,
    /// The SMTP port. Defaults to 587; 465 selects implicit TLS.
    pub smtp_port: Option<u16>,
    /// Whether to use STARTTLS on ports other than 465.
    pub tls: bool,
    /// The sender address (e.g., "Alerts <alerts@example.com>").
    pub from: String,
}

/// Template settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TemplateConfig {
    /// Directory to load templates from instead of the builtin ones.
    pub dir: Option<PathBuf>,
    /// Name of the change email template.
    pub change_email: String,
}

/// User directory settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct DirectoryConfig {
    /// Path to the users CSV file.
    pub users_file: Option<PathBuf>,
}

/// Pattern auditor settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct AuditorConfig {
    #[serde(default)]
    pub rules: Vec<PatternRuleConfig>,
}

/// A single pattern auditor rule.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PatternRuleConfig {
    /// Regex matched against changed item names.
    pub pattern: String,
    /// The issue text raised on a match.
    pub issue: String,
    /// The severity score of the raised issue.
    #[serde(default)]
    pub score: u32,
}

impl Config {
    /// Loads the application configuration by layering sources: defaults,
    /// the TOML file, `CHANGEWATCH_` environment variables and CLI arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // Nested keys use a double underscore, e.g. CHANGEWATCH_MAIL__SMTP_HOST
            .merge(Env::prefixed("CHANGEWATCH_").split("__"))
            .merge(cli)
            .extract()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            account: None,
            debug: false,
            disable_emails: false,
            security_team_email: TeamEmail::default(),
            mail: MailConfig {
                smtp_host: "localhost".to_string(),
                smtp_port: None,
                tls: true,
                from: "changewatch@example.com".to_string(),
            },
            templates: TemplateConfig {
                dir: None,
                change_email: "change_email.html".to_string(),
            },
            directory: DirectoryConfig::default(),
            auditor: AuditorConfig::default(),
        }
    }
}
