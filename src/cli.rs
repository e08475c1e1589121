//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged with
//! the configuration from the `changewatch.toml` file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Tag, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Emails a summary of watcher change results to the interested users.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Watcher result files (JSON). Each file holds one watcher result or an array of them.
    #[arg(value_name = "WATCHER_FILE")]
    pub watcher_files: Vec<PathBuf>,

    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// The account to report on.
    #[arg(short, long, value_name = "NAME")]
    pub account: Option<String>,

    /// Path to the users CSV file.
    #[arg(long, value_name = "FILE")]
    pub users: Option<PathBuf>,

    /// Do not send any email.
    #[arg(long)]
    pub disable_emails: bool,

    /// Log the email instead of sending it over SMTP.
    #[arg(long)]
    pub dry_run: bool,

    /// Log recipients and rendered email bodies.
    #[arg(long)]
    pub debug: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(account) = &self.account {
            dict.insert("account".into(), Value::from(account.clone()));
        }

        if let Some(users) = &self.users {
            let mut directory = Dict::new();
            directory.insert(
                "users_file".into(),
                Value::from(users.to_string_lossy().into_owned()),
            );
            dict.insert("directory".into(), Value::Dict(Tag::Default, directory));
        }

        // Flags only override the configuration when present.
        if self.disable_emails {
            dict.insert("disable_emails".into(), Value::from(true));
        }

        if self.debug {
            dict.insert("debug".into(), Value::from(true));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
