//! ChangeWatch - change email alerts
//!
//! Runs one report cycle: reads watcher results, audits them and emails a
//! summary to the users subscribed to the account.

use anyhow::Result;
use anyhow::anyhow;
use changewatch::{app, cli::Cli, config::Config, internal_metrics::LoggingRecorder};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        tracing_subscriber::fmt().init();
        error!("Failed to load configuration: {}", err);
        std::process::exit(1);
    });

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let recorder = LoggingRecorder::new();
    metrics::set_global_recorder(recorder.clone())
        .map_err(|_| anyhow!("Failed to install the metrics recorder"))?;

    info!("ChangeWatch starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Account: {}", config.account.as_deref().unwrap_or("<not set>"));
    info!("Emails Disabled: {}", config.disable_emails);
    info!("Dry Run: {}", cli.dry_run);
    info!("SMTP Host: {}", config.mail.smtp_host);
    match &config.directory.users_file {
        Some(path) => info!("Users File: {}", path.display()),
        None => info!("Users File: Not configured"),
    }
    match &config.templates.dir {
        Some(dir) => info!("Template Directory: {}", dir.display()),
        None => info!("Template Directory: Builtin"),
    }
    info!("Auditor Rules: {}", config.auditor.rules.len());
    info!("Watcher Files: {}", cli.watcher_files.len());
    info!("-------------------------------------------------------");

    let watchers = app::load_watchers(&cli.watcher_files)?;
    let services = app::build_services(&config, cli.dry_run)?;

    let outcome = app::run(&config, watchers, services).await;
    recorder.log_snapshot();
    if let Err(e) = outcome {
        error!("Report cycle failed: {:#}", e);
        return Err(e);
    }

    info!("ChangeWatch finished.");
    Ok(())
}
