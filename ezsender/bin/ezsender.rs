//! Send a templated email to every recipient in a CSV file
//!
//! Prints the `{statusCode, body}` response as JSON on stdout and exits
//! non-zero only when the recipient list could not be loaded.

use std::{num::NonZeroUsize, path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::Parser;
use ezsender::{Config, Ezsender, config};
use ezsender_common::{internal, logging};
use ezsender_intake::FileSource;
use ezsender_mail::MailerConfig;

/// Resilient bulk email dispatch
#[derive(Parser, Debug)]
#[command(name = "ezsender")]
#[command(about = "Send a templated email to every recipient in a CSV file", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (overrides `EZSENDER_CONFIG` and the default locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV file with `Name` and `Email` columns (overrides `source` in the config)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Render and log every email instead of sending it
    #[arg(long)]
    dry_run: bool,

    /// Maximum number of concurrent sends
    #[arg(short, long)]
    batch_size: Option<NonZeroUsize>,

    /// Write the full dispatch report as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match config::find_config_file(cli.config.as_deref())? {
        Some(path) => {
            internal!(level = INFO, "Using configuration {}", path.display());
            Config::load(&path)?
        }
        None if cli.csv.is_some() => Config::default(),
        None => return Err(config::not_found().into()),
    };

    if cli.dry_run {
        config.mailer = MailerConfig::Log;
    }
    if let Some(batch_size) = cli.batch_size {
        config.dispatch.batch_size = batch_size.get();
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    logging::init();
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let source = cli
        .csv
        .clone()
        .or_else(|| config.source.clone())
        .context("No recipient list given: pass --csv or set `source` in the configuration")?;

    let ezsender = Ezsender::new(&config)?;
    let invocation = ezsender.handle(&FileSource::new(source)).await;

    println!("{}", serde_json::to_string(&invocation.response)?);

    if let (Some(path), Some(report)) = (&cli.report, &invocation.report) {
        let json = serde_json::to_vec_pretty(report)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    Ok(if invocation.response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
