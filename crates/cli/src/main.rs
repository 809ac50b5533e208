use anyhow::Context;
use clap::Parser;
use mlit_config::ConfigLoader;
use mlit_fetch::FetchService;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

use commands::{Commands, Outcome};

/// Exit code for failures that are reported but not fatal (e.g. a stale resource)
const EXIT_DEGRADED: u8 = 2;
/// Conventional exit code after SIGINT
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "mlit")]
#[command(about = "Cached access to the MLIT real-estate information API", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to $XDG_CONFIG_HOME/mlit/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = mlit_utils::tracing::init() {
        eprintln!("failed to initialize logging: {e}");
    }

    let cli = Cli::parse();
    tokio::select! {
        result = run(cli) => match result {
            Ok(code) => code,
            Err(e) => {
                tracing::error!("{e:#}");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted; abandoning in-flight request");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => ConfigLoader::load().context("failed to load configuration")?,
    };
    tracing::debug!(sources = ?config.sources, "configuration loaded");

    let service = FetchService::from_config(&config)
        .await
        .context("failed to start fetch service")?;

    let outcome = cli.command.execute(&service).await;
    if let Err(e) = service.shutdown().await {
        tracing::warn!(error = %e, "cache cleanup on shutdown failed");
    }

    let code = match &outcome {
        Outcome::Success(_) => ExitCode::SUCCESS,
        Outcome::Failure(failure) if failure.aborts => ExitCode::FAILURE,
        Outcome::Failure(_) => ExitCode::from(EXIT_DEGRADED),
    };
    println!("{}", outcome.render()?);
    Ok(code)
}
