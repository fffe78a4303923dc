use anyhow::Context;
use clap::Parser;
use portsweep::cli::Args;
use portsweep::config::Settings;
use portsweep::output::{self, Reporter};
use portsweep::scanner::{Scan, ScanSummary, TcpConnector};
use portsweep::types::SystemResolver;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Exit status after an operator interrupt (128 + SIGINT).
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match run(args).await {
        Ok(summary) if summary.interrupted => ExitCode::from(EXIT_INTERRUPTED),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<ScanSummary> {
    let settings = Settings::load(args.config.as_deref()).context("failed to load settings")?;
    let config = args.into_config(&settings);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            output::print_warning("interrupted, waiting for in-flight connections");
            on_interrupt.cancel();
        }
    });

    let mut reporter = Reporter::stdio(config.verbose, config.format);
    let summary = Scan::new(config, SystemResolver::new(), TcpConnector::new())
        .with_cancellation(cancel)
        .run(&mut reporter)
        .await?;

    Ok(summary)
}
