//! Helpdesk Control - interactive helpdesk session
//!
//! Reads one question per line until an empty line, end of input or Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use helpdesk_common::Pipeline;
use helpdeskctl::{print_welcome, run_session, spawn_input_reader, Cli};
use std::io;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.resolve_config()?;
    let pipeline = Pipeline::from_config(&config).context("failed to set up ticket directory")?;
    info!(
        "model {} via {}, tickets in {}",
        config.model,
        config.runner.program,
        pipeline.ticket_dir().display()
    );

    print_welcome(&config.model);
    let mut input = spawn_input_reader();

    // One listener for the whole session
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            debug!("Ctrl-C listener unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let end = run_session(
        &pipeline,
        &config.model,
        &mut input,
        interrupt,
        &mut io::stdout(),
    )
    .await?;
    debug!("session ended: {:?}", end);

    Ok(())
}
