// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drift daemon (driftd)
//!
//! Background process that owns the sync orchestration core: the task
//! engine, delta watchers, board executor, and the secure state vault.
//! The GUI connects over a separate transport and consumes the frontend
//! event stream; until a backend adapter is configured the daemon runs
//! with the inert filesystem adapter.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod bus;
mod config;
mod core;

use crate::config::Config;
use crate::core::Core;
use drift_core::SystemClock;
use drift_fs::NoopFs;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("driftd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("driftd {}", env!("CARGO_PKG_VERSION"));
                println!("Drift daemon - background process that runs the sync core");
                println!();
                println!("USAGE:");
                println!("    driftd");
                println!();
                println!("The daemon is typically started by the desktop app and should");
                println!("not be invoked directly.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: driftd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    let _log_guard = setup_logging(&config)?;

    info!(config_dir = %config.config_dir.display(), "starting driftd");

    let (core, mut events) = Core::build(&config, NoopFs::new(), SystemClock).await?;

    // The GUI transport is wired by the desktop shell; standalone runs
    // drain the stream so publishers keep their gap numbering honest
    let event_drain = tokio::spawn(async move {
        while let Some(envelope) = events.recv().await {
            tracing::debug!(seq = envelope.seq, tag = envelope.event.tag(), "frontend event");
        }
    });

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => info!("received SIGINT"),
        _ = sigterm.recv() => info!("received SIGTERM"),
    }

    info!("shutting down");
    if let Err(e) = core.shutdown().await {
        error!(error = %e, "shutdown error");
    }
    event_drain.abort();
    Ok(())
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    let filter = match &config.settings.log_filter {
        Some(directive) => EnvFilter::try_new(directive)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let appender = tracing_appender::rolling::daily(&config.log_dir, "driftd.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
