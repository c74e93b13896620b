// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entry point: wires an [`Engine`] against a no-op collaborator bundle,
//! runs it on a single-threaded `tokio` runtime, and shuts it down
//! cleanly on SIGINT or on the first fatal `CommitFailed`/`PubFailed`
//! condition the Batch Engine raises (spec.md §7).

use jobcore_adapters::NoopCollaborators;
use jobcore_daemon::Config;
use jobcore_engine::Engine;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("jobcored: failed to load configuration: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    init_tracing(&config.log_level);
    tracing::info!(batch_window_ms = config.batch_window.as_millis(), state_dir = %config.state_dir.display(), "jobcored starting");

    let engine = Engine::new(NoopCollaborators, config.batch_window);
    let mut fatal = engine.fatal();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received SIGINT, shutting down");
        }
        changed = fatal.changed() => {
            if changed.is_ok() {
                if let Some(err) = fatal.borrow().clone() {
                    tracing::error!(error = %err, "fatal batch-engine condition, shutting down");
                    engine.shutdown().await;
                    return std::process::ExitCode::FAILURE;
                }
            }
        }
    }

    engine.shutdown().await;
    std::process::ExitCode::SUCCESS
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
