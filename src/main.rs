//! bank_ledger - ledger gateway binary
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────────┐    ┌────────────┐
//! │  Config  │───▶│ Gateway  │───▶│TransferEngine│───▶│ PgLedger / │
//! │  (YAML)  │    │  (axum)  │    │ (lock order) │    │MemoryLedger│
//! └──────────┘    └──────────┘    └──────────────┘    └────────────┘
//! ```
//!
//! Usage: `bank_ledger [--env dev] [--port 8080] [--memory]`

use std::sync::Arc;

use anyhow::Context;

use bank_ledger::config::AppConfig;
use bank_ledger::db::Database;
use bank_ledger::gateway::{run_server, state::AppState};
use bank_ledger::ledger::{MemoryLedger, MemoryOptions, PgLedger};
use bank_ledger::logging::init_logging;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

fn use_memory_mode() -> bool {
    std::env::args().any(|a| a == "--memory")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config =
        AppConfig::load(&env).with_context(|| format!("Failed to load config for '{}'", env))?;
    if let Some(port) = get_port_override() {
        config.gateway.port = port;
    }
    let _log_guard = init_logging(&config);

    tracing::info!(
        git_hash = env!("GIT_HASH"),
        env = %env,
        "Starting bank_ledger"
    );

    if use_memory_mode() {
        tracing::warn!("Using in-memory ledger: all data is lost on exit");
        let ledger = MemoryLedger::with_options(MemoryOptions {
            enforce_non_negative: config.ledger.enforce_non_negative,
            tx_timeout: config.ledger.tx_timeout(),
        });
        run_server(&config.gateway, Arc::new(AppState::new(ledger, None))).await?;
    } else {
        let db = Database::connect_with(&config.postgres)
            .await
            .context("Failed to connect to PostgreSQL")?;
        let mut ledger = PgLedger::from_database(&db);
        if let Some(limit) = config.ledger.tx_timeout() {
            ledger = ledger.with_tx_timeout(limit);
        }
        run_server(&config.gateway, Arc::new(AppState::new(ledger, Some(db)))).await?;
    }

    tracing::info!("bank_ledger stopped");
    Ok(())
}
