// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Virtual Wallet Server
//!
//! Entry point for the `vwallet-node` binary. Parses CLI arguments,
//! initializes logging and metrics, builds the in-memory ledger and serves
//! the REST API.
//!
//! The binary supports two subcommands:
//!
//! - `run`: start the API and metrics servers
//! - `version`: print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;

use vwallet_ledger::{SettlementEvent, WalletLedger};

use cli::{Commands, VwalletNodeCli};
use logging::LogFormat;
use metrics::WalletMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = VwalletNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the API server, the metrics endpoint and the settlement watcher.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        logging::DEFAULT_FILTER,
        LogFormat::from_str_lossy(&args.log_format),
    );

    let config = args.ledger_config();
    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        default_wallet = %config.default_wallet,
        seeded = config.seed_demo_wallet,
        eth_price = %config.pricing.eth_price_usd,
        "starting vwallet-node"
    );

    // --- Ledger ---
    let ledger = Arc::new(WalletLedger::in_memory(config));

    // --- Metrics ---
    let node_metrics = Arc::new(WalletMetrics::new());

    // --- Settlement watcher ---
    let mut events = ledger.settlements().subscribe();
    let watcher_ledger = Arc::clone(&ledger);
    let watcher_metrics = Arc::clone(&node_metrics);
    let settlement_watcher = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SettlementEvent::Confirmed { .. }) => {
                    watcher_metrics.settlements_confirmed_total.inc();
                }
                Ok(SettlementEvent::Cancelled { transaction_id }) => {
                    tracing::debug!(%transaction_id, "settlement cancelled");
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("settlement watcher lagged by {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
            watcher_metrics
                .pending_settlements
                .set(watcher_ledger.settlements().pending() as i64);
        }
    });

    // --- Application state ---
    let app_state = api::AppState {
        ledger: Arc::clone(&ledger),
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = SocketAddr::new(args.bind, args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = SocketAddr::new(args.bind, args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    for transaction_id in ledger.shutdown() {
        tracing::info!(%transaction_id, "transaction left pending at shutdown");
    }
    settlement_watcher.abort();
    tracing::info!("vwallet-node stopped");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("vwallet-node {}", env!("CARGO_PKG_VERSION"));
    println!("rustc        {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
