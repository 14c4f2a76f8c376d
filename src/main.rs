//! Cyclic/Cross-DEX Arbitrage Scanner — Multi-Chain (Ethereum, Base)
//!
//! Main entry point. Loads the TOML network configuration, builds one
//! scan loop per network, and runs them concurrently until Ctrl-C.
//! Each loop batch-reads reserves through Multicall3, evaluates
//! cross-venue routes and closed cycles, and strikes through the
//! on-chain executor when a network is configured live.
//!
//! Author: AI-Generated
//! Created: 2026-01-27
//! Modified: 2026-02-03 - Multi-network: one scanner task per [[networks]] table
//! Modified: 2026-02-04 - Watch-channel shutdown, per-network dry-run wiring
//!
//! Modes:
//! - dry-run (default): opportunities logged, nothing submitted
//! - live: requires live_mode = true AND an executor address in config

use anyhow::{bail, Context, Result};
use clap::Parser;
use cyclarb_bot::arbitrage::TradeExecutor;
use cyclarb_bot::config::{load_networks, load_private_key};
use cyclarb_bot::scanner::NetworkScanner;
use ethers::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Cyclic/Cross-DEX Arbitrage Scanner — Multi-Chain (Ethereum, Base)
#[derive(Parser)]
#[command(name = "cyclarb-bot")]
struct Args {
    /// Path to the TOML network configuration
    #[arg(short, long, env = "CYCLARB_CONFIG", default_value = "config/networks.toml")]
    config: PathBuf,

    /// Run only the named network instead of every configured one
    #[arg(short, long)]
    network: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    dotenv::dotenv().ok();

    info!("Arbitrage scanner starting, config: {}", args.config.display());

    let mut networks = load_networks(&args.config)?;
    if let Some(wanted) = &args.network {
        networks.retain(|n| &n.name == wanted);
        if networks.is_empty() {
            bail!("no network named {} in configuration", wanted);
        }
    }

    let wallet: LocalWallet = load_private_key()?
        .parse()
        .context("PRIVATE_KEY is not a valid secp256k1 key")?;
    let wallet_address = wallet.address();
    info!("Wallet: {:?}", wallet_address);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut handles = Vec::with_capacity(networks.len());
    for network in networks {
        let live = network.live_mode && network.executor.is_some();
        let mut executor = TradeExecutor::new(
            wallet.clone(),
            network.chain_id,
            network.executor.unwrap_or_else(Address::zero),
            network.max_gas_price_gwei,
        );
        executor.set_dry_run(!live);

        let name = network.name.clone();
        match NetworkScanner::new(
            network,
            Arc::new(executor),
            shutdown_rx.clone(),
            wallet_address,
        ) {
            Ok(scanner) => handles.push(tokio::spawn(scanner.run())),
            Err(e) => warn!("Skipping network {}: {:#}", name, e),
        }
    }

    if handles.is_empty() {
        bail!("no network scanner could be started");
    }
    info!("{} network scanner(s) running, Ctrl-C to stop", handles.len());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown requested, stopping scanners");
    let _ = shutdown_tx.send(true);

    futures::future::join_all(handles).await;
    info!("All scanners stopped");
    Ok(())
}
