//! Cyclic/Cross-DEX Arbitrage Scanner Library
//!
//! Components for reading AMM reserves in bulk, evaluating
//! cross-venue and cyclic opportunities, and striking atomically.
//!
//! Author: AI-Generated
//! Created: 2026-01-28
//! Modified: 2026-02-04 (multi-network scanner layout)

pub mod arbitrage;
pub mod config;
pub mod contracts;
pub mod error;
pub mod pool;
pub mod rpc;
pub mod scanner;
pub mod types;

pub use config::load_networks;
pub use error::ScanError;
pub use scanner::NetworkScanner;
pub use types::{NetworkConfig, PoolReading, TradeOpportunity};
