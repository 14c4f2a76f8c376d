//! Configuration Loading
//!
//! Parses the TOML network file into typed `NetworkConfig` values and
//! pulls the signing key from the environment. A malformed network is
//! logged and skipped; the load only fails when nothing usable
//! remains.
//!
//! Author: AI-Generated
//! Created: 2026-01-27
//! Modified: 2026-02-03 (multi-network TOML, venue reference validation)

use crate::types::{CycleConfig, CycleHop, NetworkConfig, RouteConfig};
use anyhow::{bail, Context, Result};
use ethers::types::{Address, U256};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Multicall3 ships at the same address on every supported chain
static DEFAULT_MULTICALL: Lazy<Address> = Lazy::new(|| {
    Address::from_str("0xcA11bde05977b3631167028862bE2a173976CA11")
        .expect("valid address constant")
});

const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
const DEFAULT_CALL_TIMEOUT_MS: u64 = 4000;
const DEFAULT_MAX_GAS_PRICE_GWEI: u64 = 100;

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_call_timeout() -> u64 {
    DEFAULT_CALL_TIMEOUT_MS
}

fn default_max_gas_price() -> u64 {
    DEFAULT_MAX_GAS_PRICE_GWEI
}

#[derive(Debug, Deserialize)]
struct RawConfigFile {
    networks: Vec<RawNetwork>,
}

#[derive(Debug, Deserialize)]
struct RawNetwork {
    name: String,
    chain_id: u64,
    endpoints: Vec<String>,
    multicall: Option<String>,
    venues: BTreeMap<String, String>,
    #[serde(default)]
    routes: Vec<RawRoute>,
    #[serde(default)]
    cycles: Vec<RawCycle>,
    min_profit_wei: String,
    moat_wei: String,
    min_trade_wei: String,
    #[serde(default = "default_poll_interval")]
    poll_interval_ms: u64,
    #[serde(default = "default_call_timeout")]
    call_timeout_ms: u64,
    #[serde(default = "default_max_gas_price")]
    max_gas_price_gwei: u64,
    executor: Option<String>,
    #[serde(default)]
    live_mode: bool,
    #[serde(default)]
    cooldown_iterations: u64,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    symbol: String,
    token_in: String,
    token_out: String,
    buy_venue: String,
    sell_venue: String,
    buy_pool: String,
    sell_pool: String,
}

#[derive(Debug, Deserialize)]
struct RawCycle {
    symbol: String,
    hops: Vec<RawHop>,
}

#[derive(Debug, Deserialize)]
struct RawHop {
    pool: String,
    #[serde(default)]
    reversed: bool,
}

fn parse_address(value: &str, what: &str) -> Result<Address> {
    Address::from_str(value).with_context(|| format!("invalid {} address: {}", what, value))
}

fn parse_wei(value: &str, what: &str) -> Result<U256> {
    U256::from_dec_str(value).with_context(|| format!("invalid {} amount: {}", what, value))
}

fn convert_network(raw: RawNetwork) -> Result<NetworkConfig> {
    if raw.endpoints.is_empty() {
        bail!("network {} declares no endpoints", raw.name);
    }

    let multicall = match &raw.multicall {
        Some(addr) => parse_address(addr, "multicall")?,
        None => *DEFAULT_MULTICALL,
    };

    let mut venues = BTreeMap::new();
    for (key, addr) in &raw.venues {
        venues.insert(key.clone(), parse_address(addr, "venue router")?);
    }

    let mut routes = Vec::with_capacity(raw.routes.len());
    for route in &raw.routes {
        for venue in [&route.buy_venue, &route.sell_venue] {
            if !venues.contains_key(venue) {
                bail!(
                    "route {} references undeclared venue {}",
                    route.symbol,
                    venue
                );
            }
        }
        routes.push(RouteConfig {
            symbol: route.symbol.clone(),
            token_in: parse_address(&route.token_in, "token_in")?,
            token_out: parse_address(&route.token_out, "token_out")?,
            buy_venue: route.buy_venue.clone(),
            sell_venue: route.sell_venue.clone(),
            buy_pool: parse_address(&route.buy_pool, "buy_pool")?,
            sell_pool: parse_address(&route.sell_pool, "sell_pool")?,
        });
    }

    let mut cycles = Vec::with_capacity(raw.cycles.len());
    for cycle in &raw.cycles {
        if cycle.hops.len() < 2 {
            bail!("cycle {} needs at least two hops", cycle.symbol);
        }
        let hops = cycle
            .hops
            .iter()
            .map(|hop| {
                Ok(CycleHop {
                    pool: parse_address(&hop.pool, "cycle hop pool")?,
                    reversed: hop.reversed,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        cycles.push(CycleConfig {
            symbol: cycle.symbol.clone(),
            hops,
        });
    }

    let executor = raw
        .executor
        .as_deref()
        .map(|addr| parse_address(addr, "executor"))
        .transpose()?;
    if raw.live_mode && executor.is_none() {
        bail!(
            "network {} sets live_mode without an executor contract",
            raw.name
        );
    }

    Ok(NetworkConfig {
        name: raw.name,
        chain_id: raw.chain_id,
        endpoints: raw.endpoints,
        multicall,
        venues,
        routes,
        cycles,
        min_profit_wei: parse_wei(&raw.min_profit_wei, "min_profit_wei")?,
        moat_wei: parse_wei(&raw.moat_wei, "moat_wei")?,
        min_trade_wei: parse_wei(&raw.min_trade_wei, "min_trade_wei")?,
        poll_interval_ms: raw.poll_interval_ms,
        call_timeout_ms: raw.call_timeout_ms,
        max_gas_price_gwei: raw.max_gas_price_gwei,
        executor,
        live_mode: raw.live_mode,
        cooldown_iterations: raw.cooldown_iterations,
    })
}

fn convert_all(raw: RawConfigFile) -> Result<Vec<NetworkConfig>> {
    let declared = raw.networks.len();
    let mut networks = Vec::with_capacity(declared);
    for raw_network in raw.networks {
        let name = raw_network.name.clone();
        match convert_network(raw_network) {
            Ok(network) => {
                info!(
                    "Loaded network {}: {} routes, {} cycles, {} endpoints",
                    network.name,
                    network.routes.len(),
                    network.cycles.len(),
                    network.endpoints.len()
                );
                networks.push(network);
            }
            Err(e) => warn!("Skipping network {}: {:#}", name, e),
        }
    }

    if networks.is_empty() {
        bail!("no usable network in configuration ({} declared)", declared);
    }
    Ok(networks)
}

/// Load and validate every network table from `path`.
pub fn load_networks(path: &Path) -> Result<Vec<NetworkConfig>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    let raw: RawConfigFile =
        toml::from_str(&contents).context("malformed network configuration")?;
    convert_all(raw)
}

/// The signing key, hex without 0x, from the environment. One wallet
/// signs on every network.
pub fn load_private_key() -> Result<String> {
    std::env::var("PRIVATE_KEY").context("PRIVATE_KEY is not set in the environment or .env")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        [[networks]]
        name = "ethereum"
        chain_id = 1
        endpoints = ["https://eth.example.invalid", "https://eth2.example.invalid"]
        min_profit_wei = "100000000000000"
        moat_wei = "50000000000000000"
        min_trade_wei = "10000000000000000"
        executor = "0x00000000000000000000000000000000000000ee"
        live_mode = true
        cooldown_iterations = 10

        [networks.venues]
        uniswap = "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"
        sushiswap = "0xd9e1cE17f2641f24aE83637ab66a2cca9C378B9F"

        [[networks.routes]]
        symbol = "WETH/USDC"
        token_in = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
        token_out = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
        buy_venue = "uniswap"
        sell_venue = "sushiswap"
        buy_pool = "0x0000000000000000000000000000000000000001"
        sell_pool = "0x0000000000000000000000000000000000000002"

        [[networks.cycles]]
        symbol = "WETH->USDC->WETH"
        hops = [
            { pool = "0x0000000000000000000000000000000000000010" },
            { pool = "0x0000000000000000000000000000000000000011", reversed = true },
        ]
    "#;

    fn fixture() -> RawConfigFile {
        toml::from_str(FIXTURE).unwrap()
    }

    #[test]
    fn test_parses_full_network() {
        let networks = convert_all(fixture()).unwrap();
        assert_eq!(networks.len(), 1);

        let network = &networks[0];
        assert_eq!(network.name, "ethereum");
        assert_eq!(network.chain_id, 1);
        assert_eq!(network.endpoints.len(), 2);
        assert_eq!(network.venues.len(), 2);
        assert_eq!(network.routes.len(), 1);
        assert_eq!(network.cycles.len(), 1);
        assert_eq!(network.min_profit_wei, U256::from(100_000_000_000_000u64));
        assert!(network.live_mode);
        assert_eq!(network.cooldown_iterations, 10);
        assert!(network.cycles[0].hops[1].reversed);
        assert!(!network.cycles[0].hops[0].reversed);
    }

    #[test]
    fn test_interval_defaults_apply() {
        let network = &convert_all(fixture()).unwrap()[0];
        assert_eq!(network.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(network.call_timeout_ms, DEFAULT_CALL_TIMEOUT_MS);
        assert_eq!(network.max_gas_price_gwei, DEFAULT_MAX_GAS_PRICE_GWEI);
    }

    #[test]
    fn test_default_multicall_when_omitted() {
        let network = &convert_all(fixture()).unwrap()[0];
        assert_eq!(network.multicall, *DEFAULT_MULTICALL);
    }

    #[test]
    fn test_undeclared_venue_rejected() {
        let mut raw = fixture();
        raw.networks[0].routes[0].buy_venue = "pancake".to_string();
        assert!(convert_network(raw.networks.remove(0)).is_err());
    }

    #[test]
    fn test_one_hop_cycle_rejected() {
        let mut raw = fixture();
        raw.networks[0].cycles[0].hops.truncate(1);
        assert!(convert_network(raw.networks.remove(0)).is_err());
    }

    #[test]
    fn test_live_mode_requires_executor() {
        let mut raw = fixture();
        raw.networks[0].executor = None;
        assert!(convert_network(raw.networks.remove(0)).is_err());
    }

    #[test]
    fn test_empty_endpoints_rejected() {
        let mut raw = fixture();
        raw.networks[0].endpoints.clear();
        assert!(convert_network(raw.networks.remove(0)).is_err());
    }

    #[test]
    fn test_bad_network_skipped_good_kept() {
        let doubled = format!("{}\n{}", FIXTURE, FIXTURE.replace("ethereum", "base"));
        let mut raw: RawConfigFile = toml::from_str(&doubled).unwrap();
        raw.networks[1].min_profit_wei = "not a number".to_string();

        let networks = convert_all(raw).unwrap();
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].name, "ethereum");
    }

    #[test]
    fn test_all_networks_bad_fails() {
        let mut raw = fixture();
        raw.networks[0].endpoints.clear();
        assert!(convert_all(raw).is_err());
    }
}
