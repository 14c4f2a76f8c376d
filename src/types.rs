//! Core data structures shared across the scanner
//!
//! Network/route configuration, pool readings, opportunities, and
//! execution outcomes.
//!
//! Author: AI-Generated
//! Created: 2026-01-27
//! Modified: 2026-02-03 (multi-network config, cycle routes)

use ethers::types::{Address, I256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier for a cross-venue route: (pair_symbol, buy_venue, sell_venue)
pub type RouteKey = (String, String, String);

/// One comparison set: the same token pair quoted on two venues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    pub symbol: String,
    pub token_in: Address,
    pub token_out: Address,
    /// Venue key into `NetworkConfig::venues` for the buy leg
    pub buy_venue: String,
    /// Venue key into `NetworkConfig::venues` for the sell leg
    pub sell_venue: String,
    /// Pair contract holding the buy-leg reserves
    pub buy_pool: Address,
    /// Pair contract holding the sell-leg reserves
    pub sell_pool: Address,
}

impl RouteConfig {
    pub fn key(&self) -> RouteKey {
        (
            self.symbol.clone(),
            self.buy_venue.clone(),
            self.sell_venue.clone(),
        )
    }
}

/// One hop of a closed cycle. `reversed` selects reserve orientation
/// when the hop's pair is traversed token1 -> token0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleHop {
    pub pool: Address,
    #[serde(default)]
    pub reversed: bool,
}

/// A closed sequence of hops starting and ending in the same token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    pub symbol: String,
    pub hops: Vec<CycleHop>,
}

/// Per-network scanner configuration. Immutable after load.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    /// Ordered RPC endpoints; index 0 is the preferred one
    pub endpoints: Vec<String>,
    /// Multicall aggregator deployment on this chain
    pub multicall: Address,
    /// Router address per venue key
    pub venues: BTreeMap<String, Address>,
    pub routes: Vec<RouteConfig>,
    pub cycles: Vec<CycleConfig>,
    /// Strict lower bound on net profit before a strike is attempted
    pub min_profit_wei: U256,
    /// Native balance floor never committed to a trade
    pub moat_wei: U256,
    /// Smallest trade size worth evaluating
    pub min_trade_wei: U256,
    pub poll_interval_ms: u64,
    pub call_timeout_ms: u64,
    pub max_gas_price_gwei: u64,
    /// On-chain strike executor contract; None forces dry-run
    pub executor: Option<Address>,
    pub live_mode: bool,
    /// Initial route cooldown in scan iterations (0 = disabled)
    pub cooldown_iterations: u64,
}

/// Latest reserves observed for one pair contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolReading {
    pub pool: Address,
    pub reserve0: U256,
    pub reserve1: U256,
    /// False when the per-target call failed or the payload was malformed
    pub ok: bool,
}

impl PoolReading {
    pub fn new(pool: Address, reserve0: U256, reserve1: U256) -> Self {
        Self {
            pool,
            reserve0,
            reserve1,
            ok: true,
        }
    }

    /// A failed entry: zero reserves, `ok = false`
    pub fn failed(pool: Address) -> Self {
        Self {
            pool,
            reserve0: U256::zero(),
            reserve1: U256::zero(),
            ok: false,
        }
    }

    /// Reserves as (reserve_in, reserve_out) for the traversal direction
    pub fn oriented(&self, reversed: bool) -> (U256, U256) {
        if reversed {
            (self.reserve1, self.reserve0)
        } else {
            (self.reserve0, self.reserve1)
        }
    }
}

/// Which legs an opportunity would trade through
#[derive(Debug, Clone)]
pub enum OpportunityLegs {
    /// Buy on one venue, sell the acquired amount back on another
    CrossVenue {
        buy_venue: String,
        sell_venue: String,
        buy_router: Address,
        sell_router: Address,
        token_in: Address,
        token_out: Address,
    },
    /// Closed cycle over `hops` pairs; observation only, never struck
    Cycle { hops: usize },
}

/// An above-threshold opportunity, valid for one iteration only
#[derive(Debug, Clone)]
pub struct TradeOpportunity {
    pub symbol: String,
    pub amount_in: U256,
    pub amount_out: U256,
    pub net_profit: I256,
    pub legs: OpportunityLegs,
}

impl TradeOpportunity {
    /// Cooldown key for cross-venue routes; cycles are never struck
    pub fn route_key(&self) -> Option<RouteKey> {
        match &self.legs {
            OpportunityLegs::CrossVenue {
                buy_venue,
                sell_venue,
                ..
            } => Some((
                self.symbol.clone(),
                buy_venue.clone(),
                sell_venue.clone(),
            )),
            OpportunityLegs::Cycle { .. } => None,
        }
    }

    pub fn is_executable(&self) -> bool {
        matches!(self.legs, OpportunityLegs::CrossVenue { .. })
    }
}

impl fmt::Display for TradeOpportunity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.legs {
            OpportunityLegs::CrossVenue {
                buy_venue,
                sell_venue,
                ..
            } => write!(
                f,
                "{} {}->{} in={} out={} net={}",
                self.symbol, buy_venue, sell_venue, self.amount_in, self.amount_out, self.net_profit
            ),
            OpportunityLegs::Cycle { hops } => write!(
                f,
                "{} cycle[{} hops] in={} out={} net={}",
                self.symbol, hops, self.amount_in, self.amount_out, self.net_profit
            ),
        }
    }
}

/// Why a strike failed, classified from the submission error string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeFailure {
    /// Output below the committed minimum (slippage / moved market)
    InsufficientOutput,
    /// Gas price above the configured ceiling
    GasPrice,
    /// Node or contract rejected the transaction
    Rejected,
    Unknown,
}

impl StrikeFailure {
    /// Map a raw error string onto the failure taxonomy
    pub fn classify(message: &str) -> Self {
        let msg = message.to_ascii_lowercase();
        if msg.contains("insufficient_output")
            || msg.contains("insufficient output")
            || msg.contains("slippage")
        {
            StrikeFailure::InsufficientOutput
        } else if msg.contains("gas") {
            StrikeFailure::GasPrice
        } else if msg.contains("revert") || msg.contains("reject") || msg.contains("denied") {
            StrikeFailure::Rejected
        } else {
            StrikeFailure::Unknown
        }
    }
}

impl fmt::Display for StrikeFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StrikeFailure::InsufficientOutput => write!(f, "insufficient output"),
            StrikeFailure::GasPrice => write!(f, "gas price ceiling"),
            StrikeFailure::Rejected => write!(f, "rejected"),
            StrikeFailure::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result of one strike submission. Never feeds endpoint rotation.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub tx_hash: Option<String>,
    pub reason: Option<StrikeFailure>,
}

impl ExecutionOutcome {
    pub fn succeeded(tx_hash: Option<String>) -> Self {
        Self {
            success: true,
            tx_hash,
            reason: None,
        }
    }

    pub fn failed(reason: StrikeFailure) -> Self {
        Self {
            success: false,
            tx_hash: None,
            reason: Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_insufficient_output() {
        let f = StrikeFailure::classify("execution reverted: INSUFFICIENT_OUTPUT_AMOUNT");
        assert_eq!(f, StrikeFailure::InsufficientOutput);
    }

    #[test]
    fn test_classify_gas_ceiling() {
        let f = StrikeFailure::classify("Gas price too high: 412 gwei > 100 gwei max");
        assert_eq!(f, StrikeFailure::GasPrice);
    }

    #[test]
    fn test_classify_revert() {
        let f = StrikeFailure::classify("execution reverted");
        assert_eq!(f, StrikeFailure::Rejected);
    }

    #[test]
    fn test_classify_unknown() {
        let f = StrikeFailure::classify("connection reset by peer");
        assert_eq!(f, StrikeFailure::Unknown);
    }

    #[test]
    fn test_oriented_reading() {
        let r = PoolReading::new(Address::zero(), U256::from(10), U256::from(20));
        assert_eq!(r.oriented(false), (U256::from(10), U256::from(20)));
        assert_eq!(r.oriented(true), (U256::from(20), U256::from(10)));
    }

    #[test]
    fn test_route_key_only_for_cross_venue() {
        let cross = TradeOpportunity {
            symbol: "WETH/USDC".to_string(),
            amount_in: U256::from(1),
            amount_out: U256::from(2),
            net_profit: I256::from(1),
            legs: OpportunityLegs::CrossVenue {
                buy_venue: "uniswap".to_string(),
                sell_venue: "sushiswap".to_string(),
                buy_router: Address::zero(),
                sell_router: Address::zero(),
                token_in: Address::zero(),
                token_out: Address::zero(),
            },
        };
        assert_eq!(
            cross.route_key(),
            Some((
                "WETH/USDC".to_string(),
                "uniswap".to_string(),
                "sushiswap".to_string()
            ))
        );
        assert!(cross.is_executable());

        let cycle = TradeOpportunity {
            symbol: "WETH->USDC->DAI".to_string(),
            amount_in: U256::from(1),
            amount_out: U256::from(2),
            net_profit: I256::from(1),
            legs: OpportunityLegs::Cycle { hops: 3 },
        };
        assert_eq!(cycle.route_key(), None);
        assert!(!cycle.is_executable());
    }
}
