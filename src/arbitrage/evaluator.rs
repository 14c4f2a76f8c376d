//! Opportunity Evaluator
//!
//! Simulates candidate trades against the reserve readings of the
//! current iteration: cross-venue two-leg routes and closed cycles.
//! Emits an opportunity only when the simulated net profit clears the
//! network's threshold strictly.
//!
//! Author: AI-Generated
//! Created: 2026-01-28
//! Modified: 2026-02-04 (cycle evaluation, signed net profit)

use crate::pool::math::{amount_out, cycle_out, signed_delta};
use crate::types::{
    CycleConfig, OpportunityLegs, PoolReading, RouteConfig, TradeOpportunity,
};
use ethers::types::{Address, Sign, I256, U256};
use tracing::debug;

/// Profit-threshold gate over the pure swap math
pub struct OpportunityEvaluator {
    min_profit_wei: U256,
}

impl OpportunityEvaluator {
    pub fn new(min_profit_wei: U256) -> Self {
        Self { min_profit_wei }
    }

    fn threshold(&self) -> I256 {
        I256::checked_from_sign_and_abs(Sign::Positive, self.min_profit_wei).unwrap_or(I256::MAX)
    }

    /// Simulate one cross-venue route: buy `token_in -> token_out`
    /// through the buy pool, then sell the acquired amount back through
    /// the sell pool's mirrored reserves. Failed readings and a zero
    /// trial size yield `None`, never an error.
    pub fn evaluate_route(
        &self,
        route: &RouteConfig,
        buy_router: Address,
        sell_router: Address,
        buy: &PoolReading,
        sell: &PoolReading,
        amount_in: U256,
    ) -> Option<TradeOpportunity> {
        if !buy.ok || !sell.ok || amount_in.is_zero() {
            return None;
        }

        let acquired = amount_out(amount_in, buy.reserve0, buy.reserve1);
        // Return leg runs against the sell pool in the opposite
        // direction, so its reserves mirror
        let returned = amount_out(acquired, sell.reserve1, sell.reserve0);

        let net_profit = signed_delta(returned, amount_in);
        if net_profit <= self.threshold() {
            debug!(
                "Route {} below threshold: net={} min={}",
                route.symbol, net_profit, self.min_profit_wei
            );
            return None;
        }

        Some(TradeOpportunity {
            symbol: route.symbol.clone(),
            amount_in,
            amount_out: returned,
            net_profit,
            legs: OpportunityLegs::CrossVenue {
                buy_venue: route.buy_venue.clone(),
                sell_venue: route.sell_venue.clone(),
                buy_router,
                sell_router,
                token_in: route.token_in,
                token_out: route.token_out,
            },
        })
    }

    /// Simulate one closed cycle over its hops in order. Requires at
    /// least two hops, one `ok` reading per hop, and a non-zero trial
    /// size; anything less yields `None`.
    pub fn evaluate_cycle(
        &self,
        cycle: &CycleConfig,
        readings: &[PoolReading],
        amount_in: U256,
    ) -> Option<TradeOpportunity> {
        if cycle.hops.len() < 2
            || readings.len() != cycle.hops.len()
            || amount_in.is_zero()
            || readings.iter().any(|r| !r.ok)
        {
            return None;
        }

        let hops: Vec<(U256, U256)> = cycle
            .hops
            .iter()
            .zip(readings.iter())
            .map(|(hop, reading)| reading.oriented(hop.reversed))
            .collect();

        let out = cycle_out(amount_in, &hops);
        let net_profit = signed_delta(out, amount_in);
        if net_profit <= self.threshold() {
            debug!(
                "Cycle {} below threshold: net={} min={}",
                cycle.symbol, net_profit, self.min_profit_wei
            );
            return None;
        }

        Some(TradeOpportunity {
            symbol: cycle.symbol.clone(),
            amount_in,
            amount_out: out,
            net_profit,
            legs: OpportunityLegs::Cycle {
                hops: cycle.hops.len(),
            },
        })
    }
}
