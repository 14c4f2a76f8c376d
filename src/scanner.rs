//! Network Scanner
//!
//! One scan loop per network: read every tracked pair's reserves in a
//! single aggregate call, evaluate routes and cycles against the
//! wallet's committable balance, and strike the best executable
//! opportunity that is off cooldown. Qualifying transport failures
//! advance the endpoint rotation; strike outcomes never do.
//!
//! Author: AI-Generated
//! Created: 2026-02-01
//! Modified: 2026-02-04 (cycle evaluation, iteration-keyed status line)

use crate::arbitrage::{OpportunityEvaluator, RouteCooldown, StrikeSubmitter};
use crate::error::ScanError;
use crate::pool::ReadingLedger;
use crate::rpc::{EndpointRotator, MulticallReader};
use crate::types::{CycleConfig, NetworkConfig, PoolReading, RouteConfig, TradeOpportunity};
use anyhow::Result;
use ethers::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info, warn};

/// Iterations between status lines
const STATUS_INTERVAL: u64 = 100;

/// Scan loop state for one network
pub struct NetworkScanner {
    config: NetworkConfig,
    rotator: EndpointRotator,
    evaluator: OpportunityEvaluator,
    cooldown: RouteCooldown,
    ledger: ReadingLedger,
    submitter: Arc<dyn StrikeSubmitter>,
    shutdown: watch::Receiver<bool>,
    wallet_address: Address,
    /// Read order: two pools per route, then each cycle's hops
    pools: Vec<Address>,
}

/// Pair contracts in batch order: `routes[i]` owns slots `2i` (buy)
/// and `2i + 1` (sell); cycle hops follow in declaration order.
fn flatten_pools(routes: &[RouteConfig], cycles: &[CycleConfig]) -> Vec<Address> {
    let mut pools = Vec::with_capacity(
        routes.len() * 2 + cycles.iter().map(|c| c.hops.len()).sum::<usize>(),
    );
    for route in routes {
        pools.push(route.buy_pool);
        pools.push(route.sell_pool);
    }
    for cycle in cycles {
        pools.extend(cycle.hops.iter().map(|hop| hop.pool));
    }
    pools
}

/// Balance committable to one trade: everything above the moat.
fn trade_size(balance: U256, moat: U256) -> U256 {
    balance.saturating_sub(moat)
}

impl NetworkScanner {
    pub fn new(
        config: NetworkConfig,
        submitter: Arc<dyn StrikeSubmitter>,
        shutdown: watch::Receiver<bool>,
        wallet_address: Address,
    ) -> Result<Self> {
        let rotator = EndpointRotator::new(config.endpoints.clone(), config.chain_id)?;
        let evaluator = OpportunityEvaluator::new(config.min_profit_wei);
        let cooldown = RouteCooldown::new(config.cooldown_iterations);
        let pools = flatten_pools(&config.routes, &config.cycles);

        Ok(Self {
            config,
            rotator,
            evaluator,
            cooldown,
            ledger: ReadingLedger::new(),
            submitter,
            shutdown,
            wallet_address,
            pools,
        })
    }

    fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.config.call_timeout_ms)
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.poll_interval_ms)
    }

    /// Run until shutdown. Never returns on scan failure; qualifying
    /// failures rotate the endpoint and the loop carries on.
    pub async fn run(mut self) {
        info!(
            "Scanner starting: network={} chain_id={} pools={} routes={} cycles={} endpoint={}",
            self.config.name,
            self.config.chain_id,
            self.pools.len(),
            self.config.routes.len(),
            self.config.cycles.len(),
            self.rotator.current_url()
        );

        if !self.verify_endpoint().await {
            return;
        }

        let mut iteration: u64 = 0;
        loop {
            iteration += 1;

            if let Err(e) = self.scan_iteration(iteration).await {
                if e.is_qualifying() {
                    warn!(
                        "[{}] iteration {} failed ({}), rotating endpoint",
                        self.config.name, iteration, e
                    );
                    if let Err(rotate_err) = self.rotator.rotate() {
                        warn!("[{}] rotation failed: {}", self.config.name, rotate_err);
                    }
                } else {
                    warn!(
                        "[{}] iteration {} failed ({}), keeping endpoint",
                        self.config.name, iteration, e
                    );
                }
            }

            if iteration % STATUS_INTERVAL == 0 {
                let (count, oldest, newest) = self.ledger.stats();
                info!(
                    "[{}] iteration {}: pools={} blocks=[{}..{}] cooldowns={} endpoint={}",
                    self.config.name,
                    iteration,
                    count,
                    oldest,
                    newest,
                    self.cooldown.active_count(),
                    self.rotator.current_url()
                );
            }
            self.cooldown.cleanup(iteration);

            tokio::select! {
                _ = time::sleep(self.poll_interval()) => {}
                _ = self.shutdown.changed() => {
                    info!("[{}] shutdown signal received", self.config.name);
                    return;
                }
            }
        }
    }

    /// Confirm the bound endpoint serves the declared chain before any
    /// reserve read. Rotates through the list until one matches or
    /// shutdown arrives.
    async fn verify_endpoint(&mut self) -> bool {
        loop {
            match self.rotator.verify_chain().await {
                Ok(()) => {
                    info!(
                        "[{}] chain id verified on {}",
                        self.config.name,
                        self.rotator.current_url()
                    );
                    return true;
                }
                Err(e) => {
                    warn!(
                        "[{}] chain verification failed on {}: {}",
                        self.config.name,
                        self.rotator.current_url(),
                        e
                    );
                    if e.is_qualifying() {
                        if let Err(rotate_err) = self.rotator.rotate() {
                            warn!("[{}] rotation failed: {}", self.config.name, rotate_err);
                        }
                    }
                }
            }

            tokio::select! {
                _ = time::sleep(self.poll_interval()) => {}
                _ = self.shutdown.changed() => {
                    info!("[{}] shutdown during chain verification", self.config.name);
                    return false;
                }
            }
        }
    }

    /// One fetch-evaluate-decide pass. Only transport-shaped errors
    /// propagate; strike outcomes are folded into cooldown state here.
    async fn scan_iteration(&mut self, iteration: u64) -> Result<(), ScanError> {
        let provider = self.rotator.provider();
        let reader = MulticallReader::new(
            Arc::clone(&provider),
            self.config.multicall,
            self.call_timeout(),
        );

        let balance_fut = async {
            time::timeout(
                self.call_timeout(),
                provider.get_balance(self.wallet_address, None),
            )
            .await
            .map_err(|_| ScanError::Timeout(self.call_timeout()))?
            .map_err(|e| ScanError::Transport(e.to_string()))
        };

        let (balance, batch) = tokio::try_join!(balance_fut, reader.read_reserves(&self.pools))?;
        self.ledger.record_batch(&batch.readings, batch.block_number);

        let amount_in = trade_size(balance, self.config.moat_wei);
        if amount_in < self.config.min_trade_wei {
            debug!(
                "[{}] committable balance {} below minimum trade size {}",
                self.config.name, amount_in, self.config.min_trade_wei
            );
            return Ok(());
        }

        let opportunities = self.evaluate_all(&batch.readings, amount_in);
        self.decide(iteration, opportunities, provider).await;
        Ok(())
    }

    /// Evaluate every route and cycle against this batch's readings,
    /// best first.
    fn evaluate_all(
        &self,
        readings: &[PoolReading],
        amount_in: U256,
    ) -> Vec<TradeOpportunity> {
        let mut opportunities = Vec::new();

        for (i, route) in self.config.routes.iter().enumerate() {
            let (buy_router, sell_router) = match (
                self.config.venues.get(&route.buy_venue),
                self.config.venues.get(&route.sell_venue),
            ) {
                (Some(buy), Some(sell)) => (*buy, *sell),
                _ => {
                    debug!(
                        "[{}] route {} references unknown venue, skipped",
                        self.config.name, route.symbol
                    );
                    continue;
                }
            };

            if let Some(opp) = self.evaluator.evaluate_route(
                route,
                buy_router,
                sell_router,
                &readings[2 * i],
                &readings[2 * i + 1],
                amount_in,
            ) {
                opportunities.push(opp);
            }
        }

        let mut offset = self.config.routes.len() * 2;
        for cycle in &self.config.cycles {
            let slice = &readings[offset..offset + cycle.hops.len()];
            if let Some(opp) = self.evaluator.evaluate_cycle(cycle, slice, amount_in) {
                opportunities.push(opp);
            }
            offset += cycle.hops.len();
        }

        rank(&mut opportunities);
        opportunities
    }

    /// Log every opportunity, then strike the best executable one that
    /// is off cooldown. Cycles are observation-only.
    async fn decide(
        &mut self,
        iteration: u64,
        opportunities: Vec<TradeOpportunity>,
        provider: Arc<Provider<Http>>,
    ) {
        let mut struck = false;

        for opp in opportunities {
            if !opp.is_executable() {
                info!("[{}] cycle opportunity: {}", self.config.name, opp);
                continue;
            }
            if struck {
                debug!("[{}] passed over (one strike per iteration): {}", self.config.name, opp);
                continue;
            }

            let key = match opp.route_key() {
                Some(key) => key,
                None => continue,
            };
            if !self.cooldown.is_cooled_down(&key, iteration) {
                debug!("[{}] suppressed by cooldown: {}", self.config.name, opp);
                continue;
            }

            info!("[{}] striking: {}", self.config.name, opp);
            match self
                .submitter
                .submit(Arc::clone(&provider), &opp, opp.amount_in)
                .await
            {
                Ok(outcome) if outcome.success => {
                    info!(
                        "[{}] strike succeeded: {} tx={:?}",
                        self.config.name, opp.symbol, outcome.tx_hash
                    );
                    self.cooldown.record_success(&key);
                }
                Ok(outcome) => {
                    warn!(
                        "[{}] strike failed: {} reason={:?}",
                        self.config.name, opp.symbol, outcome.reason
                    );
                    self.cooldown.record_failure(&key, iteration);
                }
                Err(e) => {
                    warn!(
                        "[{}] strike errored: {} error={}",
                        self.config.name, opp.symbol, e
                    );
                    self.cooldown.record_failure(&key, iteration);
                }
            }
            struck = true;
        }
    }
}

/// Sort best-first by signed net profit.
fn rank(opportunities: &mut [TradeOpportunity]) {
    opportunities.sort_by(|a, b| b.net_profit.cmp(&a.net_profit));
}
