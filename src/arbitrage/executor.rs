//! Trade Executor
//!
//! Submits cross-venue opportunities to the on-chain StrikeExecutor
//! contract as a single atomic transaction. Defaults to dry-run;
//! live submission requires an explicit opt-in from configuration.
//! Cycle opportunities are observation-only and never submitted.
//!
//! Author: AI-Generated
//! Created: 2026-01-28
//! Modified: 2026-02-04 (single atomic strike, failure taxonomy)

use crate::contracts::IStrikeExecutor;
use crate::types::{ExecutionOutcome, OpportunityLegs, StrikeFailure, TradeOpportunity};
use anyhow::Result;
use async_trait::async_trait;
use ethers::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};

/// Submission seam between the scan loop and the chain. The scanner
/// only sees outcomes; transport and signing stay behind this trait.
#[async_trait]
pub trait StrikeSubmitter: Send + Sync {
    async fn submit(
        &self,
        provider: Arc<Provider<Http>>,
        opportunity: &TradeOpportunity,
        value: U256,
    ) -> Result<ExecutionOutcome>;
}

/// Signs and submits strikes for one network
pub struct TradeExecutor {
    wallet: LocalWallet,
    chain_id: u64,
    executor: Address,
    max_gas_price_gwei: u64,
    dry_run: bool,
}

impl TradeExecutor {
    /// Starts in dry-run; call `set_dry_run(false)` to go live.
    pub fn new(wallet: LocalWallet, chain_id: u64, executor: Address, max_gas_price_gwei: u64) -> Self {
        Self {
            wallet,
            chain_id,
            executor,
            max_gas_price_gwei,
            dry_run: true,
        }
    }

    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
        if dry_run {
            info!("Executor in DRY RUN mode: strikes are logged, not sent");
        } else {
            warn!("Executor in LIVE mode: strikes will be submitted on-chain");
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn gas_ceiling_wei(&self) -> U256 {
        U256::from(self.max_gas_price_gwei) * U256::exp10(9)
    }
}

#[async_trait]
impl StrikeSubmitter for TradeExecutor {
    async fn submit(
        &self,
        provider: Arc<Provider<Http>>,
        opportunity: &TradeOpportunity,
        value: U256,
    ) -> Result<ExecutionOutcome> {
        let legs = match &opportunity.legs {
            OpportunityLegs::CrossVenue {
                buy_router,
                sell_router,
                token_in,
                token_out,
                ..
            } => (*buy_router, *sell_router, *token_in, *token_out),
            OpportunityLegs::Cycle { hops } => {
                warn!(
                    "Refusing to submit cycle opportunity {} ({} hops): observation-only",
                    opportunity.symbol, hops
                );
                return Ok(ExecutionOutcome::failed(StrikeFailure::Rejected));
            }
        };

        if self.dry_run {
            info!(
                "DRY RUN strike: {} amount_in={} expected_net={}",
                opportunity.symbol, opportunity.amount_in, opportunity.net_profit
            );
            return Ok(ExecutionOutcome::succeeded(Some(
                "DRY_RUN_NO_TX".to_string(),
            )));
        }

        let gas_price = provider
            .get_gas_price()
            .await
            .map_err(|e| anyhow::anyhow!("gas price query failed: {}", e))?;
        if gas_price > self.gas_ceiling_wei() {
            warn!(
                "Strike skipped: gas price {} wei above ceiling {} gwei",
                gas_price, self.max_gas_price_gwei
            );
            return Ok(ExecutionOutcome::failed(StrikeFailure::GasPrice));
        }

        let signer = self.wallet.clone().with_chain_id(self.chain_id);
        let client = Arc::new(SignerMiddleware::new(provider, signer));
        let contract = IStrikeExecutor::new(self.executor, client);

        let (buy_router, sell_router, token_in, token_out) = legs;
        let call = contract
            .strike(
                buy_router,
                sell_router,
                token_in,
                token_out,
                opportunity.amount_in,
                opportunity.net_profit.unsigned_abs(),
            )
            .value(value);

        let pending = match call.send().await {
            Ok(pending) => pending,
            Err(e) => {
                let reason = StrikeFailure::classify(&e.to_string());
                warn!("Strike submission failed ({}): {}", reason, e);
                return Ok(ExecutionOutcome::failed(reason));
            }
        };

        let receipt = match pending.await {
            Ok(Some(receipt)) => receipt,
            Ok(None) => {
                warn!("Strike dropped from mempool: {}", opportunity.symbol);
                return Ok(ExecutionOutcome::failed(StrikeFailure::Unknown));
            }
            Err(e) => {
                let reason = StrikeFailure::classify(&e.to_string());
                warn!("Strike confirmation failed ({}): {}", reason, e);
                return Ok(ExecutionOutcome::failed(reason));
            }
        };

        if receipt.status != Some(1.into()) {
            warn!(
                "Strike reverted on-chain: {} tx={:?}",
                opportunity.symbol, receipt.transaction_hash
            );
            return Ok(ExecutionOutcome::failed(StrikeFailure::Rejected));
        }

        let tx_hash = format!("{:?}", receipt.transaction_hash);
        info!(
            "Strike confirmed: {} tx={} block={:?}",
            opportunity.symbol, tx_hash, receipt.block_number
        );
        Ok(ExecutionOutcome::succeeded(Some(tx_hash)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::I256;
    use std::str::FromStr;

    const TEST_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn executor() -> TradeExecutor {
        let wallet = LocalWallet::from_str(TEST_KEY).unwrap();
        TradeExecutor::new(wallet, 1, Address::from_low_u64_be(0xE), 100)
    }

    fn provider() -> Arc<Provider<Http>> {
        Arc::new(Provider::<Http>::try_from("http://localhost:8545").unwrap())
    }

    fn cross_venue_opportunity() -> TradeOpportunity {
        TradeOpportunity {
            symbol: "WETH/USDC".to_string(),
            amount_in: U256::from(10_000),
            amount_out: U256::from(87_469),
            net_profit: I256::from(77_469),
            legs: OpportunityLegs::CrossVenue {
                buy_venue: "uniswap".to_string(),
                sell_venue: "sushiswap".to_string(),
                buy_router: Address::from_low_u64_be(0x11),
                sell_router: Address::from_low_u64_be(0x22),
                token_in: Address::from_low_u64_be(0xA),
                token_out: Address::from_low_u64_be(0xB),
            },
        }
    }

    #[test]
    fn test_defaults_to_dry_run() {
        assert!(executor().is_dry_run());
    }

    #[tokio::test]
    async fn test_dry_run_reports_success_without_sending() {
        let executor = executor();
        let outcome = executor
            .submit(provider(), &cross_venue_opportunity(), U256::from(10_000))
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.tx_hash.as_deref(), Some("DRY_RUN_NO_TX"));
        assert!(outcome.reason.is_none());
    }

    #[tokio::test]
    async fn test_cycle_opportunity_is_refused() {
        let executor = executor();
        let opp = TradeOpportunity {
            symbol: "WETH->USDC->WETH".to_string(),
            amount_in: U256::from(10_000),
            amount_out: U256::from(10_100),
            net_profit: I256::from(100),
            legs: OpportunityLegs::Cycle { hops: 2 },
        };

        let outcome = executor
            .submit(provider(), &opp, U256::from(10_000))
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.reason, Some(StrikeFailure::Rejected));
    }

    #[test]
    fn test_gas_ceiling_in_wei() {
        let executor = executor();
        assert_eq!(
            executor.gas_ceiling_wei(),
            U256::from(100u64) * U256::exp10(9)
        );
    }
}
