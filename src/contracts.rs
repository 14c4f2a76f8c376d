//! Centralized Contract Definitions
//!
//! On-chain interfaces used by the strike path, generated with
//! `abigen!`. Reserve reads bypass abigen entirely and go through the
//! raw-selector batch reader in `rpc::multicall`.
//!
//! Author: AI-Generated
//! Created: 2026-02-01
//! Modified: 2026-02-04

use ethers::prelude::abigen;

// ── StrikeExecutor (custom atomic arb contract) ──────────────────────

abigen!(
    IStrikeExecutor,
    r#"[
        function strike(address routerBuy, address routerSell, address tokenIn, address tokenOut, uint256 amountIn, uint256 minProfit) external payable returns (uint256 profit)
    ]"#
);
