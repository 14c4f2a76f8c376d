//! Pool Module
//!
//! Constant-product swap math and the per-network reading ledger.
//!
//! Author: AI-Generated
//! Created: 2026-01-27
//! Modified: 2026-02-03 (ledger replaces state manager)

pub mod ledger;
pub mod math;

pub use ledger::{LedgerEntry, ReadingLedger};
