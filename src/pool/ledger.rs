//! Reading Ledger
//!
//! Thread-safe store of the latest successful reserve reading per pair
//! contract, tagged with the block it was aggregated at. Feeds the
//! periodic status line and staleness accounting.
//!
//! Author: AI-Generated
//! Created: 2026-01-27
//! Modified: 2026-02-03 (per-network ledger keyed by pool address)

use crate::types::PoolReading;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// One recorded observation
#[derive(Debug, Clone, Copy)]
pub struct LedgerEntry {
    pub reading: PoolReading,
    /// Block number the aggregate call reported
    pub block: u64,
}

/// Latest-reading ledger, one per network scan loop.
///
/// Uses DashMap keyed by pool address. Only successful readings are
/// recorded; a failed per-target entry leaves the previous observation
/// in place.
#[derive(Debug)]
pub struct ReadingLedger {
    entries: Arc<DashMap<ethers::types::Address, LedgerEntry>>,
}

impl ReadingLedger {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Record one successful reading. Failed readings are ignored.
    pub fn record(&self, reading: PoolReading, block: u64) {
        if !reading.ok {
            return;
        }
        debug!(
            "Ledger update: {:?} reserves=({}, {}) block={}",
            reading.pool, reading.reserve0, reading.reserve1, block
        );
        self.entries.insert(reading.pool, LedgerEntry { reading, block });
    }

    /// Record every successful reading of a batch at the given block.
    pub fn record_batch(&self, readings: &[PoolReading], block: u64) {
        for reading in readings {
            self.record(*reading, block);
        }
    }

    pub fn get(&self, pool: ethers::types::Address) -> Option<LedgerEntry> {
        self.entries.get(&pool).map(|entry| *entry.value())
    }

    /// True when any tracked pool lags the current block by more than
    /// `max_lag` blocks.
    pub fn is_stale(&self, current_block: u64, max_lag: u64) -> bool {
        self.entries
            .iter()
            .any(|entry| current_block.saturating_sub(entry.value().block) > max_lag)
    }

    /// Statistics for the status line: (pool_count, oldest_block, newest_block)
    pub fn stats(&self) -> (usize, u64, u64) {
        let count = self.entries.len();
        let min_block = self
            .entries
            .iter()
            .map(|entry| entry.value().block)
            .min()
            .unwrap_or(0);
        let max_block = self
            .entries
            .iter()
            .map(|entry| entry.value().block)
            .max()
            .unwrap_or(0);

        (count, min_block, max_block)
    }
}

impl Default for ReadingLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ReadingLedger {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}
