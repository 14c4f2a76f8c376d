//! Route-Level Cooldown
//!
//! Suppresses routes that failed a strike, with escalating backoff so
//! structurally dead spreads stop consuming attempts while transient
//! failures recover after the initial window. Keyed by scan iteration,
//! not block number.
//!
//! Author: AI-Generated
//! Created: 2026-01-31
//! Modified: 2026-02-04 (iteration keying, blacklist tier removed)

use crate::types::RouteKey;
use std::collections::HashMap;
use tracing::{debug, info};

/// Tracks cooldown state for a single route
struct CooldownEntry {
    last_failed_iteration: u64,
    cooldown_iterations: u64,
    failure_count: u32,
}

/// Escalation multiplier per consecutive failure
const ESCALATION_FACTOR: u64 = 5;

/// Cooldown cap in iterations
const DEFAULT_MAX_COOLDOWN: u64 = 1800;

/// Route-level cooldown tracker with escalating backoff.
///
/// A route's window grows initial, x5, x5, ... up to the cap; one
/// success removes the entry entirely so the next failure starts over
/// at the initial window.
pub struct RouteCooldown {
    entries: HashMap<RouteKey, CooldownEntry>,
    initial_cooldown: u64,
    max_cooldown: u64,
}

impl RouteCooldown {
    /// `initial_cooldown` is the suppression window after the first
    /// failure, in iterations. 0 disables cooldown entirely.
    pub fn new(initial_cooldown: u64) -> Self {
        Self {
            entries: HashMap::new(),
            initial_cooldown,
            max_cooldown: DEFAULT_MAX_COOLDOWN,
        }
    }

    /// True when the route may be struck at `iteration`.
    pub fn is_cooled_down(&self, key: &RouteKey, iteration: u64) -> bool {
        if self.initial_cooldown == 0 {
            return true;
        }
        match self.entries.get(key) {
            Some(entry) => {
                iteration >= entry.last_failed_iteration + entry.cooldown_iterations
            }
            None => true,
        }
    }

    /// Record a failed strike. Consecutive failures escalate the
    /// window: initial, x5, x5, ... capped at `max_cooldown`.
    pub fn record_failure(&mut self, key: &RouteKey, iteration: u64) {
        if self.initial_cooldown == 0 {
            return;
        }

        let entry = self.entries.entry(key.clone()).or_insert(CooldownEntry {
            last_failed_iteration: iteration,
            cooldown_iterations: 0,
            failure_count: 0,
        });

        entry.failure_count += 1;
        entry.last_failed_iteration = iteration;
        entry.cooldown_iterations = self
            .initial_cooldown
            .saturating_mul(ESCALATION_FACTOR.saturating_pow(entry.failure_count - 1))
            .min(self.max_cooldown);

        info!(
            "Cooldown: {:?} failure #{} suppressed for {} iterations",
            key, entry.failure_count, entry.cooldown_iterations
        );
    }

    /// Record a successful strike: the entry is removed so the route
    /// returns to a clean slate.
    pub fn record_success(&mut self, key: &RouteKey) {
        if self.entries.remove(key).is_some() {
            info!("Cooldown: {:?} succeeded, backoff reset", key);
        }
    }

    /// Drop entries whose window has expired, bounding memory over a
    /// long-running session.
    pub fn cleanup(&mut self, iteration: u64) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            iteration < entry.last_failed_iteration + entry.cooldown_iterations
        });
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!("Cooldown cleanup: removed {} expired entries", removed);
        }
    }

    /// Number of routes currently tracked (for the status line).
    pub fn active_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(symbol: &str) -> RouteKey {
        (
            symbol.to_string(),
            "uniswap".to_string(),
            "sushiswap".to_string(),
        )
    }

    #[test]
    fn test_fresh_route_is_cooled_down() {
        let cooldown = RouteCooldown::new(10);
        assert!(cooldown.is_cooled_down(&key("WETH/USDC"), 100));
    }

    #[test]
    fn test_failure_suppresses_until_window_ends() {
        let mut cooldown = RouteCooldown::new(10);
        cooldown.record_failure(&key("WETH/USDC"), 100);

        assert!(!cooldown.is_cooled_down(&key("WETH/USDC"), 100));
        assert!(!cooldown.is_cooled_down(&key("WETH/USDC"), 109));
        assert!(cooldown.is_cooled_down(&key("WETH/USDC"), 110));
    }

    #[test]
    fn test_escalation_caps_at_max() {
        let mut cooldown = RouteCooldown::new(10);
        let k = key("WETH/USDC");

        // 10 -> 50 -> 250 -> 1250 -> 1800 (cap)
        cooldown.record_failure(&k, 0);
        assert_eq!(cooldown.entries[&k].cooldown_iterations, 10);
        cooldown.record_failure(&k, 10);
        assert_eq!(cooldown.entries[&k].cooldown_iterations, 50);
        cooldown.record_failure(&k, 60);
        assert_eq!(cooldown.entries[&k].cooldown_iterations, 250);
        cooldown.record_failure(&k, 310);
        assert_eq!(cooldown.entries[&k].cooldown_iterations, 1250);
        cooldown.record_failure(&k, 1560);
        assert_eq!(cooldown.entries[&k].cooldown_iterations, 1800);
        cooldown.record_failure(&k, 3360);
        assert_eq!(cooldown.entries[&k].cooldown_iterations, 1800);
    }

    #[test]
    fn test_success_resets_backoff() {
        let mut cooldown = RouteCooldown::new(10);
        let k = key("WETH/USDC");

        cooldown.record_failure(&k, 0);
        cooldown.record_failure(&k, 10);
        cooldown.record_success(&k);
        assert!(cooldown.is_cooled_down(&k, 11));

        // Next failure starts over at the initial window
        cooldown.record_failure(&k, 20);
        assert_eq!(cooldown.entries[&k].cooldown_iterations, 10);
    }

    #[test]
    fn test_routes_are_independent() {
        let mut cooldown = RouteCooldown::new(10);
        cooldown.record_failure(&key("WETH/USDC"), 100);

        assert!(!cooldown.is_cooled_down(&key("WETH/USDC"), 105));
        assert!(cooldown.is_cooled_down(&key("WETH/DAI"), 105));
    }

    #[test]
    fn test_zero_initial_disables() {
        let mut cooldown = RouteCooldown::new(0);
        cooldown.record_failure(&key("WETH/USDC"), 100);
        assert!(cooldown.is_cooled_down(&key("WETH/USDC"), 100));
        assert_eq!(cooldown.active_count(), 0);
    }

    #[test]
    fn test_cleanup_drops_expired_entries() {
        let mut cooldown = RouteCooldown::new(10);
        cooldown.record_failure(&key("WETH/USDC"), 100);
        cooldown.record_failure(&key("WETH/DAI"), 200);
        assert_eq!(cooldown.active_count(), 2);

        // First entry expired at 110; second is live until 210
        cooldown.cleanup(150);
        assert_eq!(cooldown.active_count(), 1);
        cooldown.cleanup(300);
        assert_eq!(cooldown.active_count(), 0);
    }
}
