//! Endpoint Rotator
//!
//! Holds the ordered RPC endpoint list for one network and the HTTP
//! client bound to the current endpoint. The scan loop advances the
//! rotation on qualifying failures only; every endpoint must serve the
//! chain id the network config declares.
//!
//! Author: AI-Generated
//! Created: 2026-02-03
//! Modified: 2026-02-04 (skip unparseable candidates, chain verification)

use crate::error::ScanError;
use anyhow::{Context, Result};
use ethers::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};

/// Ordered endpoint list with one live HTTP binding
pub struct EndpointRotator {
    endpoints: Vec<String>,
    chain_id: u64,
    index: usize,
    provider: Arc<Provider<Http>>,
}

impl EndpointRotator {
    /// Bind endpoint 0. An empty list or an unparseable first endpoint
    /// is a configuration error, fatal for this network.
    pub fn new(endpoints: Vec<String>, chain_id: u64) -> Result<Self> {
        let first = endpoints
            .first()
            .context("endpoint list is empty")?;
        let provider = Provider::<Http>::try_from(first.as_str())
            .with_context(|| format!("invalid endpoint URL: {}", first))?;

        Ok(Self {
            endpoints,
            chain_id,
            index: 0,
            provider: Arc::new(provider),
        })
    }

    /// The client bound to the current endpoint. Cheap to clone; the
    /// batch reader takes its own handle each iteration so rotation
    /// never swaps a client out from under an in-flight call.
    pub fn provider(&self) -> Arc<Provider<Http>> {
        Arc::clone(&self.provider)
    }

    pub fn current_url(&self) -> &str {
        &self.endpoints[self.index]
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Advance to the next endpoint (wrapping) and rebuild the client.
    ///
    /// An unparseable candidate is skipped and counts as one step. If a
    /// full cycle yields no usable URL the previous binding is kept and
    /// a non-qualifying error returned, so the caller does not rotate
    /// again on the same grounds.
    pub fn rotate(&mut self) -> Result<&str, ScanError> {
        let previous = self.index;

        for _ in 0..self.endpoints.len() {
            self.index = (self.index + 1) % self.endpoints.len();
            let url = &self.endpoints[self.index];

            match Provider::<Http>::try_from(url.as_str()) {
                Ok(provider) => {
                    self.provider = Arc::new(provider);
                    info!(
                        "Rotated endpoint [{} -> {}]: {}",
                        previous, self.index, url
                    );
                    return Ok(&self.endpoints[self.index]);
                }
                Err(e) => {
                    warn!("Skipping unparseable endpoint {}: {}", url, e);
                }
            }
        }

        self.index = previous;
        Err(ScanError::Request(
            "no parseable endpoint in rotation".to_string(),
        ))
    }

    /// Compare the endpoint's reported chain id against the declared
    /// one. A mismatch is a qualifying failure: the endpoint is serving
    /// the wrong chain and every read from it is garbage.
    pub async fn verify_chain(&self) -> Result<(), ScanError> {
        let reported = self
            .provider
            .get_chainid()
            .await
            .map_err(|e| ScanError::Transport(e.to_string()))?;

        let actual = reported.low_u64();
        if reported > ethers::types::U256::from(u64::MAX) || actual != self.chain_id {
            return Err(ScanError::ChainMismatch {
                expected: self.chain_id,
                actual,
            });
        }
        Ok(())
    }
}
