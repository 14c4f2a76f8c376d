//! Multicall Batch Reader
//!
//! Bundles N `getReserves()` queries into a single aggregator eth_call
//! (`tryBlockAndAggregate` with `requireSuccess = false`), so one round
//! trip yields every pool's reserves plus the block they were read at.
//! Per-target failures fold into `ok = false` readings and never poison
//! their neighbors.
//!
//! Technical note: the aggregator is driven through raw selectors and
//! `ethers::abi` encoding rather than abigen, since the envelope is
//! tiny and the per-target payloads need manual folding anyway.
//!
//! Author: AI-Generated
//! Created: 2026-01-29
//! Modified: 2026-02-04 (reserve batching, per-call timeout)

use crate::error::ScanError;
use crate::types::PoolReading;
use ethers::abi::{self, ParamType, Token};
use ethers::prelude::*;
use ethers::types::{Address, Bytes, U256};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Multicall tryBlockAndAggregate selector:
/// keccak256("tryBlockAndAggregate(bool,(address,bytes)[])")[..4]
const TRY_BLOCK_AND_AGGREGATE_SELECTOR: [u8; 4] = [0x39, 0x95, 0x42, 0xe9];

/// Pair getReserves selector: keccak256("getReserves()")[..4]
const GET_RESERVES_SELECTOR: [u8; 4] = [0x09, 0x02, 0xf1, 0xac];

/// A well-formed getReserves payload: 3 words (reserve0, reserve1, timestamp)
const RESERVES_PAYLOAD_LEN: usize = 96;

/// One decoded aggregate call: the block it executed at plus one
/// order-preserving reading per requested pool.
#[derive(Debug, Clone)]
pub struct ReserveBatch {
    pub block_number: u64,
    pub readings: Vec<PoolReading>,
}

/// Batched reserve reader against a Multicall aggregator deployment
pub struct MulticallReader<M> {
    provider: Arc<M>,
    aggregator: Address,
    call_timeout: Duration,
}

impl<M: Middleware + 'static> MulticallReader<M> {
    pub fn new(provider: Arc<M>, aggregator: Address, call_timeout: Duration) -> Self {
        Self {
            provider,
            aggregator,
            call_timeout,
        }
    }

    /// Read current reserves for every pool in one aggregate call.
    ///
    /// The result vector matches `pools` in length and order. A pool
    /// whose sub-call failed or returned a truncated payload yields a
    /// reading with `ok = false`; the batch itself only errors when the
    /// whole aggregate call fails.
    pub async fn read_reserves(&self, pools: &[Address]) -> Result<ReserveBatch, ScanError> {
        let calls: Vec<(Address, Vec<u8>)> = pools
            .iter()
            .map(|pool| (*pool, GET_RESERVES_SELECTOR.to_vec()))
            .collect();

        let (block_number, results) = self.try_aggregate(&calls).await?;

        if results.len() != pools.len() {
            return Err(ScanError::BadResponse(format!(
                "aggregate returned {} results for {} targets",
                results.len(),
                pools.len()
            )));
        }

        let readings: Vec<PoolReading> = pools
            .iter()
            .zip(results.iter())
            .map(|(pool, (success, data))| Self::decode_reserves(*pool, *success, data))
            .collect();

        let failed = readings.iter().filter(|r| !r.ok).count();
        if failed > 0 {
            debug!(
                "Reserve batch at block {}: {}/{} targets failed",
                block_number,
                failed,
                readings.len()
            );
        }

        Ok(ReserveBatch {
            block_number,
            readings,
        })
    }

    /// Issue one `tryBlockAndAggregate(false, calls)` eth_call, raced
    /// against the per-call timeout. A timed-out call is abandoned and
    /// its partial results untrusted.
    pub async fn try_aggregate(
        &self,
        calls: &[(Address, Vec<u8>)],
    ) -> Result<(u64, Vec<(bool, Vec<u8>)>), ScanError> {
        if calls.is_empty() {
            return Err(ScanError::Request("empty call set".to_string()));
        }

        let calldata = Self::build_calldata(calls);
        let tx = TransactionRequest::new().to(self.aggregator).data(calldata);

        let response = match timeout(self.call_timeout, self.provider.call(&tx.into(), None)).await
        {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => return Err(ScanError::Transport(e.to_string())),
            Err(_) => return Err(ScanError::Timeout(self.call_timeout)),
        };

        Self::decode_response(&response)
    }

    /// Build `tryBlockAndAggregate` calldata. Each call is wrapped as
    /// (target, callData); `requireSuccess = false` keeps one reverting
    /// target from failing the whole batch.
    fn build_calldata(calls: &[(Address, Vec<u8>)]) -> Bytes {
        let call_tokens: Vec<Token> = calls
            .iter()
            .map(|(target, data)| {
                Token::Tuple(vec![Token::Address(*target), Token::Bytes(data.clone())])
            })
            .collect();

        let mut data = Vec::new();
        data.extend_from_slice(&TRY_BLOCK_AND_AGGREGATE_SELECTOR);
        let encoded = abi::encode(&[Token::Bool(false), Token::Array(call_tokens)]);
        data.extend_from_slice(&encoded);

        Bytes::from(data)
    }

    /// Decode the aggregate envelope:
    /// (uint256 blockNumber, bytes32 blockHash, (bool success, bytes returnData)[])
    fn decode_response(response: &[u8]) -> Result<(u64, Vec<(bool, Vec<u8>)>), ScanError> {
        let decoded = abi::decode(
            &[
                ParamType::Uint(256),
                ParamType::FixedBytes(32),
                ParamType::Array(Box::new(ParamType::Tuple(vec![
                    ParamType::Bool,
                    ParamType::Bytes,
                ]))),
            ],
            response,
        )
        .map_err(|e| ScanError::BadResponse(format!("aggregate envelope: {}", e)))?;

        let mut fields = decoded.into_iter();

        let block_number = match fields.next() {
            Some(Token::Uint(n)) if n <= U256::from(u64::MAX) => n.low_u64(),
            _ => {
                return Err(ScanError::BadResponse(
                    "aggregate envelope: bad block number".to_string(),
                ))
            }
        };

        // blockHash is not used, but its slot must be present
        match fields.next() {
            Some(Token::FixedBytes(_)) => {}
            _ => {
                return Err(ScanError::BadResponse(
                    "aggregate envelope: missing block hash".to_string(),
                ))
            }
        }

        let entries = match fields.next() {
            Some(Token::Array(arr)) => arr,
            _ => {
                return Err(ScanError::BadResponse(
                    "aggregate envelope: missing result array".to_string(),
                ))
            }
        };

        let mut results = Vec::with_capacity(entries.len());
        for token in entries {
            match token {
                Token::Tuple(mut pair) if pair.len() == 2 => {
                    let return_data = match pair.pop() {
                        Some(Token::Bytes(b)) => b,
                        _ => {
                            return Err(ScanError::BadResponse(
                                "aggregate envelope: expected bytes in result tuple".to_string(),
                            ))
                        }
                    };
                    let success = match pair.pop() {
                        Some(Token::Bool(b)) => b,
                        _ => {
                            return Err(ScanError::BadResponse(
                                "aggregate envelope: expected bool in result tuple".to_string(),
                            ))
                        }
                    };
                    results.push((success, return_data));
                }
                _ => {
                    return Err(ScanError::BadResponse(
                        "aggregate envelope: unexpected result token".to_string(),
                    ))
                }
            }
        }

        Ok((block_number, results))
    }

    /// Fold one per-target result into a reading. A reverted sub-call
    /// or a payload shorter than the 3-word getReserves shape marks the
    /// entry failed; it never becomes a zero-reserve "success".
    fn decode_reserves(pool: Address, success: bool, data: &[u8]) -> PoolReading {
        if !success || data.len() < RESERVES_PAYLOAD_LEN {
            return PoolReading::failed(pool);
        }

        let reserve0 = U256::from_big_endian(&data[0..32]);
        let reserve1 = U256::from_big_endian(&data[32..64]);
        PoolReading::new(pool, reserve0, reserve1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Reader = MulticallReader<Provider<Http>>;

    fn reserves_payload(r0: u64, r1: u64) -> Vec<u8> {
        let mut data = vec![0u8; RESERVES_PAYLOAD_LEN];
        U256::from(r0).to_big_endian(&mut data[0..32]);
        U256::from(r1).to_big_endian(&mut data[32..64]);
        data
    }

    fn envelope(block: u64, entries: Vec<(bool, Vec<u8>)>) -> Vec<u8> {
        let tokens: Vec<Token> = entries
            .into_iter()
            .map(|(ok, data)| Token::Tuple(vec![Token::Bool(ok), Token::Bytes(data)]))
            .collect();
        abi::encode(&[
            Token::Uint(U256::from(block)),
            Token::FixedBytes(vec![0u8; 32]),
            Token::Array(tokens),
        ])
    }

    #[test]
    fn test_build_calldata_shape() {
        let calls = vec![
            (Address::from_low_u64_be(1), GET_RESERVES_SELECTOR.to_vec()),
            (Address::from_low_u64_be(2), GET_RESERVES_SELECTOR.to_vec()),
        ];
        let calldata = Reader::build_calldata(&calls);

        assert_eq!(&calldata[..4], &TRY_BLOCK_AND_AGGREGATE_SELECTOR);
        // Round-trip the body to confirm the wrapping
        let decoded = abi::decode(
            &[
                ParamType::Bool,
                ParamType::Array(Box::new(ParamType::Tuple(vec![
                    ParamType::Address,
                    ParamType::Bytes,
                ]))),
            ],
            &calldata[4..],
        )
        .unwrap();
        assert_eq!(decoded[0], Token::Bool(false));
        match &decoded[1] {
            Token::Array(arr) => assert_eq!(arr.len(), 2),
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_response_passes_block_number() {
        let raw = envelope(19_000_123, vec![(true, reserves_payload(10, 20))]);
        let (block, results) = Reader::decode_response(&raw).unwrap();
        assert_eq!(block, 19_000_123);
        assert_eq!(results.len(), 1);
        assert!(results[0].0);
    }

    #[test]
    fn test_decode_response_rejects_garbage() {
        let err = Reader::decode_response(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(matches!(err, ScanError::BadResponse(_)));
        assert!(err.is_qualifying());
    }

    #[test]
    fn test_failed_entry_at_every_position() {
        let pools: Vec<Address> = (1..=4).map(Address::from_low_u64_be).collect();

        for failing in 0..pools.len() {
            let entries = (0..pools.len())
                .map(|i| {
                    if i == failing {
                        (false, Vec::new())
                    } else {
                        (true, reserves_payload(100 + i as u64, 200 + i as u64))
                    }
                })
                .collect();
            let raw = envelope(777, entries);

            let (block, results) = Reader::decode_response(&raw).unwrap();
            assert_eq!(block, 777);

            let readings: Vec<PoolReading> = pools
                .iter()
                .zip(results.iter())
                .map(|(pool, (success, data))| Reader::decode_reserves(*pool, *success, data))
                .collect();

            assert_eq!(readings.len(), pools.len());
            for (i, reading) in readings.iter().enumerate() {
                assert_eq!(reading.pool, pools[i]);
                if i == failing {
                    assert!(!reading.ok, "position {} should have failed", i);
                    assert_eq!(reading.reserve0, U256::zero());
                    assert_eq!(reading.reserve1, U256::zero());
                } else {
                    assert!(reading.ok, "position {} should have succeeded", i);
                    assert_eq!(reading.reserve0, U256::from(100 + i as u64));
                    assert_eq!(reading.reserve1, U256::from(200 + i as u64));
                }
            }
        }
    }

    #[test]
    fn test_truncated_payload_folds_to_failed() {
        // Two words only, missing the timestamp word
        let short = reserves_payload(10, 20)[..64].to_vec();
        let reading = Reader::decode_reserves(Address::from_low_u64_be(9), true, &short);
        assert!(!reading.ok);
    }

    #[test]
    fn test_successful_payload_decodes_reserves() {
        let data = reserves_payload(123_456, 789_012);
        let reading = Reader::decode_reserves(Address::from_low_u64_be(9), true, &data);
        assert!(reading.ok);
        assert_eq!(reading.reserve0, U256::from(123_456));
        assert_eq!(reading.reserve1, U256::from(789_012));
    }
}
