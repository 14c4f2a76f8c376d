//! RPC Module
//!
//! Endpoint rotation and the batched reserve reader.
//!
//! Author: AI-Generated
//! Created: 2026-02-03
//! Modified: 2026-02-04

pub mod multicall;
pub mod rotator;

pub use multicall::{MulticallReader, ReserveBatch};
pub use rotator::EndpointRotator;
