//! Constant-Product Swap Math
//!
//! Integer-only quoting for V2-style pairs (0.30% fee, 997/1000).
//! All intermediates go through 512-bit widening so the fee product
//! cannot wrap; division floors, matching on-chain router math.
//!
//! Author: AI-Generated
//! Created: 2026-01-27
//! Modified: 2026-02-03 (512-bit intermediates, cyclic fold)

use ethers::types::{Sign, I256, U256, U512};

/// Fee numerator: amount kept after the 0.30% pool fee
const FEE_NUMERATOR: u64 = 997;

/// Fee denominator
const FEE_DENOMINATOR: u64 = 1000;

/// Quote the output of a single constant-product swap.
///
/// `floor(amount_in * 997 * reserve_out / (reserve_in * 1000 + amount_in * 997))`
///
/// Zero input or a zero reserve on either side returns zero. The result
/// is strictly below `reserve_out` for any non-degenerate pool.
pub fn amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> U256 {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return U256::zero();
    }

    let amount_in_with_fee = amount_in.full_mul(U256::from(FEE_NUMERATOR));
    let numerator = amount_in_with_fee.saturating_mul(U512::from(reserve_out));
    let denominator = reserve_in.full_mul(U256::from(FEE_DENOMINATOR)) + amount_in_with_fee;

    // Quotient is bounded by reserve_out, so it always fits back in 256 bits
    U256::try_from(numerator / denominator).unwrap_or(reserve_out)
}

/// Fold `amount_out` across a closed cycle of hops, each given as
/// (reserve_in, reserve_out), and return the final amount.
pub fn cycle_out(amount_in: U256, hops: &[(U256, U256)]) -> U256 {
    let mut amount = amount_in;
    for (reserve_in, reserve_out) in hops {
        amount = amount_out(amount, *reserve_in, *reserve_out);
    }
    amount
}

/// Signed net result of trading a closed cycle: `final - amount_in`.
pub fn cyclic_profit(amount_in: U256, hops: &[(U256, U256)]) -> I256 {
    signed_delta(cycle_out(amount_in, hops), amount_in)
}

/// `after - before` as a signed value, saturating at the I256 range edge.
pub fn signed_delta(after: U256, before: U256) -> I256 {
    if after >= before {
        I256::checked_from_sign_and_abs(Sign::Positive, after - before).unwrap_or(I256::MAX)
    } else {
        I256::checked_from_sign_and_abs(Sign::Negative, before - after).unwrap_or(I256::MIN)
    }
}
