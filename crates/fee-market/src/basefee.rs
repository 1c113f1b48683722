//! Base-fee computation and header validation for the dynamic fee market.

use tracing::instrument;
use txpool_primitives::BigInt;

use crate::{
    error::HeaderValidationError,
    header::Header,
    params::{ForkConfig, GAS_LIMIT_BOUND_DIVISOR, MIN_GAS_LIMIT},
};

/// Computes the base fee a child of `parent` must carry.
///
/// Pure function of the parent header and the fork configuration; never
/// underflows below `fork.initial_base_fee`. See scenarios S1/S2 in the
/// integration test suite for the decay/growth ratios this produces under
/// the chosen 3/4-elasticity configuration.
#[instrument(level = "trace", skip(parent), fields(parent_number = parent.number()))]
pub fn calc_base_fee<H: Header>(parent: &H, fork: &ForkConfig) -> BigInt {
    if parent.number() + 1 == fork.activation_block {
        return fork.initial_base_fee;
    }

    let base_fee = parent
        .base_fee()
        .expect("calc_base_fee called on a post-activation parent without a base fee");

    let target = BigInt::from(parent.gas_limit()) * BigInt::from(fork.elasticity_num)
        / BigInt::from(fork.elasticity_den);
    let used = BigInt::from(parent.gas_used());
    let denom = BigInt::from(crate::params::BASE_FEE_CHANGE_DENOMINATOR);

    if used == target {
        return base_fee;
    }

    if used > target {
        let delta = ((base_fee * (used - target)) / target / denom).max(BigInt::from(1));
        return base_fee + delta;
    }

    let delta = (base_fee * (target - used)) / target / denom;
    base_fee.saturating_sub(delta).max(fork.initial_base_fee)
}

/// Validates `header` against `parent` per the gas-limit window and
/// base-fee rules.
pub fn verify_header<H: Header>(
    parent: &H,
    header: &H,
    fork: &ForkConfig,
) -> Result<(), HeaderValidationError> {
    let post_activation = header.number() >= fork.activation_block;

    match (post_activation, header.base_fee()) {
        (true, None) => return Err(HeaderValidationError::ErrBaseFeeNotSet),
        (false, Some(_)) => return Err(HeaderValidationError::ErrBaseFeeSetBeforeActivation),
        _ => {}
    }

    let parent_limit = parent.gas_limit();
    let bound = parent_limit / GAS_LIMIT_BOUND_DIVISOR;
    let min = parent_limit.saturating_sub(bound);
    let max = parent_limit.saturating_add(bound);
    let got = header.gas_limit();

    if got < MIN_GAS_LIMIT {
        return Err(HeaderValidationError::ErrGasLimitTooLow { min: MIN_GAS_LIMIT, got });
    }
    if got < min || got > max {
        return Err(HeaderValidationError::ErrInvalidGasLimit { parent: parent_limit, min, max, got });
    }

    if post_activation {
        let expected = calc_base_fee(parent, fork);
        let got = header.base_fee().expect("checked above");
        if got != expected {
            return Err(HeaderValidationError::ErrBaseFeeMismatch { expected, got });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HeaderView;
    use alloy_primitives::B256;
    use proptest::prelude::*;

    fn fork() -> ForkConfig {
        ForkConfig::galactica(0, BigInt::from(1_000_000_000u64))
    }

    fn header(number: u64, gas_limit: u64, gas_used: u64, base_fee: u64) -> HeaderView {
        HeaderView {
            parent_id: B256::ZERO,
            number,
            timestamp: number * 10,
            gas_limit,
            gas_used,
            base_fee: Some(BigInt::from(base_fee)),
            total_score: 0,
            state_root: B256::ZERO,
            id: B256::ZERO,
        }
    }

    /// S1: base-fee decay under empty blocks, 3/4-elasticity, ratio 7/8.
    #[test]
    fn s1_decay_under_empty_blocks() {
        let fork = fork();
        let mut parent = header(1, 20_000_000, 0, 10_000_000_000);
        for _ in 0..100 {
            let expected = parent.base_fee.unwrap() * BigInt::from(7u64) / BigInt::from(8u64);
            let got = calc_base_fee(&parent, &fork);
            assert_eq!(got, expected.max(fork.initial_base_fee));
            parent.base_fee = Some(got);
            parent.number += 1;
        }
        assert!(parent.base_fee.unwrap() < fork.initial_base_fee + BigInt::from(1));
    }

    /// S2: base-fee growth under full blocks, 3/4-elasticity, ratio 25/24.
    #[test]
    fn s2_growth_under_full_blocks() {
        let fork = fork();
        let parent = header(1, 20_000_000, 20_000_000, 1_000_000_000);
        let got = calc_base_fee(&parent, &fork);
        let expected = BigInt::from(1_000_000_000u64) * BigInt::from(25u64) / BigInt::from(24u64);
        assert_eq!(got, expected);
    }

    #[test]
    fn base_fee_never_underflows_initial() {
        let fork = fork();
        let parent = header(1, 20_000_000, 0, fork.initial_base_fee.to::<u64>());
        let got = calc_base_fee(&parent, &fork);
        assert_eq!(got, fork.initial_base_fee);
    }

    #[test]
    fn activation_block_gets_initial_base_fee() {
        let fork = ForkConfig::galactica(5, BigInt::from(42u64));
        let parent = HeaderView {
            parent_id: B256::ZERO,
            number: 4,
            timestamp: 40,
            gas_limit: 20_000_000,
            gas_used: 20_000_000,
            base_fee: None,
            total_score: 0,
            state_root: B256::ZERO,
            id: B256::ZERO,
        };
        assert_eq!(calc_base_fee(&parent, &fork), BigInt::from(42u64));
    }

    /// `verify_header` accepts exactly [parent*1023/1024, parent*1025/1024].
    #[test]
    fn gas_limit_window_is_exact() {
        let fork = fork();
        let parent_limit = 1024 * 1000;
        let parent = header(1, parent_limit, parent_limit * 3 / 4, 1_000_000_000);
        let base_fee = calc_base_fee(&parent, &fork);

        let ok_low = header(2, parent_limit - 1000, 0, 0);
        let mut ok_low = ok_low;
        ok_low.base_fee = Some(base_fee);
        assert!(verify_header(&parent, &ok_low, &fork).is_ok());

        let mut too_low = header(2, parent_limit - 1001, 0, 0);
        too_low.base_fee = Some(base_fee);
        assert!(verify_header(&parent, &too_low, &fork).is_err());

        let mut ok_high = header(2, parent_limit + 1000, 0, 0);
        ok_high.base_fee = Some(base_fee);
        assert!(verify_header(&parent, &ok_high, &fork).is_ok());

        let mut too_high = header(2, parent_limit + 1001, 0, 0);
        too_high.base_fee = Some(base_fee);
        assert!(verify_header(&parent, &too_high, &fork).is_err());
    }

    #[test]
    fn rejects_gas_limit_below_protocol_minimum() {
        let fork = fork();
        let parent = header(1, MIN_GAS_LIMIT * 2, 0, 1_000_000_000);
        let mut child = header(2, MIN_GAS_LIMIT - 1, 0, 0);
        child.base_fee = Some(calc_base_fee(&parent, &fork));
        assert_eq!(
            verify_header(&parent, &child, &fork),
            Err(HeaderValidationError::ErrGasLimitTooLow { min: MIN_GAS_LIMIT, got: MIN_GAS_LIMIT - 1 })
        );
    }

    proptest! {
        /// `calc_base_fee` never underflows below `fork.initial_base_fee`
        /// and is a pure function: identical inputs always reproduce the
        /// same output.
        #[test]
        fn base_fee_never_underflows_and_is_pure(
            gas_limit in (MIN_GAS_LIMIT * 2)..100_000_000u64,
            used_ratio in 0u64..=100u64,
            base_fee_raw in 1u64..1_000_000_000_000u64,
        ) {
            let fork = fork();
            let gas_used = gas_limit * used_ratio / 100;
            let parent = header(1, gas_limit, gas_used, base_fee_raw);

            let first = calc_base_fee(&parent, &fork);
            let second = calc_base_fee(&parent, &fork);
            prop_assert_eq!(first, second);
            prop_assert!(first >= fork.initial_base_fee);
        }

        /// `verify_header` accepts exactly the gas-limit window
        /// `[parent*1023/1024, parent*1025/1024]`, for arbitrary parent
        /// limits and arbitrary offsets around the boundary.
        #[test]
        fn gas_limit_window_matches_formula(
            parent_limit in (MIN_GAS_LIMIT * 2)..1_000_000_000u64,
            offset in -2000i64..=2000i64,
        ) {
            let fork = fork();
            let parent = header(1, parent_limit, parent_limit * 3 / 4, 1_000_000_000);
            let base_fee = calc_base_fee(&parent, &fork);

            let bound = parent_limit / GAS_LIMIT_BOUND_DIVISOR;
            let min = parent_limit.saturating_sub(bound);
            let max = parent_limit.saturating_add(bound);

            let child_limit = (parent_limit as i64 + offset).max(0) as u64;
            let mut child = header(2, child_limit, 0, 0);
            child.base_fee = Some(base_fee);

            let result = verify_header(&parent, &child, &fork);
            let within_window = child_limit >= min && child_limit <= max;
            let above_protocol_min = child_limit >= MIN_GAS_LIMIT;

            prop_assert_eq!(result.is_ok(), within_window && above_protocol_min);
        }
    }
}
