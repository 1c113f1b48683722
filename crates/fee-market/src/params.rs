//! Tunable constants for the base-fee update rule.
//!
//! Two production revisions of this rule disagree on the elasticity
//! multiplier (1/2 vs. 3/4) and on whether `baseFee` floors at
//! `INITIAL_BASE_FEE` or at zero. This implementation fixes both choices
//! rather than supporting them simultaneously — see `ForkConfig::galactica`.

use txpool_primitives::BigInt;

/// Denominator of the base-fee change rule: a full block moves the fee by at
/// most `baseFee / BASE_FEE_CHANGE_DENOMINATOR` per block.
pub const BASE_FEE_CHANGE_DENOMINATOR: u64 = 8;

/// Minimum `gasLimit` a header may declare, independent of the parent.
pub const MIN_GAS_LIMIT: u64 = 5_000;

/// A block's `gasLimit` may move at most `1/1024` of the parent's per block.
pub const GAS_LIMIT_BOUND_DIVISOR: u64 = 1024;

/// Fee-market fork parameters. Constructed once per chain configuration and
/// passed to every [`crate::calc_base_fee`]/[`crate::verify_header`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForkConfig {
    /// Block number at which the dynamic-fee market activates. Before this
    /// block headers carry no base fee.
    pub activation_block: u64,
    /// `baseFee` assigned to the activation block itself.
    pub initial_base_fee: BigInt,
    /// Elasticity multiplier numerator (`target = gasLimit * num / den`).
    pub elasticity_num: u64,
    /// Elasticity multiplier denominator.
    pub elasticity_den: u64,
    /// Reward ratio applied to `gasUsed * rewardPrice` before activation,
    /// expressed as a fixed-point fraction of `1e18` (`~0.3e18` pre-fork).
    pub pre_activation_reward_ratio: BigInt,
    /// Base price Legacy transactions scale their `gasPriceCoef` against.
    /// Fixed per chain.
    pub legacy_base_gas_price: BigInt,
}

impl ForkConfig {
    /// This repo's chosen fork configuration: 3/4 elasticity (a full block
    /// grows the fee by `1/24` per block, an empty block decays it by
    /// `1/8`), floored at `initial_base_fee` rather than zero. See
    /// scenario S2 in the transaction-pool test suite.
    pub fn galactica(activation_block: u64, initial_base_fee: BigInt) -> Self {
        Self {
            activation_block,
            initial_base_fee,
            elasticity_num: 3,
            elasticity_den: 4,
            pre_activation_reward_ratio: reward_ratio_0_3(),
            legacy_base_gas_price: BigInt::from(10u64).pow(BigInt::from(13u64)),
        }
    }
}

/// `0.3e18` as a `U256`, the pre-activation block-reward ratio.
fn reward_ratio_0_3() -> BigInt {
    BigInt::from(3u64) * BigInt::from(10u64).pow(BigInt::from(17u64))
}
