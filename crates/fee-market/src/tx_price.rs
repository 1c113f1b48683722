//! Per-transaction fee derivations.

use txpool_primitives::BigInt;

use crate::{error::FeeValidationError, params::ForkConfig};

/// The fee fields a transaction carries, abstracted over the two concrete
/// transaction types (Legacy, DynamicFee) so this crate doesn't need to know
/// about clauses, signatures or any of the rest of the transaction body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeFields {
    /// `gasPriceCoef in [0, 255]`.
    Legacy { gas_price_coef: u8 },
    DynamicFee { max_fee_per_gas: BigInt, max_priority_fee_per_gas: BigInt },
}

impl FeeFields {
    /// `legacyGasPrice(baseGasPrice) = baseGasPrice + baseGasPrice * coef / 255`,
    /// used as both `maxFee` and `maxPriorityFee` for legacy transactions.
    pub fn legacy_gas_price(base_gas_price: BigInt, gas_price_coef: u8) -> BigInt {
        base_gas_price + base_gas_price * BigInt::from(gas_price_coef) / BigInt::from(255u64)
    }

    /// `(maxFee, maxPriorityFee)` for this transaction, given the chain's
    /// legacy base gas price (used only by the `Legacy` branch).
    pub fn max_fees(&self, legacy_base_gas_price: BigInt) -> (BigInt, BigInt) {
        match *self {
            FeeFields::Legacy { gas_price_coef } => {
                let price = Self::legacy_gas_price(legacy_base_gas_price, gas_price_coef);
                (price, price)
            }
            FeeFields::DynamicFee { max_fee_per_gas, max_priority_fee_per_gas } => {
                (max_fee_per_gas, max_priority_fee_per_gas)
            }
        }
    }
}

/// `OverallGasPrice(tx, baseFee) = min(maxPriorityFee + baseFee, maxFee)`,
/// the amount charged to the payer per unit of gas.
pub fn overall_gas_price(fee: &FeeFields, legacy_base_gas_price: BigInt, base_fee: BigInt) -> BigInt {
    let (max_fee, max_priority_fee) = fee.max_fees(legacy_base_gas_price);
    (max_priority_fee + base_fee).min(max_fee)
}

/// The portion of [`overall_gas_price`] that goes to the block proposer
/// (the rest of the charged price is the base fee, which is burned).
pub fn validator_tip(fee: &FeeFields, legacy_base_gas_price: BigInt, base_fee: BigInt) -> BigInt {
    let (max_fee, max_priority_fee) = fee.max_fees(legacy_base_gas_price);
    let headroom = max_fee.saturating_sub(base_fee);
    max_priority_fee.min(headroom)
}

/// Admission rule: `maxFee >= baseFee`, else `ErrMaxFeePerGasTooLow`.
pub fn validate_fee(
    fee: &FeeFields,
    legacy_base_gas_price: BigInt,
    base_fee: BigInt,
) -> Result<(), FeeValidationError> {
    let (max_fee, _) = fee.max_fees(legacy_base_gas_price);
    if max_fee < base_fee {
        return Err(FeeValidationError::ErrMaxFeePerGasTooLow);
    }
    Ok(())
}

/// Reward paid to the block proposer for `gas_used`: the full
/// `gasUsed * rewardPrice` post-activation, and `rewardRatio/1e18` of that
/// pre-activation (`rewardRatio ~= 0.3e18`).
pub fn block_reward(gas_used: u64, reward_price: BigInt, block_number: u64, fork: &ForkConfig) -> BigInt {
    let full = BigInt::from(gas_used) * reward_price;
    if block_number >= fork.activation_block {
        full
    } else {
        full * fork.pre_activation_reward_ratio / BigInt::from(10u64).pow(BigInt::from(18u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_gas_price_full_coefficient() {
        let base = BigInt::from(1_000_000_000u64);
        let price = FeeFields::legacy_gas_price(base, 255);
        assert_eq!(price, base * BigInt::from(2u64));
    }

    #[test]
    fn dynamic_fee_below_base_fee_is_rejected() {
        let fee = FeeFields::DynamicFee {
            max_fee_per_gas: BigInt::from(99u64),
            max_priority_fee_per_gas: BigInt::from(10u64),
        };
        let err = validate_fee(&fee, BigInt::ZERO, BigInt::from(100u64)).unwrap_err();
        assert_eq!(err, FeeValidationError::ErrMaxFeePerGasTooLow);
    }

    #[test]
    fn overall_price_caps_at_max_fee() {
        let fee = FeeFields::DynamicFee {
            max_fee_per_gas: BigInt::from(120u64),
            max_priority_fee_per_gas: BigInt::from(50u64),
        };
        let price = overall_gas_price(&fee, BigInt::ZERO, BigInt::from(100u64));
        // min(50 + 100, 120) = 120
        assert_eq!(price, BigInt::from(120u64));
        let tip = validator_tip(&fee, BigInt::ZERO, BigInt::from(100u64));
        // headroom = 120 - 100 = 20, min(50, 20) = 20
        assert_eq!(tip, BigInt::from(20u64));
    }

    #[test]
    fn reward_is_scaled_pre_activation() {
        let fork = ForkConfig::galactica(1_000, BigInt::from(1u64));
        let reward_price = BigInt::from(100u64);
        let pre = block_reward(1_000, reward_price, 10, &fork);
        let post = block_reward(1_000, reward_price, 1_000, &fork);
        assert_eq!(post, BigInt::from(100_000u64));
        assert_eq!(pre, BigInt::from(30_000u64));
    }
}
