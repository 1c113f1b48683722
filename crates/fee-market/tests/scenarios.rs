//! End-to-end scenarios exercised against the crate's public API only (no
//! access to crate-internal test helpers).

use fee_market::{calc_base_fee, validate_fee, ErrGasPriceTooLowForBlockBase, FeeFields, ForkConfig, Header, HeaderView};
use txpool_primitives::{BigInt, B256};

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

#[test]
fn s1_decay_over_100_empty_blocks_reaches_floor() {
    let fork = fork();
    let mut parent = header(1, 20_000_000, 0, 10_000_000_000);
    for _ in 0..100 {
        let next = calc_base_fee(&parent, &fork);
        parent.base_fee = Some(next);
        parent.number += 1;
    }
    assert_eq!(parent.base_fee.unwrap(), fork.initial_base_fee);
}

#[test]
fn s2_full_block_growth_ratio() {
    let fork = fork();
    let parent = header(1, 20_000_000, 20_000_000, 1_000_000_000);
    let child_base_fee = calc_base_fee(&parent, &fork);
    assert_eq!(child_base_fee, BigInt::from(1_000_000_000u64) * BigInt::from(25u64) / BigInt::from(24u64));
}

#[test]
fn s4_dynamic_fee_below_base_fee_is_rejected() {
    let base_fee = BigInt::from(1_000_000_000u64);
    let fee = FeeFields::DynamicFee {
        max_fee_per_gas: base_fee - BigInt::from(1u64),
        max_priority_fee_per_gas: BigInt::from(2_000_000_000u64),
    };
    let err = validate_fee(&fee, BigInt::ZERO, base_fee).unwrap_err();
    assert_eq!(err, ErrGasPriceTooLowForBlockBase);
}

#[test]
fn parent_id_and_block_number_roundtrip_through_header_trait() {
    let h = header(7, 1, 0, 0);
    assert_eq!(Header::number(&h), 7);
    assert_eq!(Header::parent_id(&h), B256::ZERO);
}
