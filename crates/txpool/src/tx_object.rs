//! Resolved transaction object: `resolve`, `executable`, `proved_work` and
//! `effective_priority_fee_per_gas`.

use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{keccak256, Address, B256, U256};
use fee_market::{FeeFields, ForkConfig, Header, HeaderView};
use parking_lot::Mutex;

use crate::error::BadTxError;
use crate::signer::SignatureRecovery;
use crate::traits::{ChainRepository, DependencyState, StateProvider};
use crate::tx::Tx;

/// The fields of a [`TxObject`] the housekeeper and the pool index mutate
/// over the object's lifetime, grouped so they move under one lock.
#[derive(Debug, Clone, Copy, Default)]
struct MutableState {
    executable: bool,
    /// This object's own cost (value moved plus gas cost at the last
    /// observed base fee). Counted in its payer's pool-wide aggregate only
    /// while `executable` is false; maintained by `TxObjectMap`.
    pending_cost: U256,
    /// Current effective tip per gas; recomputed whenever the observed base
    /// fee changes.
    priority_gas_price: U256,
}

/// A [`Tx`] plus the fields computed once at resolution time and the ones
/// maintained for the object's pool lifetime. Instances are shared via
/// `Arc` across the pool index and the housekeeper, so the lifetime fields
/// live behind a lock rather than requiring `&mut TxObject` everywhere.
#[derive(Debug)]
pub struct TxObject {
    pub tx: Tx,
    /// Monotonic submission timestamp, nanoseconds.
    pub time_added: u64,
    pub local_submitted: bool,
    pub origin: Address,
    pub delegator: Option<Address>,
    state: Mutex<MutableState>,
}

impl TxObject {
    /// The address that must be solvent for this transaction: the
    /// delegator if fee-delegated, otherwise the origin.
    pub fn payer(&self) -> Address {
        self.delegator.unwrap_or(self.origin)
    }

    pub fn executable(&self) -> bool {
        self.state.lock().executable
    }

    pub fn set_executable(&self, value: bool) {
        self.state.lock().executable = value;
    }

    pub fn pending_cost(&self) -> U256 {
        self.state.lock().pending_cost
    }

    pub fn set_pending_cost(&self, value: U256) {
        self.state.lock().pending_cost = value;
    }

    pub fn priority_gas_price(&self) -> U256 {
        self.state.lock().priority_gas_price
    }

    pub fn set_priority_gas_price(&self, value: U256) {
        self.state.lock().priority_gas_price = value;
    }

    #[cfg(test)]
    pub(crate) fn test_new(tx: Tx, origin: Address, pending_cost: U256) -> Self {
        Self {
            tx,
            time_added: 0,
            local_submitted: false,
            origin,
            delegator: None,
            state: Mutex::new(MutableState { executable: false, pending_cost, priority_gas_price: U256::ZERO }),
        }
    }
}

fn monotonic_now_ns() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(0)
}

/// Recovers `origin` (and `delegator`, if fee-delegated) from `tx`'s
/// signature, failing on a bad signature rather than panicking.
pub fn resolve(tx: Tx, local_submitted: bool, signer: &dyn SignatureRecovery) -> Result<TxObject, BadTxError> {
    let origin =
        signer.recover(tx.signing_hash(), &tx.signature).map_err(|_| BadTxError::InvalidSignature)?;

    let delegator = match &tx.delegator_signature {
        Some(sig) => {
            Some(signer.recover(tx.delegation_signing_hash(), sig).map_err(|_| BadTxError::InvalidSignature)?)
        }
        None => None,
    };

    Ok(TxObject {
        tx,
        time_added: monotonic_now_ns(),
        local_submitted,
        origin,
        delegator,
        state: Mutex::new(MutableState::default()),
    })
}

/// Checks whether `obj` could be included in the next block built on `head`.
/// `Ok(true)` means ready for inclusion; `Ok(false)` means not yet (e.g. an
/// unsettled dependency or a not-yet-existing payer account); `Err` means
/// permanently bad.
pub async fn executable(
    obj: &TxObject,
    chain: &dyn ChainRepository,
    state: &dyn StateProvider,
    head: &HeaderView,
    fork: &ForkConfig,
) -> Result<bool, BadTxError> {
    let next_block_number = head.number() + 1;

    if next_block_number >= obj.tx.block_ref.number() as u64 + obj.tx.expiration as u64 {
        return Err(BadTxError::TxExpired);
    }

    if obj.tx.clauses.is_empty() {
        return Err(BadTxError::EmptyClauses);
    }

    let intrinsic = obj.tx.intrinsic_gas();
    if obj.tx.gas < intrinsic {
        return Err(BadTxError::GasBelowIntrinsic { gas: obj.tx.gas, intrinsic });
    }

    if next_block_number >= fork.activation_block {
        if let Some(base_fee) = head.base_fee() {
            fee_market::validate_fee(&obj.tx.fee, fork.legacy_base_gas_price, base_fee)?;
        }
    }

    if let Some(dep) = obj.tx.depends_on {
        match chain.dependency_state(dep).await {
            DependencyState::Settled => {}
            DependencyState::Pending => return Ok(false),
            DependencyState::RevertedOrExpired => return Err(BadTxError::DependencyFailed),
        }
    }

    if !state.account_exists(obj.payer()).await {
        return Ok(false);
    }

    Ok(true)
}

/// A deterministic function of the transaction body and a past block id,
/// used as a pre-activation tie-breaker for legacy-tx priority pricing.
pub fn proved_work(tx: &Tx, past_block_id: B256) -> U256 {
    let mut payload = tx.encode_unsigned_for_proved_work();
    payload.extend_from_slice(past_block_id.as_slice());
    U256::from_be_bytes::<32>(keccak256(payload).0)
}

/// The tip a transaction earns the proposer, recomputed whenever the
/// observed base fee changes. `proved_work`'s low bits are folded in so
/// legacy transactions with an identical `gasPriceCoef` don't tie
/// arbitrarily pre-activation.
pub fn effective_priority_fee_per_gas(
    fee: &FeeFields,
    legacy_base_gas_price: U256,
    base_fee: U256,
    proved_work: U256,
) -> U256 {
    let tip = fee_market::validator_tip(fee, legacy_base_gas_price, base_fee);
    if matches!(fee, FeeFields::DynamicFee { .. }) {
        return tip;
    }
    // Legacy pre-activation tie-break: fold in the low 32 bits of the
    // proved-work hash as a sub-unit nudge that never crosses a whole-wei
    // boundary between two distinct coefficients.
    let nudge = proved_work & U256::from(u32::MAX);
    tip.saturating_add(nudge >> 32)
}
