//! Error taxonomy: `BadTxError` (structural/cryptographic, sender must not
//! retry) and `TxRejectedError` (transient pool-policy refusal, sender may
//! retry). Ingress never surfaces either kind for its two silent drops
//! (blocked origin/delegator, duplicate hash) — see `pool::all`.

use alloy_primitives::U256;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BadTxError {
    #[error("chain tag mismatch: expected {expected}, got {got}")]
    ChainTagMismatch { expected: u8, got: u8 },
    #[error("invalid transaction signature")]
    InvalidSignature,
    #[error("transaction has no clauses")]
    EmptyClauses,
    #[error("gas {gas} is below intrinsic gas {intrinsic}")]
    GasBelowIntrinsic { gas: u64, intrinsic: u64 },
    #[error("transaction expired")]
    TxExpired,
    #[error("dependency reverted or expired")]
    DependencyFailed,
    #[error(transparent)]
    Fee(#[from] fee_market::FeeValidationError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxRejectedError {
    #[error("transaction size {size} exceeds the {max} byte limit")]
    SizeTooLarge { size: usize, max: usize },
    #[error("pool is full")]
    PoolFull,
    #[error("non executable pool is full")]
    NonExecutablePoolFull,
    #[error("tx is not executable")]
    NotExecutable,
    #[error("payer has insufficient energy: needs {needed}, has {available}")]
    PayerInsufficientEnergy { needed: U256, available: U256 },
    #[error(transparent)]
    Fee(#[from] fee_market::FeeValidationError),
    /// The transaction failed its executability check for a reason other
    /// than fee: expired, malformed, or blocked on an unsettled dependency.
    /// Carried as a policy-level rejection rather than `BadTxError` because
    /// the same transaction may pass this check once the chain advances.
    #[error("transaction is not yet executable: {0}")]
    Unexecutable(BadTxError),
}

/// Unifies the two ingress-facing kinds behind one type so `Pool::add` can
/// return a single `Result`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error(transparent)]
    BadTx(#[from] BadTxError),
    #[error(transparent)]
    Rejected(#[from] TxRejectedError),
}

impl PoolError {
    /// Whether the sender may retry this submission later.
    pub fn retryable(&self) -> bool {
        matches!(self, PoolError::Rejected(_))
    }
}
