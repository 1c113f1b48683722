use txpool_primitives::BigInt;

/// Errors raised while validating a header against the base-fee rule.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderValidationError {
    #[error("base fee must be set post-activation")]
    ErrBaseFeeNotSet,
    #[error("base fee must be absent pre-activation")]
    ErrBaseFeeSetBeforeActivation,
    #[error("gas limit {got} outside the permitted window [{min}, {max}] of parent {parent}")]
    ErrInvalidGasLimit { parent: u64, min: u64, max: u64, got: u64 },
    #[error("gas limit {got} is below the protocol minimum {min}")]
    ErrGasLimitTooLow { min: u64, got: u64 },
    #[error("header base fee {got} does not match the computed base fee {expected}")]
    ErrBaseFeeMismatch { expected: BigInt, got: BigInt },
}

/// Errors raised while validating a transaction's fee fields against the
/// current base fee.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeValidationError {
    #[error("max fee per gas is lower than the current base fee")]
    ErrMaxFeePerGasTooLow,
}

/// Alias used at admission-check call sites for the same variant.
pub use FeeValidationError::ErrMaxFeePerGasTooLow as ErrGasPriceTooLowForBlockBase;
