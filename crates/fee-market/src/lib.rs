//! Fee-market engine: the per-block base-fee update rule and the
//! per-transaction price derivations that gate admission into the pool.
//!
//! Fork configuration is fixed to 3/4 elasticity with an
//! `INITIAL_BASE_FEE` floor — see [`params::ForkConfig::galactica`].

#![warn(missing_debug_implementations, unreachable_pub)]

mod basefee;
mod error;
mod header;
mod params;
mod tx_price;

pub use basefee::{calc_base_fee, verify_header};
pub use error::{ErrGasPriceTooLowForBlockBase, FeeValidationError, HeaderValidationError};
pub use header::{Header, HeaderView};
pub use params::{ForkConfig, BASE_FEE_CHANGE_DENOMINATOR, GAS_LIMIT_BOUND_DIVISOR, MIN_GAS_LIMIT};
pub use tx_price::{block_reward, overall_gas_price, validate_fee, validator_tip, FeeFields};
