//! Address, hash and big-integer primitives shared by the fee market, the
//! proposer scheduler and the pending-transaction pool.
//!
//! This crate intentionally does not mint its own 20-byte/32-byte newtypes:
//! [`alloy_primitives`] already provides exactly the representations this
//! system needs (`Address`, `B256`, `U256`), and re-exporting them keeps the
//! pool's public API interoperable with anything else built on the same
//! stack.

#![warn(missing_debug_implementations, unreachable_pub)]

pub use alloy_primitives::{Address, B256, U256};

mod block_ref;
mod overlay;

pub use block_ref::BlockRef;
pub use overlay::{KeyVariant, LayeredMap};

/// A 32-byte content hash, as produced by the transaction id/hash digests and
/// by the proposer scheduler's `dprp` function.
pub type Hash = B256;

/// Arbitrary-precision unsigned integer, up to 256 bits, used for gas
/// prices, balances and pending-cost accounting.
pub type BigInt = U256;
