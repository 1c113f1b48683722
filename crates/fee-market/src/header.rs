//! The slice of a block header this crate needs. The real header lives in
//! the block-storage component, out of scope for this crate; callers hand
//! in anything that implements [`Header`].

use txpool_primitives::{BigInt, Hash};

/// Read-only view over the header fields the fee market and the proposer
/// scheduler care about. The chain repository's real header type is
/// expected to implement this directly rather than being converted.
pub trait Header {
    fn parent_id(&self) -> Hash;
    fn number(&self) -> u64;
    fn timestamp(&self) -> u64;
    fn gas_limit(&self) -> u64;
    fn gas_used(&self) -> u64;
    /// `None` before the dynamic-fee market activates.
    fn base_fee(&self) -> Option<BigInt>;
    fn total_score(&self) -> u64;
    fn state_root(&self) -> Hash;
    fn id(&self) -> Hash;
}

/// A plain, owned [`Header`] implementation for tests and for callers that
/// don't want to implement the trait on their own header type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeaderView {
    pub parent_id: Hash,
    pub number: u64,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub base_fee: Option<BigInt>,
    pub total_score: u64,
    pub state_root: Hash,
    pub id: Hash,
}

impl Header for HeaderView {
    fn parent_id(&self) -> Hash {
        self.parent_id
    }

    fn number(&self) -> u64 {
        self.number
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    fn gas_used(&self) -> u64 {
        self.gas_used
    }

    fn base_fee(&self) -> Option<BigInt> {
        self.base_fee
    }

    fn total_score(&self) -> u64 {
        self.total_score
    }

    fn state_root(&self) -> Hash {
        self.state_root
    }

    fn id(&self) -> Hash {
        self.id
    }
}
