use txpool_primitives::Address;

/// A member of the authorized proposer set, as supplied by the chain state
/// at the current head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Proposer {
    pub address: Address,
    pub active: bool,
}

impl Proposer {
    pub fn new(address: Address, active: bool) -> Self {
        Self { address, active }
    }
}
