use alloy_primitives::B256;

/// The first 8 bytes of a reference block id, used by [`Tx`](https://docs.rs/txpool)
/// expiration checks: a transaction expires once the chain has advanced
/// `expiration` blocks past the block identified by this reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockRef([u8; 8]);

impl BlockRef {
    /// Builds a block reference from the leading 8 bytes of a full block id.
    pub fn from_block_id(id: B256) -> Self {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&id.as_slice()[..8]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// The block number encoded in the first 4 bytes of the reference, as
    /// used to detect whether `blockRef` still matches the canonical chain.
    pub fn number(&self) -> u32 {
        u32::from_be_bytes(self.0[..4].try_into().expect("4 bytes"))
    }
}

impl From<[u8; 8]> for BlockRef {
    fn from(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }
}
