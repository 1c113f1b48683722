//! The transaction object and its canonical wire encoding.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use fee_market::FeeFields;
use txpool_primitives::BlockRef;

use crate::signer::Signature;

/// A single clause: an optional call target (`None` is a contract
/// creation), a value transfer, and calldata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
}

impl Clause {
    fn encode_into(&self, out: &mut Vec<u8>) {
        match self.to {
            Some(addr) => {
                out.push(1);
                out.extend_from_slice(addr.as_slice());
            }
            None => out.push(0),
        }
        out.extend_from_slice(&self.value.to_be_bytes::<32>());
        out.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.data);
    }
}

/// Immutable transaction body, built once and never mutated afterward. Two
/// concrete fee layouts exist; which one applies is carried by `fee`
/// ([`FeeFields`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tx {
    pub chain_tag: u8,
    pub block_ref: BlockRef,
    pub expiration: u32,
    pub clauses: Vec<Clause>,
    pub gas: u64,
    pub fee: FeeFields,
    /// `id` of another transaction that must settle first.
    pub depends_on: Option<B256>,
    pub nonce: u64,
    pub signature: Signature,
    /// Present only for fee-delegated transactions.
    pub delegator_signature: Option<Signature>,
}

const TX_GAS: u64 = 5_000;
const CLAUSE_GAS: u64 = 21_000;
const CLAUSE_GAS_CONTRACT_CREATION: u64 = 53_000;
const ZERO_BYTE_GAS: u64 = 4;
const NON_ZERO_BYTE_GAS: u64 = 68;

/// Maximum encoded transaction size admitted into the pool.
pub const MAX_TX_SIZE: usize = 64 * 1024;

impl Tx {
    /// Canonical payload excluding both signatures — this is hashed to
    /// produce [`Self::id`].
    fn encode_unsigned(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + self.clauses.len() * 64);
        out.push(self.fee.type_tag());
        out.push(self.chain_tag);
        out.extend_from_slice(self.block_ref.as_bytes());
        out.extend_from_slice(&self.expiration.to_be_bytes());
        out.extend_from_slice(&(self.clauses.len() as u32).to_be_bytes());
        for clause in &self.clauses {
            clause.encode_into(&mut out);
        }
        out.extend_from_slice(&self.gas.to_be_bytes());
        self.fee.encode_into(&mut out);
        match self.depends_on {
            Some(id) => {
                out.push(1);
                out.extend_from_slice(id.as_slice());
            }
            None => out.push(0),
        }
        out.extend_from_slice(&self.nonce.to_be_bytes());
        out
    }

    /// Canonical payload including both signatures — this is hashed to
    /// produce [`Self::hash`] and is the byte-exact wire form for gossip.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.encode_unsigned();
        out.extend_from_slice(&self.signature.0);
        match &self.delegator_signature {
            Some(sig) => {
                out.push(1);
                out.extend_from_slice(&sig.0);
            }
            None => out.push(0),
        }
        out
    }

    /// Content hash excluding signature and delegator signature.
    pub fn id(&self) -> B256 {
        keccak256(self.encode_unsigned())
    }

    /// Content hash including signature and delegator signature.
    pub fn hash(&self) -> B256 {
        keccak256(self.encode())
    }

    /// Byte size of the wire-encoded transaction.
    pub fn size(&self) -> usize {
        self.encode().len()
    }

    /// Gas a transaction must at least carry before any execution
    /// (`gas >= intrinsicGas`).
    pub fn intrinsic_gas(&self) -> u64 {
        if self.clauses.is_empty() {
            return TX_GAS + CLAUSE_GAS;
        }
        let mut gas = TX_GAS;
        for clause in &self.clauses {
            gas += if clause.to.is_some() { CLAUSE_GAS } else { CLAUSE_GAS_CONTRACT_CREATION };
            for byte in clause.data.iter() {
                gas += if *byte == 0 { ZERO_BYTE_GAS } else { NON_ZERO_BYTE_GAS };
            }
        }
        gas
    }

    /// The signing hash presented to [`crate::signer::SignatureRecovery`]
    /// when recovering the origin: the unsigned payload, hashed.
    pub fn signing_hash(&self) -> B256 {
        keccak256(self.encode_unsigned())
    }

    /// The signing hash presented when recovering the fee delegator: the
    /// unsigned payload followed by the origin's signature, hashed. This
    /// binds delegation to a specific origin signature.
    pub fn delegation_signing_hash(&self) -> B256 {
        let mut payload = self.encode_unsigned();
        payload.extend_from_slice(&self.signature.0);
        keccak256(payload)
    }

    /// The unsigned payload, exposed to [`crate::tx_object::proved_work`]
    /// without re-deriving `id`'s hash.
    pub(crate) fn encode_unsigned_for_proved_work(&self) -> Vec<u8> {
        self.encode_unsigned()
    }
}

impl FeeFields {
    fn type_tag(&self) -> u8 {
        match self {
            FeeFields::Legacy { .. } => 0,
            FeeFields::DynamicFee { .. } => 1,
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            FeeFields::Legacy { gas_price_coef } => out.push(*gas_price_coef),
            FeeFields::DynamicFee { max_fee_per_gas, max_priority_fee_per_gas } => {
                out.extend_from_slice(&max_fee_per_gas.to_be_bytes::<32>());
                out.extend_from_slice(&max_priority_fee_per_gas.to_be_bytes::<32>());
            }
        }
    }
}
