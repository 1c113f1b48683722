//! Signature recovery seam: the pool core never performs ECDSA math
//! directly, it goes through a [`SignatureRecovery`] implementation,
//! keeping signed bytes separate from a recovered sender.

use alloy_primitives::{keccak256, Address, B256};

/// `r || s || v`, 65 bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 65]);

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature(0x{})", hex_encode(&self.0))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("invalid signature")]
    InvalidSignature,
}

/// Recovers the signing address from a signing hash and a 65-byte
/// signature. Implemented once over `secp256k1` for production use;
/// test doubles can implement this trait directly to avoid the cost of
/// real ECDSA signing in unit tests.
pub trait SignatureRecovery: Send + Sync + std::fmt::Debug {
    fn recover(&self, signing_hash: B256, signature: &Signature) -> Result<Address, RecoveryError>;
}

/// Production recovery backed by `secp256k1`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Secp256k1Recovery;

impl SignatureRecovery for Secp256k1Recovery {
    fn recover(&self, signing_hash: B256, signature: &Signature) -> Result<Address, RecoveryError> {
        use secp256k1::{
            ecdsa::{RecoverableSignature, RecoveryId},
            Message, SECP256K1,
        };

        let recovery_id =
            RecoveryId::from_i32(signature.0[64] as i32).map_err(|_| RecoveryError::InvalidSignature)?;
        let recoverable = RecoverableSignature::from_compact(&signature.0[..64], recovery_id)
            .map_err(|_| RecoveryError::InvalidSignature)?;
        let message =
            Message::from_digest_slice(signing_hash.as_slice()).map_err(|_| RecoveryError::InvalidSignature)?;
        let public_key = SECP256K1
            .recover_ecdsa(&message, &recoverable)
            .map_err(|_| RecoveryError::InvalidSignature)?;

        Ok(public_key_to_address(&public_key))
    }
}

fn public_key_to_address(public_key: &secp256k1::PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    Address::from_slice(&hash[12..])
}
