//! # Digital Signatures
//!
//! Two schemes, one per network:
//!
//! - **secp256k1 ECDSA with recovery** for Ethereum. The signature carries a
//!   recovery id so the sender's address can be recomputed from
//!   `(signature, message)` alone. We keep it in the classic `(v, r, s)`
//!   shape with `v = 27 + recovery_id`; chain-id folding (EIP-155) is an
//!   encoding concern and lives in the RLP codec.
//! - **Ed25519** for Hedera. Plain sign/verify over the body bytes.

use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};
use ethereum_types::{H160, H256};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::keys::{address_from_public_key, EthereumSigningKey, HederaPublicKey};
use crate::config::{
    ED25519_SIGNATURE_LENGTH, SECP256K1_COMPACT_SIGNATURE_LENGTH, SIGNATURE_V_OFFSET,
};

/// Errors during signature operations.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// `v` is not a recovery id (`0`/`1`) or `27`/`28`.
    #[error("invalid recovery value v={v}")]
    InvalidRecoveryId { v: u8 },

    /// `(r, s)` is not a valid secp256k1 signature.
    #[error("malformed signature components")]
    Malformed,

    /// No public key could be recovered from the signature and message.
    #[error("public key recovery failed")]
    RecoveryFailed,
}

// ---------------------------------------------------------------------------
// EthereumSignature
// ---------------------------------------------------------------------------

/// A recoverable secp256k1 signature in `(v, r, s)` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EthereumSignature {
    /// `27 + recovery_id`.
    pub v: u8,
    /// Big-endian `r` scalar.
    pub r: [u8; 32],
    /// Big-endian `s` scalar.
    pub s: [u8; 32],
}

impl EthereumSignature {
    pub fn new(v: u8, r: [u8; 32], s: [u8; 32]) -> Self {
        Self { v, r, s }
    }

    /// The secp256k1 recovery id, `v - 27`.
    pub fn recovery_id(&self) -> Result<u8, SignatureError> {
        match self.v.checked_sub(SIGNATURE_V_OFFSET) {
            Some(id @ (0 | 1)) => Ok(id),
            _ => Err(SignatureError::InvalidRecoveryId { v: self.v }),
        }
    }

    /// Bring `v` into the `27 + recovery_id` form stored on transactions.
    ///
    /// Accepts a bare recovery id (`0`/`1`, what most external signers
    /// return) as well as `27`/`28`. Anything else, including an EIP-155
    /// `v` that still has a chain id folded in, is rejected.
    pub fn normalized(self) -> Result<Self, SignatureError> {
        let v = match self.v {
            0 | 1 => SIGNATURE_V_OFFSET + self.v,
            _ => self.v,
        };
        let normalized = Self { v, ..self };
        normalized.recovery_id()?;
        Ok(normalized)
    }

    fn to_recoverable(self) -> Result<RecoverableSignature, SignatureError> {
        let recovery_id = RecoveryId::from_i32(i32::from(self.recovery_id()?))
            .map_err(|_| SignatureError::InvalidRecoveryId { v: self.v })?;
        let mut compact = [0u8; SECP256K1_COMPACT_SIGNATURE_LENGTH];
        compact[..32].copy_from_slice(&self.r);
        compact[32..].copy_from_slice(&self.s);
        RecoverableSignature::from_compact(&compact, recovery_id)
            .map_err(|_| SignatureError::Malformed)
    }
}

/// Sign a 32-byte digest, producing a recoverable `(v, r, s)` signature.
///
/// secp256k1 uses RFC 6979 nonces, so signing is deterministic for a given
/// key and digest.
pub fn sign_recoverable(
    key: &EthereumSigningKey,
    digest: &H256,
) -> Result<EthereumSignature, SignatureError> {
    let message =
        Message::from_digest_slice(digest.as_bytes()).map_err(|_| SignatureError::Malformed)?;
    let signature = Secp256k1::new().sign_ecdsa_recoverable(&message, key.secret_key());
    let (recovery_id, compact) = signature.serialize_compact();

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[..32]);
    s.copy_from_slice(&compact[32..]);

    // Recovery ids for secp256k1 ECDSA are always 0..=3; 2 and 3 only occur
    // for r >= n, which libsecp256k1 never produces.
    let v = SIGNATURE_V_OFFSET + recovery_id.to_i32() as u8;
    Ok(EthereumSignature::new(v, r, s))
}

/// Recover the address that produced `signature` over `digest`.
pub fn recover_address(
    signature: &EthereumSignature,
    digest: &H256,
) -> Result<H160, SignatureError> {
    let recoverable = signature.to_recoverable()?;
    let message =
        Message::from_digest_slice(digest.as_bytes()).map_err(|_| SignatureError::Malformed)?;
    let public_key = Secp256k1::new()
        .recover_ecdsa(&message, &recoverable)
        .map_err(|_| SignatureError::RecoveryFailed)?;
    Ok(address_from_public_key(&public_key))
}

// ---------------------------------------------------------------------------
// Ed25519
// ---------------------------------------------------------------------------

/// Verify an Ed25519 signature. Any failure, including a public key that is
/// not a valid curve point, is just `false`.
pub fn verify_ed25519(
    public_key: &HederaPublicKey,
    message: &[u8],
    signature: &[u8; ED25519_SIGNATURE_LENGTH],
) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key.as_bytes()) else {
        return false;
    };
    verifying_key
        .verify(message, &DalekSignature::from_bytes(signature))
        .is_ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
