//! # Hashing Utilities
//!
//! The three digests the transaction core needs, and no more:
//!
//! - **Keccak-256** -- Ethereum transaction hashes, signing pre-images and
//!   address derivation. Note: this is the original Keccak padding, *not*
//!   NIST SHA3-256. Mixing them up produces valid-looking garbage.
//! - **SHA-384** -- Hedera transaction hashes.
//! - **HMAC-SHA512** -- SLIP-10 key derivation for Hedera accounts.

use ethereum_types::H256;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha384, Sha512};
use sha3::Keccak256;

use crate::config::HEDERA_HASH_LENGTH;

type HmacSha512 = Hmac<Sha512>;

/// Compute the Keccak-256 digest of `data`.
///
/// # Example
///
/// ```
/// use polyledger_protocol::crypto::keccak256;
///
/// // Keccak-256 of the empty string, a well-known constant.
/// let hash = keccak256(b"");
/// assert_eq!(
///     hex::encode(hash.as_bytes()),
///     "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
/// );
/// ```
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    H256::from_slice(&hasher.finalize())
}

/// Compute the SHA-384 digest of `data` as a fixed-size array.
pub fn sha384(data: &[u8]) -> [u8; HEDERA_HASH_LENGTH] {
    let mut hasher = Sha384::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; HEDERA_HASH_LENGTH];
    output.copy_from_slice(&result);
    output
}

/// Compute `HMAC-SHA512(key, data)`.
///
/// HMAC accepts keys of any length, so construction cannot fail in
/// practice; the fallback keeps the signature total anyway.
pub fn hmac_sha512(key: &[u8], data: &[u8]) -> [u8; 64] {
    let mut output = [0u8; 64];
    if let Ok(mut mac) = HmacSha512::new_from_slice(key) {
        mac.update(data);
        output.copy_from_slice(&mac.finalize().into_bytes());
    }
    output
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
