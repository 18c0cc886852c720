//! # Key Management
//!
//! Key material for both supported networks:
//!
//! - [`EthereumSigningKey`] -- a secp256k1 secret key. ECDSA with public-key
//!   recovery, which is how Ethereum avoids shipping a sender field.
//! - [`HederaKeypair`] -- an Ed25519 keypair, optionally derived from a
//!   BIP-39 phrase along the SLIP-10 path `m/44'/3030'/0'/0'/0'`.
//!
//! ## Security considerations
//!
//! - Neither key type implements `Serialize`. Exporting a secret should be
//!   a deliberate call to `secret_bytes()`, not a side effect of logging a
//!   struct.
//! - `Debug` output redacts the secret half.
//! - Key bytes are never logged.

use std::fmt;

use bip39::{Language, Mnemonic};
use ed25519_dalek::{Signer, SigningKey};
use ethereum_types::H160;
use rand::rngs::OsRng;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::hash::{hmac_sha512, keccak256};
use crate::config::{
    ED25519_PUBLIC_KEY_LENGTH, ED25519_SIGNATURE_LENGTH, ETHEREUM_ADDRESS_LENGTH,
    HEDERA_DERIVATION_PATH, KECCAK256_LENGTH, SLIP10_ED25519_SEED_KEY,
};

/// Hardened-child flag for BIP-32 / SLIP-10 indices.
const HARDENED: u32 = 0x8000_0000;

/// Errors that can occur during key operations.
///
/// Intentionally vague about *why* -- error messages are not a side channel
/// we want to maintain.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or out of range")]
    InvalidSecretKey,

    #[error("invalid public key bytes")]
    InvalidPublicKey,

    #[error("invalid BIP-39 mnemonic")]
    InvalidMnemonic,
}

// ---------------------------------------------------------------------------
// Ethereum (secp256k1)
// ---------------------------------------------------------------------------

/// A secp256k1 secret key used to sign Ethereum-style transactions.
#[derive(Clone)]
pub struct EthereumSigningKey {
    secret: SecretKey,
}

impl EthereumSigningKey {
    /// Generate a fresh key from the thread-local CSPRNG.
    pub fn generate() -> Self {
        Self {
            secret: SecretKey::new(&mut rand::thread_rng()),
        }
    }

    /// Load a key from its 32-byte big-endian scalar.
    ///
    /// Fails for zero and for values at or above the curve order.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, KeyError> {
        let secret = SecretKey::from_slice(bytes).map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self { secret })
    }

    /// Load a key from a hex string (with or without `0x`).
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let trimmed = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(trimmed).map_err(|_| KeyError::InvalidSecretKey)?;
        let array: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Self::from_bytes(&array)
    }

    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    /// The raw 32-byte secret. Handle with care.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.secret_bytes()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_secret_key(&Secp256k1::new(), &self.secret)
    }

    /// The Ethereum address controlled by this key.
    pub fn address(&self) -> H160 {
        address_from_public_key(&self.public_key())
    }
}

impl fmt::Debug for EthereumSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EthereumSigningKey")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Derive an Ethereum address: the last 20 bytes of the Keccak-256 digest
/// of the uncompressed public key, without its `0x04` prefix byte.
pub fn address_from_public_key(public_key: &PublicKey) -> H160 {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    H160::from_slice(&hash.as_bytes()[KECCAK256_LENGTH - ETHEREUM_ADDRESS_LENGTH..])
}

// ---------------------------------------------------------------------------
// Hedera (Ed25519)
// ---------------------------------------------------------------------------

/// The public half of a Hedera key. 32 raw bytes, exactly as they appear
/// in a signature map on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HederaPublicKey {
    bytes: [u8; ED25519_PUBLIC_KEY_LENGTH],
}

impl HederaPublicKey {
    pub fn from_bytes(bytes: [u8; ED25519_PUBLIC_KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidPublicKey)?;
        let array: [u8; ED25519_PUBLIC_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self::from_bytes(array))
    }

    pub fn as_bytes(&self) -> &[u8; ED25519_PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Debug for HederaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HederaPublicKey({})", self.to_hex())
    }
}

impl fmt::Display for HederaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// An Ed25519 keypair used to sign Hedera transaction bodies.
#[derive(Clone)]
pub struct HederaKeypair {
    signing_key: SigningKey,
}

impl HederaKeypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Use a 32-byte seed directly as the Ed25519 secret.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Derive the account key from a 64-byte BIP-39 seed along the Hedera
    /// SLIP-10 path.
    pub fn from_bip39_seed(seed: &[u8; 64]) -> Self {
        Self::from_seed(&slip10_derive_ed25519(seed, &HEDERA_DERIVATION_PATH))
    }

    /// Derive the account key from an English BIP-39 phrase with an empty
    /// passphrase.
    pub fn from_phrase(phrase: &str) -> Result<Self, KeyError> {
        Ok(Self::from_bip39_seed(&bip39_seed(phrase)?))
    }

    pub fn public_key(&self) -> HederaPublicKey {
        HederaPublicKey::from_bytes(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign `message`. Ed25519 is deterministic: same key, same message,
    /// same 64 bytes.
    pub fn sign(&self, message: &[u8]) -> [u8; ED25519_SIGNATURE_LENGTH] {
        self.signing_key.sign(message).to_bytes()
    }

    /// The raw 32-byte secret. Handle with care.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl fmt::Debug for HederaKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HederaKeypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Run BIP-39 (English wordlist, empty passphrase) and return the 64-byte seed.
pub fn bip39_seed(phrase: &str) -> Result<[u8; 64], KeyError> {
    let mnemonic =
        Mnemonic::parse_in(Language::English, phrase).map_err(|_| KeyError::InvalidMnemonic)?;
    Ok(mnemonic.to_seed_normalized(""))
}

/// SLIP-10 ed25519 derivation. Every index is treated as hardened because
/// ed25519 has no public derivation.
pub fn slip10_derive_ed25519(seed: &[u8], path: &[u32]) -> [u8; 32] {
    let master = hmac_sha512(SLIP10_ED25519_SEED_KEY, seed);
    let (mut key, mut chain_code) = split_node(&master);

    for index in path {
        let mut data = Vec::with_capacity(37);
        data.push(0x00);
        data.extend_from_slice(&key);
        data.extend_from_slice(&(index | HARDENED).to_be_bytes());
        let node = hmac_sha512(&chain_code, &data);
        (key, chain_code) = split_node(&node);
    }

    key
}

fn split_node(node: &[u8; 64]) -> ([u8; 32], [u8; 32]) {
    let mut key = [0u8; 32];
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&node[..32]);
    chain_code.copy_from_slice(&node[32..]);
    (key, chain_code)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ethereum_key_rejects_zero() {
        assert!(EthereumSigningKey::from_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn ethereum_key_hex_roundtrip() {
        let key = EthereumSigningKey::generate();
        let hex_str = format!("0x{}", hex::encode(key.secret_bytes()));
        let loaded = EthereumSigningKey::from_hex(&hex_str).unwrap();
        assert_eq!(key.address(), loaded.address());
    }

    #[test]
    fn ethereum_address_known_vector() {
        // Secret key 1 maps to the generator point; its address is well known.
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let key = EthereumSigningKey::from_bytes(&secret).unwrap();
        assert_eq!(
            hex::encode(key.address().as_bytes()),
            "7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn slip10_test_vector_1() {
        // SLIP-0010 ed25519 test vector 1, chain m/0'/1'/2'/2'/1000000000'.
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let key = slip10_derive_ed25519(&seed, &[0, 1, 2, 2, 1_000_000_000]);
        assert_eq!(
            hex::encode(key),
            "8f94d394a8e8fd6b1bc2f3f49f5c47e385281d5c17e65324b0f62483e37e8793"
        );
    }

    #[test]
    fn slip10_master_node() {
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let key = slip10_derive_ed25519(&seed, &[]);
        assert_eq!(
            hex::encode(key),
            "2b4be7f19ee27bbf30c667b642d5f4aa69fd169872f8fc3059c08ebae2eb19e7"
        );
    }

    #[test]
    fn hedera_keypair_is_deterministic_for_a_phrase() {
        let phrase = "patient doctor olympic frog force glimpse endless antenna online dragon bargain someone";
        let a = HederaKeypair::from_phrase(phrase).unwrap();
        let b = HederaKeypair::from_phrase(phrase).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.sign(b"msg"), b.sign(b"msg"));
    }

    #[test]
    fn hedera_keypair_rejects_garbage_phrase() {
        assert!(matches!(
            HederaKeypair::from_phrase("not a real mnemonic at all"),
            Err(KeyError::InvalidMnemonic)
        ));
    }

    #[test]
    fn hedera_public_key_hex_roundtrip() {
        let kp = HederaKeypair::generate();
        let pk = kp.public_key();
        assert_eq!(HederaPublicKey::from_hex(&pk.to_hex()).unwrap(), pk);
        assert!(HederaPublicKey::from_hex("abcd").is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let kp = HederaKeypair::generate();
        let secret_hex = hex::encode(kp.secret_bytes());
        assert!(!format!("{:?}", kp).contains(&secret_hex));

        let key = EthereumSigningKey::generate();
        let secret_hex = hex::encode(key.secret_bytes());
        assert!(!format!("{:?}", key).contains(&secret_hex));
    }
}
