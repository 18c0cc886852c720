//! # Cryptographic Primitives
//!
//! Hashes, key material and signatures for both networks. Everything here
//! is a thin, typed wrapper around audited crates (`secp256k1`,
//! `ed25519-dalek`, `sha2`, `sha3`, `hmac`, `bip39`). The transaction
//! modules call in; nothing in here knows what a transaction is.

pub mod hash;
pub mod keys;
pub mod signatures;

pub use hash::{hmac_sha512, keccak256, sha384};
pub use keys::{EthereumSigningKey, HederaKeypair, HederaPublicKey, KeyError};
pub use signatures::{
    recover_address, sign_recoverable, verify_ed25519, EthereumSignature, SignatureError,
};
