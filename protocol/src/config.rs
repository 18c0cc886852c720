//! # Protocol Configuration & Constants
//!
//! Every magic number the transaction core depends on lives here. Most of
//! them are dictated by the networks themselves, not by us: change one and
//! the reference vectors stop matching, which is the point of keeping them
//! all in one place.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Ethereum Network Identifiers
// ---------------------------------------------------------------------------

/// Ethereum mainnet chain id (EIP-155).
pub const CHAIN_ID_MAINNET: u64 = 1;

/// Ropsten testnet chain id.
pub const CHAIN_ID_ROPSTEN: u64 = 3;

/// Rinkeby testnet chain id.
pub const CHAIN_ID_RINKEBY: u64 = 4;

// ---------------------------------------------------------------------------
// Gas Parameters
// ---------------------------------------------------------------------------

/// Margin applied on top of a node-supplied gas estimate when choosing a
/// gas limit. Estimates are taken against the current state, and the state
/// moves before inclusion.
pub const GAS_LIMIT_MARGIN_PERCENT: u64 = 20;

/// Gas consumed by a plain value transfer with no data payload.
pub const DEFAULT_TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Wei per gwei. Gas prices are quoted in gwei by everyone, stored in wei by us.
pub const WEI_PER_GWEI: u64 = 1_000_000_000;

/// Wei per ether, as a power of ten.
pub const ETHER_DECIMALS: u32 = 18;

// ---------------------------------------------------------------------------
// Signature Parameters
// ---------------------------------------------------------------------------

/// Offset added to the secp256k1 recovery id in the (v, r, s) triple.
pub const SIGNATURE_V_OFFSET: u8 = 27;

/// EIP-155 offset: `v = recovery_id + 35 + 2 * chain_id`.
pub const EIP155_V_OFFSET: u64 = 35;

/// Recoverable secp256k1 signature length (r || s) in bytes.
pub const SECP256K1_COMPACT_SIGNATURE_LENGTH: usize = 64;

/// Ed25519 public key length in bytes.
pub const ED25519_PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 signature length in bytes.
pub const ED25519_SIGNATURE_LENGTH: usize = 64;

// ---------------------------------------------------------------------------
// Hash Lengths
// ---------------------------------------------------------------------------

/// Keccak-256 output, used for Ethereum transaction hashes and addresses.
pub const KECCAK256_LENGTH: usize = 32;

/// SHA-384 output, used for Hedera transaction hashes.
pub const HEDERA_HASH_LENGTH: usize = 48;

/// Ethereum address length: the trailing 20 bytes of a Keccak-256 digest.
pub const ETHEREUM_ADDRESS_LENGTH: usize = 20;

// ---------------------------------------------------------------------------
// Hedera Parameters
// ---------------------------------------------------------------------------

/// How long after its valid-start timestamp a Hedera transaction may still
/// reach consensus. Serialized into every transaction body.
pub const HEDERA_TRANSACTION_VALID_DURATION: Duration = Duration::from_secs(120);

/// Default fee bound, in tinybar, when the caller has no better number.
pub const HEDERA_DEFAULT_FEE_BOUND: u64 = 100_000;

/// Tinybar per hbar.
pub const TINYBAR_PER_HBAR: i64 = 100_000_000;

/// SLIP-0044 coin type registered for Hedera.
pub const HEDERA_COIN_TYPE: u32 = 3030;

/// Hardened derivation path from the BIP-39 seed to the account key:
/// `m/44'/3030'/0'/0'/0'`. SLIP-10 ed25519 only supports hardened children.
pub const HEDERA_DERIVATION_PATH: [u32; 5] = [44, HEDERA_COIN_TYPE, 0, 0, 0];

/// HMAC key for the SLIP-10 ed25519 master node.
pub const SLIP10_ED25519_SEED_KEY: &[u8] = b"ed25519 seed";

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Returns a friendly name for an Ethereum chain id, mainly for logging.
pub fn network_name(chain_id: u64) -> String {
    match chain_id {
        CHAIN_ID_MAINNET => "mainnet".to_string(),
        CHAIN_ID_ROPSTEN => "ropsten".to_string(),
        CHAIN_ID_RINKEBY => "rinkeby".to_string(),
        other => format!("unknown({})", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_ids_are_distinct() {
        assert_ne!(CHAIN_ID_MAINNET, CHAIN_ID_ROPSTEN);
        assert_ne!(CHAIN_ID_MAINNET, CHAIN_ID_RINKEBY);
        assert_ne!(CHAIN_ID_ROPSTEN, CHAIN_ID_RINKEBY);
    }

    #[test]
    fn test_network_name_formatting() {
        assert_eq!(network_name(CHAIN_ID_MAINNET), "mainnet");
        assert_eq!(network_name(CHAIN_ID_RINKEBY), "rinkeby");
        assert_eq!(network_name(1337), "unknown(1337)");
    }

    #[test]
    fn test_hedera_validity_window() {
        // The reference vectors were produced with a two-minute window.
        assert_eq!(HEDERA_TRANSACTION_VALID_DURATION.as_secs(), 120);
    }

    #[test]
    fn test_derivation_path_uses_hedera_coin_type() {
        assert_eq!(HEDERA_DERIVATION_PATH[0], 44);
        assert_eq!(HEDERA_DERIVATION_PATH[1], 3030);
        assert_eq!(HEDERA_DERIVATION_PATH.len(), 5);
    }

    #[test]
    fn test_hash_lengths() {
        assert_eq!(KECCAK256_LENGTH, 32);
        assert_eq!(HEDERA_HASH_LENGTH, 48);
        assert!(ETHEREUM_ADDRESS_LENGTH < KECCAK256_LENGTH);
    }
}
