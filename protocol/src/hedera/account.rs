//! # Hedera Account
//!
//! An Ed25519 key derived from seed material, plus the network address
//! assigned to it. On Hedera the address is not a function of the key:
//! accounts are created on-chain and the network hands back `shard.realm.num`,
//! so the address starts unset and is filled in with [`HederaAccount::set_address`].

use tracing::{debug, info};

use super::address::HederaAddress;
use super::error::HederaError;
use super::timestamp::HederaTimestamp;
use super::transaction::HederaTransaction;
use crate::crypto::keys::{bip39_seed, HederaKeypair, HederaPublicKey};

/// A Hedera key and its (eventually) assigned account address.
#[derive(Debug, Clone)]
pub struct HederaAccount {
    key: HederaKeypair,
    address: Option<HederaAddress>,
}

impl HederaAccount {
    /// Derive the account key from a 64-byte BIP-39 seed along
    /// `m/44'/3030'/0'/0'/0'`.
    pub fn create_with_seed(seed: &[u8; 64]) -> Self {
        let key = HederaKeypair::from_bip39_seed(seed);
        info!(public_key = %key.public_key(), "hedera account derived");
        Self { key, address: None }
    }

    /// Derive the account key from an English BIP-39 phrase with an empty
    /// passphrase.
    pub fn create_with_phrase(phrase: &str) -> Result<Self, HederaError> {
        let seed = bip39_seed(phrase)?;
        Ok(Self::create_with_seed(&seed))
    }

    pub fn public_key(&self) -> HederaPublicKey {
        self.key.public_key()
    }

    pub fn set_address(&mut self, address: HederaAddress) {
        debug!(
            public_key = %self.key.public_key(),
            address = %address,
            "hedera account address set"
        );
        self.address = Some(address);
    }

    /// The network-assigned address, once known.
    pub fn address(&self) -> Option<HederaAddress> {
        self.address
    }

    /// Sign `tx` with this account's key.
    pub fn sign_transaction(
        &self,
        tx: &mut HederaTransaction,
        node: HederaAddress,
        valid_start: HederaTimestamp,
        fee_bound: u64,
    ) -> Result<(), HederaError> {
        tx.sign(&self.key.public_key(), node, valid_start, fee_bound, &self.key)
    }
}
