//! # Ethereum Account
//!
//! The owner of a secp256k1 key and of the nonce sequence that goes with
//! it. Nonce assignment is deliberately funneled through here: a
//! transaction's nonce can only be set by the account whose address is the
//! transaction's source.
//!
//! ## Nonce Model
//!
//! `next_nonce` is the nonce the *next* signed transaction will carry.
//! It advances only after a successful signature, so a failed signing
//! attempt never burns a nonce.

use ethereum_types::H160;
use thiserror::Error;
use tracing::{debug, info};

use super::network::EthereumNetwork;
use super::transaction::EthereumTransaction;
use crate::crypto::keys::EthereumSigningKey;
use crate::crypto::signatures::SignatureError;
use crate::units::{Ether, Gas, GasPrice};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AccountError {
    /// The transaction spends from somebody else's address.
    #[error("transaction source {source_address:?} is not this account ({account:?})")]
    SourceMismatch { source_address: H160, account: H160 },

    #[error("signing failed: {0}")]
    Signature(#[from] SignatureError),

    /// Every nonce up to `u64::MAX` has been used.
    #[error("nonce space exhausted")]
    NonceExhausted,
}

// ---------------------------------------------------------------------------
// EthereumAccount
// ---------------------------------------------------------------------------

/// A signing key plus its address and nonce counter.
#[derive(Debug)]
pub struct EthereumAccount {
    key: EthereumSigningKey,
    address: H160,
    next_nonce: u64,
}

impl EthereumAccount {
    /// A fresh account with a random key and nonce 0.
    pub fn generate() -> Self {
        Self::new(EthereumSigningKey::generate())
    }

    /// Wrap an existing key. The nonce starts at 0; use
    /// [`with_next_nonce`](Self::with_next_nonce) for an account that has
    /// already transacted.
    pub fn new(key: EthereumSigningKey) -> Self {
        let address = key.address();
        info!(address = ?address, "ethereum account loaded");
        Self {
            key,
            address,
            next_nonce: 0,
        }
    }

    /// Resume the nonce sequence, typically from the node's transaction
    /// count for this address.
    pub fn with_next_nonce(mut self, next_nonce: u64) -> Self {
        self.next_nonce = next_nonce;
        self
    }

    pub fn address(&self) -> H160 {
        self.address
    }

    pub fn next_nonce(&self) -> u64 {
        self.next_nonce
    }

    /// Build an unsigned transfer from this account, provisionally carrying
    /// the next nonce. The nonce is confirmed at signing time.
    pub fn create_transaction(
        &self,
        target: H160,
        amount: Ether,
        gas_price: GasPrice,
        gas_limit: Gas,
        data: impl Into<Vec<u8>>,
    ) -> EthereumTransaction {
        EthereumTransaction::new(
            self.address,
            target,
            amount,
            gas_price,
            gas_limit,
            data,
            self.next_nonce,
        )
    }

    /// Assign the next nonce to `tx`, sign it for `network`, and advance
    /// the sequence.
    pub fn sign_transaction(
        &mut self,
        tx: &mut EthereumTransaction,
        network: &EthereumNetwork,
    ) -> Result<(), AccountError> {
        if tx.source() != self.address {
            return Err(AccountError::SourceMismatch {
                source_address: tx.source(),
                account: self.address,
            });
        }
        let following = self
            .next_nonce
            .checked_add(1)
            .ok_or(AccountError::NonceExhausted)?;

        tx.set_nonce(self.next_nonce);
        tx.sign_with_key(network, &self.key)?;
        self.next_nonce = following;

        debug!(
            address = ?self.address,
            nonce = tx.nonce(),
            next_nonce = self.next_nonce,
            "account signed transaction"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
