//! Per-account wallet state: default addressing and a cached balance.
//!
//! The balance here is whatever the caller last fetched from the network.
//! Nothing in this crate updates it on its own.

use serde::{Deserialize, Serialize};

use super::account::HederaAccount;
use super::address::HederaAddress;
use super::error::HederaError;
use super::transaction::HederaTransaction;

/// A wallet bound to one Hedera account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HederaWallet {
    /// Both the default source and the default target. A Hedera wallet
    /// sends from and receives to its own account.
    address: Option<HederaAddress>,
    /// Cached balance in tinybar.
    balance: i64,
}

impl HederaWallet {
    pub fn new(account: &HederaAccount) -> Self {
        Self {
            address: account.address(),
            balance: 0,
        }
    }

    pub fn source_address(&self) -> Option<HederaAddress> {
        self.address
    }

    pub fn target_address(&self) -> Option<HederaAddress> {
        self.address
    }

    pub fn set_balance(&mut self, balance: i64) {
        self.balance = balance;
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// An unsigned transfer of `amount` tinybar from this wallet to `target`.
    pub fn create_transaction(
        &self,
        target: HederaAddress,
        amount: i64,
    ) -> Result<HederaTransaction, HederaError> {
        let source = self
            .source_address()
            .ok_or(HederaError::MissingField("wallet address"))?;
        Ok(HederaTransaction::create_new(source, target, amount))
    }
}
