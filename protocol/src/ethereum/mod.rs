//! # Ethereum-style Networks
//!
//! Account/nonce ledgers that encode transactions with RLP and bind the
//! chain id into the signature (EIP-155).
//!
//! ## Modules
//!
//! - [`network`] -- Chain identity passed to every encode/decode call.
//! - [`rlp`] -- The unsigned pre-image and the signed broadcast form.
//! - [`status`] -- Created / submitted / included / errored.
//! - [`transaction`] -- The transaction itself: fields, fees, signing.
//! - [`account`] -- Key ownership and nonce assignment.

pub mod account;
pub mod network;
pub mod rlp;
pub mod status;
pub mod transaction;

pub use account::{AccountError, EthereumAccount};
pub use network::EthereumNetwork;
pub use self::rlp::{RlpError, RlpPurpose};
pub use status::{Inclusion, StatusError, TransactionStatus};
pub use transaction::EthereumTransaction;

/// A 20-byte account address.
pub type EthereumAddress = ethereum_types::H160;

/// A 32-byte Keccak-256 hash.
pub type EthereumHash = ethereum_types::H256;
