//! Error types for Hedera-style transactions.
//!
//! Every fallible operation in [`crate::hedera`] returns a [`HederaError`].
//! Decoding failures split three ways so callers can tell "not parseable"
//! apart from "parseable but not a transfer we understand":
//!
//! - [`HederaError::Malformed`] -- the bytes are not a well-formed envelope.
//! - [`HederaError::TransferShape`] -- well-formed, wrong number or kind of
//!   transfer entries.
//! - [`HederaError::UnbalancedTransfer`] -- well-formed, but debits and
//!   credits do not cancel out.

use thiserror::Error;

use super::address::HederaAddress;
use super::proto::ProtoError;
use crate::crypto::keys::KeyError;

/// Errors that can occur while building, signing or decoding a Hedera
/// transaction.
#[derive(Debug, Error)]
pub enum HederaError {
    /// An address string was not `shard.realm.num`.
    #[error("invalid account address `{input}`: {reason}")]
    InvalidAddress {
        /// The rejected input.
        input: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// A transaction id string was not `shard.realm.num-seconds-nanos`.
    #[error("invalid transaction id `{input}`: {reason}")]
    InvalidTransactionId {
        /// The rejected input.
        input: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// Nanoseconds outside `0..1_000_000_000`, or a negative second count.
    #[error("invalid timestamp {seconds}s {nanos}ns")]
    InvalidTimestamp { seconds: i64, nanos: i32 },

    /// Transfer amounts are tinybar credits and cannot be negative.
    #[error("invalid transfer amount {amount}")]
    InvalidAmount { amount: i64 },

    /// The bytes do not decode as a transaction envelope.
    #[error("malformed transaction encoding: {0}")]
    Malformed(#[from] ProtoError),

    /// The envelope decoded but is missing a piece a signed transfer needs.
    #[error("incomplete transaction: missing {0}")]
    MissingField(&'static str),

    /// The transfer list does not have exactly one debit and one credit.
    #[error("unexpected transfer list shape: {0}")]
    TransferShape(String),

    /// The transfer list does not sum to zero.
    #[error("transfer list does not balance: amounts sum to {sum}")]
    UnbalancedTransfer {
        /// The sum of all entries, widened so it cannot itself overflow.
        sum: i128,
    },

    /// The debited account is not the account paying for the transaction.
    #[error("transfer debits {source_account} but {payer} pays for it")]
    PayerMismatch {
        payer: HederaAddress,
        source_account: HederaAddress,
    },

    /// The transaction already has a hash, either from signing or from
    /// reconstruction. Hashes are never replaced.
    #[error("transaction {transaction_id} already has an identity")]
    AlreadyIdentified {
        /// Display form of the existing transaction id, or `"<unknown>"`.
        transaction_id: String,
    },

    /// Serialization was requested before signing.
    #[error("transaction has not been signed")]
    NotSigned,

    /// The public key passed to `sign` does not belong to the signing key.
    #[error("public key does not match the signing key")]
    KeyMismatch,

    /// Key derivation failed.
    #[error("key error: {0}")]
    Key(#[from] KeyError),
}
