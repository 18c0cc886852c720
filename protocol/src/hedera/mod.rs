//! # Hedera-style Networks
//!
//! Account/timestamp ledgers. Accounts are `shard.realm.num` triples
//! assigned by the network, transactions are identified by paying account
//! plus valid-start time, and the wire format is a protobuf envelope signed
//! with Ed25519.
//!
//! ## Modules
//!
//! - [`address`] -- `shard.realm.num` account addresses.
//! - [`timestamp`] -- Valid-start timestamps.
//! - [`transaction_id`] -- `shard.realm.num-seconds-nanos` identities.
//! - [`proto`] -- The protobuf subset the envelope needs.
//! - [`transaction`] -- Build, sign, serialize, deserialize.
//! - [`account`] -- Key derivation and address assignment.
//! - [`wallet`] -- Default addressing and a cached balance.
//! - [`error`] -- [`HederaError`].

pub mod account;
pub mod address;
pub mod error;
pub mod proto;
pub mod timestamp;
pub mod transaction;
pub mod transaction_id;
pub mod wallet;

pub use account::HederaAccount;
pub use address::HederaAddress;
pub use error::HederaError;
pub use proto::ProtoError;
pub use timestamp::HederaTimestamp;
pub use transaction::HederaTransaction;
pub use transaction_id::HederaTransactionId;
pub use wallet::HederaWallet;
