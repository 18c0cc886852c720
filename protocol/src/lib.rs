// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Polyledger Protocol -- Transaction Core
//!
//! The part of a multi-network wallet that actually touches the wire:
//! building, encoding, signing, decoding, comparing and tracking value
//! transfers for two very different ledgers.
//!
//! - **Ethereum-style** networks identify a transaction by its sender and
//!   nonce, encode it with RLP, and bind the chain id into the signed
//!   pre-image (EIP-155).
//! - **Hedera-style** networks identify a transaction by its paying account
//!   and a valid-start timestamp, and encode it as a nested length-prefixed
//!   protobuf envelope signed with Ed25519.
//!
//! ## Architecture
//!
//! - **config** -- Protocol constants: chain ids, gas margins, validity windows.
//! - **units** -- Ether / gas arithmetic. Overflow is an error, never a wrap.
//! - **crypto** -- Hashes, key material and signatures. Thin wrappers only.
//! - **ethereum** -- Network descriptor, RLP codec, status machine, transaction, account.
//! - **hedera** -- Addresses, timestamps, wire codec, transaction, account, wallet.
//!
//! ## What this crate does not do
//!
//! No transport, no persistence, no balance bookkeeping beyond a cached
//! number, no fee-market policy. Those are collaborators that consume the
//! encode/decode/sign surface exposed here.

pub mod config;
pub mod crypto;
pub mod ethereum;
pub mod hedera;
pub mod units;
