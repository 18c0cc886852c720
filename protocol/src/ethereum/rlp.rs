//! RLP wire format for Ethereum-style transactions.
//!
//! Both encodings are a nine-item list. The first six items are the same:
//!
//! ```text
//! [ nonce, gasPrice, gasLimit, to, value, data, ... ]
//! ```
//!
//! followed by either the EIP-155 replay-protection placeholders
//! `chainId, 0, 0` (the pre-image that gets hashed and signed), or the
//! signature `v, r, s` with `v = recovery_id + 35 + 2 * chainId` (the bytes
//! that get broadcast). The chain id is therefore part of every encoding,
//! which is why every call here takes an [`EthereumNetwork`].
//!
//! Signed payloads from before EIP-155 carry `v = 27 + recovery_id` and were
//! signed over the bare six-item body. Those decode as legacy transactions
//! and re-encode with their original `v`.

use std::fmt;

use ethereum_types::{H160, U256};
use rlp::{Decodable, DecoderError, Rlp, RlpStream};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::network::EthereumNetwork;
use super::transaction::EthereumTransaction;
use crate::config::{EIP155_V_OFFSET, ETHEREUM_ADDRESS_LENGTH, SIGNATURE_V_OFFSET};
use crate::crypto::hash::keccak256;
use crate::crypto::signatures::{recover_address, EthereumSignature, SignatureError};
use crate::units::{Ether, Gas, GasPrice};

/// Items in both the unsigned and the signed list.
pub const TRANSACTION_FIELD_COUNT: usize = 9;

/// Items in the pre-EIP-155 signing pre-image.
const LEGACY_PREIMAGE_FIELD_COUNT: usize = 6;

// ---------------------------------------------------------------------------
// RlpPurpose
// ---------------------------------------------------------------------------

/// Which of the two encodings to produce or expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RlpPurpose {
    /// The signing pre-image: body plus `chainId, 0, 0`.
    Unsigned,
    /// The broadcast form: body plus `v, r, s`.
    Signed,
}

impl fmt::Display for RlpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsigned => f.write_str("unsigned"),
            Self::Signed => f.write_str("signed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Encoding and decoding failures.
///
/// `Malformed` means the bytes are not parseable RLP at all (corrupt length
/// prefix, truncated item, trailing garbage). The remaining decode variants
/// mean the RLP parsed fine but does not describe a valid transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RlpError {
    #[error("malformed RLP: {reason}")]
    Malformed { reason: String },

    #[error("{purpose} transaction must have {expected} fields, found {found}")]
    FieldCount {
        purpose: RlpPurpose,
        expected: usize,
        found: usize,
    },

    #[error("field `{field}` exceeds its representable range")]
    ValueOutOfRange { field: &'static str },

    #[error("target address must be {ETHEREUM_ADDRESS_LENGTH} bytes, found {length}")]
    InvalidAddress { length: usize },

    #[error("encoded for chain id {found}, expected {expected}")]
    ChainIdMismatch { expected: u64, found: u64 },

    #[error("signature v={v} is not valid for chain id {chain_id}")]
    InvalidV { v: u64, chain_id: u64 },

    #[error("signed encoding requested for an unsigned transaction")]
    MissingSignature,

    #[error(transparent)]
    Signature(#[from] SignatureError),
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode `tx` for `network`. Only the signed form can fail: when there is
/// no signature to encode, or its `v` is not a recovery id.
pub(crate) fn encode_transaction(
    tx: &EthereumTransaction,
    network: &EthereumNetwork,
    purpose: RlpPurpose,
) -> Result<Vec<u8>, RlpError> {
    match purpose {
        RlpPurpose::Unsigned => Ok(encode_unsigned(tx, network)),
        RlpPurpose::Signed => {
            let signature = tx.signature().ok_or(RlpError::MissingSignature)?;
            Ok(encode_signed(tx, network, signature)?)
        }
    }
}

/// The broadcast form with `signature` in the `v, r, s` slots.
pub(crate) fn encode_signed(
    tx: &EthereumTransaction,
    network: &EthereumNetwork,
    signature: &EthereumSignature,
) -> Result<Vec<u8>, SignatureError> {
    let v = wire_v(signature, network, tx.is_replay_protected())?;
    let mut stream = RlpStream::new_list(TRANSACTION_FIELD_COUNT);
    append_body(&mut stream, tx);
    stream.append(&v);
    stream.append(&U256::from_big_endian(&signature.r));
    stream.append(&U256::from_big_endian(&signature.s));
    Ok(stream.out().to_vec())
}

/// The signing pre-image. Infallible: every transaction has one.
pub(crate) fn encode_unsigned(tx: &EthereumTransaction, network: &EthereumNetwork) -> Vec<u8> {
    let mut stream = RlpStream::new_list(TRANSACTION_FIELD_COUNT);
    append_body(&mut stream, tx);
    stream.append(&network.chain_id());
    stream.append(&0u8);
    stream.append(&0u8);
    stream.out().to_vec()
}

/// The pre-EIP-155 signing pre-image: the six body items and nothing else.
pub(crate) fn encode_legacy_unsigned(tx: &EthereumTransaction) -> Vec<u8> {
    let mut stream = RlpStream::new_list(LEGACY_PREIMAGE_FIELD_COUNT);
    append_body(&mut stream, tx);
    stream.out().to_vec()
}

fn append_body(stream: &mut RlpStream, tx: &EthereumTransaction) {
    stream.append(&tx.nonce());
    stream.append(&tx.gas_price().per_gas().as_wei());
    stream.append(&tx.gas_limit().amount());
    stream.append(&tx.target());
    stream.append(&tx.amount().as_wei());
    stream.append(&tx.data().to_vec());
}

/// `v` as broadcast: `recovery_id + 35 + 2 * chainId`, or `27 + recovery_id`
/// for a legacy transaction. Saturates for chain ids no real network uses.
fn wire_v(
    signature: &EthereumSignature,
    network: &EthereumNetwork,
    replay_protected: bool,
) -> Result<u64, SignatureError> {
    let recovery_id = u64::from(signature.recovery_id()?);
    if !replay_protected {
        return Ok(u64::from(SIGNATURE_V_OFFSET) + recovery_id);
    }
    Ok(network
        .chain_id()
        .saturating_mul(2)
        .saturating_add(EIP155_V_OFFSET)
        .saturating_add(recovery_id))
}

fn is_legacy_v(v: u64) -> bool {
    v == u64::from(SIGNATURE_V_OFFSET) || v == u64::from(SIGNATURE_V_OFFSET) + 1
}

/// Invert [`wire_v`]. Pre-EIP-155 `27`/`28` is accepted as-is.
fn recovery_id_from_v(v: u64, network: &EthereumNetwork) -> Result<u8, RlpError> {
    if is_legacy_v(v) {
        return Ok((v - u64::from(SIGNATURE_V_OFFSET)) as u8);
    }
    let base = network
        .chain_id()
        .checked_mul(2)
        .and_then(|doubled| doubled.checked_add(EIP155_V_OFFSET));
    match base.and_then(|base| v.checked_sub(base)) {
        Some(id @ (0 | 1)) => Ok(id as u8),
        _ => Err(RlpError::InvalidV {
            v,
            chain_id: network.chain_id(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode `bytes` as a `purpose` transaction for `network`.
///
/// A signed payload yields the attached signature, a source address
/// recovered from it (the zero address if recovery fails), and a hash equal
/// to Keccak-256 of `bytes`. The signature itself is not checked against
/// anything. A `v` of `27`/`28` marks a legacy transaction: the signer is
/// recovered from the six-item pre-image and re-encoding keeps that `v`.
pub(crate) fn decode_transaction(
    bytes: &[u8],
    network: &EthereumNetwork,
    purpose: RlpPurpose,
) -> Result<EthereumTransaction, RlpError> {
    let rlp = Rlp::new(bytes);
    if !rlp.is_list() {
        return Err(RlpError::Malformed {
            reason: "expected a list".to_string(),
        });
    }

    let info = rlp.payload_info().map_err(malformed("list header"))?;
    if info.total() != bytes.len() {
        return Err(RlpError::Malformed {
            reason: format!(
                "list spans {} bytes but input has {}",
                info.total(),
                bytes.len()
            ),
        });
    }

    let found = rlp.item_count().map_err(malformed("list items"))?;
    if found != TRANSACTION_FIELD_COUNT {
        return Err(RlpError::FieldCount {
            purpose,
            expected: TRANSACTION_FIELD_COUNT,
            found,
        });
    }

    let nonce: u64 = field(&rlp, 0, "nonce")?;
    let gas_price: U256 = field(&rlp, 1, "gas price")?;
    let gas_limit: u64 = field(&rlp, 2, "gas limit")?;
    let target_bytes: Vec<u8> = field(&rlp, 3, "target")?;
    let amount: U256 = field(&rlp, 4, "amount")?;
    let data: Vec<u8> = field(&rlp, 5, "data")?;

    if target_bytes.len() != ETHEREUM_ADDRESS_LENGTH {
        return Err(RlpError::InvalidAddress {
            length: target_bytes.len(),
        });
    }
    let target = H160::from_slice(&target_bytes);

    let build = |source: H160| {
        EthereumTransaction::new(
            source,
            target,
            Ether::from_wei(amount),
            GasPrice::new(Ether::from_wei(gas_price)),
            Gas::new(gas_limit),
            data.clone(),
            nonce,
        )
    };

    match purpose {
        RlpPurpose::Unsigned => {
            let chain_id: u64 = field(&rlp, 6, "chain id")?;
            if chain_id != network.chain_id() {
                return Err(RlpError::ChainIdMismatch {
                    expected: network.chain_id(),
                    found: chain_id,
                });
            }
            let r: u64 = field(&rlp, 7, "r placeholder")?;
            let s: u64 = field(&rlp, 8, "s placeholder")?;
            if r != 0 || s != 0 {
                return Err(RlpError::Malformed {
                    reason: "non-zero replay-protection placeholder".to_string(),
                });
            }
            debug!(nonce, chain_id, "decoded unsigned transaction");
            Ok(build(H160::zero()))
        }
        RlpPurpose::Signed => {
            let v: u64 = field(&rlp, 6, "v")?;
            let r: U256 = field(&rlp, 7, "r")?;
            let s: U256 = field(&rlp, 8, "s")?;

            let recovery_id = recovery_id_from_v(v, network)?;
            let legacy = is_legacy_v(v);
            let mut r_bytes = [0u8; 32];
            let mut s_bytes = [0u8; 32];
            r.to_big_endian(&mut r_bytes);
            s.to_big_endian(&mut s_bytes);
            let signature =
                EthereumSignature::new(SIGNATURE_V_OFFSET + recovery_id, r_bytes, s_bytes);

            let unsigned = build(H160::zero());
            let preimage = if legacy {
                encode_legacy_unsigned(&unsigned)
            } else {
                encode_unsigned(&unsigned, network)
            };
            let source =
                recover_address(&signature, &keccak256(&preimage)).unwrap_or_else(|err| {
                    warn!(nonce, error = %err, "could not recover signer of decoded transaction");
                    H160::zero()
                });

            let mut tx = build(source);
            tx.sign(signature).map_err(|_| RlpError::InvalidV {
                v,
                chain_id: network.chain_id(),
            })?;
            if legacy {
                tx.set_replay_protected(false);
            }
            tx.set_hash(keccak256(bytes));
            debug!(
                nonce,
                chain_id = network.chain_id(),
                source = ?source,
                legacy,
                "decoded signed transaction"
            );
            Ok(tx)
        }
    }
}

fn field<T: Decodable>(rlp: &Rlp, index: usize, name: &'static str) -> Result<T, RlpError> {
    rlp.val_at(index).map_err(|err| match err {
        DecoderError::RlpIsTooBig => RlpError::ValueOutOfRange { field: name },
        other => RlpError::Malformed {
            reason: format!("{}: {:?}", name, other),
        },
    })
}

fn malformed(context: &'static str) -> impl Fn(DecoderError) -> RlpError {
    move |err| RlpError::Malformed {
        reason: format!("{}: {:?}", context, err),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
