//! # Hedera Transfer Transaction
//!
//! A single-debit, single-credit crypto transfer on a Hedera-style network.
//!
//! ## Lifecycle
//!
//! There are exactly two ways a [`HederaTransaction`] acquires an identity,
//! and each instance takes exactly one of them:
//!
//! 1. **New**: [`HederaTransaction::create_new`] builds an anonymous
//!    transfer. [`HederaTransaction::sign`] then fixes the node account,
//!    valid-start timestamp and fee bound, encodes the body, signs it, and
//!    derives both the transaction id (`source` + valid start) and the hash
//!    (SHA-384 of the serialized envelope).
//! 2. **Reconstructed**: [`HederaTransaction::create`] rebuilds a transfer
//!    observed on the network from its id string and hash, for history and
//!    display. It is never signed locally.
//!
//! Once set, the hash never changes; a second `sign` is rejected.
//!
//! ## Wire Format
//!
//! ```text
//! Transaction {
//!   3: SignatureMap { 1: SignaturePair { 1: pubKeyPrefix, 3: ed25519 } }
//!   4: bodyBytes = TransactionBody {
//!        1: TransactionID { 1: Timestamp { 1: seconds, 2: nanos }, 2: AccountID }
//!        2: nodeAccountID  AccountID { 1: shard, 2: realm, 3: num }
//!        3: transactionFee (uint64)
//!        4: transactionValidDuration { 1: seconds }
//!       14: cryptoTransfer { 1: TransferList {
//!             1: AccountAmount { 1: AccountID, 2: amount (sint64) }   // debit
//!             1: AccountAmount { 1: AccountID, 2: amount (sint64) }   // credit
//!           } }
//!      }
//! }
//! ```
//!
//! The signature covers `bodyBytes` exactly as serialized.

use std::fmt;

use tracing::{debug, warn};

use super::address::HederaAddress;
use super::error::HederaError;
use super::proto::{zigzag_decode, ProtoError, ProtoReader, ProtoWriter};
use super::timestamp::HederaTimestamp;
use super::transaction_id::HederaTransactionId;
use crate::config::{
    ED25519_PUBLIC_KEY_LENGTH, ED25519_SIGNATURE_LENGTH, HEDERA_TRANSACTION_VALID_DURATION,
};
use crate::crypto::hash::sha384;
use crate::crypto::keys::{HederaKeypair, HederaPublicKey};
use crate::crypto::signatures::verify_ed25519;

// Transaction
const TX_SIGNATURE_MAP: u32 = 3;
const TX_BODY_BYTES: u32 = 4;
// SignatureMap / SignaturePair
const SIGMAP_PAIR: u32 = 1;
const SIGPAIR_PUBLIC_KEY_PREFIX: u32 = 1;
const SIGPAIR_ED25519: u32 = 3;
// TransactionBody
const BODY_TRANSACTION_ID: u32 = 1;
const BODY_NODE_ACCOUNT: u32 = 2;
const BODY_FEE: u32 = 3;
const BODY_VALID_DURATION: u32 = 4;
const BODY_CRYPTO_TRANSFER: u32 = 14;
// Duration
const DURATION_SECONDS: u32 = 1;
// CryptoTransfer / TransferList / AccountAmount
const TRANSFER_LIST: u32 = 1;
const TRANSFER_ENTRY: u32 = 1;
const ENTRY_ACCOUNT: u32 = 1;
const ENTRY_AMOUNT: u32 = 2;

/// Everything produced by signing, kept so `serialize` is a plain read.
#[derive(Debug, Clone)]
struct SignedEnvelope {
    public_key: HederaPublicKey,
    signature: [u8; ED25519_SIGNATURE_LENGTH],
    body: Vec<u8>,
    serialized: Vec<u8>,
}

/// A Hedera crypto transfer.
#[derive(Debug, Clone)]
pub struct HederaTransaction {
    source: HederaAddress,
    target: HederaAddress,
    /// Tinybar credited to `target` and debited from `source`.
    amount: i64,
    node: Option<HederaAddress>,
    fee_bound: Option<u64>,
    transaction_id: Option<HederaTransactionId>,
    /// The id exactly as given to [`create`](HederaTransaction::create).
    transaction_id_text: Option<String>,
    hash: Option<Vec<u8>>,
    envelope: Option<SignedEnvelope>,
}

impl HederaTransaction {
    /// An unsigned transfer with no identity yet.
    pub fn create_new(source: HederaAddress, target: HederaAddress, amount: i64) -> Self {
        Self {
            source,
            target,
            amount,
            node: None,
            fee_bound: None,
            transaction_id: None,
            transaction_id_text: None,
            hash: None,
            envelope: None,
        }
    }

    /// Rebuild a transfer observed on the network from its id string
    /// (`shard.realm.num-seconds-nanos`) and hash.
    ///
    /// The string is kept as given, so ids with zero-padded nanoseconds
    /// come back unchanged from [`transaction_id_string`](Self::transaction_id_string).
    pub fn create(
        source: HederaAddress,
        target: HederaAddress,
        amount: i64,
        transaction_id: &str,
        hash: impl Into<Vec<u8>>,
    ) -> Result<Self, HederaError> {
        let parsed: HederaTransactionId = transaction_id.parse()?;
        Ok(Self {
            transaction_id: Some(parsed),
            transaction_id_text: Some(transaction_id.to_string()),
            hash: Some(hash.into()),
            ..Self::create_new(source, target, amount)
        })
    }

    // -- accessors ----------------------------------------------------------

    pub fn source(&self) -> HederaAddress {
        self.source
    }

    pub fn target(&self) -> HederaAddress {
        self.target
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// SHA-384 of the serialized envelope for a signed transfer, or the
    /// caller-supplied hash for a reconstructed one.
    pub fn hash(&self) -> Option<&[u8]> {
        self.hash.as_deref()
    }

    pub fn transaction_id(&self) -> Option<HederaTransactionId> {
        self.transaction_id
    }

    /// The id as text: verbatim for a reconstructed transfer, otherwise
    /// the canonical `shard.realm.num-seconds-nanos` rendering.
    pub fn transaction_id_string(&self) -> Option<String> {
        self.transaction_id_text
            .clone()
            .or_else(|| self.transaction_id.map(|id| id.to_string()))
    }

    pub fn valid_start(&self) -> Option<HederaTimestamp> {
        self.transaction_id.map(|id| id.valid_start())
    }

    /// The node the transaction was submitted through. Known only for
    /// locally signed or deserialized transactions.
    pub fn node(&self) -> Option<HederaAddress> {
        self.node
    }

    /// The fee bound, in tinybar, once signed.
    pub fn fee(&self) -> Option<u64> {
        self.fee_bound
    }

    pub fn public_key(&self) -> Option<HederaPublicKey> {
        self.envelope.as_ref().map(|e| e.public_key)
    }

    pub fn signature(&self) -> Option<&[u8; ED25519_SIGNATURE_LENGTH]> {
        self.envelope.as_ref().map(|e| &e.signature)
    }

    pub fn is_signed(&self) -> bool {
        self.envelope.is_some()
    }

    // -- signing ------------------------------------------------------------

    /// Fix the node, valid start and fee bound, then sign with `key`.
    ///
    /// `public_key` is what lands in the signature map and must belong to
    /// `key`. The transaction id becomes `source` at `valid_start`.
    pub fn sign(
        &mut self,
        public_key: &HederaPublicKey,
        node: HederaAddress,
        valid_start: HederaTimestamp,
        fee_bound: u64,
        key: &HederaKeypair,
    ) -> Result<(), HederaError> {
        if self.hash.is_some() {
            let transaction_id = self
                .transaction_id_string()
                .unwrap_or_else(|| "<unknown>".to_string());
            warn!(tx_id = %transaction_id, "refusing to re-sign an identified transaction");
            return Err(HederaError::AlreadyIdentified { transaction_id });
        }
        if *public_key != key.public_key() {
            return Err(HederaError::KeyMismatch);
        }
        if self.amount < 0 {
            return Err(HederaError::InvalidAmount {
                amount: self.amount,
            });
        }

        let transaction_id = HederaTransactionId::new(self.source, valid_start);
        let body = encode_body(
            &transaction_id,
            &node,
            fee_bound,
            &self.source,
            &self.target,
            self.amount,
        );
        let signature = key.sign(&body);
        let serialized = encode_envelope(public_key, &signature, &body);
        let hash = sha384(&serialized).to_vec();

        debug!(
            tx_id = %transaction_id,
            node = %node,
            fee_bound,
            body_len = body.len(),
            "hedera transaction signed"
        );

        self.node = Some(node);
        self.fee_bound = Some(fee_bound);
        self.transaction_id = Some(transaction_id);
        self.hash = Some(hash);
        self.envelope = Some(SignedEnvelope {
            public_key: *public_key,
            signature,
            body,
            serialized,
        });
        Ok(())
    }

    /// Check the stored signature against the stored body bytes.
    pub fn verify(&self) -> bool {
        self.envelope
            .as_ref()
            .map(|e| verify_ed25519(&e.public_key, &e.body, &e.signature))
            .unwrap_or(false)
    }

    // -- wire format --------------------------------------------------------

    /// The signed envelope, ready for submission.
    pub fn serialize(&self) -> Result<Vec<u8>, HederaError> {
        self.envelope
            .as_ref()
            .map(|e| e.serialized.clone())
            .ok_or(HederaError::NotSigned)
    }

    /// Parse a serialized envelope back into a signed transfer. The
    /// signature is carried over but not verified; call
    /// [`verify`](Self::verify) for that.
    ///
    /// Only the first signature pair is read.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, HederaError> {
        let mut signature_map = None;
        let mut body = None;
        let mut r = ProtoReader::new(bytes);
        while let Some((field, value)) = r.next_field()? {
            match field {
                TX_SIGNATURE_MAP => signature_map = Some(value.bytes(field)?),
                TX_BODY_BYTES => body = Some(value.bytes(field)?),
                _ => {}
            }
        }
        let signature_map = signature_map.ok_or(HederaError::MissingField("signature map"))?;
        let body = body.ok_or(HederaError::MissingField("body bytes"))?;

        let (public_key, signature) = decode_signature_map(signature_map)?;
        let decoded = decode_body(body)?;
        let (debit, credit) = check_transfers(&decoded.transfers)?;
        let payer = decoded.transaction_id.account();
        if payer != debit.account {
            warn!(
                tx_id = %decoded.transaction_id,
                debit = %debit.account,
                "transfer source is not the paying account"
            );
            return Err(HederaError::PayerMismatch {
                payer,
                source_account: debit.account,
            });
        }

        debug!(
            tx_id = %decoded.transaction_id,
            amount = credit.amount,
            "hedera transaction deserialized"
        );

        Ok(Self {
            source: debit.account,
            target: credit.account,
            amount: credit.amount,
            node: Some(decoded.node),
            fee_bound: Some(decoded.fee_bound),
            transaction_id: Some(decoded.transaction_id),
            transaction_id_text: None,
            hash: Some(sha384(bytes).to_vec()),
            envelope: Some(SignedEnvelope {
                public_key,
                signature,
                body: body.to_vec(),
                serialized: bytes.to_vec(),
            }),
        })
    }
}

impl fmt::Display for HederaTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} amount={}", self.source, self.target, self.amount)?;
        match &self.transaction_id {
            Some(id) => write!(f, " id={}", id),
            None => f.write_str(" id=<unsigned>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn encode_body(
    transaction_id: &HederaTransactionId,
    node: &HederaAddress,
    fee_bound: u64,
    source: &HederaAddress,
    target: &HederaAddress,
    amount: i64,
) -> Vec<u8> {
    let valid_seconds =
        i64::try_from(HEDERA_TRANSACTION_VALID_DURATION.as_secs()).unwrap_or(i64::MAX);

    let mut w = ProtoWriter::new();
    w.message(BODY_TRANSACTION_ID, |id| transaction_id.write_proto(id))
        .message(BODY_NODE_ACCOUNT, |n| node.write_proto(n))
        .uint64(BODY_FEE, fee_bound)
        .message(BODY_VALID_DURATION, |d| {
            d.int64(DURATION_SECONDS, valid_seconds);
        })
        .message(BODY_CRYPTO_TRANSFER, |transfer| {
            transfer.message(TRANSFER_LIST, |list| {
                list.message(TRANSFER_ENTRY, |entry| {
                    entry
                        .message(ENTRY_ACCOUNT, |a| source.write_proto(a))
                        .sint64(ENTRY_AMOUNT, -amount);
                })
                .message(TRANSFER_ENTRY, |entry| {
                    entry
                        .message(ENTRY_ACCOUNT, |a| target.write_proto(a))
                        .sint64(ENTRY_AMOUNT, amount);
                });
            });
        });
    w.finish()
}

fn encode_envelope(
    public_key: &HederaPublicKey,
    signature: &[u8; ED25519_SIGNATURE_LENGTH],
    body: &[u8],
) -> Vec<u8> {
    let mut w = ProtoWriter::new();
    w.message(TX_SIGNATURE_MAP, |map| {
        map.message(SIGMAP_PAIR, |pair| {
            pair.bytes(SIGPAIR_PUBLIC_KEY_PREFIX, public_key.as_bytes())
                .bytes(SIGPAIR_ED25519, signature);
        });
    })
    .bytes(TX_BODY_BYTES, body);
    w.finish()
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

struct DecodedBody {
    transaction_id: HederaTransactionId,
    node: HederaAddress,
    fee_bound: u64,
    transfers: Vec<TransferEntry>,
}

#[derive(Debug, Clone, Copy)]
struct TransferEntry {
    account: HederaAddress,
    amount: i64,
}

fn decode_signature_map(
    bytes: &[u8],
) -> Result<(HederaPublicKey, [u8; ED25519_SIGNATURE_LENGTH]), HederaError> {
    let mut r = ProtoReader::new(bytes);
    while let Some((field, value)) = r.next_field()? {
        if field != SIGMAP_PAIR {
            continue;
        }
        let mut public_key = None;
        let mut signature = None;
        let mut pair = ProtoReader::new(value.bytes(field)?);
        while let Some((field, value)) = pair.next_field()? {
            match field {
                SIGPAIR_PUBLIC_KEY_PREFIX => {
                    let prefix: [u8; ED25519_PUBLIC_KEY_LENGTH] = value
                        .bytes(field)?
                        .try_into()
                        .map_err(|_| ProtoError::OutOfRange { field })?;
                    public_key = Some(HederaPublicKey::from_bytes(prefix));
                }
                SIGPAIR_ED25519 => {
                    let raw: [u8; ED25519_SIGNATURE_LENGTH] = value
                        .bytes(field)?
                        .try_into()
                        .map_err(|_| ProtoError::OutOfRange { field })?;
                    signature = Some(raw);
                }
                _ => {}
            }
        }
        return Ok((
            public_key.ok_or(HederaError::MissingField("public key prefix"))?,
            signature.ok_or(HederaError::MissingField("ed25519 signature"))?,
        ));
    }
    Err(HederaError::MissingField("signature pair"))
}

fn decode_body(bytes: &[u8]) -> Result<DecodedBody, HederaError> {
    let mut transaction_id = None;
    let mut node = None;
    let mut fee_bound = 0;
    let mut transfer = None;

    let mut r = ProtoReader::new(bytes);
    while let Some((field, value)) = r.next_field()? {
        match field {
            BODY_TRANSACTION_ID => {
                transaction_id = HederaTransactionId::read_proto(value.bytes(field)?)?
            }
            BODY_NODE_ACCOUNT => node = Some(HederaAddress::read_proto(value.bytes(field)?)?),
            BODY_FEE => fee_bound = value.varint(field)?,
            BODY_CRYPTO_TRANSFER => transfer = Some(value.bytes(field)?),
            _ => {}
        }
    }

    let transfer = transfer.ok_or(HederaError::MissingField("crypto transfer"))?;
    let transfers = decode_transfers(transfer)?;
    Ok(DecodedBody {
        transaction_id: transaction_id.ok_or(HederaError::MissingField("transaction id"))?,
        node: node.ok_or(HederaError::MissingField("node account"))?,
        fee_bound,
        transfers,
    })
}

fn decode_transfers(crypto_transfer: &[u8]) -> Result<Vec<TransferEntry>, HederaError> {
    let mut entries = Vec::new();
    let mut r = ProtoReader::new(crypto_transfer);
    while let Some((field, value)) = r.next_field()? {
        if field != TRANSFER_LIST {
            continue;
        }
        let mut list = ProtoReader::new(value.bytes(field)?);
        while let Some((field, value)) = list.next_field()? {
            if field != TRANSFER_ENTRY {
                continue;
            }
            let mut account = None;
            let mut amount = 0i64;
            let mut entry = ProtoReader::new(value.bytes(field)?);
            while let Some((field, value)) = entry.next_field()? {
                match field {
                    ENTRY_ACCOUNT => {
                        account = Some(HederaAddress::read_proto(value.bytes(field)?)?)
                    }
                    ENTRY_AMOUNT => amount = zigzag_decode(value.varint(field)?),
                    _ => {}
                }
            }
            entries.push(TransferEntry {
                account: account.ok_or(HederaError::MissingField("transfer account"))?,
                amount,
            });
        }
    }
    Ok(entries)
}

/// Exactly one debit followed by one credit, summing to zero.
fn check_transfers(
    entries: &[TransferEntry],
) -> Result<(TransferEntry, TransferEntry), HederaError> {
    let [debit, credit] = entries else {
        return Err(HederaError::TransferShape(format!(
            "expected 2 entries, found {}",
            entries.len()
        )));
    };
    let sum = i128::from(debit.amount) + i128::from(credit.amount);
    if sum != 0 {
        return Err(HederaError::UnbalancedTransfer { sum });
    }
    if credit.amount < 0 {
        return Err(HederaError::TransferShape(
            "debit must precede credit".to_string(),
        ));
    }
    Ok((*debit, *credit))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
