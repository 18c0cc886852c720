//! Ethereum-style value-transfer transactions.
//!
//! An [`EthereumTransaction`] starts life unsigned, with its addresses,
//! amount and data fixed at construction. Gas parameters can be adjusted
//! until it is signed. After broadcast it is identified by its hash and
//! tracked through [`TransactionStatus`].
//!
//! ## Signing and gas mutation
//!
//! A signature commits to every encoded field, gas included. Changing gas
//! price or gas limit on a signed transaction therefore drops the signature
//! and the derived hash: the caller re-signs before re-broadcasting, and a
//! stale signature can never leak onto the wire.
//!
//! ## Identity
//!
//! Equality and hashing follow the transaction hash, so transactions can
//! live in a `HashSet` keyed by what the network calls them. A transaction
//! without a hash is equal only to itself: two distinct unhashed
//! transactions never collapse into one set entry.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use ethereum_types::{H160, H256};
use tracing::{debug, warn};

use super::network::EthereumNetwork;
use super::rlp::{
    decode_transaction, encode_legacy_unsigned, encode_signed, encode_transaction,
    encode_unsigned, RlpError, RlpPurpose,
};
use super::status::{Inclusion, StatusError, TransactionStatus};
use crate::crypto::hash::keccak256;
use crate::crypto::keys::EthereumSigningKey;
use crate::crypto::signatures::{
    recover_address, sign_recoverable, EthereumSignature, SignatureError,
};
use crate::units::{AmountError, Ether, Gas, GasPrice};

/// An Ethereum-style transaction.
///
/// `Clone` is a deep copy: payload, signature and status included. Hand a
/// clone to another thread instead of sharing a mutable instance.
#[derive(Debug, Clone)]
pub struct EthereumTransaction {
    source: H160,
    target: H160,
    amount: Ether,
    gas_price: GasPrice,
    gas_limit: Gas,
    gas_estimate: Gas,
    data: Vec<u8>,
    nonce: u64,
    signature: Option<EthereumSignature>,
    replay_protected: bool,
    hash: Option<H256>,
    status: TransactionStatus,
}

impl EthereumTransaction {
    /// Build an unsigned transaction in the `Created` state.
    ///
    /// The gas estimate starts out equal to the gas limit; a better number
    /// arrives later through [`set_gas_estimate`](Self::set_gas_estimate).
    pub fn new(
        source: H160,
        target: H160,
        amount: Ether,
        gas_price: GasPrice,
        gas_limit: Gas,
        data: impl Into<Vec<u8>>,
        nonce: u64,
    ) -> Self {
        Self {
            source,
            target,
            amount,
            gas_price,
            gas_limit,
            gas_estimate: gas_limit,
            data: data.into(),
            nonce,
            signature: None,
            replay_protected: true,
            hash: None,
            status: TransactionStatus::Created,
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn source(&self) -> H160 {
        self.source
    }

    pub fn target(&self) -> H160 {
        self.target
    }

    /// True if `address` is either end of the transfer.
    pub fn has_address(&self, address: &H160) -> bool {
        self.source == *address || self.target == *address
    }

    pub fn amount(&self) -> Ether {
        self.amount
    }

    pub fn gas_price(&self) -> GasPrice {
        self.gas_price
    }

    pub fn gas_limit(&self) -> Gas {
        self.gas_limit
    }

    pub fn gas_estimate(&self) -> Gas {
        self.gas_estimate
    }

    /// Opaque call data. Empty for a plain transfer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// The network hash, once signed with a known network or decoded.
    pub fn hash(&self) -> Option<H256> {
        self.hash
    }

    pub fn signature(&self) -> Option<&EthereumSignature> {
        self.signature.as_ref()
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// False only for a decoded pre-EIP-155 transaction, whose signature
    /// covers the bare body without a chain id.
    pub fn is_replay_protected(&self) -> bool {
        self.replay_protected
    }

    pub fn status(&self) -> &TransactionStatus {
        &self.status
    }

    // -- fees ---------------------------------------------------------------

    /// The fee for this transaction.
    ///
    /// Once included this is what was actually paid, `gas_used * gas_price`.
    /// Before that it is the estimate, `gas_estimate * gas_price`.
    pub fn fee(&self) -> Result<Ether, AmountError> {
        let gas = self.status.gas_used().unwrap_or(self.gas_estimate);
        self.gas_price.fee_for(gas)
    }

    /// The most this transaction can cost: `gas_limit * gas_price`.
    pub fn fee_limit(&self) -> Result<Ether, AmountError> {
        self.gas_price.fee_for(self.gas_limit)
    }

    // -- mutators -----------------------------------------------------------

    /// Change the gas price. Drops any existing signature.
    pub fn set_gas_price(&mut self, gas_price: GasPrice) {
        if self.gas_price != gas_price {
            self.invalidate_signature("gas price");
        }
        self.gas_price = gas_price;
    }

    /// Change the gas limit. Drops any existing signature.
    pub fn set_gas_limit(&mut self, gas_limit: Gas) {
        if self.gas_limit != gas_limit {
            self.invalidate_signature("gas limit");
        }
        self.gas_limit = gas_limit;
    }

    /// Record a node-supplied gas estimate. The estimate is not encoded, so
    /// the signature is unaffected.
    pub fn set_gas_estimate(&mut self, gas_estimate: Gas) {
        self.gas_estimate = gas_estimate;
    }

    /// Record an estimate and raise the gas limit to the estimate plus
    /// margin. Drops any existing signature if the limit changes.
    pub fn apply_gas_estimate(&mut self, gas_estimate: Gas) {
        self.set_gas_estimate(gas_estimate);
        self.set_gas_limit(gas_estimate.with_limit_margin());
    }

    /// Assign the nonce. Reserved for the account that owns the sequence.
    pub(crate) fn set_nonce(&mut self, nonce: u64) {
        if self.nonce != nonce {
            self.invalidate_signature("nonce");
        }
        self.nonce = nonce;
    }

    /// Assign the hash without checking it. Reserved for code that has just
    /// computed it from the signed bytes.
    pub(crate) fn set_hash(&mut self, hash: H256) {
        self.hash = Some(hash);
    }

    /// Mark the attached signature as covering the pre-EIP-155 pre-image.
    pub(crate) fn set_replay_protected(&mut self, replay_protected: bool) {
        self.replay_protected = replay_protected;
    }

    fn invalidate_signature(&mut self, field: &'static str) {
        self.replay_protected = true;
        if self.signature.take().is_some() {
            warn!(
                nonce = self.nonce,
                field, "signed transaction mutated, signature and hash dropped"
            );
            self.hash = None;
        }
    }

    // -- signing ------------------------------------------------------------

    /// Attach an externally produced EIP-155 signature.
    ///
    /// `v` may be a bare recovery id (`0`/`1`) or `27`/`28`; it is stored
    /// as the latter. Any other `v` is rejected and the transaction is left
    /// untouched. The hash is not computed here because it depends on the
    /// network; use [`sign_with_key`](Self::sign_with_key) or decode the
    /// broadcast bytes to get one.
    pub fn sign(&mut self, signature: EthereumSignature) -> Result<(), SignatureError> {
        let signature = signature.normalized()?;
        self.signature = Some(signature);
        self.replay_protected = true;
        self.hash = None;
        Ok(())
    }

    /// Sign the unsigned pre-image for `network` with `key`, attach the
    /// signature and assign the hash of the signed encoding.
    pub fn sign_with_key(
        &mut self,
        network: &EthereumNetwork,
        key: &EthereumSigningKey,
    ) -> Result<(), SignatureError> {
        let digest = keccak256(&encode_unsigned(self, network));
        let signature = sign_recoverable(key, &digest)?;
        self.sign(signature)?;

        let hash = keccak256(&encode_signed(self, network, &signature)?);
        self.set_hash(hash);

        debug!(
            nonce = self.nonce,
            chain_id = network.chain_id(),
            hash = ?hash,
            "transaction signed"
        );
        Ok(())
    }

    /// Keccak-256 of the unsigned pre-image: the digest that gets signed.
    /// For a legacy transaction that is the six-item body alone.
    pub fn signing_hash(&self, network: &EthereumNetwork) -> H256 {
        if self.replay_protected {
            keccak256(&encode_unsigned(self, network))
        } else {
            keccak256(&encode_legacy_unsigned(self))
        }
    }

    /// Recover the signer's address from the signature and the unsigned
    /// pre-image for `network`.
    ///
    /// Returns the zero address if the transaction is unsigned or recovery
    /// fails; read paths stay total.
    pub fn extract_signer_address(&self, network: &EthereumNetwork) -> H160 {
        let Some(signature) = &self.signature else {
            return H160::zero();
        };
        recover_address(signature, &self.signing_hash(network)).unwrap_or_else(|err| {
            warn!(nonce = self.nonce, error = %err, "signer recovery failed");
            H160::zero()
        })
    }

    // -- encoding -----------------------------------------------------------

    /// RLP-encode for `network`. The signed form fails only when unsigned.
    pub fn encode(
        &self,
        network: &EthereumNetwork,
        purpose: RlpPurpose,
    ) -> Result<Vec<u8>, RlpError> {
        encode_transaction(self, network, purpose)
    }

    /// Decode RLP bytes produced for `network`.
    pub fn decode(
        bytes: &[u8],
        network: &EthereumNetwork,
        purpose: RlpPurpose,
    ) -> Result<Self, RlpError> {
        decode_transaction(bytes, network, purpose)
    }

    /// Hex rendering of [`encode`](Self::encode), behind a caller-chosen
    /// prefix such as `"0x"`.
    pub fn to_hex_string(
        &self,
        network: &EthereumNetwork,
        purpose: RlpPurpose,
        prefix: &str,
    ) -> Result<String, RlpError> {
        let bytes = self.encode(network, purpose)?;
        Ok(format!("{}{}", prefix, hex::encode(bytes)))
    }

    // -- ordering -----------------------------------------------------------

    /// Order by nonce. `Equal` between two different transactions from the
    /// same account is a nonce collision the caller should look into.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.nonce.cmp(&other.nonce)
    }

    // -- status -------------------------------------------------------------

    /// Replace the status. Fails when the current status is terminal.
    pub fn set_status(&mut self, status: TransactionStatus) -> Result<(), StatusError> {
        if let Err(err) = self.status.check_transition(&status) {
            warn!(nonce = self.nonce, error = %err, "status transition rejected");
            return Err(err);
        }
        debug!(
            nonce = self.nonce,
            from = self.status.name(),
            to = status.name(),
            "status transition"
        );
        self.status = status;
        Ok(())
    }

    pub fn submit(&mut self) -> Result<(), StatusError> {
        self.set_status(TransactionStatus::Submitted)
    }

    pub fn include(&mut self, inclusion: Inclusion) -> Result<(), StatusError> {
        self.set_status(TransactionStatus::Included(inclusion))
    }

    pub fn error(&mut self, code: i64, message: impl Into<String>) -> Result<(), StatusError> {
        self.set_status(TransactionStatus::Errored {
            code,
            message: message.into(),
        })
    }

    /// Move a terminal transaction back to `Submitted`, e.g. after a reorg
    /// orphaned the including block.
    pub fn reopen(&mut self) -> Result<(), StatusError> {
        let next = self.status.reopen()?;
        debug!(nonce = self.nonce, from = self.status.name(), "status reopened");
        self.status = next;
        Ok(())
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self.status, TransactionStatus::Included(_))
    }

    pub fn is_submitted(&self) -> bool {
        matches!(self.status, TransactionStatus::Submitted)
    }

    pub fn is_errored(&self) -> bool {
        matches!(self.status, TransactionStatus::Errored { .. })
    }
}

impl PartialEq for EthereumTransaction {
    fn eq(&self, other: &Self) -> bool {
        match (self.hash, other.hash) {
            (Some(a), Some(b)) => a == b,
            _ => std::ptr::eq(self, other),
        }
    }
}

impl Eq for EthereumTransaction {}

impl Hash for EthereumTransaction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Display for EthereumTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tx nonce={} {:?} -> {:?} amount={} gas_price={} gas_limit={} status={}",
            self.nonce,
            self.source,
            self.target,
            self.amount,
            self.gas_price,
            self.gas_limit,
            self.status
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
