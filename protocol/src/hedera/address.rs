//! Hedera account addresses: `shard.realm.num`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::HederaError;
use super::proto::{ProtoError, ProtoReader, ProtoWriter};

/// An account on a Hedera-style network.
///
/// Two addresses are equal iff all three components are equal. `Clone`
/// produces a fully independent value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HederaAddress {
    shard: i64,
    realm: i64,
    num: i64,
}

impl HederaAddress {
    pub fn new(shard: i64, realm: i64, num: i64) -> Self {
        Self { shard, realm, num }
    }

    pub fn shard(&self) -> i64 {
        self.shard
    }

    pub fn realm(&self) -> i64 {
        self.realm
    }

    pub fn num(&self) -> i64 {
        self.num
    }

    /// Write as an `AccountID` message body: shard 1, realm 2, num 3.
    pub(crate) fn write_proto(&self, w: &mut ProtoWriter) {
        w.int64(1, self.shard).int64(2, self.realm).int64(3, self.num);
    }

    pub(crate) fn read_proto(bytes: &[u8]) -> Result<Self, ProtoError> {
        let mut address = Self::new(0, 0, 0);
        let mut r = ProtoReader::new(bytes);
        while let Some((field, value)) = r.next_field()? {
            match field {
                1 => address.shard = value.varint(field)? as i64,
                2 => address.realm = value.varint(field)? as i64,
                3 => address.num = value.varint(field)? as i64,
                _ => {}
            }
        }
        Ok(address)
    }
}

impl fmt::Display for HederaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.shard, self.realm, self.num)
    }
}

impl FromStr for HederaAddress {
    type Err = HederaError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| HederaError::InvalidAddress {
            input: input.to_string(),
            reason,
        };

        let mut parts = input.split('.');
        let mut component = || -> Result<i64, HederaError> {
            let part = parts.next().ok_or_else(|| invalid("expected three components"))?;
            parse_component(part).ok_or_else(|| invalid("components must be decimal integers"))
        };
        let shard = component()?;
        let realm = component()?;
        let num = component()?;

        if parts.next().is_some() {
            return Err(invalid("expected three components"));
        }
        Ok(Self::new(shard, realm, num))
    }
}

/// Plain non-negative decimal. Rejects signs, blanks and anything
/// `i64::from_str` would otherwise let through.
pub(crate) fn parse_component(part: &str) -> Option<i64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}
