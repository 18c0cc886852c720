//! Transaction identity strings: `shard.realm.num-seconds-nanos`.
//!
//! Unlike Ethereum, a Hedera transaction is not identified by a hash of its
//! bytes but by the paying account and the valid-start timestamp the client
//! chose when signing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::address::{parse_component, HederaAddress};
use super::error::HederaError;
use super::proto::{ProtoError, ProtoReader, ProtoWriter};
use super::timestamp::HederaTimestamp;

/// The paying account plus the valid-start timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HederaTransactionId {
    account: HederaAddress,
    valid_start: HederaTimestamp,
}

impl HederaTransactionId {
    pub fn new(account: HederaAddress, valid_start: HederaTimestamp) -> Self {
        Self {
            account,
            valid_start,
        }
    }

    pub fn account(&self) -> HederaAddress {
        self.account
    }

    pub fn valid_start(&self) -> HederaTimestamp {
        self.valid_start
    }

    /// `TransactionID` message body: validStart 1, accountID 2.
    pub(crate) fn write_proto(&self, w: &mut ProtoWriter) {
        w.message(1, |t| self.valid_start.write_proto(t))
            .message(2, |a| self.account.write_proto(a));
    }

    pub(crate) fn read_proto(bytes: &[u8]) -> Result<Option<Self>, ProtoError> {
        let mut valid_start = None;
        let mut account = None;
        let mut r = ProtoReader::new(bytes);
        while let Some((field, value)) = r.next_field()? {
            match field {
                1 => valid_start = Some(HederaTimestamp::read_proto(value.bytes(field)?)?),
                2 => account = Some(HederaAddress::read_proto(value.bytes(field)?)?),
                _ => {}
            }
        }
        Ok(valid_start
            .zip(account)
            .map(|(valid_start, account)| Self::new(account, valid_start)))
    }
}

impl fmt::Display for HederaTransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.account,
            self.valid_start.seconds(),
            self.valid_start.nanos()
        )
    }
}

impl FromStr for HederaTransactionId {
    type Err = HederaError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| HederaError::InvalidTransactionId {
            input: input.to_string(),
            reason,
        };

        let mut parts = input.split('-');
        let (Some(account), Some(seconds), Some(nanos), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected account-seconds-nanos"));
        };

        let account: HederaAddress = account
            .parse()
            .map_err(|_| invalid("account is not shard.realm.num"))?;
        let seconds =
            parse_component(seconds).ok_or_else(|| invalid("seconds is not a decimal integer"))?;
        let nanos = parse_component(nanos)
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| invalid("nanos is not a decimal integer"))?;
        let valid_start =
            HederaTimestamp::new(seconds, nanos).map_err(|_| invalid("nanos out of range"))?;

        Ok(Self::new(account, valid_start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_exactly() {
        let input = "0.0.14623-1568420904-460838529";
        let id: HederaTransactionId = input.parse().unwrap();
        assert_eq!(id.account(), HederaAddress::new(0, 0, 14_623));
        assert_eq!(id.valid_start().seconds(), 1_568_420_904);
        assert_eq!(id.valid_start().nanos(), 460_838_529);
        assert_eq!(id.to_string(), input);
    }

    #[test]
    fn nanos_are_not_padded() {
        let id = HederaTransactionId::new(
            HederaAddress::new(0, 0, 55),
            HederaTimestamp::new(25, 4).unwrap(),
        );
        assert_eq!(id.to_string(), "0.0.55-25-4");
    }

    #[test]
    fn rejects_malformed_ids() {
        for input in [
            "",
            "0.0.1",
            "0.0.1-5",
            "0.0.1-5-6-7",
            "0.0-5-6",
            "0.0.1-x-6",
            "0.0.1-5-1000000000",
        ] {
            assert!(
                matches!(
                    input.parse::<HederaTransactionId>(),
                    Err(HederaError::InvalidTransactionId { .. })
                ),
                "accepted {input:?}"
            );
        }
    }

    #[test]
    fn proto_layout() {
        let id = HederaTransactionId::new(
            HederaAddress::new(0, 0, 55),
            HederaTimestamp::new(25, 4).unwrap(),
        );
        let mut w = ProtoWriter::new();
        id.write_proto(&mut w);
        let bytes = w.finish();
        assert_eq!(hex::encode(&bytes), "0a040819100412021837");
        assert_eq!(HederaTransactionId::read_proto(&bytes).unwrap(), Some(id));
    }
}
