//! Valid-start timestamps.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::error::HederaError;
use super::proto::{ProtoError, ProtoReader, ProtoWriter};

const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// Seconds and nanoseconds since the Unix epoch.
///
/// Together with the paying account this forms a transaction's identity,
/// so the nanosecond part matters: two transfers from the same account in
/// the same second are told apart by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HederaTimestamp {
    seconds: i64,
    nanos: i32,
}

impl HederaTimestamp {
    pub fn new(seconds: i64, nanos: i32) -> Result<Self, HederaError> {
        if seconds < 0 || !(0..NANOS_PER_SECOND).contains(&nanos) {
            return Err(HederaError::InvalidTimestamp { seconds, nanos });
        }
        Ok(Self { seconds, nanos })
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            seconds: now.timestamp().max(0),
            nanos: i32::try_from(now.timestamp_subsec_nanos())
                .unwrap_or(0)
                .min(NANOS_PER_SECOND - 1),
        }
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    pub fn nanos(&self) -> i32 {
        self.nanos
    }

    /// `Timestamp` message body: seconds 1, nanos 2.
    pub(crate) fn write_proto(&self, w: &mut ProtoWriter) {
        w.int64(1, self.seconds).int64(2, i64::from(self.nanos));
    }

    pub(crate) fn read_proto(bytes: &[u8]) -> Result<Self, ProtoError> {
        let mut seconds = 0i64;
        let mut nanos = 0i32;
        let mut r = ProtoReader::new(bytes);
        while let Some((field, value)) = r.next_field()? {
            match field {
                1 => seconds = value.varint(field)? as i64,
                2 => {
                    nanos = i32::try_from(value.varint(field)?)
                        .ok()
                        .filter(|n| (0..NANOS_PER_SECOND).contains(n))
                        .ok_or(ProtoError::OutOfRange { field })?
                }
                _ => {}
            }
        }
        if seconds < 0 {
            return Err(ProtoError::OutOfRange { field: 1 });
        }
        Ok(Self { seconds, nanos })
    }
}

impl fmt::Display for HederaTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_nanos() {
        assert!(HederaTimestamp::new(25, 4).is_ok());
        assert!(HederaTimestamp::new(25, 999_999_999).is_ok());
        assert!(HederaTimestamp::new(25, 1_000_000_000).is_err());
        assert!(HederaTimestamp::new(25, -1).is_err());
        assert!(HederaTimestamp::new(-1, 0).is_err());
    }

    #[test]
    fn now_is_after_2020() {
        let now = HederaTimestamp::now();
        assert!(now.seconds() > 1_577_836_800);
        assert!((0..NANOS_PER_SECOND).contains(&now.nanos()));
    }

    #[test]
    fn proto_layout() {
        let mut w = ProtoWriter::new();
        HederaTimestamp::new(25, 4).unwrap().write_proto(&mut w);
        let bytes = w.finish();
        assert_eq!(bytes, vec![0x08, 0x19, 0x10, 0x04]);
        assert_eq!(
            HederaTimestamp::read_proto(&bytes).unwrap(),
            HederaTimestamp::new(25, 4).unwrap()
        );
    }

    #[test]
    fn displays_padded_nanos() {
        assert_eq!(HederaTimestamp::new(25, 4).unwrap().to_string(), "25.000000004");
    }
}
