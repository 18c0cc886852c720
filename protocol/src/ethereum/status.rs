//! Transaction status state machine.
//!
//! ```text
//!   Created --submit--> Submitted --include--> Included   (terminal)
//!                                 \--error---> Errored    (terminal)
//!
//!   Included | Errored --reopen--> Submitted   (reorg, late correction)
//! ```
//!
//! `Created` and `Submitted` may be replaced freely. The terminal states
//! are never overwritten in place: a late correction from the chain monitor
//! has to go through [`TransactionStatus::reopen`] first.

use std::fmt;

use ethereum_types::H256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::units::Gas;

/// Rejected status transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    /// Tried to move out of `Included`/`Errored` without reopening.
    #[error("cannot transition from terminal status {from} to {to}; reopen first")]
    Terminal {
        from: &'static str,
        to: &'static str,
    },

    /// Tried to reopen a transaction that never reached a terminal status.
    #[error("cannot reopen a transaction in non-terminal status {current}")]
    NotTerminal { current: &'static str },
}

/// Where and how a transaction landed in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inclusion {
    pub block_hash: H256,
    pub block_number: u64,
    pub transaction_index: u64,
    /// Block timestamp, seconds since the Unix epoch.
    pub block_timestamp: u64,
    pub gas_used: Gas,
}

/// Lifecycle state of an Ethereum transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Built locally, not yet handed to the transport.
    #[default]
    Created,
    /// Handed to the network, awaiting inclusion.
    Submitted,
    /// Included in a block. Terminal.
    Included(Inclusion),
    /// Rejected by the network. Terminal.
    Errored { code: i64, message: String },
}

impl TransactionStatus {
    /// Short lowercase name, for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Submitted => "submitted",
            Self::Included(_) => "included",
            Self::Errored { .. } => "errored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Included(_) | Self::Errored { .. })
    }

    /// Gas actually consumed. Only meaningful once included.
    pub fn gas_used(&self) -> Option<Gas> {
        match self {
            Self::Included(inclusion) => Some(inclusion.gas_used),
            _ => None,
        }
    }

    /// The network's error code and message. Only meaningful once errored.
    pub fn error(&self) -> Option<(i64, &str)> {
        match self {
            Self::Errored { code, message } => Some((*code, message.as_str())),
            _ => None,
        }
    }

    /// Validate a move from `self` to `next`.
    pub fn check_transition(&self, next: &TransactionStatus) -> Result<(), StatusError> {
        if self.is_terminal() {
            return Err(StatusError::Terminal {
                from: self.name(),
                to: next.name(),
            });
        }
        Ok(())
    }

    /// Compute the status after a reopen: terminal states fall back to
    /// `Submitted`, anything else is an error.
    pub fn reopen(&self) -> Result<TransactionStatus, StatusError> {
        if !self.is_terminal() {
            return Err(StatusError::NotTerminal {
                current: self.name(),
            });
        }
        Ok(Self::Submitted)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Included(inclusion) => write!(
                f,
                "included (block {}, index {})",
                inclusion.block_number, inclusion.transaction_index
            ),
            Self::Errored { code, message } => write!(f, "errored ({}: {})", code, message),
            other => f.write_str(other.name()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn included() -> TransactionStatus {
        TransactionStatus::Included(Inclusion {
            block_hash: H256::repeat_byte(0xAB),
            block_number: 100,
            transaction_index: 2,
            block_timestamp: 1_568_420_904,
            gas_used: Gas::new(19_000),
        })
    }

    fn errored() -> TransactionStatus {
        TransactionStatus::Errored {
            code: -32000,
            message: "nonce too low".to_string(),
        }
    }

    #[test]
    fn default_is_created() {
        assert_eq!(TransactionStatus::default(), TransactionStatus::Created);
    }

    #[test]
    fn non_terminal_states_allow_any_transition() {
        let created = TransactionStatus::Created;
        let submitted = TransactionStatus::Submitted;
        for next in [created.clone(), submitted.clone(), included(), errored()] {
            assert!(created.check_transition(&next).is_ok());
            assert!(submitted.check_transition(&next).is_ok());
        }
    }

    #[test]
    fn terminal_states_reject_transitions() {
        assert_eq!(
            included().check_transition(&TransactionStatus::Submitted),
            Err(StatusError::Terminal {
                from: "included",
                to: "submitted"
            })
        );
        assert!(errored().check_transition(&included()).is_err());
        assert!(included().check_transition(&included()).is_err());
    }

    #[test]
    fn reopen_only_from_terminal() {
        assert_eq!(included().reopen(), Ok(TransactionStatus::Submitted));
        assert_eq!(errored().reopen(), Ok(TransactionStatus::Submitted));
        assert_eq!(
            TransactionStatus::Created.reopen(),
            Err(StatusError::NotTerminal { current: "created" })
        );
    }

    #[test]
    fn projections() {
        assert_eq!(included().gas_used(), Some(Gas::new(19_000)));
        assert_eq!(errored().gas_used(), None);
        assert_eq!(errored().error(), Some((-32000, "nonce too low")));
        assert_eq!(TransactionStatus::Submitted.error(), None);
    }

    #[test]
    fn display() {
        assert_eq!(TransactionStatus::Created.to_string(), "created");
        assert_eq!(included().to_string(), "included (block 100, index 2)");
        assert_eq!(errored().to_string(), "errored (-32000: nonce too low)");
    }

    #[test]
    fn status_serde_roundtrip() {
        for status in [TransactionStatus::Created, included(), errored()] {
            let json = serde_json::to_string(&status).unwrap();
            let recovered: TransactionStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(status, recovered);
        }
    }
}
