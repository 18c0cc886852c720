//! # Amounts & Gas
//!
//! Fixed-precision value types for the Ethereum side of the house:
//!
//! - [`Ether`] -- a 256-bit quantity of wei.
//! - [`GasPrice`] -- wei charged per unit of gas.
//! - [`Gas`] -- an unsigned quantity of gas.
//!
//! Every combination that can overflow returns `Result<_, AmountError>`.
//! Fee and amount arithmetic never wraps.

use std::fmt;

use ethereum_types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ETHER_DECIMALS, GAS_LIMIT_MARGIN_PERCENT, WEI_PER_GWEI};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Arithmetic failures on amounts and gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The result does not fit in the value type.
    #[error("arithmetic overflow in {operation}")]
    Overflow { operation: &'static str },

    /// A subtraction would go below zero.
    #[error("arithmetic underflow in {operation}")]
    Underflow { operation: &'static str },
}

// ---------------------------------------------------------------------------
// EtherUnit
// ---------------------------------------------------------------------------

/// Named denominations of ether, each a power of ten of wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EtherUnit {
    Wei,
    Kwei,
    Mwei,
    Gwei,
    Szabo,
    Finney,
    Ether,
}

impl EtherUnit {
    /// Power of ten that converts one of this unit into wei.
    pub fn exponent(self) -> u32 {
        match self {
            Self::Wei => 0,
            Self::Kwei => 3,
            Self::Mwei => 6,
            Self::Gwei => 9,
            Self::Szabo => 12,
            Self::Finney => 15,
            Self::Ether => ETHER_DECIMALS,
        }
    }
}

// ---------------------------------------------------------------------------
// Ether
// ---------------------------------------------------------------------------

/// An amount of ether, stored in wei.
///
/// # Examples
///
/// ```
/// use polyledger_protocol::units::{Ether, EtherUnit};
///
/// let one = Ether::create(1, EtherUnit::Ether).unwrap();
/// let wei = Ether::create(1_000_000_000_000_000_000, EtherUnit::Wei).unwrap();
/// assert_eq!(one, wei);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Ether(U256);

impl Ether {
    /// Zero wei.
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    /// Wraps a raw wei quantity.
    pub fn from_wei(wei: U256) -> Self {
        Self(wei)
    }

    /// Builds `value * 10^unit.exponent()` wei, failing on overflow.
    pub fn create(value: u64, unit: EtherUnit) -> Result<Self, AmountError> {
        U256::from(value)
            .checked_mul(U256::exp10(unit.exponent() as usize))
            .map(Self)
            .ok_or(AmountError::Overflow {
                operation: "ether create",
            })
    }

    /// The raw wei quantity.
    pub fn as_wei(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Ether) -> Result<Ether, AmountError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(AmountError::Overflow {
                operation: "ether add",
            })
    }

    pub fn checked_sub(self, other: Ether) -> Result<Ether, AmountError> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(AmountError::Underflow {
                operation: "ether sub",
            })
    }

    /// Multiplies by an integer factor, failing on overflow.
    pub fn checked_mul(self, factor: u64) -> Result<Ether, AmountError> {
        self.0
            .checked_mul(U256::from(factor))
            .map(Self)
            .ok_or(AmountError::Overflow {
                operation: "ether multiply",
            })
    }
}

impl fmt::Display for Ether {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} wei", self.0)
    }
}

// ---------------------------------------------------------------------------
// GasPrice
// ---------------------------------------------------------------------------

/// Price paid per unit of gas.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct GasPrice(Ether);

impl GasPrice {
    pub fn new(per_gas: Ether) -> Self {
        Self(per_gas)
    }

    /// Convenience constructor for the unit everybody quotes prices in.
    /// `u64::MAX` gwei is still far below 2^256 wei, so this cannot overflow.
    pub fn gwei(value: u64) -> Self {
        Self(Ether::from_wei(
            U256::from(value) * U256::from(WEI_PER_GWEI),
        ))
    }

    /// The per-gas amount.
    pub fn per_gas(&self) -> Ether {
        self.0
    }

    /// `gas * price`, the fee for consuming `gas` units at this price.
    pub fn fee_for(&self, gas: Gas) -> Result<Ether, AmountError> {
        self.0
            .as_wei()
            .checked_mul(U256::from(gas.amount()))
            .map(Ether::from_wei)
            .ok_or(AmountError::Overflow {
                operation: "gas price multiply",
            })
    }
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/gas", self.0)
    }
}

// ---------------------------------------------------------------------------
// Gas
// ---------------------------------------------------------------------------

/// A quantity of gas: a limit, an estimate, or an amount actually used.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Gas(u64);

impl Gas {
    pub fn new(amount: u64) -> Self {
        Self(amount)
    }

    pub fn amount(&self) -> u64 {
        self.0
    }

    pub fn checked_add(self, other: Gas) -> Result<Gas, AmountError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(AmountError::Overflow {
                operation: "gas add",
            })
    }

    /// Recommended gas limit for this estimate:
    /// `estimate * (100 + GAS_LIMIT_MARGIN_PERCENT) / 100`, truncated.
    ///
    /// Computed in 128 bits and saturated at `u64::MAX`, so an absurd
    /// estimate yields the largest limit rather than a tiny wrapped one.
    pub fn with_limit_margin(self) -> Gas {
        let scaled = u128::from(self.0) * u128::from(100 + GAS_LIMIT_MARGIN_PERCENT) / 100;
        Gas(u64::try_from(scaled).unwrap_or(u64::MAX))
    }
}

impl From<u64> for Gas {
    fn from(amount: u64) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} gas", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ether_units_scale_by_powers_of_ten() {
        let gwei = Ether::create(1, EtherUnit::Gwei).unwrap();
        assert_eq!(gwei.as_wei(), U256::from(1_000_000_000u64));

        let finney = Ether::create(1, EtherUnit::Finney).unwrap();
        let szabo = Ether::create(1_000, EtherUnit::Szabo).unwrap();
        assert_eq!(finney, szabo);
    }

    #[test]
    fn ether_add_detects_overflow() {
        let max = Ether::from_wei(U256::MAX);
        let one = Ether::from_wei(U256::one());
        assert_eq!(
            max.checked_add(one),
            Err(AmountError::Overflow {
                operation: "ether add"
            })
        );
        assert_eq!(one.checked_add(one).unwrap().as_wei(), U256::from(2));
    }

    #[test]
    fn ether_sub_detects_underflow() {
        let one = Ether::from_wei(U256::one());
        assert!(matches!(
            Ether::zero().checked_sub(one),
            Err(AmountError::Underflow { .. })
        ));
        assert!(one.checked_sub(one).unwrap().is_zero());
    }

    #[test]
    fn ether_mul_detects_overflow() {
        let half = Ether::from_wei(U256::MAX / 2 + 1);
        assert!(half.checked_mul(2).is_err());
        assert!(half.checked_mul(1).is_ok());
    }

    #[test]
    fn gas_price_fee_for_gas() {
        let price = GasPrice::gwei(2);
        let fee = price.fee_for(Gas::new(21_000)).unwrap();
        assert_eq!(fee.as_wei(), U256::from(42_000_000_000_000u64));
    }

    #[test]
    fn gas_price_fee_overflow_is_reported() {
        let price = GasPrice::new(Ether::from_wei(U256::MAX));
        assert!(matches!(
            price.fee_for(Gas::new(2)),
            Err(AmountError::Overflow { .. })
        ));
        // Zero gas never overflows, whatever the price.
        assert!(price.fee_for(Gas::new(0)).unwrap().is_zero());
    }

    #[test]
    fn gas_limit_margin_is_twenty_percent() {
        assert_eq!(Gas::new(10_000).with_limit_margin(), Gas::new(12_000));
        assert_eq!(Gas::new(21_000).with_limit_margin(), Gas::new(25_200));
        // Truncates toward zero.
        assert_eq!(Gas::new(7).with_limit_margin(), Gas::new(8));
    }

    #[test]
    fn gas_limit_margin_saturates() {
        assert_eq!(Gas::new(u64::MAX).with_limit_margin(), Gas::new(u64::MAX));
    }

    #[test]
    fn gas_add_detects_overflow() {
        assert!(Gas::new(u64::MAX).checked_add(Gas::new(1)).is_err());
        assert_eq!(
            Gas::new(1).checked_add(Gas::new(2)).unwrap(),
            Gas::new(3)
        );
    }

    #[test]
    fn ether_serde_roundtrip() {
        let amount = Ether::create(3, EtherUnit::Ether).unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        let recovered: Ether = serde_json::from_str(&json).unwrap();
        assert_eq!(amount, recovered);
    }

    #[test]
    fn gas_serde_roundtrip() {
        let gas = Gas::new(21_000);
        let json = serde_json::to_string(&gas).unwrap();
        assert_eq!(json, "21000");
        let recovered: Gas = serde_json::from_str(&json).unwrap();
        assert_eq!(gas, recovered);
    }
}
