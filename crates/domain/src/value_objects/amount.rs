use crate::error::{MathError, MathResult};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A raw fixed-point integer together with its decimal scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount {
    pub raw: U256,
    pub decimals: u8,
}

impl Amount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// Converts to a `Decimal` without going through floating point.
    ///
    /// Fails when the raw value has more than 28 significant digits.
    pub fn to_decimal(&self) -> MathResult<Decimal> {
        let mut d = Decimal::from_str(&self.raw.to_string()).map_err(|_| MathError::Conversion)?;
        d.set_scale(u32::from(self.decimals))
            .map_err(|_| MathError::Conversion)?;
        Ok(d.normalize())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Ok(d) => write!(f, "{d}"),
            Err(_) => write!(f, "{}e-{}", self.raw, self.decimals),
        }
    }
}

/// A fixed-point quantity that may be negative, such as a position value
/// whose liabilities exceed its assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAmount {
    pub negative: bool,
    pub magnitude: U256,
    pub decimals: u8,
}

impl SignedAmount {
    /// Returns `assets - liabilities`.
    pub fn difference(assets: U256, liabilities: U256, decimals: u8) -> Self {
        if assets >= liabilities {
            Self {
                negative: false,
                magnitude: assets - liabilities,
                decimals,
            }
        } else {
            Self {
                negative: true,
                magnitude: liabilities - assets,
                decimals,
            }
        }
    }

    pub fn positive(magnitude: U256, decimals: u8) -> Self {
        Self {
            negative: false,
            magnitude,
            decimals,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.negative && !self.magnitude.is_zero()
    }

    pub fn to_decimal(&self) -> MathResult<Decimal> {
        let d = Amount::new(self.magnitude, self.decimals).to_decimal()?;
        Ok(if self.is_negative() { -d } else { d })
    }
}

impl PartialOrd for SignedAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.decimals != other.decimals {
            return None;
        }
        Some(match (self.is_negative(), other.is_negative()) {
            (false, false) => self.magnitude.cmp(&other.magnitude),
            (true, true) => other.magnitude.cmp(&self.magnitude),
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
        })
    }
}

impl fmt::Display for SignedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        write!(f, "{sign}{}", Amount::new(self.magnitude, self.decimals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_to_decimal() {
        let usdc = Amount::new(U256::from(1_234_567_890u64), 6);
        assert_eq!(usdc.to_decimal().unwrap(), dec!(1234.56789));

        let weth = Amount::new(U256::exp10(18) * 3 / 2, 18);
        assert_eq!(weth.to_decimal().unwrap(), dec!(1.5));
    }

    #[test]
    fn test_amount_to_decimal_too_many_digits() {
        let huge = Amount::new(U256::exp10(40), 6);
        assert_eq!(huge.to_decimal(), Err(MathError::Conversion));
    }

    #[test]
    fn test_signed_difference() {
        let gain = SignedAmount::difference(U256::from(10u8), U256::from(4u8), 0);
        assert!(!gain.is_negative());
        assert_eq!(gain.to_decimal().unwrap(), dec!(6));

        let loss = SignedAmount::difference(U256::from(4u8), U256::from(10u8), 6);
        assert!(loss.is_negative());
        assert_eq!(loss.to_decimal().unwrap(), dec!(-0.000006));
        assert_eq!(loss.to_string(), "-0.000006");
        assert!(loss < SignedAmount::positive(U256::from(6u8), 6));
    }

    #[test]
    fn test_signed_zero_is_not_negative() {
        let zero = SignedAmount::difference(U256::from(5u8), U256::from(5u8), 6);
        assert!(!zero.is_negative());
        assert_eq!(zero.to_decimal().unwrap(), Decimal::ZERO);
    }
}
