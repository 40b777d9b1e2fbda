//! Trit - the fundamental ternary value
//!
//! Everything the accelerator stores is a trit in {-1, 0, +1}, transmitted
//! as a fixed 2-bit symbol:
//!
//! | trit | symbol |
//! |------|--------|
//! | +1   | `01`   |
//! |  0   | `00`   |
//! | -1   | `11`   |
//!
//! The symbol table is part of the hardware contract; `10` is not a valid
//! symbol and decoding it is a domain error, never a silent default.
//!
//! # Example
//! ```
//! use tritgen::Trit;
//!
//! let t = Trit::try_from(-1i8).unwrap();
//! assert_eq!(t.symbol(), "11");
//! assert_eq!(Trit::from_symbol("11").unwrap(), Trit::Neg);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, TritgenError};

/// A ternary value - strictly {-1, 0, +1}
///
/// Using this enum instead of raw i8 prevents invalid states from entering
/// the codec at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum Trit {
    /// Negative weight/activation
    Neg = -1,
    /// Zero
    #[default]
    Zero = 0,
    /// Positive weight/activation
    Pos = 1,
}

impl Trit {
    /// Convert to i8
    #[inline]
    pub const fn as_i8(self) -> i8 {
        self as i8
    }

    /// Try to convert from i8, returns None for values outside {-1, 0, +1}
    #[inline]
    pub const fn from_i8(value: i8) -> Option<Self> {
        match value {
            -1 => Some(Self::Neg),
            0 => Some(Self::Zero),
            1 => Some(Self::Pos),
            _ => None,
        }
    }

    /// The 2-bit wire symbol for this trit
    #[inline]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Pos => "01",
            Self::Neg => "11",
            Self::Zero => "00",
        }
    }

    /// Decode a 2-bit wire symbol
    ///
    /// `"10"` (and anything that is not exactly one of the three symbols)
    /// is rejected.
    pub fn from_symbol(symbol: &str) -> Result<Self> {
        match symbol {
            "01" => Ok(Self::Pos),
            "11" => Ok(Self::Neg),
            "00" => Ok(Self::Zero),
            other => Err(TritgenError::Domain(format!(
                "invalid ternary symbol {:?}, expected \"00\", \"01\" or \"11\"",
                other
            ))),
        }
    }

    /// Is this a non-zero trit?
    #[inline]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Zero)
    }
}

impl From<Trit> for i8 {
    fn from(t: Trit) -> i8 {
        t.as_i8()
    }
}

impl TryFrom<i8> for Trit {
    type Error = TritgenError;

    fn try_from(value: i8) -> Result<Self> {
        Trit::from_i8(value).ok_or_else(|| {
            TritgenError::Domain(format!("ternary value must be -1, 0 or +1, got {}", value))
        })
    }
}
