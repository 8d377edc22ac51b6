//! Symbol codes and symbols.
//!
//! A [`SymbolCode`] is the ticker (`"TOK"`); a [`Symbol`] pins it to a
//! decimal precision (`"4,TOK"`). Two quantities are only compatible when
//! their full symbols match, so `1.0000 TOK` and `1.00 TOK` never mix.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::AssetError;
use crate::config::{MAX_PRECISION, MAX_SYMBOL_CODE_LENGTH};

// ---------------------------------------------------------------------------
// SymbolCode
// ---------------------------------------------------------------------------

/// One to seven uppercase ASCII letters, packed little-endian into a `u64`.
///
/// The packed value is the primary key of every per-symbol record, and the
/// scope of the supply table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolCode(u64);

impl SymbolCode {
    /// Parses and packs a symbol code.
    pub fn new(code: &str) -> Result<Self, AssetError> {
        let bytes = code.as_bytes();
        if bytes.is_empty()
            || bytes.len() > MAX_SYMBOL_CODE_LENGTH
            || !bytes.iter().all(u8::is_ascii_uppercase)
        {
            return Err(AssetError::InvalidSymbol(code.to_string()));
        }
        let raw = bytes
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << (8 * i)));
        Ok(Self(raw))
    }

    /// Wraps an already-packed value without validating it.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The packed value.
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// `true` if the packed value decodes to 1-7 uppercase letters with no
    /// gaps.
    pub fn is_valid(&self) -> bool {
        let mut raw = self.0;
        if raw == 0 {
            return false;
        }
        for _ in 0..MAX_SYMBOL_CODE_LENGTH {
            let b = (raw & 0xff) as u8;
            if !b.is_ascii_uppercase() {
                return false;
            }
            raw >>= 8;
            if raw == 0 {
                return true;
            }
        }
        false
    }

    /// Number of characters in the code.
    pub fn len(&self) -> usize {
        (8 - self.0.leading_zeros() as usize / 8).min(8)
    }

    /// `true` for the zero code, which is never valid.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = self.0;
        while raw != 0 {
            write!(f, "{}", (raw & 0xff) as u8 as char)?;
            raw >>= 8;
        }
        Ok(())
    }
}

impl fmt::Debug for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolCode({})", self)
    }
}

impl FromStr for SymbolCode {
    type Err = AssetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for SymbolCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SymbolCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

/// A symbol code plus its fixed decimal precision.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
    code: SymbolCode,
    precision: u8,
}

impl Symbol {
    /// Builds a symbol, rejecting precisions above 18.
    pub fn new(code: SymbolCode, precision: u8) -> Result<Self, AssetError> {
        if precision > MAX_PRECISION {
            return Err(AssetError::InvalidPrecision(precision));
        }
        Ok(Self { code, precision })
    }

    /// The ticker.
    pub fn code(&self) -> SymbolCode {
        self.code
    }

    /// Number of fractional digits.
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// `true` when the code is well-formed and the precision in range.
    pub fn is_valid(&self) -> bool {
        self.code.is_valid() && self.precision <= MAX_PRECISION
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self)
    }
}

impl FromStr for Symbol {
    type Err = AssetError;

    /// Parses the `"<precision>,<CODE>"` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s
            .trim()
            .split_once(',')
            .ok_or_else(|| AssetError::Parse(format!("expected \"<precision>,<CODE>\": {s}")))?;
        let precision: u8 = precision
            .parse()
            .map_err(|_| AssetError::Parse(format!("invalid precision in {s:?}")))?;
        Self::new(code.parse()?, precision)
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_packs_little_endian() {
        let code = SymbolCode::new("AB").unwrap();
        assert_eq!(code.raw(), u64::from(b'A') | (u64::from(b'B') << 8));
        assert_eq!(code.to_string(), "AB");
        assert_eq!(code.len(), 2);
        assert!(code.is_valid());
    }

    #[test]
    fn code_rejects_bad_input() {
        for bad in ["", "tok", "TOOLONGX", "T0K", "TO K"] {
            assert!(
                matches!(SymbolCode::new(bad), Err(AssetError::InvalidSymbol(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn raw_validation_catches_gaps_and_garbage() {
        assert!(!SymbolCode::from_raw(0).is_valid());
        // "A", gap, "B"
        assert!(!SymbolCode::from_raw(0x42_00_41).is_valid());
        assert!(!SymbolCode::from_raw(u64::from(b'a')).is_valid());
        assert!(SymbolCode::new("ABCDEFG").unwrap().is_valid());
    }

    #[test]
    fn symbol_text_form() {
        let sym: Symbol = "4,TOK".parse().unwrap();
        assert_eq!(sym.precision(), 4);
        assert_eq!(sym.code().to_string(), "TOK");
        assert_eq!(sym.to_string(), "4,TOK");
        assert!(sym.is_valid());
    }

    #[test]
    fn symbol_rejects_excess_precision() {
        assert_eq!(
            "19,TOK".parse::<Symbol>(),
            Err(AssetError::InvalidPrecision(19))
        );
        assert!("TOK".parse::<Symbol>().is_err());
    }

    #[test]
    fn precision_is_part_of_identity() {
        let a: Symbol = "4,TOK".parse().unwrap();
        let b: Symbol = "2,TOK".parse().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.code(), b.code());
    }
}
