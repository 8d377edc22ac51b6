//! Signed, symbol-tagged quantities.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::{AssetError, Symbol, SymbolCode};
use crate::config::{MAX_ASSET_AMOUNT, MAX_PRECISION};

/// An amount of some symbol, in the symbol's smallest unit.
///
/// `Asset { amount: 12345, symbol: 4,TOK }` is `1.2345 TOK`. Arithmetic is
/// only defined between assets of the same symbol *and* precision, and every
/// result must stay within `±(2^62 - 1)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Asset {
    /// Amount in the smallest unit of `symbol`.
    pub amount: i64,
    /// The symbol the amount is denominated in.
    pub symbol: Symbol,
}

impl Asset {
    /// Builds an asset. Range is not checked here; see [`Asset::is_valid`].
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    /// A zero amount of `symbol`.
    pub fn zero(symbol: Symbol) -> Self {
        Self::new(0, symbol)
    }

    /// `true` if the amount is within the representable range.
    pub fn is_amount_within_range(&self) -> bool {
        (-MAX_ASSET_AMOUNT..=MAX_ASSET_AMOUNT).contains(&self.amount)
    }

    /// `true` if the amount is in range and the symbol well-formed.
    pub fn is_valid(&self) -> bool {
        self.is_amount_within_range() && self.symbol.is_valid()
    }

    /// Shorthand for `self.symbol.code()`.
    pub fn code(&self) -> SymbolCode {
        self.symbol.code()
    }

    fn ensure_same_symbol(&self, other: &Asset) -> Result<(), AssetError> {
        if self.symbol != other.symbol {
            return Err(AssetError::SymbolMismatch {
                expected: self.symbol,
                found: other.symbol,
            });
        }
        Ok(())
    }

    /// `self + other`, rejecting symbol mismatches and out-of-range results.
    pub fn checked_add(&self, other: &Asset) -> Result<Asset, AssetError> {
        self.ensure_same_symbol(other)?;
        let sum = Asset::new(
            self.amount
                .checked_add(other.amount)
                .ok_or(AssetError::OutOfRange)?,
            self.symbol,
        );
        if !sum.is_amount_within_range() {
            return Err(AssetError::OutOfRange);
        }
        Ok(sum)
    }

    /// `self - other`, rejecting symbol mismatches and out-of-range results.
    pub fn checked_sub(&self, other: &Asset) -> Result<Asset, AssetError> {
        self.ensure_same_symbol(other)?;
        let diff = Asset::new(
            self.amount
                .checked_sub(other.amount)
                .ok_or(AssetError::OutOfRange)?,
            self.symbol,
        );
        if !diff.is_amount_within_range() {
            return Err(AssetError::OutOfRange);
        }
        Ok(diff)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = u32::from(self.symbol.precision());
        let sign = if self.amount < 0 { "-" } else { "" };
        let magnitude = self.amount.unsigned_abs();
        if precision == 0 {
            return write!(f, "{sign}{magnitude} {}", self.symbol.code());
        }
        let unit = 10u64.pow(precision);
        write!(
            f,
            "{sign}{}.{:0width$} {}",
            magnitude / unit,
            magnitude % unit,
            self.symbol.code(),
            width = precision as usize
        )
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Asset({})", self)
    }
}

impl FromStr for Asset {
    type Err = AssetError;

    /// Parses `"<amount> <CODE>"`. The number of fractional digits in the
    /// amount *is* the precision: `"1.50 TOK"` is `150` of `2,TOK`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (number, code) = s
            .split_once(' ')
            .ok_or_else(|| AssetError::Parse(format!("expected \"<amount> <CODE>\": {s:?}")))?;
        let code: SymbolCode = code.trim().parse()?;

        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (whole, fraction) = match digits.split_once('.') {
            Some((_, "")) => {
                return Err(AssetError::Parse(format!("missing fraction digits: {s:?}")))
            }
            Some((w, frac)) => (w, frac),
            None => (digits, ""),
        };
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || (!fraction.is_empty() && !all_digits(fraction)) {
            return Err(AssetError::Parse(format!("malformed amount: {s:?}")));
        }

        if fraction.len() > usize::from(MAX_PRECISION) {
            return Err(AssetError::InvalidPrecision(
                fraction.len().min(usize::from(u8::MAX)) as u8,
            ));
        }
        let precision = fraction.len() as u8;

        let mut magnitude: i128 = 0;
        for b in whole.bytes().chain(fraction.bytes()) {
            magnitude = magnitude * 10 + i128::from(b - b'0');
            if magnitude > i128::from(MAX_ASSET_AMOUNT) {
                return Err(AssetError::OutOfRange);
            }
        }
        let signed = if negative { -magnitude } else { magnitude };
        let amount = signed as i64;

        Ok(Asset::new(amount, Symbol::new(code, precision)?))
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
