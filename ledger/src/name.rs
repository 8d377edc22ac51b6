//! # Packed Names
//!
//! Accounts, tables, and the contract itself are identified by a [`Name`]:
//! up to twelve characters from `.12345abcdefghijklmnopqrstuvwxyz`, packed
//! five bits per character into a `u64` starting at the most significant
//! bit.
//!
//! Packing from the top means the numeric order of two names is exactly
//! their lexicographic order, which keeps storage keys sorted the way a
//! human would expect when scanning a table.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{MAX_NAME_LENGTH, NAME_CHARSET};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a string is not a valid name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NameError {
    /// Names must have at least one character.
    #[error("name is empty")]
    Empty,

    /// Names are at most twelve characters long.
    #[error("name is {0} characters long, maximum is 12")]
    TooLong(usize),

    /// A character outside `.12345a-z`.
    #[error("invalid character {ch:?} at position {position} in name")]
    InvalidChar {
        /// The offending character.
        ch: char,
        /// Zero-based position in the input.
        position: usize,
    },

    /// A trailing `.` is indistinguishable from padding.
    #[error("name must not end with '.'")]
    TrailingDot,
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

const fn char_value(c: u8) -> Option<u64> {
    match c {
        b'.' => Some(0),
        b'1'..=b'5' => Some((c - b'1') as u64 + 1),
        b'a'..=b'z' => Some((c - b'a') as u64 + 6),
        _ => None,
    }
}

const fn encode(bytes: &[u8]) -> Result<u64, NameError> {
    if bytes.is_empty() {
        return Err(NameError::Empty);
    }
    if bytes.len() > MAX_NAME_LENGTH {
        return Err(NameError::TooLong(bytes.len()));
    }
    if bytes[bytes.len() - 1] == b'.' {
        return Err(NameError::TrailingDot);
    }

    let mut value = 0u64;
    let mut i = 0;
    while i < bytes.len() {
        let v = match char_value(bytes[i]) {
            Some(v) => v,
            None => {
                return Err(NameError::InvalidChar {
                    ch: bytes[i] as char,
                    position: i,
                })
            }
        };
        value |= v << (64 - 5 * (i + 1));
        i += 1;
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Name
// ---------------------------------------------------------------------------

/// A packed account, table, or contract name.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Name(u64);

impl Name {
    /// Parses and packs a name.
    pub fn new(s: &str) -> Result<Self, NameError> {
        encode(s.as_bytes()).map(Self)
    }

    /// Packs a name at compile time. Intended for table names and other
    /// literals; an invalid literal fails the build.
    pub const fn constant(s: &str) -> Self {
        match encode(s.as_bytes()) {
            Ok(v) => Self(v),
            Err(_) => panic!("invalid name literal"),
        }
    }

    /// Wraps an already-packed value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The packed 64-bit value.
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// `true` for the all-zero name, which no parsed name can produce.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = [b'.'; MAX_NAME_LENGTH];
        for (i, slot) in out.iter_mut().enumerate() {
            let v = (self.0 >> (64 - 5 * (i + 1))) & 0x1f;
            *slot = NAME_CHARSET[v as usize];
        }
        let len = out.iter().rposition(|&c| c != b'.').map_or(0, |p| p + 1);
        // Every byte comes from NAME_CHARSET, which is ASCII.
        f.write_str(std::str::from_utf8(&out[..len]).unwrap_or_default())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self)
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<Name> for u64 {
    fn from(name: Name) -> Self {
        name.0
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
