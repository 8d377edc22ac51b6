//! # Assets
//!
//! The unit of account is a [`Symbol`] (ticker plus precision) and every
//! amount travels as an [`Asset`]: a signed `i64` tagged with its symbol.
//! There is no way to add a `TOK` to a `USD`, or a four-decimal `TOK` to a
//! two-decimal one, without going through an explicit error.
//!
//! Text forms follow the familiar chain convention: `"4,TOK"` for symbols
//! and `"12.3400 TOK"` for quantities. Both serialize as their text form, in
//! JSON and on disk alike.

mod quantity;
mod symbol;

pub use quantity::Asset;
pub use symbol::{Symbol, SymbolCode};

use thiserror::Error;

/// Errors raised while parsing or combining assets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// The symbol code is empty, too long, or not uppercase ASCII.
    #[error("invalid symbol name: {0:?}")]
    InvalidSymbol(String),

    /// Precision above the supported maximum of 18.
    #[error("invalid precision {0}, maximum is 18")]
    InvalidPrecision(u8),

    /// The amount (or the result of arithmetic) left `±(2^62 - 1)`.
    #[error("amount out of representable range")]
    OutOfRange,

    /// Arithmetic between two different symbols.
    #[error("symbol precision mismatch: expected {expected}, found {found}")]
    SymbolMismatch {
        /// The left-hand operand's symbol.
        expected: Symbol,
        /// The right-hand operand's symbol.
        found: Symbol,
    },

    /// Text that doesn't follow the asset or symbol grammar.
    #[error("malformed asset text: {0}")]
    Parse(String),
}
