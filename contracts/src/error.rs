//! # Token Errors
//!
//! Every way a token action can be rejected. Rejections are synchronous and
//! abort the whole action: the session is dropped, nothing is written, and
//! nobody is notified.

use tally_ledger::{Asset, AssetError, AuthError, Name, StoreError, SymbolCode, TimePoint};
use thiserror::Error;

/// Errors raised by the token contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Malformed or zero-length symbol code.
    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Non-positive amount, symbol/precision mismatch, or out of range.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// `create` called for a symbol that already exists.
    #[error("token with symbol {0} already exists")]
    DuplicateSymbol(SymbolCode),

    /// The symbol has no supply record.
    #[error("token with symbol {0} does not exist")]
    UnknownSymbol(SymbolCode),

    /// Issuance would push supply past the maximum.
    #[error("quantity {requested} exceeds available supply {available}")]
    SupplyExceeded {
        /// Amount asked for.
        requested: Asset,
        /// `max_supply - supply` at the time of the request.
        available: Asset,
    },

    /// A debit larger than the account's balance.
    #[error("overdrawn balance: {owner} cannot spend {requested}")]
    InsufficientBalance {
        /// Account being debited.
        owner: Name,
        /// Amount asked for.
        requested: Asset,
    },

    /// The action lacks a required authority.
    #[error("missing authority of {0}")]
    Unauthorized(Name),

    /// The account's balance of this symbol is under an active vesting lock.
    #[error("balance of {symbol} for {owner} is locked until {unlock_at}")]
    BalanceLocked {
        /// Locked account.
        owner: Name,
        /// Locked symbol.
        symbol: SymbolCode,
        /// When the lock becomes inert.
        unlock_at: TimePoint,
    },

    /// `from == to`.
    #[error("cannot transfer to self")]
    SelfTransfer,

    /// The named account is not registered with the host.
    #[error("account {0} does not exist")]
    AccountNotFound(Name),

    /// `close` on a balance that still holds funds.
    #[error("cannot close a balance of {0}; balance must be zero")]
    NonZeroClose(Asset),

    /// Memo over 256 bytes.
    #[error("memo has {len} bytes; the limit is 256")]
    MemoTooLong {
        /// Memo length in bytes.
        len: usize,
    },

    /// A lock already exists for this account and symbol.
    #[error("{owner} already has a lock on {symbol}")]
    DuplicateLock {
        /// Account holding the existing lock.
        owner: Name,
        /// Symbol of the existing lock.
        symbol: SymbolCode,
    },

    /// `close` for an account with no balance record.
    #[error("{owner} has no balance record for {symbol}")]
    BalanceNotFound {
        /// Account asked about.
        owner: Name,
        /// Symbol asked about.
        symbol: SymbolCode,
    },

    /// `unlock` for an account with no lock.
    #[error("{owner} has no lock on {symbol}")]
    LockNotFound {
        /// Account asked about.
        owner: Name,
        /// Symbol asked about.
        symbol: SymbolCode,
    },

    /// `now + duration` does not fit in a time point.
    #[error("lock duration of {0}us overflows the clock")]
    InvalidLockDuration(u64),

    /// The storage backend failed.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl TokenError {
    /// Stable, machine-readable name of the rejection. Used for API bodies
    /// and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            TokenError::InvalidSymbol(_) => "invalid_symbol",
            TokenError::InvalidQuantity(_) => "invalid_quantity",
            TokenError::DuplicateSymbol(_) => "duplicate_symbol",
            TokenError::UnknownSymbol(_) => "unknown_symbol",
            TokenError::SupplyExceeded { .. } => "supply_exceeded",
            TokenError::InsufficientBalance { .. } => "insufficient_balance",
            TokenError::Unauthorized(_) => "unauthorized",
            TokenError::BalanceLocked { .. } => "balance_locked",
            TokenError::SelfTransfer => "self_transfer",
            TokenError::AccountNotFound(_) => "account_not_found",
            TokenError::NonZeroClose(_) => "non_zero_close",
            TokenError::MemoTooLong { .. } => "memo_too_long",
            TokenError::DuplicateLock { .. } => "duplicate_lock",
            TokenError::BalanceNotFound { .. } => "balance_not_found",
            TokenError::LockNotFound { .. } => "lock_not_found",
            TokenError::InvalidLockDuration(_) => "invalid_lock_duration",
            TokenError::Storage(_) => "storage",
        }
    }

    /// `true` for rejections about a record that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TokenError::UnknownSymbol(_)
                | TokenError::AccountNotFound(_)
                | TokenError::BalanceNotFound { .. }
                | TokenError::LockNotFound { .. }
        )
    }
}

impl From<AssetError> for TokenError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::InvalidSymbol(_) => TokenError::InvalidSymbol(err.to_string()),
            other => TokenError::InvalidQuantity(other.to_string()),
        }
    }
}

impl From<AuthError> for TokenError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingAuthority(name) => TokenError::Unauthorized(name),
        }
    }
}

impl From<StoreError> for TokenError {
    fn from(err: StoreError) -> Self {
        TokenError::Storage(err.to_string())
    }
}
