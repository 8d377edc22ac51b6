//! # Contract Tables
//!
//! The three record types the token contract persists.
//!
//! | Record          | Table      | Scope             | Primary key       |
//! |-----------------|------------|-------------------|-------------------|
//! | [`SupplyRecord`]  | `stat`     | symbol code       | symbol code       |
//! | [`BalanceRecord`] | `accounts` | owning account    | symbol code       |
//! | [`LockRecord`]    | `locker`   | owning account    | symbol code       |

use serde::{Deserialize, Serialize};
use tally_ledger::{Asset, Name, Record, SymbolCode, TimePoint};

/// Per-symbol supply and issuance policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyRecord {
    /// Amount currently in circulation.
    pub supply: Asset,
    /// Ceiling fixed at creation.
    pub max_supply: Asset,
    /// Account allowed to issue, retire, and flip the transfer lock.
    pub issuer: Name,
    /// When set, transfers also need the issuer's authority.
    pub transfer_locked: bool,
}

impl SupplyRecord {
    /// Symbol code this record describes.
    pub fn code(&self) -> SymbolCode {
        self.supply.code()
    }

    /// Headroom left under the maximum.
    pub fn available(&self) -> Asset {
        Asset::new(self.max_supply.amount - self.supply.amount, self.supply.symbol)
    }
}

impl Record for SupplyRecord {
    const TABLE: Name = Name::constant("stat");

    fn primary_key(&self) -> u64 {
        self.code().raw()
    }
}

/// One account's spendable balance of one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub balance: Asset,
}

impl Record for BalanceRecord {
    const TABLE: Name = Name::constant("accounts");

    fn primary_key(&self) -> u64 {
        self.balance.code().raw()
    }
}

/// A vesting restriction on one account's balance of one symbol.
///
/// Holds no funds. While active, every transfer and burn of the symbol from
/// the account is refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Amount issued under the lock.
    pub locked: Asset,
    pub created_at: TimePoint,
    pub unlock_at: TimePoint,
}

impl LockRecord {
    /// `true` while `now` is before the unlock time.
    pub fn is_active(&self, now: TimePoint) -> bool {
        now < self.unlock_at
    }
}

impl Record for LockRecord {
    const TABLE: Name = Name::constant("locker");

    fn primary_key(&self) -> u64 {
        self.locked.code().raw()
    }
}
