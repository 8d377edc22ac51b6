//! # Token Ledger Executor
//!
//! [`TokenLedger`] is the host-facing entry point: it owns the backend and
//! the collaborators, runs one action at a time, and answers read-only
//! queries.
//!
//! ## Execution
//!
//! ```text
//! execute(action, auth)
//!   ├─ take the writer lock
//!   ├─ now = clock.now()               (read exactly once)
//!   ├─ session = Session::new(store)
//!   ├─ TokenContract::dispatch(action)
//!   │     └─ Err → drop session, nothing written, nobody notified
//!   ├─ session.commit()                (one atomic batch)
//!   └─ notifier.notify(...)            (after commit, in queue order)
//! ```

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use tally_ledger::{
    Asset, Authorizer, Clock, Name, Notifier, Session, StateStore, SymbolCode, TimePoint,
};

use crate::action::Action;
use crate::error::TokenError;
use crate::tables::{BalanceRecord, LockRecord, SupplyRecord};
use crate::token::TokenContract;

/// Outcome of a committed action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Wire name of the action.
    pub action: String,
    /// The single time the action ran at.
    pub executed_at: TimePoint,
    /// Rows written or deleted.
    pub writes: usize,
    /// Accounts notified, in delivery order.
    pub notified: Vec<Name>,
}

/// The token contract bound to a backend and its host collaborators.
pub struct TokenLedger {
    account: Name,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    writer: Mutex<()>,
}

impl TokenLedger {
    /// Binds the contract deployed at `account` to its collaborators.
    pub fn new(
        account: Name,
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            account,
            store,
            clock,
            notifier,
            writer: Mutex::new(()),
        }
    }

    /// The contract's own account.
    pub fn account(&self) -> Name {
        self.account
    }

    /// Runs `action` under `auth`, all-or-nothing.
    ///
    /// Actions are serialized: a second caller waits until the first has
    /// committed or been rejected.
    ///
    /// # Errors
    ///
    /// Any [`TokenError`] the action is rejected with. On error no record
    /// has changed and no notice has been delivered.
    pub fn execute(&self, action: &Action, auth: &dyn Authorizer) -> Result<Receipt, TokenError> {
        let _guard = self.writer.lock();
        let now = self.clock.now();

        let mut contract = TokenContract::new(
            self.account,
            Session::new(self.store.as_ref()),
            auth,
            now,
        );
        if let Err(err) = contract.dispatch(action) {
            warn!(action = action.name(), kind = err.kind(), %err, "action rejected");
            return Err(err);
        }

        let (session, notices) = contract.finish();
        let writes = session.commit()?;

        let mut notified = Vec::with_capacity(notices.len());
        for (recipient, notice) in &notices {
            debug!(%recipient, quantity = %notice.quantity, "delivering transfer notice");
            self.notifier.notify(*recipient, notice);
            notified.push(*recipient);
        }

        info!(action = action.name(), writes, notices = notified.len(), "action applied");
        Ok(Receipt {
            action: action.name().to_string(),
            executed_at: now,
            writes,
            notified,
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    fn read<T>(
        &self,
        f: impl FnOnce(&Session<'_>) -> Result<T, TokenError>,
    ) -> Result<T, TokenError> {
        let session = Session::new(self.store.as_ref());
        f(&session)
    }

    /// The symbol's supply record.
    ///
    /// # Errors
    ///
    /// [`TokenError::UnknownSymbol`] if it was never created.
    pub fn get_stats(&self, code: SymbolCode) -> Result<SupplyRecord, TokenError> {
        self.read(|s| {
            s.find::<SupplyRecord>(code.raw(), code.raw())?
                .ok_or(TokenError::UnknownSymbol(code))
        })
    }

    /// Current supply of `code`.
    pub fn get_supply(&self, code: SymbolCode) -> Result<Asset, TokenError> {
        Ok(self.get_stats(code)?.supply)
    }

    /// `owner`'s balance of `code`. Zero if the symbol exists but the owner
    /// has no record.
    ///
    /// # Errors
    ///
    /// [`TokenError::UnknownSymbol`] if the symbol was never created.
    pub fn get_balance(&self, owner: Name, code: SymbolCode) -> Result<Asset, TokenError> {
        match self.find_balance(owner, code)? {
            Some(balance) => Ok(balance),
            None => Ok(Asset::zero(self.get_stats(code)?.supply.symbol)),
        }
    }

    /// `owner`'s balance record of `code`, if one exists.
    pub fn find_balance(&self, owner: Name, code: SymbolCode) -> Result<Option<Asset>, TokenError> {
        self.read(|s| {
            Ok(s.find::<BalanceRecord>(owner.raw(), code.raw())?
                .map(|row| row.balance))
        })
    }

    /// Who pays for `owner`'s balance record of `code`.
    pub fn balance_payer(&self, owner: Name, code: SymbolCode) -> Result<Option<Name>, TokenError> {
        self.read(|s| Ok(s.payer_of::<BalanceRecord>(owner.raw(), code.raw())?))
    }

    /// `owner`'s vesting lock on `code`, active or expired.
    pub fn get_lock(&self, owner: Name, code: SymbolCode) -> Result<Option<LockRecord>, TokenError> {
        self.read(|s| Ok(s.find::<LockRecord>(owner.raw(), code.raw())?))
    }

    /// `true` if `owner` has an active lock on `code` right now.
    pub fn is_locked(&self, owner: Name, code: SymbolCode) -> Result<bool, TokenError> {
        let now = self.clock.now();
        Ok(self
            .get_lock(owner, code)?
            .map_or(false, |lock| lock.is_active(now)))
    }

    /// Sum of every balance record of `code`. Equals the supply whenever the
    /// ledger is consistent.
    pub fn circulating(&self, code: SymbolCode) -> Result<Asset, TokenError> {
        let symbol = self.get_stats(code)?.supply.symbol;
        let rows = self.read(|s| Ok(s.scan::<BalanceRecord>()?))?;
        let mut total = Asset::zero(symbol);
        for (_, _, row) in rows {
            if row.balance.code() == code {
                total = total.checked_add(&row.balance)?;
            }
        }
        Ok(total)
    }

    /// Every balance held by `owner`, in symbol-code order.
    pub fn balances_of(&self, owner: Name) -> Result<Vec<Asset>, TokenError> {
        let rows = self.read(|s| Ok(s.scan::<BalanceRecord>()?))?;
        Ok(rows
            .into_iter()
            .filter(|(scope, _, _)| *scope == owner.raw())
            .map(|(_, _, row)| row.balance)
            .collect())
    }
}
