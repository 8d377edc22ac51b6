//! # Token Contract
//!
//! The rules of the ledger. A [`TokenContract`] is built for exactly one
//! action: it holds the session that action writes through, the authority
//! it runs under, and the single "now" it was started at.
//!
//! ## Layout
//!
//! ```text
//! supply.rs : create, issue, retire, burn, set_transfer_lock
//! balance.rs: transfer, open, close, sub_balance, add_balance
//! vesting.rs: lock, is_locked, unlock
//! ```
//!
//! ## Atomicity
//!
//! Operations mutate the session as they go and return early on the first
//! failed check. That is safe because the caller only commits the session
//! when the whole action succeeded. Notices queued by a failed action are
//! dropped with it.

mod balance;
mod supply;
mod vesting;

use tally_ledger::{
    Asset, Authorizer, Name, Session, Symbol, SymbolCode, TimePoint, TransferNotice,
};

use crate::action::Action;
use crate::error::TokenError;
use crate::tables::SupplyRecord;
use tally_ledger::config::MAX_MEMO_BYTES;

/// One action's view of the token contract.
pub struct TokenContract<'a> {
    account: Name,
    session: Session<'a>,
    auth: &'a dyn Authorizer,
    now: TimePoint,
    notices: Vec<(Name, TransferNotice)>,
}

impl<'a> TokenContract<'a> {
    /// Prepares to run one action as contract `account`.
    pub fn new(
        account: Name,
        session: Session<'a>,
        auth: &'a dyn Authorizer,
        now: TimePoint,
    ) -> Self {
        Self {
            account,
            session,
            auth,
            now,
            notices: Vec::new(),
        }
    }

    /// The contract's own account.
    pub fn account(&self) -> Name {
        self.account
    }

    /// The time this action runs at.
    pub fn now(&self) -> TimePoint {
        self.now
    }

    /// Routes `action` to its operation.
    ///
    /// # Errors
    ///
    /// Whatever the operation rejects with.
    pub fn dispatch(&mut self, action: &Action) -> Result<(), TokenError> {
        match action {
            Action::Create {
                issuer,
                maximum_supply,
                transfer_locked,
            } => self.create(*issuer, *maximum_supply, *transfer_locked),
            Action::Issue { to, quantity, memo } => self.issue(*to, *quantity, memo, None),
            Action::IssueLock {
                to,
                quantity,
                memo,
                lock_duration,
            } => self.issue(*to, *quantity, memo, Some(*lock_duration)),
            Action::Retire { quantity, memo } => self.retire(*quantity, memo),
            Action::Transfer {
                from,
                to,
                quantity,
                memo,
            } => self.transfer(*from, *to, *quantity, memo),
            Action::Open {
                owner,
                symbol,
                ram_payer,
            } => self.open(*owner, *symbol, *ram_payer),
            Action::Close { owner, symbol } => self.close(*owner, *symbol),
            Action::SetTransferLock { symbol, locked } => self.set_transfer_lock(*symbol, *locked),
            Action::Burn {
                from,
                quantity,
                memo,
            } => self.burn(*from, *quantity, memo),
            Action::Unlock { owner, symbol } => self.unlock(*owner, *symbol),
        }
    }

    /// Hands back the session and the notices this action queued.
    pub fn finish(self) -> (Session<'a>, Vec<(Name, TransferNotice)>) {
        (self.session, self.notices)
    }

    // -----------------------------------------------------------------------
    // Shared checks
    // -----------------------------------------------------------------------

    fn supply_record(&self, code: SymbolCode) -> Result<SupplyRecord, TokenError> {
        self.session
            .find::<SupplyRecord>(code.raw(), code.raw())?
            .ok_or(TokenError::UnknownSymbol(code))
    }

    fn write_supply(&mut self, stat: &SupplyRecord) -> Result<(), TokenError> {
        self.session.update(stat.code().raw(), stat, None)?;
        Ok(())
    }
}

fn check_symbol(symbol: Symbol) -> Result<(), TokenError> {
    if symbol.is_valid() {
        Ok(())
    } else {
        Err(TokenError::InvalidSymbol(symbol.to_string()))
    }
}

fn check_memo(memo: &str) -> Result<(), TokenError> {
    if memo.len() > MAX_MEMO_BYTES {
        return Err(TokenError::MemoTooLong { len: memo.len() });
    }
    Ok(())
}

/// Valid, strictly positive, and in the record's exact symbol.
fn check_quantity(quantity: Asset, expected: Symbol, verb: &str) -> Result<(), TokenError> {
    if !quantity.is_valid() {
        return Err(TokenError::InvalidQuantity(format!("invalid quantity {quantity}")));
    }
    if quantity.amount <= 0 {
        return Err(TokenError::InvalidQuantity(format!(
            "must {verb} positive quantity"
        )));
    }
    if quantity.symbol != expected {
        return Err(TokenError::InvalidQuantity(format!(
            "symbol precision mismatch: expected {expected}, found {}",
            quantity.symbol
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use tally_ledger::{AccountRegistry, ActionAuthority, MemoryStore, Name, Session, TimePoint};

    use super::TokenContract;
    use crate::action::Action;
    use crate::error::TokenError;

    pub const CONTRACT: Name = Name::constant("tally.token");
    pub const ALICE: Name = Name::constant("alice");
    pub const BOB: Name = Name::constant("bob");
    pub const CAROL: Name = Name::constant("carol");

    /// A memory store plus the account registry, with helpers that run one
    /// action per session and commit on success.
    pub struct Harness {
        pub store: MemoryStore,
        pub registry: Arc<AccountRegistry>,
        pub now: TimePoint,
    }

    impl Harness {
        pub fn new() -> Self {
            Self {
                store: MemoryStore::new(),
                registry: Arc::new(AccountRegistry::with_accounts([
                    CONTRACT, ALICE, BOB, CAROL,
                ])),
                now: TimePoint::from_secs(1_000),
            }
        }

        pub fn run(&self, action: Action, signers: &[Name]) -> Result<(), TokenError> {
            let auth = ActionAuthority::new(signers.iter().copied(), self.registry.clone());
            let mut contract =
                TokenContract::new(CONTRACT, Session::new(&self.store), &auth, self.now);
            contract.dispatch(&action)?;
            let (session, _) = contract.finish();
            session.commit()?;
            Ok(())
        }

        /// Runs `f` against a fresh contract and returns its result without
        /// committing.
        pub fn inspect<T>(&self, f: impl FnOnce(&mut TokenContract<'_>) -> T) -> T {
            let auth = ActionAuthority::new([], self.registry.clone());
            let mut contract =
                TokenContract::new(CONTRACT, Session::new(&self.store), &auth, self.now);
            f(&mut contract)
        }

        /// `create` of "1000.0000 TOK" issued by alice.
        pub fn with_token(self, transfer_locked: bool) -> Self {
            self.run(
                Action::Create {
                    issuer: ALICE,
                    maximum_supply: "1000.0000 TOK".parse().unwrap(),
                    transfer_locked,
                },
                &[CONTRACT],
            )
            .unwrap();
            self
        }

        pub fn issue(&self, to: Name, quantity: &str) {
            self.run(
                Action::Issue {
                    to,
                    quantity: quantity.parse().unwrap(),
                    memo: String::new(),
                },
                &[ALICE],
            )
            .unwrap();
        }
    }
}
