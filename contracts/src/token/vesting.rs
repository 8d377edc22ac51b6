//! Vesting sub-ledger.
//!
//! A lock holds no funds. It only records that, until `unlock_at`, the
//! owner may not move or burn any of that symbol. Expired locks stay in the
//! table, inert, until the owner removes them with [`unlock`].
//!
//! [`unlock`]: TokenContract::unlock

use tally_ledger::{Asset, Name, SymbolCode};

use super::TokenContract;
use crate::error::TokenError;
use crate::tables::LockRecord;

impl TokenContract<'_> {
    /// Places a lock on `to`'s balance of `quantity`'s symbol for
    /// `duration` microseconds from now, at `payer`'s storage expense.
    ///
    /// # Errors
    ///
    /// [`TokenError::DuplicateLock`] if any lock record exists for the pair,
    /// expired or not. [`TokenError::InvalidLockDuration`] if the unlock time
    /// overflows.
    pub(super) fn lock(
        &mut self,
        to: Name,
        quantity: Asset,
        duration: u64,
        payer: Name,
    ) -> Result<(), TokenError> {
        let code = quantity.code();
        if self.lock_of(to, code)?.is_some() {
            return Err(TokenError::DuplicateLock {
                owner: to,
                symbol: code,
            });
        }
        let unlock_at = self
            .now
            .checked_add_micros(duration)
            .ok_or(TokenError::InvalidLockDuration(duration))?;

        let record = LockRecord {
            locked: quantity,
            created_at: self.now,
            unlock_at,
        };
        self.session.insert(to.raw(), payer, &record)?;
        tracing::debug!(owner = %to, %quantity, %unlock_at, "vesting lock placed");
        Ok(())
    }

    /// `true` while `owner` has an unexpired lock on `code`.
    pub fn is_locked(&self, owner: Name, code: SymbolCode) -> Result<bool, TokenError> {
        Ok(self
            .lock_of(owner, code)?
            .map_or(false, |lock| lock.is_active(self.now)))
    }

    /// Removes `owner`'s expired lock on `symbol`, which allows a new lock
    /// to be placed.
    ///
    /// # Errors
    ///
    /// [`TokenError::Unauthorized`] without `owner`,
    /// [`TokenError::LockNotFound`], [`TokenError::BalanceLocked`] while the
    /// lock is still active.
    pub fn unlock(&mut self, owner: Name, symbol: SymbolCode) -> Result<(), TokenError> {
        self.auth.require_auth(owner)?;
        self.lock_of(owner, symbol)?
            .ok_or(TokenError::LockNotFound { owner, symbol })?;
        self.ensure_unlocked(owner, symbol)?;
        self.session.erase::<LockRecord>(owner.raw(), symbol.raw())?;
        Ok(())
    }

    pub(crate) fn lock_of(
        &self,
        owner: Name,
        code: SymbolCode,
    ) -> Result<Option<LockRecord>, TokenError> {
        Ok(self.session.find::<LockRecord>(owner.raw(), code.raw())?)
    }

    /// Fails with [`TokenError::BalanceLocked`] while a lock is active.
    pub(super) fn ensure_unlocked(&self, owner: Name, code: SymbolCode) -> Result<(), TokenError> {
        match self.lock_of(owner, code)? {
            Some(lock) if lock.is_active(self.now) => Err(TokenError::BalanceLocked {
                owner,
                symbol: code,
                unlock_at: lock.unlock_at,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::action::Action;
    use crate::error::TokenError;
    use tally_ledger::{Name, SymbolCode, TimePoint};

    const HOUR: u64 = 3_600_000_000;

    fn tok() -> SymbolCode {
        "TOK".parse().unwrap()
    }

    fn issue_locked(h: &Harness, to: Name, quantity: &str, duration: u64) -> Result<(), TokenError> {
        h.run(
            Action::IssueLock {
                to,
                quantity: quantity.parse().unwrap(),
                memo: String::new(),
                lock_duration: duration,
            },
            &[ALICE],
        )
    }

    fn send(h: &Harness, from: Name, to: Name) -> Result<(), TokenError> {
        h.run(
            Action::Transfer {
                from,
                to,
                quantity: "1.0000 TOK".parse().unwrap(),
                memo: String::new(),
            },
            &[from],
        )
    }

    #[test]
    fn lock_blocks_transfers_until_maturity() {
        let mut h = Harness::new().with_token(false);
        issue_locked(&h, BOB, "50.0000 TOK", HOUR).unwrap();

        let lock = h.inspect(|c| c.lock_of(BOB, tok()).unwrap()).unwrap();
        assert_eq!(lock.created_at, h.now);
        assert_eq!(lock.unlock_at.as_micros(), h.now.as_micros() + HOUR);

        let err = send(&h, BOB, CAROL).unwrap_err();
        assert_eq!(err.kind(), "balance_locked");

        h.now = lock.unlock_at;
        send(&h, BOB, CAROL).unwrap();
        assert!(!h.inspect(|c| c.is_locked(BOB, tok()).unwrap()));
    }

    #[test]
    fn lock_is_all_or_nothing() {
        let h = Harness::new().with_token(false);
        issue_locked(&h, BOB, "1.0000 TOK", HOUR).unwrap();
        // Funds that arrive later are frozen too.
        h.issue(BOB, "100.0000 TOK");
        assert_eq!(send(&h, BOB, CAROL).unwrap_err().kind(), "balance_locked");
    }

    #[test]
    fn lock_blocks_burn() {
        let h = Harness::new().with_token(false);
        issue_locked(&h, BOB, "5.0000 TOK", HOUR).unwrap();
        let err = h
            .run(
                Action::Burn {
                    from: BOB,
                    quantity: "1.0000 TOK".parse().unwrap(),
                    memo: String::new(),
                },
                &[BOB],
            )
            .unwrap_err();
        assert_eq!(err.kind(), "balance_locked");
    }

    #[test]
    fn second_lock_rejected_even_after_expiry() {
        let mut h = Harness::new().with_token(false);
        issue_locked(&h, BOB, "5.0000 TOK", HOUR).unwrap();
        assert_eq!(
            issue_locked(&h, BOB, "5.0000 TOK", HOUR).unwrap_err(),
            TokenError::DuplicateLock {
                owner: BOB,
                symbol: tok()
            }
        );

        h.now = TimePoint::from_micros(h.now.as_micros() + 2 * HOUR);
        assert_eq!(
            issue_locked(&h, BOB, "5.0000 TOK", HOUR).unwrap_err().kind(),
            "duplicate_lock"
        );
    }

    #[test]
    fn unlock_removes_only_expired_locks() {
        let mut h = Harness::new().with_token(false);
        let unlock = Action::Unlock {
            owner: BOB,
            symbol: tok(),
        };
        assert_eq!(
            h.run(unlock.clone(), &[BOB]).unwrap_err().kind(),
            "lock_not_found"
        );

        issue_locked(&h, BOB, "5.0000 TOK", HOUR).unwrap();
        assert_eq!(
            h.run(unlock.clone(), &[BOB]).unwrap_err().kind(),
            "balance_locked"
        );
        assert_eq!(
            h.run(unlock.clone(), &[ALICE]).unwrap_err(),
            TokenError::Unauthorized(BOB)
        );

        h.now = TimePoint::from_micros(h.now.as_micros() + HOUR);
        h.run(unlock, &[BOB]).unwrap();
        assert!(h.inspect(|c| c.lock_of(BOB, tok()).unwrap()).is_none());

        // A fresh lock may now be placed.
        issue_locked(&h, BOB, "1.0000 TOK", HOUR).unwrap();
        assert!(h.inspect(|c| c.is_locked(BOB, tok()).unwrap()));
    }

    #[test]
    fn lock_payer_follows_recipient_signature() {
        let h = Harness::new().with_token(false);
        issue_locked(&h, BOB, "1.0000 TOK", HOUR).unwrap();
        let payer = h.inspect(|c| {
            c.session
                .payer_of::<crate::tables::LockRecord>(BOB.raw(), tok().raw())
                .unwrap()
        });
        assert_eq!(payer, Some(ALICE));

        h.run(
            Action::IssueLock {
                to: CAROL,
                quantity: "1.0000 TOK".parse().unwrap(),
                memo: String::new(),
                lock_duration: HOUR,
            },
            &[ALICE, CAROL],
        )
        .unwrap();
        let payer = h.inspect(|c| {
            c.session
                .payer_of::<crate::tables::LockRecord>(CAROL.raw(), tok().raw())
                .unwrap()
        });
        assert_eq!(payer, Some(CAROL));
    }

    #[test]
    fn overflowing_duration_rejected_and_rolled_back() {
        let h = Harness::new().with_token(false);
        let err = issue_locked(&h, BOB, "1.0000 TOK", u64::MAX).unwrap_err();
        assert_eq!(err, TokenError::InvalidLockDuration(u64::MAX));
        let supply = h.inspect(|c| c.supply_record(tok()).unwrap()).supply;
        assert_eq!(supply.amount, 0);
    }
}
