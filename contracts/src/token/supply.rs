//! Supply ledger: creating symbols, issuing and destroying supply, and the
//! symbol-wide transfer lock.

use tally_ledger::{choose_payer, Asset, InlineAuthority, Name, Symbol};

use super::{check_memo, check_quantity, check_symbol, TokenContract};
use crate::error::TokenError;
use crate::tables::SupplyRecord;

impl TokenContract<'_> {
    /// Registers a new symbol with zero supply.
    ///
    /// # Errors
    ///
    /// - [`TokenError::Unauthorized`] without the contract's own authority.
    /// - [`TokenError::InvalidSymbol`] / [`TokenError::InvalidQuantity`] for a
    ///   malformed or non-positive maximum.
    /// - [`TokenError::DuplicateSymbol`] if the symbol already exists.
    pub fn create(
        &mut self,
        issuer: Name,
        maximum_supply: Asset,
        transfer_locked: bool,
    ) -> Result<(), TokenError> {
        self.auth.require_auth(self.account)?;

        check_symbol(maximum_supply.symbol)?;
        if !maximum_supply.is_valid() {
            return Err(TokenError::InvalidQuantity("invalid supply".into()));
        }
        if maximum_supply.amount <= 0 {
            return Err(TokenError::InvalidQuantity(
                "max-supply must be positive".into(),
            ));
        }

        let code = maximum_supply.code();
        if self
            .session
            .find::<SupplyRecord>(code.raw(), code.raw())?
            .is_some()
        {
            return Err(TokenError::DuplicateSymbol(code));
        }

        let stat = SupplyRecord {
            supply: Asset::zero(maximum_supply.symbol),
            max_supply: maximum_supply,
            issuer,
            transfer_locked,
        };
        self.session.insert(code.raw(), self.account, &stat)?;
        Ok(())
    }

    /// Mints `quantity` onto the issuer's balance, relays it to `to` when
    /// `to` is someone else, and optionally locks the recipient's balance for
    /// `lock` microseconds.
    ///
    /// The relay is an ordinary [`transfer`](Self::transfer) run under the
    /// issuer's authority alone, so it checks and notifies exactly like a
    /// transfer the issuer submitted.
    ///
    /// # Errors
    ///
    /// [`TokenError::UnknownSymbol`], [`TokenError::Unauthorized`] without
    /// the issuer, [`TokenError::InvalidQuantity`],
    /// [`TokenError::SupplyExceeded`], plus anything the relay transfer or
    /// the lock rejects with.
    pub fn issue(
        &mut self,
        to: Name,
        quantity: Asset,
        memo: &str,
        lock: Option<u64>,
    ) -> Result<(), TokenError> {
        check_symbol(quantity.symbol)?;
        check_memo(memo)?;

        let mut stat = self.supply_record(quantity.code())?;
        self.auth.require_auth(stat.issuer)?;
        check_quantity(quantity, stat.supply.symbol, "issue")?;

        let available = stat.available();
        if quantity.amount > available.amount {
            return Err(TokenError::SupplyExceeded {
                requested: quantity,
                available,
            });
        }

        stat.supply = stat.supply.checked_add(&quantity)?;
        self.write_supply(&stat)?;

        let issuer = stat.issuer;
        self.add_balance(issuer, quantity, issuer)?;

        if to != issuer {
            let outer = self.auth;
            let inline = InlineAuthority::new(issuer, outer);
            self.transfer_with(&inline, issuer, to, quantity, memo)?;
        }

        if let Some(duration) = lock {
            let payer = choose_payer(to, issuer, self.auth);
            self.lock(to, quantity, duration, payer)?;
        }

        tracing::debug!(%to, %quantity, locked = lock.is_some(), "issued");
        Ok(())
    }

    /// Destroys `quantity` of the issuer's own balance.
    ///
    /// A vesting lock on the issuer does not block `retire`, unlike
    /// [`burn`](Self::burn).
    ///
    /// # Errors
    ///
    /// [`TokenError::UnknownSymbol`], [`TokenError::Unauthorized`] without
    /// the issuer, [`TokenError::InvalidQuantity`],
    /// [`TokenError::InsufficientBalance`].
    pub fn retire(&mut self, quantity: Asset, memo: &str) -> Result<(), TokenError> {
        check_symbol(quantity.symbol)?;
        check_memo(memo)?;

        let mut stat = self.supply_record(quantity.code())?;
        self.auth.require_auth(stat.issuer)?;
        check_quantity(quantity, stat.supply.symbol, "retire")?;

        stat.supply = stat.supply.checked_sub(&quantity)?;
        self.write_supply(&stat)?;

        self.sub_balance(stat.issuer, quantity)
    }

    /// Destroys `quantity` of `from`'s balance. Unlike
    /// [`retire`](Self::retire) this is the holder's call, not the issuer's,
    /// and it respects vesting locks.
    ///
    /// # Errors
    ///
    /// [`TokenError::Unauthorized`] without `from`,
    /// [`TokenError::BalanceLocked`], [`TokenError::UnknownSymbol`],
    /// [`TokenError::InvalidQuantity`], [`TokenError::InsufficientBalance`].
    pub fn burn(&mut self, from: Name, quantity: Asset, memo: &str) -> Result<(), TokenError> {
        check_symbol(quantity.symbol)?;
        check_memo(memo)?;
        self.auth.require_auth(from)?;
        self.ensure_unlocked(from, quantity.code())?;

        let mut stat = self.supply_record(quantity.code())?;
        check_quantity(quantity, stat.supply.symbol, "burn")?;

        stat.supply = stat.supply.checked_sub(&quantity)?;
        self.write_supply(&stat)?;

        self.sub_balance(from, quantity)
    }

    /// Sets whether transfers of `symbol` need the issuer's co-signature.
    /// Existing balances are untouched.
    ///
    /// # Errors
    ///
    /// [`TokenError::InvalidSymbol`], [`TokenError::UnknownSymbol`],
    /// [`TokenError::Unauthorized`] without the issuer.
    pub fn set_transfer_lock(&mut self, symbol: Symbol, locked: bool) -> Result<(), TokenError> {
        check_symbol(symbol)?;
        let mut stat = self.supply_record(symbol.code())?;
        self.auth.require_auth(stat.issuer)?;

        stat.transfer_locked = locked;
        self.write_supply(&stat)
    }
}
