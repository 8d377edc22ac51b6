//! Balance ledger: moving value between accounts and managing the balance
//! rows themselves.

use tally_ledger::{choose_payer, Asset, Authorizer, Name, Symbol, SymbolCode, TransferNotice};

use super::{check_memo, check_quantity, check_symbol, TokenContract};
use crate::error::TokenError;
use crate::tables::BalanceRecord;

impl TokenContract<'_> {
    /// Moves `quantity` from `from` to `to` under the action's authority.
    ///
    /// # Errors
    ///
    /// In check order: [`TokenError::SelfTransfer`],
    /// [`TokenError::Unauthorized`] (sender, or issuer when the symbol is
    /// transfer-locked), [`TokenError::BalanceLocked`],
    /// [`TokenError::AccountNotFound`], [`TokenError::UnknownSymbol`],
    /// [`TokenError::InvalidQuantity`], [`TokenError::MemoTooLong`],
    /// [`TokenError::InsufficientBalance`].
    pub fn transfer(
        &mut self,
        from: Name,
        to: Name,
        quantity: Asset,
        memo: &str,
    ) -> Result<(), TokenError> {
        let auth = self.auth;
        self.transfer_with(auth, from, to, quantity, memo)
    }

    /// [`transfer`](Self::transfer) under an explicit authority. Issuance
    /// uses this to relay freshly minted funds as the issuer.
    pub(super) fn transfer_with(
        &mut self,
        auth: &dyn Authorizer,
        from: Name,
        to: Name,
        quantity: Asset,
        memo: &str,
    ) -> Result<(), TokenError> {
        if from == to {
            return Err(TokenError::SelfTransfer);
        }
        auth.require_auth(from)?;
        self.ensure_unlocked(from, quantity.code())?;
        if !auth.is_account(to) {
            return Err(TokenError::AccountNotFound(to));
        }

        let stat = self.supply_record(quantity.code())?;
        if stat.transfer_locked {
            auth.require_auth(stat.issuer)?;
        }

        let notice = TransferNotice {
            from,
            to,
            quantity,
            memo: memo.to_owned(),
        };
        self.notices.push((from, notice.clone()));
        self.notices.push((to, notice));

        check_quantity(quantity, stat.supply.symbol, "transfer")?;
        check_memo(memo)?;

        let payer = choose_payer(to, from, auth);
        self.sub_balance(from, quantity)?;
        self.add_balance(to, quantity, payer)
    }

    /// Makes sure `owner` has a balance row for `symbol`, creating a zero one
    /// paid for by `ram_payer`. A no-op if the row exists.
    ///
    /// # Errors
    ///
    /// [`TokenError::Unauthorized`] without `ram_payer`,
    /// [`TokenError::UnknownSymbol`], [`TokenError::InvalidQuantity`] on
    /// precision mismatch. `owner` need not be a known account.
    pub fn open(&mut self, owner: Name, symbol: Symbol, ram_payer: Name) -> Result<(), TokenError> {
        self.auth.require_auth(ram_payer)?;
        check_symbol(symbol)?;

        let stat = self.supply_record(symbol.code())?;
        if stat.supply.symbol != symbol {
            return Err(TokenError::InvalidQuantity(format!(
                "symbol precision mismatch: expected {}, found {symbol}",
                stat.supply.symbol
            )));
        }

        if self.balance_of(owner, symbol.code())?.is_none() {
            let row = BalanceRecord {
                balance: Asset::zero(symbol),
            };
            self.session.insert(owner.raw(), ram_payer, &row)?;
        }
        Ok(())
    }

    /// Deletes `owner`'s zero balance row for `symbol`.
    ///
    /// # Errors
    ///
    /// [`TokenError::Unauthorized`] without `owner`,
    /// [`TokenError::BalanceNotFound`], [`TokenError::NonZeroClose`].
    pub fn close(&mut self, owner: Name, symbol: Symbol) -> Result<(), TokenError> {
        self.auth.require_auth(owner)?;
        let code = symbol.code();
        let balance = self
            .balance_of(owner, code)?
            .ok_or(TokenError::BalanceNotFound {
                owner,
                symbol: code,
            })?;
        if balance.amount != 0 {
            return Err(TokenError::NonZeroClose(balance));
        }
        self.session.erase::<BalanceRecord>(owner.raw(), code.raw())?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Primitives
    // -----------------------------------------------------------------------

    /// `owner`'s balance row for `code`, if any.
    pub(crate) fn balance_of(
        &self,
        owner: Name,
        code: SymbolCode,
    ) -> Result<Option<Asset>, TokenError> {
        Ok(self
            .session
            .find::<BalanceRecord>(owner.raw(), code.raw())?
            .map(|row| row.balance))
    }

    /// Who pays for `owner`'s balance row for `code`.
    #[cfg(test)]
    pub(crate) fn balance_payer(
        &self,
        owner: Name,
        code: SymbolCode,
    ) -> Result<Option<Name>, TokenError> {
        Ok(self
            .session
            .payer_of::<BalanceRecord>(owner.raw(), code.raw())?)
    }

    /// Debits `owner`. The row's storage is re-assigned to `owner`.
    pub(super) fn sub_balance(&mut self, owner: Name, value: Asset) -> Result<(), TokenError> {
        let short = || TokenError::InsufficientBalance {
            owner,
            requested: value,
        };
        let balance = self.balance_of(owner, value.code())?.ok_or_else(short)?;
        if balance.amount < value.amount {
            return Err(short());
        }
        let row = BalanceRecord {
            balance: balance.checked_sub(&value)?,
        };
        self.session.update(owner.raw(), &row, Some(owner))?;
        Ok(())
    }

    /// Credits `owner`, creating the row at `payer`'s expense if needed.
    pub(super) fn add_balance(
        &mut self,
        owner: Name,
        value: Asset,
        payer: Name,
    ) -> Result<(), TokenError> {
        match self.balance_of(owner, value.code())? {
            Some(balance) => {
                let row = BalanceRecord {
                    balance: balance.checked_add(&value)?,
                };
                self.session.update(owner.raw(), &row, None)?;
            }
            None => {
                self.session
                    .insert(owner.raw(), payer, &BalanceRecord { balance: value })?;
            }
        }
        Ok(())
    }
}
