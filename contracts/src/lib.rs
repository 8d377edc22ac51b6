// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tally Token Contract
//!
//! The fungible-asset ledger: for each symbol a supply record, for each
//! (account, symbol) a balance, and a vesting sub-ledger that can freeze an
//! account's balance of a symbol until a maturity time.
//!
//! - **Supply Ledger**: create, issue, retire, burn, and the symbol-wide
//!   transfer lock.
//! - **Balance Ledger**: transfer, open, close.
//! - **Vesting Sub-Ledger**: time locks placed at issuance, and their
//!   removal once expired.
//!
//! ## Design Principles
//!
//! 1. Every amount is an [`Asset`](tally_ledger::Asset). Arithmetic is
//!    checked and refuses to mix symbols.
//! 2. An action either commits every record it touched or none of them.
//!    [`TokenLedger::execute`] runs each action in its own storage session.
//! 3. Authority, account existence, time, and notification are host
//!    collaborators passed in, never looked up globally.
//! 4. The issuance relay is a real transfer, run under the issuer's
//!    authority alone.

pub mod action;
pub mod error;
pub mod ledger;
pub mod tables;
pub mod token;

pub use action::{Action, ActionEnvelope};
pub use error::TokenError;
pub use ledger::{Receipt, TokenLedger};
pub use tables::{BalanceRecord, LockRecord, SupplyRecord};
pub use token::TokenContract;
