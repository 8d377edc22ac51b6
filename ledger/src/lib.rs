// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tally Ledger: Host Primitives
//!
//! Everything the token contract needs from its surroundings, and nothing
//! it should decide for itself. The contract owns the rules about supply and
//! balances; this crate owns the vocabulary those rules are written in and
//! the machinery that makes a mutation stick (or not).
//!
//! ## Modules
//!
//! - **name**: 64-bit packed account and table names.
//! - **asset**: symbol codes, symbols, and signed quantities with
//!   range-checked arithmetic.
//! - **time**: microsecond time points and the clock collaborator.
//! - **host**: authorization and notification collaborators, plus the
//!   storage payer policy.
//! - **storage**: keyed-record tables over pluggable backends (memory,
//!   sled) with write-buffered sessions that commit all-or-nothing.
//! - **config**: ledger constants.
//!
//! ## Design Philosophy
//!
//! 1. Money is an `i64` tagged with a symbol. Never a float, never untagged.
//! 2. A failed operation leaves no trace: mutations are buffered in a
//!    [`storage::Session`] and only reach the backend on commit.
//! 3. Collaborators are traits. The contract never reaches for a global.

pub mod asset;
pub mod config;
pub mod host;
pub mod name;
pub mod storage;
pub mod time;

pub use asset::{Asset, AssetError, Symbol, SymbolCode};
pub use host::{
    choose_payer, AccountRegistry, ActionAuthority, AuthError, Authorizer, InlineAuthority,
    Notifier, NullNotifier, RecordingNotifier, TransferNotice,
};
pub use name::{Name, NameError};
pub use storage::{MemoryStore, Record, Session, SledStore, StateStore, StoreError};
pub use time::{Clock, ManualClock, SystemClock, TimePoint};
