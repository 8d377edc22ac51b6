//! # Host Collaborators
//!
//! The token contract doesn't know how signatures are checked, where
//! accounts come from, or who is listening for transfers. It asks the host
//! through two narrow traits:
//!
//! - [`Authorizer`]: "has this account authorized the current action?" and
//!   "does this account exist?"
//! - [`Notifier`]: "tell this account's handlers about a transfer."
//!
//! Plus one policy function, [`choose_payer`], which picks who pays for a
//! new record's storage based on who signed.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

use crate::asset::Asset;
use crate::name::Name;

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

/// Authorization failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The action does not carry this account's authority.
    #[error("missing authority of {0}")]
    MissingAuthority(Name),
}

/// The host's view of who is acting and who exists.
pub trait Authorizer: Send + Sync {
    /// `true` if `account` authorized the current action. Never fails.
    fn has_auth(&self, account: Name) -> bool;

    /// `true` if `account` is a registered account.
    fn is_account(&self, account: Name) -> bool;

    /// Fails the operation unless `account` authorized it.
    fn require_auth(&self, account: Name) -> Result<(), AuthError> {
        if self.has_auth(account) {
            Ok(())
        } else {
            Err(AuthError::MissingAuthority(account))
        }
    }
}

/// Storage payer policy: `candidate` pays if it signed, otherwise `fallback`.
///
/// Used wherever a record is created on behalf of an account that may not
/// be party to the action (a transfer recipient, a vesting beneficiary).
pub fn choose_payer(candidate: Name, fallback: Name, auth: &dyn Authorizer) -> Name {
    if auth.has_auth(candidate) {
        candidate
    } else {
        fallback
    }
}

/// The set of accounts known to the host.
///
/// Cheap to share: clone the `Arc` it usually lives in.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: RwLock<BTreeSet<Name>>,
}

impl AccountRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with `accounts`.
    pub fn with_accounts<I: IntoIterator<Item = Name>>(accounts: I) -> Self {
        Self {
            accounts: RwLock::new(accounts.into_iter().collect()),
        }
    }

    /// Adds an account. Returns `false` if it was already registered.
    pub fn register(&self, account: Name) -> bool {
        self.accounts.write().insert(account)
    }

    /// `true` if `account` is registered.
    pub fn contains(&self, account: Name) -> bool {
        self.accounts.read().contains(&account)
    }

    /// Number of registered accounts.
    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }

    /// Snapshot of all registered accounts, in name order.
    pub fn accounts(&self) -> Vec<Name> {
        self.accounts.read().iter().copied().collect()
    }
}

/// Authority for one submitted action: the accounts that signed it, checked
/// against the host's registry.
#[derive(Debug, Clone)]
pub struct ActionAuthority {
    signers: BTreeSet<Name>,
    registry: Arc<AccountRegistry>,
}

impl ActionAuthority {
    /// Builds the authority for an action signed by `signers`.
    pub fn new<I: IntoIterator<Item = Name>>(signers: I, registry: Arc<AccountRegistry>) -> Self {
        Self {
            signers: signers.into_iter().collect(),
            registry,
        }
    }

    /// The declared signers.
    pub fn signers(&self) -> impl Iterator<Item = Name> + '_ {
        self.signers.iter().copied()
    }
}

impl Authorizer for ActionAuthority {
    fn has_auth(&self, account: Name) -> bool {
        self.signers.contains(&account)
    }

    fn is_account(&self, account: Name) -> bool {
        self.registry.contains(account)
    }
}

/// Authority of an inline call made by the contract on an account's behalf.
///
/// Only `actor` is authorized, whatever the outer action carried. Account
/// existence is still answered by the parent.
pub struct InlineAuthority<'a> {
    actor: Name,
    parent: &'a dyn Authorizer,
}

impl<'a> InlineAuthority<'a> {
    /// Runs as `actor`, deferring account lookups to `parent`.
    pub fn new(actor: Name, parent: &'a dyn Authorizer) -> Self {
        Self { actor, parent }
    }
}

impl Authorizer for InlineAuthority<'_> {
    fn has_auth(&self, account: Name) -> bool {
        account == self.actor
    }

    fn is_account(&self, account: Name) -> bool {
        self.parent.is_account(account)
    }
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// What a transfer recipient (and sender) are told.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferNotice {
    /// Debited account.
    pub from: Name,
    /// Credited account.
    pub to: Name,
    /// Amount moved.
    pub quantity: Asset,
    /// Free-form memo, at most 256 bytes.
    pub memo: String,
}

/// Delivers transfer notices to an account's registered handlers.
///
/// Fire-and-forget: the ledger never waits on, or fails because of, a
/// notification.
pub trait Notifier: Send + Sync {
    /// Informs `recipient` that `notice` touched it.
    fn notify(&self, recipient: Name, notice: &TransferNotice);
}

/// Drops every notice.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _recipient: Name, _notice: &TransferNotice) {}
}

/// Keeps every notice in delivery order. Meant for tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<(Name, TransferNotice)>>,
}

impl RecordingNotifier {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far.
    pub fn delivered(&self) -> Vec<(Name, TransferNotice)> {
        self.delivered.lock().clone()
    }

    /// Recipients in delivery order.
    pub fn recipients(&self) -> Vec<Name> {
        self.delivered.lock().iter().map(|(r, _)| *r).collect()
    }

    /// Forgets everything delivered so far.
    pub fn clear(&self) {
        self.delivered.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, recipient: Name, notice: &TransferNotice) {
        self.delivered.lock().push((recipient, notice.clone()));
    }
}
