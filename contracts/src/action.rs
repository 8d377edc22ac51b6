//! # Action Surface
//!
//! The actions a caller can submit. On the wire an action is a JSON object
//! tagged by its `"action"` field:
//!
//! ```json
//! {
//!   "action": "transfer",
//!   "from": "alice",
//!   "to": "bob",
//!   "quantity": "1.0000 TOK",
//!   "memo": "lunch",
//!   "authorization": ["alice"]
//! }
//! ```
//!
//! The `authorization` list belongs to the [`ActionEnvelope`], not to the
//! action: it names the accounts that signed, and the host turns it into an
//! [`Authorizer`](tally_ledger::Authorizer) before execution.

use serde::{Deserialize, Serialize};
use tally_ledger::{Asset, Name, Symbol, SymbolCode};

/// One token contract action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Registers a new symbol. Contract authority only.
    Create {
        issuer: Name,
        maximum_supply: Asset,
        #[serde(default)]
        transfer_locked: bool,
    },
    /// Mints to the issuer, then relays to `to` if different.
    Issue {
        to: Name,
        quantity: Asset,
        #[serde(default)]
        memo: String,
    },
    /// Issue, then place a vesting lock of `lock_duration` microseconds on
    /// the recipient.
    IssueLock {
        to: Name,
        quantity: Asset,
        #[serde(default)]
        memo: String,
        lock_duration: u64,
    },
    /// Destroys issuer-held supply.
    Retire {
        quantity: Asset,
        #[serde(default)]
        memo: String,
    },
    Transfer {
        from: Name,
        to: Name,
        quantity: Asset,
        #[serde(default)]
        memo: String,
    },
    /// Creates a zero balance record, paid for by `ram_payer`.
    Open {
        owner: Name,
        symbol: Symbol,
        ram_payer: Name,
    },
    /// Deletes a zero balance record.
    Close { owner: Name, symbol: Symbol },
    /// Turns the issuer co-signature requirement on transfers on or off.
    SetTransferLock { symbol: Symbol, locked: bool },
    /// Destroys holder-owned funds.
    Burn {
        from: Name,
        quantity: Asset,
        #[serde(default)]
        memo: String,
    },
    /// Removes an expired vesting lock.
    Unlock { owner: Name, symbol: SymbolCode },
}

impl Action {
    /// The action's wire name, as used in the `"action"` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Create { .. } => "create",
            Action::Issue { .. } => "issue",
            Action::IssueLock { .. } => "issue_lock",
            Action::Retire { .. } => "retire",
            Action::Transfer { .. } => "transfer",
            Action::Open { .. } => "open",
            Action::Close { .. } => "close",
            Action::SetTransferLock { .. } => "set_transfer_lock",
            Action::Burn { .. } => "burn",
            Action::Unlock { .. } => "unlock",
        }
    }
}

/// An action plus the accounts that authorized it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEnvelope {
    #[serde(flatten)]
    pub action: Action,
    #[serde(default)]
    pub authorization: Vec<Name>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_parses_from_tagged_json() {
        let json = r#"{
            "action": "transfer",
            "from": "alice",
            "to": "bob",
            "quantity": "1.5000 TOK",
            "authorization": ["alice"]
        }"#;
        let env: ActionEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.action.name(), "transfer");
        assert_eq!(env.authorization, vec![Name::constant("alice")]);
        match env.action {
            Action::Transfer { quantity, memo, .. } => {
                assert_eq!(quantity.amount, 15_000);
                assert!(memo.is_empty());
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn set_transfer_lock_uses_snake_case_tag() {
        let action = Action::SetTransferLock {
            symbol: "4,TOK".parse().unwrap(),
            locked: true,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "set_transfer_lock");
        assert_eq!(json["symbol"], "4,TOK");
    }

    #[test]
    fn unknown_action_rejected() {
        let json = r#"{"action": "mint", "to": "alice"}"#;
        assert!(serde_json::from_str::<ActionEnvelope>(json).is_err());
    }
}
