//! Integration tests for the token ledger.
//!
//! These drive [`TokenLedger`] end to end through actions, the way a host
//! would: create a symbol, issue, move funds around, close accounts, and
//! check the books balance after every step.

use std::sync::Arc;

use tally_contracts::{Action, ActionEnvelope, TokenError, TokenLedger};
use tally_ledger::{
    AccountRegistry, ActionAuthority, ManualClock, MemoryStore, Name, RecordingNotifier,
    SledStore, StateStore, SymbolCode, TimePoint,
};

const CONTRACT: Name = Name::constant("tally.token");
const ISSUER: Name = Name::constant("issuer");
const ALICE: Name = Name::constant("alice");
const BOB: Name = Name::constant("bob");

struct Host {
    ledger: TokenLedger,
    registry: Arc<AccountRegistry>,
    notifier: Arc<RecordingNotifier>,
}

impl Host {
    fn with_store(store: Arc<dyn StateStore>) -> Self {
        let registry = Arc::new(AccountRegistry::with_accounts([CONTRACT, ISSUER, ALICE, BOB]));
        let notifier = Arc::new(RecordingNotifier::new());
        let clock = Arc::new(ManualClock::new(TimePoint::from_secs(1_700_000_000)));
        Self {
            ledger: TokenLedger::new(CONTRACT, store, clock, notifier.clone()),
            registry,
            notifier,
        }
    }

    fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    fn exec(&self, action: Action, signers: &[Name]) -> Result<(), TokenError> {
        let auth = ActionAuthority::new(signers.iter().copied(), self.registry.clone());
        self.ledger.execute(&action, &auth).map(|_| ())
    }

    fn balance(&self, owner: Name) -> i64 {
        self.ledger.get_balance(owner, sym()).unwrap().amount
    }

    fn assert_conserved(&self) {
        assert_eq!(
            self.ledger.circulating(sym()).unwrap(),
            self.ledger.get_supply(sym()).unwrap()
        );
    }
}

fn sym() -> SymbolCode {
    "GOLD".parse().unwrap()
}

fn create(max: &str, transfer_locked: bool) -> Action {
    Action::Create {
        issuer: ISSUER,
        maximum_supply: max.parse().unwrap(),
        transfer_locked,
    }
}

fn issue(to: Name, quantity: &str) -> Action {
    Action::Issue {
        to,
        quantity: quantity.parse().unwrap(),
        memo: String::new(),
    }
}

fn transfer(from: Name, to: Name, quantity: &str) -> Action {
    Action::Transfer {
        from,
        to,
        quantity: quantity.parse().unwrap(),
        memo: String::new(),
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn full_lifecycle_happy_path() {
    let host = Host::new();

    // 1. Create
    host.exec(create("1000000.00 GOLD", false), &[CONTRACT])
        .unwrap();
    assert_eq!(host.ledger.get_supply(sym()).unwrap().amount, 0);

    // 2. Issue to a third party
    host.exec(issue(ALICE, "500.00 GOLD"), &[ISSUER]).unwrap();
    assert_eq!(host.balance(ALICE), 50_000);
    assert_eq!(host.balance(ISSUER), 0);
    host.assert_conserved();

    // 3. Transfer
    host.exec(transfer(ALICE, BOB, "120.50 GOLD"), &[ALICE])
        .unwrap();
    assert_eq!(host.balance(ALICE), 37_950);
    assert_eq!(host.balance(BOB), 12_050);
    host.assert_conserved();

    // 4. Bob sends everything back to the issuer, who retires it
    host.exec(transfer(BOB, ISSUER, "120.50 GOLD"), &[BOB])
        .unwrap();
    host.exec(
        Action::Retire {
            quantity: "120.50 GOLD".parse().unwrap(),
            memo: "buyback".into(),
        },
        &[ISSUER],
    )
    .unwrap();
    assert_eq!(host.ledger.get_supply(sym()).unwrap().amount, 37_950);
    host.assert_conserved();

    // 5. Bob closes his empty balance
    host.exec(
        Action::Close {
            owner: BOB,
            symbol: "2,GOLD".parse().unwrap(),
        },
        &[BOB],
    )
    .unwrap();
    assert_eq!(host.ledger.find_balance(BOB, sym()).unwrap(), None);
}

#[test]
fn issue_to_issuer_then_other() {
    let host = Host::new();
    host.exec(create("1000.00 GOLD", false), &[CONTRACT]).unwrap();

    host.exec(issue(ISSUER, "100.00 GOLD"), &[ISSUER]).unwrap();
    assert_eq!(host.balance(ISSUER), 10_000);

    host.exec(issue(BOB, "100.00 GOLD"), &[ISSUER]).unwrap();
    assert_eq!(host.balance(BOB), 10_000);
    assert_eq!(host.balance(ISSUER), 10_000);
    host.assert_conserved();
}

#[test]
fn close_then_reopen() {
    let host = Host::new();
    host.exec(create("1000.00 GOLD", false), &[CONTRACT]).unwrap();
    host.exec(issue(BOB, "1.00 GOLD"), &[ISSUER]).unwrap();

    let close = Action::Close {
        owner: BOB,
        symbol: "2,GOLD".parse().unwrap(),
    };
    let err = host.exec(close.clone(), &[BOB]).unwrap_err();
    assert_eq!(err.kind(), "non_zero_close");
    assert_eq!(host.balance(BOB), 100);

    host.exec(transfer(BOB, ALICE, "1.00 GOLD"), &[BOB]).unwrap();
    host.exec(close, &[BOB]).unwrap();

    host.exec(
        Action::Open {
            owner: BOB,
            symbol: "2,GOLD".parse().unwrap(),
            ram_payer: BOB,
        },
        &[BOB],
    )
    .unwrap();
    assert_eq!(
        host.ledger.find_balance(BOB, sym()).unwrap().map(|a| a.amount),
        Some(0)
    );
    assert_eq!(host.ledger.balance_payer(BOB, sym()).unwrap(), Some(BOB));
}

#[test]
fn transfer_lock_switch() {
    let host = Host::new();
    host.exec(create("1000.00 GOLD", false), &[CONTRACT]).unwrap();
    host.exec(issue(ALICE, "10.00 GOLD"), &[ISSUER]).unwrap();

    host.exec(
        Action::SetTransferLock {
            symbol: "2,GOLD".parse().unwrap(),
            locked: true,
        },
        &[ISSUER],
    )
    .unwrap();

    let err = host
        .exec(transfer(ALICE, BOB, "1.00 GOLD"), &[ALICE])
        .unwrap_err();
    assert_eq!(err, TokenError::Unauthorized(ISSUER));

    host.exec(transfer(ALICE, BOB, "1.00 GOLD"), &[ALICE, ISSUER])
        .unwrap();
    assert_eq!(host.balance(BOB), 100);

    host.exec(
        Action::SetTransferLock {
            symbol: "2,GOLD".parse().unwrap(),
            locked: false,
        },
        &[ISSUER],
    )
    .unwrap();
    host.exec(transfer(ALICE, BOB, "1.00 GOLD"), &[ALICE])
        .unwrap();
    assert_eq!(host.balance(BOB), 200);
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

#[test]
fn every_transfer_notifies_both_parties() {
    let host = Host::new();
    host.exec(create("1000.00 GOLD", false), &[CONTRACT]).unwrap();
    host.exec(issue(ALICE, "10.00 GOLD"), &[ISSUER]).unwrap();
    host.notifier.clear();

    host.exec(transfer(ALICE, BOB, "2.00 GOLD"), &[ALICE]).unwrap();
    assert_eq!(host.notifier.recipients(), vec![ALICE, BOB]);

    let _ = host.exec(transfer(ALICE, BOB, "200.00 GOLD"), &[ALICE]);
    assert_eq!(host.notifier.recipients().len(), 2);
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[test]
fn envelopes_from_json_execute() {
    let host = Host::new();
    let script = r#"[
        {"action": "create", "issuer": "issuer", "maximum_supply": "100.00 GOLD", "authorization": ["tally.token"]},
        {"action": "issue", "to": "alice", "quantity": "5.00 GOLD", "memo": "hi", "authorization": ["issuer"]},
        {"action": "transfer", "from": "alice", "to": "bob", "quantity": "2.50 GOLD", "authorization": ["alice"]}
    ]"#;
    let envelopes: Vec<ActionEnvelope> = serde_json::from_str(script).unwrap();
    for env in envelopes {
        host.exec(env.action, &env.authorization).unwrap();
    }
    assert_eq!(host.balance(BOB), 250);
    assert_eq!(host.balance(ALICE), 250);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[test]
fn sled_backend_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = Arc::new(SledStore::open(dir.path()).unwrap());
        let host = Host::with_store(store);
        host.exec(create("1000.00 GOLD", false), &[CONTRACT]).unwrap();
        host.exec(issue(BOB, "42.00 GOLD"), &[ISSUER]).unwrap();
    }

    let store = Arc::new(SledStore::open(dir.path()).unwrap());
    let host = Host::with_store(store);
    assert_eq!(host.balance(BOB), 4_200);
    assert_eq!(host.ledger.get_supply(sym()).unwrap().to_string(), "42.00 GOLD");
}
