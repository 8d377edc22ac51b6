//! # REST API
//!
//! Builds the axum router that exposes the ledger node's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                          | Description                       |
//! |--------|-------------------------------|-----------------------------------|
//! | GET    | `/health`                     | Liveness probe                    |
//! | GET    | `/status`                     | Node status summary               |
//! | POST   | `/v1/actions`                 | Execute one signed action         |
//! | POST   | `/v1/accounts`                | Register an account (in memory)   |
//! | GET    | `/v1/supply/:symbol`          | Current supply of a symbol        |
//! | GET    | `/v1/stats/:symbol`           | Full supply record                |
//! | GET    | `/v1/balance/:account/:symbol`| One account's balance            |
//! | GET    | `/v1/lock/:account/:symbol`   | One account's vesting lock        |
//!
//! ## Trust
//!
//! The node trusts its host. `POST /v1/actions` runs each action under the
//! `authorization` list the caller declares, and `POST /v1/accounts` lets
//! any caller register an account. Nothing here verifies signatures, so the
//! listener binds to loopback unless `rpc_bind` says otherwise.
//!
//! ## Errors
//!
//! Every failure is `{ "error": "...", "kind": "..." }`. Rejections about
//! missing records are 404, authority failures 403, storage failures 500,
//! and every other rejection 400.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use tally_contracts::{ActionEnvelope, LockRecord, Receipt, SupplyRecord, TokenError, TokenLedger};
use tally_ledger::{AccountRegistry, ActionAuthority, Asset, Name, SymbolCode};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone: everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The token ledger every action runs against.
    pub ledger: Arc<TokenLedger>,
    /// Accounts the host recognizes.
    pub registry: Arc<AccountRegistry>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
    /// When the node started.
    pub started_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured RPC port.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/v1/actions", post(action_handler))
        .route("/v1/accounts", post(register_account_handler))
        .route("/v1/supply/:symbol", get(supply_handler))
        .route("/v1/stats/:symbol", get(stats_handler))
        .route("/v1/balance/:account/:symbol", get(balance_handler))
        .route("/v1/lock/:account/:symbol", get(lock_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request & Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Account the contract is deployed at.
    pub contract: Name,
    /// Number of registered accounts.
    pub accounts: usize,
    /// Seconds since the node started.
    pub uptime_secs: i64,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Body of `POST /v1/accounts`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterAccountRequest {
    pub account: Name,
}

/// Response payload for `POST /v1/accounts`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterAccountResponse {
    pub account: Name,
    /// `false` if the account was already registered.
    pub created: bool,
}

/// Response payload for `GET /v1/supply/:symbol`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SupplyResponse {
    pub symbol: SymbolCode,
    pub supply: Asset,
}

/// Response payload for `GET /v1/balance/:account/:symbol`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub account: Name,
    pub balance: Asset,
    /// `true` if a vesting lock currently blocks spending.
    pub locked: bool,
}

/// Response payload for `GET /v1/lock/:account/:symbol`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LockResponse {
    pub account: Name,
    pub lock: LockRecord,
    /// `false` once the unlock time has passed.
    pub active: bool,
}

/// Error body returned by every endpoint on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    /// The ledger rejected the request.
    Token(TokenError),
    /// A path parameter did not parse.
    BadParam { kind: &'static str, message: String },
    /// A worker task died.
    Internal(String),
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        ApiError::Token(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, kind) = match self {
            ApiError::Token(err) => {
                let status = match &err {
                    TokenError::Unauthorized(_) => StatusCode::FORBIDDEN,
                    TokenError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    e if e.is_not_found() => StatusCode::NOT_FOUND,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, err.to_string(), err.kind())
            }
            ApiError::BadParam { kind, message } => (StatusCode::BAD_REQUEST, message, kind),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, message, "internal")
            }
        };
        let body = ErrorResponse {
            error,
            kind: kind.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn parse_symbol(raw: &str) -> Result<SymbolCode, ApiError> {
    raw.parse().map_err(|e: tally_ledger::AssetError| ApiError::BadParam {
        kind: "invalid_symbol",
        message: e.to_string(),
    })
}

fn parse_account(raw: &str) -> Result<Name, ApiError> {
    raw.parse().map_err(|e: tally_ledger::NameError| ApiError::BadParam {
        kind: "invalid_account",
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: returns 200 if the node is alive.
///
/// This is the liveness probe for orchestrators (k8s, systemd, etc.).
/// It intentionally does not touch the database.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status`: returns node status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let now = Utc::now();
    Json(StatusResponse {
        version: state.version.clone(),
        contract: state.ledger.account(),
        accounts: state.registry.len(),
        uptime_secs: (now - state.started_at).num_seconds(),
        timestamp: now.to_rfc3339(),
    })
}

/// `POST /v1/actions`: executes one action under its declared signers.
///
/// Execution takes the ledger's writer lock and may flush to disk, so it
/// runs on the blocking pool.
async fn action_handler(
    State(state): State<AppState>,
    Json(envelope): Json<ActionEnvelope>,
) -> Result<Json<Receipt>, ApiError> {
    let name = envelope.action.name();
    let started = Instant::now();

    let ledger = Arc::clone(&state.ledger);
    let registry = Arc::clone(&state.registry);
    let result = tokio::task::spawn_blocking(move || {
        let auth = ActionAuthority::new(envelope.authorization.iter().copied(), registry);
        ledger.execute(&envelope.action, &auth)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("action worker failed: {e}")))?;

    state
        .metrics
        .action_latency_seconds
        .observe(started.elapsed().as_secs_f64());

    match result {
        Ok(receipt) => {
            state
                .metrics
                .actions_applied_total
                .with_label_values(&[name])
                .inc();
            Ok(Json(receipt))
        }
        Err(err) => {
            state
                .metrics
                .actions_rejected_total
                .with_label_values(&[err.kind()])
                .inc();
            Err(err.into())
        }
    }
}

/// `POST /v1/accounts`: registers an account for this process's lifetime.
async fn register_account_handler(
    State(state): State<AppState>,
    Json(req): Json<RegisterAccountRequest>,
) -> impl IntoResponse {
    let created = state.registry.register(req.account);
    state
        .metrics
        .registered_accounts
        .set(state.registry.len() as i64);
    if created {
        tracing::info!(account = %req.account, "account registered");
    }
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (
        status,
        Json(RegisterAccountResponse {
            account: req.account,
            created,
        }),
    )
}

/// `GET /v1/supply/:symbol`
async fn supply_handler(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SupplyResponse>, ApiError> {
    let code = parse_symbol(&symbol)?;
    let supply = state.ledger.get_supply(code)?;
    Ok(Json(SupplyResponse {
        symbol: code,
        supply,
    }))
}

/// `GET /v1/stats/:symbol`
async fn stats_handler(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SupplyRecord>, ApiError> {
    let code = parse_symbol(&symbol)?;
    Ok(Json(state.ledger.get_stats(code)?))
}

/// `GET /v1/balance/:account/:symbol`: zero for a known symbol the
/// account has never held.
async fn balance_handler(
    Path((account, symbol)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = parse_account(&account)?;
    let code = parse_symbol(&symbol)?;
    let balance = state.ledger.get_balance(account, code)?;
    let locked = state.ledger.is_locked(account, code)?;
    Ok(Json(BalanceResponse {
        account,
        balance,
        locked,
    }))
}

/// `GET /v1/lock/:account/:symbol`: 404 when the account has no lock.
async fn lock_handler(
    Path((account, symbol)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<LockResponse>, ApiError> {
    let account = parse_account(&account)?;
    let code = parse_symbol(&symbol)?;
    let lock = state
        .ledger
        .get_lock(account, code)?
        .ok_or(TokenError::LockNotFound {
            owner: account,
            symbol: code,
        })?;
    let active = state.ledger.is_locked(account, code)?;
    Ok(Json(LockResponse {
        account,
        lock,
        active,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
