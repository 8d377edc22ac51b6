// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tally Ledger Node
//!
//! Entry point for the `tally-node` binary. Parses CLI arguments, loads the
//! config file, opens the ledger database, and serves the HTTP API.
//!
//! The binary supports five subcommands:
//!
//! - `run`    : start the node (API + metrics)
//! - `init`   : create a data directory and write `config.toml`
//! - `apply`  : execute a JSON file of actions offline
//! - `query`  : read supply or a balance from the local database
//! - `version`: print build version information

mod api;
mod cli;
mod config;
mod logging;
mod metrics;
mod notifier;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use tally_contracts::{ActionEnvelope, TokenLedger};
use tally_ledger::{AccountRegistry, ActionAuthority, Name, Notifier, SledStore, SymbolCode, SystemClock};

use cli::{Commands, QueryTarget, TallyNodeCli};
use config::{NodeConfig, CONFIG_FILE};
use logging::{LogFormat, DEFAULT_FILTER};
use metrics::NodeMetrics;
use notifier::TracingNotifier;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TallyNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Init(args) => init_node(args),
        Commands::Apply(args) => apply_file(args),
        Commands::Query(args) => query(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Opens the sled database under the configured data directory and binds
/// the token contract to it.
fn open_ledger(
    config: &NodeConfig,
    notifier: Arc<dyn Notifier>,
) -> Result<(Arc<TokenLedger>, Arc<AccountRegistry>)> {
    let db_path = config.db_path();
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;

    let store = SledStore::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    tracing::info!(path = %db_path.display(), rows = store.row_count(), "database opened");

    let registry = Arc::new(AccountRegistry::with_accounts(config.initial_accounts()));
    let ledger = Arc::new(TokenLedger::new(
        config.contract_account,
        Arc::new(store),
        Arc::new(SystemClock),
        notifier,
    ));
    Ok((ledger, registry))
}

/// Starts the node: API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    let mut config = NodeConfig::resolve(&args.store)?;
    if let Some(bind) = args.rpc_bind {
        config.rpc_bind = bind;
    }
    if let Some(port) = args.rpc_port {
        config.rpc_port = port;
    }
    if let Some(port) = args.metrics_port {
        config.metrics_port = port;
    }
    if let Some(format) = &args.log_format {
        config.log_format = LogFormat::from_str_lossy(format);
    }

    logging::init_logging(DEFAULT_FILTER, config.log_format);

    tracing::info!(
        contract = %config.contract_account,
        rpc_addr = %config.rpc_addr(),
        metrics_port = config.metrics_port,
        data_dir = %config.data_dir.display(),
        "starting tally-node"
    );

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);

    // --- Ledger ---
    let notifier = Arc::new(TracingNotifier::new(Arc::clone(&node_metrics)));
    let (ledger, registry) = open_ledger(&config, notifier)?;
    node_metrics.registered_accounts.set(registry.len() as i64);

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (ledger {})",
            env!("CARGO_PKG_VERSION"),
            tally_ledger::config::LEDGER_VERSION,
        ),
        ledger,
        registry,
        metrics: Arc::clone(&node_metrics),
        started_at: chrono::Utc::now(),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = config.rpc_addr();
    if !api_addr.ip().is_loopback() {
        tracing::warn!(%api_addr, "API is reachable off-host and trusts declared authorizations");
    }
    let api_listener = tokio::net::TcpListener::bind(api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", config.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("tally-node stopped");
    Ok(())
}

/// Creates a data directory and writes its `config.toml`.
fn init_node(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("tally_node=info", LogFormat::Pretty);

    let contract_account: Name = args
        .contract_account
        .parse()
        .with_context(|| format!("invalid contract account '{}'", args.contract_account))?;
    let accounts = args
        .accounts
        .iter()
        .map(|raw| {
            raw.parse::<Name>()
                .with_context(|| format!("invalid account name '{}'", raw))
        })
        .collect::<Result<Vec<_>>>()?;

    let data_dir = &args.data_dir;
    let config_path = data_dir.join(CONFIG_FILE);
    if config_path.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to overwrite",
            config_path.display()
        );
    }

    tracing::info!(data_dir = %data_dir.display(), contract = %contract_account, "initializing node");
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    let config = NodeConfig {
        contract_account,
        data_dir: data_dir.clone(),
        accounts,
        ..NodeConfig::default()
    };
    std::fs::write(&config_path, config.to_toml()?)
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    println!("Node initialized successfully.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Contract       : {}", config.contract_account);
    println!("  Accounts       : {}", config.initial_accounts().len());
    println!("  Config         : {}", config_path.display());

    Ok(())
}

/// Executes every envelope in a JSON array file, printing one receipt per
/// committed action. Stops at the first rejection unless `--keep-going`.
fn apply_file(args: cli::ApplyArgs) -> Result<()> {
    let config = NodeConfig::resolve(&args.store)?;
    logging::init_logging(DEFAULT_FILTER, config.log_format);

    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let envelopes: Vec<ActionEnvelope> = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse actions in {}", args.file.display()))?;

    let (ledger, registry) = open_ledger(&config, Arc::new(TracingNotifier::log_only()))?;

    let mut rejected = 0usize;
    for (index, envelope) in envelopes.iter().enumerate() {
        let auth = ActionAuthority::new(envelope.authorization.iter().copied(), Arc::clone(&registry));
        match ledger.execute(&envelope.action, &auth) {
            Ok(receipt) => println!("{}", serde_json::to_string(&receipt)?),
            Err(err) if args.keep_going => {
                rejected += 1;
                eprintln!("action {} ({}) rejected: {}", index, envelope.action.name(), err);
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("action {} ({}) rejected", index, envelope.action.name())
                });
            }
        }
    }

    if rejected > 0 {
        bail!("{} of {} actions rejected", rejected, envelopes.len());
    }
    Ok(())
}

/// Reads supply or a balance from the local database and prints it as JSON.
fn query(args: cli::QueryArgs) -> Result<()> {
    let config = NodeConfig::resolve(&args.store)?;
    logging::init_logging("tally_node=warn", config.log_format);

    let (ledger, _) = open_ledger(&config, Arc::new(TracingNotifier::log_only()))?;

    let output = match &args.target {
        QueryTarget::Supply { symbol } => {
            let code: SymbolCode = symbol
                .parse()
                .with_context(|| format!("invalid symbol '{}'", symbol))?;
            serde_json::to_value(ledger.get_stats(code)?)?
        }
        QueryTarget::Balance { account, symbol } => {
            let owner: Name = account
                .parse()
                .with_context(|| format!("invalid account '{}'", account))?;
            let code: SymbolCode = symbol
                .parse()
                .with_context(|| format!("invalid symbol '{}'", symbol))?;
            serde_json::json!({
                "account": owner,
                "balance": ledger.get_balance(owner, code)?,
                "locked": ledger.is_locked(owner, code)?,
            })
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("tally-node {}", env!("CARGO_PKG_VERSION"));
    println!("ledger     {}", tally_ledger::config::LEDGER_VERSION);
    println!("rustc      {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// If a handler cannot be installed the failure is logged and that signal
/// is ignored. On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
