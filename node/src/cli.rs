//! # CLI Interface
//!
//! Defines the command-line argument structure for `tally-node` using
//! `clap` derive. Subcommands: `run`, `init`, `apply`, `query`, and
//! `version`.
//!
//! Flags given here override the config file; anything left unset falls
//! back to the file, then to built-in defaults.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Tally token ledger node.
///
/// Hosts a token contract on a local sled database, accepts actions over
/// HTTP, and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "tally-node",
    about = "Tally token ledger node",
    version,
    propagate_version = true
)]
pub struct TallyNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node: HTTP API plus metrics endpoint.
    Run(RunArgs),
    /// Create the data directory and write a default config file.
    Init(InitArgs),
    /// Execute a JSON file of actions against the local database, offline.
    Apply(ApplyArgs),
    /// Read supply or balances straight from the local database.
    Query(QueryArgs),
    /// Print version information and exit.
    Version,
}

/// Where to find configuration and state. Shared by every subcommand that
/// opens the database.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Path to the node configuration file (TOML).
    ///
    /// When omitted, the node looks for `config.toml` in the data directory.
    #[arg(long, short = 'c', env = "TALLY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Data directory holding the ledger database.
    #[arg(long, short = 'd', env = "TALLY_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Interface for the HTTP API. Defaults to loopback.
    #[arg(long, env = "TALLY_RPC_BIND")]
    pub rpc_bind: Option<std::net::IpAddr>,

    /// Port for the HTTP API.
    #[arg(long, env = "TALLY_RPC_PORT")]
    pub rpc_port: Option<u16>,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "TALLY_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "TALLY_LOG_FORMAT")]
    pub log_format: Option<String>,
}

/// Arguments for the `init` subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Data directory to initialize.
    #[arg(long, short = 'd', env = "TALLY_DATA_DIR", default_value = "tally-data")]
    pub data_dir: PathBuf,

    /// Account the token contract is deployed at.
    #[arg(long, default_value = tally_ledger::config::DEFAULT_CONTRACT_ACCOUNT)]
    pub contract_account: String,

    /// Accounts to register at startup, in addition to the contract.
    #[arg(long = "account", value_name = "NAME")]
    pub accounts: Vec<String>,

    /// Overwrite an existing config file.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `apply` subcommand.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// JSON file holding an array of action envelopes.
    pub file: PathBuf,

    /// Keep going after a rejected action instead of stopping.
    #[arg(long)]
    pub keep_going: bool,
}

/// Arguments for the `query` subcommand.
#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub target: QueryTarget,
}

/// What to read.
#[derive(Subcommand, Debug)]
pub enum QueryTarget {
    /// Supply record of a symbol.
    Supply {
        /// Symbol code, e.g. `TOK`.
        symbol: String,
    },
    /// One account's balance of a symbol.
    Balance {
        /// Account name.
        account: String,
        /// Symbol code, e.g. `TOK`.
        symbol: String,
    },
}
