//! # Node Configuration
//!
//! The node reads a TOML file:
//!
//! ```toml
//! contract_account = "tally.token"
//! data_dir = "tally-data"
//! rpc_bind = "127.0.0.1"
//! rpc_port = 8741
//! metrics_port = 8742
//! log_format = "pretty"
//! accounts = ["alice", "bob"]
//! ```
//!
//! Every key is optional. CLI flags override whatever the file says.
//!
//! The API executes actions under whatever authority the caller declares,
//! so `rpc_bind` defaults to loopback. Only widen it behind a gateway that
//! authenticates callers.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use tally_ledger::config::{DEFAULT_CONTRACT_ACCOUNT, DEFAULT_METRICS_PORT, DEFAULT_RPC_PORT};
use tally_ledger::Name;

use crate::cli::StoreArgs;
use crate::logging::LogFormat;

/// Name of the config file inside a data directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Everything the node needs to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Account the token contract is deployed at.
    pub contract_account: Name,
    /// Directory holding the sled database.
    pub data_dir: PathBuf,
    /// Interface the HTTP API listens on.
    pub rpc_bind: IpAddr,
    pub rpc_port: u16,
    pub metrics_port: u16,
    pub log_format: LogFormat,
    /// Accounts registered at startup. The contract account is always added.
    pub accounts: Vec<Name>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            contract_account: Name::constant(DEFAULT_CONTRACT_ACCOUNT),
            data_dir: PathBuf::from("tally-data"),
            rpc_bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            rpc_port: DEFAULT_RPC_PORT,
            metrics_port: DEFAULT_METRICS_PORT,
            log_format: LogFormat::Pretty,
            accounts: Vec::new(),
        }
    }
}

impl NodeConfig {
    /// Parses a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Resolves the config the way every subcommand does: an explicit
    /// `--config` wins, then `config.toml` in the data directory, then
    /// defaults. An explicit `--data-dir` always overrides the file.
    pub fn resolve(args: &StoreArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => {
                let dir = args
                    .data_dir
                    .clone()
                    .unwrap_or_else(|| Self::default().data_dir);
                let candidate = dir.join(CONFIG_FILE);
                if candidate.exists() {
                    Self::load(&candidate)?
                } else {
                    Self::default()
                }
            }
        };
        if let Some(dir) = &args.data_dir {
            config.data_dir = dir.clone();
        }
        Ok(config)
    }

    /// Renders the config as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to render config as TOML")
    }

    /// Socket address of the HTTP API.
    pub fn rpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.rpc_bind, self.rpc_port)
    }

    /// Location of the ledger database.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("db")
    }

    /// Startup accounts plus the contract account, deduplicated.
    pub fn initial_accounts(&self) -> Vec<Name> {
        let mut accounts = self.accounts.clone();
        accounts.push(self.contract_account);
        accounts.sort();
        accounts.dedup();
        accounts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let config: NodeConfig = toml::from_str(
            r#"
            rpc_port = 9000
            accounts = ["alice", "bob"]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.rpc_port, 9000);
        assert_eq!(config.metrics_port, DEFAULT_METRICS_PORT);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.contract_account.to_string(), "tally.token");
        assert_eq!(config.accounts.len(), 2);
    }

    #[test]
    fn api_binds_loopback_by_default() {
        let config = NodeConfig::default();
        assert!(config.rpc_bind.is_loopback());
        assert_eq!(config.rpc_addr().to_string(), format!("127.0.0.1:{DEFAULT_RPC_PORT}"));

        let from_file: NodeConfig = toml::from_str("rpc_port = 9000").unwrap();
        assert!(from_file.rpc_addr().ip().is_loopback());

        let widened: NodeConfig = toml::from_str(r#"rpc_bind = "0.0.0.0""#).unwrap();
        assert!(widened.rpc_bind.is_unspecified());
    }

    #[test]
    fn invalid_account_name_rejected() {
        assert!(toml::from_str::<NodeConfig>(r#"accounts = ["Alice"]"#).is_err());
    }

    #[test]
    fn toml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NodeConfig::default();
        config.accounts = vec![Name::constant("carol")];
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();
        assert_eq!(NodeConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn resolve_prefers_data_dir_file_and_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut on_disk = NodeConfig::default();
        on_disk.rpc_port = 1234;
        on_disk.data_dir = PathBuf::from("/somewhere/else");
        std::fs::write(dir.path().join(CONFIG_FILE), on_disk.to_toml().unwrap()).unwrap();

        let resolved = NodeConfig::resolve(&StoreArgs {
            config: None,
            data_dir: Some(dir.path().to_path_buf()),
        })
        .unwrap();
        assert_eq!(resolved.rpc_port, 1234);
        assert_eq!(resolved.data_dir, dir.path());
    }

    #[test]
    fn contract_account_always_registered() {
        let mut config = NodeConfig::default();
        config.accounts = vec![Name::constant("bob"), Name::constant("tally.token")];
        assert_eq!(
            config.initial_accounts(),
            vec![Name::constant("bob"), Name::constant("tally.token")]
        );
    }
}
