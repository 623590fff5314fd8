//! Wallet client configuration
//!
//! Read from a TOML file with `[node]` and `[wallet]` sections; missing
//! sections and keys take their defaults. Command-line flags are applied on
//! top through [`Overrides`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::transaction::{DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE};

/// Wallet client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

/// Node endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Use HTTPS instead of plain HTTP
    #[serde(default)]
    pub secure: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            secure: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl NodeConfig {
    /// `host:port`
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Wallet file; defaults to `wallet.json` in the data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Fee offered when the user accepts the default in `send-coin`
    #[serde(default = "default_gas_price")]
    pub default_gas_price: u64,

    /// Gas limit attached to every transfer
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            path: None,
            default_gas_price: default_gas_price(),
            gas_limit: default_gas_limit(),
        }
    }
}

impl WalletConfig {
    pub fn wallet_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| default_data_dir().join("wallet.json"))
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    9092
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_gas_price() -> u64 {
    DEFAULT_GAS_PRICE
}

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

/// Values given on the command line; each one replaces its file setting.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub wallet: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub secure: bool,
}

impl Config {
    /// Load config from a file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load config from `path` if it exists, otherwise use defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(path) = overrides.wallet {
            self.wallet.path = Some(path);
        }
        if let Some(host) = overrides.host {
            self.node.host = host;
        }
        if let Some(port) = overrides.port {
            self.node.port = port;
        }
        if overrides.secure {
            self.node.secure = true;
        }
    }
}

/// Get the default data directory path
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".smesh-wallet")
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.node.endpoint(), "localhost:9092");
        assert!(!config.node.secure);
        assert_eq!(config.node.timeout_secs, 30);
        assert_eq!(config.wallet.default_gas_price, 1);
        assert_eq!(config.wallet.gas_limit, 100);
        assert!(config.wallet.wallet_path().ends_with(".smesh-wallet/wallet.json"));
    }

    #[test]
    fn test_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[node]\nhost = \"10.0.0.5\"\nsecure = true\n\n[wallet]\ngas_limit = 250\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.node.endpoint(), "10.0.0.5:9092");
        assert!(config.node.secure);
        assert_eq!(config.wallet.gas_limit, 250);
        assert_eq!(config.wallet.default_gas_price, 1);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.node.port, 9092);
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[node]\nport = \"many\"\n").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply(Overrides {
            wallet: Some(PathBuf::from("/tmp/w.json")),
            host: None,
            port: Some(6000),
            secure: true,
        });

        assert_eq!(config.node.endpoint(), "localhost:6000");
        assert!(config.node.secure);
        assert_eq!(config.wallet.wallet_path(), PathBuf::from("/tmp/w.json"));
    }
}
