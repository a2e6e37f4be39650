//! Configuration for the devnet host.
//!
//! ```json
//! {
//!   "port": 8080,
//!   "chain": "eip155:31337",
//!   "factory": "$FACTORY_ADDRESS",
//!   "event_capacity": 10000,
//!   "genesis": [
//!     { "holder": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266", "asset": "native", "amount": "1000000" }
//!   ]
//! }
//! ```

use alloy_primitives::{Address, U256, address};
use clap::Parser;
use paychan_chain_eip155::chain::{Eip155ChainReference, decimal_u256};
use paychan_types::config::LiteralOrEnv;
use paychan_types::custody::AssetRef;
use serde::Deserialize;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

/// CLI arguments for the devnet host.
#[derive(Parser, Debug)]
#[command(name = "paychan-host")]
#[command(about = "Payment channel devnet HTTP server")]
struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "CONFIG", default_value = "config.json")]
    config: PathBuf,
}

/// Server configuration.
///
/// Fields use serde defaults that fall back to environment variables,
/// then to hardcoded defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "config_defaults::default_port")]
    port: u16,
    #[serde(default = "config_defaults::default_host")]
    host: IpAddr,
    #[serde(default = "config_defaults::default_chain")]
    chain: Eip155ChainReference,
    #[serde(default = "config_defaults::default_factory")]
    factory: LiteralOrEnv<Address>,
    #[serde(default = "config_defaults::default_event_capacity")]
    event_capacity: usize,
    #[serde(default)]
    genesis: Vec<GenesisAllocation>,
}

/// A balance credited to `holder` when the devnet starts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenesisAllocation {
    pub holder: Address,
    #[serde(default = "config_defaults::default_asset")]
    pub asset: AssetRef,
    #[serde(with = "decimal_u256")]
    pub amount: U256,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: config_defaults::default_port(),
            host: config_defaults::default_host(),
            chain: config_defaults::default_chain(),
            factory: config_defaults::default_factory(),
            event_capacity: config_defaults::default_event_capacity(),
            genesis: Vec::new(),
        }
    }
}

pub mod config_defaults {
    use super::*;
    use std::env;
    use std::net::Ipv4Addr;

    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    /// Anvil/Hardhat local chain id.
    pub const DEFAULT_CHAIN_ID: u64 = 31337;
    /// First contract address a fresh Anvil/Hardhat deployer creates.
    pub const DEFAULT_FACTORY: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
    pub const DEFAULT_EVENT_CAPACITY: usize = 10_000;

    /// Returns the default port value with fallback: $PORT env var -> 8080
    pub fn default_port() -> u16 {
        env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT)
    }

    /// Returns the default host value with fallback: $HOST env var -> "0.0.0.0"
    pub fn default_host() -> IpAddr {
        env::var("HOST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_HOST)
    }

    pub fn default_chain() -> Eip155ChainReference {
        Eip155ChainReference::new(DEFAULT_CHAIN_ID)
    }

    pub fn default_factory() -> LiteralOrEnv<Address> {
        LiteralOrEnv::from_literal(DEFAULT_FACTORY)
    }

    /// Returns the event log capacity with fallback: $EVENT_CAPACITY env var -> 10000
    pub fn default_event_capacity() -> usize {
        env::var("EVENT_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_EVENT_CAPACITY)
    }

    pub fn default_asset() -> AssetRef {
        AssetRef::Native
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn host(&self) -> IpAddr {
        self.host
    }

    /// The chain every channel's EIP-712 domain is bound to.
    pub fn chain(&self) -> Eip155ChainReference {
        self.chain
    }

    /// Address of the channel factory; the operator token holders must approve.
    pub fn factory(&self) -> Address {
        *self.factory.inner()
    }

    /// Most events the host retains before dropping the oldest.
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }

    pub fn genesis(&self) -> &[GenesisAllocation] {
        &self.genesis
    }

    /// Load configuration from CLI arguments and JSON file.
    ///
    /// The config file path is determined by:
    /// 1. `--config <path>` CLI argument
    /// 2. `$CONFIG`
    /// 3. `./config.json`
    ///
    /// Values not present in the config file will be resolved via
    /// environment variables or defaults during deserialization.
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();
        let config_path = Path::new(&cli_args.config)
            .canonicalize()
            .map_err(|e| ConfigError::FileRead(cli_args.config, e))?;
        Self::load_from_path(config_path)
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::FileRead(path, e))?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_object() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.chain().inner(), 31337);
        assert_eq!(config.factory(), config_defaults::DEFAULT_FACTORY);
        assert!(config.genesis().is_empty());
    }

    #[test]
    fn test_event_capacity() {
        let config: Config = serde_json::from_str(r#"{ "event_capacity": 3 }"#).unwrap();
        assert_eq!(config.event_capacity(), 3);
    }

    #[test]
    fn test_full_config() {
        let json = r#"{
            "port": 3000,
            "host": "127.0.0.1",
            "chain": "eip155:84532",
            "factory": "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512",
            "genesis": [
                { "holder": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266", "amount": "1000" },
                {
                    "holder": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
                    "asset": "0x5FbDB2315678afecb367f032d93F642f64180aa3:1",
                    "amount": "25"
                }
            ]
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.port(), 3000);
        assert_eq!(config.host(), "127.0.0.1".parse::<IpAddr>().unwrap());
        assert_eq!(config.chain().inner(), 84532);
        assert_eq!(
            config.factory(),
            address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512")
        );
        assert_eq!(config.genesis().len(), 2);
        assert_eq!(config.genesis()[0].asset, AssetRef::Native);
        assert_eq!(config.genesis()[0].amount, U256::from(1000));
        assert_eq!(
            config.genesis()[1].asset,
            AssetRef::token(config_defaults::DEFAULT_FACTORY, U256::from(1))
        );
    }

    #[test]
    fn test_factory_from_env() {
        unsafe {
            std::env::set_var(
                "PAYCHAN_HOST_TEST_FACTORY",
                "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512",
            );
        }
        let config: Config =
            serde_json::from_str(r#"{ "factory": "${PAYCHAN_HOST_TEST_FACTORY}" }"#).unwrap();
        assert_eq!(
            config.factory(),
            address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512")
        );
    }

    #[test]
    fn test_rejects_non_evm_chain() {
        let result = serde_json::from_str::<Config>(r#"{ "chain": "solana:devnet" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load_from_path(PathBuf::from("/nonexistent/paychan.json")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(_, _)));
    }
}
