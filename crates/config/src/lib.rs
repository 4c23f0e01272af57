//! Configuration for the inventory keeper.
//!
//! This crate provides:
//! - Chain registry (hub + L2 chains, RPC endpoints, bridge addresses)
//! - Inventory targets per (token, chain) and token routes
//! - Configuration loading and validation

pub mod chains;
pub mod inventory;

pub use chains::{ChainConfig, ChainRegistry};
pub use inventory::{TokenChainConfig, TokenConfig, ONE};

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level keeper configuration, loaded from one TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The hub chain id (canonical accounting chain)
    pub hub_chain_id: u64,

    /// Relayer EOA address
    pub relayer: Address,

    /// How often to run the main loop (in seconds)
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_secs: u64,

    /// How far back to scan for bridge transfers and fills (in seconds)
    #[serde(default = "default_lookback")]
    pub lookback_secs: u64,

    /// Simulation mode: transactions are simulated instead of broadcast,
    /// but all bookkeeping still occurs
    #[serde(default)]
    pub sim: bool,

    /// Port for Prometheus metrics HTTP server
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Wrap hub-chain native into wrapped-native above this balance
    #[serde(default, with = "wrap_opt")]
    pub wrap_threshold: Option<U256>,

    /// Native balance to leave on the hub after wrapping
    #[serde(default, with = "wrap_opt")]
    pub wrap_target: Option<U256>,

    /// All chains the keeper operates on (hub included)
    pub chains: Vec<ChainConfig>,

    /// Managed tokens. An empty list disables inventory management.
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
}

const fn default_cycle_interval() -> u64 {
    60
}

const fn default_lookback() -> u64 {
    7200
}

const fn default_metrics_port() -> u16 {
    9090
}

// Same ether-string representation as the per-token thresholds.
mod wrap_opt {
    use alloy_primitives::{
        utils::{format_ether, parse_ether},
        U256,
    };
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<U256>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(v) => s.serialize_some(&format_ether(*v)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<U256>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| parse_ether(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;

        Ok(config)
    }

    /// Validate cross-field consistency.
    pub fn validate(&self) -> eyre::Result<()> {
        // Builds the registry, which checks hub membership and bridges.
        let registry = self.chain_registry()?;

        for token in &self.tokens {
            token.validate()?;
            for chain_id in token.chains.keys() {
                if registry.get(*chain_id).is_none() {
                    eyre::bail!(
                        "{} managed on unknown chain {}",
                        token.symbol,
                        chain_id
                    );
                }
            }
        }

        Ok(())
    }

    pub fn chain_registry(&self) -> eyre::Result<ChainRegistry> {
        ChainRegistry::new(self.hub_chain_id, self.chains.clone())
    }

    /// Managed L1 token addresses in deterministic (sorted) order.
    pub fn l1_tokens(&self) -> Vec<Address> {
        let mut tokens: Vec<Address> = self.tokens.iter().map(|t| t.l1).collect();
        tokens.sort();
        tokens
    }
}
