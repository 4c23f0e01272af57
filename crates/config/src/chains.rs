//! Chain configuration for the keeper.
//!
//! One hub chain plus any number of L2 chains. The hub is the source of
//! rebalances and the default refund target; L2 chains receive capital over
//! their canonical bridge.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-chain addresses and parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Chain ID
    pub chain_id: u64,
    /// Human-readable name used in logs
    pub name: String,
    /// RPC endpoint url
    pub rpc_url: String,
    /// Wrapped-native token address on this chain
    pub weth: Address,
    /// SpokePool contract address (relayer refund surface)
    pub spoke_pool: Address,
    /// Hub-side canonical bridge for deposits toward this chain.
    /// None for the hub chain itself.
    #[serde(default)]
    pub l1_bridge: Option<Address>,
    /// Whether the chain's gas token is the canonical native (ETH).
    /// Chains with a custom gas token are excluded from the unwrap cycle.
    #[serde(default = "default_true")]
    pub gas_is_native: bool,
    /// Block time in seconds, used to translate lookback windows into blocks
    #[serde(default = "default_block_time")]
    pub block_time_secs: u64,
}

const fn default_true() -> bool {
    true
}

const fn default_block_time() -> u64 {
    2
}

/// All configured chains, keyed by chain id, with a distinguished hub.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    hub_chain_id: u64,
    chains: BTreeMap<u64, ChainConfig>,
}

impl ChainRegistry {
    /// Build a registry from a chain list.
    ///
    /// Fails if the hub chain is missing from the list or if a non-hub chain
    /// has no canonical bridge configured.
    pub fn new(hub_chain_id: u64, chains: Vec<ChainConfig>) -> eyre::Result<Self> {
        let chains: BTreeMap<u64, ChainConfig> =
            chains.into_iter().map(|c| (c.chain_id, c)).collect();

        if !chains.contains_key(&hub_chain_id) {
            eyre::bail!("hub chain {hub_chain_id} is not in the chain list");
        }

        for chain in chains.values() {
            if chain.chain_id != hub_chain_id && chain.l1_bridge.is_none() {
                eyre::bail!(
                    "chain {} ({}) has no canonical bridge configured",
                    chain.chain_id,
                    chain.name
                );
            }
        }

        Ok(Self {
            hub_chain_id,
            chains,
        })
    }

    pub const fn hub_chain_id(&self) -> u64 {
        self.hub_chain_id
    }

    pub fn hub(&self) -> &ChainConfig {
        &self.chains[&self.hub_chain_id]
    }

    pub fn get(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.get(&chain_id)
    }

    /// All chain ids in ascending order (hub included).
    pub fn chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.chains.keys().copied()
    }

    /// L2 chain ids in ascending order (hub excluded).
    pub fn l2_chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        let hub = self.hub_chain_id;
        self.chains.keys().copied().filter(move |id| *id != hub)
    }

    pub fn chains(&self) -> impl Iterator<Item = &ChainConfig> {
        self.chains.values()
    }
}
