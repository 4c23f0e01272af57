//! Token route registry.
//!
//! Maps each canonical hub-chain token address to its per-chain mirror
//! addresses and back. This is the keeper's view of the hub pool: which
//! token is which across chains, and whether a route is enabled at all.

use alloy_primitives::Address;
use config::TokenConfig;
use std::collections::BTreeMap;

/// Token metadata as known on the hub chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u8,
}

/// Read surface over token routes.
pub trait RouteClient: Send + Sync {
    /// The hub chain id.
    fn hub_chain_id(&self) -> u64;

    /// Mirror address of an L1 token on a chain. On the hub chain this is
    /// the L1 address itself.
    fn l2_token_for(&self, l1_token: Address, chain_id: u64) -> Option<Address>;

    /// Canonical L1 address for a token observed on a chain.
    fn l1_token_for(&self, l2_token: Address, chain_id: u64) -> Option<Address>;

    /// Whether two (token, chain) pairs name the same underlying asset.
    fn tokens_equivalent(
        &self,
        token_a: Address,
        chain_a: u64,
        token_b: Address,
        chain_b: u64,
    ) -> bool;

    /// Whether the L1 token has an enabled route to the chain.
    fn route_enabled(&self, l1_token: Address, chain_id: u64) -> bool;

    /// Metadata for a managed L1 token.
    fn token_info(&self, l1_token: Address) -> Option<TokenInfo>;

    /// All managed L1 tokens in deterministic (sorted) order.
    fn l1_tokens(&self) -> Vec<Address>;
}

/// Route registry built from static token configuration.
#[derive(Debug, Clone)]
pub struct TokenRouteRegistry {
    hub_chain_id: u64,
    forward: BTreeMap<(Address, u64), Address>,
    reverse: BTreeMap<(Address, u64), Address>,
    info: BTreeMap<Address, TokenInfo>,
}

impl TokenRouteRegistry {
    pub fn new(hub_chain_id: u64, tokens: &[TokenConfig]) -> Self {
        let mut forward = BTreeMap::new();
        let mut reverse = BTreeMap::new();
        let mut info = BTreeMap::new();

        for token in tokens {
            // The hub mirror of an L1 token is the token itself.
            forward.insert((token.l1, hub_chain_id), token.l1);
            reverse.insert((token.l1, hub_chain_id), token.l1);

            for (chain_id, l2_token) in &token.l2 {
                forward.insert((token.l1, *chain_id), *l2_token);
                reverse.insert((*l2_token, *chain_id), token.l1);
            }

            info.insert(
                token.l1,
                TokenInfo {
                    symbol: token.symbol.clone(),
                    decimals: token.decimals,
                },
            );
        }

        Self {
            hub_chain_id,
            forward,
            reverse,
            info,
        }
    }
}

impl RouteClient for TokenRouteRegistry {
    fn hub_chain_id(&self) -> u64 {
        self.hub_chain_id
    }

    fn l2_token_for(&self, l1_token: Address, chain_id: u64) -> Option<Address> {
        self.forward.get(&(l1_token, chain_id)).copied()
    }

    fn l1_token_for(&self, l2_token: Address, chain_id: u64) -> Option<Address> {
        self.reverse.get(&(l2_token, chain_id)).copied()
    }

    fn tokens_equivalent(
        &self,
        token_a: Address,
        chain_a: u64,
        token_b: Address,
        chain_b: u64,
    ) -> bool {
        match (
            self.l1_token_for(token_a, chain_a),
            self.l1_token_for(token_b, chain_b),
        ) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn route_enabled(&self, l1_token: Address, chain_id: u64) -> bool {
        self.forward.contains_key(&(l1_token, chain_id))
    }

    fn token_info(&self, l1_token: Address) -> Option<TokenInfo> {
        self.info.get(&l1_token).cloned()
    }

    fn l1_tokens(&self) -> Vec<Address> {
        self.info.keys().copied().collect()
    }
}
