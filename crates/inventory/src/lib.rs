//! Inventory management core.
//!
//! The keeper's working capital is spread across one hub chain and several
//! L2 chains, and is consumed on whichever chain each fill lands on. This
//! crate keeps the per-chain fraction of each token close to operator
//! targets while minimizing unnecessary bridge transfers, through three
//! coupled decisions sharing one virtual-balance model:
//!
//! - pick the repayment chain for each fill so refunds land where capital
//!   is thin ([`InventoryManager::determine_refund_chain`]),
//! - bridge hub capital toward under-allocated chains
//!   ([`InventoryManager::rebalance_inventory_if_needed`]),
//! - unwrap wrapped-native into gas where gas runs low
//!   ([`InventoryManager::unwrap_native_if_needed`]).

pub mod error;
pub mod fixed;

mod balances;
mod rebalance;
mod refund;
mod unwrap;

pub use error::InventoryError;
pub use rebalance::{RebalanceCandidate, RebalanceReport};
pub use refund::RelayFill;
pub use unwrap::{UnwrapCandidate, UnwrapReport};

use alloy_primitives::Address;
use bundles::RefundSet;
use config::{ChainRegistry, TokenChainConfig, TokenConfig};
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::sync::Mutex;
use tracing::info;

/// Allocation targets per (L1 token, chain), in deterministic order.
pub type Targets = BTreeMap<Address, BTreeMap<u64, TokenChainConfig>>;

/// Build [`Targets`] from the token configuration list.
pub fn targets(tokens: &[TokenConfig]) -> Targets {
    tokens
        .iter()
        .map(|t| (t.l1, t.chains.clone()))
        .collect()
}

/// The inventory core.
///
/// Holds shared immutable handles to its collaborators and a per-cycle
/// refund cache. Everything else is pulled from the collaborators on each
/// call, so successive cycles always see current reality.
pub struct InventoryManager<T, M, R, X, B, A> {
    targets: Targets,
    registry: ChainRegistry,
    relayer: Address,
    sim: bool,
    tokens: Arc<T>,
    monitor: Arc<M>,
    routes: Arc<R>,
    transfers: Arc<X>,
    bundles: Arc<B>,
    adapter: Arc<A>,
    refund_cache: Mutex<Option<Arc<Vec<RefundSet>>>>,
    disabled_logged: AtomicBool,
}

impl<T, M, R, X, B, A> InventoryManager<T, M, R, X, B, A> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        targets: Targets,
        registry: ChainRegistry,
        relayer: Address,
        sim: bool,
        tokens: Arc<T>,
        monitor: Arc<M>,
        routes: Arc<R>,
        transfers: Arc<X>,
        bundles: Arc<B>,
        adapter: Arc<A>,
    ) -> Self {
        Self {
            targets,
            registry,
            relayer,
            sim,
            tokens,
            monitor,
            routes,
            transfers,
            bundles,
            adapter,
            refund_cache: Mutex::new(None),
            disabled_logged: AtomicBool::new(false),
        }
    }

    /// Start a new cycle: drop the cached bundle refunds so the next caller
    /// fetches fresh data.
    pub async fn begin_cycle(&self) {
        *self.refund_cache.lock().await = None;
    }

    /// Inventory management is disabled when no token is managed.
    pub fn is_disabled(&self) -> bool {
        self.targets.is_empty()
    }

    /// Managed L1 tokens in deterministic order.
    pub fn managed_tokens(&self) -> Vec<Address> {
        self.targets.keys().copied().collect()
    }

    pub(crate) fn log_disabled_once(&self) {
        if !self.disabled_logged.swap(true, Ordering::Relaxed) {
            info!("Inventory management disabled: no tokens configured");
        }
    }

    /// Whether `l1_token` is managed on `chain_id`.
    pub(crate) fn is_managed(&self, l1_token: Address, chain_id: u64) -> bool {
        self.targets
            .get(&l1_token)
            .is_some_and(|chains| chains.contains_key(&chain_id))
    }

    /// Allocation settings for one (token, chain), if managed.
    pub(crate) fn target(&self, l1_token: Address, chain_id: u64) -> Option<&TokenChainConfig> {
        self.targets.get(&l1_token)?.get(&chain_id)
    }
}
