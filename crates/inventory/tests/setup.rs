//! Common test setup: an in-memory harness around the inventory manager.
#![allow(dead_code)] // not every test file uses every helper

use alloy_primitives::{address, utils::parse_ether, Address, TxHash, U256};
use balance::{Balance, BalanceQuery, Monitor, TokenTracker};
use bundles::{BundleDataClient, RefundSet};
use client::ProviderPool;
use config::{ChainConfig, ChainRegistry, TokenChainConfig, TokenConfig};
use inventory::{InventoryManager, RelayFill};
use routes::{RouteClient, TokenRouteRegistry};
use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, RwLock,
    },
};
use transfer::TransferTracker;

pub const HUB: u64 = 1;
pub const CHAIN_A: u64 = 10;
pub const CHAIN_B: u64 = 137;
pub const CHAIN_C: u64 = 8453;

/// The managed token's canonical address; doubles as the hub wrapped-native.
pub const TOKEN_L1: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const TOKEN_A: Address = address!("4200000000000000000000000000000000000006");
pub const TOKEN_B: Address = address!("7ceB23fD6bC0adD59E62ac25578270cFf1b9f619");
pub const TOKEN_C: Address = address!("71f85B2E46976bD21302B64329868fd15eb0D127");
pub const RELAYER: Address = address!("9A8f92a830A5cB89a3816e3D267CB7791c16b04D");

const BRIDGE: Address = address!("99C9fc46f92E8a1c0deC1b1747d010903E884bE1");

pub fn pct(s: &str) -> U256 {
    parse_ether(s).unwrap()
}

pub fn amount(v: u64) -> U256 {
    U256::from(v)
}

fn chain(chain_id: u64) -> ChainConfig {
    ChainConfig {
        chain_id,
        name: format!("chain-{chain_id}"),
        rpc_url: "http://localhost:8545".to_string(),
        weth: if chain_id == HUB { TOKEN_L1 } else { TOKEN_A },
        spoke_pool: Address::ZERO,
        l1_bridge: (chain_id != HUB).then_some(BRIDGE),
        gas_is_native: chain_id != CHAIN_B, // chain B runs a custom gas token
        block_time_secs: 2,
    }
}

pub fn registry() -> ChainRegistry {
    ChainRegistry::new(
        HUB,
        vec![chain(HUB), chain(CHAIN_A), chain(CHAIN_B), chain(CHAIN_C)],
    )
    .unwrap()
}

fn mirror(chain_id: u64) -> Address {
    match chain_id {
        CHAIN_A => TOKEN_A,
        CHAIN_B => TOKEN_B,
        CHAIN_C => TOKEN_C,
        _ => TOKEN_L1,
    }
}

/// One managed token with `(chain, target, threshold)` settings.
pub fn token(settings: &[(u64, &str, &str)]) -> TokenConfig {
    token_with_unwrap(settings, &[])
}

/// One managed token with allocation settings plus `(chain, unwrap
/// threshold, unwrap target)` entries.
pub fn token_with_unwrap(
    settings: &[(u64, &str, &str)],
    unwrap: &[(u64, &str, &str)],
) -> TokenConfig {
    let mut chains = BTreeMap::new();
    for (chain_id, target, threshold) in settings {
        chains.insert(
            *chain_id,
            TokenChainConfig {
                target_pct: pct(target),
                threshold_pct: pct(threshold),
                unwrap_threshold: None,
                unwrap_target: None,
            },
        );
    }
    for (chain_id, threshold, target) in unwrap {
        let entry = chains.entry(*chain_id).or_insert(TokenChainConfig {
            target_pct: U256::ZERO,
            threshold_pct: U256::ZERO,
            unwrap_threshold: None,
            unwrap_target: None,
        });
        entry.unwrap_threshold = Some(pct(threshold));
        entry.unwrap_target = Some(pct(target));
    }

    let l2 = chains
        .keys()
        .filter(|id| **id != HUB)
        .map(|id| (*id, mirror(*id)))
        .collect();

    TokenConfig {
        symbol: "WETH".to_string(),
        decimals: 18,
        l1: TOKEN_L1,
        l2,
        chains,
    }
}

/// Monitor stub returning preset balances.
#[derive(Default)]
pub struct MockMonitor {
    erc20: RwLock<BTreeMap<(u64, Address), U256>>,
    native: RwLock<BTreeMap<u64, U256>>,
}

impl MockMonitor {
    pub fn set_erc20(&self, chain_id: u64, token: Address, amount: U256) {
        self.erc20.write().unwrap().insert((chain_id, token), amount);
    }

    pub fn set_native(&self, chain_id: u64, amount: U256) {
        self.native.write().unwrap().insert(chain_id, amount);
    }
}

impl Monitor for MockMonitor {
    async fn query_balance(&self, query: BalanceQuery) -> eyre::Result<Balance> {
        match query {
            BalanceQuery::Erc20 {
                chain_id,
                token,
                holder,
            } => Ok(Balance {
                chain_id,
                holder,
                asset: token,
                amount: self
                    .erc20
                    .read()
                    .unwrap()
                    .get(&(chain_id, token))
                    .copied()
                    .unwrap_or_default(),
            }),
            BalanceQuery::Native { chain_id, holder } => Ok(Balance {
                chain_id,
                holder,
                asset: Address::ZERO,
                amount: self
                    .native
                    .read()
                    .unwrap()
                    .get(&chain_id)
                    .copied()
                    .unwrap_or_default(),
            }),
        }
    }
}

/// Bundle client stub returning preset refund sets and counting fetches.
#[derive(Default)]
pub struct MockBundles {
    pub valid: RwLock<Vec<RefundSet>>,
    pub next: RwLock<Vec<RefundSet>>,
    pub fetches: AtomicUsize,
}

impl BundleDataClient for MockBundles {
    async fn pending_refunds_from_valid_bundles(
        &self,
        _relayer: Address,
    ) -> eyre::Result<Vec<RefundSet>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self.valid.read().unwrap().clone())
    }

    async fn next_bundle_refunds(&self, _relayer: Address) -> eyre::Result<Vec<RefundSet>> {
        Ok(self.next.read().unwrap().clone())
    }
}

/// Adapter stub recording submissions.
#[derive(Default)]
pub struct MockAdapter {
    pub sends: RwLock<Vec<(u64, Address, U256)>>,
    pub unwraps: RwLock<Vec<(u64, U256)>>,
}

impl action::AdapterManager for MockAdapter {
    async fn send_token_cross_chain(
        &self,
        _relayer: Address,
        chain_id: u64,
        l1_token: Address,
        amount: U256,
        _sim: bool,
    ) -> eyre::Result<TxHash> {
        let mut sends = self.sends.write().unwrap();
        sends.push((chain_id, l1_token, amount));
        Ok(TxHash::with_last_byte(sends.len() as u8))
    }

    async fn unwrap_wrapped_native(
        &self,
        chain_id: u64,
        amount: U256,
        _sim: bool,
    ) -> eyre::Result<TxHash> {
        let mut unwraps = self.unwraps.write().unwrap();
        unwraps.push((chain_id, amount));
        Ok(TxHash::with_last_byte(unwraps.len() as u8))
    }

    async fn set_l1_token_approvals(
        &self,
        _relayer: Address,
        _l1_tokens: &[Address],
    ) -> eyre::Result<()> {
        Ok(())
    }

    async fn wrap_native_if_above_threshold(
        &self,
        _relayer: Address,
        _threshold: U256,
        _target: U256,
        _sim: bool,
    ) -> eyre::Result<Option<TxHash>> {
        Ok(None)
    }
}

pub type TestManager = InventoryManager<
    TokenTracker,
    MockMonitor,
    TokenRouteRegistry,
    TransferTracker,
    MockBundles,
    MockAdapter,
>;

/// Everything a test needs: the manager plus direct handles to the
/// collaborators it is wired to.
pub struct Harness {
    pub tracker: Arc<TokenTracker>,
    pub monitor: Arc<MockMonitor>,
    pub routes: Arc<TokenRouteRegistry>,
    pub transfers: Arc<TransferTracker>,
    pub bundles: Arc<MockBundles>,
    pub adapter: Arc<MockAdapter>,
    pub manager: TestManager,
}

pub fn build(tokens: Vec<TokenConfig>) -> Harness {
    let registry = registry();
    let tracker = Arc::new(TokenTracker::new());
    let monitor = Arc::new(MockMonitor::default());
    let routes = Arc::new(TokenRouteRegistry::new(HUB, &tokens));
    let transfers = Arc::new(TransferTracker::new(
        ProviderPool::new(),
        registry.clone(),
        RELAYER,
        7200,
    ));
    let bundles = Arc::new(MockBundles::default());
    let adapter = Arc::new(MockAdapter::default());

    let manager = InventoryManager::new(
        inventory::targets(&tokens),
        registry,
        RELAYER,
        false,
        tracker.clone(),
        monitor.clone(),
        routes.clone(),
        transfers.clone(),
        bundles.clone(),
        adapter.clone(),
    );

    Harness {
        tracker,
        monitor,
        routes,
        transfers,
        bundles,
        adapter,
        manager,
    }
}

impl Harness {
    /// Set the relayer's balance of the managed token on one chain, in both
    /// the local ledger and the mock chain state.
    pub fn set_balance(&self, chain_id: u64, balance: U256) {
        let token = self
            .routes
            .l2_token_for(TOKEN_L1, chain_id)
            .unwrap_or(TOKEN_L1);
        self.tracker.set_balance(chain_id, token, balance);
        self.monitor.set_erc20(chain_id, token, balance);
    }

    /// Shortfall for the managed token on one chain.
    pub fn set_shortfall(&self, chain_id: u64, shortfall: U256) {
        let token = self
            .routes
            .l2_token_for(TOKEN_L1, chain_id)
            .unwrap_or(TOKEN_L1);
        self.tracker.record_shortfall(chain_id, token, shortfall);
    }
}

/// A fill of the managed token from `origin` to `destination`.
pub fn fill(origin: u64, destination: u64, output_amount: u64) -> RelayFill {
    RelayFill {
        deposit_id: U256::from(7),
        origin_chain_id: origin,
        destination_chain_id: destination,
        input_token: mirror_or_l1(origin),
        output_token: mirror_or_l1(destination),
        output_amount: U256::from(output_amount),
        l1_token: None,
    }
}

fn mirror_or_l1(chain_id: u64) -> Address {
    if chain_id == HUB {
        TOKEN_L1
    } else {
        mirror(chain_id)
    }
}
