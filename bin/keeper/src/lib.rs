pub mod metrics;

use crate::metrics::Metrics;
use action::{AdapterManager, BridgeAdapterManager};
use alloy_primitives::{Address, U256};
use balance::{ChainMonitor, TokenTracker};
use bundles::SpokeRefundClient;
use client::{ProviderPool, SignerFn};
use config::Config;
use inventory::{InventoryManager, RebalanceReport, UnwrapReport};
use routes::TokenRouteRegistry;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{info, warn};
use transfer::{TransferClient, TransferTracker};

type Manager = InventoryManager<
    TokenTracker,
    ChainMonitor,
    TokenRouteRegistry,
    TransferTracker,
    SpokeRefundClient<TokenRouteRegistry>,
    BridgeAdapterManager<TokenRouteRegistry>,
>;

/// Result status for a cycle step
#[derive(Debug, Clone, Copy)]
pub enum StepResult {
    Ok,
    Failed,
    Skipped,
}

impl StepResult {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Everything one cycle produced.
pub struct CycleReport {
    pub refresh: StepResult,
    pub wrap: StepResult,
    pub rebalance: RebalanceReport,
    pub unwrap: UnwrapReport,
}

/// The wired-up keeper: collaborators plus the inventory core.
pub struct Keeper {
    relayer: Address,
    sim: bool,
    wrap_threshold: Option<U256>,
    wrap_target: Option<U256>,
    ledger_plan: Vec<(u64, Address)>,
    l1_tokens: Vec<Address>,
    tracker: Arc<TokenTracker>,
    monitor: Arc<ChainMonitor>,
    transfers: Arc<TransferTracker>,
    adapter: Arc<BridgeAdapterManager<TokenRouteRegistry>>,
    manager: Manager,
    metrics: Metrics,
}

impl Keeper {
    /// Build all collaborators from configuration.
    ///
    /// `private_key` may be omitted in simulation mode; without it any real
    /// submission will fail at signing time.
    pub fn new(config: &Config, private_key: Option<&str>) -> eyre::Result<Self> {
        let registry = config.chain_registry()?;

        let mut pool = ProviderPool::new();
        for chain in registry.chains() {
            pool.insert(chain.chain_id, client::create_provider(&chain.rpc_url)?);
        }

        let mut signers: BTreeMap<u64, SignerFn> = BTreeMap::new();
        if let Some(pk) = private_key {
            for chain in registry.chains() {
                let provider = pool.get(chain.chain_id)?.clone();
                signers.insert(
                    chain.chain_id,
                    client::local_signer_fn(pk, chain.chain_id, provider)?,
                );
            }
        }

        let tracker = Arc::new(TokenTracker::new());
        let monitor = Arc::new(ChainMonitor::new(pool.clone()));
        let routes = Arc::new(TokenRouteRegistry::new(config.hub_chain_id, &config.tokens));
        let transfers = Arc::new(TransferTracker::new(
            pool.clone(),
            registry.clone(),
            config.relayer,
            config.lookback_secs,
        ));
        let bundles = Arc::new(SpokeRefundClient::new(
            pool.clone(),
            registry.clone(),
            routes.clone(),
            config.lookback_secs,
        ));
        let adapter = Arc::new(BridgeAdapterManager::new(
            pool,
            registry.clone(),
            routes.clone(),
            signers,
        ));

        let manager = InventoryManager::new(
            inventory::targets(&config.tokens),
            registry,
            config.relayer,
            config.sim,
            tracker.clone(),
            monitor.clone(),
            routes,
            transfers.clone(),
            bundles,
            adapter.clone(),
        );

        Ok(Self {
            relayer: config.relayer,
            sim: config.sim,
            wrap_threshold: config.wrap_threshold,
            wrap_target: config.wrap_target,
            ledger_plan: ledger_plan(config),
            l1_tokens: config.l1_tokens(),
            tracker,
            monitor,
            transfers,
            adapter,
            manager,
            metrics: Metrics::new(),
        })
    }

    pub const fn manager(&self) -> &Manager {
        &self.manager
    }

    /// One-time startup work: grant the canonical bridges allowance for
    /// every managed token.
    pub async fn startup(&self) -> eyre::Result<()> {
        if self.sim {
            info!("Simulation mode: skipping bridge approvals");
            return Ok(());
        }
        self.adapter
            .set_l1_token_approvals(self.relayer, &self.l1_tokens)
            .await
    }

    /// Re-read ledger balances and outstanding bridge transfers from chain.
    async fn refresh(&self) -> eyre::Result<()> {
        self.tracker
            .refresh(&*self.monitor, self.relayer, &self.ledger_plan)
            .await?;
        self.transfers.update(&self.l1_tokens).await?;
        Ok(())
    }

    /// Run one full keeper cycle: refresh state, wrap excess hub native,
    /// rebalance under-allocated chains, replenish gas.
    pub async fn run_cycle(&self) -> CycleReport {
        self.manager.begin_cycle().await;

        let refresh = match self.refresh().await {
            Ok(()) => StepResult::Ok,
            Err(e) => {
                warn!(error = %e, "Failed to refresh on-chain state");
                StepResult::Failed
            }
        };

        let wrap = match (self.wrap_threshold, self.wrap_target) {
            (Some(threshold), Some(target)) => {
                match self
                    .adapter
                    .wrap_native_if_above_threshold(self.relayer, threshold, target, self.sim)
                    .await
                {
                    Ok(Some(tx_hash)) => {
                        info!(%tx_hash, "Wrapped excess hub native");
                        StepResult::Ok
                    }
                    Ok(None) => StepResult::Ok,
                    Err(e) => {
                        warn!(error = %e, "Failed to wrap hub native");
                        StepResult::Failed
                    }
                }
            }
            _ => StepResult::Skipped,
        };

        let rebalance = self.manager.rebalance_inventory_if_needed().await;
        let unwrap = self.manager.unwrap_native_if_needed().await;

        self.metrics.record_rebalances(&rebalance);
        self.metrics.record_unwraps(&unwrap);
        self.record_allocation_gauges();

        CycleReport {
            refresh,
            wrap,
            rebalance,
            unwrap,
        }
    }

    fn record_allocation_gauges(&self) {
        for (token, distribution) in self.manager.token_distribution() {
            for (chain_id, pct) in distribution {
                self.metrics.set_allocation(token, chain_id, pct);
            }
            self.metrics
                .set_cumulative_balance(token, self.manager.cumulative_balance(token));
        }
    }

    pub const fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// (chain, token) pairs whose ledger balances the keeper tracks: each
/// managed token on the hub plus every chain it is managed on.
fn ledger_plan(config: &Config) -> Vec<(u64, Address)> {
    let mut plan = Vec::new();
    for token in &config.tokens {
        plan.push((config.hub_chain_id, token.l1));
        for (chain_id, l2_token) in &token.l2 {
            plan.push((*chain_id, *l2_token));
        }
    }
    plan
}
