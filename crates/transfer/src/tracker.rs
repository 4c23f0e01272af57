//! Canonical-bridge transfer tracker.
//!
//! Outstanding amounts are rebuilt each cycle by correlating hub-side
//! `ERC20DepositInitiated` events with L2-side `DepositFinalized` events
//! inside a lookback window. Transfers accepted mid-cycle are layered on
//! top through [`TransferClient::increase_outstanding_transfer`] until the
//! next resync observes them on chain.

use crate::TransferClient;
use alloy_primitives::{address, Address, U256};
use alloy_provider::Provider;
use binding::bridge::{L1StandardBridge, L2StandardBridge};
use client::ProviderPool;
use config::ChainRegistry;
use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, warn};

/// L2StandardBridge predeploy, same address on all OP Stack chains.
const L2_BRIDGE: Address = address!("4200000000000000000000000000000000000010");

const CHUNK_SIZE: u64 = 9_500;

/// In-memory implementation of [`TransferClient`] backed by bridge event
/// scans.
pub struct TransferTracker {
    pool: ProviderPool,
    registry: ChainRegistry,
    relayer: Address,
    lookback_secs: u64,
    ledger: RwLock<BTreeMap<(u64, Address), U256>>,
}

impl TransferTracker {
    pub fn new(
        pool: ProviderPool,
        registry: ChainRegistry,
        relayer: Address,
        lookback_secs: u64,
    ) -> Self {
        Self {
            pool,
            registry,
            relayer,
            lookback_secs,
            ledger: RwLock::new(BTreeMap::new()),
        }
    }

    /// Outstanding amount toward one chain for one token: initiated on the
    /// hub minus finalized on the L2, within the lookback window.
    async fn scan_outstanding(&self, chain_id: u64, l1_token: Address) -> eyre::Result<U256> {
        let hub = self.registry.hub();
        let chain = self
            .registry
            .get(chain_id)
            .ok_or_else(|| eyre::eyre!("unknown chain {chain_id}"))?;
        let Some(l1_bridge) = chain.l1_bridge else {
            eyre::bail!("chain {chain_id} has no canonical bridge");
        };

        let initiated = self
            .scan_initiated(l1_bridge, l1_token, hub.block_time_secs)
            .await?;
        let finalized = self
            .scan_finalized(chain_id, l1_token, chain.block_time_secs)
            .await?;

        debug!(
            chain_id,
            token = %l1_token,
            %initiated,
            %finalized,
            "Scanned bridge transfers"
        );

        Ok(initiated.saturating_sub(finalized))
    }

    /// Sum hub-side `ERC20DepositInitiated` amounts for the relayer.
    async fn scan_initiated(
        &self,
        l1_bridge: Address,
        l1_token: Address,
        block_time_secs: u64,
    ) -> eyre::Result<U256> {
        let provider = self.pool.get(self.registry.hub_chain_id())?.clone();
        let current_block = provider.get_block_number().await?;
        let from_block = current_block.saturating_sub(self.lookback_secs / block_time_secs);

        let mut total = U256::ZERO;
        let mut current = from_block;

        while current <= current_block {
            let chunk_end = (current + CHUNK_SIZE - 1).min(current_block);

            let retry_strategy = ExponentialBackoff::from_millis(100).take(5);
            let chunk_total = Retry::spawn(retry_strategy, || async {
                let contract = L1StandardBridge::new(l1_bridge, provider.clone());
                let filter = contract
                    .ERC20DepositInitiated_filter()
                    .topic1(l1_token.into_word())
                    .topic3(self.relayer.into_word())
                    .from_block(current)
                    .to_block(chunk_end);

                let events = filter.query().await.map_err(|e| {
                    warn!(
                        from = current,
                        to = chunk_end,
                        error = %e,
                        "Bridge deposit scan failed, will retry"
                    );
                    e
                })?;

                let sum: U256 = events.iter().map(|(event, _)| event.amount).sum();
                Ok::<_, eyre::Report>(sum)
            })
            .await?;

            total += chunk_total;
            current = chunk_end + 1;
        }

        Ok(total)
    }

    /// Sum L2-side `DepositFinalized` amounts for the relayer.
    async fn scan_finalized(
        &self,
        chain_id: u64,
        l1_token: Address,
        block_time_secs: u64,
    ) -> eyre::Result<U256> {
        let provider = self.pool.get(chain_id)?.clone();
        let current_block = provider.get_block_number().await?;
        let from_block = current_block.saturating_sub(self.lookback_secs / block_time_secs);

        let mut total = U256::ZERO;
        let mut current = from_block;

        while current <= current_block {
            let chunk_end = (current + CHUNK_SIZE - 1).min(current_block);

            let retry_strategy = ExponentialBackoff::from_millis(100).take(5);
            let chunk_total = Retry::spawn(retry_strategy, || async {
                let contract = L2StandardBridge::new(L2_BRIDGE, provider.clone());
                let filter = contract
                    .DepositFinalized_filter()
                    .topic1(l1_token.into_word())
                    .topic3(self.relayer.into_word())
                    .from_block(current)
                    .to_block(chunk_end);

                let events = filter.query().await.map_err(|e| {
                    warn!(
                        from = current,
                        to = chunk_end,
                        error = %e,
                        "Bridge finalization scan failed, will retry"
                    );
                    e
                })?;

                let sum: U256 = events.iter().map(|(event, _)| event.amount).sum();
                Ok::<_, eyre::Report>(sum)
            })
            .await?;

            total += chunk_total;
            current = chunk_end + 1;
        }

        Ok(total)
    }
}

impl TransferClient for TransferTracker {
    fn outstanding_transfer_amount(
        &self,
        _relayer: Address,
        chain_id: u64,
        l1_token: Address,
    ) -> U256 {
        let ledger = self.ledger.read().unwrap_or_else(PoisonError::into_inner);
        ledger
            .get(&(chain_id, l1_token))
            .copied()
            .unwrap_or_default()
    }

    fn increase_outstanding_transfer(
        &self,
        _relayer: Address,
        l1_token: Address,
        amount: U256,
        chain_id: u64,
    ) {
        let mut ledger = self.ledger.write().unwrap_or_else(PoisonError::into_inner);
        let entry = ledger.entry((chain_id, l1_token)).or_default();
        *entry += amount;
    }

    async fn update(&self, l1_tokens: &[Address]) -> eyre::Result<()> {
        let mut fresh = BTreeMap::new();

        for chain_id in self.registry.l2_chain_ids().collect::<Vec<_>>() {
            for l1_token in l1_tokens {
                let outstanding = self.scan_outstanding(chain_id, *l1_token).await?;
                if !outstanding.is_zero() {
                    fresh.insert((chain_id, *l1_token), outstanding);
                }
            }
        }

        let mut ledger = self.ledger.write().unwrap_or_else(PoisonError::into_inner);
        *ledger = fresh;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const TOKEN: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

    fn tracker() -> TransferTracker {
        let registry = ChainRegistry::new(
            1,
            vec![
                config::ChainConfig {
                    chain_id: 1,
                    name: "ethereum".to_string(),
                    rpc_url: "http://localhost:8545".to_string(),
                    weth: TOKEN,
                    spoke_pool: Address::ZERO,
                    l1_bridge: None,
                    gas_is_native: true,
                    block_time_secs: 12,
                },
                config::ChainConfig {
                    chain_id: 10,
                    name: "optimism".to_string(),
                    rpc_url: "http://localhost:8546".to_string(),
                    weth: TOKEN,
                    spoke_pool: Address::ZERO,
                    l1_bridge: Some(address!("99C9fc46f92E8a1c0deC1b1747d010903E884bE1")),
                    gas_is_native: true,
                    block_time_secs: 2,
                },
            ],
        )
        .unwrap();

        TransferTracker::new(ProviderPool::new(), registry, Address::ZERO, 7200)
    }

    #[test]
    fn test_outstanding_defaults_to_zero() {
        let tracker = tracker();
        assert_eq!(
            tracker.outstanding_transfer_amount(Address::ZERO, 10, TOKEN),
            U256::ZERO
        );
    }

    #[test]
    fn test_increase_accumulates() {
        let tracker = tracker();
        tracker.increase_outstanding_transfer(Address::ZERO, TOKEN, U256::from(40), 10);
        tracker.increase_outstanding_transfer(Address::ZERO, TOKEN, U256::from(2), 10);

        assert_eq!(
            tracker.outstanding_transfer_amount(Address::ZERO, 10, TOKEN),
            U256::from(42)
        );
        // Other chains unaffected.
        assert_eq!(
            tracker.outstanding_transfer_amount(Address::ZERO, 137, TOKEN),
            U256::ZERO
        );
    }
}
