//! SpokePool-backed refund client.
//!
//! Validated-bundle refunds are read directly from each SpokePool's
//! `getRelayerRefund` view. Next-bundle refunds are estimated by scanning
//! recent `FilledRelay` events for fills the relayer made that no bundle
//! has settled yet, grouped onto their repayment chains.

use crate::{BundleDataClient, Refund, RefundSet};
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use binding::spoke::ISpokePool;
use client::ProviderPool;
use config::ChainRegistry;
use routes::RouteClient;
use std::{collections::BTreeMap, sync::Arc};
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, warn};

const CHUNK_SIZE: u64 = 9_500;

/// [`BundleDataClient`] implementation reading the SpokePool refund surface.
pub struct SpokeRefundClient<R> {
    pool: ProviderPool,
    registry: ChainRegistry,
    routes: Arc<R>,
    lookback_secs: u64,
}

impl<R> SpokeRefundClient<R>
where
    R: RouteClient,
{
    pub fn new(
        pool: ProviderPool,
        registry: ChainRegistry,
        routes: Arc<R>,
        lookback_secs: u64,
    ) -> Self {
        Self {
            pool,
            registry,
            routes,
            lookback_secs,
        }
    }

    /// Claimable refunds on one chain for every managed token.
    async fn claimable_on_chain(
        &self,
        chain_id: u64,
        relayer: Address,
    ) -> eyre::Result<Vec<Refund>> {
        let chain = self
            .registry
            .get(chain_id)
            .ok_or_else(|| eyre::eyre!("unknown chain {chain_id}"))?;
        let provider = self.pool.get(chain_id)?.clone();
        let contract = ISpokePool::new(chain.spoke_pool, provider);

        let mut refunds = Vec::new();
        for l1_token in self.routes.l1_tokens() {
            let Some(token) = self.routes.l2_token_for(l1_token, chain_id) else {
                continue;
            };

            let amount: U256 = contract.getRelayerRefund(token, relayer).call().await?;
            if amount.is_zero() {
                continue;
            }

            debug!(chain_id, %token, %amount, "Claimable relayer refund");
            refunds.push(Refund {
                chain_id,
                token,
                relayer,
                amount,
            });
        }

        Ok(refunds)
    }

    /// Scan one chain's SpokePool for the relayer's recent fills and return
    /// the refunds they will earn, keyed by (repayment chain, l1 token).
    async fn scan_fills(
        &self,
        chain_id: u64,
        relayer: Address,
    ) -> eyre::Result<BTreeMap<(u64, Address), U256>> {
        let chain = self
            .registry
            .get(chain_id)
            .ok_or_else(|| eyre::eyre!("unknown chain {chain_id}"))?;
        let provider = self.pool.get(chain_id)?.clone();

        let current_block = provider.get_block_number().await?;
        let from_block =
            current_block.saturating_sub(self.lookback_secs / chain.block_time_secs);

        let mut owed: BTreeMap<(u64, Address), U256> = BTreeMap::new();
        let mut current = from_block;

        while current <= current_block {
            let chunk_end = (current + CHUNK_SIZE - 1).min(current_block);

            let retry_strategy = ExponentialBackoff::from_millis(100).take(5);
            let events = Retry::spawn(retry_strategy, || async {
                let contract = ISpokePool::new(chain.spoke_pool, provider.clone());
                let filter = contract
                    .FilledRelay_filter()
                    .topic3(relayer.into_word())
                    .from_block(current)
                    .to_block(chunk_end);

                filter.query().await.map_err(|e| {
                    warn!(
                        chain_id,
                        from = current,
                        to = chunk_end,
                        error = %e,
                        "Fill scan failed, will retry"
                    );
                    eyre::Report::from(e)
                })
            })
            .await?;

            for (event, _) in events {
                let output_token = Address::from_word(event.outputToken);
                let Some(l1_token) = self.routes.l1_token_for(output_token, chain_id) else {
                    continue;
                };
                let repayment_chain = event.repaymentChainId.to::<u64>();

                let entry = owed.entry((repayment_chain, l1_token)).or_default();
                *entry += event.inputAmount;
            }

            current = chunk_end + 1;
        }

        Ok(owed)
    }
}

impl<R> BundleDataClient for SpokeRefundClient<R>
where
    R: RouteClient,
{
    async fn pending_refunds_from_valid_bundles(
        &self,
        relayer: Address,
    ) -> eyre::Result<Vec<RefundSet>> {
        let mut set = RefundSet::default();

        for chain_id in self.registry.chain_ids().collect::<Vec<_>>() {
            set.refunds
                .extend(self.claimable_on_chain(chain_id, relayer).await?);
        }

        Ok(vec![set])
    }

    async fn next_bundle_refunds(&self, relayer: Address) -> eyre::Result<Vec<RefundSet>> {
        let mut owed: BTreeMap<(u64, Address), U256> = BTreeMap::new();

        for chain_id in self.registry.chain_ids().collect::<Vec<_>>() {
            for (key, amount) in self.scan_fills(chain_id, relayer).await? {
                let entry = owed.entry(key).or_default();
                *entry += amount;
            }
        }

        let mut set = RefundSet::default();
        for ((repayment_chain, l1_token), amount) in owed {
            // Refunds pay out in the repayment chain's mirror of the token.
            let Some(token) = self.routes.l2_token_for(l1_token, repayment_chain) else {
                continue;
            };
            set.refunds.push(Refund {
                chain_id: repayment_chain,
                token,
                relayer,
                amount,
            });
        }

        Ok(vec![set])
    }
}
