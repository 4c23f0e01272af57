//! Refund-chain selection.
//!
//! For each fill, decide where the bundle settlement should repay the
//! relayer. Preference order: the destination chain (capital was just spent
//! there), then the origin chain, then the hub as the fallback. A candidate
//! wins if its projected post-settlement allocation stays at or under its
//! target.

use crate::{fixed, InventoryError, InventoryManager};
use alloy_primitives::{Address, U256};
use balance::TokenClient;
use bundles::{total_refund, BundleDataClient, RefundSet};
use routes::RouteClient;
use std::{collections::BTreeMap, sync::Arc};
use tracing::debug;
use transfer::TransferClient;

/// A pending fill awaiting a repayment-chain decision.
#[derive(Debug, Clone)]
pub struct RelayFill {
    pub deposit_id: U256,
    pub origin_chain_id: u64,
    pub destination_chain_id: u64,
    pub input_token: Address,
    pub output_token: Address,
    pub output_amount: U256,
    /// Precomputed canonical token, when the caller already resolved it.
    pub l1_token: Option<Address>,
}

impl<T, M, R, X, B, A> InventoryManager<T, M, R, X, B, A>
where
    T: TokenClient,
    R: RouteClient,
    X: TransferClient,
    B: BundleDataClient,
{
    /// Upcoming bundle refunds, fetched at most once per cycle.
    ///
    /// The first caller fetches validated-bundle and next-bundle refunds
    /// concurrently and caches the concatenation; later callers in the same
    /// cycle read the cached sets.
    pub(crate) async fn upcoming_refunds(&self) -> eyre::Result<Arc<Vec<RefundSet>>> {
        let mut cache = self.refund_cache.lock().await;
        if let Some(sets) = cache.as_ref() {
            return Ok(sets.clone());
        }

        let (pending, next) = tokio::try_join!(
            self.bundles.pending_refunds_from_valid_bundles(self.relayer),
            self.bundles.next_bundle_refunds(self.relayer),
        )?;

        debug!(
            valid_sets = pending.len(),
            next_sets = next.len(),
            first_valid_refunds = pending.first().map_or(0, |s| s.refunds.len()),
            "Fetched upcoming bundle refunds"
        );

        let mut sets = pending;
        sets.extend(next);
        let sets = Arc::new(sets);
        *cache = Some(sets.clone());

        Ok(sets)
    }

    /// Total upcoming refunds of `l1_token` per chain.
    fn refunds_by_chain(
        &self,
        sets: &[RefundSet],
        l1_token: Address,
    ) -> BTreeMap<u64, U256> {
        let mut refunds = BTreeMap::new();
        for chain_id in self.registry.chain_ids() {
            let Some(token) = self.routes.l2_token_for(l1_token, chain_id) else {
                continue;
            };
            let amount = total_refund(sets, self.relayer, chain_id, token);
            if !amount.is_zero() {
                refunds.insert(chain_id, amount);
            }
        }
        refunds
    }

    /// Choose the chain on which to request this fill's refund.
    pub async fn determine_refund_chain(&self, fill: &RelayFill) -> Result<u64, InventoryError> {
        let hub = self.registry.hub_chain_id();
        let destination = fill.destination_chain_id;
        let origin = fill.origin_chain_id;

        if self.is_disabled() {
            self.log_disabled_once();
            return Ok(destination);
        }

        // 1:1 fills only. Mixed tokens cannot be reasoned about here.
        if !self.routes.tokens_equivalent(
            fill.input_token,
            origin,
            fill.output_token,
            destination,
        ) {
            return Err(InventoryError::TokenMismatch {
                input: fill.input_token,
                origin,
                output: fill.output_token,
                destination,
            });
        }

        let l1_token = match fill.l1_token {
            Some(token) => token,
            None => self
                .routes
                .l1_token_for(fill.output_token, destination)
                .ok_or(InventoryError::UnknownL2Token {
                    token: fill.output_token,
                    chain_id: destination,
                })?,
        };

        if !self.is_managed(l1_token, destination) && !self.is_managed(l1_token, origin) {
            return Ok(destination);
        }

        let sets = self.upcoming_refunds().await?;
        let refunds = self.refunds_by_chain(&sets, l1_token);
        let cumulative_refunds = refunds.values().fold(U256::ZERO, |acc, r| acc + *r);
        let cumulative_virtual = self.cumulative_balance(l1_token);

        // Destination first; origin next unless it is the hub (the hub is
        // the unconditional fallback) or a repeat of the destination.
        let mut candidates = vec![destination];
        if origin != hub && origin != destination {
            candidates.push(origin);
        }

        let output = fixed::to_signed(fill.output_amount);
        for chain_id in candidates {
            let Some(cfg) = self.target(l1_token, chain_id) else {
                continue;
            };

            let shortfall = fixed::to_signed(self.shortfall(l1_token, chain_id));
            let chain_virt =
                fixed::to_signed(self.balance_on_chain(l1_token, chain_id)) - shortfall;
            let refund =
                fixed::to_signed(refunds.get(&chain_id).copied().unwrap_or_default());

            let spent = if chain_id == destination {
                chain_virt - output
            } else {
                chain_virt
            };
            let chain_virt_post = spent + refund;

            let cum_with_shortfall = fixed::to_signed(cumulative_virtual) - shortfall
                + fixed::to_signed(cumulative_refunds);
            let cum_virt_post = cum_with_shortfall - output;

            if cum_virt_post.is_zero() {
                // Nothing left to allocate against; fall back to the hub.
                return Ok(hub);
            }

            let expected_pct = fixed::ratio(chain_virt_post, cum_virt_post);
            let target_pct = fixed::to_signed(cfg.target_pct);

            debug!(
                deposit_id = %fill.deposit_id,
                token = %l1_token,
                chain_id,
                expected_pct = %expected_pct,
                target_pct = %target_pct,
                "Evaluated refund candidate"
            );

            if expected_pct <= target_pct {
                return Ok(chain_id);
            }
        }

        Ok(hub)
    }
}
