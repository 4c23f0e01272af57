//! Adapter manager: the single submission gateway for the keeper.
//!
//! Every transaction the keeper sends goes through here, one at a time, on
//! the right chain with the right signer. Serial submission avoids nonce
//! collisions; there is no parallel nonce management.

use crate::{
    send::{BridgeSend, BridgeSendAction},
    unwrap::{Unwrap, UnwrapAction},
    wrap::{Wrap, WrapAction},
    Action,
};
use alloy_primitives::{utils::format_ether, Address, TxHash, U256};
use alloy_provider::Provider;
use binding::token::ERC20;
use client::{ProviderPool, SignerFn};
use config::ChainRegistry;
use eyre::eyre;
use routes::RouteClient;
use std::{collections::BTreeMap, future::Future, sync::Arc};
use tracing::info;

/// Submission surface used by the inventory core.
pub trait AdapterManager: Send + Sync {
    /// Bridge `amount` of `l1_token` from the hub toward `chain_id`,
    /// crediting the relayer there. Returns the transaction hash.
    fn send_token_cross_chain(
        &self,
        relayer: Address,
        chain_id: u64,
        l1_token: Address,
        amount: U256,
        sim: bool,
    ) -> impl Future<Output = eyre::Result<TxHash>> + Send;

    /// Unwrap `amount` of wrapped-native into gas on `chain_id`.
    fn unwrap_wrapped_native(
        &self,
        chain_id: u64,
        amount: U256,
        sim: bool,
    ) -> impl Future<Output = eyre::Result<TxHash>> + Send;

    /// Grant the canonical bridges allowance for each managed L1 token.
    fn set_l1_token_approvals(
        &self,
        relayer: Address,
        l1_tokens: &[Address],
    ) -> impl Future<Output = eyre::Result<()>> + Send;

    /// Wrap hub-chain native above `threshold` down to `target`.
    /// Returns the hash if a wrap was submitted.
    fn wrap_native_if_above_threshold(
        &self,
        relayer: Address,
        threshold: U256,
        target: U256,
        sim: bool,
    ) -> impl Future<Output = eyre::Result<Option<TxHash>>> + Send;
}

/// [`AdapterManager`] implementation over the canonical standard bridges.
pub struct BridgeAdapterManager<R> {
    pool: ProviderPool,
    registry: ChainRegistry,
    routes: Arc<R>,
    signers: BTreeMap<u64, SignerFn>,
}

impl<R> BridgeAdapterManager<R>
where
    R: RouteClient,
{
    pub fn new(
        pool: ProviderPool,
        registry: ChainRegistry,
        routes: Arc<R>,
        signers: BTreeMap<u64, SignerFn>,
    ) -> Self {
        Self {
            pool,
            registry,
            routes,
            signers,
        }
    }

    fn signer(&self, chain_id: u64) -> eyre::Result<SignerFn> {
        self.signers
            .get(&chain_id)
            .cloned()
            .ok_or_else(|| eyre!("no signer for chain {chain_id}"))
    }
}

impl<R> AdapterManager for BridgeAdapterManager<R>
where
    R: RouteClient,
{
    async fn send_token_cross_chain(
        &self,
        relayer: Address,
        chain_id: u64,
        l1_token: Address,
        amount: U256,
        sim: bool,
    ) -> eyre::Result<TxHash> {
        let chain = self
            .registry
            .get(chain_id)
            .ok_or_else(|| eyre!("unknown chain {chain_id}"))?;
        let bridge = chain
            .l1_bridge
            .ok_or_else(|| eyre!("chain {chain_id} has no canonical bridge"))?;
        let l2_token = self
            .routes
            .l2_token_for(l1_token, chain_id)
            .ok_or_else(|| eyre!("no route for {l1_token} to chain {chain_id}"))?;

        let hub = self.registry.hub_chain_id();
        let provider = self.pool.get(hub)?.clone();
        let signer = self.signer(hub)?;

        let action = BridgeSendAction::new(
            provider,
            signer,
            BridgeSend {
                bridge,
                l1_token,
                l2_token,
                recipient: relayer,
                amount,
                destination_chain_id: chain_id,
            },
            sim,
        );

        info!(sim, "{}", action.description());
        let result = action.execute().await?;

        Ok(result.tx_hash)
    }

    async fn unwrap_wrapped_native(
        &self,
        chain_id: u64,
        amount: U256,
        sim: bool,
    ) -> eyre::Result<TxHash> {
        let chain = self
            .registry
            .get(chain_id)
            .ok_or_else(|| eyre!("unknown chain {chain_id}"))?;
        let provider = self.pool.get(chain_id)?.clone();
        let signer = self.signer(chain_id)?;

        let action = UnwrapAction::new(
            provider,
            signer,
            Unwrap {
                weth: chain.weth,
                amount,
                chain_id,
            },
            sim,
        );

        info!(sim, "{}", action.description());
        let result = action.execute().await?;

        Ok(result.tx_hash)
    }

    async fn set_l1_token_approvals(
        &self,
        relayer: Address,
        l1_tokens: &[Address],
    ) -> eyre::Result<()> {
        let hub = self.registry.hub_chain_id();
        let provider = self.pool.get(hub)?.clone();
        let signer = self.signer(hub)?;

        for l1_token in l1_tokens {
            for chain_id in self.registry.l2_chain_ids().collect::<Vec<_>>() {
                if !self.routes.route_enabled(*l1_token, chain_id) {
                    continue;
                }
                let Some(bridge) = self.registry.get(chain_id).and_then(|c| c.l1_bridge) else {
                    continue;
                };

                let contract = ERC20::new(*l1_token, provider.clone());
                let allowance: U256 = contract.allowance(relayer, bridge).call().await?;
                if allowance >= U256::MAX >> 1 {
                    continue;
                }

                info!(
                    token = %l1_token,
                    %bridge,
                    chain_id,
                    "Granting bridge allowance"
                );
                let tx_request = contract
                    .approve(bridge, U256::MAX)
                    .into_transaction_request();
                let signed_tx = (signer)(tx_request).await?;
                let pending_tx = provider.send_raw_transaction(&signed_tx).await?;
                pending_tx.get_receipt().await?;
            }
        }

        Ok(())
    }

    async fn wrap_native_if_above_threshold(
        &self,
        relayer: Address,
        threshold: U256,
        target: U256,
        sim: bool,
    ) -> eyre::Result<Option<TxHash>> {
        let hub = self.registry.hub();
        let provider = self.pool.get(hub.chain_id)?.clone();

        let native = provider.get_balance(relayer).await?;
        if native <= threshold {
            return Ok(None);
        }

        let amount = native.saturating_sub(target);
        if amount.is_zero() {
            return Ok(None);
        }

        info!(
            native = %format_ether(native),
            amount = %format_ether(amount),
            "Hub native above threshold, wrapping"
        );

        let signer = self.signer(hub.chain_id)?;
        let action = WrapAction::new(
            provider,
            signer,
            Wrap {
                weth: hub.weth,
                amount,
                chain_id: hub.chain_id,
            },
            sim,
        );

        let result = action.execute().await?;
        Ok(Some(result.tx_hash))
    }
}
