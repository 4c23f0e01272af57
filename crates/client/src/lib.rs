//! RPC provider and signer management.
//!
//! The keeper talks to one hub chain and several L2 chains at once, so
//! providers are held in a [`ProviderPool`] keyed by chain id. Transactions
//! are signed externally through a [`SignerFn`] and broadcast with
//! `send_raw_transaction`.

use alloy_eips::eip2718::Encodable2718;
use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::Bytes;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use std::{collections::BTreeMap, future::Future, pin::Pin, sync::Arc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// No provider registered for the requested chain
    #[error("No provider for chain {0}")]
    UnknownChain(u64),

    /// General error with context
    #[error("Client error: {0}")]
    Other(String),
}

/// Convenience function to create an ethereum rpc provider from url.
///
/// The provider is type-erased so that providers for different chains can
/// live in one map.
pub fn create_provider(rpc_url: &str) -> Result<DynProvider, ClientError> {
    let url = rpc_url
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{}", e)))?;
    let provider = ProviderBuilder::new().connect_http(url);

    Ok(provider.erased())
}

/// Per-chain provider handles keyed by chain id.
#[derive(Clone, Default)]
pub struct ProviderPool {
    providers: BTreeMap<u64, DynProvider>,
}

impl ProviderPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider for a chain.
    pub fn insert(&mut self, chain_id: u64, provider: DynProvider) {
        self.providers.insert(chain_id, provider);
    }

    /// Get the provider for a chain.
    pub fn get(&self, chain_id: u64) -> Result<&DynProvider, ClientError> {
        self.providers
            .get(&chain_id)
            .ok_or(ClientError::UnknownChain(chain_id))
    }

    /// Chain ids with a registered provider, in ascending order.
    pub fn chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.providers.keys().copied()
    }
}

/// Boxed async signing function.
///
/// Takes a transaction request, fills whatever is missing, signs it, and
/// returns raw bytes ready for `send_raw_transaction`.
pub type SignerFn = Arc<
    dyn Fn(TransactionRequest) -> Pin<Box<dyn Future<Output = eyre::Result<Bytes>> + Send>>
        + Send
        + Sync,
>;

/// Create a [`SignerFn`] backed by a local private key.
///
/// Nonce, fees and gas limit are filled from the provider before signing,
/// so callers only need to supply the call itself.
pub fn local_signer_fn(
    private_key: &str,
    chain_id: u64,
    provider: DynProvider,
) -> eyre::Result<SignerFn> {
    let signer: PrivateKeySigner = private_key.parse()?;
    let address = signer.address();
    let wallet = EthereumWallet::from(signer);

    Ok(Arc::new(move |mut tx: TransactionRequest| {
        let provider = provider.clone();
        let wallet = wallet.clone();
        Box::pin(async move {
            tx = tx.with_from(address).with_chain_id(chain_id);

            if tx.nonce.is_none() {
                let nonce = provider.get_transaction_count(address).await?;
                tx = tx.with_nonce(nonce);
            }

            let fees = provider.estimate_eip1559_fees().await?;
            tx = tx
                .with_max_fee_per_gas(fees.max_fee_per_gas)
                .with_max_priority_fee_per_gas(fees.max_priority_fee_per_gas);

            if tx.gas.is_none() {
                let gas = provider.estimate_gas(tx.clone()).await?;
                tx = tx.with_gas_limit(gas);
            }

            let envelope = tx.build(&wallet).await?;
            Ok(Bytes::from(envelope.encoded_2718()))
        })
    }))
}
