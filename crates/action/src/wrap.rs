//! Wrap action: convert excess native gas into the wrapped-native token.

use crate::{Action, ActionResult};
use alloy_primitives::{utils::format_ether, Address, U256};
use alloy_provider::Provider;
use binding::token::WETH9;
use client::SignerFn;

/// Parameters for one wrap.
#[derive(Debug, Clone)]
pub struct Wrap {
    /// Wrapped-native token address on the target chain
    pub weth: Address,
    /// Amount to wrap (wei)
    pub amount: U256,
    /// Chain the wrap runs on (logging only)
    pub chain_id: u64,
}

/// Action wrapping native into WETH on one chain.
pub struct WrapAction<P> {
    provider: P,
    signer: SignerFn,
    wrap: Wrap,
    sim: bool,
}

impl<P> WrapAction<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, signer: SignerFn, wrap: Wrap, sim: bool) -> Self {
        Self {
            provider,
            signer,
            wrap,
            sim,
        }
    }
}

impl<P> Action for WrapAction<P>
where
    P: Provider + Clone + Send + Sync,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        Ok(self.wrap.weth != Address::ZERO && self.wrap.amount > U256::ZERO)
    }

    async fn execute(&self) -> eyre::Result<ActionResult> {
        if !self.is_ready().await? {
            eyre::bail!("Wrap not ready");
        }

        let contract = WETH9::new(self.wrap.weth, &self.provider);
        let tx_request = contract
            .deposit()
            .value(self.wrap.amount)
            .into_transaction_request();

        if self.sim {
            self.provider.call(tx_request).await?;
            return Ok(ActionResult::simulated());
        }

        let signed_tx = (self.signer)(tx_request).await?;
        let pending_tx = self.provider.send_raw_transaction(&signed_tx).await?;
        let tx_hash = *pending_tx.tx_hash();

        let receipt = pending_tx.get_receipt().await?;
        if !receipt.status() {
            eyre::bail!("Transaction reverted");
        }

        Ok(ActionResult {
            tx_hash,
            block_number: receipt.block_number,
            gas_used: Some(receipt.gas_used),
        })
    }

    fn description(&self) -> String {
        format!(
            "Wrap {} ETH on chain {}",
            format_ether(self.wrap.amount),
            self.wrap.chain_id
        )
    }
}
