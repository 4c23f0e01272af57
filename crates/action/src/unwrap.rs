//! Unwrap action: convert wrapped-native tokens back into gas.

use crate::{Action, ActionResult};
use alloy_primitives::{utils::format_ether, Address, U256};
use alloy_provider::Provider;
use binding::token::WETH9;
use client::SignerFn;

/// Parameters for one unwrap.
#[derive(Debug, Clone)]
pub struct Unwrap {
    /// Wrapped-native token address on the target chain
    pub weth: Address,
    /// Amount to unwrap (wei)
    pub amount: U256,
    /// Chain the unwrap runs on (logging only)
    pub chain_id: u64,
}

/// Action unwrapping WETH into native on one chain.
pub struct UnwrapAction<P> {
    provider: P,
    signer: SignerFn,
    unwrap: Unwrap,
    sim: bool,
}

impl<P> UnwrapAction<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, signer: SignerFn, unwrap: Unwrap, sim: bool) -> Self {
        Self {
            provider,
            signer,
            unwrap,
            sim,
        }
    }
}

impl<P> Action for UnwrapAction<P>
where
    P: Provider + Clone + Send + Sync,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        Ok(self.unwrap.weth != Address::ZERO && self.unwrap.amount > U256::ZERO)
    }

    async fn execute(&self) -> eyre::Result<ActionResult> {
        if !self.is_ready().await? {
            eyre::bail!("Unwrap not ready");
        }

        let contract = WETH9::new(self.unwrap.weth, &self.provider);
        let tx_request = contract.withdraw(self.unwrap.amount).into_transaction_request();

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
            "Unwrap {} ETH on chain {}",
            format_ether(self.unwrap.amount),
            self.unwrap.chain_id
        )
    }
}
