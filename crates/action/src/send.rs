//! Canonical bridge send action.
//!
//! Moves hub-chain capital toward an L2 through the chain's
//! L1StandardBridge. The bridge contract pulls the tokens via allowance, so
//! approvals must be in place before this action runs.

use crate::{Action, ActionResult};
use alloy_primitives::{utils::format_units, Address, Bytes, U256};
use alloy_provider::Provider;
use binding::bridge::L1StandardBridge;
use client::SignerFn;

/// Gas forwarded to the L2 leg of the deposit.
const MIN_GAS_LIMIT: u32 = 200_000;

/// Parameters for one bridge send.
#[derive(Debug, Clone)]
pub struct BridgeSend {
    /// L1StandardBridge address for the destination chain
    pub bridge: Address,
    /// Token on the hub chain
    pub l1_token: Address,
    /// Mirror token on the destination chain
    pub l2_token: Address,
    /// Recipient on the destination chain
    pub recipient: Address,
    /// Amount to bridge (token native decimals)
    pub amount: U256,
    /// Destination chain id (logging only; the bridge address selects it)
    pub destination_chain_id: u64,
}

/// Action bridging tokens from the hub to an L2.
pub struct BridgeSendAction<P> {
    provider: P,
    signer: SignerFn,
    send: BridgeSend,
    sim: bool,
}

impl<P> BridgeSendAction<P>
where
    P: Provider + Clone,
{
    pub fn new(provider: P, signer: SignerFn, send: BridgeSend, sim: bool) -> Self {
        Self {
            provider,
            signer,
            send,
            sim,
        }
    }

    fn validate(&self) -> eyre::Result<()> {
        if self.send.bridge == Address::ZERO {
            eyre::bail!("Bridge address is zero");
        }

        if self.send.recipient == Address::ZERO {
            eyre::bail!("Recipient address is zero");
        }

        if self.send.amount == U256::ZERO {
            eyre::bail!("Bridge amount is zero");
        }

        Ok(())
    }
}

impl<P> Action for BridgeSendAction<P>
where
    P: Provider + Clone + Send + Sync,
{
    async fn is_ready(&self) -> eyre::Result<bool> {
        Ok(self.send.bridge != Address::ZERO
            && self.send.recipient != Address::ZERO
            && self.send.amount > U256::ZERO)
    }

    async fn execute(&self) -> eyre::Result<ActionResult> {
        self.validate()?;

        let contract = L1StandardBridge::new(self.send.bridge, &self.provider);
        let call = contract.depositERC20To(
            self.send.l1_token,
            self.send.l2_token,
            self.send.recipient,
            self.send.amount,
            MIN_GAS_LIMIT,
            Bytes::new(),
        );
        let tx_request = call.into_transaction_request();

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
        let amount = format_units(self.send.amount, 18).unwrap_or_default();
        format!(
            "Bridge {} of {} to chain {}",
            amount, self.send.l1_token, self.send.destination_chain_id
        )
    }
}
