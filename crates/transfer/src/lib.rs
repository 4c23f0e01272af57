//! Outstanding cross-chain transfer tracking.
//!
//! Capital sent over a canonical bridge is debited on the hub immediately
//! but only credited on the destination chain minutes later. This crate
//! tracks that in-between amount per (chain, token) so the rest of the
//! keeper can treat it as virtually present on the destination.

pub mod tracker;

pub use tracker::TransferTracker;

use alloy_primitives::{Address, U256};
use std::future::Future;

/// Read/command surface over outstanding canonical-bridge transfers.
pub trait TransferClient: Send + Sync {
    /// Amount sent toward `chain_id` that has not been credited there yet.
    fn outstanding_transfer_amount(
        &self,
        relayer: Address,
        chain_id: u64,
        l1_token: Address,
    ) -> U256;

    /// Record a transfer the keeper just committed to, ahead of the next
    /// event resync.
    fn increase_outstanding_transfer(
        &self,
        relayer: Address,
        l1_token: Address,
        amount: U256,
        chain_id: u64,
    );

    /// Rebuild the outstanding ledger from bridge events.
    fn update(&self, l1_tokens: &[Address]) -> impl Future<Output = eyre::Result<()>> + Send;
}
