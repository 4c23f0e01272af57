pub mod manager;
pub mod send;
pub mod unwrap;
pub mod wrap;

pub use manager::{AdapterManager, BridgeAdapterManager};

use alloy_primitives::TxHash;
use std::future::Future;

/// Trait for executable onchain actions.
pub trait Action: Send + Sync {
    /// Check to see if the action is ready to be executed.
    fn is_ready(&self) -> impl Future<Output = eyre::Result<bool>> + Send;

    /// Execute the action.
    ///
    /// In simulation mode the transaction is run through `eth_call` instead
    /// of being broadcast, and the returned hash is zero.
    fn execute(&self) -> impl Future<Output = eyre::Result<ActionResult>> + Send;

    /// Get a human-readable description of this action.
    fn description(&self) -> String;
}

/// Result of an action.
#[derive(Debug, Clone)]
pub struct ActionResult {
    /// Transaction hash (zero in simulation mode)
    pub tx_hash: TxHash,
    /// Block number where transaction was included
    pub block_number: Option<u64>,
    /// Gas used
    pub gas_used: Option<u64>,
}

impl ActionResult {
    /// Result of a simulated submission.
    pub const fn simulated() -> Self {
        Self {
            tx_hash: TxHash::ZERO,
            block_number: None,
            gas_used: None,
        }
    }
}
