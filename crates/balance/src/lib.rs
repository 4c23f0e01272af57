//! Balance surfaces for the keeper.
//!
//! Two layers with different freshness guarantees:
//! - [`Monitor`] reads balances from chain (ERC20 `balanceOf`, native).
//! - [`tracker::TokenClient`] is the local ledger other subsystems share;
//!   it reflects reservations made during the current cycle before they are
//!   visible on chain.

pub mod monitor;
pub mod tracker;

pub use monitor::ChainMonitor;
pub use tracker::{TokenClient, TokenTracker};

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Represents a blockchain balance at a specific point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Chain the balance was read from
    pub chain_id: u64,
    /// The address holding the balance
    pub holder: Address,
    /// The asset address (zero address for native token)
    pub asset: Address,
    /// The balance amount
    pub amount: U256,
}

/// Type of balance query to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceQuery {
    /// Query ERC20 token balance for an EOA or contract
    Erc20 {
        chain_id: u64,
        /// Token contract address
        token: Address,
        /// Holder address
        holder: Address,
    },
    /// Query native balance
    Native {
        chain_id: u64,
        /// Account address
        holder: Address,
    },
}

/// Trait for reading balances from chain.
pub trait Monitor: Send + Sync {
    /// Query a single balance.
    fn query_balance(
        &self,
        query: BalanceQuery,
    ) -> impl Future<Output = eyre::Result<Balance>> + Send;
}
