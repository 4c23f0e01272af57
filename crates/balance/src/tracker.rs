//! Local token ledger.
//!
//! The tracker holds the relayer's last-known balances and shortfalls per
//! (chain, token). It is shared between subsystems: the filler records
//! shortfalls for fills it has committed to, and the inventory core
//! decrements balances when it reserves capital for a cross-chain transfer.
//! Decrements are visible to all readers immediately, before the matching
//! transaction lands on chain.

use crate::{BalanceQuery, Monitor};
use alloy_primitives::{Address, U256};
use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};
use tracing::debug;

/// Shared read/command surface over the local ledger.
pub trait TokenClient: Send + Sync {
    /// Last-known relayer balance of `token` on `chain_id`.
    fn balance(&self, chain_id: u64, token: Address) -> U256;

    /// Reserve local balance for capital committed elsewhere.
    /// Saturates at zero.
    fn decrement_local_balance(&self, chain_id: u64, token: Address, amount: U256);

    /// Total outstanding fill obligations for `token` on `chain_id`.
    fn shortfall_total_requirement(&self, chain_id: u64, token: Address) -> U256;
}

#[derive(Debug, Default)]
struct Ledger {
    balances: BTreeMap<(u64, Address), U256>,
    shortfalls: BTreeMap<(u64, Address), U256>,
}

/// In-memory implementation of [`TokenClient`].
#[derive(Debug, Default)]
pub struct TokenTracker {
    inner: RwLock<Ledger>,
}

impl TokenTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the ledger balance for one (chain, token).
    pub fn set_balance(&self, chain_id: u64, token: Address, amount: U256) {
        let mut ledger = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        ledger.balances.insert((chain_id, token), amount);
    }

    /// Record an outstanding fill obligation. Called by the filler.
    pub fn record_shortfall(&self, chain_id: u64, token: Address, amount: U256) {
        let mut ledger = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let entry = ledger.shortfalls.entry((chain_id, token)).or_default();
        *entry += amount;
    }

    /// Clear the shortfall for one (chain, token) once satisfied.
    pub fn clear_shortfall(&self, chain_id: u64, token: Address) {
        let mut ledger = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        ledger.shortfalls.remove(&(chain_id, token));
    }

    /// Re-read every (chain, token) pair in `plan` from chain and overwrite
    /// the ledger with the observed balances.
    pub async fn refresh<M: Monitor>(
        &self,
        monitor: &M,
        relayer: Address,
        plan: &[(u64, Address)],
    ) -> eyre::Result<()> {
        for (chain_id, token) in plan {
            let balance = monitor
                .query_balance(BalanceQuery::Erc20 {
                    chain_id: *chain_id,
                    token: *token,
                    holder: relayer,
                })
                .await?;

            debug!(
                chain_id,
                token = %token,
                amount = %balance.amount,
                "Refreshed ledger balance"
            );
            self.set_balance(*chain_id, *token, balance.amount);
        }

        Ok(())
    }
}

impl TokenClient for TokenTracker {
    fn balance(&self, chain_id: u64, token: Address) -> U256 {
        let ledger = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        ledger
            .balances
            .get(&(chain_id, token))
            .copied()
            .unwrap_or_default()
    }

    fn decrement_local_balance(&self, chain_id: u64, token: Address, amount: U256) {
        let mut ledger = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let entry = ledger.balances.entry((chain_id, token)).or_default();
        *entry = entry.saturating_sub(amount);
    }

    fn shortfall_total_requirement(&self, chain_id: u64, token: Address) -> U256 {
        let ledger = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        ledger
            .shortfalls
            .get(&(chain_id, token))
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const TOKEN: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

    #[test]
    fn test_balance_defaults_to_zero() {
        let tracker = TokenTracker::new();
        assert_eq!(tracker.balance(1, TOKEN), U256::ZERO);
        assert_eq!(tracker.shortfall_total_requirement(1, TOKEN), U256::ZERO);
    }

    #[test]
    fn test_set_and_decrement() {
        let tracker = TokenTracker::new();
        tracker.set_balance(1, TOKEN, U256::from(100));
        tracker.decrement_local_balance(1, TOKEN, U256::from(30));
        assert_eq!(tracker.balance(1, TOKEN), U256::from(70));
    }

    #[test]
    fn test_decrement_saturates() {
        let tracker = TokenTracker::new();
        tracker.set_balance(1, TOKEN, U256::from(10));
        tracker.decrement_local_balance(1, TOKEN, U256::from(30));
        assert_eq!(tracker.balance(1, TOKEN), U256::ZERO);
    }

    #[test]
    fn test_shortfalls_accumulate_and_clear() {
        let tracker = TokenTracker::new();
        tracker.record_shortfall(10, TOKEN, U256::from(5));
        tracker.record_shortfall(10, TOKEN, U256::from(7));
        assert_eq!(tracker.shortfall_total_requirement(10, TOKEN), U256::from(12));

        tracker.clear_shortfall(10, TOKEN);
        assert_eq!(tracker.shortfall_total_requirement(10, TOKEN), U256::ZERO);
    }
}
