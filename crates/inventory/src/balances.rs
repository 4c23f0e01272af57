//! Virtual balances and allocation distributions.
//!
//! A chain's virtual balance is what the relayer effectively commands there:
//! the tracked on-chain balance plus funds already in flight over the
//! canonical bridge. Counting in-flight funds on their destination is what
//! keeps decisions correct across cycles while transfers finalize.

use crate::{fixed, InventoryManager};
use alloy_primitives::{Address, I256, U256};
use balance::TokenClient;
use routes::RouteClient;
use std::collections::BTreeMap;
use transfer::TransferClient;

impl<T, M, R, X, B, A> InventoryManager<T, M, R, X, B, A>
where
    T: TokenClient,
    R: RouteClient,
    X: TransferClient,
{
    /// Virtual balance of `l1_token` on one chain.
    ///
    /// Unmanaged non-hub chains hold zero by definition; the hub always
    /// contributes regardless of configuration.
    pub fn balance_on_chain(&self, l1_token: Address, chain_id: u64) -> U256 {
        let hub = self.registry.hub_chain_id();
        if chain_id != hub && !self.is_managed(l1_token, chain_id) {
            return U256::ZERO;
        }

        let token = if chain_id == hub {
            l1_token
        } else {
            match self.routes.l2_token_for(l1_token, chain_id) {
                Some(token) => token,
                None => return U256::ZERO,
            }
        };

        self.tokens.balance(chain_id, token)
            + self
                .transfers
                .outstanding_transfer_amount(self.relayer, chain_id, l1_token)
    }

    /// Virtual balance of `l1_token` summed over every enabled chain.
    pub fn cumulative_balance(&self, l1_token: Address) -> U256 {
        self.registry
            .chain_ids()
            .map(|chain_id| self.balance_on_chain(l1_token, chain_id))
            .fold(U256::ZERO, |acc, b| acc + b)
    }

    /// Outstanding fill obligations for `l1_token` on one chain.
    pub fn shortfall(&self, l1_token: Address, chain_id: u64) -> U256 {
        let hub = self.registry.hub_chain_id();
        let token = if chain_id == hub {
            l1_token
        } else {
            match self.routes.l2_token_for(l1_token, chain_id) {
                Some(token) => token,
                None => return U256::ZERO,
            }
        };

        self.tokens.shortfall_total_requirement(chain_id, token)
    }

    /// Current allocation fraction: `(balance - shortfall) * ONE / cumulative`.
    /// Zero when the cumulative balance is zero. May be negative when the
    /// chain's shortfall exceeds its balance.
    pub fn current_alloc_pct(&self, l1_token: Address, chain_id: u64) -> I256 {
        let cumulative = self.cumulative_balance(l1_token);
        if cumulative.is_zero() {
            return I256::ZERO;
        }

        let virt = fixed::to_signed(self.balance_on_chain(l1_token, chain_id))
            - fixed::to_signed(self.shortfall(l1_token, chain_id));

        fixed::ratio(virt, fixed::to_signed(cumulative))
    }

    /// Per-chain allocation fractions for one token. The hub is always
    /// present; unmanaged non-hub chains are omitted entirely. Empty when
    /// the cumulative balance is zero.
    pub fn chain_distribution(&self, l1_token: Address) -> BTreeMap<u64, I256> {
        let mut distribution = BTreeMap::new();
        let cumulative = self.cumulative_balance(l1_token);
        if cumulative.is_zero() {
            return distribution;
        }

        let hub = self.registry.hub_chain_id();
        for chain_id in self.registry.chain_ids() {
            if chain_id != hub && !self.is_managed(l1_token, chain_id) {
                continue;
            }

            let pct = fixed::ratio(
                fixed::to_signed(self.balance_on_chain(l1_token, chain_id)),
                fixed::to_signed(cumulative),
            );
            distribution.insert(chain_id, pct);
        }

        distribution
    }

    /// Allocation distributions for every managed token.
    pub fn token_distribution(&self) -> BTreeMap<Address, BTreeMap<u64, I256>> {
        self.managed_tokens()
            .into_iter()
            .map(|l1_token| (l1_token, self.chain_distribution(l1_token)))
            .collect()
    }
}
