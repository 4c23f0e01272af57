//! Bundle refund data.
//!
//! After a fill, the relayer is repaid through periodic bundle settlement on
//! the chain it chose at fill time. This crate models those upcoming
//! refunds: amounts already owed by validated pending bundles, plus an
//! estimate of what the next bundle will owe.

pub mod spoke;

pub use spoke::SpokeRefundClient;

use alloy_primitives::{Address, U256};
use std::future::Future;

/// One upcoming refund: `relayer` is owed `amount` of `token` on `chain_id`.
/// `token` is the chain-local (L2) address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refund {
    pub chain_id: u64,
    pub token: Address,
    pub relayer: Address,
    pub amount: U256,
}

/// All refunds owed by one settlement bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefundSet {
    pub refunds: Vec<Refund>,
}

/// Total refund owed to `relayer` in `token` on `chain_id` across bundles.
pub fn total_refund(sets: &[RefundSet], relayer: Address, chain_id: u64, token: Address) -> U256 {
    sets.iter()
        .flat_map(|set| set.refunds.iter())
        .filter(|r| r.relayer == relayer && r.chain_id == chain_id && r.token == token)
        .fold(U256::ZERO, |acc, r| acc + r.amount)
}

/// Source of upcoming bundle refunds.
pub trait BundleDataClient: Send + Sync {
    /// Refunds owed by bundles that are validated but not yet executed.
    fn pending_refunds_from_valid_bundles(
        &self,
        relayer: Address,
    ) -> impl Future<Output = eyre::Result<Vec<RefundSet>>> + Send;

    /// Estimated refunds from the upcoming (not yet proposed) bundle.
    fn next_bundle_refunds(
        &self,
        relayer: Address,
    ) -> impl Future<Output = eyre::Result<Vec<RefundSet>>> + Send;
}
