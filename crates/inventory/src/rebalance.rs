//! Rebalance planning and execution.
//!
//! Each cycle, chains whose allocation fell below their threshold get a
//! hub→L2 transfer sized to restore the target, gated by whatever hub
//! balance is actually available. Candidate order is deterministic (sorted
//! token, then sorted chain), and that order decides who wins when the hub
//! cannot fund everyone.

use crate::{fixed, InventoryError, InventoryManager};
use action::AdapterManager;
use alloy_primitives::{
    utils::format_units, Address, I256, TxHash, U256,
};
use balance::{BalanceQuery, Monitor, TokenClient};
use routes::RouteClient;
use tracing::{debug, error, info, warn};
use transfer::TransferClient;

/// One planned hub→L2 transfer.
#[derive(Debug, Clone)]
pub struct RebalanceCandidate {
    pub chain_id: u64,
    pub l1_token: Address,
    pub threshold_pct: U256,
    pub target_pct: U256,
    pub current_alloc_pct: I256,
    /// Hub balance snapshot taken at planning time
    pub hub_balance: U256,
    pub cumulative_balance: U256,
    /// Transfer amount restoring the target allocation
    pub amount: U256,
}

/// Outcome of one rebalance cycle. Partial progress survives submission
/// failures.
#[derive(Debug, Default)]
pub struct RebalanceReport {
    pub executed: Vec<(RebalanceCandidate, TxHash)>,
    pub unexecuted: Vec<RebalanceCandidate>,
    pub skipped: Vec<RebalanceCandidate>,
}

impl<T, M, R, X, B, A> InventoryManager<T, M, R, X, B, A>
where
    T: TokenClient,
    M: Monitor,
    R: RouteClient,
    X: TransferClient,
    A: AdapterManager,
{
    /// Run one rebalance cycle. Errors are logged here and never propagate;
    /// the next cycle re-observes reality.
    pub async fn rebalance_inventory_if_needed(&self) -> RebalanceReport {
        if self.is_disabled() {
            self.log_disabled_once();
            return RebalanceReport::default();
        }

        match self.run_rebalance_cycle().await {
            Ok(report) => {
                if !report.executed.is_empty()
                    || !report.unexecuted.is_empty()
                    || !report.skipped.is_empty()
                {
                    info!(
                        executed = report.executed.len(),
                        unexecuted = report.unexecuted.len(),
                        skipped = report.skipped.len(),
                        "Rebalance cycle complete"
                    );
                }
                report
            }
            Err(e) => {
                error!(error = %e, "Rebalance cycle failed");
                RebalanceReport::default()
            }
        }
    }

    /// Detect under-allocated (token, chain) pairs.
    ///
    /// Amounts are sized from the distribution at planning time; the
    /// executor gates them against the hub balance afterwards.
    pub fn plan_rebalances(&self) -> Result<Vec<RebalanceCandidate>, InventoryError> {
        let hub = self.registry.hub_chain_id();
        let mut candidates = Vec::new();

        for (l1_token, chain_cfgs) in &self.targets {
            let info = self
                .routes
                .token_info(*l1_token)
                .ok_or(InventoryError::MissingTokenInfo(*l1_token))?;

            let cumulative = self.cumulative_balance(*l1_token);
            if cumulative.is_zero() {
                continue;
            }

            debug!(
                symbol = %info.symbol,
                cumulative = %format_units(cumulative, info.decimals).unwrap_or_default(),
                distribution = ?self.chain_distribution(*l1_token),
                "Considering rebalance"
            );

            for (chain_id, cfg) in chain_cfgs {
                if *chain_id == hub {
                    continue;
                }

                let current = self.current_alloc_pct(*l1_token, *chain_id);
                if current >= fixed::to_signed(cfg.threshold_pct) {
                    continue;
                }

                let amount = fixed::apply_pct(
                    fixed::to_signed(cfg.target_pct) - current,
                    fixed::to_signed(cumulative),
                );

                candidates.push(RebalanceCandidate {
                    chain_id: *chain_id,
                    l1_token: *l1_token,
                    threshold_pct: cfg.threshold_pct,
                    target_pct: cfg.target_pct,
                    current_alloc_pct: current,
                    hub_balance: self.tokens.balance(hub, *l1_token),
                    cumulative_balance: cumulative,
                    amount: fixed::to_unsigned(amount),
                });
            }
        }

        Ok(candidates)
    }

    async fn run_rebalance_cycle(&self) -> eyre::Result<RebalanceReport> {
        let candidates = self.plan_rebalances()?;
        let mut report = RebalanceReport::default();
        let hub = self.registry.hub_chain_id();

        // Gate candidates in planner order. The ledger balance already
        // reflects deductions from earlier acceptances in this loop, so a
        // depleted hub rejects the remainder in the same order.
        let mut accepted = Vec::new();
        for candidate in candidates {
            let unallocated = self.tokens.balance(hub, candidate.l1_token);
            if candidate.amount > unallocated {
                warn!(
                    token = %candidate.l1_token,
                    chain_id = candidate.chain_id,
                    amount = %candidate.amount,
                    %unallocated,
                    "Insufficient hub balance for rebalance"
                );
                report.unexecuted.push(candidate);
                continue;
            }

            // Re-read the true on-chain balance. A mismatch with the
            // planning snapshot means another instance moved funds.
            let onchain = self
                .monitor
                .query_balance(BalanceQuery::Erc20 {
                    chain_id: hub,
                    token: candidate.l1_token,
                    holder: self.relayer,
                })
                .await?
                .amount;

            if onchain != candidate.hub_balance {
                warn!(
                    token = %candidate.l1_token,
                    chain_id = candidate.chain_id,
                    snapshot = %candidate.hub_balance,
                    %onchain,
                    "Hub balance changed since planning, skipping rebalance"
                );
                report.skipped.push(candidate);
                continue;
            }

            // Reserve before submission: the ledger loses the amount and
            // the destination gains it as an outstanding transfer. A failed
            // submission then under-sends next cycle instead of over-sending.
            self.tokens
                .decrement_local_balance(hub, candidate.l1_token, candidate.amount);
            self.transfers.increase_outstanding_transfer(
                self.relayer,
                candidate.l1_token,
                candidate.amount,
                candidate.chain_id,
            );

            accepted.push(candidate);
        }

        // Strictly serial submission: no parallel nonce management.
        let mut pending = accepted.into_iter();
        for candidate in pending.by_ref() {
            match self
                .adapter
                .send_token_cross_chain(
                    self.relayer,
                    candidate.chain_id,
                    candidate.l1_token,
                    candidate.amount,
                    self.sim,
                )
                .await
            {
                Ok(tx_hash) => {
                    info!(
                        token = %candidate.l1_token,
                        chain_id = candidate.chain_id,
                        amount = %candidate.amount,
                        %tx_hash,
                        "Rebalance submitted"
                    );
                    report.executed.push((candidate, tx_hash));
                }
                Err(e) => {
                    error!(
                        token = %candidate.l1_token,
                        chain_id = candidate.chain_id,
                        error = %e,
                        "Rebalance submission failed"
                    );
                    report.unexecuted.push(candidate);
                    break;
                }
            }
        }
        report.unexecuted.extend(pending);

        Ok(report)
    }
}
