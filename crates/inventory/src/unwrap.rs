//! Native-gas replenishment.
//!
//! Fills burn native gas on every chain the keeper operates on. When a
//! chain's native balance drops below its configured floor, wrapped-native
//! held there is unwrapped back into gas. Only applies to the hub's
//! wrapped-native token, and only on chains whose gas token is the
//! canonical native.

use crate::InventoryManager;
use action::AdapterManager;
use alloy_primitives::{utils::format_ether, TxHash, U256};
use balance::{BalanceQuery, Monitor, TokenClient};
use routes::RouteClient;
use tracing::{error, info, warn};
use transfer::TransferClient;

/// One planned unwrap.
#[derive(Debug, Clone)]
pub struct UnwrapCandidate {
    pub chain_id: u64,
    pub threshold: U256,
    pub target: U256,
    pub native_balance: U256,
    /// Amount restoring the target native balance
    pub amount: U256,
}

/// Outcome of one unwrap cycle.
#[derive(Debug, Default)]
pub struct UnwrapReport {
    pub executed: Vec<(UnwrapCandidate, TxHash)>,
    pub unexecuted: Vec<UnwrapCandidate>,
}

impl<T, M, R, X, B, A> InventoryManager<T, M, R, X, B, A>
where
    T: TokenClient,
    M: Monitor,
    R: RouteClient,
    X: TransferClient,
    A: AdapterManager,
{
    /// Run one unwrap cycle. Errors are logged here and never propagate.
    pub async fn unwrap_native_if_needed(&self) -> UnwrapReport {
        if self.is_disabled() {
            self.log_disabled_once();
            return UnwrapReport::default();
        }

        match self.run_unwrap_cycle().await {
            Ok(report) => {
                if !report.executed.is_empty() || !report.unexecuted.is_empty() {
                    info!(
                        executed = report.executed.len(),
                        unexecuted = report.unexecuted.len(),
                        "Unwrap cycle complete"
                    );
                }
                report
            }
            Err(e) => {
                error!(error = %e, "Unwrap cycle failed");
                UnwrapReport::default()
            }
        }
    }

    async fn run_unwrap_cycle(&self) -> eyre::Result<UnwrapReport> {
        let mut report = UnwrapReport::default();

        // Gas replenishment is driven by the hub's wrapped-native token.
        let hub_weth = self.registry.hub().weth;
        let Some(chain_cfgs) = self.targets.get(&hub_weth) else {
            return Ok(report);
        };

        let mut planned = Vec::new();
        for (chain_id, cfg) in chain_cfgs {
            let Some(chain) = self.registry.get(*chain_id) else {
                continue;
            };
            // Chains with a custom gas token cannot mint gas by unwrapping.
            if !chain.gas_is_native {
                continue;
            }

            let (Some(threshold), Some(target)) = (cfg.unwrap_threshold, cfg.unwrap_target)
            else {
                continue;
            };

            let native = self
                .monitor
                .query_balance(BalanceQuery::Native {
                    chain_id: *chain_id,
                    holder: self.relayer,
                })
                .await?
                .amount;

            if native >= threshold {
                continue;
            }

            let amount = target.saturating_sub(native);
            if amount.is_zero() {
                continue;
            }

            let Some(wrapped_token) = self.routes.l2_token_for(hub_weth, *chain_id) else {
                continue;
            };

            let candidate = UnwrapCandidate {
                chain_id: *chain_id,
                threshold,
                target,
                native_balance: native,
                amount,
            };

            let wrapped = self.tokens.balance(*chain_id, wrapped_token);
            if wrapped < amount {
                warn!(
                    chain_id,
                    native = %format_ether(native),
                    wrapped = %format_ether(wrapped),
                    needed = %format_ether(amount),
                    "Not enough wrapped-native to replenish gas"
                );
                report.unexecuted.push(candidate);
                continue;
            }

            planned.push((candidate, wrapped_token));
        }

        // Serial submission, reserving the wrapped balance before each send.
        for (candidate, wrapped_token) in planned {
            self.tokens
                .decrement_local_balance(candidate.chain_id, wrapped_token, candidate.amount);

            match self
                .adapter
                .unwrap_wrapped_native(candidate.chain_id, candidate.amount, self.sim)
                .await
            {
                Ok(tx_hash) => {
                    info!(
                        chain_id = candidate.chain_id,
                        amount = %format_ether(candidate.amount),
                        %tx_hash,
                        "Unwrap submitted"
                    );
                    report.executed.push((candidate, tx_hash));
                }
                Err(e) => {
                    error!(
                        chain_id = candidate.chain_id,
                        error = %e,
                        "Unwrap submission failed"
                    );
                    report.unexecuted.push(candidate);
                    break;
                }
            }
        }

        Ok(report)
    }
}
