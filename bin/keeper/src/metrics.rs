//! Prometheus metrics for the keeper.
//!
//! All metrics are aggregated in the [`Metrics`] struct for easy tracking
//! and management.

use alloy_primitives::{Address, I256, U256};
use inventory::{RebalanceReport, UnwrapReport};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Aggregated metrics for the keeper.
///
/// Metric descriptions are registered with the global registry on creation.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    fn register_descriptions() {
        // Cycle metrics
        describe_counter!("keeper_cycles_total", "Total number of keeper cycles executed");
        describe_counter!(
            "keeper_cycles_failure_total",
            "Total number of keeper cycles with a failed step"
        );
        describe_histogram!(
            "keeper_cycle_duration_seconds",
            "Duration of each keeper cycle in seconds"
        );

        // Rebalance metrics
        describe_counter!(
            "keeper_rebalances_executed_total",
            "Total number of hub-to-L2 rebalance transfers submitted"
        );
        describe_counter!(
            "keeper_rebalances_unexecuted_total",
            "Total number of rebalance candidates the hub balance could not fund"
        );
        describe_counter!(
            "keeper_rebalances_skipped_total",
            "Total number of rebalance candidates skipped by the balance-changed guard"
        );

        // Unwrap metrics
        describe_counter!(
            "keeper_unwraps_executed_total",
            "Total number of wrapped-native unwraps submitted"
        );
        describe_counter!(
            "keeper_unwraps_unexecuted_total",
            "Total number of unwraps blocked by a short wrapped balance"
        );

        // Allocation gauges
        describe_gauge!(
            "keeper_chain_allocation_pct",
            "Current allocation fraction per (token, chain)"
        );
        describe_gauge!(
            "keeper_cumulative_balance",
            "Cumulative virtual balance per token, in native token units"
        );
    }

    /// Record a completed cycle.
    pub fn record_cycle(&self, success: bool, duration: Duration) {
        counter!("keeper_cycles_total").increment(1);
        histogram!("keeper_cycle_duration_seconds").record(duration.as_secs_f64());

        if !success {
            counter!("keeper_cycles_failure_total").increment(1);
        }
    }

    /// Record one rebalance cycle's outcome.
    pub fn record_rebalances(&self, report: &RebalanceReport) {
        counter!("keeper_rebalances_executed_total").increment(report.executed.len() as u64);
        counter!("keeper_rebalances_unexecuted_total").increment(report.unexecuted.len() as u64);
        counter!("keeper_rebalances_skipped_total").increment(report.skipped.len() as u64);
    }

    /// Record one unwrap cycle's outcome.
    pub fn record_unwraps(&self, report: &UnwrapReport) {
        counter!("keeper_unwraps_executed_total").increment(report.executed.len() as u64);
        counter!("keeper_unwraps_unexecuted_total").increment(report.unexecuted.len() as u64);
    }

    /// Set the current allocation fraction for one (token, chain).
    pub fn set_allocation(&self, token: Address, chain_id: u64, pct: I256) {
        gauge!(
            "keeper_chain_allocation_pct",
            "token" => token.to_string(),
            "chain" => chain_id.to_string()
        )
        .set(to_f64(pct) / 1e18);
    }

    /// Set the cumulative virtual balance for one token.
    pub fn set_cumulative_balance(&self, token: Address, balance: U256) {
        gauge!("keeper_cumulative_balance", "token" => token.to_string()).set(to_f64(balance));
    }
}

/// Lossy conversion for gauges; precision past f64 does not matter here.
fn to_f64(value: impl ToString) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(0.0)
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}
