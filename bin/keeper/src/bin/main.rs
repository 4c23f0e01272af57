use config::Config;
use keeper::{metrics::install_prometheus_exporter, CycleReport, Keeper};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tokio::time;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting inventory keeper");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = Config::from_file(&config_path)?;

    info!("Loaded config:");
    info!("  Hub chain: {}", config.hub_chain_id);
    info!("  Relayer: {}", config.relayer);
    info!("  Chains: {}", config.chains.len());
    info!("  Managed tokens: {}", config.tokens.len());
    info!("  Cycle interval: {}s", config.cycle_interval_secs);
    info!("  Simulation mode: {}", config.sim);

    let private_key = std::env::var("PRIVATE_KEY").ok();
    if private_key.is_none() && !config.sim {
        warn!("No PRIVATE_KEY set and simulation mode off; submissions will fail");
    }

    let keeper = Keeper::new(&config, private_key.as_deref())?;

    install_prometheus_exporter(config.metrics_port)?;
    info!("Metrics listening on port {}", config.metrics_port);

    keeper.startup().await?;

    // Set up graceful shutdown handling
    let shutdown_requested = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown_requested.clone();

    tokio::spawn(async move {
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).unwrap();
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).unwrap();

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received shutdown signal, completing current cycle...");
            }
            _ = sigterm.recv() => {
                info!("Received shutdown signal, completing current cycle...");
            }
        }

        shutdown_flag.store(true, Ordering::SeqCst);
    });

    info!("Starting main loop...");

    let mut interval = time::interval(Duration::from_secs(config.cycle_interval_secs));
    let mut cycle_number: u64 = 0;

    loop {
        interval.tick().await;
        cycle_number += 1;
        let cycle_start = Instant::now();

        let report = keeper.run_cycle().await;
        let cycle_duration = cycle_start.elapsed();

        let has_failure = report.refresh.is_failure() || report.wrap.is_failure();
        keeper.metrics().record_cycle(!has_failure, cycle_duration);

        log_cycle_summary(cycle_number, cycle_duration, &report);

        // Check if shutdown was requested after completing the cycle
        if shutdown_requested.load(Ordering::SeqCst) {
            info!("Cycle completed, shutting down gracefully");
            break;
        }
    }

    Ok(())
}

fn log_cycle_summary(cycle_number: u64, duration: Duration, report: &CycleReport) {
    info!(
        "Cycle {} completed in {:.1}s: refresh={}, wrap={}, rebalances={}/{} executed, unwraps={}/{} executed",
        cycle_number,
        duration.as_secs_f64(),
        report.refresh.as_str(),
        report.wrap.as_str(),
        report.rebalance.executed.len(),
        report.rebalance.executed.len()
            + report.rebalance.unexecuted.len()
            + report.rebalance.skipped.len(),
        report.unwrap.executed.len(),
        report.unwrap.executed.len() + report.unwrap.unexecuted.len(),
    );
}
