use beacon_core::{
    aggregator::Window,
    alerts::{Alert, AlertFilter},
    engine::{Engine, EngineBuilder},
    runtime::{Monitor, TickReport},
    source::{SyntheticConfig, SyntheticSource},
    types::RecordKind,
};
use prettytable::{row, Table};
use std::{sync::Arc, time::Duration};
use tokio::sync::{broadcast, mpsc};
use tracing::info;

use super::utils::{load_config, print_info, CliResult};

/// Rounds run when neither `--rounds` nor follow mode is selected.
pub const DEFAULT_ROUNDS: u64 = 12;

pub struct SimulateOptions {
    pub seed: u64,
    pub rounds: Option<u64>,
    pub hospitals: usize,
    pub surge_probability: Option<f64>,
    /// Keep polling on the configured interval until Ctrl-C. `monitor.enabled`
    /// selects this too when no round count is given.
    pub follow: bool,
    pub interval_seconds: Option<u64>,
    pub show_metrics: bool,
    pub config: Option<String>,
}

/// Runs the synthetic network through the engine and prints what it raised.
pub async fn simulate(options: SimulateOptions) -> CliResult<()> {
    let config = load_config(options.config.as_deref())?;
    let engine = Arc::new(
        EngineBuilder::from_config(&config)?
            .with_seed(options.seed)
            .enable_metrics(options.show_metrics)
            .build()?,
    );

    let mut synthetic = SyntheticConfig {
        hospitals: options.hospitals,
        seed: options.seed,
        ..SyntheticConfig::default()
    };
    if let Some(probability) = options.surge_probability {
        synthetic.surge_probability = probability.clamp(0.0, 1.0);
    }
    let source = Arc::new(SyntheticSource::new(synthetic));

    let interval =
        Duration::from_secs(options.interval_seconds.unwrap_or(config.monitor.interval_seconds).max(1));
    let monitor = Arc::new(Monitor::new(engine.clone(), source, interval));

    let reports = match run_mode(options.follow, options.rounds, config.monitor.enabled) {
        RunMode::Follow => follow(monitor).await,
        RunMode::Rounds(rounds) => {
            let mut reports = Vec::new();
            for round in 1..=rounds {
                reports.push(monitor.tick(round).await);
            }
            reports
        }
    };

    print_rounds(&reports);
    print_alerts(&engine);
    print_occupancy(&engine);

    if options.show_metrics {
        if let Some(rendered) = engine.metrics().render() {
            println!("\n{rendered}");
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    Follow,
    Rounds(u64),
}

/// `--follow` wins, then an explicit `--rounds`, then `monitor.enabled`.
fn run_mode(follow: bool, rounds: Option<u64>, monitor_enabled: bool) -> RunMode {
    match (follow, rounds) {
        (true, _) => RunMode::Follow,
        (false, Some(rounds)) => RunMode::Rounds(rounds),
        (false, None) if monitor_enabled => RunMode::Follow,
        (false, None) => RunMode::Rounds(DEFAULT_ROUNDS),
    }
}

async fn follow(monitor: Arc<Monitor>) -> Vec<TickReport> {
    print_info(&format!(
        "Polling every {}s, press Ctrl-C to stop",
        monitor.interval().as_secs()
    ));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (report_tx, mut report_rx) = mpsc::channel(16);
    let handle = monitor.start_with_shutdown(shutdown_rx, Some(report_tx));

    let mut reports = Vec::new();
    loop {
        tokio::select! {
            report = report_rx.recv() => match report {
                Some(report) => {
                    info!(
                        tick = report.tick,
                        assessed = report.assessed,
                        alerts_opened = report.alerts_opened,
                        "simulation tick"
                    );
                    reports.push(report);
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let _ = shutdown_tx.send(());
    let _ = handle.await;
    reports
}

fn print_rounds(reports: &[TickReport]) {
    let mut table = Table::new();
    table.add_row(row!["Round", "Fetched", "Assessed", "Rejected", "Opened", "Updated", "Resolved"]);
    for report in reports {
        table.add_row(row![
            report.tick,
            report.fetched,
            report.assessed,
            if report.source_failed { "source failed".to_string() } else { report.rejected.to_string() },
            report.alerts_opened,
            report.alerts_updated,
            report.alerts_resolved
        ]);
    }
    table.printstd();
}

fn print_alerts(engine: &Engine) {
    let alerts = engine.list_alerts(&AlertFilter::new());
    println!("\nAlerts ({} total, {} live):", alerts.len(), engine.alerts().live_count());
    if alerts.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.add_row(row!["Alert", "Subject", "Domain", "Tier", "Score", "State", "Opened"]);
    for alert in &alerts {
        table.add_row(row![
            short_id(alert),
            alert.subject_id,
            alert.domain,
            alert.tier,
            format!("{:.1}", alert.score),
            alert.state,
            alert.opened_at.format("%Y-%m-%d %H:%M")
        ]);
    }
    table.printstd();
}

fn print_occupancy(engine: &Engine) {
    let summary = engine.summarize(RecordKind::Occupancy, Window::Latest);
    println!("\nNetwork occupancy ({} hospitals):", summary.subjects);
    match summary.metric("occupancy_rate") {
        Some(rate) => {
            println!("  Average: {:.1}%", rate.avg);
            println!("  Lowest:  {:.1}%", rate.min);
            println!("  Highest: {:.1}%", rate.max);
        }
        None => println!("  No occupancy data"),
    }
}

fn short_id(alert: &Alert) -> &str {
    alert.id.get(..8).unwrap_or(&alert.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_defaults_to_fixed_rounds() {
        assert_eq!(run_mode(false, None, false), RunMode::Rounds(DEFAULT_ROUNDS));
        assert_eq!(run_mode(false, Some(3), false), RunMode::Rounds(3));
        assert_eq!(run_mode(true, Some(3), false), RunMode::Follow);
    }

    #[test]
    fn test_enabled_monitor_follows_unless_rounds_given() {
        assert_eq!(run_mode(false, None, true), RunMode::Follow);
        assert_eq!(run_mode(false, Some(5), true), RunMode::Rounds(5));
    }
}
