//! Periodic source polling.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use crate::{engine::Engine, source::RecordSource};

/// Counts from one poll of the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    /// Records returned by the source.
    pub fetched: usize,
    /// Records scored without error.
    pub assessed: usize,
    /// Records the engine rejected.
    pub rejected: usize,
    pub alerts_opened: usize,
    pub alerts_updated: usize,
    pub alerts_resolved: usize,
    /// The source failed; no records were submitted.
    pub source_failed: bool,
}

/// Fetches record batches from a [`RecordSource`] on a fixed interval and
/// submits every record to the [`Engine`].
///
/// Source failures and rejected records are logged and counted; the loop
/// keeps running until the shutdown channel fires.
pub struct Monitor {
    engine: Arc<Engine>,
    source: Arc<dyn RecordSource>,
    interval: Duration,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("source", &self.source.name())
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Creates a monitor.
    ///
    /// # Arguments
    ///
    /// * `engine` - Engine records are submitted to
    /// * `source` - Source polled on every tick
    /// * `interval` - Time between polls (e.g., 300 seconds)
    #[must_use]
    pub fn new(engine: Arc<Engine>, source: Arc<dyn RecordSource>, interval: Duration) -> Self {
        Self { engine, source, interval }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Polls the source once and submits every record.
    pub async fn tick(&self, tick: u64) -> TickReport {
        let mut report = TickReport { tick, ..TickReport::default() };

        let records = match self.source.fetch().await {
            Ok(records) => records,
            Err(e) => {
                warn!(source = self.source.name(), tick = tick, error = %e, "record source failed");
                report.source_failed = true;
                return report;
            }
        };
        report.fetched = records.len();

        for record in records {
            let subject_id = record.subject_id.clone();
            let kind = record.kind;
            match self.engine.submit(record) {
                Ok(assessment) => {
                    report.assessed += 1;
                    match assessment.outcome.as_str() {
                        "opened" => report.alerts_opened += 1,
                        "updated" => report.alerts_updated += 1,
                        "auto_resolved" => report.alerts_resolved += 1,
                        _ => {}
                    }
                }
                Err(e) => {
                    warn!(subject_id = %subject_id, kind = %kind, error = %e, "record rejected");
                    report.rejected += 1;
                }
            }
        }

        debug!(
            source = self.source.name(),
            tick = tick,
            fetched = report.fetched,
            assessed = report.assessed,
            rejected = report.rejected,
            alerts_opened = report.alerts_opened,
            "monitor tick complete"
        );
        report
    }

    /// Starts the polling task.
    ///
    /// The first poll happens immediately. Each tick's report is sent on
    /// `reports` when a sender is given; a closed receiver does not stop the
    /// loop. The task ends when `shutdown_rx` receives a value or its sender
    /// is dropped.
    #[must_use]
    pub fn start_with_shutdown(
        self: Arc<Self>,
        mut shutdown_rx: broadcast::Receiver<()>,
        reports: Option<mpsc::Sender<TickReport>>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                source = self.source.name(),
                interval_seconds = self.interval.as_secs(),
                "Starting monitor background task"
            );

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tick = 0_u64;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tick += 1;
                        let report = self.tick(tick).await;
                        if let Some(reports) = &reports {
                            if reports.send(report).await.is_err() {
                                debug!("monitor report receiver closed");
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!(ticks = tick, "monitor shutting down");
                        break;
                    }
                }
            }
        })
    }
}
