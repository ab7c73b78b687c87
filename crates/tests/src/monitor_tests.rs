//! Monitor polling against replayed, synthetic and failing sources.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use beacon_core::{
    engine::Engine,
    runtime::{Monitor, TickReport},
    source::{RecordSource, ReplaySource, SourceError, SyntheticConfig, SyntheticSource},
    types::MetricRecord,
};
use tokio::sync::{broadcast, mpsc};

use crate::fixtures::{at, billing, occupancy};

struct FailingSource;

#[async_trait]
impl RecordSource for FailingSource {
    fn name(&self) -> &str {
        "failing"
    }

    async fn fetch(&self) -> Result<Vec<MetricRecord>, SourceError> {
        Err(SourceError::Unavailable("feed offline".to_string()))
    }
}

fn seeded_engine() -> Arc<Engine> {
    Arc::new(Engine::builder().with_seed(5).build().unwrap())
}

fn monitor(engine: Arc<Engine>, source: Arc<dyn RecordSource>) -> Monitor {
    Monitor::new(engine, source, Duration::from_millis(20))
}

#[tokio::test]
async fn test_tick_counts_alert_outcomes() {
    let source = ReplaySource::new([
        vec![occupancy("HOSP001", 99.0, 0), occupancy("HOSP002", 70.0, 0)],
        vec![occupancy("HOSP001", 98.5, 5)],
    ]);
    let monitor = monitor(seeded_engine(), Arc::new(source));

    let first = monitor.tick(1).await;
    assert_eq!(
        first,
        TickReport { tick: 1, fetched: 2, assessed: 2, alerts_opened: 1, ..TickReport::default() }
    );

    let second = monitor.tick(2).await;
    assert_eq!(second.alerts_updated, 1);
    assert_eq!(second.alerts_opened, 0);

    let drained = monitor.tick(3).await;
    assert_eq!(drained.fetched, 0);
    assert!(!drained.source_failed);
}

#[tokio::test]
async fn test_failing_source_is_reported() {
    let monitor = monitor(seeded_engine(), Arc::new(FailingSource));

    let report = monitor.tick(1).await;

    assert!(report.source_failed);
    assert_eq!(report.fetched, 0);
    assert_eq!(report.assessed, 0);
}

#[tokio::test]
async fn test_rejected_records_do_not_stop_the_batch() {
    let engine = Arc::new(Engine::builder().build().unwrap());
    let source = ReplaySource::new([vec![
        billing("BILL-000001", 12_000.0, ["SURGERY", "OUTPATIENT"], 0),
        occupancy("HOSP001", 99.0, 0),
    ]]);
    let monitor = monitor(Arc::clone(&engine), Arc::new(source));

    let report = monitor.tick(1).await;

    assert_eq!(report.fetched, 2);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.assessed, 1);
    assert_eq!(report.alerts_opened, 1);
    assert_eq!(engine.alerts().live_count(), 1);
}

#[tokio::test]
async fn test_synthetic_tick_scores_every_record() {
    let source =
        SyntheticSource::starting_at(SyntheticConfig { seed: 21, ..SyntheticConfig::default() }, at(0));
    let monitor = monitor(seeded_engine(), Arc::new(source));

    for tick in 1..=3 {
        let report = monitor.tick(tick).await;
        assert!(report.fetched > 0);
        assert_eq!(report.assessed, report.fetched);
        assert_eq!(report.rejected, 0);
    }
}

#[tokio::test]
async fn test_background_task_reports_and_shuts_down() {
    let source = ReplaySource::new([vec![occupancy("HOSP003", 96.0, 0)]]);
    let monitor = Arc::new(monitor(seeded_engine(), Arc::new(source)));
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (report_tx, mut report_rx) = mpsc::channel(64);

    let handle = monitor.start_with_shutdown(shutdown_rx, Some(report_tx));

    let first = tokio::time::timeout(Duration::from_secs(2), report_rx.recv()).await.unwrap().unwrap();
    assert_eq!(first.tick, 1);
    assert_eq!(first.alerts_opened, 1);

    shutdown_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
}
