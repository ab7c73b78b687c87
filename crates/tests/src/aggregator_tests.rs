//! Network summaries over synthetic history and live engine traffic.

use std::{collections::HashMap, sync::Arc, thread};

use beacon_core::{
    aggregator::{Aggregator, Window},
    engine::Engine,
    source::{SyntheticConfig, SyntheticSource},
    types::RecordKind,
};
use chrono::Duration;

use crate::fixtures::{at, billing, occupancy};

fn source(seed: u64) -> SyntheticSource {
    SyntheticSource::starting_at(SyntheticConfig { seed, ..SyntheticConfig::default() }, at(0))
}

#[test]
fn test_history_is_bounded_per_hospital() {
    let aggregator = Aggregator::with_capacities(HashMap::from([(RecordKind::Occupancy, 30)]));
    let history = source(7).history(RecordKind::Occupancy, 40);
    assert_eq!(history.len(), 240);

    for record in history {
        aggregator.ingest(record);
    }

    assert_eq!(aggregator.record_count(RecordKind::Occupancy), 180);
    assert_eq!(aggregator.subjects(RecordKind::Occupancy).len(), 6);

    let latest = aggregator.summarize(RecordKind::Occupancy, Window::Latest);
    assert_eq!(latest.subjects, 6);
    assert_eq!(latest.records, 6);
    let rate = latest.metric("occupancy_rate").unwrap();
    assert!(rate.avg >= 60.0 && rate.avg <= 95.0);
    assert!(rate.min <= rate.avg && rate.avg <= rate.max);

    for hospital in aggregator.subjects(RecordKind::Occupancy) {
        assert_eq!(aggregator.latest(RecordKind::Occupancy, &hospital).unwrap().observed_at, at(0));
    }
}

#[test]
fn test_since_window_selects_recent_days() {
    let aggregator = Aggregator::new();
    for record in source(11).history(RecordKind::Billing, 10) {
        aggregator.ingest(record);
    }

    let summary = aggregator.summarize(RecordKind::Billing, Window::Since(at(0) - Duration::days(2)));
    assert_eq!(summary.subjects, 6);
    assert_eq!(summary.records, 18);
    assert_eq!(summary.metric("revenue").unwrap().count, 18);

    let recent = aggregator.summarize(RecordKind::Billing, Window::Recent(4));
    assert_eq!(recent.records, 24);

    let future = aggregator.summarize(RecordKind::Billing, Window::Since(at(60)));
    assert!(future.is_empty());
}

#[test]
fn test_concurrent_ingest_across_kinds() {
    let aggregator = Arc::new(Aggregator::new());

    let occupancy_writer = {
        let aggregator = Arc::clone(&aggregator);
        thread::spawn(move || {
            for minute in 0..20 {
                for hospital in ["HOSP001", "HOSP002", "HOSP003"] {
                    aggregator.ingest(occupancy(hospital, 80.0, minute));
                }
            }
        })
    };
    let billing_writer = {
        let aggregator = Arc::clone(&aggregator);
        thread::spawn(move || {
            for seq in 0..50 {
                aggregator.ingest(billing(&format!("BILL-{seq:06}"), 500.0, ["GENERAL"], seq));
            }
        })
    };
    let reader = {
        let aggregator = Arc::clone(&aggregator);
        thread::spawn(move || {
            for _ in 0..50 {
                let summary = aggregator.summarize(RecordKind::Occupancy, Window::Latest);
                assert!(summary.subjects <= 3);
            }
        })
    };

    for handle in [occupancy_writer, billing_writer, reader] {
        handle.join().unwrap();
    }

    assert_eq!(aggregator.record_count(RecordKind::Occupancy), 60);
    assert_eq!(aggregator.record_count(RecordKind::Billing), 50);
    let summary = aggregator.summarize(RecordKind::Occupancy, Window::Latest);
    assert!((summary.metric("occupancy_rate").unwrap().avg - 80.0).abs() < f64::EPSILON);
}

#[test]
fn test_engine_summary_after_synthetic_ticks() {
    let engine = Engine::builder().with_seed(3).build().unwrap();
    let source = source(3);

    for _ in 0..4 {
        for record in source.next_batch() {
            engine.submit(record).unwrap();
        }
    }

    let occupancy = engine.summarize(RecordKind::Occupancy, Window::Latest);
    assert_eq!(occupancy.subjects, 6);
    let rate = occupancy.metric("occupancy_rate").unwrap();
    assert!(rate.min >= 60.0 && rate.max <= 100.0);

    let all_ticks = engine.summarize(RecordKind::Occupancy, Window::Recent(10));
    assert_eq!(all_ticks.records, 24);

    assert_eq!(engine.summarize(RecordKind::Billing, Window::Latest).records, 12);
}
