//! Alert lifecycle through the engine: deduplication, transitions, auto-resolve
//! and bounded retention.

use std::{sync::Arc, thread};

use beacon_core::{
    alerts::{AlertFilter, AlertState, AUTO_RESOLVE_ACTOR},
    engine::Engine,
    errors::EngineError,
    types::Domain,
};

use crate::fixtures::occupancy;

fn engine() -> Engine {
    Engine::builder().with_seed(1).build().unwrap()
}

#[test]
fn test_concurrent_submissions_keep_one_live_alert() {
    let engine = Arc::new(engine());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for step in 0..25 {
                    let minutes = i64::from(worker * 25 + step);
                    engine.submit(occupancy("HOSP001", 99.0, minutes)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let alerts = engine.list_alerts(&AlertFilter::new().subject("HOSP001"));
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].state, AlertState::Open);
    assert_eq!(engine.alerts().live_count(), 1);
    assert_eq!(alerts[0].last_evaluated_at, crate::fixtures::at(199));
}

#[test]
fn test_resolved_alert_is_terminal_and_new_alert_opens() {
    let engine = engine();
    let first = engine.submit(occupancy("HOSP002", 97.0, 0)).unwrap().alert.unwrap();

    engine.resolve(&first.id, "charge-nurse").unwrap();
    let err = engine.resolve(&first.id, "charge-nurse").unwrap_err();
    match &err {
        EngineError::InvalidTransition { from, current, .. } => {
            assert_eq!(*from, Some(AlertState::Resolved));
            assert_eq!(current.as_ref().unwrap().resolved_by.as_deref(), Some("charge-nurse"));
        }
        other => panic!("Expected InvalidTransition, got {other:?}"),
    }
    assert!(err.is_client_error());
    assert!(engine.acknowledge(&first.id, "charge-nurse").is_err());

    let second = engine.submit(occupancy("HOSP002", 98.0, 5)).unwrap();
    assert_eq!(second.outcome, "opened");
    let second = second.alert.unwrap();
    assert_ne!(second.id, first.id);

    let listed = engine.list_alerts(&AlertFilter::new().subject("HOSP002"));
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].state, AlertState::Resolved);
}

#[test]
fn test_unknown_alert_transition_fails() {
    let engine = engine();
    let err = engine.acknowledge("missing", "someone").unwrap_err();

    assert!(matches!(err, EngineError::InvalidTransition { from: None, current: None, .. }));
}

#[test]
fn test_first_acknowledger_is_kept() {
    let engine = engine();
    let alert = engine.submit(occupancy("HOSP003", 96.0, 0)).unwrap().alert.unwrap();

    engine.acknowledge(&alert.id, "day-shift").unwrap();
    let again = engine.acknowledge(&alert.id, "night-shift").unwrap();

    assert_eq!(again.state, AlertState::Acknowledged);
    assert_eq!(again.acknowledged_by.as_deref(), Some("day-shift"));

    let updated = engine.submit(occupancy("HOSP003", 99.0, 5)).unwrap().alert.unwrap();
    assert_eq!(updated.state, AlertState::Acknowledged);
    assert_eq!(updated.tier, "CRITICAL");
}

#[test]
fn test_drop_below_floor_keeps_alert_open_by_default() {
    let engine = engine();
    engine.submit(occupancy("HOSP004", 99.0, 0)).unwrap();
    let dropped = engine.submit(occupancy("HOSP004", 60.0, 5)).unwrap();

    assert_eq!(dropped.outcome, "updated");
    let alert = dropped.alert.unwrap();
    assert_eq!(alert.state, AlertState::Open);
    assert_eq!(alert.tier, "NORMAL");
}

#[test]
fn test_auto_resolve_below_floor() {
    let engine = Engine::builder().with_seed(1).auto_resolve_below_floor(true).build().unwrap();
    engine.submit(occupancy("HOSP005", 99.0, 0)).unwrap();
    let dropped = engine.submit(occupancy("HOSP005", 60.0, 5)).unwrap();

    assert_eq!(dropped.outcome, "auto_resolved");
    let alert = dropped.alert.unwrap();
    assert_eq!(alert.state, AlertState::Resolved);
    assert_eq!(alert.resolved_by.as_deref(), Some(AUTO_RESOLVE_ACTOR));
    assert_eq!(engine.alerts().live_count(), 0);

    let quiet = engine.submit(occupancy("HOSP005", 61.0, 10)).unwrap();
    assert_eq!(quiet.outcome, "not_raised");
}

#[test]
fn test_late_record_does_not_reopen_auto_resolved_alert() {
    let engine = Engine::builder().with_seed(1).auto_resolve_below_floor(true).build().unwrap();
    engine.submit(occupancy("HOSP008", 99.0, 0)).unwrap();
    let cleared = engine.submit(occupancy("HOSP008", 60.0, 10)).unwrap();
    assert_eq!(cleared.outcome, "auto_resolved");
    assert_eq!(cleared.alert.as_ref().unwrap().resolved_at, Some(crate::fixtures::at(10)));

    let late = engine.submit(occupancy("HOSP008", 99.0, 5)).unwrap();

    assert_eq!(late.outcome, "stale");
    assert_eq!(late.alert.unwrap().state, AlertState::Resolved);
    assert_eq!(engine.alerts().live_count(), 0);
    assert_eq!(engine.list_alerts(&AlertFilter::new().subject("HOSP008")).len(), 1);
}

#[test]
fn test_late_record_does_not_reopen_manually_resolved_alert() {
    let engine = engine();
    engine.submit(occupancy("HOSP009", 99.0, 0)).unwrap();
    let newest = engine.submit(occupancy("HOSP009", 96.0, 10)).unwrap().alert.unwrap();
    engine.resolve(&newest.id, "bed-manager").unwrap();

    let late = engine.submit(occupancy("HOSP009", 99.0, 5)).unwrap();

    assert_eq!(late.outcome, "stale");
    let listed = engine.list_alerts(&AlertFilter::new().subject("HOSP009"));
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].state, AlertState::Resolved);
}

#[test]
fn test_retention_evicts_oldest_resolved_only() {
    let engine = Engine::builder().with_seed(1).with_max_alerts(2).build().unwrap();

    let a = engine.submit(occupancy("HOSP001", 99.0, 0)).unwrap().alert.unwrap();
    engine.resolve(&a.id, "ops").unwrap();
    let b = engine.submit(occupancy("HOSP002", 99.0, 1)).unwrap().alert.unwrap();
    engine.resolve(&b.id, "ops").unwrap();
    let c = engine.submit(occupancy("HOSP003", 99.0, 2)).unwrap().alert.unwrap();

    assert!(engine.get_alert(&a.id).is_none());
    assert!(engine.get_alert(&b.id).is_some());
    assert!(engine.get_alert(&c.id).is_some());

    let d = engine.submit(occupancy("HOSP004", 99.0, 3)).unwrap().alert.unwrap();
    let e = engine.submit(occupancy("HOSP005", 99.0, 4)).unwrap().alert.unwrap();
    for live in [&c, &d, &e] {
        assert_eq!(engine.get_alert(&live.id).unwrap().state, AlertState::Open);
    }
    assert!(engine.get_alert(&b.id).is_none());
    assert_eq!(engine.alerts().live_count(), 3);
}

#[test]
fn test_list_alerts_filters_by_state_and_domain() {
    let engine = engine();
    let ward = engine.submit(occupancy("HOSP006", 99.0, 0)).unwrap().alert.unwrap();
    engine.submit(occupancy("HOSP007", 96.0, 1)).unwrap();
    engine.acknowledge(&ward.id, "ops").unwrap();

    let open = engine.list_alerts(&AlertFilter::new().state(AlertState::Open));
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].subject_id, "HOSP007");

    let occupancy_alerts = engine.list_alerts(&AlertFilter::new().domain(Domain::OccupancyAlert));
    assert_eq!(occupancy_alerts.len(), 2);
    assert_eq!(occupancy_alerts[0].subject_id, "HOSP007");

    assert!(engine.list_alerts(&AlertFilter::new().domain(Domain::Fraud)).is_empty());
}
