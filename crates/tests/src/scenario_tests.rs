//! End-to-end scoring scenarios through the built-in rule sets and tier tables.

use beacon_core::{
    aggregator::Window,
    alerts::{AlertFilter, AlertState},
    classifier::Classifier,
    engine::Engine,
    rules::{builtin, EvalContext, FixedRandom},
    scoring::ScoringEngine,
    types::{AttributeValue, Domain, MetricRecord, RecordKind},
};

use crate::fixtures::{at, billing, occupancy, symptoms};

fn engine() -> Engine {
    Engine::builder().with_seed(2026).build().unwrap()
}

#[test]
fn test_triage_chest_pain_is_emergency() {
    let record = MetricRecord::builder("PAT-HOSP001-007", RecordKind::Symptoms)
        .attribute("symptoms", ["chest_pain", "breathing_difficulty"])
        .attribute("oxygen_saturation", 88.0)
        .attribute("age", 70.0)
        .observed_at(at(0))
        .build();

    let assessment = engine().submit(record).unwrap();

    assert!(assessment.result.score >= 12.0);
    assert_eq!(assessment.classification.tier_name(), "EMERGENCY");
    assert_eq!(
        assessment.classification.attribute("wait_time_minutes").and_then(AttributeValue::as_f64),
        Some(0.0)
    );
    assert_eq!(assessment.alert.unwrap().state, AlertState::Open);
}

#[test]
fn test_fraud_deterministic_part_and_pattern_boundary() {
    let rules = builtin::fraud_rules().unwrap();
    let classifier = Classifier::builtin().unwrap();
    let record = billing("BILL-000042", 12_000.0, ["SURGERY", "OUTPATIENT"], 0);

    let quiet = ScoringEngine::evaluate(&rules, &record, &mut EvalContext::new().with_random(FixedRandom::new(0.0)))
        .unwrap();
    assert!((quiet.score - 55.0).abs() < f64::EPSILON);
    let quiet_class = classifier.classify(Domain::Fraud, quiet.score).unwrap();
    assert!(quiet_class.signal("fraud_detected"));
    assert_eq!(quiet_class.tier_name(), "MEDIUM");
    assert_eq!(quiet_class.actions, vec!["MANUAL_REVIEW_REQUIRED"]);

    let noisy = ScoringEngine::evaluate(&rules, &record, &mut EvalContext::new().with_random(FixedRandom::new(0.9)))
        .unwrap();
    assert!((noisy.score - 77.5).abs() < 1e-9);
    let noisy_class = classifier.classify(Domain::Fraud, noisy.score).unwrap();
    assert_eq!(noisy_class.tier_name(), "HIGH");
    assert!(noisy_class.signal("fraud_detected"));
}

#[test]
fn test_fraud_through_engine_is_flagged() {
    let engine = engine();
    let assessment = engine.submit(billing("BILL-000043", 12_000.0, ["SURGERY", "OUTPATIENT"], 0)).unwrap();

    assert!(assessment.result.score >= 55.0);
    assert!(assessment.result.score <= 80.0);
    assert!(assessment.classification.signal("fraud_detected"));
    assert_eq!(assessment.result.contribution("billing_amount"), Some(25.0));
    assert_eq!(assessment.result.contribution("suspicious_combination"), Some(30.0));
}

#[test]
fn test_risk_elderly_multimorbid_is_high() {
    let record = MetricRecord::builder("PAT-HOSP002-013", RecordKind::Conditions)
        .attribute("age", 80.0)
        .attribute("conditions", ["cancer", "heart_disease"])
        .attribute("medications", ["m1", "m2", "m3", "m4", "m5", "m6", "m7", "m8", "m9"])
        .observed_at(at(0))
        .build();

    let assessment = engine().submit(record).unwrap();

    assert!((assessment.result.score - 85.0).abs() < f64::EPSILON);
    assert!(assessment.result.score <= 100.0);
    assert_eq!(assessment.classification.tier_name(), "HIGH");
    assert_eq!(
        assessment.classification.attribute("monitoring_frequency").and_then(AttributeValue::as_str),
        Some("daily")
    );
}

#[test]
fn test_risk_score_is_capped_at_one_hundred() {
    let record = MetricRecord::builder("PAT-HOSP002-014", RecordKind::Conditions)
        .attribute("age", 82.0)
        .attribute("conditions", ["cancer", "heart_disease", "kidney_disease", "copd"])
        .attribute("medications", 12.0)
        .attribute("glucose", 260.0)
        .observed_at(at(0))
        .build();

    let assessment = engine().submit(record).unwrap();

    assert!((assessment.result.score - 100.0).abs() < f64::EPSILON);
    assert!(assessment.result.raw_score() > 100.0);
}

#[test]
fn test_occupancy_network_average_and_alert() {
    let engine = engine();
    let mut alerts = Vec::new();
    for (hospital, rate) in [("HOSP001", 72.0), ("HOSP002", 85.0), ("HOSP003", 95.0)] {
        alerts.push(engine.submit(occupancy(hospital, rate, 0)).unwrap().alert);
    }

    let summary = engine.summarize(RecordKind::Occupancy, Window::Latest);
    assert!((summary.metric("occupancy_rate").unwrap().avg - 84.0).abs() < 0.1);

    assert!(alerts[0].is_none());
    assert!(alerts[1].is_none());
    let raised = alerts[2].as_ref().unwrap();
    assert_eq!(raised.subject_id, "HOSP003");
    assert_eq!(raised.state, AlertState::Open);
    assert_eq!(raised.tier, "WARNING");
}

#[test]
fn test_escalation_updates_single_alert() {
    let engine = engine();

    let mut urgent = symptoms("PAT-HOSP004-021", ["chest_pain", "headache"], 0);
    urgent.attributes.insert("heart_rate".into(), 130.0.into());
    let first = engine.submit(urgent).unwrap();
    assert!((first.result.score - 9.0).abs() < f64::EPSILON);
    assert_eq!(first.classification.tier_name(), "URGENT");

    let mut emergency = symptoms("PAT-HOSP004-021", ["chest_pain", "bleeding"], 10);
    emergency.attributes.insert("oxygen_saturation".into(), 88.0.into());
    let second = engine.submit(emergency).unwrap();
    assert!((second.result.score - 14.0).abs() < f64::EPSILON);
    assert_eq!(second.outcome, "updated");

    let alerts = engine.list_alerts(&AlertFilter::new());
    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.id, first.alert.unwrap().id);
    assert_eq!(alert.tier, "EMERGENCY");
    assert_eq!(alert.reasons, second.result.fired_reasons);
    assert!(alert.reasons.iter().all(|reason| !reason.contains("heart rate")));
    assert!(alert.reasons.iter().any(|reason| reason.starts_with("Low oxygen saturation")));
    assert_eq!(alert.opened_at, at(0));
}

#[test]
fn test_inventory_stock_line_raises_low_stock() {
    let record = MetricRecord::builder("HOSP005/Insulin", RecordKind::Inventory)
        .attribute("item_name", "Insulin")
        .attribute("quantity", 4.0)
        .attribute("reorder_level", 10.0)
        .observed_at(at(0))
        .build();

    let assessment = engine().submit(record).unwrap();

    assert_eq!(assessment.classification.tier_name(), "LOW_STOCK");
    assert_eq!(assessment.result.fired_reasons, vec!["Insulin stock at or below reorder level"]);
    assert!(assessment.raised_alert());
}

#[test]
fn test_assessment_serializes_for_collaborators() {
    let assessment = engine().submit(occupancy("HOSP006", 99.0, 0)).unwrap();
    let json = serde_json::to_value(&assessment).unwrap();

    assert_eq!(json["result"]["domain"], "occupancy_alert");
    assert_eq!(json["classification"]["tier"]["name"], "CRITICAL");
    assert_eq!(json["alert"]["state"], "OPEN");
    assert_eq!(json["outcome"], "opened");
}
