//! Scoring and submission benchmarks using Criterion.
//!
//! These benchmarks measure:
//! - Rule set evaluation per domain (pure scoring, no state)
//! - Classification of a score against the built-in tier tables
//! - Full `Engine::submit` including aggregation and alert upserts

#![allow(clippy::expect_used)] // Acceptable in benchmark code

use beacon_core::{
    classifier::Classifier,
    engine::Engine,
    rules::{builtin, EvalContext},
    scoring::ScoringEngine,
    types::{Domain, MetricRecord, RecordKind},
};
use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

fn triage_record() -> MetricRecord {
    MetricRecord::builder("PAT-HOSP001-001", RecordKind::Symptoms)
        .attribute("symptoms", ["chest_pain", "breathing_difficulty", "dizziness"])
        .attribute("oxygen_saturation", 88.0)
        .attribute("heart_rate", 128.0)
        .attribute("age", 70.0)
        .attribute("medical_history", ["diabetes", "hypertension", "copd"])
        .build()
}

fn billing_record() -> MetricRecord {
    MetricRecord::builder("BILL-000001", RecordKind::Billing)
        .attribute("amount", 12_000.0)
        .attribute("service_codes", ["SURGERY", "OUTPATIENT", "ICU", "DISCHARGE_SAME_DAY"])
        .build()
}

fn risk_record() -> MetricRecord {
    MetricRecord::builder("PAT-HOSP001-002", RecordKind::Conditions)
        .attribute("age", 80.0)
        .attribute("conditions", ["cancer", "heart_disease", "diabetes"])
        .attribute("medications", ["a", "b", "c", "d", "e", "f", "g", "h", "i"])
        .attribute("glucose", 240.0)
        .build()
}

/// Benchmark pure rule evaluation for each built-in rule set
fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    let cases = [
        ("triage", builtin::triage_rules().expect("triage rules"), triage_record()),
        ("fraud", builtin::fraud_rules().expect("fraud rules"), billing_record()),
        ("risk", builtin::risk_rules().expect("risk rules"), risk_record()),
    ];

    for (name, rules, record) in &cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), record, |b, record| {
            b.iter(|| {
                let mut ctx = EvalContext::seeded(42);
                ScoringEngine::evaluate(black_box(rules), black_box(record), &mut ctx)
                    .expect("evaluation")
            });
        });
    }

    group.finish();
}

/// Benchmark tier lookup across the score range
fn bench_classify(c: &mut Criterion) {
    let classifier = Classifier::builtin().expect("builtin classifier");

    c.bench_function("classify_risk_sweep", |b| {
        b.iter(|| {
            for score in 0..=100 {
                black_box(
                    classifier
                        .classify(Domain::Risk, black_box(f64::from(score)))
                        .expect("risk table"),
                );
            }
        });
    });
}

/// Benchmark the full submit path with alert upserts for a fixed subject pool
fn bench_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit");
    const BATCH: u64 = 500;
    group.throughput(Throughput::Elements(BATCH));

    let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).single().expect("valid date");

    group.bench_function("occupancy_500", |b| {
        b.iter_batched(
            || Engine::builder().with_seed(1).build().expect("engine"),
            |engine| {
                for i in 0..BATCH {
                    let subject = format!("HOSP{:03}", i % 20);
                    let minutes = i64::try_from(i).expect("small index");
                    let record = MetricRecord::builder(subject, RecordKind::Occupancy)
                        .attribute("occupancy_rate", 80.0 + f64::from(u32::try_from(i % 20).expect("small")))
                        .observed_at(start + Duration::minutes(minutes))
                        .build();
                    black_box(engine.submit(record).expect("submit"));
                }
                engine
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_classify, bench_submit);
criterion_main!(benches);
