//! Seeded generator for hospital network records.
//!
//! Every tick produces, per hospital, an occupancy snapshot, an inventory
//! snapshot and one stock line, plus a handful of billing transactions and
//! patient records spread across the network. Value ranges follow the
//! historical generators the dashboards were built against (occupancy 60-95%
//! on 200 beds, up to 20 low-stock items, bills averaging 800-1200).
//!
//! The same seed and start time always produce the same records.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{RecordSource, SourceError};
use crate::types::{MetricRecord, RecordKind};

const HOSPITAL_NAMES: [&str; 6] = [
    "City General",
    "Riverside Med",
    "Central Health",
    "Westside Clinic",
    "North Medical",
    "East Hospital",
];

const STOCK_ITEMS: [&str; 6] = ["paracetamol", "amoxicillin", "insulin", "gauze", "saline", "gloves"];

const SERVICE_CODES: [&str; 10] = [
    "CONSULTATION",
    "LAB",
    "IMAGING",
    "PHARMACY",
    "SURGERY",
    "OUTPATIENT",
    "ICU",
    "DISCHARGE_SAME_DAY",
    "EMERGENCY",
    "ROUTINE_CHECKUP",
];

const SYMPTOMS: [&str; 10] = [
    "chest_pain",
    "breathing_difficulty",
    "fever",
    "headache",
    "cough",
    "bleeding",
    "pain",
    "nausea",
    "dizziness",
    "unconscious",
];

const CONDITIONS: [&str; 7] =
    ["diabetes", "hypertension", "heart_disease", "copd", "cancer", "kidney_disease", "liver_disease"];

/// Minutes between the observation times of consecutive ticks.
const TICK_MINUTES: i64 = 5;

/// Patients per hospital; patient ids repeat so alerts get updated.
const PATIENT_POOL: u32 = 50;

/// Generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    /// Number of hospitals (`HOSP001`, `HOSP002`, ...).
    #[serde(default = "default_hospitals")]
    pub hospitals: usize,

    #[serde(default)]
    pub seed: u64,

    /// Chance that an occupancy snapshot lands in the 95-100% surge band.
    #[serde(default = "default_surge_probability")]
    pub surge_probability: f64,

    /// Billing transactions per tick across the network.
    #[serde(default = "default_billing_per_tick")]
    pub billing_per_tick: usize,

    /// Patients assessed per tick across the network.
    #[serde(default = "default_patients_per_tick")]
    pub patients_per_tick: usize,
}

fn default_hospitals() -> usize {
    6
}
fn default_surge_probability() -> f64 {
    0.1
}
fn default_billing_per_tick() -> usize {
    3
}
fn default_patients_per_tick() -> usize {
    2
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            hospitals: default_hospitals(),
            seed: 0,
            surge_probability: default_surge_probability(),
            billing_per_tick: default_billing_per_tick(),
            patients_per_tick: default_patients_per_tick(),
        }
    }
}

#[derive(Debug)]
struct GeneratorState {
    rng: StdRng,
    tick: i64,
    billing_seq: u64,
}

/// Seeded [`RecordSource`] for demos and tests.
#[derive(Debug)]
pub struct SyntheticSource {
    config: SyntheticConfig,
    start: DateTime<Utc>,
    state: Mutex<GeneratorState>,
}

impl SyntheticSource {
    /// Generator whose first tick is observed now.
    #[must_use]
    pub fn new(config: SyntheticConfig) -> Self {
        Self::starting_at(config, Utc::now())
    }

    /// Generator whose first tick is observed at `start`.
    #[must_use]
    pub fn starting_at(config: SyntheticConfig, start: DateTime<Utc>) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self { config, start, state: Mutex::new(GeneratorState { rng, tick: 0, billing_seq: 0 }) }
    }

    #[must_use]
    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }

    /// Hospital subject ids, `HOSP001` onwards.
    #[must_use]
    pub fn hospital_ids(&self) -> Vec<String> {
        (1..=self.config.hospitals).map(|n| format!("HOSP{n:03}")).collect()
    }

    /// Generates the next tick.
    pub fn next_batch(&self) -> Vec<MetricRecord> {
        let mut state = self.state.lock();
        state.tick += 1;
        let at = self.start + Duration::minutes(TICK_MINUTES * (state.tick - 1));
        let hospitals = self.hospital_ids();
        let mut batch = Vec::with_capacity(hospitals.len() * 3 + self.config.billing_per_tick);

        for (index, hospital) in hospitals.iter().enumerate() {
            let name = HOSPITAL_NAMES[index % HOSPITAL_NAMES.len()];
            batch.push(self.occupancy(&mut state.rng, hospital, name, at));
            batch.push(inventory_snapshot(&mut state.rng, hospital, at));
            batch.push(stock_line(&mut state.rng, hospital, at));
        }

        if hospitals.is_empty() {
            return batch;
        }

        for _ in 0..self.config.billing_per_tick {
            state.billing_seq += 1;
            let seq = state.billing_seq;
            let hospital = &hospitals[state.rng.random_range(0..hospitals.len())];
            batch.push(billing(&mut state.rng, hospital, seq, at));
        }

        for _ in 0..self.config.patients_per_tick {
            let hospital = &hospitals[state.rng.random_range(0..hospitals.len())];
            let patient = format!("PAT-{hospital}-{:03}", state.rng.random_range(0..PATIENT_POOL));
            batch.push(symptoms(&mut state.rng, &patient, at));
            batch.push(conditions(&mut state.rng, &patient, at));
        }

        batch
    }

    /// Back-filled daily records, one per hospital per day, newest first.
    ///
    /// Occupancy, inventory and billing reproduce the historical daily
    /// series; the patient kinds produce daily census figures.
    pub fn history(&self, kind: RecordKind, days: usize) -> Vec<MetricRecord> {
        let mut state = self.state.lock();
        let mut records = Vec::with_capacity(days * self.config.hospitals);

        for offset in (0_i64..).take(days) {
            let at = self.start - Duration::days(offset);
            for hospital in self.hospital_ids() {
                let rng = &mut state.rng;
                let builder = MetricRecord::builder(hospital.as_str(), kind).observed_at(at);
                let record = match kind {
                    RecordKind::Occupancy => {
                        let occupied = f64::from(rng.random_range(120..180u32));
                        builder
                            .attribute("occupancy_rate", round1(rng.random_range(60.0..95.0)))
                            .attribute("total_beds", 200.0)
                            .attribute("occupied_beds", occupied)
                    }
                    RecordKind::Inventory => builder
                        .attribute("low_stock_items", f64::from(rng.random_range(0..20u32)))
                        .attribute("total_items", f64::from(rng.random_range(500..600u32)))
                        .attribute("reorders_placed", f64::from(rng.random_range(0..5u32))),
                    RecordKind::Billing => builder
                        .attribute("revenue", round1(rng.random_range(50_000.0..100_000.0)))
                        .attribute("invoices", f64::from(rng.random_range(50..80u32)))
                        .attribute("average_bill", round1(rng.random_range(800.0..1200.0))),
                    RecordKind::Symptoms | RecordKind::Vitals | RecordKind::Conditions => builder
                        .attribute("patients", f64::from(rng.random_range(80..120u32)))
                        .attribute("new_admissions", f64::from(rng.random_range(10..20u32)))
                        .attribute("discharges", f64::from(rng.random_range(8..16u32))),
                };
                records.push(record.build());
            }
        }

        records
    }

    fn occupancy(&self, rng: &mut StdRng, hospital: &str, name: &str, at: DateTime<Utc>) -> MetricRecord {
        let rate = if rng.random_bool(self.config.surge_probability.clamp(0.0, 1.0)) {
            rng.random_range(95.0..100.0)
        } else {
            rng.random_range(60.0..95.0)
        };
        let rate = round1(rate);

        MetricRecord::builder(hospital, RecordKind::Occupancy)
            .attribute("hospital_name", name)
            .attribute("occupancy_rate", rate)
            .attribute("total_beds", 200.0)
            .attribute("occupied_beds", (rate * 2.0).round())
            .observed_at(at)
            .build()
    }
}

#[async_trait]
impl RecordSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn fetch(&self) -> Result<Vec<MetricRecord>, SourceError> {
        Ok(self.next_batch())
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn pick<'a>(rng: &mut StdRng, values: &[&'a str]) -> &'a str {
    values[rng.random_range(0..values.len())]
}

fn pick_many(rng: &mut StdRng, values: &[&str], max: usize) -> Vec<String> {
    let count = rng.random_range(0..=max);
    (0..count).map(|_| pick(rng, values).to_string()).collect()
}

fn inventory_snapshot(rng: &mut StdRng, hospital: &str, at: DateTime<Utc>) -> MetricRecord {
    MetricRecord::builder(hospital, RecordKind::Inventory)
        .attribute("low_stock_items", f64::from(rng.random_range(0..20u32)))
        .attribute("total_items", f64::from(rng.random_range(500..600u32)))
        .attribute("reorders_placed", f64::from(rng.random_range(0..5u32)))
        .observed_at(at)
        .build()
}

fn stock_line(rng: &mut StdRng, hospital: &str, at: DateTime<Utc>) -> MetricRecord {
    let item = pick(rng, &STOCK_ITEMS);
    MetricRecord::builder(format!("{hospital}/{item}"), RecordKind::Inventory)
        .attribute("item_name", item)
        .attribute("quantity", f64::from(rng.random_range(0..150u32)))
        .attribute("reorder_level", f64::from(rng.random_range(10..=40u32)))
        .attribute("unit_price", round1(rng.random_range(0.5..50.0)))
        .observed_at(at)
        .build()
}

fn billing(rng: &mut StdRng, hospital: &str, seq: u64, at: DateTime<Utc>) -> MetricRecord {
    let amount = if rng.random_bool(0.1) {
        rng.random_range(10_000.0..20_000.0)
    } else {
        rng.random_range(200.0..6_000.0)
    };
    let mut codes = pick_many(rng, &SERVICE_CODES, 3);
    if codes.is_empty() {
        codes.push("CONSULTATION".to_string());
    }

    MetricRecord::builder(format!("BILL-{seq:06}"), RecordKind::Billing)
        .attribute("hospital_id", hospital)
        .attribute("provider_id", format!("PROV-{:03}", rng.random_range(1..=20u32)))
        .attribute("amount", round1(amount))
        .attribute("service_codes", codes)
        .observed_at(at)
        .build()
}

fn symptoms(rng: &mut StdRng, patient: &str, at: DateTime<Utc>) -> MetricRecord {
    MetricRecord::builder(patient, RecordKind::Symptoms)
        .attribute("symptoms", pick_many(rng, &SYMPTOMS, 3))
        .attribute("heart_rate", f64::from(rng.random_range(50..130u32)))
        .attribute("blood_pressure_systolic", f64::from(rng.random_range(85..190u32)))
        .attribute("temperature", round1(rng.random_range(35.5..40.0)))
        .attribute("oxygen_saturation", f64::from(rng.random_range(86..=100u32)))
        .attribute("respiratory_rate", f64::from(rng.random_range(10..28u32)))
        .attribute("age", f64::from(rng.random_range(1..95u32)))
        .observed_at(at)
        .build()
}

fn conditions(rng: &mut StdRng, patient: &str, at: DateTime<Utc>) -> MetricRecord {
    MetricRecord::builder(patient, RecordKind::Conditions)
        .attribute("age", f64::from(rng.random_range(1..95u32)))
        .attribute("conditions", pick_many(rng, &CONDITIONS, 3))
        .attribute("medications", f64::from(rng.random_range(0..12u32)))
        .attribute("glucose", f64::from(rng.random_range(70..260u32)))
        .attribute("creatinine", round1(rng.random_range(0.5..2.5)))
        .attribute("hemoglobin", round1(rng.random_range(8.0..16.0)))
        .attribute("bmi", round1(rng.random_range(18.0..40.0)))
        .observed_at(at)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn source(seed: u64) -> SyntheticSource {
        let start = Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap();
        SyntheticSource::starting_at(SyntheticConfig { seed, ..SyntheticConfig::default() }, start)
    }

    #[test]
    fn test_same_seed_same_records() {
        assert_eq!(source(7).next_batch(), source(7).next_batch());
        assert_ne!(source(7).next_batch(), source(8).next_batch());
    }

    #[test]
    fn test_batch_shape() {
        let source = source(1);
        let batch = source.next_batch();
        let count = |kind: RecordKind| batch.iter().filter(|r| r.kind == kind).count();

        assert_eq!(count(RecordKind::Occupancy), 6);
        assert_eq!(count(RecordKind::Inventory), 12);
        assert_eq!(count(RecordKind::Billing), 3);
        assert_eq!(count(RecordKind::Symptoms), 2);
        assert_eq!(count(RecordKind::Conditions), 2);

        for record in batch.iter().filter(|r| r.kind == RecordKind::Occupancy) {
            let rate = record.number("occupancy_rate").unwrap();
            assert!((60.0..=100.0).contains(&rate), "{rate}");
        }
    }

    #[test]
    fn test_ticks_advance_observation_time() {
        let source = source(3);
        let first = source.next_batch()[0].observed_at;
        let second = source.next_batch()[0].observed_at;
        assert_eq!(second - first, Duration::minutes(TICK_MINUTES));
    }

    #[test]
    fn test_history_is_daily_per_hospital() {
        let source = source(5);
        let history = source.history(RecordKind::Occupancy, 30);

        assert_eq!(history.len(), 30 * 6);
        assert_eq!(history[0].observed_at - history[6].observed_at, Duration::days(1));
        assert!(history.iter().all(|r| r.number("total_beds") == Some(200.0)));
    }

    #[tokio::test]
    async fn test_fetch_never_fails() {
        let source = SyntheticSource::new(SyntheticConfig { hospitals: 0, ..SyntheticConfig::default() });
        assert!(source.fetch().await.unwrap().is_empty());
    }
}
