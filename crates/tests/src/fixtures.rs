//! Record builders with fixed observation times.

use beacon_core::types::{MetricRecord, RecordKind};
use chrono::{DateTime, Duration, TimeZone, Utc};

/// 2026-03-01 08:00 UTC plus `minutes`.
#[must_use]
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).single().unwrap_or_default() + Duration::minutes(minutes)
}

#[must_use]
pub fn occupancy(hospital: &str, rate: f64, minutes: i64) -> MetricRecord {
    MetricRecord::builder(hospital, RecordKind::Occupancy)
        .attribute("occupancy_rate", rate)
        .attribute("total_beds", 200.0)
        .attribute("occupied_beds", (rate * 2.0).round())
        .observed_at(at(minutes))
        .build()
}

#[must_use]
pub fn symptoms<const N: usize>(patient: &str, symptoms: [&str; N], minutes: i64) -> MetricRecord {
    MetricRecord::builder(patient, RecordKind::Symptoms)
        .attribute("symptoms", symptoms)
        .observed_at(at(minutes))
        .build()
}

#[must_use]
pub fn billing<const N: usize>(bill: &str, amount: f64, codes: [&str; N], minutes: i64) -> MetricRecord {
    MetricRecord::builder(bill, RecordKind::Billing)
        .attribute("amount", amount)
        .attribute("service_codes", codes)
        .observed_at(at(minutes))
        .build()
}
