//! Heuristic weight tables for the built-in domains.
//!
//! These are fixed rule sets, not trained models. Attribute names follow the
//! collaborator payloads: vitals are flat numeric attributes
//! (`oxygen_saturation`, `heart_rate`, ...), list attributes carry symptoms,
//! conditions and service codes.

use super::{
    kinds::{Banded, Combination, Comparison, DuplicateEntries, Jitter, Threshold, WeightTable},
    EvalContext, Rule, RuleSet,
};
use crate::{
    errors::EngineError,
    types::{Domain, MetricRecord, RecordKind},
};

/// Occupancy rate at which the occupancy rule starts reporting a reason.
pub const OCCUPANCY_NOTICE_RATE: f64 = 85.0;

/// Emergency department triage. Symptom, vital sign, age and history factors stack.
///
/// # Errors
///
/// Propagates [`RuleSetBuilder::build`](super::RuleSetBuilder::build) failures.
pub fn triage_rules() -> Result<RuleSet, EngineError> {
    RuleSet::builder(Domain::Triage)
        .accept(RecordKind::Symptoms)
        .accept(RecordKind::Vitals)
        .rule(
            WeightTable::new("symptom_severity", "symptoms", "Symptoms")
                .entry("chest_pain", 5.0)
                .entry("breathing_difficulty", 5.0)
                .entry("unconscious", 5.0)
                .entry("bleeding", 4.0)
                .entry("fever", 2.0)
                .entry("pain", 2.0)
                .entry("dizziness", 2.0)
                .entry("headache", 1.0)
                .entry("cough", 1.0)
                .entry("nausea", 1.0)
                .fallback(1.0),
        )
        .rule(
            Threshold::new("blood_pressure", "blood_pressure_systolic", 4.0, "Abnormal blood pressure")
                .when(Comparison::Above(180.0))
                .when(Comparison::Below(90.0)),
        )
        .rule(
            Threshold::new("heart_rate", "heart_rate", 3.0, "Abnormal heart rate")
                .when(Comparison::Above(120.0))
                .when(Comparison::Below(50.0)),
        )
        .rule(
            Threshold::new("temperature", "temperature", 2.0, "Abnormal temperature")
                .when(Comparison::Above(39.0))
                .when(Comparison::Below(35.0)),
        )
        .rule(
            Threshold::new("oxygen_saturation", "oxygen_saturation", 5.0, "Low oxygen saturation")
                .when(Comparison::Below(92.0)),
        )
        .rule(
            Threshold::new("respiratory_rate", "respiratory_rate", 2.0, "Abnormal respiratory rate")
                .when(Comparison::Above(25.0))
                .when(Comparison::Below(12.0)),
        )
        .rule(
            Banded::value("age_factor", "age")
                .band(Comparison::Below(5.0), 3.0, "High-risk age group (under 5)")
                .band(Comparison::Above(65.0), 2.0, "High-risk age group (over 65)"),
        )
        .rule(
            Banded::count("medical_history", "medical_history")
                .band(Comparison::Above(2.0), 1.0, "Complex medical history"),
        )
        .build()
}

/// Billing fraud detection. The two pattern terms are bounded noise and need
/// a random source.
///
/// # Errors
///
/// Propagates [`RuleSetBuilder::build`](super::RuleSetBuilder::build) failures.
pub fn fraud_rules() -> Result<RuleSet, EngineError> {
    RuleSet::builder(Domain::Fraud)
        .accept(RecordKind::Billing)
        .rule(
            Banded::value("billing_amount", "amount")
                .band(Comparison::Above(10_000.0), 25.0, "Unusually high billing amount")
                .band(Comparison::Above(5_000.0), 10.0, "Moderately high billing amount"),
        )
        .rule(DuplicateEntries::new(
            "duplicate_services",
            "service_codes",
            20.0,
            "Duplicate service codes detected",
        ))
        .rule(
            Combination::new("suspicious_combination", "service_codes", 30.0)
                .combo(&["SURGERY", "OUTPATIENT"])
                .combo(&["ICU", "DISCHARGE_SAME_DAY"])
                .combo(&["EMERGENCY", "ROUTINE_CHECKUP"]),
        )
        .rule(Jitter::new("time_pattern", 15.0))
        .rule(Jitter::new("provider_history", 10.0))
        .build()
}

/// Patient risk scoring, clamped to 100.
///
/// # Errors
///
/// Propagates [`RuleSetBuilder::build`](super::RuleSetBuilder::build) failures.
pub fn risk_rules() -> Result<RuleSet, EngineError> {
    RuleSet::builder(Domain::Risk)
        .accept(RecordKind::Conditions)
        .accept(RecordKind::Vitals)
        .ceiling(100.0)
        .rule(
            Banded::value("age_risk", "age")
                .band(Comparison::Above(75.0), 25.0, "Advanced age (>75)")
                .band(Comparison::Above(65.0), 15.0, "Elderly (65-75)")
                .band(Comparison::Below(5.0), 20.0, "Pediatric patient (<5)"),
        )
        .rule(
            WeightTable::new("chronic_conditions", "conditions", "Chronic conditions")
                .entry("cancer", 25.0)
                .entry("heart_disease", 20.0)
                .entry("kidney_disease", 20.0)
                .entry("copd", 18.0)
                .entry("liver_disease", 18.0)
                .entry("diabetes", 15.0)
                .entry("hypertension", 10.0),
        )
        .rule(
            Banded::count("polypharmacy", "medications")
                .band(Comparison::Above(8.0), 15.0, "Severe polypharmacy (>8 medications)")
                .band(Comparison::Above(5.0), 8.0, "Polypharmacy (>5 medications)"),
        )
        .rule(Threshold::new("glucose", "glucose", 12.0, "Hyperglycemia").when(Comparison::Above(200.0)))
        .rule(
            Threshold::new("creatinine", "creatinine", 15.0, "Elevated creatinine")
                .when(Comparison::Above(1.5)),
        )
        .rule(Threshold::new("hemoglobin", "hemoglobin", 10.0, "Anemia").when(Comparison::Below(10.0)))
        .rule(
            Threshold::new("systolic_pressure", "blood_pressure_systolic", 8.0, "Hypertension")
                .when(Comparison::Above(140.0)),
        )
        .rule(Threshold::new("bmi", "bmi", 5.0, "Obesity").when(Comparison::Above(30.0)))
        .build()
}

/// Bed occupancy alerting. The score is the occupancy percentage.
///
/// # Errors
///
/// Propagates [`RuleSetBuilder::build`](super::RuleSetBuilder::build) failures.
pub fn occupancy_rules() -> Result<RuleSet, EngineError> {
    RuleSet::builder(Domain::OccupancyAlert)
        .accept(RecordKind::Occupancy)
        .rule(OccupancyRate { notice_rate: OCCUPANCY_NOTICE_RATE })
        .build()
}

/// Stock line alerting: at or below the reorder level scores 50, empty scores 100.
///
/// # Errors
///
/// Propagates [`RuleSetBuilder::build`](super::RuleSetBuilder::build) failures.
pub fn inventory_rules() -> Result<RuleSet, EngineError> {
    RuleSet::builder(Domain::InventoryAlert)
        .accept(RecordKind::Inventory)
        .rule(StockLevel { check: StockCheck::AtReorderLevel, weight: 50.0 })
        .rule(StockLevel { check: StockCheck::Depleted, weight: 50.0 })
        .build()
}

/// Every built-in rule set, one per [`Domain`].
///
/// # Errors
///
/// Propagates the first rule set construction failure.
pub fn all() -> Result<Vec<RuleSet>, EngineError> {
    Ok(vec![triage_rules()?, fraud_rules()?, risk_rules()?, occupancy_rules()?, inventory_rules()?])
}

/// Occupancy percentage from `occupancy_rate`, or `occupied_beds / total_beds`.
#[derive(Debug, Clone, Copy)]
pub struct OccupancyRate {
    notice_rate: f64,
}

impl OccupancyRate {
    fn rate(record: &MetricRecord) -> Option<f64> {
        record.number("occupancy_rate").or_else(|| {
            let occupied = record.number("occupied_beds")?;
            let total = record.number("total_beds").filter(|total| *total > 0.0)?;
            Some(occupied / total * 100.0)
        })
    }
}

impl Rule for OccupancyRate {
    fn name(&self) -> &str {
        "bed_occupancy"
    }

    fn weight(&self, record: &MetricRecord, _ctx: &mut EvalContext) -> f64 {
        Self::rate(record).unwrap_or(0.0).max(0.0)
    }

    fn reason(&self, record: &MetricRecord, _ctx: &EvalContext) -> Option<String> {
        Self::rate(record)
            .filter(|rate| *rate >= self.notice_rate)
            .map(|rate| format!("High bed occupancy ({rate:.1}%)"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StockCheck {
    AtReorderLevel,
    Depleted,
}

/// Stock line checks against `quantity` and `reorder_level`.
#[derive(Debug, Clone, Copy)]
pub struct StockLevel {
    check: StockCheck,
    weight: f64,
}

impl StockLevel {
    fn fires(&self, record: &MetricRecord) -> bool {
        let Some(quantity) = record.number("quantity") else {
            return false;
        };
        match self.check {
            StockCheck::AtReorderLevel => {
                record.number("reorder_level").is_some_and(|level| quantity <= level)
            }
            StockCheck::Depleted => quantity <= 0.0,
        }
    }
}

impl Rule for StockLevel {
    fn name(&self) -> &str {
        match self.check {
            StockCheck::AtReorderLevel => "below_reorder_level",
            StockCheck::Depleted => "stock_depleted",
        }
    }

    fn weight(&self, record: &MetricRecord, _ctx: &mut EvalContext) -> f64 {
        if self.fires(record) {
            self.weight
        } else {
            0.0
        }
    }

    fn reason(&self, record: &MetricRecord, _ctx: &EvalContext) -> Option<String> {
        if !self.fires(record) {
            return None;
        }
        let item = record.text("item_name").unwrap_or(&record.subject_id);
        Some(match self.check {
            StockCheck::AtReorderLevel => format!("{item} stock at or below reorder level"),
            StockCheck::Depleted => format!("{item} out of stock"),
        })
    }
}
