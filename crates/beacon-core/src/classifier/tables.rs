//! Built-in tier tables.

use super::{Boundary, Signal, Tier, TierTable};
use crate::{errors::EngineError, types::Domain};

/// Fraud score above which `fraud_detected` is raised.
pub const FRAUD_DETECTED_ABOVE: f64 = 50.0;

/// TRIAGE: EMERGENCY >= 12, URGENT >= 8, STANDARD >= 4, else NON_URGENT.
///
/// # Errors
///
/// Propagates [`TierTable::new`] validation failures.
pub fn triage() -> Result<TierTable, EngineError> {
    TierTable::new(
        Domain::Triage,
        vec![
            Tier::new("EMERGENCY", Boundary::at_least(12.0))
                .action("Immediate medical attention required")
                .action("Prepare emergency team")
                .attribute("wait_time_minutes", 0.0)
                .attribute("department", "Emergency Department")
                .attribute("color", "RED"),
            Tier::new("URGENT", Boundary::at_least(8.0))
                .action("See healthcare provider within 15 minutes")
                .action("Monitor vital signs closely")
                .attribute("wait_time_minutes", 15.0)
                .attribute("department", "Urgent Care")
                .attribute("color", "ORANGE"),
            Tier::new("STANDARD", Boundary::at_least(4.0))
                .action("Standard care pathway")
                .action("Regular monitoring sufficient")
                .attribute("wait_time_minutes", 60.0)
                .attribute("department", "General Outpatient")
                .attribute("color", "YELLOW"),
            Tier::new("NON_URGENT", Boundary::floor())
                .action("Standard care pathway")
                .action("Regular monitoring sufficient")
                .attribute("wait_time_minutes", 120.0)
                .attribute("department", "General Outpatient")
                .attribute("color", "GREEN"),
        ],
    )
}

/// FRAUD: HIGH > 70, MEDIUM > 40, else LOW, with `fraud_detected` above 50.
/// A detected fraud recommends manual review only.
///
/// # Errors
///
/// Propagates [`TierTable::new`] validation failures.
pub fn fraud() -> Result<TierTable, EngineError> {
    let table = TierTable::new(
        Domain::Fraud,
        vec![
            Tier::new("HIGH", Boundary::above(70.0))
                .action("MANUAL_REVIEW_REQUIRED")
                .attribute("audit_priority", 1.0),
            Tier::new("MEDIUM", Boundary::above(40.0))
                .action("FLAG_FOR_AUDIT")
                .attribute("audit_priority", 2.0),
            Tier::new("LOW", Boundary::floor()).action("APPROVE").attribute("audit_priority", 3.0),
        ],
    )?;

    Ok(table.with_signal(
        Signal::new("fraud_detected", Boundary::above(FRAUD_DETECTED_ABOVE))
            .action("MANUAL_REVIEW_REQUIRED")
            .replacing_tier_actions(),
    ))
}

/// RISK: HIGH > 70, MODERATE > 40, else LOW.
///
/// # Errors
///
/// Propagates [`TierTable::new`] validation failures.
pub fn risk() -> Result<TierTable, EngineError> {
    TierTable::new(
        Domain::Risk,
        vec![
            Tier::new("HIGH", Boundary::above(70.0))
                .action("Intensive monitoring required")
                .action("Consider care management program enrollment")
                .action("Weekly physician follow-up")
                .action("Medication therapy management review")
                .attribute("monitoring_frequency", "daily")
                .attribute("specialist_referral", true)
                .attribute("care_coordinator", true)
                .attribute("next_assessment_days", 7.0),
            Tier::new("MODERATE", Boundary::above(40.0))
                .action("Regular monitoring recommended")
                .action("Monthly follow-up appointments")
                .action("Medication adherence support")
                .attribute("monitoring_frequency", "weekly")
                .attribute("specialist_referral", false)
                .attribute("care_coordinator", true)
                .attribute("next_assessment_days", 30.0),
            Tier::new("LOW", Boundary::floor())
                .action("Standard care pathway")
                .action("Quarterly check-ups")
                .attribute("monitoring_frequency", "monthly")
                .attribute("specialist_referral", false)
                .attribute("care_coordinator", false)
                .attribute("next_assessment_days", 30.0),
        ],
    )
}

/// OCCUPANCY_ALERT on the occupancy percentage: CRITICAL >= 98, WARNING >= 95,
/// ELEVATED >= 85, else NORMAL.
///
/// # Errors
///
/// Propagates [`TierTable::new`] validation failures.
pub fn occupancy() -> Result<TierTable, EngineError> {
    TierTable::new(
        Domain::OccupancyAlert,
        vec![
            Tier::new("CRITICAL", Boundary::at_least(98.0))
                .action("Activate surge capacity plan")
                .action("Divert non-critical admissions")
                .attribute("severity", "critical"),
            Tier::new("WARNING", Boundary::at_least(95.0))
                .action("Expedite pending discharges")
                .action("Notify bed manager")
                .attribute("severity", "warning"),
            Tier::new("ELEVATED", Boundary::at_least(85.0))
                .action("Monitor occupancy trend")
                .attribute("severity", "info"),
            Tier::new("NORMAL", Boundary::floor()),
        ],
    )
}

/// INVENTORY_ALERT: DEPLETED >= 100, LOW_STOCK >= 50, else ADEQUATE.
///
/// # Errors
///
/// Propagates [`TierTable::new`] validation failures.
pub fn inventory() -> Result<TierTable, EngineError> {
    TierTable::new(
        Domain::InventoryAlert,
        vec![
            Tier::new("DEPLETED", Boundary::at_least(100.0))
                .action("Place emergency order")
                .action("Source from nearby facility")
                .attribute("severity", "critical"),
            Tier::new("LOW_STOCK", Boundary::at_least(50.0))
                .action("Place reorder")
                .attribute("severity", "warning"),
            Tier::new("ADEQUATE", Boundary::floor()),
        ],
    )
}

/// Every built-in table, one per [`Domain`].
///
/// # Errors
///
/// Propagates the first validation failure.
pub fn all() -> Result<Vec<TierTable>, EngineError> {
    Ok(vec![triage()?, fraud()?, risk()?, occupancy()?, inventory()?])
}
