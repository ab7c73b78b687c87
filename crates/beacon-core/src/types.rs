//! Core data model shared by every engine component.
//!
//! # Type Categories
//!
//! - [`MetricRecord`], [`RecordKind`], [`AttributeValue`]: normalized observations
//!   produced by collaborators (occupancy snapshots, billing lines, patient data)
//! - [`Domain`]: named scoring context selecting a rule set and a tier table
//!
//! Records are immutable once built. Attribute lookups never fail: a missing or
//! mistyped attribute reads as `None`, and rules treat it as "does not fire".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::errors::EngineError;

/// Kind of observation carried by a [`MetricRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Bed occupancy snapshot for one hospital.
    Occupancy,
    /// Patient vital signs.
    Vitals,
    /// Billing transaction.
    Billing,
    /// Inventory line or stock snapshot.
    Inventory,
    /// Presenting symptoms (usually with vitals and age attached).
    Symptoms,
    /// Chronic conditions, medications and lab results.
    Conditions,
}

impl RecordKind {
    /// All kinds, in declaration order.
    pub const ALL: [RecordKind; 6] = [
        Self::Occupancy,
        Self::Vitals,
        Self::Billing,
        Self::Inventory,
        Self::Symptoms,
        Self::Conditions,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Occupancy => "occupancy",
            Self::Vitals => "vitals",
            Self::Billing => "billing",
            Self::Inventory => "inventory",
            Self::Symptoms => "symptoms",
            Self::Conditions => "conditions",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("Unknown record kind: {s}"))
    }
}

/// Named scoring context. Each domain owns one rule set and one tier table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Emergency department triage.
    Triage,
    /// Billing fraud detection.
    Fraud,
    /// Patient risk scoring.
    Risk,
    /// Hospital bed occupancy alerting.
    OccupancyAlert,
    /// Inventory low-stock alerting.
    InventoryAlert,
}

impl Domain {
    /// All domains, in declaration order.
    pub const ALL: [Domain; 5] =
        [Self::Triage, Self::Fraud, Self::Risk, Self::OccupancyAlert, Self::InventoryAlert];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Triage => "triage",
            Self::Fraud => "fraud",
            Self::Risk => "risk",
            Self::OccupancyAlert => "occupancy_alert",
            Self::InventoryAlert => "inventory_alert",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

impl FromStr for Domain {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|domain| domain.as_str() == normalized)
            .ok_or_else(|| EngineError::UnknownDomain(s.to_string()))
    }
}

/// A single attribute value on a record or a tier.
///
/// Deserializes untagged so collaborator JSON like
/// `{"age": 70, "symptoms": ["fever"], "insured": true}` maps directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl AttributeValue {
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Flag(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<&[&str]> for AttributeValue {
    fn from(values: &[&str]) -> Self {
        Self::List(values.iter().map(|v| (*v).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for AttributeValue {
    fn from(values: [&str; N]) -> Self {
        Self::List(values.iter().map(|v| (*v).to_string()).collect())
    }
}

/// Attribute map of a record, ordered by name for stable serialization.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// One normalized observation about a subject (hospital, patient, billing entity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Hospital, patient or billing entity identifier.
    pub subject_id: String,
    /// Observation kind; decides which domains may score the record.
    pub kind: RecordKind,
    /// Kind-specific attributes.
    #[serde(default)]
    pub attributes: Attributes,
    /// When the observation was made. Defaults to the decode time.
    #[serde(default = "Utc::now")]
    pub observed_at: DateTime<Utc>,
}

impl MetricRecord {
    /// Starts building a record observed now.
    #[must_use]
    pub fn builder(subject_id: impl Into<String>, kind: RecordKind) -> MetricRecordBuilder {
        MetricRecordBuilder {
            subject_id: subject_id.into(),
            kind,
            attributes: Attributes::new(),
            observed_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Numeric attribute, if present and numeric.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        self.attribute(name).and_then(AttributeValue::as_f64)
    }

    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(AttributeValue::as_str)
    }

    #[must_use]
    pub fn list(&self, name: &str) -> Option<&[String]> {
        self.attribute(name).and_then(AttributeValue::as_list)
    }

    /// Cardinality of an attribute: list length, or the number itself when the
    /// collaborator sent a pre-counted value (`"medications": 9`).
    #[must_use]
    pub fn count(&self, name: &str) -> Option<f64> {
        match self.attribute(name)? {
            AttributeValue::List(values) => {
                #[allow(clippy::cast_precision_loss)]
                let len = values.len() as f64;
                Some(len)
            }
            AttributeValue::Number(value) => Some(*value),
            _ => None,
        }
    }
}

/// Builder for [`MetricRecord`].
#[derive(Debug, Clone)]
pub struct MetricRecordBuilder {
    subject_id: String,
    kind: RecordKind,
    attributes: Attributes,
    observed_at: DateTime<Utc>,
}

impl MetricRecordBuilder {
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn observed_at(mut self, observed_at: DateTime<Utc>) -> Self {
        self.observed_at = observed_at;
        self
    }

    #[must_use]
    pub fn build(self) -> MetricRecord {
        MetricRecord {
            subject_id: self.subject_id,
            kind: self.kind,
            attributes: self.attributes,
            observed_at: self.observed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_parsing_accepts_display_and_snake_case() {
        assert_eq!("TRIAGE".parse::<Domain>().unwrap(), Domain::Triage);
        assert_eq!("occupancy-alert".parse::<Domain>().unwrap(), Domain::OccupancyAlert);
        assert_eq!(Domain::InventoryAlert.to_string(), "INVENTORY_ALERT");

        let err = "billing".parse::<Domain>().unwrap_err();
        assert!(matches!(err, EngineError::UnknownDomain(name) if name == "billing"));
    }

    #[test]
    fn test_record_kind_round_trip() {
        for kind in RecordKind::ALL {
            assert_eq!(kind.to_string().parse::<RecordKind>().unwrap(), kind);
        }
        assert!("beds".parse::<RecordKind>().is_err());
    }

    #[test]
    fn test_attribute_accessors() {
        let record = MetricRecord::builder("P-1", RecordKind::Conditions)
            .attribute("age", 80.0)
            .attribute("conditions", ["cancer", "heart_disease"])
            .attribute("medications", 9.0)
            .attribute("ward", "oncology")
            .build();

        assert_eq!(record.number("age"), Some(80.0));
        assert_eq!(record.list("conditions").map(<[String]>::len), Some(2));
        assert_eq!(record.count("conditions"), Some(2.0));
        assert_eq!(record.count("medications"), Some(9.0));
        assert_eq!(record.text("ward"), Some("oncology"));
        assert_eq!(record.number("ward"), None);
        assert_eq!(record.count("missing"), None);
    }

    #[test]
    fn test_record_deserializes_collaborator_json() {
        let json = r#"{
            "subject_id": "P-7",
            "kind": "symptoms",
            "attributes": {
                "symptoms": ["chest_pain", "breathing_difficulty"],
                "oxygen_saturation": 88,
                "age": 70,
                "insured": true
            },
            "observed_at": "2026-03-01T08:00:00Z"
        }"#;

        let record: MetricRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, RecordKind::Symptoms);
        assert_eq!(record.number("oxygen_saturation"), Some(88.0));
        assert_eq!(record.attribute("insured"), Some(&AttributeValue::Flag(true)));
        assert_eq!(record.count("symptoms"), Some(2.0));
    }
}
