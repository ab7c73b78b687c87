//! Reusable rule shapes.
//!
//! Each shape is configured with a name and the record attribute it reads. A
//! missing or mistyped attribute never fires.

use std::{collections::HashMap, fmt};

use super::{EvalContext, Rule};
use crate::types::MetricRecord;

/// Comparison against a fixed bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    Above(f64),
    AtLeast(f64),
    Below(f64),
    AtMost(f64),
    Equals(f64),
}

impl Comparison {
    /// Returns `true` if `value` satisfies the comparison. NaN never does.
    #[must_use]
    pub fn admits(&self, value: f64) -> bool {
        match *self {
            Self::Above(bound) => value > bound,
            Self::AtLeast(bound) => value >= bound,
            Self::Below(bound) => value < bound,
            Self::AtMost(bound) => value <= bound,
            Self::Equals(bound) => (value - bound).abs() < f64::EPSILON,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Above(bound) => write!(f, "> {bound}"),
            Self::AtLeast(bound) => write!(f, ">= {bound}"),
            Self::Below(bound) => write!(f, "< {bound}"),
            Self::AtMost(bound) => write!(f, "<= {bound}"),
            Self::Equals(bound) => write!(f, "= {bound}"),
        }
    }
}

/// How a rule reads its attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// The numeric value.
    Value,
    /// List length, or the number itself when pre-counted.
    Count,
}

impl Measure {
    fn read(self, record: &MetricRecord, attribute: &str) -> Option<f64> {
        match self {
            Self::Value => record.number(attribute),
            Self::Count => record.count(attribute),
        }
    }
}

/// Fixed weight when a numeric attribute satisfies any of its conditions.
///
/// `Threshold::new("heart_rate", "heart_rate", 3.0, "Abnormal heart rate")
///     .when(Comparison::Above(120.0)).when(Comparison::Below(50.0))`
#[derive(Debug, Clone)]
pub struct Threshold {
    name: String,
    attribute: String,
    conditions: Vec<Comparison>,
    weight: f64,
    reason: String,
}

impl Threshold {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        attribute: impl Into<String>,
        weight: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            attribute: attribute.into(),
            conditions: Vec::new(),
            weight,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn when(mut self, condition: Comparison) -> Self {
        self.conditions.push(condition);
        self
    }

    fn fired_value(&self, record: &MetricRecord) -> Option<f64> {
        record
            .number(&self.attribute)
            .filter(|value| self.conditions.iter().any(|condition| condition.admits(*value)))
    }
}

impl Rule for Threshold {
    fn name(&self) -> &str {
        &self.name
    }

    fn weight(&self, record: &MetricRecord, _ctx: &mut EvalContext) -> f64 {
        if self.fired_value(record).is_some() {
            self.weight
        } else {
            0.0
        }
    }

    fn reason(&self, record: &MetricRecord, _ctx: &EvalContext) -> Option<String> {
        self.fired_value(record)
            .map(|value| format!("{} ({} {value})", self.reason, self.attribute))
    }
}

#[derive(Debug, Clone)]
struct Band {
    when: Comparison,
    weight: f64,
    reason: String,
}

/// First matching band wins, like an `if / else if` ladder.
#[derive(Debug, Clone)]
pub struct Banded {
    name: String,
    attribute: String,
    measure: Measure,
    bands: Vec<Band>,
}

impl Banded {
    /// Bands over the attribute's numeric value.
    #[must_use]
    pub fn value(name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self { name: name.into(), attribute: attribute.into(), measure: Measure::Value, bands: Vec::new() }
    }

    /// Bands over the attribute's cardinality.
    #[must_use]
    pub fn count(name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self { name: name.into(), attribute: attribute.into(), measure: Measure::Count, bands: Vec::new() }
    }

    #[must_use]
    pub fn band(mut self, when: Comparison, weight: f64, reason: impl Into<String>) -> Self {
        self.bands.push(Band { when, weight, reason: reason.into() });
        self
    }

    fn matching(&self, record: &MetricRecord) -> Option<&Band> {
        let value = self.measure.read(record, &self.attribute)?;
        self.bands.iter().find(|band| band.when.admits(value))
    }
}

impl Rule for Banded {
    fn name(&self) -> &str {
        &self.name
    }

    fn weight(&self, record: &MetricRecord, _ctx: &mut EvalContext) -> f64 {
        self.matching(record).map_or(0.0, |band| band.weight)
    }

    fn reason(&self, record: &MetricRecord, _ctx: &EvalContext) -> Option<String> {
        self.matching(record).map(|band| band.reason.clone())
    }
}

/// Sums per-entry weights over a list attribute.
///
/// Lookups are case-insensitive. Entries missing from the table contribute
/// the fallback weight, if one is set.
#[derive(Debug, Clone)]
pub struct WeightTable {
    name: String,
    attribute: String,
    label: String,
    weights: HashMap<String, f64>,
    fallback: Option<f64>,
}

impl WeightTable {
    #[must_use]
    pub fn new(name: impl Into<String>, attribute: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute: attribute.into(),
            label: label.into(),
            weights: HashMap::new(),
            fallback: None,
        }
    }

    #[must_use]
    pub fn entry(mut self, key: &str, weight: f64) -> Self {
        self.weights.insert(key.to_ascii_lowercase(), weight);
        self
    }

    #[must_use]
    pub fn fallback(mut self, weight: f64) -> Self {
        self.fallback = Some(weight);
        self
    }

    fn contributions<'a>(&'a self, record: &'a MetricRecord) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        record.list(&self.attribute).unwrap_or_default().iter().filter_map(move |entry| {
            self.weights
                .get(&entry.to_ascii_lowercase())
                .copied()
                .or(self.fallback)
                .map(|weight| (entry.as_str(), weight))
        })
    }
}

impl Rule for WeightTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn weight(&self, record: &MetricRecord, _ctx: &mut EvalContext) -> f64 {
        self.contributions(record).map(|(_, weight)| weight).sum()
    }

    fn reason(&self, record: &MetricRecord, _ctx: &EvalContext) -> Option<String> {
        let entries: Vec<String> = self
            .contributions(record)
            .filter(|(_, weight)| *weight != 0.0)
            .map(|(entry, weight)| format!("{entry} (+{weight})"))
            .collect();
        (!entries.is_empty()).then(|| format!("{}: {}", self.label, entries.join(", ")))
    }
}

/// Fixed weight when a list attribute contains the same entry twice.
#[derive(Debug, Clone)]
pub struct DuplicateEntries {
    name: String,
    attribute: String,
    weight: f64,
    reason: String,
}

impl DuplicateEntries {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        attribute: impl Into<String>,
        weight: f64,
        reason: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), attribute: attribute.into(), weight, reason: reason.into() }
    }

    fn fires(&self, record: &MetricRecord) -> bool {
        let Some(entries) = record.list(&self.attribute) else {
            return false;
        };
        let mut seen = std::collections::HashSet::with_capacity(entries.len());
        entries.iter().any(|entry| !seen.insert(entry))
    }
}

impl Rule for DuplicateEntries {
    fn name(&self) -> &str {
        &self.name
    }

    fn weight(&self, record: &MetricRecord, _ctx: &mut EvalContext) -> f64 {
        if self.fires(record) {
            self.weight
        } else {
            0.0
        }
    }

    fn reason(&self, record: &MetricRecord, _ctx: &EvalContext) -> Option<String> {
        self.fires(record).then(|| self.reason.clone())
    }
}

/// Adds a fixed weight for every combination whose entries are all present.
#[derive(Debug, Clone)]
pub struct Combination {
    name: String,
    attribute: String,
    combos: Vec<Vec<String>>,
    weight_per_combo: f64,
}

impl Combination {
    #[must_use]
    pub fn new(name: impl Into<String>, attribute: impl Into<String>, weight_per_combo: f64) -> Self {
        Self { name: name.into(), attribute: attribute.into(), combos: Vec::new(), weight_per_combo }
    }

    #[must_use]
    pub fn combo(mut self, entries: &[&str]) -> Self {
        self.combos.push(entries.iter().map(|entry| (*entry).to_string()).collect());
        self
    }

    fn present<'a>(&'a self, record: &'a MetricRecord) -> impl Iterator<Item = &'a Vec<String>> + 'a {
        let entries = record.list(&self.attribute).unwrap_or_default();
        self.combos.iter().filter(move |combo| combo.iter().all(|code| entries.contains(code)))
    }
}

impl Rule for Combination {
    fn name(&self) -> &str {
        &self.name
    }

    fn weight(&self, record: &MetricRecord, _ctx: &mut EvalContext) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let matched = self.present(record).count() as f64;
        matched * self.weight_per_combo
    }

    fn reason(&self, record: &MetricRecord, _ctx: &EvalContext) -> Option<String> {
        let matched: Vec<String> = self.present(record).map(|combo| combo.join(" + ")).collect();
        (!matched.is_empty()).then(|| format!("Suspicious combination: {}", matched.join("; ")))
    }
}

/// Bounded noise in `[0, max)` drawn from the context's random source.
#[derive(Debug, Clone)]
pub struct Jitter {
    name: String,
    max: f64,
}

impl Jitter {
    #[must_use]
    pub fn new(name: impl Into<String>, max: f64) -> Self {
        Self { name: name.into(), max }
    }
}

impl Rule for Jitter {
    fn name(&self) -> &str {
        &self.name
    }

    fn weight(&self, _record: &MetricRecord, ctx: &mut EvalContext) -> f64 {
        ctx.draw_unit() * self.max
    }

    fn reason(&self, _record: &MetricRecord, _ctx: &EvalContext) -> Option<String> {
        None
    }

    fn uses_randomness(&self) -> bool {
        true
    }
}
