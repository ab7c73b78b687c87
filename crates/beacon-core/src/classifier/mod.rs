//! Score classification into ordered tiers.
//!
//! Each domain registers a [`TierTable`]: tiers ordered from most to least
//! severe, each with a lower boundary that is inclusive (`>=`) or exclusive
//! (`>`) depending on the domain. Classification scans the table top-down and
//! returns the first tier that admits the score, so ties go to the more severe
//! tier.
//!
//! Tables may also declare [`Signal`]s, named booleans derived from the score
//! independently of the tier (FRAUD's `fraud_detected`).

pub mod tables;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{
    errors::EngineError,
    types::{AttributeValue, Domain},
};

/// Lower score boundary of a tier or signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub value: f64,
    pub inclusive: bool,
}

impl Boundary {
    /// `score >= value`
    #[must_use]
    pub const fn at_least(value: f64) -> Self {
        Self { value, inclusive: true }
    }

    /// `score > value`
    #[must_use]
    pub const fn above(value: f64) -> Self {
        Self { value, inclusive: false }
    }

    /// Admits every non-negative score. Used by bottom tiers.
    #[must_use]
    pub const fn floor() -> Self {
        Self::at_least(0.0)
    }

    #[must_use]
    pub fn admits(&self, score: f64) -> bool {
        if self.inclusive {
            score >= self.value
        } else {
            score > self.value
        }
    }
}

/// One classification bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub name: String,
    /// Severity rank assigned by the table; the bottom tier is 0.
    pub rank: u8,
    pub boundary: Boundary,
    pub recommended_actions: Vec<String>,
    /// Domain-specific side attributes (`wait_time_minutes`, `audit_priority`, ...).
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Tier {
    #[must_use]
    pub fn new(name: impl Into<String>, boundary: Boundary) -> Self {
        Self {
            name: name.into(),
            rank: 0,
            boundary,
            recommended_actions: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.recommended_actions.push(action.into());
        self
    }

    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// Named boolean derived from the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub boundary: Boundary,
    /// Actions added to the classification when the signal is raised.
    pub actions: Vec<String>,
    /// When raised, the tier's actions are dropped.
    #[serde(default)]
    pub replaces_tier_actions: bool,
}

impl Signal {
    #[must_use]
    pub fn new(name: impl Into<String>, boundary: Boundary) -> Self {
        Self { name: name.into(), boundary, actions: Vec::new(), replaces_tier_actions: false }
    }

    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    /// A raised signal's actions take the place of the tier's actions.
    #[must_use]
    pub fn replacing_tier_actions(mut self) -> Self {
        self.replaces_tier_actions = true;
        self
    }
}

/// Result of classifying one score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub domain: Domain,
    pub score: f64,
    pub tier: Tier,
    /// Every declared signal, raised or not.
    pub signals: BTreeMap<String, bool>,
    /// Raised signal actions first, then tier actions, without duplicates.
    /// Tier actions are left out when a raised signal replaces them.
    pub actions: Vec<String>,
}

impl Classification {
    #[must_use]
    pub fn tier_name(&self) -> &str {
        &self.tier.name
    }

    /// Whether the named signal is raised. Unknown signals read as `false`.
    #[must_use]
    pub fn signal(&self, name: &str) -> bool {
        self.signals.get(name).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.tier.attributes.get(name)
    }
}

/// Validated, ordered tiers for one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierTable {
    domain: Domain,
    tiers: Vec<Tier>,
    signals: Vec<Signal>,
}

impl TierTable {
    /// Builds a table from tiers ordered most to least severe and assigns ranks.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidTierTable`] when the table is empty, names repeat,
    /// boundaries increase going down the table, two tiers share an identical
    /// boundary, or the bottom tier does not admit a score of 0.
    pub fn new(domain: Domain, mut tiers: Vec<Tier>) -> Result<Self, EngineError> {
        let invalid = |msg: String| EngineError::InvalidTierTable(format!("{domain}: {msg}"));

        let Some(bottom) = tiers.last() else {
            return Err(invalid("at least one tier is required".to_string()));
        };
        if !bottom.boundary.admits(0.0) {
            return Err(invalid(format!("bottom tier {} must admit a score of 0", bottom.name)));
        }
        let count = u8::try_from(tiers.len())
            .map_err(|_| invalid(format!("too many tiers ({})", tiers.len())))?;

        let mut names = HashSet::new();
        for tier in &tiers {
            if !names.insert(tier.name.as_str()) {
                return Err(invalid(format!("duplicate tier name {}", tier.name)));
            }
            if tier.boundary.value.is_nan() {
                return Err(invalid(format!("tier {} has a NaN boundary", tier.name)));
            }
        }

        for pair in tiers.windows(2) {
            let (upper, lower) = (&pair[0], &pair[1]);
            if upper.boundary.value < lower.boundary.value {
                return Err(invalid(format!(
                    "tier {} ({}) is below the less severe tier {} ({})",
                    upper.name, upper.boundary.value, lower.name, lower.boundary.value
                )));
            }
            let shadowed = upper.boundary.inclusive || !lower.boundary.inclusive;
            if upper.boundary.value == lower.boundary.value && shadowed {
                return Err(invalid(format!(
                    "tier {} is unreachable behind {}",
                    lower.name, upper.name
                )));
            }
        }

        for (rank, tier) in (0..count).zip(tiers.iter_mut().rev()) {
            tier.rank = rank;
        }

        Ok(Self { domain, tiers, signals: Vec::new() })
    }

    #[must_use]
    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signals.push(signal);
        self
    }

    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Tiers ordered most to least severe.
    #[must_use]
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    #[must_use]
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    #[must_use]
    pub fn tier(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|tier| tier.name.eq_ignore_ascii_case(name))
    }

    /// Classifies a score. Scores no tier admits (negative, NaN) fall to the
    /// bottom tier.
    #[must_use]
    pub fn classify(&self, score: f64) -> Classification {
        let tier = self
            .tiers
            .iter()
            .find(|tier| tier.boundary.admits(score))
            .or_else(|| self.tiers.last())
            .cloned()
            .unwrap_or_else(|| Tier::new("UNCLASSIFIED", Boundary::floor()));

        let mut signals = BTreeMap::new();
        let mut actions: Vec<String> = Vec::new();
        let mut keep_tier_actions = true;
        for signal in &self.signals {
            let raised = signal.boundary.admits(score);
            signals.insert(signal.name.clone(), raised);
            if raised {
                actions.extend(signal.actions.iter().cloned());
                keep_tier_actions &= !signal.replaces_tier_actions;
            }
        }
        if keep_tier_actions {
            actions.extend(tier.recommended_actions.iter().cloned());
        }

        let mut seen = HashSet::new();
        actions.retain(|action| seen.insert(action.clone()));

        Classification { domain: self.domain, score, tier, signals, actions }
    }
}

/// Tier tables for every registered domain.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    tables: HashMap<Domain, TierTable>,
}

impl Classifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifier with the built-in table of every [`Domain`].
    ///
    /// # Errors
    ///
    /// Propagates tier table validation failures.
    pub fn builtin() -> Result<Self, EngineError> {
        let mut classifier = Self::new();
        for table in tables::all()? {
            classifier.register(table);
        }
        Ok(classifier)
    }

    /// Registers a table, replacing any existing one for its domain.
    pub fn register(&mut self, table: TierTable) -> Option<TierTable> {
        self.tables.insert(table.domain(), table)
    }

    /// Maps a score to its tier for `domain`.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownDomain`] if no table is registered for the domain.
    pub fn classify(&self, domain: Domain, score: f64) -> Result<Classification, EngineError> {
        self.table(domain)
            .map(|table| table.classify(score))
            .ok_or_else(|| EngineError::UnknownDomain(domain.to_string()))
    }

    #[must_use]
    pub fn table(&self, domain: Domain) -> Option<&TierTable> {
        self.tables.get(&domain)
    }

    /// Severity rank of a tier by name (case-insensitive).
    #[must_use]
    pub fn rank_of(&self, domain: Domain, tier: &str) -> Option<u8> {
        self.table(domain)?.tier(tier).map(|tier| tier.rank)
    }

    #[must_use]
    pub fn has_domain(&self, domain: Domain) -> bool {
        self.tables.contains_key(&domain)
    }
}
