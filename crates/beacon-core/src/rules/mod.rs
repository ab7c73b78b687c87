//! Weighted rules and the rule sets that group them per domain.
//!
//! A [`Rule`] maps a record to a weight contribution and an optional reason.
//! A [`RuleSet`] is the ordered, immutable collection of rules for one
//! [`Domain`], built once at start-up through [`RuleSetBuilder`].
//!
//! Generic rule shapes live in [`kinds`]; the heuristic weight tables for each
//! domain are in [`builtin`].

pub mod builtin;
pub mod kinds;
pub mod random;

use chrono::{DateTime, Utc};
use std::{collections::HashSet, fmt};

use crate::{
    errors::EngineError,
    types::{Domain, MetricRecord, RecordKind},
};

pub use random::{EntropyRandom, FixedRandom, RandomPolicy, RandomSource, SeededRandom};

/// Evaluation context passed to every rule.
#[derive(Debug)]
pub struct EvalContext {
    now: DateTime<Utc>,
    random: Option<Box<dyn RandomSource>>,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalContext {
    /// Context evaluated now, without a random source.
    #[must_use]
    pub fn new() -> Self {
        Self { now: Utc::now(), random: None }
    }

    /// Context with a fixed evaluation time.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now, random: None }
    }

    #[must_use]
    pub fn with_random(mut self, source: impl RandomSource + 'static) -> Self {
        self.random = Some(Box::new(source));
        self
    }

    #[must_use]
    pub fn with_boxed_random(mut self, source: Option<Box<dyn RandomSource>>) -> Self {
        self.random = source;
        self
    }

    /// Shorthand for a context carrying a [`SeededRandom`].
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new().with_random(SeededRandom::new(seed))
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    #[must_use]
    pub fn has_random(&self) -> bool {
        self.random.is_some()
    }

    /// Draws from the random source, or `0.0` when there is none.
    pub fn draw_unit(&mut self) -> f64 {
        self.random.as_mut().map_or(0.0, |source| source.next_unit())
    }
}

/// A named weight contribution.
///
/// Rules must be deterministic for identical inputs unless
/// [`uses_randomness`](Rule::uses_randomness) returns `true`, in which case
/// they may only draw from the context's random source.
pub trait Rule: Send + Sync + fmt::Debug {
    /// Unique name within the rule set.
    fn name(&self) -> &str;

    /// Contribution of this rule to the score; `0.0` when it does not fire.
    fn weight(&self, record: &MetricRecord, ctx: &mut EvalContext) -> f64;

    /// Human-readable justification, if the rule fired and has one.
    fn reason(&self, record: &MetricRecord, ctx: &EvalContext) -> Option<String>;

    fn uses_randomness(&self) -> bool {
        false
    }
}

/// Ordered rules for one domain.
#[derive(Debug)]
pub struct RuleSet {
    domain: Domain,
    accepts: Vec<RecordKind>,
    rules: Vec<Box<dyn Rule>>,
    ceiling: Option<f64>,
}

impl RuleSet {
    #[must_use]
    pub fn builder(domain: Domain) -> RuleSetBuilder {
        RuleSetBuilder { domain, accepts: Vec::new(), rules: Vec::new(), ceiling: None }
    }

    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    #[must_use]
    pub fn accepts(&self, kind: RecordKind) -> bool {
        self.accepts.contains(&kind)
    }

    #[must_use]
    pub fn accepted_kinds(&self) -> &[RecordKind] {
        &self.accepts
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(AsRef::as_ref)
    }

    /// Upper clamp applied to the total score, if any.
    #[must_use]
    pub fn ceiling(&self) -> Option<f64> {
        self.ceiling
    }

    #[must_use]
    pub fn requires_randomness(&self) -> bool {
        self.rules.iter().any(|rule| rule.uses_randomness())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Builder for [`RuleSet`].
#[derive(Debug)]
pub struct RuleSetBuilder {
    domain: Domain,
    accepts: Vec<RecordKind>,
    rules: Vec<Box<dyn Rule>>,
    ceiling: Option<f64>,
}

impl RuleSetBuilder {
    #[must_use]
    pub fn accept(mut self, kind: RecordKind) -> Self {
        if !self.accepts.contains(&kind) {
            self.accepts.push(kind);
        }
        self
    }

    #[must_use]
    pub fn rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    #[must_use]
    pub fn ceiling(mut self, ceiling: f64) -> Self {
        self.ceiling = Some(ceiling);
        self
    }

    /// Validates and builds the rule set.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidRuleSet`] if no record kind is accepted, a rule
    /// name repeats, or the ceiling is not a positive finite number.
    pub fn build(self) -> Result<RuleSet, EngineError> {
        if self.accepts.is_empty() {
            return Err(EngineError::InvalidRuleSet(format!(
                "{} rule set accepts no record kinds",
                self.domain
            )));
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.name()) {
                return Err(EngineError::InvalidRuleSet(format!(
                    "duplicate rule name '{}' in {} rule set",
                    rule.name(),
                    self.domain
                )));
            }
        }

        if let Some(ceiling) = self.ceiling {
            if !ceiling.is_finite() || ceiling <= 0.0 {
                return Err(EngineError::InvalidRuleSet(format!(
                    "{} score ceiling must be positive, got {ceiling}",
                    self.domain
                )));
            }
        }

        Ok(RuleSet {
            domain: self.domain,
            accepts: self.accepts,
            rules: self.rules,
            ceiling: self.ceiling,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{kinds::Jitter, *};

    #[derive(Debug)]
    struct Constant(&'static str);

    impl Rule for Constant {
        fn name(&self) -> &str {
            self.0
        }

        fn weight(&self, _record: &MetricRecord, _ctx: &mut EvalContext) -> f64 {
            1.0
        }

        fn reason(&self, _record: &MetricRecord, _ctx: &EvalContext) -> Option<String> {
            None
        }
    }

    #[test]
    fn test_duplicate_rule_names_rejected() {
        let err = RuleSet::builder(Domain::Triage)
            .accept(RecordKind::Symptoms)
            .rule(Constant("fever"))
            .rule(Constant("fever"))
            .build()
            .unwrap_err();

        assert!(matches!(err, EngineError::InvalidRuleSet(msg) if msg.contains("fever")));
    }

    #[test]
    fn test_rule_set_requires_accepted_kind() {
        let err = RuleSet::builder(Domain::Risk).rule(Constant("age")).build().unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_invalid_ceiling_rejected() {
        let result = RuleSet::builder(Domain::Risk)
            .accept(RecordKind::Conditions)
            .ceiling(0.0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_requires_randomness_detects_jitter() {
        let plain = RuleSet::builder(Domain::Fraud)
            .accept(RecordKind::Billing)
            .rule(Constant("amount"))
            .build()
            .unwrap();
        assert!(!plain.requires_randomness());

        let noisy = RuleSet::builder(Domain::Fraud)
            .accept(RecordKind::Billing)
            .rule(Constant("amount"))
            .rule(Jitter::new("pattern", 15.0))
            .build()
            .unwrap();
        assert!(noisy.requires_randomness());
        assert_eq!(noisy.rules().map(|rule| rule.name()).collect::<Vec<_>>(), vec!["amount", "pattern"]);
    }

    #[test]
    fn test_context_without_random_draws_zero() {
        let mut ctx = EvalContext::new();
        assert!(!ctx.has_random());
        assert!(ctx.draw_unit().abs() < f64::EPSILON);

        let mut ctx = EvalContext::new().with_random(FixedRandom::new(0.5));
        assert!((ctx.draw_unit() - 0.5).abs() < f64::EPSILON);
    }
}
