//! Rule evaluation into a single score.
//!
//! [`ScoringEngine::evaluate`] runs every rule of a [`RuleSet`] in declaration
//! order, sums the non-zero contributions and collects the reasons of the rules
//! that fired. There is no short-circuiting: symptom, vital sign, age and history
//! factors always stack.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    errors::EngineError,
    rules::{EvalContext, RuleSet},
    types::{Domain, MetricRecord},
};

/// One non-zero rule contribution, kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub rule: String,
    pub weight: f64,
}

/// Outcome of evaluating a rule set against one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Sum of contributions, floored at 0 and clamped to the rule set's ceiling.
    pub score: f64,
    /// Reasons of fired rules, in rule evaluation order.
    pub fired_reasons: Vec<String>,
    pub subject_id: String,
    pub domain: Domain,
    pub evaluated_at: DateTime<Utc>,
    /// Non-zero contributions in rule evaluation order, before clamping.
    #[serde(default)]
    pub contributions: Vec<Contribution>,
}

impl ScoreResult {
    /// Sum of contributions before flooring and clamping.
    #[must_use]
    pub fn raw_score(&self) -> f64 {
        self.contributions.iter().map(|c| c.weight).sum()
    }

    #[must_use]
    pub fn contribution(&self, rule: &str) -> Option<f64> {
        self.contributions.iter().find(|c| c.rule == rule).map(|c| c.weight)
    }
}

/// Stateless rule set evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    /// Evaluates `rule_set` against `record`.
    ///
    /// Pure apart from drawing from the context's random source.
    ///
    /// # Errors
    ///
    /// - [`EngineError::SchemaMismatch`] if the rule set does not accept the record kind
    /// - [`EngineError::RandomnessNotSeeded`] if the rule set draws random
    ///   contributions and the context has no random source
    pub fn evaluate(
        rule_set: &RuleSet,
        record: &MetricRecord,
        ctx: &mut EvalContext,
    ) -> Result<ScoreResult, EngineError> {
        if !rule_set.accepts(record.kind) {
            return Err(EngineError::SchemaMismatch { domain: rule_set.domain(), kind: record.kind });
        }
        if rule_set.requires_randomness() && !ctx.has_random() {
            return Err(EngineError::RandomnessNotSeeded { domain: rule_set.domain() });
        }

        let mut total = 0.0;
        let mut fired_reasons = Vec::new();
        let mut contributions = Vec::new();

        for rule in rule_set.rules() {
            let weight = rule.weight(record, ctx);
            if weight == 0.0 || !weight.is_finite() {
                continue;
            }

            total += weight;
            contributions.push(Contribution { rule: rule.name().to_string(), weight });
            if let Some(reason) = rule.reason(record, ctx) {
                fired_reasons.push(reason);
            }
        }

        let mut score = total.max(0.0);
        if let Some(ceiling) = rule_set.ceiling() {
            score = score.min(ceiling);
        }

        Ok(ScoreResult {
            score,
            fired_reasons,
            subject_id: record.subject_id.clone(),
            domain: rule_set.domain(),
            evaluated_at: ctx.now(),
            contributions,
        })
    }
}
