//! Engine facade: routing, scoring, classification and alerting in one call.
//!
//! [`Engine::submit`] is the ingest path used by every collaborator:
//!
//! 1. route the record kind to a domain
//! 2. evaluate the domain's rule set ([`ScoringEngine`])
//! 3. ingest the record into the [`Aggregator`]
//! 4. classify the score ([`Classifier`])
//! 5. apply the classification to the alert store ([`AlertManager`])
//!
//! Records are evaluated at their own `observed_at`, so a late record for a
//! subject with a live alert is recognized as stale instead of overwriting a
//! newer evaluation.
//!
//! # Examples
//!
//! ```
//! use beacon_core::{
//!     engine::Engine,
//!     types::{MetricRecord, RecordKind},
//! };
//!
//! let engine = Engine::builder().build().unwrap();
//!
//! let record = MetricRecord::builder("PAT-1", RecordKind::Symptoms)
//!     .attribute("symptoms", ["chest_pain", "breathing_difficulty"])
//!     .attribute("oxygen_saturation", 88.0)
//!     .attribute("age", 70.0)
//!     .build();
//!
//! let assessment = engine.submit(record).unwrap();
//! assert_eq!(assessment.classification.tier_name(), "EMERGENCY");
//! assert!(assessment.alert.is_some());
//! ```

pub mod builder;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    aggregator::{Aggregator, NetworkSummary, Window},
    alerts::{Alert, AlertFilter, AlertManager, AlertOutcome},
    classifier::{Classification, Classifier},
    errors::EngineError,
    metrics::EngineMetrics,
    rules::{EvalContext, RandomPolicy, RuleSet},
    scoring::{ScoreResult, ScoringEngine},
    types::{Domain, MetricRecord, RecordKind},
};

pub use builder::{BuildError, EngineBuilder};

/// Everything the engine concluded about one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub result: ScoreResult,
    pub classification: Classification,
    /// Alert store outcome: `opened`, `updated`, `auto_resolved`, `stale` or
    /// `not_raised`.
    pub outcome: String,
    /// The alert the result opened, updated or resolved, if any.
    pub alert: Option<Alert>,
}

impl Assessment {
    #[must_use]
    pub fn raised_alert(&self) -> bool {
        self.alert.is_some()
    }
}

/// Routes records to rule sets, classifies the scores and tracks alerts.
///
/// Built with [`EngineBuilder`]. All methods take `&self`; share the engine
/// behind an `Arc` between tasks.
#[derive(Debug)]
pub struct Engine {
    rule_sets: HashMap<Domain, RuleSet>,
    routes: HashMap<RecordKind, Domain>,
    classifier: Classifier,
    alerts: AlertManager,
    aggregator: Aggregator,
    random: RandomPolicy,
    metrics: EngineMetrics,
}

impl Engine {
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Scores a record in the domain its kind is routed to.
    ///
    /// # Errors
    ///
    /// [`EngineError::Unrouted`] if the kind has no route, otherwise the
    /// errors of [`submit_to`](Self::submit_to).
    pub fn submit(&self, record: MetricRecord) -> Result<Assessment, EngineError> {
        let domain = self.route(record.kind).ok_or(EngineError::Unrouted { kind: record.kind })?;
        self.submit_to(domain, record)
    }

    /// Scores a record in an explicit domain.
    ///
    /// The record is ingested into the aggregator only when evaluation succeeds.
    ///
    /// # Errors
    ///
    /// - [`EngineError::UnknownDomain`] if the domain has no rule set or tier table
    /// - [`EngineError::SchemaMismatch`] if the domain does not accept the kind
    /// - [`EngineError::RandomnessNotSeeded`] if the domain draws randomness and
    ///   the random policy is disabled
    pub fn submit_to(&self, domain: Domain, record: MetricRecord) -> Result<Assessment, EngineError> {
        let rule_set =
            self.rule_sets.get(&domain).ok_or_else(|| EngineError::UnknownDomain(domain.to_string()))?;

        let mut ctx =
            EvalContext::at(record.observed_at).with_boxed_random(self.random.source_for(&record));
        let result = ScoringEngine::evaluate(rule_set, &record, &mut ctx)
            .inspect_err(|e| self.metrics.record_evaluation_error(domain, e))?;
        let classification = self
            .classifier
            .classify(domain, result.score)
            .inspect_err(|e| self.metrics.record_evaluation_error(domain, e))?;

        self.metrics.record_ingested(record.kind);
        self.aggregator.ingest(record);

        let outcome = self.alerts.observe(&result, &classification.tier);
        self.metrics.record_evaluation(domain, classification.tier_name());
        if !matches!(outcome, AlertOutcome::NotRaised) {
            self.metrics.record_alert_transition(domain, outcome.as_metric_str());
            self.metrics.set_live_alerts(self.alerts.live_count());
        }

        debug!(
            subject_id = %result.subject_id,
            domain = %domain,
            score = result.score,
            tier = %classification.tier_name(),
            outcome = outcome.as_metric_str(),
            "record assessed"
        );

        Ok(Assessment {
            outcome: outcome.as_metric_str().to_string(),
            alert: outcome.into_alert(),
            result,
            classification,
        })
    }

    /// Alerts matching `filter`, newest first.
    #[must_use]
    pub fn list_alerts(&self, filter: &AlertFilter) -> Vec<Alert> {
        self.alerts.list_alerts(filter)
    }

    #[must_use]
    pub fn get_alert(&self, alert_id: &str) -> Option<Alert> {
        self.alerts.get_alert(alert_id)
    }

    /// # Errors
    ///
    /// [`EngineError::InvalidTransition`] if the alert does not exist or is resolved.
    pub fn acknowledge(&self, alert_id: &str, actor: &str) -> Result<Alert, EngineError> {
        let alert = self.alerts.acknowledge(alert_id, actor)?;
        self.metrics.record_alert_transition(alert.domain, "acknowledged");
        Ok(alert)
    }

    /// # Errors
    ///
    /// [`EngineError::InvalidTransition`] if the alert does not exist or is resolved.
    pub fn resolve(&self, alert_id: &str, actor: &str) -> Result<Alert, EngineError> {
        let alert = self.alerts.resolve(alert_id, actor)?;
        self.metrics.record_alert_transition(alert.domain, "resolved");
        self.metrics.set_live_alerts(self.alerts.live_count());
        Ok(alert)
    }

    #[must_use]
    pub fn summarize(&self, kind: RecordKind, window: Window) -> NetworkSummary {
        self.aggregator.summarize(kind, window)
    }

    /// Domain records of `kind` are routed to by [`submit`](Self::submit).
    #[must_use]
    pub fn route(&self, kind: RecordKind) -> Option<Domain> {
        self.routes.get(&kind).copied()
    }

    #[must_use]
    pub fn rule_set(&self, domain: Domain) -> Option<&RuleSet> {
        self.rule_sets.get(&domain)
    }

    #[must_use]
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    #[must_use]
    pub fn alerts(&self) -> &AlertManager {
        &self.alerts
    }

    #[must_use]
    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    #[must_use]
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    #[must_use]
    pub fn random_policy(&self) -> RandomPolicy {
        self.random
    }
}
