//! Builder for assembling an [`Engine`] from rule sets, tier tables and policy.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info};

use super::Engine;
use crate::{
    aggregator::Aggregator,
    alerts::{AlertManager, AlertPolicy, DEFAULT_MAX_ALERTS},
    classifier::{Classifier, TierTable},
    config::{default_floor, default_route, AppConfig},
    errors::EngineError,
    metrics::EngineMetrics,
    rules::{builtin, RandomPolicy, RuleSet},
    types::{Domain, RecordKind},
};

/// Errors that can occur while building an engine.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    /// A built-in rule set or tier table failed validation
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A route or floor names a domain without a rule set
    #[error("No rule set registered for domain {0}")]
    MissingRuleSet(Domain),

    /// A route or floor names a domain without a tier table
    #[error("No tier table registered for domain {0}")]
    MissingTierTable(Domain),

    /// A floor names a tier the domain's table does not declare
    #[error("Unknown alert floor tier '{tier}' for domain {domain}")]
    UnknownFloor { domain: Domain, tier: String },

    /// A route sends a kind to a domain whose rule set rejects it
    #[error("Route {kind} -> {domain}: rule set does not accept {kind} records")]
    InvalidRoute { kind: RecordKind, domain: Domain },
}

/// Builder for constructing an [`Engine`].
///
/// Starts from the built-in rule sets and tier tables of every domain, the
/// default kind routes and the default alert floors. Everything can be
/// replaced before [`build`](Self::build) checks the assembly.
///
/// # Examples
///
/// ```
/// use beacon_core::{engine::EngineBuilder, types::Domain};
///
/// let engine = EngineBuilder::new()
///     .with_seed(42)
///     .with_floor(Domain::Triage, "EMERGENCY")
///     .auto_resolve_below_floor(true)
///     .build()
///     .unwrap();
///
/// assert!(engine.rule_set(Domain::Fraud).is_some());
/// ```
#[derive(Debug)]
pub struct EngineBuilder {
    builtin_rules: bool,
    rule_sets: Vec<RuleSet>,
    classifier: Option<Classifier>,
    tier_tables: Vec<TierTable>,
    routes: HashMap<RecordKind, Domain>,
    floors: HashMap<Domain, Option<String>>,
    auto_resolve_below_floor: bool,
    max_alerts: usize,
    random: RandomPolicy,
    capacities: HashMap<RecordKind, usize>,
    metrics_enabled: bool,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            builtin_rules: true,
            rule_sets: Vec::new(),
            classifier: None,
            tier_tables: Vec::new(),
            routes: RecordKind::ALL.into_iter().map(|kind| (kind, default_route(kind))).collect(),
            floors: Domain::ALL
                .into_iter()
                .map(|domain| (domain, Some(default_floor(domain).to_string())))
                .collect(),
            auto_resolve_below_floor: false,
            max_alerts: DEFAULT_MAX_ALERTS,
            random: RandomPolicy::Disabled,
            capacities: HashMap::new(),
            metrics_enabled: false,
        }
    }

    /// Builder seeded from application configuration.
    ///
    /// # Errors
    ///
    /// [`BuildError::ConfigValidation`] if `config.validate()` fails.
    pub fn from_config(config: &AppConfig) -> Result<Self, BuildError> {
        config.validate().map_err(BuildError::ConfigValidation)?;

        let mut builder = Self::new()
            .with_random_policy(config.engine.random_policy())
            .auto_resolve_below_floor(config.alerts.auto_resolve_below_floor)
            .with_max_alerts(config.alerts.max_alerts)
            .enable_metrics(config.metrics.enabled);

        for kind in RecordKind::ALL {
            builder = builder
                .with_route(kind, config.engine.route(kind))
                .with_capacity(kind, config.aggregator.capacity(kind));
        }
        for domain in Domain::ALL {
            builder = builder.with_floor(domain, config.alerts.floor(domain));
        }

        Ok(builder)
    }

    /// Adds a rule set, replacing the one registered for its domain.
    #[must_use]
    pub fn with_rule_set(mut self, rule_set: RuleSet) -> Self {
        self.rule_sets.retain(|existing| existing.domain() != rule_set.domain());
        self.rule_sets.push(rule_set);
        self
    }

    /// Drops the built-in rule sets; only sets added with
    /// [`with_rule_set`](Self::with_rule_set) are used.
    #[must_use]
    pub fn without_builtin_rules(mut self) -> Self {
        self.builtin_rules = false;
        self
    }

    /// Replaces the built-in classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Adds a tier table, replacing the classifier's table for its domain.
    #[must_use]
    pub fn with_tier_table(mut self, table: TierTable) -> Self {
        self.tier_tables.push(table);
        self
    }

    #[must_use]
    pub fn with_route(mut self, kind: RecordKind, domain: Domain) -> Self {
        self.routes.insert(kind, domain);
        self
    }

    /// Records of `kind` are only scored through [`Engine::submit_to`].
    #[must_use]
    pub fn without_route(mut self, kind: RecordKind) -> Self {
        self.routes.remove(&kind);
        self
    }

    /// Sets the lowest tier (by name) that raises an alert for `domain`.
    #[must_use]
    pub fn with_floor(mut self, domain: Domain, tier: impl Into<String>) -> Self {
        self.floors.insert(domain, Some(tier.into()));
        self
    }

    /// Results of `domain` never raise alerts.
    #[must_use]
    pub fn without_floor(mut self, domain: Domain) -> Self {
        self.floors.insert(domain, None);
        self
    }

    #[must_use]
    pub fn auto_resolve_below_floor(mut self, enabled: bool) -> Self {
        self.auto_resolve_below_floor = enabled;
        self
    }

    /// Sets the alert retention bound (default: 1000).
    #[must_use]
    pub fn with_max_alerts(mut self, max_alerts: usize) -> Self {
        self.max_alerts = max_alerts;
        self
    }

    #[must_use]
    pub fn with_random_policy(mut self, policy: RandomPolicy) -> Self {
        self.random = policy;
        self
    }

    /// Shorthand for `with_random_policy(RandomPolicy::Seeded(seed))`.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_random_policy(RandomPolicy::Seeded(seed))
    }

    #[must_use]
    pub fn with_capacity(mut self, kind: RecordKind, capacity: usize) -> Self {
        self.capacities.insert(kind, capacity);
        self
    }

    /// Installs the Prometheus recorder when `enabled`.
    #[must_use]
    pub fn enable_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Returns `BuildError` if a routed or floored domain lacks a rule set or
    /// tier table, a route sends a kind to a domain that rejects it, or a floor
    /// names an unknown tier.
    pub fn build(self) -> Result<Engine, BuildError> {
        if self.max_alerts == 0 {
            return Err(BuildError::ConfigValidation("max_alerts must be greater than 0".to_string()));
        }

        let mut rule_sets: HashMap<Domain, RuleSet> = HashMap::new();
        if self.builtin_rules {
            for set in builtin::all()? {
                rule_sets.insert(set.domain(), set);
            }
        }
        for set in self.rule_sets {
            rule_sets.insert(set.domain(), set);
        }

        let mut classifier = match self.classifier {
            Some(classifier) => classifier,
            None => Classifier::builtin()?,
        };
        for table in self.tier_tables {
            classifier.register(table);
        }

        for (&kind, &domain) in &self.routes {
            let rule_set = rule_sets.get(&domain).ok_or(BuildError::MissingRuleSet(domain))?;
            if !rule_set.accepts(kind) {
                return Err(BuildError::InvalidRoute { kind, domain });
            }
            if !classifier.has_domain(domain) {
                return Err(BuildError::MissingTierTable(domain));
            }
        }

        let mut floors = HashMap::new();
        for (domain, tier) in self.floors {
            let Some(tier) = tier else { continue };
            if !rule_sets.contains_key(&domain) {
                // Unscored domain.
                continue;
            }
            if !classifier.has_domain(domain) {
                return Err(BuildError::MissingTierTable(domain));
            }
            let rank = classifier
                .rank_of(domain, &tier)
                .ok_or_else(|| BuildError::UnknownFloor { domain, tier: tier.clone() })?;
            debug!(domain = %domain, tier = %tier, rank = rank, "alert floor resolved");
            floors.insert(domain, rank);
        }

        info!(
            domains = rule_sets.len(),
            routes = self.routes.len(),
            alerting_domains = floors.len(),
            random_policy = ?self.random,
            auto_resolve_below_floor = self.auto_resolve_below_floor,
            "Initializing engine"
        );

        let alerts = AlertManager::new(AlertPolicy {
            floors,
            auto_resolve_below_floor: self.auto_resolve_below_floor,
            max_alerts: self.max_alerts,
        });

        Ok(Engine {
            rule_sets,
            routes: self.routes,
            classifier,
            alerts,
            aggregator: Aggregator::with_capacities(self.capacities),
            random: self.random,
            metrics: EngineMetrics::new(self.metrics_enabled),
        })
    }
}
