//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: `Default` implementations and serde default functions
//! 2. **Config file**: TOML file named by the `BEACON_CONFIG` env var
//!    (default `config/beacon.toml`, optional)
//! 3. **Environment variables**: `BEACON__SECTION__FIELD` overrides, e.g.
//!    `BEACON__MONITOR__INTERVAL_SECONDS=60`
//!
//! # Configuration Sections
//!
//! - [`EngineConfig`]: random policy and kind → domain routes
//! - [`AlertsConfig`]: per-domain alert floors, auto-resolve, retention
//! - [`AggregatorConfig`]: per-kind window capacities
//! - [`MonitorConfig`]: periodic source polling
//! - [`LoggingConfig`]: log level and format
//! - [`MetricsConfig`]: Prometheus exporter
//!
//! Map sections are partial: a domain or kind missing from `floors`, `routes`
//! or `capacities` keeps its built-in value.
//!
//! # Example
//!
//! ```toml
//! [engine]
//! seed = 42
//!
//! [alerts.floors]
//! triage = "EMERGENCY"
//!
//! [aggregator.capacities]
//! billing = 500
//!
//! [monitor]
//! enabled = true
//! interval_seconds = 60
//! ```

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path, time::Duration};

use crate::{
    aggregator::default_capacity,
    alerts::DEFAULT_MAX_ALERTS,
    classifier::Classifier,
    rules::{builtin, RandomPolicy},
    types::{Domain, RecordKind},
};

/// Env var naming the config file.
pub const CONFIG_PATH_ENV: &str = "BEACON_CONFIG";

/// Config file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config/beacon.toml";

/// Domain that scores a record kind when the caller does not name one.
#[must_use]
pub fn default_route(kind: RecordKind) -> Domain {
    match kind {
        RecordKind::Symptoms | RecordKind::Vitals => Domain::Triage,
        RecordKind::Billing => Domain::Fraud,
        RecordKind::Conditions => Domain::Risk,
        RecordKind::Occupancy => Domain::OccupancyAlert,
        RecordKind::Inventory => Domain::InventoryAlert,
    }
}

/// Lowest tier that raises an alert, per domain.
#[must_use]
pub fn default_floor(domain: Domain) -> &'static str {
    match domain {
        Domain::Triage => "URGENT",
        Domain::Fraud | Domain::Risk => "HIGH",
        Domain::OccupancyAlert => "WARNING",
        Domain::InventoryAlert => "LOW_STOCK",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base seed for reproducible randomized rules. Takes precedence over
    /// `allow_entropy`.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Allow OS-entropy randomness when no seed is set. When false and no seed
    /// is set, randomized rule sets fail with `RandomnessNotSeeded`.
    #[serde(default = "default_allow_entropy")]
    pub allow_entropy: bool,

    /// Route overrides, record kind → domain.
    #[serde(default)]
    pub routes: BTreeMap<RecordKind, Domain>,
}

fn default_allow_entropy() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { seed: None, allow_entropy: true, routes: BTreeMap::new() }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn random_policy(&self) -> RandomPolicy {
        match (self.seed, self.allow_entropy) {
            (Some(seed), _) => RandomPolicy::Seeded(seed),
            (None, true) => RandomPolicy::Entropy,
            (None, false) => RandomPolicy::Disabled,
        }
    }

    #[must_use]
    pub fn route(&self, kind: RecordKind) -> Domain {
        self.routes.get(&kind).copied().unwrap_or_else(|| default_route(kind))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertsConfig {
    /// Floor overrides, domain → tier name.
    #[serde(default)]
    pub floors: BTreeMap<Domain, String>,

    /// Resolve a live alert when a newer result drops below the floor.
    #[serde(default)]
    pub auto_resolve_below_floor: bool,

    /// Alert store retention bound (default: 1000).
    #[serde(default = "default_max_alerts")]
    pub max_alerts: usize,
}

fn default_max_alerts() -> usize {
    DEFAULT_MAX_ALERTS
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self { floors: BTreeMap::new(), auto_resolve_below_floor: false, max_alerts: DEFAULT_MAX_ALERTS }
    }
}

impl AlertsConfig {
    #[must_use]
    pub fn floor(&self, domain: Domain) -> &str {
        self.floors.get(&domain).map_or_else(|| default_floor(domain), String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Capacity overrides, record kind → records kept per subject.
    #[serde(default)]
    pub capacities: BTreeMap<RecordKind, usize>,
}

impl AggregatorConfig {
    #[must_use]
    pub fn capacity(&self, kind: RecordKind) -> usize {
        self.capacities.get(&kind).copied().unwrap_or_else(|| default_capacity(kind))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Run the monitor continuously instead of for a fixed number of ticks.
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between source polls (default: 300)
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
}

fn default_interval_seconds() -> u64 {
    300
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { enabled: false, interval_seconds: default_interval_seconds() }
    }
}

impl MonitorConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: default_log_format() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment overrides.
    ///
    /// A missing file is not an error; defaults apply. Environment variables
    /// with the `BEACON__` prefix override any value, using `__` between
    /// nested fields (e.g., `BEACON__ALERTS__MAX_ALERTS=500`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or values have the wrong type.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_builder = Config::builder()
            .set_default("engine.allow_entropy", true)?
            .set_default("alerts.auto_resolve_below_floor", false)?
            .set_default("alerts.max_alerts", 1000)?
            .set_default("monitor.enabled", false)?
            .set_default("monitor.interval_seconds", 300)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .set_default("metrics.enabled", true)?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("BEACON").prefix_separator("__").separator("__"))
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from [`CONFIG_PATH_ENV`], falling back to
    /// [`DEFAULT_CONFIG_PATH`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(&config_path)
    }

    /// Validates the configuration.
    ///
    /// Checks that:
    /// - Alert floors name a tier of their domain
    /// - Routes send each kind to a domain that accepts it
    /// - Capacities, `max_alerts` and the monitor interval are greater than zero
    /// - Logging format is either `"json"` or `"pretty"`
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        let classifier = Classifier::builtin().map_err(|e| e.to_string())?;
        for (domain, tier) in &self.alerts.floors {
            if classifier.rank_of(*domain, tier).is_none() {
                return Err(format!("Unknown alert floor tier '{tier}' for domain {domain}"));
            }
        }

        let rule_sets = builtin::all().map_err(|e| e.to_string())?;
        for (kind, domain) in &self.engine.routes {
            let accepted = rule_sets
                .iter()
                .any(|set| set.domain() == *domain && set.accepts(*kind));
            if !accepted {
                return Err(format!("Route {kind} -> {domain}: domain does not accept {kind} records"));
            }
        }

        if let Some((kind, _)) = self.aggregator.capacities.iter().find(|(_, n)| **n == 0) {
            return Err(format!("Aggregator capacity for {kind} must be greater than 0"));
        }

        if self.alerts.max_alerts == 0 {
            return Err("max_alerts must be greater than 0".to_string());
        }

        if self.monitor.interval_seconds == 0 {
            return Err("Monitor interval must be greater than 0".to_string());
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        Ok(())
    }
}
