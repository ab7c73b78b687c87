//! Alert type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

use crate::{classifier::Tier, scoring::ScoreResult, types::Domain};

/// Actor recorded when an alert is resolved because its tier fell below the floor.
pub const AUTO_RESOLVE_ACTOR: &str = "system:auto-resolve";

/// Default retention bound for the alert store.
pub const DEFAULT_MAX_ALERTS: usize = 1000;

/// Lifecycle state of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertState {
    /// Raised and not yet seen by an operator.
    Open,
    /// Seen by an operator, condition still ongoing.
    Acknowledged,
    /// Closed. Terminal.
    Resolved,
}

impl AlertState {
    /// Returns `true` for OPEN and ACKNOWLEDGED alerts.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Resolved)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Acknowledged => "ACKNOWLEDGED",
            Self::Resolved => "RESOLVED",
        }
    }
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlertState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "ACKNOWLEDGED" => Ok(Self::Acknowledged),
            "RESOLVED" => Ok(Self::Resolved),
            other => Err(format!("Unknown alert state: {other}")),
        }
    }
}

/// An ongoing (or closed) above-floor condition for one subject and domain.
///
/// `opened_at`, `last_evaluated_at` and auto-resolve stamps are record time
/// (the result's `evaluated_at`). Operator acknowledge and resolve stamps are
/// wall-clock time, so replayed history can show an operator action dated
/// before the alert opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub subject_id: String,
    pub domain: Domain,
    /// Tier name of the latest evaluation.
    pub tier: String,
    /// Severity rank of `tier`; higher is more severe.
    pub tier_rank: u8,
    pub score: f64,
    /// Reasons from the latest evaluation only.
    pub reasons: Vec<String>,
    pub state: AlertState,
    pub opened_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `evaluated_at` of the result last applied; older results are stale.
    pub last_evaluated_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}

impl Alert {
    /// Opens a new alert from a score result and its tier.
    #[must_use]
    pub fn open(id: String, result: &ScoreResult, tier: &Tier) -> Self {
        Self {
            id,
            subject_id: result.subject_id.clone(),
            domain: result.domain,
            tier: tier.name.clone(),
            tier_rank: tier.rank,
            score: result.score,
            reasons: result.fired_reasons.clone(),
            state: AlertState::Open,
            opened_at: result.evaluated_at,
            updated_at: result.evaluated_at,
            last_evaluated_at: result.evaluated_at,
            acknowledged_at: None,
            acknowledged_by: None,
            resolved_at: None,
            resolved_by: None,
        }
    }

    /// Replaces score, tier and reasons with a newer evaluation. State and
    /// `opened_at` are left alone.
    pub fn apply(&mut self, result: &ScoreResult, tier: &Tier) {
        self.tier = tier.name.clone();
        self.tier_rank = tier.rank;
        self.score = result.score;
        self.reasons = result.fired_reasons.clone();
        self.updated_at = self.updated_at.max(result.evaluated_at);
        self.last_evaluated_at = result.evaluated_at;
    }

    /// Marks the alert acknowledged. The first acknowledger is kept.
    pub(crate) fn acknowledge(&mut self, actor: &str, at: DateTime<Utc>) {
        self.state = AlertState::Acknowledged;
        if self.acknowledged_by.is_none() {
            self.acknowledged_by = Some(actor.to_string());
            self.acknowledged_at = Some(at);
        }
        self.updated_at = at;
    }

    pub(crate) fn resolve(&mut self, actor: &str, at: DateTime<Utc>) {
        self.state = AlertState::Resolved;
        self.resolved_by = Some(actor.to_string());
        self.resolved_at = Some(at);
        self.updated_at = at;
    }
}

/// Query filter for [`AlertManager::list_alerts`](super::AlertManager::list_alerts).
///
/// Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertFilter {
    pub state: Option<AlertState>,
    pub domain: Option<Domain>,
    pub subject_id: Option<String>,
}

impl AlertFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(mut self, state: AlertState) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    #[must_use]
    pub fn subject(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    #[must_use]
    pub fn matches(&self, alert: &Alert) -> bool {
        self.state.is_none_or(|state| alert.state == state) &&
            self.domain.is_none_or(|domain| alert.domain == domain) &&
            self.subject_id.as_deref().is_none_or(|subject| alert.subject_id == subject)
    }
}

/// Alerting policy applied by the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertPolicy {
    /// Minimum tier rank that raises an alert, per domain. Domains without a
    /// floor never raise alerts.
    pub floors: HashMap<Domain, u8>,
    /// Resolve a live alert when a newer result falls below the floor.
    pub auto_resolve_below_floor: bool,
    /// Retention bound; only resolved alerts are evicted to honor it.
    pub max_alerts: usize,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            floors: HashMap::new(),
            auto_resolve_below_floor: false,
            max_alerts: DEFAULT_MAX_ALERTS,
        }
    }
}

impl AlertPolicy {
    #[must_use]
    pub fn floor(&self, domain: Domain) -> Option<u8> {
        self.floors.get(&domain).copied()
    }
}

/// What the manager did with a score result.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertOutcome {
    /// A new OPEN alert was created.
    Opened(Alert),
    /// The live alert was updated in place.
    Updated(Alert),
    /// The live alert was updated and then resolved by the auto-resolve policy.
    AutoResolved(Alert),
    /// The result was older than the last one applied for the subject and
    /// domain; nothing changed. Carries the newest alert for the pair.
    Stale(Alert),
    /// Below the floor with no live alert.
    NotRaised,
}

impl AlertOutcome {
    #[must_use]
    pub fn alert(&self) -> Option<&Alert> {
        match self {
            Self::Opened(alert) |
            Self::Updated(alert) |
            Self::AutoResolved(alert) |
            Self::Stale(alert) => Some(alert),
            Self::NotRaised => None,
        }
    }

    #[must_use]
    pub fn into_alert(self) -> Option<Alert> {
        match self {
            Self::Opened(alert) |
            Self::Updated(alert) |
            Self::AutoResolved(alert) |
            Self::Stale(alert) => Some(alert),
            Self::NotRaised => None,
        }
    }

    #[must_use]
    pub fn as_metric_str(&self) -> &'static str {
        match self {
            Self::Opened(_) => "opened",
            Self::Updated(_) => "updated",
            Self::AutoResolved(_) => "auto_resolved",
            Self::Stale(_) => "stale",
            Self::NotRaised => "not_raised",
        }
    }
}
