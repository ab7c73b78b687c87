use thiserror::Error;

use crate::{
    alerts::{Alert, AlertState},
    types::{Domain, RecordKind},
};

/// Errors returned by the scoring, classification and alerting core.
///
/// The core never logs or swallows these; callers decide how to surface them.
/// [`is_client_error`](Self::is_client_error) separates caller mistakes from
/// configuration failures that should stop start-up.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EngineError {
    /// The record kind is not accepted by the domain's rule set.
    #[error("{kind} records cannot be scored in the {domain} domain")]
    SchemaMismatch { domain: Domain, kind: RecordKind },

    /// No rule set or tier table is registered for the domain.
    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    /// The engine has no domain route for the record kind.
    #[error("No domain is routed for {kind} records")]
    Unrouted { kind: RecordKind },

    /// Alert state machine violation. The alert, if it exists, is returned unchanged.
    #[error("Cannot {action} alert {alert_id}: {}", describe_state(.from))]
    InvalidTransition {
        alert_id: String,
        from: Option<AlertState>,
        action: &'static str,
        current: Option<Box<Alert>>,
    },

    /// A rule set draws random contributions but the context has no random source.
    #[error("The {domain} rule set needs a random source but none was configured")]
    RandomnessNotSeeded { domain: Domain },

    /// Rule set construction failed (e.g., duplicate rule names).
    #[error("Invalid rule set: {0}")]
    InvalidRuleSet(String),

    /// Tier table construction failed (e.g., non-monotonic boundaries).
    #[error("Invalid tier table: {0}")]
    InvalidTierTable(String),
}

fn describe_state(state: &Option<AlertState>) -> String {
    match state {
        Some(state) => format!("alert is {state}"),
        None => "alert does not exist".to_string(),
    }
}

impl EngineError {
    /// Returns `true` for errors caused by caller input rather than configuration.
    ///
    /// Collaborators exposing the engine over HTTP map these to 4xx responses.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::SchemaMismatch { .. } | Self::InvalidTransition { .. } | Self::Unrouted { .. }
        )
    }

    /// Returns `true` for errors that indicate broken start-up configuration.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownDomain(_) |
                Self::RandomnessNotSeeded { .. } |
                Self::InvalidRuleSet(_) |
                Self::InvalidTierTable(_)
        )
    }

    /// Current alert carried by an [`EngineError::InvalidTransition`].
    #[must_use]
    pub fn current_alert(&self) -> Option<&Alert> {
        match self {
            Self::InvalidTransition { current, .. } => current.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_metric_str(&self) -> &'static str {
        match self {
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::UnknownDomain(_) => "unknown_domain",
            Self::Unrouted { .. } => "unrouted",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::RandomnessNotSeeded { .. } => "randomness_not_seeded",
            Self::InvalidRuleSet(_) => "invalid_rule_set",
            Self::InvalidTierTable(_) => "invalid_tier_table",
        }
    }
}
