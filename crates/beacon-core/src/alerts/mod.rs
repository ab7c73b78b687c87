//! Alert lifecycle for above-floor classifications.
//!
//! ## Components
//!
//! - **[`AlertManager`]**: store plus OPEN → ACKNOWLEDGED → RESOLVED state machine
//! - **[`Alert`]**: one ongoing condition for a subject and domain
//! - **[`AlertPolicy`]**: per-domain floors, auto-resolve flag and retention bound
//! - **[`AlertFilter`]**: query filter for listing alerts
//!
//! ## Usage
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use beacon_core::{
//!     alerts::{AlertFilter, AlertManager, AlertPolicy, AlertState},
//!     classifier::Classifier,
//!     rules::{builtin, EvalContext},
//!     scoring::ScoringEngine,
//!     types::{Domain, MetricRecord, RecordKind},
//! };
//!
//! let classifier = Classifier::builtin().unwrap();
//! let floor = classifier.rank_of(Domain::OccupancyAlert, "WARNING").unwrap();
//! let manager = AlertManager::new(AlertPolicy {
//!     floors: HashMap::from([(Domain::OccupancyAlert, floor)]),
//!     ..AlertPolicy::default()
//! });
//!
//! let rules = builtin::occupancy_rules().unwrap();
//! let record = MetricRecord::builder("HOSP006", RecordKind::Occupancy)
//!     .attribute("occupancy_rate", 96.0)
//!     .build();
//! let result = ScoringEngine::evaluate(&rules, &record, &mut EvalContext::new()).unwrap();
//! let classification = classifier.classify(Domain::OccupancyAlert, result.score).unwrap();
//!
//! let alert = manager.observe(&result, &classification.tier).into_alert().unwrap();
//! assert_eq!(alert.state, AlertState::Open);
//!
//! manager.acknowledge(&alert.id, "bed-manager").unwrap();
//! manager.resolve(&alert.id, "bed-manager").unwrap();
//! assert!(manager.list_alerts(&AlertFilter::new().state(AlertState::Open)).is_empty());
//! ```

pub mod manager;
pub mod types;

pub use manager::AlertManager;
pub use types::{
    Alert, AlertFilter, AlertOutcome, AlertPolicy, AlertState, AUTO_RESOLVE_ACTOR,
    DEFAULT_MAX_ALERTS,
};
