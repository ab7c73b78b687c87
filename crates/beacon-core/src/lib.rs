//! # Beacon Core
//!
//! Scoring, classification and alerting engine for a hospital network.
//!
//! This crate provides the foundational components for:
//!
//! - **[`rules`]**: Named weighted rules grouped into per-domain rule sets, including the
//!   built-in triage, fraud, risk, occupancy and inventory weight tables.
//!
//! - **[`scoring`]**: Rule set evaluation into a score with fired reasons and per-rule
//!   contributions.
//!
//! - **[`classifier`]**: Monotonic tier tables mapping scores to tiers, recommended actions
//!   and side attributes (wait times, audit priority, monitoring frequency).
//!
//! - **[`alerts`]**: Alert lifecycle (OPEN → ACKNOWLEDGED → RESOLVED) with per subject and
//!   domain deduplication.
//!
//! - **[`aggregator`]**: Bounded per-kind, per-subject record windows and network summaries.
//!
//! - **[`engine`]**: The facade tying the above together behind `submit`.
//!
//! - **[`source`]** and **[`runtime`]**: Record sources and the periodic monitor loop.
//!
//! - **[`config`]** and **[`metrics`]**: Layered configuration and Prometheus metrics.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────────────────────────────────────┐
//! │ RecordSource │────►│                      Engine                      │
//! │  (Monitor)   │     │                                                  │
//! └──────────────┘     │  route kind ─► RuleSet ─► ScoringEngine          │
//!                      │                               │                  │
//!                      │        ┌──────────────────────┼──────────┐       │
//!                      │        ▼                      ▼          │       │
//!                      │   Aggregator             Classifier      │       │
//!                      │   (summaries)                 │          │       │
//!                      │                               ▼          │       │
//!                      │                        AlertManager ◄────┘       │
//!                      └──────────────────────────────────────────────────┘
//! ```

pub mod aggregator;
pub mod alerts;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod rules;
pub mod runtime;
pub mod scoring;
pub mod source;
pub mod types;

pub use engine::{Assessment, Engine, EngineBuilder};
pub use errors::EngineError;
pub use types::{AttributeValue, Domain, MetricRecord, RecordKind};
