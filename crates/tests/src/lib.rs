//! Integration Tests for the Beacon engine
//!
//! This crate contains various test modules:
//!
//! - `scenario_tests`: End-to-end scoring scenarios for triage, fraud, risk and occupancy
//! - `lifecycle_tests`: Alert deduplication, transitions, auto-resolve and retention
//! - `aggregator_tests`: Network summaries over synthetic history and concurrent ingestion
//! - `monitor_tests`: The polling monitor against replayed and failing sources
//! - `fixtures`: Reusable record builders
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --package tests
//! ```

#[cfg(test)]
mod scenario_tests;

#[cfg(test)]
mod lifecycle_tests;

#[cfg(test)]
mod aggregator_tests;

#[cfg(test)]
mod monitor_tests;

/// Record builders shared by the test modules
pub mod fixtures;
