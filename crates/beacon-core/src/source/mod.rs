//! Record supply.
//!
//! The engine never generates or loads records itself; a [`RecordSource`]
//! collaborator hands it batches. [`SyntheticSource`] reproduces the historical
//! generators of the hospital network for demos and tests, [`ReplaySource`]
//! plays back fixed batches.

pub mod synthetic;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use thiserror::Error;

use crate::types::MetricRecord;

pub use synthetic::{SyntheticConfig, SyntheticSource};

/// Errors returned by record sources.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Record source unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid record from source: {0}")]
    InvalidRecord(String),

    #[error("Failed to decode records: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Supplies batches of records to the engine.
///
/// Implementations decide what "next batch" means: a poll of a live feed, a
/// page of a store, a synthetic tick. An empty batch is not an error.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fetches the next batch of records.
    async fn fetch(&self) -> Result<Vec<MetricRecord>, SourceError>;
}

/// Replays fixed batches in order, then returns empty batches.
#[derive(Debug, Default)]
pub struct ReplaySource {
    batches: Mutex<VecDeque<Vec<MetricRecord>>>,
}

impl ReplaySource {
    #[must_use]
    pub fn new(batches: impl IntoIterator<Item = Vec<MetricRecord>>) -> Self {
        Self { batches: Mutex::new(batches.into_iter().collect()) }
    }

    /// Single batch decoded from a JSON array of records.
    ///
    /// # Errors
    ///
    /// [`SourceError::Decode`] if the JSON is not an array of records.
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let records: Vec<MetricRecord> = serde_json::from_str(json)?;
        Ok(Self::new([records]))
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.batches.lock().len()
    }
}

#[async_trait]
impl RecordSource for ReplaySource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn fetch(&self) -> Result<Vec<MetricRecord>, SourceError> {
        Ok(self.batches.lock().pop_front().unwrap_or_default())
    }
}
