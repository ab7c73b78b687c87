//! Per-kind, per-subject record windows reduced into network-wide summaries.
//!
//! Each [`RecordKind`] is its own shard in a [`DashMap`], so ingestion for one
//! kind never contends with another. Within a shard every subject keeps at most
//! `capacity(kind)` records, ordered by `observed_at`.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::debug;

use crate::types::{AttributeValue, MetricRecord, RecordKind};

/// Default per-subject record capacity for a kind.
#[must_use]
pub fn default_capacity(kind: RecordKind) -> usize {
    match kind {
        RecordKind::Occupancy => 30,
        RecordKind::Inventory => 50,
        RecordKind::Billing => 200,
        RecordKind::Vitals => 100,
        RecordKind::Symptoms => 150,
        RecordKind::Conditions => 60,
    }
}

/// Which records of each subject a summary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Window {
    /// Each subject's newest record.
    Latest,
    /// Each subject's last `n` records.
    Recent(usize),
    /// Records observed at or after the instant.
    Since(DateTime<Utc>),
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Recent(n) => write!(f, "recent({n})"),
            Self::Since(at) => write!(f, "since({})", at.to_rfc3339()),
        }
    }
}

/// Reduced statistics of one numeric attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub count: u64,
    pub sum: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricStats {
    fn first(value: f64) -> Self {
        Self { count: 1, sum: value, avg: value, min: value, max: value }
    }

    #[allow(clippy::cast_precision_loss)]
    fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.avg = self.sum / self.count as f64;
    }
}

/// Network-wide reduction of one kind's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub kind: RecordKind,
    pub window: Window,
    /// Subjects contributing at least one record.
    pub subjects: usize,
    pub records: usize,
    /// Per numeric attribute. Flags count as 0/1; text and lists are skipped.
    pub metrics: BTreeMap<String, MetricStats>,
    pub generated_at: DateTime<Utc>,
}

impl NetworkSummary {
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<&MetricStats> {
        self.metrics.get(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }
}

#[derive(Debug, Default)]
struct KindWindow {
    subjects: BTreeMap<String, VecDeque<MetricRecord>>,
}

/// Bounded record windows and their summaries.
#[derive(Debug)]
pub struct Aggregator {
    shards: DashMap<RecordKind, KindWindow>,
    capacities: HashMap<RecordKind, usize>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    /// Aggregator with the default capacities.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacities(HashMap::new())
    }

    /// Aggregator with capacity overrides. Kinds without an override use
    /// [`default_capacity`]; zero overrides are raised to 1.
    #[must_use]
    pub fn with_capacities(overrides: HashMap<RecordKind, usize>) -> Self {
        let capacities = RecordKind::ALL
            .into_iter()
            .map(|kind| {
                let capacity = overrides.get(&kind).copied().unwrap_or_else(|| default_capacity(kind));
                (kind, capacity.max(1))
            })
            .collect();
        Self { shards: DashMap::new(), capacities }
    }

    #[must_use]
    pub fn capacity(&self, kind: RecordKind) -> usize {
        self.capacities.get(&kind).copied().unwrap_or_else(|| default_capacity(kind))
    }

    /// Adds a record to its subject's window.
    ///
    /// Late records are inserted in `observed_at` order; when the window is
    /// full the oldest record is dropped.
    pub fn ingest(&self, record: MetricRecord) {
        let kind = record.kind;
        let capacity = self.capacity(kind);
        let mut shard = self.shards.entry(kind).or_default();
        let window = shard.subjects.entry(record.subject_id.clone()).or_default();

        let position = window.partition_point(|existing| existing.observed_at <= record.observed_at);
        window.insert(position, record);
        while window.len() > capacity {
            window.pop_front();
        }

        debug!(kind = %kind, records = window.len(), "record ingested");
    }

    /// Reduces the selected records of every subject of `kind`.
    #[must_use]
    pub fn summarize(&self, kind: RecordKind, window: Window) -> NetworkSummary {
        let mut summary = NetworkSummary {
            kind,
            window,
            subjects: 0,
            records: 0,
            metrics: BTreeMap::new(),
            generated_at: Utc::now(),
        };

        let Some(shard) = self.shards.get(&kind) else {
            return summary;
        };

        for records in shard.subjects.values() {
            let selected: Vec<&MetricRecord> = match window {
                Window::Latest => records.back().into_iter().collect(),
                Window::Recent(n) => records.iter().skip(records.len().saturating_sub(n)).collect(),
                Window::Since(at) => records.iter().filter(|r| r.observed_at >= at).collect(),
            };
            if selected.is_empty() {
                continue;
            }

            summary.subjects += 1;
            summary.records += selected.len();
            for record in selected {
                for (name, value) in &record.attributes {
                    let numeric = match value {
                        AttributeValue::Number(n) if n.is_finite() => *n,
                        AttributeValue::Flag(flag) => f64::from(u8::from(*flag)),
                        _ => continue,
                    };
                    summary
                        .metrics
                        .entry(name.clone())
                        .and_modify(|stats| stats.add(numeric))
                        .or_insert_with(|| MetricStats::first(numeric));
                }
            }
        }

        summary
    }

    /// Newest record of one subject.
    #[must_use]
    pub fn latest(&self, kind: RecordKind, subject_id: &str) -> Option<MetricRecord> {
        self.shards.get(&kind)?.subjects.get(subject_id)?.back().cloned()
    }

    /// Subjects with at least one record of `kind`.
    #[must_use]
    pub fn subjects(&self, kind: RecordKind) -> Vec<String> {
        self.shards.get(&kind).map(|shard| shard.subjects.keys().cloned().collect()).unwrap_or_default()
    }

    /// Records currently held for `kind`.
    #[must_use]
    pub fn record_count(&self, kind: RecordKind) -> usize {
        self.shards
            .get(&kind)
            .map(|shard| shard.subjects.values().map(VecDeque::len).sum())
            .unwrap_or_default()
    }
}
