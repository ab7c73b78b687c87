//! Random sources for rules that add bounded noise to a score.
//!
//! Randomized contributions break idempotent re-scoring, so they are only
//! available through an explicit source carried by the evaluation context.
//! [`SeededRandom`] and [`FixedRandom`] are reproducible; [`EntropyRandom`] is
//! the documented production exception.

use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use crate::types::MetricRecord;

/// Source of uniformly distributed values in `[0, 1)`.
pub trait RandomSource: Send + std::fmt::Debug {
    /// Draws the next value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

/// Reproducible pseudo-random source.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Seeds a source from a base seed and the record's identity.
    ///
    /// Identical `(seed, subject, kind, observed_at)` always yields the same
    /// draws, so re-scoring a record reproduces its score regardless of how
    /// many other records were scored in between.
    #[must_use]
    pub fn for_record(seed: u64, record: &MetricRecord) -> Self {
        let mut hasher = DefaultHasher::new();
        seed.hash(&mut hasher);
        record.subject_id.hash(&mut hasher);
        record.kind.hash(&mut hasher);
        record.observed_at.timestamp_nanos_opt().unwrap_or_default().hash(&mut hasher);
        Self::new(hasher.finish())
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// OS-seeded source. Scores using it are not reproducible.
#[derive(Debug, Clone)]
pub struct EntropyRandom {
    rng: StdRng,
}

impl EntropyRandom {
    #[must_use]
    pub fn new() -> Self {
        Self { rng: StdRng::from_os_rng() }
    }
}

impl Default for EntropyRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropyRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Always returns the same value. Useful to pin noise at a bound in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(f64);

impl FixedRandom {
    /// Creates a source returning `value`, clamped into `[0, 1)`.
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0 - f64::EPSILON))
    }
}

impl RandomSource for FixedRandom {
    fn next_unit(&mut self) -> f64 {
        self.0
    }
}

/// How the engine provisions a random source for each evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RandomPolicy {
    /// No source; rule sets with randomized rules fail with `RandomnessNotSeeded`.
    #[default]
    Disabled,
    /// Per-record [`SeededRandom`] derived from the base seed.
    Seeded(u64),
    /// [`EntropyRandom`]; scores are not reproducible.
    Entropy,
}

impl RandomPolicy {
    /// Creates the source for one evaluation of `record`.
    #[must_use]
    pub fn source_for(&self, record: &MetricRecord) -> Option<Box<dyn RandomSource>> {
        match self {
            Self::Disabled => None,
            Self::Seeded(seed) => Some(Box::new(SeededRandom::for_record(*seed, record))),
            Self::Entropy => Some(Box::new(EntropyRandom::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordKind;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_seeded_random_is_reproducible() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        for _ in 0..16 {
            let value = a.next_unit();
            assert!((0.0..1.0).contains(&value));
            assert!((value - b.next_unit()).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_record_seed_depends_on_record_identity() {
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap();
        let first = MetricRecord::builder("B-1", RecordKind::Billing).observed_at(at).build();
        let second = MetricRecord::builder("B-2", RecordKind::Billing).observed_at(at).build();

        let draw = |record: &MetricRecord| SeededRandom::for_record(7, record).next_unit();
        assert!((draw(&first) - draw(&first)).abs() < f64::EPSILON);
        assert!((draw(&first) - draw(&second)).abs() > f64::EPSILON);
    }

    #[test]
    fn test_fixed_random_clamps_into_unit_interval() {
        assert!(FixedRandom::new(1.5).next_unit() < 1.0);
        assert!(FixedRandom::new(-3.0).next_unit().abs() < f64::EPSILON);
        assert!((FixedRandom::new(0.25).next_unit() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_disabled_policy_provides_no_source() {
        let record = MetricRecord::builder("B-1", RecordKind::Billing).build();
        assert!(RandomPolicy::Disabled.source_for(&record).is_none());
        assert!(RandomPolicy::Seeded(1).source_for(&record).is_some());
    }
}
