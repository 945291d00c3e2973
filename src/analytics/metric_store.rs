//! Append-only in-memory metric storage.

use std::sync::RwLock;

use crate::analytics::types::Metric;

/// Aggregate over the metrics matching one type.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aggregate {
    pub count: u64,
    /// Arithmetic mean, 0.0 for an empty set.
    pub mean: f64,
}

impl Aggregate {
    /// Fold one value into the running mean. Finite inputs keep the mean
    /// finite, where a plain sum would overflow near `f64::MAX`.
    fn push(self, value: f64) -> Self {
        let count = self.count + 1;
        let n = count as f64;
        Self {
            count,
            mean: self.mean + (value / n - self.mean / n),
        }
    }
}

/// Ordered sequence of ingested metrics. Entries are never mutated or removed.
#[derive(Debug, Default)]
pub struct MetricStore {
    metrics: RwLock<Vec<Metric>>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, metric: Metric) {
        self.metrics
            .write()
            .expect("metric store lock poisoned")
            .push(metric);
    }

    pub fn len(&self) -> usize {
        self.metrics.read().expect("metric store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scan every metric of `metric_type`.
    pub fn aggregate(&self, metric_type: &str) -> Aggregate {
        let metrics = self.metrics.read().expect("metric store lock poisoned");
        metrics
            .iter()
            .filter(|m| m.metric_type == metric_type)
            .fold(Aggregate::default(), |acc, m| acc.push(m.value))
    }
}
