//! # Performance Metrics
//!
//! Fixed-capacity latency buffers for sales and shift clock calls.
//!
//! The orchestrator does not record into these on its own. Callers that want
//! latency history pass the `elapsed_ms` they got back into
//! [`PerformanceMetrics::record`], then read the figures back with
//! [`PerformanceMetrics::stats`] or log them all with
//! [`PerformanceMetrics::log_summary`].

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Operation type a sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricCategory {
    Sales,
    ClockIns,
    ClockOuts,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 3] = [
        MetricCategory::Sales,
        MetricCategory::ClockIns,
        MetricCategory::ClockOuts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::Sales => "sales",
            MetricCategory::ClockIns => "clockIns",
            MetricCategory::ClockOuts => "clockOuts",
        }
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One latency sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    pub duration_ms: f64,
    pub timestamp: DateTime<Utc>,
}

/// Summary of one category's buffer. All zero when the buffer is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub count: usize,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub p95: f64,
}

impl MetricStats {
    fn from_samples<'a>(samples: impl Iterator<Item = &'a MetricRecord>) -> Self {
        let mut durations: Vec<f64> = samples.map(|r| r.duration_ms).collect();
        if durations.is_empty() {
            return MetricStats::default();
        }

        durations.sort_by(|a, b| a.total_cmp(b));
        let count = durations.len();
        let sum: f64 = durations.iter().sum();
        let p95_index = ((count as f64 * 0.95).floor() as usize).min(count - 1);

        MetricStats {
            count,
            avg: sum / count as f64,
            min: durations[0],
            max: durations[count - 1],
            p95: durations[p95_index],
        }
    }
}

/// Per-category ring buffers of latency samples.
pub struct PerformanceMetrics {
    capacity: usize,
    buffers: Mutex<HashMap<MetricCategory, VecDeque<MetricRecord>>>,
}

impl PerformanceMetrics {
    pub fn new(capacity: usize) -> Self {
        PerformanceMetrics {
            capacity: capacity.max(1),
            buffers: Mutex::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn buffers(&self) -> MutexGuard<'_, HashMap<MetricCategory, VecDeque<MetricRecord>>> {
        self.buffers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends a sample stamped now, evicting the oldest when full.
    pub fn record(&self, category: MetricCategory, duration_ms: f64) {
        self.push(
            category,
            MetricRecord {
                duration_ms,
                timestamp: Utc::now(),
            },
        );
    }

    /// Appends an already-built sample.
    pub fn push(&self, category: MetricCategory, record: MetricRecord) {
        let mut buffers = self.buffers();
        let buffer = buffers
            .entry(category)
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        if buffer.len() == self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(record);
    }

    /// Copies of the samples currently held for `category`, oldest first.
    pub fn records(&self, category: MetricCategory) -> Vec<MetricRecord> {
        self.buffers()
            .get(&category)
            .map(|b| b.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn stats(&self, category: MetricCategory) -> MetricStats {
        match self.buffers().get(&category) {
            Some(buffer) => MetricStats::from_samples(buffer.iter()),
            None => MetricStats::default(),
        }
    }

    /// Stats for every category.
    pub fn snapshot(&self) -> BTreeMap<MetricCategory, MetricStats> {
        MetricCategory::ALL
            .iter()
            .map(|&category| (category, self.stats(category)))
            .collect()
    }

    pub fn clear(&self) {
        self.buffers().clear();
    }

    pub fn clear_category(&self, category: MetricCategory) {
        self.buffers().remove(&category);
    }

    /// Logs one line per category.
    pub fn log_summary(&self) {
        for (category, stats) in self.snapshot() {
            info!(
                category = %category,
                count = stats.count,
                avg_ms = stats.avg,
                min_ms = stats.min,
                max_ms = stats.max,
                p95_ms = stats.p95,
                "Performance summary"
            );
        }
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::new(posflow_core::METRICS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats_are_zeroed() {
        let metrics = PerformanceMetrics::default();
        assert_eq!(metrics.stats(MetricCategory::Sales), MetricStats::default());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let metrics = PerformanceMetrics::default();
        for i in 0..101 {
            metrics.record(MetricCategory::Sales, i as f64);
        }

        let records = metrics.records(MetricCategory::Sales);
        assert_eq!(records.len(), 100);
        assert_eq!(records[0].duration_ms, 1.0);
        assert_eq!(records[99].duration_ms, 100.0);
        assert_eq!(metrics.stats(MetricCategory::Sales).min, 1.0);
    }

    #[test]
    fn test_stats_figures() {
        let metrics = PerformanceMetrics::default();
        for d in [40.0, 10.0, 30.0, 20.0] {
            metrics.record(MetricCategory::ClockIns, d);
        }

        let stats = metrics.stats(MetricCategory::ClockIns);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.avg, 25.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 40.0);
        // floor(4 * 0.95) = 3 → last element
        assert_eq!(stats.p95, 40.0);
    }

    #[test]
    fn test_p95_index() {
        let metrics = PerformanceMetrics::default();
        for d in 1..=20 {
            metrics.record(MetricCategory::ClockOuts, d as f64);
        }
        // floor(20 * 0.95) = 19 → 20.0
        assert_eq!(metrics.stats(MetricCategory::ClockOuts).p95, 20.0);

        metrics.clear_category(MetricCategory::ClockOuts);
        for d in 1..=40 {
            metrics.record(MetricCategory::ClockOuts, d as f64);
        }
        // floor(40 * 0.95) = 38 → 39.0
        assert_eq!(metrics.stats(MetricCategory::ClockOuts).p95, 39.0);
    }

    #[test]
    fn test_categories_are_independent() {
        let metrics = PerformanceMetrics::new(2);
        metrics.record(MetricCategory::Sales, 5.0);
        metrics.record(MetricCategory::ClockIns, 7.0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[&MetricCategory::Sales].count, 1);
        assert_eq!(snapshot[&MetricCategory::ClockOuts].count, 0);

        metrics.clear();
        assert_eq!(metrics.stats(MetricCategory::ClockIns).count, 0);
    }
}
