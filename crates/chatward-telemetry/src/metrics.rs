//! Metrics collection and reporting
//!
//! Counters are kept in-process for snapshots and mirrored to the `metrics`
//! facade so an installed recorder can export them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Evaluations processed, labelled by event kind
pub const EVALUATIONS_TOTAL: &str = "chatward_evaluations_total";
/// Rules that matched, labelled by category
pub const RULE_MATCHES_TOTAL: &str = "chatward_rule_matches_total";
/// Evaluations that ended cancelled
pub const CANCELLATIONS_TOTAL: &str = "chatward_cancellations_total";
/// Packets suppressed by a packet rule
pub const PACKET_CANCELLATIONS_TOTAL: &str = "chatward_packet_cancellations_total";
/// Regex timeouts and syntax faults
pub const REGEX_FAULTS_TOTAL: &str = "chatward_regex_faults_total";

/// Register descriptions for every chatward metric with the installed recorder
pub fn describe() {
    metrics::describe_counter!(EVALUATIONS_TOTAL, "Total number of texts evaluated by kind");
    metrics::describe_counter!(RULE_MATCHES_TOTAL, "Total number of rule matches by category");
    metrics::describe_counter!(CANCELLATIONS_TOTAL, "Total number of cancelled actions");
    metrics::describe_counter!(
        PACKET_CANCELLATIONS_TOTAL,
        "Total number of suppressed outgoing packets"
    );
    metrics::describe_counter!(REGEX_FAULTS_TOTAL, "Total number of regex faults by type");
}

/// Metrics collector for rule engine activity
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    evaluations: AtomicU64,
    rule_matches: AtomicU64,
    cancellations: AtomicU64,
    packet_cancellations: AtomicU64,
    regex_faults: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                evaluations: AtomicU64::new(0),
                rule_matches: AtomicU64::new(0),
                cancellations: AtomicU64::new(0),
                packet_cancellations: AtomicU64::new(0),
                regex_faults: AtomicU64::new(0),
            }),
        }
    }

    /// Record an evaluation of the given kind
    pub fn record_evaluation(&self, kind: &str) {
        self.inner.evaluations.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(EVALUATIONS_TOTAL, "kind" => kind.to_string()).increment(1);
    }

    /// Record a rule match in the given category
    pub fn record_rule_match(&self, category: &str) {
        self.inner.rule_matches.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(RULE_MATCHES_TOTAL, "category" => category.to_string()).increment(1);
    }

    /// Record a cancelled action
    pub fn record_cancellation(&self) {
        self.inner.cancellations.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(CANCELLATIONS_TOTAL).increment(1);
    }

    /// Record a suppressed packet
    pub fn record_packet_cancellation(&self) {
        self.inner
            .packet_cancellations
            .fetch_add(1, Ordering::Relaxed);
        metrics::counter!(PACKET_CANCELLATIONS_TOTAL).increment(1);
    }

    /// Record a regex fault (`timeout`, `syntax` or `runtime`)
    pub fn record_regex_fault(&self, fault: &'static str) {
        self.inner.regex_faults.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(REGEX_FAULTS_TOTAL, "type" => fault).increment(1);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            evaluations: self.inner.evaluations.load(Ordering::Relaxed),
            rule_matches: self.inner.rule_matches.load(Ordering::Relaxed),
            cancellations: self.inner.cancellations.load(Ordering::Relaxed),
            packet_cancellations: self.inner.packet_cancellations.load(Ordering::Relaxed),
            regex_faults: self.inner.regex_faults.load(Ordering::Relaxed),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of current metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub evaluations: u64,
    pub rule_matches: u64,
    pub cancellations: u64,
    pub packet_cancellations: u64,
    pub regex_faults: u64,
}

impl MetricsSnapshot {
    /// Fraction of evaluations that ended cancelled
    pub fn cancellation_rate(&self) -> f64 {
        if self.evaluations == 0 {
            0.0
        } else {
            self.cancellations as f64 / self.evaluations as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        let metrics = MetricsCollector::new();

        metrics.record_evaluation("chat");
        metrics.record_evaluation("chat");
        metrics.record_rule_match("GLOBAL");
        metrics.record_cancellation();
        metrics.record_regex_fault("timeout");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.evaluations, 2);
        assert_eq!(snapshot.rule_matches, 1);
        assert_eq!(snapshot.cancellations, 1);
        assert_eq!(snapshot.regex_faults, 1);
        assert_eq!(snapshot.packet_cancellations, 0);
        assert!((snapshot.cancellation_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = MetricsCollector::new();
        let clone = metrics.clone();

        clone.record_packet_cancellation();
        assert_eq!(metrics.snapshot().packet_cancellations, 1);
    }

    #[test]
    fn test_empty_rate() {
        assert_eq!(MetricsSnapshot::default().cancellation_rate(), 0.0);
    }
}
