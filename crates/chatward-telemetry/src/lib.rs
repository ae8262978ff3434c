//! chatward Telemetry
//!
//! Logging, metrics, and audit trail functionality for chatward.
//!
//! Provides:
//! - Timestamped flat-file logs (rule violations, regex faults, handler targets)
//! - The audit sink seam the rule engine reports through
//! - Performance counters mirrored to the `metrics` facade

pub mod audit;
pub mod metrics;
pub mod writer;

pub use audit::{AuditEntry, AuditKind, AuditSink, FileAuditSink, MemoryAuditSink};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use writer::{LogWriter, WriterConfig};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::audit::{AuditEntry, AuditKind, AuditSink, FileAuditSink, MemoryAuditSink};
    pub use crate::metrics::MetricsCollector;
    pub use crate::writer::{LogWriter, WriterConfig};
}
