//! Observability port for performance records.

use crate::domain::timing::PerformanceRecord;

/// Receives exactly one record per timed invocation.
pub trait PerformanceSink: Send + Sync {
    fn record(&self, record: &PerformanceRecord);
}
