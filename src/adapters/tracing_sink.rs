//! Performance sink that forwards records as `tracing` events.

use crate::domain::timing::{Outcome, PerformanceRecord};
use crate::ports::telemetry_port::PerformanceSink;

/// Successes are logged at debug, failures at error.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl PerformanceSink for TracingSink {
    fn record(&self, record: &PerformanceRecord) {
        let secs = record.duration.as_secs_f64();
        match record.outcome {
            Outcome::Success => tracing::debug!(
                operation = %record.operation,
                duration_secs = secs,
                "{} executed in {:.3}s",
                record.operation,
                secs
            ),
            Outcome::Failure(kind) => tracing::error!(
                operation = %record.operation,
                duration_secs = secs,
                error_kind = %kind,
                "{} failed after {:.3}s",
                record.operation,
                secs
            ),
        }
    }
}
