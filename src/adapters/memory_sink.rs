//! In-process performance sink that keeps every record.

use crate::domain::timing::PerformanceRecord;
use crate::ports::telemetry_port::PerformanceSink;
use parking_lot::Mutex;

#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<PerformanceRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<PerformanceRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn failures(&self) -> usize {
        self.records.lock().iter().filter(|r| !r.is_success()).count()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl PerformanceSink for MemorySink {
    fn record(&self, record: &PerformanceRecord) {
        self.records.lock().push(record.clone());
    }
}
