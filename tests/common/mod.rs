#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tradeguard::domain::error::TradingSystemError;
pub use tradeguard::domain::frame::Frame;
use tradeguard::domain::ohlcv::OHLCV_COLUMNS;
use tradeguard::ports::data_port::DataPort;

/// In-memory data source that fails a configurable number of times per
/// source before answering.
pub struct MockDataPort {
    pub data: HashMap<String, Frame>,
    pub failures_before_success: usize,
    pub calls: AtomicUsize,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            failures_before_success: 0,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_frame(mut self, source: &str, frame: Frame) -> Self {
        self.data.insert(source.to_string(), frame);
        self
    }

    pub fn flaky(mut self, failures: usize) -> Self {
        self.failures_before_success = failures;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DataPort for MockDataPort {
    fn fetch_frame(&self, source: &str) -> Result<Frame, TradingSystemError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures_before_success {
            return Err(TradingSystemError::data_source(format!(
                "{source} unavailable (call {})",
                call + 1
            )));
        }
        self.data
            .get(source)
            .cloned()
            .ok_or_else(|| TradingSystemError::data_source(format!("unknown source {source}")))
    }
}

pub fn make_frame(columns: &[&str], rows: usize) -> Frame {
    let width = columns.len();
    Frame::new(
        columns.iter().map(|c| c.to_string()).collect(),
        (0..rows).map(|r| vec![r.to_string(); width]).collect(),
    )
    .unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Daily OHLCV frame starting at `start_date` with a rising close.
pub fn generate_ohlcv_frame(start_date: &str, count: usize, start_price: f64) -> Frame {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    let rows = (0..count)
        .map(|i| {
            let close = start_price + i as f64;
            vec![
                (start + chrono::Duration::days(i as i64)).to_string(),
                (close - 1.0).to_string(),
                (close + 1.0).to_string(),
                (close - 2.0).to_string(),
                close.to_string(),
                "1000".to_string(),
            ]
        })
        .collect();
    Frame::new(OHLCV_COLUMNS.iter().map(|c| c.to_string()).collect(), rows).unwrap()
}

pub fn frame_to_csv(frame: &Frame) -> String {
    let mut out = frame.columns().join(",");
    out.push('\n');
    for row in frame.rows() {
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Retry settings that never sleep.
pub const FAST_RETRY_INI: &str = r#"
[cache]
enabled = true
ttl_seconds = 60
max_entries = 16

[retry]
max_attempts = 3
base_delay_seconds = 0
backoff_factor = 2
"#;
