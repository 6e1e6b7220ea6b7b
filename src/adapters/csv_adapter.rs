//! CSV file data adapter.

use crate::domain::error::TradingSystemError;
use crate::domain::frame::Frame;
use crate::ports::data_port::DataPort;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Reads headered CSV files relative to a base directory.
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn csv_path(&self, source: &str) -> PathBuf {
        self.base_path.join(source)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_frame(&self, source: &str) -> Result<Frame, TradingSystemError> {
        let path = self.csv_path(source);
        let file = File::open(&path).map_err(|e| {
            TradingSystemError::data_source(format!("failed to read {}: {}", path.display(), e))
                .with_source(e)
        })?;

        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
        let columns: Vec<String> = rdr
            .headers()
            .map_err(|e| {
                TradingSystemError::data_source(format!("CSV header error in {}: {}", path.display(), e))
                    .with_source(e)
            })?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| {
                TradingSystemError::data_source(format!("CSV parse error in {}: {}", path.display(), e))
                    .with_source(e)
            })?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        tracing::debug!(
            source = %path.display(),
            rows = rows.len(),
            columns = columns.len(),
            "loaded CSV"
        );
        Frame::new(columns, rows)
    }
}
