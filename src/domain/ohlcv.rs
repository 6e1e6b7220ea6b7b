//! OHLCV bar representation and its tabular view.

use crate::domain::error::TradingSystemError;
use crate::domain::frame::Frame;
use crate::domain::validate::{TableArgs, Tabular};
use chrono::NaiveDate;
use serde::Serialize;

pub const OHLCV_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// Convert a frame with the standard OHLCV columns into bars sorted by date.
pub fn bars_from_frame(frame: &Frame) -> Result<Vec<OhlcvBar>, TradingSystemError> {
    let dates = frame.column("date").ok_or_else(|| {
        TradingSystemError::data_validation("missing column date")
    })?;
    let open = frame.numeric_column("open")?;
    let high = frame.numeric_column("high")?;
    let low = frame.numeric_column("low")?;
    let close = frame.numeric_column("close")?;
    let volume = frame.parse_column::<i64>("volume")?;

    let mut bars = Vec::with_capacity(dates.len());
    for (i, date_str) in dates.iter().enumerate() {
        let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
            TradingSystemError::data_validation(format!(
                "invalid date {date_str:?} in row {}: {e}",
                i + 1
            ))
        })?;
        bars.push(OhlcvBar {
            date,
            open: open[i],
            high: high[i],
            low: low[i],
            close: close[i],
            volume: volume[i],
        });
    }
    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

impl Tabular for Vec<OhlcvBar> {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn column_names(&self) -> Vec<&str> {
        OHLCV_COLUMNS.to_vec()
    }
}

impl TableArgs for Vec<OhlcvBar> {
    fn tables(&self) -> Vec<&dyn Tabular> {
        vec![self]
    }
}
