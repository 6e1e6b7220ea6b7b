//! Data access port trait.

use crate::domain::error::TradingSystemError;
use crate::domain::frame::Frame;

pub trait DataPort {
    /// Load the table identified by `source`.
    fn fetch_frame(&self, source: &str) -> Result<Frame, TradingSystemError>;
}
