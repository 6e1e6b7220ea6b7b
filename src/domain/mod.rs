//! Core domain types and wrappers.

pub mod error;
pub mod operation;
pub mod timing;
pub mod cache;
pub mod memoize;
pub mod retry;
pub mod validate;
pub mod frame;
pub mod ohlcv;
pub mod settings;
