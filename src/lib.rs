//! tradeguard: resilience and observability wrappers for trading-system operations.
//!
//! Hexagonal architecture: wrappers and the error taxonomy in [`domain`], port
//! traits in [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
