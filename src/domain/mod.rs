//! Domain layer for the pulse harvester
//!
//! This module contains core business types and the port traits that
//! infrastructure adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{FetchError, HarvestError, HarvestResult, RosterError};
