//! Infrastructure layer module
//!
//! Adapters that satisfy the domain ports:
//! - Configuration loading (figment)
//! - Logging setup (tracing)
//! - Platform HTTP clients
//! - Roster files
//! - JSON output store

pub mod config;
pub mod logging;
pub mod output;
pub mod platforms;
pub mod roster;
