//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces the orchestrator depends on:
//! - PlatformClient: fetches posts for one external account
//! - Classifier: labels post text with a sentiment
//! - RosterReader: yields roster entries
//! - ResultStore: prepares and persists run output
//!
//! These traits keep the orchestrator independent of HTTP, file formats
//! and the classification model.

pub mod classifier;
pub mod null_store;
pub mod platform_client;
pub mod result_store;
pub mod roster_reader;

pub use classifier::Classifier;
pub use null_store::NullResultStore;
pub use platform_client::PlatformClient;
pub use result_store::ResultStore;
pub use roster_reader::RosterReader;
