use anyhow::Result;

use crate::domain::models::RosterSource;

/// Source of roster entries, in processing order.
///
/// A failure to read the roster as a whole is an `Err`; a single unreadable
/// entry is reported inside its `RosterSource` so the rest can proceed.
pub trait RosterReader {
    fn read(&self) -> Result<Vec<RosterSource>>;
}
