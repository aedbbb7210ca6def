// In crates/core-types/src/lib.rs

pub mod error;
pub mod format;
pub mod sector;
pub mod types;
pub mod validation;

// Re-export the most important types for easy access from other crates.
pub use error::{Error, Result};
pub use sector::{Sector, SectorFilter};
pub use types::{ApacComments, DailyReport, HistoricalFilter, Metrics, SectorRecap};
pub use validation::Validate;
