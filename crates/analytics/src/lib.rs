// In crates/analytics/src/lib.rs

pub mod engine;
pub mod history;
pub mod poller;
pub mod types;

// Re-export public types
pub use engine::{AggregationService, calculate_totals, totals_for_date};
pub use history::grid_rows;
pub use poller::TotalsPoller;
pub use types::{DateSummary, HistoryRow, SectorBreakdown, TotalsSnapshot};
