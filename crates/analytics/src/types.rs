// In crates/analytics/src/types.rs

use chrono::{DateTime, NaiveDate, Utc};
use core_types::{ApacComments, Metrics, Sector};
use serde::Serialize;

/// One submitted sector's numbers for a date, passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorBreakdown {
    pub sector: Sector,
    pub pnl: f64,
    pub risk: f64,
    pub volumes: f64,
}

/// Progress and totals for a single date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateSummary {
    pub date: NaiveDate,
    /// Always the size of the sector set.
    pub total_sectors: usize,
    pub completed_sectors: usize,
    pub totals: Metrics,
    /// The APAC comments saved for the date, if any.
    pub apac_comments: Option<ApacComments>,
    pub is_complete: bool,
}

/// What the polling helper hands to its callback on every tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsSnapshot {
    pub date: NaiveDate,
    pub totals: Metrics,
    pub breakdown: Vec<SectorBreakdown>,
    pub polled_at: DateTime<Utc>,
}

/// A flattened row of the historical view: one "APAC Overall" row per
/// report followed by its sector rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub id: String,
    pub date: NaiveDate,
    /// A sector label, or `"APAC Overall"`.
    pub sector: String,
    pub market_moves_and_flows: String,
    /// `"P&L: +2k, Risk: +50k, Volumes: +1.2M"`.
    pub daily_pnl: String,
    pub total_pnl: f64,
    pub market_commentary: String,
    pub submitted_by: String,
}
