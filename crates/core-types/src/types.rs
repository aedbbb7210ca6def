// In crates/core-types/src/types.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use crate::sector::{Sector, SectorFilter};

/// The three numbers every recap reports, in raw currency units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub pnl: f64,
    pub risk: f64,
    pub volumes: f64,
}

impl Metrics {
    pub fn new(pnl: f64, risk: f64, volumes: f64) -> Self {
        Self { pnl, risk, volumes }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

impl Add for Metrics {
    type Output = Metrics;

    fn add(self, rhs: Metrics) -> Metrics {
        Metrics {
            pnl: self.pnl + rhs.pnl,
            risk: self.risk + rhs.risk,
            volumes: self.volumes + rhs.volumes,
        }
    }
}

impl AddAssign for Metrics {
    fn add_assign(&mut self, rhs: Metrics) {
        *self = *self + rhs;
    }
}

impl Sum for Metrics {
    fn sum<I: Iterator<Item = Metrics>>(iter: I) -> Metrics {
        iter.fold(Metrics::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Metrics> for Metrics {
    fn sum<I: Iterator<Item = &'a Metrics>>(iter: I) -> Metrics {
        iter.copied().sum()
    }
}

/// One sector's daily submission.
///
/// Only one recap exists per `(sector, date)`; saving replaces the previous
/// one in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorRecap {
    pub sector: Sector,
    #[serde(default)]
    pub market_moves_and_flows: String,
    pub metrics: Metrics,
    #[serde(default)]
    pub market_commentary: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
}

impl SectorRecap {
    /// A recap with the given numbers and no commentary.
    pub fn new(sector: Sector, date: NaiveDate, metrics: Metrics) -> Self {
        Self {
            sector,
            market_moves_and_flows: String::new(),
            metrics,
            market_commentary: String::new(),
            date,
            submitted_by: None,
        }
    }
}

/// The desk-wide "APAC Overall" summary for a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApacComments {
    pub pnl: f64,
    pub risk: f64,
    pub volumes: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_commentary: Option<String>,
    pub date: NaiveDate,
}

impl ApacComments {
    /// Comments derived from sector totals. The commentary is left empty
    /// because it is only ever authored by hand.
    pub fn from_totals(totals: Metrics, date: NaiveDate) -> Self {
        Self {
            pnl: totals.pnl,
            risk: totals.risk,
            volumes: totals.volumes,
            market_commentary: Some(String::new()),
            date,
        }
    }

    pub fn metrics(&self) -> Metrics {
        Metrics::new(self.pnl, self.risk, self.volumes)
    }

    /// The commentary, or `""` when none was given.
    pub fn commentary(&self) -> &str {
        self.market_commentary.as_deref().unwrap_or_default()
    }
}

/// The consolidated unit handed to presentation and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub date: NaiveDate,
    pub apac_comments: ApacComments,
    /// Backing-store insertion order. Use [`DailyReport::sorted_recaps`] for display.
    pub sector_recaps: Vec<SectorRecap>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl DailyReport {
    /// The recaps in canonical sector order.
    pub fn sorted_recaps(&self) -> Vec<&SectorRecap> {
        let mut recaps: Vec<&SectorRecap> = self.sector_recaps.iter().collect();
        recaps.sort_by_key(|r| r.sector);
        recaps
    }
}

/// Filter options for the historical view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalFilter {
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub sector: SectorFilter,
}

impl HistoricalFilter {
    /// Inclusive on both ends.
    pub fn includes_date(&self, date: NaiveDate) -> bool {
        self.date_from.is_none_or(|from| date >= from) && self.date_to.is_none_or(|to| date <= to)
    }
}
