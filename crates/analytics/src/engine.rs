// In crates/analytics/src/engine.rs

use chrono::NaiveDate;
use core_types::{ApacComments, Metrics, Sector, SectorRecap};
use std::collections::HashSet;
use storage::{Clock, ReportStore};

use crate::types::{DateSummary, SectorBreakdown, TotalsSnapshot};

/// Sums each metric across `recaps`. Sectors that have not submitted are
/// simply absent and contribute nothing.
pub fn calculate_totals(recaps: &[SectorRecap]) -> Metrics {
    recaps.iter().map(|r| r.metrics).sum()
}

/// [`calculate_totals`] restricted to recaps dated `date`.
pub fn totals_for_date(recaps: &[SectorRecap], date: NaiveDate) -> Metrics {
    recaps
        .iter()
        .filter(|r| r.date == date)
        .map(|r| r.metrics)
        .sum()
}

/// Desk-wide aggregation over whatever the store holds for a date.
///
/// Nothing is cached: every call re-reads the store, so callers simply call
/// again after a save.
pub struct AggregationService<'a> {
    store: &'a ReportStore,
}

impl<'a> AggregationService<'a> {
    pub fn new(store: &'a ReportStore) -> Self {
        Self { store }
    }

    fn recaps(&self, date: NaiveDate) -> Vec<SectorRecap> {
        self.store.all_sector_recaps(date)
    }

    /// The APAC-level P&L, risk and volumes for `date`.
    pub fn calculate_apac_totals(&self, date: NaiveDate) -> Metrics {
        totals_for_date(&self.recaps(date), date)
    }

    /// One row per submitted recap, in store order.
    pub fn sector_breakdown(&self, date: NaiveDate) -> Vec<SectorBreakdown> {
        self.recaps(date)
            .into_iter()
            .filter(|r| r.date == date)
            .map(|r| SectorBreakdown {
                sector: r.sector,
                pnl: r.metrics.pnl,
                risk: r.metrics.risk,
                volumes: r.metrics.volumes,
            })
            .collect()
    }

    fn completed_sectors(&self, date: NaiveDate) -> usize {
        self.recaps(date)
            .iter()
            .filter(|r| r.date == date)
            .map(|r| r.sector)
            .collect::<HashSet<Sector>>()
            .len()
    }

    /// True once every sector has submitted for `date` and APAC comments exist.
    pub fn is_date_complete(&self, date: NaiveDate) -> bool {
        self.completed_sectors(date) == Sector::COUNT && self.store.apac_comments(date).is_some()
    }

    pub fn date_summary(&self, date: NaiveDate) -> DateSummary {
        DateSummary {
            date,
            total_sectors: Sector::COUNT,
            completed_sectors: self.completed_sectors(date),
            totals: self.calculate_apac_totals(date),
            apac_comments: self.store.apac_comments(date),
            is_complete: self.is_date_complete(date),
        }
    }

    /// APAC comments carrying the current sector totals and the given
    /// commentary, ready to be saved.
    pub fn apac_comments_with_totals(&self, market_commentary: &str, date: NaiveDate) -> ApacComments {
        let mut comments = ApacComments::from_totals(self.calculate_apac_totals(date), date);
        comments.market_commentary = Some(market_commentary.to_string());
        comments
    }

    pub fn snapshot(&self, date: NaiveDate) -> TotalsSnapshot {
        TotalsSnapshot {
            date,
            totals: self.calculate_apac_totals(date),
            breakdown: self.sector_breakdown(date),
            polled_at: self.store.clock().now(),
        }
    }
}
