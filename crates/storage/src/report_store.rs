// In crates/storage/src/report_store.rs

use chrono::NaiveDate;
use core_types::{ApacComments, DailyReport, Metrics, Sector, SectorRecap};
use std::sync::Arc;

use crate::clock::Clock;
use crate::kv::{KeyValueStore, keys};
use crate::tier::{self, DraftTier, DurableDrafts, VolatileTodayStore};

/// The persistence layer. Routes every read and write to the volatile tier
/// when its date is today and to durable drafts otherwise, and assembles
/// `DailyReport`s on demand.
///
/// Construct one per process (or per test) and pass it to whatever needs it.
pub struct ReportStore {
    today: VolatileTodayStore,
    drafts: DurableDrafts,
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    seed: Vec<DailyReport>,
}

impl ReportStore {
    /// Creates a store.
    ///
    /// # Arguments
    ///
    /// * `kv`: The durable key-value store for drafts and saved history.
    /// * `clock`: Decides what "today" is, asked afresh on every call.
    /// * `seed`: Synthetic history merged beneath everything the user saves.
    pub fn new(kv: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, seed: Vec<DailyReport>) -> Self {
        Self {
            today: VolatileTodayStore::new(),
            drafts: DurableDrafts::new(kv.clone()),
            kv,
            clock,
            seed,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn todays_date(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn is_todays_date(&self, date: NaiveDate) -> bool {
        date == self.todays_date()
    }

    // --- Tier routing ---

    fn tier(&self, date: NaiveDate) -> &dyn DraftTier {
        if self.is_todays_date(date) {
            &self.today
        } else {
            &self.drafts
        }
    }

    fn tier_mut(&mut self, date: NaiveDate) -> &mut dyn DraftTier {
        if self.is_todays_date(date) {
            tracing::debug!(%date, "Routing to the volatile tier.");
            &mut self.today
        } else {
            tracing::debug!(%date, "Routing to durable drafts.");
            &mut self.drafts
        }
    }

    /// Saves a recap, replacing any earlier one for its sector.
    pub fn set_sector_recap(&mut self, recap: SectorRecap) {
        self.tier_mut(recap.date).set_sector_recap(recap);
    }

    pub fn sector_recap(&self, sector: Sector, date: NaiveDate) -> Option<SectorRecap> {
        self.tier(date).sector_recap(sector, date)
    }

    /// Every recap held for `date` by the tier that owns it.
    pub fn all_sector_recaps(&self, date: NaiveDate) -> Vec<SectorRecap> {
        self.tier(date).sector_recaps(date)
    }

    pub fn set_apac_comments(&mut self, comments: ApacComments) {
        self.tier_mut(comments.date).set_apac_comments(comments);
    }

    pub fn apac_comments(&self, date: NaiveDate) -> Option<ApacComments> {
        self.tier(date).apac_comments(date)
    }

    // --- Report assembly ---

    /// Today's live report, or `None` when nothing has been entered today
    /// (the caller should fall back to seed data).
    ///
    /// Explicit APAC comments win; otherwise they are derived by summing the
    /// sector recaps, with an empty commentary.
    pub fn todays_report(&self) -> Option<DailyReport> {
        let today = self.todays_date();
        let recaps = self.today.sector_recaps(today);
        let apac = self.today.apac_comments(today);

        if recaps.is_empty() && apac.is_none() {
            return None;
        }

        let apac_comments = apac.unwrap_or_else(|| {
            let totals: Metrics = recaps.iter().map(|r| r.metrics).sum();
            ApacComments::from_totals(totals, today)
        });

        let now = self.clock.now();
        Some(DailyReport {
            date: today,
            apac_comments,
            sector_recaps: recaps,
            created_at: now,
            last_modified: now,
        })
    }

    /// Seed data plus user-saved reports, with today's live report
    /// replacing anything else for today. Sorted newest first, one report per
    /// date.
    pub fn historical_data(&self) -> Vec<DailyReport> {
        let mut reports = self.seed.clone();

        for saved in self.saved_history() {
            upsert_by_date(&mut reports, saved);
        }

        if let Some(live) = self.todays_report() {
            upsert_by_date(&mut reports, live);
        }

        reports.sort_by(|a, b| b.date.cmp(&a.date));
        reports
    }

    /// The live report for today; any other date is looked up in
    /// [`ReportStore::historical_data`].
    pub fn report_by_date(&self, date: NaiveDate) -> Option<DailyReport> {
        if self.is_todays_date(date) {
            return self.todays_report();
        }
        self.historical_data().into_iter().find(|r| r.date == date)
    }

    // --- Saved history and the current-report slot ---

    /// Reports the user has explicitly saved. Seed data is never stored.
    pub fn saved_history(&self) -> Vec<DailyReport> {
        tier::read_json(self.kv.as_ref(), keys::HISTORICAL_DATA).unwrap_or_default()
    }

    /// True when the seed data already has a report for `date`.
    pub fn is_seed_date(&self, date: NaiveDate) -> bool {
        self.seed.iter().any(|r| r.date == date)
    }

    /// Saves a finished report, replacing any saved report for the same date.
    ///
    /// Dates covered by seed data are never stored; returns `false` when the
    /// report was skipped for that reason.
    pub fn save_to_history(&mut self, report: DailyReport) -> bool {
        let date = report.date;
        let mut saved = self.saved_history();
        upsert_by_date(&mut saved, report);
        saved.retain(|r| !self.is_seed_date(r.date));

        let stored = !self.is_seed_date(date);
        if stored {
            tracing::info!(%date, "Saving report to history.");
        } else {
            tracing::info!(%date, "Date is covered by seed data, not saving to history.");
        }
        tier::write_json(self.kv.as_ref(), keys::HISTORICAL_DATA, &saved);
        stored
    }

    pub fn current_report(&self) -> Option<DailyReport> {
        tier::read_json(self.kv.as_ref(), keys::CURRENT_REPORT)
    }

    pub fn save_current_report(&mut self, report: &DailyReport) {
        tier::write_json(self.kv.as_ref(), keys::CURRENT_REPORT, report);
    }

    /// Re-dates a sample report to today, stamps it, and stores it as the
    /// current report.
    pub fn initialize_today_with_sample(&mut self, sample: DailyReport) -> DailyReport {
        let today = self.todays_date();
        let now = self.clock.now();

        let mut report = sample;
        report.date = today;
        report.apac_comments.date = today;
        for recap in &mut report.sector_recaps {
            recap.date = today;
        }
        report.created_at = now;
        report.last_modified = now;

        self.save_current_report(&report);
        report
    }

    // --- Clearing ---

    /// Wipes durable drafts and the current-report slot. Today's volatile
    /// entries and saved history are kept.
    pub fn clear_drafts(&mut self) {
        tracing::info!("Clearing durable drafts.");
        self.drafts.clear();
        tier::remove_key(self.kv.as_ref(), keys::CURRENT_REPORT);
    }

    /// Wipes today's volatile entries only.
    pub fn clear_today(&mut self) {
        tracing::info!("Clearing today's live entries.");
        self.today.clear();
    }

    /// Wipes both tiers and every durable key, saved history included.
    pub fn clear_all(&mut self) {
        self.clear_today();
        for key in keys::ALL {
            tier::remove_key(self.kv.as_ref(), key);
        }
    }
}

fn upsert_by_date(reports: &mut Vec<DailyReport>, report: DailyReport) {
    match reports.iter_mut().find(|r| r.date == report.date) {
        Some(existing) => *existing = report,
        None => reports.push(report),
    }
}
