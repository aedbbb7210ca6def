// In crates/storage/src/tier.rs

use chrono::NaiveDate;
use core_types::{ApacComments, Sector, SectorRecap};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::kv::{KeyValueStore, keys};

/// One of the two places a draft can live. `ReportStore` picks the tier for
/// each call by comparing the date with today.
///
/// Tier operations never fail: durable problems are logged and degrade to
/// "nothing stored".
pub trait DraftTier {
    fn sector_recap(&self, sector: Sector, date: NaiveDate) -> Option<SectorRecap>;
    /// Replaces any recap already held for the same sector.
    fn set_sector_recap(&mut self, recap: SectorRecap);
    /// Every recap held for `date`, in insertion order.
    fn sector_recaps(&self, date: NaiveDate) -> Vec<SectorRecap>;
    fn apac_comments(&self, date: NaiveDate) -> Option<ApacComments>;
    fn set_apac_comments(&mut self, comments: ApacComments);
    fn clear(&mut self);
}

/// Volatile storage for today's entries. Lost when the process exits.
///
/// All entries share one date. Saving for a different date drops the stale
/// entries first, which is how a running process rolls over at midnight.
#[derive(Debug, Default, Clone)]
pub struct VolatileTodayStore {
    date: Option<NaiveDate>,
    recaps: Vec<SectorRecap>,
    apac: Option<ApacComments>,
}

impl VolatileTodayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The date the held entries belong to, if any are held.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn is_empty(&self) -> bool {
        self.recaps.is_empty() && self.apac.is_none()
    }

    fn holds(&self, date: NaiveDate) -> bool {
        self.date == Some(date)
    }

    fn roll_to(&mut self, date: NaiveDate) {
        if let Some(held) = self.date.filter(|held| *held != date) {
            tracing::info!(%held, %date, "Discarding volatile entries from a previous day.");
            self.recaps.clear();
            self.apac = None;
        }
        self.date = Some(date);
    }
}

impl DraftTier for VolatileTodayStore {
    fn sector_recap(&self, sector: Sector, date: NaiveDate) -> Option<SectorRecap> {
        if !self.holds(date) {
            return None;
        }
        self.recaps.iter().find(|r| r.sector == sector).cloned()
    }

    fn set_sector_recap(&mut self, recap: SectorRecap) {
        self.roll_to(recap.date);
        upsert_by_sector(&mut self.recaps, recap);
    }

    fn sector_recaps(&self, date: NaiveDate) -> Vec<SectorRecap> {
        if self.holds(date) {
            self.recaps.clone()
        } else {
            Vec::new()
        }
    }

    fn apac_comments(&self, date: NaiveDate) -> Option<ApacComments> {
        self.apac.clone().filter(|c| c.date == date)
    }

    fn set_apac_comments(&mut self, comments: ApacComments) {
        self.roll_to(comments.date);
        self.apac = Some(comments);
    }

    fn clear(&mut self) {
        self.date = None;
        self.recaps.clear();
        self.apac = None;
    }
}

/// Drafts for days other than today, kept in the durable store.
///
/// Sector drafts are not partitioned by date: there is one draft per sector,
/// and a newer draft for that sector replaces it whatever its date. Reads for
/// a date only see drafts whose own date matches.
#[derive(Clone)]
pub struct DurableDrafts {
    kv: Arc<dyn KeyValueStore>,
}

impl DurableDrafts {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// All sector drafts, whatever their date.
    pub fn all_sector_drafts(&self) -> Vec<SectorRecap> {
        read_json(self.kv.as_ref(), keys::DRAFT_SECTORS).unwrap_or_default()
    }

    /// The single APAC draft, whatever its date.
    pub fn apac_draft(&self) -> Option<ApacComments> {
        read_json(self.kv.as_ref(), keys::DRAFT_APAC)
    }
}

impl DraftTier for DurableDrafts {
    fn sector_recap(&self, sector: Sector, date: NaiveDate) -> Option<SectorRecap> {
        self.all_sector_drafts()
            .into_iter()
            .find(|d| d.sector == sector && d.date == date)
    }

    fn set_sector_recap(&mut self, recap: SectorRecap) {
        let mut drafts = self.all_sector_drafts();
        upsert_by_sector(&mut drafts, recap);
        write_json(self.kv.as_ref(), keys::DRAFT_SECTORS, &drafts);
    }

    fn sector_recaps(&self, date: NaiveDate) -> Vec<SectorRecap> {
        self.all_sector_drafts()
            .into_iter()
            .filter(|d| d.date == date)
            .collect()
    }

    fn apac_comments(&self, date: NaiveDate) -> Option<ApacComments> {
        self.apac_draft().filter(|c| c.date == date)
    }

    fn set_apac_comments(&mut self, comments: ApacComments) {
        write_json(self.kv.as_ref(), keys::DRAFT_APAC, &comments);
    }

    fn clear(&mut self) {
        remove_key(self.kv.as_ref(), keys::DRAFT_SECTORS);
        remove_key(self.kv.as_ref(), keys::DRAFT_APAC);
    }
}

/// Replaces the entry for the recap's sector in place, or appends it.
fn upsert_by_sector(recaps: &mut Vec<SectorRecap>, recap: SectorRecap) {
    match recaps.iter_mut().find(|r| r.sector == recap.sector) {
        Some(existing) => *existing = recap,
        None => recaps.push(recap),
    }
}

/// Reads and parses a key. Missing keys, storage errors and malformed JSON
/// all come back as `None`.
pub(crate) fn read_json<T: DeserializeOwned>(kv: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match kv.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read from durable storage.");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring malformed stored value.");
            None
        }
    }
}

/// Serializes and writes a key. Failures are logged and dropped.
pub(crate) fn write_json<T: Serialize + ?Sized>(kv: &dyn KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(crate::Error::from)
        .and_then(|text| kv.set(key, &text));
    if let Err(e) = result {
        tracing::error!(key, error = %e, "Failed to write to durable storage.");
    }
}

pub(crate) fn remove_key(kv: &dyn KeyValueStore, key: &str) {
    if let Err(e) = kv.remove(key) {
        tracing::warn!(key, error = %e, "Failed to remove key from durable storage.");
    }
}
