// In crates/seed-data/src/lib.rs

//! Synthetic history and the fixed demo day.
//!
//! Generated reports are deterministic for a given `(rng_seed, date)` pair,
//! so a restarted process shows the same history.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use core_types::{ApacComments, DailyReport, Metrics, Sector, SectorRecap};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const MARKET_SUMMARIES: [&str; 5] = [
    "APAC credit held up despite global headwinds. Spreads were stable with selective buying.",
    "Mixed session: Japan outperformed on policy expectations while volatility stayed elevated.",
    "Constructive tone across most sectors with steady demand for quality names.",
    "Cautious trading focused on duration risk. Flows were light but two-way.",
    "Financials outperformed and offset TMT weakness. Overall P&L positive in a choppy market.",
];

/// Generates one report per weekday, walking back `days` calendar days from
/// `today` (inclusive). Newest first.
///
/// Every report carries all six sectors and APAC numbers equal to the sector
/// totals.
pub fn generate_historical(today: NaiveDate, days: u32, rng_seed: u64) -> Vec<DailyReport> {
    (0..u64::from(days))
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .filter(|date| !matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
        .map(|date| generate_day(date, rng_seed))
        .collect()
}

/// The synthetic report for a single date.
pub fn generate_day(date: NaiveDate, rng_seed: u64) -> DailyReport {
    let mut rng = StdRng::seed_from_u64(day_seed(date, rng_seed));

    let sector_recaps: Vec<SectorRecap> = sample_sector_recaps(date)
        .into_iter()
        .map(|mut recap| {
            recap.metrics = Metrics::new(
                rng.gen_range(-200_000..200_000) as f64,
                rng.gen_range(0..100_000) as f64,
                (rng.gen_range(1..500) * 1_000_000) as f64,
            );
            recap
        })
        .collect();

    let totals: Metrics = sector_recaps.iter().map(|r| r.metrics).sum();
    let mut apac_comments = ApacComments::from_totals(totals, date);
    apac_comments.market_commentary = MARKET_SUMMARIES
        .choose(&mut rng)
        .map(|summary| summary.to_string());

    let stamp = date
        .and_time(NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN))
        .and_utc();

    DailyReport {
        date,
        apac_comments,
        sector_recaps,
        created_at: stamp,
        last_modified: stamp,
    }
}

fn day_seed(date: NaiveDate, rng_seed: u64) -> u64 {
    // Spread neighbouring dates across the seed space.
    rng_seed ^ (date.num_days_from_ce() as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// The fixed demo recaps, one per sector, dated `date`.
pub fn sample_sector_recaps(date: NaiveDate) -> Vec<SectorRecap> {
    Sector::ALL
        .into_iter()
        .map(|sector| {
            let (moves, commentary, trader, metrics) = sample_entry(sector);
            SectorRecap {
                sector,
                market_moves_and_flows: moves.to_string(),
                metrics,
                market_commentary: commentary.to_string(),
                date,
                submitted_by: Some(trader.to_string()),
            }
        })
        .collect()
}

fn sample_entry(sector: Sector) -> (&'static str, &'static str, &'static str, Metrics) {
    match sector {
        Sector::AustraliaIg => (
            "Constructive sentiment after the tariff headline.",
            "Spreads unchanged to 2bps tighter on light flows. Steady demand in senior financials and T2s; corporates saw interest in the NBN curve.",
            "Trader A",
            Metrics::new(200_000.0, 45_000.0, 62_000_000.0),
        ),
        Sector::JapanIg => (
            "Constructive sentiment after the tariff headline.",
            "Cash spreads firm after the holiday, IG -1/-2 and HY +0.05/+0.15. CDSI closed 60 (-1/2) with protection sellers.",
            "Trader B",
            Metrics::new(200_000.0, 18_000.0, 55_000_000.0),
        ),
        Sector::ChinaIg => (
            "NA",
            "A bit of pullback, closing +3/-1. TW names gave back 3bps; HK names active with buyers across perps and bullets.",
            "Trader C",
            Metrics::new(-30_000.0, 9_000.0, 41_000_000.0),
        ),
        Sector::SeaIg => (
            "NA",
            "Rally in US rates brought profit takers into IG spreads; the rest of the curve was two-way.",
            "Trader D",
            Metrics::new(170_000.0, 4_000.0, 38_000_000.0),
        ),
        Sector::IndiaIg => (
            "NA",
            "Spreads 1-2bps tighter with profit booking; flows across the 26s to 29s and light two-way in 10 years.",
            "Trader E",
            Metrics::new(200_000.0, 3_000.0, 37_000_000.0),
        ),
        Sector::Sovs => (
            "NA",
            "Two-way flows led by ETFs and Asia real money while international investors shunned tight valuations.",
            "Trader F",
            Metrics::new(180_000.0, 3_000.0, 35_000_000.0),
        ),
    }
}

/// The fixed demo APAC summary, dated `date`.
pub fn sample_apac_comments(date: NaiveDate) -> ApacComments {
    let totals: Metrics = sample_sector_recaps(date).iter().map(|r| r.metrics).sum();
    let mut comments = ApacComments::from_totals(totals, date);
    comments.market_commentary =
        Some("Corp IG unch to 2bps tighter. HY unch to 0.25pt higher. CDS -0.25 to 0.25.".into());
    comments
}

/// The complete demo day as a report.
pub fn sample_report(date: NaiveDate) -> DailyReport {
    let stamp = date
        .and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN))
        .and_utc();
    DailyReport {
        date,
        apac_comments: sample_apac_comments(date),
        sector_recaps: sample_sector_recaps(date),
        created_at: stamp,
        last_modified: stamp,
    }
}
