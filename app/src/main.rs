// In app/src/main.rs

use analytics::{AggregationService, TotalsPoller, grid_rows};
use anyhow::{Context, Result};
use app_config::types::Settings;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use core_types::format::{format_currency, format_date};
use core_types::{DailyReport, HistoricalFilter, Metrics, Sector, SectorFilter, SectorRecap, Validate};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storage::{Clock, FileKvStore, KeyValueStore, MemoryKvStore, ReportStore, SystemClock};
use tracing_subscriber::prelude::*;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Daily APAC market memo: sector recaps, desk totals and history.")]
struct Cli {
    /// Read settings from this TOML file instead of `config/`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serves the JSON API.
    Serve,

    /// Saves a sector recap.
    Recap {
        /// Sector label, e.g. "Japan IG" or "japan-ig".
        #[arg(short, long)]
        sector: Sector,

        /// Report date in YYYY-MM-DD format. Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long, allow_hyphen_values = true)]
        pnl: f64,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        risk: f64,

        #[arg(long, default_value_t = 0.0)]
        volumes: f64,

        /// Market moves and flows.
        #[arg(long)]
        moves: String,

        #[arg(long)]
        commentary: String,

        #[arg(long)]
        submitted_by: Option<String>,
    },

    /// Saves the APAC overall comments. Numbers default to the current sector totals.
    Apac {
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        commentary: String,

        #[arg(long, allow_hyphen_values = true)]
        pnl: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        risk: Option<f64>,

        #[arg(long)]
        volumes: Option<f64>,
    },

    /// Prints a report as JSON.
    Report {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Prints the historical grid.
    History {
        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,

        /// "All" or a sector label.
        #[arg(long, default_value = "All")]
        sector: SectorFilter,
    },

    /// Prints submission progress and totals for a date.
    Summary {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Writes the plain-text memo for a date, optionally "e-mailing" it.
    Export {
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Output directory.
        #[arg(long, default_value = "exports")]
        out: PathBuf,

        #[arg(long)]
        email: bool,
    },

    /// Removes durable drafts and the current report.
    ClearDrafts {
        /// Also removes saved history and today's live entries.
        #[arg(long)]
        all: bool,
    },

    /// Loads the sample day as today's report and prints its memo.
    Demo,

    /// Polls the totals for a past or future date and prints every change.
    /// Picks up drafts that other processes save for that date.
    Watch {
        /// Any date except today. Today's entries only exist in the process
        /// that made them.
        #[arg(long)]
        date: NaiveDate,

        /// Stop after this many polls. Runs until Ctrl-C otherwise.
        #[arg(long)]
        ticks: Option<usize>,
    },
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => app_config::load_settings_from_file(path)?,
        None => app_config::load_settings()?,
    };

    init_tracing(&settings.app.log_level);
    tracing::info!(environment = %settings.app.environment, "Starting market memo.");

    let mut store = build_store(&settings);

    match cli.command {
        Commands::Serve => {
            let store = Arc::new(Mutex::new(store));
            web_server::run(&settings.server, store).await?;
        }
        Commands::Recap {
            sector,
            date,
            pnl,
            risk,
            volumes,
            moves,
            commentary,
            submitted_by,
        } => {
            let date = date.unwrap_or_else(|| store.todays_date());
            let mut recap = SectorRecap::new(sector, date, Metrics::new(pnl, risk, volumes));
            recap.market_moves_and_flows = moves;
            recap.market_commentary = commentary;
            recap.submitted_by = submitted_by;
            handle_recap(&mut store, recap)?;
        }
        Commands::Apac {
            date,
            commentary,
            pnl,
            risk,
            volumes,
        } => {
            let date = date.unwrap_or_else(|| store.todays_date());
            handle_apac(&mut store, date, &commentary, pnl, risk, volumes)?;
        }
        Commands::Report { date } => {
            let date = date.unwrap_or_else(|| store.todays_date());
            let report = report_or_seed(&store, date)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::History { from, to, sector } => {
            let filter = HistoricalFilter {
                date_from: from,
                date_to: to,
                sector,
            };
            handle_history(&store, &filter);
        }
        Commands::Summary { date } => {
            let date = date.unwrap_or_else(|| store.todays_date());
            let summary = AggregationService::new(&store).date_summary(date);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Export { date, out, email } => {
            let date = date.unwrap_or_else(|| store.todays_date());
            handle_export(&store, date, &out, email).await?;
        }
        Commands::ClearDrafts { all } => {
            if all {
                store.clear_all();
            } else {
                store.clear_drafts();
            }
            println!("Drafts cleared.");
        }
        Commands::Demo => {
            handle_demo(&mut store);
        }
        Commands::Watch { date, ticks } => {
            ensure_watchable(&store, date)?;
            let interval = Duration::from_millis(settings.polling.interval_ms);
            handle_watch(store, date, interval, ticks).await;
        }
    }

    Ok(())
}

/// Installs the fmt subscriber. Unknown level names fall back to `info`.
fn init_tracing(log_level: &str) {
    let level = tracing::Level::from_str(log_level).unwrap_or(tracing::Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(tracing_subscriber::filter::Targets::new().with_default(level));
    tracing_subscriber::registry().with(fmt_layer).init();
}

/// Opens the file-backed store, or an in-memory one if the directory is unusable.
fn build_store(settings: &Settings) -> ReportStore {
    let kv: Arc<dyn KeyValueStore> =
        match FileKvStore::open(&settings.storage.dir, settings.storage.quota_bytes) {
            Ok(kv) => Arc::new(kv),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    dir = %settings.storage.dir.display(),
                    "Storage directory unavailable, nothing will be persisted."
                );
                Arc::new(MemoryKvStore::new())
            }
        };
    let clock = Arc::new(SystemClock);
    let seed = seed_data::generate_historical(clock.today(), settings.seed.days, settings.seed.rng_seed);
    tracing::debug!(reports = seed.len(), "Generated seed history.");
    ReportStore::new(kv, clock, seed)
}

// --- Subcommand Logic ---

/// The report for `date`. When nothing has been entered today, today's seed
/// report stands in.
fn report_or_seed(store: &ReportStore, date: NaiveDate) -> Result<DailyReport> {
    store
        .report_by_date(date)
        .or_else(|| store.historical_data().into_iter().find(|r| r.date == date))
        .with_context(|| format!("No report for {date}"))
}

fn handle_recap(store: &mut ReportStore, recap: SectorRecap) -> Result<()> {
    recap.validate()?;
    let (sector, date) = (recap.sector, recap.date);
    store.set_sector_recap(recap);

    if store.is_todays_date(date) {
        tracing::warn!("Today's entries live in memory and are gone when this command exits.");
    }

    let totals = AggregationService::new(store).calculate_apac_totals(date);
    println!(
        "Saved {sector} for {}. APAC P&L now {}.",
        format_date(date),
        format_currency(totals.pnl)
    );
    Ok(())
}

fn handle_apac(
    store: &mut ReportStore,
    date: NaiveDate,
    commentary: &str,
    pnl: Option<f64>,
    risk: Option<f64>,
    volumes: Option<f64>,
) -> Result<()> {
    let mut comments = AggregationService::new(store).apac_comments_with_totals(commentary, date);
    if let Some(pnl) = pnl {
        comments.pnl = pnl;
    }
    if let Some(risk) = risk {
        comments.risk = risk;
    }
    if let Some(volumes) = volumes {
        comments.volumes = volumes;
    }
    comments.validate()?;
    store.set_apac_comments(comments);

    let complete = AggregationService::new(store).is_date_complete(date);
    println!(
        "Saved APAC comments for {}. Complete: {}.",
        format_date(date),
        if complete { "yes" } else { "no" }
    );
    Ok(())
}

fn handle_history(store: &ReportStore, filter: &HistoricalFilter) {
    let rows = grid_rows(&store.historical_data(), filter);
    for row in &rows {
        println!(
            "{}  {:<14} {:<40}  {}",
            row.date, row.sector, row.daily_pnl, row.submitted_by
        );
    }
    println!("{} rows", rows.len());
}

async fn handle_export(store: &ReportStore, date: NaiveDate, out: &Path, email: bool) -> Result<()> {
    let report = report_or_seed(store, date)?;
    let path = export::export_memo(&report, out)?;
    println!("Wrote {}", path.display());

    if email {
        let receipt = export::simulate_email_send(&report, Duration::from_millis(1500)).await;
        println!("Sent \"{}\" to {}", receipt.subject, receipt.to);
    }
    Ok(())
}

fn handle_demo(store: &mut ReportStore) {
    let today = store.todays_date();
    for recap in seed_data::sample_sector_recaps(today) {
        store.set_sector_recap(recap);
    }
    store.set_apac_comments(seed_data::sample_apac_comments(today));
    store.initialize_today_with_sample(seed_data::sample_report(today));

    match store.todays_report() {
        Some(report) => print!("{}", export::render_memo(&report)),
        None => tracing::error!("Sample data did not produce a report."),
    }
}

/// Refuses today: this process's volatile tier is empty and nothing else can
/// write to it, so the totals would stay at zero.
fn ensure_watchable(store: &ReportStore, date: NaiveDate) -> Result<()> {
    if store.is_todays_date(date) {
        anyhow::bail!(
            "Cannot watch {date}: today's entries stay in the process that made them. \
             Poll GET /api/reports/{date}/summary on the server instead."
        );
    }
    Ok(())
}

async fn handle_watch(store: ReportStore, date: NaiveDate, interval: Duration, ticks: Option<usize>) {
    let store = Arc::new(Mutex::new(store));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let poller = TotalsPoller::spawn(store, date, interval, move |snapshot| {
        let _ = tx.send(snapshot);
    });

    let mut last: Option<Metrics> = None;
    let mut seen = 0usize;
    loop {
        tokio::select! {
            Some(snapshot) = rx.recv() => {
                seen += 1;
                if last != Some(snapshot.totals) {
                    println!(
                        "{}  P&L {}  Risk {}  Volumes {}  ({} of {} sectors)",
                        snapshot.polled_at.format("%H:%M:%S"),
                        format_currency(snapshot.totals.pnl),
                        format_currency(snapshot.totals.risk),
                        format_currency(snapshot.totals.volumes),
                        snapshot.breakdown.len(),
                        Sector::COUNT,
                    );
                    last = Some(snapshot.totals);
                }
                if ticks.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
            else => break,
        }
    }
    poller.stop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::FixedClock;

    fn store_on(today: NaiveDate) -> ReportStore {
        ReportStore::new(
            Arc::new(MemoryKvStore::new()),
            Arc::new(FixedClock::on(today)),
            Vec::new(),
        )
    }

    #[test]
    fn watch_requires_a_date() {
        assert!(Cli::try_parse_from(["market-memo", "watch"]).is_err());

        let cli = Cli::try_parse_from(["market-memo", "watch", "--date", "2024-03-13", "--ticks", "3"]).unwrap();
        match cli.command {
            Commands::Watch { date, ticks } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 13).unwrap());
                assert_eq!(ticks, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn watching_today_is_refused() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let store = store_on(today);

        let err = ensure_watchable(&store, today).unwrap_err();
        assert!(err.to_string().contains("2024-03-14"));
        assert!(ensure_watchable(&store, today.pred_opt().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn watching_another_day_sees_durable_drafts() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let yesterday = today.pred_opt().unwrap();
        let mut store = store_on(today);
        store.set_sector_recap(SectorRecap::new(Sector::Sovs, yesterday, Metrics::new(42.0, 0.0, 0.0)));

        let store = Arc::new(Mutex::new(store));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let poller = TotalsPoller::spawn(store, yesterday, Duration::from_millis(5), move |s| {
            let _ = tx.send(s);
        });
        let snapshot = rx.recv().await.unwrap();
        poller.stop();

        assert_eq!(snapshot.totals.pnl, 42.0);
    }
}
