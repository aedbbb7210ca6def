// In crates/export/src/lib.rs

//! Turns a finished `DailyReport` into something that leaves the process:
//! a plain-text memo on disk, or a (simulated) e-mail.

use chrono::{DateTime, Utc};
use core_types::format::{format_currency, format_date};
use core_types::{ApacComments, DailyReport, SectorRecap};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub mod error;

pub use error::{Error, Result};

pub const MEMO_TITLE: &str = "APAC Market Memo";
pub const DESK_ADDRESS: &str = "trading-desk@company.com";

/// `Market_Memo_2024_03_14.<ext>`.
pub fn memo_filename(report: &DailyReport, extension: &str) -> String {
    format!("Market_Memo_{}.{extension}", report.date.format("%Y_%m_%d"))
}

/// The consolidated memo for one report. Its `Display` output is the
/// plain-text memo. Sectors appear in canonical order regardless of how the
/// report stores them.
pub struct Memo<'a>(pub &'a DailyReport);

impl fmt::Display for Memo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "{MEMO_TITLE}")?;
        writeln!(f, "{}", format_date(report.date))?;
        writeln!(f)?;

        write_apac(f, &report.apac_comments)?;
        for recap in report.sorted_recaps() {
            write_recap(f, recap)?;
        }

        writeln!(
            f,
            "Last modified: {}",
            report.last_modified.format("%Y-%m-%d %H:%M UTC")
        )
    }
}

/// Renders the memo as plain text.
pub fn render_memo(report: &DailyReport) -> String {
    Memo(report).to_string()
}

fn write_apac(f: &mut fmt::Formatter<'_>, apac: &ApacComments) -> fmt::Result {
    writeln!(f, "APAC Overall Comments")?;
    writeln!(f, "P&L: {}", format_currency(apac.pnl))?;
    writeln!(f, "Risk: {}", format_currency(apac.risk))?;
    writeln!(f, "Volumes: {}", format_currency(apac.volumes))?;
    let commentary = apac.commentary();
    if !commentary.is_empty() {
        writeln!(f, "{commentary}")?;
    }
    writeln!(f)
}

fn write_recap(f: &mut fmt::Formatter<'_>, recap: &SectorRecap) -> fmt::Result {
    writeln!(f, "{}", recap.sector)?;
    writeln!(f, "Market Moves and Flows:")?;
    writeln!(f, "{}", or_fallback(&recap.market_moves_and_flows, "No market moves reported."))?;
    writeln!(
        f,
        "P&L: {} | Risk: {} | Volumes: {}",
        format_currency(recap.metrics.pnl),
        format_currency(recap.metrics.risk),
        format_currency(recap.metrics.volumes)
    )?;
    writeln!(f, "Market Commentary:")?;
    writeln!(f, "{}", or_fallback(&recap.market_commentary, "No market commentary provided."))?;
    if let Some(trader) = &recap.submitted_by {
        writeln!(f, "Submitted by {trader}")?;
    }
    writeln!(f)
}

fn or_fallback<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.trim().is_empty() { fallback } else { text }
}

/// Writes the memo into `dir` and returns the file's path.
pub fn export_memo(report: &DailyReport, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let path = dir.join(memo_filename(report, "txt"));
    std::fs::write(&path, render_memo(report))?;
    tracing::info!(path = %path.display(), date = %report.date, "Memo exported.");
    Ok(path)
}

/// What a (simulated) send produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailReceipt {
    pub to: String,
    pub subject: String,
    pub attachments: Vec<String>,
    pub sent_at: DateTime<Utc>,
}

/// Pretends to e-mail the memo to the desk after a network-like delay.
pub async fn simulate_email_send(report: &DailyReport, delay: Duration) -> EmailReceipt {
    tokio::time::sleep(delay).await;
    let receipt = EmailReceipt {
        to: DESK_ADDRESS.to_string(),
        subject: format!("{MEMO_TITLE} - {}", format_date(report.date)),
        attachments: vec![memo_filename(report, "pdf")],
        sent_at: Utc::now(),
    };
    tracing::info!(to = %receipt.to, subject = %receipt.subject, "Email sent.");
    receipt
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::{Metrics, Sector};

    fn report() -> DailyReport {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let mut sovs = SectorRecap::new(Sector::Sovs, date, Metrics::new(-1_500.0, 3_000.0, 35e6));
        sovs.market_commentary = "Two-way flows".into();
        let mut japan = SectorRecap::new(Sector::JapanIg, date, Metrics::new(200_000.0, 0.0, 0.0));
        japan.market_moves_and_flows = "Constructive".into();
        japan.submitted_by = Some("Trader B".into());
        let mut apac = ApacComments::from_totals(Metrics::new(198_500.0, 3_000.0, 35e6), date);
        apac.market_commentary = Some("IG unch to 2bps tighter".into());
        let stamp = date.and_hms_opt(17, 45, 0).unwrap().and_utc();
        DailyReport {
            date,
            apac_comments: apac,
            sector_recaps: vec![sovs, japan],
            created_at: stamp,
            last_modified: stamp,
        }
    }

    #[test]
    fn filename_uses_underscored_date() {
        assert_eq!(memo_filename(&report(), "pdf"), "Market_Memo_2024_03_05.pdf");
    }

    #[test]
    fn memo_lists_apac_then_sectors_in_canonical_order() {
        let memo = render_memo(&report());
        assert!(memo.starts_with("APAC Market Memo\nMar 5, 2024\n"));
        assert!(memo.contains("P&L: +199k\nRisk: +3k\nVolumes: +35.0M\nIG unch to 2bps tighter\n"));
        let japan = memo.find("Japan IG").unwrap();
        let sovs = memo.find("Sovs").unwrap();
        assert!(memo.find("APAC Overall Comments").unwrap() < japan);
        assert!(japan < sovs);
        assert!(memo.contains("Submitted by Trader B"));
        assert!(memo.contains("P&L: -2k | Risk: +3k | Volumes: +35.0M"));
        assert!(memo.ends_with("Last modified: 2024-03-05 17:45 UTC\n"));
    }

    #[test]
    fn memo_display_matches_rendered_text() {
        let report = report();
        assert_eq!(format!("{}", Memo(&report)), render_memo(&report));
    }

    #[test]
    fn memo_fills_blank_sections_with_fallbacks() {
        let memo = render_memo(&report());
        assert!(memo.contains("No market moves reported."));
        assert!(memo.contains("No market commentary provided."));
    }

    #[test]
    fn export_writes_the_memo_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_memo(&report(), dir.path().join("out")).unwrap();
        assert_eq!(path.file_name().unwrap(), "Market_Memo_2024_03_05.txt");
        assert_eq!(std::fs::read_to_string(path).unwrap(), render_memo(&report()));
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_email_addresses_the_desk() {
        let receipt = simulate_email_send(&report(), Duration::from_millis(1500)).await;
        assert_eq!(receipt.to, DESK_ADDRESS);
        assert_eq!(receipt.subject, "APAC Market Memo - Mar 5, 2024");
        assert_eq!(receipt.attachments, vec!["Market_Memo_2024_03_05.pdf".to_string()]);
    }
}
