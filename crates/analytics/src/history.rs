// In crates/analytics/src/history.rs

use core_types::format::format_currency;
use core_types::{DailyReport, HistoricalFilter, Metrics};
use std::cmp::Ordering;

use crate::types::HistoryRow;

pub const APAC_OVERALL: &str = "APAC Overall";

/// Flattens reports into the rows of the historical view.
///
/// Reports outside the filter's date range are dropped. Each remaining report
/// yields an APAC Overall row plus one row per recap matching the sector
/// filter. Rows are sorted newest date first, APAC before sectors, sectors
/// alphabetically.
pub fn grid_rows(reports: &[DailyReport], filter: &HistoricalFilter) -> Vec<HistoryRow> {
    let mut rows: Vec<HistoryRow> = Vec::new();

    for report in reports.iter().filter(|r| filter.includes_date(r.date)) {
        let apac = &report.apac_comments;
        let commentary = apac.commentary();
        rows.push(HistoryRow {
            id: format!("{}-apac", report.date),
            date: report.date,
            sector: APAC_OVERALL.to_string(),
            market_moves_and_flows: "Overall Comments".to_string(),
            daily_pnl: describe(&apac.metrics()),
            total_pnl: apac.pnl,
            market_commentary: if commentary.is_empty() {
                "No summary provided".to_string()
            } else {
                commentary.to_string()
            },
            submitted_by: "APAC Desk".to_string(),
        });

        for recap in report
            .sector_recaps
            .iter()
            .filter(|r| filter.sector.matches(r.sector))
        {
            rows.push(HistoryRow {
                id: format!("{}-{}", report.date, recap.sector),
                date: report.date,
                sector: recap.sector.label().to_string(),
                market_moves_and_flows: recap.market_moves_and_flows.clone(),
                daily_pnl: describe(&recap.metrics),
                total_pnl: recap.metrics.pnl,
                market_commentary: recap.market_commentary.clone(),
                submitted_by: recap
                    .submitted_by
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
            });
        }
    }

    rows.sort_by(compare_rows);
    rows
}

fn compare_rows(a: &HistoryRow, b: &HistoryRow) -> Ordering {
    b.date.cmp(&a.date).then_with(|| {
        match (a.sector == APAC_OVERALL, b.sector == APAC_OVERALL) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => a.sector.to_lowercase().cmp(&b.sector.to_lowercase()),
        }
    })
}

fn describe(metrics: &Metrics) -> String {
    format!(
        "P&L: {}, Risk: {}, Volumes: {}",
        format_currency(metrics.pnl),
        format_currency(metrics.risk),
        format_currency(metrics.volumes)
    )
}
