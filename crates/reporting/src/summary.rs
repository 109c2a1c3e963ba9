use crate::error::ReportError;
use analytics::{DatedReturn, ReturnsReport};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use core_types::DateRange;
use rust_decimal::Decimal;
use serde::Serialize;

/// Renders the human-readable summary: a header line followed by a table.
pub fn render_summary(ticker: &str, range: &DateRange, report: &ReturnsReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Metric", "Value"]);

    let rows = [
        ("Starting adjusted close", format_currency(report.starting_price)),
        ("Ending adjusted close", format_currency(report.ending_price)),
        ("Total cumulative return", format_percent(report.total_return)),
        (
            "Annualized return",
            format!(
                "{} ({} days/yr)",
                report
                    .annualized_return
                    .map_or_else(|| "n/a".to_string(), format_percent),
                report.trading_days_per_year
            ),
        ),
        ("First trading day", report.first_date.to_string()),
        ("Last trading day", report.last_date.to_string()),
        ("Observations", report.observations.to_string()),
        ("Trading days", report.trading_days.to_string()),
        ("Best day", format_day(&report.best_day)),
        ("Worst day", format_day(&report.worst_day)),
    ];
    for (metric, value) in rows {
        table.add_row(vec![
            Cell::new(metric),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }

    format!(
        "Summary for {} from {} to {}:\n{}",
        ticker,
        range.start(),
        range.end(),
        table
    )
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    ticker: &'a str,
    requested_range: &'a DateRange,
    report: &'a ReturnsReport,
}

/// The same summary as pretty-printed JSON. Returns stay fractional.
pub fn render_json(
    ticker: &str,
    range: &DateRange,
    report: &ReturnsReport,
) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(&JsonSummary {
        ticker,
        requested_range: range,
        report,
    })?)
}

fn format_day(day: &DatedReturn) -> String {
    format!("{} on {}", format_percent(day.value), day.date)
}

/// `0.2134` -> `21.34%`.
fn format_percent(value: Decimal) -> String {
    format!("{:.2}%", (value * Decimal::ONE_HUNDRED).round_dp(2))
}

/// `12345.678` -> `$12,345.68`.
fn format_currency(value: Decimal) -> String {
    let rounded = format!("{:.2}", value.abs().round_dp(2));
    let (whole, cents) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value.is_sign_negative() && !value.is_zero() { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}
