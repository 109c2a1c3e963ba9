use crate::error::ReportError;
use analytics::DatedReturn;
use chrono::{Datelike, NaiveDate};
use core_types::PriceSeries;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

const PRICE_COLOR: &str = "#1f77b4";
const CUMULATIVE_COLOR: &str = "#ff7f0e";
const GRID_COLOR: &str = "#b0b0b0";
const AXIS_COLOR: &str = "#333333";

const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 60.0;
const PANEL_GAP: f64 = 70.0;
const Y_TICKS: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
        }
    }
}

/// One series drawn in one panel.
struct Panel<'a> {
    title: String,
    y_label: &'a str,
    legend: &'a str,
    color: &'a str,
    points: Vec<(NaiveDate, f64)>,
    format_tick: fn(f64) -> String,
    zero_line: bool,
}

/// Pixel geometry shared by both panels.
struct Frame {
    left: f64,
    right: f64,
    first_day: i64,
    span_days: f64,
}

impl Frame {
    fn x(&self, date: NaiveDate) -> f64 {
        let offset = (date.num_days_from_ce() as i64 - self.first_day) as f64;
        self.left + (self.right - self.left) * offset / self.span_days
    }
}

/// Renders the two-panel chart: adjusted close on top, cumulative return (in
/// percent) below, sharing one date axis.
///
/// `cumulative` is expected to be the zero-anchored curve, one point per price.
pub fn render_chart(
    ticker: &str,
    prices: &PriceSeries,
    cumulative: &[DatedReturn],
    options: &ChartOptions,
) -> Result<String, ReportError> {
    let (first, last) = match (prices.first(), prices.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => return Err(ReportError::EmptySeries("price series is empty".to_string())),
    };
    if cumulative.is_empty() {
        return Err(ReportError::EmptySeries("cumulative series is empty".to_string()));
    }

    let width = f64::from(options.width);
    let height = f64::from(options.height);
    let panel_height = ((height - MARGIN_TOP - MARGIN_BOTTOM - PANEL_GAP) / 2.0).max(20.0);
    let frame = Frame {
        left: MARGIN_LEFT,
        right: (width - MARGIN_RIGHT).max(MARGIN_LEFT + 1.0),
        first_day: first.num_days_from_ce() as i64,
        span_days: ((last - first).num_days() as f64).max(1.0),
    };

    let price_panel = Panel {
        title: format!("{} Adjusted Close Price", escape_xml(ticker)),
        y_label: "Price (USD)",
        legend: "Adjusted Close",
        color: PRICE_COLOR,
        points: prices
            .points()
            .iter()
            .map(|p| (p.date, to_f64(p.adj_close)))
            .collect(),
        format_tick: |v: f64| format!("{v:.0}"),
        zero_line: false,
    };
    let cumulative_panel = Panel {
        title: "Cumulative Return Since Start Date".to_string(),
        y_label: "Cumulative Return (%)",
        legend: "Cumulative Return",
        color: CUMULATIVE_COLOR,
        points: cumulative
            .iter()
            .map(|r| (r.date, to_f64(r.value) * 100.0))
            .collect(),
        format_tick: |v: f64| format!("{v:.0}%"),
        zero_line: true,
    };

    let mut svg = String::new();
    let _ = write!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><style>text{{font-family:Arial,sans-serif;font-size:12px;fill:{axis}}}.title{{font-size:15px;font-weight:bold}}</style><rect width="100%" height="100%" fill="#ffffff" />"##,
        w = options.width,
        h = options.height,
        axis = AXIS_COLOR,
    );

    let top = MARGIN_TOP;
    let bottom_top = MARGIN_TOP + panel_height + PANEL_GAP;
    draw_panel(&mut svg, &frame, &price_panel, top, panel_height);
    draw_panel(&mut svg, &frame, &cumulative_panel, bottom_top, panel_height);

    // Date ticks: grid on both panels, labels under the bottom one.
    let axis_y = bottom_top + panel_height;
    for tick in date_ticks(first, last) {
        let x = frame.x(tick);
        for panel_top in [top, bottom_top] {
            let _ = write!(
                svg,
                r#"<line x1="{x:.2}" y1="{y1:.2}" x2="{x:.2}" y2="{y2:.2}" stroke="{GRID_COLOR}" stroke-width="0.6" stroke-dasharray="4 3" stroke-opacity="0.6" />"#,
                y1 = panel_top,
                y2 = panel_top + panel_height,
            );
        }
        let label = if (last - first).num_days() > 3 * 366 {
            tick.format("%Y").to_string()
        } else {
            tick.format("%Y-%m").to_string()
        };
        let _ = write!(
            svg,
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">{label}</text>"#,
            y = axis_y + 18.0,
        );
    }
    let _ = write!(
        svg,
        r#"<text x="{x:.2}" y="{y:.2}" text-anchor="middle">Date</text>"#,
        x = (frame.left + frame.right) / 2.0,
        y = axis_y + 42.0,
    );

    svg.push_str("</svg>");
    Ok(svg)
}

/// Writes the rendered chart, creating parent directories as needed.
pub fn write_chart(path: &Path, svg: &str) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, svg)?;
    tracing::info!(path = %path.display(), bytes = svg.len(), "Chart written");
    Ok(())
}

fn draw_panel(svg: &mut String, frame: &Frame, panel: &Panel<'_>, top: f64, height: f64) {
    let bottom = top + height;
    let (min_v, max_v) = extent(&panel.points, panel.zero_line);
    let scale_y = |v: f64| bottom - (v - min_v) / (max_v - min_v) * height;

    let _ = write!(
        svg,
        r#"<text class="title" x="{x:.2}" y="{y:.2}" text-anchor="middle">{title}</text>"#,
        x = (frame.left + frame.right) / 2.0,
        y = top - 12.0,
        title = panel.title,
    );

    // Horizontal grid with value labels.
    for value in nice_ticks(min_v, max_v, Y_TICKS) {
        let y = scale_y(value);
        let _ = write!(
            svg,
            r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{GRID_COLOR}" stroke-width="0.6" stroke-dasharray="4 3" stroke-opacity="0.6" />"#,
            x1 = frame.left,
            x2 = frame.right,
        );
        let _ = write!(
            svg,
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end">{label}</text>"#,
            x = frame.left - 8.0,
            y = y + 4.0,
            label = (panel.format_tick)(value),
        );
    }

    if panel.zero_line && min_v <= 0.0 && 0.0 <= max_v {
        let _ = write!(
            svg,
            r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{AXIS_COLOR}" stroke-width="0.8" />"#,
            x1 = frame.left,
            x2 = frame.right,
            y = scale_y(0.0),
        );
    }

    let _ = write!(
        svg,
        r#"<rect x="{x:.2}" y="{top:.2}" width="{w:.2}" height="{height:.2}" fill="none" stroke="{AXIS_COLOR}" stroke-width="1" />"#,
        x = frame.left,
        w = frame.right - frame.left,
    );

    let mid = top + height / 2.0;
    let label_x = frame.left - 62.0;
    let _ = write!(
        svg,
        r#"<text x="{label_x:.2}" y="{mid:.2}" text-anchor="middle" transform="rotate(-90 {label_x:.2} {mid:.2})">{label}</text>"#,
        label = panel.y_label,
    );

    let coords = panel
        .points
        .iter()
        .filter(|(_, v)| v.is_finite())
        .map(|(date, v)| format!("{:.2},{:.2}", frame.x(*date), scale_y(*v)))
        .collect::<Vec<_>>()
        .join(" ");
    let _ = write!(
        svg,
        r#"<polyline fill="none" stroke="{color}" stroke-width="1.4" points="{coords}" />"#,
        color = panel.color,
    );

    // Legend in the upper-left corner.
    let lx = frame.left + 12.0;
    let ly = top + 16.0;
    let _ = write!(
        svg,
        r##"<rect x="{rx:.2}" y="{ry:.2}" width="150" height="22" fill="#ffffff" fill-opacity="0.8" stroke="{GRID_COLOR}" /><line x1="{lx:.2}" y1="{ly:.2}" x2="{lx2:.2}" y2="{ly:.2}" stroke="{color}" stroke-width="2" /><text x="{tx:.2}" y="{ty:.2}">{legend}</text>"##,
        rx = lx - 6.0,
        ry = ly - 11.0,
        lx2 = lx + 22.0,
        tx = lx + 28.0,
        ty = ly + 4.0,
        color = panel.color,
        legend = panel.legend,
    );
}

/// Min and max of the finite values, widened when flat.
fn extent(points: &[(NaiveDate, f64)], include_zero: bool) -> (f64, f64) {
    let (mut min_v, mut max_v) = points
        .iter()
        .map(|(_, v)| *v)
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !min_v.is_finite() || !max_v.is_finite() {
        return (0.0, 1.0);
    }
    if include_zero {
        min_v = min_v.min(0.0);
        max_v = max_v.max(0.0);
    }
    if min_v == max_v {
        let pad = if min_v == 0.0 { 1.0 } else { min_v.abs() * 0.1 };
        min_v -= pad;
        max_v += pad;
    }
    let pad = (max_v - min_v) * 0.05;
    (min_v - pad, max_v + pad)
}

/// Round-numbered ticks (steps of 1, 2 or 5 times a power of ten) inside `[min, max]`.
fn nice_ticks(min: f64, max: f64, target: usize) -> Vec<f64> {
    if !(max > min) || target == 0 {
        return Vec::new();
    }
    let raw = (max - min) / target as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);

    let mut ticks = Vec::new();
    let mut value = (min / step).ceil() * step;
    while value <= max {
        // Clear accumulated float noise such as 0.30000000000000004.
        ticks.push((value / step).round() * step);
        value += step;
    }
    ticks
}

/// First day of each year in `(first, last]` for long spans; otherwise first of
/// each month, thinned so at most a dozen labels remain.
fn date_ticks(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let long_span = (last - first).num_days() > 3 * 366;
    let mut ticks = Vec::new();
    let (mut year, mut month) = (first.year(), first.month());

    loop {
        (year, month) = if long_span || month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        match NaiveDate::from_ymd_opt(year, month, 1) {
            Some(tick) if tick <= last => ticks.push(tick),
            _ => break,
        }
    }

    let stride = ticks.len().div_ceil(12).max(1);
    ticks.into_iter().step_by(stride).collect()
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::PricePoint;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> (PriceSeries, Vec<DatedReturn>) {
        let prices = PriceSeries::new(vec![
            PricePoint::new(date(2024, 1, 2), dec!(100)),
            PricePoint::new(date(2024, 2, 1), dec!(110)),
            PricePoint::new(date(2024, 3, 1), dec!(99)),
        ])
        .unwrap();
        let curve = vec![
            DatedReturn::new(date(2024, 1, 2), dec!(0)),
            DatedReturn::new(date(2024, 2, 1), dec!(0.1)),
            DatedReturn::new(date(2024, 3, 1), dec!(-0.01)),
        ];
        (prices, curve)
    }

    fn polyline_point_counts(svg: &str) -> Vec<usize> {
        svg.split("<polyline")
            .skip(1)
            .map(|chunk| {
                let start = chunk.find("points=\"").unwrap() + "points=\"".len();
                let end = start + chunk[start..].find('"').unwrap();
                chunk[start..end].split_whitespace().count()
            })
            .collect()
    }

    #[test]
    fn chart_has_two_labelled_panels() {
        let (prices, curve) = sample();
        let svg = render_chart("^IXIC", &prices, &curve, &ChartOptions::default()).unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("^IXIC Adjusted Close Price"));
        assert!(svg.contains("Cumulative Return Since Start Date"));
        assert!(svg.contains("Price (USD)"));
        assert!(svg.contains("Cumulative Return (%)"));
        assert!(svg.contains(">Date</text>"));
        assert!(svg.contains(PRICE_COLOR));
        assert!(svg.contains(CUMULATIVE_COLOR));
        assert_eq!(polyline_point_counts(&svg), vec![3, 3]);
    }

    #[test]
    fn ticker_is_escaped() {
        let (prices, curve) = sample();
        let svg = render_chart("A&B<C>", &prices, &curve, &ChartOptions::default()).unwrap();
        assert!(svg.contains("A&amp;B&lt;C&gt; Adjusted Close Price"));
    }

    #[test]
    fn empty_prices_are_rejected() {
        let result = render_chart("X", &PriceSeries::default(), &[], &ChartOptions::default());
        assert!(matches!(result, Err(ReportError::EmptySeries(_))));
    }

    #[test]
    fn ticks_are_round_numbers_within_range() {
        let ticks = nice_ticks(-3.2, 17.9, 5);
        assert_eq!(ticks, vec![0.0, 5.0, 10.0, 15.0]);
        assert!(nice_ticks(1.0, 1.0, 5).is_empty());
    }

    #[test]
    fn long_spans_tick_yearly() {
        let ticks = date_ticks(date(2005, 1, 3), date(2010, 6, 30));
        assert_eq!(ticks.first(), Some(&date(2006, 1, 1)));
        assert_eq!(ticks.last(), Some(&date(2010, 1, 1)));
        assert_eq!(ticks.len(), 5);
    }

    #[test]
    fn short_spans_tick_monthly() {
        let ticks = date_ticks(date(2024, 1, 2), date(2024, 4, 15));
        assert_eq!(ticks, vec![date(2024, 2, 1), date(2024, 3, 1), date(2024, 4, 1)]);
    }

    #[test]
    fn write_chart_creates_parent_directories() {
        let dir = std::env::temp_dir().join(format!("index-returns-chart-{}", std::process::id()));
        let path = dir.join("nested").join("returns.svg");

        write_chart(&path, "<svg></svg>").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "<svg></svg>");
        fs::remove_dir_all(&dir).unwrap();
    }
}
