use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A return attributed to the trading day on which it was realized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatedReturn {
    pub date: NaiveDate,
    pub value: Decimal,
}

impl DatedReturn {
    pub fn new(date: NaiveDate, value: Decimal) -> Self {
        Self { date, value }
    }
}

/// Daily and cumulative returns, both one entry shorter than the price
/// series they were derived from. Entry `i` is dated at price `i + 1`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReturnSeries {
    pub daily: Vec<DatedReturn>,
    pub cumulative: Vec<DatedReturn>,
}

impl ReturnSeries {
    pub fn len(&self) -> usize {
        self.daily.len()
    }

    pub fn is_empty(&self) -> bool {
        self.daily.is_empty()
    }

    /// The cumulative series with a zero anchor on `first_date` prepended,
    /// so it lines up point for point with the price series when plotted.
    pub fn cumulative_curve(&self, first_date: NaiveDate) -> Vec<DatedReturn> {
        std::iter::once(DatedReturn::new(first_date, Decimal::ZERO))
            .chain(self.cumulative.iter().copied())
            .collect()
    }
}

/// Summary statistics for one ticker over one range.
///
/// Return figures are fractions (0.21 means 21%); formatting as percentages
/// is left to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsReport {
    // I. Coverage
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// Number of price observations.
    pub observations: usize,
    /// Number of daily returns, i.e. `observations - 1`.
    pub trading_days: usize,

    // II. Prices
    pub starting_price: Decimal,
    pub ending_price: Decimal,

    // III. Returns
    pub total_return: Decimal,
    /// `None` when the compounded figure is too large to represent, which
    /// happens for big moves over very few trading days.
    pub annualized_return: Option<Decimal>,
    pub trading_days_per_year: u32,

    // IV. Extremes
    pub best_day: DatedReturn,
    pub worst_day: DatedReturn,
}
