use crate::error::AnalyticsError;
use crate::report::{DatedReturn, ReturnSeries, ReturnsReport};
use core_types::PriceSeries;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Conventional number of trading sessions in a year.
pub const DEFAULT_TRADING_DAYS_PER_YEAR: u32 = 252;

/// A stateless calculator for deriving return metrics from a price history.
#[derive(Debug, Clone, Copy)]
pub struct ReturnsEngine {
    trading_days_per_year: u32,
}

impl Default for ReturnsEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TRADING_DAYS_PER_YEAR)
    }
}

impl ReturnsEngine {
    pub fn new(trading_days_per_year: u32) -> Self {
        Self {
            trading_days_per_year,
        }
    }

    pub fn trading_days_per_year(&self) -> u32 {
        self.trading_days_per_year
    }

    /// The main entry point: derives both return series and the summary report.
    ///
    /// # Arguments
    ///
    /// * `prices` - A sorted, de-duplicated price history with at least two points.
    ///
    /// # Returns
    ///
    /// The `ReturnSeries` and its `ReturnsReport`, or `AnalyticsError::InsufficientData`
    /// when fewer than two prices are available.
    pub fn calculate(
        &self,
        prices: &PriceSeries,
    ) -> Result<(ReturnSeries, ReturnsReport), AnalyticsError> {
        let daily = self.daily_returns(prices)?;
        let cumulative = self.cumulative_returns(&daily)?;

        // daily_returns guarantees two or more prices, so these are present.
        let (first, last) = match (prices.first(), prices.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(AnalyticsError::InsufficientData(prices.len())),
        };
        let total_return = cumulative
            .last()
            .map(|r| r.value)
            .ok_or(AnalyticsError::InsufficientData(prices.len()))?;
        let (best_day, worst_day) = Self::extremes(&daily)?;
        let trading_days = daily.len();
        let annualized_return = self.annualize(total_return, trading_days)?;

        tracing::debug!(
            observations = prices.len(),
            trading_days,
            %total_return,
            ?annualized_return,
            "Computed returns"
        );

        let report = ReturnsReport {
            first_date: first.date,
            last_date: last.date,
            observations: prices.len(),
            trading_days,
            starting_price: first.adj_close,
            ending_price: last.adj_close,
            total_return,
            annualized_return,
            trading_days_per_year: self.trading_days_per_year,
            best_day,
            worst_day,
        };

        Ok((ReturnSeries { daily, cumulative }, report))
    }

    /// Simple percentage change between consecutive closes, dated at the later close.
    pub fn daily_returns(&self, prices: &PriceSeries) -> Result<Vec<DatedReturn>, AnalyticsError> {
        if prices.len() < 2 {
            return Err(AnalyticsError::InsufficientData(prices.len()));
        }

        prices
            .points()
            .windows(2)
            .map(|w| {
                let ratio = w[1]
                    .adj_close
                    .checked_div(w[0].adj_close)
                    .ok_or_else(|| AnalyticsError::DivisionByZero("daily_return".to_string()))?;
                Ok(DatedReturn::new(w[1].date, ratio - Decimal::ONE))
            })
            .collect()
    }

    /// Running product of `(1 + r)` minus one.
    pub fn cumulative_returns(
        &self,
        daily: &[DatedReturn],
    ) -> Result<Vec<DatedReturn>, AnalyticsError> {
        let mut growth = Decimal::ONE;
        let mut cumulative = Vec::with_capacity(daily.len());

        for (i, r) in daily.iter().enumerate() {
            growth = growth.checked_mul(Decimal::ONE + r.value).ok_or_else(|| {
                AnalyticsError::Calculation(format!("cumulative growth overflowed on {}", r.date))
            })?;
            // 1 + r can round at 28 significant digits; the first entry is r itself.
            let value = if i == 0 { r.value } else { growth - Decimal::ONE };
            cumulative.push(DatedReturn::new(r.date, value));
        }

        Ok(cumulative)
    }

    /// `(1 + total_return) ^ (trading_days_per_year / trading_days) - 1`.
    ///
    /// Short ranges raise the exponent far enough that the compounded growth
    /// can leave Decimal's range. The power is then taken in `f64`; if even
    /// that result cannot be represented, the figure is `None`.
    pub fn annualize(
        &self,
        total_return: Decimal,
        trading_days: usize,
    ) -> Result<Option<Decimal>, AnalyticsError> {
        if trading_days == 0 {
            return Err(AnalyticsError::DivisionByZero("annualized_return".to_string()));
        }

        let base = Decimal::ONE + total_return;
        if base.is_zero() {
            return Ok(Some(-Decimal::ONE));
        }
        if base.is_sign_negative() {
            return Err(AnalyticsError::Calculation(format!(
                "total return {total_return} is below -100%"
            )));
        }

        let exponent = f64::from(self.trading_days_per_year) / trading_days as f64;
        if let Some(growth) = base.checked_powf(exponent) {
            return Ok(Some(growth - Decimal::ONE));
        }

        let growth = base
            .to_f64()
            .map(|b| b.powf(exponent))
            .filter(|g| g.is_finite())
            .and_then(Decimal::from_f64);
        if growth.is_none() {
            tracing::warn!(
                %total_return,
                trading_days,
                "Annualized return is out of range; leaving it unset"
            );
        }

        Ok(growth.map(|g| g - Decimal::ONE))
    }

    /// Best and worst single-day returns. Ties resolve to the earliest date.
    fn extremes(daily: &[DatedReturn]) -> Result<(DatedReturn, DatedReturn), AnalyticsError> {
        let first = *daily.first().ok_or(AnalyticsError::InsufficientData(daily.len()))?;

        Ok(daily.iter().skip(1).fold((first, first), |(best, worst), r| {
            let best = if r.value > best.value { *r } else { best };
            let worst = if r.value < worst.value { *r } else { worst };
            (best, worst)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::PricePoint;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series(prices: &[Decimal]) -> PriceSeries {
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, p)| PricePoint::new(date(i as u32 + 2), *p))
            .collect();
        PriceSeries::new(points).unwrap()
    }

    /// Prices whose daily returns are exactly [0.01, -0.03, 0.05, -0.01].
    fn mixed_prices() -> PriceSeries {
        series(&[
            dec!(100),
            dec!(101),
            dec!(97.97),
            dec!(102.8685),
            dec!(101.839815),
        ])
    }

    #[test]
    fn daily_returns_are_simple_percentage_changes() {
        let engine = ReturnsEngine::default();
        let daily = engine.daily_returns(&mixed_prices()).unwrap();

        let values: Vec<_> = daily.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![dec!(0.01), dec!(-0.03), dec!(0.05), dec!(-0.01)]);
        // Dated at the later close of each pair.
        assert_eq!(daily[0].date, date(3));
        assert_eq!(daily[3].date, date(6));
    }

    #[test]
    fn series_lengths_are_one_shorter_than_prices() {
        let engine = ReturnsEngine::default();
        let prices = mixed_prices();
        let (returns, report) = engine.calculate(&prices).unwrap();

        assert_eq!(returns.daily.len(), prices.len() - 1);
        assert_eq!(returns.cumulative.len(), prices.len() - 1);
        assert_eq!(report.observations, 5);
        assert_eq!(report.trading_days, 4);
    }

    #[test]
    fn cumulative_return_compounds_daily_returns() {
        let engine = ReturnsEngine::default();
        let (returns, report) = engine.calculate(&mixed_prices()).unwrap();

        let product = returns
            .daily
            .iter()
            .fold(Decimal::ONE, |acc, r| acc * (Decimal::ONE + r.value));
        let last = returns.cumulative.last().unwrap().value;

        assert_eq!(last, product - Decimal::ONE);
        assert_eq!(report.total_return, last);
        // Compounding, not summation: the plain sum would be 0.02.
        assert_eq!(last, dec!(0.01839815));
        assert_ne!(last, dec!(0.02));
    }

    #[test]
    fn first_cumulative_return_equals_first_daily_return() {
        let engine = ReturnsEngine::default();
        let (returns, _) = engine
            .calculate(&series(&[dec!(3), dec!(1), dec!(7)]))
            .unwrap();

        assert_eq!(returns.cumulative[0].value, returns.daily[0].value);
        assert_eq!(returns.cumulative[0].date, returns.daily[0].date);
    }

    #[test]
    fn cumulative_curve_is_anchored_at_zero() {
        let engine = ReturnsEngine::default();
        let (returns, _) = engine.calculate(&mixed_prices()).unwrap();

        let curve = returns.cumulative_curve(date(2));
        assert_eq!(curve.len(), 5);
        assert_eq!(curve[0], DatedReturn::new(date(2), Decimal::ZERO));
        assert_eq!(curve[1], returns.cumulative[0]);
    }

    #[test]
    fn annualizes_two_years_to_ten_percent() {
        let engine = ReturnsEngine::default();
        let annualized = engine.annualize(dec!(0.21), 504).unwrap().unwrap();

        assert!((annualized - dec!(0.1)).abs() < dec!(0.000001), "got {annualized}");
    }

    #[test]
    fn annualization_divisor_is_configurable() {
        // Half a year of sessions: the growth is compounded twice.
        let engine = ReturnsEngine::new(252);
        let annualized = engine.annualize(dec!(0.1), 126).unwrap().unwrap();

        assert!((annualized - dec!(0.21)).abs() < dec!(0.000001), "got {annualized}");
    }

    #[test]
    fn annualize_rejects_zero_trading_days() {
        let engine = ReturnsEngine::default();
        assert!(matches!(
            engine.annualize(dec!(0.1), 0),
            Err(AnalyticsError::DivisionByZero(_))
        ));
    }

    #[test]
    fn total_loss_annualizes_to_minus_one() {
        let engine = ReturnsEngine::default();
        assert_eq!(engine.annualize(dec!(-1), 10).unwrap(), Some(dec!(-1)));
    }

    #[test]
    fn loss_beyond_total_is_rejected() {
        let engine = ReturnsEngine::default();
        assert!(matches!(
            engine.annualize(dec!(-1.5), 10),
            Err(AnalyticsError::Calculation(msg)) if msg.contains("below -100%")
        ));
    }

    #[test]
    fn large_single_day_move_still_produces_a_report() {
        let engine = ReturnsEngine::default();
        let (returns, report) = engine.calculate(&series(&[dec!(100), dec!(135)])).unwrap();

        assert_eq!(returns.len(), 1);
        assert_eq!(report.total_return, dec!(0.35));
        assert_eq!(report.trading_days, 1);
        // 1.35^252 is far beyond what a Decimal can hold.
        assert_eq!(report.annualized_return, None);
        assert_eq!(report.best_day, DatedReturn::new(date(3), dec!(0.35)));
        assert_eq!(report.worst_day, DatedReturn::new(date(3), dec!(0.35)));
    }

    #[test]
    fn one_day_move_within_range_is_annualized() {
        let engine = ReturnsEngine::default();
        let annualized = engine.annualize(dec!(0.01), 1).unwrap().unwrap();

        let expected = Decimal::from_f64(1.01f64.powf(252.0) - 1.0).unwrap();
        let relative = ((annualized - expected) / expected).abs();
        assert!(relative < dec!(0.000001), "got {annualized}, expected {expected}");
    }

    #[test]
    fn one_day_loss_annualizes_towards_minus_one() {
        let engine = ReturnsEngine::default();
        let annualized = engine.annualize(dec!(-0.5), 1).unwrap().unwrap();

        assert!(annualized > dec!(-1));
        assert!(annualized < dec!(-0.999999));
    }

    #[test]
    fn best_and_worst_days_are_matched_to_dates() {
        let engine = ReturnsEngine::default();
        let (_, report) = engine.calculate(&mixed_prices()).unwrap();

        assert_eq!(report.best_day, DatedReturn::new(date(5), dec!(0.05)));
        assert_eq!(report.worst_day, DatedReturn::new(date(4), dec!(-0.03)));
    }

    #[test]
    fn report_carries_price_endpoints() {
        let engine = ReturnsEngine::default();
        let (_, report) = engine.calculate(&mixed_prices()).unwrap();

        assert_eq!(report.first_date, date(2));
        assert_eq!(report.last_date, date(6));
        assert_eq!(report.starting_price, dec!(100));
        assert_eq!(report.ending_price, dec!(101.839815));
        assert_eq!(report.trading_days_per_year, 252);
    }

    #[test]
    fn single_price_is_insufficient() {
        let engine = ReturnsEngine::default();
        let result = engine.calculate(&series(&[dec!(100)]));
        assert_eq!(result.unwrap_err(), AnalyticsError::InsufficientData(1));
    }

    #[test]
    fn empty_series_is_insufficient() {
        let engine = ReturnsEngine::default();
        let result = engine.calculate(&PriceSeries::default());
        assert_eq!(result.unwrap_err(), AnalyticsError::InsufficientData(0));
    }
}
