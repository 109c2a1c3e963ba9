use crate::error::EngineError;
use analytics::{DatedReturn, ReturnSeries, ReturnsEngine, ReturnsReport};
use api_client::{ApiError, MarketDataProvider};
use chrono::NaiveDate;
use core_types::{CoreError, DateRange, PriceSeries};
use std::sync::Arc;

pub mod error;

/// Everything one run produces, ready for presentation.
#[derive(Debug, Clone)]
pub struct ReturnsAnalysis {
    pub ticker: String,
    /// The range that was requested, which may be wider than the data.
    pub range: DateRange,
    pub prices: PriceSeries,
    pub returns: ReturnSeries,
    pub report: ReturnsReport,
}

impl ReturnsAnalysis {
    /// Cumulative returns anchored at zero on the first price date, one point
    /// per price.
    pub fn cumulative_curve(&self) -> Vec<DatedReturn> {
        self.returns.cumulative_curve(self.report.first_date)
    }
}

/// The orchestrator for a single returns calculation.
pub struct ReturnsCalculator {
    provider: Arc<dyn MarketDataProvider>,
    analytics: ReturnsEngine,
}

impl ReturnsCalculator {
    pub fn new(provider: Arc<dyn MarketDataProvider>, analytics: ReturnsEngine) -> Self {
        Self {
            provider,
            analytics,
        }
    }

    /// Validates the range, fetches prices, and computes returns.
    ///
    /// The range is checked before the provider is contacted. A fetch with no
    /// prices inside the range is `NoData`; a single price is `InsufficientData`.
    pub async fn run(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ReturnsAnalysis, EngineError> {
        let range = DateRange::new(start, end).map_err(|e| match e {
            CoreError::InvalidRange { start, end } => EngineError::InvalidRange { start, end },
            other => EngineError::Core(other),
        })?;

        tracing::info!(ticker, %range, "Fetching adjusted closes");
        let raw = self.provider.fetch_adjusted_closes(ticker, &range).await?;
        if raw.is_empty() {
            return Err(EngineError::NoData {
                ticker: ticker.to_string(),
                range,
            });
        }

        let prices = PriceSeries::new(raw)
            .map_err(|e| EngineError::Upstream(ApiError::InvalidData(e.to_string())))?
            .filter_to(&range);
        tracing::debug!(ticker, points = prices.len(), "Normalized price series");

        if prices.is_empty() {
            return Err(EngineError::NoData {
                ticker: ticker.to_string(),
                range,
            });
        }
        if prices.len() < 2 {
            return Err(EngineError::InsufficientData {
                ticker: ticker.to_string(),
                range,
                points: prices.len(),
            });
        }

        let (returns, report) = self.analytics.calculate(&prices)?;
        tracing::info!(
            ticker,
            trading_days = report.trading_days,
            total_return = %report.total_return,
            "Returns computed"
        );

        Ok(ReturnsAnalysis {
            ticker: ticker.to_string(),
            range,
            prices,
            returns,
            report,
        })
    }
}
