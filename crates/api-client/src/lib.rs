use crate::responses::ChartResponse;
use async_trait::async_trait;
use chrono::{Days, NaiveDate, NaiveTime};
use configuration::Provider;
use core_types::{DateRange, PricePoint};
use reqwest::{StatusCode, Url};

pub mod error;
pub mod responses;

// --- Public API ---
pub use error::ApiError;
pub use responses::{ChartErrorBody, ChartResult};

/// The abstract interface for a source of historical prices.
/// The calculator depends only on this trait, so the live HTTP client can be
/// swapped for a mock in tests.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetches daily adjusted closes for `ticker` covering at least `range`.
    ///
    /// The points may be unsorted, may repeat a date, and may spill outside the
    /// range; callers normalize them. An unknown ticker yields an empty vector.
    async fn fetch_adjusted_closes(
        &self,
        ticker: &str,
        range: &DateRange,
    ) -> Result<Vec<PricePoint>, ApiError>;
}

/// A concrete implementation of `MarketDataProvider` backed by the Yahoo
/// Finance chart endpoint.
#[derive(Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    base_url: Url,
}

impl YahooClient {
    pub fn new(provider: &Provider) -> Result<Self, ApiError> {
        let base_url = Url::parse(&provider.base_url).map_err(|e| {
            ApiError::InvalidData(format!("Invalid base URL '{}': {}", provider.base_url, e))
        })?;

        let mut builder = reqwest::Client::builder().user_agent(provider.user_agent.clone());
        if let Some(timeout) = provider.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    /// `{base}/v8/finance/chart/{ticker}`. The ticker is pushed as a single path
    /// segment, so a `/` inside a symbol is escaped.
    fn chart_url(&self, ticker: &str) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ApiError::InvalidData(format!("Base URL '{}' cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", ticker]);
        Ok(url)
    }
}

/// Unix seconds at 00:00 UTC on `date`.
fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::default()).and_utc().timestamp()
}

/// Query window for an inclusive range. Bars are stamped in UTC at the
/// exchange's session open, which can fall on the neighbouring UTC day, so the
/// window is padded by a day on each side; callers filter to the exact range.
fn query_window(range: &DateRange) -> Result<(i64, i64), ApiError> {
    let from = range
        .start()
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| ApiError::InvalidData(format!("Start date out of range: {}", range.start())))?;
    let to = range
        .end()
        .checked_add_days(Days::new(2))
        .ok_or_else(|| ApiError::InvalidData(format!("End date out of range: {}", range.end())))?;
    Ok((midnight_utc(from), midnight_utc(to)))
}

/// Turns a raw chart response into price points.
///
/// A `Not Found` error body, whatever the HTTP status, means the provider has
/// nothing for this ticker and yields an empty vector.
fn interpret_chart(status: StatusCode, body: &str) -> Result<Vec<PricePoint>, ApiError> {
    let response = match serde_json::from_str::<ChartResponse>(body) {
        Ok(response) => response,
        Err(e) if status.is_success() => return Err(ApiError::Deserialization(e.to_string())),
        Err(_) => {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }
    };

    if let Some(error) = response.chart.error {
        if error.is_not_found() {
            tracing::debug!(description = %error.description, "Provider has no data for ticker");
            return Ok(Vec::new());
        }
        return Err(ApiError::Provider {
            code: error.code,
            description: error.description,
        });
    }

    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        });
    }

    match response.chart.result.and_then(|r| r.into_iter().next()) {
        Some(result) => result.into_price_points(),
        None => Ok(Vec::new()),
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    async fn fetch_adjusted_closes(
        &self,
        ticker: &str,
        range: &DateRange,
    ) -> Result<Vec<PricePoint>, ApiError> {
        let url = self.chart_url(ticker)?;
        let (period1, period2) = query_window(range)?;

        tracing::debug!(%url, period1, period2, "Requesting chart data");

        let response = self
            .client
            .get(url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div|split".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        let points = interpret_chart(status, &text)?;
        tracing::info!(ticker, points = points.len(), "Fetched price history");
        Ok(points)
    }
}
