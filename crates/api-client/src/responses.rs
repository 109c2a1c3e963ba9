use crate::error::ApiError;
use chrono::DateTime;
use core_types::PricePoint;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;

// Using `#[serde(rename_all = "camelCase")]` to automatically map from JSON camelCase to Rust snake_case.

/// The envelope returned by `GET /v8/finance/chart/{ticker}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

/// Exactly one of `result` and `error` is populated.
#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartErrorBody>,
}

/// Represents an error response from the chart endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartErrorBody {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

impl ChartErrorBody {
    /// Unknown or delisted symbols come back as `Not Found`.
    pub fn is_not_found(&self) -> bool {
        self.code.eq_ignore_ascii_case("Not Found")
    }
}

/// One instrument's bars. `timestamp` is omitted entirely when the range holds no bars.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    #[serde(default)]
    pub currency: Option<String>,
    /// Exchange UTC offset in seconds.
    #[serde(default)]
    pub gmtoffset: i64,
    #[serde(default)]
    pub exchange_timezone_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
    #[serde(default)]
    pub adjclose: Vec<AdjClose>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjClose {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

impl ChartResult {
    /// Pairs each bar's exchange-local date with its adjusted close.
    ///
    /// Bars with a null, non-finite, or non-positive price are skipped. When the
    /// response has no adjusted-close block the raw close is used instead.
    pub fn into_price_points(self) -> Result<Vec<PricePoint>, ApiError> {
        if self.timestamp.is_empty() {
            return Ok(Vec::new());
        }

        let closes = match self.indicators.adjclose.into_iter().next() {
            Some(adj) if !adj.adjclose.is_empty() => adj.adjclose,
            _ => {
                tracing::warn!(
                    symbol = %self.meta.symbol,
                    "Response has no adjusted closes; falling back to raw closes"
                );
                self.indicators
                    .quote
                    .into_iter()
                    .next()
                    .map(|q| q.close)
                    .unwrap_or_default()
            }
        };

        if closes.len() != self.timestamp.len() {
            return Err(ApiError::InvalidData(format!(
                "{} timestamps but {} closes for {}",
                self.timestamp.len(),
                closes.len(),
                self.meta.symbol
            )));
        }

        let offset = self.meta.gmtoffset;
        let mut points = Vec::with_capacity(closes.len());
        let mut skipped = 0usize;

        for (ts, close) in self.timestamp.into_iter().zip(closes) {
            let Some(value) = close.filter(|v| v.is_finite() && *v > 0.0) else {
                skipped += 1;
                continue;
            };
            let date = DateTime::from_timestamp(ts + offset, 0)
                .ok_or_else(|| ApiError::InvalidData(format!("Invalid timestamp: {ts}")))?
                .date_naive();
            let adj_close = Decimal::from_f64(value)
                .ok_or_else(|| ApiError::InvalidData(format!("Invalid price: {value}")))?;
            points.push(PricePoint::new(date, adj_close));
        }

        if skipped > 0 {
            tracing::debug!(symbol = %self.meta.symbol, skipped, "Skipped bars without a usable price");
        }

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn parse(json: &str) -> ChartResult {
        let response: ChartResponse = serde_json::from_str(json).unwrap();
        response.chart.result.unwrap().remove(0)
    }

    #[test]
    fn dates_are_taken_in_exchange_local_time() {
        // 2024-01-02 14:30 UTC is the 09:30 open in New York (UTC-5).
        let result = parse(
            r#"{"chart":{"result":[{
                "meta":{"symbol":"^IXIC","currency":"USD","gmtoffset":-18000,"exchangeTimezoneName":"America/New_York"},
                "timestamp":[1704205800,1704292200],
                "indicators":{"quote":[{"close":[14765.94,14592.21]}],"adjclose":[{"adjclose":[14765.94,14592.21]}]}
            }],"error":null}}"#,
        );
        assert_eq!(result.meta.exchange_timezone_name.as_deref(), Some("America/New_York"));

        let points = result.into_price_points().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(points[1].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(points[0].adj_close, Decimal::from_f64(14765.94).unwrap());
    }

    #[test]
    fn null_prices_are_skipped() {
        let result = parse(
            r#"{"chart":{"result":[{
                "meta":{"symbol":"^IXIC","gmtoffset":-18000},
                "timestamp":[1704205800,1704292200,1704378600],
                "indicators":{"quote":[{"close":[1.0,null,3.0]}],"adjclose":[{"adjclose":[1.0,null,3.0]}]}
            }],"error":null}}"#,
        );

        let points = result.into_price_points().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    }

    #[test]
    fn adjusted_close_is_preferred_over_close() {
        let result = parse(
            r#"{"chart":{"result":[{
                "meta":{"symbol":"SPY","gmtoffset":-18000},
                "timestamp":[1704205800],
                "indicators":{"quote":[{"close":[475.0]}],"adjclose":[{"adjclose":[470.5]}]}
            }],"error":null}}"#,
        );

        let points = result.into_price_points().unwrap();
        assert_eq!(points[0].adj_close, Decimal::from_f64(470.5).unwrap());
    }

    #[test]
    fn falls_back_to_close_without_adjusted_block() {
        let result = parse(
            r#"{"chart":{"result":[{
                "meta":{"symbol":"^IXIC","gmtoffset":-18000},
                "timestamp":[1704205800],
                "indicators":{"quote":[{"close":[14765.94]}]}
            }],"error":null}}"#,
        );

        let points = result.into_price_points().unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].adj_close, Decimal::from_f64(14765.94).unwrap());
    }

    #[test]
    fn range_without_bars_yields_no_points() {
        let result = parse(
            r#"{"chart":{"result":[{
                "meta":{"symbol":"^IXIC","gmtoffset":-18000},
                "indicators":{"quote":[{}],"adjclose":[{}]}
            }],"error":null}}"#,
        );

        assert!(result.into_price_points().unwrap().is_empty());
    }

    #[test]
    fn mismatched_lengths_are_invalid() {
        let result = parse(
            r#"{"chart":{"result":[{
                "meta":{"symbol":"^IXIC","gmtoffset":0},
                "timestamp":[1704205800,1704292200],
                "indicators":{"quote":[{"close":[1.0]}],"adjclose":[{"adjclose":[1.0]}]}
            }],"error":null}}"#,
        );

        assert!(matches!(result.into_price_points(), Err(ApiError::InvalidData(_))));
    }

    #[test]
    fn not_found_error_body_is_recognized() {
        let response: ChartResponse = serde_json::from_str(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        )
        .unwrap();

        let error = response.chart.error.unwrap();
        assert!(error.is_not_found());
        assert!(response.chart.result.is_none());
    }
}
