use crate::error::CoreError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An inclusive calendar range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting one whose end precedes its start.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if end < start {
            return Err(CoreError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// One trading day's adjusted close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub adj_close: Decimal,
}

impl PricePoint {
    pub fn new(date: NaiveDate, adj_close: Decimal) -> Self {
        Self { date, adj_close }
    }
}

/// A validated price history: ascending by date, one point per date, every
/// price strictly positive.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Sorts the raw points by date and collapses duplicate dates, keeping
    /// the last occurrence of each date in the input order.
    pub fn new(mut points: Vec<PricePoint>) -> Result<Self, CoreError> {
        if let Some(bad) = points.iter().find(|p| p.adj_close <= Decimal::ZERO) {
            return Err(CoreError::InvalidInput(
                "adj_close".to_string(),
                format!("non-positive price {} on {}", bad.adj_close, bad.date),
            ));
        }

        // Stable sort keeps input order within a date, so the last duplicate
        // is the one that survives below.
        points.sort_by_key(|p| p.date);

        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        Ok(Self { points: deduped })
    }

    /// Keeps only the points that fall inside `range`.
    pub fn filter_to(&self, range: &DateRange) -> Self {
        Self {
            points: self
                .points
                .iter()
                .filter(|p| range.contains(p.date))
                .copied()
                .collect(),
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }
}
