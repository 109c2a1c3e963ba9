//! # Returns Analytics
//!
//! Turns a validated `PriceSeries` into daily and cumulative return series
//! plus a summary report.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** this crate has no knowledge of data providers, files, or
//!   the terminal. It depends only on `core-types`.
//! - **Geometric compounding:** cumulative and annualized figures always
//!   compound `(1 + r)` factors; daily returns are never summed.
//!
//! ## Public API
//!
//! - `ReturnsEngine`: the calculator, parameterized by the annualization divisor.
//! - `ReturnSeries` / `DatedReturn`: the derived series.
//! - `ReturnsReport`: summary statistics for one run.
//! - `AnalyticsError`: the error types this crate can return.

pub mod engine;
pub mod error;
pub mod report;

pub use engine::{DEFAULT_TRADING_DAYS_PER_YEAR, ReturnsEngine};
pub use error::AnalyticsError;
pub use report::{DatedReturn, ReturnSeries, ReturnsReport};
