//! Presentation of a finished returns analysis: a text or JSON summary for
//! stdout and a two-panel SVG chart written to disk.

pub mod chart;
pub mod error;
pub mod summary;

pub use chart::{ChartOptions, render_chart, write_chart};
pub use error::ReportError;
pub use summary::{render_json, render_summary};
