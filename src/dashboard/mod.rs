//! Usage-analytics pipeline behind the console dashboard.
//!
//! raw records -> `aggregate` -> `trend` / cross-tab -> `timeline` ->
//! `spec` -> rendering layer. Every stage is a pure function of its input
//! and a [`DashboardContext`]; `charts::build_dashboard` runs them all.

pub mod aggregate;
pub mod bucket;
pub mod charts;
pub mod color;
pub mod context;
pub mod format;
pub mod spec;
pub mod timeline;
pub mod trend;

pub use bucket::Granularity;
pub use charts::{build_dashboard, DashboardCharts};
pub use context::{DashboardContext, QueryWindow};
