//! Result reporting
//!
//! Renders benchmark results as a console comparison, JSON or CSV.

pub mod reporter;

pub use reporter::{LatencySummary, MetricsReporter, ResultRecord, WorkloadSummary};
