//! Metrics reporter - output formatting
//!
//! Supports multiple output formats, all written to stdout:
//! - Text (comparison table)
//! - JSON
//! - CSV

use serde::Serialize;

use crate::benchmark::{format_count, format_throughput, BenchmarkResult};
use crate::config::{OutputFormat, WorkloadConfig};
use crate::utils::Result;
use crate::workload::{AccumulationStrategy, RemainderPolicy};

/// Latency summary in nanoseconds
#[derive(Debug, Clone, Serialize)]
pub struct LatencySummary {
    pub mean_ns: f64,
    pub p50_ns: u64,
    pub p99_ns: u64,
    pub p999_ns: u64,
    pub max_ns: u64,
}

/// One strategy run, flattened for export
#[derive(Debug, Clone, Serialize)]
pub struct ResultRecord {
    pub strategy: AccumulationStrategy,
    pub workers: usize,
    pub elapsed_ms: f64,
    pub final_total: u64,
    pub expected_total: u64,
    pub throughput: f64,
    pub cancelled: bool,
    pub partials: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<LatencySummary>,
}

impl ResultRecord {
    pub fn from_result(result: &BenchmarkResult) -> Self {
        Self {
            strategy: result.strategy,
            workers: result.workers,
            elapsed_ms: result.elapsed.as_secs_f64() * 1000.0,
            final_total: result.final_total,
            expected_total: result.expected_total,
            throughput: result.throughput(),
            cancelled: result.cancelled,
            partials: result.partials.clone(),
            latency: result.histogram.as_ref().map(|h| LatencySummary {
                mean_ns: h.mean(),
                p50_ns: h.value_at_percentile(50.0),
                p99_ns: h.value_at_percentile(99.0),
                p999_ns: h.value_at_percentile(99.9),
                max_ns: h.max(),
            }),
        }
    }

    /// CSV header matching `csv_row`
    pub fn csv_header() -> &'static str {
        "strategy,workers,elapsed_ms,final_total,expected_total,throughput,cancelled,p50_ns,p99_ns"
    }

    pub fn csv_row(&self) -> String {
        let (p50, p99) = match self.latency {
            Some(ref l) => (l.p50_ns.to_string(), l.p99_ns.to_string()),
            None => (String::new(), String::new()),
        };
        format!(
            "{},{},{:.3},{},{},{:.2},{},{},{}",
            self.strategy,
            self.workers,
            self.elapsed_ms,
            self.final_total,
            self.expected_total,
            self.throughput,
            self.cancelled,
            p50,
            p99
        )
    }
}

/// Workload parameters echoed in machine-readable output
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadSummary {
    pub workers: usize,
    pub total_increments: u64,
    pub expected_total: u64,
    pub remainder: RemainderPolicy,
    pub delay_ns: u64,
    pub shards: usize,
    pub channel_capacity: usize,
}

impl WorkloadSummary {
    pub fn from_config(config: &WorkloadConfig) -> Self {
        Self {
            workers: config.workers,
            total_increments: config.total_increments,
            expected_total: config.expected_total(),
            remainder: config.remainder,
            delay_ns: config.delay.as_nanos() as u64,
            shards: config.effective_shards(),
            channel_capacity: config.channel_capacity,
        }
    }
}

#[derive(Debug, Serialize)]
struct ResultsDocument<'a> {
    workload: &'a WorkloadSummary,
    results: Vec<ResultRecord>,
}

/// Metrics reporter
pub struct MetricsReporter {
    format: OutputFormat,
}

impl MetricsReporter {
    /// Create new reporter with specified format
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render results in the configured format
    pub fn render(&self, workload: &WorkloadConfig, results: &[BenchmarkResult]) -> Result<String> {
        match self.format {
            OutputFormat::Text => Ok(Self::render_comparison(results)),
            OutputFormat::Json => Self::render_json(workload, results),
            OutputFormat::Csv => Ok(Self::render_csv(results)),
        }
    }

    /// Print results to stdout
    pub fn report(&self, workload: &WorkloadConfig, results: &[BenchmarkResult]) -> Result<()> {
        println!("{}", self.render(workload, results)?);
        Ok(())
    }

    /// Side-by-side comparison, relative to the fastest run
    fn render_comparison(results: &[BenchmarkResult]) -> String {
        let fastest = results
            .iter()
            .map(|r| r.elapsed.as_secs_f64())
            .fold(f64::INFINITY, f64::min);

        let mut out = String::from("\n=== Comparison ===\n");
        out.push_str(&format!(
            "{:<16} {:>12} {:>16} {:>12} {:>10}\n",
            "Strategy", "Elapsed(ms)", "Throughput/s", "Total", "Relative"
        ));
        for result in results {
            let secs = result.elapsed.as_secs_f64();
            let relative = if fastest > 0.0 { secs / fastest } else { 1.0 };
            out.push_str(&format!(
                "{:<16} {:>12.2} {:>16} {:>12} {:>9.2}x\n",
                result.strategy.as_str(),
                secs * 1000.0,
                format_throughput(result.throughput()),
                format_count(result.final_total),
                relative
            ));
        }
        out
    }

    fn render_json(workload: &WorkloadConfig, results: &[BenchmarkResult]) -> Result<String> {
        let summary = WorkloadSummary::from_config(workload);
        let document = ResultsDocument {
            workload: &summary,
            results: results.iter().map(ResultRecord::from_result).collect(),
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    fn render_csv(results: &[BenchmarkResult]) -> String {
        let mut out = String::from(ResultRecord::csv_header());
        for result in results {
            out.push('\n');
            out.push_str(&ResultRecord::from_result(result).csv_row());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(strategy: AccumulationStrategy, millis: u64) -> BenchmarkResult {
        BenchmarkResult {
            strategy,
            workers: 10,
            elapsed: Duration::from_millis(millis),
            final_total: 1_000_000,
            expected_total: 1_000_000,
            partials: vec![1_000_000],
            cancelled: false,
            histogram: None,
        }
    }

    fn sample() -> Vec<BenchmarkResult> {
        vec![
            result(AccumulationStrategy::GlobalLock, 400),
            result(AccumulationStrategy::ShardedLock, 100),
            result(AccumulationStrategy::ChannelFunnel, 200),
        ]
    }

    #[test]
    fn test_text_comparison() {
        let reporter = MetricsReporter::new(OutputFormat::Text);
        let text = reporter.render(&WorkloadConfig::reference(), &sample()).unwrap();

        assert!(text.contains("GLOBAL_LOCK"));
        assert!(text.contains("4.00x"));
        assert!(text.contains("1.00x"));
        assert!(text.contains("1,000,000"));
    }

    #[test]
    fn test_json_document() {
        let reporter = MetricsReporter::new(OutputFormat::Json);
        let json = reporter.render(&WorkloadConfig::reference(), &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["workload"]["workers"], 10);
        assert_eq!(value["workload"]["remainder"], "drop");
        assert_eq!(value["results"][0]["strategy"], "GLOBAL_LOCK");
        assert_eq!(value["results"][2]["final_total"], 1_000_000);
        assert!(value["results"][0].get("latency").is_none());
    }

    #[test]
    fn test_csv_rows() {
        let reporter = MetricsReporter::new(OutputFormat::Csv);
        let csv = reporter.render(&WorkloadConfig::reference(), &sample()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], ResultRecord::csv_header());
        assert!(lines[1].starts_with("GLOBAL_LOCK,10,400.000,1000000,1000000,"));
        assert!(lines[3].ends_with(",false,,"));
    }
}
