//! Benchmark orchestrator
//!
//! Runs the harness once per selected strategy (times `repeat`), strictly
//! one after another so runs never compete for CPU, and reports each result
//! before starting the next.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hdrhistogram::Histogram;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::counters::RunCounters;
use super::harness::Harness;
use crate::config::{BenchmarkConfig, OutputFormat};
use crate::utils::Result;
use crate::workload::AccumulationStrategy;

/// Benchmark result summary for one strategy run
pub struct BenchmarkResult {
    /// Strategy that was run
    pub strategy: AccumulationStrategy,
    /// Number of workers
    pub workers: usize,
    /// Wall-clock time from first spawn to finalization
    pub elapsed: Duration,
    /// Total read from the accumulator after finalization
    pub final_total: u64,
    /// Total the workload was expected to produce
    pub expected_total: u64,
    /// Independent partial sums (per shard for the sharded strategy)
    pub partials: Vec<u64>,
    /// True if the run was stopped before all increments were issued
    pub cancelled: bool,
    /// Merged per-increment latency histogram (nanoseconds), if recorded
    pub histogram: Option<Histogram<u64>>,
}

impl BenchmarkResult {
    /// Increments per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.final_total as f64 / secs
        }
    }

    /// Get percentile latency in nanoseconds
    pub fn percentile_ns(&self, p: f64) -> Option<u64> {
        self.histogram.as_ref().map(|h| h.value_at_percentile(p))
    }

    /// Print summary (compact format)
    pub fn print_summary(&self) {
        println!("\n=== {} ===", self.strategy);
        println!(
            "Elapsed: {:.2}ms | Final total: {} | Throughput: {} inc/s{}",
            self.elapsed.as_secs_f64() * 1000.0,
            format_count(self.final_total),
            format_throughput(self.throughput()),
            if self.cancelled {
                format!(" | Cancelled ({} expected)", format_count(self.expected_total))
            } else {
                String::new()
            }
        );

        if self.partials.len() > 1 {
            println!(
                "Shards: {} | min={} max={}",
                self.partials.len(),
                format_count(self.partials.iter().copied().min().unwrap_or(0)),
                format_count(self.partials.iter().copied().max().unwrap_or(0))
            );
        }

        if let Some(ref histogram) = self.histogram {
            println!(
                "Latency (us): avg={:.2} p50={:.2} p99={:.2} p99.9={:.2} max={:.2}",
                histogram.mean() / 1000.0,
                self.percentile_ns(50.0).unwrap_or(0) as f64 / 1000.0,
                self.percentile_ns(99.0).unwrap_or(0) as f64 / 1000.0,
                self.percentile_ns(99.9).unwrap_or(0) as f64 / 1000.0,
                histogram.max() as f64 / 1000.0
            );
        }
    }
}

/// Benchmark orchestrator (the driver)
pub struct Orchestrator {
    config: Arc<BenchmarkConfig>,
    harness: Harness,
}

impl Orchestrator {
    /// Create new orchestrator
    pub fn new(config: BenchmarkConfig) -> Result<Self> {
        let harness = Harness::new(config.workload.clone())?;
        Ok(Self {
            config: Arc::new(config),
            harness,
        })
    }

    /// Report progress during a run
    fn report_progress(counters: &RunCounters, workers: usize) {
        let (_, total) = counters.progress();
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let start = std::time::Instant::now();
        let mut last_finished = 0u64;
        let mut last_time = start;

        while !counters.is_complete() {
            let (finished, _) = counters.progress();
            pb.set_position(finished);

            let now = std::time::Instant::now();
            let interval = now.duration_since(last_time).as_secs_f64();
            if interval >= 0.5 {
                let throughput = (finished - last_finished) as f64 / interval;
                let errors = counters.errors();
                pb.set_message(format!(
                    "{}/s, {}/{} workers done{}",
                    format_count(throughput as u64),
                    counters.workers_done(),
                    workers,
                    if errors > 0 {
                        format!(", {} errors", errors)
                    } else {
                        String::new()
                    }
                ));
                last_finished = finished;
                last_time = now;
            }

            thread::sleep(Duration::from_millis(100));
        }

        pb.set_position(counters.progress().0);
        pb.finish_with_message("done");
    }

    /// Run a single strategy once
    pub fn run_strategy(&self, strategy: AccumulationStrategy) -> Result<BenchmarkResult> {
        let counters = Arc::new(RunCounters::new(self.harness.config().expected_total()));

        let reporter = if self.config.show_progress {
            let counters = Arc::clone(&counters);
            let workers = self.harness.config().workers;
            Some(thread::spawn(move || Self::report_progress(&counters, workers)))
        } else {
            None
        };

        let result = self.harness.run_with_counters(strategy, Arc::clone(&counters));

        // Harness marks completion on every path past the worker barrier;
        // cover early failures too so the reporter always exits.
        counters.mark_complete();
        if let Some(reporter) = reporter {
            let _ = reporter.join();
        }

        result
    }

    /// Run all selected strategies in canonical order
    pub fn run_all(&self) -> Result<Vec<BenchmarkResult>> {
        let mut results = Vec::with_capacity(self.config.total_runs());
        let verbose_text = !self.config.quiet && self.config.output_format == OutputFormat::Text;

        for strategy in &self.config.strategies {
            for iteration in 0..self.config.repeat {
                if verbose_text {
                    if self.config.repeat > 1 {
                        println!(
                            "\nRunning strategy: {} ({}/{})",
                            strategy,
                            iteration + 1,
                            self.config.repeat
                        );
                    } else {
                        println!("\nRunning strategy: {} ({})", strategy, strategy.description());
                    }
                }

                let result = self.run_strategy(*strategy)?;
                info!(
                    "{} finished: total={} elapsed={:.2}ms",
                    strategy,
                    result.final_total,
                    result.elapsed.as_secs_f64() * 1000.0
                );

                if verbose_text {
                    result.print_summary();
                }
                results.push(result);
            }
        }

        Ok(results)
    }
}

/// Format throughput without meaningless decimals
/// Examples: 1,234,567 inc/s, 987,654 inc/s
pub fn format_throughput(throughput: f64) -> String {
    let value = throughput as u64;
    format_count(value)
}

/// Format large numbers with thousands separators
/// Examples: 1,234,567 or 987,654
pub fn format_count(value: u64) -> String {
    let s = value.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}
