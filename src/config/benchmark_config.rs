//! Benchmark configuration derived from CLI arguments

use std::time::Duration;

use super::cli::{CliArgs, OutputFormat};
use super::workload_config::WorkloadConfig;
use crate::workload::AccumulationStrategy;

/// Complete benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    // Workload
    pub workload_name: String,
    pub workload: WorkloadConfig,

    // Driver
    pub strategies: Vec<AccumulationStrategy>,
    pub repeat: u32,

    // Output
    pub output_format: OutputFormat,
    pub show_progress: bool,
    pub quiet: bool,
    pub verbose: bool,
}

impl BenchmarkConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, String> {
        // Validate first
        args.validate()?;

        let workload = WorkloadConfig {
            workers: args.workers,
            total_increments: args.increments,
            remainder: args.remainder,
            delay: Duration::from_nanos(args.delay_ns),
            shards: args.shards,
            channel_capacity: args.channel_capacity,
            send_timeout: args.send_timeout_ms.map(Duration::from_millis),
            record_latency: args.latency,
        };
        workload.validate()?;

        Ok(Self {
            workload_name: args.workload.to_lowercase(),
            workload,

            strategies: args.selected_strategies(),
            repeat: args.repeat,

            output_format: args.output_format,
            show_progress: !args.no_progress
                && !args.quiet
                && args.output_format == OutputFormat::Text,
            quiet: args.quiet,
            verbose: args.verbose,
        })
    }

    /// Configuration for a given workload with every strategy and no output
    pub fn silent(workload: WorkloadConfig) -> Self {
        Self {
            workload_name: "counter".to_string(),
            workload,
            strategies: AccumulationStrategy::ALL.to_vec(),
            repeat: 1,
            output_format: OutputFormat::Text,
            show_progress: false,
            quiet: true,
            verbose: false,
        }
    }

    /// Total runs the driver will perform
    pub fn total_runs(&self) -> usize {
        self.strategies.len() * self.repeat as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_from_cli_defaults() {
        let args = CliArgs::parse_from(["test"]);
        let config = BenchmarkConfig::from_cli(&args).unwrap();
        assert_eq!(config.workload.workers, 10);
        assert_eq!(config.workload.expected_total(), 1_000_000);
        assert_eq!(config.workload.delay, Duration::ZERO);
        assert_eq!(config.strategies.len(), 3);
        assert!(config.show_progress);
    }

    #[test]
    fn test_from_cli_overrides() {
        let args = CliArgs::parse_from([
            "test",
            "--delay-ns",
            "1",
            "--channel-capacity",
            "128",
            "--send-timeout-ms",
            "250",
            "--shards",
            "4",
            "--repeat",
            "3",
            "-t",
            "sharded",
            "--latency",
        ]);
        let config = BenchmarkConfig::from_cli(&args).unwrap();
        assert_eq!(config.workload.delay, Duration::from_nanos(1));
        assert_eq!(config.workload.channel_capacity, 128);
        assert_eq!(config.workload.send_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.workload.effective_shards(), 4);
        assert!(config.workload.record_latency);
        assert_eq!(config.strategies, vec![AccumulationStrategy::ShardedLock]);
        assert_eq!(config.total_runs(), 3);
    }

    #[test]
    fn test_progress_hidden_for_machine_output() {
        let args = CliArgs::parse_from(["test", "--output-format", "csv"]);
        assert!(!BenchmarkConfig::from_cli(&args).unwrap().show_progress);

        let args = CliArgs::parse_from(["test", "-q"]);
        assert!(!BenchmarkConfig::from_cli(&args).unwrap().show_progress);
    }

    #[test]
    fn test_from_cli_rejects_invalid() {
        let args = CliArgs::parse_from(["test", "--repeat", "0"]);
        assert!(BenchmarkConfig::from_cli(&args).is_err());

        let args = CliArgs::parse_from([
            "test",
            "--send-timeout-ms",
            "0",
            "--channel-capacity",
            "1",
        ]);
        assert!(BenchmarkConfig::from_cli(&args).is_err());
    }
}
