//! Command-line argument parsing

use clap::{Parser, ValueEnum};

use crate::workload::{AccumulationStrategy, RemainderPolicy};

/// Compare counter accumulation strategies under parallel load
#[derive(Parser, Debug, Clone)]
#[command(name = "contention-bench")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// Workload to run (counter, concurrency)
    #[arg(default_value = "counter")]
    pub workload: String,

    // ===== Workload Shape =====
    /// Number of parallel workers
    #[arg(short = 'w', long = "workers", default_value_t = 10)]
    pub workers: usize,

    /// Total increments across all workers
    #[arg(short = 'n', long = "increments", default_value_t = 1_000_000)]
    pub increments: u64,

    /// Handling of increments that don't divide evenly across workers
    #[arg(long = "remainder", value_enum, default_value_t = RemainderPolicy::Drop)]
    pub remainder: RemainderPolicy,

    /// Artificial delay per increment in nanoseconds (0 = none)
    #[arg(long = "delay-ns", default_value_t = 0)]
    pub delay_ns: u64,

    // ===== Strategy Options =====
    /// Strategies to run (global-lock, sharded-lock, channel-funnel)
    #[arg(short = 't', long = "strategies", value_delimiter = ',')]
    pub strategies: Option<Vec<String>>,

    /// Shard count for sharded-lock (0 = one per worker)
    #[arg(long = "shards", default_value_t = 0)]
    pub shards: usize,

    /// Channel capacity for channel-funnel (0 = unbounded)
    #[arg(long = "channel-capacity", default_value_t = 0)]
    pub channel_capacity: usize,

    /// Send timeout in milliseconds for a bounded channel-funnel
    #[arg(long = "send-timeout-ms")]
    pub send_timeout_ms: Option<u64>,

    // ===== Measurement =====
    /// Run each strategy this many times
    #[arg(long = "repeat", default_value_t = 1)]
    pub repeat: u32,

    /// Record per-increment latency histograms
    #[arg(long = "latency")]
    pub latency: bool,

    // ===== Output Options =====
    /// Output format
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Disable the progress bar
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    /// Quiet mode (minimal output)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format for results
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("--workers must be at least 1".to_string());
        }

        if self.repeat == 0 {
            return Err("--repeat must be at least 1".to_string());
        }

        if self.send_timeout_ms.is_some() && self.channel_capacity == 0 {
            return Err("--send-timeout-ms requires --channel-capacity > 0".to_string());
        }

        if self.send_timeout_ms == Some(0) {
            return Err("--send-timeout-ms must be at least 1".to_string());
        }

        if let Some(ref strategies) = self.strategies {
            for name in strategies {
                if AccumulationStrategy::parse(name).is_none() {
                    return Err(format!("Unknown strategy: {}", name));
                }
            }
        }

        Ok(())
    }

    /// Selected strategies, deduplicated, in canonical run order
    pub fn selected_strategies(&self) -> Vec<AccumulationStrategy> {
        let mut selected: Vec<AccumulationStrategy> = match self.strategies {
            Some(ref names) => names
                .iter()
                .filter_map(|n| AccumulationStrategy::parse(n))
                .collect(),
            None => AccumulationStrategy::ALL.to_vec(),
        };
        selected.sort();
        selected.dedup();
        selected
    }
}
