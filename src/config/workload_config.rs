//! Per-run workload configuration
//!
//! `WorkloadConfig` holds everything a single harness run needs: how much
//! work there is, how it is split, and the strategy-specific knobs. The same
//! config is reused for every strategy so timings stay comparable.

use std::time::Duration;

use crate::workload::{partition, RemainderPolicy, WorkUnit};

/// Worker count of the reference workload
pub const REFERENCE_WORKERS: usize = 10;

/// Total increments of the reference workload
pub const REFERENCE_INCREMENTS: u64 = 1_000_000;

/// Configuration for one accumulation workload
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Number of parallel worker threads
    pub workers: usize,

    /// Total increments requested across all workers
    pub total_increments: u64,

    /// How to handle `total_increments % workers`
    pub remainder: RemainderPolicy,

    /// Artificial delay spent per increment (zero = none)
    pub delay: Duration,

    /// Shard count for the sharded strategy (0 = one shard per worker)
    pub shards: usize,

    /// Channel capacity for the funnel strategy (0 = unbounded)
    pub channel_capacity: usize,

    /// Send timeout for a bounded funnel channel (None = block)
    pub send_timeout: Option<Duration>,

    /// Record per-increment latency histograms
    pub record_latency: bool,
}

impl WorkloadConfig {
    /// Default workload: 10 workers, 1,000,000 increments, no delay.
    /// `with_delay(Duration::from_nanos(1))` reproduces the reference
    /// workload's per-increment sleep.
    pub fn reference() -> Self {
        Self {
            workers: REFERENCE_WORKERS,
            total_increments: REFERENCE_INCREMENTS,
            remainder: RemainderPolicy::Drop,
            delay: Duration::ZERO,
            shards: 0,
            channel_capacity: 0,
            send_timeout: None,
            record_latency: false,
        }
    }

    /// Workload with an exact per-worker increment count
    pub fn per_worker(workers: usize, increments_per_worker: u64) -> Self {
        Self {
            workers,
            total_increments: workers as u64 * increments_per_worker,
            ..Self::reference()
        }
    }

    /// Builder-style: set artificial per-increment delay
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Builder-style: set shard count
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Builder-style: set funnel channel capacity and optional send timeout
    pub fn with_channel(mut self, capacity: usize, send_timeout: Option<Duration>) -> Self {
        self.channel_capacity = capacity;
        self.send_timeout = send_timeout;
        self
    }

    /// Builder-style: set remainder policy
    pub fn with_remainder(mut self, remainder: RemainderPolicy) -> Self {
        self.remainder = remainder;
        self
    }

    /// Builder-style: enable latency histograms
    pub fn with_latency(mut self, record: bool) -> Self {
        self.record_latency = record;
        self
    }

    /// Shard count actually used by the sharded strategy
    pub fn effective_shards(&self) -> usize {
        if self.shards == 0 {
            self.workers.max(1)
        } else {
            self.shards
        }
    }

    /// Increments each worker performs under `RemainderPolicy::Drop`
    pub fn increments_per_worker(&self) -> u64 {
        if self.workers == 0 {
            0
        } else {
            self.total_increments / self.workers as u64
        }
    }

    /// Split this workload into per-worker units
    pub fn work_units(&self) -> Vec<WorkUnit> {
        partition(self.total_increments, self.workers, self.remainder)
    }

    /// Final total a correct run must produce
    pub fn expected_total(&self) -> u64 {
        WorkUnit::total(&self.work_units())
    }

    /// Validate settings that would make a run meaningless or hang
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be at least 1".to_string());
        }
        if let Some(timeout) = self.send_timeout {
            if self.channel_capacity == 0 {
                return Err("send timeout requires a bounded channel (capacity > 0)".to_string());
            }
            if timeout.is_zero() {
                return Err("send timeout must be greater than zero".to_string());
            }
        }
        Ok(())
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self::reference()
    }
}
