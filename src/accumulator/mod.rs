//! Counter accumulators
//!
//! Three ways of folding increments from parallel workers into one total:
//! - GlobalLockAccumulator: one counter behind one mutex
//! - ShardedLockAccumulator: a mutex-protected counter per shard
//! - ChannelFunnelAccumulator: increments sent as messages to one aggregator
//!
//! Workers never call the accumulator directly. Each one gets its own
//! `IncrementHandle` before it starts, and the harness calls `seal()` once
//! every worker has been joined. `total()` is only meaningful after `seal()`.

pub mod channel_funnel;
pub mod global_lock;
pub mod sharded_lock;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::WorkloadConfig;
use crate::utils::{AccumulatorError, Result};
use crate::workload::AccumulationStrategy;

pub use channel_funnel::{ChannelFunnelAccumulator, FunnelPhase};
pub use global_lock::GlobalLockAccumulator;
pub use sharded_lock::ShardedLockAccumulator;

/// A worker's private entry point into an accumulator
pub trait IncrementHandle: Send {
    /// Add one to the shared total
    fn increment(&mut self) -> std::result::Result<(), AccumulatorError>;
}

/// Shared counter fed by many workers
pub trait Accumulator: Send + Sync {
    /// Strategy this accumulator implements
    fn strategy(&self) -> AccumulationStrategy;

    /// Create the handle for one worker
    fn handle(&self, worker_id: usize) -> Box<dyn IncrementHandle>;

    /// Strategy-specific finalization, called after every worker has joined
    fn seal(&self) -> Result<()> {
        Ok(())
    }

    /// Final total
    fn total(&self) -> u64;

    /// Independently maintained partial sums (one per shard where applicable)
    fn partials(&self) -> Vec<u64> {
        vec![self.total()]
    }
}

/// Create a fresh accumulator for one run
pub fn build(
    strategy: AccumulationStrategy,
    config: &WorkloadConfig,
) -> Result<Arc<dyn Accumulator>> {
    let accumulator: Arc<dyn Accumulator> = match strategy {
        AccumulationStrategy::GlobalLock => Arc::new(GlobalLockAccumulator::new(config.delay)),
        AccumulationStrategy::ShardedLock => Arc::new(ShardedLockAccumulator::new(
            config.effective_shards(),
            config.delay,
        )),
        AccumulationStrategy::ChannelFunnel => Arc::new(ChannelFunnelAccumulator::new(
            config.channel_capacity,
            config.send_timeout,
            config.delay,
        )?),
    };
    Ok(accumulator)
}

/// Spend the configured per-increment delay
#[inline]
pub(crate) fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_matches_strategy() {
        let config = WorkloadConfig::per_worker(2, 5);
        for strategy in AccumulationStrategy::ALL {
            let accumulator = build(strategy, &config).unwrap();
            assert_eq!(accumulator.strategy(), strategy);
        }
    }

    #[test]
    fn test_single_handle_counts_for_every_strategy() {
        let config = WorkloadConfig::per_worker(1, 3);
        for strategy in AccumulationStrategy::ALL {
            let accumulator = build(strategy, &config).unwrap();
            {
                let mut handle = accumulator.handle(0);
                for _ in 0..3 {
                    handle.increment().unwrap();
                }
            }
            accumulator.seal().unwrap();
            assert_eq!(accumulator.total(), 3, "{}", strategy);
            assert_eq!(accumulator.partials().iter().sum::<u64>(), 3);
        }
    }
}
