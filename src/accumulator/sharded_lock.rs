//! Per-shard mutexes
//!
//! Workers map onto shards by `worker_id % shard_count`. With one shard per
//! worker no two workers ever touch the same lock; with fewer shards than
//! workers the shared shards still serialize correctly, only with less
//! parallelism. Each shard sits on its own cache line.

use std::sync::Arc;
use std::time::Duration;

use crossbeam::utils::CachePadded;
use parking_lot::Mutex;

use super::{pause, Accumulator, IncrementHandle};
use crate::utils::AccumulatorError;
use crate::workload::AccumulationStrategy;

type Shards = Arc<Vec<CachePadded<Mutex<u64>>>>;

pub struct ShardedLockAccumulator {
    shards: Shards,
    delay: Duration,
}

impl ShardedLockAccumulator {
    /// Create with `shard_count` shards (at least one)
    pub fn new(shard_count: usize, delay: Duration) -> Self {
        let shards = (0..shard_count.max(1))
            .map(|_| CachePadded::new(Mutex::new(0)))
            .collect();
        Self {
            shards: Arc::new(shards),
            delay,
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Shard a worker increments
    #[inline]
    pub fn shard_for(&self, worker_id: usize) -> usize {
        worker_id % self.shards.len()
    }
}

struct ShardHandle {
    shards: Shards,
    shard: usize,
    delay: Duration,
}

impl IncrementHandle for ShardHandle {
    #[inline]
    fn increment(&mut self) -> Result<(), AccumulatorError> {
        let mut counter = self.shards[self.shard].lock();
        *counter += 1;
        pause(self.delay);
        Ok(())
    }
}

impl Accumulator for ShardedLockAccumulator {
    fn strategy(&self) -> AccumulationStrategy {
        AccumulationStrategy::ShardedLock
    }

    fn handle(&self, worker_id: usize) -> Box<dyn IncrementHandle> {
        Box::new(ShardHandle {
            shards: Arc::clone(&self.shards),
            shard: self.shard_for(worker_id),
            delay: self.delay,
        })
    }

    fn total(&self) -> u64 {
        self.partials().iter().sum()
    }

    fn partials(&self) -> Vec<u64> {
        self.shards.iter().map(|shard| *shard.lock()).collect()
    }
}
