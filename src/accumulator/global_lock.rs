//! Single mutex around a single counter

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{pause, Accumulator, IncrementHandle};
use crate::utils::AccumulatorError;
use crate::workload::AccumulationStrategy;

/// Every worker contends on the same lock.
///
/// The counter is owned by this object rather than living in a static, so
/// independent runs (and tests) never share state.
pub struct GlobalLockAccumulator {
    counter: Arc<Mutex<u64>>,
    delay: Duration,
}

impl GlobalLockAccumulator {
    pub fn new(delay: Duration) -> Self {
        Self {
            counter: Arc::new(Mutex::new(0)),
            delay,
        }
    }
}

struct GlobalLockHandle {
    counter: Arc<Mutex<u64>>,
    delay: Duration,
}

impl IncrementHandle for GlobalLockHandle {
    #[inline]
    fn increment(&mut self) -> Result<(), AccumulatorError> {
        let mut counter = self.counter.lock();
        *counter += 1;
        // Delay is spent inside the critical section
        pause(self.delay);
        Ok(())
    }
}

impl Accumulator for GlobalLockAccumulator {
    fn strategy(&self) -> AccumulationStrategy {
        AccumulationStrategy::GlobalLock
    }

    fn handle(&self, _worker_id: usize) -> Box<dyn IncrementHandle> {
        Box::new(GlobalLockHandle {
            counter: Arc::clone(&self.counter),
            delay: self.delay,
        })
    }

    fn total(&self) -> u64 {
        *self.counter.lock()
    }
}
