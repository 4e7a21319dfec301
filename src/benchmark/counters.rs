//! Shared atomic counters for a single run
//!
//! These sit outside the measured accumulator: workers report progress in
//! batches and poll the shutdown flag, nothing else.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Increments a worker applies between progress reports
pub const PROGRESS_BATCH: u64 = 1024;

/// Counters shared between the harness, its workers and the progress reporter
pub struct RunCounters {
    /// Increments applied and reported by workers
    pub increments_finished: AtomicU64,

    /// Workers that have returned
    pub workers_finished: AtomicU64,

    /// Worker failures (timeouts, disconnects)
    pub error_count: AtomicU64,

    /// Cancellation signal: workers stop before their next increment
    pub shutdown: AtomicBool,

    /// Set by the harness once every worker has joined
    complete: AtomicBool,

    /// Increments the run is expected to apply
    total_increments: u64,
}

impl RunCounters {
    /// Create counters for a run of `total_increments`
    pub fn new(total_increments: u64) -> Self {
        Self {
            increments_finished: AtomicU64::new(0),
            workers_finished: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
            complete: AtomicBool::new(false),
            total_increments,
        }
    }

    /// Record applied increments
    #[inline]
    pub fn record_finished(&self, count: u64) {
        if count > 0 {
            self.increments_finished.fetch_add(count, Ordering::Relaxed);
        }
    }

    /// Record that a worker has returned
    #[inline]
    pub fn record_worker_done(&self) {
        self.workers_finished.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a worker failure
    #[inline]
    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Ask all workers to stop
    pub fn signal_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Check if shutdown has been signaled
    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Mark the run finished (all workers joined)
    pub fn mark_complete(&self) {
        self.complete.store(true, Ordering::SeqCst);
    }

    /// Check if the run has finished
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Relaxed)
    }

    /// Get current progress as (finished, total)
    pub fn progress(&self) -> (u64, u64) {
        (
            self.increments_finished.load(Ordering::Relaxed),
            self.total_increments,
        )
    }

    /// Get error count
    pub fn errors(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Workers that have returned so far
    pub fn workers_done(&self) -> u64 {
        self.workers_finished.load(Ordering::Relaxed)
    }
}
