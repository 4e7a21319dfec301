//! Benchmark harness
//!
//! Runs one strategy against one workload: spawns a worker per `WorkUnit`,
//! waits for all of them, seals the accumulator, and checks the total
//! against the increments the workers actually applied.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use hdrhistogram::Histogram;
use tracing::{debug, info, warn};

use super::counters::{RunCounters, PROGRESS_BATCH};
use super::orchestrator::BenchmarkResult;
use crate::accumulator::{self, Accumulator, IncrementHandle};
use crate::config::WorkloadConfig;
use crate::utils::{AccumulatorError, BenchmarkError, Result};
use crate::workload::{dropped_remainder, AccumulationStrategy, RemainderPolicy, WorkUnit};

/// Highest trackable increment latency (60s in nanoseconds)
const MAX_LATENCY_NS: u64 = 60_000_000_000;

/// Create an empty per-increment latency histogram (nanoseconds)
pub fn latency_histogram() -> Result<Histogram<u64>> {
    Histogram::new_with_bounds(1, MAX_LATENCY_NS, 3)
        .map_err(|e| BenchmarkError::Config(format!("Failed to create histogram: {:?}", e)))
}

/// Result from a worker thread
pub struct WorkerResult {
    /// Increments that completed successfully
    pub increments_applied: u64,
    /// Local latency histogram, if recording was enabled
    pub histogram: Option<Histogram<u64>>,
    /// Failure that stopped the worker early
    pub error: Option<AccumulatorError>,
}

/// Executes a workload against a fresh accumulator per run
pub struct Harness {
    config: Arc<WorkloadConfig>,
}

impl Harness {
    /// Create a harness for a validated workload
    pub fn new(config: WorkloadConfig) -> Result<Self> {
        config.validate().map_err(BenchmarkError::Config)?;

        let dropped = dropped_remainder(config.total_increments, config.workers);
        if dropped > 0 && config.remainder == RemainderPolicy::Drop {
            warn!(
                "{} increments do not divide evenly across {} workers; {} will not be issued",
                config.total_increments, config.workers, dropped
            );
        }

        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Workload this harness runs
    pub fn config(&self) -> &WorkloadConfig {
        &self.config
    }

    /// Run one strategy to completion
    pub fn run(&self, strategy: AccumulationStrategy) -> Result<BenchmarkResult> {
        let counters = Arc::new(RunCounters::new(self.config.expected_total()));
        self.run_with_counters(strategy, counters)
    }

    /// Run one strategy, sharing `counters` with the caller for progress
    /// reporting and cancellation
    pub fn run_with_counters(
        &self,
        strategy: AccumulationStrategy,
        counters: Arc<RunCounters>,
    ) -> Result<BenchmarkResult> {
        let units = self.config.work_units();
        let expected_total = WorkUnit::total(&units);
        let accumulator = accumulator::build(strategy, &self.config)?;

        info!(
            "{}: {} workers, {} increments",
            strategy,
            units.len(),
            expected_total
        );

        // Handles are registered before any worker starts so the funnel's
        // producer barrier already counts every worker.
        let mut pending = Vec::with_capacity(units.len());
        for unit in &units {
            let histogram = if self.config.record_latency {
                Some(latency_histogram()?)
            } else {
                None
            };
            pending.push((*unit, accumulator.handle(unit.worker_id), histogram));
        }

        let start = Instant::now();
        let mut workers: Vec<thread::JoinHandle<WorkerResult>> = Vec::with_capacity(pending.len());

        let mut pending = pending.into_iter();
        let mut spawn_error = None;
        for (unit, handle, histogram) in pending.by_ref() {
            let counters = Arc::clone(&counters);
            match thread::Builder::new()
                .name(format!("worker-{}", unit.worker_id))
                .spawn(move || run_worker(unit, handle, histogram, &counters))
            {
                Ok(worker) => workers.push(worker),
                Err(e) => {
                    spawn_error = Some(BenchmarkError::Worker(format!(
                        "Failed to spawn worker {}: {}",
                        unit.worker_id, e
                    )));
                    break;
                }
            }
        }
        // Unspawned handles must leave the producer barrier too
        drop(pending);

        if let Some(e) = spawn_error {
            abandon_run(workers, accumulator.as_ref(), &counters);
            return Err(e);
        }

        // Barrier: every worker joins before anything reads the total
        let mut results = Vec::with_capacity(workers.len());
        let mut first_error: Option<BenchmarkError> = None;
        for worker in workers {
            match worker.join() {
                Ok(result) => {
                    if let Some(ref e) = result.error {
                        first_error.get_or_insert_with(|| e.clone().into());
                    }
                    results.push(result);
                }
                Err(_) => {
                    first_error.get_or_insert_with(|| {
                        BenchmarkError::Worker("Worker thread panicked".to_string())
                    });
                }
            }
        }
        counters.mark_complete();

        let sealed = accumulator.seal();
        let elapsed = start.elapsed();

        if let Some(e) = first_error {
            return Err(e);
        }
        sealed?;

        let final_total = accumulator.total();
        let partials = accumulator.partials();
        let applied: u64 = results.iter().map(|r| r.increments_applied).sum();
        let cancelled = applied < expected_total;

        // Whatever completed must be reflected exactly, cancelled or not
        if final_total != applied || partials.iter().sum::<u64>() != final_total {
            return Err(BenchmarkError::InvariantViolation {
                strategy,
                expected: applied,
                actual: final_total,
            });
        }
        if !cancelled && final_total != expected_total {
            return Err(BenchmarkError::InvariantViolation {
                strategy,
                expected: expected_total,
                actual: final_total,
            });
        }
        if cancelled {
            info!(
                "{}: cancelled after {} of {} increments",
                strategy, applied, expected_total
            );
        }

        let histogram = merge_histograms(&mut results)?;

        Ok(BenchmarkResult {
            strategy,
            workers: units.len(),
            elapsed,
            final_total,
            expected_total,
            partials,
            cancelled,
            histogram,
        })
    }
}

/// Stop and join workers that already started, then finalize the accumulator
/// so no thread outlives a failed run
fn abandon_run(
    workers: Vec<thread::JoinHandle<WorkerResult>>,
    accumulator: &dyn Accumulator,
    counters: &RunCounters,
) {
    counters.signal_shutdown();
    for worker in workers {
        let _ = worker.join();
    }
    counters.mark_complete();
    if let Err(e) = accumulator.seal() {
        warn!("Finalizing abandoned run failed: {}", e);
    }
}

/// Merge per-worker histograms, if latency was recorded
fn merge_histograms(results: &mut [WorkerResult]) -> Result<Option<Histogram<u64>>> {
    let mut merged: Option<Histogram<u64>> = None;
    for result in results.iter_mut() {
        let Some(local) = result.histogram.take() else {
            continue;
        };
        if merged.is_none() {
            merged = Some(latency_histogram()?);
        }
        if let Some(target) = merged.as_mut() {
            target
                .add(&local)
                .map_err(|e| BenchmarkError::Worker(format!("Histogram merge failed: {:?}", e)))?;
        }
    }
    Ok(merged)
}

/// Worker loop: apply this unit's increments until done, cancelled or failed
fn run_worker(
    unit: WorkUnit,
    mut handle: Box<dyn IncrementHandle>,
    mut histogram: Option<Histogram<u64>>,
    counters: &RunCounters,
) -> WorkerResult {
    let mut applied = 0u64;
    let mut unreported = 0u64;
    let mut error = None;

    while applied < unit.increment_count {
        if counters.is_shutdown() {
            break;
        }

        let outcome = match histogram.as_mut() {
            Some(hist) => {
                let started = Instant::now();
                let outcome = handle.increment();
                hist.saturating_record((started.elapsed().as_nanos() as u64).max(1));
                outcome
            }
            None => handle.increment(),
        };

        if let Err(e) = outcome {
            counters.record_error();
            // The run is lost; stop the other workers too
            counters.signal_shutdown();
            error = Some(e);
            break;
        }

        applied += 1;
        unreported += 1;
        if unreported == PROGRESS_BATCH {
            counters.record_finished(unreported);
            unreported = 0;
        }
    }

    counters.record_finished(unreported);
    // Leave the producer barrier before reporting back
    drop(handle);
    counters.record_worker_done();

    debug!(
        "Worker {} applied {}/{} increments",
        unit.worker_id, applied, unit.increment_count
    );

    WorkerResult {
        increments_applied: applied,
        histogram,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn run(strategy: AccumulationStrategy, config: WorkloadConfig) -> BenchmarkResult {
        Harness::new(config).unwrap().run(strategy).unwrap()
    }

    #[test]
    fn test_totals_across_workload_grid() {
        for strategy in AccumulationStrategy::ALL {
            for workers in [1usize, 2, 10, 100] {
                for per_worker in [0u64, 1, 1000] {
                    let result = run(strategy, WorkloadConfig::per_worker(workers, per_worker));
                    assert_eq!(
                        result.final_total,
                        workers as u64 * per_worker,
                        "{} workers={} per_worker={}",
                        strategy,
                        workers,
                        per_worker
                    );
                    assert!(!result.cancelled);
                }
            }
        }
    }

    #[test]
    fn test_reference_workload_reaches_one_million() {
        let harness = Harness::new(WorkloadConfig::per_worker(10, 100_000)).unwrap();
        for strategy in AccumulationStrategy::ALL {
            let result = harness.run(strategy).unwrap();
            assert_eq!(result.final_total, 1_000_000, "{}", strategy);
            assert_eq!(result.expected_total, 1_000_000);
        }
    }

    #[test]
    fn test_repeated_runs_agree() {
        let harness = Harness::new(WorkloadConfig::per_worker(4, 2500)).unwrap();
        for strategy in AccumulationStrategy::ALL {
            let first = harness.run(strategy).unwrap();
            let second = harness.run(strategy).unwrap();
            assert_eq!(first.final_total, second.final_total);
        }
    }

    #[test]
    fn test_zero_increments_yield_zero() {
        for strategy in AccumulationStrategy::ALL {
            let result = run(strategy, WorkloadConfig::per_worker(10, 0));
            assert_eq!(result.final_total, 0);
        }
    }

    #[test]
    fn test_single_worker_identical_across_strategies() {
        let totals: Vec<u64> = AccumulationStrategy::ALL
            .iter()
            .map(|&s| run(s, WorkloadConfig::per_worker(1, 777)).final_total)
            .collect();
        assert_eq!(totals, vec![777, 777, 777]);
    }

    #[test]
    fn test_shard_partials_sum_to_total() {
        let result = run(
            AccumulationStrategy::ShardedLock,
            WorkloadConfig::per_worker(10, 1000),
        );
        assert_eq!(result.partials.len(), 10);
        assert!(result.partials.iter().all(|&p| p == 1000));
        assert_eq!(result.partials.iter().sum::<u64>(), result.final_total);
    }

    #[test]
    fn test_shared_shards_still_exact() {
        let result = run(
            AccumulationStrategy::ShardedLock,
            WorkloadConfig::per_worker(10, 1000).with_shards(3),
        );
        assert_eq!(result.partials.len(), 3);
        assert_eq!(result.partials.iter().sum::<u64>(), 10_000);
        assert_eq!(result.final_total, 10_000);
    }

    #[test]
    fn test_bounded_funnel() {
        let result = run(
            AccumulationStrategy::ChannelFunnel,
            WorkloadConfig::per_worker(8, 5000).with_channel(16, None),
        );
        assert_eq!(result.final_total, 40_000);
    }

    #[test]
    fn test_delay_is_applied() {
        let config = WorkloadConfig::per_worker(2, 10).with_delay(Duration::from_millis(1));
        let result = run(AccumulationStrategy::GlobalLock, config);
        assert_eq!(result.final_total, 20);
        // 20 serialized sleeps of at least 1ms each
        assert!(result.elapsed >= Duration::from_millis(20));
    }

    #[test]
    fn test_latency_recording() {
        let config = WorkloadConfig::per_worker(4, 500).with_latency(true);
        let result = run(AccumulationStrategy::ShardedLock, config);
        let histogram = result.histogram.expect("latency histogram");
        assert_eq!(histogram.len(), 2000);
    }

    #[test]
    fn test_no_histogram_by_default() {
        let result = run(AccumulationStrategy::GlobalLock, WorkloadConfig::per_worker(2, 10));
        assert!(result.histogram.is_none());
    }

    #[test]
    fn test_remainder_dropped_by_default() {
        let mut config = WorkloadConfig::per_worker(10, 0);
        config.total_increments = 1005;
        for strategy in AccumulationStrategy::ALL {
            let result = run(strategy, config.clone());
            assert_eq!(result.final_total, 1000);
            assert!(!result.cancelled);
        }
    }

    #[test]
    fn test_remainder_distributed_when_requested() {
        let mut config = WorkloadConfig::per_worker(10, 0).with_remainder(RemainderPolicy::Distribute);
        config.total_increments = 1005;
        for strategy in AccumulationStrategy::ALL {
            assert_eq!(run(strategy, config.clone()).final_total, 1005);
        }
    }

    #[test]
    fn test_cancel_before_start_applies_nothing() {
        let harness = Harness::new(WorkloadConfig::per_worker(4, 1000)).unwrap();
        for strategy in AccumulationStrategy::ALL {
            let counters = Arc::new(RunCounters::new(4000));
            counters.signal_shutdown();
            let result = harness.run_with_counters(strategy, counters).unwrap();
            assert!(result.cancelled);
            assert_eq!(result.final_total, 0);
        }
    }

    #[test]
    fn test_cancel_mid_run_counts_exactly_completed() {
        let config =
            WorkloadConfig::per_worker(4, 100_000).with_delay(Duration::from_micros(50));
        let harness = Harness::new(config).unwrap();

        for strategy in AccumulationStrategy::ALL {
            let counters = Arc::new(RunCounters::new(400_000));
            let canceller = {
                let counters = Arc::clone(&counters);
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(30));
                    counters.signal_shutdown();
                })
            };

            let result = harness
                .run_with_counters(strategy, Arc::clone(&counters))
                .unwrap();
            canceller.join().unwrap();

            assert!(result.cancelled, "{}", strategy);
            assert!(result.final_total < result.expected_total);
            // Progress counter is flushed by every worker on exit
            assert_eq!(counters.progress().0, result.final_total);
        }
    }

    #[test]
    fn test_independent_harnesses_run_concurrently() {
        let runs: Vec<_> = (0..3)
            .map(|i| {
                thread::spawn(move || {
                    let harness = Harness::new(WorkloadConfig::per_worker(4, 1000 * (i + 1))).unwrap();
                    harness.run(AccumulationStrategy::GlobalLock).unwrap().final_total
                })
            })
            .collect();
        let totals: Vec<u64> = runs.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(totals, vec![4000, 8000, 12000]);
    }

    #[test]
    fn test_send_timeout_fails_run() {
        let config =
            WorkloadConfig::per_worker(32, 10_000).with_channel(1, Some(Duration::from_micros(1)));
        let harness = Harness::new(config).unwrap();

        let counters = Arc::new(RunCounters::new(320_000));
        let outcome =
            harness.run_with_counters(AccumulationStrategy::ChannelFunnel, Arc::clone(&counters));

        match outcome {
            Err(BenchmarkError::Accumulator(AccumulatorError::Timeout { timeout, .. })) => {
                assert_eq!(timeout, Duration::from_micros(1));
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("expected a send timeout"),
        }
        // First failure stops the remaining workers
        assert!(counters.is_shutdown());
        assert!(counters.errors() >= 1);
        assert!(counters.is_complete());
    }

    #[test]
    fn test_abandoned_run_stops_workers_and_finalizes() {
        let config = WorkloadConfig::per_worker(2, u64::MAX / 4);
        let accumulator = accumulator::build(AccumulationStrategy::ChannelFunnel, &config).unwrap();
        let counters = Arc::new(RunCounters::new(0));

        let workers: Vec<_> = config
            .work_units()
            .into_iter()
            .map(|unit| {
                let handle = accumulator.handle(unit.worker_id);
                let counters = Arc::clone(&counters);
                thread::spawn(move || run_worker(unit, handle, None, &counters))
            })
            .collect();
        thread::sleep(Duration::from_millis(20));

        abandon_run(workers, accumulator.as_ref(), &counters);

        assert!(counters.is_shutdown());
        assert!(counters.is_complete());
        assert_eq!(counters.workers_done(), 2);
        assert_eq!(accumulator.total(), counters.progress().0);
    }

    #[test]
    fn test_invalid_workload_rejected() {
        assert!(matches!(
            Harness::new(WorkloadConfig::per_worker(0, 10)),
            Err(BenchmarkError::Config(_))
        ));
    }
}
