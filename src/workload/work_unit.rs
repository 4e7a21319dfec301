//! Work partitioning
//!
//! Splits a total increment count into one `WorkUnit` per worker. Each unit
//! is consumed by exactly one worker and never changes after creation.

use clap::ValueEnum;
use serde::Serialize;

/// What to do with `total % workers` increments that don't divide evenly
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemainderPolicy {
    /// Integer division per worker; the remainder is never issued
    #[default]
    Drop,
    /// The first `remainder` workers each take one extra increment
    Distribute,
}

/// A single worker's share of the workload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkUnit {
    pub worker_id: usize,
    pub increment_count: u64,
}

impl WorkUnit {
    /// Sum of increments across a set of units (the expected final total)
    pub fn total(units: &[WorkUnit]) -> u64 {
        units.iter().map(|u| u.increment_count).sum()
    }
}

/// Increments lost by `RemainderPolicy::Drop` for this split
pub fn dropped_remainder(total: u64, workers: usize) -> u64 {
    if workers == 0 {
        return total;
    }
    total % workers as u64
}

/// Partition `total` increments across `workers`
pub fn partition(total: u64, workers: usize, policy: RemainderPolicy) -> Vec<WorkUnit> {
    if workers == 0 {
        return Vec::new();
    }

    let base = total / workers as u64;
    let remainder = dropped_remainder(total, workers) as usize;

    (0..workers)
        .map(|worker_id| {
            let extra = match policy {
                RemainderPolicy::Distribute if worker_id < remainder => 1,
                _ => 0,
            };
            WorkUnit {
                worker_id,
                increment_count: base + extra,
            }
        })
        .collect()
}
