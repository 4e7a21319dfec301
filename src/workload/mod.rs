//! Workload definitions: strategies, work units and named workloads

pub mod named;
pub mod strategy;
pub mod work_unit;

pub use named::NamedWorkload;
pub use strategy::AccumulationStrategy;
pub use work_unit::{dropped_remainder, partition, RemainderPolicy, WorkUnit};
