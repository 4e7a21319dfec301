//! Configuration module

pub mod benchmark_config;
pub mod cli;
pub mod workload_config;

pub use benchmark_config::BenchmarkConfig;
pub use cli::{CliArgs, OutputFormat};
pub use workload_config::{WorkloadConfig, REFERENCE_INCREMENTS, REFERENCE_WORKERS};
