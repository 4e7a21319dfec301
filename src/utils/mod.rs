//! Utility modules

pub mod error;

pub use error::{AccumulatorError, BenchmarkError, Result};
