pub mod backend;
pub mod config;
pub mod dataset;
pub mod error;
pub mod harness;
pub mod partition;
pub mod report;
pub mod schema;
pub mod workloads;

pub use error::{BenchError, Result};
