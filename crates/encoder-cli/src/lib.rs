//! Validation and benchmark harness for the encoder forward kernels.
//!
//! The `encoder-bench` binary is a thin shell over these modules; they are
//! exposed as a library so the harness can be tested without a process.

pub mod cli;
pub mod exit;
pub mod generate;
pub mod harness;
pub mod report;
pub mod timing;
pub mod validate;

pub use generate::EncoderInputs;
pub use harness::{run, run_with};
pub use report::{BenchReport, BenchRow, memory_ops_bytes};
