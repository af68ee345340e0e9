//! Common types for the encoder forward benchmark
//!
//! This crate provides the shape, configuration and error types shared by the
//! kernel implementations and the validation/benchmark harness.

pub mod config;
pub mod error;
pub mod math;
pub mod shape;

pub use config::{
    BenchConfig, DEFAULT_BLOCK_SIZES, DEFAULT_REPEAT_TIMES, DEFAULT_TOLERANCE,
    MAX_THREADS_PER_BLOCK, check_block_size,
};
pub use error::{EXIT_FAILURE, EXIT_SUCCESS, EXIT_USAGE, EncoderError, Result};
pub use math::ceil_div;
pub use shape::EncoderShape;
