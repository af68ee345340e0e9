//! Benchmark configuration.
//!
//! The benchmark reads no configuration file and no environment variables;
//! [`BenchConfig`] is populated from command-line arguments on top of
//! [`BenchConfig::default`].

use crate::error::{EncoderError, Result};
use crate::shape::EncoderShape;
use serde::{Deserialize, Serialize};

/// Largest number of threads a single block may hold.
pub const MAX_THREADS_PER_BLOCK: usize = 1024;

/// Block sizes swept by the benchmark, in report order.
pub const DEFAULT_BLOCK_SIZES: [usize; 6] = [32, 64, 128, 256, 512, 1024];

/// Absolute tolerance for comparing device output against the reference.
pub const DEFAULT_TOLERANCE: f32 = 1e-5;

/// Timed invocations per block size.
pub const DEFAULT_REPEAT_TIMES: usize = 1000;

/// Full configuration of one validation + benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    pub shape: EncoderShape,
    /// Block sizes to time, reported in this order.
    pub block_sizes: Vec<usize>,
    /// Block size used for the single correctness launch.
    pub validation_block_size: usize,
    /// Also validate once at every benchmarked block size before timing.
    #[serde(default)]
    pub validate_every_block_size: bool,
    /// Timed invocations per block size.
    pub repeat_times: usize,
    /// Untimed invocations before each timed batch.
    pub warmup: usize,
    /// Absolute tolerance for validation.
    pub tolerance: f32,
    /// Seed for the input generators.
    pub seed: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            shape: EncoderShape::default(),
            block_sizes: DEFAULT_BLOCK_SIZES.to_vec(),
            validation_block_size: 512,
            validate_every_block_size: false,
            repeat_times: DEFAULT_REPEAT_TIMES,
            warmup: 0,
            tolerance: DEFAULT_TOLERANCE,
            seed: 0,
        }
    }
}

impl BenchConfig {
    /// Check the configuration before any buffer is allocated.
    ///
    /// # Errors
    ///
    /// Returns [`EncoderError::InvalidArguments`] describing the first
    /// problem found.
    pub fn validate(&self) -> Result<()> {
        self.shape.validate()?;
        if self.block_sizes.is_empty() {
            return Err(EncoderError::invalid("at least one block size is required"));
        }
        for &bs in self.block_sizes.iter().chain(std::iter::once(&self.validation_block_size)) {
            check_block_size(bs)?;
        }
        if self.repeat_times == 0 {
            return Err(EncoderError::invalid("repeat_times must be at least 1"));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(EncoderError::invalid(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Reject block sizes outside `1..=MAX_THREADS_PER_BLOCK`.
pub fn check_block_size(block_size: usize) -> Result<()> {
    if block_size == 0 || block_size > MAX_THREADS_PER_BLOCK {
        return Err(EncoderError::invalid(format!(
            "block size {block_size} outside 1..={MAX_THREADS_PER_BLOCK}"
        )));
    }
    Ok(())
}
