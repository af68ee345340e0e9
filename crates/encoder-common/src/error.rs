//! Error types shared by the kernel, harness and CLI crates.
//!
//! Every error in this workspace is fatal: the benchmark never retries or
//! recovers locally. The variants exist so the binary can report a precise
//! diagnostic and choose an exit status.

use thiserror::Error;

/// Process exit status for a successful run.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit status for runtime failures (bad selector, mismatch, fault).
pub const EXIT_FAILURE: i32 = 1;
/// Process exit status for malformed arguments.
pub const EXIT_USAGE: i32 = 2;

/// Errors produced while validating or benchmarking the encoder kernels.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// The kernel selector does not name an implemented variant.
    #[error("invalid kernel number: {selector}")]
    InvalidVariant { selector: i64 },

    /// The parallel runtime reported a fault for the most recent launch.
    #[error("kernel launch failed for {kernel}: {reason}")]
    LaunchFailure { kernel: String, reason: String },

    /// Device output diverged from the reference beyond the tolerance.
    #[error(
        "mismatch of {name} at {index}: device {device} vs host {host} (tolerance {tolerance:e})"
    )]
    ValidationMismatch { name: String, index: usize, device: f32, host: f32, tolerance: f32 },

    /// Shapes, buffer lengths or launch parameters are inconsistent.
    #[error("invalid arguments: {reason}")]
    InvalidArguments { reason: String },

    /// Allocation, copy or initialisation failure on the accelerator.
    #[error("device error: {reason}")]
    Device { reason: String },
}

impl EncoderError {
    /// Shorthand for [`EncoderError::InvalidArguments`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArguments { reason: reason.into() }
    }

    /// Shorthand for [`EncoderError::Device`].
    pub fn device(reason: impl Into<String>) -> Self {
        Self::Device { reason: reason.into() }
    }

    /// Shorthand for [`EncoderError::LaunchFailure`].
    pub fn launch(kernel: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LaunchFailure { kernel: kernel.into(), reason: reason.into() }
    }

    /// Exit status the binary terminates with for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArguments { .. } => EXIT_USAGE,
            Self::InvalidVariant { .. }
            | Self::LaunchFailure { .. }
            | Self::ValidationMismatch { .. }
            | Self::Device { .. } => EXIT_FAILURE,
        }
    }
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, EncoderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_variant_exits_with_one() {
        let err = EncoderError::InvalidVariant { selector: 7 };
        assert_eq!(err.exit_code(), EXIT_FAILURE);
        assert_eq!(err.to_string(), "invalid kernel number: 7");
    }

    #[test]
    fn test_mismatch_message_names_index_and_values() {
        let err = EncoderError::ValidationMismatch {
            name: "out".into(),
            index: 42,
            device: 1.5,
            host: 1.25,
            tolerance: 1e-5,
        };
        let msg = err.to_string();
        assert!(msg.contains("out"));
        assert!(msg.contains("42"));
        assert!(msg.contains("1.5"));
        assert!(msg.contains("1.25"));
        assert_eq!(err.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn test_launch_failure_is_nonzero() {
        let err = EncoderError::launch("thread-per-element", "index out of bounds");
        assert_ne!(err.exit_code(), EXIT_SUCCESS);
        assert!(err.to_string().contains("thread-per-element"));
    }

    #[test]
    fn test_invalid_arguments_is_usage_error() {
        assert_eq!(EncoderError::invalid("C must be > 0").exit_code(), EXIT_USAGE);
    }
}
