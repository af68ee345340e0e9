//! Process exit codes.

use encoder_common::EncoderError;
pub use encoder_common::{EXIT_FAILURE, EXIT_SUCCESS, EXIT_USAGE};

/// Exit status for an error that reached `main`.
///
/// Typed [`EncoderError`]s anywhere in the chain pick their own status;
/// anything else is a generic failure.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<EncoderError>())
        .map_or(EXIT_FAILURE, EncoderError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_typed_errors_choose_status() {
        let err = anyhow::Error::new(EncoderError::InvalidVariant { selector: 9 });
        assert_eq!(exit_code_for(&err), EXIT_FAILURE);
        let err = anyhow::Error::new(EncoderError::invalid("bad shape"));
        assert_eq!(exit_code_for(&err), EXIT_USAGE);
    }

    #[test]
    fn test_context_does_not_hide_typed_error() {
        let res: Result<(), EncoderError> = Err(EncoderError::invalid("bad"));
        let err = res.context("while configuring").unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_USAGE);
    }

    #[test]
    fn test_untyped_errors_are_generic_failures() {
        assert_eq!(exit_code_for(&anyhow::anyhow!("io trouble")), EXIT_FAILURE);
    }
}
