//! Elementwise comparison of device output against the reference.

use encoder_common::{EncoderError, Result};
use tracing::{debug, info};

/// Leading (device, host) pairs logged before comparing.
pub const PREVIEW_ELEMENTS: usize = 5;

/// Compare `device` against `host` with absolute tolerance `tolerance`.
///
/// NaN on either side never passes.
///
/// # Errors
///
/// - [`EncoderError::InvalidArguments`] if the lengths differ.
/// - [`EncoderError::ValidationMismatch`] for the first element with
///   `|device - host| > tolerance`.
pub fn validate_result(device: &[f32], host: &[f32], name: &str, tolerance: f32) -> Result<()> {
    if device.len() != host.len() {
        return Err(EncoderError::invalid(format!(
            "{name}: device has {} elements, host has {}",
            device.len(),
            host.len()
        )));
    }

    for (i, (d, h)) in device.iter().zip(host).take(PREVIEW_ELEMENTS).enumerate() {
        debug!(name, index = i, device = d, host = h, "preview");
    }

    for (index, (&d, &h)) in device.iter().zip(host).enumerate() {
        let diff = (d - h).abs();
        if diff.is_nan() || diff > tolerance {
            return Err(EncoderError::ValidationMismatch {
                name: name.to_string(),
                index,
                device: d,
                host: h,
                tolerance,
            });
        }
    }

    info!(name, elements = device.len(), "results match");
    Ok(())
}
