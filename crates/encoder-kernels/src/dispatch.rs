//! Launch dispatcher.

use encoder_common::{EncoderShape, Result};
use tracing::debug;

use crate::device::Backend;
use crate::launch::LaunchConfig;
use crate::variant::KernelVariant;

/// Run one encoder forward pass of `variant` on `backend`.
///
/// Computes the worker count `N` for the variant, launches
/// `ceil(N / block_size)` blocks of `block_size` threads and checks the
/// launch for a fault before returning.
///
/// # Errors
///
/// - [`encoder_common::EncoderError::InvalidArguments`] for a block size
///   outside `1..=1024`, a shape the variant cannot address, or buffers
///   whose lengths disagree with `shape`.
/// - [`encoder_common::EncoderError::LaunchFailure`] if the launch faulted.
#[allow(clippy::too_many_arguments)]
pub fn encoder_forward<B: Backend>(
    backend: &B,
    variant: KernelVariant,
    out: &mut B::F32Buffer,
    inp: &B::I32Buffer,
    wte: &B::F32Buffer,
    wpe: &B::F32Buffer,
    shape: &EncoderShape,
    block_size: usize,
) -> Result<()> {
    variant.check_shape(shape)?;
    let n = variant.num_workers(shape);
    let cfg = LaunchConfig::linear(n, block_size)?;
    debug!(
        kernel = variant.name(),
        backend = backend.name(),
        n,
        grid = cfg.grid_dim,
        block = cfg.block_dim,
        "dispatching encoder forward"
    );

    backend.launch_encoder(variant, &cfg, out, inp, wte, wpe, shape)?;
    backend.check_launch()
}
