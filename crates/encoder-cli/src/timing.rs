//! Repeated-invocation timer.

use std::time::{Duration, Instant};

use encoder_common::{EncoderError, Result};
use encoder_kernels::Backend;
use tracing::debug;

/// Average wall-clock duration of one call to `f`.
///
/// Runs `f` `warmup` times untimed, then `repeats` times back to back. The
/// backend is synchronised before the clock starts and again before it
/// stops, so asynchronous launches are fully accounted for.
///
/// # Errors
///
/// Returns [`EncoderError::InvalidArguments`] if `repeats` is zero, and
/// propagates the first error returned by `f` or the backend.
pub fn benchmark_kernel<B, F>(repeats: usize, warmup: usize, backend: &B, mut f: F) -> Result<Duration>
where
    B: Backend,
    F: FnMut() -> Result<()>,
{
    if repeats == 0 {
        return Err(EncoderError::invalid("benchmark needs at least one repeat"));
    }

    for _ in 0..warmup {
        f()?;
    }
    backend.synchronize()?;

    let start = Instant::now();
    for _ in 0..repeats {
        f()?;
    }
    backend.synchronize()?;
    let elapsed = start.elapsed();

    let avg = elapsed.div_f64(repeats as f64);
    debug!(repeats, warmup, total_ms = elapsed.as_secs_f64() * 1e3, avg_ms = avg.as_secs_f64() * 1e3, "timed kernel");
    Ok(avg)
}
