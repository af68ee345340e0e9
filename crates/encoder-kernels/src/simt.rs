//! Host execution of SIMT-style kernels.
//!
//! A [`SimtKernel`] is a per-worker procedure addressed by a global worker
//! index. [`launch_host`] runs it over a [`LaunchConfig`] grid the way a GPU
//! would schedule it: each block becomes one rayon task, and inside a block
//! the threads run in `threadIdx.x` order computing
//! `idx = blockIdx.x * blockDim.x + threadIdx.x`. Threads with
//! `idx >= num_workers()` return immediately.
//!
//! Every worker owns a disjoint span of `outputs_per_worker()` consecutive
//! output elements starting at `idx * outputs_per_worker()`, so blocks never
//! share mutable state and no synchronisation is needed.

use std::panic::{self, AssertUnwindSafe};

use encoder_common::{EncoderError, Result};
use rayon::prelude::*;
use tracing::trace;

use crate::launch::LaunchConfig;

/// A data-parallel kernel expressed as a function of the global worker index.
pub trait SimtKernel: Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Number of active workers; threads beyond this are idle.
    fn num_workers(&self) -> usize;

    /// Output elements written by each worker.
    fn outputs_per_worker(&self) -> usize;

    /// Run worker `idx`, writing its span of the output into `dst`.
    ///
    /// `dst.len() == outputs_per_worker()` and `dst` starts at output
    /// offset `idx * outputs_per_worker()`.
    fn execute(&self, idx: usize, dst: &mut [f32]);
}

/// Execute `kernel` over the grid described by `cfg`, writing into `out`.
///
/// Blocks past `cfg.grid_dim` are not launched, so an undersized grid
/// leaves the tail of `out` untouched exactly as on a device.
///
/// # Errors
///
/// - [`EncoderError::InvalidArguments`] if `out` cannot hold every worker's span.
/// - [`EncoderError::LaunchFailure`] if any worker faulted (panicked), e.g.
///   on an out-of-range token index.
pub fn launch_host<K: SimtKernel>(kernel: &K, cfg: &LaunchConfig, out: &mut [f32]) -> Result<()> {
    let n = kernel.num_workers();
    let per_worker = kernel.outputs_per_worker();
    let required = n * per_worker;
    if out.len() < required {
        return Err(EncoderError::invalid(format!(
            "{}: output holds {} elements, {n} workers x {per_worker} need {required}",
            kernel.name(),
            out.len(),
        )));
    }
    if n == 0 {
        return Ok(());
    }

    let block_dim = cfg.block_dim as usize;
    let grid_dim = cfg.grid_dim as usize;
    trace!(kernel = kernel.name(), grid_dim, block_dim, n, "host SIMT launch");

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        out[..required]
            .par_chunks_mut(block_dim * per_worker)
            .enumerate()
            .take(grid_dim)
            .for_each(|(block_idx, block_out)| {
                run_block(kernel, block_idx, block_dim, n, per_worker, block_out);
            });
    }));

    result.map_err(|payload| EncoderError::launch(kernel.name(), panic_message(&*payload)))
}

fn run_block<K: SimtKernel>(
    kernel: &K,
    block_idx: usize,
    block_dim: usize,
    n: usize,
    per_worker: usize,
    block_out: &mut [f32],
) {
    for thread_idx in 0..block_dim {
        let idx = block_idx * block_dim + thread_idx;
        if idx >= n {
            return;
        }
        let start = thread_idx * per_worker;
        kernel.execute(idx, &mut block_out[start..start + per_worker]);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
