//! Validation and benchmark harness.
//!
//! A run proves correctness first and only then measures: the selected
//! kernel is launched once, copied back and compared against the reference,
//! and any error ends the run before a single timing is taken.

use encoder_common::{BenchConfig, EncoderShape, Result};
use encoder_kernels::{Backend, KernelVariant, encoder_forward, encoder_forward_cpu};
use tracing::{info, info_span};

use crate::generate::EncoderInputs;
use crate::report::{BenchReport, BenchRow};
use crate::timing::benchmark_kernel;
use crate::validate::validate_result;

/// Device copies of the inputs plus the output buffer.
struct DeviceTensors<B: Backend> {
    out: B::F32Buffer,
    inp: B::I32Buffer,
    wte: B::F32Buffer,
    wpe: B::F32Buffer,
}

impl<B: Backend> DeviceTensors<B> {
    fn upload(backend: &B, inputs: &EncoderInputs, shape: &EncoderShape) -> Result<Self> {
        Ok(Self {
            out: backend.alloc_f32(shape.num_elements())?,
            inp: backend.htod_i32(&inputs.inp)?,
            wte: backend.htod_f32(&inputs.wte)?,
            wpe: backend.htod_f32(&inputs.wpe)?,
        })
    }

    fn forward(
        &mut self,
        backend: &B,
        variant: KernelVariant,
        shape: &EncoderShape,
        block_size: usize,
    ) -> Result<()> {
        encoder_forward(backend, variant, &mut self.out, &self.inp, &self.wte, &self.wpe, shape, block_size)
    }

    /// Launch once at `block_size`, copy back and compare with `expected`.
    fn check(
        &mut self,
        backend: &B,
        variant: KernelVariant,
        shape: &EncoderShape,
        block_size: usize,
        expected: &[f32],
        tolerance: f32,
    ) -> Result<()> {
        self.forward(backend, variant, shape, block_size)?;
        backend.synchronize()?;
        let device_out = backend.dtoh_f32(&self.out)?;
        validate_result(&device_out, expected, "out", tolerance)
    }
}

/// Validate `variant` on `backend`, then time it at every configured block
/// size, calling `on_row` as each measurement completes.
pub fn run_with<B, F>(
    config: &BenchConfig,
    backend: &B,
    variant: KernelVariant,
    mut on_row: F,
) -> Result<BenchReport>
where
    B: Backend,
    F: FnMut(&BenchRow),
{
    config.validate()?;
    let shape = config.shape;
    variant.check_shape(&shape)?;
    let _span = info_span!("encoder_bench", kernel = variant.name(), backend = backend.name()).entered();

    info!(%shape, seed = config.seed, "generating inputs");
    let inputs = EncoderInputs::generate(&shape, config.seed)?;

    let mut expected = vec![0.0f32; shape.num_elements()];
    encoder_forward_cpu(&mut expected, &inputs.inp, &inputs.wte, &inputs.wpe, &shape)?;

    let mut tensors = DeviceTensors::upload(backend, &inputs, &shape)?;
    tensors.check(backend, variant, &shape, config.validation_block_size, &expected, config.tolerance)?;
    if config.validate_every_block_size {
        for &block_size in &config.block_sizes {
            info!(block_size, "checking block size");
            tensors.check(backend, variant, &shape, block_size, &expected, config.tolerance)?;
        }
    }
    info!("all results match, starting benchmarks");

    let mut rows = Vec::with_capacity(config.block_sizes.len());
    for &block_size in &config.block_sizes {
        let avg = benchmark_kernel(config.repeat_times, config.warmup, backend, || {
            tensors.forward(backend, variant, &shape, block_size)
        })?;
        let row = BenchRow::new(block_size, avg, &shape);
        on_row(&row);
        rows.push(row);
    }

    Ok(BenchReport::new(variant, backend.name(), shape, config.repeat_times, rows))
}

/// [`run_with`] without a per-row callback.
pub fn run<B: Backend>(config: &BenchConfig, backend: &B, variant: KernelVariant) -> Result<BenchReport> {
    run_with(config, backend, variant, |_| {})
}
