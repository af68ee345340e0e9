//! CUDA backend using cudarc 0.17.
//!
//! The three encoder kernels are compiled from CUDA C with NVRTC when the
//! backend is created and launched on the context's default stream. Device
//! buffers are `CudaSlice`s, so host and device memory never alias.

use std::panic;
use std::sync::Arc;

use cudarc::driver::{
    CudaContext, CudaFunction, CudaModule, CudaSlice, CudaStream, LaunchConfig as CudaLaunchConfig,
    PushKernelArg,
};
use cudarc::nvrtc::compile_ptx;
use encoder_common::{EncoderError, EncoderShape, Result};
use tracing::{debug, info};

use crate::device::Backend;
use crate::launch::LaunchConfig;
use crate::variant::KernelVariant;

const ENCODER_SOURCE: &str = include_str!("kernels/encoder_forward.cu");

/// Runs the encoder kernels on an NVIDIA GPU.
pub struct CudaBackend {
    ctx: Arc<CudaContext>,
    stream: Arc<CudaStream>,
    _module: Arc<CudaModule>,
    kernels: [CudaFunction; 3],
}

impl CudaBackend {
    pub const NAME: &'static str = "cuda";

    /// Open device 0.
    pub fn new() -> Result<Self> {
        Self::new_with_device(0)
    }

    /// Open `device_id`, compile the kernels and load them.
    ///
    /// # Errors
    ///
    /// Returns [`EncoderError::Device`] if the context cannot be created or
    /// the kernels fail to compile or load.
    pub fn new_with_device(device_id: usize) -> Result<Self> {
        info!(device_id, "initializing CUDA encoder backend");

        let ctx = CudaContext::new(device_id).map_err(|e| {
            EncoderError::device(format!("failed to create CUDA context for device {device_id}: {e:?}"))
        })?;
        let stream = ctx.default_stream();

        let ptx = compile_ptx(ENCODER_SOURCE)
            .map_err(|e| EncoderError::device(format!("failed to compile PTX: {e:?}")))?;
        let module = ctx
            .load_module(ptx)
            .map_err(|e| EncoderError::device(format!("failed to load CUDA module: {e:?}")))?;

        let load = |name: &str| {
            module
                .load_function(name)
                .map_err(|e| EncoderError::device(format!("failed to load {name}: {e:?}")))
        };
        let kernels = [
            load("encoder_forward_kernel1")?,
            load("encoder_forward_kernel2")?,
            load("encoder_forward_kernel3")?,
        ];

        Ok(Self { ctx, stream, _module: module, kernels })
    }

    /// Whether the driver library loads and reports at least one device.
    pub fn is_available() -> bool {
        // dynamic loading panics when libcuda is absent
        panic::catch_unwind(CudaContext::device_count)
            .ok()
            .and_then(|count| count.ok())
            .is_some_and(|count| count > 0)
    }

    fn function(&self, variant: KernelVariant) -> &CudaFunction {
        match variant {
            KernelVariant::ThreadPerToken => &self.kernels[0],
            KernelVariant::ThreadPerElement => &self.kernels[1],
            KernelVariant::Vectorized => &self.kernels[2],
        }
    }
}

fn dim_arg(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| EncoderError::invalid(format!("{what}={value} does not fit the kernel's int")))
}

impl Backend for CudaBackend {
    type F32Buffer = CudaSlice<f32>;
    type I32Buffer = CudaSlice<i32>;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn alloc_f32(&self, len: usize) -> Result<Self::F32Buffer> {
        self.stream
            .alloc_zeros(len)
            .map_err(|e| EncoderError::device(format!("failed to allocate {len} floats: {e:?}")))
    }

    fn htod_f32(&self, host: &[f32]) -> Result<Self::F32Buffer> {
        self.stream
            .memcpy_stod(host)
            .map_err(|e| EncoderError::device(format!("failed to copy to device: {e:?}")))
    }

    fn htod_i32(&self, host: &[i32]) -> Result<Self::I32Buffer> {
        self.stream
            .memcpy_stod(host)
            .map_err(|e| EncoderError::device(format!("failed to copy to device: {e:?}")))
    }

    fn dtoh_f32(&self, dev: &Self::F32Buffer) -> Result<Vec<f32>> {
        self.stream
            .memcpy_dtov(dev)
            .map_err(|e| EncoderError::device(format!("failed to copy to host: {e:?}")))
    }

    fn launch_encoder(
        &self,
        variant: KernelVariant,
        cfg: &LaunchConfig,
        out: &mut Self::F32Buffer,
        inp: &Self::I32Buffer,
        wte: &Self::F32Buffer,
        wpe: &Self::F32Buffer,
        shape: &EncoderShape,
    ) -> Result<()> {
        shape.check_lengths(out.len(), inp.len(), wte.len(), wpe.len())?;
        // the kernels index with int
        dim_arg(shape.num_elements().max(shape.wte_len()), "B*T*C or V*C")?;
        let b = dim_arg(shape.batch, "B")?;
        let t = dim_arg(shape.seq_len, "T")?;
        let c = dim_arg(shape.channels, "C")?;

        let launch_cfg = CudaLaunchConfig {
            grid_dim: cfg.grid_xyz(),
            block_dim: cfg.block_xyz(),
            shared_mem_bytes: 0,
        };
        debug!(kernel = variant.name(), grid = ?launch_cfg.grid_dim, block = ?launch_cfg.block_dim, "launching CUDA kernel");

        let mut builder = self.stream.launch_builder(self.function(variant));
        builder.arg(out);
        builder.arg(inp);
        builder.arg(wte);
        builder.arg(wpe);
        builder.arg(&b);
        builder.arg(&t);
        builder.arg(&c);

        // SAFETY: argument order and types match the kernel signatures in
        // encoder_forward.cu, and every buffer length was checked above.
        unsafe { builder.launch(launch_cfg) }
            .map(|_| ())
            .map_err(|e| EncoderError::launch(variant.name(), format!("{e:?}")))
    }

    fn check_launch(&self) -> Result<()> {
        self.ctx
            .check_err()
            .map_err(|e| EncoderError::launch("cuda", format!("{e:?}")))
    }

    fn synchronize(&self) -> Result<()> {
        self.stream
            .synchronize()
            .map_err(|e| EncoderError::launch("cuda", format!("stream synchronize failed: {e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::encoder_forward;
    use crate::reference::encoder_forward_cpu;

    #[test]
    #[ignore = "requires CUDA runtime"]
    fn test_cuda_variants_match_reference() {
        let backend = CudaBackend::new().unwrap();
        let shape = EncoderShape::new(2, 2, 4, 3).unwrap();
        let inp = [0, 1, 2, 0];
        let wte: Vec<f32> = (0..shape.wte_len()).map(|i| i as f32).collect();
        let wpe: Vec<f32> = (0..shape.wpe_len()).map(|i| 100.0 + i as f32).collect();
        let mut expected = vec![0.0f32; shape.num_elements()];
        encoder_forward_cpu(&mut expected, &inp, &wte, &wpe, &shape).unwrap();

        let d_inp = backend.htod_i32(&inp).unwrap();
        let d_wte = backend.htod_f32(&wte).unwrap();
        let d_wpe = backend.htod_f32(&wpe).unwrap();
        for variant in KernelVariant::ALL {
            let mut d_out = backend.alloc_f32(shape.num_elements()).unwrap();
            encoder_forward(&backend, variant, &mut d_out, &d_inp, &d_wte, &d_wpe, &shape, 32)
                .unwrap();
            backend.synchronize().unwrap();
            assert_eq!(backend.dtoh_f32(&d_out).unwrap(), expected, "{variant}");
        }
    }
}
