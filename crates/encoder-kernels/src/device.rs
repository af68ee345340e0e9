//! Device backends.
//!
//! A [`Backend`] owns accelerator-resident buffers that are distinct from the
//! caller's host vectors. The only way data crosses between the two address
//! spaces is an explicit, directional copy (`htod_*` / `dtoh_f32`).
//!
//! Kernel launches follow the asynchronous model of a real device: a fault
//! raised while the grid runs is not returned by [`Backend::launch_encoder`]
//! but recorded, and surfaces from the next [`Backend::check_launch`].

use std::fmt;
use std::sync::{Mutex, PoisonError};

use encoder_common::{EncoderError, EncoderShape, Result};
use tracing::{debug, warn};

use crate::cpu::{EncoderArgs, ThreadPerElement, ThreadPerToken, Vectorized};
use crate::launch::LaunchConfig;
use crate::simt::launch_host;
use crate::variant::KernelVariant;

/// Accelerator abstraction consumed by the dispatcher and the harness.
pub trait Backend: Send + Sync {
    /// Device-resident `f32` storage.
    type F32Buffer: Send + Sync;
    /// Device-resident `i32` storage.
    type I32Buffer: Send + Sync;

    fn name(&self) -> &'static str;

    /// Reserve `len` zero-initialised floats on the device.
    fn alloc_f32(&self, len: usize) -> Result<Self::F32Buffer>;

    /// Copy a host slice into a fresh device buffer.
    fn htod_f32(&self, host: &[f32]) -> Result<Self::F32Buffer>;

    /// Copy host token indices into a fresh device buffer.
    fn htod_i32(&self, host: &[i32]) -> Result<Self::I32Buffer>;

    /// Copy a device buffer back into a new host vector.
    fn dtoh_f32(&self, dev: &Self::F32Buffer) -> Result<Vec<f32>>;

    /// Enqueue `variant` over the grid `cfg`.
    ///
    /// Configuration errors (buffer lengths that disagree with `shape`) are
    /// returned immediately; faults raised by running workers are reported
    /// through [`Backend::check_launch`].
    #[allow(clippy::too_many_arguments)]
    fn launch_encoder(
        &self,
        variant: KernelVariant,
        cfg: &LaunchConfig,
        out: &mut Self::F32Buffer,
        inp: &Self::I32Buffer,
        wte: &Self::F32Buffer,
        wpe: &Self::F32Buffer,
        shape: &EncoderShape,
    ) -> Result<()>;

    /// Report and clear the fault of the most recent launch, if any.
    fn check_launch(&self) -> Result<()>;

    /// Block until all enqueued work has finished.
    fn synchronize(&self) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────────
// Device selection
// ───────────────────────────────────────────────────────────────────

/// Which backend the harness should run on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeviceKind {
    /// Host SIMT emulation on the rayon pool.
    Cpu,
    /// NVIDIA GPU through cudarc (requires the `cuda` feature).
    Cuda,
    /// CUDA when a device is present, host SIMT otherwise.
    #[default]
    Auto,
}

impl DeviceKind {
    /// Resolve [`DeviceKind::Auto`] to a concrete backend.
    ///
    /// # Errors
    ///
    /// Returns [`EncoderError::Device`] if CUDA is requested explicitly but
    /// this build has no CUDA support.
    pub fn resolve(self) -> Result<DeviceKind> {
        match self {
            Self::Cpu => Ok(Self::Cpu),
            Self::Cuda if cfg!(feature = "cuda") => Ok(Self::Cuda),
            Self::Cuda => {
                Err(EncoderError::device("CUDA requested but built without the `cuda` feature"))
            }
            Self::Auto if cuda_available() => Ok(Self::Cuda),
            Self::Auto => {
                debug!("no CUDA device found, falling back to host SIMT backend");
                Ok(Self::Cpu)
            }
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cpu => "cpu",
            Self::Cuda => "cuda",
            Self::Auto => "auto",
        })
    }
}

/// Whether a CUDA device can be opened by this build.
pub fn cuda_available() -> bool {
    #[cfg(feature = "cuda")]
    {
        crate::cuda::CudaBackend::is_available()
    }
    #[cfg(not(feature = "cuda"))]
    {
        false
    }
}

/// Names of the backends usable in this process, best first.
pub fn available_backends() -> Vec<&'static str> {
    let mut names = Vec::with_capacity(2);
    if cuda_available() {
        names.push("cuda");
    }
    names.push(HostSimtBackend::NAME);
    names
}

// ───────────────────────────────────────────────────────────────────
// Host SIMT backend
// ───────────────────────────────────────────────────────────────────

/// Device memory of the host backend: an owned allocation that never
/// aliases a caller's vector.
#[derive(Debug, Clone, PartialEq)]
pub struct HostBuffer<T>(Vec<T>);

impl<T> HostBuffer<T> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Runs the kernels on the host with [`launch_host`].
#[derive(Debug, Default)]
pub struct HostSimtBackend {
    fault: Mutex<Option<EncoderError>>,
}

impl HostSimtBackend {
    pub const NAME: &'static str = "host-simt";

    pub fn new() -> Self {
        Self::default()
    }

    fn record_fault(&self, err: EncoderError) {
        warn!(error = %err, "host SIMT launch faulted");
        *self.fault.lock().unwrap_or_else(PoisonError::into_inner) = Some(err);
    }
}

impl Backend for HostSimtBackend {
    type F32Buffer = HostBuffer<f32>;
    type I32Buffer = HostBuffer<i32>;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn alloc_f32(&self, len: usize) -> Result<Self::F32Buffer> {
        Ok(HostBuffer(vec![0.0; len]))
    }

    fn htod_f32(&self, host: &[f32]) -> Result<Self::F32Buffer> {
        Ok(HostBuffer(host.to_vec()))
    }

    fn htod_i32(&self, host: &[i32]) -> Result<Self::I32Buffer> {
        Ok(HostBuffer(host.to_vec()))
    }

    fn dtoh_f32(&self, dev: &Self::F32Buffer) -> Result<Vec<f32>> {
        Ok(dev.0.clone())
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
        let args = EncoderArgs::new(&inp.0, &wte.0, &wpe.0, *shape)?;

        let launched = match variant {
            KernelVariant::ThreadPerToken => launch_host(&ThreadPerToken(args), cfg, &mut out.0),
            KernelVariant::ThreadPerElement => {
                launch_host(&ThreadPerElement(args), cfg, &mut out.0)
            }
            KernelVariant::Vectorized => launch_host(&Vectorized::new(args)?, cfg, &mut out.0),
        };

        match launched {
            Err(err @ EncoderError::LaunchFailure { .. }) => {
                self.record_fault(err);
                Ok(())
            }
            other => other,
        }
    }

    fn check_launch(&self) -> Result<()> {
        match self.fault.lock().unwrap_or_else(PoisonError::into_inner).take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn synchronize(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(
        backend: &HostSimtBackend,
        inp: &[i32],
        wte: &[f32],
        wpe: &[f32],
    ) -> (HostBuffer<i32>, HostBuffer<f32>, HostBuffer<f32>) {
        (
            backend.htod_i32(inp).unwrap(),
            backend.htod_f32(wte).unwrap(),
            backend.htod_f32(wpe).unwrap(),
        )
    }

    #[test]
    fn test_copies_are_independent_of_host_vectors() {
        let backend = HostSimtBackend::new();
        let mut host = vec![1.0f32, 2.0, 3.0];
        let dev = backend.htod_f32(&host).unwrap();
        host[0] = 99.0;
        assert_eq!(backend.dtoh_f32(&dev).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_alloc_is_zeroed() {
        let backend = HostSimtBackend::new();
        let dev = backend.alloc_f32(5).unwrap();
        assert_eq!(dev.len(), 5);
        assert!(backend.dtoh_f32(&dev).unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_fault_is_deferred_to_check_launch() {
        let backend = HostSimtBackend::new();
        let shape = EncoderShape::new(1, 2, 2, 2).unwrap();
        // token 5 is outside the 2-row table
        let (inp, wte, wpe) = upload(&backend, &[0, 5], &[0.0; 4], &[0.0; 4]);
        let mut out = backend.alloc_f32(4).unwrap();
        let cfg = LaunchConfig::linear(4, 32).unwrap();

        backend
            .launch_encoder(KernelVariant::ThreadPerElement, &cfg, &mut out, &inp, &wte, &wpe, &shape)
            .unwrap();
        let err = backend.check_launch().unwrap_err();
        assert!(matches!(err, EncoderError::LaunchFailure { .. }), "{err:?}");
        // cleared once reported
        assert!(backend.check_launch().is_ok());
    }

    #[test]
    fn test_length_mismatch_fails_immediately() {
        let backend = HostSimtBackend::new();
        let shape = EncoderShape::new(1, 2, 2, 2).unwrap();
        let (inp, wte, wpe) = upload(&backend, &[0, 1], &[0.0; 4], &[0.0; 4]);
        let mut out = backend.alloc_f32(3).unwrap();
        let cfg = LaunchConfig::linear(4, 32).unwrap();
        let err = backend
            .launch_encoder(KernelVariant::ThreadPerElement, &cfg, &mut out, &inp, &wte, &wpe, &shape)
            .unwrap_err();
        assert!(matches!(err, EncoderError::InvalidArguments { .. }));
        assert!(backend.check_launch().is_ok());
    }

    #[test]
    fn test_cpu_always_resolves() {
        assert_eq!(DeviceKind::Cpu.resolve().unwrap(), DeviceKind::Cpu);
        assert!(available_backends().contains(&HostSimtBackend::NAME));
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn test_cuda_unavailable_without_feature() {
        assert!(DeviceKind::Cuda.resolve().is_err());
        assert_eq!(DeviceKind::Auto.resolve().unwrap(), DeviceKind::Cpu);
    }
}
