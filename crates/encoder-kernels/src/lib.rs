//! Encoder forward kernels: token embedding plus positional embedding.
//!
//! Two thread-to-output mappings are provided, thread-per-token and
//! thread-per-element, plus a 4-wide vectorised form of the latter. Each is
//! a [`simt::SimtKernel`] that runs on the host through rayon, and on NVIDIA
//! GPUs through cudarc when the `cuda` feature is enabled.

pub mod cpu;
#[cfg(feature = "cuda")]
pub mod cuda;
pub mod device;
pub mod dispatch;
pub mod launch;
pub mod reference;
pub mod simt;
pub mod variant;

#[cfg(feature = "cuda")]
pub use cuda::CudaBackend;
pub use device::{Backend, DeviceKind, HostBuffer, HostSimtBackend, available_backends, cuda_available};
pub use dispatch::encoder_forward;
pub use launch::{LaunchConfig, WARP_SIZE};
pub use reference::encoder_forward_cpu;
pub use simt::{SimtKernel, launch_host};
pub use variant::{KernelVariant, PACK_WIDTH};
