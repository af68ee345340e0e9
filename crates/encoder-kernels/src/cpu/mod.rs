//! Host SIMT kernels.

pub mod encoder;

pub use encoder::{EncoderArgs, ThreadPerElement, ThreadPerToken, Vectorized};
