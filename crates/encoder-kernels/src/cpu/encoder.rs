//! Encoder forward kernels expressed as [`SimtKernel`]s.
//!
//! # Kernel strategy
//!
//! All three variants compute `out[b,t,c] = wte[inp[b,t], c] + wpe[t, c]`;
//! they differ only in how the global worker index maps onto the output.
//!
//! **Thread-per-token**: `B*T` workers. Worker `idx` decomposes as
//! `b = idx / T`, `t = idx % T` and loops over all `C` channels. At any
//! given loop step neighbouring workers read *different* `wte` rows, so
//! their accesses do not coalesce.
//!
//! **Thread-per-element**: `B*T*C` workers. Worker `idx` decomposes as
//! `bt = idx / C`, `b = bt / T`, `t = bt % T`, `c = idx % C` and performs
//! exactly one addition. Neighbouring workers touch consecutive addresses in
//! `wte`, `wpe` and `out`, which is what makes this the default.
//!
//! **Vectorized**: `B*T*C/4` workers, each owning 4 consecutive channels
//! (`C % 4 == 0`). Same decomposition as thread-per-element applied to
//! `idx * 4`, with one packed 4-wide add per worker.

use encoder_common::{EncoderError, EncoderShape, Result};

use crate::simt::SimtKernel;
use crate::variant::{KernelVariant, PACK_WIDTH};

/// Read-only kernel inputs shared by every worker.
#[derive(Debug, Clone, Copy)]
pub struct EncoderArgs<'a> {
    pub inp: &'a [i32],
    pub wte: &'a [f32],
    pub wpe: &'a [f32],
    pub shape: EncoderShape,
}

impl<'a> EncoderArgs<'a> {
    /// Bundle inputs after checking their lengths against `shape`.
    ///
    /// # Errors
    ///
    /// Returns [`EncoderError::InvalidArguments`] on any length mismatch.
    pub fn new(inp: &'a [i32], wte: &'a [f32], wpe: &'a [f32], shape: EncoderShape) -> Result<Self> {
        shape.check_lengths(shape.num_elements(), inp.len(), wte.len(), wpe.len())?;
        Ok(Self { inp, wte, wpe, shape })
    }

    #[inline]
    fn token(&self, b: usize, t: usize) -> usize {
        self.inp[self.shape.inp_offset(b, t)] as usize
    }
}

/// Variant A: one worker per (batch, position) pair.
#[derive(Debug, Clone, Copy)]
pub struct ThreadPerToken<'a>(pub EncoderArgs<'a>);

impl SimtKernel for ThreadPerToken<'_> {
    fn name(&self) -> &'static str {
        KernelVariant::ThreadPerToken.name()
    }

    fn num_workers(&self) -> usize {
        self.0.shape.num_tokens()
    }

    fn outputs_per_worker(&self) -> usize {
        self.0.shape.channels
    }

    fn execute(&self, idx: usize, out_bt: &mut [f32]) {
        let args = &self.0;
        let t_len = args.shape.seq_len;
        let c_len = args.shape.channels;
        let b = idx / t_len;
        let t = idx % t_len;

        let ix = args.token(b, t);
        let wte_ix = &args.wte[ix * c_len..][..c_len];
        let wpe_t = &args.wpe[t * c_len..][..c_len];
        for i in 0..c_len {
            out_bt[i] = wte_ix[i] + wpe_t[i];
        }
    }
}

/// Variant B: one worker per (batch, position, channel) triple.
#[derive(Debug, Clone, Copy)]
pub struct ThreadPerElement<'a>(pub EncoderArgs<'a>);

impl SimtKernel for ThreadPerElement<'_> {
    fn name(&self) -> &'static str {
        KernelVariant::ThreadPerElement.name()
    }

    fn num_workers(&self) -> usize {
        self.0.shape.num_elements()
    }

    fn outputs_per_worker(&self) -> usize {
        1
    }

    fn execute(&self, idx: usize, out: &mut [f32]) {
        let args = &self.0;
        let t_len = args.shape.seq_len;
        let c_len = args.shape.channels;
        let bt = idx / c_len;
        let b = bt / t_len;
        let t = bt % t_len;
        let c = idx % c_len;

        let ix = args.token(b, t);
        out[0] = args.wte[ix * c_len + c] + args.wpe[t * c_len + c];
    }
}

/// Variant C: one worker per 4 consecutive channels.
#[derive(Debug, Clone, Copy)]
pub struct Vectorized<'a>(EncoderArgs<'a>);

impl<'a> Vectorized<'a> {
    /// # Errors
    ///
    /// Returns [`EncoderError::InvalidArguments`] unless `C % 4 == 0`.
    pub fn new(args: EncoderArgs<'a>) -> Result<Self> {
        if args.shape.channels % PACK_WIDTH != 0 {
            return Err(EncoderError::invalid(format!(
                "vectorized kernel requires C % {PACK_WIDTH} == 0, got C={}",
                args.shape.channels
            )));
        }
        Ok(Self(args))
    }
}

impl SimtKernel for Vectorized<'_> {
    fn name(&self) -> &'static str {
        KernelVariant::Vectorized.name()
    }

    fn num_workers(&self) -> usize {
        self.0.shape.num_elements() / PACK_WIDTH
    }

    fn outputs_per_worker(&self) -> usize {
        PACK_WIDTH
    }

    fn execute(&self, idx: usize, out: &mut [f32]) {
        let args = &self.0;
        let t_len = args.shape.seq_len;
        let c_len = args.shape.channels;
        let idx4 = idx * PACK_WIDTH;
        let bt = idx4 / c_len;
        let b = bt / t_len;
        let t = bt % t_len;
        let c = idx4 % c_len;

        let ix = args.token(b, t);
        let wte4 = &args.wte[ix * c_len + c..][..PACK_WIDTH];
        let wpe4 = &args.wpe[t * c_len + c..][..PACK_WIDTH];
        for ((o, w), p) in out[..PACK_WIDTH].iter_mut().zip(wte4).zip(wpe4) {
            *o = w + p;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch::LaunchConfig;
    use crate::simt::launch_host;

    fn worked_example() -> (Vec<i32>, Vec<f32>, Vec<f32>, EncoderShape) {
        (
            vec![0, 1, 2, 0],
            vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0],
            vec![10.0, 10.0, 20.0, 20.0],
            EncoderShape::new(2, 2, 2, 3).unwrap(),
        )
    }

    fn run<K: SimtKernel>(kernel: &K, block: usize, len: usize) -> Vec<f32> {
        let cfg = LaunchConfig::linear(kernel.num_workers(), block).unwrap();
        let mut out = vec![f32::NAN; len];
        launch_host(kernel, &cfg, &mut out).unwrap();
        out
    }

    #[test]
    fn test_thread_per_token_worked_example() {
        let (inp, wte, wpe, shape) = worked_example();
        let args = EncoderArgs::new(&inp, &wte, &wpe, shape).unwrap();
        let out = run(&ThreadPerToken(args), 32, 8);
        assert_eq!(out, [11.0, 11.0, 22.0, 22.0, 13.0, 13.0, 21.0, 21.0]);
    }

    #[test]
    fn test_thread_per_element_worked_example() {
        let (inp, wte, wpe, shape) = worked_example();
        let args = EncoderArgs::new(&inp, &wte, &wpe, shape).unwrap();
        let out = run(&ThreadPerElement(args), 3, 8);
        assert_eq!(out, [11.0, 11.0, 22.0, 22.0, 13.0, 13.0, 21.0, 21.0]);
    }

    #[test]
    fn test_vectorized_matches_element_kernel() {
        let shape = EncoderShape::new(2, 3, 8, 4).unwrap();
        let inp = vec![3, 0, 1, 2, 2, 3];
        let wte: Vec<f32> = (0..shape.wte_len()).map(|i| i as f32 * 0.5).collect();
        let wpe: Vec<f32> = (0..shape.wpe_len()).map(|i| -(i as f32)).collect();
        let args = EncoderArgs::new(&inp, &wte, &wpe, shape).unwrap();
        let a = run(&Vectorized::new(args).unwrap(), 5, shape.num_elements());
        let b = run(&ThreadPerElement(args), 64, shape.num_elements());
        assert_eq!(a, b);
    }

    #[test]
    fn test_vectorized_rejects_odd_channels() {
        let shape = EncoderShape::new(1, 1, 3, 1).unwrap();
        let args = EncoderArgs::new(&[0], &[0.0; 3], &[0.0; 3], shape).unwrap();
        assert!(Vectorized::new(args).is_err());
    }

    #[test]
    fn test_args_reject_wrong_lengths() {
        let shape = EncoderShape::new(1, 2, 2, 2).unwrap();
        assert!(EncoderArgs::new(&[0], &[0.0; 4], &[0.0; 4], shape).is_err());
        assert!(EncoderArgs::new(&[0, 1], &[0.0; 3], &[0.0; 4], shape).is_err());
    }
}
