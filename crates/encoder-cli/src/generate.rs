//! Pseudo-random benchmark inputs.
//!
//! All generators draw from a [`ChaCha8Rng`] seeded with the configured
//! seed, so two runs with the same seed see identical tensors.

use encoder_common::{EncoderError, EncoderShape, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// `n` floats uniform in `[-1, 1)`.
pub fn make_random_float<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Vec<f32> {
    (0..n).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}

/// `n` token indices uniform in `[0, v)`.
///
/// # Errors
///
/// Returns [`EncoderError::InvalidArguments`] if `v` is zero or does not fit
/// in `i32`.
pub fn make_random_int<R: Rng + ?Sized>(n: usize, v: usize, rng: &mut R) -> Result<Vec<i32>> {
    let upper = i32::try_from(v)
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| EncoderError::invalid(format!("vocab size {v} outside 1..=i32::MAX")))?;
    Ok((0..n).map(|_| rng.gen_range(0..upper)).collect())
}

/// Host-resident inputs of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderInputs {
    /// `(B, T)` token indices.
    pub inp: Vec<i32>,
    /// `(V, C)` token embedding table.
    pub wte: Vec<f32>,
    /// `(T, C)` positional embedding table.
    pub wpe: Vec<f32>,
}

impl EncoderInputs {
    pub fn generate(shape: &EncoderShape, seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let inp = make_random_int(shape.num_tokens(), shape.vocab_size, &mut rng)?;
        let wte = make_random_float(shape.wte_len(), &mut rng);
        let wpe = make_random_float(shape.wpe_len(), &mut rng);
        Ok(Self { inp, wte, wpe })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_inputs() {
        let shape = EncoderShape::new(2, 8, 16, 50).unwrap();
        let a = EncoderInputs::generate(&shape, 7).unwrap();
        let b = EncoderInputs::generate(&shape, 7).unwrap();
        assert_eq!(a, b);
        let c = EncoderInputs::generate(&shape, 8).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_lengths_and_ranges() {
        let shape = EncoderShape::new(3, 5, 4, 9).unwrap();
        let inputs = EncoderInputs::generate(&shape, 0).unwrap();
        assert_eq!(inputs.inp.len(), 15);
        assert_eq!(inputs.wte.len(), 36);
        assert_eq!(inputs.wpe.len(), 20);
        assert!(inputs.inp.iter().all(|&ix| (0..9).contains(&ix)));
        assert!(inputs.wte.iter().chain(&inputs.wpe).all(|&x| (-1.0..1.0).contains(&x)));
    }

    #[test]
    fn test_rejects_zero_vocab() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(make_random_int(4, 0, &mut rng).is_err());
    }
}
