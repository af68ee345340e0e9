//! Tensor geometry for the encoder forward pass.
//!
//! All four tensors are contiguous and row-major:
//!
//! | Tensor | Shape     | Offset of `[i, j, k]`   |
//! |--------|-----------|-------------------------|
//! | `out`  | (B, T, C) | `(b * T + t) * C + c`   |
//! | `inp`  | (B, T)    | `b * T + t`             |
//! | `wte`  | (V, C)    | `ix * C + c`            |
//! | `wpe`  | (T, C)    | `t * C + c`             |

use crate::error::{EncoderError, Result};
use serde::{Deserialize, Serialize};

/// Batch, sequence, channel and vocabulary extents of one computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderShape {
    /// Batch size `B`.
    pub batch: usize,
    /// Sequence length `T` (also the number of rows in `wpe`).
    pub seq_len: usize,
    /// Channel count `C`, shared by `out`, `wte` and `wpe`.
    pub channels: usize,
    /// Vocabulary size `V`; every token index must lie in `[0, V)`.
    pub vocab_size: usize,
}

impl Default for EncoderShape {
    /// GPT-2 (124M) geometry.
    fn default() -> Self {
        Self { batch: 8, seq_len: 1024, channels: 768, vocab_size: 50257 }
    }
}

impl EncoderShape {
    /// Create a shape, rejecting zero extents.
    ///
    /// # Errors
    ///
    /// Returns [`EncoderError::InvalidArguments`] if any dimension is zero.
    pub fn new(batch: usize, seq_len: usize, channels: usize, vocab_size: usize) -> Result<Self> {
        let shape = Self { batch, seq_len, channels, vocab_size };
        shape.validate()?;
        Ok(shape)
    }

    /// Check that every extent is non-zero and the element counts fit in `usize`.
    pub fn validate(&self) -> Result<()> {
        if self.batch == 0 || self.seq_len == 0 || self.channels == 0 || self.vocab_size == 0 {
            return Err(EncoderError::invalid(format!(
                "encoder dimensions must be non-zero: B={}, T={}, C={}, V={}",
                self.batch, self.seq_len, self.channels, self.vocab_size
            )));
        }
        self.batch
            .checked_mul(self.seq_len)
            .and_then(|bt| bt.checked_mul(self.channels))
            .ok_or_else(|| EncoderError::invalid(format!("B*T*C overflows usize for {self}")))?;
        self.vocab_size
            .checked_mul(self.channels)
            .ok_or_else(|| EncoderError::invalid(format!("V*C overflows usize for {self}")))?;
        Ok(())
    }

    /// Number of (batch, position) pairs, `B * T`.
    #[inline]
    pub const fn num_tokens(&self) -> usize {
        self.batch * self.seq_len
    }

    /// Number of output elements, `B * T * C`.
    #[inline]
    pub const fn num_elements(&self) -> usize {
        self.batch * self.seq_len * self.channels
    }

    /// Element count of the token embedding table, `V * C`.
    #[inline]
    pub const fn wte_len(&self) -> usize {
        self.vocab_size * self.channels
    }

    /// Element count of the positional embedding table, `T * C`.
    #[inline]
    pub const fn wpe_len(&self) -> usize {
        self.seq_len * self.channels
    }

    #[inline]
    pub const fn inp_offset(&self, b: usize, t: usize) -> usize {
        b * self.seq_len + t
    }

    #[inline]
    pub const fn out_offset(&self, b: usize, t: usize, c: usize) -> usize {
        (b * self.seq_len + t) * self.channels + c
    }

    #[inline]
    pub const fn wte_offset(&self, ix: usize, c: usize) -> usize {
        ix * self.channels + c
    }

    #[inline]
    pub const fn wpe_offset(&self, t: usize, c: usize) -> usize {
        t * self.channels + c
    }

    /// Verify that host buffers have exactly the lengths this shape implies.
    ///
    /// # Errors
    ///
    /// Returns [`EncoderError::InvalidArguments`] naming the first buffer
    /// whose length disagrees.
    pub fn check_lengths(&self, out: usize, inp: usize, wte: usize, wpe: usize) -> Result<()> {
        let expected = [
            ("out", out, self.num_elements()),
            ("inp", inp, self.num_tokens()),
            ("wte", wte, self.wte_len()),
            ("wpe", wpe, self.wpe_len()),
        ];
        for (name, got, want) in expected {
            if got != want {
                return Err(EncoderError::invalid(format!(
                    "{name} has {got} elements, expected {want} for {self}"
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for EncoderShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "B={} T={} C={} V={}", self.batch, self.seq_len, self.channels, self.vocab_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_gpt2_small() {
        let s = EncoderShape::default();
        assert_eq!((s.batch, s.seq_len, s.channels, s.vocab_size), (8, 1024, 768, 50257));
        assert_eq!(s.num_tokens(), 8192);
        assert_eq!(s.num_elements(), 8192 * 768);
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(EncoderShape::new(0, 2, 2, 3).is_err());
        assert!(EncoderShape::new(2, 0, 2, 3).is_err());
        assert!(EncoderShape::new(2, 2, 0, 3).is_err());
        assert!(EncoderShape::new(2, 2, 2, 0).is_err());
        assert!(EncoderShape::new(2, 2, 2, 3).is_ok());
    }

    #[test]
    fn test_rejects_overflowing_element_count() {
        assert!(EncoderShape::new(usize::MAX, 2, 2, 1).is_err());
        assert!(EncoderShape::new(1, 1, 2, usize::MAX).is_err());
    }

    #[test]
    fn test_offsets_are_row_major() {
        let s = EncoderShape::new(2, 3, 4, 5).unwrap();
        assert_eq!(s.inp_offset(1, 2), 5);
        assert_eq!(s.out_offset(0, 0, 0), 0);
        assert_eq!(s.out_offset(1, 2, 3), s.num_elements() - 1);
        assert_eq!(s.wte_offset(4, 3), s.wte_len() - 1);
        assert_eq!(s.wpe_offset(2, 3), s.wpe_len() - 1);
    }

    #[test]
    fn test_check_lengths_names_offending_buffer() {
        let s = EncoderShape::new(2, 2, 2, 3).unwrap();
        assert!(s.check_lengths(8, 4, 6, 4).is_ok());
        let err = s.check_lengths(8, 4, 5, 4).unwrap_err();
        assert!(err.to_string().contains("wte"));
    }
}
