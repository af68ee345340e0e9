//! Sequential reference implementation.
//!
//! The ground truth every kernel variant is validated against: a plain
//! sequential loop with no parallelism.

use encoder_common::{EncoderShape, Result};

/// `out[b,t,c] = wte[inp[b,t], c] + wpe[t, c]`, computed sequentially.
///
/// Token indices must lie in `[0, V)`; an out-of-range index panics on the
/// slice bounds check.
///
/// # Errors
///
/// Returns [`encoder_common::EncoderError::InvalidArguments`] if any buffer
/// length disagrees with `shape`.
pub fn encoder_forward_cpu(
    out: &mut [f32],
    inp: &[i32],
    wte: &[f32],
    wpe: &[f32],
    shape: &EncoderShape,
) -> Result<()> {
    shape.check_lengths(out.len(), inp.len(), wte.len(), wpe.len())?;
    let (b_len, t_len, c_len) = (shape.batch, shape.seq_len, shape.channels);

    for b in 0..b_len {
        for t in 0..t_len {
            let out_bt = &mut out[shape.out_offset(b, t, 0)..][..c_len];
            let ix = inp[shape.inp_offset(b, t)] as usize;
            let wte_ix = &wte[shape.wte_offset(ix, 0)..][..c_len];
            let wpe_t = &wpe[shape.wpe_offset(t, 0)..][..c_len];
            for c in 0..c_len {
                out_bt[c] = wte_ix[c] + wpe_t[c];
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worked_example() {
        let shape = EncoderShape::new(2, 2, 2, 3).unwrap();
        let inp = [0, 1, 2, 0];
        let wte = [1.0, 1.0, 2.0, 2.0, 3.0, 3.0];
        let wpe = [10.0, 10.0, 20.0, 20.0];
        let mut out = [0.0f32; 8];
        encoder_forward_cpu(&mut out, &inp, &wte, &wpe, &shape).unwrap();
        assert_eq!(out, [11.0, 11.0, 22.0, 22.0, 13.0, 13.0, 21.0, 21.0]);
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let shape = EncoderShape::new(1, 2, 2, 2).unwrap();
        let mut out = [0.0f32; 4];
        assert!(encoder_forward_cpu(&mut out, &[0], &[0.0; 4], &[0.0; 4], &shape).is_err());
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_token_panics() {
        let shape = EncoderShape::new(1, 1, 2, 2).unwrap();
        let mut out = [0.0f32; 2];
        let _ = encoder_forward_cpu(&mut out, &[2], &[0.0; 4], &[0.0; 2], &shape);
    }
}
