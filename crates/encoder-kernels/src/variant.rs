//! Kernel variant selection.

use std::fmt;

use encoder_common::{EncoderError, EncoderShape, Result};

/// Channels handled per worker by [`KernelVariant::Vectorized`].
pub const PACK_WIDTH: usize = 4;

/// The implemented thread-to-output mappings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum KernelVariant {
    /// One worker per (b, t); each loops over all `C` channels.
    ThreadPerToken = 1,
    /// One worker per (b, t, c); a single addition each, coalesced accesses.
    #[default]
    ThreadPerElement = 2,
    /// One worker per 4 consecutive channels of one (b, t); packed loads.
    Vectorized = 3,
}

impl KernelVariant {
    /// Every implemented variant, in selector order.
    pub const ALL: [KernelVariant; 3] =
        [Self::ThreadPerToken, Self::ThreadPerElement, Self::Vectorized];

    /// Map a command-line selector to a variant.
    ///
    /// # Errors
    ///
    /// Returns [`EncoderError::InvalidVariant`] for any other number.
    pub fn from_selector(selector: i64) -> Result<Self> {
        match selector {
            1 => Ok(Self::ThreadPerToken),
            2 => Ok(Self::ThreadPerElement),
            3 => Ok(Self::Vectorized),
            _ => Err(EncoderError::InvalidVariant { selector }),
        }
    }

    /// The selector number printed in "Using kernel N".
    pub fn selector(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::ThreadPerToken => "thread-per-token",
            Self::ThreadPerElement => "thread-per-element",
            Self::Vectorized => "vectorized-x4",
        }
    }

    /// Workers the dispatcher must launch for `shape`.
    pub fn num_workers(self, shape: &EncoderShape) -> usize {
        match self {
            Self::ThreadPerToken => shape.num_tokens(),
            Self::ThreadPerElement => shape.num_elements(),
            Self::Vectorized => shape.num_elements() / PACK_WIDTH,
        }
    }

    /// Output elements each worker writes.
    pub fn outputs_per_worker(self, shape: &EncoderShape) -> usize {
        match self {
            Self::ThreadPerToken => shape.channels,
            Self::ThreadPerElement => 1,
            Self::Vectorized => PACK_WIDTH,
        }
    }

    /// Reject shapes this variant cannot address.
    ///
    /// # Errors
    ///
    /// [`KernelVariant::Vectorized`] requires `C % 4 == 0`.
    pub fn check_shape(self, shape: &EncoderShape) -> Result<()> {
        if self == Self::Vectorized && shape.channels % PACK_WIDTH != 0 {
            return Err(EncoderError::invalid(format!(
                "{} requires C divisible by {PACK_WIDTH}, got C={}",
                self.name(),
                shape.channels
            )));
        }
        Ok(())
    }
}

impl fmt::Display for KernelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.selector(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_round_trip() {
        for v in KernelVariant::ALL {
            assert_eq!(KernelVariant::from_selector(v.selector() as i64).unwrap(), v);
        }
    }

    #[test]
    fn test_unknown_selectors_rejected() {
        for s in [-1, 0, 4, 99, i64::MAX] {
            let err = KernelVariant::from_selector(s).unwrap_err();
            assert!(matches!(err, EncoderError::InvalidVariant { selector } if selector == s));
        }
    }

    #[test]
    fn test_default_is_thread_per_element() {
        assert_eq!(KernelVariant::default(), KernelVariant::ThreadPerElement);
        assert_eq!(KernelVariant::default().selector(), 2);
    }

    #[test]
    fn test_worker_counts() {
        let s = EncoderShape::new(2, 3, 8, 5).unwrap();
        assert_eq!(KernelVariant::ThreadPerToken.num_workers(&s), 6);
        assert_eq!(KernelVariant::ThreadPerElement.num_workers(&s), 48);
        assert_eq!(KernelVariant::Vectorized.num_workers(&s), 12);
        for v in KernelVariant::ALL {
            assert_eq!(v.num_workers(&s) * v.outputs_per_worker(&s), s.num_elements());
        }
    }

    #[test]
    fn test_vectorized_requires_multiple_of_four() {
        let s = EncoderShape::new(2, 2, 6, 3).unwrap();
        assert!(KernelVariant::Vectorized.check_shape(&s).is_err());
        assert!(KernelVariant::ThreadPerElement.check_shape(&s).is_ok());
        assert!(KernelVariant::ThreadPerToken.check_shape(&s).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(KernelVariant::ThreadPerToken.to_string(), "1 (thread-per-token)");
    }
}
