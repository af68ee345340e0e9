//! One-dimensional launch geometry.

use encoder_common::{EncoderError, Result, ceil_div, check_block_size};

/// Threads per warp; threads of a block execute in lockstep groups of this size.
pub const WARP_SIZE: u32 = 32;

/// Grid/block dimensions for a 1-D kernel launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Number of blocks.
    pub grid_dim: u32,
    /// Threads per block.
    pub block_dim: u32,
}

impl LaunchConfig {
    /// Cover `n` workers with blocks of `block_size` threads.
    ///
    /// `grid_dim = ceil(n / block_size)`; the last block may contain idle
    /// threads, which the kernels skip with a bounds guard.
    ///
    /// # Errors
    ///
    /// Returns [`EncoderError::InvalidArguments`] if `block_size` is outside
    /// `1..=1024` or the grid does not fit in `u32`.
    pub fn linear(n: usize, block_size: usize) -> Result<Self> {
        check_block_size(block_size)?;
        let grid = ceil_div(n, block_size);
        let grid_dim = u32::try_from(grid).map_err(|_| {
            EncoderError::invalid(format!("grid of {grid} blocks exceeds u32 for n={n}"))
        })?;
        Ok(Self { grid_dim, block_dim: block_size as u32 })
    }

    /// Threads launched, including idle ones in the tail block.
    #[inline]
    pub fn total_threads(&self) -> usize {
        self.grid_dim as usize * self.block_dim as usize
    }

    /// Warps per block, rounding a partial warp up.
    #[inline]
    pub fn warps_per_block(&self) -> u32 {
        self.block_dim.div_ceil(WARP_SIZE)
    }

    /// `(grid, 1, 1)` in the driver's 3-D form.
    pub fn grid_xyz(&self) -> (u32, u32, u32) {
        (self.grid_dim, 1, 1)
    }

    /// `(block, 1, 1)` in the driver's 3-D form.
    pub fn block_xyz(&self) -> (u32, u32, u32) {
        (self.block_dim, 1, 1)
    }
}
