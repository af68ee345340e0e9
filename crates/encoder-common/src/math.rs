//! Small integer helpers used for launch geometry.

/// Ceiling division: the number of groups of size `d` needed to cover `n`.
///
/// # Panics
///
/// Panics if `d == 0`.
#[inline]
pub const fn ceil_div(n: usize, d: usize) -> usize {
    n.div_ceil(d)
}
