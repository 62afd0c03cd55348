//! Lane-selective assignment into structure-of-SIMD values

use crate::{Mask, Scalar, SimdStruct, SimdToSimd, Vector};

/// Prepare a masked assignment into `destination`
///
/// Nothing is written until [`Masked::assign()`] is called. At that point,
/// every leaf of `destination` takes the lanes of the matching leaf of the
/// source where `mask` is set, and keeps its current lanes elsewhere.
///
/// # Examples
///
/// ```rust
/// use simdize::prelude::*;
///
/// let mut speeds = (f32x4::splat(1.0), [i32x4::splat(0); 2]);
/// let limits = (f32x4::splat(-1.0), [i32x4::splat(7); 2]);
/// let mask = speeds.0.simd_gt(f32x4::new([0.5, 2.0, 0.0, 3.0]));
/// masked(mask, &mut speeds).assign(&limits);
/// assert_eq!(speeds.0, f32x4::new([-1.0, 1.0, -1.0, 1.0]));
/// assert_eq!(speeds.1[1], i32x4::new([7, 0, 7, 0]));
/// ```
#[inline(always)]
pub fn masked<T: SimdStruct<S>, const S: usize>(
    mask: Mask<S>,
    destination: &mut T,
) -> Masked<'_, T, S> {
    Masked { mask, destination }
}

/// Pending masked assignment, see [`masked()`]
#[must_use = "masked assignments do nothing until assign() is called"]
pub struct Masked<'dest, T: SimdStruct<S>, const S: usize> {
    mask: Mask<S>,
    destination: &'dest mut T,
}
//
impl<T: SimdStruct<S>, const S: usize> Masked<'_, T, S> {
    /// Mask in use
    #[inline(always)]
    pub fn mask(&self) -> Mask<S> {
        self.mask
    }

    /// Perform the assignment
    ///
    /// # Panics
    ///
    /// If a variable-length sequence of `source` is shorter than its
    /// counterpart in the destination.
    #[inline]
    pub fn assign(self, source: &T) {
        T::members(self.destination, source, &mut MaskedWriter(self.mask));
    }
}

/// Applies [`Vector::assign_masked()`] to every pair of leaves
struct MaskedWriter<const S: usize>(Mask<S>);
//
impl<const S: usize> SimdToSimd<S> for MaskedWriter<S> {
    #[inline(always)]
    fn visit<B: Scalar>(&mut self, dest: &mut Vector<B, S>, src: &Vector<B, S>) {
        dest.assign_masked(&self.0, src);
    }
}
