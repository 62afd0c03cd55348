//! Per-lane element positions
//!
//! A [`SimdIndex`] tells which element of an underlying collection each lane
//! of a vectorized value corresponds to. It is used both by
//! [`IndexedLocation`](crate::IndexedLocation) to gather and scatter through
//! memory and by [`load_rvalue()`](crate::load_rvalue()) to gather through an
//! accessor.

use crate::{Scalar, Vector};
use num_traits::{AsPrimitive, PrimInt};

/// Sequence of `S` element positions, one per vector lane
///
/// # Safety
///
/// Unchecked loads and stores trust `get()` to be a pure function of `lane`,
/// i.e. to return the same position every time it is queried for a given lane
/// during one operation.
pub unsafe trait SimdIndex<const S: usize> {
    /// Number of lanes
    #[inline(always)]
    fn size(&self) -> usize {
        S
    }

    /// Element position targeted by lane `lane`
    ///
    /// Callers only query lanes in `0..S`.
    fn get(&self, lane: usize) -> usize;
}

/// Run of `S` consecutive element positions starting at `start`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LinearIndex<const S: usize> {
    /// Element position targeted by lane 0
    pub start: usize,
}
//
impl<const S: usize> LinearIndex<S> {
    /// Target elements `start..start + S`
    #[inline(always)]
    pub const fn new(start: usize) -> Self {
        Self { start }
    }

    /// One past the last element position
    #[inline(always)]
    pub const fn end(&self) -> usize {
        self.start + S
    }
}
//
unsafe impl<const S: usize> SimdIndex<S> for LinearIndex<S> {
    #[inline(always)]
    fn get(&self, lane: usize) -> usize {
        self.start + lane
    }
}

unsafe impl<I: PrimInt + AsPrimitive<usize>, const S: usize> SimdIndex<S> for [I; S] {
    #[inline(always)]
    fn get(&self, lane: usize) -> usize {
        self[lane].as_()
    }
}

unsafe impl<I: Scalar + PrimInt + AsPrimitive<usize>, const S: usize> SimdIndex<S>
    for Vector<I, S>
{
    #[inline(always)]
    fn get(&self, lane: usize) -> usize {
        self[lane].as_()
    }
}

unsafe impl<Idx: SimdIndex<S> + ?Sized, const S: usize> SimdIndex<S> for &Idx {
    #[inline(always)]
    fn get(&self, lane: usize) -> usize {
        (**self).get(lane)
    }
}
