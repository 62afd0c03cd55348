//! Memory locations of structure-of-SIMD loads and stores
//!
//! A location describes where the `S` scalar instances that make up the lanes
//! of a vectorized value live in memory. It does not own that memory, it only
//! borrows it for the duration of the load or store operations that use it.
//!
//! Two lane rules are supported:
//!
//! - [`LinearLocation`]: lane `i` lives at `base + i * ELEMENT_SIZE`
//! - [`IndexedLocation`]: lane `i` lives at `base + indices[i] * ELEMENT_SIZE`
//!
//! where `ELEMENT_SIZE` is the byte distance between consecutive elements,
//! supplied at each load/store call site.

use crate::{access, Scalar, SimdIndex, Simdize};
use core::{marker::PhantomData, ptr::NonNull};
use thiserror::Error;

/// Error returned by the checked location constructors
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LocationError {
    /// Locations must have at least one lane to have a lane 0 instance
    #[error("locations need at least one lane")]
    NoLanes,

    /// A run of consecutive lanes does not fit in the target slice
    #[error("lanes target elements {start}..{end}, but the slice only has {len} elements")]
    OutOfBounds {
        /// Element targeted by lane 0
        start: usize,

        /// One past the element targeted by the last lane
        end: usize,

        /// Length of the target slice
        len: usize,
    },

    /// A lane index points past the end of the target slice
    #[error("lane {lane} targets element {index}, but the slice only has {len} elements")]
    IndexOutOfBounds {
        /// Faulty lane
        lane: usize,

        /// Element targeted by that lane
        index: usize,

        /// Length of the target slice
        len: usize,
    },
}

/// Where the lanes of a structure-of-SIMD value live in memory
///
/// # Safety
///
/// Unsafe code relies on `base()` returning the address that the location
/// was built from, and on `rebase()` preserving the lane rule, i.e. lane `i`
/// of the rebased location must be at the same byte offset from its base as
/// lane `i` of the original location.
pub unsafe trait Location<const S: usize> {
    /// Scalar type whose instances make up the lanes
    type Scalar;

    /// Same lane rule, applied to a leaf of `Self::Scalar`
    type Rebased<B: Scalar>: Location<S, Scalar = B>;

    /// Address of the lane 0 instance
    fn base(&self) -> NonNull<Self::Scalar>;

    /// Byte offset of lane `lane` from the lane 0 instance
    fn lane_offset(&self, lane: usize, element_size: usize) -> usize;

    /// Location of the leaf found `byte_offset` bytes into each instance
    ///
    /// # Safety
    ///
    /// `byte_offset` must be the offset of a `B` within `Self::Scalar`.
    unsafe fn rebase<B: Scalar>(&self, byte_offset: usize) -> Self::Rebased<B>;

    /// Load a structure-of-SIMD value from this location
    ///
    /// Shorthand for [`load()`](crate::load()), see its documentation for
    /// more details.
    ///
    /// # Safety
    ///
    /// Same as [`load()`](crate::load()), with `self` as the location.
    #[inline(always)]
    unsafe fn load<const ELEMENT_SIZE: usize>(&self) -> <Self::Scalar as Simdize<S>>::Simdized
    where
        Self: Sized,
        Self::Scalar: Simdize<S>,
    {
        unsafe { access::load::<ELEMENT_SIZE, S, Self>(self) }
    }

    /// Store a structure-of-SIMD value to this location
    ///
    /// Shorthand for [`store()`](crate::store()), see its documentation for
    /// more details.
    ///
    /// # Safety
    ///
    /// Same as [`store()`](crate::store()), with `self` as the location.
    #[inline(always)]
    unsafe fn store<const ELEMENT_SIZE: usize>(
        &self,
        source: &<Self::Scalar as Simdize<S>>::Simdized,
    ) where
        Self: Sized,
        Self::Scalar: Simdize<S>,
    {
        unsafe { access::store::<ELEMENT_SIZE, S, Self>(self, source) }
    }
}

/// `S` instances of `T` spaced by a fixed number of bytes
#[derive(Debug)]
pub struct LinearLocation<'target, T, const S: usize> {
    base: NonNull<T>,
    _target: PhantomData<&'target mut [T]>,
}
//
impl<'target, T, const S: usize> LinearLocation<'target, T, S> {
    /// Target the `S` instances that start at `base`
    ///
    /// Building a location is always safe, but using it to load or store
    /// requires `base` to be valid as described by [`load()`](crate::load())
    /// and [`store()`](crate::store()).
    #[inline(always)]
    pub const fn new(base: NonNull<T>) -> Self {
        Self {
            base,
            _target: PhantomData,
        }
    }

    /// Target `slice[start..start + S]` for loads
    ///
    /// # Errors
    ///
    /// [`LocationError::NoLanes`] if `S` is zero, [`LocationError::OutOfBounds`]
    /// if `start + S > slice.len()`.
    pub fn from_slice(slice: &'target [T], start: usize) -> Result<Self, LocationError> {
        check_linear::<S>(slice.len(), start)?;
        let base = unsafe { NonNull::new_unchecked(slice.as_ptr().add(start).cast_mut()) };
        Ok(Self::new(base))
    }

    /// Target `slice[start..start + S]` for loads and stores
    ///
    /// # Errors
    ///
    /// [`LocationError::NoLanes`] if `S` is zero, [`LocationError::OutOfBounds`]
    /// if `start + S > slice.len()`.
    pub fn from_mut_slice(slice: &'target mut [T], start: usize) -> Result<Self, LocationError> {
        check_linear::<S>(slice.len(), start)?;
        let base = unsafe { NonNull::new_unchecked(slice.as_mut_ptr().add(start)) };
        Ok(Self::new(base))
    }
}
//
impl<T, const S: usize> Clone for LinearLocation<'_, T, S> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}
//
impl<T, const S: usize> Copy for LinearLocation<'_, T, S> {}
//
unsafe impl<'target, T, const S: usize> Location<S> for LinearLocation<'target, T, S> {
    type Scalar = T;
    type Rebased<B: Scalar> = LinearLocation<'target, B, S>;

    #[inline(always)]
    fn base(&self) -> NonNull<T> {
        self.base
    }

    #[inline(always)]
    fn lane_offset(&self, lane: usize, element_size: usize) -> usize {
        lane * element_size
    }

    #[inline(always)]
    unsafe fn rebase<B: Scalar>(&self, byte_offset: usize) -> Self::Rebased<B> {
        LinearLocation::new(unsafe { self.base.cast::<u8>().add(byte_offset).cast::<B>() })
    }
}

/// `S` instances of `T` at arbitrary element positions from a common base
#[derive(Debug)]
pub struct IndexedLocation<'target, T, Idx: SimdIndex<S>, const S: usize> {
    base: NonNull<T>,
    indices: &'target Idx,
    _target: PhantomData<&'target mut [T]>,
}
//
impl<'target, T, Idx: SimdIndex<S>, const S: usize> IndexedLocation<'target, T, Idx, S> {
    /// Target the instances at element positions `indices` from `base`
    ///
    /// Building a location is always safe, but using it to load or store
    /// requires every targeted instance to be valid as described by
    /// [`load()`](crate::load()) and [`store()`](crate::store()).
    #[inline(always)]
    pub const fn new(base: NonNull<T>, indices: &'target Idx) -> Self {
        Self {
            base,
            indices,
            _target: PhantomData,
        }
    }

    /// Target `slice[indices[0]]`, `slice[indices[1]]`... for loads
    ///
    /// # Errors
    ///
    /// [`LocationError::NoLanes`] if `S` is zero,
    /// [`LocationError::IndexOutOfBounds`] for the first lane whose index is
    /// not smaller than `slice.len()`.
    pub fn from_slice(slice: &'target [T], indices: &'target Idx) -> Result<Self, LocationError> {
        check_indexed(slice.len(), indices)?;
        let base = unsafe { NonNull::new_unchecked(slice.as_ptr().cast_mut()) };
        Ok(Self::new(base, indices))
    }

    /// Target `slice[indices[0]]`, `slice[indices[1]]`... for loads and stores
    ///
    /// # Errors
    ///
    /// [`LocationError::NoLanes`] if `S` is zero,
    /// [`LocationError::IndexOutOfBounds`] for the first lane whose index is
    /// not smaller than `slice.len()`.
    pub fn from_mut_slice(
        slice: &'target mut [T],
        indices: &'target Idx,
    ) -> Result<Self, LocationError> {
        check_indexed(slice.len(), indices)?;
        let base = unsafe { NonNull::new_unchecked(slice.as_mut_ptr()) };
        Ok(Self::new(base, indices))
    }

    /// Per-lane element positions
    #[inline(always)]
    pub fn indices(&self) -> &'target Idx {
        self.indices
    }
}
//
impl<T, Idx: SimdIndex<S>, const S: usize> Clone for IndexedLocation<'_, T, Idx, S> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}
//
impl<T, Idx: SimdIndex<S>, const S: usize> Copy for IndexedLocation<'_, T, Idx, S> {}
//
unsafe impl<'target, T, Idx: SimdIndex<S>, const S: usize> Location<S>
    for IndexedLocation<'target, T, Idx, S>
{
    type Scalar = T;
    type Rebased<B: Scalar> = IndexedLocation<'target, B, Idx, S>;

    #[inline(always)]
    fn base(&self) -> NonNull<T> {
        self.base
    }

    #[inline(always)]
    fn lane_offset(&self, lane: usize, element_size: usize) -> usize {
        self.indices.get(lane) * element_size
    }

    #[inline(always)]
    unsafe fn rebase<B: Scalar>(&self, byte_offset: usize) -> Self::Rebased<B> {
        IndexedLocation::new(
            unsafe { self.base.cast::<u8>().add(byte_offset).cast::<B>() },
            self.indices,
        )
    }
}

/// Check that lanes `start..start + S` fit in a slice of length `len`
fn check_linear<const S: usize>(len: usize, start: usize) -> Result<(), LocationError> {
    if S == 0 {
        return Err(LocationError::NoLanes);
    }
    match start.checked_add(S) {
        Some(end) if end <= len => Ok(()),
        end => Err(LocationError::OutOfBounds {
            start,
            end: end.unwrap_or(usize::MAX),
            len,
        }),
    }
}

/// Check that every lane of `indices` fits in a slice of length `len`
fn check_indexed<const S: usize>(
    len: usize,
    indices: &impl SimdIndex<S>,
) -> Result<(), LocationError> {
    if S == 0 {
        return Err(LocationError::NoLanes);
    }
    for lane in 0..S {
        let index = indices.get(lane);
        if index >= len {
            return Err(LocationError::IndexOutOfBounds { lane, index, len });
        }
    }
    Ok(())
}
