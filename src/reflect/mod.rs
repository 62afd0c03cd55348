//! Structure-of-SIMD reflection
//!
//! This module defines how a scalar data type is mapped to its vectorized
//! mirror, and how two values of matching shape are walked side by side down
//! to their numeric leaves.
//!
//! The recursion is driven entirely by trait dispatch:
//!
//! - [`Scalar`] types are leaves and are mirrored by a [`Vector`].
//! - Tuples, arrays and `Vec`s are mirrored member by member.
//! - Any other type can take part by implementing [`Simdize`] for itself and
//!   [`SimdStruct`] for its mirror, either by hand or with the
//!   [`simdize_struct!`](crate::simdize_struct) macro.
//!
//! Since Rust has no generic closures, the operation applied to each pair of
//! leaves is a visitor: a type implementing [`ScalarToSimd`], [`SimdToScalar`]
//! or [`SimdToSimd`] depending on which sides of the pair are vectorized.
//!
//! # Examples
//!
//! ```rust
//! use simdize::{ScalarToSimd, Scalar, Simdize, Vector};
//!
//! /// Broadcast every leaf of a scalar value to all lanes of its mirror
//! struct Splat;
//! //
//! impl<const S: usize> ScalarToSimd<S> for Splat {
//!     fn visit<B: Scalar>(&mut self, dest: &mut Vector<B, S>, src: &B) {
//!         *dest = Vector::splat(*src);
//!     }
//! }
//!
//! let scalar = (1u8, vec![2.0f32, 3.0]);
//! let mut simd = Simdize::<4>::simdized_value(&scalar);
//! <(u8, Vec<f32>) as Simdize<4>>::simd_members(&mut simd, &scalar, &mut Splat);
//! assert_eq!(simd.1[1], Vector::splat(3.0));
//! ```

mod impls;
mod macros;

use crate::{Scalar, Vector};

/// Operation applied to pairs of (vectorized, scalar) leaves
pub trait ScalarToSimd<const S: usize> {
    /// Process one pair of leaves
    fn visit<B: Scalar>(&mut self, dest: &mut Vector<B, S>, src: &B);
}

/// Operation applied to pairs of (scalar, vectorized) leaves
pub trait SimdToScalar<const S: usize> {
    /// Process one pair of leaves
    fn visit<B: Scalar>(&mut self, dest: &mut B, src: &Vector<B, S>);
}

/// Operation applied to pairs of (vectorized, vectorized) leaves
pub trait SimdToSimd<const S: usize> {
    /// Process one pair of leaves
    fn visit<B: Scalar>(&mut self, dest: &mut Vector<B, S>, src: &Vector<B, S>);
}

/// Vectorized mirror of some scalar data type
///
/// A `SimdStruct` knows how to walk itself alongside another value of the
/// same type, which is what masked assignment and other vector-to-vector
/// operations build upon.
pub trait SimdStruct<const S: usize>: Sized {
    /// Call `func` on every pair of corresponding leaves of `dest` and `src`
    ///
    /// Leaves are visited exactly once, members in declaration order and
    /// sequence elements in ascending index order. For variable-length
    /// sequences, the length of `dest` drives the iteration and `src` must
    /// be at least as long.
    fn members<F: SimdToSimd<S>>(dest: &mut Self, src: &Self, func: &mut F);
}

/// Scalar data type with a structure-of-SIMD mirror
///
/// The mirror of `Self` has the same shape (same tuple arity, same struct
/// fields, same sequence lengths), but each [`Scalar`] leaf is replaced by a
/// [`Vector`] of `S` lanes.
///
/// # Safety
///
/// [`load()`](crate::load()) and [`store()`](crate::store()) turn the
/// addresses of the leaves that [`simd_members()`](Self::simd_members) and
/// [`scalar_members()`](Self::scalar_members) hand out into memory offsets.
/// Implementations must therefore uphold the following:
///
/// - Every scalar-side leaf passed to a visitor is a sub-object of the
///   `src`/`dest` value that was passed in, never a copy or a value living
///   elsewhere.
/// - [`INLINE_LAYOUT`](Self::INLINE_LAYOUT) is only `true` if every such leaf
///   lies within the `size_of::<Self>()` bytes of the value itself, i.e. no
///   leaf is reached through a pointer (`Box`, `Vec`, references...).
pub unsafe trait Simdize<const S: usize>: Sized {
    /// Vectorized mirror of `Self`
    type Simdized: SimdStruct<S>;

    /// Truth that every leaf is stored inside of the object itself
    ///
    /// Location-based loads and stores address lane `i` by offsetting the
    /// address of the lane 0 leaves, which is only correct when no leaf lives
    /// behind a pointer. Types that hold their leaves on the heap, like `Vec`,
    /// must leave this to `false`.
    const INLINE_LAYOUT: bool = false;

    /// Build a default-initialized mirror with the same shape as `self`
    fn simdized_value(&self) -> Self::Simdized;

    /// Call `func` on every pair of corresponding leaves of `dest` and `src`
    ///
    /// Visit order and multiplicity follow [`SimdStruct::members()`].
    fn simd_members<F: ScalarToSimd<S>>(dest: &mut Self::Simdized, src: &Self, func: &mut F);

    /// Call `func` on every pair of corresponding leaves of `dest` and `src`
    ///
    /// Visit order and multiplicity follow [`SimdStruct::members()`].
    fn scalar_members<F: SimdToScalar<S>>(dest: &mut Self, src: &Self::Simdized, func: &mut F);
}

// === Recursion bottoms out at scalar leaves ===

unsafe impl<B: Scalar, const S: usize> Simdize<S> for B {
    type Simdized = Vector<B, S>;

    const INLINE_LAYOUT: bool = true;

    #[inline(always)]
    fn simdized_value(&self) -> Vector<B, S> {
        Vector::default()
    }

    #[inline(always)]
    fn simd_members<F: ScalarToSimd<S>>(dest: &mut Vector<B, S>, src: &B, func: &mut F) {
        func.visit(dest, src)
    }

    #[inline(always)]
    fn scalar_members<F: SimdToScalar<S>>(dest: &mut B, src: &Vector<B, S>, func: &mut F) {
        func.visit(dest, src)
    }
}

impl<B: Scalar, const S: usize> SimdStruct<S> for Vector<B, S> {
    #[inline(always)]
    fn members<F: SimdToSimd<S>>(dest: &mut Self, src: &Self, func: &mut F) {
        func.visit(dest, src)
    }
}
