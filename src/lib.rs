//! Structure-of-SIMD views of arbitrary nested data types
//!
//! This crate lets you take `S` instances of a scalar aggregate (a leaf number,
//! a tuple, an array, a `Vec` or your own struct) and turn them into a single
//! value of the same shape where every numeric leaf has been replaced by a
//! [`Vector`] of `S` lanes. Code can then keep using field names while the
//! arithmetic runs on all lanes at once.
//!
//! The building blocks are:
//!
//! - [`Simdize`], which maps a scalar type to its vectorized mirror and walks
//!   a mirror and a scalar value side by side.
//! - [`SimdStruct`], which walks two mirrors side by side.
//! - [`LinearLocation`] and [`IndexedLocation`], which describe where the
//!   lanes of a load or store live in memory.
//! - [`load()`], [`store()`], [`load_rvalue()`] and [`load_rvalue_with()`],
//!   which move data between memory and mirrors.
//! - [`masked()`], which performs lane-selective assignment into a mirror.
//!
//! # Examples
//!
//! ```rust
//! use simdize::prelude::*;
//!
//! let points = [(1, 0.5f32), (2, 1.5), (3, 2.5), (4, 3.5)];
//! let location = LinearLocation::<_, 4>::from_slice(&points, 0).unwrap();
//! let (ids, weights) = unsafe { location.load::<8>() };
//! assert_eq!(ids, i32x4::new([1, 2, 3, 4]));
//! assert_eq!(weights.horizontal_sum(), 8.0);
//! ```

#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

mod access;
mod index;
mod inner;
mod location;
mod mask;
mod masked;
mod reflect;
mod vector;

pub use access::{load, load_rvalue, load_rvalue_with, store};
pub use index::{LinearIndex, SimdIndex};
pub use inner::Scalar;
pub use location::{IndexedLocation, LinearLocation, Location, LocationError};
pub use mask::Mask;
pub use masked::{masked, Masked};
pub use reflect::{ScalarToSimd, SimdStruct, SimdToScalar, SimdToSimd, Simdize};
pub use vector::{types, Vector};

/// Everything you need to start working with structure-of-SIMD data
pub mod prelude {
    pub use crate::{
        load, load_rvalue, load_rvalue_with, masked, simdize_struct, store, vector::types::*,
        IndexedLocation, LinearIndex, LinearLocation, Location, Mask, Scalar, SimdIndex,
        SimdStruct, Simdize, Vector,
    };
}

// === GENERAL IMPLEMENTATION NOTES ===

// Everything in this crate sits at the bottom of hot user loops, so inlining
// follows a simple discipline:
//
// - Leaf-level operations and visitor callbacks, which run once per vector of
//   the dataset, are marked inline(always).
// - Recursive descents over composite types are marked inline, since the
//   compiler needs to see through them to flatten the recursion.
// - Checked constructors, which should run at most once per loop, get no
//   inlining directive at all.
