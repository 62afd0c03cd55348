//! Fixed-width lane container
//!
//! [`Vector`] is the lane primitive that every leaf of a structure-of-SIMD
//! value is mirrored into. It is deliberately thin: storage, per-lane access,
//! element-wise arithmetic, comparisons and the native masked assignment that
//! the rest of the crate extends to nested types.

use crate::{Mask, Scalar};
use core::ops::{
    Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Sub, SubAssign,
};

/// `S` lanes of scalar type `B` processed in parallel
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(transparent)]
pub struct Vector<B: Scalar, const S: usize>([B; S]);
//
impl<B: Scalar, const S: usize> Vector<B, S> {
    /// Number of vector lanes
    pub const LANES: usize = S;

    /// Build a vector from per-lane values
    #[inline(always)]
    pub const fn new(lanes: [B; S]) -> Self {
        Self(lanes)
    }

    /// Build a vector where all lanes have the same value
    #[inline(always)]
    pub fn splat(value: B) -> Self {
        Self([value; S])
    }

    /// Build a vector from a lane index -> value mapping
    #[inline(always)]
    pub fn from_fn(lane_to_elem: impl FnMut(usize) -> B) -> Self {
        Self(core::array::from_fn(lane_to_elem))
    }

    /// Access the lanes as an array
    #[inline(always)]
    pub const fn as_array(&self) -> &[B; S] {
        &self.0
    }

    /// Mutably access the lanes as an array
    #[inline(always)]
    pub fn as_mut_array(&mut self) -> &mut [B; S] {
        &mut self.0
    }

    /// Sum of all lanes
    #[inline(always)]
    pub fn horizontal_sum(self) -> B {
        self.0.iter().fold(B::zero(), |acc, &lane| acc + lane)
    }

    /// Pick lanes from `if_true` where `mask` is set and from `if_false`
    /// elsewhere
    #[inline(always)]
    pub fn select(mask: Mask<S>, if_true: Self, if_false: Self) -> Self {
        Self::from_fn(|lane| {
            if mask.test(lane) {
                if_true.0[lane]
            } else {
                if_false.0[lane]
            }
        })
    }

    /// Overwrite the lanes selected by `mask` with those of `source`, leaving
    /// other lanes untouched
    #[inline(always)]
    pub fn assign_masked(&mut self, mask: &Mask<S>, source: &Self) {
        for (lane, (dest, src)) in self.0.iter_mut().zip(source.0.iter()).enumerate() {
            if mask.test(lane) {
                *dest = *src;
            }
        }
    }
}

macro_rules! impl_comparisons {
    ($($name:ident => $op:tt),*) => {
        impl<B: Scalar, const S: usize> Vector<B, S> {
            $(
                #[doc = concat!("Lane-wise `", stringify!($op), "` comparison")]
                #[inline(always)]
                pub fn $name(self, rhs: Self) -> Mask<S> {
                    Mask::from_fn(|lane| self.0[lane] $op rhs.0[lane])
                }
            )*
        }
    };
}
impl_comparisons!(simd_eq => ==, simd_ne => !=, simd_lt => <, simd_le => <=, simd_gt => >, simd_ge => >=);

macro_rules! impl_binary_ops {
    ($($op:ident::$method:ident, $op_assign:ident::$method_assign:ident);*) => {
        $(
            impl<B: Scalar, const S: usize> $op for Vector<B, S> {
                type Output = Self;

                #[inline(always)]
                fn $method(self, rhs: Self) -> Self {
                    Self::from_fn(|lane| $op::$method(self.0[lane], rhs.0[lane]))
                }
            }
            //
            impl<B: Scalar, const S: usize> $op_assign for Vector<B, S> {
                #[inline(always)]
                fn $method_assign(&mut self, rhs: Self) {
                    *self = $op::$method(*self, rhs);
                }
            }
        )*
    };
}
impl_binary_ops!(
    Add::add, AddAssign::add_assign;
    Sub::sub, SubAssign::sub_assign;
    Mul::mul, MulAssign::mul_assign;
    Div::div, DivAssign::div_assign
);

impl<B: Scalar, const S: usize> Default for Vector<B, S> {
    #[inline(always)]
    fn default() -> Self {
        Self([B::default(); S])
    }
}
//
impl<B: Scalar, const S: usize> From<[B; S]> for Vector<B, S> {
    #[inline(always)]
    fn from(lanes: [B; S]) -> Self {
        Self(lanes)
    }
}
//
impl<B: Scalar, const S: usize> From<Vector<B, S>> for [B; S] {
    #[inline(always)]
    fn from(vector: Vector<B, S>) -> Self {
        vector.0
    }
}
//
impl<B: Scalar, const S: usize> AsRef<[B]> for Vector<B, S> {
    #[inline(always)]
    fn as_ref(&self) -> &[B] {
        &self.0[..]
    }
}
//
impl<B: Scalar, const S: usize> Index<usize> for Vector<B, S> {
    type Output = B;

    #[inline(always)]
    fn index(&self, lane: usize) -> &B {
        &self.0[lane]
    }
}
//
impl<B: Scalar, const S: usize> IndexMut<usize> for Vector<B, S> {
    #[inline(always)]
    fn index_mut(&mut self, lane: usize) -> &mut B {
        &mut self.0[lane]
    }
}

/// Shorthands for common vector types
pub mod types {
    use super::Vector;

    macro_rules! vector_aliases {
        ($($name:ident = $scalar:ty, $lanes:literal);* $(;)?) => {
            $(
                #[allow(non_camel_case_types)]
                #[doc = concat!("Vector of ", stringify!($lanes), " `", stringify!($scalar), "` lanes")]
                pub type $name = Vector<$scalar, $lanes>;
            )*
        };
    }
    vector_aliases!(
        i8x16 = i8, 16; i16x8 = i16, 8; i32x4 = i32, 4; i32x8 = i32, 8; i64x2 = i64, 2; i64x4 = i64, 4;
        u8x16 = u8, 16; u16x8 = u16, 8; u32x4 = u32, 4; u32x8 = u32, 8; u64x2 = u64, 2; u64x4 = u64, 4;
        f32x4 = f32, 4; f32x8 = f32, 8; f64x2 = f64, 2; f64x4 = f64, 4;
    );
}

#[cfg(test)]
mod tests {
    use super::{types::*, *};
    use proptest::prelude::*;

    #[test]
    fn arithmetic() {
        let a = i32x4::new([1, 2, 3, 4]);
        let b = i32x4::splat(2);
        assert_eq!(a + b, i32x4::new([3, 4, 5, 6]));
        assert_eq!(a - b, i32x4::new([-1, 0, 1, 2]));
        assert_eq!(a * b, i32x4::new([2, 4, 6, 8]));
        assert_eq!(a / b, i32x4::new([0, 1, 1, 2]));
        let mut c = a;
        c += b;
        c *= b;
        assert_eq!(c, i32x4::new([6, 8, 10, 12]));
        assert_eq!(a.horizontal_sum(), 10);
        assert_eq!(f32x4::default(), f32x4::splat(0.0));
    }

    #[test]
    fn lane_access() {
        assert_eq!(f64x4::LANES, 4);
        assert_eq!(u8x16::LANES, 16);
        let mut v = u32x4::from_fn(|lane| lane as u32 * 10);
        v.as_mut_array()[2] = 7;
        v[3] += 1;
        assert_eq!(v.as_array(), &[0, 10, 7, 31]);
        assert_eq!(v.as_ref(), &[0, 10, 7, 31][..]);
        assert_eq!(<[u32; 4]>::from(v), [0, 10, 7, 31]);
    }

    #[test]
    fn comparisons() {
        let a = f32x4::new([1.0, 2.0, 3.0, 4.0]);
        let b = f32x4::splat(2.5);
        assert_eq!(a.simd_lt(b).to_array(), [true, true, false, false]);
        assert_eq!(a.simd_ge(b), !a.simd_lt(b));
        assert_eq!(a.simd_eq(a), Mask::splat(true));
        assert_eq!(
            f32x4::select(a.simd_lt(b), a, b),
            f32x4::new([1.0, 2.0, 2.5, 2.5])
        );
    }

    proptest! {
        #[test]
        fn assign_masked(
            dest in any::<[u16; 8]>(),
            src in any::<[u16; 8]>(),
            mask in any::<[bool; 8]>(),
        ) {
            let mut vector = u16x8::new(dest);
            vector.assign_masked(&Mask::new(mask), &u16x8::new(src));
            for lane in 0..8 {
                let expected = if mask[lane] { src[lane] } else { dest[lane] };
                prop_assert_eq!(vector[lane], expected);
            }
        }
    }
}
