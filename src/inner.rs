//! Leaf capability of the structure-of-SIMD recursion

use core::fmt::Debug;
use num_traits::Num;

mod sealed {
    pub trait Sealed {}
}

/// Arithmetic type that can be stored inside of a [`Vector`](crate::Vector)
///
/// This is the "leaf" of every structure-of-SIMD recursion: a `Scalar` field
/// is mirrored by a vector of `S` lanes, and any other field is descended
/// into. It is implemented for all primitive integer and floating-point types,
/// and cannot be implemented outside of this crate.
pub trait Scalar:
    sealed::Sealed + Copy + Default + Debug + PartialEq + PartialOrd + Num + Sized + 'static
{
}

macro_rules! impl_scalar {
    ($($t:ty),*) => {
        $(
            impl sealed::Sealed for $t {}
            impl Scalar for $t {}
        )*
    };
}
impl_scalar!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
