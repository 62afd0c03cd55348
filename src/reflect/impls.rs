//! Structure-of-SIMD support for tuples, arrays and `Vec`

use super::{ScalarToSimd, SimdStruct, SimdToScalar, SimdToSimd, Simdize};
use alloc::vec::Vec;

// === Tuples are mirrored member by member ===

macro_rules! impl_for_tuple {
    (
        $($t:ident $idx:tt),*
    ) => {
        unsafe impl<$($t: Simdize<S>,)* const S: usize> Simdize<S> for ($($t,)*) {
            type Simdized = ($($t::Simdized,)*);

            const INLINE_LAYOUT: bool = true $(&& $t::INLINE_LAYOUT)*;

            #[inline]
            fn simdized_value(&self) -> Self::Simdized {
                ($($t::simdized_value(&self.$idx),)*)
            }

            #[inline]
            fn simd_members<Visit: ScalarToSimd<S>>(
                dest: &mut Self::Simdized,
                src: &Self,
                func: &mut Visit,
            ) {
                $( $t::simd_members(&mut dest.$idx, &src.$idx, func); )*
            }

            #[inline]
            fn scalar_members<Visit: SimdToScalar<S>>(
                dest: &mut Self,
                src: &Self::Simdized,
                func: &mut Visit,
            ) {
                $( $t::scalar_members(&mut dest.$idx, &src.$idx, func); )*
            }
        }
        //
        impl<$($t: SimdStruct<S>,)* const S: usize> SimdStruct<S> for ($($t,)*) {
            #[inline]
            fn members<Visit: SimdToSimd<S>>(dest: &mut Self, src: &Self, func: &mut Visit) {
                $( $t::members(&mut dest.$idx, &src.$idx, func); )*
            }
        }
    };
}
impl_for_tuple!(A 0);
impl_for_tuple!(A 0, B 1);
impl_for_tuple!(A 0, B 1, C 2);
impl_for_tuple!(A 0, B 1, C 2, D 3);
impl_for_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_for_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_for_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_for_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

// === Fixed-size arrays keep their length and their inline storage ===

unsafe impl<T: Simdize<S>, const LEN: usize, const S: usize> Simdize<S> for [T; LEN] {
    type Simdized = [T::Simdized; LEN];

    const INLINE_LAYOUT: bool = T::INLINE_LAYOUT;

    #[inline]
    fn simdized_value(&self) -> Self::Simdized {
        core::array::from_fn(|idx| self[idx].simdized_value())
    }

    #[inline]
    fn simd_members<F: ScalarToSimd<S>>(dest: &mut Self::Simdized, src: &Self, func: &mut F) {
        for (dest, src) in dest.iter_mut().zip(src) {
            T::simd_members(dest, src, func);
        }
    }

    #[inline]
    fn scalar_members<F: SimdToScalar<S>>(dest: &mut Self, src: &Self::Simdized, func: &mut F) {
        for (dest, src) in dest.iter_mut().zip(src) {
            T::scalar_members(dest, src, func);
        }
    }
}
//
impl<T: SimdStruct<S>, const LEN: usize, const S: usize> SimdStruct<S> for [T; LEN] {
    #[inline]
    fn members<F: SimdToSimd<S>>(dest: &mut Self, src: &Self, func: &mut F) {
        for (dest, src) in dest.iter_mut().zip(src) {
            T::members(dest, src, func);
        }
    }
}

// === Vecs carry their length at runtime ===
//
// The destination length drives the iteration. Indexing the source keeps a
// shorter source from going unnoticed: it panics instead of truncating.

unsafe impl<T: Simdize<S>, const S: usize> Simdize<S> for Vec<T> {
    type Simdized = Vec<T::Simdized>;

    #[inline]
    fn simdized_value(&self) -> Self::Simdized {
        self.iter().map(T::simdized_value).collect()
    }

    #[inline]
    fn simd_members<F: ScalarToSimd<S>>(dest: &mut Self::Simdized, src: &Self, func: &mut F) {
        debug_assert_eq!(dest.len(), src.len(), "sequence lengths should match");
        for (idx, dest) in dest.iter_mut().enumerate() {
            T::simd_members(dest, &src[idx], func);
        }
    }

    #[inline]
    fn scalar_members<F: SimdToScalar<S>>(dest: &mut Self, src: &Self::Simdized, func: &mut F) {
        debug_assert_eq!(dest.len(), src.len(), "sequence lengths should match");
        for (idx, dest) in dest.iter_mut().enumerate() {
            T::scalar_members(dest, &src[idx], func);
        }
    }
}
//
impl<T: SimdStruct<S>, const S: usize> SimdStruct<S> for Vec<T> {
    #[inline]
    fn members<F: SimdToSimd<S>>(dest: &mut Self, src: &Self, func: &mut F) {
        debug_assert_eq!(dest.len(), src.len(), "sequence lengths should match");
        for (idx, dest) in dest.iter_mut().enumerate() {
            T::members(dest, &src[idx], func);
        }
    }
}
