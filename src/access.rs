//! Data transfers between memory and structure-of-SIMD values
//!
//! All operations in this module are built out of the same two pieces: a
//! mirror of the scalar type built by [`Simdize::simdized_value()`], and a
//! visitor that is applied to every pair of corresponding leaves by
//! [`Simdize::simd_members()`] or [`Simdize::scalar_members()`].
//!
//! Location-based transfers ([`load()`], [`store()`]) fan the location out
//! into one location per leaf, which inherits the lane rule of its parent,
//! and move `S` lanes of that leaf at once. Accessor-based gathers
//! ([`load_rvalue()`], [`load_rvalue_with()`]) instead fetch one scalar
//! instance per lane and copy its leaves into the matching lane.

use crate::{Location, Scalar, ScalarToSimd, SimdIndex, SimdToScalar, Simdize, Vector};
use core::{
    borrow::Borrow,
    mem::{size_of, ManuallyDrop},
};

/// Load a structure-of-SIMD value from memory
///
/// Lane `i` of every leaf of the result is read from the corresponding leaf
/// of the instance of `L::Scalar` found at `location.base() +
/// location.lane_offset(i, ELEMENT_SIZE)`. For a [`LinearLocation`] this is
/// `base + i * ELEMENT_SIZE`, for an [`IndexedLocation`] this is
/// `base + indices[i] * ELEMENT_SIZE`.
///
/// Fails to compile if `S` is zero or if `L::Scalar` stores some of its leaves
/// out of line (see [`Simdize::INLINE_LAYOUT`]).
///
/// # Panics
///
/// If the [`Simdize`] impl of `L::Scalar` visits a leaf that does not lie
/// within the scalar value, before any lane is accessed through that leaf.
///
/// # Safety
///
/// - `location.base()` must point to a valid, aligned instance of `L::Scalar`.
/// - For every lane, the address computed above must point to a readable
///   instance of `L::Scalar` belonging to the same allocation as the base.
///
/// The checked constructors of [`LinearLocation`] and [`IndexedLocation`]
/// guarantee this when `ELEMENT_SIZE` is `size_of::<L::Scalar>()`.
///
/// [`LinearLocation`]: crate::LinearLocation
/// [`IndexedLocation`]: crate::IndexedLocation
#[inline]
pub unsafe fn load<const ELEMENT_SIZE: usize, const S: usize, L>(
    location: &L,
) -> <L::Scalar as Simdize<S>>::Simdized
where
    L: Location<S>,
    L::Scalar: Simdize<S>,
{
    const {
        assert!(
            <L::Scalar as Simdize<S>>::INLINE_LAYOUT,
            "cannot load types whose leaves are not stored inline"
        );
        assert!(S > 0, "cannot load zero lanes");
    };

    // Work on a bitwise copy of lane 0, so that no reference into the target
    // memory is alive while the lanes are being read
    let lane0 = ManuallyDrop::new(unsafe { location.base().as_ptr().read() });
    let mut result = <L::Scalar as Simdize<S>>::simdized_value(&lane0);
    let mut loader = LeafLoader::<L, ELEMENT_SIZE> {
        location,
        origin: address_of(&*lane0),
    };
    <L::Scalar as Simdize<S>>::simd_members(&mut result, &lane0, &mut loader);
    result
}

/// Store a structure-of-SIMD value into memory
///
/// Lane `i` of every leaf of `source` is written into the corresponding leaf
/// of the instance of `L::Scalar` found at `location.base() +
/// location.lane_offset(i, ELEMENT_SIZE)`. Lanes are written in ascending
/// order, so if several lanes of an [`IndexedLocation`] target the same
/// element, the highest lane wins.
///
/// Fails to compile if `S` is zero or if `L::Scalar` stores some of its leaves
/// out of line (see [`Simdize::INLINE_LAYOUT`]).
///
/// # Panics
///
/// If the [`Simdize`] impl of `L::Scalar` visits a leaf that does not lie
/// within the scalar value, before any lane is accessed through that leaf.
///
/// # Safety
///
/// - `location.base()` must point to a valid, aligned instance of `L::Scalar`.
/// - For every lane, the address computed above must point to a writable
///   instance of `L::Scalar` belonging to the same allocation as the base,
///   that no live reference points into.
/// - `source` must have the shape of the lane 0 instance.
///
/// The `from_mut_slice()` constructors of [`LinearLocation`] and
/// [`IndexedLocation`] guarantee the first two points when `ELEMENT_SIZE` is
/// `size_of::<L::Scalar>()`.
///
/// [`LinearLocation`]: crate::LinearLocation
/// [`IndexedLocation`]: crate::IndexedLocation
#[inline]
pub unsafe fn store<const ELEMENT_SIZE: usize, const S: usize, L>(
    location: &L,
    source: &<L::Scalar as Simdize<S>>::Simdized,
) where
    L: Location<S>,
    L::Scalar: Simdize<S>,
{
    const {
        assert!(
            <L::Scalar as Simdize<S>>::INLINE_LAYOUT,
            "cannot store types whose leaves are not stored inline"
        );
        assert!(S > 0, "cannot store zero lanes");
    };

    // Leaf addresses are computed on a copy of lane 0, writes go through the
    // location's own pointer
    let mut lane0 = ManuallyDrop::new(unsafe { location.base().as_ptr().read() });
    let mut storer = LeafStorer::<L, ELEMENT_SIZE> {
        location,
        origin: address_of(&*lane0),
    };
    <L::Scalar as Simdize<S>>::scalar_members(&mut lane0, source, &mut storer);
}

/// Gather a structure-of-SIMD value from values returned by an accessor
///
/// For each lane `i`, `access(index.get(i))` yields the scalar instance whose
/// leaves end up in lane `i` of the result. The accessor may return either
/// owned values or references, which makes this suitable for data that is
/// computed on the fly or that cannot be addressed by a [`Location`].
///
/// All yielded instances are expected to share the shape of the lane 0
/// instance, from which the shape of the result is taken.
#[inline]
pub fn load_rvalue<T, const S: usize, R>(
    index: &impl SimdIndex<S>,
    access: impl FnMut(usize) -> R,
) -> T::Simdized
where
    T: Simdize<S>,
    R: Borrow<T>,
{
    load_rvalue_with::<T, S, R, R>(index, access, core::convert::identity)
}

/// Like [`load_rvalue()`], but applies `subobject` to each value returned by
/// the accessor before gathering it
///
/// This adds a level of indirection, e.g. for selecting a field of the
/// elements of a container.
#[inline]
pub fn load_rvalue_with<T, const S: usize, R, U>(
    index: &impl SimdIndex<S>,
    mut access: impl FnMut(usize) -> R,
    mut subobject: impl FnMut(R) -> U,
) -> T::Simdized
where
    T: Simdize<S>,
    U: Borrow<T>,
{
    const { assert!(S > 0, "cannot gather into zero lanes") };

    let first = subobject(access(index.get(0)));
    let mut result = T::simdized_value(first.borrow());
    T::simd_members(&mut result, first.borrow(), &mut LaneWriter { lane: 0 });
    for lane in 1..S {
        let value = subobject(access(index.get(lane)));
        T::simd_members(&mut result, value.borrow(), &mut LaneWriter { lane });
    }
    result
}

/// Address of a value, for computing leaf offsets
#[inline(always)]
fn address_of<T>(value: &T) -> usize {
    value as *const T as usize
}

/// Byte offset of `leaf` within the `T` that starts at address `origin`
///
/// # Panics
///
/// If `leaf` does not lie entirely within that `T`, which means that the
/// [`Simdize`] impl of `T` broke its safety contract.
#[inline(always)]
fn leaf_offset<T, B>(origin: usize, leaf: &B) -> usize {
    let offset = address_of(leaf).checked_sub(origin);
    match offset {
        Some(offset) if offset + size_of::<B>() <= size_of::<T>() => offset,
        _ => panic!("Simdize impl visited a leaf outside of the scalar value"),
    }
}

/// Loads every lane of a leaf through a location rebased onto it
struct LeafLoader<'location, L, const ELEMENT_SIZE: usize> {
    location: &'location L,
    origin: usize,
}
//
impl<L: Location<S>, const ELEMENT_SIZE: usize, const S: usize> ScalarToSimd<S>
    for LeafLoader<'_, L, ELEMENT_SIZE>
{
    #[inline(always)]
    fn visit<B: Scalar>(&mut self, dest: &mut Vector<B, S>, src: &B) {
        let offset = leaf_offset::<L::Scalar, B>(self.origin, src);
        let leaf = unsafe { self.location.rebase::<B>(offset) };
        let base = leaf.base().as_ptr().cast::<u8>();
        *dest = Vector::from_fn(|lane| unsafe {
            base.add(leaf.lane_offset(lane, ELEMENT_SIZE))
                .cast::<B>()
                .read_unaligned()
        });
    }
}

/// Stores every lane of a leaf through a location rebased onto it
struct LeafStorer<'location, L, const ELEMENT_SIZE: usize> {
    location: &'location L,
    origin: usize,
}
//
impl<L: Location<S>, const ELEMENT_SIZE: usize, const S: usize> SimdToScalar<S>
    for LeafStorer<'_, L, ELEMENT_SIZE>
{
    #[inline(always)]
    fn visit<B: Scalar>(&mut self, dest: &mut B, src: &Vector<B, S>) {
        let offset = leaf_offset::<L::Scalar, B>(self.origin, dest);
        let leaf = unsafe { self.location.rebase::<B>(offset) };
        let base = leaf.base().as_ptr().cast::<u8>();
        for lane in 0..S {
            unsafe {
                base.add(leaf.lane_offset(lane, ELEMENT_SIZE))
                    .cast::<B>()
                    .write_unaligned(src[lane])
            };
        }
    }
}

/// Copies scalar leaves into one lane of the matching vector leaves
struct LaneWriter {
    lane: usize,
}
//
impl<const S: usize> ScalarToSimd<S> for LaneWriter {
    #[inline(always)]
    fn visit<B: Scalar>(&mut self, dest: &mut Vector<B, S>, src: &B) {
        dest[self.lane] = *src;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{types::*, IndexedLocation, LinearIndex, LinearLocation, SimdStruct, SimdToSimd};
    use proptest::prelude::*;
    use std::{boxed::Box, vec, vec::Vec};

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    #[repr(C)]
    struct Sample {
        id: i32,
        weight: f32,
    }

    crate::simdize_struct! {
        #[derive(Clone, Debug, PartialEq)]
        struct SampleSimd for Sample {
            id: i32,
            weight: f32,
        }
    }

    /// Complex number with a hand-written structure-of-SIMD mirror
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Complex {
        re: f64,
        im: f64,
    }

    #[derive(Clone, Debug, PartialEq)]
    struct ComplexSimd<const S: usize> {
        re: Vector<f64, S>,
        im: Vector<f64, S>,
    }

    impl<const S: usize> SimdStruct<S> for ComplexSimd<S> {
        fn members<F: SimdToSimd<S>>(dest: &mut Self, src: &Self, func: &mut F) {
            func.visit(&mut dest.re, &src.re);
            func.visit(&mut dest.im, &src.im);
        }
    }

    unsafe impl<const S: usize> Simdize<S> for Complex {
        type Simdized = ComplexSimd<S>;

        const INLINE_LAYOUT: bool = true;

        fn simdized_value(&self) -> ComplexSimd<S> {
            ComplexSimd {
                re: Vector::default(),
                im: Vector::default(),
            }
        }

        fn simd_members<F: ScalarToSimd<S>>(
            dest: &mut ComplexSimd<S>,
            src: &Self,
            func: &mut F,
        ) {
            func.visit(&mut dest.re, &src.re);
            func.visit(&mut dest.im, &src.im);
        }

        fn scalar_members<F: SimdToScalar<S>>(
            dest: &mut Self,
            src: &ComplexSimd<S>,
            func: &mut F,
        ) {
            func.visit(&mut dest.re, &src.re);
            func.visit(&mut dest.im, &src.im);
        }
    }

    /// Reaches its only leaf through a pointer while claiming an inline layout
    struct Boxed {
        value: Box<f32>,
    }

    unsafe impl<const S: usize> Simdize<S> for Boxed {
        type Simdized = Vector<f32, S>;

        const INLINE_LAYOUT: bool = true;

        fn simdized_value(&self) -> Vector<f32, S> {
            Vector::default()
        }

        fn simd_members<F: ScalarToSimd<S>>(
            dest: &mut Vector<f32, S>,
            src: &Self,
            func: &mut F,
        ) {
            func.visit(dest, &*src.value);
        }

        fn scalar_members<F: SimdToScalar<S>>(
            dest: &mut Self,
            src: &Vector<f32, S>,
            func: &mut F,
        ) {
            func.visit(&mut *dest.value, src);
        }
    }

    #[test]
    fn leaf_offsets() {
        let sample = Sample { id: 1, weight: 2.0 };
        let origin = address_of(&sample);
        assert_eq!(leaf_offset::<Sample, i32>(origin, &sample.id), 0);
        assert_eq!(leaf_offset::<Sample, f32>(origin, &sample.weight), 4);
    }

    #[test]
    #[should_panic(expected = "outside of the scalar value")]
    fn leaf_past_the_end() {
        let pair = [Sample::default(); 2];
        leaf_offset::<Sample, f32>(address_of(&pair[0]), &pair[1].weight);
    }

    #[test]
    #[should_panic(expected = "outside of the scalar value")]
    fn leaf_behind_pointer() {
        let data = [1.0f32, 2.0, 3.0, 4.0].map(|value| Boxed {
            value: Box::new(value),
        });
        let location = LinearLocation::<_, 4>::from_slice(&data, 0).unwrap();
        let _ = unsafe { load::<{ size_of::<Boxed>() }, 4, _>(&location) };
    }

    #[test]
    fn pair_scenario() {
        const ES: usize = size_of::<Sample>();
        assert_eq!(ES, 8);

        let input = [
            Sample { id: 1, weight: 0.5 },
            Sample { id: 2, weight: 1.0 },
            Sample { id: 3, weight: 1.5 },
            Sample { id: 4, weight: 2.0 },
        ];
        let location = LinearLocation::<_, 4>::from_slice(&input, 0).unwrap();
        let loaded = unsafe { load::<ES, 4, _>(&location) };
        assert_eq!(loaded.id, i32x4::new([1, 2, 3, 4]));
        assert_eq!(loaded.weight, f32x4::new([0.5, 1.0, 1.5, 2.0]));

        let source = SampleSimd::<4> {
            id: i32x4::new([10, 20, 30, 40]),
            weight: f32x4::new([1.5, 2.5, 3.5, 4.5]),
        };
        let mut output = [Sample::default(); 4];
        let location = LinearLocation::<_, 4>::from_mut_slice(&mut output, 0).unwrap();
        unsafe { store::<ES, 4, _>(&location, &source) };

        let bytes = unsafe {
            core::slice::from_raw_parts(output.as_ptr().cast::<u8>(), size_of::<[Sample; 4]>())
        };
        for (lane, (id, weight)) in [(10, 1.5f32), (20, 2.5), (30, 3.5), (40, 4.5)]
            .into_iter()
            .enumerate()
        {
            assert_eq!(output[lane], Sample { id, weight });
            assert_eq!(bytes[lane * ES..lane * ES + 4], id.to_ne_bytes());
            assert_eq!(bytes[lane * ES + 4..lane * ES + 8], weight.to_ne_bytes());
        }
    }

    #[test]
    fn sequence_scenario() {
        let instances = [vec![1i32, 2, 3], vec![4, 5, 6]];
        let simd = load_rvalue::<Vec<i32>, 2, _>(&LinearIndex::new(0), |idx| &instances[idx]);
        assert_eq!(
            simd,
            vec![
                Vector::new([1, 4]),
                Vector::new([2, 5]),
                Vector::new([3, 6])
            ]
        );
    }

    #[test]
    fn rvalue_subobject() {
        let data = [(1u8, Complex { re: 1.0, im: -1.0 }), (2, Complex { re: 2.0, im: -2.0 })];
        let simd = load_rvalue_with::<Complex, 4, _, _>(
            &[1usize, 0, 1, 1],
            |idx| &data[idx],
            |pair: &(u8, Complex)| pair.1,
        );
        assert_eq!(simd.re, f64x4::new([2.0, 1.0, 2.0, 2.0]));
        assert_eq!(simd.im, f64x4::new([-2.0, -1.0, -2.0, -2.0]));

        let computed = load_rvalue::<(u32, u32), 4, _>(&LinearIndex::new(5), |idx| {
            (idx as u32, (idx * idx) as u32)
        });
        assert_eq!(computed, (u32x4::new([5, 6, 7, 8]), u32x4::new([25, 36, 49, 64])));
    }

    #[test]
    fn leaf_and_method_forms() {
        let mut data = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let location = LinearLocation::<_, 4>::from_mut_slice(&mut data, 2).unwrap();
        let loaded = unsafe { location.load::<4>() };
        assert_eq!(loaded, f32x4::new([3.0, 4.0, 5.0, 6.0]));
        unsafe { location.store::<4>(&(loaded + loaded)) };
        assert_eq!(data, [1.0, 2.0, 6.0, 8.0, 10.0, 12.0]);
    }

    #[test]
    fn hand_written_extension() {
        let data = [
            Complex { re: 1.0, im: 2.0 },
            Complex { re: 3.0, im: 4.0 },
            Complex { re: 5.0, im: 6.0 },
        ];
        let indices = [2u8, 0];
        let location = IndexedLocation::from_slice(&data, &indices).unwrap();
        let loaded = unsafe { location.load::<{ size_of::<Complex>() }>() };
        assert_eq!(
            loaded,
            ComplexSimd {
                re: f64x2::new([5.0, 1.0]),
                im: f64x2::new([6.0, 2.0]),
            }
        );
    }

    #[test]
    fn scatter_collision() {
        let mut data = [0u16; 3];
        let indices = [1usize, 1, 2, 1];
        let location = IndexedLocation::from_mut_slice(&mut data, &indices).unwrap();
        unsafe { location.store::<2>(&Vector::new([7u16, 8, 9, 10])) };
        assert_eq!(data, [0, 10, 9]);
    }

    /// Round trip through vectors for a given scalar type
    fn round_trip<T, const ES: usize>(input: &[T], start: usize) -> Result<(), TestCaseError>
    where
        T: Simdize<4> + Clone + PartialEq + core::fmt::Debug,
    {
        prop_assert_eq!(ES, size_of::<T>());
        let location = LinearLocation::<_, 4>::from_slice(input, start).unwrap();
        let simd = unsafe { load::<ES, 4, _>(&location) };

        let mut output = input[start..start + 4].to_vec();
        let location = LinearLocation::<_, 4>::from_mut_slice(&mut output, 0).unwrap();
        unsafe { store::<ES, 4, _>(&location, &simd) };
        prop_assert_eq!(&output[..], &input[start..start + 4]);
        Ok(())
    }

    proptest! {
        #[test]
        fn round_trip_integer(
            input in prop::collection::vec(any::<u32>(), 4..12),
            start in 0..8usize,
        ) {
            prop_assume!(start + 4 <= input.len());
            round_trip::<u32, 4>(&input, start)?;
        }

        #[test]
        fn round_trip_pair(
            input in prop::collection::vec((any::<i16>(), -1e6f64..1e6), 4..12),
            start in 0..8usize,
        ) {
            prop_assume!(start + 4 <= input.len());
            round_trip::<(i16, f64), 16>(&input, start)?;
        }

        #[test]
        fn round_trip_sequence(
            input in prop::collection::vec(any::<[i32; 3]>(), 4..12),
            start in 0..8usize,
        ) {
            prop_assume!(start + 4 <= input.len());
            round_trip::<[i32; 3], 12>(&input, start)?;
        }

        /// Gathering through a permutation is a reordering, and scattering
        /// through it is the inverse reordering
        #[test]
        fn gather_scatter_permutation(
            data in prop::array::uniform8((any::<u32>(), -1e3f32..1e3)),
            perm in Just((0..8usize).collect::<Vec<_>>()).prop_shuffle(),
        ) {
            const ES: usize = size_of::<(u32, f32)>();
            let indices: [usize; 8] = perm.clone().try_into().unwrap();

            let gather = IndexedLocation::from_slice(&data, &indices).unwrap();
            let gathered = unsafe { load::<ES, 8, _>(&gather) };
            let mut reordered = [(0u32, 0.0f32); 8];
            let linear = LinearLocation::<_, 8>::from_mut_slice(&mut reordered, 0).unwrap();
            unsafe { store::<ES, 8, _>(&linear, &gathered) };
            for (lane, &index) in indices.iter().enumerate() {
                prop_assert_eq!(reordered[lane], data[index]);
            }

            let linear = LinearLocation::<_, 8>::from_slice(&data, 0).unwrap();
            let contiguous = unsafe { load::<ES, 8, _>(&linear) };
            let mut scattered = [(0u32, 0.0f32); 8];
            let scatter = IndexedLocation::from_mut_slice(&mut scattered, &indices).unwrap();
            unsafe { store::<ES, 8, _>(&scatter, &contiguous) };
            for (lane, &index) in indices.iter().enumerate() {
                prop_assert_eq!(scattered[index], data[lane]);
            }
        }
    }
}
