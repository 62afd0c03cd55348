//! Structure-of-SIMD support for user-defined structs

/// Declare the structure-of-SIMD mirror of a struct
///
/// Given the list of fields of an existing scalar struct, this macro declares
/// a mirror struct that is generic over the number of lanes `S`, where each
/// field has the mirror type of the corresponding scalar field. It then
/// implements [`Simdize`](crate::Simdize) for the scalar struct and
/// [`SimdStruct`](crate::SimdStruct) for the mirror, so that both can be used
/// with every load, store and masked assignment operation of this crate.
///
/// Every field of the scalar struct should be listed, in declaration order,
/// with the same type. Fields that are left out are not transferred by loads
/// and stores.
///
/// # Examples
///
/// ```rust
/// use simdize::prelude::*;
///
/// #[derive(Clone, Copy, Debug, Default)]
/// struct Particle {
///     position: [f32; 3],
///     charge: i8,
/// }
///
/// simdize_struct! {
///     #[derive(Clone, Debug, PartialEq)]
///     struct ParticleSimd for Particle {
///         position: [f32; 3],
///         charge: i8,
///     }
/// }
///
/// let particles = [Particle { position: [1.0, 2.0, 3.0], charge: -1 }; 4];
/// let index = LinearIndex::new(0);
/// let simd: ParticleSimd<4> = load_rvalue::<Particle, 4, _>(&index, |idx| particles[idx]);
/// assert_eq!(simd.position[2], f32x4::splat(3.0));
/// assert_eq!(simd.charge, Vector::splat(-1));
/// ```
#[macro_export]
macro_rules! simdize_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $simd:ident for $scalar:ty {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $simd<const S: usize> {
            $(
                $(#[$field_meta])*
                $field_vis $field: <$field_ty as $crate::Simdize<S>>::Simdized,
            )*
        }
        //
        impl<const S: usize> $crate::SimdStruct<S> for $simd<S> {
            #[inline]
            fn members<Visit: $crate::SimdToSimd<S>>(
                dest: &mut Self,
                src: &Self,
                func: &mut Visit,
            ) {
                $(
                    <<$field_ty as $crate::Simdize<S>>::Simdized as $crate::SimdStruct<S>>::members(
                        &mut dest.$field,
                        &src.$field,
                        func,
                    );
                )*
            }
        }
        //
        unsafe impl<const S: usize> $crate::Simdize<S> for $scalar {
            type Simdized = $simd<S>;

            const INLINE_LAYOUT: bool =
                true $(&& <$field_ty as $crate::Simdize<S>>::INLINE_LAYOUT)*;

            #[inline]
            fn simdized_value(&self) -> $simd<S> {
                $simd {
                    $(
                        $field: <$field_ty as $crate::Simdize<S>>::simdized_value(&self.$field),
                    )*
                }
            }

            #[inline]
            fn simd_members<Visit: $crate::ScalarToSimd<S>>(
                dest: &mut $simd<S>,
                src: &Self,
                func: &mut Visit,
            ) {
                $(
                    <$field_ty as $crate::Simdize<S>>::simd_members(
                        &mut dest.$field,
                        &src.$field,
                        func,
                    );
                )*
            }

            #[inline]
            fn scalar_members<Visit: $crate::SimdToScalar<S>>(
                dest: &mut Self,
                src: &$simd<S>,
                func: &mut Visit,
            ) {
                $(
                    <$field_ty as $crate::Simdize<S>>::scalar_members(
                        &mut dest.$field,
                        &src.$field,
                        func,
                    );
                )*
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{reflect::tests::Recorder, Simdize, Vector};
    use std::{vec, vec::Vec};

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Cell {
        corner: (i32, i32),
        weights: [f32; 2],
    }

    crate::simdize_struct! {
        #[derive(Clone, Debug, PartialEq)]
        struct CellSimd for Cell {
            corner: (i32, i32),
            weights: [f32; 2],
        }
    }

    #[derive(Clone, Debug, Default, PartialEq)]
    struct Mesh {
        cells: Vec<Cell>,
        scale: f64,
    }

    crate::simdize_struct! {
        /// Mirror that nests another user-defined mirror
        #[derive(Clone, Debug, PartialEq)]
        struct MeshSimd for Mesh {
            cells: Vec<Cell>,
            scale: f64,
        }
    }

    #[test]
    fn user_struct() {
        let cell = Cell {
            corner: (1, 2),
            weights: [0.25, 0.75],
        };
        let mut simd: CellSimd<4> = Simdize::<4>::simdized_value(&cell);
        assert_eq!(simd.corner, (Vector::default(), Vector::default()));

        let mut recorder = Recorder::default();
        <Cell as Simdize<4>>::simd_members(&mut simd, &cell, &mut recorder);
        assert_eq!(recorder.leaves, ["1", "2", "0.25", "0.75"]);

        let mut back = Cell::default();
        <Cell as Simdize<4>>::scalar_members(&mut back, &simd, &mut Recorder::default());
        assert_eq!(back.corner, (0, 0));

        assert!(<Cell as Simdize<4>>::INLINE_LAYOUT);
    }

    #[test]
    fn nested_user_struct() {
        let mesh = Mesh {
            cells: vec![Cell::default(); 3],
            scale: 2.0,
        };
        let mut simd: MeshSimd<2> = Simdize::<2>::simdized_value(&mesh);
        assert_eq!(simd.cells.len(), 3);

        let mut recorder = Recorder::default();
        <Mesh as Simdize<2>>::simd_members(&mut simd, &mesh, &mut recorder);
        assert_eq!(recorder.leaves.len(), 3 * 4 + 1);
        assert_eq!(recorder.leaves.last().map(|s| s.as_str()), Some("2.0"));

        assert!(!<Mesh as Simdize<2>>::INLINE_LAYOUT);
    }
}
