//! Per-lane boolean selector

use core::ops::{BitAnd, BitOr, Index, Not};

/// Set of `S` booleans, one per vector lane
///
/// Used to select which lanes of a [`Vector`](crate::Vector) or of a whole
/// structure-of-SIMD value get written by a masked assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Mask<const S: usize>([bool; S]);
//
impl<const S: usize> Mask<S> {
    /// Build a mask from per-lane truth values
    #[inline(always)]
    pub const fn new(lanes: [bool; S]) -> Self {
        Self(lanes)
    }

    /// Build a mask where all lanes have the same value
    #[inline(always)]
    pub const fn splat(value: bool) -> Self {
        Self([value; S])
    }

    /// Build a mask from a lane index -> truth mapping
    #[inline(always)]
    pub fn from_fn(lane_to_bool: impl FnMut(usize) -> bool) -> Self {
        Self(core::array::from_fn(lane_to_bool))
    }

    /// Truth that lane `lane` is selected
    ///
    /// # Panics
    ///
    /// If `lane >= S`.
    #[inline(always)]
    pub fn test(&self, lane: usize) -> bool {
        self.0[lane]
    }

    /// Truth that at least one lane is selected
    #[inline(always)]
    pub fn any(&self) -> bool {
        self.0.iter().any(|&b| b)
    }

    /// Truth that every lane is selected
    #[inline(always)]
    pub fn all(&self) -> bool {
        self.0.iter().all(|&b| b)
    }

    /// Per-lane truth values
    #[inline(always)]
    pub const fn to_array(self) -> [bool; S] {
        self.0
    }
}
//
impl<const S: usize> Default for Mask<S> {
    #[inline(always)]
    fn default() -> Self {
        Self::splat(false)
    }
}
//
impl<const S: usize> From<[bool; S]> for Mask<S> {
    #[inline(always)]
    fn from(lanes: [bool; S]) -> Self {
        Self(lanes)
    }
}
//
impl<const S: usize> Index<usize> for Mask<S> {
    type Output = bool;

    #[inline(always)]
    fn index(&self, lane: usize) -> &bool {
        &self.0[lane]
    }
}
//
impl<const S: usize> BitAnd for Mask<S> {
    type Output = Self;

    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        Self::from_fn(|lane| self.0[lane] & rhs.0[lane])
    }
}
//
impl<const S: usize> BitOr for Mask<S> {
    type Output = Self;

    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        Self::from_fn(|lane| self.0[lane] | rhs.0[lane])
    }
}
//
impl<const S: usize> Not for Mask<S> {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self {
        Self::from_fn(|lane| !self.0[lane])
    }
}
