//! Point subsets as fixed-size bitsets.
//!
//! A [`PointSet`] is a set of point indices in `0..32`, stored as a `u32`
//! where bit `i` is set when point `i` is a member. The raw integer doubles as
//! the index into every subset-keyed DP table, so increasing integer order is
//! also a valid fill order: a proper subset always has a smaller index than
//! its superset.
//!
//! # Invariants
//! - `index()` of a proper subset is strictly less than that of its superset
//! - `lowest()` / `highest()` are `None` only for the empty set
//! - Zero unsafe code

use core::fmt;

/// Largest point index a [`PointSet`] can hold, plus one.
pub const MAX_SET_POINTS: usize = 32;

/// A set of points represented as a bitset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointSet(u32);

impl PointSet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// All points `0..n`.
    pub const fn universe(n: usize) -> Self {
        if n >= MAX_SET_POINTS {
            Self(u32::MAX)
        } else {
            Self((1u32 << n) - 1)
        }
    }

    /// The one-point set `{i}`.
    pub const fn singleton(i: usize) -> Self {
        Self(1u32 << i)
    }

    /// The two-point set `{i, j}`.
    pub const fn pair(i: usize, j: usize) -> Self {
        Self((1u32 << i) | (1u32 << j))
    }

    /// Reinterpret a table index as a set.
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of this set in a subset-keyed table.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw bit pattern.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Is point `i` a member?
    #[inline]
    pub const fn contains(self, i: usize) -> bool {
        (self.0 >> i) & 1 != 0
    }

    /// `self ∪ {i}`.
    #[inline]
    pub const fn with(self, i: usize) -> Self {
        Self(self.0 | (1u32 << i))
    }

    /// `self \ {i}`.
    #[inline]
    pub const fn without(self, i: usize) -> Self {
        Self(self.0 & !(1u32 << i))
    }

    /// `self ∪ other`.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// `self \ other`.
    #[inline]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Complement of `self` within the universe `0..n`.
    #[inline]
    pub const fn complement_in(self, n: usize) -> Self {
        Self(Self::universe(n).0 & !self.0)
    }

    /// Is every member of `self` also in `other`?
    #[inline]
    pub const fn is_subset_of(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Number of members.
    #[inline]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// `true` for the empty set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Lowest-indexed member.
    #[inline]
    pub const fn lowest(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as usize)
        }
    }

    /// Highest-indexed member.
    #[inline]
    pub const fn highest(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some((31 - self.0.leading_zeros()) as usize)
        }
    }

    /// Members in ascending order.
    pub fn iter(self) -> Points {
        Points { bits: self.0 }
    }

    /// Every subset of `self` except `self` itself, the empty set included.
    ///
    /// Subsets are yielded in descending index order.
    pub fn proper_subsets(self) -> ProperSubsets {
        ProperSubsets { mask: self.0, next: Some(self.0) }
    }
}

/// Iterator over the members of a [`PointSet`].
#[derive(Clone, Debug)]
pub struct Points {
    bits: u32,
}

impl Iterator for Points {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.bits == 0 {
            return None;
        }
        let i = self.bits.trailing_zeros() as usize;
        self.bits &= self.bits - 1;
        Some(i)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.bits.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Points {}

/// Iterator over the proper subsets of a mask (standard submask walk).
#[derive(Clone, Debug)]
pub struct ProperSubsets {
    mask: u32,
    next: Option<u32>,
}

impl Iterator for ProperSubsets {
    type Item = PointSet;

    fn next(&mut self) -> Option<PointSet> {
        let current = self.next?;
        if current == 0 {
            // empty mask: no proper subsets
            self.next = None;
            return None;
        }
        let sub = (current - 1) & self.mask;
        self.next = Some(sub);
        if sub == 0 {
            self.next = None;
        }
        Some(PointSet(sub))
    }
}

impl fmt::Debug for PointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PointSet{{")?;
        for (k, i) in self.iter().enumerate() {
            if k > 0 {
                write!(f, ",")?;
            }
            write!(f, "{i}")?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<usize> for PointSet {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}
