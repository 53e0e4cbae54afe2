//! Bond-value matrices and the sources that keep them current.
//!
//! [`BondMatrix`] is the symmetric n×n table of Mayer-function values for the
//! configuration most recently refreshed. A [`BondSource`] owns or borrows one
//! and knows how to refresh it; engines only ever read it.
//!
//! Two sources are provided:
//!
//! - [`MayerBonds`] owns its matrix and its Mayer function.
//! - [`SharedBonds`] lets several cluster sums read one matrix. The owner
//!   handle refreshes it; shell handles only read it and refuse to evaluate a
//!   configuration the owner has not refreshed for. A shell cannot be copied.
//!
//! # Invariants
//! - `get(i, j) == get(j, i)` after every write
//! - The diagonal is never read by any engine
//! - A refresh overwrites every off-diagonal entry

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::configuration::{Configuration, PointPair};
use crate::error::SumError;
use crate::potential::MayerFunction;

// ─── BondDomain ─────────────────────────────────────────────────────────────

/// How engines interpret bond values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BondDomain {
    /// Use bond values as they are.
    #[default]
    Weighted,
    /// Treat every non-zero bond as `1` and round the sum to an integer.
    Binary,
}

// ─── BondMatrix ─────────────────────────────────────────────────────────────

/// Symmetric matrix of pairwise bond values.
#[derive(Clone, Debug, PartialEq)]
pub struct BondMatrix {
    n: usize,
    values: Vec<f64>,
    refreshed_for: Option<u64>,
}

impl BondMatrix {
    /// An all-zero matrix over `n` points.
    pub fn new(n: usize) -> Self {
        Self { n, values: vec![0.0; n * n], refreshed_for: None }
    }

    /// Every bond set to `1` (counting mode).
    pub fn ones(n: usize) -> Self {
        let mut m = Self::new(n);
        m.fill(1.0);
        m
    }

    /// Build from a function of `(i, j)`, evaluated once per pair with `i < j`.
    pub fn from_fn(n: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut m = Self::new(n);
        for i in 0..n {
            for j in i + 1..n {
                m.set(i, j, f(i, j));
            }
        }
        m
    }

    /// Build from full rows, reading only the upper triangle.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, SumError> {
        let n = rows.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != n) {
            return Err(SumError::MatrixShape { expected: n, found: bad.len() });
        }
        Ok(Self::from_fn(n, |i, j| rows[i][j]))
    }

    /// Number of points.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.n
    }

    /// Bond value between `i` and `j` (`i != j`).
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    /// Set the bond between `i` and `j`, both orientations.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.n + j] = value;
        self.values[j * self.n + i] = value;
    }

    /// Set every off-diagonal bond to `value`.
    pub fn fill(&mut self, value: f64) {
        for i in 0..self.n {
            for j in i + 1..self.n {
                self.set(i, j, value);
            }
        }
    }

    /// Identifier of the configuration this matrix was last refreshed for.
    pub fn refreshed_for(&self) -> Option<u64> {
        self.refreshed_for
    }

    /// Recompute every bond from `config` through `mayer` at inverse temperature `beta`.
    pub fn refresh<M>(&mut self, config: &dyn Configuration, mayer: &M, beta: f64)
    where
        M: MayerFunction + ?Sized,
    {
        for i in 0..self.n {
            for j in i + 1..self.n {
                let v = mayer.f(PointPair { i, j }, config.r2(i, j), beta);
                self.set(i, j, v);
            }
        }
        self.refreshed_for = Some(config.id());
    }

    /// Overwrite `self` with the 0/1 indicator of `other`'s non-zero bonds.
    ///
    /// NaN bonds stay NaN so that a degenerate configuration is still reported.
    pub fn indicator_of(&mut self, other: &BondMatrix) {
        debug_assert_eq!(self.n, other.n);
        for (dst, &src) in self.values.iter_mut().zip(&other.values) {
            *dst = if src.is_nan() {
                f64::NAN
            } else if src != 0.0 {
                1.0
            } else {
                0.0
            };
        }
        self.refreshed_for = other.refreshed_for;
    }

    /// `true` if no off-diagonal bond is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        (0..self.n).all(|i| (i + 1..self.n).all(|j| self.get(i, j).is_finite()))
    }

    /// `true` if every off-diagonal pair agrees with its mirror.
    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| {
            (i + 1..self.n).all(|j| self.get(i, j).to_bits() == self.get(j, i).to_bits())
        })
    }
}

// ─── BondSource ─────────────────────────────────────────────────────────────

/// A provider of an up-to-date bond matrix.
pub trait BondSource {
    /// Number of points the matrix covers.
    fn point_count(&self) -> usize;

    /// Bring the matrix up to date with `config` at inverse temperature `beta`.
    fn refresh(&mut self, config: &dyn Configuration, beta: f64) -> Result<(), SumError>;

    /// Identifier the matrix currently reflects.
    fn refreshed_for(&self) -> Option<u64>;

    /// Run `f` against the current matrix.
    fn with_bonds<R>(&self, f: impl FnOnce(&BondMatrix) -> R) -> R;

    /// An independent source with the same parameters and a blank matrix.
    fn try_copy(&self) -> Result<Self, SumError>
    where
        Self: Sized;
}

// ─── MayerBonds ─────────────────────────────────────────────────────────────

/// A bond matrix refreshed from its own Mayer function.
#[derive(Clone, Debug)]
pub struct MayerBonds<M> {
    matrix: BondMatrix,
    mayer: M,
}

impl<M: MayerFunction + Clone> MayerBonds<M> {
    /// Bonds over `n` points using `mayer`.
    ///
    /// Fails if `mayer` is labelled for a different number of points.
    pub fn new(n: usize, mayer: M) -> Result<Self, SumError> {
        match mayer.point_count() {
            Some(labelled) if labelled != n => {
                Err(SumError::MatrixShape { expected: n, found: labelled })
            }
            _ => Ok(Self { matrix: BondMatrix::new(n), mayer }),
        }
    }

    /// The Mayer function.
    pub fn mayer(&self) -> &M {
        &self.mayer
    }
}

impl<M: MayerFunction + Clone> BondSource for MayerBonds<M> {
    fn point_count(&self) -> usize {
        self.matrix.point_count()
    }

    fn refresh(&mut self, config: &dyn Configuration, beta: f64) -> Result<(), SumError> {
        if config.point_count() != self.matrix.point_count() {
            return Err(SumError::MatrixShape {
                expected: self.matrix.point_count(),
                found: config.point_count(),
            });
        }
        self.matrix.refresh(config, &self.mayer, beta);
        Ok(())
    }

    fn refreshed_for(&self) -> Option<u64> {
        self.matrix.refreshed_for()
    }

    fn with_bonds<R>(&self, f: impl FnOnce(&BondMatrix) -> R) -> R {
        f(&self.matrix)
    }

    fn try_copy(&self) -> Result<Self, SumError> {
        Self::new(self.matrix.point_count(), self.mayer.clone())
    }
}

// ─── SharedBonds ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    Owner,
    Shell,
}

/// A bond source shared between one owner and any number of shells.
///
/// The owner refreshes the delegate; shells read whatever the owner last
/// computed and fail with [`SumError::StaleSharedBonds`] if that was for a
/// different configuration. Evaluate the owner first for each configuration.
#[derive(Debug)]
pub struct SharedBonds<B> {
    inner: Rc<RefCell<B>>,
    role: Role,
}

impl<B: BondSource> SharedBonds<B> {
    /// Wrap `source` as the owning handle.
    pub fn owner(source: B) -> Self {
        Self { inner: Rc::new(RefCell::new(source)), role: Role::Owner }
    }

    /// A read-only handle onto the same delegate.
    pub fn shell(&self) -> Self {
        Self { inner: Rc::clone(&self.inner), role: Role::Shell }
    }

    /// `true` for shell handles.
    pub fn is_shell(&self) -> bool {
        self.role == Role::Shell
    }
}

impl<B: BondSource> BondSource for SharedBonds<B> {
    fn point_count(&self) -> usize {
        self.inner.borrow().point_count()
    }

    fn refresh(&mut self, config: &dyn Configuration, beta: f64) -> Result<(), SumError> {
        match self.role {
            Role::Owner => self.inner.borrow_mut().refresh(config, beta),
            Role::Shell => {
                let found = self.inner.borrow().refreshed_for();
                if found == Some(config.id()) {
                    Ok(())
                } else {
                    Err(SumError::StaleSharedBonds { expected: config.id(), found })
                }
            }
        }
    }

    fn refreshed_for(&self) -> Option<u64> {
        self.inner.borrow().refreshed_for()
    }

    fn with_bonds<R>(&self, f: impl FnOnce(&BondMatrix) -> R) -> R {
        self.inner.borrow().with_bonds(f)
    }

    fn try_copy(&self) -> Result<Self, SumError> {
        match self.role {
            Role::Owner => Ok(Self::owner(self.inner.borrow().try_copy()?)),
            Role::Shell => Err(SumError::SharedShellCopy),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::PointCloud;
    use crate::potential::{HardSphere, HardSpherePositive, MixtureMayer};

    fn cloud() -> PointCloud<4> {
        PointCloud::new(&[
            [0.0, 0.0, 0.0],
            [0.5, 0.0, 0.0],
            [0.0, 2.0, 0.0],
            [0.0, 0.0, 0.9],
        ])
        .unwrap()
    }

    #[test]
    fn test_refresh_is_symmetric_and_tagged() {
        let c = cloud();
        let mut m = BondMatrix::new(4);
        m.refresh(&c, &HardSphere::new(1.0), 1.0);
        assert!(m.is_symmetric());
        assert_eq!(m.refreshed_for(), Some(0));
        assert_eq!(m.get(0, 1), -1.0);
        assert_eq!(m.get(2, 0), 0.0);
        assert_eq!(m.get(3, 0), -1.0);
    }

    #[test]
    fn test_from_rows_reads_upper_triangle() {
        let rows = vec![vec![0.0, 2.0, 3.0], vec![9.0, 0.0, 5.0], vec![9.0, 9.0, 0.0]];
        let m = BondMatrix::from_rows(&rows).unwrap();
        assert_eq!(m.get(1, 0), 2.0);
        assert_eq!(m.get(2, 1), 5.0);
        assert!(m.is_symmetric());
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let rows = vec![vec![0.0, 1.0], vec![1.0]];
        assert_eq!(
            BondMatrix::from_rows(&rows),
            Err(SumError::MatrixShape { expected: 2, found: 1 })
        );
    }

    #[test]
    fn test_is_finite() {
        let mut m = BondMatrix::ones(3);
        assert!(m.is_finite());
        m.set(1, 2, f64::NEG_INFINITY);
        assert!(!m.is_finite());
        m.set(1, 2, f64::NAN);
        assert!(!m.is_finite());
    }

    #[test]
    fn test_mixture_labelled_for_other_size_rejected() {
        let mixture =
            MixtureMayer::new(vec![0, 0, 1], [(0, 0, HardSphere::new(1.0)), (0, 1, HardSphere::new(1.0))])
                .unwrap();
        assert_eq!(
            MayerBonds::new(4, mixture.clone()).err(),
            Some(SumError::MatrixShape { expected: 4, found: 3 })
        );
        assert!(MayerBonds::new(3, mixture).is_ok());
    }

    #[test]
    fn test_indicator_keeps_nan() {
        let mut src = BondMatrix::from_fn(3, |i, j| (i + j) as f64 - 1.0);
        src.set(1, 2, f64::NAN);
        let mut dst = BondMatrix::new(3);
        dst.indicator_of(&src);
        assert_eq!(dst.get(0, 1), 0.0);
        assert_eq!(dst.get(0, 2), 1.0);
        assert!(dst.get(1, 2).is_nan());
    }

    #[test]
    fn test_mayer_bonds_rejects_wrong_size() {
        let mut b = MayerBonds::new(3, HardSphere::new(1.0)).unwrap();
        assert_eq!(
            b.refresh(&cloud(), 1.0),
            Err(SumError::MatrixShape { expected: 3, found: 4 })
        );
    }

    #[test]
    fn test_shell_reads_owner_matrix() {
        let c = cloud();
        let mut owner = SharedBonds::owner(MayerBonds::new(4, HardSpherePositive::new(1.0)).unwrap());
        let mut shell = owner.shell();
        assert!(shell.is_shell());
        owner.refresh(&c, 1.0).unwrap();
        shell.refresh(&c, 1.0).unwrap();
        assert_eq!(shell.with_bonds(|m| m.get(0, 1)), 1.0);
    }

    #[test]
    fn test_stale_shell_errors() {
        let c = cloud();
        let mut shell = SharedBonds::owner(MayerBonds::new(4, HardSphere::new(1.0)).unwrap()).shell();
        assert_eq!(
            shell.refresh(&c, 1.0),
            Err(SumError::StaleSharedBonds { expected: 0, found: None })
        );
    }

    #[test]
    fn test_shell_copy_refused_owner_copy_is_independent() {
        let c = cloud();
        let mut owner = SharedBonds::owner(MayerBonds::new(4, HardSphere::new(1.0)).unwrap());
        owner.refresh(&c, 1.0).unwrap();
        assert_eq!(owner.shell().try_copy().err(), Some(SumError::SharedShellCopy));
        let copy = owner.try_copy().unwrap();
        assert!(!copy.is_shell());
        assert_eq!(copy.refreshed_for(), None, "deep copy starts blank");
        assert_eq!(owner.refreshed_for(), Some(0));
    }
}
