/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Spanning-tree sums by subset dynamic programming.
//!
//! The tree sum is the sum, over every labelled spanning tree of the n points,
//! of the product of its bond values. There are nⁿ⁻² such trees; the
//! recursion here visits each subset once and each of its root-preserving
//! splits once.
//!
//! # Recursion
//!
//! For a subset `S` with lowest point `l` (the root) and highest point `h`:
//!
//! ```text
//! bond_sum[S] = bond_sum[S \ {h}] + f(l, h)       (Σ f(l, k) for k ∈ S\{l})
//! leaf[S]     = bond_sum[S] · any_role[S \ {l}]   (root has exactly one bond)
//! any_role[S] = leaf[S] + Σ_P leaf[P] · any_role[(S \ P) ∪ {l}]
//! ```
//!
//! `P` ranges over subsets containing `l` and `h`, excluding `S` itself: the
//! branch of the root that holds `h` is rooted-leaf in `P`, the rest of the
//! tree hangs off `l` with any structure. Single points have `any_role = 1`.
//!
//! The `P` lists depend only on n, so they are enumerated once at
//! construction and stored flat with per-subset offsets.
//!
//! # Invariants
//! - Every table entry read during a pass was written earlier in that pass
//! - With every bond equal to 1 the sum is nⁿ⁻²
//! - Zero unsafe code

use alloc::vec;
use alloc::vec::Vec;

use crate::bonds::{BondDomain, BondMatrix};
use crate::error::SumError;
use crate::subset::PointSet;

/// Smallest supported point count.
pub const MIN_TREE_POINTS: usize = 2;

/// Largest supported point count. The split lists grow as roughly 3ⁿ/4.
pub const MAX_TREE_POINTS: usize = 16;

/// Tree evaluation mode.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeConfig {
    /// Bond interpretation. Default: [`BondDomain::Weighted`].
    pub domain: BondDomain,
}

impl TreeConfig {
    /// Trees over the indicator of non-zero bonds.
    pub fn binary() -> Self {
        Self { domain: BondDomain::Binary }
    }
}

// ─── Splits ─────────────────────────────────────────────────────────────────

/// Root-preserving splits of every subset, in compressed-row form.
///
/// `sets[offsets[s]..offsets[s + 1]]` lists the `P` for subset `s`.
#[derive(Clone, Debug)]
struct Splits {
    offsets: Vec<u32>,
    sets: Vec<u32>,
}

impl Splits {
    fn enumerate(n: usize) -> Self {
        let size = 1usize << n;
        let mut offsets = Vec::with_capacity(size + 1);
        let mut sets = Vec::new();
        offsets.push(0);
        for index in 0..size {
            let s = PointSet::from_index(index);
            if let (true, Some(l), Some(h)) = (s.len() >= 3, s.lowest(), s.highest()) {
                let ends = PointSet::pair(l, h);
                sets.extend(s.difference(ends).proper_subsets().map(|t| t.union(ends).bits()));
            }
            offsets.push(sets.len() as u32);
        }
        Self { offsets, sets }
    }

    #[inline]
    fn of(&self, index: usize) -> &[u32] {
        &self.sets[self.offsets[index] as usize..self.offsets[index + 1] as usize]
    }

    fn total(&self) -> usize {
        self.sets.len()
    }
}

// ─── Tree tables ────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct TreeTables {
    n: usize,
    splits: Splits,
    bond_sum: Vec<f64>,
    leaf: Vec<f64>,
    any_role: Vec<f64>,
}

impl TreeTables {
    fn new(n: usize) -> Self {
        let size = 1usize << n;
        let mut any_role = vec![0.0; size];
        for i in 0..n {
            any_role[PointSet::singleton(i).index()] = 1.0;
        }
        Self {
            n,
            splits: Splits::enumerate(n),
            bond_sum: vec![0.0; size],
            leaf: vec![0.0; size],
            any_role,
        }
    }

    fn run(&mut self, f: &BondMatrix) -> f64 {
        for index in 1..(1usize << self.n) {
            let s = PointSet::from_index(index);
            let (Some(l), Some(h)) = (s.lowest(), s.highest()) else {
                continue;
            };
            if l == h {
                continue;
            }
            let f_lh = f.get(l, h);
            if s.len() == 2 {
                self.bond_sum[index] = f_lh;
                self.leaf[index] = f_lh;
                self.any_role[index] = f_lh;
                continue;
            }

            let without_h = s.without(h).index();
            let without_l = s.without(l).index();
            debug_assert!(without_h < index && without_l < index);
            let bond_sum = self.bond_sum[without_h] + f_lh;
            let leaf = bond_sum * self.any_role[without_l];

            let mut any_role = leaf;
            for &p in self.splits.of(index) {
                let p = PointSet::from_index(p as usize);
                let rest = s.difference(p).with(l);
                debug_assert!(p.index() < index && rest.index() < index, "tree table read before write");
                any_role += self.leaf[p.index()] * self.any_role[rest.index()];
            }

            self.bond_sum[index] = bond_sum;
            self.leaf[index] = leaf;
            self.any_role[index] = any_role;
        }
        self.any_role[PointSet::universe(self.n).index()]
    }
}

// ─── TreeEngine ─────────────────────────────────────────────────────────────

/// Subset-DP engine for the spanning-tree sum over a fixed number of points.
#[derive(Clone, Debug)]
pub struct TreeEngine {
    config: TreeConfig,
    tables: TreeTables,
    /// Binary-domain indicators and counting-mode ones.
    scratch: BondMatrix,
}

impl TreeEngine {
    /// Build an engine for `n` points, enumerating its split lists.
    pub fn new(n: usize, config: TreeConfig) -> Result<Self, SumError> {
        if !(MIN_TREE_POINTS..=MAX_TREE_POINTS).contains(&n) {
            return Err(SumError::PointCount { n, min: MIN_TREE_POINTS, max: MAX_TREE_POINTS });
        }
        let engine = Self::build(n, config);
        tracing::debug!(n, splits = engine.tables.splits.total(), "tree engine ready");
        Ok(engine)
    }

    fn build(n: usize, config: TreeConfig) -> Self {
        Self { config, tables: TreeTables::new(n), scratch: BondMatrix::new(n) }
    }

    /// Number of points.
    pub fn point_count(&self) -> usize {
        self.tables.n
    }

    /// The configuration this engine was built with.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Tree sum for `bonds`, honouring the bond domain.
    pub fn evaluate(&mut self, bonds: &BondMatrix) -> Result<f64, SumError> {
        if bonds.point_count() != self.point_count() {
            return Err(SumError::MatrixShape {
                expected: self.point_count(),
                found: bonds.point_count(),
            });
        }
        let value = match self.config.domain {
            BondDomain::Weighted => self.tables.run(bonds),
            BondDomain::Binary => {
                self.scratch.indicator_of(bonds);
                libm::round(self.tables.run(&self.scratch))
            }
        };
        Ok(value)
    }

    /// Number of labelled spanning trees, nⁿ⁻².
    pub fn count_topologies(&mut self) -> u64 {
        self.scratch.fill(1.0);
        libm::round(self.tables.run(&self.scratch)) as u64
    }

    /// An engine with the same parameters and its own tables.
    pub fn fresh_copy(&self) -> Self {
        Self::build(self.point_count(), self.config.clone())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn bonds(n: usize) -> BondMatrix {
        BondMatrix::from_fn(n, |i, j| ((i * 7 + j * 13) % 11) as f64 / 5.0 - 1.0)
    }

    fn find(root: &[usize], mut x: usize) -> usize {
        while root[x] != x {
            x = root[x];
        }
        x
    }

    /// Sum over every (n-1)-edge subset that connects all points.
    fn brute_force(f: &BondMatrix) -> f64 {
        let n = f.point_count();
        let edges: Vec<(usize, usize)> =
            (0..n).flat_map(|i| (i + 1..n).map(move |j| (i, j))).collect();
        let mut total = 0.0;
        for mask in 0u32..(1 << edges.len()) {
            if mask.count_ones() as usize != n - 1 {
                continue;
            }
            let mut root: Vec<usize> = (0..n).collect();
            let mut acyclic = true;
            let mut product = 1.0;
            for (e, &(i, j)) in edges.iter().enumerate() {
                if mask & (1 << e) == 0 {
                    continue;
                }
                let (ri, rj) = (find(&root, i), find(&root, j));
                if ri == rj {
                    acyclic = false;
                    break;
                }
                root[ri] = rj;
                product *= f.get(i, j);
            }
            if acyclic {
                total += product;
            }
        }
        total
    }

    #[test]
    fn test_triangle() {
        let mut e = TreeEngine::new(3, TreeConfig::default()).unwrap();
        let mut f = BondMatrix::new(3);
        f.set(0, 1, 2.0);
        f.set(0, 2, 3.0);
        f.set(1, 2, 5.0);
        assert_eq!(e.evaluate(&f).unwrap(), 31.0);
    }

    #[test]
    fn test_two_points_is_the_bond() {
        let mut e = TreeEngine::new(2, TreeConfig::default()).unwrap();
        let mut f = BondMatrix::new(2);
        f.set(0, 1, -0.75);
        assert_eq!(e.evaluate(&f).unwrap(), -0.75);
        assert_eq!(e.count_topologies(), 1);
    }

    #[test]
    fn test_cayley_counts() {
        for n in 2..=10usize {
            let mut e = TreeEngine::new(n, TreeConfig::default()).unwrap();
            let expected = (n as u64).pow(n as u32 - 2);
            assert_eq!(e.count_topologies(), expected, "n={n}");
        }
    }

    #[test]
    fn test_matches_brute_force() {
        for n in 2..=5 {
            let f = bonds(n);
            let mut e = TreeEngine::new(n, TreeConfig::default()).unwrap();
            let dp = e.evaluate(&f).unwrap();
            let bf = brute_force(&f);
            assert!((dp - bf).abs() < 1e-9, "n={n} dp={dp} bf={bf}");
        }
    }

    #[test]
    fn test_repeated_passes_agree() {
        let mut e = TreeEngine::new(6, TreeConfig::default()).unwrap();
        let first = e.evaluate(&bonds(6)).unwrap();
        e.count_topologies();
        assert_eq!(e.evaluate(&bonds(6)).unwrap(), first);
    }

    #[test]
    fn test_binary_domain() {
        let mut e = TreeEngine::new(4, TreeConfig::binary()).unwrap();
        let mut f = BondMatrix::from_fn(4, |_, _| -0.3);
        f.set(0, 1, 0.0);
        // K4 minus one edge has 8 spanning trees
        assert_eq!(e.evaluate(&f).unwrap(), 8.0);
    }

    #[test]
    fn test_point_limits() {
        assert!(matches!(
            TreeEngine::new(1, TreeConfig::default()),
            Err(SumError::PointCount { n: 1, min: 2, max: MAX_TREE_POINTS })
        ));
        assert!(TreeEngine::new(MAX_TREE_POINTS + 1, TreeConfig::default()).is_err());
    }

    #[test]
    fn test_split_lists() {
        let splits = Splits::enumerate(4);
        // {0,1,2}: only {0,2}
        assert_eq!(splits.of(0b0111), &[0b0101]);
        // {0,1,2,3}: {0,2,3}, {0,1,3}, {0,3}
        assert_eq!(splits.of(0b1111), &[0b1101, 0b1011, 0b1001]);
        assert!(splits.of(0b0011).is_empty());
    }
}
