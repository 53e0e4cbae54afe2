/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Chain and ring sums by subset dynamic programming.
//!
//! A *chain* is a Hamiltonian open path through all n points; a *ring* is a
//! Hamiltonian cycle. Each structure contributes the product of its bond
//! values. Enumerating them costs O(n!); the recursion here costs O(n²·2ⁿ).
//!
//! # Recursion
//!
//! One point is the *anchor* `a` (lowest or highest index, see [`Anchor`]).
//! `paths[S][m]` holds the sum over simple paths that start at `a`, end at
//! `m` and visit exactly the points of `S`:
//!
//! ```text
//! paths[{a,m}][m]   = f(a,m)
//! paths[S∪{m}][m]  += f(m,k) · paths[S][k]     for k ∈ S\{a}, m ∉ S
//! ends[S]           = Σₘ paths[S][m]
//! ```
//!
//! Subsets are visited in increasing index order, so `S` is complete before
//! any superset reads it.
//!
//! - **Ring**: `½ Σₘ paths[V][m] · f(m,a)`. Every cycle closes in both
//!   directions, hence the half. Zero for n < 3.
//! - **Chain**: paths with the anchor as an end point, `ends[V]`, plus paths
//!   with the anchor inside. The latter split into two arms sharing `a`,
//!   covering `P` and `Q = (V \ P) ∪ {a}`; requiring a fixed boundary point
//!   `b` to lie in `P` counts each unordered pair of arms once:
//!   `Σ_P ends[P] · ends[Q]`.
//!
//! # Invariants
//! - Both anchor conventions produce the same sums
//! - With every bond equal to 1: chains = n!/2, rings = (n-1)!/2 (n ≥ 3)
//! - Zero unsafe code

use alloc::vec;
use alloc::vec::Vec;

use crate::bonds::{BondDomain, BondMatrix};
use crate::error::SumError;
use crate::subset::PointSet;

/// Smallest supported point count.
pub const MIN_CHAIN_POINTS: usize = 2;

/// Largest supported point count. Path tables hold n·2ⁿ values.
pub const MAX_CHAIN_POINTS: usize = 20;

// ─── Config ─────────────────────────────────────────────────────────────────

/// Which point anchors every path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Anchor {
    /// Point 0.
    First,
    /// Point n-1.
    #[default]
    Last,
}

/// Chain/ring mix and evaluation mode.
///
/// The reported value is `chain_fraction · chain + ring_fraction · ring`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainRingConfig {
    /// Weight of the chain sum. Default: 1.0.
    pub chain_fraction: f64,
    /// Weight of the ring sum. Default: 0.0.
    pub ring_fraction: f64,
    /// Anchor convention. Default: [`Anchor::Last`].
    pub anchor: Anchor,
    /// Bond interpretation. Default: [`BondDomain::Weighted`].
    pub domain: BondDomain,
}

impl Default for ChainRingConfig {
    fn default() -> Self {
        Self {
            chain_fraction: 1.0,
            ring_fraction: 0.0,
            anchor: Anchor::Last,
            domain: BondDomain::Weighted,
        }
    }
}

impl ChainRingConfig {
    /// Pure chain sum.
    pub fn chain() -> Self {
        Self::default()
    }

    /// Pure ring sum.
    pub fn ring() -> Self {
        Self { chain_fraction: 0.0, ring_fraction: 1.0, ..Self::default() }
    }

    /// Weighted mix of chains and rings.
    pub fn mix(chain_fraction: f64, ring_fraction: f64) -> Self {
        Self { chain_fraction, ring_fraction, ..Self::default() }
    }

    /// Same mix with a different anchor.
    pub fn with_anchor(self, anchor: Anchor) -> Self {
        Self { anchor, ..self }
    }

    /// Same mix with a different bond domain.
    pub fn with_domain(self, domain: BondDomain) -> Self {
        Self { domain, ..self }
    }

    fn validate(&self) -> Result<(), SumError> {
        for (name, value) in [
            ("chain_fraction", self.chain_fraction),
            ("ring_fraction", self.ring_fraction),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SumError::InvalidFraction { name, value });
            }
        }
        if self.chain_fraction == 0.0 && self.ring_fraction == 0.0 {
            return Err(SumError::EmptyMix);
        }
        Ok(())
    }
}

/// Both sums from one DP pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainRingSums {
    /// Sum over Hamiltonian paths.
    pub chain: f64,
    /// Sum over Hamiltonian cycles.
    pub ring: f64,
}

// ─── Path tables ────────────────────────────────────────────────────────────

/// Scratch tables for one point count and anchor.
#[derive(Clone, Debug)]
struct PathTables {
    n: usize,
    anchor: usize,
    boundary: usize,
    /// `paths[s * n + m]`: paths from the anchor to `m` covering `s`.
    paths: Vec<f64>,
    /// `ends[s]`: `paths[s][·]` summed over end points.
    ends: Vec<f64>,
}

impl PathTables {
    fn new(n: usize, anchor: Anchor) -> Self {
        let (anchor, boundary) = match anchor {
            Anchor::First => (0, n - 1),
            Anchor::Last => (n - 1, 0),
        };
        Self {
            n,
            anchor,
            boundary,
            paths: vec![0.0; n << n],
            ends: vec![0.0; 1 << n],
        }
    }

    #[inline]
    fn slot(&self, s: PointSet, m: usize) -> usize {
        s.index() * self.n + m
    }

    fn run(&mut self, f: &BondMatrix) -> ChainRingSums {
        let n = self.n;
        let a = self.anchor;
        let full = PointSet::universe(n);

        // 0 · ∞ must still poison the sums, so empty partial paths are only
        // skipped when every bond is finite
        let prune = f.is_finite();
        self.paths.fill(0.0);
        self.ends.fill(0.0);
        for m in (0..n).filter(|&m| m != a) {
            let slot = self.slot(PointSet::pair(a, m), m);
            self.paths[slot] = f.get(a, m);
        }

        for index in 0..(1usize << n) {
            let s = PointSet::from_index(index);
            if !s.contains(a) || s.len() < 2 {
                continue;
            }
            let outside = s.complement_in(n);
            let mut end_sum = 0.0;
            for k in s.without(a).iter() {
                let through_k = self.paths[self.slot(s, k)];
                if prune && through_k == 0.0 {
                    continue;
                }
                end_sum += through_k;
                for m in outside.iter() {
                    let grown = s.with(m);
                    debug_assert!(grown.index() > index, "path table written out of order");
                    let slot = self.slot(grown, m);
                    self.paths[slot] += f.get(m, k) * through_k;
                }
            }
            self.ends[index] = end_sum;
        }

        let ring = if n < 3 {
            0.0
        } else {
            let closed: f64 = full
                .without(a)
                .iter()
                .map(|m| self.paths[self.slot(full, m)] * f.get(m, a))
                .sum();
            0.5 * closed
        };

        let mut chain = self.ends[full.index()];
        let b = self.boundary;
        let free = full.without(a).without(b);
        let arm_base = PointSet::pair(a, b);
        for t in free.proper_subsets() {
            let p = t.union(arm_base);
            let q = free.difference(t).with(a);
            chain += self.ends[p.index()] * self.ends[q.index()];
        }

        ChainRingSums { chain, ring }
    }
}

// ─── ChainRingEngine ────────────────────────────────────────────────────────

/// Subset-DP engine for chain and ring sums over a fixed number of points.
///
/// Owns its scratch tables; a pass overwrites them in place, so one engine
/// must not be shared between threads without synchronisation.
#[derive(Clone, Debug)]
pub struct ChainRingEngine {
    config: ChainRingConfig,
    tables: PathTables,
    /// Binary-domain indicators and counting-mode ones.
    scratch: BondMatrix,
}

impl ChainRingEngine {
    /// Build an engine for `n` points.
    pub fn new(n: usize, config: ChainRingConfig) -> Result<Self, SumError> {
        if !(MIN_CHAIN_POINTS..=MAX_CHAIN_POINTS).contains(&n) {
            return Err(SumError::PointCount { n, min: MIN_CHAIN_POINTS, max: MAX_CHAIN_POINTS });
        }
        config.validate()?;
        tracing::debug!(
            n,
            anchor = ?config.anchor,
            chain_fraction = config.chain_fraction,
            ring_fraction = config.ring_fraction,
            "chain/ring engine ready"
        );
        Ok(Self::build(n, config))
    }

    fn build(n: usize, config: ChainRingConfig) -> Self {
        Self {
            tables: PathTables::new(n, config.anchor),
            scratch: BondMatrix::new(n),
            config,
        }
    }

    /// Number of points.
    pub fn point_count(&self) -> usize {
        self.tables.n
    }

    /// The configuration this engine was built with.
    pub fn config(&self) -> &ChainRingConfig {
        &self.config
    }

    /// Chain and ring sums for `bonds`, honouring the bond domain.
    pub fn sums(&mut self, bonds: &BondMatrix) -> Result<ChainRingSums, SumError> {
        self.check_shape(bonds)?;
        let sums = match self.config.domain {
            BondDomain::Weighted => self.tables.run(bonds),
            BondDomain::Binary => {
                self.scratch.indicator_of(bonds);
                let raw = self.tables.run(&self.scratch);
                ChainRingSums { chain: libm::round(raw.chain), ring: libm::round(raw.ring) }
            }
        };
        Ok(sums)
    }

    /// The configured mix of chain and ring sums for `bonds`.
    pub fn evaluate(&mut self, bonds: &BondMatrix) -> Result<f64, SumError> {
        let sums = self.sums(bonds)?;
        Ok(self.mix(sums))
    }

    /// Chain and ring counts with every bond forced to 1.
    pub fn count_sums(&mut self) -> ChainRingSums {
        self.scratch.fill(1.0);
        let raw = self.tables.run(&self.scratch);
        ChainRingSums { chain: libm::round(raw.chain), ring: libm::round(raw.ring) }
    }

    /// The configured mix in counting mode, rounded to an integer.
    pub fn count_topologies(&mut self) -> u64 {
        let sums = self.count_sums();
        libm::round(self.mix(sums)) as u64
    }

    /// An engine with the same parameters and its own tables.
    pub fn fresh_copy(&self) -> Self {
        Self::build(self.point_count(), self.config.clone())
    }

    fn mix(&self, sums: ChainRingSums) -> f64 {
        self.config.chain_fraction * sums.chain + self.config.ring_fraction * sums.ring
    }

    fn check_shape(&self, bonds: &BondMatrix) -> Result<(), SumError> {
        if bonds.point_count() == self.point_count() {
            Ok(())
        } else {
            Err(SumError::MatrixShape { expected: self.point_count(), found: bonds.point_count() })
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
