//! Pairwise bond-value sources (Mayer functions).
//!
//! A Mayer function maps a pair of points, their squared separation and the
//! inverse temperature to `f = exp(-βu) - 1`. Bond matrices call it once per
//! pair per configuration refresh.
//!
//! Hard-sphere reference systems use the *positive* overlap function
//! ([`HardSpherePositive`], `+1` inside the core) so that chain and tree sums
//! count overlapping structures directly.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::configuration::PointPair;
use crate::error::SumError;

/// A two-body Mayer function.
pub trait MayerFunction {
    /// Bond value for `pair` at squared separation `r2` and inverse temperature `beta`.
    fn f(&self, pair: PointPair, r2: f64, beta: f64) -> f64;

    /// Number of points this function is labelled for, if it is point-specific.
    ///
    /// Bond sources over any other number of points are refused.
    fn point_count(&self) -> Option<usize> {
        None
    }
}

impl<M: MayerFunction + ?Sized> MayerFunction for &M {
    fn f(&self, pair: PointPair, r2: f64, beta: f64) -> f64 {
        (**self).f(pair, r2, beta)
    }

    fn point_count(&self) -> Option<usize> {
        (**self).point_count()
    }
}

/// Hard spheres: `-1` when the cores overlap, `0` otherwise.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardSphere {
    /// Squared core diameter.
    pub sigma2: f64,
}

impl HardSphere {
    /// Hard spheres of diameter `sigma`.
    pub fn new(sigma: f64) -> Self {
        Self { sigma2: sigma * sigma }
    }
}

impl MayerFunction for HardSphere {
    fn f(&self, _pair: PointPair, r2: f64, _beta: f64) -> f64 {
        if r2 < self.sigma2 {
            -1.0
        } else {
            0.0
        }
    }
}

/// Positive hard-sphere overlap: `+1` when the cores overlap, `0` otherwise.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardSpherePositive {
    /// Squared core diameter.
    pub sigma2: f64,
}

impl HardSpherePositive {
    /// Overlap indicator for spheres of diameter `sigma`.
    pub fn new(sigma: f64) -> Self {
        Self { sigma2: sigma * sigma }
    }
}

impl MayerFunction for HardSpherePositive {
    fn f(&self, _pair: PointPair, r2: f64, _beta: f64) -> f64 {
        if r2 < self.sigma2 {
            1.0
        } else {
            0.0
        }
    }
}

/// Square well: hard core of diameter `sigma`, attractive well of depth
/// `epsilon` out to `lambda * sigma`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SquareWell {
    /// Squared core diameter.
    pub sigma2: f64,
    /// Squared outer well radius.
    pub well2: f64,
    /// Well depth (positive for attraction).
    pub epsilon: f64,
}

impl SquareWell {
    /// Square well with core `sigma`, range factor `lambda` and depth `epsilon`.
    pub fn new(sigma: f64, lambda: f64, epsilon: f64) -> Self {
        let well = lambda * sigma;
        Self { sigma2: sigma * sigma, well2: well * well, epsilon }
    }
}

impl MayerFunction for SquareWell {
    fn f(&self, _pair: PointPair, r2: f64, beta: f64) -> f64 {
        if r2 < self.sigma2 {
            -1.0
        } else if r2 < self.well2 {
            libm::expm1(beta * self.epsilon)
        } else {
            0.0
        }
    }
}

/// Lennard-Jones 12-6 Mayer function.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LennardJones {
    /// Squared size parameter.
    pub sigma2: f64,
    /// Well depth.
    pub epsilon: f64,
}

impl LennardJones {
    /// Lennard-Jones with size `sigma` and depth `epsilon`.
    pub fn new(sigma: f64, epsilon: f64) -> Self {
        Self { sigma2: sigma * sigma, epsilon }
    }

    /// Pair energy at squared separation `r2`.
    pub fn energy(&self, r2: f64) -> f64 {
        if r2 <= 0.0 {
            return f64::INFINITY;
        }
        let s6 = {
            let s2 = self.sigma2 / r2;
            s2 * s2 * s2
        };
        let u = 4.0 * self.epsilon * s6 * (s6 - 1.0);
        // s6 * (s6 - 1) overflows to NaN only if s6 is already infinite
        if u.is_nan() {
            f64::INFINITY
        } else {
            u
        }
    }
}

impl MayerFunction for LennardJones {
    fn f(&self, _pair: PointPair, r2: f64, beta: f64) -> f64 {
        let u = self.energy(r2);
        if u == f64::INFINITY {
            return -1.0;
        }
        libm::expm1(-beta * u)
    }
}

/// One Mayer function per unordered species pair.
///
/// Every point carries a species label; the bond between two points uses the
/// function registered for their species pair. Construction fails if any pair
/// of species present in the point list has no function.
#[derive(Clone, Debug)]
pub struct MixtureMayer<M> {
    species: Vec<u8>,
    table: HashMap<(u8, u8), M>,
}

impl<M: MayerFunction> MixtureMayer<M> {
    /// Build a mixture from per-point species labels and `(a, b, f)` entries.
    ///
    /// Entries are symmetric: `(a, b)` also serves `(b, a)`.
    pub fn new(
        species: Vec<u8>,
        entries: impl IntoIterator<Item = (u8, u8, M)>,
    ) -> Result<Self, SumError> {
        let mut table = HashMap::new();
        for (a, b, m) in entries {
            table.insert(species_key(a, b), m);
        }
        let mixture = Self { species, table };
        mixture.check_complete()?;
        Ok(mixture)
    }

    /// Species label of point `i`.
    pub fn species(&self, i: usize) -> u8 {
        self.species[i]
    }

    fn check_complete(&self) -> Result<(), SumError> {
        for (k, &a) in self.species.iter().enumerate() {
            for &b in &self.species[k + 1..] {
                if !self.table.contains_key(&species_key(a, b)) {
                    let (a, b) = species_key(a, b);
                    return Err(SumError::UnknownSpeciesPair { a, b });
                }
            }
        }
        Ok(())
    }
}

impl<M: MayerFunction> MayerFunction for MixtureMayer<M> {
    fn f(&self, pair: PointPair, r2: f64, beta: f64) -> f64 {
        let (Some(&a), Some(&b)) = (self.species.get(pair.i), self.species.get(pair.j)) else {
            return f64::NAN;
        };
        // Complete by construction; a miss here surfaces as a non-finite sum.
        self.table.get(&species_key(a, b)).map_or(f64::NAN, |m| m.f(pair, r2, beta))
    }

    fn point_count(&self) -> Option<usize> {
        Some(self.species.len())
    }
}

fn species_key(a: u8, b: u8) -> (u8, u8) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
