//! Cluster sums: an engine, a bond source and a value cache behind one
//! `value(configuration)` call.
//!
//! [`SumEngine`] is the DP side (chain/ring or tree), [`BondSource`] keeps the
//! bond matrix current, and [`CachedSum`] runs the evaluation protocol:
//!
//! 1. Same identifier as the current value: return it.
//! 2. Same identifier as the previous value: roll back, return it.
//! 3. Otherwise refresh the bonds, run the engine, store the result.
//! 4. A NaN or infinite result is recomputed once. If it is still not finite
//!    the call fails with [`SumError::NonFinite`] and the cache is left as it
//!    was before the call.
//!
//! [`ClusterSum`] is the object-safe face of all of this, so drivers can hold
//! a `Box<dyn ClusterSum>` per diagram class.

use alloc::boxed::Box;

use crate::bonds::{BondMatrix, BondSource, MayerBonds};
use crate::cache::{CacheState, Lookup, ValueCache};
use crate::chain::{ChainRingConfig, ChainRingEngine};
use crate::configuration::Configuration;
use crate::error::SumError;
use crate::potential::MayerFunction;
use crate::tree::{TreeConfig, TreeEngine};

// ─── Engines ────────────────────────────────────────────────────────────────

/// A DP engine over a fixed number of points.
pub trait SumEngine {
    /// Number of points.
    fn point_count(&self) -> usize;

    /// Run one pass over `bonds`.
    fn evaluate(&mut self, bonds: &BondMatrix) -> Result<f64, SumError>;

    /// Exact structure count with every bond forced to 1.
    fn count_topologies(&mut self) -> u64;

    /// Same parameters, fresh tables.
    fn fresh_copy(&self) -> Self
    where
        Self: Sized;
}

impl SumEngine for ChainRingEngine {
    fn point_count(&self) -> usize {
        ChainRingEngine::point_count(self)
    }

    fn evaluate(&mut self, bonds: &BondMatrix) -> Result<f64, SumError> {
        ChainRingEngine::evaluate(self, bonds)
    }

    fn count_topologies(&mut self) -> u64 {
        ChainRingEngine::count_topologies(self)
    }

    fn fresh_copy(&self) -> Self {
        ChainRingEngine::fresh_copy(self)
    }
}

impl SumEngine for TreeEngine {
    fn point_count(&self) -> usize {
        TreeEngine::point_count(self)
    }

    fn evaluate(&mut self, bonds: &BondMatrix) -> Result<f64, SumError> {
        TreeEngine::evaluate(self, bonds)
    }

    fn count_topologies(&mut self) -> u64 {
        TreeEngine::count_topologies(self)
    }

    fn fresh_copy(&self) -> Self {
        TreeEngine::fresh_copy(self)
    }
}

// ─── ClusterSum ─────────────────────────────────────────────────────────────

/// A temperature-dependent sum over one class of cluster diagrams.
pub trait ClusterSum {
    /// Number of points.
    fn point_count(&self) -> usize;

    /// Set the temperature; β = 1/T. `T` must be finite and positive.
    fn set_temperature(&mut self, temperature: f64) -> Result<(), SumError>;

    /// Sum for `config`, served from the cache when possible.
    fn value(&mut self, config: &dyn Configuration) -> Result<f64, SumError>;

    /// An independent sum with the same parameters and an empty cache.
    fn make_copy(&self) -> Result<Box<dyn ClusterSum>, SumError>;

    /// Exact structure count with every bond forced to 1.
    fn count_topologies(&mut self) -> u64;
}

/// An engine and bond source behind a two-slot value cache.
#[derive(Clone, Debug)]
pub struct CachedSum<E, B> {
    engine: E,
    bonds: B,
    beta: f64,
    cache: ValueCache,
}

/// Chain/ring sum with its own Mayer-function bonds.
pub type ChainSum<M> = CachedSum<ChainRingEngine, MayerBonds<M>>;

/// Tree sum with its own Mayer-function bonds.
pub type TreeSum<M> = CachedSum<TreeEngine, MayerBonds<M>>;

impl<E: SumEngine, B: BondSource> CachedSum<E, B> {
    /// Pair `engine` with `bonds` at β = 1.
    pub fn new(engine: E, bonds: B) -> Result<Self, SumError> {
        if engine.point_count() != bonds.point_count() {
            return Err(SumError::MatrixShape {
                expected: engine.point_count(),
                found: bonds.point_count(),
            });
        }
        Ok(Self { engine, bonds, beta: 1.0, cache: ValueCache::new() })
    }

    /// Current inverse temperature.
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Turn value caching on or off.
    pub fn set_caching(&mut self, enabled: bool) {
        self.cache.set_enabled(enabled);
    }

    /// Is value caching on?
    pub fn caching(&self) -> bool {
        self.cache.is_enabled()
    }

    /// Identifier of the most recent value.
    pub fn current_id(&self) -> Option<u64> {
        self.cache.current().map(|v| v.id)
    }

    /// Identifier of the value before it.
    pub fn previous_id(&self) -> Option<u64> {
        self.cache.previous().map(|v| v.id)
    }

    /// The value before the most recent one.
    pub fn previous_value(&self) -> Option<f64> {
        self.cache.previous().map(|v| v.value)
    }

    /// Full cache state.
    pub fn cache_state(&self) -> CacheState {
        self.cache.state()
    }

    /// The engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The bond source.
    pub fn bonds(&self) -> &B {
        &self.bonds
    }

    fn compute(&mut self, config: &dyn Configuration) -> Result<f64, SumError> {
        self.bonds.refresh(config, self.beta)?;
        let engine = &mut self.engine;
        self.bonds.with_bonds(|m| engine.evaluate(m))
    }
}

impl<M: MayerFunction + Clone> ChainSum<M> {
    /// Chain/ring sum over `n` points bonded by `mayer`.
    pub fn chain_ring(n: usize, mayer: M, config: ChainRingConfig) -> Result<Self, SumError> {
        Self::new(ChainRingEngine::new(n, config)?, MayerBonds::new(n, mayer)?)
    }
}

impl<M: MayerFunction + Clone> TreeSum<M> {
    /// Tree sum over `n` points bonded by `mayer`.
    pub fn tree(n: usize, mayer: M, config: TreeConfig) -> Result<Self, SumError> {
        Self::new(TreeEngine::new(n, config)?, MayerBonds::new(n, mayer)?)
    }
}

impl<E, B> ClusterSum for CachedSum<E, B>
where
    E: SumEngine + 'static,
    B: BondSource + 'static,
{
    fn point_count(&self) -> usize {
        self.engine.point_count()
    }

    fn set_temperature(&mut self, temperature: f64) -> Result<(), SumError> {
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(SumError::InvalidTemperature { value: temperature });
        }
        let beta = 1.0 / temperature;
        if beta != self.beta {
            tracing::debug!(temperature, "temperature changed, cache cleared");
            self.beta = beta;
            self.cache.clear();
        }
        Ok(())
    }

    fn value(&mut self, config: &dyn Configuration) -> Result<f64, SumError> {
        let id = config.id();
        match self.cache.lookup(id) {
            Lookup::Hit(value) => {
                tracing::trace!(id, "cache hit");
                return Ok(value);
            }
            Lookup::Rollback(value) => {
                tracing::trace!(id, "rolled back to previous configuration");
                return Ok(value);
            }
            Lookup::Miss => {}
        }

        let mut value = self.compute(config)?;
        if !value.is_finite() {
            tracing::warn!(id, value, "non-finite cluster value, recomputing");
            value = self.compute(config)?;
            if !value.is_finite() {
                tracing::error!(id, value, "cluster value is still non-finite");
                return Err(SumError::NonFinite { id, value });
            }
        }
        tracing::debug!(id, value, "computed cluster value");
        self.cache.store(id, value);
        Ok(value)
    }

    fn make_copy(&self) -> Result<Box<dyn ClusterSum>, SumError> {
        let mut cache = ValueCache::new();
        cache.set_enabled(self.cache.is_enabled());
        Ok(Box::new(Self {
            engine: self.engine.fresh_copy(),
            bonds: self.bonds.try_copy()?,
            beta: self.beta,
            cache,
        }))
    }

    fn count_topologies(&mut self) -> u64 {
        self.engine.count_topologies()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::PointCloud;
    use crate::potential::{HardSpherePositive, SquareWell};

    fn triangle() -> PointCloud<8> {
        PointCloud::new(&[[0.0, 0.0, 0.0], [0.8, 0.0, 0.0], [0.0, 0.9, 0.0]]).unwrap()
    }

    #[test]
    fn test_chain_and_tree_on_overlapping_triangle() {
        let c = triangle();
        // 0-1, 0-2 overlap; 1-2 at distance ~1.2 does not
        let mut chain = ChainSum::chain_ring(3, HardSpherePositive::new(1.0), ChainRingConfig::chain())
            .unwrap();
        let mut tree = TreeSum::tree(3, HardSpherePositive::new(1.0), TreeConfig::default()).unwrap();
        assert_eq!(chain.value(&c).unwrap(), 1.0);
        assert_eq!(tree.value(&c).unwrap(), 1.0);
        assert_eq!(chain.count_topologies(), 3);
        assert_eq!(tree.count_topologies(), 3);
    }

    #[test]
    fn test_engine_bond_size_mismatch() {
        let r = CachedSum::new(
            TreeEngine::new(3, TreeConfig::default()).unwrap(),
            MayerBonds::new(4, HardSpherePositive::new(1.0)).unwrap(),
        );
        assert!(matches!(r, Err(SumError::MatrixShape { expected: 3, found: 4 })));
    }

    #[test]
    fn test_introspection_tracks_ids() {
        let mut c = triangle();
        let mut sum =
            TreeSum::tree(3, HardSpherePositive::new(1.0), TreeConfig::default()).unwrap();
        assert_eq!(sum.current_id(), None);
        sum.value(&c).unwrap();
        c.trial_move(2, [0.0, -0.5, 0.0]);
        let moved = sum.value(&c).unwrap();
        assert_eq!(sum.current_id(), Some(1));
        assert_eq!(sum.previous_id(), Some(0));
        assert_eq!(sum.previous_value(), Some(1.0));
        // all three overlap now
        assert_eq!(moved, 3.0);
    }

    #[test]
    fn test_temperature_change_clears_cache() {
        let c = triangle();
        let mut sum = TreeSum::tree(3, SquareWell::new(0.5, 2.0, 1.0), TreeConfig::default())
            .unwrap();
        let unit = sum.value(&c).unwrap();
        sum.set_temperature(0.5).unwrap();
        assert_eq!(sum.beta(), 2.0);
        assert_eq!(sum.cache_state(), CacheState::Empty);
        // deeper effective well at lower temperature
        let half = sum.value(&c).unwrap();
        assert!(half > unit, "T=0.5: {half}, T=1: {unit}");
        // same temperature again keeps the cache
        sum.set_temperature(0.5).unwrap();
        assert_eq!(sum.current_id(), Some(0));
    }

    #[test]
    fn test_bad_temperature_rejected_and_state_kept() {
        let c = triangle();
        let mut sum =
            TreeSum::tree(3, HardSpherePositive::new(1.0), TreeConfig::default()).unwrap();
        sum.value(&c).unwrap();
        for t in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(sum.set_temperature(t), Err(SumError::InvalidTemperature { .. })),
                "T={t}"
            );
        }
        assert_eq!(sum.beta(), 1.0);
        assert_eq!(sum.current_id(), Some(0), "cache kept");
    }

    #[test]
    fn test_make_copy_has_empty_cache() {
        let c = triangle();
        let mut sum =
            ChainSum::chain_ring(3, HardSpherePositive::new(1.0), ChainRingConfig::mix(1.0, 1.0))
                .unwrap();
        sum.set_caching(false);
        let original = sum.value(&c).unwrap();
        let mut copy = sum.make_copy().unwrap();
        assert_eq!(copy.point_count(), 3);
        assert_eq!(copy.value(&c).unwrap(), original);
    }
}
