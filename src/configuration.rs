//! The configuration source an engine evaluates against.
//!
//! Engines never own or mutate a configuration. They read its identifier to
//! decide whether a cached value is still valid, and the squared separation of
//! each pair when refreshing bond values.
//!
//! [`PointCloud`] is a small reference implementation of the Monte Carlo side:
//! every accepted change gets a fresh identifier, and rejecting a trial move
//! restores both the old positions and the old identifier, which is exactly the
//! pattern the value cache's one-step rollback is built for.

use heapless::Vec as HVec;

use crate::error::SumError;

/// An unordered pair of point indices, stored with `i < j`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointPair {
    /// Lower index.
    pub i: usize,
    /// Higher index.
    pub j: usize,
}

impl PointPair {
    /// Build a pair, ordering the indices.
    pub fn new(a: usize, b: usize) -> Self {
        if a < b {
            Self { i: a, j: b }
        } else {
            Self { i: b, j: a }
        }
    }
}

/// A geometric state of the simulated points.
///
/// Equal identifiers must imply equal separations.
pub trait Configuration {
    /// Opaque, monotonically assigned identifier of the current state.
    fn id(&self) -> u64;

    /// Number of points.
    fn point_count(&self) -> usize;

    /// Squared separation between points `i` and `j`.
    fn r2(&self, i: usize, j: usize) -> f64;
}

/// A pending trial move, kept so it can be undone.
#[derive(Clone, Copy, Debug)]
struct Trial {
    point: usize,
    old_position: [f64; 3],
    old_id: u64,
}

/// Up to `CAP` points in three dimensions with Monte Carlo trial bookkeeping.
#[derive(Clone, Debug)]
pub struct PointCloud<const CAP: usize> {
    positions: HVec<[f64; 3], CAP>,
    id: u64,
    next_id: u64,
    trial: Option<Trial>,
}

impl<const CAP: usize> PointCloud<CAP> {
    /// Build a cloud from initial positions. The first state has identifier 0.
    pub fn new(positions: &[[f64; 3]]) -> Result<Self, SumError> {
        let positions = HVec::from_slice(positions).map_err(|()| SumError::PointCount {
            n: positions.len(),
            min: 1,
            max: CAP,
        })?;
        Ok(Self { positions, id: 0, next_id: 1, trial: None })
    }

    /// Current position of point `i`.
    pub fn position(&self, i: usize) -> [f64; 3] {
        self.positions[i]
    }

    /// Move point `i` to `position` unconditionally. Any pending trial is accepted.
    pub fn set_position(&mut self, i: usize, position: [f64; 3]) -> u64 {
        self.trial = None;
        self.positions[i] = position;
        self.advance()
    }

    /// Displace point `i` by `delta` as a trial move and return the new identifier.
    ///
    /// A trial that was still pending is accepted first.
    pub fn trial_move(&mut self, i: usize, delta: [f64; 3]) -> u64 {
        let old_position = self.positions[i];
        let old_id = self.id;
        self.positions[i] = [
            old_position[0] + delta[0],
            old_position[1] + delta[1],
            old_position[2] + delta[2],
        ];
        self.trial = Some(Trial { point: i, old_position, old_id });
        self.advance()
    }

    /// Keep the pending trial move.
    pub fn accept(&mut self) {
        self.trial = None;
    }

    /// Undo the pending trial move, restoring the previous identifier.
    ///
    /// Returns `false` if there was nothing to undo.
    pub fn reject(&mut self) -> bool {
        match self.trial.take() {
            Some(trial) => {
                self.positions[trial.point] = trial.old_position;
                self.id = trial.old_id;
                true
            }
            None => false,
        }
    }

    fn advance(&mut self) -> u64 {
        self.id = self.next_id;
        self.next_id += 1;
        self.id
    }
}

impl<const CAP: usize> Configuration for PointCloud<CAP> {
    fn id(&self) -> u64 {
        self.id
    }

    fn point_count(&self) -> usize {
        self.positions.len()
    }

    fn r2(&self, i: usize, j: usize) -> f64 {
        let a = self.positions[i];
        let b = self.positions[j];
        let dx = a[0] - b[0];
        let dy = a[1] - b[1];
        let dz = a[2] - b[2];
        dx * dx + dy * dy + dz * dz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> PointCloud<4> {
        PointCloud::new(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [3.0, 0.0, 0.0]]).unwrap()
    }

    #[test]
    fn test_pair_is_ordered() {
        assert_eq!(PointPair::new(3, 1), PointPair { i: 1, j: 3 });
    }

    #[test]
    fn test_r2() {
        let c = line();
        assert_eq!(c.r2(0, 1), 1.0);
        assert_eq!(c.r2(0, 2), 9.0);
        assert_eq!(c.r2(2, 1), 4.0);
        assert_eq!(c.point_count(), 3);
    }

    #[test]
    fn test_over_capacity_rejected() {
        let r = PointCloud::<2>::new(&[[0.0; 3]; 3]);
        assert!(matches!(r, Err(SumError::PointCount { n: 3, max: 2, .. })));
    }

    #[test]
    fn test_reject_restores_position_and_id() {
        let mut c = line();
        assert_eq!(c.id(), 0);
        let trial_id = c.trial_move(1, [0.5, 0.0, 0.0]);
        assert_eq!(trial_id, 1);
        assert_eq!(c.r2(0, 1), 2.25);
        assert!(c.reject());
        assert_eq!(c.id(), 0);
        assert_eq!(c.r2(0, 1), 1.0);
        assert!(!c.reject(), "nothing left to undo");
    }

    #[test]
    fn test_ids_never_reused_after_reject() {
        let mut c = line();
        c.trial_move(1, [0.1, 0.0, 0.0]);
        c.reject();
        let next = c.trial_move(2, [0.1, 0.0, 0.0]);
        assert_eq!(next, 2);
        c.accept();
        assert_eq!(c.id(), 2);
        assert!(!c.reject());
    }

    #[test]
    fn test_set_position_accepts_pending_trial() {
        let mut c = line();
        c.trial_move(0, [1.0, 0.0, 0.0]);
        let id = c.set_position(2, [0.0, 2.0, 0.0]);
        assert_eq!(id, 2);
        assert!(!c.reject());
        assert_eq!(c.position(0), [1.0, 0.0, 0.0]);
    }
}
