//! Integration tests for several cluster sums reading one bond matrix.
//!
//! Run with: `cargo test`
//!
//! The owner sum refreshes the matrix; shell sums read it. Evaluating the
//! owner first for each configuration is the caller's job, and the shells
//! fail loudly when that order is broken.

use std::cell::Cell;
use std::rc::Rc;

use virial_core::{
    CachedSum, ChainRingConfig, ChainRingEngine, ClusterSum, HardSpherePositive, MayerBonds,
    MayerFunction, PointCloud, PointPair, SharedBonds, SumError, TreeConfig, TreeEngine,
};

// ─── helpers ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct Counting {
    inner: HardSpherePositive,
    calls: Rc<Cell<usize>>,
}

impl MayerFunction for Counting {
    fn f(&self, pair: PointPair, r2: f64, beta: f64) -> f64 {
        self.calls.set(self.calls.get() + 1);
        self.inner.f(pair, r2, beta)
    }
}

type Shared = SharedBonds<MayerBonds<Counting>>;

fn setup() -> (
    CachedSum<ChainRingEngine, Shared>,
    CachedSum<TreeEngine, Shared>,
    Rc<Cell<usize>>,
) {
    let calls = Rc::new(Cell::new(0));
    let mayer = Counting { inner: HardSpherePositive::new(1.0), calls: Rc::clone(&calls) };
    let owner = SharedBonds::owner(MayerBonds::new(4, mayer).unwrap());
    let shell = owner.shell();
    let chains = CachedSum::new(
        ChainRingEngine::new(4, ChainRingConfig::mix(1.0, 1.0)).unwrap(),
        owner,
    )
    .unwrap();
    let trees = CachedSum::new(TreeEngine::new(4, TreeConfig::default()).unwrap(), shell).unwrap();
    (chains, trees, calls)
}

fn square() -> PointCloud<4> {
    // unit-ish square: sides overlap, diagonals do not
    PointCloud::new(&[
        [0.0, 0.0, 0.0],
        [0.9, 0.0, 0.0],
        [0.9, 0.9, 0.0],
        [0.0, 0.9, 0.0],
    ])
    .unwrap()
}

// ─── tests ───────────────────────────────────────────────────────────────────

#[test]
fn test_shell_reuses_owner_bonds() {
    let c = square();
    let (mut chains, mut trees, calls) = setup();
    // 4-cycle: 4 Hamiltonian paths, 1 ring
    assert_eq!(chains.value(&c).unwrap(), 5.0);
    // 4-cycle: 4 spanning trees
    assert_eq!(trees.value(&c).unwrap(), 4.0);
    assert_eq!(calls.get(), 6, "bonds computed once for both sums");
}

#[test]
fn test_shell_before_owner_is_stale() {
    let mut c = square();
    let (mut chains, mut trees, _) = setup();
    chains.value(&c).unwrap();
    c.trial_move(2, [0.1, 0.0, 0.0]);
    assert_eq!(
        trees.value(&c),
        Err(SumError::StaleSharedBonds { expected: 1, found: Some(0) })
    );
    chains.value(&c).unwrap();
    assert!(trees.value(&c).is_ok());
}

#[test]
fn test_owner_rollback_leaves_matrix_on_trial() {
    let mut c = square();
    let (mut chains, mut trees, _) = setup();
    chains.value(&c).unwrap();
    c.trial_move(2, [0.1, 0.0, 0.0]);
    chains.value(&c).unwrap();
    c.reject();
    // served from the owner's cache, so the matrix still holds the trial
    chains.value(&c).unwrap();
    assert!(matches!(
        trees.value(&c),
        Err(SumError::StaleSharedBonds { expected: 0, found: Some(1) })
    ));
}

#[test]
fn test_shell_cannot_be_copied() {
    let (chains, trees, _) = setup();
    assert_eq!(trees.make_copy().err(), Some(SumError::SharedShellCopy));
    let copy = chains.make_copy().unwrap();
    assert_eq!(copy.point_count(), 4);
}

#[test]
fn test_owner_copy_has_private_bonds() {
    let c = square();
    let (chains, mut trees, _) = setup();
    let mut copy = chains.make_copy().unwrap();
    copy.value(&c).unwrap();
    // the copy refreshed its own matrix, not the shared one
    assert!(matches!(trees.value(&c), Err(SumError::StaleSharedBonds { found: None, .. })));
}
