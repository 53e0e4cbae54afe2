//! # virial-core
//!
//! Subset dynamic-programming evaluation of cluster sums for Mayer-sampling
//! virial coefficients.
//!
//! ---
//!
//! ## What is summed
//!
//! A Mayer-sampling Monte Carlo run estimates the virial coefficient Bₙ by
//! sampling configurations of n points and evaluating, at each step, a sum
//! over graphs whose edges carry Mayer bond values `f(i,j) = exp(-βu) - 1`.
//! Three graph classes are sums of products that factor over subsets:
//!
//! - **chains**, every Hamiltonian path through the n points,
//! - **rings**, every Hamiltonian cycle,
//! - **trees**, every labelled spanning tree.
//!
//! Enumerating them costs n!/2, (n-1)!/2 and nⁿ⁻² products. The engines here
//! replace that with one pass over the 2ⁿ point subsets, so a 16- or 20-point
//! reference sum stays affordable inside a sampling loop.
//!
//! ## The pipeline
//!
//! ```text
//! Configuration → BondSource → BondMatrix → SumEngine → ValueCache → value
//!       ↑             ↑                        ↑
//!   PointCloud   MayerFunction         ChainRingEngine / TreeEngine
//!                SharedBonds
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`subset`] | [`PointSet`] | Bitset point subsets; the integer is the DP table index |
//! | [`configuration`] | [`Configuration`], [`PointCloud`] | Identifier and squared separations; trial/accept/reject bookkeeping |
//! | [`potential`] | [`MayerFunction`], [`HardSphere`], [`LennardJones`], [`MixtureMayer`] | Pairwise bond values |
//! | [`bonds`] | [`BondMatrix`], [`BondSource`], [`SharedBonds`] | Symmetric bond table, refreshed per configuration, optionally shared |
//! | [`chain`] | [`ChainRingEngine`], [`ChainRingConfig`] | Hamiltonian path and cycle sums |
//! | [`tree`] | [`TreeEngine`] | Spanning-tree sums |
//! | [`cache`] | [`ValueCache`] | Current/previous value memo with one-step rollback |
//! | [`cluster`] | [`ClusterSum`], [`CachedSum`] | Engine + bonds + cache behind `value(configuration)` |
//! | [`error`] | [`SumError`] | Everything that can fail |
//!
//! ## Example
//!
//! ```
//! use virial_core::{ChainRingConfig, ChainSum, ClusterSum, HardSpherePositive, PointCloud};
//!
//! let cloud = PointCloud::<4>::new(&[
//!     [0.0, 0.0, 0.0],
//!     [0.5, 0.0, 0.0],
//!     [1.0, 0.0, 0.0],
//! ])?;
//! let mut chains = ChainSum::chain_ring(3, HardSpherePositive::new(0.6), ChainRingConfig::chain())?;
//! // 0-1 and 1-2 overlap, 0-2 does not: only the path 0-1-2 survives
//! assert_eq!(chains.value(&cloud)?, 1.0);
//! assert_eq!(chains.count_topologies(), 3);
//! # Ok::<(), virial_core::SumError>(())
//! ```
//!
//! ## `no_std`
//!
//! This crate is `#![no_std]` by default and needs `alloc` for its DP tables.
//! Enable `std` to forward `std` support to `thiserror` and `tracing`, `serde`
//! for configuration serialisation, and `python-ffi` for the PyO3 bindings.
//!
//! ## License
//!
//! Business Source License 1.1. Free for evaluation and non-production use.
//! Change date: 23 February 2032, then Apache License 2.0.
//! Commercial production use requires a license from Flout Labs (cbyrne@floutlabs.com).

#![cfg_attr(not(any(test, feature = "std", feature = "python-ffi")), no_std)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

#[cfg(any(feature = "std", feature = "python-ffi"))]
extern crate std;

pub mod bonds;
pub mod cache;
pub mod chain;
pub mod cluster;
pub mod configuration;
pub mod error;
pub mod potential;
pub mod subset;
pub mod tree;

#[cfg(feature = "python-ffi")]
pub mod ffi;

pub use bonds::{BondDomain, BondMatrix, BondSource, MayerBonds, SharedBonds};
pub use cache::{CacheState, CachedValue, Lookup, ValueCache};
pub use chain::{Anchor, ChainRingConfig, ChainRingEngine, ChainRingSums};
pub use cluster::{CachedSum, ChainSum, ClusterSum, SumEngine, TreeSum};
pub use configuration::{Configuration, PointCloud, PointPair};
pub use error::SumError;
pub use potential::{
    HardSphere, HardSpherePositive, LennardJones, MayerFunction, MixtureMayer, SquareWell,
};
pub use subset::PointSet;
pub use tree::{TreeConfig, TreeEngine};
