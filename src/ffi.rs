//! Python FFI bindings via PyO3.
//!
//! Exposes the chain/ring and tree engines over an explicit bond matrix. The
//! sampling loop, configuration identifiers and value cache stay on the Rust
//! side; from Python you hand in the matrix you already have.
//!
//! # Building the Python extension
//!
//! ```bash
//! pip install maturin
//! maturin develop --features python-ffi
//! ```
//!
//! # Usage
//!
//! ```python
//! from virial_core import ChainRingSum, TreeSum
//!
//! f = [[0.0, 2.0, 3.0],
//!      [2.0, 0.0, 5.0],
//!      [3.0, 5.0, 0.0]]
//! rings = ChainRingSum(3, chain_fraction=0.0, ring_fraction=1.0)
//! print(rings.value(f))            # 30.0
//! print(rings.sums(f))             # (31.0, 30.0)
//! print(TreeSum(3).value(f))       # 31.0
//! print(TreeSum(8).count_topologies())  # 262144
//! ```

use pyo3::exceptions::{PyArithmeticError, PyValueError};
use pyo3::prelude::*;

use crate::bonds::{BondDomain, BondMatrix};
use crate::chain::{Anchor, ChainRingConfig, ChainRingEngine, MAX_CHAIN_POINTS};
use crate::error::SumError;
use crate::tree::{TreeConfig, TreeEngine, MAX_TREE_POINTS};

fn to_py_err(e: SumError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn domain(binary: bool) -> BondDomain {
    if binary {
        BondDomain::Binary
    } else {
        BondDomain::Weighted
    }
}

fn bond_matrix(rows: &[Vec<f64>]) -> PyResult<BondMatrix> {
    BondMatrix::from_rows(rows).map_err(to_py_err)
}

fn finite(value: f64) -> PyResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PyArithmeticError::new_err(format!("non-finite cluster value {value}")))
    }
}

// ── ChainRingSum ─────────────────────────────────────────────────────────────

/// Chain and ring sums over a fixed number of points.
#[pyclass(name = "ChainRingSum")]
pub struct PyChainRingSum {
    inner: ChainRingEngine,
}

#[pymethods]
impl PyChainRingSum {
    /// Create an engine.
    ///
    /// Args:
    ///     n: number of points, 2..=20
    ///     chain_fraction: weight of the chain sum (default 1.0)
    ///     ring_fraction: weight of the ring sum (default 0.0)
    ///     anchor_first: anchor paths at point 0 instead of n-1
    ///     binary: count non-zero bonds as 1 and round the result
    #[new]
    #[pyo3(signature = (n, chain_fraction=1.0, ring_fraction=0.0, anchor_first=false, binary=false))]
    pub fn new(
        n: usize,
        chain_fraction: f64,
        ring_fraction: f64,
        anchor_first: bool,
        binary: bool,
    ) -> PyResult<Self> {
        let anchor = if anchor_first { Anchor::First } else { Anchor::Last };
        let config = ChainRingConfig::mix(chain_fraction, ring_fraction)
            .with_anchor(anchor)
            .with_domain(domain(binary));
        let inner = ChainRingEngine::new(n, config).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Number of points.
    #[getter]
    pub fn point_count(&self) -> usize {
        self.inner.point_count()
    }

    /// Weighted mix of chain and ring sums for an n×n bond matrix.
    pub fn value(&mut self, bonds: Vec<Vec<f64>>) -> PyResult<f64> {
        let bonds = bond_matrix(&bonds)?;
        finite(self.inner.evaluate(&bonds).map_err(to_py_err)?)
    }

    /// `(chain, ring)` for an n×n bond matrix.
    pub fn sums(&mut self, bonds: Vec<Vec<f64>>) -> PyResult<(f64, f64)> {
        let bonds = bond_matrix(&bonds)?;
        let sums = self.inner.sums(&bonds).map_err(to_py_err)?;
        Ok((finite(sums.chain)?, finite(sums.ring)?))
    }

    /// Mix of chain and ring counts with every bond equal to 1.
    pub fn count_topologies(&mut self) -> u64 {
        self.inner.count_topologies()
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        let config = self.inner.config();
        format!(
            "ChainRingSum(n={}, chain_fraction={}, ring_fraction={})",
            self.inner.point_count(),
            config.chain_fraction,
            config.ring_fraction
        )
    }
}

// ── TreeSum ──────────────────────────────────────────────────────────────────

/// Spanning-tree sum over a fixed number of points.
#[pyclass(name = "TreeSum")]
pub struct PyTreeSum {
    inner: TreeEngine,
}

#[pymethods]
impl PyTreeSum {
    /// Create an engine.
    ///
    /// Args:
    ///     n: number of points, 2..=16
    ///     binary: count non-zero bonds as 1 and round the result
    #[new]
    #[pyo3(signature = (n, binary=false))]
    pub fn new(n: usize, binary: bool) -> PyResult<Self> {
        let inner =
            TreeEngine::new(n, TreeConfig { domain: domain(binary) }).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Number of points.
    #[getter]
    pub fn point_count(&self) -> usize {
        self.inner.point_count()
    }

    /// Tree sum for an n×n bond matrix.
    pub fn value(&mut self, bonds: Vec<Vec<f64>>) -> PyResult<f64> {
        let bonds = bond_matrix(&bonds)?;
        finite(self.inner.evaluate(&bonds).map_err(to_py_err)?)
    }

    /// Number of labelled spanning trees.
    pub fn count_topologies(&mut self) -> u64 {
        self.inner.count_topologies()
    }

    /// Python repr string.
    pub fn __repr__(&self) -> String {
        format!("TreeSum(n={})", self.inner.point_count())
    }
}

// ── Module entry point ───────────────────────────────────────────────────────

/// Subset-DP chain, ring and tree sums for virial coefficients.
#[pymodule]
pub fn virial_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyChainRingSum>()?;
    m.add_class::<PyTreeSum>()?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("MAX_CHAIN_POINTS", MAX_CHAIN_POINTS)?;
    m.add("MAX_TREE_POINTS", MAX_TREE_POINTS)?;
    Ok(())
}
