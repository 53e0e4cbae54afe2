//! Error type shared by every engine and bond source.

use thiserror::Error;

/// Failures raised while constructing or evaluating a cluster sum.
///
/// Construction errors (`PointCount`, `InvalidFraction`, `EmptyMix`,
/// `MatrixShape`) are raised once, before any evaluation.
/// `InvalidTemperature` leaves the previous temperature in place. `NonFinite` is fatal
/// for the evaluation that produced it. `SharedShellCopy` and
/// `StaleSharedBonds` are misuse of a shell that reads another engine's bonds.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SumError {
    /// The point count is outside what the engine supports.
    #[error("point count {n} outside supported range {min}..={max}")]
    PointCount {
        /// Requested number of points.
        n: usize,
        /// Smallest supported count.
        min: usize,
        /// Largest supported count.
        max: usize,
    },

    /// A chain/ring fraction is negative or not finite.
    #[error("{name} must be finite and non-negative (got {value})")]
    InvalidFraction {
        /// Which fraction was rejected.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A temperature that is not finite and strictly positive.
    #[error("temperature must be finite and positive (got {value})")]
    InvalidTemperature {
        /// The rejected temperature.
        value: f64,
    },

    /// Both the chain and ring fractions are zero.
    #[error("chain and ring fractions are both zero")]
    EmptyMix,

    /// The sum stayed NaN or infinite after one recomputation.
    #[error("non-finite cluster value {value} for configuration {id}")]
    NonFinite {
        /// Identifier of the configuration that produced the value.
        id: u64,
        /// The offending value.
        value: f64,
    },

    /// A shell that reads another engine's bond matrix cannot be copied.
    #[error("cannot copy a shell that delegates its bond values to another engine")]
    SharedShellCopy,

    /// A shell was evaluated before its owner refreshed the shared bonds.
    #[error("shared bonds refreshed for configuration {found:?}, expected {expected}")]
    StaleSharedBonds {
        /// Identifier the shell was asked to evaluate.
        expected: u64,
        /// Identifier the shared matrix was last refreshed for.
        found: Option<u64>,
    },

    /// A bond matrix of the wrong size was supplied.
    #[error("bond matrix has {found} points, engine expects {expected}")]
    MatrixShape {
        /// Engine point count.
        expected: usize,
        /// Matrix point count.
        found: usize,
    },

    /// A mixture Mayer function has no entry for a species pair.
    #[error("no Mayer function registered for species pair ({a}, {b})")]
    UnknownSpeciesPair {
        /// First species.
        a: u8,
        /// Second species.
        b: u8,
    },
}
