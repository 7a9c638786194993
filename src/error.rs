//! Error type shared by the difference operators, the operator adapter and
//! the solvers built on top of them.

use thiserror::Error;

/// Crate-wide result alias.
pub type DiffResult<T> = Result<T, DiffError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiffError {
    // ---- Invalid argument ----
    /// Axis index is not in `[0, ndim)`.
    #[error("axis {axis} out of range for array of rank {ndim}")]
    AxisOutOfRange { axis: usize, ndim: usize },

    /// Edge condition text that is not one of `zero`, `circ`, `none`.
    #[error("unrecognized edge condition `{0}` (expected `zero`, `circ` or `none`)")]
    InvalidEdge(String),

    /// Multi-axis call with no axes.
    #[error("at least one axis is required")]
    EmptyAxes,

    /// Numeric parameter outside its admissible range.
    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    // ---- Dimension mismatch ----
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    // ---- Unsupported configuration ----
    /// `Edge::None` has no well-defined transpose.
    #[error("edge condition `none` cannot be used for a linear operator")]
    UnsupportedEdge,
}
