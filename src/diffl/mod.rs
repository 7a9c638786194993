//! Left finite differences over N-dimensional arrays
//!
//! - `forward`: `g[i] = x[i] - x[i-1]` (or `+`) along one or more axes
//! - `adjoint`: the transpose of `forward`, accumulated into one array
//!
//! Axes are zero-based. The boundary row (index 0 along the axis) is
//! controlled by [`Edge`].

use std::fmt;
use std::ops::{AddAssign, SubAssign};
use std::str::FromStr;

use num_traits::Num;

use crate::error::{DiffError, DiffResult};

pub mod adjoint;
pub mod forward;

pub use adjoint::*;
pub use forward::*;

/// Element types the difference operators accept (real and complex floats).
pub trait Scalar: Copy + Num + AddAssign + SubAssign + 'static {}

impl<T> Scalar for T where T: Copy + Num + AddAssign + SubAssign + 'static {}

/// Boundary treatment of the first row along the difference axis
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Edge {
    /// First row is zero
    #[default]
    Zero,
    /// Periodic: row 0 is differenced against the last row
    Circ,
    /// First row is left as the caller initialized it
    None,
}

impl Edge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Edge::Zero => "zero",
            Edge::Circ => "circ",
            Edge::None => "none",
        }
    }
}

impl FromStr for Edge {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" => Ok(Edge::Zero),
            "circ" => Ok(Edge::Circ),
            "none" => Ok(Edge::None),
            _ => Err(DiffError::InvalidEdge(s.to_string())),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options shared by the forward and adjoint operators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DiffOptions {
    pub edge: Edge,
    /// `x[i] + x[i-1]` instead of `x[i] - x[i-1]`
    pub add: bool,
}

impl DiffOptions {
    pub fn new(edge: Edge, add: bool) -> Self {
        Self { edge, add }
    }

    pub fn edge(mut self, edge: Edge) -> Self {
        self.edge = edge;
        self
    }

    pub fn add(mut self, add: bool) -> Self {
        self.add = add;
        self
    }

    /// Difference kernel `a ⊕ b`.
    #[inline]
    pub(crate) fn combine<T: Scalar>(&self, a: T, b: T) -> T {
        if self.add {
            a + b
        } else {
            a - b
        }
    }
}

/// One axis, or an ordered list of axes stacked along a trailing dimension
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Axes {
    Single(usize),
    Many(Vec<usize>),
}

impl Axes {
    /// All axes of a rank-`ndim` array, in order.
    pub fn all(ndim: usize) -> Self {
        Axes::Many((0..ndim).collect())
    }

    /// Number of difference images produced.
    pub fn count(&self) -> usize {
        match self {
            Axes::Single(_) => 1,
            Axes::Many(dims) => dims.len(),
        }
    }

    pub fn as_slice(&self) -> &[usize] {
        match self {
            Axes::Single(axis) => std::slice::from_ref(axis),
            Axes::Many(dims) => dims,
        }
    }

    pub(crate) fn validate(&self, ndim: usize) -> DiffResult<()> {
        match self {
            Axes::Single(axis) => check_axis(*axis, ndim),
            Axes::Many(dims) => check_axes(dims, ndim),
        }
    }
}

impl From<usize> for Axes {
    fn from(axis: usize) -> Self {
        Axes::Single(axis)
    }
}

impl From<Vec<usize>> for Axes {
    fn from(dims: Vec<usize>) -> Self {
        Axes::Many(dims)
    }
}

impl From<&[usize]> for Axes {
    fn from(dims: &[usize]) -> Self {
        Axes::Many(dims.to_vec())
    }
}

pub(crate) fn check_axis(axis: usize, ndim: usize) -> DiffResult<()> {
    if axis < ndim {
        Ok(())
    } else {
        Err(DiffError::AxisOutOfRange { axis, ndim })
    }
}

pub(crate) fn check_axes(dims: &[usize], ndim: usize) -> DiffResult<()> {
    if dims.is_empty() {
        return Err(DiffError::EmptyAxes);
    }
    dims.iter().try_for_each(|&d| check_axis(d, ndim))
}

pub(crate) fn check_same_shape(expected: &[usize], found: &[usize]) -> DiffResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(DiffError::ShapeMismatch {
            expected: expected.to_vec(),
            found: found.to_vec(),
        })
    }
}

/// Shape of the stacked output: `shape` followed by `count`.
pub(crate) fn stacked_shape(shape: &[usize], count: usize) -> Vec<usize> {
    let mut out = shape.to_vec();
    out.push(count);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_from_str() {
        assert_eq!("zero".parse::<Edge>(), Ok(Edge::Zero));
        assert_eq!("Circ".parse::<Edge>(), Ok(Edge::Circ));
        assert_eq!(" none ".parse::<Edge>(), Ok(Edge::None));
        assert_eq!(
            "reflect".parse::<Edge>(),
            Err(DiffError::InvalidEdge("reflect".into()))
        );
    }

    #[test]
    fn test_options_default() {
        let opts = DiffOptions::default();
        assert_eq!(opts.edge, Edge::Zero);
        assert!(!opts.add);

        let opts = opts.edge(Edge::Circ).add(true);
        assert_eq!(opts, DiffOptions::new(Edge::Circ, true));
        assert_eq!(opts.combine(2.0, 3.0), 5.0);
        assert_eq!(DiffOptions::default().combine(2.0, 3.0), -1.0);
    }

    #[test]
    fn test_axes() {
        assert_eq!(Axes::all(3), Axes::Many(vec![0, 1, 2]));
        assert_eq!(Axes::from(2).count(), 1);
        assert_eq!(Axes::from(vec![2, 0]).as_slice(), &[2, 0]);

        assert!(Axes::Single(2).validate(3).is_ok());
        assert_eq!(
            Axes::Single(3).validate(3),
            Err(DiffError::AxisOutOfRange { axis: 3, ndim: 3 })
        );
        assert_eq!(Axes::Many(vec![]).validate(3), Err(DiffError::EmptyAxes));
        assert_eq!(
            Axes::Many(vec![0, 5]).validate(2),
            Err(DiffError::AxisOutOfRange { axis: 5, ndim: 2 })
        );
    }
}
