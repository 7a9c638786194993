//! Matrix-free linear operators
//!
//! A [`LinearOperator`] is a pair of closures (forward and adjoint) acting on
//! flat vectors, plus its `(rows, cols)` shape. Solvers only ever call
//! `apply` / `apply_adjoint`, so nothing is materialized unless `to_dense`
//! is requested.
//!
//! [`diffl_map`] wraps the left-difference operators. Flat vectors are read
//! in column-major order (index = i + j*nx + k*nx*ny), so with several axes
//! the output is the per-axis difference images laid end to end.

use std::fmt;
use std::sync::Arc;

use ndarray::{Array2, ArrayView1, ArrayViewD, ArrayViewMutD, IxDyn, ShapeBuilder};

use crate::diffl::forward::{forward_axis, forward_stacked};
use crate::diffl::adjoint::{adjoint_axis, adjoint_stacked};
use crate::diffl::{stacked_shape, Axes, DiffOptions, Edge, Scalar};
use crate::error::{DiffError, DiffResult};

/// `f(out, in)`: writes the operator applied to `in` into `out`.
pub type ApplyFn<T> = Arc<dyn Fn(&mut [T], &[T]) -> DiffResult<()> + Send + Sync>;

/// Parameters a difference operator was built from
#[derive(Clone, Debug, PartialEq)]
pub struct DifflMeta {
    pub image_shape: Vec<usize>,
    pub axes: Axes,
    pub options: DiffOptions,
}

/// Linear map from `T^cols` to `T^rows` given by closures
#[derive(Clone)]
pub struct LinearOperator<T> {
    name: String,
    rows: usize,
    cols: usize,
    forward: ApplyFn<T>,
    adjoint: ApplyFn<T>,
    meta: Option<DifflMeta>,
}

impl<T: Scalar> LinearOperator<T> {
    /// Build an operator from forward and adjoint closures.
    ///
    /// `shape` is `(rows, cols)`: `forward` maps `cols`-vectors to
    /// `rows`-vectors, `adjoint` the other way round.
    pub fn new<F, G>(name: impl Into<String>, shape: (usize, usize), forward: F, adjoint: G) -> Self
    where
        F: Fn(&mut [T], &[T]) -> DiffResult<()> + Send + Sync + 'static,
        G: Fn(&mut [T], &[T]) -> DiffResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            rows: shape.0,
            cols: shape.1,
            forward: Arc::new(forward),
            adjoint: Arc::new(adjoint),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: DifflMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn meta(&self) -> Option<&DifflMeta> {
        self.meta.as_ref()
    }

    /// `y = A x` into a pre-allocated `y`
    pub fn apply_into(&self, y: &mut [T], x: &[T]) -> DiffResult<()> {
        check_len(self.cols, x.len())?;
        check_len(self.rows, y.len())?;
        (self.forward)(y, x)
    }

    /// `A x`
    pub fn apply(&self, x: &[T]) -> DiffResult<Vec<T>> {
        let mut y = vec![T::zero(); self.rows];
        self.apply_into(&mut y, x)?;
        Ok(y)
    }

    /// `z = Aᵀ g` into a pre-allocated `z`
    pub fn apply_adjoint_into(&self, z: &mut [T], g: &[T]) -> DiffResult<()> {
        check_len(self.rows, g.len())?;
        check_len(self.cols, z.len())?;
        (self.adjoint)(z, g)
    }

    /// `Aᵀ g`
    pub fn apply_adjoint(&self, g: &[T]) -> DiffResult<Vec<T>> {
        let mut z = vec![T::zero(); self.cols];
        self.apply_adjoint_into(&mut z, g)?;
        Ok(z)
    }

    /// The adjoint operator. Shares the closures; nothing is recomputed.
    pub fn transpose(&self) -> Self {
        let name = match self.name.strip_suffix('ᵀ') {
            Some(base) => base.to_string(),
            None => format!("{}ᵀ", self.name),
        };
        Self {
            name,
            rows: self.cols,
            cols: self.rows,
            forward: Arc::clone(&self.adjoint),
            adjoint: Arc::clone(&self.forward),
            meta: self.meta.clone(),
        }
    }

    /// Materialize as a dense `rows × cols` matrix, one column per unit vector.
    pub fn to_dense(&self) -> DiffResult<Array2<T>> {
        let mut dense = Array2::zeros((self.rows, self.cols));
        let mut unit = vec![T::zero(); self.cols];
        let mut column = vec![T::zero(); self.rows];

        for j in 0..self.cols {
            unit[j] = T::one();
            self.apply_into(&mut column, &unit)?;
            unit[j] = T::zero();
            dense.column_mut(j).assign(&ArrayView1::from(&column[..]));
        }
        Ok(dense)
    }
}

impl<T> fmt::Debug for LinearOperator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearOperator")
            .field("name", &self.name)
            .field("shape", &(self.rows, self.cols))
            .field("meta", &self.meta)
            .finish()
    }
}

fn check_len(expected: usize, found: usize) -> DiffResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(DiffError::LengthMismatch { expected, found })
    }
}

/// Column-major view of a flat buffer.
fn fortran_view<'a, T>(shape: &[usize], data: &'a [T]) -> DiffResult<ArrayViewD<'a, T>> {
    ArrayViewD::from_shape(IxDyn(shape).f(), data).map_err(|_| DiffError::LengthMismatch {
        expected: shape.iter().product(),
        found: data.len(),
    })
}

fn fortran_view_mut<'a, T>(shape: &[usize], data: &'a mut [T]) -> DiffResult<ArrayViewMutD<'a, T>> {
    let found = data.len();
    ArrayViewMutD::from_shape(IxDyn(shape).f(), data).map_err(|_| DiffError::LengthMismatch {
        expected: shape.iter().product(),
        found,
    })
}

/// Left-difference operator on images of shape `shape`
///
/// # Arguments
/// * `shape` - Image shape; inputs are flat column-major vectors of length
///   `prod(shape)`
/// * `axes` - One axis, or several stacked into `prod(shape) * k` outputs
/// * `opts` - `Edge::Zero` or `Edge::Circ`
///
/// # Errors
/// `UnsupportedEdge` for `Edge::None`; `AxisOutOfRange` / `EmptyAxes` for bad
/// axes.
pub fn diffl_map<T: Scalar>(
    shape: &[usize],
    axes: Axes,
    opts: DiffOptions,
) -> DiffResult<LinearOperator<T>> {
    if opts.edge == Edge::None {
        return Err(DiffError::UnsupportedEdge);
    }
    axes.validate(shape.len())?;

    let image_shape = shape.to_vec();
    let diff_shape = match &axes {
        Axes::Single(_) => image_shape.clone(),
        Axes::Many(dims) => stacked_shape(&image_shape, dims.len()),
    };
    let n_in: usize = image_shape.iter().product();
    let n_out = n_in * axes.count();

    let forward = {
        let (image_shape, diff_shape, axes) = (image_shape.clone(), diff_shape.clone(), axes.clone());
        move |y: &mut [T], x: &[T]| -> DiffResult<()> {
            let x = fortran_view(&image_shape, x)?;
            let y = fortran_view_mut(&diff_shape, y)?;
            match &axes {
                Axes::Single(axis) => forward_axis(y, x, *axis, opts),
                Axes::Many(dims) => forward_stacked(y, x, dims, opts),
            }
            Ok(())
        }
    };

    let adjoint = {
        let (image_shape, diff_shape, axes) = (image_shape.clone(), diff_shape, axes.clone());
        move |z: &mut [T], g: &[T]| -> DiffResult<()> {
            let g = fortran_view(&diff_shape, g)?;
            let mut z = fortran_view_mut(&image_shape, z)?;
            match &axes {
                Axes::Single(axis) => {
                    z.fill(T::zero());
                    adjoint_axis(z, g, *axis, opts);
                }
                Axes::Many(dims) => adjoint_stacked(z, g, dims, opts),
            }
            Ok(())
        }
    };

    let name = format!(
        "diffl_map {:?} axes={:?} edge={} add={}",
        shape,
        axes.as_slice(),
        opts.edge,
        opts.add
    );

    Ok(LinearOperator::new(name, (n_out, n_in), forward, adjoint).with_meta(DifflMeta {
        image_shape,
        axes,
        options: opts,
    }))
}

/// Operator along all axes of `shape` with zero edge and subtraction.
pub fn diffl_map_default<T: Scalar>(shape: &[usize]) -> DiffResult<LinearOperator<T>> {
    diffl_map(shape, Axes::all(shape.len()), DiffOptions::default())
}
