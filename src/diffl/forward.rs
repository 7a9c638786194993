//! Forward left-difference operator
//!
//! `g[..., i, ...] = x[..., i, ...] ⊕ x[..., i-1, ...]` along one axis, with
//! the first row set by the edge condition. The multi-axis form writes one
//! difference image per requested axis into consecutive slices of a trailing
//! stacking axis.

use ndarray::{
    Array, ArrayBase, ArrayD, ArrayView1, ArrayViewD, ArrayViewMut1, ArrayViewMutD, Axis, Data,
    DataMut, Dimension, IxDyn,
};

use super::{check_axes, check_axis, check_same_shape, stacked_shape, DiffOptions, Edge, Scalar};
use crate::error::DiffResult;

/// Left difference along one 1-D lane.
#[inline]
fn forward_lane<T: Scalar>(mut g: ArrayViewMut1<'_, T>, x: ArrayView1<'_, T>, opts: DiffOptions) {
    let n = x.len();
    if n == 0 {
        return;
    }

    for i in 1..n {
        g[i] = opts.combine(x[i], x[i - 1]);
    }

    match opts.edge {
        Edge::Zero => g[0] = T::zero(),
        Edge::Circ => g[0] = opts.combine(x[0], x[n - 1]),
        Edge::None => {}
    }
}

/// Unchecked kernel; shapes and axis are validated by the callers.
pub(crate) fn forward_axis<T: Scalar>(
    mut g: ArrayViewMutD<'_, T>,
    x: ArrayViewD<'_, T>,
    axis: usize,
    opts: DiffOptions,
) {
    let ax = Axis(axis);
    let g_lanes = g.lanes_mut(ax);
    let x_lanes = x.lanes(ax);

    for (g_lane, x_lane) in g_lanes.into_iter().zip(x_lanes) {
        forward_lane(g_lane, x_lane, opts);
    }
}

/// Unchecked multi-axis kernel: slice `i` of `g` along its last axis gets the
/// difference along `dims[i]`.
pub(crate) fn forward_stacked<T: Scalar>(
    mut g: ArrayViewMutD<'_, T>,
    x: ArrayViewD<'_, T>,
    dims: &[usize],
    opts: DiffOptions,
) {
    let stack = Axis(x.ndim());
    for (i, &axis) in dims.iter().enumerate() {
        forward_axis(g.index_axis_mut(stack, i), x.view(), axis, opts);
    }
}

/// Left finite difference along `axis` (in-place)
///
/// Writes into the pre-allocated `g`, which must have the shape of `x`.
///
/// # Arguments
/// * `g` - Output, same shape as `x`
/// * `x` - Input array
/// * `axis` - Zero-based axis, `< x.ndim()`
/// * `opts` - Edge condition and difference kernel
///
/// # Errors
/// `ShapeMismatch` if the shapes differ, `AxisOutOfRange` for a bad axis.
/// Nothing is written when an error is returned.
pub fn diffl_inplace<T, S, SX, D>(
    g: &mut ArrayBase<S, D>,
    x: &ArrayBase<SX, D>,
    axis: usize,
    opts: DiffOptions,
) -> DiffResult<()>
where
    T: Scalar,
    S: DataMut<Elem = T>,
    SX: Data<Elem = T>,
    D: Dimension,
{
    check_same_shape(x.shape(), g.shape())?;
    check_axis(axis, x.ndim())?;

    forward_axis(g.view_mut().into_dyn(), x.view().into_dyn(), axis, opts);
    Ok(())
}

/// Left finite differences along several axes (in-place)
///
/// `g` has the shape of `x` plus a trailing axis of length `dims.len()`;
/// `g[..., i]` receives the difference along `dims[i]`.
pub fn diffl_multi_inplace<T, S, SX, E, D>(
    g: &mut ArrayBase<S, E>,
    x: &ArrayBase<SX, D>,
    dims: &[usize],
    opts: DiffOptions,
) -> DiffResult<()>
where
    T: Scalar,
    S: DataMut<Elem = T>,
    SX: Data<Elem = T>,
    E: Dimension,
    D: Dimension,
{
    check_axes(dims, x.ndim())?;
    check_same_shape(&stacked_shape(x.shape(), dims.len()), g.shape())?;

    forward_stacked(g.view_mut().into_dyn(), x.view().into_dyn(), dims, opts);
    Ok(())
}

/// Left finite difference along `axis` (allocating)
///
/// The output starts zero-filled, so with `Edge::None` the first row is zero.
pub fn diffl<T, S, D>(x: &ArrayBase<S, D>, axis: usize, opts: DiffOptions) -> DiffResult<Array<T, D>>
where
    T: Scalar,
    S: Data<Elem = T>,
    D: Dimension,
{
    let mut g = Array::zeros(x.raw_dim());
    diffl_inplace(&mut g, x, axis, opts)?;
    Ok(g)
}

/// Left finite differences along several axes (allocating)
///
/// Returns an array of shape `[x.shape()..., dims.len()]`.
pub fn diffl_multi<T, S, D>(x: &ArrayBase<S, D>, dims: &[usize], opts: DiffOptions) -> DiffResult<ArrayD<T>>
where
    T: Scalar,
    S: Data<Elem = T>,
    D: Dimension,
{
    check_axes(dims, x.ndim())?;
    let mut g = ArrayD::zeros(IxDyn(&stacked_shape(x.shape(), dims.len())));
    diffl_multi_inplace(&mut g, x, dims, opts)?;
    Ok(g)
}

/// Forward difference with default options (zero edge, subtraction)
pub fn diffl_default<T, S, D>(x: &ArrayBase<S, D>, axis: usize) -> DiffResult<Array<T, D>>
where
    T: Scalar,
    S: Data<Elem = T>,
    D: Dimension,
{
    diffl(x, axis, DiffOptions::default())
}
