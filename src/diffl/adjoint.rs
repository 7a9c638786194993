//! Adjoint of the left-difference operator
//!
//! For `Edge::Zero` and `Edge::Circ` these are the exact transposes of the
//! forward maps in `forward`, so that `<diffl(x), g> = <x, diffl_adj(g)>`.
//! `Edge::None` keeps only the interior terms.

use ndarray::{
    Array, ArrayBase, ArrayD, ArrayView1, ArrayViewD, ArrayViewMut1, ArrayViewMutD, Axis, Data,
    DataMut, Dimension, IxDyn,
};

use super::{check_axes, check_axis, check_same_shape, stacked_shape, DiffOptions, Edge, Scalar};
use crate::error::{DiffError, DiffResult};

/// Accumulate the transpose of `forward_lane` into `z`.
#[inline]
fn adjoint_lane<T: Scalar>(mut z: ArrayViewMut1<'_, T>, g: ArrayView1<'_, T>, opts: DiffOptions) {
    let n = g.len();
    if n == 0 {
        return;
    }

    // Rows that multiply x[i] with coefficient +1
    match opts.edge {
        Edge::Zero => {
            for i in 1..n {
                z[i] += g[i];
            }
        }
        Edge::Circ => {
            for i in 0..n {
                z[i] += g[i];
            }
        }
        Edge::None => {}
    }

    // Rows that multiply x[i-1] with coefficient ±1
    for i in 1..n {
        if opts.add {
            z[i - 1] += g[i];
        } else {
            z[i - 1] -= g[i];
        }
    }

    if opts.edge == Edge::Circ {
        if opts.add {
            z[n - 1] += g[0];
        } else {
            z[n - 1] -= g[0];
        }
    }
}

pub(crate) fn adjoint_axis<T: Scalar>(
    mut z: ArrayViewMutD<'_, T>,
    g: ArrayViewD<'_, T>,
    axis: usize,
    opts: DiffOptions,
) {
    let ax = Axis(axis);
    let z_lanes = z.lanes_mut(ax);
    let g_lanes = g.lanes(ax);

    for (z_lane, g_lane) in z_lanes.into_iter().zip(g_lanes) {
        adjoint_lane(z_lane, g_lane, opts);
    }
}

/// Unchecked multi-axis adjoint: overwrites `z` with the sum over slices.
pub(crate) fn adjoint_stacked<T: Scalar>(
    mut z: ArrayViewMutD<'_, T>,
    g: ArrayViewD<'_, T>,
    dims: &[usize],
    opts: DiffOptions,
) {
    let stack = Axis(z.ndim());
    for (i, &axis) in dims.iter().enumerate() {
        if i == 0 {
            z.fill(T::zero());
        }
        adjoint_axis(z.view_mut(), g.index_axis(stack, i), axis, opts);
    }
}

/// Adjoint of [`diffl_inplace`](super::diffl_inplace) along `axis` (in-place)
///
/// # Arguments
/// * `z` - Output, same shape as `g`
/// * `g` - Difference-shaped input
/// * `axis` - Zero-based axis, `< g.ndim()`
/// * `opts` - Must match the options of the forward call
/// * `reset0` - Zero `z` before accumulating; pass `false` to add onto
///   existing contents
///
/// # Errors
/// `ShapeMismatch` or `AxisOutOfRange`, before anything is written.
pub fn diffl_adj_inplace<T, S, SG, D>(
    z: &mut ArrayBase<S, D>,
    g: &ArrayBase<SG, D>,
    axis: usize,
    opts: DiffOptions,
    reset0: bool,
) -> DiffResult<()>
where
    T: Scalar,
    S: DataMut<Elem = T>,
    SG: Data<Elem = T>,
    D: Dimension,
{
    check_same_shape(g.shape(), z.shape())?;
    check_axis(axis, g.ndim())?;

    if reset0 {
        z.fill(T::zero());
    }
    adjoint_axis(z.view_mut().into_dyn(), g.view().into_dyn(), axis, opts);
    Ok(())
}

/// Adjoint of [`diffl_multi_inplace`](super::diffl_multi_inplace) (in-place)
///
/// `g` has the shape of `z` plus a trailing axis of length `dims.len()`.
/// `z` is overwritten with the sum of the per-axis adjoints.
pub fn diffl_adj_multi_inplace<T, S, SG, D, E>(
    z: &mut ArrayBase<S, D>,
    g: &ArrayBase<SG, E>,
    dims: &[usize],
    opts: DiffOptions,
) -> DiffResult<()>
where
    T: Scalar,
    S: DataMut<Elem = T>,
    SG: Data<Elem = T>,
    D: Dimension,
    E: Dimension,
{
    check_axes(dims, z.ndim())?;
    check_same_shape(&stacked_shape(z.shape(), dims.len()), g.shape())?;

    adjoint_stacked(z.view_mut().into_dyn(), g.view().into_dyn(), dims, opts);
    Ok(())
}

/// Adjoint along `axis` (allocating)
pub fn diffl_adj<T, S, D>(g: &ArrayBase<S, D>, axis: usize, opts: DiffOptions) -> DiffResult<Array<T, D>>
where
    T: Scalar,
    S: Data<Elem = T>,
    D: Dimension,
{
    let mut z = Array::zeros(g.raw_dim());
    diffl_adj_inplace(&mut z, g, axis, opts, false)?;
    Ok(z)
}

/// Multi-axis adjoint (allocating)
///
/// Drops the trailing stacking axis of `g`.
pub fn diffl_adj_multi<T, S, E>(g: &ArrayBase<S, E>, dims: &[usize], opts: DiffOptions) -> DiffResult<ArrayD<T>>
where
    T: Scalar,
    S: Data<Elem = T>,
    E: Dimension,
{
    check_axes(dims, g.ndim().saturating_sub(1))?;
    let (&count, image_shape) = g.shape().split_last().ok_or_else(|| DiffError::ShapeMismatch {
        expected: vec![dims.len()],
        found: Vec::new(),
    })?;
    if count != dims.len() {
        return Err(DiffError::ShapeMismatch {
            expected: stacked_shape(image_shape, dims.len()),
            found: g.shape().to_vec(),
        });
    }

    let mut z = ArrayD::zeros(IxDyn(image_shape));
    diffl_adj_multi_inplace(&mut z, g, dims, opts)?;
    Ok(z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diffl::{diffl, diffl_multi};
    use ndarray::{arr1, Array1};
    use num_complex::Complex64;

    const COMBOS: [(Edge, bool); 4] = [
        (Edge::Zero, false),
        (Edge::Zero, true),
        (Edge::Circ, false),
        (Edge::Circ, true),
    ];

    fn signal(shape: &[usize], freq: f64, phase: f64) -> ArrayD<f64> {
        let n: usize = shape.iter().product();
        let data: Vec<f64> = (0..n).map(|i| ((i as f64) * freq + phase).sin()).collect();
        ArrayD::from_shape_vec(IxDyn(shape), data).unwrap()
    }

    fn dot(a: &ArrayD<f64>, b: &ArrayD<f64>) -> f64 {
        assert_eq!(a.shape(), b.shape());
        a.iter().zip(b.iter()).map(|(&p, &q)| p * q).sum()
    }

    fn assert_close(lhs: f64, rhs: f64, what: &str) {
        let rel_err = (lhs - rhs).abs() / (lhs.abs() + rhs.abs() + 1e-10);
        assert!(rel_err < 1e-12, "{}: lhs={}, rhs={}, rel_err={}", what, lhs, rhs, rel_err);
    }

    #[test]
    fn test_small_zero_edge_example() {
        // A = [[0,0,0],[-1,1,0],[0,-1,1]], Aᵀ[1,2,3] = [-2,-1,3]
        let g = arr1(&[1.0, 2.0, 3.0]);
        let z = diffl_adj(&g, 0, DiffOptions::default()).unwrap();
        assert_eq!(z, arr1(&[-2.0, -1.0, 3.0]));
    }

    #[test]
    fn test_small_circ_example() {
        // A = [[1,0,-1],[-1,1,0],[0,-1,1]], Aᵀ[1,2,3] = [-1,-1,2]
        let g = arr1(&[1.0, 2.0, 3.0]);
        let z = diffl_adj(&g, 0, DiffOptions::new(Edge::Circ, false)).unwrap();
        assert_eq!(z, arr1(&[-1.0, -1.0, 2.0]));

        // A = [[1,0,1],[1,1,0],[0,1,1]], Aᵀ[1,2,3] = [3,5,4]
        let z = diffl_adj(&g, 0, DiffOptions::new(Edge::Circ, true)).unwrap();
        assert_eq!(z, arr1(&[3.0, 5.0, 4.0]));
    }

    #[test]
    fn test_none_keeps_interior_terms_only() {
        let g = arr1(&[1.0, 2.0, 3.0]);
        let z = diffl_adj(&g, 0, DiffOptions::new(Edge::None, false)).unwrap();
        assert_eq!(z, arr1(&[-2.0, -3.0, 0.0]));

        let z = diffl_adj(&g, 0, DiffOptions::new(Edge::None, true)).unwrap();
        assert_eq!(z, arr1(&[2.0, 3.0, 0.0]));
    }

    #[test]
    fn test_adjoint_identity_single_axis() {
        for shape in [vec![7], vec![3, 4], vec![2, 3, 4], vec![1, 5, 3]] {
            let x = signal(&shape, 0.31, 0.2);
            let g = signal(&shape, 0.57, 1.1);

            for axis in 0..shape.len() {
                for (edge, add) in COMBOS {
                    let opts = DiffOptions::new(edge, add);
                    let ax = diffl(&x, axis, opts).unwrap();
                    let atg = diffl_adj(&g, axis, opts).unwrap();
                    assert_close(
                        dot(&ax, &g),
                        dot(&x, &atg),
                        &format!("shape={:?} axis={} edge={} add={}", shape, axis, edge, add),
                    );
                }
            }
        }
    }

    #[test]
    fn test_adjoint_identity_multi_axis() {
        let shape = [3, 4, 5];
        let x = signal(&shape, 0.23, 0.4);

        for dims in [vec![2, 0], vec![0, 1, 2], vec![1, 1]] {
            let g = signal(&stacked_shape(&shape, dims.len()), 0.71, 0.9);
            for (edge, add) in COMBOS {
                let opts = DiffOptions::new(edge, add);
                let ax = diffl_multi(&x, &dims, opts).unwrap();
                let atg = diffl_adj_multi(&g, &dims, opts).unwrap();
                assert_close(
                    dot(&ax, &g),
                    dot(&x, &atg),
                    &format!("dims={:?} edge={} add={}", dims, edge, add),
                );
            }
        }
    }

    #[test]
    fn test_adjoint_identity_complex() {
        let n = 6;
        let x: Array1<Complex64> = (0..n)
            .map(|i| Complex64::new((i as f64 * 0.4).cos(), (i as f64 * 0.9).sin()))
            .collect();
        let g: Array1<Complex64> = (0..n)
            .map(|i| Complex64::new((i as f64 * 1.3).sin(), (i as f64 * 0.2).cos()))
            .collect();

        for (edge, add) in COMBOS {
            let opts = DiffOptions::new(edge, add);
            let ax = diffl(&x, 0, opts).unwrap();
            let atg = diffl_adj(&g, 0, opts).unwrap();

            // Real coefficients: the Hermitian adjoint equals the transpose
            let lhs: Complex64 = ax.iter().zip(g.iter()).map(|(a, b)| a.conj() * b).sum();
            let rhs: Complex64 = x.iter().zip(atg.iter()).map(|(a, b)| a.conj() * b).sum();
            assert!((lhs - rhs).norm() < 1e-12, "edge={} add={}: {} vs {}", edge, add, lhs, rhs);
        }
    }

    #[test]
    fn test_accumulate_without_reset() {
        let g = arr1(&[1.0, 2.0, 3.0]);
        let mut z = Array1::from_elem(3, 1.0);

        diffl_adj_inplace(&mut z, &g, 0, DiffOptions::default(), false).unwrap();
        assert_eq!(z, arr1(&[-1.0, 0.0, 4.0]));

        diffl_adj_inplace(&mut z, &g, 0, DiffOptions::default(), true).unwrap();
        assert_eq!(z, arr1(&[-2.0, -1.0, 3.0]));
    }

    #[test]
    fn test_multi_equals_sum_of_single() {
        let shape = [2, 3, 4];
        let g = signal(&[2, 3, 4, 2], 0.43, 0.0);
        let opts = DiffOptions::new(Edge::Circ, false);

        let z = diffl_adj_multi(&g, &[2, 0], opts).unwrap();

        let stack = Axis(shape.len());
        let mut expected = diffl_adj(&g.index_axis(stack, 0).to_owned(), 2, opts).unwrap();
        diffl_adj_inplace(&mut expected, &g.index_axis(stack, 1), 0, opts, false).unwrap();

        for (a, b) in z.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_multi_overwrites_previous_contents() {
        let g = signal(&[3, 4, 2], 0.5, 0.3);
        let opts = DiffOptions::default();

        let mut z = ArrayD::from_elem(IxDyn(&[3, 4]), 100.0);
        diffl_adj_multi_inplace(&mut z, &g, &[0, 1], opts).unwrap();

        let fresh = diffl_adj_multi(&g, &[0, 1], opts).unwrap();
        assert_eq!(z, fresh);
    }

    #[test]
    fn test_errors() {
        let g = signal(&[3, 4], 0.5, 0.0);

        assert_eq!(
            diffl_adj(&g, 2, DiffOptions::default()).unwrap_err(),
            DiffError::AxisOutOfRange { axis: 2, ndim: 2 }
        );

        let mut z = ArrayD::from_elem(IxDyn(&[4, 3]), 5.0);
        assert_eq!(
            diffl_adj_inplace(&mut z, &g, 0, DiffOptions::default(), true).unwrap_err(),
            DiffError::ShapeMismatch { expected: vec![3, 4], found: vec![4, 3] }
        );
        assert!(z.iter().all(|&v| v == 5.0), "z must be untouched on error");

        // Trailing axis of length 4 but two axes requested
        assert_eq!(
            diffl_adj_multi(&g, &[0, 0], DiffOptions::default()).unwrap_err(),
            DiffError::ShapeMismatch { expected: vec![3, 2], found: vec![3, 4] }
        );

        // No axes is reported the same way as by the forward map
        assert_eq!(diffl_adj_multi(&g, &[], DiffOptions::default()).unwrap_err(), DiffError::EmptyAxes);
        assert_eq!(
            diffl_multi(&signal(&[3], 0.5, 0.0), &[], DiffOptions::default()).unwrap_err(),
            DiffError::EmptyAxes
        );

        let mut z = ArrayD::from_elem(IxDyn(&[3]), 5.0);
        assert_eq!(
            diffl_adj_multi_inplace(&mut z, &g, &[1], DiffOptions::default()).unwrap_err(),
            DiffError::AxisOutOfRange { axis: 1, ndim: 1 }
        );
        assert!(z.iter().all(|&v| v == 5.0), "z must be untouched on error");
    }
}
