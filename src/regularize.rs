//! Regularization terms built on a difference operator T
//!
//! - Quadratic roughness: R(x) = ½||Tx||₂², ∇R(x) = Tᵀ T x
//! - Anisotropic total variation: ||Tx||₁
//! - Tikhonov smoothing: x = argmin ½||x - y||₂² + (λ/2)||Tx||₂²,
//!   i.e. (I + λ TᵀT) x = y, solved with CG
//!
//! T is normally a [`diffl_map`] operator, but any real
//! [`LinearOperator`] works.

use crate::diffl::{Axes, DiffOptions};
use crate::error::{DiffError, DiffResult};
use crate::operator::{diffl_map, LinearOperator};
use crate::solvers::cg::{cg_solve_with_progress, dot, CgOutcome};

/// R(x) = ½||Tx||₂²
pub fn quadratic_penalty(op: &LinearOperator<f64>, x: &[f64]) -> DiffResult<f64> {
    let tx = op.apply(x)?;
    Ok(0.5 * dot(&tx, &tx))
}

/// ∇R(x) = Tᵀ T x
pub fn quadratic_penalty_grad(op: &LinearOperator<f64>, x: &[f64]) -> DiffResult<Vec<f64>> {
    let tx = op.apply(x)?;
    op.apply_adjoint(&tx)
}

/// ||Tx||₁
pub fn total_variation(op: &LinearOperator<f64>, x: &[f64]) -> DiffResult<f64> {
    Ok(op.apply(x)?.iter().map(|v| v.abs()).sum())
}

/// The SPD map v ↦ v + λ TᵀT v
pub fn normal_operator(
    op: &LinearOperator<f64>,
    lambda: f64,
) -> impl Fn(&[f64]) -> DiffResult<Vec<f64>> + '_ {
    move |v: &[f64]| {
        let mut out = quadratic_penalty_grad(op, v)?;
        for (oi, &vi) in out.iter_mut().zip(v) {
            *oi = vi + lambda * *oi;
        }
        Ok(out)
    }
}

/// Tikhonov smoothing with a difference penalty
///
/// # Arguments
/// * `y` - Noisy input (length `op.cols()`)
/// * `op` - Difference operator T
/// * `lambda` - Regularization weight, >= 0
/// * `tol` - CG relative tolerance
/// * `max_iter` - Maximum CG iterations
pub fn tikhonov_smooth(
    y: &[f64],
    op: &LinearOperator<f64>,
    lambda: f64,
    tol: f64,
    max_iter: usize,
) -> DiffResult<CgOutcome> {
    tikhonov_smooth_with_progress(y, op, lambda, tol, max_iter, |_, _| {})
}

/// Tikhonov smoothing with progress callback
///
/// Same as `tikhonov_smooth` but forwards `progress_callback(iteration, max_iter)`
/// from the CG loop.
pub fn tikhonov_smooth_with_progress<P>(
    y: &[f64],
    op: &LinearOperator<f64>,
    lambda: f64,
    tol: f64,
    max_iter: usize,
    progress_callback: P,
) -> DiffResult<CgOutcome>
where
    P: FnMut(usize, usize),
{
    if !(lambda.is_finite() && lambda >= 0.0) {
        return Err(DiffError::InvalidParameter {
            name: "lambda",
            value: lambda,
            reason: "must be non-negative and finite",
        });
    }
    if y.len() != op.cols() {
        return Err(DiffError::LengthMismatch { expected: op.cols(), found: y.len() });
    }

    // Warm start from the data itself
    cg_solve_with_progress(normal_operator(op, lambda), y, y, tol, max_iter, progress_callback)
}

/// Tikhonov smoothing along all axes with default parameters
///
/// Zero edge, subtraction, λ = 0.1, tol = 1e-8, 200 iterations.
pub fn tikhonov_smooth_default(y: &[f64], shape: &[usize]) -> DiffResult<Vec<f64>> {
    let op = diffl_map(shape, Axes::all(shape.len()), DiffOptions::default())?;
    Ok(tikhonov_smooth(y, &op, 0.1, 1e-8, 200)?.x)
}
