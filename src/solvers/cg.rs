//! Conjugate Gradient solver
//!
//! Solves Ax = b for symmetric positive definite A given as a closure.

use crate::error::{DiffError, DiffResult};

/// Result of a CG run
#[derive(Clone, Debug)]
pub struct CgOutcome {
    pub x: Vec<f64>,
    pub iterations: usize,
    /// ||b - Ax|| at exit
    pub residual_norm: f64,
    pub converged: bool,
}

/// Conjugate gradient solver
///
/// # Arguments
/// * `a_op` - Closure that computes A*x; errors are propagated
/// * `b` - Right-hand side vector
/// * `x0` - Initial guess
/// * `tol` - Relative residual tolerance, stop when ||r|| < tol * ||b||
/// * `max_iter` - Maximum iterations
pub fn cg_solve<F>(
    a_op: F,
    b: &[f64],
    x0: &[f64],
    tol: f64,
    max_iter: usize,
) -> DiffResult<CgOutcome>
where
    F: Fn(&[f64]) -> DiffResult<Vec<f64>>,
{
    cg_solve_with_progress(a_op, b, x0, tol, max_iter, |_, _| {})
}

/// CG with progress callback
///
/// Same as `cg_solve` but calls `progress_callback(iteration, max_iter)`
/// after each iteration.
pub fn cg_solve_with_progress<F, P>(
    a_op: F,
    b: &[f64],
    x0: &[f64],
    tol: f64,
    max_iter: usize,
    mut progress_callback: P,
) -> DiffResult<CgOutcome>
where
    F: Fn(&[f64]) -> DiffResult<Vec<f64>>,
    P: FnMut(usize, usize),
{
    let n = b.len();
    if x0.len() != n {
        return Err(DiffError::LengthMismatch { expected: n, found: x0.len() });
    }
    if !(tol.is_finite() && tol > 0.0) {
        return Err(DiffError::InvalidParameter {
            name: "tol",
            value: tol,
            reason: "must be positive and finite",
        });
    }

    let mut x = x0.to_vec();
    let b_norm = dot(b, b).sqrt();

    // r = b - A*x
    let ax = a_op(&x)?;
    if ax.len() != n {
        return Err(DiffError::LengthMismatch { expected: n, found: ax.len() });
    }
    let mut r: Vec<f64> = b.iter().zip(ax.iter()).map(|(&bi, &axi)| bi - axi).collect();
    let mut p = r.clone();
    let mut rsold = dot(&r, &r);

    if b_norm == 0.0 || rsold.sqrt() <= tol * b_norm {
        return Ok(CgOutcome {
            x,
            iterations: 0,
            residual_norm: rsold.sqrt(),
            converged: true,
        });
    }

    let mut iterations = 0;
    let mut converged = false;

    for iter in 0..max_iter {
        let ap = a_op(&p)?;
        let pap = dot(&p, &ap);

        if pap.abs() < 1e-300 {
            break;
        }

        let alpha = rsold / pap;

        // x = x + alpha * p, r = r - alpha * A*p
        for i in 0..n {
            x[i] += alpha * p[i];
            r[i] -= alpha * ap[i];
        }

        let rsnew = dot(&r, &r);
        iterations = iter + 1;
        progress_callback(iterations, max_iter);

        if rsnew.sqrt() < tol * b_norm {
            rsold = rsnew;
            converged = true;
            break;
        }

        let beta = rsnew / rsold;

        // p = r + beta * p
        for i in 0..n {
            p[i] = r[i] + beta * p[i];
        }

        rsold = rsnew;
    }

    Ok(CgOutcome {
        x,
        iterations,
        residual_norm: rsold.sqrt(),
        converged,
    })
}

#[inline]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(&ai, &bi)| ai * bi).sum()
}
