//! DIFFL-WASM: left finite differences for regularized image reconstruction
//!
//! This crate provides the left finite-difference operator, its exact
//! adjoint, and a matrix-free linear-operator wrapper, compiled to
//! WebAssembly for browser-based reconstruction pipelines.
//!
//! # Modules
//! - `diffl`: Forward and adjoint left differences over N-d arrays
//! - `operator`: Matrix-free linear operators (`diffl_map`)
//! - `regularize`: Roughness / TV penalties and Tikhonov smoothing
//! - `solvers`: Iterative solvers (CG)
//! - `error`: Error type shared by all of the above

// Core modules
pub mod error;
pub mod diffl;
pub mod operator;

// Algorithm modules
pub mod regularize;
pub mod solvers;

pub use diffl::{
    diffl, diffl_adj, diffl_adj_inplace, diffl_adj_multi, diffl_adj_multi_inplace, diffl_default,
    diffl_inplace, diffl_multi, diffl_multi_inplace, Axes, DiffOptions, Edge, Scalar,
};
pub use error::{DiffError, DiffResult};
pub use operator::{diffl_map, diffl_map_default, DifflMeta, LinearOperator};

use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

#[allow(unused_macros)]
macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_js(err: DiffError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Build the operator behind the flat-array exports.
///
/// `shape` and `dims` arrive as `u32` from JavaScript; `edge` as text.
fn operator_from_js(shape: &[u32], dims: &[u32], edge: &str, add: bool) -> DiffResult<LinearOperator<f64>> {
    let edge: Edge = edge.parse()?;
    let shape: Vec<usize> = shape.iter().map(|&n| n as usize).collect();
    let dims: Vec<usize> = dims.iter().map(|&d| d as usize).collect();
    diffl_map(&shape, Axes::Many(dims), DiffOptions::new(edge, add))
}

// ============================================================================
// WASM Exports: Difference Operators
// ============================================================================

/// Forward left differences
///
/// # Arguments
/// * `x` - Image (prod(shape)), column-major
/// * `shape` - Image dimensions
/// * `dims` - Zero-based axes to difference along
/// * `edge` - "zero" or "circ"
/// * `add` - Use x[i] + x[i-1] instead of x[i] - x[i-1]
///
/// # Returns
/// Difference images concatenated in the order of `dims`
/// (prod(shape) * dims.length)
#[wasm_bindgen]
pub fn diffl_wasm(
    x: &[f64],
    shape: &[u32],
    dims: &[u32],
    edge: &str,
    add: bool,
) -> Result<Vec<f64>, JsValue> {
    console_log!("WASM diffl: shape={:?}, dims={:?}, edge={}, add={}", shape, dims, edge, add);

    let op = operator_from_js(shape, dims, edge, add).map_err(to_js)?;
    let g = op.apply(x).map_err(to_js)?;

    console_log!("WASM diffl complete");
    Ok(g)
}

/// Adjoint of `diffl_wasm`
///
/// # Arguments
/// * `g` - Difference images (prod(shape) * dims.length)
/// * `shape`, `dims`, `edge`, `add` - As passed to `diffl_wasm`
///
/// # Returns
/// Image (prod(shape))
#[wasm_bindgen]
pub fn diffl_adj_wasm(
    g: &[f64],
    shape: &[u32],
    dims: &[u32],
    edge: &str,
    add: bool,
) -> Result<Vec<f64>, JsValue> {
    console_log!("WASM diffl_adj: shape={:?}, dims={:?}, edge={}, add={}", shape, dims, edge, add);

    let op = operator_from_js(shape, dims, edge, add).map_err(to_js)?;
    let z = op.apply_adjoint(g).map_err(to_js)?;

    console_log!("WASM diffl_adj complete");
    Ok(z)
}

// ============================================================================
// WASM Exports: Regularization
// ============================================================================

/// Anisotropic total variation ||Tx||₁
#[wasm_bindgen]
pub fn total_variation_wasm(
    x: &[f64],
    shape: &[u32],
    dims: &[u32],
    edge: &str,
) -> Result<f64, JsValue> {
    let op = operator_from_js(shape, dims, edge, false).map_err(to_js)?;
    regularize::total_variation(&op, x).map_err(to_js)
}

/// Tikhonov smoothing: solves (I + λ TᵀT) x = y with CG
///
/// # Arguments
/// * `y` - Noisy image (prod(shape)), column-major
/// * `shape` - Image dimensions
/// * `dims` - Axes of the difference penalty
/// * `edge` - "zero" or "circ"
/// * `lambda` - Regularization weight
/// * `tol` - CG relative tolerance
/// * `max_iter` - Maximum CG iterations
#[wasm_bindgen]
pub fn tikhonov_smooth_wasm(
    y: &[f64],
    shape: &[u32],
    dims: &[u32],
    edge: &str,
    lambda: f64,
    tol: f64,
    max_iter: usize,
) -> Result<Vec<f64>, JsValue> {
    console_log!("WASM Tikhonov smooth: shape={:?}, dims={:?}, lambda={:.4}, max_iter={}",
                 shape, dims, lambda, max_iter);

    let op = operator_from_js(shape, dims, edge, false).map_err(to_js)?;
    let out = regularize::tikhonov_smooth(y, &op, lambda, tol, max_iter).map_err(to_js)?;

    console_log!("WASM Tikhonov smooth complete: {} iterations, residual={:.3e}",
                 out.iterations, out.residual_norm);
    Ok(out.x)
}

/// Tikhonov smoothing with progress callback
#[wasm_bindgen]
pub fn tikhonov_smooth_wasm_with_progress(
    y: &[f64],
    shape: &[u32],
    dims: &[u32],
    edge: &str,
    lambda: f64,
    tol: f64,
    max_iter: usize,
    progress_callback: &js_sys::Function,
) -> Result<Vec<f64>, JsValue> {
    console_log!("WASM Tikhonov smooth with progress: shape={:?}, lambda={:.4}, max_iter={}",
                 shape, lambda, max_iter);

    let op = operator_from_js(shape, dims, edge, false).map_err(to_js)?;
    let callback = progress_callback.clone();
    let out = regularize::tikhonov_smooth_with_progress(
        y, &op, lambda, tol, max_iter,
        |current, total| {
            let this = JsValue::null();
            let _ = callback.call2(&this,
                &JsValue::from(current as u32),
                &JsValue::from(total as u32));
        }
    ).map_err(to_js)?;

    console_log!("WASM Tikhonov smooth complete");
    Ok(out.x)
}

// ============================================================================
// WASM Exports: Utilities
// ============================================================================

/// Check if WASM module is loaded and working
#[wasm_bindgen]
pub fn wasm_health_check() -> bool {
    console_log!("DIFFL-WASM module loaded successfully!");
    true
}

/// Get version string
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// ============================================================================
// Tests
// ============================================================================
