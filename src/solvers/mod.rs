//! Iterative solvers
//!
//! - CG: Conjugate gradient, used for the normal equations of the
//!   difference-regularized problems in `regularize`

pub mod cg;

pub use cg::*;
