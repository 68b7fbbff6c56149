//! Trust-region building blocks for nonlinear least squares.
//!
//! - [`dogleg`]: one dogleg step from a packed QR factor (MINPACK).
//! - [`pack_upper_by_rows`]: packs an upper triangle into the layout
//!   [`dogleg`] reads.
//! - [`least_squares_dogleg`]: a trust-region driver around the dogleg step.
//!
//! Real scalars only ([`FloatScalar`]).

mod dogleg;
mod trust_region;

pub use dogleg::{dogleg, pack_upper_by_rows};
pub use trust_region::{least_squares_dogleg, DoglegSettings};

use crate::linalg::LinalgError;
use crate::traits::FloatScalar;
use crate::Vector;

/// Errors from optimization algorithms.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum OptimError {
    /// Maximum number of iterations exceeded.
    #[error("maximum iterations exceeded")]
    MaxIterations,
    /// A computed value was NaN or infinity.
    #[error("computed value is NaN or infinity")]
    NotFinite,
    /// A linear algebra kernel rejected its input.
    #[error("linear algebra failure: {0}")]
    Linalg(#[from] LinalgError),
}

/// Result of a nonlinear least-squares algorithm.
#[derive(Debug, Clone)]
pub struct LeastSquaresResult<T: FloatScalar> {
    /// Approximate minimizer of `0.5 * ||r(x)||^2`.
    pub x: Vector<T>,
    /// Final cost: `0.5 * ||r(x)||^2`.
    pub cost: T,
    /// Gradient norm: `||J^T r||` at the last Jacobian evaluation.
    pub grad_norm: T,
    /// Number of trial steps taken.
    pub iterations: usize,
    /// Number of residual evaluations.
    pub r_evals: usize,
    /// Number of Jacobian evaluations.
    pub j_evals: usize,
}
