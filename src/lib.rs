//! # linkern
//!
//! Dense linear-algebra kernels in pure Rust, `no_std + alloc` compatible:
//! a self-adjoint eigensolver, an in-place LU for skyline (profile) matrices
//! and the MINPACK dogleg trust-region step.
//!
//! ## Quick start
//!
//! ```
//! use linkern::Matrix;
//! use linkern::linalg::SelfAdjointEigenSolver;
//!
//! let a = Matrix::from_rows(2, 2, &[2.0_f64, 1.0, 1.0, 2.0]);
//! let eig = SelfAdjointEigenSolver::new(&a, true).unwrap();
//! assert!((eig.eigenvalues()[0] - 1.0).abs() < 1e-12);
//! assert!((eig.eigenvalues()[1] - 3.0).abs() < 1e-12);
//! ```
//!
//! ## Modules
//!
//! - [`matrix`]: Heap-allocated column-major `Matrix<T>` with runtime
//!   dimensions and a `Vector<T>` newtype. Arithmetic, indexing, blocks,
//!   transpose/adjoint, norms (including the overflow-safe [`matrix::stable_norm`])
//!   and min/max reductions.
//!
//! - [`linalg`]: Givens rotations, Cholesky (`A = LLᴴ`), Householder QR,
//!   Householder tridiagonalization and the [`linalg::SelfAdjointEigenSolver`]
//!   (implicit symmetric QR with Wilkinson shift, generalized problems via
//!   Cholesky, operator square roots). All errors are [`linalg::LinalgError`].
//!
//! - [`skyline`]: [`skyline::SkylineMatrix`] profile storage in row-major or
//!   column-major order and the [`skyline::SkylineInplaceLu`] factorization.
//!
//! - [`optim`]: The [`optim::dogleg`] step on a packed QR factor and a
//!   trust-region nonlinear least-squares driver built on it.
//!
//! - [`traits`]: Element trait hierarchy:
//!   - [`Scalar`]: all matrix elements (`Copy + PartialEq + Debug + Zero + One + Num`)
//!   - [`FloatScalar`]: real floats, used by the dogleg and anything that sorts
//!   - [`LinalgScalar`]: real floats and complex numbers, used by decompositions and norms
//!   - [`MatrixRef`] / [`MatrixMut`]: generic read/write access for algorithms
//!
//! ## Complex matrices
//!
//! Enable the `complex` feature to use Cholesky, QR and the eigensolver with
//! `Complex<f32>` / `Complex<f64>` Hermitian input. Eigenvalues stay real.
//!
//! ## Cargo features
//!
//! | Feature   | Default  | Description |
//! |-----------|----------|-------------|
//! | `std`     | yes      | Hardware FPU via system libm |
//! | `libm`    | baseline | Pure-Rust software float fallback |
//! | `complex` | no       | `Complex<f32>` / `Complex<f64>` support via `num-complex` |
//! | `all`     | no       | All features: `std` + `complex` |
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade; install
//! any logger to see them.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod linalg;
pub mod matrix;
pub mod optim;
pub mod skyline;
pub mod traits;

pub use matrix::{Matrix, Vector};
pub use traits::{FloatScalar, LinalgScalar, MatrixMut, MatrixRef, Scalar};

#[cfg(feature = "complex")]
pub use num_complex::Complex;
