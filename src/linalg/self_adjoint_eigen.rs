use alloc::vec::Vec;

use num_traits::{Float, One, Zero};

use crate::linalg::{
    ensure_len, ensure_square, tridiagonal_qr_step, tridiagonalize_in_place, Cholesky, LinalgError,
};
use crate::matrix::stable_norm;
use crate::traits::LinalgScalar;
use crate::Matrix;

/// QR steps allowed per unit of matrix dimension.
pub const DEFAULT_SWEEPS_PER_ROW: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Empty,
    Values,
    ValuesAndVectors,
}

/// Eigendecomposition of a real symmetric or complex Hermitian matrix.
///
/// Reduces the matrix to real tridiagonal form with Householder reflections,
/// then diagonalizes it with implicit Wilkinson-shifted QR steps. Eigenvalues
/// are real and sorted ascending; eigenvector `j` is column `j` of
/// [`eigenvectors`](Self::eigenvectors).
///
/// Only the lower triangle of the input is read.
///
/// The eigenvector matrix doubles as the working buffer: during `compute` it
/// first holds the scaled input, then the Householder vectors, then `Q`, and
/// finally the rotated and sorted eigenvectors. Its contents are meaningful
/// only after `compute` returns `Ok`.
///
/// # Example
///
/// ```
/// use linkern::Matrix;
/// use linkern::linalg::SelfAdjointEigenSolver;
///
/// let a = Matrix::from_rows(2, 2, &[2.0_f64, 1.0, 1.0, 2.0]);
/// let eig = SelfAdjointEigenSolver::new(&a, true).unwrap();
/// assert!((eig.eigenvalues()[0] - 1.0).abs() < 1e-12);
/// assert!((eig.eigenvalues()[1] - 3.0).abs() < 1e-12);
///
/// let v = eig.eigenvectors().unwrap();
/// assert!((v[(0, 1)].abs() - 0.5_f64.sqrt()).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SelfAdjointEigenSolver<T: LinalgScalar> {
    eivec: Matrix<T>,
    eivalues: Vec<T::Real>,
    subdiag: Vec<T::Real>,
    hcoeffs: Vec<T>,
    max_sweeps: Option<usize>,
    iterations: usize,
    state: State,
}

impl<T: LinalgScalar> SelfAdjointEigenSolver<T> {
    /// Solver with buffers pre-allocated for `n x n` problems.
    pub fn with_size(n: usize) -> Self {
        Self {
            eivec: Matrix::zeros(n, n),
            eivalues: Vec::with_capacity(n),
            subdiag: Vec::with_capacity(n.saturating_sub(1)),
            hcoeffs: Vec::with_capacity(n.saturating_sub(1)),
            max_sweeps: None,
            iterations: 0,
            state: State::Empty,
        }
    }

    /// Decompose `a`.
    pub fn new(a: &Matrix<T>, compute_eigenvectors: bool) -> Result<Self, LinalgError> {
        let mut solver = Self::with_size(a.nrows());
        solver.compute(a, compute_eigenvectors)?;
        Ok(solver)
    }

    /// Solve the generalized problem `A·x = λ·B·x` with `B` positive definite.
    pub fn new_generalized(
        a: &Matrix<T>,
        b: &Matrix<T>,
        compute_eigenvectors: bool,
    ) -> Result<Self, LinalgError> {
        let mut solver = Self::with_size(a.nrows());
        solver.compute_generalized(a, b, compute_eigenvectors)?;
        Ok(solver)
    }

    /// Cap the number of QR steps per `compute`. Defaults to `30·n`.
    pub fn set_max_sweeps(&mut self, sweeps: usize) -> &mut Self {
        self.max_sweeps = Some(sweeps);
        self
    }

    /// The QR step budget for an `n x n` problem.
    pub fn max_sweeps(&self, n: usize) -> usize {
        self.max_sweeps.unwrap_or(DEFAULT_SWEEPS_PER_ROW * n)
    }

    /// QR steps taken by the last `compute`.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Eigenvalues in ascending order. Empty until a `compute` succeeds.
    pub fn eigenvalues(&self) -> &[T::Real] {
        match self.state {
            State::Empty => &[],
            _ => &self.eivalues,
        }
    }

    /// Orthonormal eigenvectors, one per column, in eigenvalue order.
    pub fn eigenvectors(&self) -> Result<&Matrix<T>, LinalgError> {
        match self.state {
            State::Empty => Err(LinalgError::NotFactored),
            State::Values => Err(LinalgError::EigenvectorsNotComputed),
            State::ValuesAndVectors => Ok(&self.eivec),
        }
    }

    /// Decompose `a`, replacing any earlier result.
    ///
    /// The buffers are reused when the size matches. On `Err` the solver is
    /// left empty.
    pub fn compute(&mut self, a: &Matrix<T>, compute_eigenvectors: bool) -> Result<(), LinalgError> {
        let n = a.nrows();
        ensure_square(n, a.ncols())?;
        self.state = State::Empty;
        self.resize(n);

        if n <= 1 {
            if n == 1 {
                self.eivalues[0] = a[(0, 0)].re();
                self.eivec[(0, 0)] = T::one();
            }
            self.iterations = 0;
            self.state = finished(compute_eigenvectors);
            return Ok(());
        }

        // Work on A / max|a_ij| so the reduction neither overflows nor underflows.
        let mut scale = a.max_abs();
        if scale == <T::Real as Zero>::zero() {
            scale = <T::Real as One>::one();
        }
        let inv = T::from_real(<T::Real as One>::one() / scale);
        for (dst, &src) in self.eivec.as_mut_slice().iter_mut().zip(a.as_slice()) {
            *dst = src * inv;
        }

        tridiagonalize_in_place(
            &mut self.eivec,
            &mut self.eivalues,
            &mut self.subdiag,
            &mut self.hcoeffs,
            compute_eigenvectors,
        )?;

        self.finish_from_tridiagonal(compute_eigenvectors)?;
        for l in self.eivalues.iter_mut() {
            *l = *l * scale;
        }
        log::debug!(
            "self-adjoint eigen: n={}, {} QR steps, vectors={}",
            n,
            self.iterations,
            compute_eigenvectors
        );
        Ok(())
    }

    /// Diagonalize the real symmetric tridiagonal matrix given by `diag` and
    /// `subdiag`. Eigenvectors are expressed in the standard basis.
    pub fn compute_from_tridiagonal(
        &mut self,
        diag: &[T::Real],
        subdiag: &[T::Real],
        compute_eigenvectors: bool,
    ) -> Result<(), LinalgError> {
        let n = diag.len();
        ensure_len(n.saturating_sub(1), subdiag.len())?;
        self.state = State::Empty;
        self.resize(n);
        self.eivalues.copy_from_slice(diag);
        self.subdiag.copy_from_slice(subdiag);
        if compute_eigenvectors {
            self.eivec = Matrix::eye(n);
        }
        self.finish_from_tridiagonal(compute_eigenvectors)
    }

    /// Solve `A·x = λ·B·x` for Hermitian `A` and Hermitian positive-definite `B`.
    ///
    /// With `B = L·Lᴴ`, the standard problem for `C = L⁻¹·A·L⁻ᴴ` has the same
    /// eigenvalues; its eigenvectors map back through `L⁻ᴴ` and are then
    /// rescaled to unit length. They are `B`-orthogonal rather than orthonormal.
    pub fn compute_generalized(
        &mut self,
        a: &Matrix<T>,
        b: &Matrix<T>,
        compute_eigenvectors: bool,
    ) -> Result<(), LinalgError> {
        let n = a.nrows();
        ensure_square(n, a.ncols())?;
        ensure_square(b.nrows(), b.ncols())?;
        ensure_len(n, b.nrows())?;
        self.state = State::Empty;

        let chol = Cholesky::new(b)?;

        let mut c = Matrix::from_fn(n, n, |i, j| if i >= j { a[(i, j)] } else { a[(j, i)].conj() });
        chol.solve_lower_in_place(&mut c)?;
        c.adjoint_in_place();
        chol.solve_lower_in_place(&mut c)?;
        c.adjoint_in_place();

        self.compute(&c, compute_eigenvectors)?;

        if compute_eigenvectors {
            chol.solve_lower_adjoint_in_place(&mut self.eivec)?;
            for j in 0..n {
                let norm = stable_norm(self.eivec.col_slice(j));
                if norm > <T::Real as Zero>::zero() {
                    let inv = T::from_real(<T::Real as One>::one() / norm);
                    for x in self.eivec.col_slice_mut(j) {
                        *x = *x * inv;
                    }
                }
            }
        }
        Ok(())
    }

    /// `A^{1/2} = V·Λ^{1/2}·Vᴴ`.
    ///
    /// Meaningful only for positive semi-definite input; negative eigenvalues
    /// produce NaN entries.
    pub fn operator_sqrt(&self) -> Result<Matrix<T>, LinalgError> {
        self.spectral_map(|l| Float::sqrt(l))
    }

    /// `A^{-1/2} = V·Λ^{-1/2}·Vᴴ`.
    ///
    /// Meaningful only for positive-definite input.
    pub fn operator_inverse_sqrt(&self) -> Result<Matrix<T>, LinalgError> {
        self.spectral_map(|l| <T::Real as One>::one() / Float::sqrt(l))
    }

    fn spectral_map(&self, f: impl Fn(T::Real) -> T::Real) -> Result<Matrix<T>, LinalgError> {
        let v = self.eigenvectors()?;
        let mut scaled = v.clone();
        for (j, &l) in self.eivalues.iter().enumerate() {
            let fl = T::from_real(f(l));
            for x in scaled.col_slice_mut(j) {
                *x = *x * fl;
            }
        }
        Ok(&scaled * &v.adjoint())
    }

    fn resize(&mut self, n: usize) {
        let m = n.saturating_sub(1);
        let zero = <T::Real as Zero>::zero();
        self.eivalues.clear();
        self.eivalues.resize(n, zero);
        self.subdiag.clear();
        self.subdiag.resize(m, zero);
        self.hcoeffs.clear();
        self.hcoeffs.resize(m, T::zero());
        self.eivec.resize(n, n, T::zero());
    }

    /// QR iteration on `(eivalues, subdiag)`, then the ascending sort.
    fn finish_from_tridiagonal(&mut self, compute_eigenvectors: bool) -> Result<(), LinalgError> {
        let n = self.eivalues.len();
        let max_sweeps = self.max_sweeps(n);
        let q = if compute_eigenvectors { Some(&mut self.eivec) } else { None };
        self.iterations = qr_iterate(&mut self.eivalues, &mut self.subdiag, max_sweeps, q)?;

        for i in 0..n.saturating_sub(1) {
            let mut k = i;
            for j in (i + 1)..n {
                if self.eivalues[j] < self.eivalues[k] {
                    k = j;
                }
            }
            if k != i {
                self.eivalues.swap(i, k);
                if compute_eigenvectors {
                    self.eivec.swap_columns(i, k);
                }
            }
        }

        self.state = finished(compute_eigenvectors);
        Ok(())
    }
}

fn finished(compute_eigenvectors: bool) -> State {
    if compute_eigenvectors {
        State::ValuesAndVectors
    } else {
        State::Values
    }
}

/// Deflate and step until the tridiagonal matrix is diagonal.
///
/// Returns the number of QR steps taken.
fn qr_iterate<T: LinalgScalar>(
    diag: &mut [T::Real],
    subdiag: &mut [T::Real],
    max_sweeps: usize,
    mut q: Option<&mut Matrix<T>>,
) -> Result<usize, LinalgError> {
    let n = diag.len();
    if n < 2 {
        return Ok(0);
    }
    let zero = <T::Real as Zero>::zero();
    let eps = T::lepsilon();
    let tiny = <T::Real as Float>::min_positive_value();

    let mut end = n - 1;
    let mut start = 0;
    let mut iter = 0;
    while end > 0 {
        for i in start..end {
            let e = Float::abs(subdiag[i]);
            if e < tiny || e <= eps * (Float::abs(diag[i]) + Float::abs(diag[i + 1])) {
                subdiag[i] = zero;
            }
        }

        while end > 0 && subdiag[end - 1] == zero {
            end -= 1;
        }
        if end == 0 {
            break;
        }

        iter += 1;
        if iter > max_sweeps {
            log::debug!("self-adjoint eigen: no convergence after {} QR steps", max_sweeps);
            return Err(LinalgError::ConvergenceFailure);
        }

        start = end - 1;
        while start > 0 && subdiag[start - 1] != zero {
            start -= 1;
        }

        log::trace!("QR step {} on block {}..={}", iter, start, end);
        tridiagonal_qr_step(diag, subdiag, start, end, q.as_deref_mut());
    }
    Ok(iter)
}

// ── Matrix conveniences ─────────────────────────────────────────────

impl<T: LinalgScalar> Matrix<T> {
    /// Eigendecomposition of a self-adjoint matrix (lower triangle read).
    ///
    /// ```
    /// use linkern::Matrix;
    /// let a = Matrix::from_rows(2, 2, &[4.0_f64, 1.0, 1.0, 3.0]);
    /// let eig = a.eig_self_adjoint().unwrap();
    /// assert!(eig.eigenvalues()[0] < eig.eigenvalues()[1]);
    /// ```
    pub fn eig_self_adjoint(&self) -> Result<SelfAdjointEigenSolver<T>, LinalgError> {
        SelfAdjointEigenSolver::new(self, true)
    }

    /// Eigenvalues of a self-adjoint matrix, ascending.
    pub fn eigenvalues_self_adjoint(&self) -> Result<Vec<T::Real>, LinalgError> {
        let eig = SelfAdjointEigenSolver::new(self, false)?;
        Ok(eig.eigenvalues().to_vec())
    }

    /// Spectral norm of a self-adjoint matrix: `max |λ|`.
    pub fn operator_norm_self_adjoint(&self) -> Result<T::Real, LinalgError> {
        let values = self.eigenvalues_self_adjoint()?;
        Ok(values
            .iter()
            .fold(<T::Real as Zero>::zero(), |m, &l| Float::max(m, Float::abs(l))))
    }

    /// Spectral norm `‖A‖₂ = sqrt(λ_max(A·Aᴴ))` of any matrix.
    pub fn operator_norm(&self) -> Result<T::Real, LinalgError> {
        let gram = self * &self.adjoint();
        let values = gram.eigenvalues_self_adjoint()?;
        let top = values.last().copied().unwrap_or_else(<T::Real as Zero>::zero);
        Ok(Float::sqrt(Float::max(top, <T::Real as Zero>::zero())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {} (diff {})", msg, a, b, (a - b).abs());
    }

    fn sym3() -> Matrix<f64> {
        Matrix::from_rows(3, 3, &[2.0, -1.0, 0.0, -1.0, 2.0, -1.0, 0.0, -1.0, 2.0])
    }

    fn reconstruct(eig: &SelfAdjointEigenSolver<f64>) -> Matrix<f64> {
        let v = eig.eigenvectors().unwrap();
        let l = Matrix::from_diagonal(eig.eigenvalues());
        &(v * &l) * &v.transpose()
    }

    #[test]
    fn known_3x3() {
        let a = sym3();
        let eig = SelfAdjointEigenSolver::new(&a, true).unwrap();
        let s2 = 2.0_f64.sqrt();
        let expected = [2.0 - s2, 2.0, 2.0 + s2];
        for (i, &e) in expected.iter().enumerate() {
            assert_near(eig.eigenvalues()[i], e, TOL, "eigenvalue");
        }
        let r = reconstruct(&eig);
        for i in 0..3 {
            for j in 0..3 {
                assert_near(r[(i, j)], a[(i, j)], TOL, "V Λ Vᵀ");
            }
        }
    }

    #[test]
    fn orthonormal_vectors() {
        let a = Matrix::from_rows(
            4,
            4,
            &[4.0, 1.0, -2.0, 2.0, 1.0, 2.0, 0.0, 1.0, -2.0, 0.0, 3.0, -2.0, 2.0, 1.0, -2.0, -1.0],
        );
        let eig = a.eig_self_adjoint().unwrap();
        let v = eig.eigenvectors().unwrap();
        let vtv = &v.transpose() * v;
        for i in 0..4 {
            for j in 0..4 {
                assert_near(vtv[(i, j)], if i == j { 1.0 } else { 0.0 }, TOL, "VᵀV");
            }
        }
        assert!(eig.eigenvalues().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn diagonal_input_needs_no_steps() {
        let a = Matrix::from_diagonal(&[3.0, -1.0, 2.0]);
        let eig = SelfAdjointEigenSolver::new(&a, true).unwrap();
        assert_eq!(eig.iterations(), 0);
        for (i, &e) in [-1.0, 2.0, 3.0].iter().enumerate() {
            assert_near(eig.eigenvalues()[i], e, 1e-15, "eigenvalue");
        }
        let v = eig.eigenvectors().unwrap();
        assert_eq!(v[(1, 0)].abs(), 1.0);
    }

    #[test]
    fn size_one_and_zero() {
        let a = Matrix::from_rows(1, 1, &[-7.5]);
        let eig = SelfAdjointEigenSolver::new(&a, true).unwrap();
        assert_eq!(eig.eigenvalues(), &[-7.5]);
        assert_eq!(eig.eigenvectors().unwrap()[(0, 0)], 1.0);

        let empty = Matrix::<f64>::zeros(0, 0);
        let eig = SelfAdjointEigenSolver::new(&empty, true).unwrap();
        assert!(eig.eigenvalues().is_empty());
        assert_eq!(eig.eigenvectors().unwrap().nrows(), 0);
    }

    #[test]
    fn precondition_errors() {
        let a = Matrix::<f64>::zeros(2, 3);
        assert_eq!(
            SelfAdjointEigenSolver::new(&a, true).unwrap_err(),
            LinalgError::NotSquare { rows: 2, cols: 3 }
        );

        let eig = SelfAdjointEigenSolver::new(&sym3(), false).unwrap();
        assert_eq!(eig.eigenvectors().unwrap_err(), LinalgError::EigenvectorsNotComputed);
        assert_eq!(eig.eigenvalues().len(), 3);
        assert_eq!(eig.operator_sqrt().unwrap_err(), LinalgError::EigenvectorsNotComputed);

        let fresh = SelfAdjointEigenSolver::<f64>::with_size(3);
        assert!(fresh.eigenvalues().is_empty());
        assert_eq!(fresh.eigenvectors().unwrap_err(), LinalgError::NotFactored);
    }

    #[test]
    fn sweep_budget_is_enforced() {
        let mut eig = SelfAdjointEigenSolver::with_size(3);
        eig.set_max_sweeps(0);
        assert_eq!(eig.compute(&sym3(), true), Err(LinalgError::ConvergenceFailure));
        assert!(eig.eigenvalues().is_empty());

        eig.set_max_sweeps(90);
        eig.compute(&sym3(), true).unwrap();
        assert!(eig.iterations() > 0);
    }

    #[test]
    fn reuse_resizes_buffers() {
        let mut eig = SelfAdjointEigenSolver::with_size(3);
        eig.compute(&sym3(), true).unwrap();
        let a2 = Matrix::from_rows(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        eig.compute(&a2, true).unwrap();
        assert_eq!(eig.eigenvalues().len(), 2);
        assert_near(eig.eigenvalues()[0], 1.0, TOL, "λ0");
        assert_eq!(eig.eigenvectors().unwrap().ncols(), 2);
    }

    #[test]
    fn operator_sqrt_squares_back() {
        let a = Matrix::from_rows(3, 3, &[4.0, 1.0, 0.5, 1.0, 3.0, 0.2, 0.5, 0.2, 2.0]);
        let eig = a.eig_self_adjoint().unwrap();
        let s = eig.operator_sqrt().unwrap();
        let s2 = &s * &s;
        let is = eig.operator_inverse_sqrt().unwrap();
        let id = &(&is * &a) * &is;
        for i in 0..3 {
            for j in 0..3 {
                assert_near(s2[(i, j)], a[(i, j)], TOL, "sqrt²");
                assert_near(id[(i, j)], if i == j { 1.0 } else { 0.0 }, TOL, "A^-½ A A^-½");
            }
        }
    }

    #[test]
    fn generalized_satisfies_pencil() {
        let a = sym3();
        let b = Matrix::from_rows(3, 3, &[4.0, 1.0, 0.0, 1.0, 3.0, 0.5, 0.0, 0.5, 2.0]);
        let eig = SelfAdjointEigenSolver::new_generalized(&a, &b, true).unwrap();
        let v = eig.eigenvectors().unwrap();
        let av = &a * v;
        let bv = &b * v;
        for j in 0..3 {
            let l = eig.eigenvalues()[j];
            let mut norm = 0.0;
            for i in 0..3 {
                assert_near(av[(i, j)], l * bv[(i, j)], TOL, "A v = λ B v");
                norm += v[(i, j)] * v[(i, j)];
            }
            assert_near(norm, 1.0, TOL, "unit column");
        }
    }

    #[test]
    fn generalized_size_one_and_singular_b() {
        let a = Matrix::from_rows(1, 1, &[6.0]);
        let b = Matrix::from_rows(1, 1, &[2.0]);
        let eig = SelfAdjointEigenSolver::new_generalized(&a, &b, true).unwrap();
        assert_near(eig.eigenvalues()[0], 3.0, TOL, "λ");
        assert_near(eig.eigenvectors().unwrap()[(0, 0)], 1.0, TOL, "v");

        let singular = Matrix::from_rows(1, 1, &[0.0]);
        assert_eq!(
            SelfAdjointEigenSolver::new_generalized(&a, &singular, true).unwrap_err(),
            LinalgError::NotPositiveDefinite
        );
    }

    #[test]
    fn from_tridiagonal() {
        let mut eig = SelfAdjointEigenSolver::<f64>::with_size(3);
        eig.compute_from_tridiagonal(&[2.0, 2.0, 2.0], &[-1.0, -1.0], true).unwrap();
        let direct = SelfAdjointEigenSolver::new(&sym3(), false).unwrap();
        for i in 0..3 {
            assert_near(eig.eigenvalues()[i], direct.eigenvalues()[i], TOL, "λ");
        }
        let r = reconstruct(&eig);
        assert_near(r[(1, 0)], -1.0, TOL, "T[1,0]");
    }

    #[test]
    fn operator_norms() {
        let a = Matrix::from_rows(2, 2, &[-5.0, 0.0, 0.0, 2.0]);
        assert_near(a.operator_norm_self_adjoint().unwrap(), 5.0, TOL, "self-adjoint");
        let b = Matrix::from_rows(2, 3, &[3.0, 0.0, 0.0, 0.0, 4.0, 0.0]);
        assert_near(b.operator_norm().unwrap(), 4.0, TOL, "general");
    }

    #[test]
    fn f32_support() {
        let a = Matrix::from_rows(2, 2, &[2.0_f32, 1.0, 1.0, 2.0]);
        let vals = a.eigenvalues_self_adjoint().unwrap();
        assert!((vals[0] - 1.0).abs() < 1e-5);
        assert!((vals[1] - 3.0).abs() < 1e-5);
    }
}
