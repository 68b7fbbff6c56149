use num_traits::{Float, Zero};

use crate::linalg::{ensure_len, ensure_square, LinalgError};
use crate::traits::{LinalgScalar, MatrixMut, MatrixRef};
use crate::{Matrix, Vector};

/// Cholesky decomposition in place: A = L * L^H.
///
/// For real matrices, L^H = L^T (standard Cholesky).
/// For complex matrices, this is the Hermitian Cholesky decomposition.
///
/// Only the lower triangle of `a` is read. On return it holds L (diagonal
/// included); the strict upper triangle is left unchanged.
///
/// Returns an error if the matrix is not (Hermitian) positive definite, in
/// which case the columns before the failing pivot have been overwritten.
pub fn cholesky_in_place<T: LinalgScalar>(a: &mut impl MatrixMut<T>) -> Result<(), LinalgError> {
    let n = a.nrows();
    ensure_square(n, a.ncols())?;

    for j in 0..n {
        for k in 0..j {
            let ljk_conj = (*a.get(j, k)).conj();
            for i in j..n {
                let aik = *a.get(i, k);
                let aij = a.get_mut(i, j);
                *aij = *aij - aik * ljk_conj;
            }
        }

        let diag = (*a.get(j, j)).re();
        if Float::is_nan(diag) || diag <= <T::Real as Zero>::zero() {
            log::trace!("cholesky: pivot {} is not positive", j);
            return Err(LinalgError::NotPositiveDefinite);
        }
        let ljj = T::from_real(Float::sqrt(diag));
        *a.get_mut(j, j) = ljj;

        let inv_ljj = T::one() / ljj;
        for x in a.col_as_mut_slice(j, j + 1).iter_mut() {
            *x = *x * inv_ljj;
        }
    }

    Ok(())
}

/// Solve L*x = b by forward substitution, where L is lower triangular.
pub fn forward_substitute<T: LinalgScalar>(l: &impl MatrixRef<T>, b: &[T], x: &mut [T]) {
    let n = l.nrows();
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum = sum - *l.get(i, j) * x[j];
        }
        x[i] = sum / *l.get(i, i);
    }
}

/// Solve L^H * x = b by back substitution, where L is lower triangular.
pub fn back_substitute_lt<T: LinalgScalar>(l: &impl MatrixRef<T>, b: &[T], x: &mut [T]) {
    let n = l.nrows();
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum = sum - (*l.get(j, i)).conj() * x[j];
        }
        x[i] = sum / (*l.get(i, i)).conj();
    }
}

/// Cholesky factorization `A = L·Lᴴ` of a Hermitian positive-definite matrix.
///
/// # Example
///
/// ```
/// use linkern::{Matrix, Vector};
/// use linkern::linalg::Cholesky;
///
/// let a = Matrix::from_rows(2, 2, &[4.0_f64, 2.0, 2.0, 3.0]);
/// let chol = Cholesky::new(&a).unwrap();
///
/// let x = chol.solve(&Vector::from_slice(&[8.0, 7.0])).unwrap();
/// assert!((4.0 * x[0] + 2.0 * x[1] - 8.0).abs() < 1e-12);
/// assert!((chol.det() - 8.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Cholesky<T> {
    /// Lower triangle holds L; the strict upper triangle is stale input.
    l: Matrix<T>,
}

impl<T: LinalgScalar> Cholesky<T> {
    /// Factor a (Hermitian) positive-definite matrix.
    pub fn new(a: &Matrix<T>) -> Result<Self, LinalgError> {
        let mut l = a.clone();
        cholesky_in_place(&mut l)?;
        Ok(Self { l })
    }

    /// Dimension of the factored matrix.
    pub fn size(&self) -> usize {
        self.l.nrows()
    }

    /// The lower triangular factor L, zeros above the diagonal.
    pub fn matrix_l(&self) -> Matrix<T> {
        let n = self.size();
        Matrix::from_fn(n, n, |i, j| if i >= j { self.l[(i, j)] } else { T::zero() })
    }

    /// The upper triangular factor `U = Lᴴ`.
    pub fn matrix_u(&self) -> Matrix<T> {
        let n = self.size();
        Matrix::from_fn(n, n, |i, j| if i <= j { self.l[(j, i)].conj() } else { T::zero() })
    }

    /// Solve `A·x = b`.
    pub fn solve(&self, b: &Vector<T>) -> Result<Vector<T>, LinalgError> {
        ensure_len(self.size(), b.len())?;
        let mut y = Vector::zeros(b.len());
        let mut x = Vector::zeros(b.len());
        forward_substitute(&self.l, b.as_slice(), y.as_mut_slice());
        back_substitute_lt(&self.l, y.as_slice(), x.as_mut_slice());
        Ok(x)
    }

    /// Overwrite `B` with `A⁻¹·B`, column by column.
    pub fn solve_in_place(&self, b: &mut Matrix<T>) -> Result<(), LinalgError> {
        self.solve_lower_in_place(b)?;
        self.solve_lower_adjoint_in_place(b)
    }

    /// Overwrite `B` with `L⁻¹·B`.
    pub fn solve_lower_in_place(&self, b: &mut Matrix<T>) -> Result<(), LinalgError> {
        let n = self.size();
        ensure_len(n, b.nrows())?;
        for c in 0..b.ncols() {
            let col = b.col_slice_mut(c);
            for i in 0..n {
                let mut sum = col[i];
                for j in 0..i {
                    sum = sum - self.l[(i, j)] * col[j];
                }
                col[i] = sum / self.l[(i, i)];
            }
        }
        Ok(())
    }

    /// Overwrite `B` with `L⁻ᴴ·B`.
    pub fn solve_lower_adjoint_in_place(&self, b: &mut Matrix<T>) -> Result<(), LinalgError> {
        let n = self.size();
        ensure_len(n, b.nrows())?;
        for c in 0..b.ncols() {
            let col = b.col_slice_mut(c);
            for i in (0..n).rev() {
                let mut sum = col[i];
                for j in (i + 1)..n {
                    sum = sum - self.l[(j, i)].conj() * col[j];
                }
                col[i] = sum / self.l[(i, i)].conj();
            }
        }
        Ok(())
    }

    /// Determinant: `det(A) = (Π L[i,i])²`.
    pub fn det(&self) -> T::Real {
        let mut prod = <T::Real as num_traits::One>::one();
        for i in 0..self.size() {
            prod = prod * self.l[(i, i)].re();
        }
        prod * prod
    }

    /// Log-determinant: `ln(det(A)) = 2·Σ ln(L[i,i])`.
    ///
    /// Stays finite where `det()` would overflow.
    pub fn ln_det(&self) -> T::Real {
        let mut sum = <T::Real as Zero>::zero();
        for i in 0..self.size() {
            sum = sum + Float::ln(self.l[(i, i)].re());
        }
        sum + sum
    }

    /// `A⁻¹` from the factorization.
    pub fn inverse(&self) -> Matrix<T> {
        let mut inv = Matrix::eye(self.size());
        // Both solves only fail on a size mismatch, which eye(n) rules out.
        let _ = self.solve_in_place(&mut inv);
        inv
    }
}
