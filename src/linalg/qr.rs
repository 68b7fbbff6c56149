use alloc::vec;
use alloc::vec::Vec;

use num_traits::Zero;

use crate::linalg::{ensure_len, LinalgError};
use crate::traits::{LinalgScalar, MatrixMut};
use crate::{Matrix, Vector};

/// QR decomposition in place using Householder reflections.
///
/// On return, `a` contains the packed QR factorization:
/// - Upper triangle (including diagonal): R
/// - Lower triangle (excluding diagonal): Householder vectors, scaled so
///   their implicit leading entry is 1
///
/// `tau` is filled with the Householder scalar factors (length N).
///
/// Works on rectangular matrices with M >= N. An exactly zero column gets
/// `tau = 0` (the reflection is the identity) and a zero on the diagonal of
/// R; callers that need a non-singular R check for it.
///
/// For complex matrices, uses `H = I - tau * v * v^H`.
pub fn qr_in_place<T: LinalgScalar>(
    a: &mut impl MatrixMut<T>,
    tau: &mut [T],
) -> Result<(), LinalgError> {
    let m = a.nrows();
    let n = a.ncols();
    if m < n {
        return Err(LinalgError::InvalidArgument("QR decomposition requires nrows >= ncols"));
    }
    ensure_len(n, tau.len())?;

    for col in 0..n {
        let mut norm_sq = <T::Real as Zero>::zero();
        for i in col..m {
            norm_sq = norm_sq + (*a.get(i, col)).modulus_sq();
        }

        if norm_sq == <T::Real as Zero>::zero() {
            tau[col] = T::zero();
            continue;
        }

        let norm = norm_sq.lsqrt();
        let a_col_col = *a.get(col, col);

        // sigma carries the phase of a[col,col] so that v0 = a + sigma never cancels.
        let alpha = a_col_col.modulus();
        let sigma = if alpha == <T::Real as Zero>::zero() {
            T::from_real(norm)
        } else {
            T::from_real(norm) * (a_col_col / T::from_real(alpha))
        };

        let v0 = a_col_col + sigma;
        let tau_val = v0 / sigma;
        tau[col] = tau_val;

        for i in (col + 1)..m {
            let val = *a.get(i, col) / v0;
            *a.get_mut(i, col) = val;
        }

        // A[col:m, col+1:n] -= tau * v * (v^H * A), with v[0] = 1 implicit.
        for j in (col + 1)..n {
            let mut dot = *a.get(col, j);
            for i in (col + 1)..m {
                dot = dot + (*a.get(i, col)).conj() * *a.get(i, j);
            }
            dot = dot * tau_val;

            *a.get_mut(col, j) = *a.get(col, j) - dot;
            for i in (col + 1)..m {
                let vi = *a.get(i, col);
                let old = *a.get(i, j);
                *a.get_mut(i, j) = old - dot * vi;
            }
        }

        *a.get_mut(col, col) = T::zero() - sigma;
    }

    Ok(())
}

/// Householder QR decomposition of an `M x N` matrix (M >= N).
///
/// # Example
///
/// ```
/// use linkern::{Matrix, Vector};
/// use linkern::linalg::Qr;
///
/// // Least-squares fit: y = c0 + c1*x to points (0,1), (1,2), (2,4)
/// let a = Matrix::from_rows(3, 2, &[1.0_f64, 0.0, 1.0, 1.0, 1.0, 2.0]);
/// let b = Vector::from_slice(&[1.0, 2.0, 4.0]);
/// let x = Qr::new(&a).unwrap().solve(&b).unwrap();
/// assert!((x[0] - 5.0 / 6.0).abs() < 1e-10);
/// assert!((x[1] - 3.0 / 2.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct Qr<T> {
    qr: Matrix<T>,
    tau: Vec<T>,
}

impl<T: LinalgScalar> Qr<T> {
    /// Decompose a matrix with at least as many rows as columns.
    pub fn new(a: &Matrix<T>) -> Result<Self, LinalgError> {
        let mut qr = a.clone();
        let mut tau = vec![T::zero(); a.ncols()];
        qr_in_place(&mut qr, &mut tau)?;
        Ok(Self { qr, tau })
    }

    /// Number of rows of the factored matrix.
    pub fn nrows(&self) -> usize {
        self.qr.nrows()
    }

    /// Number of columns of the factored matrix.
    pub fn ncols(&self) -> usize {
        self.qr.ncols()
    }

    /// The upper-triangular R factor (N x N).
    pub fn r(&self) -> Matrix<T> {
        let n = self.ncols();
        Matrix::from_fn(n, n, |i, j| if i <= j { self.qr[(i, j)] } else { T::zero() })
    }

    /// The thin Q factor (M x N) with orthonormal columns.
    ///
    /// Applies the reflections in reverse to the first N columns of the
    /// identity.
    pub fn q(&self) -> Matrix<T> {
        let (m, n) = (self.nrows(), self.ncols());
        let mut q = Matrix::zeros(m, n);
        for i in 0..n {
            q[(i, i)] = T::one();
        }

        for col in (0..n).rev() {
            let tau_val = self.tau[col];
            for j in col..n {
                let mut dot = q[(col, j)];
                for i in (col + 1)..m {
                    dot = dot + self.qr[(i, col)].conj() * q[(i, j)];
                }
                dot = dot * tau_val;

                q[(col, j)] = q[(col, j)] - dot;
                for i in (col + 1)..m {
                    q[(i, j)] = q[(i, j)] - dot * self.qr[(i, col)];
                }
            }
        }
        q
    }

    /// Overwrite `b` (length M) with `Qᴴ·b`.
    pub fn qt_mul_in_place(&self, b: &mut [T]) -> Result<(), LinalgError> {
        let m = self.nrows();
        ensure_len(m, b.len())?;
        for col in 0..self.ncols() {
            let tau_val = self.tau[col].conj();
            let mut dot = b[col];
            for i in (col + 1)..m {
                dot = dot + self.qr[(i, col)].conj() * b[i];
            }
            dot = dot * tau_val;

            b[col] = b[col] - dot;
            for i in (col + 1)..m {
                b[i] = b[i] - dot * self.qr[(i, col)];
            }
        }
        Ok(())
    }

    /// `Qᴴ·b` as a new vector of length M.
    pub fn qt_mul(&self, b: &Vector<T>) -> Result<Vector<T>, LinalgError> {
        let mut out = b.clone();
        self.qt_mul_in_place(out.as_mut_slice())?;
        Ok(out)
    }

    /// Least-squares solution of `min ‖A·x − b‖`.
    ///
    /// Returns `Singular` if R has an exactly zero diagonal entry.
    pub fn solve(&self, b: &Vector<T>) -> Result<Vector<T>, LinalgError> {
        let n = self.ncols();
        let qtb = self.qt_mul(b)?;

        let mut x = Vector::zeros(n);
        for i in (0..n).rev() {
            let rii = self.qr[(i, i)];
            if rii == T::zero() {
                return Err(LinalgError::Singular);
            }
            let mut sum = qtb[i];
            for j in (i + 1)..n {
                sum = sum - self.qr[(i, j)] * x[j];
            }
            x[i] = sum / rii;
        }
        Ok(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {} (diff {})", msg, a, b, (a - b).abs());
    }

    fn classic() -> Matrix<f64> {
        Matrix::from_rows(3, 3, &[12.0, -51.0, 4.0, 6.0, 167.0, -68.0, -4.0, 24.0, -41.0])
    }

    #[test]
    fn qr_square_3x3() {
        let a = classic();
        let qr = Qr::new(&a).unwrap();
        let prod = &qr.q() * &qr.r();
        for i in 0..3 {
            for j in 0..3 {
                assert_near(prod[(i, j)], a[(i, j)], TOL, "QR");
            }
        }
        assert_near(qr.r()[(0, 0)].abs(), 14.0, TOL, "R00");
        assert_eq!(qr.r()[(2, 0)], 0.0);
    }

    #[test]
    fn q_orthonormal_tall() {
        let a = Matrix::from_rows(4, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 9.0]);
        let q = Qr::new(&a).unwrap().q();
        let qtq = &q.transpose() * &q;
        for i in 0..2 {
            for j in 0..2 {
                assert_near(qtq[(i, j)], if i == j { 1.0 } else { 0.0 }, TOL, "QᵀQ");
            }
        }
    }

    #[test]
    fn qt_mul_matches_explicit_q() {
        let a = classic();
        let qr = Qr::new(&a).unwrap();
        let b = Vector::from_slice(&[1.0, -2.0, 0.5]);
        let qtb = qr.qt_mul(&b).unwrap();
        let expected = &qr.q().transpose() * &b;
        for i in 0..3 {
            assert_near(qtb[i], expected[i], TOL, "Qᵀb");
        }
    }

    #[test]
    fn zero_column_is_not_an_error() {
        let a = Matrix::from_rows(3, 2, &[1.0, 0.0, 2.0, 0.0, 3.0, 0.0]);
        let qr = Qr::new(&a).unwrap();
        assert_eq!(qr.r()[(1, 1)], 0.0);
        assert_eq!(
            qr.solve(&Vector::from_slice(&[1.0, 1.0, 1.0])).unwrap_err(),
            LinalgError::Singular
        );
    }

    #[test]
    fn wide_matrix_rejected() {
        let a = Matrix::<f64>::zeros(2, 3);
        assert!(matches!(Qr::new(&a), Err(LinalgError::InvalidArgument(_))));
    }
}
