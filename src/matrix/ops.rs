use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use crate::traits::Scalar;

use super::{Matrix, Vector};

// ── Element-wise addition / subtraction ─────────────────────────────

fn zip_with<T: Scalar>(a: &Matrix<T>, b: &Matrix<T>, op: &str, f: impl Fn(T, T) -> T) -> Matrix<T> {
    assert_eq!(
        (a.nrows(), a.ncols()),
        (b.nrows(), b.ncols()),
        "dimension mismatch: {}x{} {} {}x{}",
        a.nrows(), a.ncols(), op, b.nrows(), b.ncols(),
    );
    let data = a
        .as_slice()
        .iter()
        .zip(b.as_slice().iter())
        .map(|(&x, &y)| f(x, y))
        .collect();
    Matrix::from_vec(a.nrows(), a.ncols(), data)
}

impl<T: Scalar> Add<&Matrix<T>> for &Matrix<T> {
    type Output = Matrix<T>;

    fn add(self, rhs: &Matrix<T>) -> Matrix<T> {
        zip_with(self, rhs, "+", |a, b| a + b)
    }
}

impl<T: Scalar> Add for Matrix<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        &self + &rhs
    }
}

impl<T: Scalar> Sub<&Matrix<T>> for &Matrix<T> {
    type Output = Matrix<T>;

    fn sub(self, rhs: &Matrix<T>) -> Matrix<T> {
        zip_with(self, rhs, "-", |a, b| a - b)
    }
}

impl<T: Scalar> Sub for Matrix<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        &self - &rhs
    }
}

impl<T: Scalar> AddAssign<&Matrix<T>> for Matrix<T> {
    fn add_assign(&mut self, rhs: &Matrix<T>) {
        assert_eq!((self.nrows(), self.ncols()), (rhs.nrows(), rhs.ncols()), "dimension mismatch");
        for (a, &b) in self.as_mut_slice().iter_mut().zip(rhs.as_slice().iter()) {
            *a = *a + b;
        }
    }
}

impl<T: Scalar> SubAssign<&Matrix<T>> for Matrix<T> {
    fn sub_assign(&mut self, rhs: &Matrix<T>) {
        assert_eq!((self.nrows(), self.ncols()), (rhs.nrows(), rhs.ncols()), "dimension mismatch");
        for (a, &b) in self.as_mut_slice().iter_mut().zip(rhs.as_slice().iter()) {
            *a = *a - b;
        }
    }
}

impl<T: Scalar> Neg for &Matrix<T> {
    type Output = Matrix<T>;

    fn neg(self) -> Matrix<T> {
        let data = self.as_slice().iter().map(|&x| T::zero() - x).collect();
        Matrix::from_vec(self.nrows(), self.ncols(), data)
    }
}

// ── Scalar multiply / divide ────────────────────────────────────────

impl<T: Scalar> Mul<T> for &Matrix<T> {
    type Output = Matrix<T>;

    fn mul(self, rhs: T) -> Matrix<T> {
        let data = self.as_slice().iter().map(|&x| x * rhs).collect();
        Matrix::from_vec(self.nrows(), self.ncols(), data)
    }
}

impl<T: Scalar> Div<T> for &Matrix<T> {
    type Output = Matrix<T>;

    fn div(self, rhs: T) -> Matrix<T> {
        let data = self.as_slice().iter().map(|&x| x / rhs).collect();
        Matrix::from_vec(self.nrows(), self.ncols(), data)
    }
}

// ── Matrix multiply ─────────────────────────────────────────────────

impl<T: Scalar> Mul<&Matrix<T>> for &Matrix<T> {
    type Output = Matrix<T>;

    /// `(M×K) · (K×N) → (M×N)`, accumulated column by column.
    fn mul(self, rhs: &Matrix<T>) -> Matrix<T> {
        assert_eq!(
            self.ncols(),
            rhs.nrows(),
            "dimension mismatch: {}x{} * {}x{}",
            self.nrows(), self.ncols(), rhs.nrows(), rhs.ncols(),
        );
        let m = self.nrows();
        let mut out = Matrix::zeros(m, rhs.ncols());
        for j in 0..rhs.ncols() {
            let dst = out.col_slice_mut(j);
            for k in 0..self.ncols() {
                let b = rhs[(k, j)];
                if b == T::zero() {
                    continue;
                }
                for (d, &a) in dst.iter_mut().zip(self.col_slice(k).iter()) {
                    *d = *d + a * b;
                }
            }
        }
        out
    }
}

impl<T: Scalar> Mul for Matrix<T> {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        &self * &rhs
    }
}

impl<T: Scalar> Mul<&Vector<T>> for &Matrix<T> {
    type Output = Vector<T>;

    fn mul(self, rhs: &Vector<T>) -> Vector<T> {
        assert_eq!(self.ncols(), rhs.len(), "dimension mismatch: matrix-vector product");
        let mut out = Vector::zeros(self.nrows());
        for k in 0..self.ncols() {
            let b = rhs[k];
            for (d, &a) in out.as_mut_slice().iter_mut().zip(self.col_slice(k).iter()) {
                *d = *d + a * b;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sub_neg() {
        let a = Matrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let b = Matrix::<f64>::eye(2);
        assert_eq!(&a + &b, Matrix::from_rows(2, 2, &[2.0, 2.0, 3.0, 5.0]));
        assert_eq!(a.clone() - b.clone(), Matrix::from_rows(2, 2, &[0.0, 2.0, 3.0, 3.0]));
        let mut c = a.clone();
        c += &b;
        c -= &b;
        assert_eq!(c, a);
        assert_eq!((-&a)[(1, 0)], -3.0);
    }

    #[test]
    fn scalar_ops() {
        let a = Matrix::from_rows(1, 2, &[2.0, 4.0]);
        assert_eq!((&a * 0.5).as_slice(), &[1.0, 2.0]);
        assert_eq!((&a / 2.0).as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn matmul_rectangular() {
        let a = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = Matrix::from_rows(3, 2, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
        let c = &a * &b;
        assert_eq!(c, Matrix::from_rows(2, 2, &[58.0, 64.0, 139.0, 154.0]));
        assert_eq!(a.clone() * Matrix::eye(3), a);
    }

    #[test]
    fn matvec() {
        let a = Matrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let v = Vector::from_slice(&[1.0, 1.0]);
        assert_eq!((&a * &v).as_slice(), &[3.0, 7.0]);
    }

    #[test]
    #[should_panic(expected = "dimension mismatch")]
    fn matmul_mismatch() {
        let a = Matrix::<f64>::zeros(2, 3);
        let _ = &a * &a;
    }
}
