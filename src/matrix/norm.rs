use num_traits::{Float, One, Zero};

use crate::traits::{FloatScalar, LinalgScalar, Scalar};

use super::vector::{reduce_by, Vector};
use super::Matrix;

/// Overflow-safe Euclidean norm of a slice.
///
/// Keeps a running `scale` (largest modulus seen) and a sum of squares
/// relative to it, so `‖x‖ = scale·sqrt(ssq)` never squares a huge or tiny
/// value directly. Returns zero for an empty slice.
///
/// ```
/// use linkern::matrix::stable_norm;
/// let big = 1e200_f64;
/// let n = stable_norm(&[big, big]);
/// assert!((n / big - 2.0_f64.sqrt()).abs() < 1e-12);
/// ```
pub fn stable_norm<T: LinalgScalar>(v: &[T]) -> T::Real {
    let zero = T::Real::zero();
    let one = T::Real::one();
    let mut scale = zero;
    let mut ssq = one;
    for &x in v {
        let a = x.modulus();
        if a == zero {
            continue;
        }
        if scale < a {
            let r = scale / a;
            ssq = one + ssq * r * r;
            scale = a;
        } else {
            let r = a / scale;
            ssq = ssq + r * r;
        }
    }
    scale * Float::sqrt(ssq)
}

// ── Vector norms ────────────────────────────────────────────────────

impl<T: Scalar> Vector<T> {
    /// Squared L2 norm (dot product with self). No sqrt.
    pub fn norm_squared(&self) -> T {
        self.dot(self)
    }
}

impl<T: FloatScalar> Vector<T> {
    /// L2 (Euclidean) norm.
    pub fn norm(&self) -> T {
        self.norm_squared().sqrt()
    }

    /// L2 norm computed without intermediate overflow.
    pub fn stable_norm(&self) -> T {
        stable_norm(self.as_slice())
    }

    /// Return a unit vector in the same direction.
    ///
    /// Panics if the norm is zero.
    pub fn normalize(&self) -> Self {
        let n = self.norm();
        assert!(n > T::zero(), "cannot normalize a zero vector");
        self * (T::one() / n)
    }
}

// ── Matrix norms ────────────────────────────────────────────────────

impl<T: LinalgScalar> Matrix<T> {
    /// Frobenius norm.
    pub fn frobenius_norm(&self) -> T::Real {
        let mut sum = T::Real::zero();
        for &x in self.as_slice() {
            sum = sum + x.modulus_sq();
        }
        Float::sqrt(sum)
    }

    /// Frobenius norm computed without intermediate overflow.
    pub fn stable_norm(&self) -> T::Real {
        stable_norm(self.as_slice())
    }

    /// Largest element modulus. Zero for an empty matrix.
    pub fn max_abs(&self) -> T::Real {
        self.as_slice()
            .iter()
            .fold(T::Real::zero(), |m, &x| Float::max(m, x.modulus()))
    }
}

impl<T: FloatScalar> Matrix<T> {
    /// Smallest coefficient with its `(row, col)` position.
    pub fn min_coeff(&self) -> Option<((usize, usize), T)> {
        let nrows = self.nrows();
        reduce_by(self.as_slice(), |a, b| a < b).map(|(k, v)| ((k % nrows, k / nrows), v))
    }

    /// Largest coefficient with its `(row, col)` position.
    pub fn max_coeff(&self) -> Option<((usize, usize), T)> {
        let nrows = self.nrows();
        reduce_by(self.as_slice(), |a, b| a > b).map(|(k, v)| ((k % nrows, k / nrows), v))
    }
}
