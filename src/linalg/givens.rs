use num_traits::Float;

use crate::traits::LinalgScalar;
use crate::Matrix;

/// Plane rotation `G = [c s; -s c]` with `c² + s² = 1`.
///
/// ```
/// use linkern::linalg::Givens;
///
/// let (g, r) = Givens::new(3.0_f64, 4.0);
/// assert!((r - 5.0).abs() < 1e-12);
/// let (x, y) = g.apply(3.0, 4.0);
/// assert!((x - 5.0).abs() < 1e-12 && y.abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Givens<R> {
    pub c: R,
    pub s: R,
}

impl<R: Float> Givens<R> {
    /// The identity rotation.
    pub fn identity() -> Self {
        Self {
            c: R::one(),
            s: R::zero(),
        }
    }

    /// Rotation that zeroes `b`: `G·[a; b] = [r; 0]`.
    ///
    /// Works from the ratio of the smaller to the larger input, so neither
    /// `a²` nor `b²` is ever formed.
    #[inline]
    pub fn new(a: R, b: R) -> (Self, R) {
        if b == R::zero() {
            (Self::identity(), a)
        } else if b.abs() > a.abs() {
            let t = a / b;
            let u = (R::one() + t * t).sqrt();
            let s = R::one() / u;
            (Self { c: s * t, s }, b * u)
        } else {
            let t = b / a;
            let u = (R::one() + t * t).sqrt();
            let c = R::one() / u;
            (Self { c, s: c * t }, a * u)
        }
    }

    /// `G·[x; y]`.
    #[inline]
    pub fn apply(&self, x: R, y: R) -> (R, R) {
        (self.c * x + self.s * y, self.c * y - self.s * x)
    }

    /// Right-multiply columns `p` and `q` of `m` by `Gᵀ`.
    ///
    /// Column `p` becomes `c·m_p + s·m_q` and column `q` becomes `c·m_q − s·m_p`.
    pub fn apply_on_the_right<T: LinalgScalar<Real = R>>(&self, m: &mut Matrix<T>, p: usize, q: usize) {
        let c = T::from_real(self.c);
        let s = T::from_real(self.s);
        let (col_p, col_q) = m.col_pair_mut(p, q);
        for (mp, mq) in col_p.iter_mut().zip(col_q.iter_mut()) {
            let a = *mp;
            let b = *mq;
            *mp = c * a + s * b;
            *mq = c * b - s * a;
        }
    }
}
