use alloc::vec;
use alloc::vec::Vec;
use core::ops::{Add, Index, IndexMut, Mul, Neg, Sub};

use crate::traits::{FloatScalar, Scalar};

/// Dynamically-sized vector with single-index access `v[i]`.
///
/// # Examples
///
/// ```
/// use linkern::Vector;
///
/// let v = Vector::from_slice(&[1.0_f64, 2.0, 3.0]);
/// assert_eq!(v[0], 1.0);
/// assert_eq!(v.len(), 3);
/// assert!((v.dot(&v) - 14.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Vector<T> {
    data: Vec<T>,
}

impl<T: Scalar> Vector<T> {
    /// Create a vector from a flat slice.
    pub fn from_slice(data: &[T]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    /// Create a zero vector of length `n`.
    pub fn zeros(n: usize) -> Self {
        Self {
            data: vec![T::zero(); n],
        }
    }

    /// Create a vector filled with a value.
    pub fn fill(n: usize, value: T) -> Self {
        Self {
            data: vec![value; n],
        }
    }

    /// Dot product (no conjugation).
    ///
    /// ```
    /// use linkern::Vector;
    /// let a = Vector::from_slice(&[1.0, 2.0, 3.0]);
    /// let b = Vector::from_slice(&[4.0, 5.0, 6.0]);
    /// assert_eq!(a.dot(&b), 32.0);
    /// ```
    pub fn dot(&self, rhs: &Self) -> T {
        assert_eq!(self.len(), rhs.len(), "vector length mismatch");
        self.data
            .iter()
            .zip(rhs.data.iter())
            .fold(T::zero(), |acc, (&a, &b)| acc + a * b)
    }
}

impl<T> Vector<T> {
    /// Create a vector from an owned `Vec`.
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the vector is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// View the vector data as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// View the vector data as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Iterate over the elements.
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Consume the vector, returning the underlying `Vec`.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T: FloatScalar> Vector<T> {
    /// Smallest element and its index. `None` for an empty vector.
    ///
    /// ```
    /// use linkern::Vector;
    /// let v = Vector::from_slice(&[3.0_f64, -1.0, 2.0]);
    /// assert_eq!(v.min_coeff(), Some((1, -1.0)));
    /// ```
    pub fn min_coeff(&self) -> Option<(usize, T)> {
        reduce_by(&self.data, |a, b| a < b)
    }

    /// Largest element and its index. `None` for an empty vector.
    pub fn max_coeff(&self) -> Option<(usize, T)> {
        reduce_by(&self.data, |a, b| a > b)
    }
}

/// First index whose value wins `better` against every other element.
pub(crate) fn reduce_by<T: Copy>(xs: &[T], better: impl Fn(T, T) -> bool) -> Option<(usize, T)> {
    let (&first, rest) = xs.split_first()?;
    let mut best = (0, first);
    for (i, &x) in rest.iter().enumerate() {
        if better(x, best.1) {
            best = (i + 1, x);
        }
    }
    Some(best)
}

impl<T> From<Vec<T>> for Vector<T> {
    fn from(data: Vec<T>) -> Self {
        Self { data }
    }
}

// ── Index ───────────────────────────────────────────────────────────

impl<T> Index<usize> for Vector<T> {
    type Output = T;

    #[inline]
    fn index(&self, i: usize) -> &T {
        &self.data[i]
    }
}

impl<T> IndexMut<usize> for Vector<T> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.data[i]
    }
}

// ── Arithmetic ──────────────────────────────────────────────────────

impl<T: Scalar> Add<&Vector<T>> for &Vector<T> {
    type Output = Vector<T>;

    fn add(self, rhs: &Vector<T>) -> Vector<T> {
        assert_eq!(self.len(), rhs.len(), "vector length mismatch");
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(&a, &b)| a + b)
            .collect();
        Vector { data }
    }
}

impl<T: Scalar> Sub<&Vector<T>> for &Vector<T> {
    type Output = Vector<T>;

    fn sub(self, rhs: &Vector<T>) -> Vector<T> {
        assert_eq!(self.len(), rhs.len(), "vector length mismatch");
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(&a, &b)| a - b)
            .collect();
        Vector { data }
    }
}

impl<T: Scalar> Mul<T> for &Vector<T> {
    type Output = Vector<T>;

    fn mul(self, rhs: T) -> Vector<T> {
        Vector {
            data: self.data.iter().map(|&x| x * rhs).collect(),
        }
    }
}

impl<T: Scalar> Neg for &Vector<T> {
    type Output = Vector<T>;

    fn neg(self) -> Vector<T> {
        Vector {
            data: self.data.iter().map(|&x| T::zero() - x).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        let z = Vector::<f64>::zeros(4);
        assert_eq!(z.len(), 4);
        assert_eq!(Vector::fill(2, 3.0).as_slice(), &[3.0, 3.0]);
        let v: Vector<f64> = alloc::vec![1.0, 2.0].into();
        assert_eq!(v.into_vec(), alloc::vec![1.0, 2.0]);
    }

    #[test]
    fn arithmetic() {
        let a = Vector::from_slice(&[1.0, 2.0]);
        let b = Vector::from_slice(&[3.0, 5.0]);
        assert_eq!((&a + &b).as_slice(), &[4.0, 7.0]);
        assert_eq!((&b - &a).as_slice(), &[2.0, 3.0]);
        assert_eq!((&a * 2.0).as_slice(), &[2.0, 4.0]);
        assert_eq!((-&a).as_slice(), &[-1.0, -2.0]);
    }

    #[test]
    fn min_max_first_index_wins() {
        let v = Vector::from_slice(&[2.0_f64, 1.0, 5.0, 1.0, 5.0]);
        assert_eq!(v.min_coeff(), Some((1, 1.0)));
        assert_eq!(v.max_coeff(), Some((2, 5.0)));
        assert_eq!(Vector::<f64>::zeros(0).min_coeff(), None);
    }
}
