//! Skyline (variable-band / profile) storage for square matrices.
//!
//! Only the entries inside each row's or column's envelope are stored: the
//! diagonal separately, the strict lower and strict upper triangles as packed
//! per-line segments. Factorizations run in place on this storage.

pub(crate) mod lu;

pub use lu::SkylineInplaceLu;

use alloc::vec;
use alloc::vec::Vec;

use crate::linalg::{ensure_len, ensure_square, LinalgError};
use crate::traits::Scalar;
use crate::Matrix;

/// Layout of the off-diagonal parts of a [`SkylineMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageOrder {
    /// Lower part stored by rows, upper part stored by columns.
    ///
    /// Row `i` of the lower part holds columns `first..i`, column `j` of the
    /// upper part holds rows `first..j`: every segment ends next to the
    /// diagonal.
    RowMajor,
    /// Lower part stored by columns, upper part stored by rows.
    ///
    /// Column `j` of the lower part holds rows `j+1..=end`, row `i` of the
    /// upper part holds columns `i+1..=end`: every segment starts next to the
    /// diagonal. The ends are kept non-decreasing so that elimination fill
    /// stays inside the profile.
    ColMajor,
}

/// Packed segments, one per outer index, each covering a contiguous range of
/// inner indices.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Band<T> {
    pub(crate) values: Vec<T>,
    /// `ptr[k]..ptr[k + 1]` is segment `k` in `values`.
    pub(crate) ptr: Vec<usize>,
    /// Inner index of the first entry of segment `k`.
    pub(crate) first: Vec<usize>,
}

impl<T: Copy> Band<T> {
    fn new(first: Vec<usize>, lens: &[usize], zero: T) -> Self {
        let mut ptr = Vec::with_capacity(lens.len() + 1);
        ptr.push(0);
        for &len in lens {
            let last = ptr[ptr.len() - 1];
            ptr.push(last + len);
        }
        let total = ptr[ptr.len() - 1];
        Self {
            values: vec![zero; total],
            ptr,
            first,
        }
    }
}

impl<T> Band<T> {
    #[inline]
    pub(crate) fn len(&self, k: usize) -> usize {
        self.ptr[k + 1] - self.ptr[k]
    }

    #[inline]
    pub(crate) fn segment_mut(&mut self, k: usize) -> &mut [T] {
        &mut self.values[self.ptr[k]..self.ptr[k + 1]]
    }

    /// Position in `values` of `(outer, inner)`, if stored.
    #[inline]
    pub(crate) fn position(&self, outer: usize, inner: usize) -> Option<usize> {
        let f = self.first[outer];
        if inner >= f && inner - f < self.len(outer) {
            Some(self.ptr[outer] + inner - f)
        } else {
            None
        }
    }
}

/// Square matrix in skyline storage.
///
/// # Example
///
/// ```
/// use linkern::Matrix;
/// use linkern::skyline::{SkylineMatrix, StorageOrder};
///
/// let a = Matrix::from_rows(3, 3, &[4.0_f64, 1.0, 0.0, 2.0, 5.0, 1.0, 0.0, 1.0, 6.0]);
/// let s = SkylineMatrix::from_dense(&a, StorageOrder::RowMajor).unwrap();
/// assert_eq!(s.coeff(1, 0), 2.0);
/// assert!(!s.exists(2, 0));
/// assert_eq!(s.to_dense(), a);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SkylineMatrix<T> {
    n: usize,
    order: StorageOrder,
    pub(crate) diag: Vec<T>,
    pub(crate) lower: Band<T>,
    pub(crate) upper: Band<T>,
}

impl<T: Scalar> SkylineMatrix<T> {
    /// Zero matrix with the given per-line bandwidths.
    ///
    /// `lower[k]` and `upper[k]` count the off-diagonal entries stored for
    /// outer index `k` (a lower row and an upper column for `RowMajor`, a
    /// lower column and an upper row for `ColMajor`). Widths are clamped to
    /// the triangle; `ColMajor` widths are widened where needed so the
    /// profile ends are non-decreasing.
    pub fn with_bandwidths(
        order: StorageOrder,
        lower: &[usize],
        upper: &[usize],
    ) -> Result<Self, LinalgError> {
        let n = lower.len();
        ensure_len(n, upper.len())?;
        let (lower, upper) = match order {
            StorageOrder::RowMajor => (leading_band(lower), leading_band(upper)),
            StorageOrder::ColMajor => (trailing_band(lower), trailing_band(upper)),
        };
        Ok(Self {
            n,
            order,
            diag: vec![T::zero(); n],
            lower,
            upper,
        })
    }

    /// Skyline copy of a dense matrix, with the smallest profile that holds
    /// all of its non-zero entries.
    pub fn from_dense(a: &Matrix<T>, order: StorageOrder) -> Result<Self, LinalgError> {
        let n = a.nrows();
        ensure_square(n, a.ncols())?;
        let zero = T::zero();

        let (lower_w, upper_w): (Vec<usize>, Vec<usize>) = match order {
            StorageOrder::RowMajor => (0..n)
                .map(|k| {
                    let l = (0..k).find(|&j| a[(k, j)] != zero).map_or(0, |j| k - j);
                    let u = (0..k).find(|&i| a[(i, k)] != zero).map_or(0, |i| k - i);
                    (l, u)
                })
                .unzip(),
            StorageOrder::ColMajor => (0..n)
                .map(|k| {
                    let l = ((k + 1)..n).rev().find(|&i| a[(i, k)] != zero).map_or(0, |i| i - k);
                    let u = ((k + 1)..n).rev().find(|&j| a[(k, j)] != zero).map_or(0, |j| j - k);
                    (l, u)
                })
                .unzip(),
        };

        let mut s = Self::with_bandwidths(order, &lower_w, &upper_w)?;
        for j in 0..n {
            for i in 0..n {
                if let Some(x) = s.coeff_ref(i, j) {
                    *x = a[(i, j)];
                }
            }
        }
        Ok(s)
    }

    /// Value at `(i, j)`; zero outside the profile.
    pub fn coeff(&self, i: usize, j: usize) -> T {
        if i == j {
            self.diag[i]
        } else if i > j {
            self.lower_position(i, j)
                .map_or_else(T::zero, |p| self.lower.values[p])
        } else {
            self.upper_position(i, j)
                .map_or_else(T::zero, |p| self.upper.values[p])
        }
    }

    /// Dense copy.
    pub fn to_dense(&self) -> Matrix<T> {
        Matrix::from_fn(self.n, self.n, |i, j| self.coeff(i, j))
    }
}

impl<T> SkylineMatrix<T> {
    /// Number of rows (and columns).
    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    /// Layout of the off-diagonal parts.
    #[inline]
    pub fn order(&self) -> StorageOrder {
        self.order
    }

    /// Whether `(i, j)` lies inside the stored profile.
    pub fn exists(&self, i: usize, j: usize) -> bool {
        match i.cmp(&j) {
            core::cmp::Ordering::Equal => i < self.n,
            core::cmp::Ordering::Greater => self.lower_position(i, j).is_some(),
            core::cmp::Ordering::Less => self.upper_position(i, j).is_some(),
        }
    }

    /// Mutable access to `(i, j)`; `None` outside the profile.
    pub fn coeff_ref(&mut self, i: usize, j: usize) -> Option<&mut T> {
        if i == j {
            self.diag.get_mut(i)
        } else if i > j {
            let p = self.lower_position(i, j)?;
            Some(&mut self.lower.values[p])
        } else {
            let p = self.upper_position(i, j)?;
            Some(&mut self.upper.values[p])
        }
    }

    /// The diagonal.
    #[inline]
    pub fn diagonal(&self) -> &[T] {
        &self.diag
    }

    /// The diagonal, mutably.
    #[inline]
    pub fn diagonal_mut(&mut self) -> &mut [T] {
        &mut self.diag
    }

    /// Stored lower entries of outer index `k`: the first inner index and
    /// the contiguous values.
    ///
    /// For `RowMajor`, `k` is a row and the inner indices are columns
    /// `first..k`. For `ColMajor`, `k` is a column and the inner indices are
    /// rows `k+1..`.
    pub fn lower_segment(&self, k: usize) -> (usize, &[T]) {
        (self.lower.first[k], &self.lower.values[self.lower.ptr[k]..self.lower.ptr[k + 1]])
    }

    /// Stored upper entries of outer index `k`, laid out like
    /// [`lower_segment`](Self::lower_segment) with rows and columns swapped.
    pub fn upper_segment(&self, k: usize) -> (usize, &[T]) {
        (self.upper.first[k], &self.upper.values[self.upper.ptr[k]..self.upper.ptr[k + 1]])
    }

    /// Number of stored coefficients, diagonal included.
    pub fn nnz(&self) -> usize {
        self.diag.len() + self.lower.values.len() + self.upper.values.len()
    }

    #[inline]
    fn lower_position(&self, i: usize, j: usize) -> Option<usize> {
        if i >= self.n {
            return None;
        }
        match self.order {
            StorageOrder::RowMajor => self.lower.position(i, j),
            StorageOrder::ColMajor => self.lower.position(j, i),
        }
    }

    #[inline]
    fn upper_position(&self, i: usize, j: usize) -> Option<usize> {
        if j >= self.n {
            return None;
        }
        match self.order {
            StorageOrder::RowMajor => self.upper.position(j, i),
            StorageOrder::ColMajor => self.upper.position(i, j),
        }
    }
}

/// Segments ending just before the diagonal: outer `k` covers `k - w..k`.
fn leading_band<T: Scalar>(widths: &[usize]) -> Band<T> {
    let lens: Vec<usize> = widths.iter().enumerate().map(|(k, &w)| w.min(k)).collect();
    let first = lens.iter().enumerate().map(|(k, &l)| k - l).collect();
    Band::new(first, &lens, T::zero())
}

/// Segments starting just after the diagonal: outer `k` covers `k+1..=end[k]`,
/// with `end` made non-decreasing.
fn trailing_band<T: Scalar>(widths: &[usize]) -> Band<T> {
    let n = widths.len();
    let mut lens = Vec::with_capacity(n);
    let mut end = 0;
    for (k, &w) in widths.iter().enumerate() {
        end = end.max(k + w.min(n - 1 - k));
        lens.push(end - k);
    }
    let first = (0..n).map(|k| k + 1).collect();
    Band::new(first, &lens, T::zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrow() -> Matrix<f64> {
        // Non-zeros on the first row/column and the diagonal.
        Matrix::from_fn(4, 4, |i, j| {
            if i == j {
                10.0 + i as f64
            } else if i == 0 || j == 0 {
                1.0 + (i + j) as f64
            } else {
                0.0
            }
        })
    }

    #[test]
    fn dense_roundtrip_both_orders() {
        let a = Matrix::from_rows(
            4,
            4,
            &[5.0, 1.0, 0.0, 0.0, 2.0, 6.0, 1.0, 0.0, 0.0, 3.0, 7.0, 2.0, 1.0, 0.0, 4.0, 8.0],
        );
        for order in [StorageOrder::RowMajor, StorageOrder::ColMajor] {
            let s = SkylineMatrix::from_dense(&a, order).unwrap();
            assert_eq!(s.to_dense(), a, "{order:?}");
            assert_eq!(s.order(), order);
            assert_eq!(s.size(), 4);
        }
    }

    #[test]
    fn row_major_profile_is_envelope() {
        let s = SkylineMatrix::from_dense(&arrow(), StorageOrder::RowMajor).unwrap();
        // Row 3 starts at column 0, so it stores the zeros at columns 1 and 2.
        assert_eq!(s.lower_segment(3), (0, &[4.0, 0.0, 0.0][..]));
        assert_eq!(s.upper_segment(2), (0, &[3.0, 0.0][..]));
        assert!(s.exists(3, 1));
        assert_eq!(s.nnz(), 4 + 6 + 6);
    }

    #[test]
    fn col_major_ends_are_monotone() {
        let s = SkylineMatrix::from_dense(&arrow(), StorageOrder::ColMajor).unwrap();
        // Column 0 reaches row 3; every later column is widened to match.
        assert_eq!(s.lower_segment(0), (1, &[2.0, 3.0, 4.0][..]));
        assert_eq!(s.lower_segment(1), (2, &[0.0, 0.0][..]));
        assert_eq!(s.lower_segment(3).1.len(), 0);
        assert!(s.exists(3, 2));
        assert!(s.exists(1, 3));
    }

    #[test]
    fn coeff_ref_only_inside_profile() {
        let mut s = SkylineMatrix::<f64>::with_bandwidths(StorageOrder::RowMajor, &[0, 1, 1], &[0, 1, 0])
            .unwrap();
        *s.coeff_ref(2, 1).unwrap() = 3.0;
        *s.coeff_ref(0, 1).unwrap() = -1.0;
        assert!(s.coeff_ref(2, 0).is_none());
        assert!(s.coeff_ref(1, 2).is_none());
        assert!(s.coeff_ref(5, 5).is_none());
        assert_eq!(s.coeff(2, 1), 3.0);
        assert_eq!(s.coeff(0, 1), -1.0);
        assert_eq!(s.coeff(2, 0), 0.0);
        s.diagonal_mut()[2] = 9.0;
        assert_eq!(s.diagonal(), &[0.0, 0.0, 9.0]);
    }

    #[test]
    fn band_lookup_needs_no_copy() {
        // Segment 0 is empty, segment 1 holds inner indices 0 and 1.
        let band = Band {
            values: vec![alloc::string::String::from("a"), alloc::string::String::from("b")],
            ptr: vec![0, 0, 2],
            first: vec![0, 0],
        };
        assert_eq!(band.len(0), 0);
        assert_eq!(band.len(1), 2);
        assert_eq!(band.position(1, 1), Some(1));
        assert_eq!(band.position(0, 0), None);
        assert_eq!(band.position(1, 2), None);
    }

    #[test]
    fn bandwidths_are_clamped() {
        let s = SkylineMatrix::<f64>::with_bandwidths(StorageOrder::ColMajor, &[5, 5, 5], &[0, 9, 0])
            .unwrap();
        assert_eq!(s.lower_segment(0).1.len(), 2);
        assert_eq!(s.lower_segment(2).1.len(), 0);
        assert_eq!(s.upper_segment(1).1.len(), 1);
        assert!(matches!(
            SkylineMatrix::<f64>::with_bandwidths(StorageOrder::RowMajor, &[0, 1], &[0]),
            Err(LinalgError::DimensionMismatch { .. })
        ));
    }
}
