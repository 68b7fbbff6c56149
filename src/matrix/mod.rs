mod block;
mod norm;
mod ops;
mod vector;

pub use norm::stable_norm;
pub use vector::Vector;

use alloc::vec;
use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use crate::traits::{LinalgScalar, MatrixMut, MatrixRef, Scalar};

/// Dynamically-sized heap-allocated dense matrix.
///
/// Column-major `Vec<T>` storage. Dimensions are set at construction.
/// Implements [`MatrixRef`] and [`MatrixMut`], so the generic free functions
/// in [`crate::linalg`] work on it directly.
///
/// # Examples
///
/// ```
/// use linkern::Matrix;
///
/// let a = Matrix::from_rows(2, 2, &[1.0_f64, 2.0, 3.0, 4.0]);
/// assert_eq!(a[(0, 1)], 2.0);
/// assert_eq!(a.nrows(), 2);
/// assert_eq!(a.ncols(), 2);
///
/// let b = Matrix::<f64>::eye(3);
/// assert_eq!(b[(0, 0)], 1.0);
/// assert_eq!(b[(0, 1)], 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    data: Vec<T>,
    nrows: usize,
    ncols: usize,
}

// ── Constructors ────────────────────────────────────────────────────

impl<T: Scalar> Matrix<T> {
    /// Create an `nrows x ncols` matrix of zeros.
    ///
    /// ```
    /// use linkern::Matrix;
    /// let m = Matrix::<f64>::zeros(2, 3);
    /// assert_eq!(m.nrows(), 2);
    /// assert_eq!(m.ncols(), 3);
    /// assert_eq!(m[(1, 2)], 0.0);
    /// ```
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![T::zero(); nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Create a matrix filled with a given value.
    pub fn fill(nrows: usize, ncols: usize, value: T) -> Self {
        Self {
            data: vec![value; nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Create an `n x n` identity matrix.
    pub fn eye(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = T::one();
        }
        m
    }

    /// Create a matrix from a flat slice in column-major order.
    ///
    /// Panics if `slice.len() != nrows * ncols`.
    ///
    /// ```
    /// use linkern::Matrix;
    /// // Column-major: col0=[1,3], col1=[2,4]
    /// let m = Matrix::from_slice(2, 2, &[1.0, 3.0, 2.0, 4.0]);
    /// assert_eq!(m[(1, 0)], 3.0);
    /// assert_eq!(m[(0, 1)], 2.0);
    /// ```
    pub fn from_slice(nrows: usize, ncols: usize, slice: &[T]) -> Self {
        assert_eq!(
            slice.len(),
            nrows * ncols,
            "slice length {} does not match {}x{} matrix",
            slice.len(),
            nrows,
            ncols,
        );
        Self {
            data: slice.to_vec(),
            nrows,
            ncols,
        }
    }

    /// Create a matrix from a flat slice in row-major order.
    ///
    /// ```
    /// use linkern::Matrix;
    /// let m = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// assert_eq!(m[(0, 2)], 3.0);
    /// assert_eq!(m[(1, 0)], 4.0);
    /// ```
    pub fn from_rows(nrows: usize, ncols: usize, row_major: &[T]) -> Self {
        assert_eq!(
            row_major.len(),
            nrows * ncols,
            "slice length {} does not match {}x{} matrix",
            row_major.len(),
            nrows,
            ncols,
        );
        Self::from_fn(nrows, ncols, |i, j| row_major[i * ncols + j])
    }

    /// Create a matrix from an owned `Vec<T>` in column-major order.
    ///
    /// Panics if `data.len() != nrows * ncols`.
    pub fn from_vec(nrows: usize, ncols: usize, data: Vec<T>) -> Self {
        assert_eq!(
            data.len(),
            nrows * ncols,
            "vec length {} does not match {}x{} matrix",
            data.len(),
            nrows,
            ncols,
        );
        Self { data, nrows, ncols }
    }

    /// Create a square diagonal matrix from the given entries.
    ///
    /// ```
    /// use linkern::Matrix;
    /// let m = Matrix::from_diagonal(&[2.0, 3.0]);
    /// assert_eq!(m[(1, 1)], 3.0);
    /// assert_eq!(m[(0, 1)], 0.0);
    /// ```
    pub fn from_diagonal(diag: &[T]) -> Self {
        let n = diag.len();
        let mut m = Self::zeros(n, n);
        for (i, &d) in diag.iter().enumerate() {
            m[(i, i)] = d;
        }
        m
    }

    /// Read the coefficient at `(row, col)`.
    #[inline]
    pub fn coeff(&self, row: usize, col: usize) -> T {
        self[(row, col)]
    }

    /// Read the coefficient at column-major linear index `k`.
    #[inline]
    pub fn linear(&self, k: usize) -> T {
        self.data[k]
    }

    /// Extract column `j` as a vector.
    pub fn col(&self, j: usize) -> Vector<T> {
        Vector::from_slice(self.col_slice(j))
    }

    /// Extract row `i` as a vector.
    pub fn row(&self, i: usize) -> Vector<T> {
        Vector::from_vec((0..self.ncols).map(|j| self[(i, j)]).collect())
    }

    /// Overwrite column `j` with `v`.
    pub fn set_col(&mut self, j: usize, v: &[T]) {
        assert_eq!(v.len(), self.nrows, "column length mismatch");
        self.col_slice_mut(j).copy_from_slice(v);
    }

    /// Sum of diagonal elements.
    pub fn trace(&self) -> T {
        let n = self.nrows.min(self.ncols);
        let mut sum = T::zero();
        for i in 0..n {
            sum = sum + self[(i, i)];
        }
        sum
    }

    /// The main diagonal as a vector.
    pub fn diagonal(&self) -> Vector<T> {
        let n = self.nrows.min(self.ncols);
        Vector::from_vec((0..n).map(|i| self[(i, i)]).collect())
    }

    /// Transpose: (M×N) → (N×M).
    ///
    /// ```
    /// use linkern::Matrix;
    /// let a = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// let t = a.transpose();
    /// assert_eq!(t.nrows(), 3);
    /// assert_eq!(t[(2, 1)], 6.0);
    /// ```
    pub fn transpose(&self) -> Self {
        Self::from_fn(self.ncols, self.nrows, |i, j| self[(j, i)])
    }
}

impl<T> Matrix<T> {
    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Whether the matrix is square.
    #[inline]
    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// Create a matrix by calling `f(row, col)` for each element.
    ///
    /// ```
    /// use linkern::Matrix;
    /// let m = Matrix::from_fn(3, 3, |i, j| if i == j { 1.0_f64 } else { 0.0 });
    /// assert_eq!(m[(0, 0)], 1.0);
    /// assert_eq!(m[(0, 1)], 0.0);
    /// ```
    pub fn from_fn(nrows: usize, ncols: usize, f: impl Fn(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for j in 0..ncols {
            for i in 0..nrows {
                data.push(f(i, j));
            }
        }
        Self { data, nrows, ncols }
    }

    /// Mutable reference to the coefficient at `(row, col)`.
    #[inline]
    pub fn coeff_ref(&mut self, row: usize, col: usize) -> &mut T {
        &mut self[(row, col)]
    }

    /// Mutable reference at column-major linear index `k`.
    #[inline]
    pub fn linear_mut(&mut self, k: usize) -> &mut T {
        &mut self.data[k]
    }

    /// Flat column-major view of the data.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable flat column-major view of the data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Column `j` as a contiguous slice.
    #[inline]
    pub fn col_slice(&self, j: usize) -> &[T] {
        &self.data[j * self.nrows..(j + 1) * self.nrows]
    }

    /// Column `j` as a mutable contiguous slice.
    #[inline]
    pub fn col_slice_mut(&mut self, j: usize) -> &mut [T] {
        &mut self.data[j * self.nrows..(j + 1) * self.nrows]
    }

    /// Swap two columns in place.
    pub fn swap_columns(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let n = self.nrows;
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.data.split_at_mut(hi * n);
        head[lo * n..(lo + 1) * n].swap_with_slice(&mut tail[..n]);
    }

    /// Mutable views of two distinct columns at once, returned in `(a, b)` order.
    pub(crate) fn col_pair_mut(&mut self, a: usize, b: usize) -> (&mut [T], &mut [T]) {
        assert_ne!(a, b, "col_pair_mut requires distinct columns");
        let n = self.nrows;
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.data.split_at_mut(hi * n);
        let lo_col = &mut head[lo * n..(lo + 1) * n];
        let hi_col = &mut tail[..n];
        if a < b {
            (lo_col, hi_col)
        } else {
            (hi_col, lo_col)
        }
    }

    /// Change the shape, discarding the contents when the size differs.
    ///
    /// Keeps the allocation when the element count is unchanged.
    pub(crate) fn resize(&mut self, nrows: usize, ncols: usize, zero: T)
    where
        T: Copy,
    {
        if self.data.len() != nrows * ncols {
            self.data.clear();
            self.data.resize(nrows * ncols, zero);
        }
        self.nrows = nrows;
        self.ncols = ncols;
    }
}

impl<T: LinalgScalar> Matrix<T> {
    /// Conjugate transpose.
    ///
    /// Identical to [`transpose`](Self::transpose) for real matrices.
    pub fn adjoint(&self) -> Self {
        Self::from_fn(self.ncols, self.nrows, |i, j| self[(j, i)].conj())
    }

    /// Replace a square matrix by its conjugate transpose without allocating.
    ///
    /// Panics if the matrix is not square.
    pub fn adjoint_in_place(&mut self) {
        assert!(self.is_square(), "adjoint_in_place requires a square matrix");
        let n = self.nrows;
        for j in 0..n {
            self[(j, j)] = self[(j, j)].conj();
            for i in (j + 1)..n {
                let a = self[(i, j)];
                self[(i, j)] = self[(j, i)].conj();
                self[(j, i)] = a.conj();
            }
        }
    }
}

// ── MatrixRef / MatrixMut ───────────────────────────────────────────

impl<T> MatrixRef<T> for Matrix<T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &T {
        &self.data[col * self.nrows + row]
    }

    #[inline]
    fn col_as_slice(&self, col: usize, row_start: usize) -> &[T] {
        let start = col * self.nrows + row_start;
        let end = col * self.nrows + self.nrows;
        &self.data[start..end]
    }
}

impl<T> MatrixMut<T> for Matrix<T> {
    #[inline]
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        &mut self.data[col * self.nrows + row]
    }

    #[inline]
    fn col_as_mut_slice(&mut self, col: usize, row_start: usize) -> &mut [T] {
        let start = col * self.nrows + row_start;
        let end = col * self.nrows + self.nrows;
        &mut self.data[start..end]
    }
}

// ── Index ───────────────────────────────────────────────────────────

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        debug_assert!(row < self.nrows && col < self.ncols, "index out of bounds");
        &self.data[col * self.nrows + row]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        debug_assert!(row < self.nrows && col < self.ncols, "index out of bounds");
        &mut self.data[col * self.nrows + row]
    }
}
