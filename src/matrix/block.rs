use crate::traits::Scalar;

use super::Matrix;

impl<T: Scalar> Matrix<T> {
    /// Extract a sub-matrix of size `rows x cols` starting at `(i, j)`.
    ///
    /// Panics if the block extends beyond the matrix bounds.
    ///
    /// ```
    /// use linkern::Matrix;
    /// let m = Matrix::from_fn(3, 3, |i, j| (i * 3 + j) as f64);
    /// let b = m.block(1, 1, 2, 2);
    /// assert_eq!(b[(0, 0)], 4.0);
    /// assert_eq!(b[(1, 1)], 8.0);
    /// ```
    pub fn block(&self, i: usize, j: usize, rows: usize, cols: usize) -> Self {
        assert!(
            i + rows <= self.nrows && j + cols <= self.ncols,
            "block ({},{}) size {}x{} out of bounds for {}x{} matrix",
            i, j, rows, cols, self.nrows, self.ncols,
        );
        Matrix::from_fn(rows, cols, |r, c| self[(i + r, j + c)])
    }

    /// Write a sub-matrix into self starting at position `(i, j)`.
    ///
    /// Panics if the block extends beyond the matrix bounds.
    pub fn set_block(&mut self, i: usize, j: usize, src: &Matrix<T>) {
        assert!(
            i + src.nrows <= self.nrows && j + src.ncols <= self.ncols,
            "set_block ({},{}) size {}x{} out of bounds for {}x{} matrix",
            i, j, src.nrows, src.ncols, self.nrows, self.ncols,
        );
        for c in 0..src.ncols {
            for r in 0..src.nrows {
                self[(i + r, j + c)] = src[(r, c)];
            }
        }
    }

    /// The leading `rows x cols` corner.
    pub fn top_left(&self, rows: usize, cols: usize) -> Self {
        self.block(0, 0, rows, cols)
    }

    /// The trailing `rows x cols` corner.
    pub fn bottom_right(&self, rows: usize, cols: usize) -> Self {
        self.block(self.nrows - rows, self.ncols - cols, rows, cols)
    }
}
