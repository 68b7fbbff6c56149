use num_traits::Float;

use crate::linalg::{ensure_len, LinalgError};
use crate::skyline::{SkylineMatrix, StorageOrder};
use crate::traits::{lit, LinalgScalar};
use crate::Matrix;

/// In-place LU factorization `A = L·U` of a [`SkylineMatrix`], without
/// pivoting.
///
/// The factors overwrite the matrix: the strict lower profile holds the
/// unit-lower `L`, the diagonal and strict upper profile hold `U`. The
/// factorization keeps an exclusive borrow of the matrix for as long as it
/// lives.
///
/// # Example
///
/// ```
/// use linkern::Matrix;
/// use linkern::skyline::{SkylineInplaceLu, SkylineMatrix, StorageOrder};
///
/// let a = Matrix::from_rows(3, 3, &[4.0_f64, 1.0, 0.0, 1.0, 4.0, 1.0, 0.0, 1.0, 4.0]);
/// let mut s = SkylineMatrix::from_dense(&a, StorageOrder::ColMajor).unwrap();
/// let lu = SkylineInplaceLu::new(&mut s, 0);
/// assert!(lu.succeeded());
///
/// let mut x = [0.0; 3];
/// lu.solve(&[5.0, 6.0, 5.0], &mut x, false).unwrap();
/// for xi in x {
///     assert!((xi - 1.0).abs() < 1e-12);
/// }
/// ```
#[derive(Debug)]
pub struct SkylineInplaceLu<'a, T: LinalgScalar> {
    lu: &'a mut SkylineMatrix<T>,
    precision: T::Real,
    flags: u32,
    ordering_method: u32,
    status: Result<(), LinalgError>,
}

impl<'a, T: LinalgScalar> SkylineInplaceLu<'a, T> {
    /// Borrow `matrix` and factor it immediately.
    ///
    /// Check [`succeeded`](Self::succeeded) before solving.
    pub fn new(matrix: &'a mut SkylineMatrix<T>, flags: u32) -> Self {
        let mut lu = Self {
            lu: matrix,
            precision: lit::<T::Real>(0.1) * T::dummy_precision(),
            flags,
            ordering_method: 0,
            status: Err(LinalgError::NotFactored),
        };
        // The outcome is kept in `status`.
        let _ = lu.compute();
        lu
    }

    /// Factor the current contents of the borrowed matrix.
    ///
    /// Returns `Singular` on an exactly zero or non-finite pivot, leaving the
    /// storage partially overwritten.
    pub fn compute(&mut self) -> Result<(), LinalgError> {
        let result = match self.lu.order() {
            StorageOrder::ColMajor => factor_col_major(self.lu),
            StorageOrder::RowMajor => factor_row_major(self.lu),
        };
        match &result {
            Ok(()) => log::debug!("skyline lu: factored {}x{} matrix", self.lu.size(), self.lu.size()),
            Err(e) => log::debug!("skyline lu: factorization failed: {}", e),
        }
        self.status = result;
        result
    }

    /// Whether the last factorization completed.
    #[inline]
    pub fn succeeded(&self) -> bool {
        self.status.is_ok()
    }

    /// The factored matrix.
    #[inline]
    pub fn matrix(&self) -> &SkylineMatrix<T> {
        self.lu
    }

    /// Dense unit-lower factor `L`.
    pub fn matrix_l(&self) -> Matrix<T> {
        let n = self.lu.size();
        Matrix::from_fn(n, n, |i, j| match i.cmp(&j) {
            core::cmp::Ordering::Equal => T::one(),
            core::cmp::Ordering::Greater => self.lu.coeff(i, j),
            core::cmp::Ordering::Less => T::zero(),
        })
    }

    /// Dense upper factor `U`, diagonal included.
    pub fn matrix_u(&self) -> Matrix<T> {
        let n = self.lu.size();
        Matrix::from_fn(n, n, |i, j| if i <= j { self.lu.coeff(i, j) } else { T::zero() })
    }

    /// Set the stored pivot precision. `compute` does not consult it.
    #[inline]
    pub fn set_precision(&mut self, precision: T::Real) {
        self.precision = precision;
    }

    /// Stored pivot precision, `0.1·dummy_precision` unless set.
    #[inline]
    pub fn precision(&self) -> T::Real {
        self.precision
    }

    /// Set the stored flags word. `compute` does not consult it.
    #[inline]
    pub fn set_flags(&mut self, flags: u32) {
        self.flags = flags;
    }

    /// Stored flags word, as passed to [`new`](Self::new) unless set.
    #[inline]
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Set the stored ordering method. `compute` does not consult it.
    #[inline]
    pub fn set_ordering_method(&mut self, method: u32) {
        self.ordering_method = method;
    }

    /// Stored ordering method, `0` unless set.
    #[inline]
    pub fn ordering_method(&self) -> u32 {
        self.ordering_method
    }

    /// Solve `A·x = b`, or `Aᵀ·x = b` when `transposed` is set.
    pub fn solve(&self, b: &[T], x: &mut [T], transposed: bool) -> Result<(), LinalgError> {
        if !self.succeeded() {
            return Err(LinalgError::NotFactored);
        }
        let n = self.lu.size();
        ensure_len(n, b.len())?;
        ensure_len(n, x.len())?;
        x.copy_from_slice(b);

        let m = &*self.lu;
        match (m.order(), transposed) {
            (StorageOrder::RowMajor, false) => {
                // L by rows
                for i in 0..n {
                    let (first, row) = m.lower_segment(i);
                    x[i] = x[i] - dot(row, &x[first..i]);
                }
                // U by columns
                for j in (0..n).rev() {
                    x[j] = x[j] / m.diag[j];
                    let (first, col) = m.upper_segment(j);
                    let xj = x[j];
                    for (xr, &u) in x[first..j].iter_mut().zip(col) {
                        *xr = *xr - u * xj;
                    }
                }
            }
            (StorageOrder::RowMajor, true) => {
                // Uᵀ: column j of U is row j of Uᵀ
                for j in 0..n {
                    let (first, col) = m.upper_segment(j);
                    x[j] = (x[j] - dot(col, &x[first..j])) / m.diag[j];
                }
                // Lᵀ: row i of L is column i of Lᵀ
                for i in (0..n).rev() {
                    let (first, row) = m.lower_segment(i);
                    let xi = x[i];
                    for (xc, &l) in x[first..i].iter_mut().zip(row) {
                        *xc = *xc - l * xi;
                    }
                }
            }
            (StorageOrder::ColMajor, false) => {
                // L by columns
                for j in 0..n {
                    let (first, col) = m.lower_segment(j);
                    let xj = x[j];
                    for (xr, &l) in x[first..first + col.len()].iter_mut().zip(col) {
                        *xr = *xr - l * xj;
                    }
                }
                // U by rows
                for i in (0..n).rev() {
                    let (first, row) = m.upper_segment(i);
                    x[i] = (x[i] - dot(row, &x[first..first + row.len()])) / m.diag[i];
                }
            }
            (StorageOrder::ColMajor, true) => {
                for i in 0..n {
                    x[i] = x[i] / m.diag[i];
                    let (first, row) = m.upper_segment(i);
                    let xi = x[i];
                    for (xc, &u) in x[first..first + row.len()].iter_mut().zip(row) {
                        *xc = *xc - u * xi;
                    }
                }
                for j in (0..n).rev() {
                    let (first, col) = m.lower_segment(j);
                    x[j] = x[j] - dot(col, &x[first..first + col.len()]);
                }
            }
        }
        Ok(())
    }
}

#[inline]
fn dot<T: LinalgScalar>(a: &[T], b: &[T]) -> T {
    a.iter().zip(b).fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}

#[inline]
fn check_pivot<T: LinalgScalar>(pivot: T, k: usize) -> Result<(), LinalgError> {
    if pivot == T::zero() || !Float::is_finite(pivot.modulus()) {
        log::trace!("skyline lu: pivot {} is {:?}", k, pivot);
        return Err(LinalgError::Singular);
    }
    Ok(())
}

/// Right-looking elimination. Relies on the non-decreasing profile ends of
/// `ColMajor` storage: every update lands inside the profile.
fn factor_col_major<T: LinalgScalar>(m: &mut SkylineMatrix<T>) -> Result<(), LinalgError> {
    let n = m.size();
    for k in 0..n {
        let pivot = m.diag[k];
        check_pivot(pivot, k)?;

        for l in m.lower.segment_mut(k) {
            *l = *l / pivot;
        }

        let lower_k = m.lower.ptr[k];
        let upper_k = m.upper.ptr[k];
        // Pivot row reaches column `k + u_len`.
        let u_len = m.upper.len(k);
        for t in 0..m.lower.len(k) {
            let i = k + 1 + t;
            let l_ik = m.lower.values[lower_k + t];
            if l_ik == T::zero() {
                continue;
            }

            // Upper row i, columns i+1..=k+u_len.
            if i < k + u_len {
                let src = upper_k + (i - k);
                let dst = m.upper.ptr[i];
                debug_assert!(m.upper.len(i) >= k + u_len - i);
                for c in 0..(k + u_len - i) {
                    let u_kj = m.upper.values[src + c];
                    m.upper.values[dst + c] = m.upper.values[dst + c] - l_ik * u_kj;
                }
            }

            // Lower entries of row i in columns k+1..i.
            for j in (k + 1)..i.min(k + 1 + u_len) {
                let u_kj = m.upper.values[upper_k + (j - k - 1)];
                let pos = m.lower.ptr[j] + (i - j - 1);
                debug_assert!(i - j - 1 < m.lower.len(j));
                m.lower.values[pos] = m.lower.values[pos] - l_ik * u_kj;
            }

            if i <= k + u_len {
                let u_ki = m.upper.values[upper_k + (i - k - 1)];
                m.diag[i] = m.diag[i] - l_ik * u_ki;
            }
        }
    }
    Ok(())
}

/// Row-by-row Doolittle elimination. Each entry is a dot product over the
/// overlap of a lower row slice and an upper column slice.
fn factor_row_major<T: LinalgScalar>(m: &mut SkylineMatrix<T>) -> Result<(), LinalgError> {
    let n = m.size();
    for i in 0..n {
        let ls_i = m.lower.first[i];
        let lp_i = m.lower.ptr[i];

        for j in ls_i..i {
            let us_j = m.upper.first[j];
            let up_j = m.upper.ptr[j];
            let k0 = ls_i.max(us_j);
            let s = dot(
                &m.lower.values[lp_i + (k0 - ls_i)..lp_i + (j - ls_i)],
                &m.upper.values[up_j + (k0 - us_j)..up_j + (j - us_j)],
            );
            let pos = lp_i + (j - ls_i);
            m.lower.values[pos] = (m.lower.values[pos] - s) / m.diag[j];
        }

        let us_i = m.upper.first[i];
        let up_i = m.upper.ptr[i];
        for r in us_i..i {
            let ls_r = m.lower.first[r];
            let lp_r = m.lower.ptr[r];
            let k0 = ls_r.max(us_i);
            let s = if k0 < r {
                dot(
                    &m.lower.values[lp_r + (k0 - ls_r)..lp_r + (r - ls_r)],
                    &m.upper.values[up_i + (k0 - us_i)..up_i + (r - us_i)],
                )
            } else {
                T::zero()
            };
            let pos = up_i + (r - us_i);
            m.upper.values[pos] = m.upper.values[pos] - s;
        }

        let k0 = ls_i.max(us_i);
        let s = dot(
            &m.lower.values[lp_i + (k0 - ls_i)..lp_i + (i - ls_i)],
            &m.upper.values[up_i + (k0 - us_i)..up_i + (i - us_i)],
        );
        m.diag[i] = m.diag[i] - s;
        check_pivot(m.diag[i], i)?;
    }
    Ok(())
}
