use alloc::vec;
use alloc::vec::Vec;

use crate::linalg::{ensure_len, LinalgError};
use crate::matrix::stable_norm;
use crate::traits::FloatScalar;
use crate::Matrix;

/// Upper triangle of the leading `n x n` block (`n = ncols`), packed row by
/// row: `R[0,0..n], R[1,1..n], ..., R[n-1,n-1]`.
///
/// This is the layout [`dogleg`] reads. Entries below the diagonal are
/// ignored, so the packed output of [`qr_in_place`](crate::linalg::qr_in_place)
/// can be passed directly.
pub fn pack_upper_by_rows<T: FloatScalar>(a: &Matrix<T>) -> Result<Vec<T>, LinalgError> {
    let n = a.ncols();
    if a.nrows() < n {
        return Err(LinalgError::InvalidArgument("packed R needs nrows >= ncols"));
    }
    let mut r = Vec::with_capacity(n * (n + 1) / 2);
    for i in 0..n {
        for j in i..n {
            r.push(a[(i, j)]);
        }
    }
    Ok(r)
}

/// Dogleg step of a trust-region method (MINPACK `dogleg`).
///
/// Given the packed upper-triangular `R` of a QR factorization `A = Q·R`
/// (see [`pack_upper_by_rows`]), the scaling `diag = D`, `qtb = Qᵀ·b` and a
/// radius `delta`, writes into `x` the convex combination of the
/// Gauss-Newton direction and the scaled gradient direction that minimizes
/// `‖A·x − b‖` along the dogleg path subject to `‖D·x‖ ≤ delta`.
///
/// A zero diagonal entry of `R` is replaced by `ε·max|R[.., j]|` (or `ε` for a
/// zero column), so the step is always finite. Only precondition errors are
/// returned.
///
/// # Example
///
/// ```
/// use linkern::optim::dogleg;
///
/// // R = I, so the Gauss-Newton step is qtb itself.
/// let r = [1.0_f64, 0.0, 0.0, 1.0, 0.0, 1.0];
/// let mut x = [0.0; 3];
/// dogleg(&r, &[1.0; 3], &[3.0, 4.0, 0.0], 1.0, &mut x).unwrap();
/// assert!((x[0] - 0.6).abs() < 1e-12);
/// assert!((x[1] - 0.8).abs() < 1e-12);
/// ```
pub fn dogleg<T: FloatScalar>(
    r: &[T],
    diag: &[T],
    qtb: &[T],
    delta: T,
    x: &mut [T],
) -> Result<(), LinalgError> {
    let n = diag.len();
    ensure_len(n * (n + 1) / 2, r.len())?;
    ensure_len(n, qtb.len())?;
    ensure_len(n, x.len())?;
    if delta.is_nan() || delta <= T::zero() || delta.is_infinite() {
        return Err(LinalgError::InvalidArgument("trust region radius must be positive and finite"));
    }
    if diag.iter().any(|&d| d.is_nan() || d <= T::zero()) {
        return Err(LinalgError::InvalidArgument("scaling entries must be positive"));
    }

    let eps = T::epsilon();
    let one = T::one();

    // Gauss-Newton direction, back substitution over the packed rows.
    let mut jj = n * (n + 1) / 2;
    for j in (0..n).rev() {
        jj -= n - j;
        let mut sum = T::zero();
        for (l, i) in ((jj + 1)..).zip((j + 1)..n) {
            sum = sum + r[l] * x[i];
        }
        let mut temp = r[jj];
        if temp == T::zero() {
            // Column j of R: row i sits at i*n - i*(i-1)/2 + (j - i).
            let mut l = j;
            for i in 0..=j {
                temp = temp.max(r[l].abs());
                l += n - i - 1;
            }
            temp = eps * temp;
            if temp == T::zero() {
                temp = eps;
            }
            log::trace!("dogleg: zero diagonal at {} replaced by {:?}", j, temp);
        }
        x[j] = (qtb[j] - sum) / temp;
    }

    let mut wa1 = vec![T::zero(); n];
    let mut wa2: Vec<T> = diag.iter().zip(x.iter()).map(|(&d, &xj)| d * xj).collect();
    let qnorm = stable_norm(&wa2);
    if qnorm <= delta {
        log::debug!("dogleg: gauss-newton step accepted (|Dx| = {:?})", qnorm);
        return Ok(());
    }

    // Scaled gradient D⁻¹·Rᵀ·qtb.
    let mut l = 0;
    for j in 0..n {
        let temp = qtb[j];
        for w in wa1[j..].iter_mut() {
            *w = *w + r[l] * temp;
            l += 1;
        }
        wa1[j] = wa1[j] / diag[j];
    }

    let gnorm = stable_norm(&wa1);
    let mut sgnorm = T::zero();
    let mut alpha = delta / qnorm;
    if gnorm != T::zero() {
        // Minimizer of the quadratic along the scaled gradient.
        for (w, &d) in wa1.iter_mut().zip(diag) {
            *w = *w / gnorm / d;
        }
        let mut l = 0;
        for j in 0..n {
            let mut sum = T::zero();
            for &w in &wa1[j..] {
                sum = sum + r[l] * w;
                l += 1;
            }
            wa2[j] = sum;
        }
        let temp = stable_norm(&wa2);
        sgnorm = gnorm / temp / temp;

        alpha = T::zero();
        if sgnorm < delta {
            // Point on the dogleg where it leaves the trust region.
            let bnorm = stable_norm(qtb);
            let dq = delta / qnorm;
            let sd = sgnorm / delta;
            let mut temp = bnorm / gnorm * (bnorm / qnorm) * sd;
            temp = temp - dq * sd * sd
                + ((temp - dq) * (temp - dq) + (one - dq * dq) * (one - sd * sd)).sqrt();
            alpha = dq * (one - sd * sd) / temp;
            log::debug!("dogleg: interpolated step, alpha = {:?}", alpha);
        } else {
            log::debug!("dogleg: scaled gradient step");
        }
    } else {
        log::debug!("dogleg: zero gradient, scaled gauss-newton step");
    }

    let temp = (one - alpha) * sgnorm.min(delta);
    for (xj, &w) in x.iter_mut().zip(&wa1) {
        *xj = temp * w + alpha * *xj;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {} (diff {})", msg, a, b, (a - b).abs());
    }

    fn identity_packed(n: usize) -> Vec<f64> {
        pack_upper_by_rows(&Matrix::<f64>::eye(n)).unwrap()
    }

    fn scaled_norm(d: &[f64], x: &[f64]) -> f64 {
        d.iter().zip(x).map(|(a, b)| (a * b) * (a * b)).sum::<f64>().sqrt()
    }

    #[test]
    fn packing_layout() {
        let a = Matrix::from_rows(4, 3, &[1.0, 2.0, 3.0, 9.0, 4.0, 5.0, 9.0, 9.0, 6.0, 9.0, 9.0, 9.0]);
        assert_eq!(pack_upper_by_rows(&a).unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert!(matches!(
            pack_upper_by_rows(&Matrix::<f64>::zeros(2, 3)),
            Err(LinalgError::InvalidArgument(_))
        ));
    }

    #[test]
    fn gauss_newton_inside_region() {
        let mut x = [0.0; 3];
        dogleg(&identity_packed(3), &[1.0; 3], &[3.0, 4.0, 0.0], 10.0, &mut x).unwrap();
        assert_eq!(x, [3.0, 4.0, 0.0]);
    }

    #[test]
    fn gradient_step_clipped_to_boundary() {
        let mut x = [0.0; 3];
        dogleg(&identity_packed(3), &[1.0; 3], &[3.0, 4.0, 0.0], 1.0, &mut x).unwrap();
        assert_near(x[0], 0.6, TOL, "x0");
        assert_near(x[1], 0.8, TOL, "x1");
        assert_near(x[2], 0.0, TOL, "x2");
    }

    #[test]
    fn triangular_gauss_newton() {
        // R = [[2, 1], [0, 4]], qtb = [4, 8] -> x = [1, 2]
        let r = [2.0, 1.0, 4.0];
        let mut x = [0.0; 2];
        dogleg(&r, &[1.0, 1.0], &[4.0, 8.0], 100.0, &mut x).unwrap();
        assert_near(x[0], 1.0, TOL, "x0");
        assert_near(x[1], 2.0, TOL, "x1");
    }

    #[test]
    fn interpolated_step_hits_boundary() {
        // Ill-conditioned R: Cauchy point inside, Gauss-Newton point far out.
        let r = [1.0, 0.9, 0.05];
        let diag = [1.0, 2.0];
        let qtb = [1.0, 1.0];
        let delta = 5.0;
        let mut x = [0.0; 2];
        dogleg(&r, &diag, &qtb, delta, &mut x).unwrap();
        assert_near(scaled_norm(&diag, &x), delta, 1e-10, "|Dx|");
    }

    #[test]
    fn zero_diagonal_is_substituted() {
        // R = [[1, 0], [0, 0]]: the second column is all zero.
        let r = [1.0, 0.0, 0.0];
        let mut x = [0.0_f64; 2];
        dogleg(&r, &[1.0, 1.0], &[1.0, 0.0], 10.0, &mut x).unwrap();
        assert!(x.iter().all(|v| v.is_finite()));
        assert_near(x[0], 1.0, TOL, "x0");
    }

    #[test]
    fn zero_rhs_gives_zero_step() {
        let mut x = [1.0; 2];
        dogleg(&identity_packed(2), &[1.0, 1.0], &[0.0, 0.0], 1.0, &mut x).unwrap();
        assert_eq!(x, [0.0, 0.0]);
    }

    #[test]
    fn zero_gradient_scales_gauss_newton() {
        // R = [0]: the substituted pivot gives a huge Gauss-Newton step
        // while Rᵀ·qtb vanishes.
        let mut x = [0.0];
        dogleg(&[0.0], &[1.0], &[1.0], 2.0, &mut x).unwrap();
        assert_near(x[0], 2.0, 1e-12, "x0");
    }

    #[test]
    fn preconditions() {
        let mut x = [0.0; 2];
        assert_eq!(
            dogleg(&[1.0, 0.0], &[1.0, 1.0], &[1.0, 1.0], 1.0, &mut x),
            Err(LinalgError::DimensionMismatch { expected: 3, got: 2 })
        );
        assert!(matches!(
            dogleg(&identity_packed(2), &[1.0, 1.0], &[1.0, 1.0], 0.0, &mut x),
            Err(LinalgError::InvalidArgument(_))
        ));
        assert!(matches!(
            dogleg(&identity_packed(2), &[1.0, 0.0], &[1.0, 1.0], 1.0, &mut x),
            Err(LinalgError::InvalidArgument(_))
        ));
    }

    #[test]
    fn single_precision() {
        let r = [1.0_f32, 0.0, 1.0];
        let mut x = [0.0_f32; 2];
        dogleg(&r, &[1.0, 1.0], &[3.0, 4.0], 2.5, &mut x).unwrap();
        assert!((x[0] - 1.5).abs() < 1e-6);
        assert!((x[1] - 2.0).abs() < 1e-6);
    }
}
