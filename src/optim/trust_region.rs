use alloc::vec;
use alloc::vec::Vec;

use crate::linalg::{ensure_len, LinalgError, Qr};
use crate::matrix::stable_norm;
use crate::traits::{lit, FloatScalar};
use crate::{Matrix, Vector};

use super::{dogleg, pack_upper_by_rows, LeastSquaresResult, OptimError};

/// Settings for the dogleg trust-region least-squares driver.
#[derive(Debug, Clone, Copy)]
pub struct DoglegSettings<T> {
    /// Convergence tolerance on gradient norm `||J^T r||`.
    pub grad_tol: T,
    /// Stop once the trust radius falls below `x_tol * ||D x||`.
    pub x_tol: T,
    /// Stop once both actual and predicted relative reductions fall below this.
    pub f_tol: T,
    /// Maximum number of trial steps.
    pub max_iter: usize,
    /// Initial trust radius as a multiple of `||D x0||` (or the radius itself
    /// when that norm is zero).
    pub factor: T,
}

impl Default for DoglegSettings<f64> {
    fn default() -> Self {
        Self {
            grad_tol: 1e-10,
            x_tol: 1e-12,
            f_tol: 1e-14,
            max_iter: 200,
            factor: 100.0,
        }
    }
}

impl Default for DoglegSettings<f32> {
    fn default() -> Self {
        Self {
            grad_tol: 1e-5,
            x_tol: 1e-6,
            f_tol: 1e-7,
            max_iter: 200,
            factor: 100.0,
        }
    }
}

/// Solve a nonlinear least-squares problem with dogleg trust-region steps.
///
/// Minimizes `0.5 * ||r(x)||^2` for `m >= n` residuals. Each Jacobian is
/// QR-factored once; trial steps come from [`dogleg`] on the packed `R` and
/// `Qᵀ·r`, and the radius follows the MINPACK rules: halved when the
/// actual/predicted reduction ratio is below 0.1, widened to `2·||D p||`
/// when the ratio reaches 0.5 (or the model is nearly exact). Variables are
/// scaled by the Jacobian column norms, which never decrease.
///
/// # Errors
///
/// [`OptimError::NotFinite`] if the starting residual or a gradient is not
/// finite, [`OptimError::Linalg`] for inconsistent sizes (including
/// `m < n`), [`OptimError::MaxIterations`] when the step budget runs out.
///
/// # Example
///
/// ```
/// use linkern::optim::{least_squares_dogleg, DoglegSettings};
/// use linkern::{Matrix, Vector};
///
/// // Fit y = a * exp(b * t)
/// let t = [0.0_f64, 1.0, 2.0, 3.0, 4.0];
/// let y = [2.0, 2.7, 3.65, 4.95, 6.7];
///
/// let fit = least_squares_dogleg(
///     |x: &Vector<f64>| Vector::from_vec(t.iter().zip(&y).map(|(ti, yi)| x[0] * (x[1] * ti).exp() - yi).collect()),
///     |x: &Vector<f64>| Matrix::from_fn(5, 2, |i, j| {
///         let e = (x[1] * t[i]).exp();
///         if j == 0 { e } else { x[0] * t[i] * e }
///     }),
///     &Vector::from_slice(&[1.0, 0.1]),
///     &DoglegSettings::default(),
/// ).unwrap();
/// assert!(fit.cost < 0.1);
/// ```
pub fn least_squares_dogleg<T: FloatScalar>(
    mut residual: impl FnMut(&Vector<T>) -> Vector<T>,
    mut jacobian: impl FnMut(&Vector<T>) -> Matrix<T>,
    x0: &Vector<T>,
    settings: &DoglegSettings<T>,
) -> Result<LeastSquaresResult<T>, OptimError> {
    let n = x0.len();
    let mut x = x0.clone();
    let mut r = residual(&x);
    let mut r_evals = 1usize;
    let mut j_evals = 0usize;

    let m = r.len();
    if m < n {
        return Err(LinalgError::InvalidArgument("least squares needs at least as many residuals as unknowns").into());
    }

    let (zero, one) = (T::zero(), T::one());
    let half = lit::<T>(0.5);
    let p1 = lit::<T>(0.1);
    let p0001 = lit::<T>(1e-4);

    let mut fnorm = stable_norm(r.as_slice());
    if !fnorm.is_finite() {
        return Err(OptimError::NotFinite);
    }

    let mut diag = vec![zero; n];
    let mut delta = zero;
    let mut packed_r = Vec::new();
    let mut qtb = vec![zero; n];
    let mut step = vec![zero; n];
    let mut grad_norm = zero;
    let mut need_jacobian = true;
    let mut first_trial = true;
    let mut successes = 0usize;

    let finish = |x: Vector<T>, fnorm: T, grad_norm: T, iterations, r_evals, j_evals| LeastSquaresResult {
        x,
        cost: half * fnorm * fnorm,
        grad_norm,
        iterations,
        r_evals,
        j_evals,
    };

    for iter in 0..settings.max_iter {
        if need_jacobian {
            let j = jacobian(&x);
            j_evals += 1;
            ensure_len(m, j.nrows())?;
            ensure_len(n, j.ncols())?;

            grad_norm = (&j.transpose() * &r).stable_norm();
            if !grad_norm.is_finite() {
                return Err(OptimError::NotFinite);
            }
            if grad_norm <= settings.grad_tol {
                log::debug!("dogleg lsq: gradient converged after {} steps", iter);
                return Ok(finish(x, fnorm, grad_norm, iter, r_evals, j_evals));
            }

            for (c, d) in diag.iter_mut().enumerate() {
                let cn = stable_norm(j.col_slice(c));
                *d = if j_evals == 1 {
                    if cn == zero {
                        one
                    } else {
                        cn
                    }
                } else {
                    (*d).max(cn)
                };
            }
            if j_evals == 1 {
                delta = settings.factor * scaled_norm(&diag, x.as_slice());
                if delta == zero {
                    delta = settings.factor;
                }
            }

            let qr = Qr::new(&j)?;
            packed_r = pack_upper_by_rows(&qr.r())?;
            let qtr = qr.qt_mul(&r)?;
            qtb.copy_from_slice(&qtr.as_slice()[..n]);
            need_jacobian = false;
        }

        dogleg(&packed_r, &diag, &qtb, delta, &mut step)?;
        for s in step.iter_mut() {
            *s = -*s;
        }
        let pnorm = scaled_norm(&diag, &step);
        if first_trial {
            delta = delta.min(pnorm);
            first_trial = false;
        }

        let x_new = &x + &Vector::from_slice(&step);
        let r_new = residual(&x_new);
        r_evals += 1;
        let fnorm1 = stable_norm(r_new.as_slice());

        let actred = if fnorm1.is_finite() && p1 * fnorm1 < fnorm {
            one - (fnorm1 / fnorm) * (fnorm1 / fnorm)
        } else {
            -one
        };
        // Linear model: ||r + J p||² = ||r||² - ||qtb||² + ||qtb + R p||².
        let qtb_norm = stable_norm(&qtb) / fnorm;
        let model_norm = stable_norm(&packed_upper_mul_add(&packed_r, &step, &qtb)) / fnorm;
        let prered = qtb_norm * qtb_norm - model_norm * model_norm;
        let ratio = if prered > zero { actred / prered } else { zero };

        if ratio < p1 {
            successes = 0;
            delta = half * delta;
        } else {
            successes += 1;
            if ratio >= half || successes > 1 {
                delta = delta.max(pnorm / half);
            }
            if (ratio - one).abs() <= p1 {
                delta = pnorm / half;
            }
        }
        log::trace!(
            "dogleg lsq: step {} |r| = {:?} -> {:?}, ratio = {:?}, delta = {:?}",
            iter,
            fnorm,
            fnorm1,
            ratio,
            delta
        );

        if ratio >= p0001 {
            x = x_new;
            r = r_new;
            fnorm = fnorm1;
            need_jacobian = true;
        }

        if actred.abs() <= settings.f_tol && prered <= settings.f_tol && half * ratio <= one {
            log::debug!("dogleg lsq: relative reduction converged after {} steps", iter + 1);
            return Ok(finish(x, fnorm, grad_norm, iter + 1, r_evals, j_evals));
        }
        if delta <= settings.x_tol * scaled_norm(&diag, x.as_slice()) {
            log::debug!("dogleg lsq: trust radius converged after {} steps", iter + 1);
            return Ok(finish(x, fnorm, grad_norm, iter + 1, r_evals, j_evals));
        }
    }

    log::debug!("dogleg lsq: no convergence in {} steps", settings.max_iter);
    Err(OptimError::MaxIterations)
}

/// `‖D·x‖`.
fn scaled_norm<T: FloatScalar>(diag: &[T], x: &[T]) -> T {
    let dx: Vec<T> = diag.iter().zip(x).map(|(&d, &v)| d * v).collect();
    stable_norm(&dx)
}

/// `b + R·p` for `R` packed by rows.
fn packed_upper_mul_add<T: FloatScalar>(r: &[T], p: &[T], b: &[T]) -> Vec<T> {
    let n = p.len();
    let mut out = b.to_vec();
    let mut l = 0;
    for (i, o) in out.iter_mut().enumerate() {
        for &pj in &p[i..n] {
            *o = *o + r[l] * pj;
            l += 1;
        }
    }
    out
}
