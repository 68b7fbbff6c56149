use alloc::vec;

use num_traits::{Float, One, Zero};

use crate::linalg::{ensure_len, ensure_square, Givens, LinalgError};
use crate::traits::LinalgScalar;
use crate::Matrix;

/// Reduce a Hermitian matrix to real symmetric tridiagonal form in place:
/// `Qᴴ·A·Q = T`.
///
/// Only the lower triangle of `a` is read. On return:
/// - `diag[0..n]` holds the diagonal of `T`
/// - `subdiag[0..n-1]` holds the sub-diagonal of `T`, always `>= 0`
/// - `hcoeffs[0..n-1]` holds the Householder scalars
/// - `a` holds `Q` when `extract_q` is set; otherwise the packed Householder
///   vectors below the sub-diagonal and stale values elsewhere
///
/// Each step `i` applies `H = I − τ·v·vᴴ` with `v = [1, v₁, …]` to rows and
/// columns `i+1..n`. The off-diagonal produced by the reflections is complex
/// for Hermitian input; a unitary diagonal `D = diag(φ)` folded into `Q`
/// rotates it onto the non-negative reals.
///
/// ```
/// use linkern::Matrix;
/// use linkern::linalg::tridiagonalize_in_place;
///
/// let mut a = Matrix::from_rows(3, 3, &[4.0_f64, 1.0, 2.0, 1.0, 3.0, 0.0, 2.0, 0.0, 1.0]);
/// let (mut d, mut e, mut h) = ([0.0; 3], [0.0; 2], [0.0; 2]);
/// tridiagonalize_in_place(&mut a, &mut d[..], &mut e[..], &mut h[..], true).unwrap();
/// assert_eq!(d[0], 4.0);
/// assert!((e[0] - 5.0_f64.sqrt()).abs() < 1e-12);
/// ```
pub fn tridiagonalize_in_place<T: LinalgScalar>(
    a: &mut Matrix<T>,
    diag: &mut [T::Real],
    subdiag: &mut [T::Real],
    hcoeffs: &mut [T],
    extract_q: bool,
) -> Result<(), LinalgError> {
    let n = a.nrows();
    ensure_square(n, a.ncols())?;
    ensure_len(n, diag.len())?;
    let m = n.saturating_sub(1);
    ensure_len(m, subdiag.len())?;
    ensure_len(m, hcoeffs.len())?;

    if n == 0 {
        return Ok(());
    }

    // Mirror the lower triangle so the trailing-block products can run on
    // whole columns.
    for j in 0..n {
        a[(j, j)] = T::from_real(a[(j, j)].re());
        for i in (j + 1)..n {
            a[(j, i)] = a[(i, j)].conj();
        }
    }

    let zero = <T::Real as Zero>::zero();
    let mut p = vec![T::zero(); n];

    for i in 0..m {
        let len = n - i - 1;
        let x0 = a[(i + 1, i)];

        let mut tail_sq = zero;
        for r in (i + 2)..n {
            tail_sq = tail_sq + a[(r, i)].modulus_sq();
        }

        if tail_sq == zero {
            // Column is already reduced; x0 stays in place as the off-diagonal.
            hcoeffs[i] = T::zero();
            continue;
        }

        let alpha = x0.modulus();
        let norm = Float::sqrt(alpha * alpha + tail_sq);
        let sigma = if alpha == zero {
            T::from_real(norm)
        } else {
            T::from_real(norm) * (x0 / T::from_real(alpha))
        };
        let v0 = x0 + sigma;
        let tau = (alpha + norm) / norm;
        hcoeffs[i] = T::from_real(tau);

        for r in (i + 2)..n {
            a[(r, i)] = a[(r, i)] / v0;
        }
        a[(i + 1, i)] = T::zero() - sigma;

        // p = τ·B·v over the trailing block B = a[i+1.., i+1..]
        let tau_t = T::from_real(tau);
        let p = &mut p[..len];
        p.iter_mut().for_each(|x| *x = T::zero());
        for c in 0..len {
            let vc = if c == 0 { T::one() } else { a[(i + 1 + c, i)] };
            for r in 0..len {
                p[r] = p[r] + a[(i + 1 + r, i + 1 + c)] * vc;
            }
        }
        for x in p.iter_mut() {
            *x = *x * tau_t;
        }

        // q = p − (τ/2)(vᴴp)·v, kept in p
        let mut vhp = p[0];
        for r in 1..len {
            vhp = vhp + a[(i + 1 + r, i)].conj() * p[r];
        }
        let half = T::from_real(tau / (<T::Real as One>::one() + <T::Real as One>::one()));
        let k = half * vhp;
        p[0] = p[0] - k;
        for r in 1..len {
            p[r] = p[r] - k * a[(i + 1 + r, i)];
        }

        // B −= v·qᴴ + q·vᴴ
        for c in 0..len {
            let vc = if c == 0 { T::one() } else { a[(i + 1 + c, i)] };
            let qc_conj = p[c].conj();
            let vc_conj = vc.conj();
            for r in 0..len {
                let vr = if r == 0 { T::one() } else { a[(i + 1 + r, i)] };
                let b = a[(i + 1 + r, i + 1 + c)];
                a[(i + 1 + r, i + 1 + c)] = b - vr * qc_conj - p[r] * vc_conj;
            }
        }
    }

    // Diagonal, and the phases that make the sub-diagonal real.
    let mut phases = vec![T::one(); n];
    for j in 0..n {
        diag[j] = a[(j, j)].re();
    }
    for j in 0..m {
        let e = a[(j + 1, j)];
        let mag = e.modulus();
        subdiag[j] = mag;
        phases[j + 1] = if mag == zero {
            phases[j]
        } else {
            phases[j] * (e / T::from_real(mag))
        };
    }

    if extract_q {
        form_q(a, hcoeffs);
        for (j, &phi) in phases.iter().enumerate() {
            if phi != T::one() {
                for x in a.col_slice_mut(j) {
                    *x = *x * phi;
                }
            }
        }
    }

    log::trace!("tridiagonalized {}x{} matrix", n, n);
    Ok(())
}

/// Overwrite the packed reflectors in `a` with `Q = H₀·H₁·…·H_{n−2}`.
///
/// Reflector `i` lives in column `i`, rows `i+2..n`. Shifting every vector
/// one column right leaves `Q[1.., 1..]` as a standard packed QR of order
/// `n − 1`, which is expanded backwards one reflector at a time.
fn form_q<T: LinalgScalar>(a: &mut Matrix<T>, hcoeffs: &[T]) {
    let n = a.nrows();
    for j in (1..n).rev() {
        for r in (j + 1)..n {
            a[(r, j)] = a[(r, j - 1)];
        }
    }
    for j in 0..n {
        a[(0, j)] = T::zero();
        a[(j, 0)] = T::zero();
    }
    a[(0, 0)] = T::one();

    // Q[1.., 1..], reflector k in column k + 1 with its implicit 1 on row k + 1.
    let m = n - 1;
    for k in (0..m).rev() {
        let tau = hcoeffs[k];
        let kc = k + 1;
        for jc in (kc + 1)..n {
            let mut dot = a[(kc, jc)];
            for r in (kc + 1)..n {
                dot = dot + a[(r, kc)].conj() * a[(r, jc)];
            }
            dot = dot * tau;
            a[(kc, jc)] = a[(kc, jc)] - dot;
            for r in (kc + 1)..n {
                let v = a[(r, kc)];
                a[(r, jc)] = a[(r, jc)] - dot * v;
            }
        }
        for r in (kc + 1)..n {
            a[(r, kc)] = T::zero() - tau * a[(r, kc)];
        }
        a[(kc, kc)] = T::one() - tau;
        for r in 1..kc {
            a[(r, kc)] = T::zero();
        }
    }
}

/// One implicit symmetric QR step with Wilkinson shift on the unreduced
/// block `start..=end` of a real symmetric tridiagonal matrix.
///
/// The shift comes from the trailing 2x2 of the block. A chain of Givens
/// rotations chases the bulge from `start` to `end`; each one updates two
/// diagonal entries and their neighbouring sub-diagonal entries in closed
/// form. When `q` is given, every rotation is also applied to columns
/// `k, k+1` of `q` from the right.
pub fn tridiagonal_qr_step<T: LinalgScalar>(
    diag: &mut [T::Real],
    subdiag: &mut [T::Real],
    start: usize,
    end: usize,
    mut q: Option<&mut Matrix<T>>,
) {
    let zero = <T::Real as Zero>::zero();
    let two = <T::Real as One>::one() + <T::Real as One>::one();

    let td = (diag[end - 1] - diag[end]) / two;
    let e = subdiag[end - 1];
    let mu = if td == zero {
        diag[end] - Float::abs(e)
    } else {
        let h = Float::hypot(td, e);
        let denom = if td > zero { td + h } else { td - h };
        diag[end] - (e / denom) * e
    };

    let mut x = diag[start] - mu;
    let mut z = subdiag[start];

    for k in start..end {
        let (g, r) = Givens::new(x, z);
        let (c, s) = (g.c, g.s);

        if k > start {
            subdiag[k - 1] = r;
        }

        let d_k = diag[k];
        let d_k1 = diag[k + 1];
        let e_k = subdiag[k];

        diag[k] = c * c * d_k + two * c * s * e_k + s * s * d_k1;
        diag[k + 1] = s * s * d_k - two * c * s * e_k + c * c * d_k1;
        subdiag[k] = c * s * (d_k1 - d_k) + (c * c - s * s) * e_k;

        if k + 1 < end {
            // G·T·Gᵀ leaves a bulge at (k, k+2).
            let e_next = subdiag[k + 1];
            x = subdiag[k];
            z = s * e_next;
            subdiag[k + 1] = c * e_next;
        }

        if let Some(q) = q.as_deref_mut() {
            g.apply_on_the_right(q, k, k + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    fn sym4() -> Matrix<f64> {
        Matrix::from_rows(
            4,
            4,
            &[
                4.0, 1.0, -2.0, 2.0, //
                1.0, 2.0, 0.0, 1.0, //
                -2.0, 0.0, 3.0, -2.0, //
                2.0, 1.0, -2.0, -1.0,
            ],
        )
    }

    fn tridiag(d: &[f64], e: &[f64]) -> Matrix<f64> {
        let n = d.len();
        Matrix::from_fn(n, n, |i, j| {
            if i == j {
                d[i]
            } else if i == j + 1 {
                e[j]
            } else if j == i + 1 {
                e[i]
            } else {
                0.0
            }
        })
    }

    #[test]
    fn similarity_holds() {
        let a = sym4();
        let mut q = a.clone();
        let (mut d, mut e, mut h) = ([0.0; 4], [0.0; 3], [0.0; 3]);
        tridiagonalize_in_place(&mut q, &mut d[..], &mut e[..], &mut h[..], true).unwrap();

        assert!(e.iter().all(|&x| x >= 0.0));
        let t = tridiag(&d, &e);
        let back = &(&q * &t) * &q.transpose();
        for i in 0..4 {
            for j in 0..4 {
                assert!((back[(i, j)] - a[(i, j)]).abs() < TOL, "({i},{j})");
            }
        }
        let qtq = &q.transpose() * &q;
        for i in 0..4 {
            for j in 0..4 {
                let expect = if i == j { 1.0 } else { 0.0 };
                assert!((qtq[(i, j)] - expect).abs() < TOL);
            }
        }
    }

    #[test]
    fn reads_lower_triangle_only() {
        let full = sym4();
        let mut lower = full.clone();
        for j in 0..4 {
            for i in 0..j {
                lower[(i, j)] = 99.0;
            }
        }
        let (mut d1, mut e1, mut h1) = ([0.0; 4], [0.0; 3], [0.0; 3]);
        let (mut d2, mut e2, mut h2) = ([0.0; 4], [0.0; 3], [0.0; 3]);
        let mut a1 = full.clone();
        tridiagonalize_in_place(&mut a1, &mut d1[..], &mut e1[..], &mut h1[..], false).unwrap();
        tridiagonalize_in_place(&mut lower, &mut d2[..], &mut e2[..], &mut h2[..], false).unwrap();
        assert_eq!(d1, d2);
        assert_eq!(e1, e2);
    }

    #[test]
    fn already_tridiagonal_gets_absolute_subdiag() {
        let mut a = tridiag(&[1.0, 2.0, 3.0], &[-1.0, 0.5]);
        let (mut d, mut e, mut h) = ([0.0; 3], [0.0; 2], [0.0; 2]);
        tridiagonalize_in_place(&mut a, &mut d[..], &mut e[..], &mut h[..], true).unwrap();
        assert_eq!(d, [1.0, 2.0, 3.0]);
        assert_eq!(e, [1.0, 0.5]);
        // Q is the sign flip diag(1, -1, -1)
        assert_eq!(a, Matrix::from_diagonal(&[1.0, -1.0, -1.0]));
    }

    #[test]
    fn buffer_sizes_are_checked() {
        let mut a = Matrix::<f64>::eye(3);
        let (mut d, mut e, mut h) = ([0.0; 3], [0.0; 1], [0.0; 2]);
        assert_eq!(
            tridiagonalize_in_place(&mut a, &mut d[..], &mut e[..], &mut h[..], false),
            Err(LinalgError::DimensionMismatch { expected: 2, got: 1 })
        );
        let mut r = Matrix::<f64>::zeros(2, 3);
        assert!(matches!(
            tridiagonalize_in_place(&mut r, &mut d[..], &mut e[..], &mut h[..], false),
            Err(LinalgError::NotSquare { .. })
        ));
    }

    #[test]
    fn qr_step_preserves_trace_and_shrinks_last_offdiag() {
        let mut d = [2.0_f64, 1.0, 4.0];
        let mut e = [1.0_f64, 0.5];
        let trace: f64 = d.iter().sum();
        let mut q = Matrix::<f64>::eye(3);
        let before = e[1].abs();
        tridiagonal_qr_step::<f64>(&mut d[..], &mut e[..], 0, 2, Some(&mut q));
        assert!((d.iter().sum::<f64>() - trace).abs() < TOL);
        assert!(e[1].abs() < before);

        let qtq = &q.transpose() * &q;
        for i in 0..3 {
            assert!((qtq[(i, i)] - 1.0).abs() < TOL);
        }
    }
}
