use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use linkern::linalg::{Cholesky, SelfAdjointEigenSolver};
use linkern::optim::{dogleg, pack_upper_by_rows};
use linkern::skyline::{SkylineInplaceLu, SkylineMatrix, StorageOrder};

// ---------------------------------------------------------------------------
// Helpers: deterministic test matrices
// ---------------------------------------------------------------------------

fn entry(i: usize, j: usize) -> f64 {
    (((i + 1) * (j + 1)) as f64).sin()
}

fn symmetric(n: usize) -> linkern::Matrix<f64> {
    linkern::Matrix::from_fn(n, n, |i, j| entry(i.min(j), i.max(j)) + if i == j { n as f64 } else { 0.0 })
}

fn banded(n: usize, band: usize) -> linkern::Matrix<f64> {
    linkern::Matrix::from_fn(n, n, |i, j| {
        if i == j {
            4.0 * band as f64
        } else if i.abs_diff(j) <= band {
            entry(i, j)
        } else {
            0.0
        }
    })
}

// ---------------------------------------------------------------------------
// Self-adjoint eigen decomposition
// ---------------------------------------------------------------------------

fn symmetric_eigen(c: &mut Criterion) {
    let mut g = c.benchmark_group("symmetric_eigen");

    for n in [6, 20, 50] {
        let a = symmetric(n);
        let na = nalgebra::DMatrix::from_fn(n, n, |i, j| a[(i, j)]);

        g.bench_with_input(BenchmarkId::new("linkern", n), &a, |b, a| {
            let mut solver = SelfAdjointEigenSolver::with_size(n);
            b.iter(|| solver.compute(std::hint::black_box(a), true))
        });

        g.bench_with_input(BenchmarkId::new("nalgebra", n), &na, |b, na| {
            b.iter(|| std::hint::black_box(na).clone().symmetric_eigen())
        });
    }

    g.finish();
}

fn symmetric_eigenvalues_only(c: &mut Criterion) {
    let mut g = c.benchmark_group("symmetric_eigenvalues");
    let n = 50;
    let a = symmetric(n);
    let na = nalgebra::DMatrix::from_fn(n, n, |i, j| a[(i, j)]);

    g.bench_function("linkern", |b| {
        let mut solver = SelfAdjointEigenSolver::with_size(n);
        b.iter(|| solver.compute(std::hint::black_box(&a), false))
    });

    g.bench_function("nalgebra", |b| {
        b.iter(|| std::hint::black_box(&na).symmetric_eigenvalues())
    });

    g.finish();
}

// ---------------------------------------------------------------------------
// Cholesky
// ---------------------------------------------------------------------------

fn cholesky(c: &mut Criterion) {
    let mut g = c.benchmark_group("cholesky_20x20");
    let a = symmetric(20);
    let na = nalgebra::DMatrix::from_fn(20, 20, |i, j| a[(i, j)]);

    g.bench_function("linkern", |b| b.iter(|| Cholesky::new(std::hint::black_box(&a))));

    g.bench_function("nalgebra", |b| {
        b.iter(|| std::hint::black_box(&na).clone().cholesky())
    });

    g.finish();
}

// ---------------------------------------------------------------------------
// Skyline LU against a dense LU of the same banded matrix
// ---------------------------------------------------------------------------

fn skyline_lu(c: &mut Criterion) {
    let mut g = c.benchmark_group("banded_lu_200");
    let n = 200;
    let a = banded(n, 4);
    let rhs: Vec<f64> = (0..n).map(|i| entry(i, 0)).collect();

    for (name, order) in [("skyline_row_major", StorageOrder::RowMajor), ("skyline_col_major", StorageOrder::ColMajor)] {
        let Ok(template) = SkylineMatrix::from_dense(&a, order) else {
            continue;
        };
        g.bench_function(name, |b| {
            let mut x = vec![0.0; n];
            b.iter(|| {
                let mut s = template.clone();
                let lu = SkylineInplaceLu::new(&mut s, 0);
                let _ = lu.solve(std::hint::black_box(&rhs), &mut x, false);
            })
        });
    }

    let na = nalgebra::DMatrix::from_fn(n, n, |i, j| a[(i, j)]);
    let nb = nalgebra::DVector::from_column_slice(&rhs);
    g.bench_function("nalgebra_dense", |b| {
        b.iter(|| std::hint::black_box(&na).clone().lu().solve(&nb))
    });

    g.finish();
}

// ---------------------------------------------------------------------------
// Dogleg step
// ---------------------------------------------------------------------------

fn dogleg_step(c: &mut Criterion) {
    let mut g = c.benchmark_group("dogleg");

    for n in [10, 50] {
        let r_dense = linkern::Matrix::from_fn(n, n, |i, j| {
            if i == j {
                2.0 + entry(i, i).abs()
            } else if i < j {
                entry(i, j)
            } else {
                0.0
            }
        });
        let Ok(r) = pack_upper_by_rows(&r_dense) else {
            continue;
        };
        let diag = vec![1.0; n];
        let qtb: Vec<f64> = (0..n).map(|i| 10.0 * entry(i, 1)).collect();

        g.bench_with_input(BenchmarkId::new("linkern", n), &n, |b, &n| {
            let mut x = vec![0.0; n];
            b.iter(|| dogleg(std::hint::black_box(&r), &diag, &qtb, 0.5, &mut x))
        });
    }

    g.finish();
}

criterion_group!(
    benches,
    symmetric_eigen,
    symmetric_eigenvalues_only,
    cholesky,
    skyline_lu,
    dogleg_step,
);
criterion_main!(benches);
