//! Cholesky factorization, failure propagation and solves.

mod common;

use common::*;
use tessera::{Complex64, Error, Trans, Uplo};

/// Diagonally dominant Hermitian matrix `B * B^H + n * I`.
fn hpd(n: usize, rng: &mut rand::rngs::StdRng) -> Vec<Complex64> {
    let b = rand_c64(n, n, rng);
    let mut a = vec![Complex64::new(0.0, 0.0); n * n];
    naive_gemm(
        Trans::NoTrans,
        Trans::ConjTrans,
        n,
        n,
        n,
        Complex64::new(1.0, 0.0),
        &b,
        n,
        &b,
        n,
        Complex64::new(0.0, 0.0),
        &mut a,
        n,
    );
    for j in 0..n {
        a[j + j * n] += Complex64::new(10.0, 0.0);
    }
    a
}

fn zero_strict_upper(n: usize, a: &mut [Complex64]) {
    for j in 0..n {
        for i in 0..j {
            a[i + j * n] = Complex64::new(0.0, 0.0);
        }
    }
}

/// n = 10, nb = 4: ||L * L^H - A||_F / ||A||_F stays at machine level.
#[test]
fn lower_factor_reconstructs_the_matrix() {
    let rt = runtime(4, 2);
    let mut rng = seeded(2001);
    let n = 10;
    let a0 = hpd(n, &mut rng);

    let mut a = a0.clone();
    rt.potrf(Uplo::Lower, n, &mut a, n).unwrap();

    let mut l = a.clone();
    zero_strict_upper(n, &mut l);
    let mut rec = vec![Complex64::new(0.0, 0.0); n * n];
    naive_gemm(
        Trans::NoTrans,
        Trans::ConjTrans,
        n,
        n,
        n,
        Complex64::new(1.0, 0.0),
        &l,
        n,
        &l,
        n,
        Complex64::new(0.0, 0.0),
        &mut rec,
        n,
    );
    assert!(diff_fro(&rec, &a0) / norm_fro(&a0) < 1e-13);
}

#[test]
fn upper_factor_reconstructs_the_matrix() {
    let rt = runtime(4, 2);
    let mut rng = seeded(2002);
    let n = 9;
    let a0 = hpd(n, &mut rng);

    let mut a = a0.clone();
    rt.potrf(Uplo::Upper, n, &mut a, n).unwrap();

    let mut u = a.clone();
    for j in 0..n {
        for i in j + 1..n {
            u[i + j * n] = Complex64::new(0.0, 0.0);
        }
    }
    let mut rec = vec![Complex64::new(0.0, 0.0); n * n];
    naive_gemm(
        Trans::ConjTrans,
        Trans::NoTrans,
        n,
        n,
        n,
        Complex64::new(1.0, 0.0),
        &u,
        n,
        &u,
        n,
        Complex64::new(0.0, 0.0),
        &mut rec,
        n,
    );
    assert!(diff_fro(&rec, &a0) / norm_fro(&a0) < 1e-13);
}

/// A = diag(1, 1, -1, 1, 1, 1) breaks at the third pivot; the failure
/// is recorded on the sequence and later tiles are left untouched.
#[test]
fn indefinite_matrix_reports_the_pivot() {
    let rt = runtime(4, 2);
    let n = 6;
    let mut a = vec![0.0f64; n * n];
    for j in 0..n {
        a[j + j * n] = 1.0;
    }
    a[2 + 2 * n] = -1.0;
    let a0 = a.clone();

    let err = rt.potrf(Uplo::Lower, n, &mut a, n).unwrap_err();
    assert_eq!(err, Error::NotPositiveDefinite(3));

    // the second tile row (outside the failed diagonal tile) must not
    // have been modified by the cancelled trailing tasks
    for j in 0..n {
        for i in 4..n {
            assert_eq!(a[i + j * n], a0[i + j * n], "element ({i}, {j}) modified");
        }
    }
}

#[test]
fn potrs_solves_against_the_factor() {
    let rt = runtime(4, 2);
    let mut rng = seeded(2003);
    let (n, nrhs) = (11, 3);
    let a0 = hpd(n, &mut rng);
    let x_true = rand_c64(n, nrhs, &mut rng);

    // b = A * x
    let mut b = vec![Complex64::new(0.0, 0.0); n * nrhs];
    naive_gemm(
        Trans::NoTrans,
        Trans::NoTrans,
        n,
        nrhs,
        n,
        Complex64::new(1.0, 0.0),
        &a0,
        n,
        &x_true,
        n,
        Complex64::new(0.0, 0.0),
        &mut b,
        n,
    );

    let mut a = a0.clone();
    rt.potrf(Uplo::Lower, n, &mut a, n).unwrap();
    rt.potrs(Uplo::Lower, n, nrhs, &a, n, &mut b, n).unwrap();

    assert!(diff_fro(&b, &x_true) / norm_fro(&x_true) < 1e-12);
}

#[test]
fn posv_factors_and_solves_in_one_call() {
    let rt = runtime(4, 2);
    let mut rng = seeded(2004);
    let (n, nrhs) = (10, 2);
    let a0 = hpd(n, &mut rng);
    let x_true = rand_c64(n, nrhs, &mut rng);

    let mut b = vec![Complex64::new(0.0, 0.0); n * nrhs];
    naive_gemm(
        Trans::NoTrans,
        Trans::NoTrans,
        n,
        nrhs,
        n,
        Complex64::new(1.0, 0.0),
        &a0,
        n,
        &x_true,
        n,
        Complex64::new(0.0, 0.0),
        &mut b,
        n,
    );

    let mut a = a0.clone();
    rt.posv(Uplo::Upper, n, nrhs, &mut a, n, &mut b, n).unwrap();
    assert!(diff_fro(&b, &x_true) / norm_fro(&x_true) < 1e-12);

    // the factor satisfies U^H * U = A
    let mut u = a.clone();
    for j in 0..n {
        for i in j + 1..n {
            u[i + j * n] = Complex64::new(0.0, 0.0);
        }
    }
    let mut rec = vec![Complex64::new(0.0, 0.0); n * n];
    naive_gemm(
        Trans::ConjTrans,
        Trans::NoTrans,
        n,
        n,
        n,
        Complex64::new(1.0, 0.0),
        &u,
        n,
        &u,
        n,
        Complex64::new(0.0, 0.0),
        &mut rec,
        n,
    );
    assert!(diff_fro(&rec, &a0) / norm_fro(&a0) < 1e-13);
}

/// posv on an indefinite matrix: the factorization failure flushes the
/// solve tasks and surfaces as the routine's status.
#[test]
fn posv_failure_flushes_the_solve() {
    let rt = runtime(4, 2);
    let n = 6;
    let mut a = vec![0.0f64; n * n];
    for j in 0..n {
        a[j + j * n] = 1.0;
    }
    a[2 + 2 * n] = -1.0;
    let mut b = vec![1.0f64; n];
    let b0 = b.clone();

    let err = rt.posv(Uplo::Lower, n, 1, &mut a, n, &mut b, n).unwrap_err();
    assert_eq!(err, Error::NotPositiveDefinite(3));
    // the cancelled solve and write-back drain as no-ops, so the
    // right-hand side is left exactly as it was
    assert_eq!(b, b0);
}
