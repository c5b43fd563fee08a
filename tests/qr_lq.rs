//! QR and LQ factorizations: least-squares solve, Q application and
//! unitary-invariance checks.

mod common;

use common::*;
use tessera::{Complex64, Trans};

/// m = 12, n = 5, nrhs = 3, nb = 4, ib = 2: the computed X satisfies
/// the normal equations A^H * (A*X - B) = 0 up to machine scale, which
/// characterizes the least-squares solution.
#[test]
fn geqrs_solves_least_squares() {
    let rt = runtime(4, 2);
    let mut rng = seeded(3001);
    let (m, n, nrhs) = (12, 5, 3);
    let a0 = rand_c64(m, n, &mut rng);
    let b0 = rand_c64(m, nrhs, &mut rng);
    let one = Complex64::new(1.0, 0.0);
    let zero = Complex64::new(0.0, 0.0);

    let mut a = a0.clone();
    let f = rt.geqrf(m, n, &mut a, m).unwrap();
    let mut b = b0.clone();
    rt.geqrs(m, n, nrhs, &a, m, &f, &mut b, m).unwrap();

    // residual r = A * X - B, using the leading n rows of b as X
    let mut r = b0.clone();
    let mut x = vec![zero; n * nrhs];
    for j in 0..nrhs {
        for i in 0..n {
            x[i + j * n] = b[i + j * m];
        }
    }
    naive_gemm(Trans::NoTrans, Trans::NoTrans, m, nrhs, n, one, &a0, m, &x, n, -one, &mut r, m);

    // A^H * r must vanish
    let mut atr = vec![zero; n * nrhs];
    naive_gemm(Trans::ConjTrans, Trans::NoTrans, n, nrhs, m, one, &a0, m, &r, m, zero, &mut atr, n);
    let scale = norm_fro(&a0) * norm_fro(&b0);
    assert!(norm_fro(&atr) / scale < 1e-12);
}

/// Solving against B = A * X_true recovers X_true exactly in the
/// consistent (zero-residual) case.
#[test]
fn geqrs_recovers_a_consistent_solution() {
    let rt = runtime(4, 2);
    let mut rng = seeded(3002);
    let (m, n, nrhs) = (10, 6, 2);
    let a0 = rand_c64(m, n, &mut rng);
    let x_true = rand_c64(n, nrhs, &mut rng);
    let one = Complex64::new(1.0, 0.0);
    let zero = Complex64::new(0.0, 0.0);

    let mut b = vec![zero; m * nrhs];
    naive_gemm(Trans::NoTrans, Trans::NoTrans, m, nrhs, n, one, &a0, m, &x_true, n, zero, &mut b, m);

    let mut a = a0.clone();
    let f = rt.geqrf(m, n, &mut a, m).unwrap();
    rt.geqrs(m, n, nrhs, &a, m, &f, &mut b, m).unwrap();

    let mut x = vec![zero; n * nrhs];
    for j in 0..nrhs {
        for i in 0..n {
            x[i + j * n] = b[i + j * m];
        }
    }
    assert!(diff_fro(&x, &x_true) / norm_fro(&x_true) < 1e-12);
}

/// R is upper trapezoidal and A^H A = R^H R (Q unitary).
#[test]
fn geqrf_preserves_the_gram_matrix() {
    let rt = runtime(4, 2);
    let mut rng = seeded(3003);
    let (m, n) = (11, 7);
    let a0 = rand_c64(m, n, &mut rng);
    let one = Complex64::new(1.0, 0.0);
    let zero = Complex64::new(0.0, 0.0);

    let mut a = a0.clone();
    rt.geqrf(m, n, &mut a, m).unwrap();

    let mut r = vec![zero; m * n];
    for j in 0..n {
        for i in 0..=j.min(m - 1) {
            r[i + j * m] = a[i + j * m];
        }
    }
    let mut ga = vec![zero; n * n];
    let mut gr = vec![zero; n * n];
    naive_gemm(Trans::ConjTrans, Trans::NoTrans, n, n, m, one, &a0, m, &a0, m, zero, &mut ga, n);
    naive_gemm(Trans::ConjTrans, Trans::NoTrans, n, n, m, one, &r, m, &r, m, zero, &mut gr, n);
    assert!(diff_fro(&ga, &gr) / norm_fro(&ga) < 1e-12);
}

/// Applying Q^H and then Q through the public entry restores C.
#[test]
fn unmqr_roundtrip_restores_the_block() {
    let rt = runtime(4, 2);
    let mut rng = seeded(3004);
    let (m, n, nrhs) = (9, 5, 4);
    let mut a = rand_c64(m, n, &mut rng);
    let f = rt.geqrf(m, n, &mut a, m).unwrap();

    let c0 = rand_c64(m, nrhs, &mut rng);
    let mut c = c0.clone();
    rt.unmqr(Trans::ConjTrans, m, nrhs, &a, m, &f, &mut c, m).unwrap();
    rt.unmqr(Trans::NoTrans, m, nrhs, &a, m, &f, &mut c, m).unwrap();
    assert!(diff_fro(&c, &c0) / norm_fro(&c0) < 1e-12);
}

/// L is lower trapezoidal and A A^H = L L^H (Q unitary), which
/// validates GELQF without materializing Q.
#[test]
fn gelqf_preserves_the_row_gram() {
    let rt = runtime(4, 2);
    let mut rng = seeded(3005);
    let (m, n) = (6, 13);
    let a0 = rand_c64(m, n, &mut rng);
    let one = Complex64::new(1.0, 0.0);
    let zero = Complex64::new(0.0, 0.0);

    let mut a = a0.clone();
    let f = rt.gelqf(m, n, &mut a, m).unwrap();
    assert_eq!(f.m(), m);
    assert_eq!(f.n(), n);

    let mut l = vec![zero; m * n];
    for j in 0..n.min(m) {
        for i in j..m {
            l[i + j * m] = a[i + j * m];
        }
    }
    let mut ga = vec![zero; m * m];
    let mut gl = vec![zero; m * m];
    naive_gemm(Trans::NoTrans, Trans::ConjTrans, m, m, n, one, &a0, m, &a0, m, zero, &mut ga, m);
    naive_gemm(Trans::NoTrans, Trans::ConjTrans, m, m, n, one, &l, m, &l, m, zero, &mut gl, m);
    assert!(diff_fro(&ga, &gl) / norm_fro(&ga) < 1e-12);
}

/// Real-precision QR on a tall matrix spanning several tile rows.
#[test]
fn real_tall_qr_least_squares() {
    let rt = runtime(3, 2);
    let mut rng = seeded(3006);
    let (m, n, nrhs) = (17, 4, 2);
    let a0 = rand_f64(m, n, &mut rng);
    let b0 = rand_f64(m, nrhs, &mut rng);

    let mut a = a0.clone();
    let f = rt.geqrf(m, n, &mut a, m).unwrap();
    let mut b = b0.clone();
    rt.geqrs(m, n, nrhs, &a, m, &f, &mut b, m).unwrap();

    let mut r = b0.clone();
    let mut x = vec![0.0; n * nrhs];
    for j in 0..nrhs {
        for i in 0..n {
            x[i + j * n] = b[i + j * m];
        }
    }
    naive_gemm(Trans::NoTrans, Trans::NoTrans, m, nrhs, n, 1.0, &a0, m, &x, n, -1.0, &mut r, m);
    let mut atr = vec![0.0; n * nrhs];
    naive_gemm(Trans::Trans, Trans::NoTrans, n, nrhs, m, 1.0, &a0, m, &r, m, 0.0, &mut atr, n);
    assert!(norm_fro(&atr) / (norm_fro(&a0) * norm_fro(&b0)) < 1e-12);
}
