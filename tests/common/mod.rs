//! Shared helpers for the integration suites.
#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessera::{Complex64, Options, Scalar, Tessera, Trans};

/// Small runtime with a tile size that forces fractional edge tiles in
/// every scenario.
pub fn runtime(nb: usize, ib: usize) -> Tessera {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    Tessera::new(Options::new().nb(nb).ib(ib).threads(4)).unwrap()
}

pub fn rand_f64(m: usize, n: usize, rng: &mut StdRng) -> Vec<f64> {
    (0..m * n).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

pub fn rand_c64(m: usize, n: usize, rng: &mut StdRng) -> Vec<Complex64> {
    (0..m * n)
        .map(|_| Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
        .collect()
}

pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Reference dense multiply `C := alpha * op(A) * op(B) + beta * C`
/// evaluated with plain loops.
#[allow(clippy::too_many_arguments)]
pub fn naive_gemm<T: Scalar>(
    transa: Trans,
    transb: Trans,
    m: usize,
    n: usize,
    k: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    b: &[T],
    ldb: usize,
    beta: T,
    c: &mut [T],
    ldc: usize,
) {
    let opa = |i: usize, l: usize| match transa {
        Trans::NoTrans => a[i + l * lda],
        Trans::Trans => a[l + i * lda],
        Trans::ConjTrans => a[l + i * lda].conj(),
    };
    let opb = |l: usize, j: usize| match transb {
        Trans::NoTrans => b[l + j * ldb],
        Trans::Trans => b[j + l * ldb],
        Trans::ConjTrans => b[j + l * ldb].conj(),
    };
    for j in 0..n {
        for i in 0..m {
            let mut s = T::zero();
            for l in 0..k {
                s += opa(i, l) * opb(l, j);
            }
            c[i + j * ldc] = alpha * s + beta * c[i + j * ldc];
        }
    }
}

/// Frobenius norm of the difference, evaluated naively.
pub fn diff_fro<T: Scalar>(x: &[T], y: &[T]) -> f64
where
    T::Real: Into<f64>,
{
    assert_eq!(x.len(), y.len());
    let mut s = 0.0f64;
    for (a, b) in x.iter().zip(y) {
        let d = *a - *b;
        let m: f64 = d.abs().into();
        s += m * m;
    }
    s.sqrt()
}

/// Frobenius norm evaluated naively.
pub fn norm_fro<T: Scalar>(x: &[T]) -> f64
where
    T::Real: Into<f64>,
{
    let mut s = 0.0f64;
    for a in x {
        let m: f64 = a.abs().into();
        s += m * m;
    }
    s.sqrt()
}
