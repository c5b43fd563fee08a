//! Symmetric rank-2k update on one tile.

use num_traits::Zero;
use tessera_core::{Scalar, Trans, Uplo};

/// `C := alpha*A*B^T + alpha*B*A^T + beta*C` (`trans = NoTrans`; `A`, `B`
/// are `n x k`) or `C := alpha*A^T*B + alpha*B^T*A + beta*C`
/// (`trans = Trans`; `A`, `B` are `k x n`), touching only the `uplo`
/// triangle of `C`. Symmetric, not Hermitian: no conjugation in either
/// case.
#[allow(clippy::too_many_arguments)]
pub fn syr2k<T: Scalar>(
    uplo: Uplo,
    trans: Trans,
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
    debug_assert!(!matches!(uplo, Uplo::General));
    debug_assert!(!matches!(trans, Trans::ConjTrans));
    for j in 0..n {
        let (ilo, ihi) = match uplo {
            Uplo::Lower => (j, n),
            _ => (0, j + 1),
        };
        for i in ilo..ihi {
            let mut sum = T::zero();
            for l in 0..k {
                let p = match trans {
                    Trans::NoTrans => {
                        a[i + l * lda] * b[j + l * ldb] + b[i + l * ldb] * a[j + l * lda]
                    }
                    _ => a[l + i * lda] * b[l + j * ldb] + b[l + i * ldb] * a[l + j * lda],
                };
                sum += p;
            }
            let idx = i + j * ldc;
            let prev = if beta.is_zero() { T::zero() } else { beta * c[idx] };
            c[idx] = prev + alpha * sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notrans_matches_two_products() {
        let (n, k) = (3, 2);
        let a: Vec<f64> = vec![1.0, 2.0, -1.0, 0.5, 3.0, 1.5];
        let b: Vec<f64> = vec![2.0, 0.0, 1.0, 1.0, -2.0, 0.5];
        let mut c = vec![0.25; n * n];
        syr2k(Uplo::Lower, Trans::NoTrans, n, k, 2.0, &a, n, &b, n, 3.0, &mut c, n);
        for j in 0..n {
            for i in j..n {
                let mut s = 0.0;
                for l in 0..k {
                    s += a[i + l * n] * b[j + l * n] + b[i + l * n] * a[j + l * n];
                }
                assert!((c[i + j * n] - (2.0 * s + 0.75)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn result_is_symmetric_when_both_triangles_computed() {
        let (n, k) = (3, 2);
        let a: Vec<f64> = (0..n * k).map(|x| x as f64 * 0.4 - 1.0).collect();
        let b: Vec<f64> = (0..n * k).map(|x| (x * x) as f64 * 0.1).collect();
        let mut lo = vec![0.0; n * n];
        let mut up = vec![0.0; n * n];
        syr2k(Uplo::Lower, Trans::NoTrans, n, k, 1.0, &a, n, &b, n, 0.0, &mut lo, n);
        syr2k(Uplo::Upper, Trans::NoTrans, n, k, 1.0, &a, n, &b, n, 0.0, &mut up, n);
        for j in 0..n {
            for i in j..n {
                assert!((lo[i + j * n] - up[j + i * n]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn trans_variant_agrees_with_relayout() {
        let (n, k) = (2, 3);
        let a: Vec<f64> = (0..k * n).map(|x| x as f64 + 1.0).collect(); // k x n
        let b: Vec<f64> = (0..k * n).map(|x| 0.5 - x as f64).collect(); // k x n
        // materialize A^T, B^T as n x k and use NoTrans
        let mut at = vec![0.0; n * k];
        let mut bt = vec![0.0; n * k];
        for l in 0..k {
            for j in 0..n {
                at[j + l * n] = a[l + j * k];
                bt[j + l * n] = b[l + j * k];
            }
        }
        let mut c1 = vec![0.0; n * n];
        let mut c2 = vec![0.0; n * n];
        syr2k(Uplo::Lower, Trans::Trans, n, k, 1.5, &a, k, &b, k, 0.0, &mut c1, n);
        syr2k(Uplo::Lower, Trans::NoTrans, n, k, 1.5, &at, n, &bt, n, 0.0, &mut c2, n);
        for (x, y) in c1.iter().zip(&c2) {
            assert!((x - y).abs() < 1e-12);
        }
    }
}
