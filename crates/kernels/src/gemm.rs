//! General matrix multiply on one tile.

use num_traits::Zero;
use tessera_core::{Scalar, Trans};

/// Element `(i, j)` of `op(a)`.
#[inline]
pub(crate) fn op<T: Scalar>(trans: Trans, a: &[T], lda: usize, i: usize, j: usize) -> T {
    match trans {
        Trans::NoTrans => a[i + j * lda],
        Trans::Trans => a[j + i * lda],
        Trans::ConjTrans => a[j + i * lda].conj(),
    }
}

/// `C := alpha * op(A) * op(B) + beta * C`
///
/// `op(A)` is `m x k`, `op(B)` is `k x n`, `C` is `m x n`. A zero `beta`
/// overwrites `C` without reading it, so `C` may start uninitialized in
/// the values sense (it must still be allocated).
#[allow(clippy::too_many_arguments)]
pub fn gemm<T: Scalar>(
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
    // scale C first so that alpha == 0 or k == 0 reduce to C := beta*C
    for j in 0..n {
        for i in 0..m {
            let idx = i + j * ldc;
            c[idx] = if beta.is_zero() { T::zero() } else { beta * c[idx] };
        }
    }
    if m == 0 || n == 0 || k == 0 || alpha.is_zero() {
        return;
    }

    for j in 0..n {
        for l in 0..k {
            let blj = alpha * op(transb, b, ldb, l, j);
            if blj.is_zero() {
                continue;
            }
            for i in 0..m {
                let ail = op(transa, a, lda, i, l);
                c[i + j * ldc] += ail * blj;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::Complex64;

    fn naive(
        m: usize,
        n: usize,
        k: usize,
        a: &[f64],
        lda: usize,
        b: &[f64],
        ldb: usize,
        c: &mut [f64],
        ldc: usize,
    ) {
        for j in 0..n {
            for i in 0..m {
                let mut s = 0.0;
                for l in 0..k {
                    s += a[i + l * lda] * b[l + j * ldb];
                }
                c[i + j * ldc] += s;
            }
        }
    }

    #[test]
    fn matches_naive_notrans() {
        let (m, n, k) = (4, 3, 5);
        let a: Vec<f64> = (0..m * k).map(|x| (x as f64) * 0.3 - 1.0).collect();
        let b: Vec<f64> = (0..k * n).map(|x| (x as f64) * 0.7 + 0.1).collect();
        let mut c = vec![0.5; m * n];
        let mut c_ref = c.clone();

        gemm(Trans::NoTrans, Trans::NoTrans, m, n, k, 1.0, &a, m, &b, k, 1.0, &mut c, m);
        naive(m, n, k, &a, m, &b, k, &mut c_ref, m);
        for (x, y) in c.iter().zip(&c_ref) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn transposed_operands_agree_with_relayout() {
        let (m, n, k) = (3, 4, 2);
        let a: Vec<f64> = (0..m * k).map(|x| x as f64 + 1.0).collect(); // m x k
        let b: Vec<f64> = (0..k * n).map(|x| (x as f64) * 0.5).collect(); // k x n

        // materialize A^T (k x m) and B^T (n x k)
        let mut at = vec![0.0; k * m];
        for i in 0..m {
            for l in 0..k {
                at[l + i * k] = a[i + l * m];
            }
        }
        let mut bt = vec![0.0; n * k];
        for l in 0..k {
            for j in 0..n {
                bt[j + l * n] = b[l + j * k];
            }
        }

        let mut c1 = vec![0.0; m * n];
        let mut c2 = vec![0.0; m * n];
        gemm(Trans::NoTrans, Trans::NoTrans, m, n, k, 2.0, &a, m, &b, k, 0.0, &mut c1, m);
        gemm(Trans::Trans, Trans::Trans, m, n, k, 2.0, &at, k, &bt, n, 0.0, &mut c2, m);
        assert_eq!(c1, c2);
    }

    #[test]
    fn conjugation_is_applied() {
        let i = Complex64::new(0.0, 1.0);
        let one = Complex64::new(1.0, 0.0);
        // A = [i], B = [1]: conj(A)^T * B = -i
        let mut c = vec![Complex64::new(0.0, 0.0)];
        gemm(
            Trans::ConjTrans,
            Trans::NoTrans,
            1,
            1,
            1,
            one,
            &[i],
            1,
            &[one],
            1,
            Complex64::new(0.0, 0.0),
            &mut c,
            1,
        );
        assert_eq!(c[0], Complex64::new(0.0, -1.0));
    }

    #[test]
    fn zero_alpha_only_scales_c() {
        let a = vec![f64::NAN; 4];
        let b = vec![f64::NAN; 4];
        let mut c = vec![2.0; 4];
        gemm(Trans::NoTrans, Trans::NoTrans, 2, 2, 2, 0.0, &a, 2, &b, 2, 3.0, &mut c, 2);
        assert_eq!(c, vec![6.0; 4]);
    }
}
