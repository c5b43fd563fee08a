//! Hermitian rank-k update on one tile.

use num_traits::Zero;
use tessera_core::{Scalar, Trans, Uplo};

/// `C := alpha * A * A^H + beta * C` (`trans = NoTrans`, `A` is `n x k`)
/// or `C := alpha * A^H * A + beta * C` (`trans = ConjTrans`, `A` is
/// `k x n`), touching only the `uplo` triangle of `C`. `alpha` and `beta`
/// are real; diagonal entries are forced real on output.
///
/// For real scalars this is exactly SYRK.
#[allow(clippy::too_many_arguments)]
pub fn herk<T: Scalar>(
    uplo: Uplo,
    trans: Trans,
    n: usize,
    k: usize,
    alpha: T::Real,
    a: &[T],
    lda: usize,
    beta: T::Real,
    c: &mut [T],
    ldc: usize,
) {
    debug_assert!(!matches!(uplo, Uplo::General));
    for j in 0..n {
        let (ilo, ihi) = match uplo {
            Uplo::Lower => (j, n),
            _ => (0, j + 1),
        };
        for i in ilo..ihi {
            let mut sum = T::zero();
            for l in 0..k {
                let x = match trans {
                    Trans::NoTrans => a[i + l * lda] * a[j + l * lda].conj(),
                    _ => a[l + i * lda].conj() * a[l + j * lda],
                };
                sum += x;
            }
            let idx = i + j * ldc;
            let prev = if beta.is_zero() { T::zero() } else { c[idx].mul_real(beta) };
            let mut v = prev + sum.mul_real(alpha);
            if i == j {
                v = T::from_real(v.re());
            }
            c[idx] = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::Complex64;

    #[test]
    fn lower_notrans_matches_direct_product() {
        let (n, k) = (3, 2);
        let a: Vec<f64> = vec![1.0, 2.0, 3.0, -1.0, 0.5, 2.0]; // 3x2
        let mut c = vec![0.0; n * n];
        herk(Uplo::Lower, Trans::NoTrans, n, k, 1.0, &a, n, 0.0, &mut c, n);
        for j in 0..n {
            for i in j..n {
                let mut s = 0.0;
                for l in 0..k {
                    s += a[i + l * n] * a[j + l * n];
                }
                assert!((c[i + j * n] - s).abs() < 1e-12);
            }
        }
        // strictly upper part untouched
        assert_eq!(c[n], 0.0);
    }

    #[test]
    fn complex_diagonal_is_real() {
        let n = 2;
        let a = vec![
            Complex64::new(1.0, 2.0),
            Complex64::new(0.0, -1.0),
            Complex64::new(3.0, 0.5),
            Complex64::new(1.0, 1.0),
        ]; // 2x2
        let mut c = vec![Complex64::new(0.0, 0.0); n * n];
        herk(Uplo::Lower, Trans::NoTrans, n, 2, 1.0, &a, n, 0.0, &mut c, n);
        assert_eq!(c[0].im, 0.0);
        assert_eq!(c[3].im, 0.0);
        // |1+2i|^2 + |3+0.5i|^2
        assert!((c[0].re - (5.0 + 9.25)).abs() < 1e-12);
    }

    #[test]
    fn conjtrans_upper_matches_direct_product() {
        let (n, k) = (2, 3);
        let a: Vec<f64> = vec![1.0, 0.0, 2.0, 1.0, -1.0, 4.0]; // 3x2 (k x n)
        let mut c = vec![1.0; n * n];
        herk(Uplo::Upper, Trans::ConjTrans, n, k, 2.0, &a, k, 1.0, &mut c, n);
        for j in 0..n {
            for i in 0..=j {
                let mut s = 0.0;
                for l in 0..k {
                    s += a[l + i * k] * a[l + j * k];
                }
                assert!((c[i + j * n] - (2.0 * s + 1.0)).abs() < 1e-12);
            }
        }
        // strictly lower untouched
        assert_eq!(c[1], 1.0);
    }
}
