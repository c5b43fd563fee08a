//! Cholesky factorization of one tile.

use num_traits::{Float, Zero};
use tessera_core::{Scalar, Uplo};

/// Factor the Hermitian positive definite tile `A` as `L * L^H`
/// (`uplo = Lower`) or `U^H * U` (`uplo = Upper`) in place.
///
/// On breakdown returns `Err(j)` with the 1-based index of the first
/// diagonal whose pivot is not positive (or not finite); columns before
/// it hold the partial factorization, matching the LAPACK contract.
pub fn potrf<T: Scalar>(
    uplo: Uplo,
    n: usize,
    a: &mut [T],
    lda: usize,
) -> Result<(), usize> {
    debug_assert!(!matches!(uplo, Uplo::General));
    match uplo {
        Uplo::Lower => {
            for j in 0..n {
                let mut d = a[j + j * lda].re();
                for k in 0..j {
                    let v = a[j + k * lda];
                    d = d - (v * v.conj()).re();
                }
                if !(d > T::Real::zero()) || !d.is_finite() {
                    return Err(j + 1);
                }
                let d = d.sqrt();
                a[j + j * lda] = T::from_real(d);
                let inv = d.recip();
                for i in j + 1..n {
                    let mut s = a[i + j * lda];
                    for k in 0..j {
                        s -= a[i + k * lda] * a[j + k * lda].conj();
                    }
                    a[i + j * lda] = s.mul_real(inv);
                }
            }
        }
        _ => {
            for j in 0..n {
                let mut d = a[j + j * lda].re();
                for k in 0..j {
                    let v = a[k + j * lda];
                    d = d - (v * v.conj()).re();
                }
                if !(d > T::Real::zero()) || !d.is_finite() {
                    return Err(j + 1);
                }
                let d = d.sqrt();
                a[j + j * lda] = T::from_real(d);
                let inv = d.recip();
                for i in j + 1..n {
                    let mut s = a[j + i * lda];
                    for k in 0..j {
                        s -= a[k + j * lda].conj() * a[k + i * lda];
                    }
                    a[j + i * lda] = s.mul_real(inv);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemm::gemm;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tessera_core::Trans;

    fn spd(n: usize, rng: &mut StdRng) -> Vec<f64> {
        // B * B^T + n * I
        let b: Vec<f64> = (0..n * n).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let mut a = vec![0.0; n * n];
        gemm(Trans::NoTrans, Trans::Trans, n, n, n, 1.0, &b, n, &b, n, 0.0, &mut a, n);
        for j in 0..n {
            a[j + j * n] += n as f64;
        }
        a
    }

    #[test]
    fn lower_factor_reconstructs() {
        let mut rng = StdRng::seed_from_u64(11);
        let n = 6;
        let a0 = spd(n, &mut rng);
        let mut a = a0.clone();
        potrf(Uplo::Lower, n, &mut a, n).unwrap();

        // zero the strictly upper part, then L * L^T
        let mut l = a.clone();
        for j in 0..n {
            for i in 0..j {
                l[i + j * n] = 0.0;
            }
        }
        let mut rec = vec![0.0; n * n];
        gemm(Trans::NoTrans, Trans::Trans, n, n, n, 1.0, &l, n, &l, n, 0.0, &mut rec, n);
        for i in 0..n * n {
            assert!((rec[i] - a0[i]).abs() < 1e-10);
        }
    }

    #[test]
    fn upper_factor_reconstructs() {
        let mut rng = StdRng::seed_from_u64(12);
        let n = 5;
        let a0 = spd(n, &mut rng);
        let mut a = a0.clone();
        potrf(Uplo::Upper, n, &mut a, n).unwrap();

        let mut u = a.clone();
        for j in 0..n {
            for i in j + 1..n {
                u[i + j * n] = 0.0;
            }
        }
        let mut rec = vec![0.0; n * n];
        gemm(Trans::Trans, Trans::NoTrans, n, n, n, 1.0, &u, n, &u, n, 0.0, &mut rec, n);
        for i in 0..n * n {
            assert!((rec[i] - a0[i]).abs() < 1e-10);
        }
    }

    #[test]
    fn reports_first_bad_pivot_one_based() {
        let n = 4;
        let mut a = vec![0.0; n * n];
        for j in 0..n {
            a[j + j * n] = 1.0;
        }
        a[2 + 2 * n] = -1.0;
        assert_eq!(potrf(Uplo::Lower, n, &mut a, n), Err(3));
    }
}
