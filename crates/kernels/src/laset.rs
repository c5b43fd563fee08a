//! Tile fill kernel.

use tessera_core::{Scalar, Uplo};

/// Set the off-diagonal elements of the `uplo` part of the `m x n` block
/// to `alpha` and its diagonal to `beta`; the rest is untouched.
pub fn laset<T: Scalar>(uplo: Uplo, m: usize, n: usize, alpha: T, beta: T, a: &mut [T], lda: usize) {
    for j in 0..n {
        let (ilo, ihi) = match uplo {
            Uplo::Upper => (0, j.min(m)),
            Uplo::Lower => ((j + 1).min(m), m),
            Uplo::General => (0, m),
        };
        for i in ilo..ihi {
            if i != j {
                a[i + j * lda] = alpha;
            }
        }
    }
    for j in 0..n.min(m) {
        a[j + j * lda] = beta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_leaves_strict_lower() {
        let (m, n) = (3, 4);
        let mut a = vec![9.0f64; m * n];
        laset(Uplo::Upper, m, n, 1.0, 2.0, &mut a, m);
        for j in 0..n {
            for i in 0..m {
                let v = a[i + j * m];
                if i == j {
                    assert_eq!(v, 2.0);
                } else if i < j {
                    assert_eq!(v, 1.0);
                } else {
                    assert_eq!(v, 9.0);
                }
            }
        }
    }

    #[test]
    fn lower_leaves_strict_upper() {
        let (m, n) = (4, 3);
        let mut a = vec![9.0f64; m * n];
        laset(Uplo::Lower, m, n, -1.0, 0.0, &mut a, m);
        for j in 0..n {
            for i in 0..m {
                let v = a[i + j * m];
                if i == j {
                    assert_eq!(v, 0.0);
                } else if i > j {
                    assert_eq!(v, -1.0);
                } else {
                    assert_eq!(v, 9.0);
                }
            }
        }
    }

    #[test]
    fn general_fills_everything() {
        let (m, n) = (2, 3);
        let mut a = vec![9.0f64; m * n];
        laset(Uplo::General, m, n, 5.0, 7.0, &mut a, m);
        for j in 0..n {
            for i in 0..m {
                let v = a[i + j * m];
                assert_eq!(v, if i == j { 7.0 } else { 5.0 });
            }
        }
    }
}
