//! Triangular in-place product of one tile: `L^H * L` or `U * U^H`.

use num_traits::Zero;
use tessera_core::{Scalar, Uplo};

/// Replace the `uplo` triangle of `A` by `L^H * L` (`uplo = Lower`) or
/// `U * U^H` (`uplo = Upper`). The opposite triangle is not referenced.
pub fn lauum<T: Scalar>(uplo: Uplo, n: usize, a: &mut [T], lda: usize) {
    debug_assert!(!matches!(uplo, Uplo::General));
    if n == 0 {
        return;
    }
    // one row (or column) of carry so the triangle can be replaced while
    // later products still read the original factor
    let mut carry = vec![T::zero(); n];
    match uplo {
        Uplo::Lower => {
            // (L^H L)(i, j) = sum_{k >= i} conj(L(k, i)) * L(k, j), i >= j.
            // Row i only depends on rows >= i, so fill top-down.
            for i in 0..n {
                for (j, c) in carry.iter_mut().enumerate().take(i + 1) {
                    let mut s = T::zero();
                    for k in i..n {
                        s += a[k + i * lda].conj() * a[k + j * lda];
                    }
                    *c = s;
                }
                for j in 0..=i {
                    a[i + j * lda] = carry[j];
                }
            }
        }
        _ => {
            // (U U^H)(i, j) = sum_{k >= j} U(i, k) * conj(U(j, k)), i <= j.
            // Column j only depends on columns >= j, so fill left-to-right.
            for j in 0..n {
                for (i, c) in carry.iter_mut().enumerate().take(j + 1) {
                    let mut s = T::zero();
                    for k in j..n {
                        s += a[i + k * lda] * a[j + k * lda].conj();
                    }
                    *c = s;
                }
                for i in 0..=j {
                    a[i + j * lda] = carry[i];
                }
            }
        }
    }
}
