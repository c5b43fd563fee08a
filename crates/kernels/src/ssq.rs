//! Scaled sum-of-squares and max-norm tile kernels.
//!
//! Frobenius norms accumulate `(scale, sumsq)` pairs per tile so that
//! `scale^2 * sumsq` equals the sum of squares without overflow or
//! underflow in the squares; a combiner merges pairs with the standard
//! rescaling rule. Complex entries contribute their real and imaginary
//! parts separately, like `zlassq`.

use num_traits::{Float, Zero};
use tessera_core::{Scalar, Uplo};

/// Fold one real value into a running `(scale, sumsq)` pair.
#[inline]
fn lassq_val<R: Float>(v: R, scale: &mut R, sumsq: &mut R) {
    if !v.is_zero() {
        let a = v.abs();
        if *scale < a {
            let r = *scale / a;
            *sumsq = R::one() + *sumsq * r * r;
            *scale = a;
        } else {
            let r = a / *scale;
            *sumsq = *sumsq + r * r;
        }
    }
}

/// Merge the pair `(s, q)` into the running pair `(scale, sumsq)`.
pub fn ssq_merge<R: Float>(s: R, q: R, scale: &mut R, sumsq: &mut R) {
    if s.is_zero() {
        return;
    }
    if *scale < s {
        let r = *scale / s;
        *sumsq = q + *sumsq * r * r;
        *scale = s;
    } else {
        let r = s / *scale;
        *sumsq = *sumsq + q * r * r;
    }
}

/// `(scale, sumsq)` over a full `m x n` block, continuing the running
/// pair passed in (initialize with `scale = 0`, `sumsq = 1`).
pub fn gessq<T: Scalar>(
    m: usize,
    n: usize,
    a: &[T],
    lda: usize,
    scale: &mut T::Real,
    sumsq: &mut T::Real,
) {
    for j in 0..n {
        for i in 0..m {
            let v = a[i + j * lda];
            lassq_val(v.re(), scale, sumsq);
            lassq_val(v.im(), scale, sumsq);
        }
    }
}

/// `(scale, sumsq)` over the `uplo` triangle of an `n x n` block, with
/// the strict triangle counted twice (it stands for both symmetric
/// halves) and the diagonal once.
pub fn syssq<T: Scalar>(
    uplo: Uplo,
    n: usize,
    a: &[T],
    lda: usize,
    scale: &mut T::Real,
    sumsq: &mut T::Real,
) {
    debug_assert!(!matches!(uplo, Uplo::General));
    match uplo {
        Uplo::Upper => {
            for j in 1..n {
                for i in 0..j {
                    let v = a[i + j * lda];
                    lassq_val(v.re(), scale, sumsq);
                    lassq_val(v.im(), scale, sumsq);
                }
            }
        }
        _ => {
            for j in 0..n.saturating_sub(1) {
                for i in j + 1..n {
                    let v = a[i + j * lda];
                    lassq_val(v.re(), scale, sumsq);
                    lassq_val(v.im(), scale, sumsq);
                }
            }
        }
    }
    *sumsq = *sumsq + *sumsq;
    for i in 0..n {
        let d = a[i + i * lda];
        lassq_val(d.abs(), scale, sumsq);
    }
}

/// `max |a(i, j)|` over a full `m x n` block.
pub fn gemax<T: Scalar>(m: usize, n: usize, a: &[T], lda: usize) -> T::Real {
    let mut v = T::Real::zero();
    for j in 0..n {
        for i in 0..m {
            let x = a[i + j * lda].abs();
            if x > v {
                v = x;
            }
        }
    }
    v
}

/// `max |a(i, j)|` over the `uplo` triangle (diagonal included) of an
/// `n x n` block.
pub fn symax<T: Scalar>(uplo: Uplo, n: usize, a: &[T], lda: usize) -> T::Real {
    debug_assert!(!matches!(uplo, Uplo::General));
    let mut v = T::Real::zero();
    for j in 0..n {
        let (ilo, ihi) = match uplo {
            Uplo::Lower => (j, n),
            _ => (0, j + 1),
        };
        for i in ilo..ihi {
            let x = a[i + j * lda].abs();
            if x > v {
                v = x;
            }
        }
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::Complex64;

    #[test]
    fn gessq_equals_plain_sum_of_squares() {
        let a = vec![3.0f64, -4.0, 0.5, 2.0];
        let (mut scale, mut sumsq) = (0.0, 1.0);
        gessq(2, 2, &a, 2, &mut scale, &mut sumsq);
        let got = scale * scale * sumsq;
        let want: f64 = a.iter().map(|x| x * x).sum();
        assert!((got - want).abs() < 1e-12);
    }

    #[test]
    fn gessq_survives_extreme_magnitudes() {
        let a = vec![1e300f64, 1e-300, 1e300];
        let (mut scale, mut sumsq) = (0.0, 1.0);
        gessq(3, 1, &a, 3, &mut scale, &mut sumsq);
        // scale carries the magnitude; sumsq stays modest
        assert_eq!(scale, 1e300);
        assert!((sumsq - 2.0).abs() < 1e-12);
    }

    #[test]
    fn complex_parts_count_separately() {
        let a = vec![Complex64::new(3.0, 4.0)];
        let (mut scale, mut sumsq) = (0.0, 1.0);
        gessq(1, 1, &a, 1, &mut scale, &mut sumsq);
        assert!((scale * scale * sumsq - 25.0).abs() < 1e-12);
    }

    #[test]
    fn syssq_doubles_the_strict_triangle() {
        let n = 3;
        // symmetric matrix with known entries
        let a = vec![1.0f64, 2.0, 3.0, 2.0, 4.0, 5.0, 3.0, 5.0, 6.0];
        let (mut scale, mut sumsq) = (0.0, 1.0);
        syssq(Uplo::Lower, n, &a, n, &mut scale, &mut sumsq);
        let got = scale * scale * sumsq;
        let want: f64 = a.iter().map(|x| x * x).sum();
        assert!((got - want).abs() < 1e-12);
    }

    #[test]
    fn merge_agrees_with_single_pass() {
        let a = vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
        let (mut s1, mut q1) = (0.0, 1.0);
        gessq(3, 1, &a[..3], 3, &mut s1, &mut q1);
        let (mut s2, mut q2) = (0.0, 1.0);
        gessq(3, 1, &a[3..], 3, &mut s2, &mut q2);
        let (mut sm, mut qm) = (0.0, 1.0);
        ssq_merge(s1, q1, &mut sm, &mut qm);
        ssq_merge(s2, q2, &mut sm, &mut qm);

        let (mut s, mut q) = (0.0, 1.0);
        gessq(6, 1, &a, 6, &mut s, &mut q);
        assert!((sm * sm * qm - s * s * q).abs() < 1e-12);
    }
}
