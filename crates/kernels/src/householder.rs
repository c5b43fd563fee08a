//! Householder reflector building blocks shared by the QR and LQ panel
//! kernels.
//!
//! Conventions: an elementary reflector is `H = I - tau * v * v^H` with
//! `v[0] = 1` implicit. Column panels store `v` below the diagonal
//! (unit-lower); the aggregated block reflector of reflectors
//! `1..k` in forward order is `H_1 * H_2 * ... * H_k = I - V * T * V^H`
//! with `T` upper triangular.

use num_traits::{Float, One, Zero};
use tessera_core::Scalar;

/// Generate an elementary reflector for the vector `(alpha, x)` where
/// `x` holds `xlen` elements at stride `incx`. On return `alpha` is the
/// real value `beta`, `x` holds the reflector tail and the returned
/// `tau` satisfies `H^H * (alpha, x)^T = (beta, 0)^T`.
pub(crate) fn larfg<T: Scalar>(alpha: &mut T, x: &mut [T], incx: usize, xlen: usize) -> T {
    let mut xnorm_sq = T::Real::zero();
    for p in 0..xlen {
        let v = x[p * incx];
        xnorm_sq = xnorm_sq + v.re() * v.re() + v.im() * v.im();
    }

    let are = alpha.re();
    let aim = alpha.im();
    if xnorm_sq.is_zero() && aim.is_zero() {
        return T::zero();
    }

    let mag = (are * are + aim * aim + xnorm_sq).sqrt();
    let beta = if are >= T::Real::zero() { -mag } else { mag };
    let tau = T::from_parts((beta - are) / beta, -aim / beta);
    let scale = T::one() / (*alpha - T::from_real(beta));
    for p in 0..xlen {
        x[p * incx] = x[p * incx] * scale;
    }
    *alpha = T::from_real(beta);
    tau
}

/// Forward, columnwise `T` factor: `v` is `m x k` unit-lower, `tau` the
/// reflector scalars; fills the upper triangle of the `k x k` block at
/// `t` (leading dimension `ldt`).
pub(crate) fn larft<T: Scalar>(
    m: usize,
    k: usize,
    v: &[T],
    ldv: usize,
    tau: &[T],
    t: &mut [T],
    ldt: usize,
) {
    for i in 0..k {
        if tau[i].is_zero() {
            for j in 0..=i {
                t[j + i * ldt] = T::zero();
            }
            continue;
        }
        // w = V[:, 0..i]^H * v_i, exploiting the implicit unit diagonal
        for j in 0..i {
            let mut w = v[i + j * ldv].conj();
            for r in i + 1..m {
                w += v[r + j * ldv].conj() * v[r + i * ldv];
            }
            t[j + i * ldt] = -tau[i] * w;
        }
        // T[0..i, i] := T[0..i, 0..i] * w (in place, top-down)
        for j in 0..i {
            let mut s = T::zero();
            for l in j..i {
                s += t[j + l * ldt] * t[l + i * ldt];
            }
            t[j + i * ldt] = s;
        }
        t[i + i * ldt] = tau[i];
    }
}

/// Apply a block reflector from the left:
/// `C := (I - V * op(T) * V^H) * C`, with `op(T) = T^H` when `conjt`
/// (the `Q^H` direction used by factorizations) and `T` otherwise.
///
/// `V` is `m x k` unit-lower, `C` is `m x n`, `work` holds at least
/// `k * n` elements.
#[allow(clippy::too_many_arguments)]
pub(crate) fn larfb_left<T: Scalar>(
    m: usize,
    n: usize,
    k: usize,
    v: &[T],
    ldv: usize,
    t: &[T],
    ldt: usize,
    c: &mut [T],
    ldc: usize,
    conjt: bool,
    work: &mut [T],
) {
    if m == 0 || n == 0 || k == 0 {
        return;
    }
    // W = V^H * C  (k x n)
    for col in 0..n {
        for j in 0..k {
            let mut s = c[j + col * ldc];
            for r in j + 1..m {
                s += v[r + j * ldv].conj() * c[r + col * ldc];
            }
            work[j + col * k] = s;
        }
    }
    // W := op(T) * W
    for col in 0..n {
        if conjt {
            // T^H is lower triangular: sweep rows downward-dependent, so
            // walk bottom-up to keep the untouched prefix available
            for j in (0..k).rev() {
                let mut s = T::zero();
                for l in 0..=j {
                    s += t[l + j * ldt].conj() * work[l + col * k];
                }
                work[j + col * k] = s;
            }
        } else {
            for j in 0..k {
                let mut s = T::zero();
                for l in j..k {
                    s += t[j + l * ldt] * work[l + col * k];
                }
                work[j + col * k] = s;
            }
        }
    }
    // C := C - V * W
    for col in 0..n {
        for r in 0..m {
            let mut s = T::zero();
            for j in 0..k.min(r + 1) {
                let vv = if r == j { T::one() } else { v[r + j * ldv] };
                s += vv * work[j + col * k];
            }
            c[r + col * ldc] -= s;
        }
    }
}
