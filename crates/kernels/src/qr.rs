//! Tile QR kernels: panel factorization, triangle-on-top-of-square
//! factorization and their reflector appliers.

use num_traits::Zero;
use tessera_core::{Scalar, Trans};

use crate::householder::{larfb_left, larfg, larft};

/// Unblocked Householder QR of the `m x n` block `a`, reflectors stored
/// below the diagonal, scalars in `tau`.
fn geqr2<T: Scalar>(m: usize, n: usize, a: &mut [T], lda: usize, tau: &mut [T]) {
    let kmin = m.min(n);
    for i in 0..kmin {
        // reflector from column i at and below the diagonal
        let col = i + i * lda;
        let (head, tail) = a[col..col + (m - i)].split_at_mut(1);
        let tau_i = larfg(&mut head[0], tail, 1, m - i - 1);
        tau[i] = tau_i;

        // apply H_i^H to the trailing columns
        let ct = tau_i.conj();
        if ct.is_zero() {
            continue;
        }
        for j in i + 1..n {
            let mut w = a[i + j * lda];
            for r in i + 1..m {
                w += a[r + i * lda].conj() * a[r + j * lda];
            }
            let wc = ct * w;
            a[i + j * lda] -= wc;
            for r in i + 1..m {
                let vr = a[r + i * lda];
                a[r + j * lda] -= wc * vr;
            }
        }
    }
}

/// Blocked QR factorization of one `m x n` tile with inner blocking
/// `ib`. On exit `a` holds `R` and the reflectors, `t` (`ib x n`,
/// leading dimension `ldt`) the triangular block factors. `tau` needs
/// `n` elements and `work` `ib * n`.
#[allow(clippy::too_many_arguments)]
pub fn geqrt<T: Scalar>(
    m: usize,
    n: usize,
    ib: usize,
    a: &mut [T],
    lda: usize,
    t: &mut [T],
    ldt: usize,
    tau: &mut [T],
    work: &mut [T],
) {
    let k = m.min(n);
    let mut i = 0;
    while i < k {
        let sb = ib.min(k - i);

        geqr2(m - i, sb, &mut a[i + i * lda..], lda, &mut tau[i..]);
        larft(m - i, sb, &a[i + i * lda..], lda, &tau[i..], &mut t[i * ldt..], ldt);

        if i + sb < n {
            // trailing update: the panel columns and the updated columns
            // are disjoint column ranges of the tile
            let (vpart, cpart) = a.split_at_mut((i + sb) * lda);
            larfb_left(
                m - i,
                n - i - sb,
                sb,
                &vpart[i + i * lda..],
                lda,
                &t[i * ldt..],
                ldt,
                &mut cpart[i..],
                lda,
                true,
                work,
            );
        }
        i += sb;
    }
}

/// Apply `Q` (`trans = NoTrans`) or `Q^H` (`trans = ConjTrans`) of a
/// `geqrt` factorization from the left to the `m x n` block `c`.
/// `a`/`t` are the factored tile and its block factors, `k` the number
/// of reflectors. `work` needs `ib * n` elements.
#[allow(clippy::too_many_arguments)]
pub fn unmqr<T: Scalar>(
    trans: Trans,
    m: usize,
    n: usize,
    k: usize,
    ib: usize,
    a: &[T],
    lda: usize,
    t: &[T],
    ldt: usize,
    c: &mut [T],
    ldc: usize,
    work: &mut [T],
) {
    debug_assert!(!matches!(trans, Trans::Trans));
    let conj = matches!(trans, Trans::ConjTrans);

    let mut blocks: Vec<usize> = (0..k).step_by(ib).collect();
    if !conj {
        blocks.reverse();
    }
    for i in blocks {
        let sb = ib.min(k - i);
        larfb_left(
            m - i,
            n,
            sb,
            &a[i + i * lda..],
            lda,
            &t[i * ldt..],
            ldt,
            &mut c[i..],
            ldc,
            conj,
            work,
        );
    }
}

/// QR factorization of the pair `(A1, A2)` where `A1` is the `n x n`
/// upper triangle produced by `geqrt` on the diagonal tile and `A2` an
/// `m x n` tile below it. Reflectors span `(e_i, A2[:, i])`; `A2` holds
/// their tails on exit, `t` the `ib x n` block factors.
#[allow(clippy::too_many_arguments)]
pub fn tsqrt<T: Scalar>(
    m: usize,
    n: usize,
    ib: usize,
    a1: &mut [T],
    lda1: usize,
    a2: &mut [T],
    lda2: usize,
    t: &mut [T],
    ldt: usize,
    tau: &mut [T],
    work: &mut [T],
) {
    let mut ii = 0;
    while ii < n {
        let sb = ib.min(n - ii);
        for i in ii..ii + sb {
            // reflector from (A1[i, i], A2[:, i])
            let mut alpha = a1[i + i * lda1];
            let tau_i = larfg(&mut alpha, &mut a2[i * lda2..i * lda2 + m], 1, m);
            a1[i + i * lda1] = alpha;
            tau[i] = tau_i;

            // apply H_i^H to the remaining columns of the current block
            let ct = tau_i.conj();
            for j in i + 1..ii + sb {
                let mut w = a1[i + j * lda1];
                for r in 0..m {
                    w += a2[r + i * lda2].conj() * a2[r + j * lda2];
                }
                let wc = ct * w;
                a1[i + j * lda1] -= wc;
                for r in 0..m {
                    let vr = a2[r + i * lda2];
                    a2[r + j * lda2] -= wc * vr;
                }
            }

            // T column: tails of earlier reflectors against this one
            let li = i - ii;
            for p in 0..li {
                let mut w = T::zero();
                for r in 0..m {
                    w += a2[r + (ii + p) * lda2].conj() * a2[r + i * lda2];
                }
                t[p + i * ldt] = -tau_i * w;
            }
            for p in 0..li {
                let mut s = T::zero();
                for l in p..li {
                    s += t[p + (ii + l) * ldt] * t[l + i * ldt];
                }
                t[p + i * ldt] = s;
            }
            t[li + i * ldt] = tau_i;
        }

        // block-apply H^H to the trailing columns of the pair
        if ii + sb < n {
            let ncols = n - ii - sb;
            for col in 0..ncols {
                let cj = ii + sb + col;
                for p in 0..sb {
                    let mut s = a1[ii + p + cj * lda1];
                    for r in 0..m {
                        s += a2[r + (ii + p) * lda2].conj() * a2[r + cj * lda2];
                    }
                    work[p + col * sb] = s;
                }
            }
            for col in 0..ncols {
                for p in (0..sb).rev() {
                    let mut s = T::zero();
                    for l in 0..=p {
                        s += t[l + (ii + p) * ldt].conj() * work[l + col * sb];
                    }
                    work[p + col * sb] = s;
                }
            }
            for col in 0..ncols {
                let cj = ii + sb + col;
                for p in 0..sb {
                    a1[ii + p + cj * lda1] -= work[p + col * sb];
                }
                for r in 0..m {
                    let mut s = T::zero();
                    for p in 0..sb {
                        s += a2[r + (ii + p) * lda2] * work[p + col * sb];
                    }
                    a2[r + cj * lda2] -= s;
                }
            }
        }
        ii += sb;
    }
}

/// Apply the `tsqrt` reflectors (tails in `v`, factors in `t`) to the
/// tile pair `(A1, A2)` from the left: `trans = ConjTrans` applies
/// `Q^H` (the factorization direction), `NoTrans` applies `Q`.
/// `A1` is `m1 x n`, `A2` is `m2 x n`, `v` is `m2 x k`.
#[allow(clippy::too_many_arguments)]
pub fn tsmqr<T: Scalar>(
    trans: Trans,
    m1: usize,
    m2: usize,
    n: usize,
    k: usize,
    ib: usize,
    a1: &mut [T],
    lda1: usize,
    a2: &mut [T],
    lda2: usize,
    v: &[T],
    ldv: usize,
    t: &[T],
    ldt: usize,
    work: &mut [T],
) {
    debug_assert!(!matches!(trans, Trans::Trans));
    debug_assert!(m1 >= k);
    let conj = matches!(trans, Trans::ConjTrans);

    let mut blocks: Vec<usize> = (0..k).step_by(ib).collect();
    if !conj {
        blocks.reverse();
    }
    for ii in blocks {
        let sb = ib.min(k - ii);
        // W[p, col] = A1[ii+p, col] + V[:, ii+p]^H * A2[:, col]
        for col in 0..n {
            for p in 0..sb {
                let mut s = a1[ii + p + col * lda1];
                for r in 0..m2 {
                    s += v[r + (ii + p) * ldv].conj() * a2[r + col * lda2];
                }
                work[p + col * sb] = s;
            }
        }
        // W := op(T) * W
        for col in 0..n {
            if conj {
                for p in (0..sb).rev() {
                    let mut s = T::zero();
                    for l in 0..=p {
                        s += t[l + (ii + p) * ldt].conj() * work[l + col * sb];
                    }
                    work[p + col * sb] = s;
                }
            } else {
                for p in 0..sb {
                    let mut s = T::zero();
                    for l in p..sb {
                        s += t[p + (ii + l) * ldt] * work[l + col * sb];
                    }
                    work[p + col * sb] = s;
                }
            }
        }
        // subtract
        for col in 0..n {
            for p in 0..sb {
                a1[ii + p + col * lda1] -= work[p + col * sb];
            }
            for r in 0..m2 {
                let mut s = T::zero();
                for p in 0..sb {
                    s += v[r + (ii + p) * ldv] * work[p + col * sb];
                }
                a2[r + col * lda2] -= s;
            }
        }
    }
}
