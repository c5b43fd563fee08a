//! Tile LQ kernels: row-panel factorization, triangle-beside-square
//! factorization and their reflector appliers.
//!
//! Reflectors are generated per row and applied from the right. A row
//! reflector `H = I - tau * v * v^H` stores its tail `v` in the row
//! itself (unit at the diagonal position); applying the forward product
//! `G = H_1 * ... * H_k` from the right uses the aggregated form
//! `G = I - W * T * W^H` with the same upper triangular `T` shape as the
//! QR side.

use num_traits::Zero;
use tessera_core::{Scalar, Trans};

use crate::householder::larfg;

/// Unblocked LQ of the `m x n` block: rows are conjugated, reflected and
/// left holding the reflector tails; `L` lands on and below the
/// diagonal.
fn gelq2<T: Scalar>(m: usize, n: usize, a: &mut [T], lda: usize, tau: &mut [T]) {
    for i in 0..m.min(n) {
        for p in 0..n - i {
            let idx = i + (i + p) * lda;
            a[idx] = a[idx].conj();
        }
        let mut alpha = a[i + i * lda];
        let tau_i = if i + 1 < n {
            larfg(&mut alpha, &mut a[i + (i + 1) * lda..], lda, n - i - 1)
        } else {
            larfg(&mut alpha, &mut [], 1, 0)
        };
        a[i + i * lda] = alpha;
        tau[i] = tau_i;
        if tau_i.is_zero() {
            continue;
        }

        // apply H_i from the right to the rows below
        for r in i + 1..m {
            let mut w = a[r + i * lda];
            for p in 1..n - i {
                w += a[r + (i + p) * lda] * a[i + (i + p) * lda];
            }
            let tw = tau_i * w;
            a[r + i * lda] -= tw;
            for p in 1..n - i {
                let vc = a[i + (i + p) * lda].conj();
                a[r + (i + p) * lda] -= tw * vc;
            }
        }
    }
}

/// Forward `T` factor for row reflectors: `v` holds `k` reflector rows
/// of length `len` (unit at column `j` for row `j`).
fn larft_lq<T: Scalar>(
    len: usize,
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
        for j in 0..i {
            let mut w = v[j + i * ldv].conj();
            for c in i + 1..len {
                w += v[j + c * ldv].conj() * v[i + c * ldv];
            }
            t[j + i * ldt] = -tau[i] * w;
        }
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

/// Blocked LQ factorization of one `m x n` tile with inner blocking
/// `ib`. On exit `a` holds `L` and the reflector rows, `t` the block
/// factors. `tau` needs `m` elements and `work` `ib * m`.
#[allow(clippy::too_many_arguments)]
pub fn gelqt<T: Scalar>(
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
    let mut ii = 0;
    while ii < k {
        let sb = ib.min(k - ii);

        gelq2(sb, n - ii, &mut a[ii + ii * lda..], lda, &mut tau[ii..]);
        larft_lq(n - ii, sb, &a[ii + ii * lda..], lda, &tau[ii..], &mut t[ii * ldt..], ldt);

        // apply G to the trailing rows (in place: reflector rows and
        // target rows interleave by column, so index arithmetic instead
        // of slice splitting)
        let crows = m - ii - sb;
        if crows > 0 {
            let len = n - ii;
            // M[r, j] = C[r, j] + sum_{p > j} C[r, p] * V[j, p]
            for j in 0..sb {
                for r in 0..crows {
                    let row = ii + sb + r;
                    let mut s = a[row + (ii + j) * lda];
                    for p in j + 1..len {
                        s += a[row + (ii + p) * lda] * a[ii + j + (ii + p) * lda];
                    }
                    work[r + j * crows] = s;
                }
            }
            // M := M * T, T upper triangular (columns right-to-left)
            for r in 0..crows {
                for j in (0..sb).rev() {
                    let mut s = T::zero();
                    for l in 0..=j {
                        s += work[r + l * crows] * t[l + (ii + j) * ldt];
                    }
                    work[r + j * crows] = s;
                }
            }
            // C := C - M * W^H
            for j in 0..sb {
                for r in 0..crows {
                    let row = ii + sb + r;
                    let mj = work[r + j * crows];
                    a[row + (ii + j) * lda] -= mj;
                    for p in j + 1..len {
                        let vc = a[ii + j + (ii + p) * lda].conj();
                        a[row + (ii + p) * lda] -= mj * vc;
                    }
                }
            }
        }
        ii += sb;
    }
}

/// Apply the `gelqt` reflectors from the right to a separate `m x n`
/// tile `c`: `trans = NoTrans` applies `G` (the factorization
/// direction), `ConjTrans` applies `G^H`. `v`/`t` are the factored tile
/// and block factors, `k` the reflector count. `work` needs `m * ib`.
#[allow(clippy::too_many_arguments)]
pub fn unmlq<T: Scalar>(
    trans: Trans,
    m: usize,
    n: usize,
    k: usize,
    ib: usize,
    v: &[T],
    ldv: usize,
    t: &[T],
    ldt: usize,
    c: &mut [T],
    ldc: usize,
    work: &mut [T],
) {
    debug_assert!(!matches!(trans, Trans::Trans));
    let conj = matches!(trans, Trans::ConjTrans);

    let mut blocks: Vec<usize> = (0..k).step_by(ib).collect();
    if conj {
        blocks.reverse();
    }
    for ii in blocks {
        let sb = ib.min(k - ii);
        // M[r, j] = C[r, ii+j] + sum_{p > ii+j} C[r, p] * V[ii+j, p]
        for j in 0..sb {
            let row = ii + j;
            for r in 0..m {
                let mut s = c[r + row * ldc];
                for p in row + 1..n {
                    s += c[r + p * ldc] * v[row + p * ldv];
                }
                work[r + j * m] = s;
            }
        }
        // M := M * op(T)
        for r in 0..m {
            if conj {
                for j in 0..sb {
                    let mut s = T::zero();
                    for l in j..sb {
                        s += work[r + l * m] * t[j + (ii + l) * ldt].conj();
                    }
                    work[r + j * m] = s;
                }
            } else {
                for j in (0..sb).rev() {
                    let mut s = T::zero();
                    for l in 0..=j {
                        s += work[r + l * m] * t[l + (ii + j) * ldt];
                    }
                    work[r + j * m] = s;
                }
            }
        }
        // C := C - M * W^H
        for j in 0..sb {
            let row = ii + j;
            for r in 0..m {
                let mj = work[r + j * m];
                c[r + row * ldc] -= mj;
                for p in row + 1..n {
                    c[r + p * ldc] -= mj * v[row + p * ldv].conj();
                }
            }
        }
    }
}

/// LQ factorization of the pair `(A1, A2)` where `A1` holds the lower
/// triangle produced by `gelqt` on the diagonal tile and `A2` is the
/// `m x n` tile to its right. Reflector rows span `(e_i, A2[i, :])`.
#[allow(clippy::too_many_arguments)]
pub fn tslqt<T: Scalar>(
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
    while ii < m {
        let sb = ib.min(m - ii);
        for i in ii..ii + sb {
            for p in 0..n {
                let idx = i + p * lda2;
                a2[idx] = a2[idx].conj();
            }
            let mut alpha = a1[i + i * lda1];
            let tau_i = larfg(&mut alpha, &mut a2[i..], lda2, n);
            a1[i + i * lda1] = alpha;
            tau[i] = tau_i;

            // apply H_i to the remaining rows of the current block
            for r in i + 1..ii + sb {
                let mut w = a1[r + i * lda1];
                for p in 0..n {
                    w += a2[r + p * lda2] * a2[i + p * lda2];
                }
                let tw = tau_i * w;
                a1[r + i * lda1] -= tw;
                for p in 0..n {
                    let vc = a2[i + p * lda2].conj();
                    a2[r + p * lda2] -= tw * vc;
                }
            }

            // T column from the tails of earlier reflectors
            let li = i - ii;
            for p in 0..li {
                let mut w = T::zero();
                for c in 0..n {
                    w += a2[ii + p + c * lda2].conj() * a2[i + c * lda2];
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

        // block-apply G to the trailing rows of the pair
        let crows = m - ii - sb;
        if crows > 0 {
            for j in 0..sb {
                for r in 0..crows {
                    let row = ii + sb + r;
                    let mut s = a1[row + (ii + j) * lda1];
                    for c in 0..n {
                        s += a2[row + c * lda2] * a2[ii + j + c * lda2];
                    }
                    work[r + j * crows] = s;
                }
            }
            for r in 0..crows {
                for j in (0..sb).rev() {
                    let mut s = T::zero();
                    for l in 0..=j {
                        s += work[r + l * crows] * t[l + (ii + j) * ldt];
                    }
                    work[r + j * crows] = s;
                }
            }
            for j in 0..sb {
                for r in 0..crows {
                    let row = ii + sb + r;
                    let mj = work[r + j * crows];
                    a1[row + (ii + j) * lda1] -= mj;
                    for c in 0..n {
                        let vc = a2[ii + j + c * lda2].conj();
                        a2[row + c * lda2] -= mj * vc;
                    }
                }
            }
        }
        ii += sb;
    }
}

/// Apply the `tslqt` reflectors (tails in `v`, factors in `t`) to the
/// tile pair `(A1, A2)` from the right: `NoTrans` applies `G` (the
/// factorization direction), `ConjTrans` applies `G^H`. `A1` is
/// `m x n1` with `n1 >= k`, `A2` is `m x n2`, `v` is `k x n2`.
#[allow(clippy::too_many_arguments)]
pub fn tsmlq<T: Scalar>(
    trans: Trans,
    m: usize,
    n1: usize,
    n2: usize,
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
    debug_assert!(n1 >= k);
    let conj = matches!(trans, Trans::ConjTrans);

    let mut blocks: Vec<usize> = (0..k).step_by(ib).collect();
    if conj {
        blocks.reverse();
    }
    for ii in blocks {
        let sb = ib.min(k - ii);
        // M[r, j] = A1[r, ii+j] + sum_c A2[r, c] * V[ii+j, c]
        for j in 0..sb {
            for r in 0..m {
                let mut s = a1[r + (ii + j) * lda1];
                for c in 0..n2 {
                    s += a2[r + c * lda2] * v[ii + j + c * ldv];
                }
                work[r + j * m] = s;
            }
        }
        // M := M * op(T)
        for r in 0..m {
            if conj {
                for j in 0..sb {
                    let mut s = T::zero();
                    for l in j..sb {
                        s += work[r + l * m] * t[j + (ii + l) * ldt].conj();
                    }
                    work[r + j * m] = s;
                }
            } else {
                for j in (0..sb).rev() {
                    let mut s = T::zero();
                    for l in 0..=j {
                        s += work[r + l * m] * t[l + (ii + j) * ldt];
                    }
                    work[r + j * m] = s;
                }
            }
        }
        // subtract
        for j in 0..sb {
            for r in 0..m {
                let mj = work[r + j * m];
                a1[r + (ii + j) * lda1] -= mj;
                for c in 0..n2 {
                    a2[r + c * lda2] -= mj * v[ii + j + c * ldv].conj();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemm::gemm;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tessera_core::Complex64;

    fn rand_mat(m: usize, n: usize, rng: &mut StdRng) -> Vec<f64> {
        (0..m * n).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    fn row_gram(m: usize, n: usize, a: &[f64], lda: usize) -> Vec<f64> {
        let mut g = vec![0.0; m * m];
        gemm(Trans::NoTrans, Trans::ConjTrans, m, m, n, 1.0, a, lda, a, lda, 0.0, &mut g, m);
        g
    }

    /// Q is unitary, so A A^H = L L^H.
    #[test]
    fn gelqt_preserves_the_row_gram() {
        let mut rng = StdRng::seed_from_u64(31);
        let (m, n, ib) = (4, 7, 2);
        let a0 = rand_mat(m, n, &mut rng);
        let mut a = a0.clone();
        let mut t = vec![0.0; ib * m];
        let mut tau = vec![0.0; m];
        let mut work = vec![0.0; ib * m];
        gelqt(m, n, ib, &mut a, m, &mut t, ib, &mut tau, &mut work);

        let mut l = vec![0.0; m * n];
        for j in 0..n.min(m) {
            for i in j..m {
                l[i + j * m] = a[i + j * m];
            }
        }
        let ga = row_gram(m, n, &a0, m);
        let gl = row_gram(m, n, &l, m);
        for i in 0..m * m {
            assert!((ga[i] - gl[i]).abs() < 1e-10, "row gram mismatch at {i}");
        }
    }

    /// Applying G then G^H to a separate tile restores it.
    #[test]
    fn unmlq_roundtrip_is_identity() {
        let mut rng = StdRng::seed_from_u64(32);
        let (m, n, ib) = (3, 6, 2);
        let mut a = rand_mat(m, n, &mut rng);
        let mut t = vec![0.0; ib * m];
        let mut tau = vec![0.0; m];
        let mut work = vec![0.0; ib * 8];
        gelqt(m, n, ib, &mut a, m, &mut t, ib, &mut tau, &mut work);

        let c0 = rand_mat(4, n, &mut rng);
        let mut c = c0.clone();
        unmlq(Trans::NoTrans, 4, n, m, ib, &a, m, &t, ib, &mut c, 4, &mut work);
        unmlq(Trans::ConjTrans, 4, n, m, ib, &a, m, &t, ib, &mut c, 4, &mut work);
        for i in 0..4 * n {
            assert!((c[i] - c0[i]).abs() < 1e-10);
        }
    }

    /// The pair factorization preserves the combined row gram
    /// L L^H + A2 A2^H = L' L'^H.
    #[test]
    fn tslqt_merges_row_grams() {
        let mut rng = StdRng::seed_from_u64(33);
        let (m, n, ib) = (3, 5, 2);

        let mut a1 = rand_mat(m, m, &mut rng);
        let mut t1 = vec![0.0; ib * m];
        let mut tau = vec![0.0; m];
        let mut work = vec![0.0; ib * m.max(n)];
        gelqt(m, m, ib, &mut a1, m, &mut t1, ib, &mut tau, &mut work);
        let mut l = vec![0.0; m * m];
        for j in 0..m {
            for i in j..m {
                l[i + j * m] = a1[i + j * m];
            }
        }

        let a2 = rand_mat(m, n, &mut rng);
        let before: Vec<f64> = {
            let g1 = row_gram(m, m, &l, m);
            let g2 = row_gram(m, n, &a2, m);
            g1.iter().zip(&g2).map(|(x, y)| x + y).collect()
        };

        let mut l_new = l.clone();
        let mut a2f = a2.clone();
        let mut t = vec![0.0; ib * m];
        tslqt(m, n, ib, &mut l_new, m, &mut a2f, m, &mut t, ib, &mut tau, &mut work);

        let mut l2 = vec![0.0; m * m];
        for j in 0..m {
            for i in j..m {
                l2[i + j * m] = l_new[i + j * m];
            }
        }
        let after = row_gram(m, m, &l2, m);
        for i in 0..m * m {
            assert!((before[i] - after[i]).abs() < 1e-10, "row gram mismatch at {i}");
        }
    }

    /// tsmlq NoTrans then ConjTrans restores the pair.
    #[test]
    fn tsmlq_roundtrip_is_identity() {
        let mut rng = StdRng::seed_from_u64(34);
        let (rows, n1, n2, ib) = (4, 3, 5, 2);

        let mut l = vec![0.0; n1 * n1];
        for j in 0..n1 {
            for i in j..n1 {
                l[i + j * n1] = rng.gen_range(1.0..2.0);
            }
        }
        let mut a2 = rand_mat(n1, n2, &mut rng);
        let mut t = vec![0.0; ib * n1];
        let mut tau = vec![0.0; n1];
        let mut work = vec![0.0; ib * rows.max(n1)];
        tslqt(n1, n2, ib, &mut l, n1, &mut a2, n1, &mut t, ib, &mut tau, &mut work);

        let c1 = rand_mat(rows, n1, &mut rng);
        let c2 = rand_mat(rows, n2, &mut rng);
        let mut d1 = c1.clone();
        let mut d2 = c2.clone();
        tsmlq(
            Trans::NoTrans, rows, n1, n2, n1, ib, &mut d1, rows, &mut d2, rows, &a2, n1, &t, ib,
            &mut work,
        );
        tsmlq(
            Trans::ConjTrans, rows, n1, n2, n1, ib, &mut d1, rows, &mut d2, rows, &a2, n1, &t, ib,
            &mut work,
        );
        for i in 0..rows * n1 {
            assert!((d1[i] - c1[i]).abs() < 1e-10);
        }
        for i in 0..rows * n2 {
            assert!((d2[i] - c2[i]).abs() < 1e-10);
        }
    }

    /// Complex LQ: row gram preservation pins the conjugation choices.
    #[test]
    fn complex_gelqt_preserves_row_gram() {
        let mut rng = StdRng::seed_from_u64(35);
        let (m, n, ib) = (3, 5, 2);
        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        let a0: Vec<Complex64> = (0..m * n)
            .map(|_| Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect();
        let mut a = a0.clone();
        let mut t = vec![zero; ib * m];
        let mut tau = vec![zero; m];
        let mut work = vec![zero; ib * m];
        gelqt(m, n, ib, &mut a, m, &mut t, ib, &mut tau, &mut work);

        let mut l = vec![zero; m * n];
        for j in 0..n.min(m) {
            for i in j..m {
                l[i + j * m] = a[i + j * m];
            }
        }
        let mut ga = vec![zero; m * m];
        let mut gl = vec![zero; m * m];
        gemm(Trans::NoTrans, Trans::ConjTrans, m, m, n, one, &a0, m, &a0, m, zero, &mut ga, m);
        gemm(Trans::NoTrans, Trans::ConjTrans, m, m, n, one, &l, m, &l, m, zero, &mut gl, m);
        for i in 0..m * m {
            assert!((ga[i] - gl[i]).abs() < 1e-10);
        }
    }
}
