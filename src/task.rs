//! Tile-kernel task bindings.
//!
//! One submission wrapper per tile kernel: each declares the kernel's
//! dependency shape on tile regions, checks the sequence at the top of
//! the body (a failed sequence drains as no-ops while dependencies are
//! still honored) and forwards kernel info codes into the request.
//!
//! Leading dimensions are derived from the tile's storage dims inside
//! the body; shape arguments (`mview`/`nview` extents) are passed in by
//! the emitters.

use tessera_core::{Access, Desc, Diag, Error, Scalar, Side, Trans, Uplo};
use tessera_kernels as kernels;
use tessera_runtime::{Region, Request, Sequence, Workspace};

use num_traits::Zero;

type Coord = (usize, usize);

/// `C(cm,cn) := alpha * op(A(am,an)) * op(B(bm,bn)) + beta * C(cm,cn)`
#[allow(clippy::too_many_arguments)]
pub(crate) fn gemm<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    transa: Trans,
    transb: Trans,
    m: usize,
    n: usize,
    k: usize,
    alpha: T,
    a: &Desc<T>,
    (am, an): Coord,
    b: &Desc<T>,
    (bm, bn): Coord,
    beta: T,
    c: &Desc<T>,
    (cm, cn): Coord,
    seq: &'env Sequence,
) {
    let deps = [
        a.tile_dep(am, an, Access::In),
        b.tile_dep(bm, bn, Access::In),
        c.tile_dep(cm, cn, Access::InOut),
    ];
    let (a, b, c) = (a.clone(), b.clone(), c.clone());
    reg.submit(&deps, move |_| {
        if !seq.ok() {
            return;
        }
        let lda = a.tile_dims(am, an).0.max(1);
        let ldb = b.tile_dims(bm, bn).0.max(1);
        let ldc = c.tile_dims(cm, cn).0.max(1);
        unsafe {
            kernels::gemm(
                transa,
                transb,
                m,
                n,
                k,
                alpha,
                a.tile_slice(am, an),
                lda,
                b.tile_slice(bm, bn),
                ldb,
                beta,
                c.tile_slice_mut(cm, cn),
                ldc,
            );
        }
    });
}

/// `C(cm,cn) := beta * C(cm,cn)` (the `alpha == 0` / empty-inner-dim
/// degenerate of GEMM, touching only `C`).
#[allow(clippy::too_many_arguments)]
pub(crate) fn gemm_scale<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    m: usize,
    n: usize,
    beta: T,
    c: &Desc<T>,
    (cm, cn): Coord,
    seq: &'env Sequence,
) {
    let deps = [c.tile_dep(cm, cn, Access::InOut)];
    let c = c.clone();
    reg.submit(&deps, move |_| {
        if !seq.ok() {
            return;
        }
        let ldc = c.tile_dims(cm, cn).0.max(1);
        unsafe {
            kernels::gemm(
                Trans::NoTrans,
                Trans::NoTrans,
                m,
                n,
                0,
                T::zero(),
                &[],
                1,
                &[],
                1,
                beta,
                c.tile_slice_mut(cm, cn),
                ldc,
            );
        }
    });
}

/// Symmetric rank-2k update of the diagonal tile `C(cm,cn)`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn syr2k<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    trans: Trans,
    n: usize,
    k: usize,
    alpha: T,
    a: &Desc<T>,
    (am, an): Coord,
    b: &Desc<T>,
    (bm, bn): Coord,
    beta: T,
    c: &Desc<T>,
    (cm, cn): Coord,
    seq: &'env Sequence,
) {
    let deps = [
        a.tile_dep(am, an, Access::In),
        b.tile_dep(bm, bn, Access::In),
        c.tile_dep(cm, cn, Access::InOut),
    ];
    let (a, b, c) = (a.clone(), b.clone(), c.clone());
    reg.submit(&deps, move |_| {
        if !seq.ok() {
            return;
        }
        let lda = a.tile_dims(am, an).0.max(1);
        let ldb = b.tile_dims(bm, bn).0.max(1);
        let ldc = c.tile_dims(cm, cn).0.max(1);
        unsafe {
            kernels::syr2k(
                uplo,
                trans,
                n,
                k,
                alpha,
                a.tile_slice(am, an),
                lda,
                b.tile_slice(bm, bn),
                ldb,
                beta,
                c.tile_slice_mut(cm, cn),
                ldc,
            );
        }
    });
}

/// Hermitian rank-k update of the diagonal tile `C(cm,cn)`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn herk<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    trans: Trans,
    n: usize,
    k: usize,
    alpha: T::Real,
    a: &Desc<T>,
    (am, an): Coord,
    beta: T::Real,
    c: &Desc<T>,
    (cm, cn): Coord,
    seq: &'env Sequence,
) {
    let deps = [a.tile_dep(am, an, Access::In), c.tile_dep(cm, cn, Access::InOut)];
    let (a, c) = (a.clone(), c.clone());
    reg.submit(&deps, move |_| {
        if !seq.ok() {
            return;
        }
        let lda = a.tile_dims(am, an).0.max(1);
        let ldc = c.tile_dims(cm, cn).0.max(1);
        unsafe {
            kernels::herk(
                uplo,
                trans,
                n,
                k,
                alpha,
                a.tile_slice(am, an),
                lda,
                beta,
                c.tile_slice_mut(cm, cn),
                ldc,
            );
        }
    });
}

/// Triangular solve of `B(bm,bn)` against the triangular tile
/// `A(am,an)`. An exactly zero stored diagonal fails the sequence with
/// `SingularFactor` (1-based at global offset `doff`) before the solve,
/// the way `trtrs` screens its factor.
#[allow(clippy::too_many_arguments)]
pub(crate) fn trsm<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    side: Side,
    uplo: Uplo,
    transa: Trans,
    diag: Diag,
    m: usize,
    n: usize,
    alpha: T,
    a: &Desc<T>,
    (am, an): Coord,
    b: &Desc<T>,
    (bm, bn): Coord,
    doff: usize,
    seq: &'env Sequence,
    req: &'env Request,
) {
    let deps = [a.tile_dep(am, an, Access::In), b.tile_dep(bm, bn, Access::InOut)];
    let (a, b) = (a.clone(), b.clone());
    reg.submit(&deps, move |_| {
        if !seq.ok() {
            return;
        }
        let lda = a.tile_dims(am, an).0.max(1);
        let ldb = b.tile_dims(bm, bn).0.max(1);
        unsafe {
            let at = a.tile_slice(am, an);
            if matches!(diag, Diag::NonUnit) {
                let order = if matches!(side, Side::Left) { m } else { n };
                for d in 0..order {
                    if at[d + d * lda].is_zero() {
                        seq.fail(req, Error::SingularFactor(doff + d + 1));
                        return;
                    }
                }
            }
            kernels::trsm(
                side,
                uplo,
                transa,
                diag,
                m,
                n,
                alpha,
                at,
                lda,
                b.tile_slice_mut(bm, bn),
                ldb,
            );
        }
    });
}

/// Triangular multiply of `B(bm,bn)` by the triangular tile `A(am,an)`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn trmm<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    side: Side,
    uplo: Uplo,
    transa: Trans,
    diag: Diag,
    m: usize,
    n: usize,
    alpha: T,
    a: &Desc<T>,
    (am, an): Coord,
    b: &Desc<T>,
    (bm, bn): Coord,
    seq: &'env Sequence,
) {
    let deps = [a.tile_dep(am, an, Access::In), b.tile_dep(bm, bn, Access::InOut)];
    let (a, b) = (a.clone(), b.clone());
    reg.submit(&deps, move |_| {
        if !seq.ok() {
            return;
        }
        let lda = a.tile_dims(am, an).0.max(1);
        let ldb = b.tile_dims(bm, bn).0.max(1);
        unsafe {
            kernels::trmm(
                side,
                uplo,
                transa,
                diag,
                m,
                n,
                alpha,
                a.tile_slice(am, an),
                lda,
                b.tile_slice_mut(bm, bn),
                ldb,
            );
        }
    });
}

/// Cholesky factorization of the diagonal tile; breakdown records
/// `NotPositiveDefinite(iinfo + j)` on the sequence.
#[allow(clippy::too_many_arguments)]
pub(crate) fn potrf<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    n: usize,
    a: &Desc<T>,
    (am, an): Coord,
    iinfo: usize,
    seq: &'env Sequence,
    req: &'env Request,
) {
    let deps = [a.tile_dep(am, an, Access::InOut)];
    let a = a.clone();
    reg.submit(&deps, move |_| {
        if !seq.ok() {
            return;
        }
        let lda = a.tile_dims(am, an).0.max(1);
        let res = unsafe { kernels::potrf(uplo, n, a.tile_slice_mut(am, an), lda) };
        if let Err(j) = res {
            seq.fail(req, Error::NotPositiveDefinite(iinfo + j));
        }
    });
}

/// In-place triangular product of the diagonal tile.
pub(crate) fn lauum<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    n: usize,
    a: &Desc<T>,
    (am, an): Coord,
    seq: &'env Sequence,
) {
    let deps = [a.tile_dep(am, an, Access::InOut)];
    let a = a.clone();
    reg.submit(&deps, move |_| {
        if !seq.ok() {
            return;
        }
        let lda = a.tile_dims(am, an).0.max(1);
        unsafe {
            kernels::lauum(uplo, n, a.tile_slice_mut(am, an), lda);
        }
    });
}

/// Fill the `uplo` region of one tile (`alpha` off-diagonal, `beta` on).
#[allow(clippy::too_many_arguments)]
pub(crate) fn laset<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    m: usize,
    n: usize,
    alpha: T,
    beta: T,
    a: &Desc<T>,
    (am, an): Coord,
    seq: &'env Sequence,
) {
    let deps = [a.tile_dep(am, an, Access::Out)];
    let a = a.clone();
    reg.submit(&deps, move |_| {
        if !seq.ok() {
            return;
        }
        let lda = a.tile_dims(am, an).0.max(1);
        unsafe {
            kernels::laset(uplo, m, n, alpha, beta, a.tile_slice_mut(am, an), lda);
        }
    });
}

/// QR panel factorization of the diagonal tile, producing its `T`
/// factors. Worker scratch is split `TAU[0..n]` / `WORK[n..]`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn geqrt<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    m: usize,
    n: usize,
    ib: usize,
    a: &Desc<T>,
    (am, an): Coord,
    t: &Desc<T>,
    (tm, tn): Coord,
    work: &'env Workspace<T>,
    seq: &'env Sequence,
) {
    let deps = [a.tile_dep(am, an, Access::InOut), t.tile_dep(tm, tn, Access::Out)];
    let (a, t) = (a.clone(), t.clone());
    reg.submit(&deps, move |wid| {
        if !seq.ok() {
            return;
        }
        let lda = a.tile_dims(am, an).0.max(1);
        let ldt = t.tile_dims(tm, tn).0.max(1);
        unsafe {
            let ws = work.worker_slice(wid);
            let (tau, w) = ws.split_at_mut(n);
            kernels::geqrt(
                m,
                n,
                ib,
                a.tile_slice_mut(am, an),
                lda,
                t.tile_slice_mut(tm, tn),
                ldt,
                tau,
                w,
            );
        }
    });
}

/// Apply the `geqrt` reflectors of `A(am,an)` to `C(cm,cn)` from the
/// left (`k` reflectors).
#[allow(clippy::too_many_arguments)]
pub(crate) fn unmqr<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    trans: Trans,
    m: usize,
    n: usize,
    k: usize,
    ib: usize,
    a: &Desc<T>,
    (am, an): Coord,
    t: &Desc<T>,
    (tm, tn): Coord,
    c: &Desc<T>,
    (cm, cn): Coord,
    work: &'env Workspace<T>,
    seq: &'env Sequence,
) {
    let deps = [
        a.tile_dep(am, an, Access::In),
        t.tile_dep(tm, tn, Access::In),
        c.tile_dep(cm, cn, Access::InOut),
    ];
    let (a, t, c) = (a.clone(), t.clone(), c.clone());
    reg.submit(&deps, move |wid| {
        if !seq.ok() {
            return;
        }
        let lda = a.tile_dims(am, an).0.max(1);
        let ldt = t.tile_dims(tm, tn).0.max(1);
        let ldc = c.tile_dims(cm, cn).0.max(1);
        unsafe {
            let ws = work.worker_slice(wid);
            let (_, w) = ws.split_at_mut(a.nb);
            kernels::unmqr(
                trans,
                m,
                n,
                k,
                ib,
                a.tile_slice(am, an),
                lda,
                t.tile_slice(tm, tn),
                ldt,
                c.tile_slice_mut(cm, cn),
                ldc,
                w,
            );
        }
    });
}

/// Triangle-on-top-of-square factorization of the pair
/// `(A1(a1m,a1n), A2(a2m,a2n))`, producing `T(tm,tn)`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn tsqrt<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    m: usize,
    n: usize,
    ib: usize,
    a1: &Desc<T>,
    (a1m, a1n): Coord,
    a2: &Desc<T>,
    (a2m, a2n): Coord,
    t: &Desc<T>,
    (tm, tn): Coord,
    work: &'env Workspace<T>,
    seq: &'env Sequence,
) {
    let deps = [
        a1.tile_dep(a1m, a1n, Access::InOut),
        a2.tile_dep(a2m, a2n, Access::InOut),
        t.tile_dep(tm, tn, Access::Out),
    ];
    let (a1, a2, t) = (a1.clone(), a2.clone(), t.clone());
    reg.submit(&deps, move |wid| {
        if !seq.ok() {
            return;
        }
        let lda1 = a1.tile_dims(a1m, a1n).0.max(1);
        let lda2 = a2.tile_dims(a2m, a2n).0.max(1);
        let ldt = t.tile_dims(tm, tn).0.max(1);
        unsafe {
            let ws = work.worker_slice(wid);
            let (tau, w) = ws.split_at_mut(n);
            kernels::tsqrt(
                m,
                n,
                ib,
                a1.tile_slice_mut(a1m, a1n),
                lda1,
                a2.tile_slice_mut(a2m, a2n),
                lda2,
                t.tile_slice_mut(tm, tn),
                ldt,
                tau,
                w,
            );
        }
    });
}

/// Apply the `tsqrt` reflectors (`V(vm,vn)`, `T(tm,tn)`) to the pair
/// `(A1(a1m,a1n), A2(a2m,a2n))` from the left.
#[allow(clippy::too_many_arguments)]
pub(crate) fn tsmqr<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    trans: Trans,
    m1: usize,
    m2: usize,
    n: usize,
    k: usize,
    ib: usize,
    a1: &Desc<T>,
    (a1m, a1n): Coord,
    a2: &Desc<T>,
    (a2m, a2n): Coord,
    v: &Desc<T>,
    (vm, vn): Coord,
    t: &Desc<T>,
    (tm, tn): Coord,
    work: &'env Workspace<T>,
    seq: &'env Sequence,
) {
    let deps = [
        v.tile_dep(vm, vn, Access::In),
        t.tile_dep(tm, tn, Access::In),
        a1.tile_dep(a1m, a1n, Access::InOut),
        a2.tile_dep(a2m, a2n, Access::InOut),
    ];
    let (a1, a2, v, t) = (a1.clone(), a2.clone(), v.clone(), t.clone());
    reg.submit(&deps, move |wid| {
        if !seq.ok() {
            return;
        }
        let lda1 = a1.tile_dims(a1m, a1n).0.max(1);
        let lda2 = a2.tile_dims(a2m, a2n).0.max(1);
        let ldv = v.tile_dims(vm, vn).0.max(1);
        let ldt = t.tile_dims(tm, tn).0.max(1);
        unsafe {
            let ws = work.worker_slice(wid);
            let (_, w) = ws.split_at_mut(v.nb);
            kernels::tsmqr(
                trans,
                m1,
                m2,
                n,
                k,
                ib,
                a1.tile_slice_mut(a1m, a1n),
                lda1,
                a2.tile_slice_mut(a2m, a2n),
                lda2,
                v.tile_slice(vm, vn),
                ldv,
                t.tile_slice(tm, tn),
                ldt,
                w,
            );
        }
    });
}

/// LQ panel factorization of the diagonal tile.
#[allow(clippy::too_many_arguments)]
pub(crate) fn gelqt<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    m: usize,
    n: usize,
    ib: usize,
    a: &Desc<T>,
    (am, an): Coord,
    t: &Desc<T>,
    (tm, tn): Coord,
    work: &'env Workspace<T>,
    seq: &'env Sequence,
) {
    let deps = [a.tile_dep(am, an, Access::InOut), t.tile_dep(tm, tn, Access::Out)];
    let (a, t) = (a.clone(), t.clone());
    reg.submit(&deps, move |wid| {
        if !seq.ok() {
            return;
        }
        let lda = a.tile_dims(am, an).0.max(1);
        let ldt = t.tile_dims(tm, tn).0.max(1);
        unsafe {
            let ws = work.worker_slice(wid);
            let (tau, w) = ws.split_at_mut(m);
            kernels::gelqt(
                m,
                n,
                ib,
                a.tile_slice_mut(am, an),
                lda,
                t.tile_slice_mut(tm, tn),
                ldt,
                tau,
                w,
            );
        }
    });
}

/// Apply the `gelqt` reflectors of `V(vm,vn)` to `C(cm,cn)` from the
/// right.
#[allow(clippy::too_many_arguments)]
pub(crate) fn unmlq<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    trans: Trans,
    m: usize,
    n: usize,
    k: usize,
    ib: usize,
    v: &Desc<T>,
    (vm, vn): Coord,
    t: &Desc<T>,
    (tm, tn): Coord,
    c: &Desc<T>,
    (cm, cn): Coord,
    work: &'env Workspace<T>,
    seq: &'env Sequence,
) {
    let deps = [
        v.tile_dep(vm, vn, Access::In),
        t.tile_dep(tm, tn, Access::In),
        c.tile_dep(cm, cn, Access::InOut),
    ];
    let (v, t, c) = (v.clone(), t.clone(), c.clone());
    reg.submit(&deps, move |wid| {
        if !seq.ok() {
            return;
        }
        let ldv = v.tile_dims(vm, vn).0.max(1);
        let ldt = t.tile_dims(tm, tn).0.max(1);
        let ldc = c.tile_dims(cm, cn).0.max(1);
        unsafe {
            let ws = work.worker_slice(wid);
            let (_, w) = ws.split_at_mut(v.nb);
            kernels::unmlq(
                trans,
                m,
                n,
                k,
                ib,
                v.tile_slice(vm, vn),
                ldv,
                t.tile_slice(tm, tn),
                ldt,
                c.tile_slice_mut(cm, cn),
                ldc,
                w,
            );
        }
    });
}

/// Triangle-beside-square LQ factorization of the pair.
#[allow(clippy::too_many_arguments)]
pub(crate) fn tslqt<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    m: usize,
    n: usize,
    ib: usize,
    a1: &Desc<T>,
    (a1m, a1n): Coord,
    a2: &Desc<T>,
    (a2m, a2n): Coord,
    t: &Desc<T>,
    (tm, tn): Coord,
    work: &'env Workspace<T>,
    seq: &'env Sequence,
) {
    let deps = [
        a1.tile_dep(a1m, a1n, Access::InOut),
        a2.tile_dep(a2m, a2n, Access::InOut),
        t.tile_dep(tm, tn, Access::Out),
    ];
    let (a1, a2, t) = (a1.clone(), a2.clone(), t.clone());
    reg.submit(&deps, move |wid| {
        if !seq.ok() {
            return;
        }
        let lda1 = a1.tile_dims(a1m, a1n).0.max(1);
        let lda2 = a2.tile_dims(a2m, a2n).0.max(1);
        let ldt = t.tile_dims(tm, tn).0.max(1);
        unsafe {
            let ws = work.worker_slice(wid);
            let (tau, w) = ws.split_at_mut(m);
            kernels::tslqt(
                m,
                n,
                ib,
                a1.tile_slice_mut(a1m, a1n),
                lda1,
                a2.tile_slice_mut(a2m, a2n),
                lda2,
                t.tile_slice_mut(tm, tn),
                ldt,
                tau,
                w,
            );
        }
    });
}

/// Apply the `tslqt` reflectors to the pair from the right.
#[allow(clippy::too_many_arguments)]
pub(crate) fn tsmlq<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    trans: Trans,
    m: usize,
    n1: usize,
    n2: usize,
    k: usize,
    ib: usize,
    a1: &Desc<T>,
    (a1m, a1n): Coord,
    a2: &Desc<T>,
    (a2m, a2n): Coord,
    v: &Desc<T>,
    (vm, vn): Coord,
    t: &Desc<T>,
    (tm, tn): Coord,
    work: &'env Workspace<T>,
    seq: &'env Sequence,
) {
    let deps = [
        v.tile_dep(vm, vn, Access::In),
        t.tile_dep(tm, tn, Access::In),
        a1.tile_dep(a1m, a1n, Access::InOut),
        a2.tile_dep(a2m, a2n, Access::InOut),
    ];
    let (a1, a2, v, t) = (a1.clone(), a2.clone(), v.clone(), t.clone());
    reg.submit(&deps, move |wid| {
        if !seq.ok() {
            return;
        }
        let lda1 = a1.tile_dims(a1m, a1n).0.max(1);
        let lda2 = a2.tile_dims(a2m, a2n).0.max(1);
        let ldv = v.tile_dims(vm, vn).0.max(1);
        let ldt = t.tile_dims(tm, tn).0.max(1);
        unsafe {
            let ws = work.worker_slice(wid);
            let (_, w) = ws.split_at_mut(v.nb);
            kernels::tsmlq(
                trans,
                m,
                n1,
                n2,
                k,
                ib,
                a1.tile_slice_mut(a1m, a1n),
                lda1,
                a2.tile_slice_mut(a2m, a2n),
                lda2,
                v.tile_slice(vm, vn),
                ldv,
                t.tile_slice(tm, tn),
                ldt,
                w,
            );
        }
    });
}
