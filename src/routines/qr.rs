//! Blocked QR: factorization (GEQRF), Q application (UNMQR) and the
//! least-squares solve (GEQRS).

use num_traits::One;
use tessera_core::{Desc, Diag, Error, Result, Scalar, Side, Trans, Uplo};
use tessera_runtime::{Region, Request, Sequence, SharedSlice, Workspace};

use crate::routines::trsm::ptrsm;
use crate::runtime::{check_matrix, Tessera};
use crate::task;
use crate::translate;

/// Triangular block factors produced by [`Tessera::geqrf`], kept in
/// tile layout for later Q applications and solves.
pub struct QrFactors<T> {
    pub(crate) t: Desc<T>,
    pub(crate) m: usize,
    pub(crate) n: usize,
}

impl<T> QrFactors<T> {
    /// Rows of the factored matrix.
    pub fn m(&self) -> usize {
        self.m
    }

    /// Columns of the factored matrix.
    pub fn n(&self) -> usize {
        self.n
    }

    /// The `T`-factor descriptor.
    pub fn t(&self) -> &Desc<T> {
        &self.t
    }
}

impl Tessera {
    /// Blocked QR factorization of the `m x n` matrix `A`, in place:
    /// `R` lands on and above the diagonal, the Householder reflectors
    /// below it. Returns the triangular block factors needed by
    /// [`Tessera::unmqr`] and [`Tessera::geqrs`].
    pub fn geqrf<T: Scalar>(
        &self,
        m: usize,
        n: usize,
        a: &mut [T],
        lda: usize,
    ) -> Result<QrFactors<T>> {
        check_matrix(a, lda, m, n, "a", "lda")?;

        let nb = self.nb();
        let ib = self.ib();
        let da = Desc::general(nb, nb, m, n, 0, 0, m, n)?;
        let dt = Desc::for_t_factors(&da, ib)?;
        if m == 0 || n == 0 {
            return Ok(QrFactors { t: dt, m, n });
        }

        let work = Workspace::alloc(self.threads(), nb + ib * nb)?;
        let seq = Sequence::new();
        let req = Request::new();
        let sa = SharedSlice::from_mut(a);

        self.pool.region(|reg| {
            translate::cm2ccrb(reg, sa, lda, &da, &seq);
            pgeqrf(reg, ib, &da, &dt, &work, &seq, &req);
            translate::ccrb2cm(reg, &da, sa, lda, &seq);
        });
        seq.status()?;
        Ok(QrFactors { t: dt, m, n })
    }

    /// Apply `Q` (`trans = NoTrans`) or `Q^H` (`trans = ConjTrans`)
    /// from the left to the `m x n` matrix `C`, where `Q` comes from a
    /// [`Tessera::geqrf`] factorization held in `a`/`f`.
    #[allow(clippy::too_many_arguments)]
    pub fn unmqr<T: Scalar>(
        &self,
        trans: Trans,
        m: usize,
        n: usize,
        a: &[T],
        lda: usize,
        f: &QrFactors<T>,
        c: &mut [T],
        ldc: usize,
    ) -> Result<()> {
        if matches!(trans, Trans::Trans) {
            return Err(Error::IllegalValue { arg: "trans" });
        }
        if m != f.m {
            return Err(Error::IllegalValue { arg: "m" });
        }
        check_matrix(a, lda, f.m, f.n, "a", "lda")?;
        check_matrix(c, ldc, m, n, "c", "ldc")?;
        if m == 0 || n == 0 || f.n == 0 {
            return Ok(());
        }

        let nb = self.nb();
        let ib = self.ib();
        let da = Desc::general(nb, nb, f.m, f.n, 0, 0, f.m, f.n)?;
        let dc = Desc::general(nb, nb, m, n, 0, 0, m, n)?;
        let work = Workspace::alloc(self.threads(), nb + ib * nb)?;
        let seq = Sequence::new();
        let req = Request::new();
        let sa = SharedSlice::from_ref(a);
        let sc = SharedSlice::from_mut(c);

        self.pool.region(|reg| {
            translate::cm2ccrb(reg, sa, lda, &da, &seq);
            translate::cm2ccrb(reg, sc, ldc, &dc, &seq);
            punmqr(reg, trans, ib, &da, &f.t, &dc, &work, &seq, &req);
            translate::ccrb2cm(reg, &dc, sc, ldc, &seq);
        });
        seq.status()
    }

    /// Minimum-norm solve of `min ||A*X - B||` using a factorization
    /// from [`Tessera::geqrf`] (`m >= n`). On exit the leading
    /// `n x nrhs` part of `B` holds `X`.
    #[allow(clippy::too_many_arguments)]
    pub fn geqrs<T: Scalar>(
        &self,
        m: usize,
        n: usize,
        nrhs: usize,
        a: &[T],
        lda: usize,
        f: &QrFactors<T>,
        b: &mut [T],
        ldb: usize,
    ) -> Result<()> {
        if n > m {
            return Err(Error::IllegalValue { arg: "n" });
        }
        if m != f.m || n != f.n {
            return Err(Error::IllegalValue { arg: "m" });
        }
        check_matrix(a, lda, m, n, "a", "lda")?;
        check_matrix(b, ldb, m, nrhs, "b", "ldb")?;
        if m == 0 || n == 0 || nrhs == 0 {
            return Ok(());
        }

        let nb = self.nb();
        let ib = self.ib();
        let da = Desc::general(nb, nb, m, n, 0, 0, m, n)?;
        let db = Desc::general(nb, nb, m, nrhs, 0, 0, m, nrhs)?;
        let work = Workspace::alloc(self.threads(), nb + ib * nb)?;
        let seq = Sequence::new();
        let req = Request::new();
        let sa = SharedSlice::from_ref(a);
        let sb = SharedSlice::from_mut(b);

        self.pool.region(|reg| {
            translate::cm2ccrb(reg, sa, lda, &da, &seq);
            translate::cm2ccrb(reg, sb, ldb, &db, &seq);
            pgeqrs(reg, ib, &da, &f.t, &db, &work, &seq, &req);
            translate::ccrb2cm(reg, &db, sb, ldb, &seq);
        });
        seq.status()
    }
}

/// Tile-descriptor GEQRF submitted into an open region.
pub fn geqrf_async<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    ib: usize,
    a: &Desc<T>,
    t: &Desc<T>,
    work: &'env Workspace<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    for (d, name) in [(a, "a"), (t, "t")] {
        if d.check().is_err() {
            seq.fail(req, Error::IllegalValue { arg: name });
            return;
        }
    }
    if ib < 1 || work.lwork() < a.nb + ib * a.nb {
        seq.fail(req, Error::IllegalValue { arg: "work" });
        return;
    }
    if a.m == 0 || a.n == 0 {
        return;
    }
    pgeqrf(reg, ib, a, t, work, seq, req);
}

/// Tile-descriptor UNMQR (left) submitted into an open region.
#[allow(clippy::too_many_arguments)]
pub fn unmqr_async<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    trans: Trans,
    ib: usize,
    a: &Desc<T>,
    t: &Desc<T>,
    c: &Desc<T>,
    work: &'env Workspace<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    if matches!(trans, Trans::Trans) {
        seq.fail(req, Error::IllegalValue { arg: "trans" });
        return;
    }
    for (d, name) in [(a, "a"), (t, "t"), (c, "c")] {
        if d.check().is_err() {
            seq.fail(req, Error::IllegalValue { arg: name });
            return;
        }
    }
    if c.m == 0 || c.n == 0 || a.n == 0 {
        return;
    }
    punmqr(reg, trans, ib, a, t, c, work, seq, req);
}

/// Tile-descriptor GEQRS submitted into an open region.
#[allow(clippy::too_many_arguments)]
pub fn geqrs_async<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    ib: usize,
    a: &Desc<T>,
    t: &Desc<T>,
    b: &Desc<T>,
    work: &'env Workspace<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    for (d, name) in [(a, "a"), (t, "t"), (b, "b")] {
        if d.check().is_err() {
            seq.fail(req, Error::IllegalValue { arg: name });
            return;
        }
    }
    if a.m == 0 || a.n == 0 || b.n == 0 {
        return;
    }
    pgeqrs(reg, ib, a, t, b, work, seq, req);
}

/// Emit the tile QR factorization DAG: the diagonal GEQRT gates its
/// column panel, the panel row update, the TSQRT cascade down the
/// column and the bulk TSMQR trailing region.
pub(crate) fn pgeqrf<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    ib: usize,
    a: &Desc<T>,
    t: &Desc<T>,
    work: &'env Workspace<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    if !seq.ok() {
        seq.fail(req, Error::SequenceFlushed);
        return;
    }
    for k in 0..a.mt.min(a.nt) {
        let mvak = a.tile_mview(k);
        let nvak = a.tile_nview(k);

        task::geqrt(reg, mvak, nvak, ib, a, (k, k), t, (k, k), work, seq);

        for n in k + 1..a.nt {
            task::unmqr(
                reg, Trans::ConjTrans, mvak, a.tile_nview(n), mvak.min(nvak), ib, a, (k, k), t,
                (k, k), a, (k, n), work, seq,
            );
        }
        for m in k + 1..a.mt {
            task::tsqrt(
                reg, a.tile_mview(m), nvak, ib, a, (k, k), a, (m, k), t, (m, k), work, seq,
            );
            for n in k + 1..a.nt {
                task::tsmqr(
                    reg, Trans::ConjTrans, mvak, a.tile_mview(m), a.tile_nview(n), nvak, ib, a,
                    (k, n), a, (m, n), a, (m, k), t, (m, k), work, seq,
                );
            }
        }
    }
}

/// Emit the application of `Q` or `Q^H` (factors in `a`/`t`) to `b`
/// from the left.
#[allow(clippy::too_many_arguments)]
pub(crate) fn punmqr<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    trans: Trans,
    ib: usize,
    a: &Desc<T>,
    t: &Desc<T>,
    b: &Desc<T>,
    work: &'env Workspace<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    if !seq.ok() {
        seq.fail(req, Error::SequenceFlushed);
        return;
    }
    let kt = a.mt.min(a.nt);

    if matches!(trans, Trans::ConjTrans) {
        // the factorization direction: panels first to last
        for k in 0..kt {
            let mvak = a.tile_mview(k);
            let nvak = a.tile_nview(k);
            for n in 0..b.nt {
                task::unmqr(
                    reg, trans, b.tile_mview(k), b.tile_nview(n), mvak.min(nvak), ib, a, (k, k),
                    t, (k, k), b, (k, n), work, seq,
                );
            }
            for m in k + 1..b.mt {
                for n in 0..b.nt {
                    task::tsmqr(
                        reg, trans, b.tile_mview(k), b.tile_mview(m), b.tile_nview(n), nvak, ib,
                        b, (k, n), b, (m, n), a, (m, k), t, (m, k), work, seq,
                    );
                }
            }
        }
    } else {
        // applying Q reverses the panel order and, within a panel, the
        // cascade order
        for kk in 0..kt {
            let k = kt - 1 - kk;
            let mvak = a.tile_mview(k);
            let nvak = a.tile_nview(k);
            for m in (k + 1..b.mt).rev() {
                for n in 0..b.nt {
                    task::tsmqr(
                        reg, trans, b.tile_mview(k), b.tile_mview(m), b.tile_nview(n), nvak, ib,
                        b, (k, n), b, (m, n), a, (m, k), t, (m, k), work, seq,
                    );
                }
            }
            for n in 0..b.nt {
                task::unmqr(
                    reg, trans, b.tile_mview(k), b.tile_nview(n), mvak.min(nvak), ib, a, (k, k),
                    t, (k, k), b, (k, n), work, seq,
                );
            }
        }
    }
}

/// Emit the least-squares solve: `Y = Q^H * B`, then
/// `R * X = Y` on the leading `n x n` view.
#[allow(clippy::too_many_arguments)]
pub(crate) fn pgeqrs<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    ib: usize,
    a: &Desc<T>,
    t: &Desc<T>,
    b: &Desc<T>,
    work: &'env Workspace<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    punmqr(reg, Trans::ConjTrans, ib, a, t, b, work, seq, req);

    let (ra, rb) = match (a.view(0, 0, a.n, a.n), b.view(0, 0, a.n, b.n)) {
        (Ok(ra), Ok(rb)) => (ra, rb),
        _ => {
            seq.fail(req, Error::IllegalValue { arg: "b" });
            return;
        }
    };
    ptrsm(
        reg,
        Side::Left,
        Uplo::Upper,
        Trans::NoTrans,
        Diag::NonUnit,
        T::one(),
        &ra,
        &rb,
        seq,
        req,
    );
}
