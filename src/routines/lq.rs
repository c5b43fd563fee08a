//! Blocked LQ factorization (GELQF).

use tessera_core::{Desc, Error, Result, Scalar, Trans};
use tessera_runtime::{Region, Request, Sequence, SharedSlice, Workspace};

use crate::runtime::{check_matrix, Tessera};
use crate::task;
use crate::translate;

/// Triangular block factors produced by [`Tessera::gelqf`], kept in
/// tile layout.
pub struct LqFactors<T> {
    pub(crate) t: Desc<T>,
    pub(crate) m: usize,
    pub(crate) n: usize,
}

impl<T> LqFactors<T> {
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
    /// Blocked LQ factorization of the `m x n` matrix `A`, in place:
    /// `L` lands on and below the diagonal, the Householder reflector
    /// rows above it.
    pub fn gelqf<T: Scalar>(
        &self,
        m: usize,
        n: usize,
        a: &mut [T],
        lda: usize,
    ) -> Result<LqFactors<T>> {
        check_matrix(a, lda, m, n, "a", "lda")?;

        let nb = self.nb();
        let ib = self.ib();
        let da = Desc::general(nb, nb, m, n, 0, 0, m, n)?;
        let dt = Desc::for_t_factors(&da, ib)?;
        if m == 0 || n == 0 {
            return Ok(LqFactors { t: dt, m, n });
        }

        let work = Workspace::alloc(self.threads(), nb + ib * nb)?;
        let seq = Sequence::new();
        let req = Request::new();
        let sa = SharedSlice::from_mut(a);

        self.pool.region(|reg| {
            translate::cm2ccrb(reg, sa, lda, &da, &seq);
            pgelqf(reg, ib, &da, &dt, &work, &seq, &req);
            translate::ccrb2cm(reg, &da, sa, lda, &seq);
        });
        seq.status()?;
        Ok(LqFactors { t: dt, m, n })
    }
}

/// Tile-descriptor GELQF submitted into an open region.
pub fn gelqf_async<'env, T: Scalar>(
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
    pgelqf(reg, ib, a, t, work, seq, req);
}

/// Emit the tile LQ factorization DAG, the row-wise mirror of the QR
/// one: the diagonal GELQT gates its row panel, the panel column
/// update, the TSLQT cascade along the row and the TSMLQ trailing
/// region.
pub(crate) fn pgelqf<'env, T: Scalar>(
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

        task::gelqt(reg, mvak, nvak, ib, a, (k, k), t, (k, k), work, seq);

        for m in k + 1..a.mt {
            task::unmlq(
                reg, Trans::NoTrans, a.tile_mview(m), nvak, mvak.min(nvak), ib, a, (k, k), t,
                (k, k), a, (m, k), work, seq,
            );
        }
        for n in k + 1..a.nt {
            task::tslqt(
                reg, mvak, a.tile_nview(n), ib, a, (k, k), a, (k, n), t, (k, n), work, seq,
            );
            for m in k + 1..a.mt {
                task::tsmlq(
                    reg, Trans::NoTrans, a.tile_mview(m), nvak, a.tile_nview(n), mvak, ib, a,
                    (m, k), a, (m, n), a, (k, n), t, (k, n), work, seq,
                );
            }
        }
    }
}
