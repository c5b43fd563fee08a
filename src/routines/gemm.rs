//! General matrix multiply: `C := alpha * op(A) * op(B) + beta * C`.

use num_traits::{One, Zero};
use tessera_core::{Desc, Error, Result, Scalar, Trans};
use tessera_runtime::{Region, Request, Sequence, SharedSlice};

use crate::runtime::{check_matrix, Tessera};
use crate::task;
use crate::translate;

impl Tessera {
    /// `C := alpha * op(A) * op(B) + beta * C` on column-major buffers.
    ///
    /// `op(A)` is `m x k` and `op(B)` is `k x n`; `C` is `m x n`.
    #[allow(clippy::too_many_arguments)]
    pub fn gemm<T: Scalar>(
        &self,
        transa: Trans,
        transb: Trans,
        m: usize,
        n: usize,
        k: usize,
        alpha: T,
        a: &[T],
        lda: usize,
        b: &[T],
        ldb: usize,
        beta: T,
        c: &mut [T],
        ldc: usize,
    ) -> Result<()> {
        let (am, an) = if matches!(transa, Trans::NoTrans) { (m, k) } else { (k, m) };
        let (bm, bn) = if matches!(transb, Trans::NoTrans) { (k, n) } else { (n, k) };
        check_matrix(a, lda, am, an, "a", "lda")?;
        check_matrix(b, ldb, bm, bn, "b", "ldb")?;
        check_matrix(c, ldc, m, n, "c", "ldc")?;

        // quick return
        if m == 0 || n == 0 || ((alpha.is_zero() || k == 0) && beta.is_one()) {
            return Ok(());
        }

        let nb = self.nb();
        let da = Desc::general(nb, nb, am, an, 0, 0, am, an)?;
        let db = Desc::general(nb, nb, bm, bn, 0, 0, bm, bn)?;
        let dc = Desc::general(nb, nb, m, n, 0, 0, m, n)?;

        let seq = Sequence::new();
        let req = Request::new();
        let sa = SharedSlice::from_ref(a);
        let sb = SharedSlice::from_ref(b);
        let sc = SharedSlice::from_mut(c);

        self.pool.region(|reg| {
            translate::cm2ccrb(reg, sa, lda, &da, &seq);
            translate::cm2ccrb(reg, sb, ldb, &db, &seq);
            translate::cm2ccrb(reg, sc, ldc, &dc, &seq);
            pgemm(reg, transa, transb, alpha, &da, &db, beta, &dc, &seq, &req);
            translate::ccrb2cm(reg, &dc, sc, ldc, &seq);
        });
        seq.status()
    }
}

/// Tile-descriptor GEMM submitted into an open region.
#[allow(clippy::too_many_arguments)]
pub fn gemm_async<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    transa: Trans,
    transb: Trans,
    alpha: T,
    a: &Desc<T>,
    b: &Desc<T>,
    beta: T,
    c: &Desc<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    for (d, name) in [(a, "a"), (b, "b"), (c, "c")] {
        if d.check().is_err() {
            seq.fail(req, Error::IllegalValue { arg: name });
            return;
        }
    }
    let k = if matches!(transa, Trans::NoTrans) { a.n } else { a.m };
    if c.m == 0 || c.n == 0 || ((alpha.is_zero() || k == 0) && beta.is_one()) {
        return;
    }
    pgemm(reg, transa, transb, alpha, a, b, beta, c, seq, req);
}

/// Emit the GEMM tile DAG: one accumulation chain per tile of `C`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn pgemm<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    transa: Trans,
    transb: Trans,
    alpha: T,
    a: &Desc<T>,
    b: &Desc<T>,
    beta: T,
    c: &Desc<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    if !seq.ok() {
        seq.fail(req, Error::SequenceFlushed);
        return;
    }

    for m in 0..c.mt {
        let mvcm = c.tile_mview(m);
        for n in 0..c.nt {
            let nvcn = c.tile_nview(n);

            let inner_k = if matches!(transa, Trans::NoTrans) { a.n } else { a.m };
            if alpha.is_zero() || inner_k == 0 {
                // alpha * op(A) * op(B) does not contribute; scale C
                task::gemm_scale(reg, mvcm, nvcn, beta, c, (m, n), seq);
            } else if matches!(transa, Trans::NoTrans) {
                if matches!(transb, Trans::NoTrans) {
                    for k in 0..a.nt {
                        let nvak = a.tile_nview(k);
                        let zbeta = if k == 0 { beta } else { T::one() };
                        task::gemm(
                            reg, transa, transb, mvcm, nvcn, nvak, alpha, a, (m, k), b, (k, n),
                            zbeta, c, (m, n), seq,
                        );
                    }
                } else {
                    for k in 0..a.nt {
                        let nvak = a.tile_nview(k);
                        let zbeta = if k == 0 { beta } else { T::one() };
                        task::gemm(
                            reg, transa, transb, mvcm, nvcn, nvak, alpha, a, (m, k), b, (n, k),
                            zbeta, c, (m, n), seq,
                        );
                    }
                }
            } else if matches!(transb, Trans::NoTrans) {
                for k in 0..a.mt {
                    let mvak = a.tile_mview(k);
                    let zbeta = if k == 0 { beta } else { T::one() };
                    task::gemm(
                        reg, transa, transb, mvcm, nvcn, mvak, alpha, a, (k, m), b, (k, n), zbeta,
                        c, (m, n), seq,
                    );
                }
            } else {
                for k in 0..a.mt {
                    let mvak = a.tile_mview(k);
                    let zbeta = if k == 0 { beta } else { T::one() };
                    task::gemm(
                        reg, transa, transb, mvcm, nvcn, mvak, alpha, a, (k, m), b, (n, k), zbeta,
                        c, (m, n), seq,
                    );
                }
            }
        }
    }
}
