//! Symmetric rank-2k update:
//! `C := alpha*A*B^T + alpha*B*A^T + beta*C` or the transposed form,
//! on one triangle of `C`.

use num_traits::{One, Zero};
use tessera_core::{Desc, Error, Result, Scalar, Trans, Uplo};
use tessera_runtime::{Region, Request, Sequence, SharedSlice};

use crate::runtime::{check_matrix, Tessera};
use crate::task;
use crate::translate;

impl Tessera {
    /// Symmetric rank-2k update of the `uplo` triangle of `C` (`n x n`).
    /// With `trans = NoTrans`, `A` and `B` are `n x k`; with
    /// `trans = Trans` they are `k x n`.
    #[allow(clippy::too_many_arguments)]
    pub fn syr2k<T: Scalar>(
        &self,
        uplo: Uplo,
        trans: Trans,
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
        if matches!(uplo, Uplo::General) {
            return Err(Error::IllegalValue { arg: "uplo" });
        }
        if matches!(trans, Trans::ConjTrans) {
            return Err(Error::IllegalValue { arg: "trans" });
        }
        let (am, an) = if matches!(trans, Trans::NoTrans) { (n, k) } else { (k, n) };
        check_matrix(a, lda, am, an, "a", "lda")?;
        check_matrix(b, ldb, am, an, "b", "ldb")?;
        check_matrix(c, ldc, n, n, "c", "ldc")?;

        if n == 0 || ((alpha.is_zero() || k == 0) && beta.is_one()) {
            return Ok(());
        }

        let nb = self.nb();
        let da = Desc::general(nb, nb, am, an, 0, 0, am, an)?;
        let db = Desc::general(nb, nb, am, an, 0, 0, am, an)?;
        let dc = Desc::general(nb, nb, n, n, 0, 0, n, n)?;

        let seq = Sequence::new();
        let req = Request::new();
        let sa = SharedSlice::from_ref(a);
        let sb = SharedSlice::from_ref(b);
        let sc = SharedSlice::from_mut(c);

        self.pool.region(|reg| {
            translate::cm2ccrb(reg, sa, lda, &da, &seq);
            translate::cm2ccrb(reg, sb, ldb, &db, &seq);
            translate::cm2ccrb(reg, sc, ldc, &dc, &seq);
            psyr2k(reg, uplo, trans, alpha, &da, &db, beta, &dc, &seq, &req);
            translate::ccrb2cm(reg, &dc, sc, ldc, &seq);
        });
        seq.status()
    }
}

/// Tile-descriptor SYR2K submitted into an open region.
#[allow(clippy::too_many_arguments)]
pub fn syr2k_async<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    trans: Trans,
    alpha: T,
    a: &Desc<T>,
    b: &Desc<T>,
    beta: T,
    c: &Desc<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    if matches!(uplo, Uplo::General) {
        seq.fail(req, Error::IllegalValue { arg: "uplo" });
        return;
    }
    if matches!(trans, Trans::ConjTrans) {
        seq.fail(req, Error::IllegalValue { arg: "trans" });
        return;
    }
    for (d, name) in [(a, "a"), (b, "b"), (c, "c")] {
        if d.check().is_err() {
            seq.fail(req, Error::IllegalValue { arg: name });
            return;
        }
    }
    let k = if matches!(trans, Trans::NoTrans) { a.n } else { a.m };
    if c.m == 0 || ((alpha.is_zero() || k == 0) && beta.is_one()) {
        return;
    }
    psyr2k(reg, uplo, trans, alpha, a, b, beta, c, seq, req);
}

/// Emit the SYR2K tile DAG: a symmetric update chain per diagonal tile,
/// two GEMM chains per off-diagonal tile of the chosen triangle.
#[allow(clippy::too_many_arguments)]
pub(crate) fn psyr2k<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    trans: Trans,
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
    let notrans = matches!(trans, Trans::NoTrans);
    let kt = if notrans { a.nt } else { a.mt };

    for n in 0..c.nt {
        let nvcn = c.tile_nview(n);

        // diagonal tile
        for k in 0..kt {
            let kv = if notrans { a.tile_nview(k) } else { a.tile_mview(k) };
            let zbeta = if k == 0 { beta } else { T::one() };
            let (ac, bc) = if notrans { ((n, k), (n, k)) } else { ((k, n), (k, n)) };
            task::syr2k(reg, uplo, trans, nvcn, kv, alpha, a, ac, b, bc, zbeta, c, (n, n), seq);
        }

        // off-diagonal tiles of the chosen triangle
        let rows: Vec<usize> = match uplo {
            Uplo::Lower => (n + 1..c.mt).collect(),
            _ => (0..n).collect(),
        };
        for m in rows {
            let mvcm = c.tile_mview(m);
            for k in 0..kt {
                let zbeta = if k == 0 { beta } else { T::one() };
                if notrans {
                    let kv = a.tile_nview(k);
                    task::gemm(
                        reg, Trans::NoTrans, Trans::Trans, mvcm, nvcn, kv, alpha, a, (m, k), b,
                        (n, k), zbeta, c, (m, n), seq,
                    );
                    task::gemm(
                        reg, Trans::NoTrans, Trans::Trans, mvcm, nvcn, kv, alpha, b, (m, k), a,
                        (n, k), T::one(), c, (m, n), seq,
                    );
                } else {
                    let kv = a.tile_mview(k);
                    task::gemm(
                        reg, Trans::Trans, Trans::NoTrans, mvcm, nvcn, kv, alpha, a, (k, m), b,
                        (k, n), zbeta, c, (m, n), seq,
                    );
                    task::gemm(
                        reg, Trans::Trans, Trans::NoTrans, mvcm, nvcn, kv, alpha, b, (k, m), a,
                        (k, n), T::one(), c, (m, n), seq,
                    );
                }
            }
        }
    }
}
