//! Triangular in-place product: `L -> L^H * L` or `U -> U * U^H`
//! (the LAUUM stage of a triangular matrix inversion).

use num_traits::One;
use tessera_core::{Desc, Diag, Error, Result, Scalar, Side, Trans, Uplo};
use tessera_runtime::{Region, Request, Sequence, SharedSlice};

use crate::runtime::{check_matrix, Tessera};
use crate::task;
use crate::translate;

impl Tessera {
    /// Replace the `uplo` triangle of the `n x n` matrix `A` by
    /// `L^H * L` (`Lower`) or `U * U^H` (`Upper`), in place.
    pub fn lauum<T: Scalar>(
        &self,
        uplo: Uplo,
        n: usize,
        a: &mut [T],
        lda: usize,
    ) -> Result<()> {
        if matches!(uplo, Uplo::General) {
            return Err(Error::IllegalValue { arg: "uplo" });
        }
        check_matrix(a, lda, n, n, "a", "lda")?;
        if n == 0 {
            return Ok(());
        }

        let nb = self.nb();
        let da = Desc::general(nb, nb, n, n, 0, 0, n, n)?;
        let seq = Sequence::new();
        let req = Request::new();
        let sa = SharedSlice::from_mut(a);

        self.pool.region(|reg| {
            translate::cm2ccrb(reg, sa, lda, &da, &seq);
            plauum(reg, uplo, &da, &seq, &req);
            translate::ccrb2cm(reg, &da, sa, lda, &seq);
        });
        seq.status()
    }
}

/// Tile-descriptor LAUUM submitted into an open region.
pub fn lauum_async<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    a: &Desc<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    if matches!(uplo, Uplo::General) {
        seq.fail(req, Error::IllegalValue { arg: "uplo" });
        return;
    }
    if a.check().is_err() {
        seq.fail(req, Error::IllegalValue { arg: "a" });
        return;
    }
    if a.m == 0 {
        return;
    }
    plauum(reg, uplo, a, seq, req);
}

/// Emit the blocked LAUUM DAG. For each panel `k`, the tiles of block
/// row (column) `k` are first read into rank-k updates of the already
/// visited triangle, then rewritten by a triangular multiply with the
/// diagonal tile, which is finally replaced by its own product.
pub(crate) fn plauum<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    a: &Desc<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    if !seq.ok() {
        seq.fail(req, Error::SequenceFlushed);
        return;
    }
    let one = T::one();
    let one_r = T::Real::one();

    match uplo {
        Uplo::Lower => {
            for k in 0..a.mt {
                let mvak = a.tile_mview(k);
                for n in 0..k {
                    let nvan = a.tile_nview(n);
                    task::herk(
                        reg, Uplo::Lower, Trans::ConjTrans, nvan, mvak, one_r, a, (k, n), one_r,
                        a, (n, n), seq,
                    );
                    for m in n + 1..k {
                        task::gemm(
                            reg, Trans::ConjTrans, Trans::NoTrans, a.tile_mview(m), nvan, mvak,
                            one, a, (k, m), a, (k, n), one, a, (m, n), seq,
                        );
                    }
                }
                for n in 0..k {
                    task::trmm(
                        reg, Side::Left, Uplo::Lower, Trans::ConjTrans, Diag::NonUnit, mvak,
                        a.tile_nview(n), one, a, (k, k), a, (k, n), seq,
                    );
                }
                task::lauum(reg, Uplo::Lower, mvak, a, (k, k), seq);
            }
        }
        _ => {
            for k in 0..a.nt {
                let nvak = a.tile_nview(k);
                for m in 0..k {
                    let mvam = a.tile_mview(m);
                    task::herk(
                        reg, Uplo::Upper, Trans::NoTrans, mvam, nvak, one_r, a, (m, k), one_r, a,
                        (m, m), seq,
                    );
                    for n in m + 1..k {
                        task::gemm(
                            reg, Trans::NoTrans, Trans::ConjTrans, mvam, a.tile_nview(n), nvak,
                            one, a, (m, k), a, (n, k), one, a, (m, n), seq,
                        );
                    }
                }
                for m in 0..k {
                    task::trmm(
                        reg, Side::Right, Uplo::Upper, Trans::ConjTrans, Diag::NonUnit,
                        a.tile_mview(m), nvak, one, a, (k, k), a, (m, k), seq,
                    );
                }
                task::lauum(reg, Uplo::Upper, nvak, a, (k, k), seq);
            }
        }
    }
}
