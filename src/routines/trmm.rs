//! Triangular matrix multiply: `B := alpha * op(A) * B` or
//! `B := alpha * B * op(A)`.

use num_traits::One;
use tessera_core::{Desc, Diag, Error, Result, Scalar, Side, Trans, Uplo};
use tessera_runtime::{Region, Request, Sequence, SharedSlice};

use crate::runtime::{check_matrix, Tessera};
use crate::task;
use crate::translate;

impl Tessera {
    /// Multiply the `m x n` matrix `B` in place by a triangular matrix.
    #[allow(clippy::too_many_arguments)]
    pub fn trmm<T: Scalar>(
        &self,
        side: Side,
        uplo: Uplo,
        transa: Trans,
        diag: Diag,
        m: usize,
        n: usize,
        alpha: T,
        a: &[T],
        lda: usize,
        b: &mut [T],
        ldb: usize,
    ) -> Result<()> {
        if matches!(uplo, Uplo::General) {
            return Err(Error::IllegalValue { arg: "uplo" });
        }
        let na = if matches!(side, Side::Left) { m } else { n };
        check_matrix(a, lda, na, na, "a", "lda")?;
        check_matrix(b, ldb, m, n, "b", "ldb")?;
        if m == 0 || n == 0 {
            return Ok(());
        }

        let nb = self.nb();
        let da = Desc::general(nb, nb, na, na, 0, 0, na, na)?;
        let db = Desc::general(nb, nb, m, n, 0, 0, m, n)?;

        let seq = Sequence::new();
        let req = Request::new();
        let sa = SharedSlice::from_ref(a);
        let sb = SharedSlice::from_mut(b);

        self.pool.region(|reg| {
            translate::cm2ccrb(reg, sa, lda, &da, &seq);
            translate::cm2ccrb(reg, sb, ldb, &db, &seq);
            ptrmm(reg, side, uplo, transa, diag, alpha, &da, &db, &seq, &req);
            translate::ccrb2cm(reg, &db, sb, ldb, &seq);
        });
        seq.status()
    }
}

/// Tile-descriptor TRMM submitted into an open region.
#[allow(clippy::too_many_arguments)]
pub fn trmm_async<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    side: Side,
    uplo: Uplo,
    transa: Trans,
    diag: Diag,
    alpha: T,
    a: &Desc<T>,
    b: &Desc<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    if matches!(uplo, Uplo::General) {
        seq.fail(req, Error::IllegalValue { arg: "uplo" });
        return;
    }
    for (d, name) in [(a, "a"), (b, "b")] {
        if d.check().is_err() {
            seq.fail(req, Error::IllegalValue { arg: name });
            return;
        }
    }
    if b.m == 0 || b.n == 0 {
        return;
    }
    ptrmm(reg, side, uplo, transa, diag, alpha, a, b, seq, req);
}

/// Emit the blocked triangular multiply. Each step rewrites one tile
/// row (or column) of `B` as the triangular diagonal term plus GEMM
/// accumulations of the still-original remaining rows; the traversal
/// direction is chosen so those rows are read before their own step
/// rewrites them.
#[allow(clippy::too_many_arguments)]
pub(crate) fn ptrmm<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    side: Side,
    uplo: Uplo,
    transa: Trans,
    diag: Diag,
    alpha: T,
    a: &Desc<T>,
    b: &Desc<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    if !seq.ok() {
        seq.fail(req, Error::SequenceFlushed);
        return;
    }
    let one = T::one();

    match (side, uplo, matches!(transa, Trans::NoTrans)) {
        (Side::Left, Uplo::Upper, true) => {
            for k in 0..b.mt {
                let mvbk = b.tile_mview(k);
                for n in 0..b.nt {
                    task::trmm(
                        reg, side, uplo, transa, diag, mvbk, b.tile_nview(n), alpha, a, (k, k),
                        b, (k, n), seq,
                    );
                }
                for m in k + 1..b.mt {
                    for n in 0..b.nt {
                        task::gemm(
                            reg, Trans::NoTrans, Trans::NoTrans, mvbk, b.tile_nview(n),
                            b.tile_mview(m), alpha, a, (k, m), b, (m, n), one, b, (k, n), seq,
                        );
                    }
                }
            }
        }
        (Side::Left, Uplo::Upper, false) => {
            for kk in 0..b.mt {
                let k = b.mt - 1 - kk;
                let mvbk = b.tile_mview(k);
                for n in 0..b.nt {
                    task::trmm(
                        reg, side, uplo, transa, diag, mvbk, b.tile_nview(n), alpha, a, (k, k),
                        b, (k, n), seq,
                    );
                }
                for m in 0..k {
                    for n in 0..b.nt {
                        task::gemm(
                            reg, transa, Trans::NoTrans, mvbk, b.tile_nview(n), b.tile_mview(m),
                            alpha, a, (m, k), b, (m, n), one, b, (k, n), seq,
                        );
                    }
                }
            }
        }
        (Side::Left, Uplo::Lower, true) => {
            for kk in 0..b.mt {
                let k = b.mt - 1 - kk;
                let mvbk = b.tile_mview(k);
                for n in 0..b.nt {
                    task::trmm(
                        reg, side, uplo, transa, diag, mvbk, b.tile_nview(n), alpha, a, (k, k),
                        b, (k, n), seq,
                    );
                }
                for m in 0..k {
                    for n in 0..b.nt {
                        task::gemm(
                            reg, Trans::NoTrans, Trans::NoTrans, mvbk, b.tile_nview(n),
                            b.tile_mview(m), alpha, a, (k, m), b, (m, n), one, b, (k, n), seq,
                        );
                    }
                }
            }
        }
        (Side::Left, Uplo::Lower, false) => {
            for k in 0..b.mt {
                let mvbk = b.tile_mview(k);
                for n in 0..b.nt {
                    task::trmm(
                        reg, side, uplo, transa, diag, mvbk, b.tile_nview(n), alpha, a, (k, k),
                        b, (k, n), seq,
                    );
                }
                for m in k + 1..b.mt {
                    for n in 0..b.nt {
                        task::gemm(
                            reg, transa, Trans::NoTrans, mvbk, b.tile_nview(n), b.tile_mview(m),
                            alpha, a, (m, k), b, (m, n), one, b, (k, n), seq,
                        );
                    }
                }
            }
        }
        (Side::Right, Uplo::Upper, true) => {
            for kk in 0..b.nt {
                let k = b.nt - 1 - kk;
                let nvbk = b.tile_nview(k);
                for m in 0..b.mt {
                    task::trmm(
                        reg, side, uplo, transa, diag, b.tile_mview(m), nvbk, alpha, a, (k, k),
                        b, (m, k), seq,
                    );
                }
                for n in 0..k {
                    for m in 0..b.mt {
                        task::gemm(
                            reg, Trans::NoTrans, Trans::NoTrans, b.tile_mview(m), nvbk,
                            b.tile_nview(n), alpha, b, (m, n), a, (n, k), one, b, (m, k), seq,
                        );
                    }
                }
            }
        }
        (Side::Right, Uplo::Upper, false) => {
            for k in 0..b.nt {
                let nvbk = b.tile_nview(k);
                for m in 0..b.mt {
                    task::trmm(
                        reg, side, uplo, transa, diag, b.tile_mview(m), nvbk, alpha, a, (k, k),
                        b, (m, k), seq,
                    );
                }
                for n in k + 1..b.nt {
                    for m in 0..b.mt {
                        task::gemm(
                            reg, Trans::NoTrans, transa, b.tile_mview(m), nvbk, b.tile_nview(n),
                            alpha, b, (m, n), a, (k, n), one, b, (m, k), seq,
                        );
                    }
                }
            }
        }
        (Side::Right, Uplo::Lower, true) => {
            for k in 0..b.nt {
                let nvbk = b.tile_nview(k);
                for m in 0..b.mt {
                    task::trmm(
                        reg, side, uplo, transa, diag, b.tile_mview(m), nvbk, alpha, a, (k, k),
                        b, (m, k), seq,
                    );
                }
                for n in k + 1..b.nt {
                    for m in 0..b.mt {
                        task::gemm(
                            reg, Trans::NoTrans, Trans::NoTrans, b.tile_mview(m), nvbk,
                            b.tile_nview(n), alpha, b, (m, n), a, (n, k), one, b, (m, k), seq,
                        );
                    }
                }
            }
        }
        (Side::Right, Uplo::Lower, false) => {
            for kk in 0..b.nt {
                let k = b.nt - 1 - kk;
                let nvbk = b.tile_nview(k);
                for m in 0..b.mt {
                    task::trmm(
                        reg, side, uplo, transa, diag, b.tile_mview(m), nvbk, alpha, a, (k, k),
                        b, (m, k), seq,
                    );
                }
                for n in 0..k {
                    for m in 0..b.mt {
                        task::gemm(
                            reg, Trans::NoTrans, transa, b.tile_mview(m), nvbk, b.tile_nview(n),
                            alpha, b, (m, n), a, (k, n), one, b, (m, k), seq,
                        );
                    }
                }
            }
        }
        (_, Uplo::General, _) => unreachable!("validated by the entry points"),
    }
}
