//! Triangular solve: `op(A) * X = alpha * B` or `X * op(A) = alpha * B`.

use num_traits::One;
use tessera_core::{Desc, Diag, Error, Result, Scalar, Side, Trans, Uplo};
use tessera_runtime::{Region, Request, Sequence, SharedSlice};

use crate::runtime::{check_matrix, Tessera};
use crate::task;
use crate::translate;

impl Tessera {
    /// Solve a triangular system against the `m x n` right-hand side
    /// `B`, overwriting `B` with `X`.
    #[allow(clippy::too_many_arguments)]
    pub fn trsm<T: Scalar>(
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
            ptrsm(reg, side, uplo, transa, diag, alpha, &da, &db, &seq, &req);
            translate::ccrb2cm(reg, &db, sb, ldb, &seq);
        });
        seq.status()
    }
}

/// Tile-descriptor TRSM submitted into an open region.
#[allow(clippy::too_many_arguments)]
pub fn trsm_async<'env, T: Scalar>(
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
    ptrsm(reg, side, uplo, transa, diag, alpha, a, b, seq, req);
}

/// Emit the blocked triangular solve: a diagonal solve per tile
/// row/column of `B` plus trailing GEMM updates, giving the triangular
/// wavefront in which successive columns overlap.
///
/// The scaling by `alpha` is folded into each tile's first touch: the
/// diagonal solve of the first processed step uses `alpha`, and every
/// first trailing update scales its target with `beta = alpha`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn ptrsm<'env, T: Scalar>(
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
        // forward substitution over tile rows
        (Side::Left, Uplo::Lower, true) => {
            for k in 0..b.mt {
                let lalpha = if k == 0 { alpha } else { one };
                let mvbk = b.tile_mview(k);
                for n in 0..b.nt {
                    task::trsm(
                        reg, side, uplo, transa, diag, mvbk, b.tile_nview(n), lalpha, a, (k, k),
                        b, (k, n), k * a.nb, seq, req,
                    );
                }
                for m in k + 1..b.mt {
                    for n in 0..b.nt {
                        task::gemm(
                            reg, Trans::NoTrans, Trans::NoTrans, b.tile_mview(m),
                            b.tile_nview(n), a.tile_nview(k), -one, a, (m, k), b, (k, n), lalpha,
                            b, (m, n), seq,
                        );
                    }
                }
            }
        }
        // backward substitution over tile rows
        (Side::Left, Uplo::Lower, false) => {
            for kk in 0..b.mt {
                let k = b.mt - 1 - kk;
                let lalpha = if kk == 0 { alpha } else { one };
                let mvbk = b.tile_mview(k);
                for n in 0..b.nt {
                    task::trsm(
                        reg, side, uplo, transa, diag, mvbk, b.tile_nview(n), lalpha, a, (k, k),
                        b, (k, n), k * a.nb, seq, req,
                    );
                }
                for m in 0..k {
                    for n in 0..b.nt {
                        task::gemm(
                            reg, transa, Trans::NoTrans, b.tile_mview(m), b.tile_nview(n), mvbk,
                            -one, a, (k, m), b, (k, n), lalpha, b, (m, n), seq,
                        );
                    }
                }
            }
        }
        // backward substitution over tile rows
        (Side::Left, Uplo::Upper, true) => {
            for kk in 0..b.mt {
                let k = b.mt - 1 - kk;
                let lalpha = if kk == 0 { alpha } else { one };
                let mvbk = b.tile_mview(k);
                for n in 0..b.nt {
                    task::trsm(
                        reg, side, uplo, transa, diag, mvbk, b.tile_nview(n), lalpha, a, (k, k),
                        b, (k, n), k * a.nb, seq, req,
                    );
                }
                for m in 0..k {
                    for n in 0..b.nt {
                        task::gemm(
                            reg, Trans::NoTrans, Trans::NoTrans, b.tile_mview(m),
                            b.tile_nview(n), a.tile_nview(k), -one, a, (m, k), b, (k, n), lalpha,
                            b, (m, n), seq,
                        );
                    }
                }
            }
        }
        // forward substitution over tile rows
        (Side::Left, Uplo::Upper, false) => {
            for k in 0..b.mt {
                let lalpha = if k == 0 { alpha } else { one };
                let mvbk = b.tile_mview(k);
                for n in 0..b.nt {
                    task::trsm(
                        reg, side, uplo, transa, diag, mvbk, b.tile_nview(n), lalpha, a, (k, k),
                        b, (k, n), k * a.nb, seq, req,
                    );
                }
                for m in k + 1..b.mt {
                    for n in 0..b.nt {
                        task::gemm(
                            reg, transa, Trans::NoTrans, b.tile_mview(m), b.tile_nview(n), mvbk,
                            -one, a, (k, m), b, (k, n), lalpha, b, (m, n), seq,
                        );
                    }
                }
            }
        }
        // forward over tile columns
        (Side::Right, Uplo::Upper, true) => {
            for k in 0..b.nt {
                let lalpha = if k == 0 { alpha } else { one };
                let nvbk = b.tile_nview(k);
                for m in 0..b.mt {
                    task::trsm(
                        reg, side, uplo, transa, diag, b.tile_mview(m), nvbk, lalpha, a, (k, k),
                        b, (m, k), k * a.nb, seq, req,
                    );
                }
                for n in k + 1..b.nt {
                    for m in 0..b.mt {
                        task::gemm(
                            reg, Trans::NoTrans, Trans::NoTrans, b.tile_mview(m),
                            b.tile_nview(n), nvbk, -one, b, (m, k), a, (k, n), lalpha, b, (m, n),
                            seq,
                        );
                    }
                }
            }
        }
        // backward over tile columns
        (Side::Right, Uplo::Upper, false) => {
            for kk in 0..b.nt {
                let k = b.nt - 1 - kk;
                let lalpha = if kk == 0 { alpha } else { one };
                let nvbk = b.tile_nview(k);
                for m in 0..b.mt {
                    task::trsm(
                        reg, side, uplo, transa, diag, b.tile_mview(m), nvbk, lalpha, a, (k, k),
                        b, (m, k), k * a.nb, seq, req,
                    );
                }
                for n in 0..k {
                    for m in 0..b.mt {
                        task::gemm(
                            reg, Trans::NoTrans, transa, b.tile_mview(m), b.tile_nview(n), nvbk,
                            -one, b, (m, k), a, (n, k), lalpha, b, (m, n), seq,
                        );
                    }
                }
            }
        }
        // backward over tile columns
        (Side::Right, Uplo::Lower, true) => {
            for kk in 0..b.nt {
                let k = b.nt - 1 - kk;
                let lalpha = if kk == 0 { alpha } else { one };
                let nvbk = b.tile_nview(k);
                for m in 0..b.mt {
                    task::trsm(
                        reg, side, uplo, transa, diag, b.tile_mview(m), nvbk, lalpha, a, (k, k),
                        b, (m, k), k * a.nb, seq, req,
                    );
                }
                for n in 0..k {
                    for m in 0..b.mt {
                        task::gemm(
                            reg, Trans::NoTrans, Trans::NoTrans, b.tile_mview(m),
                            b.tile_nview(n), nvbk, -one, b, (m, k), a, (k, n), lalpha, b, (m, n),
                            seq,
                        );
                    }
                }
            }
        }
        // forward over tile columns
        (Side::Right, Uplo::Lower, false) => {
            for k in 0..b.nt {
                let lalpha = if k == 0 { alpha } else { one };
                let nvbk = b.tile_nview(k);
                for m in 0..b.mt {
                    task::trsm(
                        reg, side, uplo, transa, diag, b.tile_mview(m), nvbk, lalpha, a, (k, k),
                        b, (m, k), k * a.nb, seq, req,
                    );
                }
                for n in k + 1..b.nt {
                    for m in 0..b.mt {
                        task::gemm(
                            reg, Trans::NoTrans, transa, b.tile_mview(m), b.tile_nview(n), nvbk,
                            -one, b, (m, k), a, (n, k), lalpha, b, (m, n), seq,
                        );
                    }
                }
            }
        }
        (_, Uplo::General, _) => unreachable!("validated by the entry points"),
    }
}
