//! Cholesky factorization and solves: POTRF, POTRS, POSV.

use num_traits::One;
use tessera_core::{Desc, Diag, Error, Result, Scalar, Side, Trans, Uplo};
use tessera_runtime::{Region, Request, Sequence, SharedSlice};

use crate::routines::trsm::ptrsm;
use crate::runtime::{check_matrix, Tessera};
use crate::task;
use crate::translate;

impl Tessera {
    /// Cholesky factorization `A = L * L^H` (`uplo = Lower`) or
    /// `A = U^H * U` (`uplo = Upper`) of the Hermitian positive
    /// definite `n x n` matrix `A`, in place.
    ///
    /// On breakdown returns [`Error::NotPositiveDefinite`] with the
    /// 1-based order of the offending leading minor.
    pub fn potrf<T: Scalar>(
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
            ppotrf(reg, uplo, &da, &seq, &req);
            translate::ccrb2cm(reg, &da, sa, lda, &seq);
        });
        seq.status()
    }

    /// Solve `A * X = B` using a Cholesky factor previously computed by
    /// [`Tessera::potrf`], overwriting the `n x nrhs` matrix `B`.
    #[allow(clippy::too_many_arguments)]
    pub fn potrs<T: Scalar>(
        &self,
        uplo: Uplo,
        n: usize,
        nrhs: usize,
        a: &[T],
        lda: usize,
        b: &mut [T],
        ldb: usize,
    ) -> Result<()> {
        if matches!(uplo, Uplo::General) {
            return Err(Error::IllegalValue { arg: "uplo" });
        }
        check_matrix(a, lda, n, n, "a", "lda")?;
        check_matrix(b, ldb, n, nrhs, "b", "ldb")?;
        if n == 0 || nrhs == 0 {
            return Ok(());
        }

        let nb = self.nb();
        let da = Desc::general(nb, nb, n, n, 0, 0, n, n)?;
        let db = Desc::general(nb, nb, n, nrhs, 0, 0, n, nrhs)?;
        let seq = Sequence::new();
        let req = Request::new();
        let sa = SharedSlice::from_ref(a);
        let sb = SharedSlice::from_mut(b);

        self.pool.region(|reg| {
            translate::cm2ccrb(reg, sa, lda, &da, &seq);
            translate::cm2ccrb(reg, sb, ldb, &db, &seq);
            ppotrs(reg, uplo, &da, &db, &seq, &req);
            translate::ccrb2cm(reg, &db, sb, ldb, &seq);
        });
        seq.status()
    }

    /// Factor the Hermitian positive definite `A` and solve
    /// `A * X = B` in one DAG, overwriting `A` with its factor and `B`
    /// with the solution.
    #[allow(clippy::too_many_arguments)]
    pub fn posv<T: Scalar>(
        &self,
        uplo: Uplo,
        n: usize,
        nrhs: usize,
        a: &mut [T],
        lda: usize,
        b: &mut [T],
        ldb: usize,
    ) -> Result<()> {
        if matches!(uplo, Uplo::General) {
            return Err(Error::IllegalValue { arg: "uplo" });
        }
        check_matrix(a, lda, n, n, "a", "lda")?;
        check_matrix(b, ldb, n, nrhs, "b", "ldb")?;
        if n == 0 {
            return Ok(());
        }

        let nb = self.nb();
        let da = Desc::general(nb, nb, n, n, 0, 0, n, n)?;
        let db = Desc::general(nb, nb, n, nrhs, 0, 0, n, nrhs)?;
        let seq = Sequence::new();
        let req = Request::new();
        let sa = SharedSlice::from_mut(a);
        let sb = SharedSlice::from_mut(b);

        self.pool.region(|reg| {
            translate::cm2ccrb(reg, sa, lda, &da, &seq);
            translate::cm2ccrb(reg, sb, ldb, &db, &seq);
            ppotrf(reg, uplo, &da, &seq, &req);
            ppotrs(reg, uplo, &da, &db, &seq, &req);
            translate::ccrb2cm(reg, &da, sa, lda, &seq);
            translate::ccrb2cm(reg, &db, sb, ldb, &seq);
        });
        seq.status()
    }
}

/// Tile-descriptor POTRF submitted into an open region.
pub fn potrf_async<'env, T: Scalar>(
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
    ppotrf(reg, uplo, a, seq, req);
}

/// Tile-descriptor POTRS submitted into an open region.
pub fn potrs_async<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
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
    if a.m == 0 || b.n == 0 {
        return;
    }
    ppotrs(reg, uplo, a, b, seq, req);
}

/// Tile-descriptor POSV (factor + solve) submitted into an open region.
pub fn posv_async<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    a: &Desc<T>,
    b: &Desc<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    potrf_async(reg, uplo, a, seq, req);
    potrs_async(reg, uplo, a, b, seq, req);
}

/// Emit the Cholesky tile DAG: per panel, the diagonal factorization
/// gates the panel solves, which gate the Hermitian trailing updates.
pub(crate) fn ppotrf<'env, T: Scalar>(
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
                let nvak = a.tile_nview(k);
                task::potrf(reg, uplo, mvak, a, (k, k), a.nb * k, seq, req);
                for m in k + 1..a.mt {
                    task::trsm(
                        reg, Side::Right, Uplo::Lower, Trans::ConjTrans, Diag::NonUnit,
                        a.tile_mview(m), nvak, one, a, (k, k), a, (m, k), a.nb * k, seq, req,
                    );
                }
                for m in k + 1..a.mt {
                    let mvam = a.tile_mview(m);
                    task::herk(
                        reg, Uplo::Lower, Trans::NoTrans, mvam, nvak, -one_r, a, (m, k), one_r,
                        a, (m, m), seq,
                    );
                    for n in k + 1..m {
                        task::gemm(
                            reg, Trans::NoTrans, Trans::ConjTrans, mvam, a.tile_nview(n), nvak,
                            -one, a, (m, k), a, (n, k), one, a, (m, n), seq,
                        );
                    }
                }
            }
        }
        _ => {
            for k in 0..a.nt {
                let mvak = a.tile_mview(k);
                let nvak = a.tile_nview(k);
                task::potrf(reg, uplo, mvak, a, (k, k), a.nb * k, seq, req);
                for n in k + 1..a.nt {
                    task::trsm(
                        reg, Side::Left, Uplo::Upper, Trans::ConjTrans, Diag::NonUnit, mvak,
                        a.tile_nview(n), one, a, (k, k), a, (k, n), a.nb * k, seq, req,
                    );
                }
                for n in k + 1..a.nt {
                    let nvan = a.tile_nview(n);
                    task::herk(
                        reg, Uplo::Upper, Trans::ConjTrans, nvan, mvak, -one_r, a, (k, n), one_r,
                        a, (n, n), seq,
                    );
                    for m in k + 1..n {
                        task::gemm(
                            reg, Trans::ConjTrans, Trans::NoTrans, a.tile_mview(m), nvan, mvak,
                            -one, a, (k, m), a, (k, n), one, a, (m, n), seq,
                        );
                    }
                }
            }
        }
    }
}

/// Emit the two triangular solves against the Cholesky factor.
pub(crate) fn ppotrs<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    a: &Desc<T>,
    b: &Desc<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    let one = T::one();
    match uplo {
        Uplo::Lower => {
            ptrsm(reg, Side::Left, Uplo::Lower, Trans::NoTrans, Diag::NonUnit, one, a, b, seq, req);
            ptrsm(
                reg, Side::Left, Uplo::Lower, Trans::ConjTrans, Diag::NonUnit, one, a, b, seq, req,
            );
        }
        _ => {
            ptrsm(
                reg, Side::Left, Uplo::Upper, Trans::ConjTrans, Diag::NonUnit, one, a, b, seq, req,
            );
            ptrsm(reg, Side::Left, Uplo::Upper, Trans::NoTrans, Diag::NonUnit, one, a, b, seq, req);
        }
    }
}
