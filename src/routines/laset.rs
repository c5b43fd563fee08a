//! LASET: fill the `uplo` region of a matrix with `alpha` off the
//! diagonal and `beta` on it.

use tessera_core::{Desc, Error, Result, Scalar, Uplo};
use tessera_runtime::{Region, Request, Sequence, SharedSlice};

use crate::runtime::{check_matrix, Tessera};
use crate::task;
use crate::translate;

impl Tessera {
    /// Set the `uplo` region of the `m x n` matrix `A`: `alpha` off the
    /// diagonal, `beta` on it; elements outside the region are
    /// untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn laset<T: Scalar>(
        &self,
        uplo: Uplo,
        m: usize,
        n: usize,
        alpha: T,
        beta: T,
        a: &mut [T],
        lda: usize,
    ) -> Result<()> {
        check_matrix(a, lda, m, n, "a", "lda")?;
        if m == 0 || n == 0 {
            return Ok(());
        }

        let nb = self.nb();
        let da = Desc::general(nb, nb, m, n, 0, 0, m, n)?;
        let seq = Sequence::new();
        let req = Request::new();
        let sa = SharedSlice::from_mut(a);

        self.pool.region(|reg| {
            // round-trip the untouched region through tile layout
            translate::cm2ccrb(reg, sa, lda, &da, &seq);
            plaset(reg, uplo, alpha, beta, &da, &seq, &req);
            translate::ccrb2cm(reg, &da, sa, lda, &seq);
        });
        seq.status()
    }
}

/// Tile-descriptor LASET submitted into an open region.
pub fn laset_async<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    alpha: T,
    beta: T,
    a: &Desc<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    if a.check().is_err() {
        seq.fail(req, Error::IllegalValue { arg: "a" });
        return;
    }
    if a.m == 0 || a.n == 0 {
        return;
    }
    plaset(reg, uplo, alpha, beta, a, seq, req);
}

/// Emit one fill task per tile of the `uplo` region. Because tiles are
/// square, the matrix diagonal runs exactly through the `(k, k)` tiles;
/// off-diagonal tiles of the region are filled entirely with `alpha`
/// by passing it as both fill values.
pub(crate) fn plaset<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    alpha: T,
    beta: T,
    a: &Desc<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    if !seq.ok() {
        seq.fail(req, Error::SequenceFlushed);
        return;
    }
    for m in 0..a.mt {
        let mv = a.tile_mview(m);
        for n in 0..a.nt {
            let nv = a.tile_nview(n);
            match uplo {
                Uplo::General => {
                    if m == n {
                        task::laset(reg, Uplo::General, mv, nv, alpha, beta, a, (m, n), seq);
                    } else {
                        task::laset(reg, Uplo::General, mv, nv, alpha, alpha, a, (m, n), seq);
                    }
                }
                Uplo::Upper => {
                    if m < n {
                        task::laset(reg, Uplo::General, mv, nv, alpha, alpha, a, (m, n), seq);
                    } else if m == n {
                        task::laset(reg, Uplo::Upper, mv, nv, alpha, beta, a, (m, n), seq);
                    }
                }
                Uplo::Lower => {
                    if m > n {
                        task::laset(reg, Uplo::General, mv, nv, alpha, alpha, a, (m, n), seq);
                    } else if m == n {
                        task::laset(reg, Uplo::Lower, mv, nv, alpha, beta, a, (m, n), seq);
                    }
                }
            }
        }
    }
}
