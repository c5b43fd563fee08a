//! Matrix norms: LANGE (general) and LANSY (symmetric), for the max
//! and Frobenius norms.
//!
//! Frobenius norms reduce per-tile `(scale, sumsq)` pairs written into
//! a caller-owned work array; an auxiliary combiner task merges the
//! pairs with the standard rescaling rule and writes the final value.
//! For symmetric matrices the strict triangle counts twice: diagonal
//! tiles fold their own mirror weight in the tile kernel, and the
//! combiner doubles the off-diagonal tile contributions before folding
//! the diagonal ones in.

use num_traits::{Float, One, Zero};
use tessera_core::{Access, Dep, Desc, Error, Norm, Result, Scalar, Uplo};
use tessera_kernels as kernels;
use tessera_runtime::{Region, Request, Sequence, SharedSlice};

use crate::runtime::{check_matrix, Tessera};
use crate::translate;

impl Tessera {
    /// Norm of a general `m x n` matrix.
    pub fn lange<T: Scalar>(
        &self,
        norm: Norm,
        m: usize,
        n: usize,
        a: &[T],
        lda: usize,
    ) -> Result<T::Real> {
        check_matrix(a, lda, m, n, "a", "lda")?;
        if m == 0 || n == 0 {
            return Ok(T::Real::zero());
        }

        let nb = self.nb();
        let da = Desc::general(nb, nb, m, n, 0, 0, m, n)?;
        let tiles = da.mt * da.nt;
        let mut work = vec![T::Real::zero(); work_len(norm, tiles)];
        let mut value = [T::Real::zero(); 1];

        let seq = Sequence::new();
        let sa = SharedSlice::from_ref(a);
        let sw = SharedSlice::from_mut(&mut work);
        let sv = SharedSlice::from_mut(&mut value);

        self.pool.region(|reg| {
            translate::cm2ccrb(reg, sa, lda, &da, &seq);
            plange(reg, norm, &da, sw, sv, &seq);
        });
        seq.status()?;
        Ok(value[0])
    }

    /// Norm of the symmetric `n x n` matrix stored in the `uplo`
    /// triangle.
    pub fn lansy<T: Scalar>(
        &self,
        norm: Norm,
        uplo: Uplo,
        n: usize,
        a: &[T],
        lda: usize,
    ) -> Result<T::Real> {
        if matches!(uplo, Uplo::General) {
            return Err(Error::IllegalValue { arg: "uplo" });
        }
        check_matrix(a, lda, n, n, "a", "lda")?;
        if n == 0 {
            return Ok(T::Real::zero());
        }

        let nb = self.nb();
        let da = Desc::general(nb, nb, n, n, 0, 0, n, n)?;
        let tiles = triangle_tiles(&da, uplo).len();
        let mut work = vec![T::Real::zero(); work_len(norm, tiles)];
        let mut value = [T::Real::zero(); 1];

        let seq = Sequence::new();
        let sa = SharedSlice::from_ref(a);
        let sw = SharedSlice::from_mut(&mut work);
        let sv = SharedSlice::from_mut(&mut value);

        self.pool.region(|reg| {
            translate::cm2ccrb(reg, sa, lda, &da, &seq);
            plansy(reg, norm, uplo, &da, sw, sv, &seq);
        });
        seq.status()?;
        Ok(value[0])
    }
}

/// Tile-descriptor LANGE submitted into an open region. `work` needs
/// `2 * mt * nt` elements for the Frobenius norm and `mt * nt` for the
/// max norm; the result is written into `value` at the join.
pub fn lange_async<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    norm: Norm,
    a: &Desc<T>,
    work: &'env mut [T::Real],
    value: &'env mut T::Real,
    seq: &'env Sequence,
    req: &'env Request,
) {
    if a.check().is_err() {
        seq.fail(req, Error::IllegalValue { arg: "a" });
        return;
    }
    if work.len() < work_len(norm, a.mt * a.nt) {
        seq.fail(req, Error::IllegalValue { arg: "work" });
        return;
    }
    if a.m == 0 || a.n == 0 {
        *value = T::Real::zero();
        return;
    }
    let sw = SharedSlice::from_mut(work);
    let sv = SharedSlice::from_mut(std::slice::from_mut(value));
    plange(reg, norm, a, sw, sv, seq);
}

/// Tile-descriptor LANSY submitted into an open region. `work` is
/// sized like [`lange_async`] but over the triangle's tile count.
pub fn lansy_async<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    norm: Norm,
    uplo: Uplo,
    a: &Desc<T>,
    work: &'env mut [T::Real],
    value: &'env mut T::Real,
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
    if work.len() < work_len(norm, triangle_tiles(a, uplo).len()) {
        seq.fail(req, Error::IllegalValue { arg: "work" });
        return;
    }
    if a.m == 0 {
        *value = T::Real::zero();
        return;
    }
    let sw = SharedSlice::from_mut(work);
    let sv = SharedSlice::from_mut(std::slice::from_mut(value));
    plansy(reg, norm, uplo, a, sw, sv, seq);
}

fn work_len(norm: Norm, tiles: usize) -> usize {
    match norm {
        Norm::Frobenius => 2 * tiles,
        Norm::Max => tiles,
    }
}

/// Tiles of the `uplo` triangle, diagonal tiles flagged.
fn triangle_tiles<T>(a: &Desc<T>, uplo: Uplo) -> Vec<(usize, usize, bool)> {
    let mut tiles = Vec::new();
    for n in 0..a.nt {
        let rows: Vec<usize> = match uplo {
            Uplo::Lower => (n..a.mt).collect(),
            _ => (0..=n.min(a.mt.saturating_sub(1))).collect(),
        };
        for m in rows {
            tiles.push((m, n, m == n));
        }
    }
    tiles
}

/// Emit the general-matrix norm reduction.
pub(crate) fn plange<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    norm: Norm,
    a: &Desc<T>,
    work: SharedSlice<T::Real>,
    value: SharedSlice<T::Real>,
    seq: &'env Sequence,
) {
    if !seq.ok() {
        return;
    }
    let tiles: Vec<(usize, usize, bool)> = (0..a.mt)
        .flat_map(|m| (0..a.nt).map(move |n| (m, n, false)))
        .collect();
    emit_norm(reg, norm, a, Uplo::General, tiles, work, value, seq);
}

/// Emit the symmetric-matrix norm reduction over one triangle.
pub(crate) fn plansy<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    norm: Norm,
    uplo: Uplo,
    a: &Desc<T>,
    work: SharedSlice<T::Real>,
    value: SharedSlice<T::Real>,
    seq: &'env Sequence,
) {
    if !seq.ok() {
        return;
    }
    let tiles = triangle_tiles(a, uplo);
    emit_norm(reg, norm, a, uplo, tiles, work, value, seq);
}

/// Per-tile reduction tasks plus one combiner. `uplo` distinguishes the
/// symmetric case, where diagonal tiles reduce their triangle with the
/// mirror weight folded in and the combiner doubles the off-diagonal
/// contributions.
#[allow(clippy::too_many_arguments)]
fn emit_norm<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    norm: Norm,
    a: &Desc<T>,
    uplo: Uplo,
    tiles: Vec<(usize, usize, bool)>,
    work: SharedSlice<T::Real>,
    value: SharedSlice<T::Real>,
    seq: &'env Sequence,
) {
    let rsize = std::mem::size_of::<T::Real>();
    let symmetric = !matches!(uplo, Uplo::General);

    for (idx, &(m, n, diag)) in tiles.iter().enumerate() {
        let mv = a.tile_mview(m);
        let nv = a.tile_nview(n);
        let a = a.clone();
        match norm {
            Norm::Frobenius => {
                let deps = [
                    a.tile_dep(m, n, Access::In),
                    Dep::output(work.addr_of(2 * idx), 2 * rsize),
                ];
                reg.submit(&deps, move |_| {
                    if !seq.ok() {
                        return;
                    }
                    let ld = a.tile_dims(m, n).0.max(1);
                    let mut scale = T::Real::zero();
                    let mut sumsq = T::Real::one();
                    unsafe {
                        let tile = a.tile_slice(m, n);
                        if symmetric && diag {
                            kernels::ssq::syssq::<T>(uplo, mv, tile, ld, &mut scale, &mut sumsq);
                        } else {
                            kernels::ssq::gessq::<T>(mv, nv, tile, ld, &mut scale, &mut sumsq);
                        }
                        work.write(2 * idx, scale);
                        work.write(2 * idx + 1, sumsq);
                    }
                });
            }
            Norm::Max => {
                let deps = [
                    a.tile_dep(m, n, Access::In),
                    Dep::output(work.addr_of(idx), rsize),
                ];
                reg.submit(&deps, move |_| {
                    if !seq.ok() {
                        return;
                    }
                    let ld = a.tile_dims(m, n).0.max(1);
                    unsafe {
                        let tile = a.tile_slice(m, n);
                        let v = if symmetric && diag {
                            kernels::ssq::symax::<T>(uplo, mv, tile, ld)
                        } else {
                            kernels::ssq::gemax::<T>(mv, nv, tile, ld)
                        };
                        work.write(idx, v);
                    }
                });
            }
        }
    }

    // combiner
    let mut deps: Vec<Dep> = Vec::with_capacity(tiles.len() + 1);
    for idx in 0..tiles.len() {
        match norm {
            Norm::Frobenius => deps.push(Dep::input(work.addr_of(2 * idx), 2 * rsize)),
            Norm::Max => deps.push(Dep::input(work.addr_of(idx), rsize)),
        }
    }
    deps.push(Dep::output(value.addr_of(0), rsize));

    let flags: Vec<bool> = tiles.iter().map(|&(_, _, diag)| diag).collect();
    reg.submit(&deps, move |_| {
        if !seq.ok() {
            return;
        }
        unsafe {
            match norm {
                Norm::Frobenius => {
                    let mut scl = T::Real::zero();
                    let mut sum = T::Real::one();
                    if symmetric {
                        for (idx, &diag) in flags.iter().enumerate() {
                            if !diag {
                                kernels::ssq_merge(
                                    work.read(2 * idx),
                                    work.read(2 * idx + 1),
                                    &mut scl,
                                    &mut sum,
                                );
                            }
                        }
                        sum = sum + sum;
                        for (idx, &diag) in flags.iter().enumerate() {
                            if diag {
                                kernels::ssq_merge(
                                    work.read(2 * idx),
                                    work.read(2 * idx + 1),
                                    &mut scl,
                                    &mut sum,
                                );
                            }
                        }
                    } else {
                        for idx in 0..flags.len() {
                            kernels::ssq_merge(
                                work.read(2 * idx),
                                work.read(2 * idx + 1),
                                &mut scl,
                                &mut sum,
                            );
                        }
                    }
                    value.write(0, scl * sum.sqrt());
                }
                Norm::Max => {
                    let mut v = T::Real::zero();
                    for idx in 0..flags.len() {
                        let x = work.read(idx);
                        if x > v {
                            v = x;
                        }
                    }
                    value.write(0, v);
                }
            }
        }
    });
}
