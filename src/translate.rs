//! Layout translation between column-major user storage and tiled
//! storage, as tile-copy DAGs.
//!
//! Each tile copy is one task with a dependency on the user subblock it
//! touches and on the destination (or source) tile, so translations
//! parallelize over tiles and interleave with algorithm tasks through
//! the ordinary dependency machinery. The user side is accessed
//! element-wise through a [`SharedSlice`], since many tasks touch
//! disjoint strided subblocks of one buffer concurrently.
//!
//! Edge ranges `(x1, y1, x2, y2)` account for a fractional submatrix
//! origin (`i mod mb`, `j mod nb`) and fractional end tiles. Band
//! variants walk only the tiles meeting the band window of each tile
//! column; the banded user layout is the LAPACK convention
//! `ab[offs + i - j + j*ldab]` with `offs = ku` for general/upper bands
//! and `0` for lower.

use tessera_core::{Access, Dep, Desc, Error, Scalar, Uplo};
use tessera_runtime::{Region, Request, Sequence, SharedSlice};

/// Column-major to tiled, one task per tile.
pub(crate) fn cm2ccrb<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    pa: SharedSlice<T>,
    lda: usize,
    a: &Desc<T>,
    seq: &'env Sequence,
) {
    if !seq.ok() {
        return;
    }
    for m in 0..a.mt {
        for n in 0..a.nt {
            let (x1, y1, x2, y2) = edge_ranges(a, m, n);
            let src = a.nb * lda * n + a.mb * m;
            let deps = [
                Dep::input(pa.addr_of(src), user_len::<T>(x2 - x1, y2 - y1, lda)),
                a.tile_dep(m, n, Access::Out),
            ];
            let a = a.clone();
            reg.submit(&deps, move |_| {
                if !seq.ok() {
                    return;
                }
                let ldt = a.tile_dims(m, n).0.max(1);
                unsafe {
                    let tile = a.tile_slice_mut(m, n);
                    for jj in x1..x2 {
                        for ii in y1..y2 {
                            tile[ii + jj * ldt] = pa.read(src + jj * lda + ii);
                        }
                    }
                }
            });
        }
    }
}

/// Tiled to column-major, one task per tile.
pub(crate) fn ccrb2cm<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    a: &Desc<T>,
    pa: SharedSlice<T>,
    lda: usize,
    seq: &'env Sequence,
) {
    if !seq.ok() {
        return;
    }
    for m in 0..a.mt {
        for n in 0..a.nt {
            let (x1, y1, x2, y2) = edge_ranges(a, m, n);
            let src = a.nb * lda * n + a.mb * m;
            let deps = [
                a.tile_dep(m, n, Access::In),
                Dep::output(pa.addr_of(src), user_len::<T>(x2 - x1, y2 - y1, lda)),
            ];
            let a = a.clone();
            reg.submit(&deps, move |_| {
                if !seq.ok() {
                    return;
                }
                let ldt = a.tile_dims(m, n).0.max(1);
                unsafe {
                    let tile = a.tile_slice(m, n);
                    for jj in x1..x2 {
                        for ii in y1..y2 {
                            pa.write(src + jj * lda + ii, tile[ii + jj * ldt]);
                        }
                    }
                }
            });
        }
    }
}

/// Banded column-major to band-tiled storage.
pub(crate) fn cm2ccrb_band<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    pab: SharedSlice<T>,
    ldab: usize,
    a: &Desc<T>,
    seq: &'env Sequence,
) {
    if !seq.ok() {
        return;
    }
    for n in 0..a.nt {
        let (m_start, m_end) = band_window(uplo, a, n);
        for m in m_start..=m_end {
            let rows = a.mb.min(a.m - m * a.mb);
            let cols = a.nb.min(a.n - n * a.nb);
            let deps = [
                Dep::input(band_anchor(&pab, uplo, a, ldab, m, n), rows * std::mem::size_of::<T>()),
                a.tile_dep(m, n, Access::Out),
            ];
            let a = a.clone();
            reg.submit(&deps, move |_| {
                if !seq.ok() {
                    return;
                }
                let ldt = a.tile_dims(m, n).0.max(1);
                let offs = band_offset(uplo, a.ku);
                unsafe {
                    let tile = a.tile_slice_mut(m, n);
                    for jj in 0..cols {
                        let j = n * a.nb + jj;
                        for ii in 0..rows {
                            let i = m * a.mb + ii;
                            if in_band(uplo, a.kl, a.ku, i, j) {
                                tile[ii + jj * ldt] = pab.read(offs + i - j + j * ldab);
                            }
                        }
                    }
                }
            });
        }
    }
}

/// Band-tiled storage back to banded column-major.
pub(crate) fn ccrb2cm_band<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    a: &Desc<T>,
    pab: SharedSlice<T>,
    ldab: usize,
    seq: &'env Sequence,
) {
    if !seq.ok() {
        return;
    }
    for n in 0..a.nt {
        let (m_start, m_end) = band_window(uplo, a, n);
        for m in m_start..=m_end {
            let rows = a.mb.min(a.m - m * a.mb);
            let cols = a.nb.min(a.n - n * a.nb);
            let deps = [
                a.tile_dep(m, n, Access::In),
                Dep::output(band_anchor(&pab, uplo, a, ldab, m, n), rows * std::mem::size_of::<T>()),
            ];
            let a = a.clone();
            reg.submit(&deps, move |_| {
                if !seq.ok() {
                    return;
                }
                let ldt = a.tile_dims(m, n).0.max(1);
                let offs = band_offset(uplo, a.ku);
                unsafe {
                    let tile = a.tile_slice(m, n);
                    for jj in 0..cols {
                        let j = n * a.nb + jj;
                        for ii in 0..rows {
                            let i = m * a.mb + ii;
                            if in_band(uplo, a.kl, a.ku, i, j) {
                                pab.write(offs + i - j + j * ldab, tile[ii + jj * ldt]);
                            }
                        }
                    }
                }
            });
        }
    }
}

/// Submit the column-major to tiled translation into an open region
/// (validated async entry).
pub fn cm2ccrb_async<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    pa: &'env [T],
    lda: usize,
    a: &Desc<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    if a.check().is_err() {
        seq.fail(req, Error::IllegalValue { arg: "a" });
        return;
    }
    if lda < a.m.max(1) {
        seq.fail(req, Error::IllegalValue { arg: "lda" });
        return;
    }
    if !seq.ok() {
        seq.fail(req, Error::SequenceFlushed);
        return;
    }
    if a.m == 0 || a.n == 0 {
        return;
    }
    cm2ccrb(reg, SharedSlice::from_ref(pa), lda, a, seq);
}

/// Submit the tiled to column-major translation into an open region
/// (validated async entry).
pub fn ccrb2cm_async<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    a: &Desc<T>,
    pa: &'env mut [T],
    lda: usize,
    seq: &'env Sequence,
    req: &'env Request,
) {
    if a.check().is_err() {
        seq.fail(req, Error::IllegalValue { arg: "a" });
        return;
    }
    if lda < a.m.max(1) {
        seq.fail(req, Error::IllegalValue { arg: "lda" });
        return;
    }
    if !seq.ok() {
        seq.fail(req, Error::SequenceFlushed);
        return;
    }
    if a.m == 0 || a.n == 0 {
        return;
    }
    ccrb2cm(reg, a, SharedSlice::from_mut(pa), lda, seq);
}

/// Submit the banded to band-tiled translation into an open region
/// (validated async entry).
pub fn cm2ccrb_band_async<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    pab: &'env [T],
    ldab: usize,
    a: &Desc<T>,
    seq: &'env Sequence,
    req: &'env Request,
) {
    if a.check().is_err() {
        seq.fail(req, Error::IllegalValue { arg: "a" });
        return;
    }
    if ldab < band_ldab_min(uplo, a.kl, a.ku) {
        seq.fail(req, Error::IllegalValue { arg: "ldab" });
        return;
    }
    if !seq.ok() {
        seq.fail(req, Error::SequenceFlushed);
        return;
    }
    if a.m == 0 || a.n == 0 {
        return;
    }
    cm2ccrb_band(reg, uplo, SharedSlice::from_ref(pab), ldab, a, seq);
}

/// Submit the band-tiled to banded translation into an open region
/// (validated async entry).
pub fn ccrb2cm_band_async<'env, T: Scalar>(
    reg: &Region<'_, 'env>,
    uplo: Uplo,
    a: &Desc<T>,
    pab: &'env mut [T],
    ldab: usize,
    seq: &'env Sequence,
    req: &'env Request,
) {
    if a.check().is_err() {
        seq.fail(req, Error::IllegalValue { arg: "a" });
        return;
    }
    if ldab < band_ldab_min(uplo, a.kl, a.ku) {
        seq.fail(req, Error::IllegalValue { arg: "ldab" });
        return;
    }
    if !seq.ok() {
        seq.fail(req, Error::SequenceFlushed);
        return;
    }
    if a.m == 0 || a.n == 0 {
        return;
    }
    ccrb2cm_band(reg, uplo, a, SharedSlice::from_mut(pab), ldab, seq);
}

/// Copy ranges of tile `(m, n)`: columns `x1..x2`, rows `y1..y2` of the
/// tile participate in the submatrix.
fn edge_ranges<T>(a: &Desc<T>, m: usize, n: usize) -> (usize, usize, usize, usize) {
    let x1 = if n == 0 { a.j % a.nb } else { 0 };
    let y1 = if m == 0 { a.i % a.mb } else { 0 };
    let x2 = if n == a.nt - 1 { (a.j + a.n - 1) % a.nb + 1 } else { a.nb };
    let y2 = if m == a.mt - 1 { (a.i + a.m - 1) % a.mb + 1 } else { a.mb };
    (x1, y1, x2, y2)
}

/// Byte length of the user subblock a tile copy touches (for dependency
/// diagnostics).
fn user_len<T>(cols: usize, rows: usize, lda: usize) -> usize {
    if cols == 0 || rows == 0 {
        return 0;
    }
    ((cols - 1) * lda + rows) * std::mem::size_of::<T>()
}

/// Inclusive tile-row window meeting the band in tile column `n`.
fn band_window<T>(uplo: Uplo, a: &Desc<T>, n: usize) -> (usize, usize) {
    let last = a.m - 1;
    match uplo {
        Uplo::General => (
            (n * a.nb).saturating_sub(a.ku + a.kl) / a.nb,
            last.min((n + 1) * a.nb + a.kl - 1) / a.mb,
        ),
        Uplo::Upper => (
            (n * a.nb).saturating_sub(a.ku) / a.nb,
            last.min((n + 1) * a.nb - 1) / a.mb,
        ),
        Uplo::Lower => (n, last.min((n + 1) * a.nb + a.kl - 1) / a.mb),
    }
}

#[inline]
fn band_offset(uplo: Uplo, ku: usize) -> usize {
    match uplo {
        Uplo::Lower => 0,
        _ => ku,
    }
}

#[inline]
fn in_band(uplo: Uplo, kl: usize, ku: usize, i: usize, j: usize) -> bool {
    match uplo {
        Uplo::General => j + kl >= i && i + ku >= j,
        Uplo::Upper => j >= i && i + ku >= j,
        Uplo::Lower => i >= j && j + kl >= i,
    }
}

/// Minimum leading dimension of the banded user buffer.
fn band_ldab_min(uplo: Uplo, kl: usize, ku: usize) -> usize {
    match uplo {
        Uplo::General => kl + ku + 1,
        Uplo::Upper => ku + 1,
        Uplo::Lower => kl + 1,
    }
}

/// Dependency key for the band subblock of tile `(m, n)`: the address
/// of the tile's first column anchor in the banded buffer, computed
/// with signed arithmetic because superdiagonal tiles anchor above the
/// column start. Collisions between adjacent windows only order tasks
/// more conservatively.
fn band_anchor<T>(
    pab: &SharedSlice<T>,
    uplo: Uplo,
    a: &Desc<T>,
    ldab: usize,
    m: usize,
    n: usize,
) -> usize {
    let offs = band_offset(uplo, a.ku) as isize;
    let anchor = (ldab * a.nb * n) as isize + offs
        + a.mb as isize * (m as isize - n as isize);
    (pab.addr_of(0) as isize + anchor * std::mem::size_of::<T>() as isize) as usize
}
