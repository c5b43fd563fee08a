//! Tile matrix descriptor.
//!
//! A descriptor denotes a (possibly offset) submatrix view of a logical
//! matrix stored as a grid of `mb x nb` tiles. Storage is split into four
//! contiguous zones so that interior tiles all share one shape:
//!
//! ```text
//!              n1      n2
//!         +----------+---+
//!         |          |   |    m1 = lm - (lm % mb)
//!         |          |   |    m2 = lm % mb
//!     m1  |    A11   |A12|    n1 = ln - (ln % nb)
//!         |          |   |    n2 = ln % nb
//!         |          |   |
//!         +----------+---+
//!     m2  |    A21   |A22|
//!         +----------+---+
//! ```
//!
//! `A11` holds the full `mb x nb` interior tiles in column-major tile
//! order, `A12` the short-width right edge, `A21` the short-height bottom
//! edge and `A22` the single corner tile. Within a zone, a tile's address
//! is a pure function of its tile indices, which is what lets the
//! scheduler key dependencies on tile base addresses.
//!
//! Band descriptors keep only the tiles meeting the band `[-ku, kl]`, plus
//! `kl` extra superdiagonal tile rows reserved for fill during
//! factorization in the general case. Band tile `(m, n)` lives at general
//! tile `(kut + m - n, n)`.
//!
//! The backing store is shared through an `Arc` so that views and task
//! closures can address tiles without borrowing from the owner; the
//! dependency tracker is what guarantees two tasks never touch the same
//! tile region concurrently with a writer.

use std::cell::UnsafeCell;
use std::sync::Arc;

use num_traits::Zero;

use crate::error::{Error, Result};
use crate::scalar::Scalar;
use crate::types::{Access, Dep, Uplo};

/// Storage class of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescKind {
    /// Dense general tile grid
    General,
    /// Packed band tile grid
    GeneralBand,
}

/// Backing tile buffer. Tasks on different tiles write through raw
/// pointers; disjointness is the scheduler's responsibility.
struct Storage<T> {
    cells: Box<[UnsafeCell<T>]>,
}

// One storage is shared by many tasks across worker threads. All access
// goes through raw pointers derived below; the dependency DAG serializes
// conflicting accesses.
unsafe impl<T: Send> Send for Storage<T> {}
unsafe impl<T: Send + Sync> Sync for Storage<T> {}

impl<T: Scalar> Storage<T> {
    fn zeroed(len: usize) -> Result<Self> {
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|_| Error::OutOfMemory)?;
        cells.resize_with(len, || UnsafeCell::new(T::zero()));
        Ok(Storage { cells: cells.into_boxed_slice() })
    }

    fn base(&self) -> *mut T {
        self.cells.as_ptr() as *mut T
    }
}

/// Tile matrix descriptor (see module docs).
#[derive(Clone)]
pub struct Desc<T> {
    kind: DescKind,
    /// Triangle selector; `Uplo::General` for full matrices.
    pub uplo: Uplo,
    storage: Arc<Storage<T>>,

    /// Tile height
    pub mb: usize,
    /// Tile width
    pub nb: usize,

    /// Rows of the entire matrix (band: rows of the packed storage)
    pub lm: usize,
    /// Columns of the entire matrix
    pub ln: usize,
    /// Tile rows of the entire matrix
    pub lmt: usize,
    /// Tile columns of the entire matrix
    pub lnt: usize,

    /// Row origin of the submatrix
    pub i: usize,
    /// Column origin of the submatrix
    pub j: usize,
    /// Rows of the submatrix
    pub m: usize,
    /// Columns of the submatrix
    pub n: usize,
    /// Tile rows of the submatrix
    pub mt: usize,
    /// Tile columns of the submatrix
    pub nt: usize,

    /// Element subdiagonals (band only)
    pub kl: usize,
    /// Element superdiagonals (band only)
    pub ku: usize,
    /// Tile rows below the diagonal tile (band only)
    pub klt: usize,
    /// Tile rows above the diagonal tile, including the fill reserve
    /// (band only)
    pub kut: usize,

    // element offsets of the three non-interior zones
    a12: usize,
    a21: usize,
    a22: usize,
}

impl<T: Scalar> Desc<T> {
    /// Create a general tiled matrix with freshly allocated, zeroed
    /// backing storage.
    pub fn general(
        mb: usize,
        nb: usize,
        lm: usize,
        ln: usize,
        i: usize,
        j: usize,
        m: usize,
        n: usize,
    ) -> Result<Self> {
        if mb < 1 {
            return Err(Error::IllegalValue { arg: "mb" });
        }
        if nb < 1 {
            return Err(Error::IllegalValue { arg: "nb" });
        }
        if i + m > lm {
            return Err(Error::IllegalValue { arg: "m" });
        }
        if j + n > ln {
            return Err(Error::IllegalValue { arg: "n" });
        }

        // zone offsets, in elements
        let a21 = (lm - lm % mb) * (ln - ln % nb);
        let a12 = a21 + (lm % mb) * (ln - ln % nb);
        let a22 = a12 + (lm - lm % mb) * (ln % nb);
        let total = a22 + (lm % mb) * (ln % nb);

        let storage = Arc::new(Storage::zeroed(total)?);
        Ok(Desc {
            kind: DescKind::General,
            uplo: Uplo::General,
            storage,
            mb,
            nb,
            lm,
            ln,
            lmt: lm.div_ceil(mb),
            lnt: ln.div_ceil(nb),
            i,
            j,
            m,
            n,
            mt: (i % mb + m).div_ceil(mb),
            nt: (j % nb + n).div_ceil(nb),
            kl: 0,
            ku: 0,
            klt: 0,
            kut: 0,
            a12,
            a21,
            a22,
        })
    }

    /// Create a packed band matrix with `kl` subdiagonals and `ku`
    /// superdiagonals. `lm`/`ln` are the dimensions of the logical matrix;
    /// the packed storage holds `klt + kut + 1` tile rows, where `kut`
    /// includes the fill reserve for factorization in the general case.
    pub fn general_band(
        uplo: Uplo,
        mb: usize,
        nb: usize,
        lm: usize,
        ln: usize,
        i: usize,
        j: usize,
        m: usize,
        n: usize,
        kl: usize,
        ku: usize,
    ) -> Result<Self> {
        if mb < 1 {
            return Err(Error::IllegalValue { arg: "mb" });
        }
        if nb < 1 {
            return Err(Error::IllegalValue { arg: "nb" });
        }
        if i + m > lm {
            return Err(Error::IllegalValue { arg: "m" });
        }
        if j + n > ln {
            return Err(Error::IllegalValue { arg: "n" });
        }
        if matches!(uplo, Uplo::Upper) && kl != 0 {
            return Err(Error::IllegalValue { arg: "kl" });
        }
        if matches!(uplo, Uplo::Lower) && ku != 0 {
            return Err(Error::IllegalValue { arg: "ku" });
        }

        let (kut, klt) = band_tile_counts(uplo, mb, nb, kl, ku);
        let lmb = mb * (klt + kut + 1);

        // the packed store is sized by the band window, not the logical
        // row count, so allocate over the full window and then restore the
        // logical submatrix extents
        let mut desc = Self::general(mb, nb, lmb, ln, 0, 0, lmb, ln)?;
        desc.kind = DescKind::GeneralBand;
        desc.uplo = uplo;
        desc.kl = kl;
        desc.ku = ku;
        desc.klt = klt;
        desc.kut = kut;
        desc.i = i;
        desc.j = j;
        desc.m = m;
        desc.n = n;
        desc.mt = (i % mb + m).div_ceil(mb);
        desc.nt = (j % nb + n).div_ceil(nb);
        Ok(desc)
    }

    /// Descriptor holding the triangular `T` factors of a blocked QR/LQ
    /// factorization of `a`: one full `ib x nb` tile per tile of `a`.
    pub fn for_t_factors(a: &Desc<T>, ib: usize) -> Result<Self> {
        if ib < 1 {
            return Err(Error::IllegalValue { arg: "ib" });
        }
        let lm = ib * a.mt;
        let ln = a.nb * a.nt;
        Self::general(ib, a.nb, lm, ln, 0, 0, lm, ln)
    }

    /// Non-owning view sharing this descriptor's storage, with origin
    /// shifted by `(i, j)` and extents `(m, n)`.
    pub fn view(&self, i: usize, j: usize, m: usize, n: usize) -> Result<Self> {
        let ni = self.i + i;
        let nj = self.j + j;
        if ni + m > self.lm {
            return Err(Error::IllegalValue { arg: "m" });
        }
        if nj + n > self.ln {
            return Err(Error::IllegalValue { arg: "n" });
        }
        let mut v = self.clone();
        v.i = ni;
        v.j = nj;
        v.m = m;
        v.n = n;
        v.mt = (ni % self.mb + m).div_ceil(self.mb);
        v.nt = (nj % self.nb + n).div_ceil(self.nb);
        Ok(v)
    }

    /// Storage class of this descriptor.
    pub fn kind(&self) -> DescKind {
        self.kind
    }

    /// Element offset of tile `(m, n)` in the backing store.
    fn tile_offset(&self, m: usize, n: usize) -> usize {
        match self.kind {
            DescKind::General => self.tile_offset_general(m, n),
            DescKind::GeneralBand => {
                debug_assert!(self.kut + m >= n, "tile outside the band window");
                self.tile_offset_general(self.kut + m - n, n)
            }
        }
    }

    fn tile_offset_general(&self, m: usize, n: usize) -> usize {
        let mm = m + self.i / self.mb;
        let nn = n + self.j / self.nb;
        let lm1 = self.lm / self.mb;
        let ln1 = self.ln / self.nb;
        if mm < lm1 {
            if nn < ln1 {
                self.mb * self.nb * (mm + lm1 * nn)
            } else {
                self.a12 + self.mb * (self.ln % self.nb) * mm
            }
        } else if nn < ln1 {
            self.a21 + self.nb * (self.lm % self.mb) * nn
        } else {
            self.a22
        }
    }

    /// Raw pointer to the first element of tile `(m, n)`.
    pub fn tile_ptr(&self, m: usize, n: usize) -> *mut T {
        // Safety: tile_offset stays within the allocation for any tile of
        // the grid; this only computes an address.
        unsafe { self.storage.base().add(self.tile_offset(m, n)) }
    }

    /// Storage dimensions `(rows, cols)` of tile `(m, n)`. The row count
    /// is the tile's leading dimension.
    pub fn tile_dims(&self, m: usize, n: usize) -> (usize, usize) {
        match self.kind {
            DescKind::General => (self.tile_mmain(m), self.tile_nmain(n)),
            DescKind::GeneralBand => (self.blkldd_band(m, n), self.tile_nmain(n)),
        }
    }

    /// Shared slice over the storage of tile `(m, n)`.
    ///
    /// # Safety
    /// The caller must guarantee, via declared dependencies, that no task
    /// writes this tile while the slice is alive.
    pub unsafe fn tile_slice(&self, m: usize, n: usize) -> &[T] {
        let (rows, cols) = self.tile_dims(m, n);
        std::slice::from_raw_parts(self.tile_ptr(m, n), rows * cols)
    }

    /// Mutable slice over the storage of tile `(m, n)`.
    ///
    /// # Safety
    /// The caller must guarantee, via declared dependencies, that this
    /// task is the only one touching the tile while the slice is alive.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn tile_slice_mut(&self, m: usize, n: usize) -> &mut [T] {
        let (rows, cols) = self.tile_dims(m, n);
        std::slice::from_raw_parts_mut(self.tile_ptr(m, n), rows * cols)
    }

    /// Dependency region covering tile `(m, n)`.
    pub fn tile_dep(&self, m: usize, n: usize, access: Access) -> Dep {
        let (rows, cols) = self.tile_dims(m, n);
        Dep {
            addr: self.tile_ptr(m, n) as usize,
            len: rows * cols * std::mem::size_of::<T>(),
            access,
        }
    }

    /// Storage height of tile row `k`.
    pub fn tile_mmain(&self, k: usize) -> usize {
        if self.i / self.mb + k < self.lm / self.mb {
            self.mb
        } else {
            self.lm % self.mb
        }
    }

    /// Storage width of tile column `k`.
    pub fn tile_nmain(&self, k: usize) -> usize {
        if self.j / self.nb + k < self.ln / self.nb {
            self.nb
        } else {
            self.ln % self.nb
        }
    }

    /// Height of the portion of the submatrix occupying tile row `k`.
    pub fn tile_mview(&self, k: usize) -> usize {
        if self.i / self.mb + k < self.m / self.mb {
            self.mb
        } else {
            self.m % self.mb
        }
    }

    /// Width of the portion of the submatrix occupying tile column `k`.
    pub fn tile_nview(&self, k: usize) -> usize {
        if self.j / self.nb + k < self.n / self.nb {
            self.nb
        } else {
            self.n % self.nb
        }
    }

    /// Leading dimension of band tile `(m, n)`.
    pub fn blkldd_band(&self, m: usize, n: usize) -> usize {
        debug_assert!(self.kut + m >= n);
        self.tile_mmain(self.kut + m - n)
    }

    /// Validate the descriptor invariants. Called by every async entry
    /// point before tasks are submitted.
    pub fn check(&self) -> Result<()> {
        if self.mb < 1 {
            return Err(Error::IllegalValue { arg: "mb" });
        }
        if self.nb < 1 {
            return Err(Error::IllegalValue { arg: "nb" });
        }
        match self.kind {
            DescKind::General => {
                if self.i + self.m > self.lm {
                    return Err(Error::IllegalValue { arg: "m" });
                }
                if self.j + self.n > self.ln {
                    return Err(Error::IllegalValue { arg: "n" });
                }
            }
            DescKind::GeneralBand => {
                if self.j + self.n > self.ln {
                    return Err(Error::IllegalValue { arg: "n" });
                }
                let (kut, klt) = band_tile_counts(self.uplo, self.mb, self.nb, self.kl, self.ku);
                if kut != self.kut || klt != self.klt {
                    return Err(Error::IllegalValue { arg: "ku" });
                }
                if self.lm != self.mb * (self.klt + self.kut + 1) {
                    return Err(Error::IllegalValue { arg: "kl" });
                }
            }
        }
        Ok(())
    }
}

/// Tile rows above/below the diagonal tile kept by band storage.
///
/// In the general case the superdiagonal count includes the `kl` fill
/// rows a factorization may produce, so the reserve is `kl + ku`.
fn band_tile_counts(uplo: Uplo, mb: usize, nb: usize, kl: usize, ku: usize) -> (usize, usize) {
    match uplo {
        Uplo::General => ((kl + ku).div_ceil(nb), kl.div_ceil(mb)),
        Uplo::Upper => (ku.div_ceil(nb), 0),
        Uplo::Lower => (0, kl.div_ceil(mb)),
    }
}

impl<T> std::fmt::Debug for Desc<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Desc")
            .field("kind", &self.kind)
            .field("uplo", &self.uplo)
            .field("mb", &self.mb)
            .field("nb", &self.nb)
            .field("lm", &self.lm)
            .field("ln", &self.ln)
            .field("i", &self.i)
            .field("j", &self.j)
            .field("m", &self.m)
            .field("n", &self.n)
            .field("mt", &self.mt)
            .field("nt", &self.nt)
            .finish()
    }
}
