//! # Tessera
//!
//! A tile-based, task-parallel runtime for dense linear algebra.
//!
//! Large matrices are decomposed into fixed-size tiles; every blocked
//! routine is expressed as a DAG of single-tile kernels whose read/write
//! dependencies on tile memory induce a correct parallel order on a
//! work-stealing worker pool.
//!
//! # Quick start
//!
//! ```no_run
//! use tessera::{Options, Tessera, Trans, Uplo};
//!
//! fn main() -> tessera::Result<()> {
//!     let rt = Tessera::new(Options::new().nb(128))?;
//!
//!     let n = 1000;
//!     let a = vec![1.0f64; n * n];
//!     let b = vec![1.0f64; n * n];
//!     let mut c = vec![0.0f64; n * n];
//!
//!     // C := A * B (column-major buffers)
//!     rt.gemm(Trans::NoTrans, Trans::NoTrans, n, n, n, 1.0, &a, n, &b, n, 0.0, &mut c, n)?;
//!
//!     // in-place Cholesky of a positive definite matrix
//!     let mut spd = vec![0.0f64; n * n];
//!     for i in 0..n {
//!         spd[i + i * n] = 1.0 + n as f64;
//!     }
//!     rt.potrf(Uplo::Lower, n, &mut spd, n)?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! | Crate | Role |
//! |-------|------|
//! | `tessera-core` | scalar trait, enums, errors, tile descriptor |
//! | `tessera-runtime` | worker pool, dependency DAG, sequences, workspace |
//! | `tessera-kernels` | single-tile numerical kernels |
//! | `tessera` (this) | layout translation, blocked algorithms, public API |
//!
//! Every public entry point validates its arguments synchronously, then
//! opens one parallel region in which it translates the column-major
//! user buffers to tile layout, emits the algorithm DAG and translates
//! back, all under one [`Sequence`]; the region join is the only
//! blocking point and the sequence's final status is the return value.
//!
//! The `*_async` variants of each routine operate on tile descriptors
//! inside a caller-opened region, which allows several operations to
//! pipeline through one DAG.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod routines;
mod runtime;
mod task;
mod translate;

pub use routines::lq::{gelqf_async, LqFactors};
pub use routines::qr::{geqrf_async, geqrs_async, unmqr_async, QrFactors};
pub use routines::{
    gemm::gemm_async, laset::laset_async, lauum::lauum_async, norms::lange_async,
    norms::lansy_async, potrf::posv_async, potrf::potrf_async, potrf::potrs_async,
    syr2k::syr2k_async, trmm::trmm_async, trsm::trsm_async,
};
pub use runtime::{Options, Tessera};
pub use translate::{ccrb2cm_async, ccrb2cm_band_async, cm2ccrb_async, cm2ccrb_band_async};

pub use tessera_core::{
    Complex, Complex32, Complex64, Desc, Diag, Error, Norm, Result, Scalar, Side, Trans, Uplo,
};
pub use tessera_runtime::{Region, Request, Sequence, SharedSlice, Workspace};
