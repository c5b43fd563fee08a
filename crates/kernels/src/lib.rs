//! Single-tile numerical kernels.
//!
//! The core layer under the blocked algorithms: every function here works
//! on one tile (or one tile pair) in column-major storage with an
//! explicit leading dimension, mirroring the BLAS/LAPACK core interface
//! the scheduler treats as opaque. Kernels are generic over
//! [`tessera_core::Scalar`]; for real scalars the conjugations collapse
//! to identity, so one source serves all four precisions.
//!
//! Panel kernels (`geqrt`, `tsqrt`, `gelqt`, `tslqt` and the reflector
//! appliers) take caller scratch split as `TAU`/`WORK`, exactly like
//! their LAPACK counterparts; nothing here allocates on the hot path
//! except the in-place `lauum`, which needs one row of carry.

#![warn(clippy::all)]

pub mod gemm;
pub mod herk;
mod householder;
pub mod laset;
pub mod lauum;
pub mod lq;
pub mod potrf;
pub mod qr;
pub mod ssq;
pub mod syr2k;
pub mod trmm;
pub mod trsm;

pub use gemm::gemm;
pub use laset::laset;
pub use herk::herk;
pub use lauum::lauum;
pub use lq::{gelqt, tslqt, tsmlq, unmlq};
pub use potrf::potrf;
pub use qr::{geqrt, tsmqr, tsqrt, unmqr};
pub use ssq::{gemax, gessq, ssq_merge, symax, syssq};
pub use syr2k::syr2k;
pub use trmm::trmm;
pub use trsm::trsm;
