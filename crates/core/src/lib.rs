//! Core types for the tessera runtime
//!
//! This crate defines the foundational vocabulary used throughout the system:
//! - Scalar: the generic element trait covering the four precisions
//! - Complex: the complex pair type behind `Complex32`/`Complex64`
//! - Matrix enums: `Uplo`, `Trans`, `Side`, `Diag`, `Norm`
//! - Error: error type hierarchy
//! - Desc: the tile matrix descriptor (tiled storage, views, band packing)
//! - Dep/Access: the dependency vocabulary consumed by the scheduler

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod complex;
pub mod descriptor;
pub mod error;
pub mod scalar;
pub mod types;

pub use complex::{Complex, Complex32, Complex64};
pub use descriptor::Desc;
pub use error::{Error, Result};
pub use scalar::Scalar;
pub use types::{Access, Dep, Diag, Norm, Side, Trans, Uplo};
