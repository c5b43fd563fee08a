//! Task runtime for tessera
//!
//! This crate implements the execution substrate under the blocked
//! algorithms:
//! - Pool: fixed work-stealing worker pool with per-worker ids
//! - Region: fork-join parallel region with dependency-ordered task
//!   submission (the OpenMP `task depend` model made explicit)
//! - Sequence/Request: aggregate async status, first-error-wins
//! - Workspace: per-worker scratch buffers for panel kernels
//! - SharedSlice: unchecked shared view used by tasks that write disjoint
//!   pieces of one user buffer

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dag;
pub mod pool;
pub mod sequence;
pub mod shared;
pub mod workspace;

pub use dag::Region;
pub use pool::Pool;
pub use sequence::{Request, Sequence};
pub use shared::SharedSlice;
pub use workspace::Workspace;
