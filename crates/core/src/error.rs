//! Error types for the tessera runtime
//!
//! One unified error enum for every entry point. We use `thiserror` for the
//! `Display` and `Error` trait implementations.
//!
//! Errors fall into two groups:
//!
//! - **Synchronous**: argument validation, descriptor checks and allocation
//!   failures are reported by return value before any task is submitted.
//! - **In-flight**: a kernel failure (for example a non-positive-definite
//!   pivot) is recorded on the call's sequence; every task body submitted
//!   afterwards drains as a no-op and the caller observes the aggregate
//!   status after the implicit join.

use thiserror::Error;

/// Result type alias for tessera operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds for the tessera runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The runtime handle was not initialized before use
    #[error("runtime not initialized")]
    NotInitialized,

    /// An argument had an illegal value; `arg` names the offending argument
    #[error("illegal value of {arg}")]
    IllegalValue {
        /// Name of the offending argument
        arg: &'static str,
    },

    /// Backing store allocation failed
    #[error("out of memory")]
    OutOfMemory,

    /// A task was submitted into a sequence that had already failed
    #[error("task submitted into a failed sequence")]
    SequenceFlushed,

    /// A tile kernel rejected its arguments; carries the kernel's info code
    #[error("internal kernel failure (info {0})")]
    KernelFailure(i32),

    /// Cholesky breakdown: the leading minor of this (1-based) order is not
    /// positive definite
    #[error("leading minor of order {0} is not positive definite")]
    NotPositiveDefinite(usize),

    /// A triangular factor has an exactly zero diagonal at this (1-based)
    /// position, so the solve cannot proceed
    #[error("triangular factor is exactly singular at diagonal {0}")]
    SingularFactor(usize),
}

impl Error {
    /// Whether this error describes a numerical property of the input
    /// (as opposed to misuse of the API or resource exhaustion).
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            Error::NotPositiveDefinite(_) | Error::SingularFactor(_)
        )
    }
}
