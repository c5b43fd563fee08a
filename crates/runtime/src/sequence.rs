//! Aggregate async status across many tasks.
//!
//! A sequence is the logical unit of work a routine's whole DAG belongs
//! to. It starts in the success state; the first task failure wins and is
//! never overwritten. Task bodies test the sequence before doing any work
//! and drain as no-ops once it has failed, which lets the graph empty
//! without further memory effects while dependencies are still honored.
//!
//! A request identifies one async call within a sequence and carries the
//! call-specific failure (for example the Cholesky pivot index).

use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::OnceCell;
use tessera_core::{Error, Result};

/// Aggregate status of one logical unit of work.
#[derive(Debug, Default)]
pub struct Sequence {
    err: OnceCell<Error>,
    // read-mostly fast path for task bodies
    failed: AtomicBool,
}

impl Sequence {
    /// New sequence in the success state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the sequence is still in the success state.
    ///
    /// This is the hot check at the top of every task body.
    pub fn ok(&self) -> bool {
        !self.failed.load(Ordering::Acquire)
    }

    /// Final status: `Ok(())` or the first recorded error.
    pub fn status(&self) -> Result<()> {
        match self.err.get() {
            None => Ok(()),
            Some(e) => Err(*e),
        }
    }

    /// Record a failure on this sequence and `request`.
    ///
    /// Only the first error is kept on either; later failures are
    /// dropped. The status never reverts to success.
    pub fn fail(&self, request: &Request, err: Error) {
        let _ = request.err.set(err);
        if self.err.set(err).is_ok() {
            self.failed.store(true, Ordering::Release);
        }
    }
}

/// Per-call failure channel nested within a sequence.
#[derive(Debug, Default)]
pub struct Request {
    err: OnceCell<Error>,
}

impl Request {
    /// New request with no recorded failure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Status of this call: `Ok(())` or its first recorded error.
    pub fn status(&self) -> Result<()> {
        match self.err.get() {
            None => Ok(()),
            Some(e) => Err(*e),
        }
    }
}
