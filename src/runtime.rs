//! Runtime handle and configuration.

use tessera_core::{Error, Result, Scalar};
use tessera_runtime::Pool;
use tracing::debug;

/// Configuration for a [`Tessera`] runtime.
///
/// `nb` is the nominal (square) tile size, `ib` the inner blocking of
/// the panel factorizations, `threads` the worker count and
/// `panel_threads` the panel concurrency recognized for wavefront
/// factorizations.
#[derive(Debug, Clone)]
pub struct Options {
    pub(crate) nb: usize,
    pub(crate) ib: usize,
    pub(crate) threads: usize,
    pub(crate) panel_threads: usize,
}

impl Default for Options {
    fn default() -> Self {
        let threads = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Options { nb: 256, ib: 64, threads, panel_threads: 1 }
    }
}

impl Options {
    /// Defaults: `nb = 256`, `ib = 64`, one worker per available core,
    /// one panel thread.
    pub fn new() -> Self {
        Self::default()
    }

    /// Nominal tile width and height.
    pub fn nb(mut self, nb: usize) -> Self {
        self.nb = nb;
        self
    }

    /// Inner blocking size of the panel factorizations.
    pub fn ib(mut self, ib: usize) -> Self {
        self.ib = ib;
        self
    }

    /// Number of worker threads.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Panel concurrency for wavefront factorizations.
    pub fn panel_threads(mut self, panel_threads: usize) -> Self {
        self.panel_threads = panel_threads;
        self
    }
}

/// The runtime: a worker pool plus the tiling configuration.
///
/// Construct once, pass by reference into every call; dropping the
/// handle joins the workers. There is no process-global state.
pub struct Tessera {
    pub(crate) pool: Pool,
    nb: usize,
    ib: usize,
    panel_threads: usize,
}

impl Tessera {
    /// Validate `opts` and spawn the worker pool.
    pub fn new(opts: Options) -> Result<Self> {
        if opts.nb < 1 {
            return Err(Error::IllegalValue { arg: "nb" });
        }
        if opts.ib < 1 || opts.ib > opts.nb {
            return Err(Error::IllegalValue { arg: "ib" });
        }
        if opts.threads < 1 {
            return Err(Error::IllegalValue { arg: "threads" });
        }
        if opts.panel_threads < 1 || opts.panel_threads > opts.threads {
            return Err(Error::IllegalValue { arg: "panel_threads" });
        }
        let pool = Pool::new(opts.threads)?;
        debug!(nb = opts.nb, ib = opts.ib, threads = opts.threads, "runtime initialized");
        Ok(Tessera {
            pool,
            nb: opts.nb,
            ib: opts.ib,
            panel_threads: opts.panel_threads,
        })
    }

    /// Runtime with default options.
    pub fn with_defaults() -> Result<Self> {
        Self::new(Options::default())
    }

    /// Nominal tile size.
    pub fn nb(&self) -> usize {
        self.nb
    }

    /// Panel inner blocking size.
    pub fn ib(&self) -> usize {
        self.ib
    }

    /// Worker count.
    pub fn threads(&self) -> usize {
        self.pool.threads()
    }

    /// Configured panel concurrency.
    pub fn panel_threads(&self) -> usize {
        self.panel_threads
    }

    /// Open a parallel region for the `*_async` tile-descriptor entry
    /// points. The closure runs on the calling thread and submits
    /// tasks; the call returns after the whole DAG has drained.
    pub fn region<'env, F, R>(&self, f: F) -> R
    where
        F: for<'scope> FnOnce(&'scope tessera_runtime::Region<'scope, 'env>) -> R,
    {
        self.pool.region(f)
    }
}

/// Validate a column-major matrix argument: leading dimension and
/// buffer length. `aname`/`ldname` name the arguments in errors.
pub(crate) fn check_matrix<T: Scalar>(
    a: &[T],
    lda: usize,
    m: usize,
    n: usize,
    aname: &'static str,
    ldname: &'static str,
) -> Result<()> {
    if lda < m.max(1) {
        return Err(Error::IllegalValue { arg: ldname });
    }
    if n > 0 && a.len() < lda * (n - 1) + m {
        return Err(Error::IllegalValue { arg: aname });
    }
    Ok(())
}
