//! Fixed work-stealing worker pool.
//!
//! One local deque per worker plus a global injector; idle workers steal
//! from the injector first and from siblings second, and park on a
//! condvar when nothing is queued. The task-producing master thread never
//! executes tasks itself; it submits into the injector and waits at the
//! region join.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_deque::{Injector, Stealer, Worker};
use parking_lot::{Condvar, Mutex};
use tessera_core::{Error, Result};
use tracing::debug;

use crate::dag::{Region, RegionCore, Runnable};

pub(crate) struct PoolShared {
    pub(crate) injector: Injector<Runnable>,
    pub(crate) stealers: Vec<Stealer<Runnable>>,
    sleep_lock: Mutex<()>,
    wake: Condvar,
    queued: AtomicUsize,
    shutdown: AtomicBool,
}

impl PoolShared {
    /// Queue a runnable on the global injector and wake a worker.
    pub(crate) fn enqueue_global(&self, r: Runnable) {
        self.injector.push(r);
        self.queued.fetch_add(1, Ordering::Release);
        let _guard = self.sleep_lock.lock();
        self.wake.notify_one();
    }

    /// Queue a runnable on a worker's own deque and wake a sibling that
    /// might steal it.
    pub(crate) fn enqueue_local(&self, r: Runnable, local: &Worker<Runnable>) {
        local.push(r);
        self.queued.fetch_add(1, Ordering::Release);
        let _guard = self.sleep_lock.lock();
        self.wake.notify_one();
    }
}

/// Fixed pool of worker threads with per-worker ids.
pub struct Pool {
    shared: Arc<PoolShared>,
    handles: Vec<JoinHandle<()>>,
    threads: usize,
}

impl Pool {
    /// Spawn `threads` workers. `threads` must be at least one.
    pub fn new(threads: usize) -> Result<Self> {
        if threads < 1 {
            return Err(Error::IllegalValue { arg: "threads" });
        }

        let locals: Vec<Worker<Runnable>> = (0..threads).map(|_| Worker::new_fifo()).collect();
        let stealers = locals.iter().map(|w| w.stealer()).collect();

        let shared = Arc::new(PoolShared {
            injector: Injector::new(),
            stealers,
            sleep_lock: Mutex::new(()),
            wake: Condvar::new(),
            queued: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
        });

        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(threads);
        for (id, local) in locals.into_iter().enumerate() {
            let worker_shared = Arc::clone(&shared);
            let spawned = std::thread::Builder::new()
                .name(format!("tessera-worker-{id}"))
                .spawn(move || worker_loop(worker_shared, local, id));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(_) => {
                    // release whatever already started before bailing out
                    shared.shutdown.store(true, Ordering::Release);
                    {
                        let _guard = shared.sleep_lock.lock();
                        shared.wake.notify_all();
                    }
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(Error::OutOfMemory);
                }
            }
        }

        debug!(threads, "worker pool started");
        Ok(Pool { shared, handles, threads })
    }

    /// Number of workers.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Open a parallel region, run the task-producing closure on the
    /// calling thread and wait for the whole DAG to drain before
    /// returning. The join is the single suspension point; submissions
    /// inside never block.
    ///
    /// Because the join happens before this call returns, task bodies may
    /// borrow from the caller's environment (`'env`).
    pub fn region<'env, F, R>(&self, f: F) -> R
    where
        F: for<'scope> FnOnce(&'scope Region<'scope, 'env>) -> R,
    {
        let core = Arc::new(RegionCore::new(Arc::clone(&self.shared)));

        // Join on the way out even if `f` unwinds, so no borrowed task
        // body can outlive 'env.
        struct Joiner<'a>(&'a Arc<RegionCore>);
        impl Drop for Joiner<'_> {
            fn drop(&mut self) {
                self.0.wait_drained();
            }
        }

        let region = Region::new(&core);
        let joiner = Joiner(&core);
        let out = f(&region);
        drop(joiner);
        core.propagate_panic();
        out
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        {
            let _guard = self.shared.sleep_lock.lock();
            self.shared.wake.notify_all();
        }
        for h in self.handles.drain(..) {
            let _ = h.join();
        }
        debug!("worker pool stopped");
    }
}

fn worker_loop(shared: Arc<PoolShared>, local: Worker<Runnable>, id: usize) {
    loop {
        if let Some(task) = find_task(&shared, &local, id) {
            shared.queued.fetch_sub(1, Ordering::AcqRel);
            task.run(id, &shared, &local);
            continue;
        }

        let mut guard = shared.sleep_lock.lock();
        if shared.shutdown.load(Ordering::Acquire) {
            return;
        }
        if shared.queued.load(Ordering::Acquire) == 0 {
            shared.wake.wait(&mut guard);
        }
    }
}

/// Pop local work, else steal: injector first, then siblings.
fn find_task(shared: &PoolShared, local: &Worker<Runnable>, id: usize) -> Option<Runnable> {
    local.pop().or_else(|| {
        std::iter::repeat_with(|| {
            shared
                .injector
                .steal_batch_and_pop(local)
                .or_else(|| {
                    shared
                        .stealers
                        .iter()
                        .enumerate()
                        .filter(|(other, _)| *other != id)
                        .map(|(_, s)| s.steal())
                        .collect()
                })
        })
        .find(|s| !s.is_retry())
        .and_then(|s| s.success())
    })
}
