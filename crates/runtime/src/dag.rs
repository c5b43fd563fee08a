//! Dependency-ordered task regions.
//!
//! A region owns the DAG of one parallel section. Tasks declare the
//! memory regions they touch ([`Dep`]) and the tracker derives edges from
//! submission order: a task waits for the last writer of every region it
//! reads, and for the last writer plus all readers since of every region
//! it writes. Disjoint tasks are handed to the pool immediately and may
//! run in any order.
//!
//! Regions are matched by base address, like the OpenMP `depend` clauses
//! this model is lowered from; distinct regions must not overlap.
//!
//! Submission never blocks. The single suspension point is the implicit
//! join at the end of [`crate::Pool::region`].

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_deque::Worker;
use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tessera_core::{Access, Dep};

use crate::pool::PoolShared;

pub(crate) type TaskBody = Box<dyn FnOnce(usize) + Send + 'static>;

struct TaskSlot {
    body: Option<TaskBody>,
    pending: usize,
    successors: SmallVec<[usize; 4]>,
    done: bool,
}

#[derive(Default)]
struct RegionUse {
    last_writer: Option<usize>,
    readers: SmallVec<[usize; 4]>,
}

#[derive(Default)]
struct DagState {
    tasks: Vec<TaskSlot>,
    regions: FxHashMap<usize, RegionUse>,
}

/// Shared core of one parallel region.
pub(crate) struct RegionCore {
    state: Mutex<DagState>,
    unfinished: AtomicUsize,
    join_lock: Mutex<()>,
    join_cv: Condvar,
    panicked: AtomicBool,
    pool: Arc<PoolShared>,
}

impl RegionCore {
    pub(crate) fn new(pool: Arc<PoolShared>) -> Self {
        RegionCore {
            state: Mutex::new(DagState::default()),
            unfinished: AtomicUsize::new(0),
            join_lock: Mutex::new(()),
            join_cv: Condvar::new(),
            panicked: AtomicBool::new(false),
            pool,
        }
    }

    /// Insert a task, wire its dependency edges and queue it if it is
    /// already runnable.
    pub(crate) fn submit(this: &Arc<Self>, deps: &[Dep], body: TaskBody) {
        let ready = {
            let mut st = this.state.lock();
            let id = st.tasks.len();

            let mut preds: SmallVec<[usize; 8]> = SmallVec::new();
            for dep in deps {
                let entry = st.regions.entry(dep.addr).or_default();
                match dep.access {
                    Access::In => {
                        if let Some(w) = entry.last_writer {
                            preds.push(w);
                        }
                        entry.readers.push(id);
                    }
                    Access::Out | Access::InOut => {
                        if let Some(w) = entry.last_writer {
                            preds.push(w);
                        }
                        preds.extend(entry.readers.drain(..));
                        entry.last_writer = Some(id);
                    }
                }
            }
            preds.sort_unstable();
            preds.dedup();

            let mut pending = 0;
            for &p in &preds {
                if !st.tasks[p].done {
                    st.tasks[p].successors.push(id);
                    pending += 1;
                }
            }

            st.tasks.push(TaskSlot {
                body: Some(body),
                pending,
                successors: SmallVec::new(),
                done: false,
            });

            // count the task before it can possibly complete
            this.unfinished.fetch_add(1, Ordering::AcqRel);
            if pending == 0 {
                Some(Runnable { region: Arc::clone(this), task: id })
            } else {
                None
            }
        };

        if let Some(r) = ready {
            this.pool.enqueue_global(r);
        }
    }

    /// Mark a task finished, release its successors and signal the join
    /// if the region has drained.
    fn complete(
        this: &Arc<Self>,
        id: usize,
        shared: &PoolShared,
        local: Option<&Worker<Runnable>>,
    ) {
        let mut ready: SmallVec<[usize; 8]> = SmallVec::new();
        {
            let mut st = this.state.lock();
            st.tasks[id].done = true;
            let successors = std::mem::take(&mut st.tasks[id].successors);
            for s in successors {
                let slot = &mut st.tasks[s];
                slot.pending -= 1;
                if slot.pending == 0 {
                    ready.push(s);
                }
            }
        }

        for s in ready {
            let r = Runnable { region: Arc::clone(this), task: s };
            match local {
                Some(l) => shared.enqueue_local(r, l),
                None => shared.enqueue_global(r),
            }
        }

        if this.unfinished.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _guard = this.join_lock.lock();
            this.join_cv.notify_all();
        }
    }

    /// Block until every submitted task has finished.
    pub(crate) fn wait_drained(&self) {
        let mut guard = self.join_lock.lock();
        while self.unfinished.load(Ordering::Acquire) > 0 {
            self.join_cv.wait(&mut guard);
        }
    }

    /// Re-raise a worker-side panic on the master thread.
    pub(crate) fn propagate_panic(&self) {
        if self.panicked.load(Ordering::Acquire) {
            panic!("task panicked inside parallel region");
        }
    }
}

/// One queued task instance.
pub(crate) struct Runnable {
    region: Arc<RegionCore>,
    task: usize,
}

impl Runnable {
    pub(crate) fn run(self, wid: usize, shared: &PoolShared, local: &Worker<Runnable>) {
        let body = self.region.state.lock().tasks[self.task].body.take();
        if let Some(body) = body {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| body(wid)));
            if outcome.is_err() {
                self.region.panicked.store(true, Ordering::Release);
            }
        }
        RegionCore::complete(&self.region, self.task, shared, Some(local));
    }
}

/// Handle used by the task-producing closure to submit work.
///
/// `'env` is the lifetime of the environment task bodies may borrow; the
/// region is joined before `'env` can end, which is what makes borrowed
/// submissions sound.
pub struct Region<'scope, 'env> {
    core: &'scope Arc<RegionCore>,
    env: PhantomData<&'env mut &'env ()>,
}

impl<'scope, 'env> Region<'scope, 'env> {
    pub(crate) fn new(core: &'scope Arc<RegionCore>) -> Self {
        Region { core, env: PhantomData }
    }

    /// Enqueue a task with its declared dependencies. Never blocks.
    ///
    /// The body receives the id of the worker executing it, which indexes
    /// per-worker workspace buffers.
    pub fn submit<F>(&self, deps: &[Dep], body: F)
    where
        F: FnOnce(usize) + Send + 'env,
    {
        let boxed: Box<dyn FnOnce(usize) + Send + 'env> = Box::new(body);
        // Safety: the region joins before 'env ends (enforced by
        // Pool::region), so the erased body cannot outlive its borrows.
        let boxed: TaskBody = unsafe { std::mem::transmute(boxed) };
        RegionCore::submit(self.core, deps, boxed);
    }
}

#[cfg(test)]
mod tests {
    use crate::pool::Pool;
    use crate::shared::SharedSlice;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tessera_core::Dep;

    /// Unsynchronized increments stay correct only if write-write
    /// dependencies on one region serialize in program order.
    #[test]
    fn writers_on_one_region_serialize()  {
        let pool = Pool::new(4).unwrap();
        let mut value = 0usize;
        {
            let cell = SharedSlice::from_mut(std::slice::from_mut(&mut value));
            pool.region(|reg| {
                for _ in 0..200 {
                    reg.submit(&[Dep::inout(cell.addr_of(0), 8)], move |_| unsafe {
                        cell.slice_mut()[0] += 1;
                    });
                }
            });
        }
        assert_eq!(value, 200);
    }

    /// A writer waits for every earlier reader of its region.
    #[test]
    fn writer_waits_for_readers() {
        let pool = Pool::new(4).unwrap();
        let data = 7usize;
        let reads_done = AtomicUsize::new(0);
        let observed = AtomicUsize::new(usize::MAX);
        let region_key = &data as *const usize as usize;

        pool.region(|reg| {
            for _ in 0..8 {
                let reads_done = &reads_done;
                reg.submit(&[Dep::input(region_key, 8)], move |_| {
                    std::thread::sleep(std::time::Duration::from_millis(2));
                    reads_done.fetch_add(1, Ordering::SeqCst);
                });
            }
            let reads_done = &reads_done;
            let observed = &observed;
            reg.submit(&[Dep::output(region_key, 8)], move |_| {
                observed.store(reads_done.load(Ordering::SeqCst), Ordering::SeqCst);
            });
        });

        assert_eq!(observed.load(Ordering::SeqCst), 8);
    }

    /// No two tasks with a non-`In` access to the same region overlap in
    /// time (the instrumented-kernel scheduler safety check).
    #[test]
    fn conflicting_tasks_never_overlap() {
        let pool = Pool::new(4).unwrap();
        let active = AtomicUsize::new(0);
        let violations = AtomicUsize::new(0);
        let key = 0xD00Dusize;

        pool.region(|reg| {
            for i in 0..50 {
                let active = &active;
                let violations = &violations;
                let dep = if i % 3 == 0 {
                    Dep::inout(key, 64)
                } else {
                    Dep::output(key, 64)
                };
                reg.submit(&[dep], move |_| {
                    if active.fetch_add(1, Ordering::SeqCst) != 0 {
                        violations.fetch_add(1, Ordering::SeqCst);
                    }
                    std::thread::sleep(std::time::Duration::from_micros(200));
                    active.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        assert_eq!(violations.load(Ordering::SeqCst), 0);
    }

    /// Tasks on disjoint regions do run in parallel.
    #[test]
    fn disjoint_tasks_overlap() {
        let pool = Pool::new(4).unwrap();
        let concurrent_peak = AtomicUsize::new(0);
        let active = AtomicUsize::new(0);

        pool.region(|reg| {
            for i in 0..16 {
                let active = &active;
                let concurrent_peak = &concurrent_peak;
                reg.submit(&[Dep::inout(0x1000 + i * 64, 64)], move |_| {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    concurrent_peak.fetch_max(now, Ordering::SeqCst);
                    std::thread::sleep(std::time::Duration::from_millis(5));
                    active.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        assert!(concurrent_peak.load(Ordering::SeqCst) > 1);
    }

    /// Diamond: one producer, parallel readers, one consumer.
    #[test]
    fn diamond_ordering() {
        let pool = Pool::new(4).unwrap();
        let mut log = vec![0u8; 4];
        let a_key = 0xA000usize;
        {
            let log = SharedSlice::from_mut(&mut log);
            pool.region(|reg| {
                reg.submit(&[Dep::output(a_key, 8)], move |_| unsafe {
                    log.write(0, 1);
                });
                for i in 1..3 {
                    reg.submit(&[Dep::input(a_key, 8)], move |_| unsafe {
                        // both readers must observe the producer's write
                        log.write(i, log.read(0) + 1);
                    });
                }
                reg.submit(&[Dep::inout(a_key, 8)], move |_| unsafe {
                    log.write(3, log.read(1) + log.read(2));
                });
            });
        }
        assert_eq!(log, vec![1, 2, 2, 4]);
    }
}
