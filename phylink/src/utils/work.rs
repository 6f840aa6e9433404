//! A single-slot deferred work item run on its own thread.
//!
//! Any number of `queue()` calls made while a run is pending collapse into
//! that one run. A `queue()` made while the function is running schedules
//! exactly one more run afterwards.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle, ThreadId};

use crate::{PhylinkError, PhylinkResult};

#[derive(Default)]
struct Slot {
    pending: bool,
    running: bool,
    cancelled: bool,
    runs: u64,
}

#[derive(Default)]
struct Shared {
    slot: Mutex<Slot>,
    cond: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, Slot>) -> MutexGuard<'a, Slot> {
        self.cond
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) struct Work {
    shared: Arc<Shared>,
    worker: spin::Mutex<Option<(JoinHandle<()>, ThreadId)>>,
}

impl Work {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            worker: spin::Mutex::new(None),
        }
    }

    /// Start the worker thread running `f` once per coalesced request.
    pub fn spawn<F>(&self, name: String, f: F) -> PhylinkResult
    where
        F: Fn() + Send + 'static,
    {
        let shared = self.shared.clone();
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || worker_loop(&shared, f))
            .map_err(|e| {
                warn!("failed to spawn worker thread: {}", e);
                PhylinkError::IoFailure
            })?;
        let id = handle.thread().id();
        *self.worker.lock() = Some((handle, id));
        Ok(())
    }

    /// Request a run. Never blocks on the running function.
    pub fn queue(&self) {
        let mut slot = self.shared.lock();
        if slot.cancelled {
            return;
        }
        slot.pending = true;
        self.shared.cond.notify_all();
    }

    /// Wait until no run is pending or in progress.
    ///
    /// Returns at once when called from the work function itself.
    pub fn flush(&self) {
        if self.on_worker() {
            return;
        }
        let mut slot = self.shared.lock();
        while (slot.pending || slot.running) && !slot.cancelled {
            slot = self.shared.wait(slot);
        }
    }

    /// Drop any pending run, stop the thread and join it.
    pub fn cancel(&self) {
        {
            let mut slot = self.shared.lock();
            slot.cancelled = true;
            slot.pending = false;
            self.shared.cond.notify_all();
        }
        let worker = self.worker.lock().take();
        if let Some((handle, id)) = worker {
            if id != thread::current().id() && handle.join().is_err() {
                warn!("worker thread panicked");
            }
        }
    }

    /// Completed runs so far.
    #[cfg(test)]
    pub fn runs(&self) -> u64 {
        self.shared.lock().runs
    }

    fn on_worker(&self) -> bool {
        match &*self.worker.lock() {
            Some((_, id)) => *id == thread::current().id(),
            None => false,
        }
    }
}

impl Default for Work {
    fn default() -> Self {
        Self::new()
    }
}

fn worker_loop<F: Fn()>(shared: &Shared, f: F) {
    let mut slot = shared.lock();
    loop {
        while !slot.pending && !slot.cancelled {
            slot = shared.wait(slot);
        }
        if slot.cancelled {
            break;
        }
        slot.pending = false;
        slot.running = true;
        drop(slot);

        f();

        slot = shared.lock();
        slot.running = false;
        slot.runs += 1;
        shared.cond.notify_all();
    }
    slot.running = false;
    shared.cond.notify_all();
}
