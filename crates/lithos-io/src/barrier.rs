//! Collective synchronization around persistence.
//!
//! Field and particle data may be partitioned across cooperating workers;
//! every checkpoint and restart step is bracketed by a rendezvous so that
//! no worker proceeds past a partial write or read.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};

/// Synchronization point shared by every worker of a run.
pub trait Rendezvous: Send {
    /// Blocks until every worker has arrived.
    fn wait(&self);

    /// Collective agreement: returns true only if every worker passed
    /// `ok = true`. Once any worker reports failure, all later calls
    /// return false.
    fn all_ok(&self, ok: bool) -> bool;

    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }
}

/// The trivial group of one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

impl Rendezvous for SingleProcess {
    fn wait(&self) {}

    fn all_ok(&self, ok: bool) -> bool {
        ok
    }
}

/// In-process group of `size` workers (one per thread).
#[derive(Debug, Clone)]
pub struct LocalGroup {
    barrier: Arc<Barrier>,
    failed: Arc<AtomicBool>,
    rank: usize,
    size: usize,
}

impl LocalGroup {
    /// One handle per worker, in rank order.
    pub fn new(size: usize) -> Vec<LocalGroup> {
        let size = size.max(1);
        let barrier = Arc::new(Barrier::new(size));
        let failed = Arc::new(AtomicBool::new(false));
        (0..size)
            .map(|rank| LocalGroup { barrier: Arc::clone(&barrier), failed: Arc::clone(&failed), rank, size })
            .collect()
    }
}

impl Rendezvous for LocalGroup {
    fn wait(&self) {
        self.barrier.wait();
    }

    fn all_ok(&self, ok: bool) -> bool {
        if !ok {
            self.failed.store(true, Ordering::SeqCst);
        }
        self.barrier.wait();
        let result = !self.failed.load(Ordering::SeqCst);
        // Second phase keeps a fast worker from racing into the next round.
        self.barrier.wait();
        result
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }
}
