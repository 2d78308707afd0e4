//! # Shared Submission State
//!
//! Mutable state shared by every worker of one `submit` call: the pending
//! queue, the shrinking chunk-size limit, the result and failure
//! accumulators, and the early-termination flag.
//!
//! Locking discipline: one mutex per structure, short critical sections, and
//! no lock ever held across the network await. The chunk limit has its own
//! lock, separate from the pending queue's, so the compare-and-shrink never
//! contends with chunk pops. Reads of the limit when sizing the next chunk
//! are optimistic; a stale larger value just costs one more oversized
//! round-trip, which self-corrects.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use crate::error::{ServiceError, TaskFailure};
use crate::models::{SubmittableTask, TaskAddResult};

/// One entry in the results accumulator.
///
/// Fatal service errors are captured as values during the parallel phase and
/// re-raised when the caller drains the results, so a worker never has to
/// propagate an error across the pool.
#[derive(Debug)]
pub(crate) enum SubmissionOutcome {
    /// A task reached a determinate successful verdict.
    Completed(TaskAddResult),
    /// An unexpected service error to re-raise verbatim at drain time.
    Fatal(ServiceError),
}

/// Shared state for one submission run.
///
/// Invariant: every input task lives in exactly one of {pending queue,
/// in-flight chunk, results, failures} at all times; requeues and splits move
/// tasks between those places atomically, so none is lost or duplicated.
pub(crate) struct SubmissionState<T: SubmittableTask> {
    /// Tasks awaiting submission. Workers pop chunks from the back; retried
    /// and split tasks go back on the front.
    pending: Mutex<VecDeque<T>>,
    /// Current per-request task ceiling. Monotonically non-increasing.
    chunk_limit: Mutex<usize>,
    /// Append-only during the parallel phase; drained once after all
    /// workers finish.
    results: Mutex<Vec<SubmissionOutcome>>,
    /// Terminal non-retryable per-task failures.
    failures: Mutex<Vec<TaskFailure<T>>>,
    /// Once set, workers stop pulling new chunks. Never cleared.
    halted: AtomicBool,
}

impl<T: SubmittableTask> SubmissionState<T> {
    pub(crate) fn new(tasks: Vec<T>, initial_chunk_limit: usize) -> Self {
        Self {
            pending: Mutex::new(tasks.into()),
            chunk_limit: Mutex::new(initial_chunk_limit.max(1)),
            results: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            halted: AtomicBool::new(false),
        }
    }

    /// Atomically pop up to `max` tasks from the back of the pending queue.
    pub(crate) fn pop_chunk(&self, max: usize) -> Vec<T> {
        let mut pending = self.pending.lock();
        let take = max.min(pending.len());
        let mut chunk = Vec::with_capacity(take);
        for _ in 0..take {
            if let Some(task) = pending.pop_back() {
                chunk.push(task);
            }
        }
        chunk
    }

    /// Atomically push tasks back onto the front of the pending queue for
    /// retry. The whole batch lands under one lock acquisition, so no worker
    /// can observe a half-requeued split.
    pub(crate) fn requeue_front(&self, tasks: Vec<T>) {
        let mut pending = self.pending.lock();
        for task in tasks.into_iter().rev() {
            pending.push_front(task);
        }
    }

    /// Snapshot of the current chunk-size limit.
    pub(crate) fn chunk_limit(&self) -> usize {
        *self.chunk_limit.lock()
    }

    /// Lower the shared chunk limit to `new_limit` if it is smaller than the
    /// current value. Concurrent shrinkers may race; only smaller values ever
    /// win, keeping the limit monotonically non-increasing.
    pub(crate) fn shrink_chunk_limit(&self, new_limit: usize) {
        let mut limit = self.chunk_limit.lock();
        if new_limit < *limit {
            debug!(
                old_limit = *limit,
                new_limit, "lowering per-request task ceiling"
            );
            *limit = new_limit;
        }
    }

    pub(crate) fn record_completed(&self, result: TaskAddResult) {
        self.results.lock().push(SubmissionOutcome::Completed(result));
    }

    pub(crate) fn record_fatal(&self, error: ServiceError) {
        self.results.lock().push(SubmissionOutcome::Fatal(error));
    }

    pub(crate) fn record_failure(&self, failure: TaskFailure<T>) {
        self.failures.lock().push(failure);
    }

    /// Stop all workers from pulling further chunks.
    pub(crate) fn halt(&self) {
        self.halted.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// Drain the results accumulator. Called once, after all workers join.
    pub(crate) fn take_outcomes(&self) -> Vec<SubmissionOutcome> {
        std::mem::take(&mut *self.results.lock())
    }

    /// Drain the failure list. Called once, after all workers join.
    pub(crate) fn take_failures(&self) -> Vec<TaskFailure<T>> {
        std::mem::take(&mut *self.failures.lock())
    }

    /// Drain whatever is still pending. Non-empty only after early
    /// termination.
    pub(crate) fn drain_pending(&self) -> Vec<T> {
        self.pending.lock().drain(..).collect()
    }
}
