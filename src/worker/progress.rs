//! src/worker/progress.rs
//!
//! Safe-publication cells between a worker thread and the polling thread.
//!
//! Each worker owns a `ProgressPublisher` and is the only writer; the
//! orchestrator reads through the owning `ThreadWorker` (or a `WorkerProbe`
//! for status-only introspection). Completion and the progress fraction go
//! through atomics; the latest preview goes through a mutex-guarded snapshot
//! slot that is swapped wholesale, never mutated in place.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::preview::Preview;

/// Lock-free completion flag and progress fraction for one worker.
///
/// The fraction is stored as `f64` bits and only ever moves forward, so a
/// racing stale write can never make observed progress regress.
#[derive(Debug)]
pub(crate) struct StatusCell {
    complete: AtomicBool,
    fraction_bits: AtomicU64,
}

impl StatusCell {
    pub(crate) fn new() -> Self {
        Self {
            complete: AtomicBool::new(false),
            fraction_bits: AtomicU64::new(0.0_f64.to_bits()),
        }
    }

    /// Stores a new fraction, keeping the published value monotone.
    /// Out-of-range and non-finite inputs are clamped or ignored.
    pub(crate) fn set_fraction(&self, fraction: f64) {
        if !fraction.is_finite() {
            return;
        }
        let clamped = fraction.clamp(0.0, 1.0);
        let mut current = self.fraction_bits.load(Ordering::Acquire);
        while f64::from_bits(current) < clamped {
            match self.fraction_bits.compare_exchange_weak(
                current,
                clamped.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    pub(crate) fn fraction(&self) -> f64 {
        f64::from_bits(self.fraction_bits.load(Ordering::Acquire))
    }

    /// One-way transition; there is no way to mark a worker incomplete again.
    pub(crate) fn mark_complete(&self) {
        self.complete.store(true, Ordering::Release);
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }
}

/// Recovers the guard from a mutex whose holder panicked. The slot only ever
/// holds a wholesale-replaced `Option<P>`, so the value is never torn.
pub(crate) fn lock_ignoring_poison<P>(slot: &Mutex<Option<P>>) -> MutexGuard<'_, Option<P>> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Worker-side handle for publishing progress and previews.
///
/// Cloneable so a runnable can hand it to helpers; all clones write to the
/// same cells.
pub struct ProgressPublisher<P> {
    status: Arc<StatusCell>,
    preview: Arc<Mutex<Option<P>>>,
}

impl<P> Clone for ProgressPublisher<P> {
    fn clone(&self) -> Self {
        Self {
            status: self.status.clone(),
            preview: self.preview.clone(),
        }
    }
}

impl<P: Preview> ProgressPublisher<P> {
    pub(crate) fn new(status: Arc<StatusCell>, preview: Arc<Mutex<Option<P>>>) -> Self {
        Self { status, preview }
    }

    /// Publishes a new progress fraction in `[0, 1]`. Stale or backwards
    /// values are ignored; observed progress never decreases.
    pub fn set_fraction(&self, fraction: f64) {
        self.status.set_fraction(fraction);
    }

    /// Publishes a new preview snapshot, replacing the previous one.
    ///
    /// Callers must only publish informationally monotone snapshots: each
    /// one must contain at least everything the previous one did.
    pub fn publish(&self, preview: P) {
        *lock_ignoring_poison(&self.preview) = Some(preview);
    }

    /// Marks the worker complete. Idempotent.
    pub fn mark_complete(&self) {
        self.status.mark_complete();
    }
}

/// Read-only, preview-agnostic view of one worker's status.
///
/// Probes make up the flattened introspection list: every worker in the whole
/// tree of folds and parameter runs contributes one, so callers can inspect
/// total parallelism and per-worker progress without touching previews.
#[derive(Clone, Debug)]
pub struct WorkerProbe {
    status: Arc<StatusCell>,
}

impl WorkerProbe {
    pub(crate) fn new(status: Arc<StatusCell>) -> Self {
        Self { status }
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    pub fn fraction_complete(&self) -> f64 {
        self.status.fraction()
    }
}
