//! Worker handles and their cross-thread progress plumbing.
//!
//! This module defines the contract the orchestrator polls against:
//! - `WorkerHandle`: lifecycle control plus non-blocking progress/preview reads
//! - `progress`: the safe-publication cells workers write through
//! - `thread`: the thread-backed adapter used for both leaf evaluation runs
//!   and composite per-fold sub-orchestrators
//!
//! The orchestrator side only ever reads; each worker publishes its own
//! completion flag and progress fraction through atomics and its latest
//! preview through a mutex-guarded snapshot slot.

pub mod progress;
pub mod thread;

pub use self::progress::{ProgressPublisher, WorkerProbe};
pub use self::thread::ThreadWorker;

use crate::preview::Preview;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Orchestrator-facing control object for one independently running unit of
/// evaluation work.
///
/// # Contract
/// - `start` is callable exactly once; a second call is an error.
/// - `is_complete` is non-blocking and never reverts to `false` once `true`.
/// - `fraction_complete` is a non-blocking, monotonically non-decreasing
///   snapshot in `[0, 1]`. It is not required to reach exactly `1.0` before
///   `is_complete` turns true.
/// - `latest_preview` is a non-blocking snapshot of the most recently
///   published partial result, or `None` if nothing was published yet. The
///   returned value is an owned, immutable snapshot.
///
/// A worker that fails internally simply completes without ever improving
/// its preview again; no error is surfaced through this interface.
pub trait WorkerHandle: Send {
    type Preview: Preview;

    fn start(&mut self) -> Result<()>;

    fn is_complete(&self) -> bool;

    fn fraction_complete(&self) -> f64;

    fn latest_preview(&self) -> Option<Self::Preview>;
}

impl<P: Preview> WorkerHandle for Box<dyn WorkerHandle<Preview = P>> {
    type Preview = P;

    fn start(&mut self) -> Result<()> {
        (**self).start()
    }

    fn is_complete(&self) -> bool {
        (**self).is_complete()
    }

    fn fraction_complete(&self) -> f64 {
        (**self).fraction_complete()
    }

    fn latest_preview(&self) -> Option<P> {
        (**self).latest_preview()
    }
}

/// Cooperative cancellation flag shared between the orchestrator and every
/// worker it created.
///
/// The orchestrator raises the flag when its observer requests an abort and
/// then returns without waiting; workers notice the flag on their own
/// schedule and wind down. The flag is never lowered.
#[derive(Clone, Debug, Default)]
pub struct ShutdownFlag {
    requested: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}
