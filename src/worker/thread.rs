//! src/worker/thread.rs
//!
//! Thread-backed `WorkerHandle` adapter.
//!
//! A `ThreadWorker` wraps a runnable that executes on its own named thread
//! and reports back through a `ProgressPublisher`. The same adapter backs
//! both leaf prequential runs and composite per-fold sub-orchestrators; a
//! composite simply carries the probes of its descendants so the whole
//! worker tree stays introspectable from the top.

use anyhow::{anyhow, Context, Result};
use std::sync::{Arc, Mutex};
use std::thread;

use super::progress::{lock_ignoring_poison, ProgressPublisher, StatusCell, WorkerProbe};
use super::WorkerHandle;
use crate::preview::Preview;

type Runnable<P> = Box<dyn FnOnce(ProgressPublisher<P>) + Send + 'static>;

/// Marks the worker complete when the thread exits, whether the runnable
/// returned normally or unwound. A panicking worker therefore looks like one
/// that completed without further preview improvement, and the polling loop
/// never hangs on it.
struct CompleteOnExit(Arc<StatusCell>);

impl Drop for CompleteOnExit {
    fn drop(&mut self) {
        self.0.mark_complete();
    }
}

/// One runnable unit of work and its lifecycle/progress surface.
pub struct ThreadWorker<P> {
    name: String,
    runnable: Option<Runnable<P>>,
    status: Arc<StatusCell>,
    preview: Arc<Mutex<Option<P>>>,
    descendants: Vec<WorkerProbe>,
}

impl<P: Preview> ThreadWorker<P> {
    /// Wraps `runnable` for later execution on a dedicated thread named
    /// `name`. Nothing runs until `start` is called.
    pub fn new(
        name: impl Into<String>,
        runnable: impl FnOnce(ProgressPublisher<P>) + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            runnable: Some(Box::new(runnable)),
            status: Arc::new(StatusCell::new()),
            preview: Arc::new(Mutex::new(None)),
            descendants: Vec::new(),
        }
    }

    /// Attaches the probes of this worker's descendants, preserving their
    /// depth-first order. Used by composite workers so the orchestrator can
    /// flatten the whole worker tree.
    pub fn with_descendants(mut self, probes: Vec<WorkerProbe>) -> Self {
        self.descendants = probes;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Status-only view of this worker, usable after the worker itself has
    /// been moved elsewhere.
    pub fn probe(&self) -> WorkerProbe {
        WorkerProbe::new(self.status.clone())
    }

    pub fn descendant_probes(&self) -> &[WorkerProbe] {
        &self.descendants
    }
}

impl<P: Preview> WorkerHandle for ThreadWorker<P> {
    type Preview = P;

    /// Spawns the underlying thread. Errors if called a second time or if
    /// the thread cannot be spawned.
    ///
    /// The spawned thread is deliberately not joined on drop: cancellation
    /// is fire-and-forget, and workers are expected to observe their own
    /// shutdown signal.
    fn start(&mut self) -> Result<()> {
        let runnable = self
            .runnable
            .take()
            .ok_or_else(|| anyhow!("Worker '{}' was already started", self.name))?;

        let publisher = ProgressPublisher::new(self.status.clone(), self.preview.clone());
        let status = self.status.clone();

        thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                let _complete = CompleteOnExit(status);
                runnable(publisher);
            })
            .with_context(|| format!("Failed to spawn worker thread '{}'", self.name))?;

        Ok(())
    }

    fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    fn fraction_complete(&self) -> f64 {
        self.status.fraction()
    }

    fn latest_preview(&self) -> Option<P> {
        lock_ignoring_poison(&self.preview).clone()
    }
}
