//! Cross-validation orchestration.
//!
//! This module owns the whole run: setup expands the configuration into one
//! composite worker per fold (`sweep`), the polling engine (`engine`) starts
//! them all and keeps merging their partial results into one live preview
//! tree, and the monitor surface (`monitor`) is how an observer watches
//! progress, receives snapshots, and requests cancellation.

pub mod engine;
pub mod monitor;
pub(crate) mod sweep;

pub use self::engine::run_polling_loop;
pub use self::monitor::{ChannelMonitor, NullMonitor, RunEvent, TaskMonitor};

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};

use crate::config::CrossValidationConfig;
use crate::prequential::{Learner, PerformanceEvaluator};
use crate::preview::{LearningCurve, PreviewTree};
use crate::source::{ExampleSource, KFoldSource};
use crate::worker::{ShutdownFlag, ThreadWorker, WorkerHandle, WorkerProbe};
use self::sweep::{build_fold_worker, FoldContext, SetupContext};

/// One fold's merged partial result: one learning curve per parameter value.
pub type FoldPreview = PreviewTree<LearningCurve>;

/// The full run's result: one `FoldPreview` per fold.
pub type CrossValidationResult = PreviewTree<FoldPreview>;

/// Evaluates a learner under K-fold cross-validation, running every fold
/// (and within each fold, every tuning-parameter value) on its own thread
/// while a single polling loop aggregates progress and partial results.
///
/// Setup is strictly sequential and completes for all folds before anything
/// runs, so total parallelism is known up front and configuration errors
/// can never surface mid-run.
pub struct CrossValidation {
    config: CrossValidationConfig,
    folds: Vec<ThreadWorker<FoldPreview>>,
    flattened: Vec<WorkerProbe>,
    shutdown: ShutdownFlag,
}

impl CrossValidation {
    /// Builds the whole worker tree for `config` over `source`.
    ///
    /// `learner_factory` and `evaluator_factory` are called once per
    /// (fold, parameter value) pair; each learner gets
    /// `config.param_name = value` applied immediately, so an unrecognized
    /// parameter name fails here, before any thread starts.
    pub fn new<T, S>(
        config: CrossValidationConfig,
        source: Arc<S>,
        mut learner_factory: impl FnMut() -> Box<dyn Learner<T>>,
        mut evaluator_factory: impl FnMut() -> Box<dyn PerformanceEvaluator<T>>,
    ) -> Result<Self>
    where
        T: Send + 'static,
        S: ExampleSource<T> + Send + Sync + 'static,
    {
        if config.num_folds == 0 {
            return Err(anyhow!(
                "num_folds must be at least 1. \
                A zero-fold run has no workers to average progress over."
            ));
        }
        if config.param_values.is_empty() {
            return Err(anyhow!(
                "param_values must contain at least one value. \
                Each fold runs one evaluation worker per parameter value."
            ));
        }
        if config.sample_frequency == 0 {
            return Err(anyhow!(
                "sample_frequency must be greater than 0. \
                It controls how many examples pass between curve points."
            ));
        }

        let num_folds = config.num_folds;
        let shutdown = ShutdownFlag::new();
        let mut setup = SetupContext::default();
        let mut folds = Vec::with_capacity(num_folds);
        let mut flattened = Vec::with_capacity(num_folds * (1 + config.param_values.len()));

        for fold_index in 0..num_folds {
            let fold_source = KFoldSource::new(source.clone(), fold_index, num_folds)
                .with_context(|| format!("Failed to build the data view for fold {fold_index}"))?;
            let ctx = FoldContext {
                fold_index,
                last_fold: fold_index + 1 == num_folds,
            };
            let worker = build_fold_worker(
                &config,
                ctx,
                fold_source,
                &mut learner_factory,
                &mut evaluator_factory,
                &mut setup,
                shutdown.clone(),
            )?;

            // Flattened order: each fold worker immediately followed by its
            // descendants, depth-first.
            flattened.push(worker.probe());
            flattened.extend(worker.descendant_probes().iter().cloned());
            folds.push(worker);
        }

        info!(
            folds = num_folds,
            workers = flattened.len(),
            "cross-validation setup complete"
        );

        Ok(Self {
            config,
            folds,
            flattened,
            shutdown,
        })
    }

    /// Total number of workers across the whole tree (folds plus all of
    /// their per-parameter descendants).
    pub fn worker_count(&self) -> usize {
        self.flattened.len()
    }

    /// Status probes for every worker, in flattened depth-first order.
    pub fn probes(&self) -> &[WorkerProbe] {
        &self.flattened
    }

    /// The cancellation flag shared with every worker. Raising it makes
    /// workers wind down even mid-run.
    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    pub fn config(&self) -> &CrossValidationConfig {
        &self.config
    }

    /// Starts every fold worker and polls until completion or abort.
    ///
    /// Returns the fully merged tree on completion, or `None` if the monitor
    /// requested an abort; in that case the shutdown flag is raised for the
    /// workers and the call returns without waiting for them.
    pub fn run<M>(mut self, monitor: &mut M) -> Result<Option<CrossValidationResult>>
    where
        M: TaskMonitor<FoldPreview> + ?Sized,
    {
        for fold in &mut self.folds {
            fold.start()?;
        }
        debug!(folds = self.folds.len(), "all fold workers started");

        let result = run_polling_loop(
            &self.folds,
            "fold",
            monitor,
            self.config.poll_interval,
            false,
        );
        if result.is_none() {
            // Fire-and-forget: workers observe the flag on their own
            // schedule; we do not wait for them.
            self.shutdown.request();
        }
        Ok(result)
    }
}
