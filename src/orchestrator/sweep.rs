//! src/orchestrator/sweep.rs
//!
//! Per-fold sub-orchestrator: expands one fold's configuration into one leaf
//! worker per tuning-parameter value and aggregates them with the same
//! polling engine the cross-validation root uses.
//!
//! The whole sweep presents itself to the root as a single `ThreadWorker`
//! whose preview is the merged per-parameter tree, so the root can treat a
//! fold exactly like any other worker.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error};

use super::engine::run_polling_loop;
use super::monitor::TaskMonitor;
use crate::config::CrossValidationConfig;
use crate::prequential::{self, Learner, PerformanceEvaluator, RunLimits};
use crate::preview::{LearningCurve, Preview, PreviewTree};
use crate::source::{ExampleSource, KFoldSource};
use crate::worker::{
    ProgressPublisher, ShutdownFlag, ThreadWorker, WorkerHandle, WorkerProbe,
};

/// Per-fold setup inputs. `last_fold` marks the final fold so collaborators
/// can do end-of-run bookkeeping (here: a closing log line).
pub(crate) struct FoldContext {
    pub(crate) fold_index: usize,
    pub(crate) last_fold: bool,
}

/// Tracks which tunable-parameter name has already been resolved against a
/// learner during this setup pass. Replaces the process-wide "last learner"
/// cache the interactive flow this was modeled on kept in a global; here it
/// is an explicit value owned by one setup call.
#[derive(Debug, Default)]
pub(crate) struct SetupContext {
    resolved_param: Option<String>,
}

impl SetupContext {
    /// Applies `name = value` to a freshly built learner, failing fast on an
    /// unrecognized parameter name before any worker thread starts.
    pub(crate) fn resolve_parameter<T>(
        &mut self,
        learner: &mut dyn Learner<T>,
        name: &str,
        value: f64,
    ) -> Result<()> {
        learner.set_parameter(name, value)?;
        if self.resolved_param.as_deref() != Some(name) {
            debug!(param = name, "tunable parameter resolved");
            self.resolved_param = Some(name.to_owned());
        }
        Ok(())
    }
}

/// Forwards the inner polling loop's output into the sweep's own progress
/// publisher, so the fold's aggregate fraction and merged tree become this
/// worker's fraction and preview.
struct PublisherMonitor<P: Preview> {
    publisher: ProgressPublisher<PreviewTree<P>>,
    shutdown: ShutdownFlag,
}

impl<P: Preview> TaskMonitor<P> for PublisherMonitor<P> {
    fn report_progress(&mut self, fraction: f64) {
        self.publisher.set_fraction(fraction);
    }

    fn should_abort(&self) -> bool {
        self.shutdown.is_requested()
    }

    fn preview_requested(&self) -> bool {
        true
    }

    fn publish_preview(&mut self, snapshot: PreviewTree<P>) {
        self.publisher.publish(snapshot);
    }
}

/// Builds the composite worker for one fold: one prequential leaf per value
/// in `config.param_values`, evaluated over `source`'s restricted view.
///
/// All configuration errors (unknown parameter name in particular) surface
/// here, strictly before any thread starts. The returned worker is inert
/// until the orchestrator launches the batch.
pub(crate) fn build_fold_worker<T, S>(
    config: &CrossValidationConfig,
    ctx: FoldContext,
    source: KFoldSource<S>,
    learner_factory: &mut dyn FnMut() -> Box<dyn Learner<T>>,
    evaluator_factory: &mut dyn FnMut() -> Box<dyn PerformanceEvaluator<T>>,
    setup: &mut SetupContext,
    shutdown: ShutdownFlag,
) -> Result<ThreadWorker<PreviewTree<LearningCurve>>>
where
    T: Send + 'static,
    S: ExampleSource<T> + Send + Sync + 'static,
{
    let source = Arc::new(source);
    let limits = RunLimits {
        instance_limit: config.instance_limit,
        time_limit: config.time_limit,
        sample_frequency: config.sample_frequency,
    };

    let mut leaves: Vec<ThreadWorker<LearningCurve>> =
        Vec::with_capacity(config.param_values.len());

    for (slot, &value) in config.param_values.iter().enumerate() {
        let mut learner = learner_factory();
        setup
            .resolve_parameter(learner.as_mut(), &config.param_name, value)
            .with_context(|| {
                format!(
                    "Failed to configure fold {} worker for {} = {}",
                    ctx.fold_index, config.param_name, value
                )
            })?;
        let evaluator = evaluator_factory();

        let name = format!("fold-{}-param-{}", ctx.fold_index, slot);
        let stream_source = source.clone();
        let leaf_limits = limits.clone();
        let leaf_shutdown = shutdown.clone();
        let thread_name = name.clone();

        leaves.push(ThreadWorker::new(name, move |publisher| {
            let stream = match stream_source.stream() {
                Ok(stream) => stream,
                Err(error) => {
                    // Surfaces only as completion without a preview.
                    error!(worker = %thread_name, %error, "failed to open fold stream");
                    return;
                }
            };
            prequential::prequential_loop(
                stream,
                learner,
                evaluator,
                &leaf_limits,
                value,
                &publisher,
                &leaf_shutdown,
            );
        }));
    }

    let probes: Vec<WorkerProbe> = leaves.iter().map(|leaf| leaf.probe()).collect();
    let poll_interval = config.poll_interval;
    let fold_index = ctx.fold_index;
    let last_fold = ctx.last_fold;

    let worker = ThreadWorker::new(format!("fold-{fold_index}"), move |publisher| {
        let mut leaves = leaves;
        for leaf in &mut leaves {
            if let Err(error) = leaf.start() {
                // The fold then completes with no preview, like any other
                // failed worker.
                error!(fold = fold_index, %error, "failed to start parameter worker");
                return;
            }
        }

        let mut monitor = PublisherMonitor {
            publisher: publisher.clone(),
            shutdown,
        };
        if let Some(tree) =
            run_polling_loop(&leaves, "parameter value", &mut monitor, poll_interval, true)
        {
            publisher.publish(tree);
            publisher.set_fraction(1.0);
            debug!(fold = fold_index, last_fold, "fold evaluation finished");
        }
    })
    .with_descendants(probes);

    Ok(worker)
}
