#![allow(dead_code)]

use anyhow::{anyhow, Result};
use crossval::orchestrator::TaskMonitor;
use crossval::prequential::{Learner, PerformanceEvaluator};
use crossval::preview::{CurvePoint, LearningCurve, Preview, PreviewTree};
use crossval::source::{ExampleSource, SyntheticExample};
use crossval::worker::WorkerHandle;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Builds a learning curve from (instances_seen, value) pairs.
pub fn curve(param_value: f64, points: &[(u64, f64)]) -> LearningCurve {
    let mut curve = LearningCurve::new(param_value);
    for &(instances_seen, value) in points {
        curve.push(CurvePoint {
            instances_seen,
            value,
        });
    }
    curve
}

/// One polling iteration's worth of scripted worker state.
#[derive(Clone)]
pub struct Step {
    pub fraction: f64,
    pub complete: bool,
    pub preview: Option<LearningCurve>,
}

impl Step {
    pub fn running(fraction: f64) -> Self {
        Self {
            fraction,
            complete: false,
            preview: None,
        }
    }

    pub fn running_with_preview(fraction: f64, preview: LearningCurve) -> Self {
        Self {
            fraction,
            complete: false,
            preview: Some(preview),
        }
    }

    pub fn done() -> Self {
        Self {
            fraction: 1.0,
            complete: true,
            preview: None,
        }
    }

    pub fn done_with_preview(preview: LearningCurve) -> Self {
        Self {
            fraction: 1.0,
            complete: true,
            preview: Some(preview),
        }
    }
}

/// Worker whose observable state advances one scripted step per polling
/// iteration (the engine reads `is_complete` first, which is where the
/// advance happens). After the script runs out, the last step holds, so a
/// well-formed script ends on a completed step.
pub struct ScriptedWorker {
    steps: RefCell<VecDeque<Step>>,
    current: RefCell<Step>,
    started: bool,
}

impl ScriptedWorker {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: RefCell::new(steps.into()),
            current: RefCell::new(Step::running(0.0)),
            started: false,
        }
    }
}

impl WorkerHandle for ScriptedWorker {
    type Preview = LearningCurve;

    fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(anyhow!("scripted worker was already started"));
        }
        self.started = true;
        Ok(())
    }

    fn is_complete(&self) -> bool {
        if let Some(next) = self.steps.borrow_mut().pop_front() {
            *self.current.borrow_mut() = next;
        }
        self.current.borrow().complete
    }

    fn fraction_complete(&self) -> f64 {
        self.current.borrow().fraction
    }

    fn latest_preview(&self) -> Option<LearningCurve> {
        self.current.borrow().preview.clone()
    }
}

/// Monitor that records everything it is told and can be scripted to abort
/// after a fixed number of progress reports.
pub struct RecordingMonitor<P: Preview> {
    pub progress: Vec<f64>,
    pub snapshots: Vec<PreviewTree<P>>,
    pub abort_after: Option<usize>,
    pub preview_requested: bool,
}

impl<P: Preview> RecordingMonitor<P> {
    pub fn new() -> Self {
        Self {
            progress: Vec::new(),
            snapshots: Vec::new(),
            abort_after: None,
            preview_requested: true,
        }
    }

    pub fn aborting_after(reports: usize) -> Self {
        Self {
            abort_after: Some(reports),
            ..Self::new()
        }
    }
}

impl<P: Preview> TaskMonitor<P> for RecordingMonitor<P> {
    fn report_progress(&mut self, fraction: f64) {
        self.progress.push(fraction);
    }

    fn should_abort(&self) -> bool {
        self.abort_after
            .is_some_and(|reports| self.progress.len() >= reports)
    }

    fn preview_requested(&self) -> bool {
        self.preview_requested
    }

    fn publish_preview(&mut self, snapshot: PreviewTree<P>) {
        self.snapshots.push(snapshot);
    }
}

/// Predicts from the same feature-sum rule the synthetic generator labels
/// with, so accuracy climbs quickly. Accepts exactly one tuning parameter,
/// "budget".
pub struct ThresholdLearner {
    pub budget: f64,
    pub trained: u64,
}

impl ThresholdLearner {
    pub fn new() -> Self {
        Self {
            budget: 0.0,
            trained: 0,
        }
    }
}

impl Learner<SyntheticExample> for ThresholdLearner {
    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        if name == "budget" {
            self.budget = value;
            Ok(())
        } else {
            Err(anyhow!("unknown parameter '{}'", name))
        }
    }

    fn predict(&self, example: &SyntheticExample) -> f64 {
        let threshold = example.features.len() as f64 * 0.5;
        if example.features.iter().sum::<f64>() > threshold {
            1.0
        } else {
            0.0
        }
    }

    fn train(&mut self, _example: &SyntheticExample) {
        self.trained += 1;
    }
}

/// `ThresholdLearner` with an artificial per-prediction delay, for
/// cancellation tests that need workers still mid-run.
pub struct SlowLearner {
    pub inner: ThresholdLearner,
    pub delay: Duration,
}

impl Learner<SyntheticExample> for SlowLearner {
    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        self.inner.set_parameter(name, value)
    }

    fn predict(&self, example: &SyntheticExample) -> f64 {
        std::thread::sleep(self.delay);
        self.inner.predict(example)
    }

    fn train(&mut self, example: &SyntheticExample) {
        self.inner.train(example);
    }
}

/// `ThresholdLearner` that counts train calls through a shared counter, so
/// limit tests can observe consumption from outside the worker thread.
pub struct CountingLearner {
    pub inner: ThresholdLearner,
    pub trained: Arc<AtomicU64>,
}

impl Learner<SyntheticExample> for CountingLearner {
    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        self.inner.set_parameter(name, value)
    }

    fn predict(&self, example: &SyntheticExample) -> f64 {
        self.inner.predict(example)
    }

    fn train(&mut self, example: &SyntheticExample) {
        self.trained.fetch_add(1, Ordering::SeqCst);
        self.inner.train(example);
    }
}

/// Running classification accuracy.
pub struct AccuracyEvaluator {
    correct: u64,
    total: u64,
}

impl AccuracyEvaluator {
    pub fn new() -> Self {
        Self {
            correct: 0,
            total: 0,
        }
    }
}

impl PerformanceEvaluator<SyntheticExample> for AccuracyEvaluator {
    fn record(&mut self, example: &SyntheticExample, prediction: f64) {
        self.total += 1;
        if (prediction - example.label).abs() < f64::EPSILON {
            self.correct += 1;
        }
    }

    fn value(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Source whose stream fails after `good` examples, for worker-failure
/// semantics tests.
pub struct FailingSource {
    pub good: usize,
}

impl ExampleSource<SyntheticExample> for FailingSource {
    fn stream(&self) -> Result<Box<dyn Iterator<Item = Result<SyntheticExample>> + Send>> {
        let good = self.good;
        Ok(Box::new((0..=good).map(move |position| {
            if position < good {
                Ok(SyntheticExample {
                    features: vec![position as f64],
                    label: 1.0,
                })
            } else {
                Err(anyhow!("synthetic read failure at position {}", position))
            }
        })))
    }
}

/// Source that cannot even open a stream.
pub struct BrokenSource;

impl ExampleSource<SyntheticExample> for BrokenSource {
    fn stream(&self) -> Result<Box<dyn Iterator<Item = Result<SyntheticExample>> + Send>> {
        Err(anyhow!("source is unavailable"))
    }
}

/// Polls `condition` until it holds or `timeout` elapses.
pub fn wait_until(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}
