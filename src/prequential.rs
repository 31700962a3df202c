//! src/prequential.rs
//!
//! Prequential (test-then-train) evaluation of a streaming learner.
//!
//! Each example is first used to test the learner, then to train it, so the
//! learning curve reflects performance on data the learner had not seen
//! yet. One `prequential_loop` call is the body of one leaf worker: one
//! fold, one tuning-parameter value.
//!
//! The learner and the metric are deliberately behind traits; this crate
//! ships no concrete model or evaluator.

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{trace, warn};

use crate::preview::{CurvePoint, LearningCurve};
use crate::worker::{ProgressPublisher, ShutdownFlag};

/// A trainable streaming model with one numeric tunable parameter surface.
pub trait Learner<T>: Send {
    /// Applies a named tuning parameter. Unrecognized names must error;
    /// setup relies on that to fail fast before any worker starts.
    fn set_parameter(&mut self, name: &str, value: f64) -> Result<()>;

    /// Predicts a label for `example` without learning from it.
    fn predict(&self, example: &T) -> f64;

    /// Learns from `example`.
    fn train(&mut self, example: &T);
}

/// Accumulates a performance metric over (example, prediction) pairs.
pub trait PerformanceEvaluator<T>: Send {
    fn record(&mut self, example: &T, prediction: f64);

    /// The current aggregate metric value, sampled onto the learning curve.
    fn value(&self) -> f64;
}

/// Bounds on one evaluation run.
#[derive(Debug, Clone)]
pub struct RunLimits {
    /// Maximum number of examples to test/train on; `None` = until the
    /// stream ends.
    pub instance_limit: Option<u64>,
    /// Wall-clock budget for this run; checked at sampling boundaries.
    pub time_limit: Option<Duration>,
    /// Examples between curve points / preview publications. Must be > 0.
    pub sample_frequency: u64,
}

/// Runs the test-then-train loop over `stream`, publishing the growing
/// learning curve through `publisher` every `sample_frequency` examples.
///
/// Termination: stream end, instance limit, time limit, shutdown request,
/// or a stream error. A stream error is logged and otherwise indistinct
/// from early completion; the worker contract carries no error channel.
/// The final progress fraction is forced to 1.0 on the way out.
pub fn prequential_loop<T>(
    stream: Box<dyn Iterator<Item = Result<T>> + Send>,
    mut learner: Box<dyn Learner<T>>,
    mut evaluator: Box<dyn PerformanceEvaluator<T>>,
    limits: &RunLimits,
    param_value: f64,
    publisher: &ProgressPublisher<LearningCurve>,
    shutdown: &ShutdownFlag,
) {
    let mut curve = LearningCurve::new(param_value);
    let started = Instant::now();
    let mut seen: u64 = 0;

    for item in stream {
        if shutdown.is_requested() {
            trace!(seen, "shutdown requested, stopping evaluation");
            return;
        }
        // Checked before the example is touched, so a limit of N tests and
        // trains on exactly N examples (and a limit of 0 on none).
        if limits.instance_limit.is_some_and(|limit| seen >= limit) {
            break;
        }
        let example = match item {
            Ok(example) => example,
            Err(error) => {
                warn!(%error, seen, "stream error ended evaluation early");
                break;
            }
        };

        let prediction = learner.predict(&example);
        evaluator.record(&example, prediction);
        learner.train(&example);
        seen += 1;

        if seen % limits.sample_frequency == 0 {
            curve.push(CurvePoint {
                instances_seen: seen,
                value: evaluator.value(),
            });
            publisher.publish(curve.clone());
            if let Some(limit) = limits.instance_limit {
                publisher.set_fraction(seen as f64 / limit as f64);
            }
            if let Some(time_limit) = limits.time_limit {
                if started.elapsed() >= time_limit {
                    trace!(seen, "time limit reached");
                    break;
                }
            }
        }
    }

    // Close the curve on an unaligned ending so the last examples count.
    if seen > 0 && seen % limits.sample_frequency != 0 {
        curve.push(CurvePoint {
            instances_seen: seen,
            value: evaluator.value(),
        });
        publisher.publish(curve);
    }
    publisher.set_fraction(1.0);
}
