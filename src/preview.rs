//! src/preview.rs
//!
//! Partial-result containers published by running workers.
//!
//! A `PreviewTree` is an indexed collection of partial results, one entry per
//! worker, that grows while the evaluation is still running. Trees nest: the
//! cross-validation root holds one `PreviewTree<LearningCurve>` per fold, and
//! each of those holds one `LearningCurve` per tuning-parameter value.
//!
//! # Snapshot semantics
//! The orchestrator's live tree is mutated by the polling thread alone.
//! Whenever it grows, a deep copy is handed to the observer, so observers
//! never see a half-written or later-mutated structure.

use std::collections::BTreeMap;

/// A partial result that a worker can publish while still running.
///
/// Successive previews from the same worker must be informationally
/// monotone: a later preview never carries less than an earlier one. That
/// invariant is what makes plain replacement a safe merge strategy.
pub trait Preview: Clone + Send + 'static {
    /// Whether this preview carries anything worth merging yet.
    fn has_content(&self) -> bool;
}

/// Ordered, indexed collection of partial results, nestable to any depth.
///
/// Entries are keyed by the worker's ordinal position among its siblings.
/// The tree itself enforces no ordering constraint on inserts; contiguous,
/// in-order population is the polling loop's responsibility.
#[derive(Debug, Clone)]
pub struct PreviewTree<T> {
    label: String,
    entries: BTreeMap<usize, T>,
}

impl<T: Clone> PreviewTree<T> {
    /// Creates an empty tree. `label` names what one entry represents
    /// (e.g. "fold", "parameter value").
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Inserts or replaces the entry at `index`.
    pub fn set_entry(&mut self, index: usize, value: T) {
        self.entries.insert(index, value);
    }

    pub fn entry(&self, index: usize) -> Option<&T> {
        self.entries.get(&index)
    }

    /// Iterates populated entries in ascending index order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &T)> {
        self.entries.iter().map(|(&index, value)| (index, value))
    }

    /// Number of currently populated indices.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Produces a fully independent deep snapshot.
    ///
    /// Safe to hand to another thread while this tree keeps being mutated,
    /// as long as `T`'s `Clone` is itself deep (true for `LearningCurve`
    /// and for nested trees).
    pub fn copy(&self) -> Self {
        self.clone()
    }
}

impl<T: Preview> Preview for PreviewTree<T> {
    fn has_content(&self) -> bool {
        !self.entries.is_empty()
    }
}

/// One sampled measurement on a learning curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    /// How many examples had been processed when this point was taken.
    pub instances_seen: u64,
    /// The evaluator's aggregate metric value at that moment.
    pub value: f64,
}

/// The terminal partial result: an incrementally growing metric curve for
/// one tuning-parameter value. Workers republish the whole (grown) curve on
/// every sampling boundary, so any snapshot is self-contained.
#[derive(Debug, Clone)]
pub struct LearningCurve {
    param_value: f64,
    points: Vec<CurvePoint>,
}

impl LearningCurve {
    pub fn new(param_value: f64) -> Self {
        Self {
            param_value,
            points: Vec::new(),
        }
    }

    /// The tuning-parameter value this curve was evaluated under.
    pub fn param_value(&self) -> f64 {
        self.param_value
    }

    pub fn push(&mut self, point: CurvePoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn last_point(&self) -> Option<CurvePoint> {
        self.points.last().copied()
    }
}

impl Preview for LearningCurve {
    fn has_content(&self) -> bool {
        !self.points.is_empty()
    }
}
