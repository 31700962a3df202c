//! src/source.rs
//!
//! Example sources and the fold-splitting view over them.
//!
//! An `ExampleSource` hands out fresh, independent streams over the same
//! underlying data, so every worker can read it concurrently without
//! coordination. `KFoldSource` restricts such a source to one fold's
//! partition; the partition depends only on (source, fold count, fold
//! index), never on timing.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of examples that can be streamed any number of times.
///
/// Every `stream` call must yield the same sequence; fold splitting and
/// reproducible runs both rely on it.
pub trait ExampleSource<T>: Send + Sync {
    fn stream(&self) -> Result<Box<dyn Iterator<Item = Result<T>> + Send>>;
}

impl<T, S: ExampleSource<T> + ?Sized> ExampleSource<T> for Arc<S> {
    fn stream(&self) -> Result<Box<dyn Iterator<Item = Result<T>> + Send>> {
        (**self).stream()
    }
}

/// Restricted view of a source: only the examples belonging to fold
/// `fold_index` of `num_folds`, assigned by stream position modulo the fold
/// count. The K views of one source are disjoint and together cover it.
pub struct KFoldSource<S> {
    inner: Arc<S>,
    fold_index: usize,
    num_folds: usize,
}

impl<S> KFoldSource<S> {
    pub fn new(inner: Arc<S>, fold_index: usize, num_folds: usize) -> Result<Self> {
        if num_folds == 0 {
            return Err(anyhow!("num_folds must be at least 1"));
        }
        if fold_index >= num_folds {
            return Err(anyhow!(
                "fold_index {} is out of range for {} folds",
                fold_index,
                num_folds
            ));
        }
        Ok(Self {
            inner,
            fold_index,
            num_folds,
        })
    }

    pub fn fold_index(&self) -> usize {
        self.fold_index
    }

    pub fn num_folds(&self) -> usize {
        self.num_folds
    }
}

impl<T: 'static, S: ExampleSource<T>> ExampleSource<T> for KFoldSource<S> {
    fn stream(&self) -> Result<Box<dyn Iterator<Item = Result<T>> + Send>> {
        let inner = self.inner.stream()?;
        let fold_index = self.fold_index;
        let num_folds = self.num_folds;
        Ok(Box::new(inner.enumerate().filter_map(
            move |(position, item)| (position % num_folds == fold_index).then_some(item),
        )))
    }
}

/// One generated example: a feature vector and a binary label derived from
/// it, so a simple model can actually learn the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticExample {
    pub features: Vec<f64>,
    pub label: f64,
}

/// Deterministic seeded example generator, for demos and tests. The same
/// (length, width, seed) always produces the same stream.
pub struct SyntheticSource {
    num_examples: usize,
    num_features: usize,
    seed: u64,
}

impl SyntheticSource {
    pub fn new(num_examples: usize, num_features: usize, seed: u64) -> Self {
        Self {
            num_examples,
            num_features,
            seed,
        }
    }

    pub fn len(&self) -> usize {
        self.num_examples
    }

    pub fn is_empty(&self) -> bool {
        self.num_examples == 0
    }
}

impl ExampleSource<SyntheticExample> for SyntheticSource {
    fn stream(&self) -> Result<Box<dyn Iterator<Item = Result<SyntheticExample>> + Send>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let num_features = self.num_features;
        // Features are uniform in [0, 1), so half the mass sits either side.
        let threshold = num_features as f64 * 0.5;
        Ok(Box::new((0..self.num_examples).map(move |_| {
            let features: Vec<f64> = (0..num_features).map(|_| rng.random::<f64>()).collect();
            let label = if features.iter().sum::<f64>() > threshold {
                1.0
            } else {
                0.0
            };
            Ok(SyntheticExample { features, label })
        })))
    }
}
