//! src/config.rs
//!
//! Configuration for a cross-validation run.
//!
//! `CrossValidationConfig` stores the parameters that shape the worker tree
//! and the evaluation loops.
//!
//! Example:
//! ```ignore
//! let config = CrossValidationConfig::builder()
//!     .num_folds(5)
//!     .param_name("budget")
//!     .param_values(vec![0.1, 0.5, 0.9])
//!     .instance_limit(50_000)
//!     .sample_frequency(500)
//!     .build();
//! ```
//!
//! Validation happens in `CrossValidation::new`, before any thread starts.

use std::time::Duration;

/// Configuration bundle consumed once at setup.
#[derive(Debug, Clone)]
pub struct CrossValidationConfig {
    /// Number of cross-validation folds (K). Must be >= 1.
    pub num_folds: usize,
    /// Name of the learner parameter swept within each fold.
    pub param_name: String,
    /// Values of that parameter; one evaluation worker per value per fold.
    pub param_values: Vec<f64>,
    /// Maximum examples each evaluation worker consumes (`None` = until its
    /// fold's stream ends).
    pub instance_limit: Option<u64>,
    /// Wall-clock budget per evaluation worker (`None` = unlimited).
    pub time_limit: Option<Duration>,
    /// Examples between learning-curve points / preview publications.
    pub sample_frequency: u64,
    /// Sleep between polling iterations. Keep it small; it bounds how fast
    /// completion and cancellation propagate.
    pub poll_interval: Duration,
}

impl Default for CrossValidationConfig {
    fn default() -> Self {
        Self {
            num_folds: 10,
            param_name: "budget".to_owned(),
            param_values: vec![0.5, 0.9],
            instance_limit: Some(100_000_000),
            time_limit: None,
            sample_frequency: 1000,
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl CrossValidationConfig {
    pub fn builder() -> CrossValidationConfigBuilder {
        CrossValidationConfigBuilder::default()
    }
}

/// Builder for `CrossValidationConfig` with method chaining.
#[derive(Debug, Default)]
pub struct CrossValidationConfigBuilder {
    config: CrossValidationConfig,
}

impl CrossValidationConfigBuilder {
    /// Set the number of folds (must be >= 1).
    pub fn num_folds(mut self, num_folds: usize) -> Self {
        self.config.num_folds = num_folds;
        self
    }

    /// Set the name of the swept learner parameter.
    pub fn param_name(mut self, name: impl Into<String>) -> Self {
        self.config.param_name = name.into();
        self
    }

    /// Set the swept parameter values (must be non-empty).
    pub fn param_values(mut self, values: Vec<f64>) -> Self {
        self.config.param_values = values;
        self
    }

    /// Set the per-worker example limit. Pass `None` to run each worker to
    /// the end of its fold's stream.
    pub fn instance_limit(mut self, limit: impl Into<Option<u64>>) -> Self {
        self.config.instance_limit = limit.into();
        self
    }

    /// Set the per-worker wall-clock budget.
    pub fn time_limit(mut self, limit: impl Into<Option<Duration>>) -> Self {
        self.config.time_limit = limit.into();
        self
    }

    /// Set how many examples pass between curve points (must be > 0).
    pub fn sample_frequency(mut self, frequency: u64) -> Self {
        self.config.sample_frequency = frequency;
        self
    }

    /// Set the polling loop's sleep interval.
    ///
    /// - Too low: more CPU spent polling.
    /// - Too high: slower progress, preview, and cancellation propagation.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> CrossValidationConfig {
        self.config
    }
}
