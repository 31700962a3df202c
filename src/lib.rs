//! Concurrent cross-validation evaluation engine for streaming learners.
//!
//! A dataset is split into K disjoint folds; each fold gets its own worker,
//! which in turn fans out into one prequential (test-then-train) evaluation
//! run per tuning-parameter value. All workers run on their own threads
//! while a single polling loop merges their partial results into one live
//! preview tree, reports an aggregate completion fraction, and honors
//! cooperative cancellation.
//!
//! Snapshots handed to the observer only ever improve: entries populate in
//! fold order as a contiguous prefix, the aggregate fraction never
//! decreases, and a snapshot is never mutated after publication.

pub mod config;
pub mod orchestrator;
pub mod prequential;
pub mod preview;
pub mod source;
pub mod worker;

pub use config::CrossValidationConfig;
pub use orchestrator::{CrossValidation, CrossValidationResult, FoldPreview};
pub use preview::{CurvePoint, LearningCurve, Preview, PreviewTree};
pub use worker::{ShutdownFlag, WorkerHandle};
