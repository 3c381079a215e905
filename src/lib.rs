//! Request anomaly detector — learns to separate normal from anomalous HTTP
//! requests in labeled access logs.
//!
//! Modular structure:
//! - [`parser`] — Reconstructs whole requests (including POST/PUT bodies) from log lines
//! - [`features`] — Character n-gram TF-IDF vectors
//! - [`model`] — Hinge-loss linear SVM
//! - [`eval`] — Seeded hold-out evaluation, accuracy and confusion matrix
//! - [`pipeline`] — Session object tying the stages together, with JSON persistence
//! - [`dataset`] — Labeled corpora from log files
//! - [`logging`] — Structured logging

pub mod config;
pub mod dataset;
pub mod error;
pub mod eval;
pub mod features;
pub mod logging;
pub mod model;
pub mod parser;
pub mod pipeline;

pub use config::DetectorConfig;
pub use dataset::Corpus;
pub use error::{DetectorError, Result};
pub use eval::{ConfusionMatrix, EvaluationHarness, EvaluationReport};
pub use features::{FeatureExtractor, FeatureVector, Vocabulary};
pub use logging::StructuredLogger;
pub use model::{AnomalyClassifier, ClassifierModel};
pub use parser::{Label, Method, RequestLogParser, RequestRecord};
pub use pipeline::DetectionPipeline;
