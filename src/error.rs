//! Error taxonomy shared by parser, features, model and evaluation.

use std::path::PathBuf;
use thiserror::Error;

use crate::parser::Label;

pub type Result<T> = std::result::Result<T, DetectorError>;

#[derive(Error, Debug)]
pub enum DetectorError {
    /// A POST/PUT request the parser cannot frame. `line` is 1-based.
    #[error("malformed request at line {line}: {reason}")]
    MalformedRequest { line: usize, reason: String },

    #[error("{0} used before it was fitted")]
    UntrainedModel(&'static str),

    #[error("{0} is already fitted")]
    AlreadyFitted(&'static str),

    #[error("empty corpus: nothing to {0}")]
    EmptyCorpus(&'static str),

    #[error("training data only contains {0:?} samples")]
    SingleClass(Label),

    #[error("got {vectors} vectors but {labels} labels")]
    LengthMismatch { vectors: usize, labels: usize },

    #[error("feature dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
