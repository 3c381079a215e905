//! Detector configuration. Loaded from a JSON file; every section has defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{DetectorError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Input log files
    pub data: DataConfig,
    /// Request framing rules
    pub parser: ParserConfig,
    /// N-gram feature extraction
    pub features: FeaturesConfig,
    /// Linear SVM solver
    pub classifier: ClassifierConfig,
    /// Train/test split
    pub evaluation: EvaluationConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Files whose requests are all labeled normal
    pub normal_files: Vec<PathBuf>,
    /// Files whose requests are all labeled anomalous
    pub anomalous_files: Vec<PathBuf>,
    /// Unlabeled requests classified after training
    pub sample_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Distance from the `Content-Length:` header to the body line.
    pub body_line_offset: usize,
    /// Upper bound on lines scanned for `Content-Length:` after a POST/PUT line.
    pub max_header_lines: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Character n-gram length
    pub ngram_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Soft-margin penalty
    pub c: f64,
    /// Maximum passes over the training set
    pub max_iter: usize,
    /// Stop when the projected-gradient spread falls below this
    pub tolerance: f64,
    /// Seed for the per-epoch visiting order
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Fraction of samples held out for testing
    pub test_fraction: f64,
    pub seed: u64,
    /// Keep class proportions in both splits
    pub stratify: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            normal_files: vec![
                PathBuf::from("normalTrafficTraining.txt"),
                PathBuf::from("normalTrafficTest.txt"),
            ],
            anomalous_files: vec![PathBuf::from("anomalousTrafficTest.txt")],
            sample_file: None,
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            body_line_offset: crate::parser::BODY_LINE_OFFSET,
            max_header_lines: None,
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            ngram_len: crate::features::DEFAULT_NGRAM_LEN,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tolerance: 1e-4,
            seed: 0,
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.1,
            seed: 42,
            stratify: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl DetectorConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str::<DetectorConfig>(&data) {
                    Ok(c) => return c,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "invalid config; using defaults")
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "unreadable config; using defaults")
                }
            }
        }
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.parser.body_line_offset == 0 {
            return Err(DetectorError::InvalidConfig(
                "parser.body_line_offset must be at least 1".into(),
            ));
        }
        if self.features.ngram_len == 0 {
            return Err(DetectorError::InvalidConfig(
                "features.ngram_len must be at least 1".into(),
            ));
        }
        if self.classifier.c.is_nan() || self.classifier.c <= 0.0 {
            return Err(DetectorError::InvalidConfig(format!(
                "classifier.c must be positive, got {}",
                self.classifier.c
            )));
        }
        let f = self.evaluation.test_fraction;
        if f.is_nan() || f <= 0.0 || f >= 1.0 {
            return Err(DetectorError::InvalidConfig(format!(
                "evaluation.test_fraction must be in (0, 1), got {f}"
            )));
        }
        Ok(())
    }
}
