//! Session object: parser → feature extractor → classifier, fitted in a fixed order.
//! Fit the vocabulary on the whole labeled corpus first, then train (directly or
//! through evaluation), then classify. A trained pipeline can be saved as JSON and
//! loaded for inference-only runs.

use crate::config::{ClassifierConfig, DetectorConfig, EvaluationConfig, ParserConfig};
use crate::dataset::Corpus;
use crate::error::{DetectorError, Result};
use crate::eval::{EvaluationHarness, EvaluationReport};
use crate::features::{FeatureExtractor, FeatureVector, Vocabulary};
use crate::model::{label_for_margin, AnomalyClassifier, ClassifierModel};
use crate::parser::{Label, Method, RequestLogParser, RequestRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const ARTIFACT_VERSION: u32 = 1;

/// Per-request outcome of [`DetectionPipeline::classify_records`]
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub method: Method,
    pub label: Label,
    pub margin: f64,
}

/// On-disk form of a trained pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub parser: ParserConfig,
    pub classifier: ClassifierConfig,
    pub vocabulary: Vocabulary,
    pub model: ClassifierModel,
}

pub struct DetectionPipeline {
    parser_config: ParserConfig,
    parser: RequestLogParser,
    extractor: FeatureExtractor,
    classifier: AnomalyClassifier,
    evaluation: EvaluationConfig,
}

impl DetectionPipeline {
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            parser_config: config.parser.clone(),
            parser: RequestLogParser::new(&config.parser)?,
            extractor: FeatureExtractor::new(&config.features),
            classifier: AnomalyClassifier::new(config.classifier.clone()),
            evaluation: config.evaluation.clone(),
        })
    }

    pub fn parser(&self) -> &RequestLogParser {
        &self.parser
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn classifier(&self) -> &AnomalyClassifier {
        &self.classifier
    }

    /// Fit the vocabulary on every record of `corpus` and vectorize them all.
    pub fn fit_features(&mut self, corpus: &Corpus) -> Result<Vec<FeatureVector>> {
        self.extractor.fit_transform(&corpus.canonical_forms())
    }

    pub fn train(&mut self, vectors: &[FeatureVector], labels: &[Label]) -> Result<&ClassifierModel> {
        if !self.extractor.is_fitted() {
            return Err(DetectorError::UntrainedModel("feature extractor"));
        }
        self.classifier.train(vectors, labels)
    }

    /// Fit features on the whole corpus, then train on everything.
    pub fn fit(&mut self, corpus: &Corpus) -> Result<&ClassifierModel> {
        let vectors = self.fit_features(corpus)?;
        self.classifier.train(&vectors, corpus.labels())
    }

    /// Fit features on the whole corpus, hold out a split, train on the rest
    /// and score the held-out part. The split-trained classifier is kept.
    pub fn evaluate(&mut self, corpus: &Corpus) -> Result<EvaluationReport> {
        if self.classifier.is_trained() {
            return Err(DetectorError::AlreadyFitted("anomaly classifier"));
        }
        let vectors = self.fit_features(corpus)?;
        let harness = EvaluationHarness::new(self.evaluation.clone(), self.classifier.config().clone());
        let evaluation = harness.evaluate(&vectors, corpus.labels())?;
        self.classifier = evaluation.classifier;
        Ok(evaluation.report)
    }

    pub fn classify_records(&self, records: &[RequestRecord]) -> Result<Vec<Classification>> {
        let texts: Vec<&str> = records.iter().map(|r| r.canonical_form.as_str()).collect();
        let vectors = self.extractor.transform(&texts)?;
        let margins = self.classifier.decision_function(&vectors)?;
        Ok(records
            .iter()
            .zip(margins)
            .map(|(r, margin)| Classification {
                method: r.method,
                label: label_for_margin(margin),
                margin,
            })
            .collect())
    }

    /// Parse raw log lines and classify each request, in input order.
    pub fn classify_lines<S: AsRef<str>>(&self, lines: &[S]) -> Result<Vec<Classification>> {
        let records = self.parser.parse(lines)?;
        self.classify_records(&records)
    }

    pub fn predict(&self, records: &[RequestRecord]) -> Result<Vec<Label>> {
        Ok(self
            .classify_records(records)?
            .into_iter()
            .map(|c| c.label)
            .collect())
    }

    pub fn to_artifact(&self) -> Result<PipelineArtifact> {
        let vocabulary = self
            .extractor
            .vocabulary()
            .ok_or(DetectorError::UntrainedModel("feature extractor"))?;
        let model = self
            .classifier
            .model()
            .ok_or(DetectorError::UntrainedModel("anomaly classifier"))?;
        Ok(PipelineArtifact {
            version: ARTIFACT_VERSION,
            saved_at: Utc::now(),
            parser: self.parser_config.clone(),
            classifier: self.classifier.config().clone(),
            vocabulary: vocabulary.clone(),
            model: model.clone(),
        })
    }

    pub fn from_artifact(artifact: PipelineArtifact) -> Result<Self> {
        if artifact.version != ARTIFACT_VERSION {
            return Err(DetectorError::InvalidConfig(format!(
                "unsupported artifact version {} (expected {ARTIFACT_VERSION})",
                artifact.version
            )));
        }
        if artifact.vocabulary.len() != artifact.model.dim() {
            return Err(DetectorError::DimensionMismatch {
                expected: artifact.vocabulary.len(),
                found: artifact.model.dim(),
            });
        }
        Ok(Self {
            parser: RequestLogParser::new(&artifact.parser)?,
            parser_config: artifact.parser,
            extractor: FeatureExtractor::from_vocabulary(artifact.vocabulary),
            classifier: AnomalyClassifier::from_model(artifact.classifier, artifact.model),
            evaluation: EvaluationConfig::default(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let artifact = self.to_artifact()?;
        let data = serde_json::to_string(&artifact)?;
        std::fs::write(path, data).map_err(|source| DetectorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), dim = artifact.model.dim(), "saved pipeline");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| DetectorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: PipelineArtifact = serde_json::from_str(&data)?;
        info!(path = %path.display(), saved_at = %artifact.saved_at, "loaded pipeline");
        Self::from_artifact(artifact)
    }
}
