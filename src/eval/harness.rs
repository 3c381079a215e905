//! Trains on the training split and scores the held-out split.

use super::split::train_test_split;
use crate::config::{ClassifierConfig, EvaluationConfig};
use crate::error::{DetectorError, Result};
use crate::features::FeatureVector;
use crate::model::AnomalyClassifier;
use crate::parser::Label;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

const LABEL_ORDER: [Label; 2] = [Label::Anomalous, Label::Normal];

/// 2x2 counts; rows are the true label, columns the prediction,
/// both ordered [anomalous, normal].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub cells: [[usize; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_predictions(truth: &[Label], predicted: &[Label]) -> Result<Self> {
        if truth.len() != predicted.len() {
            return Err(DetectorError::LengthMismatch {
                vectors: predicted.len(),
                labels: truth.len(),
            });
        }
        let mut m = Self::default();
        for (t, p) in truth.iter().zip(predicted) {
            m.record(*t, *p);
        }
        Ok(m)
    }

    pub fn record(&mut self, truth: Label, predicted: Label) {
        self.cells[truth.index()][predicted.index()] += 1;
    }

    pub fn get(&self, truth: Label, predicted: Label) -> usize {
        self.cells[truth.index()][predicted.index()]
    }

    pub fn total(&self) -> usize {
        self.cells.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        LABEL_ORDER.iter().map(|l| self.get(*l, *l)).sum()
    }

    /// Fraction predicted correctly; 0 for an empty matrix.
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.correct() as f64 / total as f64,
        }
    }

    pub fn precision(&self, label: Label) -> f64 {
        let predicted: usize = LABEL_ORDER.iter().map(|t| self.get(*t, label)).sum();
        ratio(self.get(label, label), predicted)
    }

    pub fn recall(&self, label: Label) -> f64 {
        let actual: usize = LABEL_ORDER.iter().map(|p| self.get(label, *p)).sum();
        ratio(self.get(label, label), actual)
    }

    pub fn support(&self, label: Label) -> usize {
        self.cells[label.index()].iter().sum()
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl std::fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [[aa, an], [na, nn]] = self.cells;
        let width = [aa, an, na, nn]
            .iter()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1);
        writeln!(f, "[[{aa:>width$} {an:>width$}]")?;
        write!(f, " [{na:>width$} {nn:>width$}]]")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: Label,
    pub precision: f64,
    pub recall: f64,
    pub support: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub run_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub train_size: usize,
    pub test_size: usize,
    pub feature_dim: usize,
    pub accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub per_class: Vec<ClassMetrics>,
}

/// Report plus the classifier trained on the training split, ready for
/// classifying new samples in the same session.
pub struct Evaluation {
    pub report: EvaluationReport,
    pub classifier: AnomalyClassifier,
}

pub struct EvaluationHarness {
    evaluation: EvaluationConfig,
    classifier: ClassifierConfig,
}

impl EvaluationHarness {
    pub fn new(evaluation: EvaluationConfig, classifier: ClassifierConfig) -> Self {
        Self {
            evaluation,
            classifier,
        }
    }

    pub fn evaluate(&self, vectors: &[FeatureVector], labels: &[Label]) -> Result<Evaluation> {
        if vectors.len() != labels.len() {
            return Err(DetectorError::LengthMismatch {
                vectors: vectors.len(),
                labels: labels.len(),
            });
        }
        let split = train_test_split(labels, &self.evaluation)?;

        let pick = |idx: &[usize]| -> (Vec<FeatureVector>, Vec<Label>) {
            idx.iter().map(|&i| (vectors[i].clone(), labels[i])).unzip()
        };
        let (train_x, train_y) = pick(&split.train);
        let (test_x, test_y) = pick(&split.test);

        let mut classifier = AnomalyClassifier::new(self.classifier.clone());
        classifier.train(&train_x, &train_y)?;
        let predicted = classifier.predict(&test_x)?;

        let confusion = ConfusionMatrix::from_predictions(&test_y, &predicted)?;
        let per_class = LABEL_ORDER
            .iter()
            .map(|&label| ClassMetrics {
                label,
                precision: confusion.precision(label),
                recall: confusion.recall(label),
                support: confusion.support(label),
            })
            .collect();
        let report = EvaluationReport {
            run_id: Uuid::new_v4(),
            evaluated_at: Utc::now(),
            train_size: train_x.len(),
            test_size: test_x.len(),
            feature_dim: vectors.first().map(|v| v.dim).unwrap_or(0),
            accuracy: confusion.accuracy(),
            confusion,
            per_class,
        };
        info!(
            run_id = %report.run_id,
            train = report.train_size,
            test = report.test_size,
            accuracy = report.accuracy,
            "evaluation complete"
        );
        Ok(Evaluation { report, classifier })
    }
}
