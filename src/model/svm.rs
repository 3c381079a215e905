//! L2-regularized hinge-loss linear SVM, trained by dual coordinate descent.
//! The intercept is learned as the weight of a constant feature (value 1).
//! Normal maps to +1, anomalous to -1; a positive margin predicts normal.

use crate::config::ClassifierConfig;
use crate::error::{DetectorError, Result};
use crate::features::FeatureVector;
use crate::parser::Label;
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const BIAS_FEATURE: f64 = 1.0;
const MIN_STEP: f64 = 1e-12;

/// Trained decision boundary `w·x + b`. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierModel {
    pub weights: Array1<f64>,
    pub bias: f64,
    /// Solver epochs actually run
    pub iterations: usize,
    pub converged: bool,
}

impl ClassifierModel {
    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    /// Signed distance proxy; positive means normal.
    pub fn decision(&self, vector: &FeatureVector) -> Result<f64> {
        if vector.dim != self.dim() {
            return Err(DetectorError::DimensionMismatch {
                expected: self.dim(),
                found: vector.dim,
            });
        }
        Ok(vector.dot(&self.weights) + self.bias)
    }

    pub fn predict_one(&self, vector: &FeatureVector) -> Result<Label> {
        self.decision(vector).map(label_for_margin)
    }
}

/// Positive margins are normal; zero and below are anomalous.
pub fn label_for_margin(margin: f64) -> Label {
    if margin > 0.0 {
        Label::Normal
    } else {
        Label::Anomalous
    }
}

fn check_config(config: &ClassifierConfig) -> Result<()> {
    if !(config.c > 0.0 && config.c.is_finite()) {
        return Err(DetectorError::InvalidConfig(format!(
            "classifier.c must be positive and finite, got {}",
            config.c
        )));
    }
    if config.tolerance.is_nan() {
        return Err(DetectorError::InvalidConfig(
            "classifier.tolerance must be a number".into(),
        ));
    }
    Ok(())
}

fn target(label: Label) -> f64 {
    match label {
        Label::Normal => 1.0,
        Label::Anomalous => -1.0,
    }
}

pub struct AnomalyClassifier {
    config: ClassifierConfig,
    model: Option<ClassifierModel>,
}

impl AnomalyClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    pub fn from_model(config: ClassifierConfig, model: ClassifierModel) -> Self {
        Self {
            config,
            model: Some(model),
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn model(&self) -> Option<&ClassifierModel> {
        self.model.as_ref()
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Fit the boundary. Allowed once per classifier.
    pub fn train(&mut self, vectors: &[FeatureVector], labels: &[Label]) -> Result<&ClassifierModel> {
        if self.model.is_some() {
            return Err(DetectorError::AlreadyFitted("anomaly classifier"));
        }
        check_config(&self.config)?;
        if vectors.len() != labels.len() {
            return Err(DetectorError::LengthMismatch {
                vectors: vectors.len(),
                labels: labels.len(),
            });
        }
        let Some(first) = vectors.first() else {
            return Err(DetectorError::EmptyCorpus("train the classifier"));
        };
        let dim = first.dim;
        if let Some(v) = vectors.iter().find(|v| v.dim != dim) {
            return Err(DetectorError::DimensionMismatch {
                expected: dim,
                found: v.dim,
            });
        }
        if !labels.contains(&Label::Normal) {
            return Err(DetectorError::SingleClass(Label::Anomalous));
        }
        if !labels.contains(&Label::Anomalous) {
            return Err(DetectorError::SingleClass(Label::Normal));
        }

        let model = solve_dual(vectors, labels, dim, &self.config);
        if model.converged {
            info!(
                samples = vectors.len(),
                dim,
                iterations = model.iterations,
                "trained linear SVM"
            );
        } else {
            warn!(
                samples = vectors.len(),
                dim,
                max_iter = self.config.max_iter,
                "linear SVM did not converge; consider raising max_iter"
            );
        }
        Ok(&*self.model.insert(model))
    }

    pub fn decision_function(&self, vectors: &[FeatureVector]) -> Result<Vec<f64>> {
        let model = self
            .model
            .as_ref()
            .ok_or(DetectorError::UntrainedModel("anomaly classifier"))?;
        vectors.iter().map(|v| model.decision(v)).collect()
    }

    pub fn predict(&self, vectors: &[FeatureVector]) -> Result<Vec<Label>> {
        Ok(self
            .decision_function(vectors)?
            .into_iter()
            .map(label_for_margin)
            .collect())
    }
}

/// Dual coordinate descent for
/// `min_w 1/2 |w|^2 + C * sum_i max(0, 1 - y_i w·x_i)`.
/// Stops when the spread of projected gradients drops below `tolerance`.
fn solve_dual(
    vectors: &[FeatureVector],
    labels: &[Label],
    dim: usize,
    config: &ClassifierConfig,
) -> ClassifierModel {
    let c = config.c;
    let y: Vec<f64> = labels.iter().map(|l| target(*l)).collect();
    let q_diag: Vec<f64> = vectors
        .iter()
        .map(|v| v.squared_norm() + BIAS_FEATURE * BIAS_FEATURE)
        .collect();

    let mut weights = Array1::<f64>::zeros(dim);
    let mut bias_weight = 0.0;
    let mut alpha = vec![0.0; vectors.len()];
    let mut order: Vec<usize> = (0..vectors.len()).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut iterations = 0;
    let mut converged = false;
    while iterations < config.max_iter {
        iterations += 1;
        order.shuffle(&mut rng);

        let mut pg_max = f64::NEG_INFINITY;
        let mut pg_min = f64::INFINITY;
        for &i in &order {
            let x = &vectors[i];
            let g = y[i] * (x.dot(&weights) + bias_weight * BIAS_FEATURE) - 1.0;
            let pg = if alpha[i] <= 0.0 {
                g.min(0.0)
            } else if alpha[i] >= c {
                g.max(0.0)
            } else {
                g
            };
            pg_max = pg_max.max(pg);
            pg_min = pg_min.min(pg);

            if pg.abs() > MIN_STEP {
                let old = alpha[i];
                alpha[i] = (old - g / q_diag[i]).clamp(0.0, c);
                let step = (alpha[i] - old) * y[i];
                x.scaled_add_to(step, &mut weights);
                bias_weight += step * BIAS_FEATURE;
            }
        }

        if pg_max - pg_min <= config.tolerance {
            converged = true;
            break;
        }
    }

    ClassifierModel {
        weights,
        bias: bias_weight * BIAS_FEATURE,
        iterations,
        converged,
    }
}
