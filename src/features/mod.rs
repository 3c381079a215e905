//! Character n-gram TF-IDF features over canonical request strings.

mod ngram;
mod tfidf;

pub use ngram::char_ngrams;
pub use tfidf::{FeatureExtractor, Vocabulary};

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Gram length used when nothing else is configured.
pub const DEFAULT_NGRAM_LEN: usize = 5;

/// Sparse feature vector of fixed dimension (the fitted vocabulary size).
/// `indices` are strictly increasing and parallel to `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub dim: usize,
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl FeatureVector {
    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    pub fn get(&self, index: usize) -> f64 {
        self.indices
            .binary_search(&index)
            .map(|pos| self.values[pos])
            .unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn squared_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }

    pub fn norm(&self) -> f64 {
        self.squared_norm().sqrt()
    }

    /// Dot product with a dense weight vector of the same dimension.
    pub fn dot(&self, weights: &Array1<f64>) -> f64 {
        self.iter().map(|(i, v)| weights[i] * v).sum()
    }

    /// `weights += scale * self`
    pub fn scaled_add_to(&self, scale: f64, weights: &mut Array1<f64>) {
        for (i, v) in self.iter() {
            weights[i] += scale * v;
        }
    }

    pub fn to_dense(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.dim];
        for (i, v) in self.iter() {
            out[i] = v;
        }
        out
    }
}
