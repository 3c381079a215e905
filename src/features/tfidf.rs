//! Vocabulary fitting and TF-IDF vectorization: grams → counts → idf weights → L2 norm.

use super::{char_ngrams, FeatureVector};
use crate::config::FeaturesConfig;
use crate::error::{DetectorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, warn};

/// Fitted gram index plus smoothed inverse document frequencies.
/// Indices follow sorted gram order, so fitting the same corpus always
/// yields the same feature layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "VocabularyRepr", into = "VocabularyRepr")]
pub struct Vocabulary {
    ngram_len: usize,
    documents: usize,
    terms: Vec<String>,
    idf: Vec<f64>,
    index: HashMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
struct VocabularyRepr {
    ngram_len: usize,
    documents: usize,
    terms: Vec<String>,
    idf: Vec<f64>,
}

impl TryFrom<VocabularyRepr> for Vocabulary {
    type Error = String;

    fn try_from(repr: VocabularyRepr) -> std::result::Result<Self, Self::Error> {
        if repr.terms.len() != repr.idf.len() {
            return Err(format!(
                "vocabulary has {} terms but {} idf weights",
                repr.terms.len(),
                repr.idf.len()
            ));
        }
        let index: HashMap<String, usize> = repr
            .terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        if index.len() != repr.terms.len() {
            return Err("vocabulary contains duplicate terms".to_string());
        }
        Ok(Self {
            ngram_len: repr.ngram_len,
            documents: repr.documents,
            terms: repr.terms,
            idf: repr.idf,
            index,
        })
    }
}

impl From<Vocabulary> for VocabularyRepr {
    fn from(v: Vocabulary) -> Self {
        Self {
            ngram_len: v.ngram_len,
            documents: v.documents,
            terms: v.terms,
            idf: v.idf,
        }
    }
}

impl Vocabulary {
    /// One aggregation pass: document frequency per gram, then
    /// `idf = ln((1 + n) / (1 + df)) + 1`.
    pub fn fit<S: AsRef<str>>(corpus: &[S], ngram_len: usize) -> Result<Self> {
        if corpus.is_empty() {
            return Err(DetectorError::EmptyCorpus("fit the feature vocabulary"));
        }

        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in corpus {
            let grams: HashSet<&str> = char_ngrams(doc.as_ref(), ngram_len).collect();
            for gram in grams {
                *document_frequency.entry(gram).or_insert(0) += 1;
            }
        }

        let n = corpus.len() as f64;
        let mut terms = Vec::with_capacity(document_frequency.len());
        let mut idf = Vec::with_capacity(document_frequency.len());
        let mut index = HashMap::with_capacity(document_frequency.len());
        for (i, (gram, df)) in document_frequency.into_iter().enumerate() {
            terms.push(gram.to_string());
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
            index.insert(gram.to_string(), i);
        }

        Ok(Self {
            ngram_len,
            documents: corpus.len(),
            terms,
            idf,
            index,
        })
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn ngram_len(&self) -> usize {
        self.ngram_len
    }

    /// Number of documents the vocabulary was fitted on
    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn index_of(&self, gram: &str) -> Option<usize> {
        self.index.get(gram).copied()
    }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    pub fn idf(&self, gram: &str) -> Option<f64> {
        self.index_of(gram).map(|i| self.idf[i])
    }

    /// Count known grams, weight by idf, L2-normalize. Unknown grams are dropped.
    pub fn vectorize(&self, text: &str) -> FeatureVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for gram in char_ngrams(text, self.ngram_len) {
            if let Some(i) = self.index_of(gram) {
                *counts.entry(i).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(i, tf)| (i, tf * self.idf[i]))
            .collect();
        entries.sort_unstable_by_key(|(i, _)| *i);

        let norm = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, v) in entries.iter_mut() {
                *v /= norm;
            }
        }

        let (indices, values) = entries.into_iter().unzip();
        FeatureVector {
            dim: self.len(),
            indices,
            values,
        }
    }
}

pub struct FeatureExtractor {
    ngram_len: usize,
    vocabulary: Option<Vocabulary>,
}

impl FeatureExtractor {
    pub fn new(config: &FeaturesConfig) -> Self {
        Self {
            ngram_len: config.ngram_len,
            vocabulary: None,
        }
    }

    /// Extractor restored from a previously fitted vocabulary
    pub fn from_vocabulary(vocabulary: Vocabulary) -> Self {
        Self {
            ngram_len: vocabulary.ngram_len,
            vocabulary: Some(vocabulary),
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.vocabulary.is_some()
    }

    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.vocabulary.as_ref()
    }

    /// Build the vocabulary. Allowed once per extractor.
    pub fn fit<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<&Vocabulary> {
        if self.vocabulary.is_some() {
            return Err(DetectorError::AlreadyFitted("feature extractor"));
        }
        let vocabulary = Vocabulary::fit(corpus, self.ngram_len)?;
        if vocabulary.is_empty() {
            warn!(
                documents = corpus.len(),
                ngram_len = self.ngram_len,
                "no document is long enough to yield a gram; every vector will be zero"
            );
        }
        info!(
            documents = corpus.len(),
            vocabulary = vocabulary.len(),
            ngram_len = self.ngram_len,
            "fitted feature vocabulary"
        );
        Ok(&*self.vocabulary.insert(vocabulary))
    }

    pub fn transform<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<FeatureVector>> {
        let vocabulary = self
            .vocabulary
            .as_ref()
            .ok_or(DetectorError::UntrainedModel("feature extractor"))?;
        let vectors: Vec<FeatureVector> = texts
            .iter()
            .map(|t| vocabulary.vectorize(t.as_ref()))
            .collect();
        debug!(count = vectors.len(), dim = vocabulary.len(), "transformed texts");
        Ok(vectors)
    }

    pub fn transform_one(&self, text: &str) -> Result<FeatureVector> {
        self.vocabulary
            .as_ref()
            .map(|v| v.vectorize(text))
            .ok_or(DetectorError::UntrainedModel("feature extractor"))
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<Vec<FeatureVector>> {
        self.fit(corpus)?;
        self.transform(corpus)
    }
}
