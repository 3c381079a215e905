//! Labeled corpora built from `\n`-delimited access-log files.

use crate::error::{DetectorError, Result};
use crate::parser::{Label, RequestLogParser, RequestRecord};
use std::path::Path;
use tracing::{error, info};

/// Ordered requests with a parallel label sequence.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    records: Vec<RequestRecord>,
    labels: Vec<Label>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append records that all come from one source of the given class.
    pub fn extend_labeled(&mut self, records: Vec<RequestRecord>, label: Label) {
        self.labels.extend(std::iter::repeat(label).take(records.len()));
        self.records.extend(records);
    }

    pub fn append(&mut self, other: Corpus) {
        self.records.extend(other.records);
        self.labels.extend(other.labels);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[RequestRecord] {
        &self.records
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn canonical_forms(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.canonical_form.as_str()).collect()
    }

    pub fn count(&self, label: Label) -> usize {
        self.labels.iter().filter(|l| **l == label).count()
    }
}

/// Read a log file as lines. `\r\n` endings are accepted.
pub fn load_lines(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path).map_err(|source| DetectorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text.lines().map(str::to_owned).collect())
}

/// Parse one file; every request gets `label`.
pub fn load_labeled(parser: &RequestLogParser, path: &Path, label: Label) -> Result<Corpus> {
    let lines = load_lines(path)?;
    let (records, stats) = parser.parse_with_stats(&lines).map_err(|e| {
        error!(path = %path.display(), error = %e, "cannot parse request log");
        e
    })?;
    info!(
        path = %path.display(),
        label = %label,
        requests = stats.requests(),
        get = stats.get,
        post = stats.post,
        put = stats.put,
        skipped = stats.skipped,
        "loaded request log"
    );
    let mut corpus = Corpus::new();
    corpus.extend_labeled(records, label);
    Ok(corpus)
}

/// Normal files first, then anomalous files, each in the order given.
pub fn load_corpus<P: AsRef<Path>>(
    parser: &RequestLogParser,
    normal: &[P],
    anomalous: &[P],
) -> Result<Corpus> {
    let mut corpus = Corpus::new();
    for path in normal {
        corpus.append(load_labeled(parser, path.as_ref(), Label::Normal)?);
    }
    for path in anomalous {
        corpus.append(load_labeled(parser, path.as_ref(), Label::Anomalous)?);
    }
    Ok(corpus)
}
