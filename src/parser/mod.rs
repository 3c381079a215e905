//! Reconstructs logical HTTP requests from a line-oriented access log.
//! Shared request types live here; framing rules in [`RequestLogParser`].

mod framing;

pub use framing::{ParseStats, RequestLogParser, BODY_LINE_OFFSET};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    /// Request-line prefix as it appears in the log (case-sensitive).
    pub fn prefix(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }

    /// Method whose prefix starts `line`, if any.
    pub fn from_line(line: &str) -> Option<Self> {
        [Method::Get, Method::Post, Method::Put]
            .into_iter()
            .find(|m| line.starts_with(m.prefix()))
    }
}

/// Class of a request. Assigned per source corpus by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Anomalous,
    Normal,
}

impl Label {
    /// Numeric class: normal = 1, anomalous = 0.
    pub fn class(self) -> u8 {
        match self {
            Label::Anomalous => 0,
            Label::Normal => 1,
        }
    }

    /// Row/column position in the confusion matrix.
    pub fn index(self) -> usize {
        self.class() as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Anomalous => "anomalous",
            Label::Normal => "normal",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical HTTP request in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub method: Method,
    pub canonical_form: String,
}

/// Lower-case and drop every whitespace character.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
