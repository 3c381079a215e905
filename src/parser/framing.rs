//! Request framing: GET is a single line; POST/PUT carry a body found relative
//! to the `Content-Length:` header.

use super::{normalize, Method, RequestRecord};
use crate::config::ParserConfig;
use crate::error::{DetectorError, Result};
use serde::Serialize;
use tracing::debug;

/// Lines between `Content-Length:` and the body line. This is an assumption
/// about the access-log layout (header, blank separator, body), not HTTP framing.
pub const BODY_LINE_OFFSET: usize = 2;

const CONTENT_LENGTH_PREFIX: &str = "Content-Length:";

/// Counters for one parse pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub lines: usize,
    pub get: usize,
    pub post: usize,
    pub put: usize,
    /// Lines that were neither a request line nor consumed by a body scan
    pub skipped: usize,
}

impl ParseStats {
    pub fn requests(&self) -> usize {
        self.get + self.post + self.put
    }

    fn count(&mut self, method: Method) {
        match method {
            Method::Get => self.get += 1,
            Method::Post => self.post += 1,
            Method::Put => self.put += 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestLogParser {
    body_line_offset: usize,
    max_header_lines: Option<usize>,
}

impl Default for RequestLogParser {
    fn default() -> Self {
        Self {
            body_line_offset: BODY_LINE_OFFSET,
            max_header_lines: None,
        }
    }
}

impl RequestLogParser {
    /// Fails on a zero body offset, which would read the `Content-Length:` line as the body.
    pub fn new(config: &ParserConfig) -> Result<Self> {
        if config.body_line_offset == 0 {
            return Err(DetectorError::InvalidConfig(
                "parser.body_line_offset must be at least 1".into(),
            ));
        }
        Ok(Self {
            body_line_offset: config.body_line_offset,
            max_header_lines: config.max_header_lines,
        })
    }

    pub fn body_line_offset(&self) -> usize {
        self.body_line_offset
    }

    /// Parse lines into canonical requests, in input order.
    pub fn parse<S: AsRef<str>>(&self, lines: &[S]) -> Result<Vec<RequestRecord>> {
        self.parse_with_stats(lines).map(|(records, _)| records)
    }

    /// Split raw text on line breaks and parse it.
    pub fn parse_str(&self, text: &str) -> Result<Vec<RequestRecord>> {
        let lines: Vec<&str> = text.lines().collect();
        self.parse(&lines)
    }

    pub fn parse_with_stats<S: AsRef<str>>(
        &self,
        lines: &[S],
    ) -> Result<(Vec<RequestRecord>, ParseStats)> {
        let mut records = Vec::new();
        let mut stats = ParseStats {
            lines: lines.len(),
            ..ParseStats::default()
        };

        let mut cursor = 0;
        while cursor < lines.len() {
            let line = lines[cursor].as_ref();
            match Method::from_line(line) {
                Some(Method::Get) => {
                    records.push(RequestRecord {
                        method: Method::Get,
                        canonical_form: normalize(line),
                    });
                    stats.count(Method::Get);
                    cursor += 1;
                }
                Some(method) => {
                    let body_index = self.locate_body(lines, cursor)?;
                    let mut raw = String::with_capacity(line.len() + lines[body_index].as_ref().len());
                    raw.push_str(line);
                    raw.push_str(lines[body_index].as_ref());
                    records.push(RequestRecord {
                        method,
                        canonical_form: normalize(&raw),
                    });
                    stats.count(method);
                    cursor = body_index + 1;
                }
                None => {
                    stats.skipped += 1;
                    cursor += 1;
                }
            }
        }

        debug!(
            lines = stats.lines,
            requests = stats.requests(),
            skipped = stats.skipped,
            "parsed request log"
        );
        Ok((records, stats))
    }

    /// Index of the body line for the POST/PUT request line at `start`.
    fn locate_body<S: AsRef<str>>(&self, lines: &[S], start: usize) -> Result<usize> {
        let limit = match self.max_header_lines {
            Some(n) => (start + 1 + n).min(lines.len()),
            None => lines.len(),
        };

        for (index, line) in lines.iter().enumerate().take(limit).skip(start + 1) {
            let line = line.as_ref();
            if line.starts_with(CONTENT_LENGTH_PREFIX) {
                let body_index = index + self.body_line_offset;
                if body_index >= lines.len() {
                    return Err(DetectorError::MalformedRequest {
                        line: index + 1,
                        reason: format!(
                            "body line {} is past the end of input ({} lines)",
                            body_index + 1,
                            lines.len()
                        ),
                    });
                }
                return Ok(body_index);
            }
            if Method::from_line(line).is_some() {
                return Err(DetectorError::MalformedRequest {
                    line: start + 1,
                    reason: format!(
                        "next request starts at line {} before any Content-Length header",
                        index + 1
                    ),
                });
            }
        }

        let reason = if limit < lines.len() {
            format!(
                "no Content-Length header within {} lines",
                self.max_header_lines.unwrap_or_default()
            )
        } else {
            "no Content-Length header before end of input".to_string()
        };
        Err(DetectorError::MalformedRequest {
            line: start + 1,
            reason,
        })
    }
}
