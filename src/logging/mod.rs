//! Tracing setup and ndjson output for reports and per-request verdicts.

mod format;

pub use format::{StructuredLogger, VerdictLine};
