//! JSON log lines: one JSON object per line (ndjson) for ingestion and audit.

use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::parser::{Label, Method};

/// One classified request, as written by `classify --json`
#[derive(Serialize)]
pub struct VerdictLine<'a> {
    pub ts: String,
    pub index: usize,
    pub method: Method,
    pub label: Label,
    pub margin: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'a str>,
}

pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber on stderr so stdout stays free for results.
    /// Level comes from RUST_LOG, falling back to `default_level`.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(fmt).init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    /// Emit a single structured line without going through tracing
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) -> std::io::Result<()> {
        let line = serde_json::to_string(event).map_err(std::io::Error::other)?;
        writeln!(w, "{}", line)
    }
}
