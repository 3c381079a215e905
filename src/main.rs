//! request-anomaly entrypoint: `evaluate` runs a full labeled session
//! (parse, fit, hold-out evaluation, optional sample classification and model save);
//! `classify` labels requests with a previously saved model.

use clap::{Parser, Subcommand};
use request_anomaly::{
    config::DetectorConfig,
    dataset::{load_corpus, load_lines},
    logging::{StructuredLogger, VerdictLine},
    parser::Label,
    pipeline::DetectionPipeline,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Detect anomalous HTTP requests in access logs
#[derive(Parser, Debug)]
#[command(name = "request-anomaly")]
#[command(about = "Char n-gram TF-IDF + linear SVM detector for HTTP request logs")]
struct Cli {
    /// JSON config file (missing file means defaults)
    #[arg(long, env = "REQUEST_ANOMALY_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Log level when RUST_LOG is unset (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train on labeled logs and report hold-out accuracy
    Evaluate {
        /// Normal traffic log (repeatable; replaces the configured list)
        #[arg(long = "normal")]
        normal: Vec<PathBuf>,

        /// Anomalous traffic log (repeatable; replaces the configured list)
        #[arg(long = "anomalous")]
        anomalous: Vec<PathBuf>,

        /// Unlabeled log to classify with the trained model
        #[arg(long)]
        samples: Option<PathBuf>,

        /// Write the trained pipeline here
        #[arg(long)]
        save_model: Option<PathBuf>,

        /// Print results as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Classify requests with a saved pipeline
    Classify {
        /// Pipeline written by `evaluate --save-model`
        #[arg(long)]
        model: PathBuf,

        /// Log file with the requests to classify
        samples: PathBuf,

        /// Print results as JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn classify_file(
    pipeline: &DetectionPipeline,
    path: &Path,
    json: bool,
    out: &mut impl Write,
) -> Result<(), BoxError> {
    let lines = load_lines(path)?;
    let verdicts = pipeline.classify_lines(&lines)?;
    let anomalous = verdicts.iter().filter(|v| v.label == Label::Anomalous).count();
    info!(path = %path.display(), requests = verdicts.len(), anomalous, "classified samples");

    let source = path.to_str();
    for (index, v) in verdicts.iter().enumerate() {
        if json {
            let line = VerdictLine {
                ts: chrono::Utc::now().to_rfc3339(),
                index,
                method: v.method,
                label: v.label,
                margin: v.margin,
                source,
            };
            StructuredLogger::emit_json(&line, &mut *out)?;
        } else {
            writeln!(out, "{}", v.label)?;
        }
    }
    Ok(())
}

fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let mut config = DetectorConfig::load(&cli.config);
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }

    StructuredLogger::init(config.log.json, &config.log.level);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Evaluate {
            normal,
            anomalous,
            samples,
            save_model,
            json,
        } => {
            if !normal.is_empty() {
                config.data.normal_files = normal;
            }
            if !anomalous.is_empty() {
                config.data.anomalous_files = anomalous;
            }
            if samples.is_some() {
                config.data.sample_file = samples;
            }

            let mut pipeline = DetectionPipeline::new(&config)?;
            let corpus = load_corpus(
                pipeline.parser(),
                &config.data.normal_files,
                &config.data.anomalous_files,
            )?;
            info!(
                requests = corpus.len(),
                normal = corpus.count(Label::Normal),
                anomalous = corpus.count(Label::Anomalous),
                "corpus ready"
            );

            let report = pipeline.evaluate(&corpus)?;
            if json {
                StructuredLogger::emit_json(&report, &mut out)?;
            } else {
                writeln!(out, "Score Linear SVM: {}", report.accuracy)?;
                writeln!(out, "Confusion Matrix (rows = true, cols = predicted; anomalous, normal):")?;
                writeln!(out, "{}", report.confusion)?;
            }

            if let Some(path) = &save_model {
                pipeline.save(path)?;
            }
            if let Some(path) = &config.data.sample_file {
                classify_file(&pipeline, path, json, &mut out)?;
            }
        }
        Command::Classify {
            model,
            samples,
            json,
        } => {
            let pipeline = DetectionPipeline::load(&model)?;
            classify_file(&pipeline, &samples, json, &mut out)?;
        }
    }

    Ok(())
}
