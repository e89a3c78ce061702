//! docconform CLI - document conformance checks
//!
//! Exit status: 0 when every check passes, 1 when any check fails,
//! 2 on configuration or document load errors.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use docconform_core::{check_document, EvaluationError, Report, RuleConfig, SerializedDocumentLoader};
use docconform_runtime::{
    discover_documents, BatchProcessorBuilder, BatchReport, DEFAULT_MAX_WORKERS,
};

mod output;

use output::{emit, render, OutputFormat};

const EXIT_PASSED: u8 = 0;
const EXIT_FAILED: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[derive(Parser)]
#[command(
    name = "docconform",
    version,
    about = "Check structured documents against declarative formatting rules",
    after_help = "EXAMPLES:\n  \
                  docconform check --config rules.json\n  \
                  docconform check --config rules.yaml --file report.json --format markdown\n  \
                  docconform batch --config rules.yaml --dir reports/ --workers 8\n  \
                  docconform validate-config rules.yaml"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a single document
    Check(CheckArgs),

    /// Check many documents in parallel
    Batch(BatchArgs),

    /// Validate a rule configuration without checking anything
    ValidateConfig {
        /// Rule configuration (.json, .yaml, .yml)
        config: PathBuf,
    },
}

#[derive(Args)]
struct ReportArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct CheckArgs {
    /// Rule configuration (.json, .yaml, .yml)
    #[arg(short, long)]
    config: PathBuf,

    /// Document to check; overrides `document_to_check`
    #[arg(long)]
    file: Option<PathBuf>,

    #[command(flatten)]
    report: ReportArgs,
}

#[derive(Args)]
struct BatchArgs {
    /// Rule configuration (.json, .yaml, .yml)
    #[arg(short, long)]
    config: PathBuf,

    /// Documents to check
    #[arg(required_unless_present = "dir")]
    files: Vec<PathBuf>,

    /// Check every document directly inside this directory
    #[arg(long, conflicts_with = "files")]
    dir: Option<PathBuf>,

    /// Maximum documents evaluated at once
    #[arg(short, long, default_value_t = DEFAULT_MAX_WORKERS)]
    workers: usize,

    #[command(flatten)]
    report: ReportArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check(args) => check(args),
        Commands::Batch(args) => batch(args).await,
        Commands::ValidateConfig { config } => validate_config(config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: &Path) -> Result<RuleConfig> {
    RuleConfig::from_file(path)
        .with_context(|| format!("Invalid configuration {}", path.display()))
}

fn check(args: CheckArgs) -> Result<u8> {
    let mut config = load_config(&args.config)?;
    if let Some(file) = &args.file {
        config = config.with_document(file.display().to_string());
    }

    let result = check_document(&config, &SerializedDocumentLoader::new(), config.document_path());
    match &result {
        Ok(report) => emit(&render(report, args.report.format)?, args.report.output.as_deref())?,
        Err(e) => eprintln!("Error: {}", e),
    }

    Ok(check_exit_code(&result))
}

async fn batch(args: BatchArgs) -> Result<u8> {
    let config = load_config(&args.config)?;
    let paths = match &args.dir {
        Some(dir) => discover_documents(dir)
            .with_context(|| format!("Failed to list documents in {}", dir.display()))?,
        None => args.files,
    };
    debug!(documents = paths.len(), "documents collected");

    let processor = BatchProcessorBuilder::new()
        .config(config)
        .loader(Arc::new(SerializedDocumentLoader::new()))
        .max_workers(args.workers)
        .build()?;
    let report = processor.run(paths).await;
    emit(&render(&report, args.report.format)?, args.report.output.as_deref())?;

    Ok(batch_exit_code(&report))
}

/// 0 when every check passed, 1 on any failing check, 2 when evaluation aborted.
fn check_exit_code(result: &Result<Report, EvaluationError>) -> u8 {
    match result {
        Ok(report) if report.passed => EXIT_PASSED,
        Ok(_) => EXIT_FAILED,
        Err(e) => u8::try_from(e.exit_code()).unwrap_or(EXIT_ERROR),
    }
}

/// Any document that could not be evaluated outranks failing checks.
fn batch_exit_code(report: &BatchReport) -> u8 {
    if report.has_errors() {
        EXIT_ERROR
    } else if report.all_passed() {
        EXIT_PASSED
    } else {
        EXIT_FAILED
    }
}

fn validate_config(path: PathBuf) -> Result<u8> {
    let config = load_config(&path)?;
    println!(
        "{}: valid ({} title(s), {} table rule(s), {} content rule(s), font rules {})",
        path.display(),
        config.expected_title_texts().len(),
        config.table_rules.as_ref().map_or(0, Vec::len),
        config.content_rules.as_ref().map_or(0, Vec::len),
        if config.font_rules.is_some() { "present" } else { "absent" },
    );
    Ok(EXIT_PASSED)
}

#[cfg(test)]
mod tests {
    use super::*;

    use docconform_core::{ConfigError, DocumentLoadError, Finding, FindingKind, Location};
    use docconform_runtime::DocumentResult;

    fn report(passed: bool) -> Report {
        let finding = if passed {
            Finding::pass(FindingKind::Title, "all expected titles present", Location::Document)
        } else {
            Finding::fail(FindingKind::Title, "missing titles: 概述", Location::Document)
        };
        Report::new("report.json", vec![finding])
    }

    fn document(file: &str, passed: bool, error: Option<&str>) -> DocumentResult {
        DocumentResult {
            file: file.to_string(),
            passed,
            error: error.map(str::to_string),
            results: error.is_none().then(|| report(passed).findings),
        }
    }

    #[test]
    fn test_check_exit_codes() {
        assert_eq!(check_exit_code(&Ok(report(true))), 0);
        assert_eq!(check_exit_code(&Ok(report(false))), 1);

        let missing = EvaluationError::Load(DocumentLoadError::NotFound(PathBuf::from("a.json")));
        assert_eq!(check_exit_code(&Err(missing)), 2);

        let invalid = EvaluationError::Config(ConfigError::Validation("bad".to_string()));
        assert_eq!(check_exit_code(&Err(invalid)), 2);
    }

    #[test]
    fn test_batch_exit_codes() {
        let all_pass = BatchReport::new(vec![document("a.json", true, None), document("b.json", true, None)]);
        assert_eq!(batch_exit_code(&all_pass), 0);

        let one_fails = BatchReport::new(vec![document("a.json", true, None), document("b.json", false, None)]);
        assert_eq!(batch_exit_code(&one_fails), 1);

        let one_errors = BatchReport::new(vec![
            document("a.json", false, None),
            document("b.json", false, Some("Document not found: b.json")),
        ]);
        assert_eq!(batch_exit_code(&one_errors), 2);

        assert_eq!(batch_exit_code(&BatchReport::new(vec![])), 0);
    }

    #[test]
    fn test_config_load_failure_is_an_error() {
        let err = load_config(Path::new("/nonexistent/rules.yaml")).unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }
}
