//! Parallel batch evaluation.
//!
//! The batch processor fans out one blocking task per document, bounded by a
//! semaphore, and fans back in to a [`BatchReport`] in input order:
//! - every document gets its own orchestrator over the shared, read-only
//!   configuration
//! - a load failure or panicking task becomes an error entry for that
//!   document only; siblings keep running

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use docconform_core::{check_document, DocumentLoader, Finding, RuleConfig, SerializedDocumentLoader};

/// Default number of documents evaluated concurrently.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Errors from building a batch processor.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Batch processor not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid worker count: {0}")]
    InvalidWorkers(usize),
}

/// Outcome for one document in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResult {
    pub file: String,

    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<Finding>>,
}

impl DocumentResult {
    fn checked(file: String, passed: bool, findings: Vec<Finding>) -> Self {
        Self {
            file,
            passed,
            error: None,
            results: Some(findings),
        }
    }

    fn errored(file: String, error: impl Into<String>) -> Self {
        Self {
            file,
            passed: false,
            error: Some(error.into()),
            results: None,
        }
    }

    pub fn failed_checks(&self) -> usize {
        self.results
            .as_ref()
            .map(|r| r.iter().filter(|f| !f.passed).count())
            .unwrap_or(0)
    }
}

/// Aggregate over all documents of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub generated_at: DateTime<Utc>,
    pub documents: Vec<DocumentResult>,
}

impl BatchReport {
    pub fn new(documents: Vec<DocumentResult>) -> Self {
        let passed = documents.iter().filter(|d| d.passed).count();
        Self {
            total: documents.len(),
            passed,
            failed: documents.len() - passed,
            generated_at: Utc::now(),
            documents,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Whether any document failed to load rather than failing its checks.
    pub fn has_errors(&self) -> bool {
        self.documents.iter().any(|d| d.error.is_some())
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for doc in &self.documents {
            let line = match (&doc.error, doc.passed) {
                (Some(error), _) => format!("[ERROR] {}: {}", doc.file, error),
                (None, true) => format!("[PASS]  {}", doc.file),
                (None, false) => format!("[FAIL]  {} ({} failed check(s))", doc.file, doc.failed_checks()),
            };
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&format!(
            "\nBatch: {} document(s), {} passed, {} failed\n",
            self.total, self.passed, self.failed
        ));
        out
    }

    pub fn render_markdown(&self) -> String {
        let mut out = format!(
            "# Batch conformance report\n\n**Generated at:** {}  \n**Documents:** {} total, {} passed, {} failed\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.total,
            self.passed,
            self.failed
        );
        out.push_str("| Document | Status | Failed checks |\n|---|---|---|\n");
        for doc in &self.documents {
            let status = match (&doc.error, doc.passed) {
                (Some(_), _) => "⚠️ error",
                (None, true) => "✅ passed",
                (None, false) => "❌ failed",
            };
            out.push_str(&format!("| {} | {} | {} |\n", doc.file, status, doc.failed_checks()));
        }

        for doc in &self.documents {
            out.push_str(&format!("\n## {}\n\n", doc.file));
            if let Some(error) = &doc.error {
                out.push_str(&format!("Error: {}\n", error));
                continue;
            }
            for finding in doc.results.iter().flatten().filter(|f| !f.passed) {
                out.push_str(&format!(
                    "- ❌ {} at {}: {}\n",
                    finding.kind,
                    finding.details.location,
                    finding.message.lines().next().unwrap_or("")
                ));
            }
            if doc.passed {
                out.push_str("All checks passed.\n");
            }
        }
        out
    }
}

/// Runs one configuration over many documents concurrently.
pub struct BatchProcessor {
    config: Arc<RuleConfig>,
    loader: Arc<dyn DocumentLoader>,
    max_workers: usize,
}

impl BatchProcessor {
    pub fn new(config: Arc<RuleConfig>, loader: Arc<dyn DocumentLoader>) -> Self {
        Self {
            config,
            loader,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Evaluate every path. Results keep the input order.
    pub async fn run(&self, paths: Vec<PathBuf>) -> BatchReport {
        info!(documents = paths.len(), workers = self.max_workers, "starting batch");
        let semaphore = Arc::new(Semaphore::new(self.max_workers));

        let tasks = paths.into_iter().map(|path| {
            let semaphore = Arc::clone(&semaphore);
            let config = Arc::clone(&self.config);
            let loader = Arc::clone(&self.loader);

            async move {
                let file = path.display().to_string();
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return DocumentResult::errored(file, "worker pool closed");
                };

                let handle = tokio::task::spawn_blocking(move || {
                    check_document(&config, loader.as_ref(), &path)
                });

                match handle.await {
                    Ok(Ok(report)) => DocumentResult::checked(file, report.passed, report.findings),
                    Ok(Err(e)) => {
                        warn!(document = %file, error = %e, "document evaluation aborted");
                        DocumentResult::errored(file, e.to_string())
                    }
                    Err(e) => {
                        warn!(document = %file, error = %e, "evaluation task failed");
                        DocumentResult::errored(file, format!("evaluation task failed: {}", e))
                    }
                }
            }
        });

        let report = BatchReport::new(futures::future::join_all(tasks).await);
        info!(
            total = report.total,
            passed = report.passed,
            failed = report.failed,
            "batch finished"
        );
        report
    }
}

/// Builder for [`BatchProcessor`].
pub struct BatchProcessorBuilder {
    config: Option<Arc<RuleConfig>>,
    loader: Option<Arc<dyn DocumentLoader>>,
    max_workers: usize,
}

impl BatchProcessorBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            loader: None,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    pub fn config(mut self, config: RuleConfig) -> Self {
        self.config = Some(Arc::new(config));
        self
    }

    /// Document loader; defaults to [`SerializedDocumentLoader`].
    pub fn loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers;
        self
    }

    pub fn build(self) -> Result<BatchProcessor, BatchError> {
        let config = self
            .config
            .ok_or_else(|| BatchError::NotConfigured("No rule configuration set".to_string()))?;
        if self.max_workers == 0 {
            return Err(BatchError::InvalidWorkers(0));
        }
        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(SerializedDocumentLoader::new()));

        let mut processor = BatchProcessor::new(config, loader);
        processor.max_workers = self.max_workers;
        Ok(processor)
    }
}

impl Default for BatchProcessorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Loadable documents directly inside `dir`, sorted by path.
pub fn discover_documents(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && SerializedDocumentLoader::supports(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
