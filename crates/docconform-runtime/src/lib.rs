//! # docconform-runtime
//!
//! Concurrent evaluation of many documents against one rule configuration.
//!
//! The core engine in `docconform-core` is synchronous and evaluates one
//! document at a time. This crate runs it over a batch on the tokio
//! blocking pool, isolating per-document failures.
//!
//! ## Example
//!
//! ```rust,ignore
//! use docconform_core::RuleConfig;
//! use docconform_runtime::{discover_documents, BatchProcessorBuilder};
//!
//! let processor = BatchProcessorBuilder::new()
//!     .config(RuleConfig::from_file("rules.yaml")?)
//!     .max_workers(8)
//!     .build()?;
//!
//! let report = processor.run(discover_documents("reports/".as_ref())?).await;
//! println!("{}", report.render_text());
//! ```

pub mod batch;

pub use batch::{
    discover_documents, BatchError, BatchProcessor, BatchProcessorBuilder, BatchReport,
    DocumentResult, DEFAULT_MAX_WORKERS,
};
