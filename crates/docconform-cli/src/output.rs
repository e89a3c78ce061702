//! Report rendering and output destinations.

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use clap::ValueEnum;
use serde::Serialize;

use docconform_core::Report;
use docconform_runtime::BatchReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
    Markdown,
}

/// Something that renders in every output format.
pub trait Renderable: Serialize {
    fn text(&self) -> String;
    fn markdown(&self) -> String;
}

impl Renderable for Report {
    fn text(&self) -> String {
        self.render_text()
    }

    fn markdown(&self) -> String {
        self.render_markdown()
    }
}

impl Renderable for BatchReport {
    fn text(&self) -> String {
        self.render_text()
    }

    fn markdown(&self) -> String {
        self.render_markdown()
    }
}

pub fn render<R: Renderable>(report: &R, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => report.text(),
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Yaml => serde_yaml::to_string(report)?,
        OutputFormat::Markdown => report.markdown(),
    })
}

/// Write to `output`, or stdout when none is given.
pub fn emit(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("Failed to write report to {}", path.display())),
        None => {
            println!("{}", rendered.trim_end());
            Ok(())
        }
    }
}
