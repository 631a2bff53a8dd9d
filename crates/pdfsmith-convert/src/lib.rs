//! Format conversion from extracted PDF content.
//!
//! Renders an [`ExtractionOutcome`] as plain text, Markdown, JSON, YAML,
//! or HTML. Extraction itself stays in `pdfsmith-core`; this crate is
//! purely a set of renderers over its output.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use pdfsmith_core::ExtractionOutcome;

mod data;
mod html;
mod markdown;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to serialize output: {0}")]
    Serialize(String),
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Markdown,
    Json,
    Yaml,
    Html,
}

impl OutputFormat {
    /// Map an output file extension to a format. Unknown or missing
    /// extensions default to plain text.
    pub fn from_extension(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "md" | "markdown" => Self::Markdown,
            "json" => Self::Json,
            "yml" | "yaml" => Self::Yaml,
            "html" | "htm" => Self::Html,
            _ => Self::Text,
        }
    }

    pub fn parse(name: &str) -> Result<Self, ConvertError> {
        match name.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "html" => Ok(Self::Html),
            other => Err(ConvertError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Html => "html",
        }
    }
}

/// Rendering knobs shared by every format.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Emit a metadata header / section when the document carries one.
    pub include_metadata: bool,
    /// Break output up per page with page markers.
    pub include_page_numbers: bool,
    /// Detect headings and lists in the markdown renderer.
    pub preserve_structure: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            include_metadata: true,
            include_page_numbers: false,
            preserve_structure: true,
        }
    }
}

/// Render an extraction outcome in the requested format.
pub fn render(
    outcome: &ExtractionOutcome,
    format: OutputFormat,
    options: &ConvertOptions,
) -> Result<String, ConvertError> {
    debug!(
        format = format.label(),
        pages = outcome.pages.len(),
        "rendering extraction outcome"
    );
    match format {
        OutputFormat::Text => Ok(render_text(outcome, options)),
        OutputFormat::Markdown => Ok(markdown::render(outcome, options)),
        OutputFormat::Json => data::render_json(outcome, options),
        OutputFormat::Yaml => data::render_yaml(outcome, options),
        OutputFormat::Html => Ok(html::render(outcome, options)),
    }
}

fn render_text(outcome: &ExtractionOutcome, options: &ConvertOptions) -> String {
    let mut parts = Vec::new();

    if options.include_metadata {
        if let Some(title) = &outcome.metadata.title {
            parts.push(format!("Title: {title}"));
            if let Some(author) = &outcome.metadata.author {
                parts.push(format!("Author: {author}"));
            }
            parts.push(String::new());
        }
    }

    if options.include_page_numbers && outcome.pages.len() > 1 {
        for page in &outcome.pages {
            if page.text.trim().is_empty() {
                continue;
            }
            parts.push(format!("=== Page {} ===", page.page_number));
            parts.push(page.text.trim().to_string());
            parts.push(String::new());
        }
    } else {
        parts.push(outcome.text.clone());
    }

    parts.join("\n")
}

#[cfg(test)]
pub(crate) fn sample_outcome() -> ExtractionOutcome {
    use pdfsmith_core::{DocumentMetadata, PageRecord};
    use std::time::Duration;

    let pages = vec![
        PageRecord::from_content(1, "Introduction\n\nThis report covers the results.".into(), 0),
        PageRecord::from_content(2, "Conclusion follows on the second page.".into(), 1),
    ];
    let text = pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    ExtractionOutcome {
        success: true,
        text,
        pages,
        metadata: DocumentMetadata {
            title: Some("Annual Report".into()),
            author: Some("Jane Roe".into()),
            page_count: 2,
            file_size: 1024,
            ..DocumentMetadata::default()
        },
        backend_used: "mupdf".into(),
        elapsed: Duration::from_millis(125),
        quality_score: 0.91,
        error_message: None,
    }
}
