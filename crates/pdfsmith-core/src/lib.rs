use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub mod backend;
pub mod config_file;
pub mod extractor;
pub mod heuristics;
pub mod quality;
pub mod registry;
pub mod selection;

#[cfg(test)]
pub(crate) mod mock;

// Re-export for convenience
pub use backend::{
    BackendError, BackendKind, DocumentHandle, PageContent, PdfBackend, UnknownBackendKind,
};
pub use extractor::{DEFAULT_QUALITY_THRESHOLD, ExtractOptions, Extractor};
pub use registry::{BackendRegistry, RegistryError};
pub use selection::PageSelection;

/// Document-level metadata assembled from the PDF information dictionary.
///
/// Every textual field is optional since PDFs may omit the info dictionary
/// entirely or include only a subset of fields. `page_count` is always
/// backend-reported and is the authority for page-index validation;
/// `file_size` is filled in from the filesystem by the orchestrator,
/// independent of the backend.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub modification_date: Option<DateTime<Utc>>,
    pub page_count: usize,
    pub file_size: u64,
    pub encrypted: bool,
    pub linearized: bool,
    pub version: Option<String>,
}

/// Extracted content and derived statistics for one page.
///
/// Created by the orchestrator from raw backend output; never mutated after
/// scoring.
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    /// 1-indexed page number, unique within a document.
    pub page_number: usize,
    pub text: String,
    pub word_count: usize,
    pub char_count: usize,
    pub has_images: bool,
    pub has_tables: bool,
    /// Heuristic extraction confidence in [0, 1].
    pub quality_score: f64,
}

impl PageRecord {
    /// Build a record from raw backend output, deriving counts, the table
    /// heuristic, and the per-page quality score.
    pub fn from_content(page_number: usize, text: String, image_count: usize) -> Self {
        let word_count = text.split_whitespace().count();
        let char_count = text.chars().count();
        let has_tables = heuristics::looks_like_table(&text);
        let quality_score = quality::page_score(&quality::PageStats::from_text(&text));
        Self {
            page_number,
            text,
            word_count,
            char_count,
            has_images: image_count > 0,
            has_tables,
            quality_score,
        }
    }
}

/// The unit returned to every caller of [`Extractor::extract`].
///
/// `success == false` implies empty `text` and empty `pages`; errors are
/// carried in `error_message` rather than raised, so callers never see a
/// raw backend fault.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub success: bool,
    /// Non-empty page texts joined with one blank line.
    pub text: String,
    /// Page records in ascending page-number order.
    pub pages: Vec<PageRecord>,
    pub metadata: DocumentMetadata,
    /// Identifier of the backend that produced this outcome.
    pub backend_used: String,
    /// Wall-clock time for the whole call, fallback attempt included.
    pub elapsed: Duration,
    /// Aggregate confidence in [0, 1]; used to choose between backends,
    /// not a correctness guarantee.
    pub quality_score: f64,
    pub error_message: Option<String>,
}

impl ExtractionOutcome {
    /// A failed outcome carrying a human-readable reason.
    pub fn failure(
        backend: impl Into<String>,
        elapsed: Duration,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            text: String::new(),
            pages: Vec::new(),
            metadata: DocumentMetadata::default(),
            backend_used: backend.into(),
            elapsed,
            quality_score: 0.0,
            error_message: Some(message.into()),
        }
    }
}
