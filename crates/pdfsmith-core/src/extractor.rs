//! The extraction orchestrator.
//!
//! Drives a single backend through validate → open → metadata → page
//! content → score, and on a low-quality or failed attempt retries once
//! with the next-preferred available backend, keeping the better outcome.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{BackendError, PdfBackend};
use crate::quality;
use crate::registry::{BackendRegistry, RegistryError};
use crate::selection::PageSelection;
use crate::{ExtractionOutcome, PageRecord};

/// Aggregate score below this triggers the single fallback attempt.
pub const DEFAULT_QUALITY_THRESHOLD: f64 = 0.7;

/// Options applied to every call on one [`Extractor`].
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Named backend override; automatic selection when `None`.
    pub backend: Option<String>,
    pub quality_threshold: f64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            backend: None,
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
        }
    }
}

/// Why one extraction attempt (or the whole call) failed. Never escapes
/// [`Extractor::extract`]; the message lands in
/// [`ExtractionOutcome::error_message`].
#[derive(Error, Debug)]
enum PipelineError {
    #[error("cannot parse file: {0}")]
    UnsupportedInput(String),
    #[error("no valid pages specified")]
    NoValidPages,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Single entry point for text extraction.
pub struct Extractor {
    registry: BackendRegistry,
    options: ExtractOptions,
}

impl Extractor {
    /// Fails with [`RegistryError::NoBackendAvailable`] when nothing in the
    /// registry probes successfully; every later error is reported through
    /// the returned [`ExtractionOutcome`] instead.
    pub fn new(registry: BackendRegistry, options: ExtractOptions) -> Result<Self, RegistryError> {
        registry.ensure_available()?;
        Ok(Self { registry, options })
    }

    pub fn with_defaults(registry: BackendRegistry) -> Result<Self, RegistryError> {
        Self::new(registry, ExtractOptions::default())
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Extract text and metadata from `path`.
    ///
    /// Synchronous and single-threaded; opens one document handle per
    /// backend attempt and closes it on every exit path. Errors are
    /// captured in the outcome rather than returned.
    pub fn extract(&self, path: &Path, selection: &PageSelection) -> ExtractionOutcome {
        let started = Instant::now();

        let primary = match self.registry.select(self.options.backend.as_deref()) {
            Ok(backend) => backend,
            Err(err) => {
                return ExtractionOutcome::failure("none", started.elapsed(), err.to_string());
            }
        };

        if let Err(err) = validate_input(path) {
            return ExtractionOutcome::failure(primary.name(), started.elapsed(), err.to_string());
        }

        let first = attempt(primary.as_ref(), path, selection);

        // A low score or a backend fault is eligible for exactly one
        // alternate attempt; validation failures are fatal to the call.
        let wants_fallback = match &first {
            Ok(outcome) => outcome.quality_score < self.options.quality_threshold,
            Err(PipelineError::Backend(_)) => true,
            Err(_) => false,
        };

        let result = if wants_fallback {
            match self.next_untried(primary.name()) {
                Some(alternate) => {
                    info!(
                        primary = primary.name(),
                        fallback = alternate.name(),
                        "retrying extraction with fallback backend"
                    );
                    let second = attempt(alternate.as_ref(), path, selection);
                    keep_better(first, second)
                }
                None => first,
            }
        } else {
            first
        };

        match result {
            Ok(mut outcome) => {
                outcome.elapsed = started.elapsed();
                info!(
                    backend = %outcome.backend_used,
                    pages = outcome.pages.len(),
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    quality = outcome.quality_score,
                    "extraction complete"
                );
                outcome
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "extraction failed");
                ExtractionOutcome::failure(primary.name(), started.elapsed(), err.to_string())
            }
        }
    }

    fn next_untried(&self, tried: &str) -> Option<Arc<dyn PdfBackend>> {
        self.registry
            .preference_order()
            .into_iter()
            .find(|b| b.name() != tried)
    }
}

fn validate_input(path: &Path) -> Result<(), PipelineError> {
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf || !path.is_file() {
        return Err(PipelineError::UnsupportedInput(
            path.display().to_string(),
        ));
    }
    Ok(())
}

/// Run the full pipeline against one backend.
fn attempt(
    backend: &dyn PdfBackend,
    path: &Path,
    selection: &PageSelection,
) -> Result<ExtractionOutcome, PipelineError> {
    let attempt_started = Instant::now();

    let handle = backend.open(path)?;

    let mut metadata = handle.metadata();
    metadata.page_count = handle.page_count();
    metadata.file_size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    let numbers = selection.resolve(metadata.page_count);
    if numbers.is_empty() && selection.is_explicit() {
        return Err(PipelineError::NoValidPages);
    }

    let mut pages = Vec::with_capacity(numbers.len());
    for number in numbers {
        let content = handle.page(number)?;
        pages.push(PageRecord::from_content(
            number,
            content.text,
            content.image_count,
        ));
    }

    let text = join_page_text(&pages);
    let scores: Vec<f64> = pages.iter().map(|p| p.quality_score).collect();
    let quality_score = quality::aggregate_score(
        &scores,
        text.chars().count(),
        text.split_whitespace().count(),
    );

    Ok(ExtractionOutcome {
        success: true,
        text,
        pages,
        metadata,
        backend_used: backend.name().to_string(),
        elapsed: attempt_started.elapsed(),
        quality_score,
        error_message: None,
    })
}

/// Non-empty page texts joined with one blank line, in page order.
fn join_page_text(pages: &[PageRecord]) -> String {
    pages
        .iter()
        .filter(|p| !p.text.trim().is_empty())
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Keep the higher-scoring of two attempts; a failure never beats a
/// success, and ties go to the first attempt.
fn keep_better(
    first: Result<ExtractionOutcome, PipelineError>,
    second: Result<ExtractionOutcome, PipelineError>,
) -> Result<ExtractionOutcome, PipelineError> {
    match (first, second) {
        (Ok(a), Ok(b)) => Ok(if b.quality_score > a.quality_score { b } else { a }),
        (Ok(a), Err(_)) => Ok(a),
        (Err(_), Ok(b)) => Ok(b),
        (Err(a), Err(_)) => Err(a),
    }
}
