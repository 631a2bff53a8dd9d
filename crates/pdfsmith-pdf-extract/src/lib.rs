use std::panic;
use std::path::Path;

use tracing::debug;

use pdfsmith_core::DocumentMetadata;
use pdfsmith_core::backend::{
    BackendError, BackendKind, DocumentHandle, PageContent, PdfBackend,
};

/// Backend built on the pure-Rust `pdf-extract` crate.
///
/// Middle tier: it reconstructs reading order from glyph positions, which
/// preserves column layout better than raw content-stream decoding. The
/// whole document is extracted up front since the crate has no per-page
/// handle; the open call therefore carries the full extraction cost.
///
/// `pdf-extract` exposes no information dictionary, so metadata from this
/// backend is sparse by design.
#[derive(Default)]
pub struct PdfExtractBackend;

impl PdfExtractBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for PdfExtractBackend {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::LayoutAware
    }

    fn probe(&self) -> bool {
        // Pure Rust, no runtime linkage to verify.
        true
    }

    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>, BackendError> {
        // The crate is known to panic on some malformed files; a panic
        // here must degrade to an ordinary backend fault so the
        // orchestrator can fall back.
        let owned = path.to_path_buf();
        let pages = panic::catch_unwind(move || pdf_extract::extract_text_by_pages(&owned))
            .map_err(|_| {
                debug!(path = %path.display(), "pdf-extract panicked");
                BackendError::Open("extraction panicked on malformed input".into())
            })?
            .map_err(|e| BackendError::Open(e.to_string()))?;

        Ok(Box::new(PdfExtractHandle { pages }))
    }
}

struct PdfExtractHandle {
    pages: Vec<String>,
}

impl DocumentHandle for PdfExtractHandle {
    fn metadata(&self) -> DocumentMetadata {
        DocumentMetadata {
            page_count: self.pages.len(),
            ..DocumentMetadata::default()
        }
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, number: usize) -> Result<PageContent, BackendError> {
        let text = self
            .pages
            .get(number - 1)
            .cloned()
            .ok_or(BackendError::Page {
                page: number,
                message: "page out of range".into(),
            })?;
        Ok(PageContent {
            text,
            image_count: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_is_always_available() {
        assert!(PdfExtractBackend::new().probe());
    }

    #[test]
    fn open_rejects_missing_file() {
        let result = PdfExtractBackend::new().open(Path::new("/nonexistent/missing.pdf"));
        assert!(result.is_err());
    }

    #[test]
    fn handle_reports_scripted_pages() {
        let handle = PdfExtractHandle {
            pages: vec!["first".into(), "second".into()],
        };
        assert_eq!(handle.page_count(), 2);
        assert_eq!(handle.metadata().page_count, 2);
        assert_eq!(handle.page(2).unwrap().text, "second");
        assert!(handle.page(3).is_err());
    }
}
