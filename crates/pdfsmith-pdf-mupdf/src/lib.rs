use std::path::Path;

use mupdf::{Document, document::MetadataName};
use tracing::debug;

use pdfsmith_core::backend::{
    BackendError, BackendKind, DocumentHandle, PageContent, PdfBackend, parse_pdf_date,
};
use pdfsmith_core::DocumentMetadata;

/// The smallest well-formed one-page PDF, used to probe that the linked
/// MuPDF library actually works in this environment.
const PROBE_PDF: &[u8] = b"%PDF-1.4\n\
1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n\
3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>\nendobj\n\
xref\n0 4\n\
0000000000 65535 f \n\
0000000009 00000 n \n\
0000000058 00000 n \n\
0000000115 00000 n \n\
trailer\n<< /Size 4 /Root 1 0 R >>\nstartxref\n186\n%%EOF\n";

/// MuPDF-based implementation of [`PdfBackend`].
///
/// The mupdf dependency is AGPL-3.0 and lives in this crate alone, keeping
/// the rest of the workspace free of it. Highest-fidelity tier: full text
/// shaping, tolerant of damaged cross-reference tables.
#[derive(Default)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for MupdfBackend {
    fn name(&self) -> &'static str {
        "mupdf"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::HighFidelity
    }

    fn probe(&self) -> bool {
        match Document::from_bytes(PROBE_PDF, "pdf") {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "mupdf probe failed");
                false
            }
        }
    }

    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::Open("invalid path encoding".into()))?;

        let document = Document::open(path_str).map_err(|e| BackendError::Open(e.to_string()))?;
        let page_count = document
            .page_count()
            .map_err(|e| BackendError::Open(e.to_string()))? as usize;

        Ok(Box::new(MupdfHandle {
            document,
            page_count,
        }))
    }
}

struct MupdfHandle {
    document: Document,
    page_count: usize,
}

impl MupdfHandle {
    /// A metadata lookup that fails or comes back empty is an absent field.
    fn info(&self, name: MetadataName) -> Option<String> {
        self.document
            .metadata(name)
            .ok()
            .filter(|s| !s.is_empty())
    }
}

impl DocumentHandle for MupdfHandle {
    fn metadata(&self) -> DocumentMetadata {
        let version = self
            .info(MetadataName::Format)
            .map(|f| f.trim_start_matches("PDF ").trim().to_string());

        DocumentMetadata {
            title: self.info(MetadataName::Title),
            author: self.info(MetadataName::Author),
            subject: None,
            keywords: None,
            creator: self.info(MetadataName::Creator),
            producer: self.info(MetadataName::Producer),
            creation_date: self
                .info(MetadataName::CreationDate)
                .and_then(|d| parse_pdf_date(&d)),
            modification_date: self
                .info(MetadataName::ModDate)
                .and_then(|d| parse_pdf_date(&d)),
            page_count: self.page_count,
            file_size: 0,
            encrypted: self.document.needs_password().unwrap_or(false),
            linearized: false,
            version,
        }
    }

    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page(&self, number: usize) -> Result<PageContent, BackendError> {
        let page = self
            .document
            .load_page((number - 1) as i32)
            .map_err(|e| BackendError::Page {
                page: number,
                message: e.to_string(),
            })?;
        let text = page.to_text().map_err(|e| BackendError::Page {
            page: number,
            message: e.to_string(),
        })?;
        // MuPDF's plain-text walk does not surface image objects.
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
    fn probe_succeeds_with_linked_library() {
        assert!(MupdfBackend::new().probe());
    }

    #[test]
    fn opens_minimal_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minimal.pdf");
        std::fs::write(&path, PROBE_PDF).unwrap();

        let handle = MupdfBackend::new().open(&path).unwrap();
        assert_eq!(handle.page_count(), 1);

        let metadata = handle.metadata();
        assert!(metadata.title.is_none());
        assert!(!metadata.encrypted);

        // The probe document carries no content stream.
        let content = handle.page(1).unwrap();
        assert!(content.text.trim().is_empty());
        assert_eq!(content.image_count, 0);
    }

    #[test]
    fn open_rejects_non_pdf_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        assert!(MupdfBackend::new().open(&path).is_err());
    }
}
