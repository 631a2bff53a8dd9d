//! Mock extraction backend for tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::DocumentMetadata;
use crate::backend::{BackendError, BackendKind, DocumentHandle, PageContent, PdfBackend};

/// A hand-rolled mock implementing [`PdfBackend`] for tests.
///
/// Supports:
/// - Scripted page texts (one string per page), with optional per-page
///   image counts.
/// - A forced `open` failure or a failure on one specific page.
/// - Probe/open call counting via [`probe_count`](MockBackend::probe_count)
///   and [`open_count`](MockBackend::open_count).
pub struct MockBackend {
    name: &'static str,
    kind: BackendKind,
    available: bool,
    pages: Vec<String>,
    metadata: DocumentMetadata,
    image_pages: Vec<usize>,
    open_error: Option<String>,
    failing_page: Option<usize>,
    probe_count: AtomicUsize,
    open_count: AtomicUsize,
}

impl MockBackend {
    pub fn new(name: &'static str, kind: BackendKind) -> Self {
        Self {
            name,
            kind,
            available: true,
            pages: Vec::new(),
            metadata: DocumentMetadata::default(),
            image_pages: Vec::new(),
            open_error: None,
            failing_page: None,
            probe_count: AtomicUsize::new(0),
            open_count: AtomicUsize::new(0),
        }
    }

    /// Make [`PdfBackend::probe`] report this backend as unusable.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Script the document: one string per page, page 1 first.
    pub fn with_pages<S: Into<String>>(mut self, pages: impl IntoIterator<Item = S>) -> Self {
        self.pages = pages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Report one embedded image on each of the given pages.
    pub fn with_images_on(mut self, pages: impl IntoIterator<Item = usize>) -> Self {
        self.image_pages = pages.into_iter().collect();
        self
    }

    /// Every `open` call fails with this message.
    pub fn with_open_error(mut self, message: impl Into<String>) -> Self {
        self.open_error = Some(message.into());
        self
    }

    /// Reading this page number fails.
    pub fn with_failing_page(mut self, page: usize) -> Self {
        self.failing_page = Some(page);
        self
    }

    pub fn probe_count(&self) -> usize {
        self.probe_count.load(Ordering::SeqCst)
    }

    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }
}

impl PdfBackend for MockBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn probe(&self) -> bool {
        self.probe_count.fetch_add(1, Ordering::SeqCst);
        self.available
    }

    fn open(&self, _path: &Path) -> Result<Box<dyn DocumentHandle>, BackendError> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.open_error {
            return Err(BackendError::Open(message.clone()));
        }
        Ok(Box::new(MockHandle {
            pages: self.pages.clone(),
            metadata: self.metadata.clone(),
            image_pages: self.image_pages.clone(),
            failing_page: self.failing_page,
        }))
    }
}

struct MockHandle {
    pages: Vec<String>,
    metadata: DocumentMetadata,
    image_pages: Vec<usize>,
    failing_page: Option<usize>,
}

impl DocumentHandle for MockHandle {
    fn metadata(&self) -> DocumentMetadata {
        let mut metadata = self.metadata.clone();
        metadata.page_count = self.pages.len();
        metadata
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, number: usize) -> Result<PageContent, BackendError> {
        if self.failing_page == Some(number) {
            return Err(BackendError::Page {
                page: number,
                message: "scripted page failure".into(),
            });
        }
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
            image_count: usize::from(self.image_pages.contains(&number)),
        })
    }
}
