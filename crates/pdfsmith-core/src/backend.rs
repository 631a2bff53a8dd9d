use std::fmt;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::DocumentMetadata;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    Open(String),
    #[error("failed to extract page {page}: {message}")]
    Page { page: usize, message: String },
    #[error("failed to extract text: {0}")]
    Extraction(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability tier of an extraction backend.
///
/// The derived order doubles as the fixed fallback preference order:
/// `HighFidelity` before `LayoutAware` before `Basic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    HighFidelity,
    LayoutAware,
    Basic,
}

impl BackendKind {
    pub fn label(&self) -> &'static str {
        match self {
            BackendKind::HighFidelity => "high-fidelity",
            BackendKind::LayoutAware => "layout-aware",
            BackendKind::Basic => "basic",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Error, Debug)]
#[error("unknown backend kind: {0}")]
pub struct UnknownBackendKind(String);

impl std::str::FromStr for BackendKind {
    type Err = UnknownBackendKind;

    /// Accepts capability labels and the concrete backend identifiers as
    /// aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high-fidelity" | "mupdf" => Ok(BackendKind::HighFidelity),
            "layout-aware" | "pdf-extract" => Ok(BackendKind::LayoutAware),
            "basic" | "lopdf" => Ok(BackendKind::Basic),
            other => Err(UnknownBackendKind(other.to_string())),
        }
    }
}

/// Raw per-page output from a backend, before any statistics are derived.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub text: String,
    /// Number of embedded image objects on the page; 0 when the backend
    /// cannot tell.
    pub image_count: usize,
}

/// One concrete PDF extraction integration.
///
/// Backends are stateless identifiers owned by the
/// [`BackendRegistry`](crate::BackendRegistry); the registry caches each
/// backend's [`probe`](PdfBackend::probe) answer for the process lifetime.
pub trait PdfBackend: Send + Sync {
    /// Stable identifier of this backend (e.g. "mupdf", "lopdf").
    fn name(&self) -> &'static str;

    fn kind(&self) -> BackendKind;

    /// Lightweight capability check: can the underlying library be
    /// instantiated in this environment? Must not depend on any particular
    /// input document.
    fn probe(&self) -> bool;

    /// Open a document. Called exactly once per extraction attempt; the
    /// returned handle is dropped (and the document closed) on every exit
    /// path.
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>, BackendError>;
}

/// An opened document, scoped to a single extraction attempt.
pub trait DocumentHandle {
    /// Read the document metadata. Tolerant by contract: any field the
    /// backend cannot read is left unset, never an error. The encryption
    /// flag defaults to `false` when undeterminable.
    fn metadata(&self) -> DocumentMetadata;

    fn page_count(&self) -> usize;

    /// Extract the content of one page (1-indexed).
    fn page(&self, number: usize) -> Result<PageContent, BackendError>;
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSS` with optional timezone
/// suffix) into a UTC timestamp. Missing trailing components default to
/// January 1st / midnight; timezone offsets are ignored.
pub fn parse_pdf_date(raw: &str) -> Option<DateTime<Utc>> {
    let digits: String = raw
        .trim()
        .trim_start_matches("D:")
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .take(14)
        .collect();
    if digits.len() < 4 {
        return None;
    }
    const DEFAULTS: &str = "00000101000000";
    let padded = format!("{digits}{}", &DEFAULTS[digits.len()..]);
    NaiveDateTime::parse_from_str(&padded, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_full_pdf_date() {
        let dt = parse_pdf_date("D:20240317142530+02'00'").unwrap();
        assert_eq!(
            (dt.year(), dt.month(), dt.day()),
            (2024, 3, 17),
        );
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (14, 25, 30));
    }

    #[test]
    fn parses_date_without_prefix_or_time() {
        let dt = parse_pdf_date("20231105").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2023, 11, 5));
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn year_only_defaults_to_january_first() {
        let dt = parse_pdf_date("D:1998").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (1998, 1, 1));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_pdf_date("").is_none());
        assert!(parse_pdf_date("D:").is_none());
        assert!(parse_pdf_date("not a date").is_none());
        // Month 99 is not a real calendar date
        assert!(parse_pdf_date("D:20249917").is_none());
    }

    #[test]
    fn kind_parses_labels_and_backend_names() {
        assert_eq!(
            "mupdf".parse::<BackendKind>().unwrap(),
            BackendKind::HighFidelity
        );
        assert_eq!(
            "layout-aware".parse::<BackendKind>().unwrap(),
            BackendKind::LayoutAware
        );
        assert!("pdfminer".parse::<BackendKind>().is_err());
    }

    #[test]
    fn kind_order_is_the_preference_order() {
        assert!(BackendKind::HighFidelity < BackendKind::LayoutAware);
        assert!(BackendKind::LayoutAware < BackendKind::Basic);
    }
}
