use std::path::Path;

use tracing::debug;

use pdfsmith_core::DocumentMetadata;
use pdfsmith_core::backend::{
    BackendError, BackendKind, DocumentHandle, PageContent, PdfBackend, parse_pdf_date,
};

/// Backend built on the pure-Rust `lopdf` crate.
///
/// Lowest extraction tier: raw content-stream decoding with no layout
/// reconstruction, so multi-column text comes out interleaved. In exchange
/// it is the only backend that reads the full information dictionary and
/// counts image XObjects per page.
#[derive(Default)]
pub struct LopdfBackend;

impl LopdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for LopdfBackend {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Basic
    }

    fn probe(&self) -> bool {
        // Pure Rust, no runtime linkage to verify.
        true
    }

    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>, BackendError> {
        let document =
            lopdf::Document::load(path).map_err(|e| BackendError::Open(e.to_string()))?;

        // get_pages returns a BTreeMap with 1-based page numbers as keys.
        let page_ids: Vec<lopdf::ObjectId> = document.get_pages().values().copied().collect();

        Ok(Box::new(LopdfHandle { document, page_ids }))
    }
}

struct LopdfHandle {
    document: lopdf::Document,
    page_ids: Vec<lopdf::ObjectId>,
}

impl DocumentHandle for LopdfHandle {
    fn metadata(&self) -> DocumentMetadata {
        let info = info_dictionary(&self.document);

        let field = |key: &[u8]| {
            info.and_then(|dict| extract_string_from_dict(&self.document, dict, key))
        };

        DocumentMetadata {
            title: field(b"Title"),
            author: field(b"Author"),
            subject: field(b"Subject"),
            keywords: field(b"Keywords"),
            creator: field(b"Creator"),
            producer: field(b"Producer"),
            creation_date: field(b"CreationDate").and_then(|d| parse_pdf_date(&d)),
            modification_date: field(b"ModDate").and_then(|d| parse_pdf_date(&d)),
            page_count: self.page_ids.len(),
            file_size: 0,
            encrypted: self.document.is_encrypted(),
            linearized: false,
            version: Some(self.document.version.clone()),
        }
    }

    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page(&self, number: usize) -> Result<PageContent, BackendError> {
        let page_id = self
            .page_ids
            .get(number - 1)
            .copied()
            .ok_or(BackendError::Page {
                page: number,
                message: "page out of range".into(),
            })?;

        let text = self
            .document
            .extract_text(&[number as u32])
            .map_err(|e| BackendError::Page {
                page: number,
                message: e.to_string(),
            })?;

        let image_count = count_page_images(&self.document, page_id);

        Ok(PageContent { text, image_count })
    }
}

/// Resolve the trailer's /Info entry to a dictionary, tolerating its
/// absence and any malformed shape.
fn info_dictionary(doc: &lopdf::Document) -> Option<&lopdf::Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        lopdf::Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok(),
        lopdf::Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Extract a string value from a lopdf dictionary, handling both String
/// and Name objects. PDF text strings are UTF-16 BE when they carry the
/// `0xFE 0xFF` BOM, otherwise UTF-8 with a Latin-1 fallback.
fn extract_string_from_dict(
    doc: &lopdf::Document,
    dict: &lopdf::Dictionary,
    key: &[u8],
) -> Option<String> {
    let obj = dict.get(key).ok()?;
    let obj = match obj {
        lopdf::Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    match obj {
        lopdf::Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        lopdf::Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let chars: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter(|c| c.len() == 2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&chars)
    } else {
        match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => bytes.iter().map(|&b| b as char).collect(),
        }
    }
}

/// Look up a key in the page dictionary, walking up the page tree via
/// /Parent when the key is inherited rather than set on the page itself.
fn resolve_inherited<'a>(
    doc: &'a lopdf::Document,
    page_id: lopdf::ObjectId,
    key: &[u8],
) -> Option<&'a lopdf::Object> {
    let mut current_id = page_id;
    // Bounded walk in case of a cyclic page tree.
    for _ in 0..64 {
        let dict = doc.get_object(current_id).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// Count image XObjects referenced from a page's resources. Any failure
/// along the way reads as zero images; this feeds a heuristic flag, not a
/// hard guarantee.
fn count_page_images(doc: &lopdf::Document, page_id: lopdf::ObjectId) -> usize {
    let Some(resources) = resolve_inherited(doc, page_id, b"Resources") else {
        return 0;
    };
    let resources = match resources {
        lopdf::Object::Reference(id) => match doc.get_object(*id) {
            Ok(obj) => obj,
            Err(e) => {
                debug!(error = %e, "unresolvable /Resources reference");
                return 0;
            }
        },
        other => other,
    };
    let Ok(resources) = resources.as_dict() else {
        return 0;
    };
    let Ok(xobjects) = resources.get(b"XObject") else {
        return 0;
    };
    let xobjects = match xobjects {
        lopdf::Object::Reference(id) => match doc.get_object(*id) {
            Ok(obj) => obj,
            Err(_) => return 0,
        },
        other => other,
    };
    let Ok(xobjects) = xobjects.as_dict() else {
        return 0;
    };

    xobjects
        .iter()
        .filter(|(_, obj)| {
            let obj = match obj {
                lopdf::Object::Reference(id) => match doc.get_object(*id) {
                    Ok(resolved) => resolved,
                    Err(_) => return false,
                },
                other => other,
            };
            obj.as_stream()
                .ok()
                .and_then(|s| s.dict.get(b"Subtype").ok())
                .and_then(|sub| sub.as_name().ok())
                .is_some_and(|name| name == b"Image".as_slice())
        })
        .count()
}
