//! PDF page manipulation: split, merge, and page extraction.
//!
//! All operations load the source document(s) fully into memory via lopdf,
//! build the result as a new document, and save it in one write. Inputs
//! are never modified.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

mod merge;

pub use merge::merge;

#[derive(Error, Debug)]
pub enum EditError {
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),
    #[error("invalid page range: {0}")]
    InvalidRange(String),
    #[error("no valid pages specified")]
    NoValidPages,
    #[error("at least 2 input files required for merging")]
    NotEnoughInputs,
    #[error("document has no page tree")]
    MissingPageTree,
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse page range expressions into 1-indexed page numbers.
///
/// Accepts single pages (`"3"`) and inclusive ranges (`"1-5"`). The result
/// keeps input order and duplicates; callers validate against a concrete
/// document with [`validate_pages`].
pub fn parse_ranges(ranges: &[String]) -> Result<Vec<usize>, EditError> {
    let mut pages = Vec::new();
    for expr in ranges {
        let expr = expr.trim();
        if let Some((start, end)) = expr.split_once('-') {
            let start: usize = start
                .trim()
                .parse()
                .map_err(|_| EditError::InvalidRange(expr.to_string()))?;
            let end: usize = end
                .trim()
                .parse()
                .map_err(|_| EditError::InvalidRange(expr.to_string()))?;
            if start == 0 || end < start {
                return Err(EditError::InvalidRange(expr.to_string()));
            }
            pages.extend(start..=end);
        } else {
            let page: usize = expr
                .parse()
                .map_err(|_| EditError::InvalidRange(expr.to_string()))?;
            if page == 0 {
                return Err(EditError::InvalidRange(expr.to_string()));
            }
            pages.push(page);
        }
    }
    Ok(pages)
}

/// Filter to in-bounds page numbers: ascending, deduplicated.
pub fn validate_pages(pages: &[usize], page_count: usize) -> Vec<usize> {
    let mut valid: Vec<usize> = pages
        .iter()
        .copied()
        .filter(|p| (1..=page_count).contains(p))
        .collect();
    valid.sort_unstable();
    valid.dedup();
    valid
}

pub fn page_count(path: &Path) -> Result<usize, EditError> {
    let doc = load_document(path)?;
    Ok(doc.get_pages().len())
}

/// Split a document into single-page files.
///
/// With `pages` set, only those pages are written (out-of-bounds numbers
/// dropped, an entirely invalid set is an error); otherwise every page
/// gets its own file. Returns the created paths in page order.
///
/// `output_pattern` supports `{stem}`, `{index}` (0-based output index)
/// and `{page}` (1-based source page number) placeholders.
pub fn split(
    input: &Path,
    output_pattern: &str,
    pages: Option<&[usize]>,
) -> Result<Vec<PathBuf>, EditError> {
    let source = load_document(input)?;
    let total = source.get_pages().len();

    let targets = match pages {
        Some(requested) => {
            let valid = validate_pages(requested, total);
            if valid.is_empty() {
                return Err(EditError::NoValidPages);
            }
            valid
        }
        None => (1..=total).collect(),
    };

    let stem = file_stem(input);
    let mut outputs = Vec::with_capacity(targets.len());

    for (index, page) in targets.iter().enumerate() {
        let output = format_output_path(output_pattern, &stem, index, *page);
        write_subset(&source, &[*page], &output)?;
        outputs.push(output);
    }

    info!(
        input = %input.display(),
        files = outputs.len(),
        "split complete"
    );
    Ok(outputs)
}

/// Extract a set of pages into one new document. Returns the number of
/// pages written.
pub fn extract_pages(
    input: &Path,
    output: &Path,
    pages: &[usize],
) -> Result<usize, EditError> {
    let source = load_document(input)?;
    let valid = validate_pages(pages, source.get_pages().len());
    if valid.is_empty() {
        return Err(EditError::NoValidPages);
    }

    write_subset(&source, &valid, output)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        pages = valid.len(),
        "pages extracted"
    );
    Ok(valid.len())
}

fn load_document(path: &Path) -> Result<lopdf::Document, EditError> {
    if !path.is_file() {
        return Err(EditError::InputNotFound(path.to_path_buf()));
    }
    Ok(lopdf::Document::load(path)?)
}

/// Write a copy of `source` holding only `keep` (1-indexed, ascending) to
/// `output`.
fn write_subset(
    source: &lopdf::Document,
    keep: &[usize],
    output: &Path,
) -> Result<(), EditError> {
    let mut doc = source.clone();

    let delete: Vec<u32> = (1..=source.get_pages().len() as u32)
        .filter(|n| !keep.contains(&(*n as usize)))
        .collect();
    doc.delete_pages(&delete);

    doc.prune_objects();
    doc.renumber_objects();
    doc.compress();
    doc.save(output)?;
    Ok(())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

fn format_output_path(pattern: &str, stem: &str, index: usize, page: usize) -> PathBuf {
    PathBuf::from(
        pattern
            .replace("{stem}", stem)
            .replace("{index}", &index.to_string())
            .replace("{page}", &page.to_string()),
    )
}
