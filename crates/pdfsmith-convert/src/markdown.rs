//! Markdown rendering with light structure recovery.

use once_cell::sync::Lazy;
use regex::Regex;

use pdfsmith_core::ExtractionOutcome;

use crate::ConvertOptions;

static NUMBERED_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.?\s+").unwrap());
static BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*[•·▪▫\-*]\s*").unwrap());
static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(\d+)[\.)]\s*").unwrap());

pub(crate) fn render(outcome: &ExtractionOutcome, options: &ConvertOptions) -> String {
    let mut parts = Vec::new();

    if options.include_metadata {
        if let Some(title) = &outcome.metadata.title {
            parts.push(format!("# {title}"));
            parts.push(String::new());
        }

        let meta = &outcome.metadata;
        if meta.author.is_some() || meta.subject.is_some() || meta.page_count > 0 {
            parts.push("## Document Information".to_string());
            parts.push(String::new());
            if let Some(author) = &meta.author {
                parts.push(format!("**Author:** {author}"));
            }
            if let Some(subject) = &meta.subject {
                parts.push(format!("**Subject:** {subject}"));
            }
            if meta.page_count > 0 {
                parts.push(format!("**Pages:** {}", meta.page_count));
            }
            parts.push(String::new());
        }
    }

    if options.preserve_structure {
        parts.push(structure_content(&outcome.text));
    } else if options.include_page_numbers && outcome.pages.len() > 1 {
        for page in &outcome.pages {
            if page.text.trim().is_empty() {
                continue;
            }
            parts.push(format!("## Page {}", page.page_number));
            parts.push(String::new());
            parts.push(format_lists(&page.text));
            parts.push(String::new());
        }
    } else {
        parts.push(format_lists(&outcome.text));
    }

    parts.join("\n")
}

/// Turn short standalone paragraphs into headings: numbered sections
/// become second-level headings, all-caps and Title Case lines become
/// third-level ones. Everything else passes through list normalization.
fn structure_content(text: &str) -> String {
    let mut parts = Vec::new();

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let lines: Vec<&str> = paragraph.lines().collect();

        if lines.len() == 1 && lines[0].len() < 80 {
            let line = lines[0].trim();
            let word_count = line.split_whitespace().count();
            if NUMBERED_SECTION.is_match(line) {
                parts.push(format!("## {line}"));
            } else if is_all_caps(line) && word_count <= 8 {
                parts.push(format!("### {}", title_case(line)));
            } else if is_title_case(line) && word_count <= 8 {
                parts.push(format!("### {line}"));
            } else {
                parts.push(format_lists(paragraph));
            }
        } else {
            parts.push(format_lists(paragraph));
        }
        parts.push(String::new());
    }

    parts.join("\n")
}

/// Normalize bullet glyphs and numbered-list punctuation to markdown.
fn format_lists(text: &str) -> String {
    let text = BULLET.replace_all(text, "- ");
    NUMBERED_ITEM.replace_all(&text, "$1. ").into_owned()
}

fn is_all_caps(line: &str) -> bool {
    let mut saw_alpha = false;
    for c in line.chars() {
        if c.is_alphabetic() {
            saw_alpha = true;
            if c.is_lowercase() {
                return false;
            }
        }
    }
    saw_alpha
}

fn is_title_case(line: &str) -> bool {
    let mut words = line.split_whitespace().peekable();
    if words.peek().is_none() {
        return false;
    }
    words.all(|w| {
        w.chars()
            .next()
            .map(|c| c.is_uppercase() || !c.is_alphabetic())
            .unwrap_or(false)
    })
}

fn title_case(line: &str) -> String {
    line.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConvertOptions, sample_outcome};

    #[test]
    fn renders_metadata_header() {
        let output = render(&sample_outcome(), &ConvertOptions::default());
        assert!(output.starts_with("# Annual Report\n"));
        assert!(output.contains("## Document Information"));
        assert!(output.contains("**Author:** Jane Roe"));
        assert!(output.contains("**Pages:** 2"));
    }

    #[test]
    fn numbered_sections_become_headings() {
        let structured = structure_content("1. Introduction\n\nBody text goes here.");
        assert!(structured.contains("## 1. Introduction"));
        assert!(structured.contains("Body text goes here."));
    }

    #[test]
    fn all_caps_lines_become_title_cased_headings() {
        let structured = structure_content("EXECUTIVE SUMMARY\n\nDetails follow.");
        assert!(structured.contains("### Executive Summary"));
    }

    #[test]
    fn long_paragraphs_are_not_headings() {
        let long = "A sentence well past the heading length cutoff that keeps going and \
                    going until it is definitely body text.";
        let structured = structure_content(long);
        assert!(!structured.contains('#'));
    }

    #[test]
    fn bullets_are_normalized() {
        let formatted = format_lists("• first\n· second\n* third");
        assert_eq!(formatted, "- first\n- second\n- third");
    }

    #[test]
    fn numbered_items_are_normalized() {
        let formatted = format_lists("1) apples\n2. oranges");
        assert_eq!(formatted, "1. apples\n2. oranges");
    }
}
