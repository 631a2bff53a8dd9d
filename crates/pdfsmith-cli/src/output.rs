use std::io::Write;

use owo_colors::OwoColorize;
use pdfsmith_core::{BackendKind, ExtractionOutcome};
use pdfsmith_generate::Engine;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// One regex hit inside an extracted document.
#[derive(Debug)]
pub struct SearchMatch {
    pub page: usize,
    pub line: usize,
    pub text: String,
}

/// Print the one-line summary after a successful extraction.
pub fn print_extraction_summary(
    w: &mut dyn Write,
    outcome: &ExtractionOutcome,
    color: ColorMode,
) -> std::io::Result<()> {
    let line = format!(
        "Extracted {} pages with {} in {:.2}s",
        outcome.pages.len(),
        outcome.backend_used,
        outcome.elapsed.as_secs_f64()
    );
    if color.enabled() {
        writeln!(w, "{}", line.dimmed())?;
        write!(w, "{}", "Quality: ".dimmed())?;
        print_score(w, outcome.quality_score, color)?;
        writeln!(w)?;
    } else {
        writeln!(w, "{}", line)?;
        writeln!(w, "Quality: {:.2}", outcome.quality_score)?;
    }
    Ok(())
}

/// Print document metadata and extraction statistics.
pub fn print_info(
    w: &mut dyn Write,
    outcome: &ExtractionOutcome,
    verbose: bool,
    color: ColorMode,
) -> std::io::Result<()> {
    let m = &outcome.metadata;

    print_field(w, "Title", m.title.as_deref(), color)?;
    print_field(w, "Author", m.author.as_deref(), color)?;
    print_field(w, "Subject", m.subject.as_deref(), color)?;
    print_field(w, "Keywords", m.keywords.as_deref(), color)?;
    print_field(w, "Creator", m.creator.as_deref(), color)?;
    print_field(w, "Producer", m.producer.as_deref(), color)?;

    let created = m
        .creation_date
        .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    let modified = m
        .modification_date
        .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    print_field(w, "Created", created.as_deref(), color)?;
    print_field(w, "Modified", modified.as_deref(), color)?;
    print_field(w, "PDF version", m.version.as_deref(), color)?;

    print_field(w, "Pages", Some(&m.page_count.to_string()), color)?;
    print_field(w, "File size", Some(&format_size(m.file_size)), color)?;
    if m.encrypted {
        if color.enabled() {
            writeln!(w, "{:<14}{}", "Encrypted:".bold(), "yes".yellow())?;
        } else {
            writeln!(w, "{:<14}yes", "Encrypted:")?;
        }
    }

    writeln!(w)?;
    if color.enabled() {
        writeln!(w, "{:<14}{}", "Backend:".bold(), outcome.backend_used)?;
        write!(w, "{:<14}", "Quality:".bold())?;
        print_score(w, outcome.quality_score, color)?;
        writeln!(w)?;
    } else {
        writeln!(w, "{:<14}{}", "Backend:", outcome.backend_used)?;
        writeln!(w, "{:<14}{:.2}", "Quality:", outcome.quality_score)?;
    }

    if verbose {
        writeln!(w)?;
        for page in &outcome.pages {
            let mut notes = Vec::new();
            if page.has_images {
                notes.push("images");
            }
            if page.has_tables {
                notes.push("tables");
            }
            let notes = if notes.is_empty() {
                String::new()
            } else {
                format!(" [{}]", notes.join(", "))
            };
            let line = format!(
                "  page {:>3}: {:>5} words, {:>6} chars, score {:.2}{}",
                page.page_number, page.word_count, page.char_count, page.quality_score, notes
            );
            if color.enabled() {
                writeln!(w, "{}", line.dimmed())?;
            } else {
                writeln!(w, "{}", line)?;
            }
        }
    }
    Ok(())
}

fn print_field(
    w: &mut dyn Write,
    label: &str,
    value: Option<&str>,
    color: ColorMode,
) -> std::io::Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if color.enabled() {
        writeln!(w, "{:<14}{}", format!("{label}:").bold(), value)?;
    } else {
        writeln!(w, "{:<14}{}", format!("{label}:"), value)?;
    }
    Ok(())
}

/// Print search hits grouped under their page.
pub fn print_search_results(
    w: &mut dyn Write,
    pattern: &str,
    matches: &[SearchMatch],
    color: ColorMode,
) -> std::io::Result<()> {
    if matches.is_empty() {
        writeln!(w, "No matches for \"{}\"", pattern)?;
        return Ok(());
    }

    let mut current_page = 0;
    for m in matches {
        if m.page != current_page {
            current_page = m.page;
            if color.enabled() {
                writeln!(w, "{}", format!("Page {}", m.page).bold())?;
            } else {
                writeln!(w, "Page {}", m.page)?;
            }
        }
        if color.enabled() {
            writeln!(w, "  {}: {}", m.line.to_string().dimmed(), m.text)?;
        } else {
            writeln!(w, "  {}: {}", m.line, m.text)?;
        }
    }
    writeln!(w)?;
    let summary = format!("{} matches on {} pages", matches.len(), pages_hit(matches));
    if color.enabled() {
        writeln!(w, "{}", summary.dimmed())?;
    } else {
        writeln!(w, "{}", summary)?;
    }
    Ok(())
}

fn pages_hit(matches: &[SearchMatch]) -> usize {
    let mut pages: Vec<usize> = matches.iter().map(|m| m.page).collect();
    pages.dedup();
    pages.len()
}

/// List extraction backends with availability markers.
pub fn print_backend_statuses(
    w: &mut dyn Write,
    statuses: &[(&'static str, BackendKind, bool)],
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "Extraction backends (preference order):")?;
    for (name, kind, available) in statuses {
        print_status_line(w, name, kind.label(), *available, color)?;
    }
    Ok(())
}

/// List typesetting engines with availability markers.
pub fn print_engine_statuses(
    w: &mut dyn Write,
    statuses: &[(Engine, bool)],
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "PDF generation engines (preference order):")?;
    for (engine, available) in statuses {
        print_status_line(w, engine.name(), engine.description(), *available, color)?;
    }
    Ok(())
}

fn print_status_line(
    w: &mut dyn Write,
    name: &str,
    detail: &str,
    available: bool,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        if available {
            writeln!(w, "  {} {:<12} {}", "ok".green(), name.bold(), detail.dimmed())?;
        } else {
            writeln!(w, "  {} {:<12} {}", "--".red(), name, detail.dimmed())?;
        }
    } else if available {
        writeln!(w, "  ok {:<12} {}", name, detail)?;
    } else {
        writeln!(w, "  -- {:<12} {}", name, detail)?;
    }
    Ok(())
}

fn print_score(w: &mut dyn Write, score: f64, color: ColorMode) -> std::io::Result<()> {
    let text = format!("{:.2}", score);
    if color.enabled() {
        if score >= 0.8 {
            write!(w, "{}", text.green())?;
        } else if score >= 0.5 {
            write!(w, "{}", text.yellow())?;
        } else {
            write!(w, "{}", text.red())?;
        }
    } else {
        write!(w, "{}", text)?;
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_humanized() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn counts_distinct_pages() {
        let matches = vec![
            SearchMatch {
                page: 1,
                line: 2,
                text: "a".into(),
            },
            SearchMatch {
                page: 1,
                line: 5,
                text: "b".into(),
            },
            SearchMatch {
                page: 3,
                line: 1,
                text: "c".into(),
            },
        ];
        assert_eq!(pages_hit(&matches), 2);
    }
}
