//! Standalone HTML rendering.

use pdfsmith_core::ExtractionOutcome;

use crate::ConvertOptions;

const STYLES: &str = "\
        body { font-family: Arial, sans-serif; line-height: 1.6; margin: 40px; max-width: 800px; }
        .metadata { background: #f5f5f5; padding: 20px; border-radius: 5px; margin-bottom: 30px; }
        .page { margin-bottom: 30px; padding-bottom: 20px; border-bottom: 1px solid #eee; }
        .page-header { font-weight: bold; color: #666; margin-bottom: 10px; }
        .content { white-space: pre-wrap; }";

pub(crate) fn render(outcome: &ExtractionOutcome, options: &ConvertOptions) -> String {
    let mut parts = Vec::new();

    let title = outcome
        .metadata
        .title
        .as_deref()
        .unwrap_or("PDF Document");

    parts.push("<!DOCTYPE html>".to_string());
    parts.push("<html lang=\"en\">".to_string());
    parts.push("<head>".to_string());
    parts.push("    <meta charset=\"UTF-8\">".to_string());
    parts.push(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">"
            .to_string(),
    );
    parts.push(format!("    <title>{}</title>", escape(title)));
    parts.push("    <style>".to_string());
    parts.push(STYLES.to_string());
    parts.push("    </style>".to_string());
    parts.push("</head>".to_string());
    parts.push("<body>".to_string());

    if options.include_metadata {
        parts.push("    <div class=\"metadata\">".to_string());
        if let Some(title) = &outcome.metadata.title {
            parts.push(format!("        <h1>{}</h1>", escape(title)));
        }

        let mut items = Vec::new();
        if let Some(author) = &outcome.metadata.author {
            items.push(format!("<strong>Author:</strong> {}", escape(author)));
        }
        if let Some(subject) = &outcome.metadata.subject {
            items.push(format!("<strong>Subject:</strong> {}", escape(subject)));
        }
        if outcome.metadata.page_count > 0 {
            items.push(format!(
                "<strong>Pages:</strong> {}",
                outcome.metadata.page_count
            ));
        }
        if !items.is_empty() {
            parts.push(format!("        <p>{}</p>", items.join(" | ")));
        }
        parts.push("    </div>".to_string());
    }

    if options.include_page_numbers && outcome.pages.len() > 1 {
        for page in &outcome.pages {
            if page.text.trim().is_empty() {
                continue;
            }
            parts.push("    <div class=\"page\">".to_string());
            parts.push(format!(
                "        <div class=\"page-header\">Page {}</div>",
                page.page_number
            ));
            parts.push(format!(
                "        <div class=\"content\">{}</div>",
                escape(&page.text)
            ));
            parts.push("    </div>".to_string());
        }
    } else {
        parts.push("    <div class=\"content\">".to_string());
        parts.push(format!("        {}", escape(&outcome.text)));
        parts.push("    </div>".to_string());
    }

    parts.push("</body>".to_string());
    parts.push("</html>".to_string());

    parts.join("\n")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
