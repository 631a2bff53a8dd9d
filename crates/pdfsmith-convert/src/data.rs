//! Structured JSON and YAML rendering.

use chrono::Utc;
use serde_json::{Map, Value, json};

use pdfsmith_core::ExtractionOutcome;

use crate::{ConvertError, ConvertOptions};

pub(crate) fn render_json(
    outcome: &ExtractionOutcome,
    options: &ConvertOptions,
) -> Result<String, ConvertError> {
    let mut document = Map::new();

    document.insert(
        "extraction_info".to_string(),
        json!({
            "backend_used": outcome.backend_used,
            "extraction_time": outcome.elapsed.as_secs_f64(),
            "quality_score": outcome.quality_score,
            "extraction_date": Utc::now().to_rfc3339(),
        }),
    );

    if options.include_metadata {
        document.insert("metadata".to_string(), metadata_object(outcome));
    }

    let pages: Vec<Value> = outcome
        .pages
        .iter()
        .map(|page| {
            json!({
                "page_number": page.page_number,
                "text": page.text,
                "word_count": page.word_count,
                "char_count": page.char_count,
                "quality_score": page.quality_score,
                "has_images": page.has_images,
                "has_tables": page.has_tables,
            })
        })
        .collect();
    document.insert(
        "content".to_string(),
        json!({
            "full_text": outcome.text,
            "pages": pages,
        }),
    );

    serde_json::to_string_pretty(&json!({ "document": document }))
        .map_err(|e| ConvertError::Serialize(e.to_string()))
}

/// Metadata as a JSON object with absent fields dropped rather than
/// serialized as null.
fn metadata_object(outcome: &ExtractionOutcome) -> Value {
    let meta = &outcome.metadata;
    let mut map = Map::new();

    let mut insert_opt = |key: &str, value: &Option<String>| {
        if let Some(v) = value {
            map.insert(key.to_string(), Value::String(v.clone()));
        }
    };
    insert_opt("title", &meta.title);
    insert_opt("author", &meta.author);
    insert_opt("subject", &meta.subject);
    insert_opt("keywords", &meta.keywords);
    insert_opt("creator", &meta.creator);
    insert_opt("producer", &meta.producer);

    map.insert("page_count".to_string(), json!(meta.page_count));
    map.insert("file_size".to_string(), json!(meta.file_size));
    map.insert("is_encrypted".to_string(), json!(meta.encrypted));
    if let Some(date) = &meta.creation_date {
        map.insert("creation_date".to_string(), json!(date.to_rfc3339()));
    }
    if let Some(date) = &meta.modification_date {
        map.insert("modification_date".to_string(), json!(date.to_rfc3339()));
    }

    Value::Object(map)
}

pub(crate) fn render_yaml(
    outcome: &ExtractionOutcome,
    options: &ConvertOptions,
) -> Result<String, ConvertError> {
    let meta = &outcome.metadata;
    let mut document = Map::new();

    document.insert(
        "extraction_info".to_string(),
        json!({
            "backend": outcome.backend_used,
            "extraction_time_seconds": round2(outcome.elapsed.as_secs_f64()),
            "quality_score": round2(outcome.quality_score),
            "extracted_on": Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }),
    );

    if options.include_metadata {
        let mut metadata = Map::new();
        if let Some(title) = &meta.title {
            metadata.insert("title".to_string(), json!(title));
        }
        if let Some(author) = &meta.author {
            metadata.insert("author".to_string(), json!(author));
        }
        if let Some(subject) = &meta.subject {
            metadata.insert("subject".to_string(), json!(subject));
        }
        if meta.page_count > 0 {
            metadata.insert("pages".to_string(), json!(meta.page_count));
        }
        document.insert("metadata".to_string(), Value::Object(metadata));
    }

    document.insert(
        "content".to_string(),
        json!({
            "text": outcome.text,
            "statistics": {
                "total_pages": outcome.pages.len(),
                "total_words": outcome.pages.iter().map(|p| p.word_count).sum::<usize>(),
                "total_characters": outcome.pages.iter().map(|p| p.char_count).sum::<usize>(),
                "pages_with_images": outcome.pages.iter().filter(|p| p.has_images).count(),
                "pages_with_tables": outcome.pages.iter().filter(|p| p.has_tables).count(),
            },
        }),
    );

    if options.include_page_numbers {
        let pages: Vec<Value> = outcome.pages.iter().map(page_breakdown).collect();
        document.insert("pages".to_string(), Value::Array(pages));
    }

    serde_yaml::to_string(&json!({ "document": document }))
        .map_err(|e| ConvertError::Serialize(e.to_string()))
}

fn page_breakdown(page: &pdfsmith_core::PageRecord) -> Value {
    let mut features = Vec::new();
    if page.has_images {
        features.push("images");
    }
    if page.has_tables {
        features.push("tables");
    }

    let mut map = Map::new();
    map.insert("number".to_string(), json!(page.page_number));
    map.insert("words".to_string(), json!(page.word_count));
    map.insert("quality".to_string(), json!(round2(page.quality_score)));
    map.insert("features".to_string(), json!(features));

    // Full text for small pages, a preview for large ones.
    if page.char_count < 1000 {
        map.insert("text".to_string(), json!(page.text));
    } else {
        let preview: String = page.text.chars().take(200).collect();
        map.insert("text_preview".to_string(), json!(format!("{preview}...")));
    }

    Value::Object(map)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_outcome;

    #[test]
    fn json_output_is_well_formed() {
        let output = render_json(&sample_outcome(), &ConvertOptions::default()).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();

        let document = &parsed["document"];
        assert_eq!(document["extraction_info"]["backend_used"], "mupdf");
        assert_eq!(document["metadata"]["title"], "Annual Report");
        assert_eq!(document["content"]["pages"].as_array().unwrap().len(), 2);
        // Absent optional fields are dropped, not null.
        assert!(document["metadata"].get("producer").is_none());
    }

    #[test]
    fn json_respects_metadata_toggle() {
        let options = ConvertOptions {
            include_metadata: false,
            ..ConvertOptions::default()
        };
        let output = render_json(&sample_outcome(), &options).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert!(parsed["document"].get("metadata").is_none());
    }

    #[test]
    fn yaml_output_carries_statistics() {
        let output = render_yaml(&sample_outcome(), &ConvertOptions::default()).unwrap();
        let parsed: Value = serde_yaml::from_str(&output).unwrap();

        let stats = &parsed["document"]["content"]["statistics"];
        assert_eq!(stats["total_pages"], 2);
        assert_eq!(stats["pages_with_images"], 1);
    }

    #[test]
    fn yaml_page_breakdown_previews_long_pages() {
        let mut outcome = sample_outcome();
        outcome.pages[0] =
            pdfsmith_core::PageRecord::from_content(1, "word ".repeat(300), 0);
        let options = ConvertOptions {
            include_page_numbers: true,
            ..ConvertOptions::default()
        };
        let output = render_yaml(&outcome, &options).unwrap();
        let parsed: Value = serde_yaml::from_str(&output).unwrap();

        let pages = parsed["document"]["pages"].as_array().unwrap();
        assert!(pages[0].get("text").is_none());
        let preview = pages[0]["text_preview"].as_str().unwrap();
        assert!(preview.ends_with("..."));
        assert!(preview.chars().count() == 203);
        // The short page keeps its full text.
        assert!(pages[1].get("text").is_some());
    }

    #[test]
    fn round2_truncates_to_two_decimals() {
        assert_eq!(round2(0.12345), 0.12);
        assert_eq!(round2(0.999), 1.0);
    }
}
