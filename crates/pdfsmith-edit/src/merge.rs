//! Document merging.
//!
//! Combines the object tables of every input into one document, rebuilds
//! a single page tree, and drops per-document outlines (their destinations
//! would dangle after renumbering).

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};
use tracing::info;

use crate::EditError;

pub fn merge(inputs: &[impl AsRef<Path>], output: &Path) -> Result<(), EditError> {
    if inputs.len() < 2 {
        return Err(EditError::NotEnoughInputs);
    }
    for input in inputs {
        if !input.as_ref().is_file() {
            return Err(EditError::InputNotFound(input.as_ref().to_path_buf()));
        }
    }

    let mut max_id = 1;
    let mut merged_pages: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut merged_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for input in inputs {
        let mut doc = Document::load(input.as_ref())?;
        // Shift object ids so documents cannot collide.
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, object_id) in doc.get_pages() {
            if let Ok(object) = doc.get_object(object_id) {
                merged_pages.insert(object_id, object.to_owned());
            }
        }
        merged_objects.extend(doc.objects);
    }

    let mut document = Document::with_version("1.5");
    let mut catalog: Option<(ObjectId, Object)> = None;
    let mut page_tree: Option<(ObjectId, Object)> = None;

    for (object_id, object) in merged_objects {
        match object.type_name().unwrap_or(b"") {
            b"Catalog" => {
                // Keep the first catalog's id; later ones are discarded.
                let id = catalog.as_ref().map(|(id, _)| *id).unwrap_or(object_id);
                catalog = Some((id, object));
            }
            b"Pages" => {
                if let Ok(dictionary) = object.as_dict() {
                    let mut dictionary = dictionary.clone();
                    if let Some((_, Object::Dictionary(existing))) = &page_tree {
                        for (key, value) in existing.iter() {
                            dictionary.set(key.clone(), value.clone());
                        }
                    }
                    let id = page_tree.as_ref().map(|(id, _)| *id).unwrap_or(object_id);
                    page_tree = Some((id, Object::Dictionary(dictionary)));
                }
            }
            // Pages are re-inserted below with a fixed parent; outlines
            // are dropped entirely.
            b"Page" | b"Outlines" | b"Outline" => {}
            _ => {
                document.objects.insert(object_id, object);
            }
        }
    }

    let (pages_id, pages_object) = page_tree.ok_or(EditError::MissingPageTree)?;
    let (catalog_id, catalog_object) = catalog.ok_or(EditError::MissingPageTree)?;

    for (object_id, object) in merged_pages.iter() {
        if let Ok(dictionary) = object.as_dict() {
            let mut dictionary = dictionary.clone();
            dictionary.set("Parent", pages_id);
            document
                .objects
                .insert(*object_id, Object::Dictionary(dictionary));
        }
    }

    if let Ok(dictionary) = pages_object.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Count", merged_pages.len() as u32);
        dictionary.set(
            "Kids",
            merged_pages
                .keys()
                .map(|id| Object::Reference(*id))
                .collect::<Vec<_>>(),
        );
        document
            .objects
            .insert(pages_id, Object::Dictionary(dictionary));
    }

    if let Ok(dictionary) = catalog_object.as_dict() {
        let mut dictionary = dictionary.clone();
        dictionary.set("Pages", pages_id);
        dictionary.remove(b"Outlines");
        document
            .objects
            .insert(catalog_id, Object::Dictionary(dictionary));
    }

    document.trailer.set("Root", catalog_id);
    document.max_id = document.objects.len() as u32;
    document.renumber_objects();
    document.compress();
    document.save(output)?;

    info!(
        inputs = inputs.len(),
        output = %output.display(),
        pages = merged_pages.len(),
        "merge complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_count;
    use crate::testutil::build_pdf;

    #[test]
    fn merges_page_trees_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.pdf");
        let second = dir.path().join("second.pdf");
        let output = dir.path().join("merged.pdf");
        build_pdf(&first, 2);
        build_pdf(&second, 3);

        merge(&[&first, &second], &output).unwrap();
        assert_eq!(page_count(&output).unwrap(), 5);

        let doc = Document::load(&output).unwrap();
        let text = doc.extract_text(&[1, 5]).unwrap();
        assert!(text.contains("Page 1"));
    }

    #[test]
    fn refuses_fewer_than_two_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let only = dir.path().join("only.pdf");
        build_pdf(&only, 1);

        let result = merge(&[&only], &dir.path().join("out.pdf"));
        assert!(matches!(result, Err(EditError::NotEnoughInputs)));
    }

    #[test]
    fn reports_missing_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.pdf");
        build_pdf(&real, 1);
        let missing = dir.path().join("missing.pdf");

        let result = merge(&[&real, &missing], &dir.path().join("out.pdf"));
        assert!(matches!(result, Err(EditError::InputNotFound(_))));
    }
}
