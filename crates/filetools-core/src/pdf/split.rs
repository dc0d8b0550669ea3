//! PDF split and page selection
//!
//! A selection keeps the requested pages in the requested order. The root
//! page tree is pointed at the selected pages and everything unreachable is
//! pruned.

use super::{load, page_ids, rebuild_page_tree, save, PdfError};
use lopdf::{Document, Object, ObjectId};
use std::collections::HashSet;

/// Split a PDF into one document per range of 0-based page indices.
///
/// Output order follows range order.
pub fn split_document(bytes: &[u8], ranges: &[Vec<usize>]) -> Result<Vec<Vec<u8>>, PdfError> {
    if ranges.is_empty() {
        return Err(PdfError::InvalidRange("No ranges specified".into()));
    }

    let doc = load(bytes)?;
    ranges
        .iter()
        .map(|range| select_from(doc.clone(), range))
        .collect()
}

/// Build a new document from the given 0-based page indices, in the given
/// order. Repeated indices produce independent page objects.
pub fn select_pages(bytes: &[u8], indices: &[usize]) -> Result<Vec<u8>, PdfError> {
    select_from(load(bytes)?, indices)
}

pub(crate) fn select_from(mut doc: Document, indices: &[usize]) -> Result<Vec<u8>, PdfError> {
    if indices.is_empty() {
        return Err(PdfError::InvalidRange("No pages specified".into()));
    }

    let pages = page_ids(&doc);
    let mut used = HashSet::new();
    let mut selected = Vec::with_capacity(indices.len());

    for &index in indices {
        let page_id = *pages.get(index).ok_or_else(|| {
            PdfError::InvalidRange(format!(
                "Page index {} out of range (document has {} pages)",
                index,
                pages.len()
            ))
        })?;

        if used.insert(page_id) {
            selected.push(page_id);
        } else {
            selected.push(duplicate_page(&mut doc, page_id)?);
        }
    }

    rebuild_page_tree(&mut doc, &selected)?;
    doc.prune_objects();
    doc.compress();

    save(&mut doc)
}

/// Copy a page dictionary into a new object. Content and resources stay shared.
fn duplicate_page(doc: &mut Document, page_id: ObjectId) -> Result<ObjectId, PdfError> {
    let page = doc
        .get_dictionary(page_id)
        .map_err(|e| PdfError::OperationError(e.to_string()))?
        .clone();
    Ok(doc.add_object(Object::Dictionary(page)))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{create_test_pdf, page_labels};
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_one_document_per_range() {
        let pdf = create_test_pdf(5, "Split");
        let parts = split_document(&pdf, &[vec![0, 1], vec![4], vec![2, 3]]).unwrap();

        assert_eq!(parts.len(), 3);
        assert_eq!(page_labels(&parts[0]), vec!["Split-Page-1", "Split-Page-2"]);
        assert_eq!(page_labels(&parts[1]), vec!["Split-Page-5"]);
        assert_eq!(page_labels(&parts[2]), vec!["Split-Page-3", "Split-Page-4"]);
    }

    #[test]
    fn test_split_rejects_out_of_range_index() {
        let pdf = create_test_pdf(2, "Split");
        let err = split_document(&pdf, &[vec![0, 2]]).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_split_rejects_empty_range() {
        let pdf = create_test_pdf(2, "Split");
        assert!(matches!(
            split_document(&pdf, &[vec![]]),
            Err(PdfError::InvalidRange(_))
        ));
        assert!(matches!(
            split_document(&pdf, &[]),
            Err(PdfError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let pdf = create_test_pdf(4, "Sel");
        let out = select_pages(&pdf, &[3, 0, 2]).unwrap();
        assert_eq!(
            page_labels(&out),
            vec!["Sel-Page-4", "Sel-Page-1", "Sel-Page-3"]
        );
    }

    #[test]
    fn test_select_duplicates_are_independent_pages() {
        let pdf = create_test_pdf(2, "Dup");
        let out = select_pages(&pdf, &[0, 0, 1]).unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let ids: HashSet<ObjectId> = doc.get_pages().into_values().collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(
            page_labels(&out),
            vec!["Dup-Page-1", "Dup-Page-1", "Dup-Page-2"]
        );
    }

    #[test]
    fn test_selected_pages_drop_unused_content() {
        let pdf = create_test_pdf(6, "Prune");
        let out = select_pages(&pdf, &[0]).unwrap();
        assert!(out.len() < pdf.len());
    }
}
