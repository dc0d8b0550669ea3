//! Page tree edits: rotate, remove, organize

use super::split::select_from;
use super::{inherited_attribute, load, page_ids, save, PdfError};
use lopdf::Object;
use std::collections::BTreeSet;

/// Add `degrees` to every page's rotation.
///
/// The delta must be a multiple of 90. The current rotation includes values
/// inherited from the page tree; the result is normalised into `0..360`.
pub fn rotate_pages(bytes: &[u8], degrees: i64) -> Result<Vec<u8>, PdfError> {
    if degrees % 90 != 0 {
        return Err(PdfError::InvalidRotation(degrees));
    }

    let mut doc = load(bytes)?;
    for page_id in page_ids(&doc) {
        let current = inherited_attribute(&doc, page_id, b"Rotate")
            .and_then(|r| r.as_i64().ok())
            .unwrap_or(0);
        let rotation = (current + degrees).rem_euclid(360);

        let page = doc
            .get_dictionary_mut(page_id)
            .map_err(|e| PdfError::OperationError(e.to_string()))?;
        page.set("Rotate", Object::Integer(rotation));
    }

    save(&mut doc)
}

/// Effective rotation of a page (0-based index), following inheritance
pub fn page_rotation(bytes: &[u8], index: usize) -> Result<i64, PdfError> {
    let doc = load(bytes)?;
    let page_id = *page_ids(&doc)
        .get(index)
        .ok_or_else(|| PdfError::InvalidRange(format!("Page index {} out of range", index)))?;
    Ok(inherited_attribute(&doc, page_id, b"Rotate")
        .and_then(|r| r.as_i64().ok())
        .unwrap_or(0))
}

/// Delete pages by 0-based index. Removing every page is an error.
pub fn remove_pages(bytes: &[u8], indices: &[usize]) -> Result<Vec<u8>, PdfError> {
    let mut doc = load(bytes)?;
    let page_count = doc.get_pages().len();

    let to_delete: BTreeSet<usize> = indices.iter().copied().collect();
    if let Some(&bad) = to_delete.iter().find(|&&i| i >= page_count) {
        return Err(PdfError::InvalidRange(format!(
            "Page index {} out of range (document has {} pages)",
            bad, page_count
        )));
    }
    if to_delete.len() >= page_count {
        return Err(PdfError::InvalidRange("Cannot remove every page".into()));
    }

    // Delete high-to-low so the remaining page numbers stay valid
    for index in to_delete.into_iter().rev() {
        doc.delete_pages(&[index as u32 + 1]);
    }

    doc.prune_objects();
    doc.compress();
    save(&mut doc)
}

/// Rebuild the document with pages in `order` (0-based, duplicates allowed)
pub fn organize_pages(bytes: &[u8], order: &[usize]) -> Result<Vec<u8>, PdfError> {
    select_from(load(bytes)?, order)
}
