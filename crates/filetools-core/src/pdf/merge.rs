//! Page concatenation
//!
//! Later documents are grafted onto the first one: their objects are
//! renumbered into the first document's id space, and every page is then
//! hung off a single flat page tree.

use super::{page_ids, rebuild_page_tree, save, PdfError};
use lopdf::{Document, Object, ObjectId};

/// Concatenate the pages of `documents`, in order, into one PDF.
///
/// A lone document comes back byte for byte. Otherwise each later document
/// has its object ids shifted above the ones already taken, its objects
/// copied across and its pages appended. The combined page list then
/// replaces the page tree; the source catalogs and page nodes left without
/// a reference are pruned before saving.
pub fn merge_documents(documents: &[Vec<u8>]) -> Result<Vec<u8>, PdfError> {
    let (first, rest) = documents
        .split_first()
        .ok_or_else(|| PdfError::OperationError("merge needs at least one document".into()))?;

    if rest.is_empty() {
        return Ok(first.clone());
    }

    let mut dest = load_numbered(first, 0)?;
    let mut dest_page_refs = page_ids(&dest);

    for (i, bytes) in rest.iter().enumerate() {
        let source = load_numbered(bytes, i + 1)?;
        let source_pages = page_ids(&source);
        let id_offset = dest.max_id;

        for (old_id, object) in source.objects {
            dest.objects
                .insert(shift_id(old_id, id_offset), remap_object_refs(object, id_offset));
        }
        dest_page_refs.extend(source_pages.into_iter().map(|id| shift_id(id, id_offset)));
        dest.max_id = source.max_id + id_offset;
    }

    rebuild_page_tree(&mut dest, &dest_page_refs)?;
    dest.prune_objects();
    dest.compress();

    save(&mut dest)
}

fn load_numbered(bytes: &[u8], index: usize) -> Result<Document, PdfError> {
    Document::load_mem(bytes).map_err(|e| {
        PdfError::ParseError(format!("input #{} is not a readable PDF: {}", index + 1, e))
    })
}

fn shift_id(id: ObjectId, offset: u32) -> ObjectId {
    (id.0 + offset, id.1)
}

/// Renumber every reference reachable inside `obj`
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference(shift_id(id, offset)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{create_test_pdf, page_labels};
    use super::*;

    #[test]
    fn test_merge_empty_fails() {
        let result = merge_documents(&[]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("at least one document"));
    }

    #[test]
    fn test_merge_single_document_returns_same() {
        let pdf = create_test_pdf(2, "Single");
        let result = merge_documents(&[pdf.clone()]).unwrap();
        assert_eq!(result, pdf);
    }

    #[test]
    fn test_merge_handles_different_sizes() {
        let docs = vec![
            create_test_pdf(10, "Large"),
            create_test_pdf(1, "Small"),
            create_test_pdf(5, "Medium"),
        ];
        let merged = merge_documents(&docs).unwrap();
        let doc = Document::load_mem(&merged).unwrap();
        assert_eq!(doc.get_pages().len(), 16);
    }

    #[test]
    fn test_merge_preserves_page_order() {
        let docs = vec![
            create_test_pdf(2, "First"),
            create_test_pdf(1, "Second"),
            create_test_pdf(2, "Third"),
        ];
        let merged = merge_documents(&docs).unwrap();
        assert_eq!(
            page_labels(&merged),
            vec![
                "First-Page-1",
                "First-Page-2",
                "Second-Page-1",
                "Third-Page-1",
                "Third-Page-2"
            ]
        );
    }

    #[test]
    fn test_merged_pages_keep_inherited_media_box() {
        let docs = vec![create_test_pdf(1, "A"), create_test_pdf(1, "B")];
        let merged = merge_documents(&docs).unwrap();
        let doc = Document::load_mem(&merged).unwrap();
        for (_, id) in doc.get_pages() {
            let page = doc.get_dictionary(id).unwrap();
            assert!(page.has(b"MediaBox"));
        }
    }

    #[test]
    fn test_merge_reports_bad_document_index() {
        let docs = vec![create_test_pdf(1, "Ok"), b"junk".to_vec()];
        let err = merge_documents(&docs).unwrap_err();
        assert!(err.to_string().contains("input #2"));
    }
}
