//! PDF page operations
//!
//! All operations take PDF bytes and return new PDF bytes, using lopdf's
//! document object model:
//! - `merge_documents`: concatenate the pages of several documents
//! - `split_document` / `select_pages`: copy page subsets into new documents
//! - `rotate_pages`, `remove_pages`, `organize_pages`: page tree edits
//! - `add_watermark`, `add_page_numbers`: text stamped onto every page
//! - `compress_document`, `repair_document`, `document_info`: re-serialization
//!   and metadata

mod merge;
mod pages;
mod ranges;
mod split;
mod stamp;

pub use merge::merge_documents;
pub use pages::{organize_pages, page_rotation, remove_pages, rotate_pages};
pub use ranges::{parse_ranges, resolve_all, PageSelection};
pub use split::{select_pages, split_document};
pub use stamp::{add_page_numbers, add_watermark, NumberPosition, WatermarkStyle};

use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use thiserror::Error;

pub const PDF_MIME: &str = "application/pdf";

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Rotation must be a multiple of 90 degrees, got {0}")]
    InvalidRotation(i64),

    #[error("PDF is too corrupted to repair")]
    Unrepairable,
}

/// Attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

pub(crate) fn load(bytes: &[u8]) -> Result<Document, PdfError> {
    Document::load_mem(bytes).map_err(|e| PdfError::ParseError(e.to_string()))
}

pub(crate) fn save(doc: &mut Document) -> Result<Vec<u8>, PdfError> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfError::OperationError(format!("Failed to save PDF: {}", e)))?;
    Ok(buffer)
}

/// Page object ids in document order
pub(crate) fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Parse PDF bytes and return the page count
pub fn page_count(bytes: &[u8]) -> Result<u32, PdfError> {
    Ok(load(bytes)?.get_pages().len() as u32)
}

/// Look up an attribute on a page, walking up the `Parent` chain
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = Some(page_id);
    // Bounded walk; malformed trees can contain Parent cycles
    for _ in 0..64 {
        let id = current?;
        let dict = doc.get_dictionary(id).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// Copy inherited attributes onto the page itself so it survives re-parenting
pub(crate) fn materialize_inherited(doc: &mut Document, page_id: ObjectId) -> Result<(), PdfError> {
    let missing: Vec<(&[u8], Object)> = {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|e| PdfError::OperationError(e.to_string()))?;
        INHERITABLE_KEYS
            .iter()
            .filter(|key| !page.has(key))
            .filter_map(|key| inherited_attribute(doc, page_id, key).map(|v| (*key, v)))
            .collect()
    };

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|e| PdfError::OperationError(e.to_string()))?;
    for (key, value) in missing {
        page.set(key.to_vec(), value);
    }
    Ok(())
}

/// Id of the root `Pages` node
pub(crate) fn pages_root_id(doc: &Document) -> Result<ObjectId, PdfError> {
    let catalog = doc
        .catalog()
        .map_err(|_| PdfError::OperationError("No catalog in document".into()))?;
    catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| PdfError::OperationError("No Pages in catalog".into()))
}

/// Point the root `Pages` node at `page_refs`, re-parenting every page
pub(crate) fn rebuild_page_tree(doc: &mut Document, page_refs: &[ObjectId]) -> Result<(), PdfError> {
    let pages_id = pages_root_id(doc)?;

    for &page_id in page_refs {
        materialize_inherited(doc, page_id)?;
    }
    for &page_id in page_refs {
        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            page.set("Parent", Object::Reference(pages_id));
        }
    }

    let pages_dict = doc
        .get_dictionary_mut(pages_id)
        .map_err(|_| PdfError::OperationError("Invalid pages dictionary".into()))?;
    let kids = page_refs.iter().map(|&id| Object::Reference(id)).collect();
    pages_dict.set("Kids", Object::Array(kids));
    pages_dict.set("Count", Object::Integer(page_refs.len() as i64));
    Ok(())
}

/// Document metadata
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PdfInfo {
    pub page_count: u32,
    pub version: String,
    pub encrypted: bool,
    pub size_bytes: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
}

/// Read page count and info dictionary fields
pub fn document_info(bytes: &[u8]) -> Result<PdfInfo, PdfError> {
    let doc = load(bytes)?;
    let info = info_dictionary(&doc);
    let field = |key: &[u8]| info.and_then(|d| text_field(d, key));

    Ok(PdfInfo {
        page_count: doc.get_pages().len() as u32,
        version: doc.version.clone(),
        encrypted: doc.is_encrypted(),
        size_bytes: bytes.len(),
        title: field(b"Title"),
        author: field(b"Author"),
        subject: field(b"Subject"),
        creator: field(b"Creator"),
        producer: field(b"Producer"),
    })
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn text_field(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

/// Re-serialize the document without object streams.
///
/// Streams are written back as they were loaded: no content is re-encoded,
/// so the size reduction is limited to dropping unreachable objects.
pub fn compress_document(bytes: &[u8]) -> Result<Vec<u8>, PdfError> {
    let mut doc = load(bytes)?;
    save(&mut doc)
}

/// Reload, clear descriptive metadata and re-save
pub fn repair_document(bytes: &[u8]) -> Result<Vec<u8>, PdfError> {
    let mut doc = load(bytes).map_err(|_| PdfError::Unrepairable)?;

    let info_id = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };
    let info = match info_id {
        Some(id) => doc.get_dictionary_mut(id).ok(),
        None => match doc.trailer.get_mut(b"Info") {
            Ok(Object::Dictionary(dict)) => Some(dict),
            _ => None,
        },
    };
    if let Some(info) = info {
        for key in ["Title", "Author", "Subject", "Keywords"] {
            info.set(key, Object::string_literal(""));
        }
    }

    save(&mut doc).map_err(|_| PdfError::Unrepairable)
}

#[cfg(test)]
pub(crate) mod test_support {
    use lopdf::content::{Content, Operation};
    use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

    /// Create a PDF with N pages, each showing "<prefix>-Page-<n>"
    pub fn create_test_pdf(num_pages: u32, prefix: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let mut page_ids = Vec::new();
        for i in 0..num_pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new(
                        "Tf",
                        vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                    ),
                    Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            format!("{}-Page-{}", prefix, i + 1).into_bytes(),
                            lopdf::StringFormat::Literal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
            ]);
            page_ids.push(doc.add_object(page));
        }

        // MediaBox lives on the root so pages have to inherit it
        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(num_pages as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let info = Dictionary::from_iter(vec![
            ("Title", Object::string_literal(format!("{} title", prefix))),
            ("Author", Object::string_literal("Test Author")),
        ]);
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", Object::Reference(info_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    /// Labels ("<prefix>-Page-<n>") of each page, in document order
    pub fn page_labels(bytes: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(bytes).unwrap();
        let ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        ids.into_iter()
            .map(|id| {
                let content = doc.get_page_content(id).unwrap();
                let text = String::from_utf8_lossy(&content).into_owned();
                let start = text.find('(').unwrap() + 1;
                let end = text[start..].find(')').unwrap() + start;
                text[start..end].to_string()
            })
            .collect()
    }
}
