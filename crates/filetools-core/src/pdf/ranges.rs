use super::PdfError;
use std::collections::BTreeSet;

/// Pages named by a tool option.
///
/// Index arrays are taken as given and checked by the page operation.
/// Range text is kept unparsed until the document's page count is known,
/// so a range can never reach past the last page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelection {
    /// Zero-based page indices in the caller's order
    Indices(Vec<usize>),
    /// 1-based range text such as `"1-3, 5"`
    Ranges(String),
}

impl PageSelection {
    /// Zero-based indices for a document with `page_count` pages
    pub fn resolve(&self, page_count: u32) -> Result<Vec<usize>, PdfError> {
        match self {
            PageSelection::Indices(indices) => Ok(indices.clone()),
            PageSelection::Ranges(text) => Ok(parse_ranges(text, page_count)?
                .into_iter()
                .map(|page| page as usize - 1)
                .collect()),
        }
    }
}

/// Resolve every selection against the same document
pub fn resolve_all(selections: &[PageSelection], page_count: u32) -> Result<Vec<Vec<usize>>, PdfError> {
    selections.iter().map(|s| s.resolve(page_count)).collect()
}

/// Page numbers named by text like `"1-3, 5, 8-10"`, ascending and without
/// repeats.
///
/// Numbers are 1-based and must fall within `1..=page_count`; bounds are
/// checked before a span is expanded.
pub fn parse_ranges(input: &str, page_count: u32) -> Result<Vec<u32>, PdfError> {
    let mut pages = BTreeSet::new();

    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (first, last) = match part.split_once('-') {
            Some((first, last)) => (page_number(first, page_count)?, page_number(last, page_count)?),
            None => {
                let page = page_number(part, page_count)?;
                (page, page)
            }
        };
        if first > last {
            return Err(PdfError::InvalidRange(format!(
                "'{}' runs backwards",
                part
            )));
        }
        pages.extend(first..=last);
    }

    if pages.is_empty() {
        return Err(PdfError::InvalidRange("no pages selected".into()));
    }
    Ok(pages.into_iter().collect())
}

fn page_number(raw: &str, page_count: u32) -> Result<u32, PdfError> {
    let raw = raw.trim();
    let page: u32 = raw
        .parse()
        .map_err(|_| PdfError::InvalidRange(format!("'{}' is not a page number", raw)))?;
    if page == 0 || page > page_count {
        return Err(PdfError::InvalidRange(format!(
            "page {} is outside 1-{}",
            page, page_count
        )));
    }
    Ok(page)
}
