//! XML re-indentation and well-formedness checks

use super::{text, DocumentError, TEXT_MIME, XML_MIME};
use crate::file::Blob;
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

/// Tracks element nesting to catch what the tokenizer lets through:
/// unclosed elements, a missing root and content after the root
#[derive(Default)]
struct Structure {
    depth: usize,
    root_closed: bool,
}

impl Structure {
    fn open(&mut self, name: &[u8]) -> Result<(), DocumentError> {
        if self.depth == 0 && self.root_closed {
            return Err(DocumentError::InvalidXml(format!(
                "element <{}> after the root element",
                String::from_utf8_lossy(name)
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.root_closed = true;
        }
    }

    fn text(&self, content: &[u8]) -> Result<(), DocumentError> {
        if self.depth == 0 && !content.iter().all(u8::is_ascii_whitespace) {
            return Err(DocumentError::InvalidXml(
                "text outside the root element".into(),
            ));
        }
        Ok(())
    }

    fn finish(&self) -> Result<(), DocumentError> {
        if self.depth > 0 {
            Err(DocumentError::InvalidXml(format!(
                "{} unclosed element(s) at end of document",
                self.depth
            )))
        } else if !self.root_closed {
            Err(DocumentError::InvalidXml("no root element".into()))
        } else {
            Ok(())
        }
    }
}

/// Walk every event, checking structure and handing each one to `sink`
fn walk<F>(input: &str, mut sink: F) -> Result<(), DocumentError>
where
    F: FnMut(Event<'_>) -> Result<(), DocumentError>,
{
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);
    let mut structure = Structure::default();

    loop {
        let event = reader.read_event().map_err(|e| {
            DocumentError::InvalidXml(format!(
                "{} at position {}",
                e,
                reader.error_position()
            ))
        })?;
        match &event {
            Event::Eof => break,
            Event::Start(start) => structure.open(start.name().as_ref())?,
            Event::Empty(empty) => {
                structure.open(empty.name().as_ref())?;
                structure.close();
            }
            Event::End(_) => structure.close(),
            Event::Text(content) => structure.text(content)?,
            Event::CData(_) => structure.text(b"cdata")?,
            _ => {}
        }
        sink(event)?;
    }

    structure.finish()
}

/// Re-indent with two spaces per level
pub fn format_xml(bytes: &[u8]) -> Result<Blob, DocumentError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    walk(text(bytes)?, |event| {
        writer
            .write_event(event)
            .map_err(|e| DocumentError::InvalidXml(e.to_string()))
    })?;
    Ok(Blob::new(writer.into_inner(), XML_MIME))
}

/// `Valid XML` as plain text, or the first problem found as the error
pub fn validate_xml(bytes: &[u8]) -> Result<Blob, DocumentError> {
    walk(text(bytes)?, |_| Ok(()))?;
    Ok(Blob::text("Valid XML", TEXT_MIME))
}
