//! Text stamped onto every page: watermarks and page numbers
//!
//! The page's existing content is wrapped in `q ... Q` and a new content
//! stream is appended, so the stamp draws on top with a clean graphics state.
//! Page resources are copied inline before the stamp's font and graphics
//! state are added, leaving resources shared with other pages untouched.

use super::{load, materialize_inherited, page_ids, save, PdfError};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use serde::{Deserialize, Serialize};

const STAMP_FONT: &str = "FtStamp";
const STAMP_STATE: &str = "GsStamp";

/// Watermark appearance
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkStyle {
    pub opacity: f32,
    pub font_size: f32,
    /// Counter-clockwise, in degrees
    pub rotation: f32,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            opacity: 0.3,
            font_size: 48.0,
            rotation: 45.0,
        }
    }
}

/// Where page numbers are drawn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberPosition {
    BottomLeft,
    #[default]
    BottomCenter,
    BottomRight,
}

impl NumberPosition {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bottom-left" => Some(Self::BottomLeft),
            "bottom-center" => Some(Self::BottomCenter),
            "bottom-right" => Some(Self::BottomRight),
            _ => None,
        }
    }

    fn x(self, page_width: f32) -> f32 {
        match self {
            Self::BottomLeft => 30.0,
            Self::BottomCenter => page_width / 2.0 - 10.0,
            Self::BottomRight => page_width - 50.0,
        }
    }
}

/// Draw `text` across the centre of every page
pub fn add_watermark(bytes: &[u8], text: &str, style: &WatermarkStyle) -> Result<Vec<u8>, PdfError> {
    if text.trim().is_empty() {
        return Err(PdfError::OperationError("Watermark text is empty".into()));
    }
    if !(0.0..=1.0).contains(&style.opacity) {
        return Err(PdfError::OperationError(format!(
            "Opacity {} is outside 0..1",
            style.opacity
        )));
    }

    let mut doc = load(bytes)?;
    for page_id in page_ids(&doc) {
        let (width, height) = page_size(&doc, page_id);
        let x = width / 2.0 - text.chars().count() as f32 * style.font_size / 4.0;
        let y = height / 2.0;
        let ops = text_operations(text, style.font_size, x, y, style.rotation, true);
        stamp_page(&mut doc, page_id, ops, Some(style.opacity))?;
    }

    save(&mut doc)
}

/// Number every page, starting at `start_from`
pub fn add_page_numbers(
    bytes: &[u8],
    position: NumberPosition,
    start_from: i64,
) -> Result<Vec<u8>, PdfError> {
    let mut doc = load(bytes)?;
    for (index, page_id) in page_ids(&doc).into_iter().enumerate() {
        let (width, _) = page_size(&doc, page_id);
        let label = (index as i64 + start_from).to_string();
        let ops = text_operations(&label, 12.0, position.x(width), 30.0, 0.0, false);
        stamp_page(&mut doc, page_id, ops, None)?;
    }

    save(&mut doc)
}

fn text_operations(
    text: &str,
    font_size: f32,
    x: f32,
    y: f32,
    rotation: f32,
    translucent: bool,
) -> Vec<Operation> {
    let (sin, cos) = rotation.to_radians().sin_cos();
    let mut ops = Vec::new();
    if translucent {
        ops.push(Operation::new("gs", vec![Object::Name(STAMP_STATE.into())]));
    }
    ops.extend([
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(STAMP_FONT.into()), Object::Real(font_size)],
        ),
        Operation::new("g", vec![Object::Real(0.5)]),
        Operation::new(
            "Tm",
            vec![
                Object::Real(cos),
                Object::Real(sin),
                Object::Real(-sin),
                Object::Real(cos),
                Object::Real(x),
                Object::Real(y),
            ],
        ),
        Operation::new(
            "Tj",
            vec![Object::String(win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]);
    ops
}

/// Encode text for the stamp font's WinAnsi encoding. Characters outside
/// the code page become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => win_ansi_extra(c).unwrap_or(b'?'),
        })
        .collect()
}

/// Code points WinAnsi places in 0x80..=0x9F
fn win_ansi_extra(c: char) -> Option<u8> {
    let byte = match c {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '•' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Width and height from the (possibly inherited) MediaBox, US Letter if absent
fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let media_box = super::inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(|obj| match obj {
            Object::Reference(id) => doc.get_object(id).ok().cloned(),
            other => Some(other),
        })
        .and_then(|obj| obj.as_array().ok().cloned())
        .map(|values| values.iter().filter_map(number).collect::<Vec<f32>>());

    match media_box.as_deref() {
        Some([x0, y0, x1, y1]) => ((x1 - x0).abs(), (y1 - y0).abs()),
        _ => (612.0, 792.0),
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn stamp_page(
    doc: &mut Document,
    page_id: ObjectId,
    ops: Vec<Operation>,
    opacity: Option<f32>,
) -> Result<(), PdfError> {
    materialize_inherited(doc, page_id)?;

    let resources = stamp_resources(doc, page_id, opacity)?;
    let stamp = Content { operations: ops }
        .encode()
        .map_err(|e| PdfError::OperationError(format!("Failed to encode stamp: {}", e)))?;

    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let mut tail = b"Q\n".to_vec();
    tail.extend(stamp);
    let stamp_id = doc.add_object(Stream::new(Dictionary::new(), tail));

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|e| PdfError::OperationError(e.to_string()))?;

    let mut contents = vec![Object::Reference(save_id)];
    match page.get(b"Contents") {
        Ok(Object::Array(existing)) => contents.extend(existing.iter().cloned()),
        Ok(existing) => contents.push(existing.clone()),
        Err(_) => {}
    }
    contents.push(Object::Reference(stamp_id));

    page.set("Contents", Object::Array(contents));
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// The page's resources as an owned dictionary with the stamp font and
/// graphics state added
fn stamp_resources(
    doc: &Document,
    page_id: ObjectId,
    opacity: Option<f32>,
) -> Result<Dictionary, PdfError> {
    let page = doc
        .get_dictionary(page_id)
        .map_err(|e| PdfError::OperationError(e.to_string()))?;

    let mut resources = match page.get(b"Resources") {
        Ok(obj) => resolve_dict(doc, obj).unwrap_or_default(),
        Err(_) => Dictionary::new(),
    };

    let mut fonts = resources
        .get(b"Font")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
        .unwrap_or_default();
    fonts.set(
        STAMP_FONT,
        dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        },
    );
    resources.set("Font", fonts);

    if let Some(opacity) = opacity {
        let mut states = resources
            .get(b"ExtGState")
            .ok()
            .and_then(|obj| resolve_dict(doc, obj))
            .unwrap_or_default();
        states.set(
            STAMP_STATE,
            dictionary! {
                "Type" => "ExtGState",
                "ca" => opacity,
                "CA" => opacity,
            },
        );
        resources.set("ExtGState", states);
    }

    Ok(resources)
}

fn resolve_dict(doc: &Document, obj: &Object) -> Option<Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict.clone()),
        Object::Reference(id) => doc.get_dictionary(*id).ok().cloned(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::create_test_pdf;
    use super::*;

    fn page_text(bytes: &[u8], index: usize) -> String {
        let doc = Document::load_mem(bytes).unwrap();
        let id = page_ids(&doc)[index];
        String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned()
    }

    #[test]
    fn test_watermark_drawn_on_every_page() {
        let pdf = create_test_pdf(3, "Wm");
        let out = add_watermark(&pdf, "CONFIDENTIAL", &WatermarkStyle::default()).unwrap();

        for index in 0..3 {
            let text = page_text(&out, index);
            assert!(text.contains("(CONFIDENTIAL) Tj"));
            assert!(text.contains(&format!("(Wm-Page-{}) Tj", index + 1)));
        }
    }

    #[test]
    fn test_watermark_registers_font_and_opacity() {
        let pdf = create_test_pdf(1, "Wm");
        let out = add_watermark(&pdf, "DRAFT", &WatermarkStyle::default()).unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let page = doc.get_dictionary(page_ids(&doc)[0]).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.has(STAMP_FONT.as_bytes()));
        let states = resources.get(b"ExtGState").unwrap().as_dict().unwrap();
        let state = states.get(STAMP_STATE.as_bytes()).unwrap().as_dict().unwrap();
        let ca = state.get(b"ca").unwrap().as_float().unwrap();
        assert!((ca - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_watermark_rejects_empty_text_and_bad_opacity() {
        let pdf = create_test_pdf(1, "Wm");
        assert!(add_watermark(&pdf, "  ", &WatermarkStyle::default()).is_err());
        let style = WatermarkStyle {
            opacity: 1.5,
            ..WatermarkStyle::default()
        };
        assert!(add_watermark(&pdf, "X", &style).is_err());
    }

    #[test]
    fn test_win_ansi_maps_latin_and_replaces_the_rest() {
        assert_eq!(win_ansi("Draft"), b"Draft".to_vec());
        assert_eq!(win_ansi("Café"), vec![b'C', b'a', b'f', 0xE9]);
        assert_eq!(win_ansi("€5 \u{2013} ok"), vec![0x80, b'5', b' ', 0x96, b' ', b'o', b'k']);
        assert_eq!(win_ansi("日本"), b"??".to_vec());
        assert_eq!(win_ansi("a\tb"), b"a?b".to_vec());
    }

    #[test]
    fn test_watermark_text_is_win_ansi_encoded() {
        let pdf = create_test_pdf(1, "Wm");
        let out = add_watermark(&pdf, "Geprüft 日本", &WatermarkStyle::default()).unwrap();

        let doc = Document::load_mem(&out).unwrap();
        let page_id = page_ids(&doc)[0];
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let shown: Vec<Vec<u8>> = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(bytes.clone()),
                _ => None,
            })
            .collect();
        assert!(shown.contains(&b"Gepr\xFCft ??".to_vec()));

        let page = doc.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        let font = fonts.get(STAMP_FONT.as_bytes()).unwrap().as_dict().unwrap();
        assert_eq!(font.get(b"Encoding").unwrap().as_name().unwrap(), b"WinAnsiEncoding");
    }

    #[test]
    fn test_page_numbers_start_from() {
        let pdf = create_test_pdf(3, "Num");
        let out = add_page_numbers(&pdf, NumberPosition::BottomRight, 5).unwrap();

        assert!(page_text(&out, 0).contains("(5) Tj"));
        assert!(page_text(&out, 2).contains("(7) Tj"));
    }

    #[test]
    fn test_number_position_parse() {
        assert_eq!(
            NumberPosition::parse("bottom-left"),
            Some(NumberPosition::BottomLeft)
        );
        assert_eq!(NumberPosition::parse("top"), None);
        assert_eq!(NumberPosition::BottomCenter.x(612.0), 296.0);
    }

    #[test]
    fn test_page_size_uses_inherited_media_box() {
        let pdf = create_test_pdf(1, "Size");
        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(page_size(&doc, page_ids(&doc)[0]), (612.0, 792.0));
    }
}
