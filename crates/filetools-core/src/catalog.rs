//! Static tool catalog
//!
//! Which tools are offered for which file extension, whether each one is
//! working, and the options it reads. Built once on first access.

use crate::dispatch::Tool;
use crate::file::InputFile;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Working,
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Number,
    Text,
    Toggle,
    Choice,
    /// Page indices, or a 1-based range string
    Pages,
    /// Groups of page indices
    Ranges,
}

/// One option a tool reads
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSpec {
    pub id: &'static str,
    pub kind: OptionKind,
    pub default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "no_choices")]
    pub choices: &'static [&'static str],
}

fn no_choices(choices: &&'static [&'static str]) -> bool {
    choices.is_empty()
}

impl OptionSpec {
    fn new(id: &'static str, kind: OptionKind, default: Value) -> Self {
        Self {
            id,
            kind,
            default,
            min: None,
            max: None,
            choices: &[],
        }
    }

    pub fn number(id: &'static str, default: f64, min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Self::new(id, OptionKind::Number, Value::from(default))
        }
    }

    pub fn text(id: &'static str, default: &str) -> Self {
        Self::new(id, OptionKind::Text, Value::from(default))
    }

    pub fn toggle(id: &'static str, default: bool) -> Self {
        Self::new(id, OptionKind::Toggle, Value::from(default))
    }

    pub fn choice(id: &'static str, default: &str, choices: &'static [&'static str]) -> Self {
        Self {
            choices,
            ..Self::new(id, OptionKind::Choice, Value::from(default))
        }
    }

    /// A choice between numbers, such as rotation angles
    pub fn choice_number(id: &'static str, default: i64, choices: &'static [&'static str]) -> Self {
        Self {
            choices,
            ..Self::new(id, OptionKind::Choice, Value::from(default))
        }
    }

    pub fn pages(id: &'static str, default: &[usize]) -> Self {
        Self::new(id, OptionKind::Pages, Value::from(default.to_vec()))
    }

    pub fn ranges(id: &'static str, default: &[&[usize]]) -> Self {
        let groups: Vec<Value> = default.iter().map(|g| Value::from(g.to_vec())).collect();
        Self::new(id, OptionKind::Ranges, Value::Array(groups))
    }
}

/// A file type the catalog knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileTypeInfo {
    pub extension: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// One tool offered for one file extension
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCatalogEntry {
    pub file_extension: &'static str,
    pub tool_name: &'static str,
    pub description: &'static str,
    pub status: ToolStatus,
    pub default_options: Vec<OptionSpec>,
}

pub const FILE_TYPES: &[FileTypeInfo] = &[
    file_type("pdf", "PDF", "Portable Document Format"),
    file_type("docx", "Word", "Microsoft Word Document"),
    file_type("xlsx", "Excel", "Microsoft Excel Spreadsheet"),
    file_type("pptx", "PowerPoint", "PowerPoint Presentation"),
    file_type("txt", "Text", "Text Document"),
    file_type("csv", "CSV", "Comma-Separated Values"),
    file_type("json", "JSON", "JavaScript Object Notation"),
    file_type("xml", "XML", "Extensible Markup Language"),
    file_type("rtf", "RTF", "Rich Text Format"),
    file_type("md", "Markdown", "Markdown Document"),
    file_type("jpg", "JPEG", "Joint Photographic Experts Group"),
    file_type("png", "PNG", "Portable Network Graphics"),
    file_type("gif", "GIF", "Graphics Interchange Format"),
    file_type("webp", "WebP", "Modern Web Image Format"),
    file_type("svg", "SVG", "Scalable Vector Graphics"),
    file_type("bmp", "BMP", "Bitmap Image File"),
    file_type("ico", "ICO", "Icon File"),
    file_type("tiff", "TIFF", "Tagged Image File Format"),
    file_type("mp3", "MP3", "MPEG Audio Layer III"),
    file_type("wav", "WAV", "Waveform Audio File Format"),
    file_type("aac", "AAC", "Advanced Audio Coding"),
    file_type("flac", "FLAC", "Free Lossless Audio Codec"),
    file_type("ogg", "OGG", "Ogg Vorbis Audio"),
    file_type("m4a", "M4A", "MPEG-4 Audio"),
    file_type("mp4", "MP4", "MPEG-4 Video"),
    file_type("avi", "AVI", "Audio Video Interleave"),
    file_type("mov", "MOV", "QuickTime Movie"),
    file_type("mkv", "MKV", "Matroska Video"),
    file_type("webm", "WebM", "Web Media File"),
    file_type("wmv", "WMV", "Windows Media Video"),
    file_type("flv", "FLV", "Flash Video"),
    file_type("m4v", "M4V", "iTunes Video"),
    file_type("js", "JavaScript", "JavaScript Source Code"),
    file_type("html", "HTML", "HyperText Markup Language"),
    file_type("css", "CSS", "Cascading Style Sheets"),
    file_type("py", "Python", "Python Source Code"),
    file_type("java", "Java", "Java Source Code"),
    file_type("ts", "TypeScript", "TypeScript Source Code"),
    file_type("php", "PHP", "PHP Source Code"),
    file_type("sql", "SQL", "Structured Query Language"),
    file_type("zip", "ZIP", "ZIP Archive"),
    file_type("rar", "RAR", "RAR Archive"),
    file_type("7z", "7-Zip", "7-Zip Archive"),
    file_type("tar", "TAR", "Tape Archive"),
    file_type("gz", "GZIP", "GNU Zip Archive"),
];

const fn file_type(
    extension: &'static str,
    name: &'static str,
    description: &'static str,
) -> FileTypeInfo {
    FileTypeInfo {
        extension,
        name,
        description,
    }
}

use ToolStatus::{Maintenance as M, Working as W};

/// (extension, tool, description, status)
const TOOLS: &[(&str, &str, &str, ToolStatus)] = &[
    ("pdf", "Merge PDFs", "Combine multiple PDFs into one", W),
    ("pdf", "Split PDF", "Split PDF into multiple files", W),
    ("pdf", "Compress PDF", "Reduce PDF file size", W),
    ("pdf", "Extract Images", "Extract all images from PDF", M),
    ("pdf", "Extract Text", "Extract text content from PDF", M),
    ("pdf", "Rotate Pages", "Rotate PDF pages", W),
    ("pdf", "Remove Pages", "Delete specific pages from PDF", W),
    ("pdf", "Extract Pages", "Copy selected pages into a new PDF", W),
    ("pdf", "Add Watermark", "Add watermark to PDF pages", W),
    ("pdf", "Add Page Numbers", "Number every page", W),
    ("pdf", "Protect PDF", "Add password protection", M),
    ("pdf", "Unlock PDF", "Remove password protection", M),
    ("pdf", "PDF to Word", "Convert PDF to DOCX", M),
    ("pdf", "PDF to Excel", "Convert PDF to XLSX", M),
    ("pdf", "PDF to JPG", "Convert PDF pages to images", M),
    ("pdf", "Organize Pages", "Reorder PDF pages", W),
    ("pdf", "Repair PDF", "Rebuild a damaged PDF", W),
    ("pdf", "PDF Info", "Show page count and metadata", W),
    ("docx", "Convert to PDF", "Convert Word to PDF format", M),
    ("docx", "Extract Text", "Extract plain text from Word", M),
    ("xlsx", "Convert to PDF", "Convert Excel to PDF format", M),
    ("xlsx", "Extract CSV", "Convert Excel to CSV format", M),
    ("pptx", "Convert to PDF", "Convert PowerPoint to PDF", M),
    ("pptx", "Extract Images", "Extract images from slides", M),
    ("txt", "Convert to PDF", "Convert text to PDF format", M),
    ("txt", "Format Text", "Format and prettify text", M),
    ("csv", "Convert to Excel", "Convert CSV to XLSX format", M),
    ("csv", "Convert to JSON", "Convert CSV to JSON format", W),
    ("csv", "Validate CSV", "Check CSV structure", M),
    ("json", "Format JSON", "Prettify and format JSON", W),
    ("json", "Minify JSON", "Compress JSON file", W),
    ("json", "Validate JSON", "Check JSON syntax", W),
    ("json", "Convert to CSV", "Convert JSON to CSV", W),
    ("xml", "Format XML", "Prettify and format XML", W),
    ("xml", "Validate XML", "Check XML syntax", W),
    ("xml", "Convert to JSON", "Convert XML to JSON", M),
    ("rtf", "Convert to PDF", "Convert RTF to PDF", M),
    ("rtf", "Convert to DOCX", "Convert RTF to Word", M),
    ("md", "Convert to HTML", "Convert Markdown to HTML", M),
    ("md", "Convert to PDF", "Convert Markdown to PDF", M),
    ("md", "Preview", "Preview Markdown rendering", M),
    ("jpg", "Convert Format", "Convert to PNG, WebP, etc.", W),
    ("jpg", "Compress", "Reduce image file size", W),
    ("jpg", "Resize", "Change image dimensions", W),
    ("jpg", "Crop", "Crop image to specific area", W),
    ("jpg", "Rotate", "Rotate image by a right angle", W),
    ("jpg", "Add Watermark", "Add watermark to image", W),
    ("jpg", "Add Text", "Add text overlay to image", M),
    ("jpg", "Apply Filters", "Apply color filters and effects", W),
    ("jpg", "Adjust Brightness", "Adjust image brightness", W),
    ("jpg", "Remove Background", "Remove image background", M),
    ("jpg", "Blur Image", "Apply blur effect", W),
    ("jpg", "Sharpen Image", "Enhance image sharpness", W),
    ("png", "Convert Format", "Convert to JPG, WebP, etc.", W),
    ("png", "Compress", "Reduce image file size", W),
    ("png", "Resize", "Change image dimensions", W),
    ("png", "Crop", "Crop image to specific area", W),
    ("png", "Remove Background", "Remove image background", M),
    ("png", "Add Transparency", "Make parts of image transparent", M),
    ("png", "Rotate & Flip", "Flip image horizontally or vertically", W),
    ("png", "Add Watermark", "Add watermark to image", W),
    ("png", "Apply Filters", "Apply color filters", W),
    ("gif", "Convert Format", "Convert to PNG, WebP, etc.", W),
    ("gif", "Resize", "Change GIF dimensions", W),
    ("gif", "Optimize", "Reduce GIF file size", M),
    ("gif", "Reverse", "Reverse GIF animation", M),
    ("webp", "Convert Format", "Convert to JPG, PNG, etc.", W),
    ("webp", "Compress", "Reduce file size", W),
    ("webp", "Resize", "Change dimensions", W),
    ("svg", "Convert to PNG", "Convert SVG to PNG", M),
    ("svg", "Optimize SVG", "Minify and clean SVG", M),
    ("svg", "Edit SVG", "Edit SVG code", M),
    ("bmp", "Convert Format", "Convert to JPG, PNG, etc.", W),
    ("bmp", "Compress", "Reduce file size", W),
    ("ico", "Convert to PNG", "Convert ICO to PNG", M),
    ("ico", "Create Favicon", "Create favicon from image", M),
    ("tiff", "Convert Format", "Convert to JPG, PNG, etc.", W),
    ("tiff", "Compress", "Reduce file size", W),
    ("mp3", "Convert Format", "Convert to WAV, OGG, etc.", W),
    ("mp3", "Compress Audio", "Reduce audio file size", W),
    ("mp3", "Trim Audio", "Cut and trim audio file", W),
    ("mp3", "Merge Audio", "Combine multiple audio files", W),
    ("mp3", "Change Volume", "Adjust audio volume", W),
    ("mp3", "Change Speed", "Speed up or slow down audio", W),
    ("mp3", "Add Fade", "Add fade in/out effects", W),
    ("mp3", "Remove Noise", "Remove background noise", M),
    ("mp3", "Edit Metadata", "Edit song title, artist, etc.", M),
    ("mp3", "Extract Audio from Video", "Extract audio from video file", W),
    ("mp3", "Reverse Audio", "Play audio in reverse", W),
    ("wav", "Convert Format", "Convert to MP3, OGG, etc.", W),
    ("wav", "Compress", "Reduce audio file size", W),
    ("aac", "Convert Format", "Convert to MP3, WAV, etc.", W),
    ("aac", "Trim Audio", "Cut and trim audio", W),
    ("flac", "Convert Format", "Convert to MP3, WAV, etc.", W),
    ("flac", "Compress", "Reduce file size", W),
    ("ogg", "Convert Format", "Convert to MP3, WAV, etc.", W),
    ("ogg", "Trim Audio", "Cut and trim audio", W),
    ("m4a", "Convert Format", "Convert to MP3, WAV, etc.", W),
    ("m4a", "Edit Metadata", "Edit audio tags", M),
    ("mp4", "Convert Format", "Convert to AVI, MOV, etc.", W),
    ("mp4", "Compress Video", "Reduce video file size", W),
    ("mp4", "Trim Video", "Cut and trim video file", W),
    ("mp4", "Merge Videos", "Combine multiple videos", W),
    ("mp4", "Extract Audio", "Extract audio from video", W),
    ("mp4", "Add Subtitles", "Add subtitle file to video", M),
    ("mp4", "Remove Audio", "Mute video audio track", W),
    ("mp4", "Rotate Video", "Rotate video orientation", W),
    ("mp4", "Change Speed", "Speed up or slow down video", W),
    ("mp4", "Crop Video", "Crop video dimensions", W),
    ("mp4", "Add Watermark", "Add watermark to video", M),
    ("mp4", "Video to GIF", "Convert video to animated GIF", W),
    ("mp4", "Extract Frames", "Extract video frames as images", M),
    ("mp4", "Reverse Video", "Play video in reverse", W),
    ("avi", "Convert Format", "Convert to MP4, MOV, etc.", W),
    ("avi", "Compress", "Reduce video file size", W),
    ("mov", "Convert Format", "Convert to MP4, AVI, etc.", W),
    ("mov", "Compress", "Reduce file size", W),
    ("mov", "Trim Video", "Cut and trim video", W),
    ("mkv", "Convert Format", "Convert to MP4, AVI, etc.", W),
    ("mkv", "Extract Subtitles", "Extract subtitle tracks", M),
    ("mkv", "Extract Audio", "Extract audio tracks", W),
    ("webm", "Convert Format", "Convert to MP4, AVI, etc.", W),
    ("webm", "Compress", "Reduce file size", W),
    ("wmv", "Convert Format", "Convert to MP4, AVI, etc.", W),
    ("wmv", "Compress", "Reduce file size", W),
    ("flv", "Convert Format", "Convert to MP4, AVI, etc.", W),
    ("flv", "Extract Audio", "Extract audio from video", W),
    ("m4v", "Convert Format", "Convert to MP4, AVI, etc.", W),
    ("m4v", "Compress", "Reduce file size", W),
    ("js", "Format Code", "Format and prettify code", W),
    ("js", "Minify", "Minify and compress code", W),
    ("js", "Lint", "Check for code errors", M),
    ("html", "Format Code", "Format and prettify code", W),
    ("html", "Minify", "Minify and compress code", W),
    ("css", "Format Code", "Format and prettify code", W),
    ("css", "Minify", "Minify and compress code", W),
    ("py", "Format Code", "Format with Black/autopep8", M),
    ("py", "Lint", "Check for errors", M),
    ("java", "Format Code", "Format and prettify code", M),
    ("java", "Lint", "Check for errors", M),
    ("ts", "Format Code", "Format and prettify code", M),
    ("ts", "Compile to JS", "Compile TypeScript to JavaScript", M),
    ("ts", "Lint", "Check for errors", M),
    ("php", "Format Code", "Format and prettify code", M),
    ("php", "Lint", "Check for errors", M),
    ("sql", "Format SQL", "Format and prettify SQL", M),
    ("sql", "Validate", "Check SQL syntax", M),
    ("zip", "Extract", "Extract ZIP contents", W),
    ("zip", "Create ZIP", "Create ZIP archive", W),
    ("zip", "View Contents", "List files in archive", W),
    ("rar", "Extract", "Extract RAR contents", M),
    ("rar", "View Contents", "List files in archive", M),
    ("7z", "Extract", "Extract 7z contents", M),
    ("7z", "Create 7z", "Create 7z archive", M),
    ("tar", "Extract", "Extract TAR contents", M),
    ("tar", "Create TAR", "Create TAR archive", M),
    ("gz", "Extract", "Extract GZIP contents", M),
    ("gz", "Compress", "Create GZIP archive", M),
];

/// The tool a working entry runs, judged against an empty sample file
fn sample_tool(extension: &str, tool_name: &str) -> Option<Tool> {
    let sample = InputFile::from_bytes(format!("sample.{}", extension), Vec::new());
    Tool::resolve(tool_name, &sample).ok()
}

fn build() -> Vec<ToolCatalogEntry> {
    TOOLS
        .iter()
        .map(|&(file_extension, tool_name, description, status)| {
            let default_options = match status {
                ToolStatus::Working => sample_tool(file_extension, tool_name)
                    .map(Tool::option_specs)
                    .unwrap_or_default(),
                ToolStatus::Maintenance => Vec::new(),
            };
            ToolCatalogEntry {
                file_extension,
                tool_name,
                description,
                status,
                default_options,
            }
        })
        .collect()
}

/// Every catalog entry, grouped by extension in declaration order
pub fn catalog() -> &'static [ToolCatalogEntry] {
    static CATALOG: OnceLock<Vec<ToolCatalogEntry>> = OnceLock::new();
    CATALOG.get_or_init(build)
}

pub fn file_type_info(extension: &str) -> Option<&'static FileTypeInfo> {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    FILE_TYPES.iter().find(|t| t.extension == extension)
}

/// Tools offered for an extension (case-insensitive, leading dot optional)
pub fn tools_for_extension(extension: &str) -> Vec<&'static ToolCatalogEntry> {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    catalog()
        .iter()
        .filter(|entry| entry.file_extension == extension)
        .collect()
}

pub fn lookup(extension: &str, tool_name: &str) -> Option<&'static ToolCatalogEntry> {
    tools_for_extension(extension)
        .into_iter()
        .find(|entry| entry.tool_name == tool_name)
}
