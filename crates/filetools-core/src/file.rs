//! Input files, output blobs and category sniffing

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Broad file category used for size limits and tool disambiguation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Pdf,
    Video,
    Audio,
    Document,
    Other,
}

impl FileCategory {
    /// Sniff the category from a declared MIME type
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.to_ascii_lowercase();
        if mime.starts_with("image/") {
            FileCategory::Image
        } else if mime == "application/pdf" {
            FileCategory::Pdf
        } else if mime.starts_with("video/") {
            FileCategory::Video
        } else if mime.starts_with("audio/") {
            FileCategory::Audio
        } else if mime.starts_with("text/")
            || matches!(
                mime.as_str(),
                "application/json" | "application/xml" | "application/javascript"
            )
        {
            FileCategory::Document
        } else {
            FileCategory::Other
        }
    }
}

/// A user supplied file: name, declared type and contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub mime: String,
    pub data: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data,
        }
    }

    /// Build a file whose MIME type is guessed from the name's extension
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        let mime = mime_from_name(&name);
        Self { name, mime, data }
    }

    /// Read a file from disk
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());
        Ok(Self::from_bytes(name, data))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Lowercase extension after the last `.`, if the name has one
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }

    pub fn category(&self) -> FileCategory {
        FileCategory::from_mime(&self.mime)
    }

    /// File name without its extension
    pub fn stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) if idx > 0 => &self.name[..idx],
            _ => &self.name,
        }
    }
}

/// Binary output of a tool together with its MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
    pub mime: String,
}

impl Blob {
    pub fn new(data: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            data,
            mime: mime.into(),
        }
    }

    pub fn text(text: impl Into<String>, mime: impl Into<String>) -> Self {
        Self::new(text.into().into_bytes(), mime)
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Preferred file extension for this blob's MIME type
    pub fn extension(&self) -> &'static str {
        extension_from_mime(&self.mime)
    }
}

/// Lowercase extension after the last `.` in a file name
pub fn extension_of(name: &str) -> Option<String> {
    let idx = name.rfind('.')?;
    let ext = &name[idx + 1..];
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_ascii_lowercase())
    }
}

/// Types kept stable where the registry's first guess differs between
/// releases or from what the document tools emit
const PINNED_TYPES: &[(&str, &str)] = &[("xml", "application/xml"), ("js", "text/javascript")];

/// Extensions written by this crate's tools, in order of preference when a
/// MIME type maps back to several
const OUTPUT_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "png", "gif", "webp", "bmp", "tiff", "mp3", "wav", "aac", "flac", "ogg", "m4a",
    "mp4", "webm", "mkv", "mov", "avi", "json", "xml", "csv", "txt", "html", "css", "js", "zip",
];

/// Guess a MIME type from a file name, `application/octet-stream` when
/// the extension is unknown
pub fn mime_from_name(name: &str) -> String {
    let pinned = extension_of(name)
        .and_then(|ext| PINNED_TYPES.iter().find(|(pinned, _)| *pinned == ext))
        .map(|(_, mime)| mime.to_string());
    pinned.unwrap_or_else(|| {
        mime_guess::from_path(name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    })
}

/// Preferred extension for a MIME type, `bin` when none is registered
pub fn extension_from_mime(mime: &str) -> &'static str {
    let essence = mime.split(';').next().unwrap_or(mime).trim().to_ascii_lowercase();
    OUTPUT_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| mime_from_name(&format!("file.{}", ext)) == essence)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(&essence)
                .and_then(|extensions| extensions.first().copied())
        })
        .unwrap_or("bin")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_mime() {
        assert_eq!(FileCategory::from_mime("image/png"), FileCategory::Image);
        assert_eq!(FileCategory::from_mime("application/pdf"), FileCategory::Pdf);
        assert_eq!(FileCategory::from_mime("video/mp4"), FileCategory::Video);
        assert_eq!(FileCategory::from_mime("audio/mpeg"), FileCategory::Audio);
        assert_eq!(FileCategory::from_mime("text/css"), FileCategory::Document);
        assert_eq!(
            FileCategory::from_mime("application/octet-stream"),
            FileCategory::Other
        );
    }

    #[test]
    fn test_extension_takes_last_dot_lowercased() {
        assert_eq!(extension_of("archive.tar.GZ"), Some("gz".to_string()));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn test_mime_from_name_covers_tool_inputs() {
        assert_eq!(mime_from_name("a.pdf"), "application/pdf");
        assert_eq!(mime_from_name("a.mp3"), "audio/mpeg");
        assert_eq!(mime_from_name("a.csv"), "text/csv");
        assert_eq!(mime_from_name("a.xml"), "application/xml");
        assert_eq!(mime_from_name("a.JS"), "text/javascript");
        assert_eq!(mime_from_name("a.unknownext"), "application/octet-stream");
        assert_eq!(mime_from_name("README"), "application/octet-stream");

        for (name, category) in [
            ("a.wav", FileCategory::Audio),
            ("a.aac", FileCategory::Audio),
            ("a.flac", FileCategory::Audio),
            ("a.ogg", FileCategory::Audio),
            ("a.m4a", FileCategory::Audio),
            ("a.mkv", FileCategory::Video),
            ("a.wmv", FileCategory::Video),
            ("a.flv", FileCategory::Video),
            ("a.m4v", FileCategory::Video),
            ("a.webm", FileCategory::Video),
            ("a.tiff", FileCategory::Image),
            ("a.html", FileCategory::Document),
            ("a.css", FileCategory::Document),
            ("a.json", FileCategory::Document),
        ] {
            assert_eq!(FileCategory::from_mime(&mime_from_name(name)), category, "{}", name);
        }
    }

    #[test]
    fn test_extension_from_mime_prefers_output_names() {
        assert_eq!(extension_from_mime("image/jpeg"), "jpg");
        assert_eq!(extension_from_mime("image/tiff"), "tiff");
        assert_eq!(extension_from_mime("audio/mpeg"), "mp3");
        assert_eq!(extension_from_mime("text/plain; charset=utf-8"), "txt");
        assert_eq!(extension_from_mime("application/x-nothing-registered"), "bin");
    }

    #[test]
    fn test_output_extensions_round_trip() {
        for ext in OUTPUT_EXTENSIONS {
            let mime = mime_from_name(&format!("out.{}", ext));
            assert_eq!(extension_from_mime(&mime), *ext, "{} -> {}", ext, mime);
        }
    }

    #[test]
    fn test_from_bytes_guesses_mime() {
        let file = InputFile::from_bytes("photo.JPG", vec![1, 2, 3]);
        assert_eq!(file.mime, "image/jpeg");
        assert_eq!(file.size(), 3);
        assert_eq!(file.stem(), "photo");
    }
}
