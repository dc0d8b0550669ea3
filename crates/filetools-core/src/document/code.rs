//! Regex formatters and minifiers for CSS, HTML and JavaScript

use super::{text, DocumentError};
use crate::file::{extension_of, Blob};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref OPEN_BRACE: Regex = Regex::new(r"\s*\{\s*").unwrap();
    static ref CLOSE_BRACE: Regex = Regex::new(r"\s*\}\s*").unwrap();
    static ref SEMICOLON: Regex = Regex::new(r"\s*;\s*").unwrap();
    static ref COMMA: Regex = Regex::new(r"\s*,\s*").unwrap();
    static ref COLON: Regex = Regex::new(r"\s*:\s*").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref BLOCK_COMMENT: Regex = Regex::new(r"/\*[\s\S]*?\*/").unwrap();
    static ref LINE_COMMENT: Regex = Regex::new(r"//.*").unwrap();
    static ref HTML_COMMENT: Regex = Regex::new(r"<!--[\s\S]*?-->").unwrap();
    static ref BETWEEN_TAGS: Regex = Regex::new(r">\s+<").unwrap();
    static ref HTML_TOKEN: Regex = Regex::new(r"<[^>]*>|[^<]+").unwrap();
    static ref TAG_NAME: Regex = Regex::new(r"^</?\s*([A-Za-z][A-Za-z0-9-]*)").unwrap();
}

/// Elements that never have a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeLanguage {
    Css,
    Html,
    JavaScript,
}

impl CodeLanguage {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "css" => Some(Self::Css),
            "html" | "htm" => Some(Self::Html),
            "js" | "mjs" | "cjs" => Some(Self::JavaScript),
            _ => None,
        }
    }

    /// Language of a file, judged by the extension of its name
    pub fn from_file_name(name: &str) -> Result<Self, DocumentError> {
        extension_of(name)
            .as_deref()
            .and_then(Self::from_extension)
            .ok_or_else(|| DocumentError::UnsupportedLanguage(name.to_string()))
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Css => "text/css",
            Self::Html => "text/html",
            Self::JavaScript => "text/javascript",
        }
    }
}

pub fn format_code(bytes: &[u8], language: CodeLanguage) -> Result<Blob, DocumentError> {
    let source = text(bytes)?;
    let formatted = match language {
        CodeLanguage::Css => format_css(source),
        CodeLanguage::Html => format_html(source),
        CodeLanguage::JavaScript => format_js(source),
    };
    Ok(Blob::text(formatted, language.mime()))
}

pub fn minify_code(bytes: &[u8], language: CodeLanguage) -> Result<Blob, DocumentError> {
    let source = text(bytes)?;
    let minified = match language {
        CodeLanguage::Css => minify_css(source),
        CodeLanguage::Html => minify_html(source),
        CodeLanguage::JavaScript => minify_js(source),
    };
    Ok(Blob::text(minified, language.mime()))
}

fn format_css(source: &str) -> String {
    let out = OPEN_BRACE.replace_all(source, " {\n  ");
    let out = CLOSE_BRACE.replace_all(&out, "\n}\n");
    let out = SEMICOLON.replace_all(&out, ";\n  ");
    COMMA.replace_all(&out, ", ").into_owned()
}

fn minify_css(source: &str) -> String {
    let out = BLOCK_COMMENT.replace_all(source, "");
    let out = WHITESPACE.replace_all(&out, " ");
    let out = OPEN_BRACE.replace_all(&out, "{");
    let out = CLOSE_BRACE.replace_all(&out, "}");
    let out = SEMICOLON.replace_all(&out, ";");
    COLON.replace_all(&out, ":").trim().to_string()
}

fn format_js(source: &str) -> String {
    let out = OPEN_BRACE.replace_all(source, " {\n  ");
    let out = CLOSE_BRACE.replace_all(&out, "\n}\n");
    SEMICOLON.replace_all(&out, ";\n").into_owned()
}

fn minify_js(source: &str) -> String {
    let out = BLOCK_COMMENT.replace_all(source, "");
    let out = LINE_COMMENT.replace_all(&out, "");
    WHITESPACE.replace_all(&out, " ").trim().to_string()
}

fn minify_html(source: &str) -> String {
    let out = HTML_COMMENT.replace_all(source, "");
    let out = WHITESPACE.replace_all(&out, " ");
    BETWEEN_TAGS.replace_all(&out, "><").trim().to_string()
}

/// One tag or text run per line, indented two spaces per open element
fn format_html(source: &str) -> String {
    let mut lines = Vec::new();
    let mut depth = 0usize;

    for token in HTML_TOKEN.find_iter(source).map(|m| m.as_str().trim()) {
        if token.is_empty() {
            continue;
        }
        let tag = TAG_NAME
            .captures(token)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_ascii_lowercase());

        if token.starts_with("</") {
            depth = depth.saturating_sub(1);
            lines.push(format!("{}{}", "  ".repeat(depth), token));
            continue;
        }

        lines.push(format!("{}{}", "  ".repeat(depth), collapse(token)));
        let opens = match tag {
            Some(name) => !token.ends_with("/>") && !VOID_ELEMENTS.contains(&name.as_str()),
            None => false,
        };
        if opens {
            depth += 1;
        }
    }

    lines.join("\n")
}

fn collapse(token: &str) -> String {
    WHITESPACE.replace_all(token, " ").into_owned()
}
